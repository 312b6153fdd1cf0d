//! Expression model consumed by the inference engine.
//!
//! The engine does not type-check statements or resolve overloads. It sees
//! the argument expressions of a chosen method, already classified: either a
//! standalone expression whose type is known, or one of the poly forms whose
//! type depends on its target (generic calls, lambdas, method references,
//! conditionals, switch expressions and parenthesized versions of those).

use crate::def::MethodSig;
use crate::types::TypeId;
use serde::Serialize;
use smallvec::SmallVec;

/// Handle to an expression in an [`ExprArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ExprId(pub u32);

/// A call of a (possibly generic) method with its argument expressions.
#[derive(Clone, Debug)]
pub struct CallExpr {
    pub method: MethodSig,
    pub args: Vec<ExprId>,
    /// `obj.<String>m(...)`: explicit type arguments make the call standalone.
    pub explicit_type_args: Option<Vec<TypeId>>,
}

#[derive(Clone, Debug)]
pub enum LambdaParams {
    /// `(a, b) -> ...`
    Implicit(u32),
    /// `(String a, int b) -> ...`
    Explicit(Vec<TypeId>),
}

impl LambdaParams {
    pub fn len(&self) -> usize {
        match self {
            LambdaParams::Implicit(n) => *n as usize,
            LambdaParams::Explicit(types) => types.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self, LambdaParams::Implicit(_))
    }
}

/// What a lambda body yields.
#[derive(Clone, Debug, Default)]
pub struct LambdaBody {
    /// The body expression, or the operands of every `return e;`.
    pub results: Vec<ExprId>,
    /// Usable where no value is expected.
    pub void_compatible: bool,
    /// Usable where a value is expected.
    pub value_compatible: bool,
    /// Checked exception types thrown by the body and not caught in it.
    pub thrown: Vec<TypeId>,
}

impl LambdaBody {
    /// Expression body. A statement expression (a call, an assignment) is
    /// also void-compatible.
    pub fn expression(result: ExprId, statement_expression: bool) -> Self {
        Self {
            results: vec![result],
            void_compatible: statement_expression,
            value_compatible: true,
            thrown: Vec::new(),
        }
    }

    /// Block body with the given `return e;` operands. A block without any
    /// value return is void-compatible only.
    pub fn block(returns: Vec<ExprId>) -> Self {
        let value = !returns.is_empty();
        Self {
            results: returns,
            void_compatible: !value,
            value_compatible: value,
            thrown: Vec::new(),
        }
    }

    /// Block that never completes normally (`{ throw e; }`): both void- and
    /// value-compatible.
    pub fn never_completes() -> Self {
        Self {
            results: Vec::new(),
            void_compatible: true,
            value_compatible: true,
            thrown: Vec::new(),
        }
    }

    pub fn throwing(mut self, thrown: Vec<TypeId>) -> Self {
        self.thrown = thrown;
        self
    }
}

#[derive(Clone, Debug)]
pub struct LambdaExpr {
    pub params: LambdaParams,
    pub body: LambdaBody,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodRefKind {
    /// `Type::staticMethod`
    Static,
    /// `expr::method`: the receiver is already evaluated.
    Bound,
    /// `Type::instanceMethod`: the first functional parameter is the receiver.
    Unbound { receiver: TypeId },
    /// `Type::new`: `member.return_type` is the constructed type.
    Constructor,
}

#[derive(Clone, Debug)]
pub struct MethodRefExpr {
    /// The member the reference names after compile-time member search.
    pub member: MethodSig,
    pub kind: MethodRefKind,
    /// Exact references name exactly one non-varargs, non-generic (or
    /// explicitly instantiated) member.
    pub exact: bool,
    pub explicit_type_args: Option<Vec<TypeId>>,
}

#[derive(Clone, Debug)]
pub enum ExprData {
    /// Any expression whose type is known without a target.
    Standalone(TypeId),
    /// A reference to the `index`-th parameter of `lambda` inside its body.
    LambdaParam { lambda: ExprId, index: u32 },
    Parenthesized(ExprId),
    Conditional {
        then_branch: ExprId,
        else_branch: ExprId,
    },
    Switch { results: SmallVec<[ExprId; 4]> },
    Call(CallExpr),
    Lambda(LambdaExpr),
    MethodRef(MethodRefExpr),
}

/// Storage for the expressions of one inference request.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<ExprData>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, data: ExprData) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(data);
        id
    }

    pub fn get(&self, id: ExprId) -> Option<&ExprData> {
        self.exprs.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn standalone(&mut self, ty: TypeId) -> ExprId {
        self.alloc(ExprData::Standalone(ty))
    }

    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        self.alloc(ExprData::Parenthesized(inner))
    }

    pub fn conditional(&mut self, then_branch: ExprId, else_branch: ExprId) -> ExprId {
        self.alloc(ExprData::Conditional {
            then_branch,
            else_branch,
        })
    }

    pub fn switch(&mut self, results: &[ExprId]) -> ExprId {
        self.alloc(ExprData::Switch {
            results: results.iter().copied().collect(),
        })
    }

    pub fn call(&mut self, method: MethodSig, args: Vec<ExprId>) -> ExprId {
        self.alloc(ExprData::Call(CallExpr {
            method,
            args,
            explicit_type_args: None,
        }))
    }

    pub fn call_explicit(
        &mut self,
        method: MethodSig,
        type_args: Vec<TypeId>,
        args: Vec<ExprId>,
    ) -> ExprId {
        self.alloc(ExprData::Call(CallExpr {
            method,
            args,
            explicit_type_args: Some(type_args),
        }))
    }

    /// Allocate a lambda. `body` receives the lambda's own id so that it can
    /// build `LambdaParam` references before the lambda is complete.
    pub fn lambda<F>(&mut self, params: LambdaParams, body: F) -> ExprId
    where
        F: FnOnce(&mut Self, ExprId) -> LambdaBody,
    {
        let id = self.alloc(ExprData::Lambda(LambdaExpr {
            params: params.clone(),
            body: LambdaBody::default(),
        }));
        let body = body(self, id);
        self.exprs[id.0 as usize] = ExprData::Lambda(LambdaExpr { params, body });
        id
    }

    pub fn lambda_param(&mut self, lambda: ExprId, index: u32) -> ExprId {
        self.alloc(ExprData::LambdaParam { lambda, index })
    }

    pub fn method_ref(&mut self, member: MethodSig, kind: MethodRefKind, exact: bool) -> ExprId {
        self.alloc(ExprData::MethodRef(MethodRefExpr {
            member,
            kind,
            exact,
            explicit_type_args: None,
        }))
    }
}
