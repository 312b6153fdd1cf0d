//! Constraint formulas.
//!
//! A formula is a claim about expressions and types that reduction either
//! decides, rewrites into simpler formulas, turns into bounds on inference
//! variables, or postpones. The set of formula kinds is closed; reduction
//! dispatches with a single `match` in `reduce.rs`.

use crate::expr::ExprId;
use crate::instantiate::{VarSubstitution, substitute_vars};
use crate::intern::TypeInterner;
use crate::types::TypeId;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintFormula {
    /// `expr` is compatible in a loose invocation context with `target`.
    ExpressionCompatibility { expr: ExprId, target: TypeId },
    /// The checked exceptions thrown by the lambda or method reference `expr`
    /// are allowed by the functional interface `target`.
    CheckedExceptionCompatibility { expr: ExprId, target: TypeId },
    /// `sub <: sup`.
    StrictSubtyping { sub: TypeId, sup: TypeId },
    /// Type argument `sub` is contained by type argument `sup`.
    Subtyping { sub: TypeId, sup: TypeId },
    /// A value of type `source` is compatible with `target`.
    TypeCompatibility { target: TypeId, source: TypeId },
    TypeEquality { left: TypeId, right: TypeId },
    LambdaCompatibility { lambda: ExprId, target: TypeId },
    MethodReferenceCompatibility { reference: ExprId, target: TypeId },
}

impl ConstraintFormula {
    /// Replace resolved inference variables in every type the formula
    /// mentions. Expressions are untouched.
    pub fn substitute(&self, db: &TypeInterner, subst: &VarSubstitution) -> Self {
        if subst.is_empty() {
            return self.clone();
        }
        let s = |ty: TypeId| substitute_vars(db, ty, subst);
        match *self {
            Self::ExpressionCompatibility { expr, target } => Self::ExpressionCompatibility {
                expr,
                target: s(target),
            },
            Self::CheckedExceptionCompatibility { expr, target } => {
                Self::CheckedExceptionCompatibility {
                    expr,
                    target: s(target),
                }
            }
            Self::StrictSubtyping { sub, sup } => Self::StrictSubtyping {
                sub: s(sub),
                sup: s(sup),
            },
            Self::Subtyping { sub, sup } => Self::Subtyping {
                sub: s(sub),
                sup: s(sup),
            },
            Self::TypeCompatibility { target, source } => Self::TypeCompatibility {
                target: s(target),
                source: s(source),
            },
            Self::TypeEquality { left, right } => Self::TypeEquality {
                left: s(left),
                right: s(right),
            },
            Self::LambdaCompatibility { lambda, target } => Self::LambdaCompatibility {
                lambda,
                target: s(target),
            },
            Self::MethodReferenceCompatibility { reference, target } => {
                Self::MethodReferenceCompatibility {
                    reference,
                    target: s(target),
                }
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ExpressionCompatibility { .. } => "expression-compatibility",
            Self::CheckedExceptionCompatibility { .. } => "checked-exception-compatibility",
            Self::StrictSubtyping { .. } => "strict-subtyping",
            Self::Subtyping { .. } => "subtyping",
            Self::TypeCompatibility { .. } => "type-compatibility",
            Self::TypeEquality { .. } => "type-equality",
            Self::LambdaCompatibility { .. } => "lambda-compatibility",
            Self::MethodReferenceCompatibility { .. } => "method-reference-compatibility",
        }
    }
}

/// Outcome of reducing one formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reduction {
    /// Decided. `Resolved(true)` may still have added bounds as a side effect.
    Resolved(bool),
    /// Replaced by simpler formulas, queued in order.
    Replaced(Vec<ConstraintFormula>),
    /// Cannot be reduced until its input variables are resolved.
    Delayed,
}

impl Reduction {
    pub fn holds(&self) -> bool {
        !matches!(self, Reduction::Resolved(false))
    }
}
