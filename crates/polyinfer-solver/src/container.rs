//! Inference requests and nested sessions.
//!
//! An [`InferenceContext`] holds everything one request shares across its
//! sessions: the type store, the oracle, the expression arena, the variable
//! counter, the cancellation token and the limits. The root session is
//! created by [`InferenceContext::infer_call`] or
//! [`InferenceContext::infer_expression`]; every generic call met during
//! reduction gets its own nested session, run to exhaustion in reduce-only
//! mode and folded back into its parent as a value.

use crate::bounds::VarData;
use crate::capture::Capture;
use crate::constraint::{ConstraintFormula, Reduction};
use crate::diagnostics::IncompatibilityRecord;
use crate::expr::{CallExpr, ExprArena, ExprData, ExprId};
use crate::instantiate::{TypeSubstitution, instantiate_type, substitute_vars};
use crate::intern::TypeInterner;
use crate::oracle::TypeOracle;
use crate::session::{InferenceSession, NestedOutcome, SessionState};
use crate::types::{InferenceVar, TypeData, TypeId};
use indexmap::IndexMap;
use polyinfer_common::CancellationToken;
use polyinfer_common::diagnostics::MessageTemplate;
use polyinfer_common::limits::{MAX_FIXPOINT_ITERATIONS, MAX_SESSION_DEPTH};
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::cell::Cell;
use std::fmt;
use tracing::debug;

/// Resource limits for one request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InferenceLimits {
    /// Fixpoint iterations per session.
    pub max_iterations: u32,
    /// Nesting depth of generic calls.
    pub max_nested_depth: u32,
}

impl Default for InferenceLimits {
    fn default() -> Self {
        Self {
            max_iterations: MAX_FIXPOINT_ITERATIONS,
            max_nested_depth: MAX_SESSION_DEPTH,
        }
    }
}

/// The result of a successful request.
#[derive(Clone, Debug, Default)]
pub struct InferenceOutcome {
    /// Type arguments of the root call, when the root is a call.
    pub substitution: TypeSubstitution,
    /// The root call's return type with `substitution` applied (erased after
    /// an unchecked conversion).
    pub return_type: Option<TypeId>,
    /// Type arguments of every inferred call in the tree.
    pub call_substitutions: IndexMap<ExprId, TypeSubstitution, FxBuildHasher>,
    /// Parameter types of every lambda in the tree.
    pub lambda_parameters: FxHashMap<ExprId, Vec<TypeId>>,
    pub captures: Vec<Capture>,
    /// Some conversion along the way was unchecked.
    pub erased: bool,
    /// Every inference variable of the request with its resolved type.
    pub variables: IndexMap<InferenceVar, TypeId, FxBuildHasher>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceError {
    /// Inference failed. Records are in the order they were produced.
    Incompatible(Vec<IncompatibilityRecord>),
    Cancelled,
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::Incompatible(records) => match records.first() {
                Some(first) => write!(
                    f,
                    "inference failed: {:?} (code {}) and {} more",
                    first.message,
                    first.code(),
                    records.len() - 1
                ),
                None => write!(f, "inference failed"),
            },
            InferenceError::Cancelled => write!(f, "inference cancelled"),
        }
    }
}

impl std::error::Error for InferenceError {}

pub struct InferenceContext<'a> {
    pub(crate) db: &'a TypeInterner,
    pub(crate) oracle: &'a dyn TypeOracle,
    pub(crate) exprs: &'a ExprArena,
    pub(crate) limits: InferenceLimits,
    cancel: Option<CancellationToken>,
    next_var: Cell<u32>,
}

impl<'a> InferenceContext<'a> {
    pub fn new(db: &'a TypeInterner, oracle: &'a dyn TypeOracle, exprs: &'a ExprArena) -> Self {
        Self {
            db,
            oracle,
            exprs,
            limits: InferenceLimits::default(),
            cancel: None,
            next_var: Cell::new(0),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_limits(mut self, limits: InferenceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub(crate) fn fresh_var(&self) -> InferenceVar {
        let id = self.next_var.get();
        self.next_var.set(id + 1);
        InferenceVar(id)
    }

    #[inline]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Infer the type arguments of `call`. `None` as target means the call
    /// is a statement and its result is discarded.
    pub fn infer_call(
        &self,
        call: ExprId,
        target: Option<TypeId>,
    ) -> Result<InferenceOutcome, InferenceError> {
        let mut session = InferenceSession::root(self);
        let Some(ExprData::Call(data)) = self.exprs.get(call) else {
            session.fail(IncompatibilityRecord::new(
                MessageTemplate::CouldNotInfer,
                vec![call.into()],
            ));
            return Err(InferenceError::Incompatible(session.errors));
        };
        match session.reduce_call(call, data, target.unwrap_or(TypeId::VOID)) {
            Reduction::Resolved(true) => {}
            Reduction::Resolved(false) => {
                if session.state == SessionState::Running {
                    session.state = SessionState::Failed;
                }
            }
            Reduction::Replaced(formulas) => session.pending.extend(formulas),
            Reduction::Delayed => {}
        }
        self.finish(session, call)
    }

    /// Infer everything needed to make `expr` compatible with `target`.
    /// `TypeId::VOID` as target means a statement context.
    pub fn infer_expression(
        &self,
        expr: ExprId,
        target: TypeId,
    ) -> Result<InferenceOutcome, InferenceError> {
        let mut session = InferenceSession::root(self);
        session.push(ConstraintFormula::ExpressionCompatibility { expr, target });
        self.finish(session, expr)
    }

    fn finish(
        &self,
        mut session: InferenceSession<'_, 'a>,
        root: ExprId,
    ) -> Result<InferenceOutcome, InferenceError> {
        match session.run() {
            SessionState::Cancelled => return Err(InferenceError::Cancelled),
            SessionState::Failed | SessionState::Running => {
                return Err(InferenceError::Incompatible(session.errors));
            }
            SessionState::Done => {}
        }
        let db = self.db;
        let resolved = &session.resolved;
        let call_substitutions: IndexMap<ExprId, TypeSubstitution, FxBuildHasher> = session
            .call_vars
            .iter()
            .map(|(&call, subst)| {
                let mut out = TypeSubstitution::new();
                for (param, ty) in subst.iter() {
                    out.insert(param, substitute_vars(db, ty, resolved));
                }
                (call, out)
            })
            .collect();
        let lambda_parameters = session
            .lambda_params
            .iter()
            .map(|(&lambda, params)| {
                let params: Vec<TypeId> = params
                    .iter()
                    .map(|&ty| substitute_vars(db, ty, resolved))
                    .collect();
                (lambda, params)
            })
            .collect();
        let variables: IndexMap<InferenceVar, TypeId, FxBuildHasher> = session
            .vars
            .keys()
            .filter_map(|var| resolved.get(var).map(|&ty| (*var, ty)))
            .collect();

        let mut outcome = InferenceOutcome {
            call_substitutions,
            lambda_parameters,
            captures: std::mem::take(&mut session.captures),
            erased: session.erased,
            variables,
            ..InferenceOutcome::default()
        };
        if let Some(call) = self.root_call(root)
            && let Some(ExprData::Call(data)) = self.exprs.get(call)
        {
            let substitution = outcome
                .call_substitutions
                .get(&call)
                .cloned()
                .unwrap_or_default();
            let declared = data.method.return_type;
            let return_type = if outcome.erased {
                self.oracle.erasure(declared)
            } else {
                instantiate_type(db, declared, &substitution)
            };
            outcome.substitution = substitution;
            outcome.return_type = Some(return_type);
        }
        debug!(
            vars = outcome.variables.len(),
            calls = outcome.call_substitutions.len(),
            erased = outcome.erased,
            "inference complete"
        );
        Ok(outcome)
    }

    /// `expr` with parentheses stripped, if it is a call.
    fn root_call(&self, mut expr: ExprId) -> Option<ExprId> {
        loop {
            match self.exprs.get(expr)? {
                ExprData::Parenthesized(inner) => expr = *inner,
                ExprData::Call(_) => return Some(expr),
                _ => return None,
            }
        }
    }
}

impl InferenceSession<'_, '_> {
    /// Create variables for a call's type parameters and queue one
    /// compatibility formula per argument. Returns the instantiated return
    /// type, or `None` if the argument count does not fit.
    pub(crate) fn seed_call(&mut self, call_id: ExprId, call: &CallExpr) -> Option<TypeId> {
        let db = self.db();
        let method = &call.method;
        let subst = match &call.explicit_type_args {
            Some(args) => TypeSubstitution::from_args(&method.type_params, args),
            None => {
                let mut subst = TypeSubstitution::new();
                for &param in &method.type_params {
                    let var = self.ctx.fresh_var();
                    let mut data = VarData::for_param(param);
                    data.throws = method
                        .thrown
                        .iter()
                        .any(|&t| db.lookup(t) == Some(TypeData::TypeParam(param)));
                    self.vars.insert(var, data);
                    subst.insert(param, db.var(var));
                }
                for &param in &method.type_params {
                    let bound = db.type_param_bound(param);
                    if bound != TypeId::OBJECT
                        && let Some(var_ty) = subst.get(param)
                    {
                        self.push(ConstraintFormula::StrictSubtyping {
                            sub: var_ty,
                            sup: instantiate_type(db, bound, &subst),
                        });
                    }
                }
                subst
            }
        };
        debug!(call = call_id.0, vars = ?subst, "seed call");
        if method.is_generic() {
            self.call_vars.insert(call_id, subst.clone());
        }

        let declared = method.params.len();
        let given = call.args.len();
        let arity_ok = if method.is_variable_arity() {
            given + 1 >= declared
        } else {
            given == declared
        };
        if !arity_ok {
            self.fail(IncompatibilityRecord::new(
                MessageTemplate::ArgumentCountMismatch,
                vec![declared.into(), given.into()],
            ));
            return None;
        }
        let spread = method.is_variable_arity() && !self.passes_array_directly(call);
        for (i, &arg) in call.args.iter().enumerate() {
            let param = if spread && i + 1 >= declared {
                match db.lookup(method.params[declared - 1]) {
                    Some(TypeData::Array(component)) => component,
                    _ => method.params[declared - 1],
                }
            } else {
                method.params[i]
            };
            self.push(ConstraintFormula::ExpressionCompatibility {
                expr: arg,
                target: instantiate_type(db, param, &subst),
            });
        }
        Some(instantiate_type(db, method.return_type, &subst))
    }

    /// A variable-arity call whose last argument is already an array.
    fn passes_array_directly(&self, call: &CallExpr) -> bool {
        if call.args.len() != call.method.params.len() {
            return false;
        }
        let Some(&last) = call.args.last() else {
            return false;
        };
        matches!(
            self.exprs().get(last),
            Some(ExprData::Standalone(ty)) if matches!(self.db().lookup(*ty), Some(TypeData::Array(_)))
        )
    }

    /// `‹call → target›` for a call: infer the call in a nested session,
    /// fold it into this one and check its return type against `target`.
    pub(crate) fn reduce_call(
        &mut self,
        expr: ExprId,
        call: &CallExpr,
        target: TypeId,
    ) -> Reduction {
        let max_depth = self.ctx.limits.max_nested_depth;
        if self.depth >= max_depth {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::NestingTooDeep,
                vec![(max_depth as usize).into()],
            ));
        }
        let mut child = InferenceSession::nested(self, expr);
        let Some(returned) = child.seed_call(expr, call) else {
            self.errors.append(&mut child.errors);
            return Reduction::Resolved(false);
        };
        match child.run() {
            SessionState::Cancelled => {
                self.state = SessionState::Cancelled;
                return Reduction::Resolved(false);
            }
            SessionState::Failed | SessionState::Running => {
                self.errors.append(&mut child.errors);
                return Reduction::Resolved(false);
            }
            SessionState::Done => {}
        }
        let erased = child.erased;
        self.fold(child.into_outcome(), expr);

        if target == TypeId::VOID || returned == TypeId::VOID {
            return Reduction::Resolved(true);
        }
        let source = if erased {
            self.oracle().erasure(call.method.return_type)
        } else {
            returned
        };
        Reduction::Replaced(vec![ConstraintFormula::TypeCompatibility { target, source }])
    }

    fn fold(&mut self, outcome: NestedOutcome, call: ExprId) {
        debug!(
            call = call.0,
            vars = outcome.variables.len(),
            delayed = outcome.delayed.len(),
            forwarded = outcome.forwarded.len(),
            erased = outcome.erased,
            "fold nested session"
        );
        self.vars.extend(outcome.variables);
        self.captures.extend(outcome.captures);
        self.erased |= outcome.erased;
        self.delayed.extend(outcome.delayed);
        self.pending.extend(outcome.forwarded);
        for (lambda, params) in outcome.lambda_params {
            self.lambda_params.entry(lambda).or_insert(params);
        }
        self.call_vars.extend(outcome.call_vars);
        for (formula, var) in outcome.derived {
            self.derived.entry(formula).or_insert(var);
        }
    }
}

#[cfg(test)]
#[path = "../tests/container_tests.rs"]
mod tests;
