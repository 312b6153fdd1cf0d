//! Inference sessions and the fixpoint loop.
//!
//! A session owns a set of inference variables with their bounds, a queue of
//! pending formulas and a list of delayed ones. It runs until it reaches a
//! fixpoint:
//!
//! 1. reduce pending formulas one at a time, in order;
//! 2. when the queue is empty, wake delayed formulas whose input variables
//!    are all resolved;
//! 3. when nothing wakes, resolve the next group of variables (root sessions
//!    only; nested sessions stop here and hand their state to the parent).
//!
//! The first formula that reduces to `false` fails the session. The loop
//! polls the request's cancellation token on every iteration.

use crate::bounds::{BoundKind, VarData, VarSet};
use crate::capture::Capture;
use crate::constraint::{ConstraintFormula, Reduction};
use crate::container::InferenceContext;
use crate::diagnostics::{DiagnosticArg, IncompatibilityRecord};
use crate::expr::{ExprArena, ExprId};
use crate::instantiate::{TypeSubstitution, VarSubstitution, collect_vars, substitute_vars};
use crate::intern::TypeInterner;
use crate::oracle::TypeOracle;
use crate::resolve::ResolutionStep;
use crate::types::{InferenceVar, TypeData, TypeId};
use indexmap::IndexMap;
use polyinfer_common::diagnostics::MessageTemplate;
use polyinfer_common::limits::PENDING_QUEUE_CAPACITY;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;
use std::collections::VecDeque;
use tracing::{debug, trace};

pub(crate) type LambdaParamTypes = SmallVec<[TypeId; 4]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SessionMode {
    /// Runs reduction, incorporation and resolution to completion.
    Root,
    /// Runs reduction and incorporation only; the parent finishes the job.
    Nested,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SessionState {
    Running,
    Done,
    Failed,
    Cancelled,
}

pub(crate) struct InferenceSession<'c, 'a> {
    pub(crate) ctx: &'c InferenceContext<'a>,
    pub(crate) mode: SessionMode,
    pub(crate) depth: u32,
    /// The generic call this session infers; `None` for the root.
    pub(crate) call: Option<ExprId>,
    /// Variables owned by this session, in creation order.
    pub(crate) vars: IndexMap<InferenceVar, VarData, FxBuildHasher>,
    /// Resolved variables: this session's and a snapshot of its ancestors'.
    pub(crate) resolved: VarSubstitution,
    pub(crate) pending: VecDeque<ConstraintFormula>,
    pub(crate) delayed: Vec<ConstraintFormula>,
    /// Bounds on variables owned by an ancestor, as formulas for the parent.
    pub(crate) forwarded: Vec<ConstraintFormula>,
    pub(crate) captures: Vec<Capture>,
    /// Unchecked conversion was needed somewhere in this session.
    pub(crate) erased: bool,
    pub(crate) errors: Vec<IncompatibilityRecord>,
    pub(crate) lambda_params: FxHashMap<ExprId, LambdaParamTypes>,
    /// Type parameter to variable mapping for every generic call inferred here.
    pub(crate) call_vars: IndexMap<ExprId, TypeSubstitution, FxBuildHasher>,
    /// Formulas produced by incorporation, with the variable they came from.
    pub(crate) derived: FxHashMap<ConstraintFormula, InferenceVar>,
    pub(crate) state: SessionState,
    steps: u32,
}

impl<'c, 'a> InferenceSession<'c, 'a> {
    pub(crate) fn root(ctx: &'c InferenceContext<'a>) -> Self {
        Self {
            ctx,
            mode: SessionMode::Root,
            depth: 0,
            call: None,
            vars: IndexMap::default(),
            resolved: VarSubstitution::default(),
            pending: VecDeque::with_capacity(PENDING_QUEUE_CAPACITY),
            delayed: Vec::new(),
            forwarded: Vec::new(),
            captures: Vec::new(),
            erased: false,
            errors: Vec::new(),
            lambda_params: FxHashMap::default(),
            call_vars: IndexMap::default(),
            derived: FxHashMap::default(),
            state: SessionState::Running,
            steps: 0,
        }
    }

    /// A child session for `call`, seeded with the parent's resolved
    /// variables and lambda parameter types. It never sees the parent's
    /// pending or delayed formulas, nor the variables of sibling calls.
    pub(crate) fn nested(parent: &Self, call: ExprId) -> Self {
        Self {
            mode: SessionMode::Nested,
            depth: parent.depth + 1,
            call: Some(call),
            resolved: parent.resolved.clone(),
            lambda_params: parent.lambda_params.clone(),
            ..Self::root(parent.ctx)
        }
    }

    #[inline]
    pub(crate) fn db(&self) -> &'a TypeInterner {
        self.ctx.db
    }

    #[inline]
    pub(crate) fn oracle(&self) -> &'a dyn TypeOracle {
        self.ctx.oracle
    }

    #[inline]
    pub(crate) fn exprs(&self) -> &'a ExprArena {
        self.ctx.exprs
    }

    pub(crate) fn push(&mut self, formula: ConstraintFormula) {
        self.pending.push_back(formula);
    }

    /// Queue a formula derived by incorporation from the bounds of `var`.
    pub(crate) fn push_derived(&mut self, formula: ConstraintFormula, var: InferenceVar) {
        self.derived.entry(formula.clone()).or_insert(var);
        self.pending.push_back(formula);
    }

    /// Apply the resolved variables to `ty`.
    pub(crate) fn substitute(&self, ty: TypeId) -> TypeId {
        substitute_vars(self.db(), ty, &self.resolved)
    }

    /// A type is proper when it mentions no unresolved inference variable.
    pub(crate) fn is_proper(&self, ty: TypeId) -> bool {
        let mut mentioned = VarSet::default();
        collect_vars(self.db(), ty, &mut mentioned);
        mentioned.iter().all(|v| self.resolved.contains_key(v))
    }

    /// The variable `ty` consists of, if it is a bare unresolved variable.
    pub(crate) fn unresolved_var(&self, ty: TypeId) -> Option<InferenceVar> {
        match self.db().lookup(ty) {
            Some(TypeData::Var(var)) if !self.resolved.contains_key(&var) => Some(var),
            _ => None,
        }
    }

    /// Record a failure and return the `false` reduction.
    pub(crate) fn fail(&mut self, mut record: IncompatibilityRecord) -> Reduction {
        if record.call.is_none() {
            record.call = self.call;
        }
        debug!(
            code = record.code(),
            message = ?record.message,
            call = ?record.call,
            "inference failure"
        );
        self.errors.push(record);
        Reduction::Resolved(false)
    }

    // =========================================================================
    // Fixpoint loop
    // =========================================================================

    pub(crate) fn run(&mut self) -> SessionState {
        debug!(
            mode = ?self.mode,
            depth = self.depth,
            call = ?self.call,
            pending = self.pending.len(),
            "session start"
        );
        while self.state == SessionState::Running {
            if self.ctx.is_cancelled() {
                debug!("session cancelled");
                self.state = SessionState::Cancelled;
                break;
            }
            self.steps += 1;
            if self.steps > self.ctx.limits.max_iterations {
                let steps = self.ctx.limits.max_iterations as usize;
                self.fail(IncompatibilityRecord::new(
                    MessageTemplate::DidNotConverge,
                    vec![steps.into()],
                ));
                self.state = SessionState::Failed;
                break;
            }
            if let Some(formula) = self.pending.pop_front() {
                self.step(formula);
                continue;
            }
            if self.wake_delayed() {
                continue;
            }
            if self.mode == SessionMode::Nested {
                self.state = SessionState::Done;
                break;
            }
            match self.resolve_next() {
                ResolutionStep::Progress => {}
                ResolutionStep::Complete => self.state = SessionState::Done,
                ResolutionStep::Failed => self.state = SessionState::Failed,
            }
        }
        debug!(
            state = ?self.state,
            steps = self.steps,
            vars = self.vars.len(),
            delayed = self.delayed.len(),
            "session end"
        );
        self.state
    }

    fn step(&mut self, formula: ConstraintFormula) {
        let reduced = formula.substitute(self.db(), &self.resolved);
        trace!(kind = reduced.kind_name(), formula = ?reduced, "reduce");
        let errors_before = self.errors.len();
        match self.reduce(&reduced) {
            Reduction::Resolved(true) => {}
            Reduction::Resolved(false) => {
                if self.state != SessionState::Running {
                    return;
                }
                if self.errors.len() == errors_before {
                    let record = self.failure_record(&formula, &reduced);
                    self.fail(record);
                }
                self.state = SessionState::Failed;
            }
            Reduction::Replaced(formulas) => self.pending.extend(formulas),
            Reduction::Delayed => {
                trace!(formula = ?reduced, "delayed");
                self.delayed.push(reduced);
            }
        }
        if self.state == SessionState::Running && self.errors.len() > errors_before {
            // A bound insertion failed during an otherwise successful reduction.
            self.state = SessionState::Failed;
        }
    }

    /// Move delayed formulas whose input variables are now resolved back to
    /// the pending queue. Returns whether anything moved.
    fn wake_delayed(&mut self) -> bool {
        if self.delayed.is_empty() {
            return false;
        }
        let delayed = std::mem::take(&mut self.delayed);
        let mut woke = false;
        for formula in delayed {
            let formula = formula.substitute(self.db(), &self.resolved);
            if self.input_variables(&formula).is_empty() {
                trace!(formula = ?formula, "woke");
                self.pending.push_back(formula);
                woke = true;
            } else {
                self.delayed.push(formula);
            }
        }
        woke
    }

    /// The generic record for a formula that reduced to `false`.
    fn failure_record(
        &self,
        original: &ConstraintFormula,
        reduced: &ConstraintFormula,
    ) -> IncompatibilityRecord {
        use ConstraintFormula as F;
        let (left, right): (DiagnosticArg, DiagnosticArg) = match *reduced {
            F::ExpressionCompatibility { expr, target }
            | F::CheckedExceptionCompatibility { expr, target }
            | F::LambdaCompatibility {
                lambda: expr,
                target,
            }
            | F::MethodReferenceCompatibility {
                reference: expr,
                target,
            } => (target.into(), expr.into()),
            F::StrictSubtyping { sub, sup } | F::Subtyping { sub, sup } => (sub.into(), sup.into()),
            F::TypeCompatibility { target, source } => (target.into(), source.into()),
            F::TypeEquality { left, right } => (left.into(), right.into()),
        };
        let mut variables = VarSet::default();
        for ty in formula_types(original) {
            collect_vars(self.db(), ty, &mut variables);
        }
        if let Some(&var) = self.derived.get(original) {
            return IncompatibilityRecord::new(
                MessageTemplate::IncompatibleBounds,
                vec![var.into(), left, right],
            )
            .with_variables(std::iter::once(var).chain(variables));
        }
        let message = match reduced {
            F::StrictSubtyping { .. } => MessageTemplate::NotASubtype,
            F::Subtyping { .. } => MessageTemplate::NotContained,
            F::TypeEquality { .. } => MessageTemplate::NotEqual,
            _ => MessageTemplate::IncompatibleTypes,
        };
        IncompatibilityRecord::new(message, vec![left, right]).with_variables(variables)
    }

    /// Hand the session's state to its parent.
    pub(crate) fn into_outcome(self) -> NestedOutcome {
        NestedOutcome {
            variables: self.vars,
            delayed: self.delayed,
            forwarded: self.forwarded,
            captures: self.captures,
            erased: self.erased,
            lambda_params: self.lambda_params,
            call_vars: self.call_vars,
            derived: self.derived,
        }
    }
}

/// Everything a finished nested session passes up for folding.
pub(crate) struct NestedOutcome {
    pub(crate) variables: IndexMap<InferenceVar, VarData, FxBuildHasher>,
    pub(crate) delayed: Vec<ConstraintFormula>,
    pub(crate) forwarded: Vec<ConstraintFormula>,
    pub(crate) captures: Vec<Capture>,
    pub(crate) erased: bool,
    pub(crate) lambda_params: FxHashMap<ExprId, LambdaParamTypes>,
    pub(crate) call_vars: IndexMap<ExprId, TypeSubstitution, FxBuildHasher>,
    pub(crate) derived: FxHashMap<ConstraintFormula, InferenceVar>,
}

/// The types a formula mentions.
fn formula_types(formula: &ConstraintFormula) -> SmallVec<[TypeId; 2]> {
    use ConstraintFormula as F;
    match *formula {
        F::ExpressionCompatibility { target, .. }
        | F::CheckedExceptionCompatibility { target, .. }
        | F::LambdaCompatibility { target, .. }
        | F::MethodReferenceCompatibility { target, .. } => smallvec::smallvec![target],
        F::StrictSubtyping { sub, sup } | F::Subtyping { sub, sup } => {
            smallvec::smallvec![sub, sup]
        }
        F::TypeCompatibility { target, source } => smallvec::smallvec![target, source],
        F::TypeEquality { left, right } => smallvec::smallvec![left, right],
    }
}

/// The formula expressing bound `kind` between `lhs` and `ty`.
pub(crate) fn bound_formula(lhs: TypeId, kind: BoundKind, ty: TypeId) -> ConstraintFormula {
    match kind {
        BoundKind::Eq => ConstraintFormula::TypeEquality {
            left: lhs,
            right: ty,
        },
        BoundKind::Upper => ConstraintFormula::StrictSubtyping { sub: lhs, sup: ty },
        BoundKind::Lower => ConstraintFormula::StrictSubtyping { sub: ty, sup: lhs },
    }
}
