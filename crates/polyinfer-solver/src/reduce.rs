//! Reduction of constraint formulas.
//!
//! `reduce` dispatches on the formula kind. Type-level formulas follow the
//! usual rules:
//!
//! - `‹S → T›` (compatibility): decided by the oracle when both sides are
//!   proper; otherwise boxing is peeled off, raw-to-parameterized compatibility
//!   is accepted as unchecked, and the rest becomes `‹S <: T›`.
//! - `‹S <: T›`: bounds when either side is a bare variable; otherwise the
//!   matching supertype of `S` is found and its arguments must be contained.
//! - `‹S <= T›` (containment) and `‹S = T›` recurse structurally.
//!
//! Expression-level formulas live here too, except the functional forms
//! (lambdas, method references, checked exceptions) in `functional.rs` and
//! calls, which open a nested session (`container.rs`).

use crate::bounds::BoundKind;
use crate::capture::capture;
use crate::constraint::{ConstraintFormula, Reduction};
use crate::diagnostics::IncompatibilityRecord;
use crate::expr::{ExprData, ExprId};
use crate::session::InferenceSession;
use crate::types::{TypeData, TypeId, WildcardKind};
use polyinfer_common::diagnostics::MessageTemplate;
use tracing::trace;

use ConstraintFormula as F;

impl InferenceSession<'_, '_> {
    pub(crate) fn reduce(&mut self, formula: &ConstraintFormula) -> Reduction {
        match *formula {
            F::ExpressionCompatibility { expr, target } => self.reduce_expression(expr, target),
            F::CheckedExceptionCompatibility { expr, target } => {
                self.reduce_checked_exceptions(expr, target)
            }
            F::StrictSubtyping { sub, sup } => self.reduce_subtyping(sub, sup),
            F::Subtyping { sub, sup } => self.reduce_containment(sub, sup),
            F::TypeCompatibility { target, source } => {
                self.reduce_type_compatibility(target, source)
            }
            F::TypeEquality { left, right } => self.reduce_type_equality(left, right),
            F::LambdaCompatibility { lambda, target } => self.reduce_lambda(lambda, target),
            F::MethodReferenceCompatibility { reference, target } => {
                self.reduce_method_ref(reference, target)
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn reduce_expression(&mut self, expr: ExprId, target: TypeId) -> Reduction {
        let exprs = self.exprs();
        let Some(data) = exprs.get(expr) else {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::CouldNotInfer,
                vec![expr.into()],
            ));
        };
        match data {
            ExprData::Standalone(ty) => self.reduce_standalone(*ty, target),
            ExprData::LambdaParam { lambda, index } => {
                let param = self
                    .lambda_params
                    .get(lambda)
                    .and_then(|params| params.get(*index as usize))
                    .copied();
                match param {
                    Some(ty) => self.reduce_standalone(ty, target),
                    None => self.fail(IncompatibilityRecord::new(
                        MessageTemplate::CouldNotInfer,
                        vec![expr.into()],
                    )),
                }
            }
            ExprData::Parenthesized(inner) => {
                Reduction::Replaced(vec![F::ExpressionCompatibility {
                    expr: *inner,
                    target,
                }])
            }
            ExprData::Conditional {
                then_branch,
                else_branch,
            } => Reduction::Replaced(vec![
                F::ExpressionCompatibility {
                    expr: *then_branch,
                    target,
                },
                F::ExpressionCompatibility {
                    expr: *else_branch,
                    target,
                },
            ]),
            ExprData::Switch { results } => Reduction::Replaced(
                results
                    .iter()
                    .map(|&expr| F::ExpressionCompatibility { expr, target })
                    .collect(),
            ),
            ExprData::Lambda(lambda) => {
                let mut formulas = vec![F::LambdaCompatibility {
                    lambda: expr,
                    target,
                }];
                if !lambda.body.thrown.is_empty() {
                    formulas.push(F::CheckedExceptionCompatibility { expr, target });
                }
                Reduction::Replaced(formulas)
            }
            ExprData::MethodRef(reference) => {
                let mut formulas = vec![F::MethodReferenceCompatibility {
                    reference: expr,
                    target,
                }];
                if !reference.member.thrown.is_empty() {
                    formulas.push(F::CheckedExceptionCompatibility { expr, target });
                }
                Reduction::Replaced(formulas)
            }
            ExprData::Call(call) => self.reduce_call(expr, call, target),
        }
    }

    /// A standalone expression of type `ty` against `target`. A `void`
    /// target is a statement context and accepts anything.
    fn reduce_standalone(&mut self, ty: TypeId, target: TypeId) -> Reduction {
        if target == TypeId::VOID {
            return Reduction::Resolved(true);
        }
        let mut source = ty;
        if !self.is_proper(target)
            && let Some(cap) = capture(self.db(), ty)
        {
            trace!(from = ty.0, to = cap.captured.0, "captured");
            source = cap.captured;
            self.captures.push(cap);
        }
        Reduction::Replaced(vec![F::TypeCompatibility { target, source }])
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn reduce_type_compatibility(&mut self, target: TypeId, source: TypeId) -> Reduction {
        let oracle = self.oracle();
        if self.is_proper(target) && self.is_proper(source) {
            if oracle.is_assignable(target, source) {
                return Reduction::Resolved(true);
            }
            if self.erased
                && oracle.is_assignable(oracle.erasure(target), oracle.erasure(source))
            {
                return Reduction::Resolved(true);
            }
            return Reduction::Resolved(false);
        }
        if source == TypeId::VOID {
            return Reduction::Resolved(false);
        }
        if let Some(boxed) = oracle.boxed(source) {
            return Reduction::Replaced(vec![F::TypeCompatibility {
                target,
                source: boxed,
            }]);
        }
        if let Some(boxed) = oracle.boxed(target) {
            return Reduction::Replaced(vec![F::TypeEquality {
                left: source,
                right: boxed,
            }]);
        }
        if self.is_unchecked_conversion(target, source) {
            trace!(target = target.0, source = source.0, "unchecked conversion");
            self.erased = true;
            return Reduction::Resolved(true);
        }
        Reduction::Replaced(vec![F::StrictSubtyping {
            sub: source,
            sup: target,
        }])
    }

    /// `target` is a parameterization `G<..>` (or an array of one) and the
    /// only supertype of `source` naming `G` is raw.
    fn is_unchecked_conversion(&self, target: TypeId, source: TypeId) -> bool {
        let db = self.db();
        match (db.lookup(target), db.lookup(source)) {
            (Some(TypeData::Class(class)), _) if !class.args.is_empty() => {
                if self.unresolved_var(source).is_some() {
                    return false;
                }
                matches!(
                    self.oracle().as_super(source, class.def).and_then(|s| db.lookup(s)),
                    Some(TypeData::Class(found)) if found.args.is_empty()
                )
            }
            (Some(TypeData::Array(t)), Some(TypeData::Array(s))) => {
                self.is_unchecked_conversion(t, s)
            }
            _ => false,
        }
    }

    fn reduce_subtyping(&mut self, sub: TypeId, sup: TypeId) -> Reduction {
        if sub == sup {
            return Reduction::Resolved(true);
        }
        if self.is_proper(sub) && self.is_proper(sup) {
            return Reduction::Resolved(self.oracle().is_subtype(sub, sup));
        }
        if sub == TypeId::NULL {
            return Reduction::Resolved(true);
        }
        if let Some(var) = self.unresolved_var(sup) {
            return self.bound_reduction(var, BoundKind::Lower, sub);
        }
        if let Some(var) = self.unresolved_var(sub) {
            return self.bound_reduction(var, BoundKind::Upper, sup);
        }

        let db = self.db();
        let Some(sub_data) = db.lookup(sub) else {
            return Reduction::Resolved(false);
        };
        if matches!(sub_data, TypeData::Primitive(_) | TypeData::Void) {
            return Reduction::Resolved(false);
        }
        match db.lookup(sup) {
            Some(TypeData::Class(target)) => {
                if target.args.is_empty() {
                    return Reduction::Resolved(self.oracle().as_super(sub, target.def).is_some());
                }
                let Some(found) = self.oracle().as_super(sub, target.def) else {
                    return Reduction::Resolved(false);
                };
                let Some(TypeData::Class(found)) = db.lookup(found) else {
                    return Reduction::Resolved(false);
                };
                if found.args.is_empty() {
                    self.erased = true;
                    return Reduction::Resolved(true);
                }
                if found.args.len() != target.args.len() {
                    return Reduction::Resolved(false);
                }
                Reduction::Replaced(
                    found
                        .args
                        .iter()
                        .zip(&target.args)
                        .map(|(&s, &t)| F::Subtyping { sub: s, sup: t })
                        .collect(),
                )
            }
            Some(TypeData::Array(target_elem)) => match sub_data {
                TypeData::Array(sub_elem) => {
                    let primitive = |ty: TypeId| {
                        matches!(db.lookup(ty), Some(TypeData::Primitive(_)))
                    };
                    if primitive(sub_elem) || primitive(target_elem) {
                        Reduction::Resolved(sub_elem == target_elem)
                    } else {
                        Reduction::Replaced(vec![F::StrictSubtyping {
                            sub: sub_elem,
                            sup: target_elem,
                        }])
                    }
                }
                _ => Reduction::Resolved(false),
            },
            Some(TypeData::Intersection(members)) => Reduction::Replaced(
                members
                    .iter()
                    .map(|&member| F::StrictSubtyping { sub, sup: member })
                    .collect(),
            ),
            Some(TypeData::TypeParam(_)) => {
                if let TypeData::Intersection(members) = &sub_data
                    && members.contains(&sup)
                {
                    return Reduction::Resolved(true);
                }
                Reduction::Resolved(false)
            }
            Some(TypeData::Captured(captured)) => {
                if let TypeData::Intersection(members) = &sub_data
                    && members.contains(&sup)
                {
                    return Reduction::Resolved(true);
                }
                match db.captured_lower_bound(&captured) {
                    Some(lower) => Reduction::Replaced(vec![F::StrictSubtyping { sub, sup: lower }]),
                    None => Reduction::Resolved(false),
                }
            }
            _ => Reduction::Resolved(false),
        }
    }

    /// Type argument containment `sub <= sup`.
    fn reduce_containment(&mut self, sub: TypeId, sup: TypeId) -> Reduction {
        let db = self.db();
        let sub_wildcard = match db.lookup(sub) {
            Some(TypeData::Wildcard(kind)) => Some(kind),
            _ => None,
        };
        let sup_wildcard = match db.lookup(sup) {
            Some(TypeData::Wildcard(kind)) => Some(kind),
            _ => None,
        };
        match (sub_wildcard, sup_wildcard) {
            (None, None) => Reduction::Replaced(vec![F::TypeEquality {
                left: sub,
                right: sup,
            }]),
            (Some(_), None) => Reduction::Resolved(false),
            (_, Some(WildcardKind::Unbounded)) => Reduction::Resolved(true),
            (sub_kind, Some(WildcardKind::Extends(upper))) => {
                let formula = match sub_kind {
                    None => F::StrictSubtyping { sub, sup: upper },
                    Some(WildcardKind::Unbounded) => F::StrictSubtyping {
                        sub: TypeId::OBJECT,
                        sup: upper,
                    },
                    Some(WildcardKind::Extends(bound)) => F::StrictSubtyping {
                        sub: bound,
                        sup: upper,
                    },
                    Some(WildcardKind::Super(_)) => F::TypeEquality {
                        left: TypeId::OBJECT,
                        right: upper,
                    },
                };
                Reduction::Replaced(vec![formula])
            }
            (sub_kind, Some(WildcardKind::Super(lower))) => match sub_kind {
                None => Reduction::Replaced(vec![F::StrictSubtyping { sub: lower, sup: sub }]),
                Some(WildcardKind::Super(bound)) => {
                    Reduction::Replaced(vec![F::StrictSubtyping {
                        sub: lower,
                        sup: bound,
                    }])
                }
                Some(_) => Reduction::Resolved(false),
            },
        }
    }

    fn reduce_type_equality(&mut self, left: TypeId, right: TypeId) -> Reduction {
        if left == right {
            return Reduction::Resolved(true);
        }
        if self.is_proper(left) && self.is_proper(right) {
            return Reduction::Resolved(self.oracle().is_same_type(left, right));
        }
        let db = self.db();
        let is_wildcard = |ty: TypeId| matches!(db.lookup(ty), Some(TypeData::Wildcard(_)));
        if is_wildcard(left) != is_wildcard(right) {
            return Reduction::Resolved(false);
        }
        let is_primitive = |ty: TypeId| matches!(db.lookup(ty), Some(TypeData::Primitive(_)));
        if let Some(var) = self.unresolved_var(left) {
            if is_primitive(right) {
                return Reduction::Resolved(false);
            }
            return self.bound_reduction(var, BoundKind::Eq, right);
        }
        if let Some(var) = self.unresolved_var(right) {
            if is_primitive(left) {
                return Reduction::Resolved(false);
            }
            return self.bound_reduction(var, BoundKind::Eq, left);
        }
        let pairwise = |a: &[TypeId], b: &[TypeId]| {
            Reduction::Replaced(
                a.iter()
                    .zip(b)
                    .map(|(&left, &right)| F::TypeEquality { left, right })
                    .collect(),
            )
        };
        match (db.lookup(left), db.lookup(right)) {
            (Some(TypeData::Class(a)), Some(TypeData::Class(b))) => {
                if a.def == b.def && a.args.len() == b.args.len() {
                    pairwise(&a.args, &b.args)
                } else {
                    Reduction::Resolved(false)
                }
            }
            (Some(TypeData::Array(a)), Some(TypeData::Array(b))) => {
                Reduction::Replaced(vec![F::TypeEquality { left: a, right: b }])
            }
            (Some(TypeData::Intersection(a)), Some(TypeData::Intersection(b))) => {
                if a.len() == b.len() {
                    pairwise(&a, &b)
                } else {
                    Reduction::Resolved(false)
                }
            }
            (Some(TypeData::Wildcard(a)), Some(TypeData::Wildcard(b))) => match (a, b) {
                (WildcardKind::Unbounded, WildcardKind::Unbounded) => Reduction::Resolved(true),
                (WildcardKind::Unbounded, WildcardKind::Extends(bound))
                | (WildcardKind::Extends(bound), WildcardKind::Unbounded) => {
                    Reduction::Replaced(vec![F::TypeEquality {
                        left: TypeId::OBJECT,
                        right: bound,
                    }])
                }
                (WildcardKind::Extends(a), WildcardKind::Extends(b))
                | (WildcardKind::Super(a), WildcardKind::Super(b)) => {
                    Reduction::Replaced(vec![F::TypeEquality { left: a, right: b }])
                }
                _ => Reduction::Resolved(false),
            },
            _ => Reduction::Resolved(false),
        }
    }
}

#[cfg(test)]
#[path = "../tests/reduce_tests.rs"]
mod tests;
