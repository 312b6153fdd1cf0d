//! Bound insertion and incorporation.
//!
//! Every new bound is combined with the bounds already present on the same
//! variable, and the consequences are queued as formulas:
//!
//! | new bound | existing bound | derived formula |
//! |-----------|----------------|-----------------|
//! | `α = S`   | `α = T`        | `S = T`         |
//! | `α = S`   | `α <: T`       | `S <: T`        |
//! | `α = S`   | `T <: α`       | `T <: S`        |
//! | `α <: S`  | `T <: α`       | `T <: S`        |
//! | `α <: G<S..>` | `α <: G<T..>` | `Si = Ti` for non-wildcard pairs |
//!
//! A bound between two variables is mirrored onto the other variable, and a
//! proper equality `α = T` is substituted into the bounds of every other
//! variable that mentions `α`.

use crate::bounds::BoundKind;
use crate::constraint::{ConstraintFormula, Reduction};
use crate::diagnostics::IncompatibilityRecord;
use crate::instantiate::{VarSubstitution, mentions_var, substitute_vars};
use crate::session::{InferenceSession, SessionMode, bound_formula};
use crate::types::{InferenceVar, TypeData, TypeId};
use polyinfer_common::diagnostics::MessageTemplate;
use polyinfer_common::limits::MAX_BOUNDS_PER_VARIABLE;
use tracing::trace;

impl InferenceSession<'_, '_> {
    /// Add `var <kind> ty` and incorporate it. Returns `false` if the bound
    /// immediately contradicts the variable's resolution.
    pub(crate) fn add_bound(&mut self, var: InferenceVar, kind: BoundKind, ty: TypeId) -> bool {
        let var_ty = self.db().var(var);
        if ty == var_ty {
            return true;
        }

        if let Some(&resolved) = self.resolved.get(&var) {
            if kind == BoundKind::Eq && self.is_proper(ty) {
                let ty = self.substitute(ty);
                if self.oracle().is_same_type(resolved, ty) {
                    return true;
                }
                self.fail(
                    IncompatibilityRecord::new(
                        MessageTemplate::IncompatibleResolution,
                        vec![var.into(), resolved.into(), ty.into()],
                    )
                    .with_variables([var]),
                );
                return false;
            }
            self.push(bound_formula(resolved, kind, ty));
            return true;
        }

        if self.mode == SessionMode::Nested && !self.vars.contains_key(&var) {
            trace!(var = var.0, ?kind, ty = ty.0, "forwarded to parent");
            self.forwarded.push(bound_formula(var_ty, kind, ty));
            return true;
        }

        let data = self.vars.entry(var).or_default();
        if !data.bounds.insert(kind, ty) {
            return true;
        }
        if data.bounds.len() > MAX_BOUNDS_PER_VARIABLE {
            self.fail(
                IncompatibilityRecord::new(
                    MessageTemplate::DidNotConverge,
                    vec![MAX_BOUNDS_PER_VARIABLE.into()],
                )
                .with_variables([var]),
            );
            return false;
        }
        trace!(var = var.0, ?kind, ty = ty.0, "bound");
        self.incorporate(var, kind, ty)
    }

    /// Add a bound as the result of reducing a formula.
    pub(crate) fn bound_reduction(
        &mut self,
        var: InferenceVar,
        kind: BoundKind,
        ty: TypeId,
    ) -> Reduction {
        Reduction::Resolved(self.add_bound(var, kind, ty))
    }

    pub(crate) fn incorporate(&mut self, var: InferenceVar, kind: BoundKind, ty: TypeId) -> bool {
        use BoundKind::{Eq, Lower, Upper};
        use ConstraintFormula::{StrictSubtyping, TypeEquality};

        let existing: Vec<(BoundKind, TypeId)> = self
            .vars
            .get(&var)
            .map(|data| {
                data.bounds
                    .iter()
                    .filter(|&(k, t)| !(k == kind && t == ty))
                    .collect()
            })
            .unwrap_or_default();

        for (other_kind, other) in existing {
            let derived = match (kind, other_kind) {
                (Eq, Eq) => TypeEquality {
                    left: other,
                    right: ty,
                },
                (Eq, Upper) | (Lower, Upper) => StrictSubtyping { sub: ty, sup: other },
                (Eq, Lower) | (Upper, Lower) => StrictSubtyping { sub: other, sup: ty },
                (Upper, Eq) => StrictSubtyping { sub: other, sup: ty },
                (Lower, Eq) => StrictSubtyping { sub: ty, sup: other },
                (Upper, Upper) => {
                    self.incorporate_shared_supertype(var, ty, other);
                    continue;
                }
                (Lower, Lower) => continue,
            };
            self.push_derived(derived, var);
        }

        if let Some(TypeData::Var(other)) = self.db().lookup(ty)
            && other != var
        {
            let mirrored = match kind {
                Eq => Eq,
                Upper => Lower,
                Lower => Upper,
            };
            let var_ty = self.db().var(var);
            if !self.add_bound(other, mirrored, var_ty) {
                return false;
            }
        }

        if kind == Eq && self.is_proper(ty) {
            self.propagate_equality(var, self.substitute(ty));
        }
        true
    }

    /// `α <: G<S..>` and `α <: G<T..>` force equal non-wildcard arguments.
    fn incorporate_shared_supertype(&mut self, var: InferenceVar, a: TypeId, b: TypeId) {
        let (Some(TypeData::Class(a)), Some(TypeData::Class(b))) =
            (self.db().lookup(a), self.db().lookup(b))
        else {
            return;
        };
        if a.def != b.def || a.args.len() != b.args.len() || a.args.is_empty() {
            return;
        }
        let is_wildcard =
            |ty: TypeId| matches!(self.db().lookup(ty), Some(TypeData::Wildcard(_)));
        let pairs: Vec<(TypeId, TypeId)> = a
            .args
            .iter()
            .zip(&b.args)
            .filter(|&(&x, &y)| x != y && !is_wildcard(x) && !is_wildcard(y))
            .map(|(&x, &y)| (x, y))
            .collect();
        for (left, right) in pairs {
            self.push_derived(ConstraintFormula::TypeEquality { left, right }, var);
        }
    }

    /// Substitute the proper equality `var = ty` into every other unresolved
    /// variable's bounds that mention `var`.
    fn propagate_equality(&mut self, var: InferenceVar, ty: TypeId) {
        let db = self.db();
        let mut subst = VarSubstitution::default();
        subst.insert(var, ty);
        let targets: Vec<(InferenceVar, BoundKind, TypeId)> = self
            .vars
            .iter()
            .filter(|(other, data)| **other != var && data.resolved.is_none())
            .flat_map(|(&other, data)| {
                data.bounds
                    .iter()
                    .filter(|&(_, bound)| mentions_var(db, bound, var))
                    .map(move |(k, bound)| (other, k, bound))
            })
            .collect();
        for (other, kind, bound) in targets {
            let replaced = substitute_vars(db, bound, &subst);
            let formula = bound_formula(db.var(other), kind, replaced);
            self.push_derived(formula, other);
        }
    }
}

#[cfg(test)]
#[path = "../tests/incorporate_tests.rs"]
mod tests;
