//! Resolution of inference variables.
//!
//! When reduction runs dry, the session picks a group of variables whose
//! bounds depend only on each other (a bottom strongly connected group in the
//! dependency graph) and instantiates every member at once:
//!
//! 1. a proper equality bound, if there is one;
//! 2. otherwise the least upper bound of the proper lower bounds;
//! 3. otherwise `RuntimeException` for a variable from a `throws` clause whose
//!    upper bounds allow it;
//! 4. otherwise the greatest lower bound of the proper upper bounds
//!    (`Object` when there are none).
//!
//! The choice is recorded as an equality bound and incorporated like any
//! other, so a bad choice surfaces as a failing derived formula.

use crate::bounds::{BoundKind, VarData, VarSet, bound_dependencies};
use crate::constraint::ConstraintFormula as F;
use crate::diagnostics::{DiagnosticArg, IncompatibilityRecord};
use crate::instantiate::mentions_var;
use crate::session::InferenceSession;
use crate::types::{InferenceVar, TypeData, TypeId};
use polyinfer_common::diagnostics::MessageTemplate;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

/// Upper bounds that still admit `RuntimeException` for a `throws` variable.
const THROWS_DEFAULT_UPPER: [TypeId; 3] = [TypeId::OBJECT, TypeId::THROWABLE, TypeId::EXCEPTION];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ResolutionStep {
    /// Some variables were resolved; reduction continues.
    Progress,
    /// Every variable is resolved and nothing is delayed.
    Complete,
    Failed,
}

impl InferenceSession<'_, '_> {
    pub(crate) fn resolve_next(&mut self) -> ResolutionStep {
        let unresolved: VarSet = self
            .vars
            .iter()
            .filter(|(var, data)| data.resolved.is_none() && !self.resolved.contains_key(*var))
            .map(|(&var, _)| var)
            .collect();

        if unresolved.is_empty() {
            let Some(stuck) = self.delayed.first() else {
                return ResolutionStep::Complete;
            };
            // Only lambdas, method references and their exception checks
            // are ever delayed.
            let expr: DiagnosticArg = match *stuck {
                F::LambdaCompatibility { lambda: expr, .. }
                | F::MethodReferenceCompatibility {
                    reference: expr, ..
                }
                | F::CheckedExceptionCompatibility { expr, .. }
                | F::ExpressionCompatibility { expr, .. } => expr.into(),
                _ => self.delayed.len().into(),
            };
            self.fail(IncompatibilityRecord::new(
                MessageTemplate::CouldNotInfer,
                vec![expr],
            ));
            return ResolutionStep::Failed;
        }

        let graph: FxHashMap<InferenceVar, VarSet> = unresolved
            .iter()
            .filter_map(|&var| {
                let data = self.vars.get(&var)?;
                let mut deps = bound_dependencies(self.db(), var, data, &self.resolved);
                deps.retain(|dep| unresolved.contains(dep));
                Some((var, deps))
            })
            .collect();

        let mut candidates = VarSet::default();
        for formula in &self.delayed {
            candidates.extend(
                self.input_variables(formula)
                    .into_iter()
                    .filter(|var| unresolved.contains(var)),
            );
        }
        if candidates.is_empty() {
            candidates = unresolved.clone();
        }
        let seeds: Vec<InferenceVar> = candidates.iter().copied().collect();
        for var in seeds {
            candidates.extend(reachable(&graph, var));
        }

        // The first candidate, in declaration order, that every variable it
        // reaches can reach back.
        let group: Option<SmallVec<[InferenceVar; 4]>> = unresolved
            .iter()
            .filter(|var| candidates.contains(*var))
            .find_map(|&var| {
                let reach = reachable(&graph, var);
                reach
                    .iter()
                    .all(|&other| reachable(&graph, other).contains(&var))
                    .then(|| std::iter::once(var).chain(reach).collect())
            });
        let Some(group) = group else {
            // Unreachable for a finite graph; fail rather than spin.
            self.fail(IncompatibilityRecord::new(
                MessageTemplate::InferenceCycle,
                vec![unresolved.len().into()],
            ));
            return ResolutionStep::Failed;
        };

        let mut chosen: SmallVec<[(InferenceVar, TypeId); 4]> = SmallVec::new();
        for &var in &group {
            let Some(data) = self.vars.get(&var) else {
                continue;
            };
            match self.instantiation(var, data, &group) {
                Some(ty) => chosen.push((var, ty)),
                None => {
                    self.fail(
                        IncompatibilityRecord::new(
                            MessageTemplate::InferenceCycle,
                            group.iter().map(|&v| v.into()).collect(),
                        )
                        .with_variables(group.iter().copied()),
                    );
                    return ResolutionStep::Failed;
                }
            }
        }
        debug!(
            group = ?group.iter().map(|v| v.0).collect::<Vec<_>>(),
            chosen = ?chosen.iter().map(|(_, t)| t.0).collect::<Vec<_>>(),
            "resolved"
        );

        for &(var, ty) in &chosen {
            self.resolved.insert(var, ty);
            if let Some(data) = self.vars.get_mut(&var) {
                data.resolved = Some(ty);
            }
        }
        for (var, ty) in chosen {
            self.settle(var, ty);
        }
        ResolutionStep::Progress
    }

    /// The instantiation of one group member. `None` when the variable is
    /// only pinned by structured equalities on other members of its group
    /// (`α = List<β>`, `β = List<α>`), which have no finite solution.
    fn instantiation(
        &self,
        var: InferenceVar,
        data: &VarData,
        group: &[InferenceVar],
    ) -> Option<TypeId> {
        let db = self.db();
        let oracle = self.oracle();
        let proper = |kind: BoundKind| -> Vec<TypeId> {
            data.bounds
                .get(kind)
                .iter()
                .map(|&ty| self.substitute(ty))
                .filter(|&ty| self.is_proper(ty))
                .collect()
        };

        if let Some(&eq) = proper(BoundKind::Eq).first() {
            return Some(eq);
        }
        let cyclic = data.bounds.equalities().any(|ty| {
            !matches!(db.lookup(ty), Some(TypeData::Var(_)))
                && group
                    .iter()
                    .any(|&other| other != var && mentions_var(db, ty, other))
        });
        if cyclic {
            return None;
        }

        let lowers: Vec<TypeId> = proper(BoundKind::Lower)
            .into_iter()
            .filter(|&ty| ty != TypeId::NULL)
            .collect();
        if !lowers.is_empty() {
            return Some(oracle.lub(&lowers));
        }
        let uppers = proper(BoundKind::Upper);
        if data.throws && uppers.iter().all(|ty| THROWS_DEFAULT_UPPER.contains(ty)) {
            return Some(TypeId::RUNTIME_EXCEPTION);
        }
        Some(match uppers.len() {
            0 => TypeId::OBJECT,
            1 => uppers[0],
            _ => oracle.glb(&uppers),
        })
    }

    /// Record `var = ty` as a bound and incorporate it.
    fn settle(&mut self, var: InferenceVar, ty: TypeId) {
        if let Some(data) = self.vars.get_mut(&var) {
            data.bounds.insert(BoundKind::Eq, ty);
        }
        self.incorporate(var, BoundKind::Eq, ty);
    }
}

/// Every variable reachable from `start` through direct dependencies,
/// excluding `start` itself.
fn reachable(graph: &FxHashMap<InferenceVar, VarSet>, start: InferenceVar) -> VarSet {
    let mut seen = VarSet::default();
    let mut stack: Vec<InferenceVar> = graph
        .get(&start)
        .map(|deps| deps.iter().copied().collect())
        .unwrap_or_default();
    while let Some(var) = stack.pop() {
        if seen.insert(var)
            && let Some(deps) = graph.get(&var)
        {
            stack.extend(deps.iter().copied());
        }
    }
    seen.shift_remove(&start);
    seen
}

#[cfg(test)]
#[path = "../tests/resolve_tests.rs"]
mod tests;
