//! Bounds on inference variables.
//!
//! Each variable carries three duplicate-free, insertion-ordered sets of
//! bounds. Bound sets only grow during a request; resolution records its
//! choice as one more equality bound.

use crate::instantiate::{VarSubstitution, collect_vars, substitute_vars};
use crate::intern::TypeInterner;
use crate::types::{InferenceVar, TypeId, TypeParamId};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

pub type VarSet = IndexSet<InferenceVar, FxBuildHasher>;
type TypeSet = IndexSet<TypeId, FxBuildHasher>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoundKind {
    /// `α = T`
    Eq,
    /// `α <: T`
    Upper,
    /// `T <: α`
    Lower,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundSet {
    eq: TypeSet,
    upper: TypeSet,
    lower: TypeSet,
}

impl BoundSet {
    /// Insert a bound. Returns `false` if it was already present.
    pub fn insert(&mut self, kind: BoundKind, ty: TypeId) -> bool {
        match kind {
            BoundKind::Eq => self.eq.insert(ty),
            BoundKind::Upper => self.upper.insert(ty),
            BoundKind::Lower => self.lower.insert(ty),
        }
    }

    pub fn contains(&self, kind: BoundKind, ty: TypeId) -> bool {
        self.get(kind).contains(&ty)
    }

    pub fn get(&self, kind: BoundKind) -> &IndexSet<TypeId, FxBuildHasher> {
        match kind {
            BoundKind::Eq => &self.eq,
            BoundKind::Upper => &self.upper,
            BoundKind::Lower => &self.lower,
        }
    }

    pub fn equalities(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.eq.iter().copied()
    }

    pub fn uppers(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.upper.iter().copied()
    }

    pub fn lowers(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.lower.iter().copied()
    }

    /// Every bound, equalities first.
    pub fn iter(&self) -> impl Iterator<Item = (BoundKind, TypeId)> + '_ {
        self.eq
            .iter()
            .map(|&t| (BoundKind::Eq, t))
            .chain(self.upper.iter().map(|&t| (BoundKind::Upper, t)))
            .chain(self.lower.iter().map(|&t| (BoundKind::Lower, t)))
    }

    pub fn len(&self) -> usize {
        self.eq.len() + self.upper.len() + self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-variable state owned by exactly one session.
#[derive(Clone, Debug, Default)]
pub struct VarData {
    pub bounds: BoundSet,
    /// Set exactly once, by resolution.
    pub resolved: Option<TypeId>,
    /// The declared type parameter this variable was created for.
    pub origin: Option<TypeParamId>,
    /// Appears in a `throws` clause; resolves to `RuntimeException` when
    /// otherwise unconstrained.
    pub throws: bool,
}

impl VarData {
    pub fn for_param(origin: TypeParamId) -> Self {
        Self {
            origin: Some(origin),
            ..Self::default()
        }
    }
}

/// The unresolved variables mentioned by any bound of `data`.
///
/// This is the direct dependency relation used to order resolution: a
/// variable depends on every variable its bounds mention.
pub fn bound_dependencies(
    db: &TypeInterner,
    var: InferenceVar,
    data: &VarData,
    resolved: &VarSubstitution,
) -> VarSet {
    let mut out = VarSet::default();
    for (_, ty) in data.bounds.iter() {
        collect_vars(db, substitute_vars(db, ty, resolved), &mut out);
    }
    out.shift_remove(&var);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_duplicate_free() {
        let mut bounds = BoundSet::default();
        assert!(bounds.insert(BoundKind::Lower, TypeId::STRING));
        assert!(!bounds.insert(BoundKind::Lower, TypeId::STRING));
        assert!(bounds.insert(BoundKind::Upper, TypeId::STRING));
        assert_eq!(bounds.len(), 2);
    }

    #[test]
    fn test_iter_orders_equalities_first() {
        let mut bounds = BoundSet::default();
        bounds.insert(BoundKind::Lower, TypeId::INTEGER);
        bounds.insert(BoundKind::Upper, TypeId::NUMBER);
        bounds.insert(BoundKind::Eq, TypeId::INTEGER);
        let kinds: Vec<BoundKind> = bounds.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![BoundKind::Eq, BoundKind::Upper, BoundKind::Lower]);
    }

    #[test]
    fn test_dependencies_skip_self_and_resolved() {
        let db = TypeInterner::new();
        let alpha = InferenceVar(0);
        let beta = InferenceVar(1);
        let gamma = InferenceVar(2);
        let mut data = VarData::default();
        data.bounds.insert(BoundKind::Upper, db.var(alpha));
        data.bounds.insert(BoundKind::Lower, db.var(beta));
        data.bounds.insert(BoundKind::Eq, db.array(db.var(gamma)));

        let mut resolved = VarSubstitution::default();
        let deps = bound_dependencies(&db, alpha, &data, &resolved);
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec![gamma, beta]);

        resolved.insert(gamma, TypeId::STRING);
        let deps = bound_dependencies(&db, alpha, &data, &resolved);
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec![beta]);
    }
}
