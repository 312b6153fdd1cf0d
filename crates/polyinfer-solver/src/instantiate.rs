//! Substitution and structural queries over types.
//!
//! Two kinds of substitution run through the solver:
//! - [`TypeSubstitution`] replaces declared type parameters, e.g. a generic
//!   method's `T` by a fresh inference variable, or an interface's `E` by a
//!   concrete argument when walking supertypes.
//! - [`VarSubstitution`] replaces inference variables by their resolved types.
//!
//! Both rebuild only the parts of a type that actually change; untouched
//! subtrees keep their `TypeId`.

use crate::intern::TypeInterner;
use crate::types::{
    ClassType, InferenceVar, TypeData, TypeId, TypeList, TypeParamId, WildcardKind,
};
use indexmap::{IndexMap, IndexSet};
use polyinfer_common::limits::MAX_TYPE_WALK_DEPTH;
use rustc_hash::{FxBuildHasher, FxHashMap};

/// Mapping from declared type parameters to types, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: IndexMap<TypeParamId, TypeId, FxBuildHasher>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair parameters with arguments. Extra parameters stay unmapped.
    pub fn from_args(params: &[TypeParamId], args: &[TypeId]) -> Self {
        let mut subst = Self::new();
        for (&param, &arg) in params.iter().zip(args) {
            subst.insert(param, arg);
        }
        subst
    }

    pub fn insert(&mut self, param: TypeParamId, ty: TypeId) {
        self.map.insert(param, ty);
    }

    pub fn get(&self, param: TypeParamId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeParamId, TypeId)> + '_ {
        self.map.iter().map(|(&p, &t)| (p, t))
    }
}

/// Resolved inference variables.
pub type VarSubstitution = FxHashMap<InferenceVar, TypeId>;

/// Rebuild `ty`, letting `leaf` replace any node it returns `Some` for.
///
/// Captured types are leaves. Past `MAX_TYPE_WALK_DEPTH` the remaining
/// subtree is returned unchanged.
pub fn map_type<F>(db: &TypeInterner, ty: TypeId, leaf: &mut F) -> TypeId
where
    F: FnMut(&TypeData) -> Option<TypeId>,
{
    map_type_at(db, ty, leaf, 0)
}

fn map_type_at<F>(db: &TypeInterner, ty: TypeId, leaf: &mut F, depth: u32) -> TypeId
where
    F: FnMut(&TypeData) -> Option<TypeId>,
{
    if depth > MAX_TYPE_WALK_DEPTH {
        return ty;
    }
    let Some(data) = db.lookup(ty) else {
        return ty;
    };
    if let Some(replacement) = leaf(&data) {
        return replacement;
    }
    match data {
        TypeData::Class(class) => {
            if class.args.is_empty() {
                return ty;
            }
            let args: TypeList = class
                .args
                .iter()
                .map(|&arg| map_type_at(db, arg, leaf, depth + 1))
                .collect();
            if args == class.args {
                ty
            } else {
                db.intern(TypeData::Class(ClassType {
                    def: class.def,
                    args,
                }))
            }
        }
        TypeData::Array(element) => {
            let mapped = map_type_at(db, element, leaf, depth + 1);
            if mapped == element {
                ty
            } else {
                db.array(mapped)
            }
        }
        TypeData::Wildcard(WildcardKind::Extends(bound)) => {
            let mapped = map_type_at(db, bound, leaf, depth + 1);
            if mapped == bound {
                ty
            } else {
                db.wildcard_extends(mapped)
            }
        }
        TypeData::Wildcard(WildcardKind::Super(bound)) => {
            let mapped = map_type_at(db, bound, leaf, depth + 1);
            if mapped == bound {
                ty
            } else {
                db.wildcard_super(mapped)
            }
        }
        TypeData::Intersection(members) => {
            let mapped: TypeList = members
                .iter()
                .map(|&m| map_type_at(db, m, leaf, depth + 1))
                .collect();
            if mapped == members {
                ty
            } else {
                db.intersection(mapped)
            }
        }
        TypeData::Void
        | TypeData::Null
        | TypeData::Primitive(_)
        | TypeData::TypeParam(_)
        | TypeData::Wildcard(WildcardKind::Unbounded)
        | TypeData::Captured(_)
        | TypeData::Var(_) => ty,
    }
}

/// Does any node of `ty` satisfy `pred`? Captured types are leaves.
pub fn any_node<F>(db: &TypeInterner, ty: TypeId, pred: &mut F) -> bool
where
    F: FnMut(&TypeData) -> bool,
{
    any_node_at(db, ty, pred, 0)
}

fn any_node_at<F>(db: &TypeInterner, ty: TypeId, pred: &mut F, depth: u32) -> bool
where
    F: FnMut(&TypeData) -> bool,
{
    if depth > MAX_TYPE_WALK_DEPTH {
        return false;
    }
    let Some(data) = db.lookup(ty) else {
        return false;
    };
    if pred(&data) {
        return true;
    }
    match data {
        TypeData::Class(class) => class
            .args
            .iter()
            .any(|&arg| any_node_at(db, arg, pred, depth + 1)),
        TypeData::Array(element) => any_node_at(db, element, pred, depth + 1),
        TypeData::Wildcard(WildcardKind::Extends(bound) | WildcardKind::Super(bound)) => {
            any_node_at(db, bound, pred, depth + 1)
        }
        TypeData::Intersection(members) => members
            .iter()
            .any(|&m| any_node_at(db, m, pred, depth + 1)),
        _ => false,
    }
}

/// Apply a type parameter substitution.
pub fn instantiate_type(db: &TypeInterner, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
    if subst.is_empty() {
        return ty;
    }
    map_type(db, ty, &mut |data| match data {
        TypeData::TypeParam(param) => subst.get(*param),
        _ => None,
    })
}

/// Replace resolved inference variables.
pub fn substitute_vars(db: &TypeInterner, ty: TypeId, subst: &VarSubstitution) -> TypeId {
    if subst.is_empty() {
        return ty;
    }
    map_type(db, ty, &mut |data| match data {
        TypeData::Var(var) => subst.get(var).copied(),
        _ => None,
    })
}

pub fn contains_vars(db: &TypeInterner, ty: TypeId) -> bool {
    any_node(db, ty, &mut |data| matches!(data, TypeData::Var(_)))
}

pub fn mentions_var(db: &TypeInterner, ty: TypeId, var: InferenceVar) -> bool {
    any_node(db, ty, &mut |data| matches!(data, TypeData::Var(v) if *v == var))
}

pub fn contains_type_params(db: &TypeInterner, ty: TypeId) -> bool {
    any_node(db, ty, &mut |data| matches!(data, TypeData::TypeParam(_)))
}

/// Does `ty` mention any of `params`?
pub fn mentions_type_params(db: &TypeInterner, ty: TypeId, params: &[TypeParamId]) -> bool {
    any_node(
        db,
        ty,
        &mut |data| matches!(data, TypeData::TypeParam(p) if params.contains(p)),
    )
}

/// Inference variables mentioned in `ty`, in first-occurrence order.
pub fn collect_vars(db: &TypeInterner, ty: TypeId, out: &mut IndexSet<InferenceVar, FxBuildHasher>) {
    any_node(db, ty, &mut |data| {
        if let TypeData::Var(var) = data {
            out.insert(*var);
        }
        false
    });
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
