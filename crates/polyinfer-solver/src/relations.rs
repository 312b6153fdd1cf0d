//! Nominal type relations over the declarations of a `TypeInterner`.
//!
//! `NominalOracle` implements [`TypeOracle`] with Java-style rules:
//! - primitive widening (`byte <: short <: int <: long <: float <: double`)
//! - nominal subtyping through declared supertypes, with type argument
//!   containment for wildcards
//! - boxing and unboxing, and unchecked conversion from raw types in
//!   assignability
//! - least upper bound via the minimal erased candidate set, with differing
//!   type arguments generalized to `? extends lub(..)`
//!
//! Recursive walks carry a `RecursionGuard`: a subtype question that is
//! already being answered higher up the stack is assumed to hold.

use crate::def::{DefId, DefKind, MethodSig};
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::intern::TypeInterner;
use crate::oracle::TypeOracle;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{PrimitiveKind, TypeData, TypeId, TypeList, WildcardKind};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use tracing::trace;

type DefSet = IndexSet<DefId, FxBuildHasher>;

/// Methods every interface inherits from `Object`; they never count towards
/// the single abstract method of a functional interface.
const OBJECT_METHOD_NAMES: [&str; 3] = ["equals", "hashCode", "toString"];

pub struct NominalOracle<'a> {
    db: &'a TypeInterner,
}

impl<'a> NominalOracle<'a> {
    pub fn new(db: &'a TypeInterner) -> Self {
        Self { db }
    }

    // =========================================================================
    // Subtyping
    // =========================================================================

    fn subtype_at(
        &self,
        sub: TypeId,
        sup: TypeId,
        guard: &mut RecursionGuard<(TypeId, TypeId)>,
    ) -> bool {
        if sub == sup {
            return true;
        }
        match guard.enter((sub, sup)) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return true,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => return false,
        }
        let result = self.subtype_inner(sub, sup, guard);
        guard.leave((sub, sup));
        result
    }

    fn subtype_inner(
        &self,
        sub: TypeId,
        sup: TypeId,
        guard: &mut RecursionGuard<(TypeId, TypeId)>,
    ) -> bool {
        let (Some(sub_data), Some(sup_data)) = (self.db.lookup(sub), self.db.lookup(sup)) else {
            return false;
        };
        match (&sub_data, &sup_data) {
            (TypeData::Void, _) | (_, TypeData::Void) => return false,
            (TypeData::Primitive(a), TypeData::Primitive(b)) => return primitive_widens(*a, *b),
            (TypeData::Primitive(_), _) | (_, TypeData::Primitive(_)) => return false,
            (TypeData::Null, _) => return sup_data.is_reference(),
            _ => {}
        }
        if let TypeData::Intersection(members) = &sup_data {
            return members.iter().all(|&m| self.subtype_at(sub, m, guard));
        }
        if let TypeData::Intersection(members) = &sub_data {
            return members.iter().any(|&m| self.subtype_at(m, sup, guard));
        }
        if let TypeData::Captured(captured) = &sup_data
            && let Some(lower) = self.db.captured_lower_bound(captured)
            && self.subtype_at(sub, lower, guard)
        {
            return true;
        }
        match &sub_data {
            TypeData::TypeParam(param) => {
                return self.subtype_at(self.db.type_param_bound(*param), sup, guard);
            }
            TypeData::Captured(captured) => {
                return self.subtype_at(self.db.captured_upper_bound(captured), sup, guard);
            }
            _ => {}
        }
        match &sup_data {
            TypeData::Class(target) => {
                if target.def == DefId::OBJECT {
                    return sub_data.is_reference();
                }
                let Some(found) = self.as_super(sub, target.def) else {
                    return false;
                };
                if target.args.is_empty() {
                    return true;
                }
                let Some(TypeData::Class(found)) = self.db.lookup(found) else {
                    return false;
                };
                found.args.len() == target.args.len()
                    && target
                        .args
                        .iter()
                        .zip(&found.args)
                        .all(|(&t, &s)| self.contains_at(t, s, guard))
            }
            TypeData::Array(target_elem) => match sub_data {
                TypeData::Array(sub_elem) => {
                    if self.is_primitive(sub_elem) || self.is_primitive(*target_elem) {
                        sub_elem == *target_elem
                    } else {
                        self.subtype_at(sub_elem, *target_elem, guard)
                    }
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Is type argument `arg` contained by `target_arg`?
    fn contains_at(
        &self,
        target_arg: TypeId,
        arg: TypeId,
        guard: &mut RecursionGuard<(TypeId, TypeId)>,
    ) -> bool {
        let arg_data = self.db.lookup(arg);
        match self.db.lookup(target_arg) {
            Some(TypeData::Wildcard(WildcardKind::Unbounded)) => true,
            Some(TypeData::Wildcard(WildcardKind::Extends(upper))) => match arg_data {
                Some(TypeData::Wildcard(WildcardKind::Unbounded)) => upper == TypeId::OBJECT,
                Some(TypeData::Wildcard(WildcardKind::Extends(bound))) => {
                    self.subtype_at(bound, upper, guard)
                }
                Some(TypeData::Wildcard(WildcardKind::Super(_))) => upper == TypeId::OBJECT,
                _ => self.subtype_at(arg, upper, guard),
            },
            Some(TypeData::Wildcard(WildcardKind::Super(lower))) => match arg_data {
                Some(TypeData::Wildcard(WildcardKind::Super(bound))) => {
                    self.subtype_at(lower, bound, guard)
                }
                Some(TypeData::Wildcard(_)) => false,
                _ => self.subtype_at(lower, arg, guard),
            },
            _ => self.is_same_type(target_arg, arg),
        }
    }

    fn is_primitive(&self, ty: TypeId) -> bool {
        matches!(self.db.lookup(ty), Some(TypeData::Primitive(_)))
    }

    // =========================================================================
    // Supertypes
    // =========================================================================

    fn as_super_at(
        &self,
        ty: TypeId,
        def: DefId,
        guard: &mut RecursionGuard<TypeId>,
    ) -> Option<TypeId> {
        let data = self.db.lookup(ty)?;
        if def == DefId::OBJECT && data.is_reference() && !matches!(data, TypeData::Null) {
            return Some(TypeId::OBJECT);
        }
        if !guard.enter(ty).is_entered() {
            return None;
        }
        let found = match data {
            TypeData::Class(class) => {
                if class.def == def {
                    Some(ty)
                } else {
                    let params = self.db.defs().get_type_params(class.def);
                    let raw = class.args.is_empty() && !params.is_empty();
                    let subst = TypeSubstitution::from_args(&params, &class.args);
                    self.db
                        .defs()
                        .get_supertypes(class.def)
                        .into_iter()
                        .find_map(|sup| {
                            let sup = if raw {
                                self.erasure(sup)
                            } else {
                                instantiate_type(self.db, sup, &subst)
                            };
                            self.as_super_at(sup, def, guard)
                        })
                }
            }
            TypeData::TypeParam(param) => {
                self.as_super_at(self.db.type_param_bound(param), def, guard)
            }
            TypeData::Captured(captured) => {
                self.as_super_at(self.db.captured_upper_bound(&captured), def, guard)
            }
            TypeData::Intersection(members) => members
                .iter()
                .find_map(|&m| self.as_super_at(m, def, guard)),
            _ => None,
        };
        guard.leave(ty);
        found
    }

    /// Erased supertype closure of `ty` (including its own declaration), in
    /// breadth-first order with `Object` last.
    fn erased_supertypes(&self, ty: TypeId) -> DefSet {
        let mut out = DefSet::default();
        let mut queue: Vec<TypeId> = vec![ty];
        let mut guard = RecursionGuard::with_profile(RecursionProfile::SupertypeWalk);
        while !queue.is_empty() {
            let current = queue.remove(0);
            if !guard.enter(current).is_entered() {
                continue;
            }
            match self.db.lookup(current) {
                Some(TypeData::Class(class)) => {
                    if out.insert(class.def) {
                        queue.extend(self.db.defs().get_supertypes(class.def));
                    }
                }
                Some(TypeData::TypeParam(param)) => queue.push(self.db.type_param_bound(param)),
                Some(TypeData::Captured(captured)) => {
                    queue.push(self.db.captured_upper_bound(&captured))
                }
                Some(TypeData::Intersection(members)) => queue.extend(members),
                _ => {}
            }
            guard.leave(current);
        }
        out.shift_remove(&DefId::OBJECT);
        out.insert(DefId::OBJECT);
        out
    }

    // =========================================================================
    // Least upper bound
    // =========================================================================

    fn lub_at(&self, types: &[TypeId], depth: u32) -> TypeId {
        let mut distinct: Vec<TypeId> = Vec::new();
        for &ty in types {
            let ty = self.boxed(ty).unwrap_or(ty);
            if ty != TypeId::NULL && !distinct.contains(&ty) {
                distinct.push(ty);
            }
        }
        match distinct.len() {
            0 => {
                return if types.is_empty() {
                    TypeId::OBJECT
                } else {
                    TypeId::NULL
                };
            }
            1 => return distinct[0],
            _ => {}
        }

        let elements: Vec<TypeId> = distinct
            .iter()
            .filter_map(|&ty| match self.db.lookup(ty) {
                Some(TypeData::Array(elem)) => Some(elem),
                _ => None,
            })
            .collect();
        if !elements.is_empty() {
            if elements.len() == distinct.len() && !elements.iter().any(|&e| self.is_primitive(e))
            {
                return self.db.array(self.lub_at(&elements, depth));
            }
            return TypeId::OBJECT;
        }

        for &candidate in &distinct {
            if distinct.iter().all(|&other| self.is_subtype(other, candidate)) {
                return candidate;
            }
        }

        let sets: Vec<DefSet> = distinct
            .iter()
            .map(|&ty| self.erased_supertypes(ty))
            .collect();
        let shared: Vec<DefId> = sets[0]
            .iter()
            .copied()
            .filter(|def| sets[1..].iter().all(|set| set.contains(def)))
            .collect();
        let minimal: Vec<DefId> = shared
            .iter()
            .copied()
            .filter(|&def| {
                !shared.iter().any(|&other| {
                    other != def && self.erased_supertypes(self.db.raw(other)).contains(&def)
                })
            })
            .collect();
        trace!(?distinct, ?minimal, "lub candidates");

        let mut classes = Vec::new();
        let mut interfaces = Vec::new();
        for def in minimal {
            let candidate = self.lub_candidate(&distinct, def, depth);
            match self.db.defs().get_kind(def) {
                Some(DefKind::Interface) => interfaces.push(candidate),
                _ => classes.push(candidate),
            }
        }
        classes.extend(interfaces);
        self.db.intersection(classes)
    }

    /// The parameterization of `def` shared by every type in `types`.
    fn lub_candidate(&self, types: &[TypeId], def: DefId, depth: u32) -> TypeId {
        let supers: Vec<TypeId> = types
            .iter()
            .filter_map(|&ty| self.as_super(ty, def))
            .collect();
        if supers.len() != types.len() {
            return self.db.raw(def);
        }
        if supers.iter().all(|&s| s == supers[0]) {
            return supers[0];
        }
        let mut arg_lists: Vec<TypeList> = Vec::with_capacity(supers.len());
        for &s in &supers {
            match self.db.lookup(s) {
                Some(TypeData::Class(class)) if !class.args.is_empty() => arg_lists.push(class.args),
                _ => return self.db.raw(def),
            }
        }
        let arity = arg_lists[0].len();
        let args: TypeList = (0..arity)
            .map(|i| {
                let column: Vec<TypeId> = arg_lists.iter().map(|args| args[i]).collect();
                if column.iter().all(|&a| a == column[0]) {
                    column[0]
                } else if depth + 1 >= RecursionProfile::LeastUpperBound.max_depth()
                    || column
                        .iter()
                        .any(|&a| matches!(self.db.lookup(a), Some(TypeData::Wildcard(_))))
                {
                    TypeId::WILDCARD
                } else {
                    self.db.wildcard_extends(self.lub_at(&column, depth + 1))
                }
            })
            .collect();
        self.db.class(def, args)
    }

    // =========================================================================
    // Functional interfaces
    // =========================================================================

    fn collect_abstract_methods(
        &self,
        ty: TypeId,
        out: &mut Vec<MethodSig>,
        guard: &mut RecursionGuard<TypeId>,
    ) {
        let Some(TypeData::Class(class)) = self.db.lookup(ty) else {
            return;
        };
        if self.db.defs().get_kind(class.def) != Some(DefKind::Interface) {
            return;
        }
        if !guard.enter(ty).is_entered() {
            return;
        }
        let params = self.db.defs().get_type_params(class.def);
        let raw = class.args.is_empty() && !params.is_empty();
        let subst = TypeSubstitution::from_args(&params, &class.args);
        let adapt = |t: TypeId| {
            if raw {
                self.erasure(t)
            } else {
                instantiate_type(self.db, t, &subst)
            }
        };
        for method in self.db.defs().get_abstract_methods(class.def) {
            let name = self.db.resolve_atom(method.name);
            if OBJECT_METHOD_NAMES.contains(&&*name) {
                continue;
            }
            let adapted = MethodSig {
                params: method.params.iter().map(|&p| adapt(p)).collect(),
                return_type: adapt(method.return_type),
                thrown: method.thrown.iter().map(|&t| adapt(t)).collect(),
                ..method
            };
            let overridden = out.iter().any(|m| {
                m.name == adapted.name
                    && m.params.len() == adapted.params.len()
                    && m.params
                        .iter()
                        .zip(&adapted.params)
                        .all(|(&a, &b)| self.erasure(a) == self.erasure(b))
            });
            if !overridden {
                out.push(adapted);
            }
        }
        for sup in self.db.defs().get_supertypes(class.def) {
            self.collect_abstract_methods(adapt(sup), out, guard);
        }
        guard.leave(ty);
    }
}

fn primitive_widens(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    if from == to {
        return true;
    }
    from.direct_supertypes()
        .iter()
        .any(|&next| primitive_widens(next, to))
}

impl TypeOracle for NominalOracle<'_> {
    fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::SubtypeCheck);
        self.subtype_at(sub, sup, &mut guard)
    }

    fn is_assignable(&self, target: TypeId, source: TypeId) -> bool {
        if self.is_subtype(source, target) {
            return true;
        }
        let (Some(source_data), Some(target_data)) =
            (self.db.lookup(source), self.db.lookup(target))
        else {
            return false;
        };
        match (&source_data, &target_data) {
            (TypeData::Primitive(p), _) if target_data.is_reference() => {
                self.is_subtype(p.boxed(), target)
            }
            (_, TypeData::Primitive(q)) => self
                .unboxed(source)
                .and_then(|p| match self.db.lookup(p) {
                    Some(TypeData::Primitive(p)) => Some(primitive_widens(p, *q)),
                    _ => None,
                })
                .unwrap_or(false),
            (_, TypeData::Class(class)) if !class.args.is_empty() => {
                // Unchecked conversion: raw source, parameterized target.
                matches!(
                    self.as_super(source, class.def).and_then(|s| self.db.lookup(s)),
                    Some(TypeData::Class(found)) if found.args.is_empty()
                )
            }
            _ => false,
        }
    }

    fn erasure(&self, ty: TypeId) -> TypeId {
        match self.db.lookup(ty) {
            Some(TypeData::Class(class)) if !class.args.is_empty() => self.db.raw(class.def),
            Some(TypeData::Array(elem)) => self.db.array(self.erasure(elem)),
            Some(TypeData::TypeParam(param)) => {
                let bound = self.db.type_param_bound(param);
                match self.db.lookup(bound) {
                    // A bound naming another type parameter erases to Object.
                    Some(TypeData::TypeParam(_)) => TypeId::OBJECT,
                    _ => self.erasure(bound),
                }
            }
            Some(TypeData::Captured(captured)) => {
                self.erasure(self.db.captured_upper_bound(&captured))
            }
            Some(TypeData::Intersection(members)) => members
                .first()
                .map(|&m| self.erasure(m))
                .unwrap_or(TypeId::OBJECT),
            Some(TypeData::Wildcard(WildcardKind::Extends(bound))) => self.erasure(bound),
            Some(TypeData::Wildcard(_)) | Some(TypeData::Var(_)) => TypeId::OBJECT,
            _ => ty,
        }
    }

    fn boxed(&self, ty: TypeId) -> Option<TypeId> {
        match self.db.lookup(ty) {
            Some(TypeData::Primitive(p)) => Some(p.boxed()),
            _ => None,
        }
    }

    fn unboxed(&self, ty: TypeId) -> Option<TypeId> {
        PrimitiveKind::from_boxed(ty).map(PrimitiveKind::type_id)
    }

    fn as_super(&self, ty: TypeId, def: DefId) -> Option<TypeId> {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::SupertypeWalk);
        self.as_super_at(ty, def, &mut guard)
    }

    fn functional_method(&self, ty: TypeId) -> Option<MethodSig> {
        if let Some(TypeData::Intersection(members)) = self.db.lookup(ty) {
            return members.iter().find_map(|&m| self.functional_method(m));
        }
        let mut methods = Vec::new();
        let mut guard = RecursionGuard::with_profile(RecursionProfile::SupertypeWalk);
        self.collect_abstract_methods(ty, &mut methods, &mut guard);
        if methods.len() == 1 {
            methods.pop()
        } else {
            None
        }
    }

    fn lub(&self, types: &[TypeId]) -> TypeId {
        self.lub_at(types, 0)
    }

    fn glb(&self, types: &[TypeId]) -> TypeId {
        let mut kept: Vec<TypeId> = Vec::new();
        for &ty in types {
            if kept.contains(&ty) {
                continue;
            }
            if types
                .iter()
                .any(|&other| other != ty && self.is_subtype(other, ty) && !self.is_subtype(ty, other))
            {
                continue;
            }
            kept.push(ty);
        }
        // Classes before interfaces, so the first member is the erasure.
        kept.sort_by_key(|&ty| match self.db.lookup(ty) {
            Some(TypeData::Class(class)) => {
                self.db.defs().get_kind(class.def) == Some(DefKind::Interface)
            }
            _ => true,
        });
        self.db.intersection(kept)
    }

    fn is_checked_exception(&self, ty: TypeId) -> bool {
        self.as_super(ty, DefId::THROWABLE).is_some()
            && !self.is_subtype(ty, TypeId::RUNTIME_EXCEPTION)
            && !self.is_subtype(ty, TypeId::ERROR)
    }
}

#[cfg(test)]
#[path = "../tests/relations_tests.rs"]
mod tests;
