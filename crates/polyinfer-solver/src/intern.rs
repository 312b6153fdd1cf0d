//! Type interning.
//!
//! `TypeInterner` is the type store shared by every inference request: it
//! hands out `TypeId`s for structural `TypeData`, owns the declaration store
//! and the declared type parameters, and allocates capture ids. Everything
//! goes through `&self`, so one store can serve concurrent requests.

use crate::def::{DefId, DefinitionInfo, DefinitionStore};
use crate::instantiate::contains_type_params;
use crate::types::{
    CapturedWildcard, ClassType, InferenceVar, PrimitiveKind, TypeData, TypeId, TypeList,
    TypeParamId, TypeParamInfo, WildcardKind,
};
use polyinfer_common::interner::{Atom, Interner};
use polyinfer_common::limits::TYPE_STORE_CAPACITY;
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{trace, warn};

#[derive(Default)]
struct TypeStore {
    types: Vec<TypeData>,
    map: FxHashMap<TypeData, TypeId>,
}

pub struct TypeInterner {
    store: RwLock<TypeStore>,
    type_params: RwLock<Vec<TypeParamInfo>>,
    defs: DefinitionStore,
    names: Interner,
    next_capture: AtomicU32,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    /// Create a store with the intrinsic types and well-known declarations
    /// pre-registered at their fixed ids.
    pub fn new() -> Self {
        let interner = Self {
            store: RwLock::new(TypeStore {
                types: Vec::with_capacity(TYPE_STORE_CAPACITY),
                map: FxHashMap::default(),
            }),
            type_params: RwLock::new(Vec::new()),
            defs: DefinitionStore::new(),
            names: Interner::new(),
            next_capture: AtomicU32::new(0),
        };
        interner.intern(TypeData::Void);
        interner.intern(TypeData::Null);
        for kind in PrimitiveKind::ALL {
            interner.intern(TypeData::Primitive(kind));
        }
        interner.intern(TypeData::Wildcard(WildcardKind::Unbounded));

        let object = interner.register_well_known("Object", None);
        let number = interner.register_well_known("Number", Some(object));
        for name in [
            "Boolean",
            "Byte",
            "Short",
            "Character",
            "Integer",
            "Long",
            "Float",
            "Double",
        ] {
            let numeric = !matches!(name, "Boolean" | "Character");
            interner.register_well_known(name, Some(if numeric { number } else { object }));
        }
        interner.register_well_known("String", Some(object));
        let throwable = interner.register_well_known("Throwable", Some(object));
        let exception = interner.register_well_known("Exception", Some(throwable));
        interner.register_well_known("RuntimeException", Some(exception));
        interner.register_well_known("Error", Some(throwable));
        debug_assert_eq!(interner.len() as u32, TypeId::FIRST_USER);
        interner
    }

    fn register_well_known(&self, name: &str, superclass: Option<TypeId>) -> TypeId {
        let def = self.defs.register(DefinitionInfo::class(self.names.intern(name), &[]));
        if let Some(sup) = superclass {
            self.defs.add_supertype(def, sup);
        }
        self.class(def, TypeList::new())
    }

    /// Intern structural data, returning the existing id for a repeat.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Ok(store) = self.store.read()
            && let Some(&id) = store.map.get(&data)
        {
            return id;
        }
        let Ok(mut store) = self.store.write() else {
            warn!(data = ?data, "type store lock poisoned, interning as Object");
            return TypeId::OBJECT;
        };
        if let Some(&id) = store.map.get(&data) {
            return id;
        }
        let id = TypeId(store.types.len() as u32);
        trace!(type_id = id.0, data = ?data, "TypeInterner::intern");
        store.types.push(data.clone());
        store.map.insert(data, id);
        id
    }

    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        let store = self.store.read().ok()?;
        store.types.get(id.0 as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.store.read().map(|s| s.types.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn primitive(&self, kind: PrimitiveKind) -> TypeId {
        kind.type_id()
    }

    /// A class type. Empty `args` on a generic declaration is the raw type.
    pub fn class(&self, def: DefId, args: TypeList) -> TypeId {
        self.intern(TypeData::Class(ClassType { def, args }))
    }

    pub fn raw(&self, def: DefId) -> TypeId {
        self.class(def, TypeList::new())
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Array(element))
    }

    pub fn type_param(&self, param: TypeParamId) -> TypeId {
        self.intern(TypeData::TypeParam(param))
    }

    pub fn var(&self, var: InferenceVar) -> TypeId {
        self.intern(TypeData::Var(var))
    }

    pub fn wildcard(&self) -> TypeId {
        TypeId::WILDCARD
    }

    pub fn wildcard_extends(&self, bound: TypeId) -> TypeId {
        self.intern(TypeData::Wildcard(WildcardKind::Extends(bound)))
    }

    pub fn wildcard_super(&self, bound: TypeId) -> TypeId {
        self.intern(TypeData::Wildcard(WildcardKind::Super(bound)))
    }

    pub fn captured(&self, captured: CapturedWildcard) -> TypeId {
        self.intern(TypeData::Captured(captured))
    }

    /// Normalized intersection: nested intersections are flattened, repeats
    /// and a redundant `Object` are dropped, and a single member stands alone.
    pub fn intersection(&self, members: impl IntoIterator<Item = TypeId>) -> TypeId {
        let mut flat = TypeList::new();
        for member in members {
            match self.lookup(member) {
                Some(TypeData::Intersection(inner)) => {
                    for m in inner {
                        if !flat.contains(&m) {
                            flat.push(m);
                        }
                    }
                }
                _ => {
                    if !flat.contains(&member) {
                        flat.push(member);
                    }
                }
            }
        }
        if flat.len() > 1 {
            flat.retain(|m| *m != TypeId::OBJECT);
        }
        match flat.len() {
            0 => TypeId::OBJECT,
            1 => flat[0],
            _ => self.intern(TypeData::Intersection(flat)),
        }
    }

    // =========================================================================
    // Names, type parameters, declarations
    // =========================================================================

    pub fn intern_string(&self, s: &str) -> Atom {
        self.names.intern(s)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.names.resolve(atom)
    }

    /// Declare a type parameter with an `Object` bound.
    pub fn fresh_type_param(&self, name: &str) -> TypeParamId {
        let name = self.names.intern(name);
        let Ok(mut params) = self.type_params.write() else {
            return TypeParamId(u32::MAX);
        };
        let id = TypeParamId(params.len() as u32);
        params.push(TypeParamInfo {
            name,
            bound: TypeId::OBJECT,
        });
        id
    }

    /// Set the declared bound. Done after creation so that a bound can mention
    /// its own parameter (`T extends Comparable<T>`).
    pub fn set_type_param_bound(&self, param: TypeParamId, bound: TypeId) {
        if let Ok(mut params) = self.type_params.write()
            && let Some(info) = params.get_mut(param.0 as usize)
        {
            info.bound = bound;
        }
    }

    pub fn type_param_info(&self, param: TypeParamId) -> Option<TypeParamInfo> {
        let params = self.type_params.read().ok()?;
        params.get(param.0 as usize).cloned()
    }

    pub fn type_param_bound(&self, param: TypeParamId) -> TypeId {
        self.type_param_info(param)
            .map(|info| info.bound)
            .unwrap_or(TypeId::OBJECT)
    }

    pub fn defs(&self) -> &DefinitionStore {
        &self.defs
    }

    pub fn declare_class(&self, name: &str, type_params: &[TypeParamId]) -> DefId {
        self.defs
            .register(DefinitionInfo::class(self.names.intern(name), type_params))
    }

    pub fn declare_interface(&self, name: &str, type_params: &[TypeParamId]) -> DefId {
        self.defs
            .register(DefinitionInfo::interface(self.names.intern(name), type_params))
    }

    /// The declaration applied to its own type parameters (`List<E>` inside `List`).
    pub fn self_type(&self, def: DefId) -> TypeId {
        let args: TypeList = self
            .defs
            .get_type_params(def)
            .into_iter()
            .map(|p| self.type_param(p))
            .collect();
        self.class(def, args)
    }

    // =========================================================================
    // Capture
    // =========================================================================

    pub fn next_capture_id(&self) -> u32 {
        self.next_capture.fetch_add(1, Ordering::Relaxed)
    }

    /// Upper bound of a captured wildcard: the wildcard's own upper bound
    /// combined with the declared bound of the parameter it stands in for.
    /// Declared bounds that mention type parameters are not carried over.
    pub fn captured_upper_bound(&self, captured: &CapturedWildcard) -> TypeId {
        let declared = self.type_param_bound(captured.param);
        let declared = if contains_type_params(self, declared) {
            TypeId::OBJECT
        } else {
            declared
        };
        match self.lookup(captured.wildcard) {
            Some(TypeData::Wildcard(WildcardKind::Extends(bound))) => {
                if declared == TypeId::OBJECT || declared == bound {
                    bound
                } else {
                    self.intersection([bound, declared])
                }
            }
            _ => declared,
        }
    }

    pub fn captured_lower_bound(&self, captured: &CapturedWildcard) -> Option<TypeId> {
        match self.lookup(captured.wildcard) {
            Some(TypeData::Wildcard(WildcardKind::Super(bound))) => Some(bound),
            _ => None,
        }
    }

    /// Convenience for tests and fixtures: `def<args...>`.
    pub fn apply(&self, def: DefId, args: &[TypeId]) -> TypeId {
        self.class(def, args.iter().copied().collect())
    }

    /// Convenience: a single-argument parameterization.
    pub fn apply1(&self, def: DefId, arg: TypeId) -> TypeId {
        self.class(def, smallvec![arg])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    #[test]
    fn test_poisoned_store_interns_as_object() {
        let db = TypeInterner::new();
        let poisoned = catch_unwind(AssertUnwindSafe(|| {
            let _guard = db.store.write();
            panic!("writer died");
        }));
        assert!(poisoned.is_err());
        assert_eq!(db.intern(TypeData::Array(TypeId::STRING)), TypeId::OBJECT);
    }
}
