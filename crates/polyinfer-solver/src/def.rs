//! Class and interface declarations known to the solver.
//!
//! The solver only needs the nominal skeleton of a declaration: its type
//! parameters, its direct supertypes (written in terms of its own type
//! parameters) and, for interfaces, the abstract methods that decide whether
//! it is a functional interface. Bodies, fields and concrete methods live with
//! whoever drives inference.
//!
//! ## Well-known declarations
//!
//! | DefId | Declaration |
//! |-------|-------------|
//! | 1 | `Object` |
//! | 2 | `Number` |
//! | 3..=10 | primitive boxes (`Boolean` .. `Double`) |
//! | 11 | `String` |
//! | 12..=15 | `Throwable`, `Exception`, `RuntimeException`, `Error` |
//!
//! These are registered by `TypeInterner::new` in exactly this order.

use crate::types::{TypeId, TypeParamId};
use dashmap::DashMap;
use polyinfer_common::interner::Atom;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

/// Identifier of a class or interface declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    pub const OBJECT: Self = Self(1);
    pub const NUMBER: Self = Self(2);
    pub const BOOLEAN: Self = Self(3);
    pub const BYTE: Self = Self(4);
    pub const SHORT: Self = Self(5);
    pub const CHARACTER: Self = Self(6);
    pub const INTEGER: Self = Self(7);
    pub const LONG: Self = Self(8);
    pub const FLOAT: Self = Self(9);
    pub const DOUBLE: Self = Self(10);
    pub const STRING: Self = Self(11);
    pub const THROWABLE: Self = Self(12);
    pub const EXCEPTION: Self = Self(13);
    pub const RUNTIME_EXCEPTION: Self = Self(14);
    pub const ERROR: Self = Self(15);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

/// Kind of declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    Class,
    Interface,
}

/// A method signature: a generic method being called, the member named by a
/// method reference, or an abstract method of an interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSig {
    pub name: Atom,
    /// The method's own type parameters (not those of its class).
    pub type_params: SmallVec<[TypeParamId; 2]>,
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    /// Declared `throws` clause. May mention the method's type parameters.
    pub thrown: Vec<TypeId>,
    /// The last parameter is an array accepting variable arity.
    pub varargs: bool,
}

impl MethodSig {
    pub fn new(name: Atom, params: Vec<TypeId>, return_type: TypeId) -> Self {
        Self {
            name,
            type_params: SmallVec::new(),
            params,
            return_type,
            thrown: Vec::new(),
            varargs: false,
        }
    }

    pub fn with_type_params(mut self, params: impl IntoIterator<Item = TypeParamId>) -> Self {
        self.type_params = params.into_iter().collect();
        self
    }

    pub fn with_thrown(mut self, thrown: Vec<TypeId>) -> Self {
        self.thrown = thrown;
        self
    }

    /// Marks the last parameter as variable arity. A signature without
    /// parameters stays fixed-arity.
    pub fn with_varargs(mut self) -> Self {
        self.varargs = !self.params.is_empty();
        self
    }

    /// Variable arity with a trailing parameter to spread into.
    pub fn is_variable_arity(&self) -> bool {
        self.varargs && !self.params.is_empty()
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// Stored declaration data.
#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    pub name: Atom,
    pub type_params: SmallVec<[TypeParamId; 2]>,
    /// Direct superclass and superinterfaces, in terms of `type_params`.
    pub supertypes: Vec<TypeId>,
    /// Abstract methods declared directly on this declaration.
    pub abstract_methods: Vec<MethodSig>,
}

impl DefinitionInfo {
    pub fn class(name: Atom, type_params: &[TypeParamId]) -> Self {
        Self {
            kind: DefKind::Class,
            name,
            type_params: type_params.iter().copied().collect(),
            supertypes: Vec::new(),
            abstract_methods: Vec::new(),
        }
    }

    pub fn interface(name: Atom, type_params: &[TypeParamId]) -> Self {
        Self {
            kind: DefKind::Interface,
            ..Self::class(name, type_params)
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// Concurrent declaration storage.
///
/// Declarations can be registered and extended through `&self`, which lets a
/// single store be shared by many concurrent inference requests.
pub struct DefinitionStore {
    definitions: DashMap<DefId, DefinitionInfo>,
    next_id: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            next_id: AtomicU32::new(DefId::FIRST_VALID),
        }
    }

    fn allocate(&self) -> DefId {
        DefId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a new definition and return its `DefId`.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = self.allocate();
        trace!(def_id = id.0, kind = ?info.kind, "DefinitionStore::register");
        self.definitions.insert(id, info);
        id
    }

    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|r| r.clone())
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn get_kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|r| r.kind)
    }

    pub fn get_name(&self, id: DefId) -> Option<Atom> {
        self.definitions.get(&id).map(|r| r.name)
    }

    pub fn get_type_params(&self, id: DefId) -> SmallVec<[TypeParamId; 2]> {
        self.definitions
            .get(&id)
            .map(|r| r.type_params.clone())
            .unwrap_or_default()
    }

    pub fn get_supertypes(&self, id: DefId) -> Vec<TypeId> {
        self.definitions
            .get(&id)
            .map(|r| r.supertypes.clone())
            .unwrap_or_default()
    }

    pub fn get_abstract_methods(&self, id: DefId) -> Vec<MethodSig> {
        self.definitions
            .get(&id)
            .map(|r| r.abstract_methods.clone())
            .unwrap_or_default()
    }

    /// Add a direct supertype. Used after registration so that a declaration
    /// can name itself in its supertypes (`Integer implements Comparable<Integer>`).
    pub fn add_supertype(&self, id: DefId, supertype: TypeId) {
        if let Some(mut entry) = self.definitions.get_mut(&id)
            && !entry.supertypes.contains(&supertype)
        {
            entry.supertypes.push(supertype);
        }
    }

    pub fn add_abstract_method(&self, id: DefId, method: MethodSig) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.abstract_methods.push(method);
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
