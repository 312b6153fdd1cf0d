//! Core type representation.
//!
//! Types are interned: a `TypeId` is a u32 handle into the `TypeInterner`, so
//! equality of two fully built types is an integer comparison. The solver never
//! mutates a type; substitution builds (and interns) a new one.

use crate::def::DefId;
use polyinfer_common::interner::Atom;
use serde::Serialize;
use smallvec::SmallVec;

/// Type arguments, intersection conjuncts and similar short lists.
pub type TypeList = SmallVec<[TypeId; 4]>;

/// Handle to an interned type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const NULL: TypeId = TypeId(1);

    pub const BOOLEAN: TypeId = TypeId(2);
    pub const BYTE: TypeId = TypeId(3);
    pub const SHORT: TypeId = TypeId(4);
    pub const CHAR: TypeId = TypeId(5);
    pub const INT: TypeId = TypeId(6);
    pub const LONG: TypeId = TypeId(7);
    pub const FLOAT: TypeId = TypeId(8);
    pub const DOUBLE: TypeId = TypeId(9);

    /// Unbounded wildcard `?`.
    pub const WILDCARD: TypeId = TypeId(10);

    // Well-known class types, interned in this order by `TypeInterner::new`.
    pub const OBJECT: TypeId = TypeId(11);
    pub const NUMBER: TypeId = TypeId(12);
    pub const BOOLEAN_BOX: TypeId = TypeId(13);
    pub const BYTE_BOX: TypeId = TypeId(14);
    pub const SHORT_BOX: TypeId = TypeId(15);
    pub const CHARACTER: TypeId = TypeId(16);
    pub const INTEGER: TypeId = TypeId(17);
    pub const LONG_BOX: TypeId = TypeId(18);
    pub const FLOAT_BOX: TypeId = TypeId(19);
    pub const DOUBLE_BOX: TypeId = TypeId(20);
    pub const STRING: TypeId = TypeId(21);
    pub const THROWABLE: TypeId = TypeId(22);
    pub const EXCEPTION: TypeId = TypeId(23);
    pub const RUNTIME_EXCEPTION: TypeId = TypeId(24);
    pub const ERROR: TypeId = TypeId(25);

    /// First id handed out for user-built types.
    pub const FIRST_USER: u32 = 26;
}

/// Primitive types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn type_id(self) -> TypeId {
        match self {
            PrimitiveKind::Boolean => TypeId::BOOLEAN,
            PrimitiveKind::Byte => TypeId::BYTE,
            PrimitiveKind::Short => TypeId::SHORT,
            PrimitiveKind::Char => TypeId::CHAR,
            PrimitiveKind::Int => TypeId::INT,
            PrimitiveKind::Long => TypeId::LONG,
            PrimitiveKind::Float => TypeId::FLOAT,
            PrimitiveKind::Double => TypeId::DOUBLE,
        }
    }

    /// The box class type (`int` -> `Integer`).
    pub fn boxed(self) -> TypeId {
        match self {
            PrimitiveKind::Boolean => TypeId::BOOLEAN_BOX,
            PrimitiveKind::Byte => TypeId::BYTE_BOX,
            PrimitiveKind::Short => TypeId::SHORT_BOX,
            PrimitiveKind::Char => TypeId::CHARACTER,
            PrimitiveKind::Int => TypeId::INTEGER,
            PrimitiveKind::Long => TypeId::LONG_BOX,
            PrimitiveKind::Float => TypeId::FLOAT_BOX,
            PrimitiveKind::Double => TypeId::DOUBLE_BOX,
        }
    }

    pub fn from_boxed(ty: TypeId) -> Option<PrimitiveKind> {
        PrimitiveKind::ALL.into_iter().find(|p| p.boxed() == ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Direct supertypes under primitive subtyping:
    /// double > float > long > int > char, int > short > byte.
    pub fn direct_supertypes(self) -> &'static [PrimitiveKind] {
        match self {
            PrimitiveKind::Byte => &[PrimitiveKind::Short],
            PrimitiveKind::Short | PrimitiveKind::Char => &[PrimitiveKind::Int],
            PrimitiveKind::Int => &[PrimitiveKind::Long],
            PrimitiveKind::Long => &[PrimitiveKind::Float],
            PrimitiveKind::Float => &[PrimitiveKind::Double],
            PrimitiveKind::Double | PrimitiveKind::Boolean => &[],
        }
    }
}

/// An inference variable: a placeholder for a not-yet-determined type
/// argument. Ids are unique within one inference request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InferenceVar(pub u32);

/// A declared type parameter (of a class, interface or method).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParamId(pub u32);

/// Declared type parameter data.
#[derive(Clone, Debug)]
pub struct TypeParamInfo {
    pub name: Atom,
    /// Declared upper bound (`TypeId::OBJECT` when absent). May be an
    /// intersection and may mention type parameters of the same declaration.
    pub bound: TypeId,
}

/// A parameterized (or raw) class or interface type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub def: DefId,
    /// Empty for non-generic declarations and for raw uses of generic ones.
    pub args: TypeList,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    Unbounded,
    Extends(TypeId),
    Super(TypeId),
}

/// A fresh type variable introduced by capture conversion of one wildcard
/// type argument.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CapturedWildcard {
    /// Unique per type store.
    pub id: u32,
    /// The wildcard that was captured.
    pub wildcard: TypeId,
    /// The formal type parameter in whose position the wildcard appeared.
    pub param: TypeParamId,
}

/// Structural type data.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Void,
    Null,
    Primitive(PrimitiveKind),
    Class(ClassType),
    Array(TypeId),
    TypeParam(TypeParamId),
    Wildcard(WildcardKind),
    Intersection(TypeList),
    Captured(CapturedWildcard),
    Var(InferenceVar),
}

impl TypeData {
    /// Reference types are everything a `null` or an `Object` slot accepts.
    pub fn is_reference(&self) -> bool {
        !matches!(
            self,
            TypeData::Void | TypeData::Primitive(_) | TypeData::Wildcard(_)
        )
    }
}
