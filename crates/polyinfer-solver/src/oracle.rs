//! Type relation queries the inference engine depends on.
//!
//! The engine decides *which* questions to ask; the oracle answers them. Every
//! query is only ever asked about proper types (no unresolved inference
//! variables), except `as_super` and `functional_method`, which treat
//! inference variables nested inside type arguments as opaque leaves.
//!
//! [`NominalOracle`](crate::relations::NominalOracle) is the reference
//! implementation over the declarations in a `TypeInterner`. A host with its
//! own type system plugs in by implementing this trait.

use crate::def::{DefId, MethodSig};
use crate::types::TypeId;

pub trait TypeOracle {
    /// `sub <: sup`.
    fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool;

    /// Is a value of type `source` assignable to `target` in a loose
    /// invocation context (widening, boxing, unboxing, unchecked conversion)?
    fn is_assignable(&self, target: TypeId, source: TypeId) -> bool;

    fn is_same_type(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    fn erasure(&self, ty: TypeId) -> TypeId;

    /// `int` -> `Integer`. `None` for anything but a primitive.
    fn boxed(&self, ty: TypeId) -> Option<TypeId>;

    /// `Integer` -> `int`. `None` for anything but a box type.
    fn unboxed(&self, ty: TypeId) -> Option<TypeId>;

    /// The parameterization of `def` that `ty` extends or implements, if any.
    /// A raw `ty` yields a raw result.
    fn as_super(&self, ty: TypeId, def: DefId) -> Option<TypeId>;

    /// The single abstract method of a functional interface type, with the
    /// interface's type arguments substituted. `None` if `ty` is not a
    /// functional interface.
    fn functional_method(&self, ty: TypeId) -> Option<MethodSig>;

    /// Least upper bound of reference types.
    fn lub(&self, types: &[TypeId]) -> TypeId;

    /// Greatest lower bound of reference types.
    fn glb(&self, types: &[TypeId]) -> TypeId;

    /// Is `ty` a checked exception class (a `Throwable` that is neither a
    /// `RuntimeException` nor an `Error`)?
    fn is_checked_exception(&self, ty: TypeId) -> bool;
}
