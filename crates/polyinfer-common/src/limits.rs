//! Centralized limits and thresholds for the inference engine.
//!
//! This module provides shared constants for recursion depths, operation counts,
//! and capacity limits used throughout the codebase. Centralizing these values
//! prevents duplicate definitions with inconsistent values and keeps tuning in
//! one place.
//!
//! # Categories
//!
//! - **Operation Counts**: Limits to prevent non-terminating fixpoint loops
//! - **Recursion Depths**: Limits to prevent stack overflow in recursive walks
//! - **Capacity Limits**: Pre-allocation sizes

// =============================================================================
// Operation Count Limits
// =============================================================================

/// Maximum number of fixpoint iterations a single inference session may run.
///
/// One iteration is one reduced constraint or one resolution step. Every
/// well-formed call settles long before this; the limit exists for inputs
/// where incorporation keeps producing ever larger types, e.g.
///
/// ```java
/// // α <: List<α> keeps generating fresh containment constraints
/// <T extends List<T>> T self(T t);
/// ```
///
/// Exceeding it fails the session with a "did not converge" record.
pub const MAX_FIXPOINT_ITERATIONS: u32 = 100_000;

/// Maximum number of bounds a single inference variable may collect.
///
/// Bound sets are duplicate free, so this is only reached when incorporation
/// derives structurally new bounds on every round.
pub const MAX_BOUNDS_PER_VARIABLE: usize = 512;

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting of inference sessions.
///
/// Each generic call in argument position opens a nested session:
///
/// ```java
/// f(g(h(k(x))));   // four nested sessions below the root
/// ```
///
/// Deeper chains fail with a "nesting too deep" record.
pub const MAX_SESSION_DEPTH: u32 = 64;

/// Maximum depth for structural walks over types (substitution, dependency
/// collection, subtype checks in the reference oracle).
pub const MAX_TYPE_WALK_DEPTH: u32 = 100;

/// Maximum depth for supertype traversal in `as_super` and least upper bound
/// computation.
pub const MAX_SUPERTYPE_DEPTH: u32 = 64;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Initial capacity of the pending constraint queue of a session.
pub const PENDING_QUEUE_CAPACITY: usize = 32;

/// Initial capacity of the type store.
pub const TYPE_STORE_CAPACITY: usize = 256;
