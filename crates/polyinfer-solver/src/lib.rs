//! Constraint-based type argument inference.
//!
//! Given an already-resolved generic call (or any poly expression: lambdas,
//! method references, conditionals, switch expressions) and the type it must
//! conform to, the solver finds type arguments for every generic call in the
//! tree and parameter types for every lambda, or explains why none exist.
//!
//! The engine works on:
//!
//! - **Interned types**: `TypeId` handles into a shared `TypeInterner`
//! - **Constraint formulas**: a closed enum reduced by one `match`
//! - **Bound sets**: equality, upper and lower bounds per inference variable,
//!   cross-checked by incorporation as they grow
//! - **Sessions**: a fixpoint loop with a pending queue and a delayed list;
//!   every generic call in argument position is solved in a nested session
//!   and folded into its parent
//!
//! Subtyping and friends are answered by a [`TypeOracle`]; [`NominalOracle`]
//! is the reference implementation over the interner's declarations.
mod bounds;
pub mod capture;
pub mod constraint;
mod container;
pub mod def;
pub mod diagnostics;
pub mod expr;
mod functional;
mod incorporate;
pub mod instantiate;
mod intern;
pub mod oracle;
mod recursion;
mod reduce;
pub mod relations;
mod resolve;
mod session;
pub mod types;

pub use bounds::{BoundKind, BoundSet, VarData};
pub use capture::Capture;
pub use constraint::{ConstraintFormula, Reduction};
pub use container::{InferenceContext, InferenceError, InferenceLimits, InferenceOutcome};
pub use def::{DefId, DefKind, DefinitionInfo, DefinitionStore, MethodSig};
pub use diagnostics::{DiagnosticArg, IncompatibilityRecord, TypeFormatter, render_record};
pub use expr::{
    CallExpr, ExprArena, ExprData, ExprId, LambdaBody, LambdaExpr, LambdaParams, MethodRefExpr,
    MethodRefKind,
};
pub use instantiate::{TypeSubstitution, VarSubstitution};
pub use intern::TypeInterner;
pub use oracle::TypeOracle;
pub use relations::NominalOracle;
pub use types::{
    ClassType, InferenceVar, PrimitiveKind, TypeData, TypeId, TypeParamId, TypeParamInfo,
    WildcardKind,
};

// Test modules: most are loaded by their source files via #[path = "../tests/..."].
#[cfg(test)]
#[path = "../tests/fixtures.rs"]
pub(crate) mod fixtures;
#[cfg(test)]
#[path = "../tests/scenario_tests.rs"]
mod scenario_tests;
#[cfg(test)]
#[path = "../tests/property_tests.rs"]
mod property_tests;
