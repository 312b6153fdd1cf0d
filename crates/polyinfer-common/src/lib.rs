//! Common types and utilities for the polyinfer inference engine.
//!
//! This crate provides foundational types used across all polyinfer crates:
//! - String interning (`Atom`, `Interner`)
//! - Centralized limits and thresholds
//! - The diagnostic message table (`MessageTemplate`, `format_message`)
//! - Cooperative cancellation (`CancellationToken`)

// String interning for declaration and type parameter names
pub mod interner;
pub use interner::{Atom, Interner};

// Centralized limits and thresholds
pub mod limits;

// Diagnostic message templates
pub mod diagnostics;
pub use diagnostics::{DiagnosticCategory, DiagnosticMessage, MessageTemplate, format_message};

// Cancellation signal checked by long-running solver loops
pub mod cancel;
pub use cancel::CancellationToken;
