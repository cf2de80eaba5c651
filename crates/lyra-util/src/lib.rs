//! lyra-util - Foundation types shared by every stage of the pipeline.
//!
//! This crate provides the building blocks the scanner, parser, and
//! interpreter all depend on:
//!
//! - [`Span`] - source location tracking
//! - [`Symbol`] - interned strings for identifiers and lexemes
//! - [`diagnostic`] - error collection and rendering

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level, Locus};
pub use span::Span;
pub use symbol::Symbol;

// Re-export commonly used hash collections
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
