//! lyra-interp - Tree-walking interpreter.
//!
//! Executes a parsed program against a chain of lexical environments,
//! dispatching native calls through a binding registry the embedder
//! populates before the run.
//!
//! The ownership rule at the heart of the evaluator is
//! *duplicate-if-environment*: values stored in an environment are owned by
//! it, and any value handed onward (returns, assignments, argument passing,
//! control values leaving a block) is first copied with the ownership flag
//! cleared, so an environment mutation can never invalidate a value the
//! evaluator still holds.

pub mod binding;
pub mod environment;
pub mod interpreter;
pub mod value;

pub use binding::{extract_parameter, Bindings, NativeFn};
pub use environment::{EnvRef, Environment};
pub use interpreter::Interpreter;
pub use value::{Callable, CallableKind, Payload, TypeTag, Value, ValueKind};
