//! opbatch Resolver
//!
//! Substitute cross-operation references before an operation executes.
//!
//! Responsibilities:
//! - Recognize `{{previous_result[N].field}}` tokens in payload strings
//! - Hold rows captured by earlier operations (per-request context)
//! - Substitute captured values with a typed tree walk
//! - Expand an operation into one execution per captured row
//!
//! # Module Structure
//!
//! - `placeholder` - Token grammar and text substitution
//! - `context` - Transaction-scoped captured rows
//! - `resolver` - Resolution and expansion of operations
//! - `error` - Error types for resolution failures

mod context;
mod error;
mod placeholder;
mod resolver;

pub use context::ExecutionContext;
pub use error::{ResolutionError, ResolutionResult};
pub use placeholder::{references, references_in, substitute, Reference};
pub use resolver::{resolve, EmptyDependencyPolicy, Resolution, ResolvedOperation};
