//! opbatch Core Types
//!
//! This crate provides the foundational types used throughout opbatch:
//! - Value types (the Value enum bound to and read back from SQL)
//! - Identifiers (validated table and column names)
//! - Operation types (wire `OperationSpec` and validated `Operation`)
//! - Common error types and user-facing messages

mod error;
mod identifier;
pub mod messages;
mod operation;
mod value;

pub use error::{CoreError, CoreResult};
pub use identifier::Identifier;
pub use operation::{FieldMap, Operation, OperationKind, OperationSpec, OperationType};
pub use value::{Row, Value};
