//! opbatch Mutation
//!
//! Execute single insert/update/delete operations on an explicit connection.
//!
//! Responsibilities:
//! - Check table and column names against the live schema
//! - Coerce bound values to the target column's declared type
//! - Build and run parameterized statements
//! - Capture `return_affected` rows and generated ids
//! - Classify database failures (unique, foreign key, other)
//!
//! # Module Structure
//!
//! - `executor` - Main MutationExecutor that coordinates operations
//! - `ops/` - Individual operation implementations (insert, update, delete)
//! - `schema` - Table description and per-connection schema cache
//! - `validation` - Column checks and value coercion
//! - `functions` - SQL functions registered on every connection
//! - `error` - Error types for mutation failures
//! - `result` - Result types for mutation outcomes

mod error;
mod executor;
mod functions;
mod ops;
mod result;
mod schema;
mod validation;

pub use error::{MutationError, MutationResult};
pub use executor::MutationExecutor;
pub use functions::register_functions;
pub use ops::read_rows;
pub use result::MutationOutcome;
pub use schema::{describe_table, ColumnInfo, ColumnKey, SchemaCache, TableSchema};
pub use validation::coerce_value;
