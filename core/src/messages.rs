//! Common messages returned to callers.
//!
//! These constants keep wording identical between the engine, the endpoint
//! handler and the CLI.

/// Response to an empty batch.
pub const MSG_EMPTY_BATCH: &str = "No operations to perform.";

/// Response to a committed batch.
pub const MSG_BATCH_SUCCESS: &str = "Batch operations executed successfully.";

/// Error: request failed shape validation.
pub const ERR_INVALID_BATCH: &str = "Invalid batch request.";

/// Error: a placeholder could not be resolved.
pub const ERR_RESOLUTION: &str = "Failed to resolve operation dependency.";

/// Error: a where clause could not be compiled.
pub const ERR_CLAUSE: &str = "Invalid where clause.";

/// Error: unique constraint violated.
pub const ERR_DUPLICATE_ENTRY: &str = "Unique constraint violation during batch operation.";

/// Error: foreign key constraint violated.
pub const ERR_FOREIGN_KEY: &str = "Foreign key constraint violation during batch operation.";

/// Error: any other database failure.
pub const ERR_DATABASE: &str = "Database error during batch operation.";

/// Error prefix: request body is not JSON.
pub const ERR_INVALID_JSON_PREFIX: &str = "Invalid JSON format";
