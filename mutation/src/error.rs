//! Mutation error types.

use opbatch_compiler::{Assignment, ClauseError, Operand};
use opbatch_core::{CoreError, Value};
use rusqlite::ffi;
use thiserror::Error;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Errors that can occur during mutation execution.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Clause(#[from] ClauseError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Unknown table: {table}")]
    UnknownTable { table: String },

    #[error("Unknown column: {column} on table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid value for {table}.{column}: expected {expected}, got {value:?}")]
    InvalidValue {
        table: String,
        column: String,
        expected: String,
        value: String,
    },

    #[error("{message}")]
    UniqueViolation {
        /// Constraint columns as reported by the database, e.g. `users.email`.
        key: Option<String>,
        /// Value bound to the conflicting column, when it was a parameter.
        value: Option<Value>,
        message: String,
    },

    #[error("{message}")]
    ForeignKeyViolation { message: String },

    #[error("{message}")]
    Database { message: String },
}

impl MutationError {
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn invalid_value(
        table: impl Into<String>,
        column: impl Into<String>,
        expected: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            table: table.into(),
            column: column.into(),
            expected: expected.into(),
            value: value.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// True for failures caused by the request rather than the database.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::Core(_)
                | Self::UnknownTable { .. }
                | Self::UnknownColumn { .. }
                | Self::InvalidValue { .. }
        )
    }

    /// Fill in the conflicting value of a unique violation from the
    /// statement's bound assignments.
    pub(crate) fn with_conflicting_value(self, assignments: &[Assignment]) -> Self {
        match self {
            Self::UniqueViolation {
                key: Some(key),
                value: None,
                message,
            } => {
                let value = key
                    .split(',')
                    .filter_map(|part| part.trim().rsplit('.').next())
                    .find_map(|column| {
                        assignments.iter().find_map(|a| match &a.operand {
                            Operand::Bound(v) if a.column.as_str() == column => Some(v.clone()),
                            _ => None,
                        })
                    });
                Self::UniqueViolation {
                    key: Some(key),
                    value,
                    message,
                }
            }
            other => other,
        }
    }
}

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

impl From<rusqlite::Error> for MutationError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, detail) = &err {
            let message = detail.clone().unwrap_or_else(|| err.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    let key = message.strip_prefix(UNIQUE_PREFIX).map(str::to_string);
                    return Self::UniqueViolation {
                        key,
                        value: None,
                        message,
                    };
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::ForeignKeyViolation { message };
                }
                _ => {}
            }
        }
        Self::database(err.to_string())
    }
}
