//! Core error types.

use thiserror::Error;

/// Errors raised while building core types from untrusted input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid identifier: {name:?}")]
    InvalidIdentifier { name: String },

    #[error("unsupported operation type: {name:?}")]
    UnknownOperationType { name: String },
}

impl CoreError {
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }

    pub fn unknown_operation_type(name: impl Into<String>) -> Self {
        Self::UnknownOperationType { name: name.into() }
    }
}

/// Result type for core conversions.
pub type CoreResult<T> = Result<T, CoreError>;
