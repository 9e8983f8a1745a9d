//! Clause compilation error types.

use thiserror::Error;

/// Result type for clause compilation.
pub type ClauseResult<T> = Result<T, ClauseError>;

/// Errors that can occur while compiling a `where` map.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClauseError {
    #[error("Unknown where operator {operator:?} for column {column}")]
    UnknownOperator { column: String, operator: String },

    #[error("Invalid operand for {operator} on column {column}: {message}")]
    InvalidOperand {
        column: String,
        operator: String,
        message: String,
    },

    #[error("Condition for column {column} has no operator")]
    EmptyCondition { column: String },

    #[error("Condition for column {column} must be a scalar or an operator object")]
    InvalidCondition { column: String },

    #[error("Where clause must not be empty")]
    EmptyWhere,

    #[error("Invalid column name in where clause: {column:?}")]
    InvalidColumn { column: String },
}

impl ClauseError {
    pub fn unknown_operator(column: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            column: column.into(),
            operator: operator.into(),
        }
    }

    pub fn invalid_operand(
        column: impl Into<String>,
        operator: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidOperand {
            column: column.into(),
            operator: operator.into(),
            message: message.into(),
        }
    }

    pub fn empty_condition(column: impl Into<String>) -> Self {
        Self::EmptyCondition {
            column: column.into(),
        }
    }

    pub fn invalid_condition(column: impl Into<String>) -> Self {
        Self::InvalidCondition {
            column: column.into(),
        }
    }

    pub fn invalid_column(column: impl Into<String>) -> Self {
        Self::InvalidColumn {
            column: column.into(),
        }
    }

    /// Column the error refers to, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::UnknownOperator { column, .. }
            | Self::InvalidOperand { column, .. }
            | Self::EmptyCondition { column }
            | Self::InvalidCondition { column }
            | Self::InvalidColumn { column } => Some(column),
            Self::EmptyWhere => None,
        }
    }

    /// Operator the error refers to, if any.
    pub fn operator(&self) -> Option<&str> {
        match self {
            Self::UnknownOperator { operator, .. } | Self::InvalidOperand { operator, .. } => {
                Some(operator)
            }
            _ => None,
        }
    }
}
