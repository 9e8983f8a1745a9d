//! Resolution error types.

use thiserror::Error;

/// Result type for placeholder resolution.
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Errors that can occur while resolving an operation's dependency.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error(
        "Operation {index} depends on operation {dependency}, which captured no rows; \
         set return_affected on operation {dependency}"
    )]
    MissingCapture { index: usize, dependency: usize },

    #[error("Field {field:?} is not present in the rows captured by operation {dependency}")]
    UnknownField {
        index: usize,
        dependency: usize,
        field: String,
        expansion: Option<usize>,
    },

    #[error(
        "Operation {index} references previous_result[{found}] but depends on operation {dependency}"
    )]
    IndexMismatch {
        index: usize,
        dependency: usize,
        found: usize,
    },

    #[error("Operation {index} depends on operation {dependency}, which affected no rows")]
    EmptyDependency { index: usize, dependency: usize },
}

impl ResolutionError {
    pub fn missing_capture(index: usize, dependency: usize) -> Self {
        Self::MissingCapture { index, dependency }
    }

    pub fn unknown_field(
        index: usize,
        dependency: usize,
        field: impl Into<String>,
        expansion: Option<usize>,
    ) -> Self {
        Self::UnknownField {
            index,
            dependency,
            field: field.into(),
            expansion,
        }
    }

    pub fn index_mismatch(index: usize, dependency: usize, found: usize) -> Self {
        Self::IndexMismatch {
            index,
            dependency,
            found,
        }
    }

    pub fn empty_dependency(index: usize, dependency: usize) -> Self {
        Self::EmptyDependency { index, dependency }
    }

    /// Index of the operation that failed to resolve.
    pub fn operation_index(&self) -> usize {
        match self {
            Self::MissingCapture { index, .. }
            | Self::UnknownField { index, .. }
            | Self::IndexMismatch { index, .. }
            | Self::EmptyDependency { index, .. } => *index,
        }
    }

    /// Index of the operation whose captured rows were consulted.
    pub fn dependency_index(&self) -> usize {
        match self {
            Self::MissingCapture { dependency, .. }
            | Self::UnknownField { dependency, .. }
            | Self::IndexMismatch { dependency, .. }
            | Self::EmptyDependency { dependency, .. } => *dependency,
        }
    }

    /// Field that could not be resolved, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownField { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Expansion being resolved when the failure occurred, if any.
    pub fn expansion_index(&self) -> Option<usize> {
        match self {
            Self::UnknownField { expansion, .. } => *expansion,
            _ => None,
        }
    }
}
