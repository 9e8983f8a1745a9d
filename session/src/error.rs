//! Session error types.
//!
//! Every batch failure falls into one [`ErrorClass`], which fixes the
//! `type` tag, the top-level message and the HTTP status of the response.

use opbatch_compiler::ClauseError;
use opbatch_core::messages;
use opbatch_mutation::MutationError;
use opbatch_resolver::ResolutionError;
use serde_json::{json, Map};
use std::path::PathBuf;
use thiserror::Error;

use crate::result::StatusCode;
use crate::transaction::InvalidTransition;

/// A request rejected before any database work.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Offending operation, `None` for problems with the batch as a whole.
    pub index: Option<usize>,
    pub table: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn batch(message: impl Into<String>) -> Self {
        Self {
            index: None,
            table: None,
            message: message.into(),
        }
    }

    pub fn operation(index: usize, message: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            table: None,
            message: format!("operation {}: {}", index, message.into()),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// Cause of a failure inside the transaction.
#[derive(Debug, Error)]
pub enum OperationFailure {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

/// Errors that abort a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid batch: {0}")]
    Invalid(#[from] ValidationError),

    #[error("operation {index} failed: {source}")]
    Operation {
        index: usize,
        expansion: Option<usize>,
        table: String,
        #[source]
        source: OperationFailure,
    },

    /// Connection, transaction control or commit failure.
    #[error("database error: {message}")]
    Database { message: String },
}

/// Result type for batch execution.
pub type BatchResult<T> = Result<T, BatchError>;

impl BatchError {
    pub fn operation(
        index: usize,
        expansion: Option<usize>,
        table: impl Into<String>,
        source: impl Into<OperationFailure>,
    ) -> Self {
        Self::Operation {
            index,
            expansion,
            table: table.into(),
            source: source.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Operation and expansion the failure is attributed to.
    pub fn location(&self) -> (Option<usize>, Option<usize>) {
        match self {
            Self::Invalid(e) => (e.index, None),
            Self::Operation {
                index, expansion, ..
            } => (Some(*index), *expansion),
            Self::Database { .. } => (None, None),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Invalid(_) => ErrorClass::Validation,
            Self::Operation { source, .. } => match source {
                OperationFailure::Resolution(_) => ErrorClass::Resolution,
                OperationFailure::Mutation(e) => match e {
                    MutationError::Clause(_) => ErrorClass::Clause,
                    MutationError::UniqueViolation { .. } => ErrorClass::DuplicateEntry,
                    MutationError::ForeignKeyViolation { .. } => ErrorClass::ForeignKeyViolation,
                    MutationError::Database { .. } => ErrorClass::OtherDatabase,
                    e if e.is_invalid_request() => ErrorClass::Validation,
                    _ => ErrorClass::OtherDatabase,
                },
            },
            Self::Database { .. } => ErrorClass::OtherDatabase,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.class().status()
    }

    /// The structured `detail` object of an error response.
    pub fn detail(&self) -> serde_json::Value {
        let class = self.class();
        let (index, expansion) = self.location();

        let mut detail = Map::new();
        detail.insert("type".into(), json!(class.type_name()));
        detail.insert("failed_operation_index".into(), json!(index));
        if let Some(expansion) = expansion {
            detail.insert("expansion_index".into(), json!(expansion));
        }

        match self {
            Self::Invalid(e) => {
                if let Some(table) = &e.table {
                    detail.insert("table_name".into(), json!(table));
                }
            }
            Self::Operation { table, source, .. } => {
                detail.insert("table_name".into(), json!(table));
                match source {
                    OperationFailure::Resolution(e) => resolution_detail(e, &mut detail),
                    OperationFailure::Mutation(MutationError::Clause(e)) => {
                        clause_detail(e, &mut detail)
                    }
                    OperationFailure::Mutation(MutationError::UniqueViolation {
                        key, value, ..
                    }) => {
                        detail.insert("key_name".into(), json!(key));
                        detail.insert(
                            "conflicting_value".into(),
                            value.as_ref().map_or(serde_json::Value::Null, |v| v.to_json()),
                        );
                    }
                    OperationFailure::Mutation(_) => {}
                }
            }
            Self::Database { .. } => {}
        }

        detail.insert("message".into(), json!(self.message()));
        serde_json::Value::Object(detail)
    }

    /// Human-readable cause, without the location prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Invalid(e) => e.message.clone(),
            Self::Operation { source, .. } => source.to_string(),
            Self::Database { message } => message.clone(),
        }
    }
}

impl From<InvalidTransition> for BatchError {
    fn from(err: InvalidTransition) -> Self {
        Self::database(err.to_string())
    }
}

fn resolution_detail(e: &ResolutionError, detail: &mut Map<String, serde_json::Value>) {
    detail.insert("dependency_index".into(), json!(e.dependency_index()));
    if let Some(field) = e.field() {
        detail.insert("field".into(), json!(field));
    }
}

fn clause_detail(e: &ClauseError, detail: &mut Map<String, serde_json::Value>) {
    if let Some(column) = e.column() {
        detail.insert("column".into(), json!(column));
    }
    if let Some(operator) = e.operator() {
        detail.insert("operator".into(), json!(operator));
    }
}

/// Error taxonomy of a batch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Resolution,
    Clause,
    DuplicateEntry,
    ForeignKeyViolation,
    OtherDatabase,
}

impl ErrorClass {
    /// `detail.type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            ErrorClass::Validation => "ValidationError",
            ErrorClass::Resolution => "ResolutionError",
            ErrorClass::Clause => "ClauseError",
            ErrorClass::DuplicateEntry => "IntegrityError.DuplicateEntry",
            ErrorClass::ForeignKeyViolation => "IntegrityError.ForeignKeyViolation",
            ErrorClass::OtherDatabase => "OtherDatabaseError",
        }
    }

    /// Top-level `error` message.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorClass::Validation => messages::ERR_INVALID_BATCH,
            ErrorClass::Resolution => messages::ERR_RESOLUTION,
            ErrorClass::Clause => messages::ERR_CLAUSE,
            ErrorClass::DuplicateEntry => messages::ERR_DUPLICATE_ENTRY,
            ErrorClass::ForeignKeyViolation => messages::ERR_FOREIGN_KEY,
            ErrorClass::OtherDatabase => messages::ERR_DATABASE,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorClass::Validation | ErrorClass::Resolution | ErrorClass::Clause => {
                StatusCode::BadRequest
            }
            ErrorClass::DuplicateEntry | ErrorClass::ForeignKeyViolation => StatusCode::Conflict,
            ErrorClass::OtherDatabase => StatusCode::InternalServerError,
        }
    }
}

/// Errors loading an `EngineConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
