//! Operation types.
//!
//! `OperationSpec` is the loosely-typed wire form of one batch entry: every
//! field is optional and kept as raw JSON so that shape problems surface as
//! validation errors rather than decode errors. `Operation` is the validated
//! form the engine executes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::identifier::Identifier;

/// Column name → JSON payload, as found in `values`, `set` and `where`.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// One entry of a batch request, as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<serde_json::Value>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on_index: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_affected: Option<serde_json::Value>,
}

/// Kind of mutation an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Insert,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Insert => "insert",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
        }
    }
}

impl FromStr for OperationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insert" => Ok(OperationType::Insert),
            "update" => Ok(OperationType::Update),
            "delete" => Ok(OperationType::Delete),
            _ => Err(CoreError::unknown_operation_type(s)),
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The clauses an operation carries, by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    Insert { values: FieldMap },
    Update { set: FieldMap, filter: FieldMap },
    Delete { filter: FieldMap },
}

impl OperationKind {
    pub fn operation_type(&self) -> OperationType {
        match self {
            OperationKind::Insert { .. } => OperationType::Insert,
            OperationKind::Update { .. } => OperationType::Update,
            OperationKind::Delete { .. } => OperationType::Delete,
        }
    }

    /// References to every payload map.
    pub fn payloads(&self) -> Vec<&FieldMap> {
        match self {
            OperationKind::Insert { values } => vec![values],
            OperationKind::Update { set, filter } => vec![set, filter],
            OperationKind::Delete { filter } => vec![filter],
        }
    }

    /// The assignment map (`values` or `set`), if the kind has one.
    pub fn assignments(&self) -> Option<&FieldMap> {
        match self {
            OperationKind::Insert { values } => Some(values),
            OperationKind::Update { set, .. } => Some(set),
            OperationKind::Delete { .. } => None,
        }
    }

    /// The `where` map, if the kind has one.
    pub fn filter(&self) -> Option<&FieldMap> {
        match self {
            OperationKind::Insert { .. } => None,
            OperationKind::Update { filter, .. } | OperationKind::Delete { filter } => Some(filter),
        }
    }
}

/// A validated batch entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Position in the original batch.
    pub index: usize,
    pub table: Identifier,
    pub kind: OperationKind,
    /// Strictly earlier operation whose captured rows this one consumes.
    pub depends_on: Option<usize>,
    /// Columns to capture after execution.
    pub return_affected: Vec<Identifier>,
}

impl Operation {
    pub fn operation_type(&self) -> OperationType {
        self.kind.operation_type()
    }
}
