//! Session result types and the batch response formatter.

use opbatch_core::{messages, Operation, OperationType, Row};
use opbatch_mutation::MutationOutcome;
use serde::Serialize;
use serde_json::json;

use crate::error::BatchError;

/// Result of one physical execution, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub success: bool,
    pub operation_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expansion_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_data: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    /// A completed execution. Captured rows are reported only when the
    /// operation asked for `return_affected`.
    pub fn success(op: &Operation, expansion: Option<usize>, outcome: MutationOutcome) -> Self {
        let affected_data = if op.return_affected.is_empty() {
            None
        } else {
            Some(outcome.captured.unwrap_or_default())
        };
        Self {
            success: true,
            operation_index: op.index,
            expansion_index: expansion,
            operation_type: Some(outcome.operation_type),
            table_name: Some(outcome.table_name),
            affected_rows: Some(outcome.affected_rows),
            last_insert_id: outcome.last_insert_id,
            affected_data,
            error: None,
        }
    }

    /// An operation skipped because its dependency affected no rows.
    pub fn skipped(op: &Operation) -> Self {
        Self {
            success: true,
            operation_index: op.index,
            expansion_index: None,
            operation_type: Some(op.operation_type()),
            table_name: Some(op.table.as_str().to_string()),
            affected_rows: Some(0),
            last_insert_id: None,
            affected_data: None,
            error: None,
        }
    }

    /// The execution that aborted the batch.
    pub fn failure(index: usize, expansion: Option<usize>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            operation_index: index,
            expansion_index: expansion,
            operation_type: None,
            table_name: None,
            affected_rows: None,
            last_insert_id: None,
            affected_data: None,
            error: Some(error.into()),
        }
    }
}

/// HTTP status of a batch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    BadRequest,
    Conflict,
    InternalServerError,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Conflict => 409,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }
}

/// A rendered response: status plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl BatchResponse {
    /// Response to an empty batch.
    pub fn empty() -> Self {
        Self {
            status: StatusCode::Ok,
            body: json!({ "message": messages::MSG_EMPTY_BATCH }),
        }
    }

    /// Response to a committed batch.
    pub fn committed(results: &[OperationResult]) -> Self {
        Self {
            status: StatusCode::Ok,
            body: json!({
                "message": messages::MSG_BATCH_SUCCESS,
                "results": results,
            }),
        }
    }

    /// Response to an aborted batch.
    pub fn aborted(error: &BatchError, results: &[OperationResult]) -> Self {
        Self {
            status: error.status(),
            body: json!({
                "error": error.class().message(),
                "detail": error.detail(),
                "results": results,
            }),
        }
    }

    /// Response to a body that is not JSON.
    pub fn invalid_json(reason: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BadRequest,
            body: json!({
                "error": format!("{}: {}", messages::ERR_INVALID_JSON_PREFIX, reason),
            }),
        }
    }

    /// Pretty-printed body.
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| self.body.to_string())
    }
}
