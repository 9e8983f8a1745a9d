//! Mutation result types.

use opbatch_core::{OperationType, Row};

/// Outcome of one physical execution.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub operation_type: OperationType,
    pub table_name: String,
    pub affected_rows: usize,
    /// Row id of the inserted row (inserts only).
    pub last_insert_id: Option<i64>,
    /// Rows captured for dependents, `None` when nothing was requested.
    pub captured: Option<Vec<Row>>,
}

impl MutationOutcome {
    pub fn new(operation_type: OperationType, table_name: impl Into<String>) -> Self {
        Self {
            operation_type,
            table_name: table_name.into(),
            affected_rows: 0,
            last_insert_id: None,
            captured: None,
        }
    }

    pub fn with_affected_rows(mut self, affected_rows: usize) -> Self {
        self.affected_rows = affected_rows;
        self
    }

    pub fn with_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    pub fn with_captured(mut self, rows: Vec<Row>) -> Self {
        self.captured = Some(rows);
        self
    }

    /// Number of captured rows.
    pub fn captured_rows(&self) -> usize {
        self.captured.as_ref().map_or(0, Vec::len)
    }
}
