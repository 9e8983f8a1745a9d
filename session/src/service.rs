//! Batch endpoint handler.

use crate::config::EngineConfig;
use crate::database::Database;
use crate::engine::{BatchEngine, ExecutionOptions};
use crate::result::BatchResponse;

/// Handles batch requests against one database.
///
/// Requests are independent: each opens its own connection, so a service
/// can be shared across threads.
#[derive(Debug)]
pub struct BatchService {
    database: Database,
    options: ExecutionOptions,
}

impl BatchService {
    pub fn new(database: Database, options: ExecutionOptions) -> Self {
        Self { database, options }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Database::from_config(&config.database),
            ExecutionOptions::from(&config.execution),
        )
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Handle a raw request body.
    pub fn handle(&self, body: &str) -> BatchResponse {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => self.handle_value(&value),
            Err(e) => BatchResponse::invalid_json(e),
        }
    }

    /// Handle an already decoded request body.
    pub fn handle_value(&self, body: &serde_json::Value) -> BatchResponse {
        let report = BatchEngine::new(&self.database, self.options).run(body);
        tracing::debug!(
            database = %self.database.path().display(),
            committed = report.is_committed(),
            "batch finished"
        );
        report.to_response()
    }
}
