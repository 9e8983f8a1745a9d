//! Execution Engine.
//!
//! One batch, one connection, one transaction. Operations run strictly in
//! input order; each is resolved against the rows captured so far, possibly
//! expanded into several executions, and executed. The first failure rolls
//! the transaction back and aborts the batch.

use opbatch_core::Operation;
use opbatch_mutation::MutationExecutor;
use opbatch_resolver::{resolve, EmptyDependencyPolicy, ExecutionContext, Resolution};
use rusqlite::{Connection, TransactionBehavior};

use crate::config::ExecutionConfig;
use crate::database::Database;
use crate::error::{BatchError, BatchResult};
use crate::result::{BatchResponse, OperationResult};
use crate::transaction::BatchTracker;
use crate::validation::validate_batch;

/// Execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub empty_dependency: EmptyDependencyPolicy,
    pub max_operations: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

impl From<&ExecutionConfig> for ExecutionOptions {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            empty_dependency: config.empty_dependency,
            max_operations: config.max_operations,
        }
    }
}

/// How a batch ended.
#[derive(Debug)]
pub enum BatchReport {
    /// Nothing to do; no connection was opened.
    Empty,
    Committed(Vec<OperationResult>),
    /// Rolled back (or never started). `results` holds the executions that
    /// succeeded before the failure, then the failing one.
    Aborted {
        error: BatchError,
        results: Vec<OperationResult>,
    },
}

impl BatchReport {
    fn aborted(error: impl Into<BatchError>) -> Self {
        BatchReport::Aborted {
            error: error.into(),
            results: Vec::new(),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, BatchReport::Committed(_))
    }

    /// Render the response body and status.
    pub fn to_response(&self) -> BatchResponse {
        match self {
            BatchReport::Empty => BatchResponse::empty(),
            BatchReport::Committed(results) => BatchResponse::committed(results),
            BatchReport::Aborted { error, results } => BatchResponse::aborted(error, results),
        }
    }
}

/// Runs batches against a database.
pub struct BatchEngine<'d> {
    database: &'d Database,
    options: ExecutionOptions,
}

impl<'d> BatchEngine<'d> {
    pub fn new(database: &'d Database, options: ExecutionOptions) -> Self {
        Self { database, options }
    }

    /// Validate and run a batch body.
    pub fn run(&self, body: &serde_json::Value) -> BatchReport {
        let count = body.as_array().map_or(0, Vec::len);
        let span = tracing::info_span!("batch", operations = count);
        let _enter = span.enter();

        let mut tracker = BatchTracker::new();
        match self.run_tracked(body, &mut tracker) {
            Ok(report) => report,
            Err(error) => BatchReport::aborted(error),
        }
    }

    fn run_tracked(&self, body: &serde_json::Value, tracker: &mut BatchTracker) -> BatchResult<BatchReport> {
        tracker.validate()?;
        let ops = match validate_batch(body, self.options.max_operations) {
            Ok(ops) => ops,
            Err(e) => {
                tracker.reject()?;
                tracing::debug!(error = %e, "batch rejected");
                return Ok(BatchReport::aborted(e));
            }
        };
        if ops.is_empty() {
            tracker.finish_empty()?;
            return Ok(BatchReport::Empty);
        }

        let mut conn = self
            .database
            .acquire()
            .map_err(|e| BatchError::database(e.to_string()))?;
        self.run_in_transaction(&mut conn, &ops, tracker)
    }

    fn run_in_transaction(
        &self,
        conn: &mut Connection,
        ops: &[Operation],
        tracker: &mut BatchTracker,
    ) -> BatchResult<BatchReport> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| BatchError::database(e.to_string()))?;
        tracker.open()?;

        let mut results = Vec::with_capacity(ops.len());
        let outcome = execute_operations(&tx, ops, self.options.empty_dependency, tracker, &mut results);

        match outcome {
            Ok(()) => match tx.commit() {
                Ok(()) => {
                    tracker.commit()?;
                    tracing::info!(results = results.len(), "batch committed");
                    Ok(BatchReport::Committed(results))
                }
                Err(e) => {
                    tracker.rollback()?;
                    tracing::warn!(error = %e, "commit failed");
                    Ok(BatchReport::Aborted {
                        error: BatchError::database(e.to_string()),
                        results,
                    })
                }
            },
            Err(error) => {
                tracing::warn!(class = error.class().type_name(), error = %error, "rolling back batch");
                if let Err(e) = tx.rollback() {
                    tracing::warn!(error = %e, "rollback failed");
                }
                tracker.rollback()?;
                let (index, expansion) = error.location();
                if let Some(index) = index {
                    results.push(OperationResult::failure(index, expansion, error.message()));
                }
                Ok(BatchReport::Aborted { error, results })
            }
        }
    }
}

/// Run every operation in order, appending one result per execution.
fn execute_operations(
    conn: &Connection,
    ops: &[Operation],
    policy: EmptyDependencyPolicy,
    tracker: &mut BatchTracker,
    results: &mut Vec<OperationResult>,
) -> BatchResult<()> {
    let mut executor = MutationExecutor::new(conn);
    let mut ctx = ExecutionContext::new();

    for op in ops {
        let resolution = resolve(op, &ctx, policy).map_err(|e| {
            BatchError::operation(op.index, e.expansion_index(), op.table.as_str(), e)
        })?;

        if let Resolution::Skipped { dependency } = resolution {
            tracing::debug!(index = op.index, dependency, "skipped: dependency affected no rows");
            // Dependents of a skipped operation are skipped too.
            ctx.record(op.index, Vec::new());
            results.push(OperationResult::skipped(op));
            continue;
        }

        for resolved in resolution.into_executions() {
            let span = tracing::debug_span!("operation", index = op.index, expansion = ?resolved.expansion);
            let _enter = span.enter();
            tracker.execute(op.index, resolved.expansion)?;

            let outcome = executor
                .execute(&op.table, &resolved.kind, &resolved.bound_only, &op.return_affected)
                .map_err(|e| BatchError::operation(op.index, resolved.expansion, op.table.as_str(), e))?;

            tracing::debug!(
                affected = outcome.affected_rows,
                captured = outcome.captured_rows(),
                "operation executed"
            );
            if let Some(rows) = &outcome.captured {
                ctx.record(op.index, rows.clone());
            }
            results.push(OperationResult::success(op, resolved.expansion, outcome));
        }
    }
    Ok(())
}
