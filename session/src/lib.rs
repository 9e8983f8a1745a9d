//! opbatch Session
//!
//! Run one batch request from raw JSON to a formatted response.
//!
//! Responsibilities:
//! - Validate batch and operation shape before any database work
//! - Own the single transaction of a batch and drive operations in order
//! - Classify failures and render success or error payloads
//! - Open connections and load engine configuration
//!
//! # Module Structure
//!
//! - `validation` - Operation Validator
//! - `engine` - Execution Engine (one transaction per batch)
//! - `transaction` - Batch state tracking
//! - `result` - Per-operation results and the Result Formatter
//! - `database` - Connection source
//! - `config` - `EngineConfig` loading
//! - `service` - `BatchService` request handler
//! - `error` - Error types and classification

mod config;
mod database;
mod engine;
mod error;
mod result;
mod service;
mod transaction;
mod validation;

pub use config::{DatabaseConfig, EngineConfig, ExecutionConfig, LoggingConfig};
pub use database::Database;
pub use engine::{BatchEngine, BatchReport, ExecutionOptions};
pub use error::{BatchError, BatchResult, ConfigError, ConfigResult, ErrorClass, ValidationError};
pub use result::{BatchResponse, OperationResult, StatusCode};
pub use service::BatchService;
pub use transaction::{BatchState, BatchTracker, InvalidTransition};
pub use validation::{validate_batch, validate_operation};
