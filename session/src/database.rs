//! Connection source.
//!
//! Every batch gets its own connection, configured identically: busy
//! timeout, foreign key enforcement and the registered SQL functions.

use opbatch_mutation::{register_functions, MutationError, MutationResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::DatabaseConfig;

/// A SQLite database file that hands out configured connections.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
    foreign_keys: bool,
    opened: AtomicUsize,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_config(&DatabaseConfig {
            path: path.into(),
            ..DatabaseConfig::default()
        })
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            foreign_keys: config.foreign_keys,
            opened: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new connection.
    pub fn acquire(&self) -> MutationResult<Connection> {
        let conn = Connection::open(&self.path)?;
        self.opened.fetch_add(1, Ordering::Relaxed);
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", self.foreign_keys)?;
        register_functions(&conn)?;
        tracing::trace!(path = %self.path.display(), "connection opened");
        Ok(conn)
    }

    /// Number of connections opened so far.
    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Run a SQL script on a fresh connection.
    pub fn execute_script(&self, sql: &str) -> MutationResult<()> {
        let conn = self.acquire()?;
        conn.execute_batch(sql).map_err(MutationError::from)
    }
}
