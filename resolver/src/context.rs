//! Transaction-scoped record of captured rows.

use opbatch_core::Row;
use std::collections::HashMap;

/// Rows captured so far, keyed by operation index.
///
/// An operation that was expanded records the rows of every expansion under
/// its own index. An index with no entry captured nothing; an entry with no
/// rows captured an empty result.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    captured: HashMap<usize, Vec<Row>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows captured by operation `index`.
    pub fn record(&mut self, index: usize, rows: Vec<Row>) {
        self.captured.entry(index).or_default().extend(rows);
    }

    /// Rows captured by operation `index`, if it captured at all.
    pub fn rows(&self, index: usize) -> Option<&[Row]> {
        self.captured.get(&index).map(Vec::as_slice)
    }
}
