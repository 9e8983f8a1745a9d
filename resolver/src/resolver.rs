//! Operation resolution.
//!
//! Resolution runs just before an operation executes, against the rows its
//! dependency captured:
//!
//! - no dependency: the operation runs once, unchanged
//! - no captured rows: skipped or failed, per [`EmptyDependencyPolicy`]
//! - one row: placeholders are substituted, the operation runs once
//! - several rows: the operation runs once per row, in capture order

use opbatch_core::{FieldMap, Operation, OperationKind, Row, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::context::ExecutionContext;
use crate::error::{ResolutionError, ResolutionResult};
use crate::placeholder::{substitute, Reference};

/// What to do with an operation whose dependency affected no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyDependencyPolicy {
    /// Run nothing and report success with zero affected rows.
    #[default]
    Skip,
    /// Abort the batch with a resolution error.
    Fail,
}

impl FromStr for EmptyDependencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown empty dependency policy {other:?}")),
        }
    }
}

impl fmt::Display for EmptyDependencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Fail => f.write_str("fail"),
        }
    }
}

/// An operation with every placeholder replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOperation {
    pub kind: OperationKind,
    /// Assignment columns whose value came from a captured row. These are
    /// bound as parameters even if the text looks like an expression.
    pub bound_only: BTreeSet<String>,
    /// Position within an expansion, `None` when the operation ran once.
    pub expansion: Option<usize>,
}

impl ResolvedOperation {
    fn unchanged(op: &Operation) -> Self {
        Self {
            kind: op.kind.clone(),
            bound_only: BTreeSet::new(),
            expansion: None,
        }
    }
}

/// Outcome of resolving one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Single(ResolvedOperation),
    Expanded(Vec<ResolvedOperation>),
    Skipped { dependency: usize },
}

impl Resolution {
    /// The executions this resolution calls for, in order.
    pub fn into_executions(self) -> Vec<ResolvedOperation> {
        match self {
            Resolution::Single(op) => vec![op],
            Resolution::Expanded(ops) => ops,
            Resolution::Skipped { .. } => Vec::new(),
        }
    }
}

/// Resolve `op` against the rows captured so far.
pub fn resolve(
    op: &Operation,
    ctx: &ExecutionContext,
    policy: EmptyDependencyPolicy,
) -> ResolutionResult<Resolution> {
    let Some(dependency) = op.depends_on else {
        return Ok(Resolution::Single(ResolvedOperation::unchanged(op)));
    };

    let rows = ctx
        .rows(dependency)
        .ok_or_else(|| ResolutionError::missing_capture(op.index, dependency))?;

    match rows {
        [] => match policy {
            EmptyDependencyPolicy::Skip => {
                tracing::debug!(
                    index = op.index,
                    dependency,
                    "dependency affected no rows, skipping"
                );
                Ok(Resolution::Skipped { dependency })
            }
            EmptyDependencyPolicy::Fail => {
                Err(ResolutionError::empty_dependency(op.index, dependency))
            }
        },
        [row] => Ok(Resolution::Single(bind_row(op, dependency, row, None)?)),
        many => {
            tracing::debug!(index = op.index, dependency, rows = many.len(), "expanding operation");
            many.iter()
                .enumerate()
                .map(|(i, row)| bind_row(op, dependency, row, Some(i)))
                .collect::<ResolutionResult<Vec<_>>>()
                .map(Resolution::Expanded)
        }
    }
}

/// Substitute one captured row into a copy of `op`.
fn bind_row(
    op: &Operation,
    dependency: usize,
    row: &Row,
    expansion: Option<usize>,
) -> ResolutionResult<ResolvedOperation> {
    let lookup = |reference: &Reference| -> ResolutionResult<Value> {
        if reference.index != dependency {
            return Err(ResolutionError::index_mismatch(op.index, dependency, reference.index));
        }
        row.get(&reference.field).cloned().ok_or_else(|| {
            ResolutionError::unknown_field(op.index, dependency, &reference.field, expansion)
        })
    };

    let mut kind = op.kind.clone();
    let mut bound_only = BTreeSet::new();
    match &mut kind {
        OperationKind::Insert { values } => {
            bound_only = bind_map(values, &lookup)?;
        }
        OperationKind::Update { set, filter } => {
            bound_only = bind_map(set, &lookup)?;
            bind_map(filter, &lookup)?;
        }
        OperationKind::Delete { filter } => {
            bind_map(filter, &lookup)?;
        }
    }

    Ok(ResolvedOperation {
        kind,
        bound_only,
        expansion,
    })
}

/// Substitute every entry of a payload map, returning the keys that changed.
fn bind_map<F>(map: &mut FieldMap, lookup: &F) -> ResolutionResult<BTreeSet<String>>
where
    F: Fn(&Reference) -> ResolutionResult<Value>,
{
    let mut changed = BTreeSet::new();
    for (key, value) in map.iter_mut() {
        if bind_value(value, lookup)? {
            changed.insert(key.clone());
        }
    }
    Ok(changed)
}

fn bind_value<F>(value: &mut serde_json::Value, lookup: &F) -> ResolutionResult<bool>
where
    F: Fn(&Reference) -> ResolutionResult<Value>,
{
    match value {
        serde_json::Value::String(text) => match substitute(text, lookup)? {
            Some(replaced) => {
                *value = replaced;
                Ok(true)
            }
            None => Ok(false),
        },
        serde_json::Value::Array(items) => {
            let mut changed = false;
            for item in items.iter_mut() {
                changed |= bind_value(item, lookup)?;
            }
            Ok(changed)
        }
        serde_json::Value::Object(map) => Ok(!bind_map(map, lookup)?.is_empty()),
        _ => Ok(false),
    }
}
