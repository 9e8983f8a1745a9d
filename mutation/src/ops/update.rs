//! UPDATE operation - modifies the rows matched by a where clause.

use opbatch_compiler::Assignment;
use opbatch_core::{FieldMap, Identifier, OperationType};
use rusqlite::Connection;

use super::{matching_keys, render_set, rows_by_key, run, RowKey};
use crate::error::{MutationError, MutationResult};
use crate::result::MutationOutcome;
use crate::schema::TableSchema;
use crate::validation;

/// Execute an UPDATE.
///
/// With `return_affected`, the keys of the matched rows (rowids, or primary
/// keys of a `WITHOUT ROWID` table) are selected first and the requested
/// columns re-read after the update, so the captured rows are the
/// post-update state of exactly the rows the predicate matched.
pub fn execute_update(
    conn: &Connection,
    table: &Identifier,
    schema: &TableSchema,
    assignments: &[Assignment],
    filter: &FieldMap,
    return_affected: &[Identifier],
) -> MutationResult<MutationOutcome> {
    let clause = validation::prepare_filter(schema, filter)?;

    let key = RowKey::of(schema)?;
    let matched = if return_affected.is_empty() {
        None
    } else {
        Some(matching_keys(conn, table, &key, &clause)?)
    };

    let mut params = Vec::new();
    let set = render_set(assignments, &mut params);
    params.extend(clause.params.iter().cloned());
    let sql = format!("UPDATE {} SET {} WHERE {}", table.quoted(), set, clause.sql);

    let affected = run(conn, &sql, &params)
        .map_err(|e| MutationError::from(e).with_conflicting_value(assignments))?;

    let mut outcome =
        MutationOutcome::new(OperationType::Update, table.as_str()).with_affected_rows(affected);
    if let Some(mut keys) = matched {
        key.after_update(&mut keys, assignments);
        outcome = outcome.with_captured(rows_by_key(conn, table, &key, return_affected, &keys)?);
    }
    Ok(outcome)
}
