//! INSERT operation - creates one row.

use opbatch_compiler::Assignment;
use opbatch_core::{Identifier, OperationType, Row, Value};
use rusqlite::Connection;

use super::{column_list, render_operand, rows_by_key, run, RowKey};
use crate::error::{MutationError, MutationResult};
use crate::result::MutationOutcome;
use crate::schema::TableSchema;

/// Execute an INSERT and capture the new row.
///
/// The captured row holds the requested columns plus the generated id under
/// the table's id column. A `WITHOUT ROWID` row is found again by the key
/// values the assignments bind; a key computed by an expression leaves the
/// captured row empty.
pub fn execute_insert(
    conn: &Connection,
    table: &Identifier,
    schema: &TableSchema,
    assignments: &[Assignment],
    return_affected: &[Identifier],
) -> MutationResult<MutationOutcome> {
    let mut params = Vec::new();
    let sql = if assignments.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table.quoted())
    } else {
        let values: Vec<String> = assignments
            .iter()
            .map(|a| render_operand(&a.operand, &mut params))
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.quoted(),
            column_list(assignments.iter().map(|a| &a.column)),
            values.join(", ")
        )
    };

    let key = RowKey::of(schema)?;
    let affected = run(conn, &sql, &params)
        .map_err(|e| MutationError::from(e).with_conflicting_value(assignments))?;

    let (row_id, located) = match &key {
        RowKey::RowId => {
            let row_id = conn.last_insert_rowid();
            (Some(row_id), Some(vec![Value::Int(row_id)]))
        }
        RowKey::PrimaryKey(_) => (None, key.bound_in(assignments)),
    };

    let id_column = schema.id_column();
    let mut columns = return_affected.to_vec();
    let id_is_column = schema.column(id_column).is_some();
    if id_is_column && !columns.iter().any(|c| c.as_str().eq_ignore_ascii_case(id_column)) {
        columns.push(Identifier::parse(id_column)?);
    }

    let mut row = match located {
        Some(values) if !columns.is_empty() => {
            rows_by_key(conn, table, &key, &columns, &[values])?
                .into_iter()
                .next()
                .unwrap_or_default()
        }
        Some(_) => Row::new(),
        None => {
            tracing::warn!(
                table = table.as_str(),
                "inserted row has no bound key, nothing captured"
            );
            Row::new()
        }
    };
    if let (Some(id), false) = (row_id, id_is_column) {
        row.insert(id_column.to_string(), Value::Int(id));
    }

    let mut outcome = MutationOutcome::new(OperationType::Insert, table.as_str())
        .with_affected_rows(affected);
    if let Some(id) = row_id.or_else(|| row.get(id_column).and_then(Value::as_int)) {
        outcome = outcome.with_insert_id(id);
    }
    Ok(outcome.with_captured(vec![row]))
}
