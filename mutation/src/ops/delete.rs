//! DELETE operation - removes the rows matched by a where clause.

use opbatch_core::{FieldMap, Identifier, OperationType};
use rusqlite::Connection;

use super::{column_list, read_rows, run, RowKey};
use crate::error::MutationResult;
use crate::result::MutationOutcome;
use crate::schema::TableSchema;
use crate::validation;

/// Execute a DELETE, capturing the requested columns of the doomed rows
/// before they are removed.
pub fn execute_delete(
    conn: &Connection,
    table: &Identifier,
    schema: &TableSchema,
    filter: &FieldMap,
    return_affected: &[Identifier],
) -> MutationResult<MutationOutcome> {
    let clause = validation::prepare_filter(schema, filter)?;

    let captured = if return_affected.is_empty() {
        None
    } else {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            column_list(return_affected),
            table.quoted(),
            clause.sql,
            RowKey::of(schema)?.select_list()
        );
        Some(read_rows(conn, &sql, &clause.params)?)
    };

    let sql = format!("DELETE FROM {} WHERE {}", table.quoted(), clause.sql);
    let affected = run(conn, &sql, &clause.params)?;

    let outcome =
        MutationOutcome::new(OperationType::Delete, table.as_str()).with_affected_rows(affected);
    Ok(match captured {
        Some(rows) => outcome.with_captured(rows),
        None => outcome,
    })
}
