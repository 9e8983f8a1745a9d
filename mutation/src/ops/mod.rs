//! Mutation operation implementations.
//!
//! Each operation (INSERT, UPDATE, DELETE) is implemented in its own module.
//! They share the statement helpers below.
//!
//! Captured rows are located again after a statement runs. Ordinary tables
//! are addressed by rowid; `WITHOUT ROWID` tables have none, so their rows
//! are addressed by primary key instead.

mod delete;
mod insert;
mod update;

pub use delete::execute_delete;
pub use insert::execute_insert;
pub use update::execute_update;

use opbatch_compiler::{Assignment, CompiledClause, Operand};
use opbatch_core::{CoreResult, Identifier, Row, Value};
use rusqlite::{params_from_iter, Connection};

use crate::error::MutationResult;
use crate::schema::TableSchema;

/// How rows of one table are addressed.
#[derive(Debug, Clone, PartialEq)]
enum RowKey {
    RowId,
    PrimaryKey(Vec<Identifier>),
}

impl RowKey {
    fn of(schema: &TableSchema) -> MutationResult<Self> {
        if !schema.without_rowid {
            return Ok(RowKey::RowId);
        }
        let columns = schema
            .primary_key
            .iter()
            .map(|name| Identifier::parse(name))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(RowKey::PrimaryKey(columns))
    }

    /// Key columns as a select list (also used for ORDER BY).
    fn select_list(&self) -> String {
        match self {
            RowKey::RowId => "rowid".to_string(),
            RowKey::PrimaryKey(columns) => column_list(columns),
        }
    }

    /// `rowid = ?` or `"a" = ? AND "b" = ?`.
    fn matcher(&self) -> String {
        match self {
            RowKey::RowId => "rowid = ?".to_string(),
            RowKey::PrimaryKey(columns) => columns
                .iter()
                .map(|c| format!("{} = ?", c.quoted()))
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }

    /// Key values an assignment list binds, when it binds all of them.
    fn bound_in(&self, assignments: &[Assignment]) -> Option<Vec<Value>> {
        match self {
            RowKey::RowId => None,
            RowKey::PrimaryKey(columns) => columns
                .iter()
                .map(|column| bound_value(assignments, column))
                .collect(),
        }
    }

    /// Replace key values that `assignments` overwrite with bound values.
    /// A key column set by an expression keeps its old value, so that row
    /// is not found again.
    fn after_update(&self, keys: &mut [Vec<Value>], assignments: &[Assignment]) {
        let RowKey::PrimaryKey(columns) = self else {
            return;
        };
        for (i, column) in columns.iter().enumerate() {
            if let Some(value) = bound_value(assignments, column) {
                for key in keys.iter_mut() {
                    key[i] = value.clone();
                }
            }
        }
    }
}

fn bound_value(assignments: &[Assignment], column: &Identifier) -> Option<Value> {
    assignments
        .iter()
        .find(|a| a.column.as_str().eq_ignore_ascii_case(column.as_str()))
        .and_then(|a| match &a.operand {
            Operand::Bound(value) => Some(value.clone()),
            Operand::Expression(_) => None,
        })
}

/// Run a read statement and collect rows keyed by column name.
pub fn read_rows(conn: &Connection, sql: &str, params: &[Value]) -> MutationResult<Vec<Row>> {
    tracing::debug!(%sql, params = params.len(), "reading rows");
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(params.iter()))?;

    let mut out = Vec::new();
    while let Some(raw) = rows.next()? {
        let mut row = Row::new();
        for (i, name) in names.iter().enumerate() {
            row.insert(name.clone(), Value::from_sql_ref(raw.get_ref(i)?));
        }
        out.push(row);
    }
    Ok(out)
}

/// Key values of the rows `clause` matches, in key order.
fn matching_keys(
    conn: &Connection,
    table: &Identifier,
    key: &RowKey,
    clause: &CompiledClause,
) -> MutationResult<Vec<Vec<Value>>> {
    let list = key.select_list();
    let sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {}",
        list,
        table.quoted(),
        clause.sql,
        list
    );
    tracing::debug!(%sql, params = clause.params.len(), "selecting row keys");
    let mut stmt = conn.prepare(&sql)?;
    let width = stmt.column_count();
    let mut rows = stmt.query(params_from_iter(clause.params.iter()))?;

    let mut out = Vec::new();
    while let Some(raw) = rows.next()? {
        let values = (0..width)
            .map(|i| raw.get_ref(i).map(Value::from_sql_ref))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        out.push(values);
    }
    Ok(out)
}

/// Run a write statement, returning the number of rows changed.
fn run(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<usize> {
    tracing::debug!(%sql, params = params.len(), "executing statement");
    conn.execute(sql, params_from_iter(params.iter()))
}

/// Comma-separated quoted column names.
fn column_list<'a>(columns: impl IntoIterator<Item = &'a Identifier>) -> String {
    columns
        .into_iter()
        .map(Identifier::quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

/// SQL for one operand, appending its parameter when bound.
fn render_operand(operand: &Operand, params: &mut Vec<Value>) -> String {
    match operand {
        Operand::Bound(value) => {
            params.push(value.clone());
            "?".to_string()
        }
        Operand::Expression(expr) => expr.as_sql().to_string(),
    }
}

/// `"a" = ?, "b" = CONCAT(...)` for an UPDATE.
fn render_set(assignments: &[Assignment], params: &mut Vec<Value>) -> String {
    assignments
        .iter()
        .map(|a| format!("{} = {}", a.column.quoted(), render_operand(&a.operand, params)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read `columns` of the rows with the given keys, in that order.
fn rows_by_key(
    conn: &Connection,
    table: &Identifier,
    key: &RowKey,
    columns: &[Identifier],
    keys: &[Vec<Value>],
) -> MutationResult<Vec<Row>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        column_list(columns),
        table.quoted(),
        key.matcher()
    );
    let mut out = Vec::with_capacity(keys.len());
    for values in keys {
        out.extend(read_rows(conn, &sql, values)?);
    }
    Ok(out)
}
