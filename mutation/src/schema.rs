//! Table descriptions read from the live database.
//!
//! `describe_table` answers `{columns: [{name, type, nullable, key}],
//! primary_key}` for one table. The executor uses it to reject unknown
//! table and column names before any name is interpolated, to look up
//! declared column types for value coercion, and to learn whether rows are
//! addressed by rowid or only by primary key.

use opbatch_core::Identifier;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{MutationError, MutationResult};

/// Index membership of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKey {
    #[serde(rename = "PRI")]
    Primary,
    #[serde(rename = "UNI")]
    Unique,
    #[serde(rename = "")]
    None,
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, as written in the table definition.
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub key: ColumnKey,
}

/// Description of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    #[serde(skip)]
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    /// Declared `WITHOUT ROWID`; such rows are only reachable by primary key.
    #[serde(skip)]
    pub without_rowid: bool,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Look up a column, failing with `UnknownColumn`.
    pub fn require_column(&self, name: &str) -> MutationResult<&ColumnInfo> {
        self.column(name)
            .ok_or_else(|| MutationError::unknown_column(&self.table, name))
    }

    /// Column that holds the generated id of an inserted row: the single
    /// primary key column, else `id`.
    pub fn id_column(&self) -> &str {
        match self.primary_key.as_slice() {
            [pk] => pk.as_str(),
            _ => "id",
        }
    }
}

/// Describe `table` from SQLite's catalog pragmas.
pub fn describe_table(conn: &Connection, table: &Identifier) -> MutationResult<TableSchema> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table.quoted()))?;
    // (name, declared type, notnull, pk position)
    let raw: Vec<(String, String, bool, i64)> = stmt
        .query_map([], |row| Ok((row.get(1)?, row.get(2)?, row.get(3)?, row.get(5)?)))?
        .collect::<Result<_, _>>()?;

    if raw.is_empty() {
        return Err(MutationError::unknown_table(table.as_str()));
    }

    let mut pk: Vec<(i64, String)> = raw
        .iter()
        .filter(|(_, _, _, pos)| *pos > 0)
        .map(|(name, _, _, pos)| (*pos, name.clone()))
        .collect();
    pk.sort();
    let primary_key: Vec<String> = pk.into_iter().map(|(_, name)| name).collect();

    let unique = unique_columns(conn, table)?;
    let without_rowid = conn
        .query_row(
            &format!("PRAGMA table_list({})", table.quoted()),
            [],
            |row| row.get::<_, bool>(4),
        )
        .optional()?
        .unwrap_or(false);

    let columns = raw
        .into_iter()
        .map(|(name, data_type, not_null, pos)| {
            let key = if pos > 0 {
                ColumnKey::Primary
            } else if unique.iter().any(|u| u == &name) {
                ColumnKey::Unique
            } else {
                ColumnKey::None
            };
            ColumnInfo {
                nullable: !not_null && pos == 0,
                name,
                data_type,
                key,
            }
        })
        .collect();

    Ok(TableSchema {
        table: table.as_str().to_string(),
        columns,
        primary_key,
        without_rowid,
    })
}

/// Columns covered on their own by a unique index.
fn unique_columns(conn: &Connection, table: &Identifier) -> MutationResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", table.quoted()))?;
    let indexes: Vec<(String, bool, String)> = stmt
        .query_map([], |row| Ok((row.get(1)?, row.get(2)?, row.get(3)?)))?
        .collect::<Result<_, _>>()?;

    let mut columns = Vec::new();
    for (index, unique, origin) in indexes {
        if !unique || origin == "pk" {
            continue;
        }
        let mut info = conn.prepare("SELECT name FROM pragma_index_info(?1)")?;
        let names: Vec<Option<String>> = info
            .query_map([&index], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        if let [Some(name)] = names.as_slice() {
            columns.push(name.clone());
        }
    }
    Ok(columns)
}

/// Table descriptions cached for the lifetime of one connection.
#[derive(Debug, Default)]
pub struct SchemaCache {
    tables: HashMap<String, TableSchema>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, conn: &Connection, table: &Identifier) -> MutationResult<&TableSchema> {
        if !self.tables.contains_key(table.as_str()) {
            let schema = describe_table(conn, table)?;
            self.tables.insert(table.as_str().to_string(), schema);
        }
        self.tables
            .get(table.as_str())
            .ok_or_else(|| MutationError::unknown_table(table.as_str()))
    }
}
