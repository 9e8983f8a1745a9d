//! Mutation executor - coordinates mutation operations.
//!
//! The executor delegates to specialized operation modules in `ops/`:
//! - `ops/insert.rs` - INSERT (row creation, generated id capture)
//! - `ops/update.rs` - UPDATE (predicate match, post-update capture)
//! - `ops/delete.rs` - DELETE (pre-delete capture)
//!
//! Before delegating it checks names against the schema, classifies
//! assignment values and coerces the bound ones.

use opbatch_compiler::{classify_assignments, Assignment};
use opbatch_core::{FieldMap, Identifier, OperationKind};
use rusqlite::Connection;
use std::collections::BTreeSet;

use crate::error::MutationResult;
use crate::ops;
use crate::result::MutationOutcome;
use crate::schema::{SchemaCache, TableSchema};
use crate::validation;

/// Mutation executor bound to one connection (or open transaction).
pub struct MutationExecutor<'c> {
    conn: &'c Connection,
    schemas: SchemaCache,
}

impl<'c> MutationExecutor<'c> {
    /// Create a new executor.
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            schemas: SchemaCache::new(),
        }
    }

    /// Execute one resolved operation.
    ///
    /// `bound_only` names assignment columns that must be bound as
    /// parameters whatever their text looks like.
    pub fn execute(
        &mut self,
        table: &Identifier,
        kind: &OperationKind,
        bound_only: &BTreeSet<String>,
        return_affected: &[Identifier],
    ) -> MutationResult<MutationOutcome> {
        match kind {
            OperationKind::Insert { values } => {
                self.execute_insert(table, values, bound_only, return_affected)
            }
            OperationKind::Update { set, filter } => {
                self.execute_update(table, set, filter, bound_only, return_affected)
            }
            OperationKind::Delete { filter } => self.execute_delete(table, filter, return_affected),
        }
    }

    /// Execute an INSERT.
    pub fn execute_insert(
        &mut self,
        table: &Identifier,
        values: &FieldMap,
        bound_only: &BTreeSet<String>,
        return_affected: &[Identifier],
    ) -> MutationResult<MutationOutcome> {
        let schema = self.schemas.get(self.conn, table)?;
        let assignments = prepare(schema, values, bound_only)?;
        validation::check_captures(schema, return_affected)?;
        ops::execute_insert(self.conn, table, schema, &assignments, return_affected)
    }

    /// Execute an UPDATE.
    pub fn execute_update(
        &mut self,
        table: &Identifier,
        set: &FieldMap,
        filter: &FieldMap,
        bound_only: &BTreeSet<String>,
        return_affected: &[Identifier],
    ) -> MutationResult<MutationOutcome> {
        let schema = self.schemas.get(self.conn, table)?;
        let assignments = prepare(schema, set, bound_only)?;
        validation::check_captures(schema, return_affected)?;
        ops::execute_update(self.conn, table, schema, &assignments, filter, return_affected)
    }

    /// Execute a DELETE.
    pub fn execute_delete(
        &mut self,
        table: &Identifier,
        filter: &FieldMap,
        return_affected: &[Identifier],
    ) -> MutationResult<MutationOutcome> {
        let schema = self.schemas.get(self.conn, table)?;
        validation::check_captures(schema, return_affected)?;
        ops::execute_delete(self.conn, table, schema, filter, return_affected)
    }

    /// Insert one record, returning its generated id.
    pub fn insert_record(&mut self, table: &Identifier, fields: &FieldMap) -> MutationResult<i64> {
        let outcome = self.execute_insert(table, fields, &BTreeSet::new(), &[])?;
        Ok(outcome.last_insert_id.unwrap_or_default())
    }

    /// Update the record whose `primary_key` equals `value`.
    pub fn update_record(
        &mut self,
        table: &Identifier,
        primary_key: &Identifier,
        value: &serde_json::Value,
        fields: &FieldMap,
    ) -> MutationResult<usize> {
        let filter = key_filter(primary_key, value);
        let outcome = self.execute_update(table, fields, &filter, &BTreeSet::new(), &[])?;
        Ok(outcome.affected_rows)
    }

    /// Delete the record whose `primary_key` equals `value`.
    pub fn delete_record(
        &mut self,
        table: &Identifier,
        primary_key: &Identifier,
        value: &serde_json::Value,
    ) -> MutationResult<usize> {
        let filter = key_filter(primary_key, value);
        Ok(self.execute_delete(table, &filter, &[])?.affected_rows)
    }
}

fn key_filter(primary_key: &Identifier, value: &serde_json::Value) -> FieldMap {
    let mut filter = FieldMap::new();
    filter.insert(primary_key.as_str().to_string(), value.clone());
    filter
}

fn prepare(
    schema: &TableSchema,
    map: &FieldMap,
    bound_only: &BTreeSet<String>,
) -> MutationResult<Vec<Assignment>> {
    let assignments = classify_assignments(map, bound_only)?;
    validation::prepare_assignments(schema, assignments)
}
