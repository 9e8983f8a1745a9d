//! Operation Validator.
//!
//! Checks the whole batch before a connection is opened:
//!
//! - the body is an array of objects, no longer than the configured limit
//! - each entry names a known operation and a valid table identifier
//! - each kind carries its required clauses (`values`; `set` + `where`;
//!   `where`) as objects with identifier keys
//! - `depends_on_index` points strictly backward
//! - every placeholder names the operation's own dependency, and no
//!   allow-listed expression embeds a placeholder
//!
//! An empty array validates to an empty operation list.

use opbatch_compiler::parse_expression;
use opbatch_core::{FieldMap, Identifier, Operation, OperationKind, OperationSpec, OperationType};
use opbatch_resolver::{references, references_in};

use crate::error::ValidationError;

/// Validate a raw batch body.
pub fn validate_batch(
    body: &serde_json::Value,
    max_operations: usize,
) -> Result<Vec<Operation>, ValidationError> {
    let entries = body
        .as_array()
        .ok_or_else(|| ValidationError::batch("request body must be a JSON array of operations"))?;

    if entries.len() > max_operations {
        return Err(ValidationError::batch(format!(
            "batch has {} operations, the limit is {}",
            entries.len(),
            max_operations
        )));
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.is_object() {
                return Err(ValidationError::operation(index, "must be a JSON object"));
            }
            let spec: OperationSpec = serde_json::from_value(entry.clone())
                .map_err(|e| ValidationError::operation(index, e.to_string()))?;
            validate_operation(index, &spec)
        })
        .collect()
}

/// Validate one entry at position `index`.
pub fn validate_operation(index: usize, spec: &OperationSpec) -> Result<Operation, ValidationError> {
    let fail = |message: String| ValidationError::operation(index, message);

    let operation_type = match &spec.operation {
        Some(serde_json::Value::String(s)) => s
            .parse::<OperationType>()
            .map_err(|_| fail(format!("unknown operation {:?}", s)))?,
        Some(_) => return Err(fail("operation must be a string".into())),
        None => return Err(fail("missing operation".into())),
    };

    let table = match &spec.table_name {
        Some(serde_json::Value::String(s)) => {
            Identifier::parse(s).map_err(|e| fail(e.to_string()))?
        }
        Some(_) => return Err(fail("table_name must be a string".into())),
        None => return Err(fail("missing table_name".into())),
    };
    let fail = |message: String| fail(message).with_table(table.as_str());

    let depends_on = match &spec.depends_on_index {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => {
            let dep = value
                .as_u64()
                .ok_or_else(|| fail("depends_on_index must be a non-negative integer".into()))?;
            if dep >= index as u64 {
                return Err(fail(format!(
                    "depends_on_index {} must refer to an earlier operation",
                    dep
                )));
            }
            Some(dep as usize)
        }
    };

    let return_affected = match &spec.return_affected {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| fail("return_affected must list column names".into()))
                    .and_then(|name| Identifier::parse(name).map_err(|e| fail(e.to_string())))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(fail("return_affected must be an array".into())),
    };

    let object = |clause: &str, value: &Option<serde_json::Value>| -> Result<FieldMap, ValidationError> {
        let map = match value {
            Some(serde_json::Value::Object(map)) => map.clone(),
            Some(_) => return Err(fail(format!("{} must be an object", clause))),
            None => return Err(fail(format!("{} operation requires {}", operation_type, clause))),
        };
        for key in map.keys() {
            Identifier::parse(key).map_err(|e| fail(format!("{}: {}", clause, e)))?;
        }
        Ok(map)
    };
    let non_empty = |clause: &str, value: &Option<serde_json::Value>| -> Result<FieldMap, ValidationError> {
        let map = object(clause, value)?;
        if map.is_empty() {
            return Err(fail(format!("{} must not be empty", clause)));
        }
        Ok(map)
    };

    let kind = match operation_type {
        OperationType::Insert => OperationKind::Insert {
            values: object("values", &spec.values)?,
        },
        OperationType::Update => OperationKind::Update {
            set: non_empty("set", &spec.set)?,
            filter: non_empty("where", &spec.filter)?,
        },
        OperationType::Delete => OperationKind::Delete {
            filter: non_empty("where", &spec.filter)?,
        },
    };

    check_placeholders(&kind, depends_on).map_err(fail)?;

    Ok(Operation {
        index,
        table,
        kind,
        depends_on,
        return_affected,
    })
}

fn check_placeholders(kind: &OperationKind, depends_on: Option<usize>) -> Result<(), String> {
    for payload in kind.payloads() {
        for value in payload.values() {
            for reference in references_in(value) {
                match depends_on {
                    None => {
                        return Err(format!(
                            "placeholder previous_result[{}].{} requires depends_on_index",
                            reference.index, reference.field
                        ))
                    }
                    Some(dep) if dep != reference.index => {
                        return Err(format!(
                            "placeholder previous_result[{}].{} does not match depends_on_index {}",
                            reference.index, reference.field, dep
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
    }

    if let Some(assignments) = kind.assignments() {
        for (column, value) in assignments {
            if let Some(text) = value.as_str() {
                if parse_expression(text).is_some() && !references(text).is_empty() {
                    return Err(format!(
                        "{}: a SQL expression cannot contain a placeholder",
                        column
                    ));
                }
            }
        }
    }
    Ok(())
}
