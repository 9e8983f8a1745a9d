//! Column checks and value coercion.
//!
//! Bound values are prepared according to the declared type of the column
//! they are written to. SQLite accepts anything in any column, so this is
//! where a malformed date or a non-numeric id is turned away.

use chrono::{NaiveDate, NaiveDateTime};
use opbatch_compiler::{compile_predicates, parse_where, Assignment, CompiledClause, Operand};
use opbatch_core::{FieldMap, Identifier, Value};

use crate::error::{MutationError, MutationResult};
use crate::schema::TableSchema;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%a, %d %b %Y %H:%M:%S GMT",
    "%Y年%m月%d日 %H:%M:%S GMT",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeClass {
    Date,
    DateTime,
    Integer,
    Real,
    Other,
}

impl TypeClass {
    fn of(declared: &str) -> Self {
        let t = declared.to_ascii_uppercase();
        if t.contains("DATETIME") || t.contains("TIMESTAMP") {
            TypeClass::DateTime
        } else if t.contains("DATE") {
            TypeClass::Date
        } else if t.contains("INT") {
            TypeClass::Integer
        } else if ["REAL", "FLOA", "DOUB", "NUMERIC", "DECIMAL"]
            .iter()
            .any(|k| t.contains(k))
        {
            TypeClass::Real
        } else {
            TypeClass::Other
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            TypeClass::Date => "a date",
            TypeClass::DateTime => "a date and time",
            TypeClass::Integer | TypeClass::Real => "a number",
            TypeClass::Other => "a value",
        }
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Coerce a bound value for `column` of `schema`.
pub fn coerce_value(schema: &TableSchema, column: &str, value: Value) -> MutationResult<Value> {
    let info = schema.require_column(column)?;
    let class = TypeClass::of(&info.data_type);

    let text = match value {
        Value::String(text) => text,
        other => return Ok(other),
    };

    let invalid =
        || MutationError::invalid_value(&schema.table, column, class.describe(), text.as_str());

    match class {
        TypeClass::DateTime => parse_timestamp(&text)
            .map(|ts| Value::String(ts.format("%Y-%m-%d %H:%M:%S").to_string()))
            .ok_or_else(invalid),
        TypeClass::Date => parse_timestamp(&text)
            .map(|ts| Value::String(ts.format("%Y-%m-%d").to_string()))
            .ok_or_else(invalid),
        TypeClass::Integer => {
            let trimmed = text.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Ok(Value::Int(i))
            } else {
                parse_finite(trimmed).map(Value::Float).ok_or_else(invalid)
            }
        }
        TypeClass::Real => parse_finite(text.trim()).map(Value::Float).ok_or_else(invalid),
        TypeClass::Other => Ok(Value::String(text)),
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Check every assignment column and coerce bound operands.
pub(crate) fn prepare_assignments(
    schema: &TableSchema,
    assignments: Vec<Assignment>,
) -> MutationResult<Vec<Assignment>> {
    assignments
        .into_iter()
        .map(|assignment| {
            schema.require_column(assignment.column.as_str())?;
            let operand = match assignment.operand {
                Operand::Bound(value) => {
                    Operand::Bound(coerce_value(schema, assignment.column.as_str(), value)?)
                }
                expr => expr,
            };
            Ok(Assignment {
                column: assignment.column,
                operand,
            })
        })
        .collect()
}

/// Compile a `where` map, checking its columns and coercing comparison
/// operands the same way written values are.
pub(crate) fn prepare_filter(
    schema: &TableSchema,
    filter: &FieldMap,
) -> MutationResult<CompiledClause> {
    let predicates = parse_where(filter)?
        .into_iter()
        .map(|mut predicate| {
            let column = predicate.column.as_str();
            schema.require_column(column)?;
            predicate.condition = predicate
                .condition
                .try_map_operands(|value| coerce_value(schema, column, value))?;
            Ok(predicate)
        })
        .collect::<MutationResult<Vec<_>>>()?;
    Ok(compile_predicates(&predicates))
}

/// Check that every named column exists.
pub(crate) fn check_columns<'a>(
    schema: &TableSchema,
    columns: impl IntoIterator<Item = &'a str>,
) -> MutationResult<()> {
    for column in columns {
        schema.require_column(column)?;
    }
    Ok(())
}

/// Check the columns an operation asks to capture.
pub(crate) fn check_captures(schema: &TableSchema, columns: &[Identifier]) -> MutationResult<()> {
    check_columns(schema, columns.iter().map(Identifier::as_str))
}
