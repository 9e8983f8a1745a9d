//! Where-clause compiler.
//!
//! A `where` map pairs column names with conditions. A bare scalar means
//! equality; an object maps operator keys to operands:
//!
//! ```text
//! {"id": 3}                      "id" = ?
//! {"id": null}                   "id" IS NULL
//! {"id": {"IN": [1, 2]}}         "id" IN (?, ?)
//! {"id": {">": 1, "<=": 9}}      "id" > ? AND "id" <= ?
//! {"id": {"BETWEEN": [5, 6]}}    "id" BETWEEN ? AND ?
//! ```
//!
//! All predicates are ANDed. Operands are always bound.

use opbatch_core::{FieldMap, Identifier, Value};

use crate::error::{ClauseError, ClauseResult};

/// SQL text that matches no rows.
const MATCH_NONE: &str = "1 = 0";

/// A single condition on a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    IsNull,
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Like(Value),
    NotLike(Value),
    Gt(Value),
    Lt(Value),
    Gte(Value),
    Lte(Value),
    /// Inclusive on both ends.
    Between(Value, Value),
}

/// A condition bound to a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: Identifier,
    pub condition: Condition,
}

/// Predicate SQL plus its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Condition {
    /// Apply `f` to every comparison operand. LIKE patterns are left as
    /// written.
    pub fn try_map_operands<E>(
        self,
        mut f: impl FnMut(Value) -> Result<Value, E>,
    ) -> Result<Self, E> {
        Ok(match self {
            Condition::Eq(v) => Condition::Eq(f(v)?),
            Condition::In(items) => Condition::In(map_all(items, &mut f)?),
            Condition::NotIn(items) => Condition::NotIn(map_all(items, &mut f)?),
            Condition::Gt(v) => Condition::Gt(f(v)?),
            Condition::Lt(v) => Condition::Lt(f(v)?),
            Condition::Gte(v) => Condition::Gte(f(v)?),
            Condition::Lte(v) => Condition::Lte(f(v)?),
            Condition::Between(lo, hi) => Condition::Between(f(lo)?, f(hi)?),
            other @ (Condition::IsNull | Condition::Like(_) | Condition::NotLike(_)) => other,
        })
    }
}

fn map_all<E>(
    items: Vec<Value>,
    f: &mut impl FnMut(Value) -> Result<Value, E>,
) -> Result<Vec<Value>, E> {
    items.into_iter().map(|v| f(v)).collect()
}

impl Predicate {
    /// Render this predicate, appending its parameters.
    fn render(&self, params: &mut Vec<Value>) -> String {
        let col = self.column.quoted();
        match &self.condition {
            Condition::Eq(v) => binary(&col, "=", v, params),
            Condition::IsNull => format!("{} IS NULL", col),
            Condition::In(items) => list(&col, "IN", items, params),
            Condition::NotIn(items) => list(&col, "NOT IN", items, params),
            Condition::Like(v) => binary(&col, "LIKE", v, params),
            Condition::NotLike(v) => binary(&col, "NOT LIKE", v, params),
            Condition::Gt(v) => binary(&col, ">", v, params),
            Condition::Lt(v) => binary(&col, "<", v, params),
            Condition::Gte(v) => binary(&col, ">=", v, params),
            Condition::Lte(v) => binary(&col, "<=", v, params),
            Condition::Between(lo, hi) => {
                params.push(lo.clone());
                params.push(hi.clone());
                format!("{} BETWEEN ? AND ?", col)
            }
        }
    }
}

fn binary(col: &str, op: &str, value: &Value, params: &mut Vec<Value>) -> String {
    params.push(value.clone());
    format!("{} {} ?", col, op)
}

fn list(col: &str, op: &str, items: &[Value], params: &mut Vec<Value>) -> String {
    // An empty list never silently widens the statement.
    if items.is_empty() {
        return MATCH_NONE.to_string();
    }
    params.extend(items.iter().cloned());
    let marks = vec!["?"; items.len()].join(", ");
    format!("{} {} ({})", col, op, marks)
}

/// Parse a `where` map into predicates, in map order.
pub fn parse_where(filter: &FieldMap) -> ClauseResult<Vec<Predicate>> {
    if filter.is_empty() {
        return Err(ClauseError::EmptyWhere);
    }

    let mut predicates = Vec::new();
    for (name, condition) in filter {
        let column = Identifier::parse(name).map_err(|_| ClauseError::invalid_column(name))?;
        match condition {
            serde_json::Value::Object(ops) => {
                if ops.is_empty() {
                    return Err(ClauseError::empty_condition(name));
                }
                for (key, operand) in ops {
                    predicates.push(Predicate {
                        column: column.clone(),
                        condition: parse_operator(name, key, operand)?,
                    });
                }
            }
            serde_json::Value::Array(_) => return Err(ClauseError::invalid_condition(name)),
            serde_json::Value::Null => predicates.push(Predicate {
                column,
                condition: Condition::IsNull,
            }),
            scalar => predicates.push(Predicate {
                column,
                condition: Condition::Eq(Value::from_json(scalar)),
            }),
        }
    }
    Ok(predicates)
}

/// Normalize an operator key: upper-case, single spaces.
fn normalize_operator(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

fn parse_operator(column: &str, key: &str, operand: &serde_json::Value) -> ClauseResult<Condition> {
    let op = normalize_operator(key);
    let condition = match op.as_str() {
        "IN" => Condition::In(list_operand(column, &op, operand)?),
        "NOT IN" => Condition::NotIn(list_operand(column, &op, operand)?),
        "LIKE" => Condition::Like(scalar_operand(column, &op, operand)?),
        "NOT LIKE" => Condition::NotLike(scalar_operand(column, &op, operand)?),
        ">" => Condition::Gt(scalar_operand(column, &op, operand)?),
        "<" => Condition::Lt(scalar_operand(column, &op, operand)?),
        ">=" => Condition::Gte(scalar_operand(column, &op, operand)?),
        "<=" => Condition::Lte(scalar_operand(column, &op, operand)?),
        "BETWEEN" => {
            let bounds = list_operand(column, &op, operand)?;
            match <[Value; 2]>::try_from(bounds) {
                Ok([lo, hi]) => Condition::Between(lo, hi),
                Err(bounds) => {
                    return Err(ClauseError::invalid_operand(
                        column,
                        op,
                        format!("expected [low, high], got {} values", bounds.len()),
                    ))
                }
            }
        }
        _ => return Err(ClauseError::unknown_operator(column, key)),
    };
    Ok(condition)
}

fn scalar_operand(column: &str, op: &str, operand: &serde_json::Value) -> ClauseResult<Value> {
    match operand {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
            ClauseError::invalid_operand(column, op, "expected a scalar value"),
        ),
        scalar => Ok(Value::from_json(scalar)),
    }
}

fn list_operand(column: &str, op: &str, operand: &serde_json::Value) -> ClauseResult<Vec<Value>> {
    let items = operand
        .as_array()
        .ok_or_else(|| ClauseError::invalid_operand(column, op, "expected a list of values"))?;
    items
        .iter()
        .map(|item| scalar_operand(column, op, item))
        .collect()
}

/// Compile a `where` map into an ANDed, parameterized predicate.
pub fn compile_where(filter: &FieldMap) -> ClauseResult<CompiledClause> {
    Ok(compile_predicates(&parse_where(filter)?))
}

/// Render already parsed predicates, ANDed.
pub fn compile_predicates(predicates: &[Predicate]) -> CompiledClause {
    let mut params = Vec::new();
    let parts: Vec<String> = predicates.iter().map(|p| p.render(&mut params)).collect();
    let sql = parts.join(" AND ");
    tracing::trace!(%sql, params = params.len(), "compiled where clause");
    CompiledClause { sql, params }
}
