//! Expression classifier.
//!
//! A `values`/`set` entry is either bound as a parameter or, when it is a
//! single call to an allow-listed SQL function, embedded verbatim. The body
//! may only call other allow-listed functions and may not hold a subquery;
//! column references are still permitted, so payloads must come from a
//! trusted producer.

use opbatch_core::{CoreResult, FieldMap, Identifier, Value};
use regex_lite::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const CALL_PATTERN: &str = r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)$";

fn call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CALL_PATTERN).expect("call pattern is valid"))
}

/// SQL functions allowed in expression passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlFunction {
    Concat,
    Now,
    CurrentTimestamp,
    Upper,
    Lower,
    Trim,
    Coalesce,
}

impl SqlFunction {
    /// Look up an allow-listed function by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "CONCAT" => Some(SqlFunction::Concat),
            "NOW" => Some(SqlFunction::Now),
            "CURRENT_TIMESTAMP" => Some(SqlFunction::CurrentTimestamp),
            "UPPER" => Some(SqlFunction::Upper),
            "LOWER" => Some(SqlFunction::Lower),
            "TRIM" => Some(SqlFunction::Trim),
            "COALESCE" => Some(SqlFunction::Coalesce),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlFunction::Concat => "CONCAT",
            SqlFunction::Now => "NOW",
            SqlFunction::CurrentTimestamp => "CURRENT_TIMESTAMP",
            SqlFunction::Upper => "UPPER",
            SqlFunction::Lower => "LOWER",
            SqlFunction::Trim => "TRIM",
            SqlFunction::Coalesce => "COALESCE",
        }
    }

    fn takes_arguments(&self) -> bool {
        !matches!(self, SqlFunction::Now | SqlFunction::CurrentTimestamp)
    }
}

/// A raw SQL expression accepted by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlExpression {
    function: SqlFunction,
    text: String,
}

impl SqlExpression {
    pub fn function(&self) -> SqlFunction {
        self.function
    }

    /// Expression text to embed in the statement.
    pub fn as_sql(&self) -> &str {
        &self.text
    }
}

/// How a payload value enters a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bound as a `?` parameter.
    Bound(Value),
    /// Embedded verbatim.
    Expression(SqlExpression),
}

/// One `column = operand` pair of an insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: Identifier,
    pub operand: Operand,
}

/// Recognize an allow-listed function call spanning the whole string.
pub fn parse_expression(text: &str) -> Option<SqlExpression> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("CURRENT_TIMESTAMP") {
        return Some(SqlExpression {
            function: SqlFunction::CurrentTimestamp,
            text: "CURRENT_TIMESTAMP".to_string(),
        });
    }

    let caps = call_regex().captures(trimmed)?;
    let function = SqlFunction::from_name(caps.get(1)?.as_str())?;
    let body = caps.get(2)?.as_str();

    if !function.takes_arguments() && !body.trim().is_empty() {
        return None;
    }
    if !is_safe_body(body) {
        return None;
    }

    // The keyword form is the only one every backend parses.
    let text = match function {
        SqlFunction::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
        _ => trimmed.to_string(),
    };
    Some(SqlExpression { function, text })
}

/// Check an argument list outside single-quoted literals: parentheses
/// balance, there is no statement separator, no `SELECT`, and every word
/// followed by `(` names an allow-listed function. A `)` that closes the
/// outer call early fails the check.
fn is_safe_body(body: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_quote = false;
    let mut chars = body.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            '\'' => in_quote = !in_quote,
            _ if in_quote => {}
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            ';' => return false,
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_') {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                if c.is_ascii_digit() {
                    continue;
                }
                let word = &body[start..end];
                if word.eq_ignore_ascii_case("SELECT") {
                    return false;
                }
                let called = body[end..].trim_start().starts_with('(');
                if called && SqlFunction::from_name(word).is_none() {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !in_quote
}

/// Classify one payload value.
pub fn classify(value: &serde_json::Value) -> Operand {
    if let serde_json::Value::String(s) = value {
        if let Some(expr) = parse_expression(s) {
            return Operand::Expression(expr);
        }
    }
    Operand::Bound(Value::from_json(value))
}

/// Classify every entry of a `values`/`set` map.
///
/// Columns listed in `bound_only` received placeholder-substituted data and
/// are always bound, whatever they look like.
pub fn classify_assignments(
    map: &FieldMap,
    bound_only: &BTreeSet<String>,
) -> CoreResult<Vec<Assignment>> {
    map.iter()
        .map(|(column, value)| {
            let operand = if bound_only.contains(column) {
                Operand::Bound(Value::from_json(value))
            } else {
                classify(value)
            };
            Ok(Assignment {
                column: Identifier::parse(column)?,
                operand,
            })
        })
        .collect()
}
