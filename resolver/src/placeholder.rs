//! Placeholder tokens.
//!
//! A token names a field of a row captured by an earlier operation:
//!
//! ```text
//! {{previous_result[0].id}}
//! {{ previous_result[2].username }}
//! ```
//!
//! A string that is exactly one token takes the referenced value with its
//! type intact. A token embedded in longer text is replaced by the value's
//! plain text form.

use opbatch_core::Value;
use regex_lite::{Captures, Regex};
use std::sync::OnceLock;

const TOKEN_PATTERN: &str =
    r"\{\{\s*previous_result\[(\d+)\]\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

/// A `previous_result[index].field` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub index: usize,
    pub field: String,
}

fn reference_from(caps: &Captures<'_>) -> Option<Reference> {
    let index = caps.get(1)?.as_str().parse().ok()?;
    let field = caps.get(2)?.as_str().to_string();
    Some(Reference { index, field })
}

/// All references in a string, in order of appearance.
pub fn references(text: &str) -> Vec<Reference> {
    token_regex()
        .captures_iter(text)
        .filter_map(|caps| reference_from(&caps))
        .collect()
}

/// All references anywhere in a JSON payload, including nested lists.
pub fn references_in(value: &serde_json::Value) -> Vec<Reference> {
    let mut found = Vec::new();
    collect(value, &mut found);
    found
}

fn collect(value: &serde_json::Value, found: &mut Vec<Reference>) {
    match value {
        serde_json::Value::String(s) => found.extend(references(s)),
        serde_json::Value::Array(items) => items.iter().for_each(|item| collect(item, found)),
        serde_json::Value::Object(map) => map.values().for_each(|item| collect(item, found)),
        _ => {}
    }
}

/// Replace every token in `text` using `lookup`.
///
/// Returns `Ok(None)` when the text holds no token.
pub fn substitute<E>(
    text: &str,
    mut lookup: impl FnMut(&Reference) -> Result<Value, E>,
) -> Result<Option<serde_json::Value>, E> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut found = false;

    for caps in token_regex().captures_iter(text) {
        let (Some(whole), Some(reference)) = (caps.get(0), reference_from(&caps)) else {
            continue;
        };
        let value = lookup(&reference)?;
        if whole.start() == 0 && whole.end() == text.len() {
            return Ok(Some(value.to_json()));
        }
        out.push_str(&text[last..whole.start()]);
        out.push_str(&value.to_string());
        last = whole.end();
        found = true;
    }

    if !found {
        return Ok(None);
    }
    out.push_str(&text[last..]);
    Ok(Some(serde_json::Value::String(out)))
}
