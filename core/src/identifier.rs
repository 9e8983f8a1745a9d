//! Validated SQL identifiers.
//!
//! Table and column names are interpolated into statement text, so every
//! name that reaches SQL passes through [`Identifier::parse`] first.

use regex_lite::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{CoreError, CoreResult};

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid"))
}

/// A table or column name that is safe to interpolate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Parse a name, rejecting anything outside `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn parse(name: &str) -> CoreResult<Self> {
        if identifier_regex().is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(CoreError::invalid_identifier(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier in double quotes, ready for statement text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
