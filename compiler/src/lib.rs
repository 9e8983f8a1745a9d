//! opbatch Compiler
//!
//! Turn operation payloads into parameterized SQL fragments.
//!
//! Responsibilities:
//! - Classify `values`/`set` entries as bound parameters or allow-listed
//!   SQL function calls (expression passthrough)
//! - Compile `where` maps into ANDed, parameterized predicates
//!
//! # Module Structure
//!
//! - `expression` - Expression classifier and assignment lists
//! - `clause` - Where-clause compiler (condition tagged union)
//! - `error` - Error types for clause compilation failures

mod clause;
mod error;
mod expression;

pub use clause::{
    compile_predicates, compile_where, parse_where, CompiledClause, Condition, Predicate,
};
pub use error::{ClauseError, ClauseResult};
pub use expression::{
    classify, classify_assignments, parse_expression, Assignment, Operand, SqlExpression,
    SqlFunction,
};
