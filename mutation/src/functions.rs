//! SQL functions registered on every connection.
//!
//! SQLite lacks `NOW()` and `CONCAT(...)`; both are allow-listed expression
//! functions, so each connection gets a MySQL-compatible version.

use opbatch_core::Value;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::error::MutationResult;

/// Timestamp layout shared with `CURRENT_TIMESTAMP`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Register `NOW()` and `CONCAT(...)` on `conn`.
pub fn register_functions(conn: &Connection) -> MutationResult<()> {
    conn.create_scalar_function("NOW", 0, FunctionFlags::SQLITE_UTF8, |_ctx| {
        Ok(chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string())
    })?;

    conn.create_scalar_function(
        "CONCAT",
        -1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let mut out = String::new();
            for i in 0..ctx.len() {
                match ctx.get_raw(i) {
                    // Any NULL argument makes the result NULL
                    ValueRef::Null => return Ok(None),
                    raw => out.push_str(&Value::from_sql_ref(raw).to_string()),
                }
            }
            Ok(Some(out))
        },
    )?;

    Ok(())
}
