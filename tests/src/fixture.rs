//! Seeded test database.

use opbatch_core::{Row, Value};
use opbatch_session::{BatchResponse, BatchService, Database, ExecutionOptions};
use tempfile::TempDir;

use crate::init_tracing_for_tests;

/// Schema and rows every test database starts with.
pub const SEED_SQL: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(50) NOT NULL UNIQUE,
    email VARCHAR(100) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    created_at DATETIME,
    updated_at DATETIME
);

CREATE TABLE prompts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    title VARCHAR(255) NOT NULL,
    content TEXT,
    created_at DATETIME
);

CREATE TABLE api_tokens (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    token VARCHAR(255) NOT NULL UNIQUE,
    expires_at DATETIME,
    created_at DATETIME
);

INSERT INTO users (id, username, email, password, created_at) VALUES
    (1, 'alice',  'alice@example.com',  'pw1', '2025-01-01 09:00:00'),
    (2, 'bob',    'bob@example.com',    'pw2', '2025-01-02 09:00:00'),
    (3, 'carol',  'carol@example.com',  'pw3', '2025-01-03 09:00:00'),
    (4, 'diana',  'diana@example.com',  'pw4', '2025-01-04 09:00:00'),
    (5, 'edward', 'edward@example.com', 'pw5', '2025-01-05 09:00:00'),
    (6, 'fiona',  'fiona@gmail.com',    'pw6', '2025-01-06 09:00:00');

INSERT INTO prompts (user_id, title, content, created_at) VALUES
    (1, 'Welcome', 'First prompt', '2025-02-01 10:00:00'),
    (5, 'Edward notes', NULL, '2025-02-02 10:00:00'),
    (5, 'Edward drafts', 'draft', '2025-02-03 10:00:00');

INSERT INTO api_tokens (user_id, token, expires_at) VALUES
    (5, 'tok-edward', '2026-01-01 00:00:00');
";

/// A seeded SQLite database plus the service that runs batches on it.
pub struct TestDb {
    // Keeps the directory alive for the database's lifetime.
    _dir: TempDir,
    service: BatchService,
}

impl TestDb {
    pub fn new() -> Self {
        Self::with_options(ExecutionOptions::default())
    }

    pub fn with_options(options: ExecutionOptions) -> Self {
        init_tracing_for_tests();
        let dir = tempfile::tempdir().expect("create temp dir");
        let database = Database::new(dir.path().join("opbatch.db"));
        database.execute_script(SEED_SQL).expect("seed database");
        Self {
            _dir: dir,
            service: BatchService::new(database, options),
        }
    }

    pub fn service(&self) -> &BatchService {
        &self.service
    }

    pub fn database(&self) -> &Database {
        self.service.database()
    }

    /// Run a batch given as JSON.
    pub fn run(&self, batch: serde_json::Value) -> BatchResponse {
        self.service.handle_value(&batch)
    }

    /// Run a raw request body.
    pub fn run_raw(&self, body: &str) -> BatchResponse {
        self.service.handle(body)
    }

    /// Read rows with a fresh connection.
    pub fn query(&self, sql: &str) -> Vec<Row> {
        let conn = self.database().acquire().expect("open connection");
        let mut stmt = conn.prepare(sql).expect("prepare query");
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map([], |raw| {
                let mut row = Row::new();
                for (i, name) in names.iter().enumerate() {
                    row.insert(name.clone(), Value::from_sql_ref(raw.get_ref(i)?));
                }
                Ok(row)
            })
            .expect("run query")
            .collect::<Result<Vec<_>, _>>()
            .expect("read rows");
        rows
    }

    /// Single integer result of `sql`.
    pub fn scalar(&self, sql: &str) -> i64 {
        let conn = self.database().acquire().expect("open connection");
        conn.query_row(sql, [], |row| row.get(0)).expect("scalar query")
    }

    pub fn count(&self, table: &str) -> i64 {
        self.scalar(&format!("SELECT COUNT(*) FROM \"{}\"", table))
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_counts() {
        let db = TestDb::new();
        assert_eq!(db.count("users"), 6);
        assert_eq!(db.count("prompts"), 3);
        assert_eq!(db.count("api_tokens"), 1);
    }

    #[test]
    fn test_query_returns_named_columns() {
        let db = TestDb::new();
        let rows = db.query("SELECT id, username FROM users WHERE id = 2");
        assert_eq!(rows[0]["username"], Value::from("bob"));
    }
}
