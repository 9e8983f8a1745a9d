//! A failure anywhere rolls back everything before it.

use opbatch_tests::prelude::*;

#[test]
fn test_failure_rolls_back_earlier_operations() {
    // GIVEN: three writes, then an insert that violates a foreign key
    let db = TestDb::new();
    let batch = json!([
        {
            "operation": "insert",
            "table_name": "users",
            "values": {"username": "kate", "email": "kate@example.com", "password": "pw"}
        },
        {
            "operation": "update",
            "table_name": "users",
            "set": {"username": "robert"},
            "where": {"id": 2}
        },
        {
            "operation": "delete",
            "table_name": "api_tokens",
            "where": {"token": "tok-edward"}
        },
        {
            "operation": "insert",
            "table_name": "prompts",
            "values": {"user_id": 999, "title": "orphan"}
        }
    ]);

    // WHEN
    let response = db.run(batch);

    // THEN
    expect(&response)
        .status(409)
        .error_type("IntegrityError.ForeignKeyViolation")
        .error_message("Foreign key constraint violation during batch operation.")
        .failed_at(3)
        .results(4);

    assert_eq!(db.count("users"), 6);
    assert_eq!(db.count("api_tokens"), 1);
    assert_eq!(db.count("prompts"), 3);
    assert_eq!(
        db.query("SELECT username FROM users WHERE id = 2")[0]["username"],
        Value::from("bob")
    );
}

#[test]
fn test_not_null_failure_is_server_error() {
    // GIVEN
    let db = TestDb::new();
    let batch = json!([
        {
            "operation": "delete",
            "table_name": "users",
            "where": {"id": 3}
        },
        {
            "operation": "insert",
            "table_name": "users",
            "values": {"username": "lena", "email": "lena@example.com"}
        }
    ]);

    // WHEN
    let response = db.run(batch);

    // THEN
    expect(&response)
        .status(500)
        .error_type("OtherDatabaseError")
        .error_message("Database error during batch operation.")
        .failed_at(1);
    assert_eq!(db.count("users"), 6);
}

#[test]
fn test_delete_of_referenced_row_conflicts() {
    let db = TestDb::new();
    let response = db.run(json!([
        {"operation": "delete", "table_name": "users", "where": {"id": 5}}
    ]));

    expect(&response)
        .status(409)
        .error_type("IntegrityError.ForeignKeyViolation")
        .failed_at(0);
    assert_eq!(db.count("users"), 6);
}

#[test]
fn test_committed_batch_is_visible_to_new_connections() {
    let db = TestDb::new();
    let response = db.run(json!([
        {"operation": "delete", "table_name": "users", "where": {"id": 3}},
        {"operation": "delete", "table_name": "users", "where": {"id": 4}}
    ]));

    expect(&response).committed().results(2);
    assert_eq!(db.count("users"), 4);
}
