//! Request handling: status codes and response shapes.

use opbatch_tests::prelude::*;

#[test]
fn test_empty_batch_opens_no_connection() {
    // GIVEN
    let db = TestDb::new();
    let opened = db.database().connections_opened();

    // WHEN
    let response = db.run_raw("[]");

    // THEN
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, json!({"message": "No operations to perform."}));
    assert_eq!(db.database().connections_opened(), opened);
}

#[test]
fn test_invalid_json() {
    let db = TestDb::new();
    let response = db.run_raw("[{\"operation\": ");

    expect(&response).status(400);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON format"));
    assert!(response.body.get("results").is_none());
}

#[test]
fn test_body_must_be_an_array() {
    // GIVEN
    let db = TestDb::new();
    let opened = db.database().connections_opened();

    // WHEN
    let response = db.run(json!({"operation": "insert"}));

    // THEN
    expect(&response)
        .status(400)
        .error_type("ValidationError")
        .error_message("Invalid batch request.")
        .detail("failed_operation_index", json!(null))
        .results(0);
    assert_eq!(db.database().connections_opened(), opened);
}

#[test]
fn test_validation_rejects_before_any_write() {
    // GIVEN: a valid first operation and a forward reference
    let db = TestDb::new();
    let opened = db.database().connections_opened();
    let batch = json!([
        {"operation": "delete", "table_name": "api_tokens", "where": {"id": 1}},
        {
            "operation": "insert",
            "table_name": "prompts",
            "depends_on_index": 2,
            "values": {"user_id": 1, "title": "x"}
        },
        {"operation": "delete", "table_name": "prompts", "where": {"id": 1}}
    ]);

    // WHEN
    let response = db.run(batch);

    // THEN
    expect(&response)
        .status(400)
        .error_type("ValidationError")
        .failed_at(1)
        .detail("table_name", json!("prompts"))
        .results(0);
    assert_eq!(db.database().connections_opened(), opened);
    assert_eq!(db.count("api_tokens"), 1);
}

#[test]
fn test_operation_shape_errors() {
    let db = TestDb::new();
    let cases = [
        json!([{"operation": "upsert", "table_name": "users", "values": {}}]),
        json!([{"operation": "insert", "table_name": "users; DROP TABLE users", "values": {}}]),
        json!([{"operation": "update", "table_name": "users", "set": {"password": "x"}}]),
        json!([{"operation": "delete", "table_name": "users", "where": {}}]),
        json!([{"operation": "insert", "table_name": "users", "values": {"a b": 1}}]),
        json!([{
            "operation": "insert",
            "table_name": "prompts",
            "values": {"user_id": "{{previous_result[0].id}}", "title": "x"}
        }]),
        json!(["insert"]),
    ];

    for batch in cases {
        let response = db.run(batch.clone());
        assert_eq!(response.status, StatusCode::BadRequest, "batch: {}", batch);
        assert_eq!(response.body["detail"]["type"], "ValidationError", "batch: {}", batch);
        assert_eq!(response.body["detail"]["failed_operation_index"], 0, "batch: {}", batch);
    }
    assert_eq!(db.count("users"), 6);
}

#[test]
fn test_placeholder_must_match_dependency() {
    let db = TestDb::new();
    let response = db.run(json!([
        {"operation": "delete", "table_name": "api_tokens", "where": {"id": 1}, "return_affected": ["id"]},
        {"operation": "delete", "table_name": "prompts", "where": {"id": 1}, "return_affected": ["id"]},
        {
            "operation": "delete",
            "table_name": "prompts",
            "depends_on_index": 1,
            "where": {"id": "{{previous_result[0].id}}"}
        }
    ]));

    expect(&response).status(400).error_type("ValidationError").failed_at(2);
    assert_eq!(db.count("api_tokens"), 1);
}

#[test]
fn test_unknown_table_and_column() {
    // GIVEN
    let db = TestDb::new();

    // WHEN
    let unknown_table = db.run(json!([
        {"operation": "delete", "table_name": "ghosts", "where": {"id": 1}}
    ]));
    let unknown_column = db.run(json!([
        {"operation": "delete", "table_name": "api_tokens", "where": {"id": 1}},
        {"operation": "update", "table_name": "users", "set": {"nickname": "x"}, "where": {"id": 1}}
    ]));

    // THEN
    expect(&unknown_table)
        .status(400)
        .error_type("ValidationError")
        .failed_at(0)
        .detail("table_name", json!("ghosts"));
    expect(&unknown_column)
        .status(400)
        .error_type("ValidationError")
        .failed_at(1);
    assert_eq!(db.count("api_tokens"), 1);
}

#[test]
fn test_batch_size_limit() {
    let db = TestDb::with_options(ExecutionOptions {
        max_operations: 2,
        ..ExecutionOptions::default()
    });
    let op = json!({"operation": "delete", "table_name": "prompts", "where": {"id": 1}});

    let response = db.run(json!([op.clone(), op.clone(), op]));

    expect(&response)
        .status(400)
        .error_type("ValidationError")
        .detail("failed_operation_index", json!(null));
    assert_eq!(db.count("prompts"), 3);
}

#[test]
fn test_success_result_shape() {
    let db = TestDb::new();
    let response = db.run(json!([
        {"operation": "delete", "table_name": "prompts", "where": {"id": 1}}
    ]));

    assert_eq!(
        response.body,
        json!({
            "message": "Batch operations executed successfully.",
            "results": [{
                "success": true,
                "operation_index": 0,
                "operation_type": "delete",
                "table_name": "prompts",
                "affected_rows": 1
            }]
        })
    );
}
