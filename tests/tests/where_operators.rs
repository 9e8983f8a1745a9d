//! Each where operator matches the rows standard SQL would.

use opbatch_tests::prelude::*;

/// Ids of the users an update with `filter` touches.
fn matched_ids(db: &TestDb, filter: serde_json::Value) -> Vec<i64> {
    let response = db.run(json!([
        {
            "operation": "update",
            "table_name": "users",
            "set": {"password": "rotated"},
            "where": filter,
            "return_affected": ["id"]
        }
    ]));
    let results = expect(&response).committed().into_results();
    results[0]["affected_data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect()
}

#[test]
fn test_equality_and_null() {
    let db = TestDb::new();
    assert_eq!(matched_ids(&db, json!({"username": "carol"})), vec![3]);
    assert_eq!(matched_ids(&db, json!({"updated_at": null})), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_greater_and_less_than() {
    let db = TestDb::new();
    assert_eq!(matched_ids(&db, json!({"id": {">": 4}})), vec![5, 6]);
    assert_eq!(matched_ids(&db, json!({"id": {"<": 3}})), vec![1, 2]);
    assert_eq!(matched_ids(&db, json!({"id": {">=": 2, "<=": 3}})), vec![2, 3]);
}

#[test]
fn test_like_and_not_like() {
    let db = TestDb::new();
    assert_eq!(
        matched_ids(&db, json!({"email": {"LIKE": "%@example.com"}})),
        vec![1, 2, 3, 4, 5]
    );
    assert_eq!(
        matched_ids(&db, json!({"email": {"NOT LIKE": "%@example.com"}})),
        vec![6]
    );
}

#[test]
fn test_in_and_not_in() {
    let db = TestDb::new();
    assert_eq!(matched_ids(&db, json!({"id": {"IN": [2, 4]}})), vec![2, 4]);
    assert_eq!(
        matched_ids(&db, json!({"id": {"NOT IN": [1, 2, 3]}})),
        vec![4, 5, 6]
    );
}

#[test]
fn test_empty_in_matches_nothing() {
    let db = TestDb::new();
    assert!(matched_ids(&db, json!({"id": {"IN": []}})).is_empty());
    assert!(matched_ids(&db, json!({"id": {"NOT IN": []}})).is_empty());
}

#[test]
fn test_between_is_inclusive() {
    let db = TestDb::new();
    assert_eq!(
        matched_ids(&db, json!({"id": {"BETWEEN": [2, 4]}})),
        vec![2, 3, 4]
    );
}

#[test]
fn test_predicates_are_anded() {
    let db = TestDb::new();
    assert_eq!(
        matched_ids(
            &db,
            json!({"id": {"IN": [1, 5, 6]}, "email": {"LIKE": "%@example.com"}})
        ),
        vec![1, 5]
    );
}

#[test]
fn test_operator_keys_are_case_insensitive() {
    let db = TestDb::new();
    assert_eq!(matched_ids(&db, json!({"id": {"between": [5, 6]}})), vec![5, 6]);
    assert_eq!(matched_ids(&db, json!({"email": {"not like": "%example%"}})), vec![6]);
}

#[test]
fn test_unknown_operator_is_clause_error() {
    // GIVEN
    let db = TestDb::new();
    let batch = json!([
        {"operation": "delete", "table_name": "api_tokens", "where": {"id": 1}},
        {"operation": "delete", "table_name": "users", "where": {"id": {"REGEXP": "^1"}}}
    ]);

    // WHEN
    let response = db.run(batch);

    // THEN
    expect(&response)
        .status(400)
        .error_type("ClauseError")
        .error_message("Invalid where clause.")
        .failed_at(1)
        .detail("column", json!("id"))
        .detail("operator", json!("REGEXP"));
    assert_eq!(db.count("api_tokens"), 1);
}

#[test]
fn test_where_values_are_bound_not_interpolated() {
    let db = TestDb::new();
    assert!(matched_ids(&db, json!({"username": "x' OR '1'='1"})).is_empty());
    assert_eq!(db.count("users"), 6);
}

#[test]
fn test_date_filters_accept_any_written_format() {
    let db = TestDb::new();
    assert_eq!(matched_ids(&db, json!({"created_at": "2025-01-02T09:00:00"})), vec![2]);
    assert_eq!(
        matched_ids(
            &db,
            json!({"created_at": {"BETWEEN": ["2025/01/02", "2025-01-03T23:00:00"]}})
        ),
        vec![2, 3]
    );
    assert_eq!(
        matched_ids(&db, json!({"created_at": {"IN": ["Sat, 04 Jan 2025 09:00:00 GMT"]}})),
        vec![4]
    );
}

#[test]
fn test_numeric_filter_text_matches_integer_column() {
    let db = TestDb::new();
    assert_eq!(matched_ids(&db, json!({"id": "3"})), vec![3]);
    assert_eq!(matched_ids(&db, json!({"id": {">": "4"}})), vec![5, 6]);
}

#[test]
fn test_malformed_date_filter_is_rejected() {
    // GIVEN
    let db = TestDb::new();
    let batch = json!([
        {"operation": "delete", "table_name": "users", "where": {"created_at": {"<": "soon"}}}
    ]);

    // WHEN
    let response = db.run(batch);

    // THEN
    expect(&response).status(400).failed_at(0);
    assert_eq!(db.count("users"), 6);
}
