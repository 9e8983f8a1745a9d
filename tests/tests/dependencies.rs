//! Placeholder resolution, expansion and the zero-row policy.

use opbatch_tests::prelude::*;

fn no_match_then_dependent() -> serde_json::Value {
    json!([
        {
            "operation": "update",
            "table_name": "users",
            "set": {"password": "x"},
            "where": {"id": 999},
            "return_affected": ["id"]
        },
        {
            "operation": "insert",
            "table_name": "prompts",
            "depends_on_index": 0,
            "values": {"user_id": "{{previous_result[0].id}}", "title": "never"}
        },
        {
            "operation": "delete",
            "table_name": "prompts",
            "depends_on_index": 1,
            "where": {"id": "{{previous_result[1].id}}"}
        }
    ])
}

mod zero_row_dependency {
    use super::*;

    #[test]
    fn test_skip_policy_skips_the_chain() {
        // GIVEN
        let db = TestDb::new();

        // WHEN
        let response = db.run(no_match_then_dependent());

        // THEN
        expect(&response)
            .committed()
            .results(3)
            .result(0, |r| {
                assert_eq!(r["affected_rows"], 0);
                assert_eq!(r["affected_data"], json!([]));
            })
            .result(1, |r| {
                assert_eq!(r["success"], true);
                assert_eq!(r["affected_rows"], 0);
                assert!(r.get("expansion_index").is_none());
            })
            .result(2, |r| assert_eq!(r["affected_rows"], 0));
        assert_eq!(db.count("prompts"), 3);
    }

    #[test]
    fn test_fail_policy_aborts() {
        // GIVEN
        let db = TestDb::with_options(ExecutionOptions {
            empty_dependency: EmptyDependencyPolicy::Fail,
            ..ExecutionOptions::default()
        });

        // WHEN
        let response = db.run(no_match_then_dependent());

        // THEN
        expect(&response)
            .status(400)
            .error_type("ResolutionError")
            .error_message("Failed to resolve operation dependency.")
            .failed_at(1)
            .detail("dependency_index", json!(0));
        assert_eq!(db.count("prompts"), 3);
    }
}

mod resolution_failures {
    use super::*;

    #[test]
    fn test_field_not_captured() {
        // GIVEN: operation 0 only returns its id
        let db = TestDb::new();
        let batch = json!([
            {
                "operation": "insert",
                "table_name": "users",
                "values": {"username": "mona", "email": "mona@example.com", "password": "pw"},
                "return_affected": ["id"]
            },
            {
                "operation": "insert",
                "table_name": "api_tokens",
                "depends_on_index": 0,
                "values": {"user_id": 1, "token": "{{previous_result[0].email}}"}
            }
        ]);

        // WHEN
        let response = db.run(batch);

        // THEN
        expect(&response)
            .status(400)
            .error_type("ResolutionError")
            .failed_at(1)
            .detail("dependency_index", json!(0))
            .detail("field", json!("email"))
            .results(2);
        assert!(response.body["detail"].get("expansion_index").is_none());
        assert_eq!(db.count("users"), 6);
    }

    #[test]
    fn test_update_without_return_affected_captures_nothing() {
        let db = TestDb::new();
        let response = db.run(json!([
            {
                "operation": "update",
                "table_name": "users",
                "set": {"password": "x"},
                "where": {"id": 1}
            },
            {
                "operation": "delete",
                "table_name": "prompts",
                "depends_on_index": 0,
                "where": {"user_id": "{{previous_result[0].id}}"}
            }
        ]));

        expect(&response)
            .status(400)
            .error_type("ResolutionError")
            .failed_at(1);
        assert_eq!(
            db.query("SELECT password FROM users WHERE id = 1")[0]["password"],
            Value::from("pw1")
        );
    }

    #[test]
    fn test_insert_always_captures_id() {
        let db = TestDb::new();
        let response = db.run(json!([
            {
                "operation": "insert",
                "table_name": "users",
                "values": {"username": "nina", "email": "nina@example.com", "password": "pw"}
            },
            {
                "operation": "insert",
                "table_name": "prompts",
                "depends_on_index": 0,
                "values": {"user_id": "{{previous_result[0].id}}", "title": "t"},
                "return_affected": ["user_id"]
            }
        ]));

        expect(&response).committed().result(0, |r| {
            assert!(r.get("affected_data").is_none());
            assert_eq!(r["last_insert_id"], 7);
        });
        assert_eq!(
            db.query("SELECT user_id FROM prompts WHERE title = 't'")[0]["user_id"],
            Value::Int(7)
        );
    }
}

mod expansion {
    use super::*;

    #[test]
    fn test_one_result_per_matched_row() {
        // GIVEN: every user matches
        let db = TestDb::new();
        let batch = json!([
            {
                "operation": "update",
                "table_name": "users",
                "set": {"updated_at": "NOW()"},
                "where": {"id": {">": 0}},
                "return_affected": ["id", "username"]
            },
            {
                "operation": "insert",
                "table_name": "prompts",
                "depends_on_index": 0,
                "values": {
                    "user_id": "{{previous_result[0].id}}",
                    "title": "{{previous_result[0].username}}"
                },
                "return_affected": ["user_id"]
            }
        ]);

        // WHEN
        let response = db.run(batch);

        // THEN
        let results = expect(&response).committed().results(7).into_results();
        for (i, result) in results[1..].iter().enumerate() {
            assert_eq!(result["operation_index"], 1);
            assert_eq!(result["expansion_index"], i);
            assert_eq!(result["affected_data"][0]["user_id"], i as i64 + 1);
        }
        assert_eq!(db.count("prompts"), 9);
    }

    #[test]
    fn test_expanded_captures_accumulate() {
        // GIVEN: operation 1 expands twice, operation 2 sees both captures
        let db = TestDb::new();
        let batch = json!([
            {
                "operation": "update",
                "table_name": "users",
                "set": {"password": "y"},
                "where": {"id": {"IN": [1, 2]}},
                "return_affected": ["id"]
            },
            {
                "operation": "insert",
                "table_name": "prompts",
                "depends_on_index": 0,
                "values": {"user_id": "{{previous_result[0].id}}", "title": "expanded"},
                "return_affected": ["id"]
            },
            {
                "operation": "update",
                "table_name": "prompts",
                "depends_on_index": 1,
                "set": {"content": "touched"},
                "where": {"id": "{{previous_result[1].id}}"}
            }
        ]);

        // WHEN
        let response = db.run(batch);

        // THEN
        expect(&response).committed().results(5);
        assert_eq!(
            db.scalar("SELECT COUNT(*) FROM prompts WHERE content = 'touched'"),
            2
        );
    }

    #[test]
    fn test_placeholders_inside_lists() {
        let db = TestDb::new();
        let response = db.run(json!([
            {
                "operation": "insert",
                "table_name": "users",
                "values": {"username": "omar", "email": "omar@example.com", "password": "pw"},
                "return_affected": ["id"]
            },
            {
                "operation": "update",
                "table_name": "users",
                "depends_on_index": 0,
                "set": {"password": "batch"},
                "where": {"id": {"IN": [1, "{{previous_result[0].id}}"]}}
            }
        ]));

        expect(&response)
            .committed()
            .result(1, |r| assert_eq!(r["affected_rows"], 2));
        assert_eq!(db.scalar("SELECT COUNT(*) FROM users WHERE password = 'batch'"), 2);
    }
}
