// tests/test_server_api.rs
// Stand-in service routes, driven through the router with oneshot requests


use axum::http::StatusCode;
use serde_json::json;
use sri_dashboard::fixtures::MOCK_TEST_RUN_ID;
use sri_types::{INVALID_PARAMETERS_RUN_ID, SummaryReport, TestRunSummary, TestCase};
use test_helpers::{complete_run, create_canned_app, create_test_app, get, send, start_run};

#[tokio::test]
async fn test_health() {
    let (app, _) = create_test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_progress_is_monotonic() {
    let (app, _) = create_test_app();
    let run_id = start_run(&app).await;

    let mut seen = Vec::new();
    for _ in 0..5 {
        let (status, body) = get(&app, &format!("/status/{}", run_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["test_run_id"], run_id.as_str());
        seen.push(body["percent_complete"].as_i64().unwrap());
    }

    assert!(seen[0] < 100, "first poll must not be complete");
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {seen:?}");
    assert_eq!(seen, vec![0, 50, 100, 100, 100]);
}

#[tokio::test]
async fn test_unknown_run_status_is_404_minus_one() {
    let (app, _) = create_test_app();
    let (status, body) = get(&app, "/status/2022-08-15_18-47-55").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"test_run_id": "2022-08-15_18-47-55", "percent_complete": -1}));
}

#[tokio::test]
async fn test_summary_never_partial() {
    let (app, _) = create_test_app();
    let run_id = start_run(&app).await;

    let (status, body) = get(&app, &format!("/summary/{}", run_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["details"],
        format!("Summary for test run '{}' is not (yet) available?", run_id)
    );

    // 50% is still not enough
    get(&app, &format!("/status/{}", run_id)).await;
    get(&app, &format!("/status/{}", run_id)).await;
    let (status, _) = get(&app, &format!("/summary/{}", run_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    complete_run(&app, &run_id).await;
    let (status, body) = get(&app, &format!("/summary/{}", run_id)).await;
    assert_eq!(status, StatusCode::OK);
    let report: SummaryReport = serde_json::from_value(body).unwrap();
    assert_eq!(report.id.as_deref(), Some(run_id.as_str()));
    assert_eq!(report.summary.unwrap().total(), 88);
}

#[tokio::test]
async fn test_invalid_parameters_do_not_start_a_run() {
    let (app, state) = create_test_app();
    let body = r#"{"trapi_version": "one.two", "biolink_version": "2.4.8", "log": "LOUD"}"#;
    let (status, session) = send(&app, "POST", "/run_tests", Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["test_run_id"], INVALID_PARAMETERS_RUN_ID);
    assert_eq!(session["errors"].as_array().unwrap().len(), 2);
    assert!(state.runs.read().await.is_empty());
}

#[tokio::test]
async fn test_empty_and_null_bodies_use_defaults() {
    let (app, state) = create_test_app();
    let (status, _) = send(&app, "POST", "/run_tests", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/run_tests", Some("null")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.runs.read().await.len(), 2);
}

#[tokio::test]
async fn test_malformed_body_is_422() {
    let (app, _) = create_test_app();
    let (status, body) = send(&app, "POST", "/run_tests", Some("{\"timeout\": \"soon\"}")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"].as_str().unwrap().contains("invalid test run parameters"));
}

#[tokio::test]
async fn test_list_in_submission_order() {
    let (app, state) = create_test_app();
    state
        .runs
        .write()
        .await
        .preassign(["run-b".to_string(), "run-a".to_string()]);
    start_run(&app).await;
    start_run(&app).await;
    let (_, body) = get(&app, "/list").await;
    assert_eq!(body, json!(["run-b", "run-a"]));
}

#[tokio::test]
async fn test_registry_total_matches_hits() {
    let (app, _) = create_test_app();
    let (status, body) = get(&app, "/registry").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"].as_u64().unwrap() as usize, body["hits"].as_array().unwrap().len());
}

#[tokio::test]
async fn test_index_and_resource_rules() {
    let (app, _) = create_test_app();
    let run_id = start_run(&app).await;

    let (status, _) = get(&app, &format!("/index/{}", run_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    complete_run(&app, &run_id).await;

    let (status, body) = get(&app, &format!("/index/{}", run_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["KP"], json!(["test-kp-1", "test-kp-2"]));

    let (status, body) = get(&app, &format!("/resource/{}?kp_id=test-kp-1", run_id)).await;
    assert_eq!(status, StatusCode::OK);
    let resource: TestRunSummary<Vec<TestCase>> = serde_json::from_value(body).unwrap();
    assert_eq!(resource.summary.len(), 6);

    let (status, body) = get(&app, &format!("/resource/{}?ara_id=aragorn&kp_id=test-kp-2", run_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"].as_array().unwrap().len(), 2);

    let (status, body) = get(&app, &format!("/resource/{}?ara_id=aragorn", run_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Null kp_id parameter is not yet supported?");

    let (status, _) = get(&app, &format!("/resource/{}", run_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, &format!("/resource/{}?kp_id=nobody", run_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_details_lookup() {
    let (app, _) = create_test_app();

    // nothing finished yet
    let (status, body) = get(&app, "/details/KP/test-kp-1/by_subject/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let run_id = start_run(&app).await;
    complete_run(&app, &run_id).await;

    let (status, body) = get(&app, "/details/ARA/aragorn%7Ctest-kp-1/by_subject/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resource"], "aragorn|test-kp-1");
    assert_eq!(body["test_run_id"], run_id.as_str());
    assert!(body["outcome"].is_object());

    let (status, body) = get(&app, "/details/KP/test-kp-1/no_such_test/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = get(&app, "/details/KP/test-kp-1/by_subject/0?test_run_id=nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_canned_mode_scenario() {
    let app = create_canned_app();
    let run_id = start_run(&app).await;
    assert_eq!(run_id, MOCK_TEST_RUN_ID);

    let mut seen = Vec::new();
    for _ in 0..3 {
        let (_, body) = get(&app, &format!("/status/{}", run_id)).await;
        seen.push(body["percent_complete"].as_i64().unwrap());
    }
    assert_eq!(seen, vec![0, 50, 100]);

    let (_, body) = get(&app, &format!("/summary/{}", run_id)).await;
    assert_eq!(body["SUMMARY"], json!({"FAILED": "6", "PASSED": "19", "SKIPPED": "63"}));
}

#[tokio::test]
async fn test_canned_resubmission_starts_below_complete() {
    let app = create_canned_app();
    let run_id = start_run(&app).await;
    complete_run(&app, &run_id).await;

    assert_eq!(start_run(&app).await, run_id);
    let (_, body) = get(&app, &format!("/status/{}", run_id)).await;
    assert_eq!(body["percent_complete"], 0);

    let (status, _) = get(&app, &format!("/summary/{}", run_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&app, "/list").await;
    assert_eq!(body, json!([MOCK_TEST_RUN_ID]));
}

#[tokio::test]
async fn test_trapi_response_lookup() {
    let (app, _) = create_test_app();
    let (_, session) = send(
        &app,
        "POST",
        "/run_tests",
        Some(r#"{"trapi_version": "1.3.0", "biolink_version": "3.1.2"}"#),
    )
    .await;
    let run_id = session["test_run_id"].as_str().unwrap().to_string();

    let uri = format!("/response?test_run_id={}&edge_num=0&test_id=by_subject&kp_id=test-kp-1", run_id);
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["details"].as_str().unwrap().ends_with("is not (yet) available?"));

    complete_run(&app, &run_id).await;

    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schema_version"], "1.3.0");
    assert_eq!(body["biolink_version"], "3.1.2");
    assert_eq!(
        body["message"]["query_graph"]["nodes"]["a"]["ids"],
        json!(["PANTHER.FAMILY:PTHR34921"])
    );

    let uri = format!(
        "/response?test_run_id={}&edge_num=0&test_id=by_object&ara_id=aragorn&kp_id=test-kp-2",
        run_id
    );
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logs"], json!([{"level": "FAILED", "message": "Edge:"}]));
}

#[tokio::test]
async fn test_trapi_response_parameter_rules() {
    let (app, _) = create_test_app();
    let run_id = start_run(&app).await;
    complete_run(&app, &run_id).await;

    let base = format!("/response?test_run_id={}&edge_num=0&test_id=by_subject", run_id);

    let (status, body) = get(&app, &format!("{}&ara_id=aragorn", base)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Null 'kp_id' is not supported with a non-null 'ara_id'!");

    let (status, body) = get(&app, &base).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "At least a 'kp_id' must be specified!");

    let missing_edge = format!("/response?test_run_id={}&edge_num=99&test_id=by_subject&kp_id=test-kp-1", run_id);
    let (status, body) = get(&app, &missing_edge).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["details"],
        format!(
            "TRAPI Response JSON text file for unit test by_subject for edge 99 for ara_id 'None' and kp_id 'test-kp-1', from test run '{}', is not (yet) available?",
            run_id
        )
    );
}
