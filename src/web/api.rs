// src/web/api.rs
// REST handlers of the stand-in SRI Testing service

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use sri_types::{
    Component, Outcome, RegistrySummary, ResourceIndex, SummaryReport, TestCase, TestRunParameters,
    TestRunSession, TestRunStatus, TestRunSummary,
};
use tracing::{debug, info, warn};

use super::error::{ApiError, ApiResult, IntoApiErrorOption};
use super::state::AppState;
use super::validate::validate_parameters;
use crate::report;

// ═══════════════════════════════════════
// HEALTH
// ═══════════════════════════════════════

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ═══════════════════════════════════════
// RUN LIFECYCLE
// ═══════════════════════════════════════

/// `POST /run_tests`. An empty body or `null` means default parameters.
pub async fn run_tests(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<TestRunSession>> {
    let parameters: TestRunParameters = if body.iter().all(u8::is_ascii_whitespace) {
        TestRunParameters::default()
    } else {
        serde_json::from_slice::<Option<TestRunParameters>>(&body)
            .map_err(|e| ApiError::unprocessable_entity(format!("invalid test run parameters: {}", e)))?
            .unwrap_or_default()
    };

    let errors = validate_parameters(&parameters);
    if !errors.is_empty() {
        warn!(errors = ?errors, "rejecting test run parameters");
        return Ok(Json(TestRunSession::rejected(errors)));
    }

    let run_id = state.runs.write().await.start(parameters, &state.template);
    info!(run_id = %run_id, "test run started");
    Ok(Json(TestRunSession::started(run_id)))
}

/// `GET /status/{run_id}`: unknown ids answer 404 with `percent_complete: -1`
pub async fn status(State(state): State<AppState>, Path(run_id): Path<String>) -> Response {
    let percent = state.runs.write().await.poll(&run_id);
    match percent {
        Some(percent) => {
            debug!(run_id = %run_id, percent, "status poll");
            Json(TestRunStatus::new(run_id, percent)).into_response()
        }
        None => {
            debug!(run_id = %run_id, "status poll for unknown run");
            (StatusCode::NOT_FOUND, Json(TestRunStatus::not_found(run_id))).into_response()
        }
    }
}

/// `GET /list`: run ids in submission order
pub async fn list(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.runs.read().await.ids())
}

// ═══════════════════════════════════════
// REPORTS
// ═══════════════════════════════════════

async fn completed_report(
    state: &AppState,
    run_id: &str,
    what: &str,
) -> ApiResult<Arc<SummaryReport>> {
    state
        .runs
        .read()
        .await
        .report(run_id)
        .ok_or_not_found(format!("{} for test run '{}' is not (yet) available?", what, run_id))
}

/// `GET /summary/{run_id}`; unknown and unfinished runs look the same
pub async fn summary(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<SummaryReport>> {
    let report = completed_report(&state, &run_id, "Summary").await?;
    Ok(Json(report.as_ref().clone()))
}

/// `GET /index/{run_id}`
pub async fn index(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<TestRunSummary<ResourceIndex>>> {
    let report = completed_report(&state, &run_id, "Index").await?;
    Ok(Json(TestRunSummary {
        test_run_id: run_id,
        summary: report::index(&report),
    }))
}

/// Report key of the resource named by `ara_id`/`kp_id`: a KP alone, or a KP
/// tested through an ARA. An ARA without a KP, or neither, is a bad request.
fn resource_key(
    ara_id: Option<&str>,
    kp_id: Option<&str>,
    ara_without_kp: &str,
    neither: &str,
) -> ApiResult<(Component, String)> {
    match (ara_id, kp_id) {
        (Some(ara), Some(kp)) => Ok((Component::Ara, report::ara_resource_key(ara, kp))),
        (Some(_), None) => Err(ApiError::bad_request(ara_without_kp)),
        (None, Some(kp)) => Ok((Component::Kp, kp.to_string())),
        (None, None) => Err(ApiError::bad_request(neither)),
    }
}

#[derive(Debug, Deserialize)]
pub struct ResourceQuery {
    pub kp_id: Option<String>,
    pub ara_id: Option<String>,
}

/// `GET /resource/{run_id}?kp_id=&ara_id=`
pub async fn resource(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(query): Query<ResourceQuery>,
) -> ApiResult<Json<TestRunSummary<Vec<TestCase>>>> {
    let kp_id = query.kp_id.filter(|k| !k.is_empty());
    let ara_id = query.ara_id.filter(|a| !a.is_empty());
    let (component, key) = resource_key(
        ara_id.as_deref(),
        kp_id.as_deref(),
        "Null kp_id parameter is not yet supported?",
        "The 'ara_id' and 'kp_id' cannot both be empty parameters!",
    )?;

    let cases = state
        .runs
        .read()
        .await
        .report(&run_id)
        .and_then(|report| report.resource(component, &key).map(<[TestCase]>::to_vec))
        .ok_or_not_found(format!(
            "Resource summary, for ara_id '{}' and kp_id '{}', is not (yet) available from test run '{}'?",
            ara_id.as_deref().unwrap_or("None"),
            kp_id.as_deref().unwrap_or("None"),
            run_id
        ))?;

    Ok(Json(TestRunSummary {
        test_run_id: run_id,
        summary: cases,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    pub test_run_id: Option<String>,
}

/// `GET /details/{component}/{resource}/{test_id}/{idx}`.
///
/// Without `test_run_id` the latest finished run is used. Answers `{}` when
/// the key matches nothing.
pub async fn details(
    State(state): State<AppState>,
    Path((component, resource, test_id, idx)): Path<(String, String, String, String)>,
    Query(query): Query<DetailsQuery>,
) -> ApiResult<Json<Value>> {
    let report = {
        let runs = state.runs.read().await;
        match query.test_run_id.as_deref().filter(|id| !id.is_empty()) {
            Some(run_id) => Some(
                runs.report(run_id)
                    .ok_or_not_found(format!("Details for test run '{}' are not (yet) available?", run_id))?,
            ),
            None => runs.latest_report(),
        }
    };

    let Some(report) = report else {
        return Ok(Json(json!({})));
    };

    let found = Component::parse(&component)
        .zip(idx.parse::<u32>().ok())
        .and_then(|(component, idx)| {
            let case = report
                .resource(component, &resource)?
                .iter()
                .find(|case| case.idx == idx)?;
            let outcome = case.tests.get(&test_id)?;
            Some(json!({
                "test_run_id": report.id,
                "component": component,
                "resource": resource,
                "test_id": test_id,
                "idx": idx,
                "edge": case.triple_label(),
                "subject_category": case.subject_category,
                "object_category": case.object_category,
                "predicate": case.predicate,
                "subject": case.subject,
                "object": case.object,
                "outcome": outcome,
            }))
        });

    Ok(Json(found.unwrap_or_else(|| json!({}))))
}

#[derive(Debug, Deserialize)]
pub struct ResponseQuery {
    pub test_run_id: String,
    pub edge_num: String,
    pub test_id: String,
    pub ara_id: Option<String>,
    pub kp_id: Option<String>,
}

/// `GET /response?test_run_id=&edge_num=&test_id=&kp_id=&ara_id=`: the TRAPI
/// response message behind one unit test of one edge
pub async fn response(
    State(state): State<AppState>,
    Query(query): Query<ResponseQuery>,
) -> ApiResult<Json<Value>> {
    let kp_id = query.kp_id.filter(|k| !k.is_empty());
    let ara_id = query.ara_id.filter(|a| !a.is_empty());
    let (component, key) = resource_key(
        ara_id.as_deref(),
        kp_id.as_deref(),
        "Null 'kp_id' is not supported with a non-null 'ara_id'!",
        "At least a 'kp_id' must be specified!",
    )?;

    let runs = state.runs.read().await;
    let message = runs
        .completed(&query.test_run_id)
        .zip(query.edge_num.parse::<u32>().ok())
        .and_then(|(run, edge_num)| {
            let case = run
                .report
                .resource(component, &key)?
                .iter()
                .find(|case| case.idx == edge_num)?;
            let outcome = case.tests.get(&query.test_id)?;
            Some(trapi_response(&run.parameters, case, outcome))
        })
        .ok_or_not_found(format!(
            "TRAPI Response JSON text file for unit test {} for edge {} for ara_id '{}' and kp_id '{}', from test run '{}', is not (yet) available?",
            query.test_id,
            query.edge_num,
            ara_id.as_deref().unwrap_or("None"),
            kp_id.as_deref().unwrap_or("None"),
            query.test_run_id
        ))?;

    debug!(run_id = %query.test_run_id, resource = %key, edge = %query.edge_num, "serving TRAPI response");
    Ok(Json(message))
}

/// One-hop TRAPI message for the test case's triple. The stand-in has no real
/// knowledge graph, so the graph is empty and the outcome rides along in `logs`.
fn trapi_response(parameters: &TestRunParameters, case: &TestCase, outcome: &Outcome) -> Value {
    let logs: Vec<Value> = outcome
        .messages()
        .map(|message| json!({ "level": outcome.status, "message": message }))
        .collect();

    json!({
        "schema_version": parameters.trapi_version,
        "biolink_version": parameters.biolink_version,
        "message": {
            "query_graph": {
                "nodes": {
                    "a": { "ids": [case.subject], "categories": [case.subject_category] },
                    "b": { "ids": [case.object], "categories": [case.object_category] }
                },
                "edges": {
                    "ab": { "subject": "a", "object": "b", "predicates": [case.predicate] }
                }
            },
            "knowledge_graph": { "nodes": {}, "edges": {} },
            "results": []
        },
        "logs": logs
    })
}

// ═══════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════

pub async fn registry(State(state): State<AppState>) -> Json<RegistrySummary> {
    Json(state.registry.as_ref().clone())
}
