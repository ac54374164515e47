// src/fixtures/mod.rs
// Canned SRI Testing documents and the canned mock route table

use serde_json::{Value, json};
use sri_types::{
    COMPLETE_PERCENT, LegacyResourceSummary, NOT_FOUND_PERCENT, RegistrySummary, SummaryReport,
    TestRunSession,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::error::Result;
use crate::fetcher::{FetchResponse, MockFetcher, MockRoutes};

/// Run id issued by the canned mock. Deliberately an impossible timestamp.
pub const MOCK_TEST_RUN_ID: &str = "2023-13-32_24-61-61";

/// Percent added per status poll of the canned run
const MOCK_PROGRESS_STEP: i32 = 50;

const SUMMARY_REPORT_JSON: &str = include_str!("../../fixtures/summary_report.json");
const REGISTRY_JSON: &str = include_str!("../../fixtures/registry.json");
const LEGACY_RESOURCE_SUMMARY_JSON: &str =
    include_str!("../../fixtures/legacy_resource_summary.json");

pub fn summary_report() -> Result<SummaryReport> {
    Ok(serde_json::from_str(SUMMARY_REPORT_JSON)?)
}

pub fn registry() -> Result<RegistrySummary> {
    Ok(serde_json::from_str(REGISTRY_JSON)?)
}

pub fn legacy_resource_summary() -> Result<LegacyResourceSummary> {
    Ok(serde_json::from_str(LEGACY_RESOURCE_SUMMARY_JSON)?)
}

fn raw(json: &str) -> Result<Value> {
    Ok(serde_json::from_str(json)?)
}

/// Progress of the single run the canned mock knows about
#[derive(Debug, Default)]
struct CannedRun {
    percent: AtomicI32,
    completion_reported: AtomicBool,
}

impl CannedRun {
    fn restart(&self) {
        self.percent.store(0, Ordering::SeqCst);
        self.completion_reported.store(false, Ordering::SeqCst);
    }

    /// Current percentage, advancing it for the next poll
    fn poll(&self) -> i32 {
        let advanced = self.percent.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| {
            (p < COMPLETE_PERCENT).then(|| (p + MOCK_PROGRESS_STEP).min(COMPLETE_PERCENT))
        });
        match advanced {
            Ok(previous) => previous,
            Err(current) => {
                self.completion_reported.store(true, Ordering::SeqCst);
                current
            }
        }
    }

    fn is_reported_complete(&self) -> bool {
        self.completion_reported.load(Ordering::SeqCst)
    }
}

fn summary_not_available(run_id: &str) -> FetchResponse {
    FetchResponse::new(
        404,
        json!({ "details": format!("Summary for test run '{}' is not (yet) available?", run_id) }),
    )
}

/// Route table answering like the dashboard's development mock.
///
/// Status polls for [`MOCK_TEST_RUN_ID`] report 0, then 50, then 100 forever;
/// a new submission starts the sequence over. The summary is served only once
/// a poll has answered 100. Unknown run ids get the 404 not-found shapes.
pub fn sri_testing_routes() -> Result<MockRoutes> {
    let session = serde_json::to_value(TestRunSession::started(MOCK_TEST_RUN_ID))?;
    let report = raw(SUMMARY_REPORT_JSON)?;
    let run = Arc::new(CannedRun::default());

    let routes = MockRoutes::new()
        .on_post("/run_tests")
        .reply_with({
            let run = run.clone();
            move |_| {
                run.restart();
                FetchResponse::ok(session.clone())
            }
        })
        .on_get(format!("/status/{}", MOCK_TEST_RUN_ID))
        .reply_with({
            let run = run.clone();
            move |_| {
                let percent = run.poll();
                FetchResponse::ok(json!({ "test_run_id": MOCK_TEST_RUN_ID, "percent_complete": percent }))
            }
        })
        .on_get_matching(r"^/status/[^/]+$")?
        .reply_with(|req| {
            FetchResponse::new(
                404,
                json!({ "test_run_id": req.last_segment(), "percent_complete": NOT_FOUND_PERCENT }),
            )
        })
        .on_get(format!("/summary/{}", MOCK_TEST_RUN_ID))
        .reply_with(move |_| {
            if run.is_reported_complete() {
                FetchResponse::ok(report.clone())
            } else {
                summary_not_available(MOCK_TEST_RUN_ID)
            }
        })
        .on_get_matching(r"^/summary/[^/]+$")?
        .reply_with(|req| summary_not_available(&req.last_segment()))
        .on_get_matching(r"^/details/[^/]+/[^/]+/[^/]+/[^/]+$")?
        .reply(200, json!({}))
        .on_get("/list")
        .reply(200, json!([MOCK_TEST_RUN_ID]))
        .on_get("/registry")
        .reply(200, raw(REGISTRY_JSON)?);

    Ok(routes)
}

/// Ready-to-use mock transport over [`sri_testing_routes`]
pub fn sri_testing_mock() -> Result<MockFetcher> {
    Ok(MockFetcher::new(sri_testing_routes()?))
}
