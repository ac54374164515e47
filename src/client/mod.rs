// src/client/mod.rs
// Typed client for the SRI Testing run/report protocol

mod poll;

pub use poll::{DEFAULT_POLL_INTERVAL, PollConfig};

use serde::de::DeserializeOwned;
use serde_json::Value;
use sri_types::{
    ApiMessage, COMPLETE_PERCENT, DetailKey, NOT_FOUND_PERCENT, RegistrySummary, ResourceIndex,
    SummaryReport, TestCase, TestRunParameters, TestRunSession, TestRunStatus, TestRunSummary,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, Result};
use crate::fetcher::{FetchRequest, FetchResponse, Fetcher, HttpFetcher};

/// Client session against one SRI Testing service.
///
/// The transport is injected; the registry is fetched at most once per session.
pub struct SriTestingClient {
    fetcher: Arc<dyn Fetcher>,
    registry: OnceCell<RegistrySummary>,
}

impl SriTestingClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            registry: OnceCell::new(),
        }
    }

    /// Client over HTTP against a live service
    pub fn http(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Arc::new(HttpFetcher::new(base_url, timeout)))
    }

    pub fn transport(&self) -> &'static str {
        self.fetcher.name()
    }

    /// `POST /run_tests`: start a run and return its session
    pub async fn run_tests(&self, parameters: &TestRunParameters) -> Result<TestRunSession> {
        let body = serde_json::to_value(parameters)?;
        let response = self.fetcher.fetch(FetchRequest::post("/run_tests", body)).await?;
        let session: TestRunSession = expect_json(response, "run submission")?;

        if session.is_rejected() {
            let errors = session.errors.unwrap_or_default();
            warn!(errors = ?errors, "test run rejected");
            return Err(DashboardError::Rejected(errors));
        }

        info!(run_id = %session.test_run_id, "test run submitted");
        Ok(session)
    }

    /// `GET /status/{run_id}`. An unknown id yields `percent_complete == -1`, not an error.
    pub async fn status(&self, run_id: &str) -> Result<TestRunStatus> {
        let response = self
            .fetcher
            .fetch(FetchRequest::get(format!("/status/{}", encode(run_id))))
            .await?;

        if response.status == 404 {
            debug!(run_id = %run_id, "status: run not found");
            let status = response
                .json::<TestRunStatus>()
                .ok()
                .filter(TestRunStatus::is_not_found)
                .unwrap_or_else(|| TestRunStatus::not_found(run_id));
            return Ok(status);
        }

        let status: TestRunStatus = expect_json(response, "status")?;
        if !(NOT_FOUND_PERCENT..=COMPLETE_PERCENT).contains(&status.percent_complete) {
            return Err(DashboardError::Protocol(format!(
                "percent_complete {} for run '{}' is outside -1..=100",
                status.percent_complete, run_id
            )));
        }
        debug!(run_id = %run_id, percent = status.percent_complete, "status");
        Ok(status)
    }

    /// `GET /summary/{run_id}`. Unknown and unfinished runs both come back as `NotFound`.
    pub async fn summary(&self, run_id: &str) -> Result<SummaryReport> {
        let response = self
            .fetcher
            .fetch(FetchRequest::get(format!("/summary/{}", encode(run_id))))
            .await?;
        expect_json(response, "summary")
    }

    /// `GET /details/{component}/{resource}/{test_id}/{idx}`; the payload is opaque
    pub async fn details(&self, run_id: Option<&str>, key: &DetailKey) -> Result<Value> {
        let path = format!(
            "/details/{}/{}/{}/{}",
            key.component,
            encode(&key.resource),
            encode(&key.test_id),
            key.idx
        );
        let mut request = FetchRequest::get(path);
        if let Some(run_id) = run_id {
            request = request.with_query("test_run_id", run_id);
        }
        let response = self.fetcher.fetch(request).await?;
        expect_json(response, "details")
    }

    /// `GET /list`: run ids known to the service, in service order
    pub async fn list_runs(&self) -> Result<Vec<String>> {
        let response = self.fetcher.fetch(FetchRequest::get("/list")).await?;
        expect_json(response, "run list")
    }

    /// `GET /registry`, memoized for the session. Failures are not cached.
    pub async fn registry(&self) -> Result<&RegistrySummary> {
        self.registry
            .get_or_try_init(|| async {
                let response = self.fetcher.fetch(FetchRequest::get("/registry")).await?;
                let registry: RegistrySummary = expect_json(response, "registry")?;
                if !registry.is_consistent() {
                    warn!(
                        total = registry.total,
                        hits = registry.hits.len(),
                        "registry total does not match its hit count"
                    );
                }
                Ok::<_, DashboardError>(registry)
            })
            .await
    }

    /// `GET /index/{run_id}`: resource names of a completed run
    pub async fn index(&self, run_id: &str) -> Result<ResourceIndex> {
        let response = self
            .fetcher
            .fetch(FetchRequest::get(format!("/index/{}", encode(run_id))))
            .await?;
        let envelope: TestRunSummary<ResourceIndex> = expect_json(response, "index")?;
        Ok(envelope.summary)
    }

    /// `GET /resource/{run_id}`: test cases of one KP, or of one KP tested through an ARA
    pub async fn resource_summary(
        &self,
        run_id: &str,
        ara_id: Option<&str>,
        kp_id: Option<&str>,
    ) -> Result<Vec<TestCase>> {
        let mut request = FetchRequest::get(format!("/resource/{}", encode(run_id)));
        if let Some(ara_id) = ara_id {
            request = request.with_query("ara_id", ara_id);
        }
        if let Some(kp_id) = kp_id {
            request = request.with_query("kp_id", kp_id);
        }
        let response = self.fetcher.fetch(request).await?;
        let envelope: TestRunSummary<Vec<TestCase>> = expect_json(response, "resource summary")?;
        Ok(envelope.summary)
    }

    /// `GET /response`: TRAPI response message of one unit test on one edge, as opaque JSON
    pub async fn response(
        &self,
        run_id: &str,
        edge_num: u32,
        test_id: &str,
        ara_id: Option<&str>,
        kp_id: Option<&str>,
    ) -> Result<Value> {
        let mut request = FetchRequest::get("/response")
            .with_query("test_run_id", run_id)
            .with_query("edge_num", edge_num.to_string())
            .with_query("test_id", test_id);
        if let Some(ara_id) = ara_id {
            request = request.with_query("ara_id", ara_id);
        }
        if let Some(kp_id) = kp_id {
            request = request.with_query("kp_id", kp_id);
        }
        let response = self.fetcher.fetch(request).await?;
        expect_json(response, "TRAPI response")
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Decode a 2xx body, or turn the error status into the matching error
fn expect_json<T: DeserializeOwned>(response: FetchResponse, what: &str) -> Result<T> {
    if response.is_success() {
        return response.json();
    }

    let message = || {
        serde_json::from_value::<ApiMessage>(response.body.clone())
            .map(|m| m.details)
            .unwrap_or_else(|_| format!("{} unavailable", what))
    };

    match response.status {
        404 => Err(DashboardError::NotFound(message())),
        400 | 422 => Err(DashboardError::BadRequest(message())),
        status => Err(DashboardError::Api {
            status,
            body: response.body.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{MockFetcher, MockRoutes};
    use crate::fixtures::{self, MOCK_TEST_RUN_ID};
    use serde_json::json;
    use sri_types::Component;

    fn canned_client() -> (SriTestingClient, Arc<MockFetcher>) {
        let mock = Arc::new(fixtures::sri_testing_mock().unwrap());
        (SriTestingClient::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_submit_returns_mock_run_id() {
        let (client, _) = canned_client();
        let session = client.run_tests(&TestRunParameters::default()).await.unwrap();
        assert_eq!(session.test_run_id, MOCK_TEST_RUN_ID);
        assert_eq!(session.errors, None);
    }

    #[tokio::test]
    async fn test_status_sequence() {
        let (client, _) = canned_client();
        let mut polls = Vec::new();
        for _ in 0..4 {
            polls.push(client.status(MOCK_TEST_RUN_ID).await.unwrap().percent_complete);
        }
        assert_eq!(polls, vec![0, 50, 100, 100]);
    }

    #[tokio::test]
    async fn test_unknown_status_is_minus_one() {
        let (client, _) = canned_client();
        let status = client.status("2022-08-15_18-47-55").await.unwrap();
        assert!(status.is_not_found());
        assert_eq!(status.test_run_id, "2022-08-15_18-47-55");
    }

    #[tokio::test]
    async fn test_unknown_summary_is_not_found() {
        let (client, _) = canned_client();
        let err = client.summary("2022-08-15_18-47-55").await.unwrap_err();
        match err {
            DashboardError::NotFound(details) => {
                assert!(details.contains("not (yet) available"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_details_path_is_encoded() {
        let (client, mock) = canned_client();
        let key = DetailKey::new(Component::Ara, "aragorn|test-kp-1", "by_subject", 0);
        let details = client.details(Some(MOCK_TEST_RUN_ID), &key).await.unwrap();
        assert_eq!(details, json!({}));

        let history = mock.history().await;
        let last = history.last().unwrap();
        assert_eq!(last.path, "/details/ARA/aragorn%7Ctest-kp-1/by_subject/0");
        assert_eq!(last.query[0].1, MOCK_TEST_RUN_ID);
    }

    #[tokio::test]
    async fn test_registry_is_cached() {
        let (client, mock) = canned_client();
        let first = client.registry().await.unwrap().total;
        let second = client.registry().await.unwrap().total;
        assert_eq!(first, 3);
        assert_eq!(second, 3);
        let registry_calls = mock
            .history()
            .await
            .iter()
            .filter(|r| r.path == "/registry")
            .count();
        assert_eq!(registry_calls, 1);
    }

    #[tokio::test]
    async fn test_registry_failure_not_cached() {
        let mock = Arc::new(MockFetcher::new(
            MockRoutes::new()
                .on_get("/registry")
                .reply_once(500, json!("boom"))
                .on_get("/registry")
                .reply(200, serde_json::to_value(fixtures::registry().unwrap()).unwrap()),
        ));
        let client = SriTestingClient::new(mock);
        assert!(matches!(client.registry().await, Err(DashboardError::Api { status: 500, .. })));
        assert_eq!(client.registry().await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_rejected_submission() {
        let mock = Arc::new(MockFetcher::new(MockRoutes::new().on_post("/run_tests").reply(
            200,
            serde_json::to_value(TestRunSession::rejected(vec![
                "'trapi_version' parameter 'x' is not a valid SemVer string!".into(),
            ]))
            .unwrap(),
        )));
        let client = SriTestingClient::new(mock);
        let err = client.run_tests(&TestRunParameters::default()).await.unwrap_err();
        assert!(matches!(err, DashboardError::Rejected(ref e) if e.len() == 1));
    }

    #[tokio::test]
    async fn test_transport_failure_produces_no_run_id() {
        let mock = Arc::new(MockFetcher::new(
            MockRoutes::new().on_post("/run_tests").network_error("unreachable"),
        ));
        let client = SriTestingClient::new(mock);
        let err = client.run_tests(&TestRunParameters::default()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_out_of_range_percent_is_protocol_error() {
        let mock = Arc::new(MockFetcher::new(
            MockRoutes::new()
                .on_get("/status/r")
                .reply(200, json!({"test_run_id": "r", "percent_complete": 250})),
        ));
        let client = SriTestingClient::new(mock);
        assert!(matches!(client.status("r").await, Err(DashboardError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_response_query_and_bad_request() {
        let mock = Arc::new(MockFetcher::new(MockRoutes::new().on_get("/response").reply(
            400,
            json!({"details": "Null 'kp_id' is not supported with a non-null 'ara_id'!"}),
        )));
        let client = SriTestingClient::new(mock.clone());

        let err = client
            .response("r", 3, "by_subject", Some("aragorn"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::BadRequest(ref m) if m.contains("non-null 'ara_id'")));

        let history = mock.history().await;
        let query: Vec<(&str, &str)> = history[0]
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            query,
            vec![("test_run_id", "r"), ("edge_num", "3"), ("test_id", "by_subject"), ("ara_id", "aragorn")]
        );
    }

    #[tokio::test]
    async fn test_status_404_without_usable_body_is_synthesized() {
        let mock = Arc::new(MockFetcher::new(
            MockRoutes::new()
                .on_get("/status/gone")
                .reply(404, json!("gone"))
                .on_get("/status/empty")
                .reply(404, Value::Null)
                .on_get("/status/odd")
                .reply(404, json!({"test_run_id": "odd", "percent_complete": 40})),
        ));
        let client = SriTestingClient::new(mock);

        for run_id in ["gone", "empty", "odd"] {
            let status = client.status(run_id).await.unwrap();
            assert!(status.is_not_found(), "{run_id}");
            assert_eq!(status.test_run_id, run_id);
        }
    }

    #[tokio::test]
    async fn test_list_runs() {
        let (client, _) = canned_client();
        assert_eq!(client.list_runs().await.unwrap(), vec![MOCK_TEST_RUN_ID.to_string()]);
    }
}
