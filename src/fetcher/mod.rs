// src/fetcher/mod.rs
// Transport abstraction: production and test implementations are picked by composition

pub mod http;
pub mod mock;

pub use http::HttpFetcher;
pub use mock::{MockFetcher, MockRoutes};

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::error::Category;

use crate::error::{DashboardError, Result};

/// A request against the SRI Testing API, relative to the service root
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    /// Absolute path, already percent-encoded (e.g. `/status/2023-13-32_24-61-61`)
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl FetchRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Last path segment, percent-decoded
    pub fn last_segment(&self) -> String {
        let raw = self.path.rsplit('/').next().unwrap_or_default();
        urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string())
    }
}

/// Status code plus decoded JSON body. Non-JSON bodies arrive as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Value,
}

impl FetchResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body into a typed value. A body of the wrong shape
    /// (e.g. an outcome record with two status keys) is a protocol violation.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| match e.classify() {
            Category::Data => DashboardError::Protocol(e.to_string()),
            _ => DashboardError::Json(e),
        })
    }
}

/// Capability to perform one HTTP exchange.
///
/// A 4xx/5xx answer is a successful fetch; only transport failures are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse>;

    /// Short label for logs
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let req = FetchRequest::get("/details/KP/a%7Cb/by_subject/0").with_query("test_run_id", "r1");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query, vec![("test_run_id".to_string(), "r1".to_string())]);
        assert_eq!(req.last_segment(), "0");

        let post = FetchRequest::post("/run_tests", serde_json::json!({}));
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.body, Some(serde_json::json!({})));
    }

    #[test]
    fn test_last_segment_is_decoded() {
        let req = FetchRequest::get("/summary/aragorn%7Ctest-kp-1");
        assert_eq!(req.last_segment(), "aragorn|test-kp-1");
    }

    #[test]
    fn test_ambiguous_outcome_is_protocol_error() {
        let response = FetchResponse::ok(serde_json::json!({"PASSED": [""], "FAILED": ["x"]}));
        let err = response.json::<sri_types::Outcome>().unwrap_err();
        assert!(matches!(err, DashboardError::Protocol(_)), "got {err:?}");
    }

    #[test]
    fn test_response_success_range() {
        assert!(FetchResponse::ok(Value::Null).is_success());
        assert!(!FetchResponse::new(404, Value::Null).is_success());
        assert!(!FetchResponse::new(500, Value::Null).is_success());
    }
}
