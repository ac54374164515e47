// src/fetcher/http.rs
// reqwest-backed transport for a live SRI Testing service

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{FetchRequest, FetchResponse, Fetcher};
use crate::error::{DashboardError, Result};
use crate::http::create_shared_client;

pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self::from_client(create_shared_client(timeout), base_url)
    }

    /// Create from an existing reqwest::Client
    pub fn from_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, "SRI Testing request");

        let mut builder = self.client.request(request.method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if (200..300).contains(&status) => {
                    return Err(DashboardError::Protocol(format!(
                        "non-JSON body from {}: {}",
                        url, e
                    )));
                }
                Err(_) => Value::String(text),
            }
        };

        debug!(status, url = %url, "SRI Testing response");
        Ok(FetchResponse::new(status, body))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
