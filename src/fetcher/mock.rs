// src/fetcher/mock.rs
// Scripted in-process transport: canned replies matched by method and path

use async_trait::async_trait;
use regex::Regex;
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{FetchRequest, FetchResponse, Fetcher};
use crate::error::{DashboardError, Result};

type Responder = Arc<dyn Fn(&FetchRequest) -> FetchResponse + Send + Sync>;

/// How a route decides whether it applies to a path
#[derive(Clone)]
pub enum PathMatcher {
    Exact(String),
    Pattern(Regex),
}

impl PathMatcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => p == path,
            Self::Pattern(re) => re.is_match(path),
        }
    }
}

impl std::fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "{}", p),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

#[derive(Clone)]
enum Reply {
    Fixed(FetchResponse),
    With(Responder),
    NetworkError(String),
}

#[derive(Clone)]
struct Route {
    method: Method,
    matcher: PathMatcher,
    body: Option<Value>,
    reply: Reply,
    once: bool,
}

impl Route {
    fn matches(&self, request: &FetchRequest) -> bool {
        if self.method != request.method || !self.matcher.matches(&request.path) {
            return false;
        }
        match &self.body {
            Some(expected) => request.body.as_ref().unwrap_or(&Value::Null) == expected,
            None => true,
        }
    }
}

/// Ordered route table. The first matching route answers; `*_once` routes retire after one use.
#[derive(Clone, Default)]
pub struct MockRoutes {
    routes: Vec<Route>,
}

impl MockRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(self, path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(self, Method::GET, PathMatcher::Exact(path.into()))
    }

    pub fn on_post(self, path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(self, Method::POST, PathMatcher::Exact(path.into()))
    }

    /// Match GET paths against a regular expression
    pub fn on_get_matching(self, pattern: &str) -> Result<RouteBuilder> {
        let re = Regex::new(pattern)
            .map_err(|e| DashboardError::Config(format!("invalid mock route pattern: {}", e)))?;
        Ok(RouteBuilder::new(self, Method::GET, PathMatcher::Pattern(re)))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Pending route awaiting its reply
pub struct RouteBuilder {
    routes: MockRoutes,
    method: Method,
    matcher: PathMatcher,
    body: Option<Value>,
}

impl RouteBuilder {
    fn new(routes: MockRoutes, method: Method, matcher: PathMatcher) -> Self {
        Self {
            routes,
            method,
            matcher,
            body: None,
        }
    }

    /// Only match requests carrying exactly this JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn reply(self, status: u16, body: Value) -> MockRoutes {
        self.finish(Reply::Fixed(FetchResponse::new(status, body)), false)
    }

    pub fn reply_once(self, status: u16, body: Value) -> MockRoutes {
        self.finish(Reply::Fixed(FetchResponse::new(status, body)), true)
    }

    /// Compute the reply from the request
    pub fn reply_with<F>(self, responder: F) -> MockRoutes
    where
        F: Fn(&FetchRequest) -> FetchResponse + Send + Sync + 'static,
    {
        self.finish(Reply::With(Arc::new(responder)), false)
    }

    /// Simulate the service being unreachable
    pub fn network_error(self, message: impl Into<String>) -> MockRoutes {
        self.finish(Reply::NetworkError(message.into()), false)
    }

    fn finish(self, reply: Reply, once: bool) -> MockRoutes {
        let mut routes = self.routes;
        routes.routes.push(Route {
            method: self.method,
            matcher: self.matcher,
            body: self.body,
            reply,
            once,
        });
        routes
    }
}

/// In-process [`Fetcher`] answering from a [`MockRoutes`] table
pub struct MockFetcher {
    routes: Mutex<Vec<Route>>,
    history: Mutex<Vec<FetchRequest>>,
}

impl MockFetcher {
    pub fn new(routes: MockRoutes) -> Self {
        Self {
            routes: Mutex::new(routes.routes),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Append routes after construction; they rank below existing ones
    pub async fn add_routes(&self, routes: MockRoutes) {
        self.routes.lock().await.extend(routes.routes);
    }

    /// Requests seen so far, in order
    pub async fn history(&self) -> Vec<FetchRequest> {
        self.history.lock().await.clone()
    }

    pub async fn remaining_routes(&self) -> usize {
        self.routes.lock().await.len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        self.history.lock().await.push(request.clone());

        let reply = {
            let mut routes = self.routes.lock().await;
            match routes.iter().position(|r| r.matches(&request)) {
                Some(i) if routes[i].once => Some(routes.remove(i).reply),
                Some(i) => Some(routes[i].reply.clone()),
                None => None,
            }
        };

        match reply {
            Some(Reply::Fixed(response)) => {
                debug!(method = %request.method, path = %request.path, status = response.status, "mock reply");
                Ok(response)
            }
            Some(Reply::With(responder)) => Ok(responder(&request)),
            Some(Reply::NetworkError(message)) => Err(DashboardError::Transport(message)),
            None => {
                warn!(method = %request.method, path = %request.path, "no mock route matched");
                Ok(FetchResponse::new(
                    404,
                    json!({ "details": format!("No mock route for {} {}", request.method, request.path) }),
                ))
            }
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
