// src/error.rs
// Standardized error types for the SRI Testing dashboard client

use thiserror::Error;

/// Main error type for the dashboard library
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Unknown run id, or a resource the server does not have (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Summary requested while the run is still going
    #[error("report for test run '{run_id}' is not ready ({percent_complete}% complete)")]
    NotReady { run_id: String, percent_complete: i32 },

    /// Network failure or service unreachable; nothing was produced
    #[error("transport error: {0}")]
    Transport(String),

    /// Server refused to start a run
    #[error("test run rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unexpected API response {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server broke a protocol invariant
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("gave up on test run '{run_id}' after {polls} polls ({percent_complete}% complete)")]
    PollBudgetExhausted {
        run_id: String,
        polls: u32,
        percent_complete: i32,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Result using DashboardError
pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    /// True for both flavours of "nothing there (yet)"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NotReady { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::Protocol(format!("undecodable response body: {}", err))
        } else {
            DashboardError::Transport(err.to_string())
        }
    }
}

impl From<DashboardError> for String {
    fn from(err: DashboardError) -> Self {
        err.to_string()
    }
}
