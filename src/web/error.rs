// src/web/error.rs
// Error responses of the stand-in server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sri_types::ApiMessage;
use std::fmt;
use tracing::error;

use crate::error::DashboardError;

/// Error answered as `{"details": message}` with the given status
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn custom(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            error!(status = %self.status_code, message = %self.message, "request failed");
        }
        (self.status_code, Json(ApiMessage::new(self.message))).into_response()
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::NotFound(message) => Self::not_found(message),
            DashboardError::BadRequest(message) => Self::bad_request(message),
            other @ DashboardError::NotReady { .. } => Self::not_found(other.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Extension trait for Option<T> to create ApiError for None cases
pub trait IntoApiErrorOption<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> ApiResult<T>;
}

impl<T> IntoApiErrorOption<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> ApiResult<T> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}
