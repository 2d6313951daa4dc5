//! Structured errors for the shelfscan HTTP boundary.
//!
//! Every error renders as `{"error": "<message>"}` with a matching status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Structured errors for the shelfscan server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or empty `query` parameter.
    #[error("{0}")]
    InvalidQuery(String),

    /// Anything that went wrong while answering a valid request.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<shelfscan_core::Error> for ApiError {
    fn from(err: shelfscan_core::Error) -> Self {
        match err {
            shelfscan_core::Error::InvalidQuery(msg) => ApiError::InvalidQuery(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "search failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
