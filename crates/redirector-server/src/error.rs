//! Error types for the HTTP service

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while serving
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the reconciliation engine
    #[error("{0}")]
    Core(#[from] redirector_core::Error),

    /// Error building the remote store client
    #[error("remote client error: {0}")]
    Client(#[from] redirector_box::Error),

    /// Blocking engine task panicked or was cancelled
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Another sweep holds the sweep lock
    #[error("a sweep is already running")]
    SweepInProgress,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Core(e) if e.is_malformed_event() => StatusCode::BAD_REQUEST,
            Error::SweepInProgress => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request refused");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_events_are_client_errors() {
        let error = Error::from(redirector_core::Error::malformed("no subject"));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn remote_failures_are_server_errors() {
        let error = Error::from(redirector_core::Error::remote(Some(502), "bad gateway"));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
