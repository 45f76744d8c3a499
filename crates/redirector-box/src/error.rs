//! Error types for redirector-box

/// Result type for redirector-box operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors talking to the Box API
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Box API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl Error {
    /// HTTP status behind the error, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::Status { status, .. } => Some(*status),
            Error::Json(_) | Error::Unexpected(_) => None,
        }
    }
}

impl From<Error> for redirector_core::Error {
    fn from(error: Error) -> Self {
        redirector_core::Error::remote(error.status(), error.to_string())
    }
}
