//! Upstream API error types.

use thiserror::Error;

/// Result type for LaunchDarkly API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by [`crate::LaunchDarklyClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status. `body` is the raw error
    /// envelope as sent by LaunchDarkly.
    #[error("LaunchDarkly API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// HTTP status associated with the error, if there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Upstream { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}
