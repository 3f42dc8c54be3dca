//! Backend error types.

use crate::request::Operation;
use crate::storage::StorageError;
use ldvault_client::ApiError;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors returned to the host from request handlers and lease hooks.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Bad user input. Never retried.
    #[error("{0}")]
    Validation(String),

    #[error("unknown fields: {0:?}")]
    UnknownFields(Vec<String>),

    /// No usable configuration has been written yet.
    #[error("{0}")]
    NotConfigured(String),

    #[error("environment {env:?} not found in project {project:?}")]
    NoSuchEnvironment { project: String, env: String },

    #[error("unsupported path: {0}")]
    UnsupportedPath(String),

    #[error("unsupported operation {operation} on {path}")]
    UnsupportedOperation { operation: Operation, path: String },

    #[error("secret is missing {0} internal data")]
    MissingInternalData(&'static str),

    /// The API accepted the call but the response lacks a field we need.
    #[error("malformed LaunchDarkly response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Upstream(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// HTTP-style status for the host's error response.
    pub fn status_code(&self) -> u16 {
        match self {
            BackendError::Validation(_)
            | BackendError::NotConfigured(_)
            | BackendError::NoSuchEnvironment { .. }
            | BackendError::MissingInternalData(_) => 400,
            BackendError::UnknownFields(_) => 422,
            BackendError::UnsupportedPath(_) => 404,
            BackendError::UnsupportedOperation { .. } => 405,
            BackendError::MalformedResponse(_) => 502,
            BackendError::Upstream(e) => e.status().unwrap_or(502),
            BackendError::Storage(_) | BackendError::Serialization(_) => 500,
        }
    }

    /// True for errors caused by the caller's input rather than a failure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BackendError::Validation(_)
                | BackendError::UnknownFields(_)
                | BackendError::NotConfigured(_)
                | BackendError::NoSuchEnvironment { .. }
                | BackendError::UnsupportedPath(_)
                | BackendError::UnsupportedOperation { .. }
        )
    }
}
