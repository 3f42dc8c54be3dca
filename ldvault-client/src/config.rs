//! Client configuration.

use crate::backoff::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default LaunchDarkly API host.
pub const DEFAULT_BASE_URI: &str = "https://app.launchdarkly.com";

/// Value sent in the `LD-API-Version` header on every request.
pub const API_VERSION: &str = "beta";

/// Per-request HTTP timeout unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the access token is presented in the `Authorization` header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// `Authorization: <token>`, used for `api-` access tokens.
    #[default]
    ApiKey,
    /// `Authorization: Bearer <token>`, used for OAuth access tokens.
    OAuth,
}

/// Everything needed to build a [`crate::LaunchDarklyClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub access_token: String,

    /// API host, e.g. "https://app.launchdarkly.com". `/api/v2` is appended.
    pub base_uri: String,

    pub auth_mode: AuthMode,

    /// Per-request timeout.
    pub timeout: Duration,

    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>, base_uri: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_uri: base_uri.into(),
            auth_mode: AuthMode::default(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Root of the v2 REST API for this host.
    pub fn api_base_path(&self) -> String {
        format!("{}/api/v2", self.base_uri.trim_end_matches('/'))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &"<redacted>")
            .field("base_uri", &self.base_uri)
            .field("auth_mode", &self.auth_mode)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}
