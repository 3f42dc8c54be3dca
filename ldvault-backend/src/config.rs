//! Engine configuration stored at `config`.
//!
//! Written by the `config` path, read by every other path. A change of
//! access token or host invalidates the cached client for the old values.

use crate::backend::BackendOptions;
use crate::error::{BackendError, BackendResult};
use crate::lease::{Lease, duration_secs};
use crate::request::FieldSet;
use crate::storage::{self, Storage};
use ldvault_client::ClientConfig;
use ldvault_client::config::DEFAULT_BASE_URI;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Storage key of the singleton configuration.
pub const CONFIG_KEY: &str = "config";

/// Every LaunchDarkly access token starts with this tag.
pub const ACCESS_TOKEN_PREFIX: &str = "api-";

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.to_string()
}

/// Persisted engine configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    /// Default lease for issued credentials. Zero defers to the host.
    #[serde(default, with = "duration_secs")]
    pub ttl: Duration,
    /// Maximum lease for issued credentials. Zero defers to the host.
    #[serde(default, with = "duration_secs")]
    pub max_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_uri: default_base_uri(),
            ttl: Duration::ZERO,
            max_ttl: Duration::ZERO,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("access_token", &"<redacted>")
            .field("base_uri", &self.base_uri)
            .field("ttl", &self.ttl)
            .field("max_ttl", &self.max_ttl)
            .finish()
    }
}

/// Fields accepted by a `config` write. Absent, empty and non-positive
/// values leave the stored value unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFields {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub base_uri: Option<String>,
    #[serde(default)]
    pub ttl: Option<DurationField>,
    #[serde(default)]
    pub max_ttl: Option<DurationField>,
}

/// A lease duration as written by an operator: whole seconds, either as a
/// number or a numeric string, or a duration string such as `"1h"` or
/// `"90m"`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationField {
    Seconds(i64),
    Text(String),
}

impl DurationField {
    /// `None` for zero and negative values.
    fn positive(&self, field: &str) -> BackendResult<Option<Duration>> {
        let duration = match self {
            DurationField::Seconds(secs) => u64::try_from(*secs).ok().map(Duration::from_secs),
            DurationField::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    None
                } else if let Ok(secs) = text.parse::<i64>() {
                    u64::try_from(secs).ok().map(Duration::from_secs)
                } else {
                    let parsed = humantime::parse_duration(text).map_err(|e| {
                        BackendError::Validation(format!("{field} is not a duration: {e}"))
                    })?;
                    Some(parsed)
                }
            }
        };
        Ok(duration.filter(|d| !d.is_zero()))
    }
}


impl FieldSet for ConfigFields {
    const FIELDS: &'static [&'static str] = &["access_token", "base_uri", "ttl", "max_ttl"];
}

fn positive_duration(
    value: Option<&DurationField>,
    field: &str,
) -> BackendResult<Option<Duration>> {
    match value {
        Some(value) => value.positive(field),
        None => Ok(None),
    }
}

impl EngineConfig {
    /// Merges a write into this configuration, validating the result.
    pub fn apply(&mut self, fields: ConfigFields) -> BackendResult<()> {
        if let Some(token) = fields.access_token.filter(|t| !t.is_empty()) {
            if !token.starts_with(ACCESS_TOKEN_PREFIX) {
                return Err(BackendError::Validation(format!(
                    "access_token should start with `{ACCESS_TOKEN_PREFIX}`"
                )));
            }
            self.access_token = token;
        }

        if let Some(base_uri) = fields.base_uri.filter(|u| !u.is_empty()) {
            if !base_uri.starts_with("http://") && !base_uri.starts_with("https://") {
                return Err(BackendError::Validation(format!(
                    "base_uri must be an http(s) URL, got {base_uri:?}"
                )));
            }
            self.base_uri = base_uri;
        }

        if let Some(ttl) = positive_duration(fields.ttl.as_ref(), "ttl")? {
            self.ttl = ttl;
        }
        if let Some(max_ttl) = positive_duration(fields.max_ttl.as_ref(), "max_ttl")? {
            self.max_ttl = max_ttl;
        }

        if self.access_token.is_empty() {
            return Err(BackendError::Validation("access_token is required".into()));
        }

        if !self.max_ttl.is_zero() && self.ttl > self.max_ttl {
            return Err(BackendError::Validation(format!(
                "ttl ({}s) cannot exceed max_ttl ({}s)",
                self.ttl.as_secs(),
                self.max_ttl.as_secs()
            )));
        }
        Ok(())
    }

    /// Checks that the configuration can be used to call the API.
    pub fn check(&self) -> BackendResult<()> {
        match (self.access_token.is_empty(), self.base_uri.is_empty()) {
            (true, true) => Err(BackendError::NotConfigured(
                "access_token and base_uri need to be set".into(),
            )),
            (true, false) => Err(BackendError::NotConfigured(
                "LaunchDarkly access_token needs to be set".into(),
            )),
            (false, true) => Err(BackendError::NotConfigured(
                "LaunchDarkly base_uri needs to be set".into(),
            )),
            (false, false) => Ok(()),
        }
    }

    /// Lease applied to credentials issued under this configuration.
    pub fn lease(&self) -> Lease {
        Lease {
            ttl: self.ttl,
            max_ttl: self.max_ttl,
        }
    }

    /// Stable identity of the upstream credentials, used to key cached clients.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.base_uri.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.access_token.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn client_config(&self, options: &BackendOptions) -> ClientConfig {
        ClientConfig {
            access_token: self.access_token.clone(),
            base_uri: self.base_uri.clone(),
            auth_mode: options.auth_mode,
            timeout: options.http_timeout,
            retry: options.retry,
        }
    }
}

/// Loads the stored configuration, if any.
pub async fn load(storage: &dyn Storage) -> BackendResult<Option<EngineConfig>> {
    Ok(storage::get_json(storage, CONFIG_KEY).await?)
}

/// Loads the stored configuration and checks it is usable.
pub async fn load_checked(storage: &dyn Storage) -> BackendResult<EngineConfig> {
    let config = load(storage).await?.ok_or_else(|| {
        BackendError::NotConfigured("write your access_token to config first".into())
    })?;
    config.check()?;
    Ok(config)
}

pub async fn save(storage: &dyn Storage, config: &EngineConfig) -> BackendResult<()> {
    storage::put_json(storage, CONFIG_KEY, config).await?;
    Ok(())
}
