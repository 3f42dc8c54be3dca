//! Credential record store.
//!
//! Maps a local name (custom role, relay policy, code-refs project) to the
//! upstream credential minted for it, so later reads, resets and deletes can
//! find the upstream id. At most one record exists per kind and name.

use crate::error::{BackendError, BackendResult};
use crate::storage::{self, Storage};
use chrono::{DateTime, Utc};
use ldvault_client::{RelayAutoConfig, Token};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// What a record was minted for. Determines its storage prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Role,
    Relay,
    #[serde(rename = "coderefs")]
    CodeRefs,
}

impl CredentialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKind::Role => "role",
            CredentialKind::Relay => "relay",
            CredentialKind::CodeRefs => "coderefs",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            CredentialKind::Role => "role/",
            CredentialKind::Relay => "relay/token/",
            CredentialKind::CodeRefs => "coderefs/",
        }
    }

    pub fn storage_key(self, name: &str) -> String {
        format!("{}{name}", self.prefix())
    }

    pub fn credential_type(self) -> CredentialType {
        match self {
            CredentialKind::Role | CredentialKind::CodeRefs => CredentialType::Api,
            CredentialKind::Relay => CredentialType::RelayAutoConfig,
        }
    }
}

/// Upstream credential family, as recorded in a secret's internal data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialType {
    /// API access token.
    #[serde(rename = "api")]
    Api,
    /// Relay Proxy auto-config.
    #[serde(rename = "rac")]
    RelayAutoConfig,
}

impl CredentialType {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialType::Api => "api",
            CredentialType::RelayAutoConfig => "rac",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "api" => Some(CredentialType::Api),
            "rac" => Some(CredentialType::RelayAutoConfig),
            _ => None,
        }
    }
}

/// A credential minted upstream and remembered locally.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub name: String,
    pub kind: CredentialKind,
    pub upstream_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub rotated_at: Option<DateTime<Utc>>,
    /// Bumped on every reset. A reset keeps the upstream id, so this is what
    /// tells a lease on the previous secret apart from one on the current.
    #[serde(default)]
    pub generation: u64,
}

impl CredentialRecord {
    /// Record for a freshly created API token.
    pub fn from_token(kind: CredentialKind, name: &str, token: Token) -> BackendResult<Self> {
        if token.token.is_empty() {
            return Err(BackendError::MalformedResponse(format!(
                "token {} was returned without its secret",
                token.id
            )));
        }
        Ok(Self {
            name: name.to_string(),
            kind,
            upstream_id: token.id,
            token: token.token,
            created_at: Utc::now(),
            rotated_at: None,
            generation: 0,
        })
    }

    /// Record for a freshly created relay auto-config.
    pub fn from_relay(name: &str, config: RelayAutoConfig) -> BackendResult<Self> {
        if config.full_key.is_empty() {
            return Err(BackendError::MalformedResponse(format!(
                "relay auto-config {} was returned without its key",
                config.id
            )));
        }
        Ok(Self {
            name: name.to_string(),
            kind: CredentialKind::Relay,
            upstream_id: config.id,
            token: config.full_key,
            created_at: Utc::now(),
            rotated_at: None,
            generation: 0,
        })
    }

    /// This record after an upstream reset of its token.
    pub fn rotated(self, token: Token) -> BackendResult<Self> {
        if token.token.is_empty() {
            return Err(BackendError::MalformedResponse(format!(
                "reset of token {} returned no secret",
                token.id
            )));
        }
        Ok(Self {
            upstream_id: token.id,
            token: token.token,
            rotated_at: Some(Utc::now()),
            generation: self.generation + 1,
            ..self
        })
    }

    pub fn storage_key(&self) -> String {
        self.kind.storage_key(&self.name)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("upstream_id", &self.upstream_id)
            .field("token", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("rotated_at", &self.rotated_at)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Typed access to credential records in host storage.
pub struct RecordStore<'a> {
    storage: &'a dyn Storage,
}

impl<'a> RecordStore<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    pub async fn load(
        &self,
        kind: CredentialKind,
        name: &str,
    ) -> BackendResult<Option<CredentialRecord>> {
        Ok(storage::get_json(self.storage, &kind.storage_key(name)).await?)
    }

    pub async fn save(&self, record: &CredentialRecord) -> BackendResult<()> {
        storage::put_json(self.storage, &record.storage_key(), record).await?;
        Ok(())
    }

    pub async fn remove(&self, kind: CredentialKind, name: &str) -> BackendResult<()> {
        self.storage.delete(&kind.storage_key(name)).await?;
        Ok(())
    }

    /// Names with a stored record of `kind`.
    pub async fn list(&self, kind: CredentialKind) -> BackendResult<Vec<String>> {
        let keys = self.storage.list(kind.prefix()).await?;
        Ok(keys.into_iter().filter(|k| !k.ends_with('/')).collect())
    }

    /// Whether the record at `key` holds a newer secret for `upstream_id`
    /// than `generation`.
    pub async fn is_superseded(
        &self,
        key: &str,
        upstream_id: &str,
        generation: u64,
    ) -> BackendResult<bool> {
        let record: Option<CredentialRecord> = storage::get_json(self.storage, key).await?;
        Ok(record.is_some_and(|r| r.upstream_id == upstream_id && r.generation > generation))
    }

    /// Deletes the record at `key` if it still points at `upstream_id` and
    /// has not been reset past `generation`. Returns whether a record was
    /// removed.
    pub async fn remove_if_current(
        &self,
        key: &str,
        upstream_id: &str,
        generation: u64,
    ) -> BackendResult<bool> {
        let record: Option<CredentialRecord> = storage::get_json(self.storage, key).await?;
        match record {
            Some(record) if record.upstream_id == upstream_id && record.generation <= generation => {
                self.storage.delete(key).await?;
                debug!(key, "removed local credential record");
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
