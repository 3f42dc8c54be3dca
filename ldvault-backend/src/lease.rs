//! Leases and the secrets they are attached to.
//!
//! Every minted credential goes back to the host as a [`Secret`] carrying a
//! [`Lease`]. The host later calls renew/revoke with the same secret, so the
//! internal data records everything revocation needs.

use crate::error::{BackendError, BackendResult};
use crate::record::CredentialRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Secret type registered with the host for every credential this engine issues.
pub const SECRET_TYPE: &str = "LDApiKey";

/// Upstream id of the token or relay auto-config.
pub const API_KEY_ID: &str = "api_key_id";
/// `api` or `rac`; selects the upstream delete call on revoke.
pub const CREDENTIAL_TYPE: &str = "credential_type";
/// `role`, `relay` or `coderefs`.
pub const SECRET_KIND: &str = "secret_type";
/// Storage key of the local record the secret was issued from.
pub const RECORD_KEY: &str = "record_key";
/// Record generation the secret was issued at.
pub const GENERATION: &str = "generation";

/// Lease durations. Zero means "use the host default".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
    #[serde(with = "duration_secs")]
    pub max_ttl: Duration,
}

/// A leased credential.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub secret_type: String,
    /// Returned to the caller.
    pub data: Map<String, Value>,
    /// Kept by the host and handed back on renew/revoke.
    pub internal_data: Map<String, Value>,
    pub lease: Lease,
}

impl Secret {
    /// Secret for a stored credential record.
    pub fn for_record(record: &CredentialRecord, lease: Lease) -> Self {
        let mut data = Map::new();
        data.insert("token".into(), Value::String(record.token.clone()));

        let mut internal_data = Map::new();
        internal_data.insert(API_KEY_ID.into(), Value::String(record.upstream_id.clone()));
        internal_data.insert(
            CREDENTIAL_TYPE.into(),
            Value::String(record.kind.credential_type().as_str().into()),
        );
        internal_data.insert(SECRET_KIND.into(), Value::String(record.kind.as_str().into()));
        internal_data.insert(RECORD_KEY.into(), Value::String(record.storage_key()));
        internal_data.insert(GENERATION.into(), Value::from(record.generation));

        Self {
            secret_type: SECRET_TYPE.to_string(),
            data,
            internal_data,
            lease,
        }
    }

    /// String value from the internal data. Missing and non-string values
    /// are both reported as missing.
    pub fn internal_str(&self, key: &'static str) -> BackendResult<&str> {
        self.internal_data
            .get(key)
            .and_then(Value::as_str)
            .ok_or(BackendError::MissingInternalData(key))
    }

    /// Record generation, zero for secrets issued without one.
    pub fn generation(&self) -> u64 {
        self.internal_data
            .get(GENERATION)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn with_lease(mut self, lease: Lease) -> Self {
        self.lease = lease;
        self
    }
}

/// Serializes a [`Duration`] as whole seconds.
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
