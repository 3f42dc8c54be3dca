//! Host storage abstraction.
//!
//! The host hands every request a key-value view. Keys are `/`-separated
//! paths such as `role/<name>`; values are JSON documents. Nothing here is
//! transactional: concurrent writers to one key race and the last write wins.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to encode entry {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode entry {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single stored value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl StorageEntry {
    /// JSON-encodes `value` under `key`.
    pub fn json<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> StorageResult<Self> {
        let key = key.into();
        let value = serde_json::to_vec(value).map_err(|source| StorageError::Encode {
            key: key.clone(),
            source,
        })?;
        Ok(Self { key, value })
    }

    pub fn decode_json<T: DeserializeOwned>(&self) -> StorageResult<T> {
        serde_json::from_slice(&self.value).map_err(|source| StorageError::Decode {
            key: self.key.clone(),
            source,
        })
    }
}

/// Key-value view supplied by the host for the duration of a request.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<StorageEntry>>;

    async fn put(&self, entry: StorageEntry) -> StorageResult<()>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Lists keys under `prefix` with the prefix stripped. Deeper keys
    /// collapse to their first segment with a trailing `/`.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

/// Reads and decodes a JSON entry.
pub async fn get_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> StorageResult<Option<T>> {
    match storage.get(key).await? {
        Some(entry) => Ok(Some(entry.decode_json()?)),
        None => Ok(None),
    }
}

/// Encodes and writes a JSON entry.
pub async fn put_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    storage.put(StorageEntry::json(key, value)?).await
}

// ── InMemoryStorage ─────────────────────────────────────────────

/// Process-local storage, for tests and hosts without a persistent backend.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<StorageEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|value| StorageEntry {
            key: key.to_string(),
            value: value.clone(),
        }))
    }

    async fn put(&self, entry: StorageEntry) -> StorageResult<()> {
        self.entries.write().await.insert(entry.key, entry.value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = Vec::new();
        for key in entries.keys() {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let listed = match rest.find('/') {
                Some(idx) => rest[..=idx].to_string(),
                None => rest.to_string(),
            };
            if keys.last() != Some(&listed) {
                keys.push(listed);
            }
        }
        Ok(keys)
    }
}
