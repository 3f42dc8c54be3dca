//! Cache of upstream clients keyed by configuration fingerprint.
//!
//! Building a client is cheap next to a network call, but reusing one keeps
//! its connection pool warm. Entries are keyed by [`EngineConfig::fingerprint`]
//! so a config write only evicts the client built from the old values.

use crate::backend::BackendOptions;
use crate::config::EngineConfig;
use crate::error::BackendResult;
use ldvault_client::LaunchDarklyClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct ClientCache {
    clients: RwLock<HashMap<String, Arc<LaunchDarklyClient>>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the client for `config`, building it on first use.
    pub async fn get(
        &self,
        config: &EngineConfig,
        options: &BackendOptions,
    ) -> BackendResult<Arc<LaunchDarklyClient>> {
        let key = config.fingerprint();

        // Fast path: already built
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(&key) {
                return Ok(client.clone());
            }
        }

        let mut clients = self.clients.write().await;
        // Another request may have built it while we waited for the lock
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        debug!(base_uri = %config.base_uri, "building LaunchDarkly client");
        let client = Arc::new(LaunchDarklyClient::new(&config.client_config(options))?);
        clients.insert(key, client.clone());
        Ok(client)
    }

    /// Drops the client built from `config`. Returns whether one was cached.
    pub async fn invalidate(&self, config: &EngineConfig) -> bool {
        let removed = self
            .clients
            .write()
            .await
            .remove(&config.fingerprint())
            .is_some();
        if removed {
            debug!(base_uri = %config.base_uri, "invalidated cached LaunchDarkly client");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}
