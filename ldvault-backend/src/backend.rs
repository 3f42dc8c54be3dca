//! Backend entry points called by the host adapter.
//!
//! - [`Backend::handle_request`]: routes a request to its path handler
//! - [`Backend::renew_secret`]: reapplies the current lease settings
//! - [`Backend::revoke_secret`]: deletes the upstream credential behind a secret

use crate::client_cache::ClientCache;
use crate::config::{self, EngineConfig};
use crate::error::{BackendError, BackendResult};
use crate::lease::{API_KEY_ID, CREDENTIAL_TYPE, RECORD_KEY, Secret};
use crate::paths;
use crate::record::{CredentialType, RecordStore};
use crate::request::{Operation, Request, Response};
use crate::router::Route;
use crate::storage::Storage;
use ldvault_client::config::DEFAULT_TIMEOUT;
use ldvault_client::{AuthMode, LaunchDarklyClient, RetryPolicy};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Process-level settings that are not part of the stored configuration.
#[derive(Clone, Copy, Debug)]
pub struct BackendOptions {
    pub retry: RetryPolicy,
    pub http_timeout: Duration,
    pub auth_mode: AuthMode,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            http_timeout: DEFAULT_TIMEOUT,
            auth_mode: AuthMode::ApiKey,
        }
    }
}

/// The secrets engine. Holds no per-request state besides cached clients.
#[derive(Default)]
pub struct Backend {
    options: BackendOptions,
    clients: ClientCache,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BackendOptions) -> Self {
        Self {
            options,
            clients: ClientCache::new(),
        }
    }

    /// Handles one request. `Ok(None)` means "nothing to return", which the
    /// host renders as an empty response or not-found depending on the
    /// operation.
    pub async fn handle_request(
        &self,
        storage: &dyn Storage,
        request: &Request,
    ) -> BackendResult<Option<Response>> {
        let op = request.operation;
        let route = Route::resolve(op, &request.path)?;
        debug!(%op, path = %request.path, "handling request");

        match (route, op) {
            (Route::Info, Operation::Read) => paths::info::read(request),
            (Route::Config, Operation::Read) => paths::config::read(storage, request).await,
            (Route::Config, Operation::Create | Operation::Update) => {
                paths::config::write(self, storage, request).await
            }
            (Route::Roles, Operation::List) => paths::role::list(storage, request).await,
            (Route::Role { custom_role }, Operation::Read) => {
                paths::role::read(self, storage, request, &custom_role).await
            }
            (Route::Role { custom_role }, Operation::Delete) => {
                paths::role::delete(self, storage, request, &custom_role).await
            }
            (Route::RoleReset { custom_role }, Operation::Read) => {
                paths::role::reset(self, storage, request, &custom_role).await
            }
            (Route::RelayPolicy, Operation::Create | Operation::Update) => {
                paths::relay::write_policy(self, storage, request).await
            }
            (Route::Relay { name }, Operation::Read) => {
                paths::relay::read(self, storage, request, &name).await
            }
            (Route::Relay { name }, Operation::Delete) => {
                paths::relay::delete(self, storage, request, &name).await
            }
            (Route::ProjectEnv { project, env }, Operation::Read) => {
                paths::project::read(self, storage, request, &project, &env).await
            }
            (
                Route::ProjectEnvReset {
                    project,
                    env,
                    key_type,
                },
                Operation::Read,
            ) => paths::project::reset(self, storage, request, &project, &env, key_type).await,
            (Route::CodeRefs { project }, Operation::Read) => {
                paths::coderefs::read(self, storage, request, &project).await
            }
            (Route::CodeRefs { project }, Operation::Delete) => {
                paths::coderefs::delete(self, storage, request, &project).await
            }
            (_, operation) => Err(BackendError::UnsupportedOperation {
                operation,
                path: request.path.clone(),
            }),
        }
    }

    /// Client for `config`, shared across requests with the same credentials.
    pub(crate) async fn client(
        &self,
        config: &EngineConfig,
    ) -> BackendResult<Arc<LaunchDarklyClient>> {
        self.clients.get(config, &self.options).await
    }

    pub(crate) async fn invalidate_client(&self, config: &EngineConfig) {
        self.clients.invalidate(config).await;
    }

    /// Number of upstream clients currently cached.
    pub async fn cached_clients(&self) -> usize {
        self.clients.len().await
    }

    // ── Lease hooks ──

    /// Reapplies the stored configuration's ttl/max_ttl. Does not contact
    /// LaunchDarkly.
    pub async fn renew_secret(&self, storage: &dyn Storage, secret: &Secret) -> BackendResult<Secret> {
        let config = config::load_checked(storage).await?;
        debug!(secret_type = %secret.secret_type, "renewing secret");
        Ok(secret.clone().with_lease(config.lease()))
    }

    /// Deletes the upstream credential named in the secret's internal data,
    /// then drops the local record if it still refers to that credential.
    /// A lease whose token has since been reset in place is left alone: the
    /// upstream id is shared with the live secret.
    pub async fn revoke_secret(&self, storage: &dyn Storage, secret: &Secret) -> BackendResult<()> {
        let api_key_id = secret.internal_str(API_KEY_ID)?;
        let raw_type = secret.internal_str(CREDENTIAL_TYPE)?;
        let credential_type = CredentialType::parse(raw_type).ok_or_else(|| {
            BackendError::Validation(format!("unknown credential_type {raw_type:?}"))
        })?;

        let store = RecordStore::new(storage);
        // Optional: secrets built by the host itself may not carry one.
        let record_key = secret.internal_data.get(RECORD_KEY).and_then(Value::as_str);
        let generation = secret.generation();
        if let Some(key) = record_key {
            if store.is_superseded(key, api_key_id, generation).await? {
                debug!(key, generation, "lease superseded by a reset, upstream token kept");
                return Ok(());
            }
        }

        let config = config::load_checked(storage).await?;
        let client = self.client(&config).await?;

        let result = match credential_type {
            CredentialType::Api => client.delete_token(api_key_id).await,
            CredentialType::RelayAutoConfig => client.delete_relay_auto_config(api_key_id).await,
        };
        match result {
            Ok(()) => info!(credential_type = raw_type, "revoked upstream credential"),
            Err(e) if e.is_not_found() => {
                warn!(credential_type = raw_type, "upstream credential already gone");
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(key) = record_key {
            store.remove_if_current(key, api_key_id, generation).await?;
        }
        Ok(())
    }
}
