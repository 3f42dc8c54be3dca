//! `project/<project>/<env>` and `project/<project>/<env>/reset/<type>`.
//!
//! The key bundle of an environment is fetched once and cached at
//! `project/<project>/<env>`, tagged with the fingerprint of the
//! configuration that fetched it. A cached bundle from another account or
//! host is fetched again. A reset rotates one key upstream and overwrites the
//! cached bundle with the rotated values before returning.

use crate::backend::Backend;
use crate::config::{self, EngineConfig};
use crate::error::{BackendError, BackendResult};
use crate::request::{NoFields, Request, Response};
use crate::router::KeyType;
use crate::storage::{self, Storage};
use ldvault_client::Environment;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub fn cache_key(project: &str, env: &str) -> String {
    format!("project/{project}/{env}")
}

/// Keys of one environment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentKeys {
    /// Server-side SDK key.
    #[serde(rename = "sdk")]
    pub sdk_key: String,
    #[serde(rename = "mobile")]
    pub mobile_key: String,
    /// Environment id, used as the client-side id.
    pub client_id: String,
}

impl From<&Environment> for EnvironmentKeys {
    fn from(env: &Environment) -> Self {
        Self {
            sdk_key: env.api_key.clone(),
            mobile_key: env.mobile_key.clone(),
            client_id: env.id.clone(),
        }
    }
}

impl std::fmt::Debug for EnvironmentKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentKeys")
            .field("sdk_key", &"<redacted>")
            .field("mobile_key", &"<redacted>")
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Cached bundle as stored. `account` is never returned to the caller.
#[derive(Serialize, Deserialize)]
struct CachedKeys {
    #[serde(default)]
    account: String,
    #[serde(flatten)]
    keys: EnvironmentKeys,
}

async fn store_keys(
    storage: &dyn Storage,
    key: &str,
    config: &EngineConfig,
    keys: &EnvironmentKeys,
) -> BackendResult<()> {
    let cached = CachedKeys {
        account: config.fingerprint(),
        keys: keys.clone(),
    };
    storage::put_json(storage, key, &cached).await?;
    Ok(())
}

pub async fn read(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    project: &str,
    env: &str,
) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    let config = config::load_checked(storage).await?;
    let key = cache_key(project, env);
    match storage::get_json::<CachedKeys>(storage, &key).await? {
        Some(cached) if cached.account == config.fingerprint() => {
            debug!(project, env, "environment keys served from cache");
            return Ok(Some(Response::from_serialize(&cached.keys)?));
        }
        Some(_) => debug!(project, env, "cached environment keys belong to another account"),
        None => {}
    }

    let client = backend.client(&config).await?;
    let fetched = client.get_project(project).await?;
    let environment = fetched
        .environment(env)
        .ok_or_else(|| BackendError::NoSuchEnvironment {
            project: project.to_string(),
            env: env.to_string(),
        })?;

    let keys = EnvironmentKeys::from(environment);
    store_keys(storage, &key, &config, &keys).await?;
    debug!(project, env, "cached environment keys");
    Ok(Some(Response::from_serialize(&keys)?))
}

pub async fn reset(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    project: &str,
    env: &str,
    key_type: KeyType,
) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    let config = config::load_checked(storage).await?;
    let client = backend.client(&config).await?;

    let environment = match key_type {
        KeyType::Sdk => client.reset_environment_sdk_key(project, env).await?,
        KeyType::Mobile => client.reset_environment_mobile_key(project, env).await?,
    };

    let keys = EnvironmentKeys::from(&environment);
    store_keys(storage, &cache_key(project, env), &config, &keys).await?;
    info!(project, env, %key_type, "reset environment key");
    Ok(Some(Response::from_serialize(&keys)?))
}
