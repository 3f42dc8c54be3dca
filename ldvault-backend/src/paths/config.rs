//! `config`: read and write the engine configuration.

use crate::backend::Backend;
use crate::config::{self, ConfigFields};
use crate::error::BackendResult;
use crate::request::{NoFields, Request, Response};
use crate::storage::Storage;
use serde_json::{Map, Value};
use tracing::info;

pub async fn write(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
) -> BackendResult<Option<Response>> {
    let fields: ConfigFields = request.fields()?;

    let previous = config::load(storage).await?;
    let mut updated = previous.clone().unwrap_or_default();
    updated.apply(fields)?;
    config::save(storage, &updated).await?;

    if let Some(previous) = previous.filter(|p| p.fingerprint() != updated.fingerprint()) {
        backend.invalidate_client(&previous).await;
    }
    info!(base_uri = %updated.base_uri, "configuration updated");
    Ok(None)
}

/// Returns the stored values, leaving out empty strings and zero durations.
/// Durations are reported in seconds.
pub async fn read(storage: &dyn Storage, request: &Request) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    let Some(config) = config::load(storage).await? else {
        return Ok(None);
    };

    let mut data = Map::new();
    if !config.access_token.is_empty() {
        data.insert("access_token".into(), Value::String(config.access_token));
    }
    if !config.base_uri.is_empty() {
        data.insert("base_uri".into(), Value::String(config.base_uri));
    }
    if !config.ttl.is_zero() {
        data.insert("ttl".into(), config.ttl.as_secs().into());
    }
    if !config.max_ttl.is_zero() {
        data.insert("max_ttl".into(), config.max_ttl.as_secs().into());
    }
    Ok(Some(Response::from_data(data)))
}
