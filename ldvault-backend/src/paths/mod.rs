//! Path handlers, one module per route family.
//!
//! Handlers load the configuration, talk to LaunchDarkly through the cached
//! client and keep the credential record store in step with upstream.

pub mod coderefs;
pub mod config;
pub mod info;
pub mod project;
pub mod relay;
pub mod role;

use crate::config::EngineConfig;
use crate::error::BackendResult;
use crate::lease::Secret;
use crate::record::{CredentialKind, CredentialRecord, RecordStore};
use crate::request::Response;
use chrono::{Duration, Utc};
use ldvault_client::{ApiResult, LaunchDarklyClient, TokenBody};
use tracing::{debug, info, warn};

/// Hours a reset token's previous secret keeps working.
pub const RESET_GRACE_HOURS: i64 = 12;

/// Leased response for a stored record.
pub(crate) fn issue(record: &CredentialRecord, config: &EngineConfig) -> Response {
    Response::from_secret(Secret::for_record(record, config.lease()))
}

/// Treats an upstream 404 as success.
pub(crate) fn ignore_not_found(result: ApiResult<()>) -> BackendResult<()> {
    match result {
        Err(e) if e.is_not_found() => {
            warn!("upstream credential already deleted");
            Ok(())
        }
        other => Ok(other?),
    }
}

/// Mints a new API token and records it under `kind`/`name`.
pub(crate) async fn mint(
    client: &LaunchDarklyClient,
    store: &RecordStore<'_>,
    kind: CredentialKind,
    name: &str,
    body: &TokenBody,
) -> BackendResult<CredentialRecord> {
    let token = client.create_token(body).await?;
    let record = CredentialRecord::from_token(kind, name, token)?;
    store.save(&record).await?;
    info!(kind = kind.as_str(), name, "minted access token");
    Ok(record)
}

/// Resets the recorded token, keeping the old secret valid for
/// [`RESET_GRACE_HOURS`]. Mints instead when there is no record or the recorded
/// token no longer exists upstream.
pub(crate) async fn rotate_or_mint(
    client: &LaunchDarklyClient,
    store: &RecordStore<'_>,
    kind: CredentialKind,
    name: &str,
    body: &TokenBody,
) -> BackendResult<CredentialRecord> {
    let Some(record) = store.load(kind, name).await? else {
        return mint(client, store, kind, name, body).await;
    };

    let expiry = Utc::now() + Duration::hours(RESET_GRACE_HOURS);
    match client.reset_token(&record.upstream_id, Some(expiry)).await {
        Ok(token) => {
            let record = record.rotated(token)?;
            store.save(&record).await?;
            info!(kind = kind.as_str(), name, "rotated access token");
            Ok(record)
        }
        Err(e) if e.is_not_found() => {
            debug!(kind = kind.as_str(), name, "recorded token gone upstream, minting");
            mint(client, store, kind, name, body).await
        }
        Err(e) => Err(e.into()),
    }
}
