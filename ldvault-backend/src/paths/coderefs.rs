//! `coderefs/<project>`: tokens for the code references tool.
//!
//! The first read mints; every later read resets the recorded token, with
//! the previous secret staying valid for
//! [`RESET_GRACE_HOURS`](crate::paths::RESET_GRACE_HOURS).

use crate::backend::Backend;
use crate::config;
use crate::error::BackendResult;
use crate::paths::{self, ignore_not_found};
use crate::record::{CredentialKind, RecordStore};
use crate::request::{NoFields, Request, Response};
use crate::storage::Storage;
use ldvault_client::TokenBody;
use tracing::info;

pub async fn read(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    project: &str,
) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    let config = config::load_checked(storage).await?;
    let client = backend.client(&config).await?;
    let store = RecordStore::new(storage);

    let body = TokenBody::for_code_refs(project);
    let record =
        paths::rotate_or_mint(&client, &store, CredentialKind::CodeRefs, project, &body).await?;
    Ok(Some(paths::issue(&record, &config)))
}

pub async fn delete(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    project: &str,
) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    let store = RecordStore::new(storage);
    let Some(record) = store.load(CredentialKind::CodeRefs, project).await? else {
        return Ok(None);
    };

    let config = config::load_checked(storage).await?;
    let client = backend.client(&config).await?;
    ignore_not_found(client.delete_token(&record.upstream_id).await)?;
    store.remove(CredentialKind::CodeRefs, project).await?;
    info!(project, "revoked code references token");
    Ok(None)
}
