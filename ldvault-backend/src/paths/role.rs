//! `role`, `role/<customrole>` and `role/<customrole>/reset`.
//!
//! Tokens are service tokens bound to one existing custom role. A read
//! returns the recorded token and only mints when none is recorded, so
//! repeated reads do not leave a trail of live tokens upstream.

use crate::backend::Backend;
use crate::config;
use crate::error::BackendResult;
use crate::paths::{self, ignore_not_found};
use crate::record::{CredentialKind, RecordStore};
use crate::request::{FieldSet, NoFields, Request, Response};
use crate::storage::Storage;
use ldvault_client::TokenBody;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

pub const DEFAULT_TOKEN_NAME: &str = "vault-generated";

fn default_token_name() -> String {
    DEFAULT_TOKEN_NAME.to_string()
}

#[derive(Debug, Deserialize)]
pub struct RoleFields {
    /// Name given to the minted token.
    #[serde(default = "default_token_name")]
    pub name: String,
}

impl FieldSet for RoleFields {
    const FIELDS: &'static [&'static str] = &["name"];
}

impl RoleFields {
    fn token_body(&self, custom_role: &str) -> TokenBody {
        let name = if self.name.is_empty() {
            DEFAULT_TOKEN_NAME.to_string()
        } else {
            self.name.to_lowercase()
        };
        TokenBody::for_custom_role(name, custom_role)
    }
}

pub async fn list(storage: &dyn Storage, request: &Request) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    let keys = RecordStore::new(storage).list(CredentialKind::Role).await?;

    let mut data = Map::new();
    data.insert(
        "keys".into(),
        Value::Array(keys.into_iter().map(Value::String).collect()),
    );
    Ok(Some(Response::from_data(data)))
}

pub async fn read(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    custom_role: &str,
) -> BackendResult<Option<Response>> {
    let fields: RoleFields = request.fields()?;
    let config = config::load_checked(storage).await?;
    let store = RecordStore::new(storage);

    let record = match store.load(CredentialKind::Role, custom_role).await? {
        Some(record) => record,
        None => {
            let client = backend.client(&config).await?;
            let body = fields.token_body(custom_role);
            paths::mint(&client, &store, CredentialKind::Role, custom_role, &body).await?
        }
    };
    Ok(Some(paths::issue(&record, &config)))
}

pub async fn reset(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    custom_role: &str,
) -> BackendResult<Option<Response>> {
    let fields: RoleFields = request.fields()?;
    let config = config::load_checked(storage).await?;
    let client = backend.client(&config).await?;
    let store = RecordStore::new(storage);

    let body = fields.token_body(custom_role);
    let record =
        paths::rotate_or_mint(&client, &store, CredentialKind::Role, custom_role, &body).await?;
    Ok(Some(paths::issue(&record, &config)))
}

/// Deletes the upstream token, then the record. No record is a no-op.
pub async fn delete(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    custom_role: &str,
) -> BackendResult<Option<Response>> {
    request.fields::<RoleFields>()?;
    let store = RecordStore::new(storage);
    let Some(record) = store.load(CredentialKind::Role, custom_role).await? else {
        return Ok(None);
    };

    let config = config::load_checked(storage).await?;
    let client = backend.client(&config).await?;
    ignore_not_found(client.delete_token(&record.upstream_id).await)?;
    store.remove(CredentialKind::Role, custom_role).await?;
    info!(custom_role, "deleted role token");
    Ok(None)
}
