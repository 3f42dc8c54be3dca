//! `relay/policy` and `relay/<name>`.
//!
//! A relay token is minted in two steps: a named policy is written first,
//! then reading `relay/<name>` creates a Relay Proxy auto-config scoped to
//! that policy. Rewriting a policy with different statements revokes the
//! auto-config minted under the old ones, so the next read mints against the
//! new policy. Deleting `relay/<name>` revokes the auto-config upstream and
//! forgets both the token record and the policy.

use crate::backend::Backend;
use crate::config;
use crate::error::{BackendError, BackendResult};
use crate::paths::{self, ignore_not_found};
use crate::record::{CredentialKind, CredentialRecord, RecordStore};
use crate::request::{FieldSet, NoFields, Request, Response};
use crate::router::key_segment;
use crate::storage::{self, Storage};
use ldvault_client::{RelayAutoConfigBody, Statement};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

pub const POLICY_PREFIX: &str = "relay/policy/";

pub fn policy_key(name: &str) -> String {
    format!("{POLICY_PREFIX}{name}")
}

#[derive(Debug, Deserialize)]
pub struct RelayPolicyFields {
    #[serde(default)]
    pub name: String,
    /// A policy document, either as JSON text or inline JSON.
    #[serde(default)]
    pub inline_policy: Value,
}

impl FieldSet for RelayPolicyFields {
    const FIELDS: &'static [&'static str] = &["name", "inline_policy"];
}

/// One statement or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PolicyDocument {
    Many(Vec<Statement>),
    One(Statement),
}

impl PolicyDocument {
    fn into_statements(self) -> Vec<Statement> {
        match self {
            PolicyDocument::Many(statements) => statements,
            PolicyDocument::One(statement) => vec![statement],
        }
    }
}

/// A stored relay policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayPolicy {
    pub name: String,
    pub statements: Vec<Statement>,
}

/// Parses and checks a policy document.
pub fn parse_policy(raw: &Value) -> BackendResult<Vec<Statement>> {
    let document: PolicyDocument = match raw {
        Value::Null => return Err(BackendError::Validation("inline_policy is required".into())),
        Value::String(text) if text.trim().is_empty() => {
            return Err(BackendError::Validation("inline_policy is required".into()));
        }
        Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    }
    .map_err(|e| BackendError::Validation(format!("inline_policy is not a valid policy: {e}")))?;

    let statements = document.into_statements();
    if statements.is_empty() {
        return Err(BackendError::Validation(
            "inline_policy needs at least one statement".into(),
        ));
    }
    for statement in &statements {
        if statement.effect != "allow" && statement.effect != "deny" {
            return Err(BackendError::Validation(format!(
                "policy effect must be allow or deny, got {:?}",
                statement.effect
            )));
        }
        if statement.resources.is_empty() && statement.not_resources.is_empty() {
            return Err(BackendError::Validation(
                "policy statement needs resources or notResources".into(),
            ));
        }
    }
    Ok(statements)
}

pub async fn write_policy(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
) -> BackendResult<Option<Response>> {
    let fields: RelayPolicyFields = request.fields()?;
    if fields.name.is_empty() {
        return Err(BackendError::Validation("name is required".into()));
    }
    let name = key_segment("name", &fields.name)?;
    let statements = parse_policy(&fields.inline_policy)?;

    let key = policy_key(&name);
    let previous = storage::get_json::<RelayPolicy>(storage, &key).await?;
    if previous.is_some_and(|p| p.statements != statements) {
        revoke_token(backend, storage, &name).await?;
    }

    let policy = RelayPolicy {
        name: name.clone(),
        statements,
    };
    storage::put_json(storage, &key, &policy).await?;
    info!(name = %name, statements = policy.statements.len(), "stored relay policy");

    let mut data = Map::new();
    data.insert("inline_policy".into(), fields.inline_policy);
    Ok(Some(Response::from_data(data)))
}

/// `None` when no policy is stored under `name`.
pub async fn read(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    name: &str,
) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    let Some(policy) = storage::get_json::<RelayPolicy>(storage, &policy_key(name)).await? else {
        return Ok(None);
    };

    let config = config::load_checked(storage).await?;
    let store = RecordStore::new(storage);
    if let Some(record) = store.load(CredentialKind::Relay, name).await? {
        return Ok(Some(paths::issue(&record, &config)));
    }

    let client = backend.client(&config).await?;
    let body = RelayAutoConfigBody {
        name: name.to_string(),
        policy: policy.statements,
    };
    let created = client.create_relay_auto_config(&body).await?;
    let record = CredentialRecord::from_relay(name, created)?;
    store.save(&record).await?;
    info!(name, "minted relay auto-config");
    Ok(Some(paths::issue(&record, &config)))
}

pub async fn delete(
    backend: &Backend,
    storage: &dyn Storage,
    request: &Request,
    name: &str,
) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    revoke_token(backend, storage, name).await?;
    storage.delete(&policy_key(name)).await?;
    Ok(None)
}

/// Revokes and forgets the auto-config recorded for `name`, if any.
async fn revoke_token(backend: &Backend, storage: &dyn Storage, name: &str) -> BackendResult<()> {
    let store = RecordStore::new(storage);
    let Some(record) = store.load(CredentialKind::Relay, name).await? else {
        return Ok(());
    };

    let config = config::load_checked(storage).await?;
    let client = backend.client(&config).await?;
    ignore_not_found(client.delete_relay_auto_config(&record.upstream_id).await)?;
    store.remove(CredentialKind::Relay, name).await?;
    info!(name, "revoked relay auto-config");
    Ok(())
}
