//! Wire types for the LaunchDarkly v2 REST API.
//!
//! LaunchDarkly speaks camelCase JSON and identifies resources with `_id`.
//! Response structs default every field they can, since the API omits
//! fields depending on the caller's permissions and the API version.

use serde::{Deserialize, Serialize};

/// API version pinned on service tokens minted for code references.
pub const CODE_REFS_API_VERSION: i32 = 20191212;

/// One statement of a LaunchDarkly policy (custom role or inline role).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_actions: Vec<String>,
    pub effect: String,
}

impl Statement {
    /// Allows every action on a single resource.
    pub fn allow_all(resource: impl Into<String>) -> Self {
        Self {
            resources: vec![resource.into()],
            actions: vec!["*".to_string()],
            effect: "allow".to_string(),
            ..Self::default()
        }
    }
}

/// Request body for `POST /tokens`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBody {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_role_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inline_role: Vec<Statement>,
    pub service_token: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_api_version: Option<i32>,
}

impl TokenBody {
    /// A service token scoped to one existing custom role.
    pub fn for_custom_role(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            custom_role_ids: vec![role.into()],
            service_token: true,
            ..Self::default()
        }
    }

    /// A service token with full access to one code-reference repository.
    pub fn for_code_refs(project: &str) -> Self {
        Self {
            name: project.to_string(),
            inline_role: vec![Statement::allow_all(format!(
                "code-reference-repository/{project}"
            ))],
            service_token: true,
            default_api_version: Some(CODE_REFS_API_VERSION),
            ..Self::default()
        }
    }
}

/// An API access token. `token` is only populated on create and reset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub custom_role_ids: Vec<String>,
    #[serde(default)]
    pub inline_role: Vec<Statement>,
    #[serde(default)]
    pub service_token: bool,
    #[serde(default)]
    pub creation_date: Option<i64>,
}

/// Request body for `POST /account/relay-auto-configs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelayAutoConfigBody {
    pub name: String,
    pub policy: Vec<Statement>,
}

/// A Relay Proxy auto-config. `full_key` is only populated on create.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayAutoConfig {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub policy: Vec<Statement>,
    #[serde(default)]
    pub full_key: String,
    #[serde(default)]
    pub display_key: String,
    #[serde(default)]
    pub creation_date: Option<i64>,
}

/// A project with its environments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub environments: Vec<Environment>,
}

impl Project {
    /// First environment whose key equals `key`, ignoring ASCII case.
    pub fn environment(&self, key: &str) -> Option<&Environment> {
        self.environments
            .iter()
            .find(|env| env.key.eq_ignore_ascii_case(key))
    }
}

/// A project environment. `api_key` is the server-side SDK key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub mobile_key: String,
    #[serde(default)]
    pub color: String,
}
