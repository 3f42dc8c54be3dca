//! Route table.
//!
//! | Path | Operations |
//! |---|---|
//! | `info` | read |
//! | `config` | read, create, update |
//! | `role` | list |
//! | `role/<customrole>` | read, delete |
//! | `role/<customrole>/reset` | read |
//! | `relay/policy` | create, update |
//! | `relay/<name>` | read, delete |
//! | `project/<project>/<env>` | read |
//! | `project/<project>/<env>/reset/<mobile\|sdk>` | read |
//! | `coderefs/<project>` | read, delete |
//!
//! Path parameters are LaunchDarkly keys: word characters, with `-`, `.`
//! and `_` allowed between the first and last character. They are matched
//! case-insensitively and handed to handlers lower-cased.

use crate::error::{BackendError, BackendResult};
use crate::request::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which environment key a reset rotates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    Mobile,
    Sdk,
}

impl FromStr for KeyType {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mobile" => Ok(KeyType::Mobile),
            "sdk" => Ok(KeyType::Sdk),
            _ => Err(BackendError::Validation(format!(
                "reset type must be sdk or mobile, got {s:?}"
            ))),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Mobile => write!(f, "mobile"),
            KeyType::Sdk => write!(f, "sdk"),
        }
    }
}

/// A resolved request path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Info,
    Config,
    Roles,
    Role { custom_role: String },
    RoleReset { custom_role: String },
    RelayPolicy,
    Relay { name: String },
    ProjectEnv { project: String, env: String },
    ProjectEnvReset { project: String, env: String, key_type: KeyType },
    CodeRefs { project: String },
}

impl Route {
    /// Resolves `path` for `operation`, rejecting unknown paths and
    /// operations the path does not support.
    pub fn resolve(operation: Operation, path: &str) -> BackendResult<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let route = match segments.as_slice() {
            ["info"] => Route::Info,
            ["config"] => Route::Config,
            ["role"] => Route::Roles,
            ["role", role] => Route::Role {
                custom_role: key_segment("customrole", role)?,
            },
            ["role", role, "reset"] => Route::RoleReset {
                custom_role: key_segment("customrole", role)?,
            },
            // `relay/policy` is the policy-write path; reads and deletes of
            // `relay/policy` address a relay named "policy".
            ["relay", "policy"] if matches!(operation, Operation::Create | Operation::Update) => {
                Route::RelayPolicy
            }
            ["relay", name] => Route::Relay {
                name: key_segment("name", name)?,
            },
            ["project", project, env] => Route::ProjectEnv {
                project: key_segment("project", project)?,
                env: key_segment("env", env)?,
            },
            ["project", project, env, "reset", key_type] => Route::ProjectEnvReset {
                project: key_segment("project", project)?,
                env: key_segment("env", env)?,
                key_type: key_type.parse()?,
            },
            ["coderefs", project] => Route::CodeRefs {
                project: key_segment("project", project)?,
            },
            _ => return Err(BackendError::UnsupportedPath(path.to_string())),
        };

        if !route.operations().contains(&operation) {
            return Err(BackendError::UnsupportedOperation {
                operation,
                path: path.to_string(),
            });
        }
        Ok(route)
    }

    /// Operations this route accepts.
    pub fn operations(&self) -> &'static [Operation] {
        use Operation::*;
        match self {
            Route::Info => &[Read],
            Route::Config => &[Read, Create, Update],
            Route::Roles => &[List],
            Route::Role { .. } => &[Read, Delete],
            Route::RoleReset { .. } => &[Read],
            Route::RelayPolicy => &[Create, Update],
            Route::Relay { .. } => &[Read, Delete],
            Route::ProjectEnv { .. } => &[Read],
            Route::ProjectEnvReset { .. } => &[Read],
            Route::CodeRefs { .. } => &[Read, Delete],
        }
    }
}

/// Validates a LaunchDarkly key path parameter and lower-cases it.
pub fn key_segment(field: &str, raw: &str) -> BackendResult<String> {
    if is_ld_key(raw) {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err(BackendError::Validation(format!(
            "{field} {raw:?} is not a valid key"
        )))
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `\w(([\w-._]+)?\w)?`
fn is_ld_key(s: &str) -> bool {
    let mut chars = s.chars();
    let (Some(first), last) = (chars.next(), s.chars().last()) else {
        return false;
    };
    if !is_word(first) || !last.is_some_and(is_word) {
        return false;
    }
    s.chars().all(|c| is_word(c) || c == '-' || c == '.')
}
