//! Request and response envelopes exchanged with the host.

use crate::error::{BackendError, BackendResult};
use crate::lease::Secret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Operation the host is performing on a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::List => write!(f, "list"),
        }
    }
}

/// Typed request body for a path.
///
/// `FIELDS` lists every accepted key; anything else in the request data is
/// rejected before deserialization.
pub trait FieldSet: DeserializeOwned {
    const FIELDS: &'static [&'static str];
}

/// For paths that take no request data.
#[derive(Debug, Default, Deserialize)]
pub struct NoFields {}

impl FieldSet for NoFields {
    const FIELDS: &'static [&'static str] = &[];
}

/// A request routed to the backend by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub operation: Operation,
    pub path: String,
    pub data: Map<String, Value>,
}

impl Request {
    pub fn new(operation: Operation, path: impl Into<String>) -> Self {
        Self {
            operation,
            path: path.into(),
            data: Map::new(),
        }
    }

    /// Adds one field to the request data.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Validates that only known fields were sent, then decodes them.
    pub fn fields<T: FieldSet>(&self) -> BackendResult<T> {
        let mut unknown: Vec<String> = self
            .data
            .keys()
            .filter(|k| !T::FIELDS.contains(&k.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(BackendError::UnknownFields(unknown));
        }

        serde_json::from_value(Value::Object(self.data.clone()))
            .map_err(|e| BackendError::Validation(format!("invalid request data: {e}")))
    }
}

/// Response handed back to the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    pub data: Map<String, Value>,
    /// Present when the response carries a leased credential.
    pub secret: Option<Secret>,
}

impl Response {
    pub fn from_data(data: Map<String, Value>) -> Self {
        Self { data, secret: None }
    }

    /// Builds a response from any value serializing to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> BackendResult<Self> {
        match serde_json::to_value(value)? {
            Value::Object(data) => Ok(Self::from_data(data)),
            other => Err(BackendError::Validation(format!(
                "response data must be an object, got {other}"
            ))),
        }
    }

    /// Wraps a secret: its public data becomes the response data.
    pub fn from_secret(secret: Secret) -> Self {
        Self {
            data: secret.data.clone(),
            secret: Some(secret),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}
