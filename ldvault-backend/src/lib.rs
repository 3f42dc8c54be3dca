//! LaunchDarkly secrets engine backend.
//!
//! Issues short-lived LaunchDarkly credentials on behalf of a secrets host:
//! - Custom-role service tokens (`role/<customrole>`)
//! - Relay Proxy auto-config tokens from stored policies (`relay/<name>`)
//! - Code-reference repository tokens (`coderefs/<project>`)
//! - Cached SDK/mobile key bundles per environment (`project/<project>/<env>`)
//!
//! The host owns storage, routing transport and lease scheduling. This crate
//! answers requests against a [`Storage`] view and exposes the renew/revoke
//! hooks for the secrets it hands out.

pub mod backend;
pub mod client_cache;
pub mod config;
pub mod error;
pub mod lease;
pub mod paths;
pub mod record;
pub mod request;
pub mod router;
pub mod storage;

pub use backend::{Backend, BackendOptions};
pub use config::EngineConfig;
pub use error::{BackendError, BackendResult};
pub use lease::{Lease, Secret};
pub use request::{Operation, Request, Response};
pub use storage::{InMemoryStorage, Storage, StorageEntry};
