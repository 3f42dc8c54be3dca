//! LaunchDarkly REST client for the ldvault secrets engine.
//!
//! Provides the upstream calls the engine needs:
//! - API access tokens (create, reset, delete)
//! - Relay Proxy auto-config tokens (create, delete)
//! - Project lookup and environment SDK/mobile key rotation
//! - Rate-limit aware retries driven by `X-RateLimit-Reset`

pub mod api_client;
pub mod backoff;
pub mod config;
pub mod error;
pub mod types;

pub use api_client::LaunchDarklyClient;
pub use backoff::RetryPolicy;
pub use config::{AuthMode, ClientConfig};
pub use error::{ApiError, ApiResult};
pub use types::*;
