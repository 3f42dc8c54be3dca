#![allow(dead_code)]

use ldvault_backend::{
    Backend, BackendOptions, BackendResult, InMemoryStorage, Operation, Request, Response,
};
use ldvault_client::RetryPolicy;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "api-test-token";

pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        jitter_min: Duration::from_millis(1),
        jitter_max: Duration::from_millis(2),
        max_sleep: Duration::from_millis(200),
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A backend wired to a fake LaunchDarkly API and fresh storage.
pub struct TestEnv {
    pub server: MockServer,
    pub backend: Backend,
    pub storage: InMemoryStorage,
}

impl TestEnv {
    pub async fn new() -> Self {
        init_tracing();
        let options = BackendOptions {
            retry: fast_retry(3),
            ..BackendOptions::default()
        };
        Self {
            server: MockServer::start().await,
            backend: Backend::with_options(options),
            storage: InMemoryStorage::new(),
        }
    }

    /// A `TestEnv` whose config already points at the mock server.
    pub async fn configured() -> Self {
        let env = Self::new().await;
        env.configure().await;
        env
    }

    pub async fn configure(&self) {
        self.write(
            "config",
            json!({ "access_token": ACCESS_TOKEN, "base_uri": self.server.uri() }),
        )
        .await
        .expect("config write");
    }

    pub async fn handle(&self, request: Request) -> BackendResult<Option<Response>> {
        self.backend.handle_request(&self.storage, &request).await
    }

    pub async fn read(&self, path: &str) -> BackendResult<Option<Response>> {
        self.handle(Request::new(Operation::Read, path)).await
    }

    pub async fn read_with(&self, path: &str, data: Value) -> BackendResult<Option<Response>> {
        self.handle(with_data(Request::new(Operation::Read, path), data))
            .await
    }

    pub async fn write(&self, path: &str, data: Value) -> BackendResult<Option<Response>> {
        self.handle(with_data(Request::new(Operation::Update, path), data))
            .await
    }

    pub async fn create(&self, path: &str, data: Value) -> BackendResult<Option<Response>> {
        self.handle(with_data(Request::new(Operation::Create, path), data))
            .await
    }

    pub async fn delete(&self, path: &str) -> BackendResult<Option<Response>> {
        self.handle(Request::new(Operation::Delete, path)).await
    }

    pub async fn list(&self, path: &str) -> BackendResult<Option<Response>> {
        self.handle(Request::new(Operation::List, path)).await
    }
}

fn with_data(mut request: Request, data: Value) -> Request {
    if let Value::Object(map) = data {
        request.data = map;
    }
    request
}

pub fn token_json(id: &str, token: &str) -> Value {
    json!({
        "_id": id,
        "name": "vault-generated",
        "token": token,
        "serviceToken": true,
        "creationDate": 1700000000000i64
    })
}

pub fn relay_json(id: &str, full_key: &str) -> Value {
    json!({
        "_id": id,
        "name": "foo",
        "policy": [],
        "fullKey": full_key,
        "displayKey": &full_key[full_key.len().saturating_sub(4)..],
        "creationDate": 1700000000000i64
    })
}

pub fn environment_json(id: &str, key: &str, sdk: &str, mobile: &str) -> Value {
    json!({
        "_id": id,
        "key": key,
        "name": key,
        "apiKey": sdk,
        "mobileKey": mobile,
        "color": "417505"
    })
}

/// The token a successful response carries.
pub fn token_of(response: &Option<Response>) -> String {
    response
        .as_ref()
        .and_then(|r| r.get_str("token"))
        .expect("response carries a token")
        .to_string()
}
