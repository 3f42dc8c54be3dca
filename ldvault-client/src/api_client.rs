//! HTTP client for the LaunchDarkly v2 REST API.
//!
//! Every call is authenticated with the configured access token and routed
//! through [`send_with_backoff`], so rate-limited responses are retried the
//! same way no matter which endpoint produced them.

use crate::backoff::{RetryPolicy, send_with_backoff};
use crate::config::{API_VERSION, AuthMode, ClientConfig};
use crate::error::{ApiError, ApiResult};
use crate::types::*;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tracing::debug;

const USER_AGENT: &str = concat!("ldvault/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one LaunchDarkly host and access token.
pub struct LaunchDarklyClient {
    client: Client,
    base_path: String,
    authorization: HeaderValue,
    retry: RetryPolicy,
}

impl LaunchDarklyClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("LD-API-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        let credential = match config.auth_mode {
            AuthMode::ApiKey => config.access_token.clone(),
            AuthMode::OAuth => format!("Bearer {}", config.access_token),
        };
        let mut authorization = HeaderValue::from_str(&credential)
            .map_err(|e| ApiError::InvalidHeader(format!("access token: {e}")))?;
        authorization.set_sensitive(true);

        Ok(Self {
            client,
            base_path: config.api_base_path(),
            authorization,
            retry: config.retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }

    /// Sends an authenticated request with rate-limit backoff and turns any
    /// non-success status into [`ApiError::Upstream`].
    async fn dispatch<F>(&self, operation: &str, build: F) -> ApiResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let resp = send_with_backoff(&self.retry, operation, || {
            build()
                .header(AUTHORIZATION, self.authorization.clone())
                .send()
        })
        .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(operation, error = %e, "failed to read LaunchDarkly error body");
                String::new()
            }
        };
        debug!(operation, status = status.as_u16(), "LaunchDarkly API returned an error");
        Err(ApiError::Upstream {
            status: status.as_u16(),
            body,
        })
    }

    async fn auth_get(&self, operation: &str, path: &str) -> ApiResult<Response> {
        let url = self.url(path);
        self.dispatch(operation, || self.client.get(&url)).await
    }

    async fn auth_post(
        &self,
        operation: &str,
        path: &str,
        body: &impl Serialize,
    ) -> ApiResult<Response> {
        let url = self.url(path);
        self.dispatch(operation, || self.client.post(&url).json(body))
            .await
    }

    async fn auth_post_query(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Response> {
        let url = self.url(path);
        self.dispatch(operation, || self.client.post(&url).query(query))
            .await
    }

    async fn auth_delete(&self, operation: &str, path: &str) -> ApiResult<Response> {
        let url = self.url(path);
        self.dispatch(operation, || self.client.delete(&url)).await
    }

    // ── Access tokens ──

    pub async fn create_token(&self, body: &TokenBody) -> ApiResult<Token> {
        let resp = self.auth_post("create_token", "/tokens", body).await?;
        Ok(resp.json().await?)
    }

    /// Rotates a token's secret. With `expiry`, the previous secret keeps
    /// working until that instant; without it, it stops working immediately.
    pub async fn reset_token(&self, id: &str, expiry: Option<DateTime<Utc>>) -> ApiResult<Token> {
        let query: Vec<(&str, String)> = expiry
            .map(|at| vec![("expiry", at.timestamp_millis().to_string())])
            .unwrap_or_default();
        let resp = self
            .auth_post_query("reset_token", &format!("/tokens/{id}/reset"), &query)
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn delete_token(&self, id: &str) -> ApiResult<()> {
        self.auth_delete("delete_token", &format!("/tokens/{id}"))
            .await?;
        Ok(())
    }

    // ── Relay Proxy auto-configs ──

    pub async fn create_relay_auto_config(
        &self,
        body: &RelayAutoConfigBody,
    ) -> ApiResult<RelayAutoConfig> {
        let resp = self
            .auth_post("create_relay_auto_config", "/account/relay-auto-configs", body)
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn delete_relay_auto_config(&self, id: &str) -> ApiResult<()> {
        self.auth_delete(
            "delete_relay_auto_config",
            &format!("/account/relay-auto-configs/{id}"),
        )
        .await?;
        Ok(())
    }

    // ── Projects & environments ──

    pub async fn get_project(&self, project_key: &str) -> ApiResult<Project> {
        let resp = self
            .auth_get("get_project", &format!("/projects/{project_key}"))
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn reset_environment_sdk_key(
        &self,
        project_key: &str,
        env_key: &str,
    ) -> ApiResult<Environment> {
        let resp = self
            .auth_post_query(
                "reset_environment_sdk_key",
                &format!("/projects/{project_key}/environments/{env_key}/apiKey"),
                &[],
            )
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn reset_environment_mobile_key(
        &self,
        project_key: &str,
        env_key: &str,
    ) -> ApiResult<Environment> {
        let resp = self
            .auth_post_query(
                "reset_environment_mobile_key",
                &format!("/projects/{project_key}/environments/{env_key}/mobileKey"),
                &[],
            )
            .await?;
        Ok(resp.json().await?)
    }
}
