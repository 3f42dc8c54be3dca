//! Rate-limit backoff for upstream calls.
//!
//! On `429 Too Many Requests` LaunchDarkly sends `X-RateLimit-Reset`, the
//! epoch millisecond at which the rate-limit window reopens:
//! - **Reset in the future**: sleep until then
//! - **Reset missing or unparseable**: sleep a random 200-500ms
//! - **Reset already passed** (upstream clock skew): sleep the mirrored
//!   duration plus 200-500ms so the retry never spins
//!
//! After `max_retries` retries the last response is handed back untouched.

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Header carrying the reset time of the current rate-limit window.
pub const RATE_LIMIT_RESET_HEADER: &str = "X-RateLimit-Reset";

/// Retry settings for rate-limited calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. 0 disables retrying.
    pub max_retries: u32,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    /// Upper bound on a single sleep, whatever the header says.
    pub max_sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            jitter_min: Duration::from_millis(200),
            jitter_max: Duration::from_millis(500),
            max_sleep: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Draws a uniformly random duration in `[jitter_min, jitter_max]`.
    pub fn jitter(&self) -> Duration {
        let min = self.jitter_min.as_millis() as u64;
        let max = (self.jitter_max.as_millis() as u64).max(min);
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    /// Sleep before the next retry, given the reset header of a 429.
    pub fn sleep_for(&self, reset_header: Option<&str>, now: DateTime<Utc>) -> Duration {
        compute_sleep(reset_header, now, self.jitter()).min(self.max_sleep)
    }
}

/// Computes the sleep for a rate-limited response.
///
/// `reset_header` is the raw `X-RateLimit-Reset` value (epoch milliseconds).
/// A reset at or before `now` yields `|reset - now| + jitter`, which is never
/// shorter than `jitter`.
pub fn compute_sleep(reset_header: Option<&str>, now: DateTime<Utc>, jitter: Duration) -> Duration {
    let Some(reset_ms) = reset_header.and_then(|v| v.trim().parse::<i64>().ok()) else {
        debug!("could not parse {RATE_LIMIT_RESET_HEADER}, sleeping for a random interval");
        return jitter;
    };

    let delta_ms = reset_ms.saturating_sub(now.timestamp_millis());
    if delta_ms <= 0 {
        debug!(
            delta_ms,
            "negative rate limit reset duration, sleeping for an additional 200-500ms"
        );
        return Duration::from_millis(delta_ms.unsigned_abs()) + jitter;
    }
    Duration::from_millis(delta_ms as u64)
}

/// Sends a request, retrying while the API answers 429 and retries remain.
///
/// Transport errors are returned immediately. The final response, whatever
/// its status, is returned as-is for the caller to interpret.
pub async fn send_with_backoff<F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut send: F,
) -> Result<Response, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut resp = send().await?;
    let mut retries = 0;

    while resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < policy.max_retries {
        let reset = resp
            .headers()
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.to_str().ok());
        let delay = policy.sleep_for(reset, Utc::now());
        debug!(
            operation,
            attempt = retries + 1,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            "received 429 Too Many Requests, retrying"
        );
        tokio::time::sleep(delay).await;

        resp = send().await?;
        retries += 1;
    }

    Ok(resp)
}
