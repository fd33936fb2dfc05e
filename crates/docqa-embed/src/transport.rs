//! JSON-over-HTTP transport to an Ollama server with explicit timeouts and a
//! bounded retry-with-backoff policy.
//!
//! Transport failures (connect errors, timeouts), 5xx and 429 responses are
//! retried; any other non-success status fails on the first attempt. Callers
//! map the final [`AttemptError`] onto their own provider error variant.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use docqa_core::config::OllamaSettings;
use docqa_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&OllamaSettings::default())
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptError {
    pub message: String,
    pub retryable: bool,
}

impl AttemptError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: true }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: false }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &OllamaSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
        }
    }

    /// Delay after the given (1-based) failed attempt: exponential, capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    pub async fn run<T, F, Fut>(&self, op: &str, mut attempt_fn: F) -> std::result::Result<T, AttemptError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut attempt = 1u32;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(e) if e.retryable && attempt < self.max_attempts => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        op,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e.message,
                        "provider call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(mut e) => {
                    if attempt > 1 {
                        e.message = format!("{} (after {} attempts)", e.message, attempt);
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Shared HTTP client for both provider endpoints. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OllamaTransport {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl OllamaTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base_url: base_url.into(), retry })
    }

    pub fn from_settings(settings: &OllamaSettings) -> Result<Self> {
        Self::new(
            settings.base_url.clone(),
            Duration::from_secs(settings.timeout_secs),
            RetryPolicy::from_settings(settings),
        )
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// POSTs `body` as JSON and decodes the JSON response, retrying per policy.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, AttemptError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned + Send,
    {
        let url = self.endpoint(path);
        let url = url.as_str();
        let client = &self.client;
        self.retry
            .run(path, move || async move {
                tracing::debug!(url, "provider request");
                let response = client
                    .post(url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| AttemptError::retryable(format!("request to {} failed: {}", url, e)))?;
                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    let message = format!("{} returned {}: {}", url, status, text.trim());
                    return Err(if is_retryable_status(status) {
                        AttemptError::retryable(message)
                    } else {
                        AttemptError::fatal(message)
                    });
                }
                response
                    .json::<R>()
                    .await
                    .map_err(|e| AttemptError::fatal(format!("invalid response from {}: {}", url, e)))
            })
            .await
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
