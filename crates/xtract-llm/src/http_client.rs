//! Shared HTTP client for HTTP-based LLM providers
//!
//! One `reqwest::Client` is built per backend and reused for every invocation so
//! concurrent field pipelines share a connection pool. Requests are sent exactly
//! once: a failed call fails its field.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

use xtract_utils::redaction::redact_error_message;

use crate::LlmError;

/// Upper bound applied to any per-invocation timeout
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(600);

/// Connect timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Client,
    max_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    /// Create a new HTTP client with a custom maximum timeout
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            max_timeout,
        })
    }

    /// Start a POST request on the shared client
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send a request once, applying `min(request_timeout, max_timeout)`.
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403
    /// - `LlmError::ProviderQuota` for 429
    /// - `LlmError::ProviderOutage` for 5xx
    /// - `LlmError::Transport` for other 4xx and network errors
    /// - `LlmError::Timeout` when the deadline passes
    pub async fn execute(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = self.effective_timeout(request_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("Failed to build request: {e}")))?;

        debug!(
            provider = provider_name,
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| map_transport_error(&e, effective_timeout, provider_name))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(map_client_error(status, provider_name));
        }
        if status.is_server_error() {
            return Err(LlmError::ProviderOutage(format!(
                "{provider_name} returned server error: {status}"
            )));
        }

        Ok(response)
    }

    pub fn effective_timeout(&self, request_timeout: Duration) -> Duration {
        request_timeout.min(self.max_timeout)
    }
}

/// Map a `reqwest` failure (send or body read) to an `LlmError`
pub(crate) fn map_transport_error(
    error: &reqwest::Error,
    timeout: Duration,
    provider_name: &str,
) -> LlmError {
    if error.is_timeout() {
        return LlmError::Timeout { duration: timeout };
    }
    LlmError::Transport(format!(
        "{provider_name} request failed: {}",
        redact_error_message(&error.to_string())
    ))
}

/// Map HTTP client error status codes to LlmError variants
///
/// - 401/403 → `LlmError::ProviderAuth`
/// - 429 → `LlmError::ProviderQuota`
/// - Other 4xx → `LlmError::Transport`
fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(format!(
            "{provider_name} authentication failed: {status}"
        )),
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        _ => LlmError::Transport(format!(
            "{provider_name} returned client error: {status}"
        )),
    }
}
