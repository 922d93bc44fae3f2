//! Shared HTTP client infrastructure for HTTP-based LLM providers
//!
//! This module provides a shared `reqwest::Client` configured once per gateway,
//! with timeout and retry policies for reliable HTTP communication with LLM providers.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use rfpgen_utils::error::LlmError;
use rfpgen_utils::redaction::redact_secrets;

/// Default maximum HTTP timeout (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of retry attempts for 5xx and network failures
const MAX_RETRIES: u32 = 2;

/// Initial backoff duration for retries (1 second)
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Longest slice of an error body carried into error messages
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Error-body markers that identify an unknown or unserved model
const MODEL_UNAVAILABLE_MARKERS: [&str; 4] = [
    "model_not_found",
    "does not exist",
    "not_found_error",
    "model not exist",
];

/// Sampling parameters sent with every request of one backend
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&rfpgen_config::ProviderSettings> for HttpParams {
    fn from(settings: &rfpgen_config::ProviderSettings) -> Self {
        Self {
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }
}

/// Shared HTTP client for LLM providers
///
/// This client is configured once and reused across all HTTP-based
/// LLM backend invocations. It provides:
/// - Connection reuse
/// - Per-request timeouts capped by a global maximum
/// - Retry with linear backoff for server and network failures
#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
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
                LlmError::Misconfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    /// Start a POST request on the shared connection pool
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Execute an HTTP request with timeout and retry policy
    ///
    /// This method implements:
    /// - Per-request timeout: `min(request_timeout, global_max_http_timeout)`
    /// - Retry policy: up to 2 retries for 5xx and network failures
    /// - Linear backoff: 1s, 2s
    /// - No retries for 4xx errors
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for various failure scenarios:
    /// - `LlmError::ProviderAuth` for 401/403 errors
    /// - `LlmError::ProviderQuota` for 429 errors
    /// - `LlmError::ModelUnavailable` for 404 and model-not-found bodies
    /// - `LlmError::ProviderOutage` for 5xx errors (after retries)
    /// - `LlmError::Timeout` for timeouts
    /// - `LlmError::Transport` for network errors (after retries)
    pub async fn execute_with_retry(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| {
                    LlmError::Transport("Failed to clone request for retry".to_string())
                })?
                .timeout(effective_timeout)
                .build()
                .map_err(|e| LlmError::Transport(format!("Failed to build request: {}", e)))?;

            debug!(
                provider = provider_name,
                attempt = attempt,
                timeout_secs = effective_timeout.as_secs(),
                "Executing HTTP request"
            );

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_client_error() {
                        // The body decides between "unknown model" and other 4xx failures
                        let body = response.text().await.unwrap_or_default();
                        return Err(map_client_error(status, &body, provider_name));
                    }

                    if status.is_server_error() {
                        if attempt <= MAX_RETRIES {
                            warn!(
                                provider = provider_name,
                                attempt = attempt,
                                status = status.as_u16(),
                                "Server error, will retry"
                            );
                            tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                            continue;
                        }

                        return Err(LlmError::ProviderOutage(format!(
                            "{} returned server error: {}",
                            provider_name, status
                        )));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(LlmError::Timeout {
                            duration: effective_timeout,
                        });
                    }

                    if attempt <= MAX_RETRIES {
                        warn!(
                            provider = provider_name,
                            attempt = attempt,
                            error = %redact_secrets(&e.to_string()),
                            "Network error, will retry"
                        );
                        tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                        continue;
                    }

                    return Err(LlmError::Transport(format!(
                        "{} request failed: {}",
                        provider_name,
                        redact_secrets(&e.to_string())
                    )));
                }
            }
        }
    }
}

fn body_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    let excerpt: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    redact_secrets(&excerpt)
}

fn names_missing_model(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    MODEL_UNAVAILABLE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Map HTTP client error status codes to LlmError variants
///
/// - 401/403 → `LlmError::ProviderAuth`
/// - 429 → `LlmError::ProviderQuota`
/// - 404, or 400/422 whose body names a missing model → `LlmError::ModelUnavailable`
/// - Other 4xx → `LlmError::Transport`
pub(crate) fn map_client_error(status: StatusCode, body: &str, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(format!(
            "{} authentication failed: {}",
            provider_name, status
        )),
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{} rate limit exceeded: {}", provider_name, status))
        }
        StatusCode::NOT_FOUND => LlmError::ModelUnavailable(format!(
            "{} returned {}: {}",
            provider_name,
            status,
            body_excerpt(body)
        )),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY if names_missing_model(body) => {
            LlmError::ModelUnavailable(format!(
                "{} rejected the model: {}",
                provider_name,
                body_excerpt(body)
            ))
        }
        _ => LlmError::Transport(format!(
            "{} returned client error: {}: {}",
            provider_name,
            status,
            body_excerpt(body)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_construction() {
        let client = HttpClient::new();
        assert!(client.is_ok(), "Should construct HTTP client successfully");
    }

    #[test]
    fn test_http_client_with_custom_timeout() {
        let custom_timeout = Duration::from_secs(60);
        let client = HttpClient::with_max_timeout(custom_timeout).unwrap();
        assert_eq!(client.max_timeout, custom_timeout);
    }

    #[test]
    fn test_map_401_and_403_to_provider_auth() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            match map_client_error(status, "", "test-provider") {
                LlmError::ProviderAuth(msg) => {
                    assert!(msg.contains("test-provider"));
                    assert!(msg.contains(status.as_str()));
                }
                other => panic!("Expected ProviderAuth for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_map_429_to_provider_quota() {
        let error = map_client_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":"insufficient_quota"}}"#,
            "openai",
        );
        match error {
            LlmError::ProviderQuota(msg) => assert!(msg.contains("rate limit")),
            other => panic!("Expected ProviderQuota for 429, got {other:?}"),
        }
    }

    #[test]
    fn test_map_404_to_model_unavailable() {
        let body = r#"{"type":"error","error":{"type":"not_found_error","message":"model: claude-9"}}"#;
        match map_client_error(StatusCode::NOT_FOUND, body, "anthropic") {
            LlmError::ModelUnavailable(msg) => {
                assert!(msg.contains("anthropic"));
                assert!(msg.contains("claude-9"));
            }
            other => panic!("Expected ModelUnavailable for 404, got {other:?}"),
        }
    }

    #[test]
    fn test_map_400_with_model_marker_to_model_unavailable() {
        let openai = r#"{"error":{"message":"The model `gpt-9` does not exist","code":"model_not_found"}}"#;
        assert!(matches!(
            map_client_error(StatusCode::BAD_REQUEST, openai, "openai"),
            LlmError::ModelUnavailable(_)
        ));

        let deepseek = r#"{"error":{"message":"Model Not Exist","type":"invalid_request_error"}}"#;
        assert!(matches!(
            map_client_error(StatusCode::BAD_REQUEST, deepseek, "deepseek"),
            LlmError::ModelUnavailable(_)
        ));
    }

    #[test]
    fn test_map_other_4xx_to_transport() {
        let error = map_client_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"max_tokens is too large"}}"#,
            "test-provider",
        );
        match error {
            LlmError::Transport(msg) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("client error"));
                assert!(msg.contains("max_tokens"));
            }
            other => panic!("Expected Transport for 400, got {other:?}"),
        }

        assert!(matches!(
            map_client_error(StatusCode::UNPROCESSABLE_ENTITY, "", "test-provider"),
            LlmError::Transport(_)
        ));
    }

    #[test]
    fn test_error_body_is_truncated_and_redacted() {
        let key = "sk-abcdefghijklmnopqrstuvwxyz0123456789";
        let body = format!("invalid request for key {key} {}", "x".repeat(500));
        let msg = map_client_error(StatusCode::BAD_REQUEST, &body, "openai").to_string();
        assert!(!msg.contains(key));
        assert!(msg.len() < 400);
    }
}
