//! HTTP similarity backend
//!
//! POSTs `{"text": ..., "k": ...}` to the configured endpoint and expects
//! `{"matches": [{category, requirement, response, label, score}, ...]}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use rfpgen_utils::error::RetrievalError;
use rfpgen_utils::redaction::redact_secrets;

use crate::types::{SimilarMatch, SimilarityBackend};

#[derive(Clone)]
pub struct HttpSimilarityBackend {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    text: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    matches: Vec<SimilarMatch>,
}

impl HttpSimilarityBackend {
    /// # Errors
    ///
    /// Returns `RetrievalError::Misconfiguration` for a non-http endpoint or
    /// when the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RetrievalError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(RetrievalError::Misconfiguration(format!(
                "similarity endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                RetrievalError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn parse_matches(body: &str) -> Result<Vec<SimilarMatch>, RetrievalError> {
    serde_json::from_str::<SearchResponse>(body)
        .map(|response| response.matches)
        .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl SimilarityBackend for HttpSimilarityBackend {
    async fn search(&self, text: &str, k: usize) -> Result<Vec<SimilarMatch>, RetrievalError> {
        debug!(endpoint = %self.endpoint, k, "Querying similarity backend");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SearchRequest { text, k })
            .send()
            .await
            .map_err(|e| RetrievalError::Unreachable(redact_secrets(&e.to_string())))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RetrievalError::Unreachable(format!(
                "similarity backend returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(RetrievalError::InvalidResponse(format!(
                "similarity backend returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RetrievalError::Unreachable(redact_secrets(&e.to_string())))?;
        parse_matches(&body)
    }
}
