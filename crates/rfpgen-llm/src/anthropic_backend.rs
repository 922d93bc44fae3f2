//! Anthropic HTTP backend implementation
//!
//! This module provides an HTTP-based LLM backend for Anthropic's Messages API,
//! which serves the Claude models through their native API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rfpgen_config::{ApiKey, ProviderSettings};
use rfpgen_utils::error::LlmError;

use crate::http_client::{HttpClient, HttpParams};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

/// Default Anthropic API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic backend configuration
#[derive(Clone)]
pub(crate) struct AnthropicBackend {
    client: HttpClient,
    base_url: String,
    api_key: ApiKey,
    default_model: String,
    params: HttpParams,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend bound to one route's settings
    ///
    /// `settings.base_url` overrides the public Messages endpoint.
    pub fn new(client: HttpClient, api_key: ApiKey, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model: settings.model.clone(),
            params: HttpParams::from(settings),
        }
    }

    fn resolve_model(&self, inv: &LlmInvocation) -> String {
        if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        }
    }

    /// Convert messages to Anthropic Messages API format
    ///
    /// Anthropic's API uses a `system` field for system prompts and a `messages` array
    /// for user/assistant messages. This function separates system messages from the
    /// conversation messages.
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_prompt: Option<String> = None;
        let mut anthropic_messages = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => {
                    // Concatenate multiple system messages if present
                    if let Some(existing) = system_prompt.as_mut() {
                        existing.push_str("\n\n");
                        existing.push_str(&msg.content);
                    } else {
                        system_prompt = Some(msg.content.clone());
                    }
                }
                Role::User | Role::Assistant => {
                    anthropic_messages.push(AnthropicMessage {
                        role: msg.role.as_str().to_string(),
                        content: msg.content.clone(),
                    });
                }
            }
        }

        (system_prompt, anthropic_messages)
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = self.resolve_model(&inv);

        debug!(
            provider = "anthropic",
            route = %inv.route,
            model = %model,
            max_tokens = self.params.max_tokens,
            temperature = self.params.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Anthropic backend"
        );

        let (system_prompt, anthropic_messages) = Self::convert_messages(&inv.messages);

        let request_body = AnthropicRequest {
            model: model.clone(),
            messages: anthropic_messages,
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
            system: system_prompt,
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "anthropic")
            .await?;

        let response_body: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse Anthropic response: {}", e))
        })?;

        // Concatenate all text segments
        let content: String = response_body
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse(
                "Anthropic response missing text content".to_string(),
            ));
        }

        let mut result = LlmResult::new(content, "anthropic", model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.input_tokens, usage.output_tokens);
        }

        debug!(
            provider = "anthropic",
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Anthropic invocation completed"
        );

        Ok(result)
    }
}

/// Anthropic message format for requests
#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic request body
#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

/// Anthropic response body
#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

/// Content block in Anthropic response
#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
