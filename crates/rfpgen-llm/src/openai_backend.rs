//! OpenAI-compatible HTTP backend implementation
//!
//! Serves both OpenAI and DeepSeek, which expose the same chat-completions
//! request and response shape behind different endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rfpgen_config::{ApiKey, ProviderSettings};
use rfpgen_utils::error::LlmError;
use rfpgen_utils::types::ProviderId;

use crate::http_client::{HttpClient, HttpParams};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

/// Default OpenAI API endpoint
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default DeepSeek API endpoint
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// OpenAI-compatible backend configuration
#[derive(Clone)]
pub(crate) struct OpenAiCompatibleBackend {
    client: HttpClient,
    provider_name: &'static str,
    base_url: String,
    api_key: ApiKey,
    default_model: String,
    params: HttpParams,
}

impl OpenAiCompatibleBackend {
    /// Create a backend for `provider`, which must speak the chat-completions API
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` for providers without an
    /// OpenAI-compatible endpoint.
    pub fn new(
        provider: ProviderId,
        client: HttpClient,
        api_key: ApiKey,
        settings: &ProviderSettings,
    ) -> Result<Self, LlmError> {
        let default_url = match provider {
            ProviderId::OpenAi => OPENAI_BASE_URL,
            ProviderId::DeepSeek => DEEPSEEK_BASE_URL,
            ProviderId::Anthropic => {
                return Err(LlmError::Misconfiguration(
                    "anthropic does not serve the chat-completions API".to_string(),
                ));
            }
        };

        Ok(Self {
            client,
            provider_name: provider.as_str(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| default_url.to_string()),
            api_key,
            default_model: settings.model.clone(),
            params: HttpParams::from(settings),
        })
    }

    fn resolve_model(&self, inv: &LlmInvocation) -> String {
        if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        }
    }

    /// Convert messages to OpenAI-compatible format
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = self.resolve_model(&inv);

        debug!(
            provider = self.provider_name,
            route = %inv.route,
            model = %model,
            max_tokens = self.params.max_tokens,
            temperature = self.params.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking chat-completions backend"
        );

        let request_body = ChatRequest {
            model: model.clone(),
            messages: Self::convert_messages(&inv.messages),
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
            stream: false,
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, self.provider_name)
            .await?;

        let response_body: ChatResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!(
                "Failed to parse {} response: {}",
                self.provider_name, e
            ))
        })?;

        let content = extract_content(&response_body).ok_or_else(|| {
            LlmError::EmptyResponse(format!(
                "{} response missing content in choices[0]",
                self.provider_name
            ))
        })?;

        let mut result = LlmResult::new(content, self.provider_name, model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = self.provider_name,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Chat-completions invocation completed"
        );

        Ok(result)
    }
}

fn extract_content(response: &ChatResponse) -> Option<String> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .filter(|content| !content.trim().is_empty())
}

/// OpenAI-compatible message format for requests
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI-compatible message format for responses
#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat-completions request body
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// Chat-completions response body
#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChatResponseMessage,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn settings(base_url: Option<&str>) -> ProviderSettings {
        ProviderSettings {
            model: "deepseek-chat".to_string(),
            fallback_model: None,
            base_url: base_url.map(str::to_string),
            max_tokens: 4000,
            temperature: 0.2,
        }
    }

    #[test]
    fn test_default_endpoints_per_provider() {
        let client = HttpClient::new().unwrap();
        let openai = OpenAiCompatibleBackend::new(
            ProviderId::OpenAi,
            client.clone(),
            ApiKey::new("k"),
            &settings(None),
        )
        .unwrap();
        assert_eq!(openai.base_url, OPENAI_BASE_URL);

        let deepseek = OpenAiCompatibleBackend::new(
            ProviderId::DeepSeek,
            client,
            ApiKey::new("k"),
            &settings(None),
        )
        .unwrap();
        assert_eq!(deepseek.base_url, DEEPSEEK_BASE_URL);
        assert_eq!(deepseek.provider_name, "deepseek");
    }

    #[test]
    fn test_base_url_override() {
        let backend = OpenAiCompatibleBackend::new(
            ProviderId::OpenAi,
            HttpClient::new().unwrap(),
            ApiKey::new("k"),
            &settings(Some("http://localhost:9000/v1/chat/completions")),
        )
        .unwrap();
        assert_eq!(backend.base_url, "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_anthropic_is_rejected() {
        let result = OpenAiCompatibleBackend::new(
            ProviderId::Anthropic,
            HttpClient::new().unwrap(),
            ApiKey::new("k"),
            &settings(None),
        );
        assert!(matches!(result, Err(LlmError::Misconfiguration(_))));
    }

    #[test]
    fn test_convert_messages_keeps_roles() {
        let messages = vec![
            Message::new(Role::System, "You are a helpful assistant"),
            Message::new(Role::User, "Hello"),
            Message::new(Role::Assistant, "Hi there!"),
        ];

        let converted = OpenAiCompatibleBackend::convert_messages(&messages);

        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].role, "assistant");
        assert_eq!(converted[2].content, "Hi there!");
    }

    #[test]
    fn test_extract_content_reads_first_choice() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Our platform supports SSO."}}],
                "usage":{"prompt_tokens":12,"completion_tokens":5}}"#,
        )
        .unwrap();
        assert_eq!(
            extract_content(&body).as_deref(),
            Some("Our platform supports SSO.")
        );

        let blank: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"   "}}]}"#,
        )
        .unwrap();
        assert!(extract_content(&blank).is_none());

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_content(&empty).is_none());
    }
}
