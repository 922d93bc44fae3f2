//! Provider gateway
//!
//! Routes a message list to the backend bound for a [`ProviderRoute`] and
//! normalizes every failure into a [`ProviderError`]. A route whose primary
//! model is reported unavailable is retried once with its fallback model; no
//! other failure is retried here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use rfpgen_config::{Config, Credentials, ProviderSettings};
use rfpgen_utils::error::{LlmError, ProviderError, ProviderErrorClass};
use rfpgen_utils::types::{ProviderId, ProviderRoute};

use crate::anthropic_backend::AnthropicBackend;
use crate::http_client::HttpClient;
use crate::openai_backend::OpenAiCompatibleBackend;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

/// Successful answer from one route
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub route: ProviderRoute,
    /// Trimmed, non-empty response text
    pub text: String,
    pub model_used: String,
    /// True when the primary model was unavailable and the fallback answered
    pub used_fallback: bool,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    pub elapsed: Duration,
}

/// Backend and models serving one route
#[derive(Clone)]
pub struct RouteBinding {
    backend: Arc<dyn LlmBackend>,
    model: String,
    fallback_model: Option<String>,
}

impl RouteBinding {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            fallback_model: None,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Uniform interface over the provider routes.
#[derive(Clone, Default)]
pub struct ProviderGateway {
    routes: HashMap<ProviderRoute, RouteBinding>,
    /// Routes that could not be bound, with the reason
    unavailable: HashMap<ProviderRoute, String>,
}

fn build_backend(
    provider: ProviderId,
    client: &HttpClient,
    credentials: &Credentials,
    settings: &ProviderSettings,
) -> Result<Arc<dyn LlmBackend>, String> {
    let api_key = credentials.api_key(provider).map_err(|e| e.to_string())?;
    let backend: Arc<dyn LlmBackend> = match provider {
        ProviderId::Anthropic => Arc::new(AnthropicBackend::new(client.clone(), api_key, settings)),
        ProviderId::OpenAi | ProviderId::DeepSeek => Arc::new(
            OpenAiCompatibleBackend::new(provider, client.clone(), api_key, settings)
                .map_err(|e| e.to_string())?,
        ),
    };
    Ok(backend)
}

impl ProviderGateway {
    /// An empty gateway; bind routes with [`with_route`](Self::with_route).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_route(mut self, route: ProviderRoute, binding: RouteBinding) -> Self {
        self.unavailable.remove(&route);
        self.routes.insert(route, binding);
        self
    }

    /// Bind the three provider routes and the synthesis route from configuration.
    ///
    /// A provider without a usable credential is left unbound; calls to it fail
    /// with [`ProviderErrorClass::Misconfigured`] while other routes keep working.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be built.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self, LlmError> {
        let client = HttpClient::new()?;
        let mut gateway = Self::new();

        let mut bind = |route: ProviderRoute, provider: ProviderId, settings: ProviderSettings| {
            match build_backend(provider, &client, credentials, &settings) {
                Ok(backend) => {
                    let mut binding = RouteBinding::new(backend, settings.model.clone());
                    binding.fallback_model = settings.fallback_model.clone();
                    debug!(route = %route, model = %settings.model, "Route bound");
                    gateway.routes.insert(route, binding);
                }
                Err(reason) => {
                    debug!(route = %route, reason = %reason, "Route left unbound");
                    gateway.unavailable.insert(route, reason);
                }
            }
        };

        for provider in ProviderId::all() {
            bind(
                ProviderRoute::from(provider),
                provider,
                config.provider_settings(provider),
            );
        }
        bind(
            ProviderRoute::Synthesis,
            config.synthesis_provider(),
            config.synthesis_settings(),
        );

        Ok(gateway)
    }

    #[must_use]
    pub fn is_bound(&self, route: ProviderRoute) -> bool {
        self.routes.contains_key(&route)
    }

    /// Send `messages` to `route`, finishing before `deadline`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ProviderError`]; deadline expiry is
    /// [`ProviderErrorClass::Timeout`] and a blank answer is
    /// [`ProviderErrorClass::EmptyResponse`].
    pub async fn invoke(
        &self,
        route: ProviderRoute,
        messages: &[Message],
        deadline: Instant,
    ) -> Result<ProviderReply, ProviderError> {
        let Some(binding) = self.routes.get(&route) else {
            let reason = self
                .unavailable
                .get(&route)
                .cloned()
                .unwrap_or_else(|| format!("no backend bound for route {route}"));
            return Err(ProviderError::new(ProviderErrorClass::Misconfigured, reason));
        };

        let started = Instant::now();
        let mut used_fallback = false;

        let outcome = match attempt(binding, route, &binding.model, messages, deadline).await {
            Err(LlmError::ModelUnavailable(reason)) => match &binding.fallback_model {
                Some(fallback) if fallback != &binding.model => {
                    warn!(
                        route = %route,
                        model = %binding.model,
                        fallback = %fallback,
                        reason = %reason,
                        "Model unavailable, retrying with fallback model"
                    );
                    used_fallback = true;
                    attempt(binding, route, fallback, messages, deadline).await
                }
                _ => Err(LlmError::ModelUnavailable(reason)),
            },
            other => other,
        };

        let elapsed = started.elapsed();
        let result = outcome.map_err(|err| {
            let err = ProviderError::from(err);
            debug!(
                route = %route,
                class = %err.class,
                elapsed_ms = elapsed.as_millis() as u64,
                "Provider call failed"
            );
            err
        })?;

        let text = result.raw_response.trim();
        if text.is_empty() {
            return Err(ProviderError::new(
                ProviderErrorClass::EmptyResponse,
                format!("{} returned no text", result.provider),
            ));
        }

        debug!(
            route = %route,
            model = %result.model_used,
            used_fallback,
            elapsed_ms = elapsed.as_millis() as u64,
            "Provider call succeeded"
        );

        Ok(ProviderReply {
            route,
            text: text.to_string(),
            model_used: result.model_used,
            used_fallback,
            tokens_input: result.tokens_input,
            tokens_output: result.tokens_output,
            elapsed,
        })
    }
}

async fn attempt(
    binding: &RouteBinding,
    route: ProviderRoute,
    model: &str,
    messages: &[Message],
    deadline: Instant,
) -> Result<LlmResult, LlmError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(LlmError::Timeout {
            duration: Duration::ZERO,
        });
    }

    let inv = LlmInvocation::new(route, model, remaining, messages.to_vec());
    match tokio::time::timeout_at(deadline, binding.backend.invoke(inv)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout {
            duration: remaining,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptStep, ScriptedBackend};

    fn deadline_in(duration: Duration) -> Instant {
        Instant::now() + duration
    }

    fn gateway_with(route: ProviderRoute, backend: &Arc<ScriptedBackend>) -> ProviderGateway {
        ProviderGateway::new().with_route(route, RouteBinding::new(backend.clone(), "gpt-4"))
    }

    #[tokio::test]
    async fn test_invoke_returns_trimmed_text() {
        let backend = Arc::new(ScriptedBackend::replying("openai", "  Answer X \n"));
        let gateway = gateway_with(ProviderRoute::OpenAi, &backend);

        let reply = gateway
            .invoke(
                ProviderRoute::OpenAi,
                &[Message::user("q")],
                deadline_in(Duration::from_secs(5)),
            )
            .await
            .unwrap();

        assert_eq!(reply.text, "Answer X");
        assert_eq!(reply.model_used, "gpt-4");
        assert!(!reply.used_fallback);
        assert_eq!(backend.calls()[0].invocation.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_model_unavailable_retries_fallback_once() {
        let backend = Arc::new(ScriptedBackend::new(
            "anthropic",
            vec![
                ScriptStep::ModelUnavailable,
                ScriptStep::Reply("from fallback".to_string()),
            ],
        ));
        let gateway = ProviderGateway::new().with_route(
            ProviderRoute::Anthropic,
            RouteBinding::new(backend.clone(), "claude-3-7-sonnet-20250219")
                .with_fallback("claude-3-5-sonnet-latest"),
        );

        let reply = gateway
            .invoke(
                ProviderRoute::Anthropic,
                &[Message::user("q")],
                deadline_in(Duration::from_secs(5)),
            )
            .await
            .unwrap();

        assert_eq!(reply.text, "from fallback");
        assert!(reply.used_fallback);
        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].model, "claude-3-7-sonnet-20250219");
        assert_eq!(calls[1].model, "claude-3-5-sonnet-latest");
    }

    #[tokio::test]
    async fn test_model_unavailable_without_fallback_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::failing(
            "openai",
            ScriptStep::ModelUnavailable,
        ));
        let gateway = gateway_with(ProviderRoute::OpenAi, &backend);

        let err = gateway
            .invoke(
                ProviderRoute::OpenAi,
                &[Message::user("q")],
                deadline_in(Duration::from_secs(5)),
            )
            .await
            .unwrap_err();

        assert_eq!(err.class, ProviderErrorClass::ModelUnavailable);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_auth_and_quota_are_not_retried() {
        for (step, class) in [
            (ScriptStep::AuthFailure, ProviderErrorClass::Auth),
            (ScriptStep::QuotaExceeded, ProviderErrorClass::Quota),
        ] {
            let backend = Arc::new(ScriptedBackend::failing("deepseek", step));
            let gateway = ProviderGateway::new().with_route(
                ProviderRoute::DeepSeek,
                RouteBinding::new(backend.clone(), "deepseek-chat").with_fallback("deepseek-v3"),
            );

            let err = gateway
                .invoke(
                    ProviderRoute::DeepSeek,
                    &[Message::user("q")],
                    deadline_in(Duration::from_secs(5)),
                )
                .await
                .unwrap_err();

            assert_eq!(err.class, class);
            assert_eq!(backend.call_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_deadline_maps_to_timeout() {
        let backend = Arc::new(ScriptedBackend::failing("openai", ScriptStep::Hang));
        let gateway = gateway_with(ProviderRoute::OpenAi, &backend);

        let err = gateway
            .invoke(
                ProviderRoute::OpenAi,
                &[Message::user("q")],
                deadline_in(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();

        assert_eq!(err.class, ProviderErrorClass::Timeout);
    }

    #[tokio::test]
    async fn test_expired_deadline_skips_backend() {
        let backend = Arc::new(ScriptedBackend::replying("openai", "late"));
        let gateway = gateway_with(ProviderRoute::OpenAi, &backend);

        let err = gateway
            .invoke(ProviderRoute::OpenAi, &[Message::user("q")], Instant::now())
            .await
            .unwrap_err();

        assert_eq!(err.class, ProviderErrorClass::Timeout);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_answer_is_empty_response() {
        let backend = Arc::new(ScriptedBackend::replying("openai", "   \n\t"));
        let gateway = gateway_with(ProviderRoute::OpenAi, &backend);

        let err = gateway
            .invoke(
                ProviderRoute::OpenAi,
                &[Message::user("q")],
                deadline_in(Duration::from_secs(5)),
            )
            .await
            .unwrap_err();

        assert_eq!(err.class, ProviderErrorClass::EmptyResponse);
    }

    #[tokio::test]
    async fn test_unbound_route_is_misconfigured() {
        let gateway = ProviderGateway::new();
        let err = gateway
            .invoke(
                ProviderRoute::Synthesis,
                &[Message::user("q")],
                deadline_in(Duration::from_secs(5)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.class, ProviderErrorClass::Misconfigured);
    }

    #[test]
    fn test_from_config_leaves_keyless_routes_unbound() {
        let config = Config::minimal_for_testing();
        let credentials = Credentials::from_pairs([(ProviderId::OpenAi, "sk-test")]);

        let gateway = ProviderGateway::from_config(&config, &credentials).unwrap();

        assert!(gateway.is_bound(ProviderRoute::OpenAi));
        assert!(gateway.is_bound(ProviderRoute::Synthesis));
        assert!(!gateway.is_bound(ProviderRoute::Anthropic));
        assert!(
            gateway
                .unavailable
                .get(&ProviderRoute::DeepSeek)
                .is_some_and(|reason| reason.contains("deepseek"))
        );
    }

    #[test]
    fn test_from_config_synthesis_route_uses_synthesis_model() {
        let mut config = Config::minimal_for_testing();
        config.synthesis.provider = Some("anthropic".to_string());
        config.synthesis.model = Some("claude-3-5-haiku-latest".to_string());
        let credentials = Credentials::from_pairs([(ProviderId::Anthropic, "ak-test")]);

        let gateway = ProviderGateway::from_config(&config, &credentials).unwrap();

        let binding = gateway.routes.get(&ProviderRoute::Synthesis).unwrap();
        assert_eq!(binding.model(), "claude-3-5-haiku-latest");
        assert!(!gateway.is_bound(ProviderRoute::OpenAi));
    }
}
