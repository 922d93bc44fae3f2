use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use rfpgen_utils::types::{ConfigSource, ProviderId};

/// Readiness threshold for Phase 2: successful providers needed before synthesis runs.
pub const DEFAULT_SYNTHESIS_MIN_PROVIDERS: usize = 2;
pub const DEFAULT_RETRIEVAL_TOP_K: usize = 5;
pub const DEFAULT_RETRIEVAL_MIN_SCORE: f32 = 0.3;
pub const DEFAULT_PROMPT_MIN_SCORE: f32 = 0.9;
pub const DEFAULT_PROMPT_MAX_REFERENCES: usize = 3;
pub const DEFAULT_RETRIEVAL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_DATA_DIR: &str = ".rfpgen/data";

/// Per-provider model settings, `[providers.<name>]` in config.toml.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Set to false to leave this provider out of synthesis fan-out
    pub enabled: Option<bool>,
    pub model: Option<String>,
    /// Model retried once when `model` is reported unavailable
    pub fallback_model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
    #[serde(default)]
    pub deepseek: ProviderConfig,
}

impl ProvidersConfig {
    #[must_use]
    pub fn get(&self, provider: ProviderId) -> &ProviderConfig {
        match provider {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Anthropic => &self.anthropic,
            ProviderId::DeepSeek => &self.deepseek,
        }
    }

    pub fn get_mut(&mut self, provider: ProviderId) -> &mut ProviderConfig {
        match provider {
            ProviderId::OpenAi => &mut self.openai,
            ProviderId::Anthropic => &mut self.anthropic,
            ProviderId::DeepSeek => &mut self.deepseek,
        }
    }
}

/// `[synthesis]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SynthesisConfig {
    /// Provider whose API performs the combine call (default: openai)
    pub provider: Option<String>,
    /// Model for the combine call (default: that provider's model)
    pub model: Option<String>,
    pub fallback_model: Option<String>,
    pub min_providers: Option<usize>,
    pub auto_continue: Option<bool>,
}

/// `[retrieval]` section. Retrieval is disabled when `endpoint` is absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetrievalConfig {
    pub endpoint: Option<String>,
    pub top_k: Option<usize>,
    pub min_score: Option<f32>,
    pub prompt_min_score: Option<f32>,
    pub prompt_max_references: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Deadline applied to each generate/synthesize call, in seconds
    pub deadline_secs: Option<u64>,
}

/// Configuration for rfpgen operations.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI behavior that:
/// - Honors an explicit `--config` path
/// - Respects the `RFPGEN_HOME` environment variable
/// - Searches for `.rfpgen/config.toml` upward from the current directory
/// - Applies built-in defaults for unspecified values
///
/// # Example
///
/// ```rust,no_run
/// use rfpgen_config::{CliArgs, Config};
///
/// let config = Config::discover(&CliArgs::default())?;
/// println!("synthesis threshold: {}", config.synthesis_min_providers());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub providers: ProvidersConfig,
    /// `{providerId: credentialRef}`, e.g. `openai = "env:OPENAI_API_KEY"`
    pub credentials: BTreeMap<String, String>,
    pub synthesis: SynthesisConfig,
    pub retrieval: RetrievalConfig,
    pub storage: StorageConfig,
    pub generation: GenerationConfig,
    /// Where each effective value came from
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Command-line overrides fed into discovery.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub auto_continue: Option<bool>,
    pub deadline_secs: Option<u64>,
    pub retrieval_endpoint: Option<String>,
}

/// Fully resolved settings for one provider route.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub model: String,
    pub fallback_model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

pub(crate) fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "gpt-4",
        ProviderId::Anthropic => "claude-3-7-sonnet-20250219",
        ProviderId::DeepSeek => "deepseek-chat",
    }
}

pub(crate) fn default_credential_ref(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "env:OPENAI_API_KEY",
        ProviderId::Anthropic => "env:ANTHROPIC_API_KEY",
        ProviderId::DeepSeek => "env:DEEPSEEK_API_KEY",
    }
}

impl Config {
    /// Whether `provider` takes part in synthesis fan-out.
    #[must_use]
    pub fn provider_enabled(&self, provider: ProviderId) -> bool {
        self.providers.get(provider).enabled.unwrap_or(true)
    }

    /// Providers that take part in synthesis fan-out, in dispatch order.
    #[must_use]
    pub fn enabled_providers(&self) -> Vec<ProviderId> {
        ProviderId::all()
            .filter(|p| self.provider_enabled(*p))
            .collect()
    }

    #[must_use]
    pub fn provider_settings(&self, provider: ProviderId) -> ProviderSettings {
        let cfg = self.providers.get(provider);
        ProviderSettings {
            model: cfg
                .model
                .clone()
                .unwrap_or_else(|| default_model(provider).to_string()),
            fallback_model: cfg.fallback_model.clone(),
            base_url: cfg.base_url.clone(),
            max_tokens: cfg.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: cfg.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        }
    }

    /// Provider that serves the synthesis route.
    ///
    /// Falls back to OpenAI when unset; validation rejects unknown names.
    #[must_use]
    pub fn synthesis_provider(&self) -> ProviderId {
        self.synthesis
            .provider
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or(ProviderId::OpenAi)
    }

    /// Settings for the synthesis route: the synthesis provider's settings with
    /// the `[synthesis]` model overrides applied.
    #[must_use]
    pub fn synthesis_settings(&self) -> ProviderSettings {
        let mut settings = self.provider_settings(self.synthesis_provider());
        if let Some(model) = &self.synthesis.model {
            settings.model = model.clone();
        }
        if self.synthesis.fallback_model.is_some() {
            settings.fallback_model = self.synthesis.fallback_model.clone();
        }
        settings
    }

    #[must_use]
    pub fn synthesis_min_providers(&self) -> usize {
        self.synthesis
            .min_providers
            .unwrap_or(DEFAULT_SYNTHESIS_MIN_PROVIDERS)
    }

    #[must_use]
    pub fn auto_continue(&self) -> bool {
        self.synthesis.auto_continue.unwrap_or(true)
    }

    #[must_use]
    pub fn retrieval_top_k(&self) -> usize {
        self.retrieval.top_k.unwrap_or(DEFAULT_RETRIEVAL_TOP_K)
    }

    #[must_use]
    pub fn retrieval_min_score(&self) -> f32 {
        self.retrieval.min_score.unwrap_or(DEFAULT_RETRIEVAL_MIN_SCORE)
    }

    #[must_use]
    pub fn prompt_min_score(&self) -> f32 {
        self.retrieval
            .prompt_min_score
            .unwrap_or(DEFAULT_PROMPT_MIN_SCORE)
    }

    #[must_use]
    pub fn prompt_max_references(&self) -> usize {
        self.retrieval
            .prompt_max_references
            .unwrap_or(DEFAULT_PROMPT_MAX_REFERENCES)
    }

    #[must_use]
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(
            self.retrieval
                .timeout_secs
                .unwrap_or(DEFAULT_RETRIEVAL_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    #[must_use]
    pub fn generation_deadline(&self) -> Option<Duration> {
        self.generation.deadline_secs.map(Duration::from_secs)
    }

    /// Credential reference configured for `provider`, or the default
    /// `env:<PROVIDER>_API_KEY` reference.
    #[must_use]
    pub fn credential_ref(&self, provider: ProviderId) -> String {
        self.credentials
            .get(provider.as_str())
            .cloned()
            .unwrap_or_else(|| default_credential_ref(provider).to_string())
    }

    /// Built-in defaults only, without touching the filesystem or environment.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self::default()
    }
}
