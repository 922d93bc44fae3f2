//! Configuration management for rfpgen
//!
//! Provides hierarchical configuration with discovery and precedence:
//! CLI arguments > config file > built-in defaults.
//!
//! The configuration file lives at `.rfpgen/config.toml` (discovered upward from
//! the working directory) or at `$RFPGEN_HOME/config.toml`:
//!
//! ```toml
//! [providers.anthropic]
//! model = "claude-3-7-sonnet-20250219"
//! fallback_model = "claude-3-5-sonnet-latest"
//!
//! [credentials]
//! openai = "env:OPENAI_API_KEY"
//! deepseek = "file:/run/secrets/deepseek"
//!
//! [synthesis]
//! provider = "openai"
//! min_providers = 2
//!
//! [retrieval]
//! endpoint = "http://localhost:8700/search"
//! ```

mod credentials;
mod discovery;
mod model;
mod sources;
mod validation;

pub use credentials::{ApiKey, CredentialRef, Credentials};
pub use discovery::RFPGEN_HOME_ENV;
pub use model::{
    CliArgs, Config, DEFAULT_DATA_DIR, DEFAULT_MAX_TOKENS, DEFAULT_PROMPT_MAX_REFERENCES,
    DEFAULT_PROMPT_MIN_SCORE, DEFAULT_RETRIEVAL_MIN_SCORE, DEFAULT_RETRIEVAL_TIMEOUT_SECS,
    DEFAULT_RETRIEVAL_TOP_K, DEFAULT_SYNTHESIS_MIN_PROVIDERS, DEFAULT_TEMPERATURE,
    GenerationConfig, ProviderConfig, ProviderSettings, ProvidersConfig, RetrievalConfig,
    StorageConfig, SynthesisConfig,
};

// Re-export for callers that only depend on the config crate
pub use rfpgen_utils::types::ConfigSource;
