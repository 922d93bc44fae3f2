use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::redaction::redact_secrets;
use crate::types::{GenerationMode, ProviderId, RequirementId};

/// Library-level error type with rich context and user-friendly reporting.
///
/// `RfpError` is the error type returned at the edges of rfpgen (CLI, library
/// facade). Component crates return their narrower error types, which convert
/// into `RfpError` through `#[from]`.
///
/// # Exit Code Mapping
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to CLI exit codes:
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration, validation and mode errors |
/// | 3 | Storage failures |
/// | 10 | Generation deadline exceeded |
/// | 70 | Every provider failed |
/// | 1 | Other errors |
#[derive(Error, Debug)]
pub enum RfpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Mode error: {0}")]
    Mapping(#[from] MappingError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    ProviderIntegration,
    Retrieval,
    Storage,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Validation => write!(f, "Validation"),
            Self::ProviderIntegration => write!(f, "Provider Integration"),
            Self::Retrieval => write!(f, "Retrieval"),
            Self::Storage => write!(f, "Storage"),
            Self::Internal => write!(f, "Internal"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },

    #[error("Credential for {provider} could not be resolved from '{reference}': {reason}")]
    CredentialUnavailable {
        provider: String,
        reference: String,
        reason: String,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => {
                format!("Required configuration '{key}' is missing")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
            Self::CredentialUnavailable {
                provider,
                reference,
                reason,
            } => {
                format!("Credential '{reference}' for provider {provider} is unavailable: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [providers], [credentials], [synthesis] and [retrieval] sections.".to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific range requirements."
            )),
            Self::CredentialUnavailable { .. } => Some(
                "Credential references take the form env:VARIABLE or file:PATH.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .rfpgen/config.toml".to_string(),
                "Run 'rfpgen config' to see the effective configuration".to_string(),
            ],
            Self::MissingRequired(key) => vec![format!(
                "Add '{key}' to .rfpgen/config.toml or pass it on the command line"
            )],
            Self::InvalidValue { key, .. } => {
                vec![format!("Correct the value of '{key}' in the configuration")]
            }
            Self::NotFound { path } => vec![
                format!("Create the configuration file at {path}"),
                "Omit --config to use discovery and built-in defaults".to_string(),
            ],
            Self::DiscoveryFailed { .. } => vec![
                "Set RFPGEN_HOME to the directory containing config.toml".to_string(),
                "Pass --config with an explicit path".to_string(),
            ],
            Self::CredentialUnavailable { reference, .. } => vec![
                format!("Make sure '{reference}' resolves to a non-empty value"),
                "Update the [credentials] table to point at the right variable or file"
                    .to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Bad or missing input. Raised before any write happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("requirement id is missing")]
    MissingRequirementId,

    #[error("requirement {id} does not exist")]
    UnknownRequirement { id: RequirementId },

    #[error("requirement {id} has no provider outputs to synthesize")]
    NothingToSynthesize { id: RequirementId },

    #[error("synthesis needs at least {required} provider outputs, found {found}")]
    NotSynthesisReady { required: usize, found: usize },

    #[error("rating {rating} is outside the 1..=5 range")]
    RatingOutOfRange { rating: u8 },

    #[error("{field} is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}

impl UserFriendlyError for ValidationError {
    fn user_message(&self) -> String {
        match self {
            Self::MissingRequirementId => "A requirement id is required".to_string(),
            Self::UnknownRequirement { id } => format!("Requirement {id} was not found"),
            Self::NothingToSynthesize { id } => {
                format!("Requirement {id} has no provider answers to combine yet")
            }
            Self::NotSynthesisReady { required, found } => format!(
                "Only {found} provider answer(s) are available; synthesis needs {required}"
            ),
            Self::RatingOutOfRange { rating } => {
                format!("Rating {rating} is not between 1 and 5")
            }
            Self::InvalidField { field, reason } => format!("{field}: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::NothingToSynthesize { .. } | Self::NotSynthesisReady { .. } => Some(
                "Synthesis combines answers produced by a previous generation run.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingRequirementId | Self::UnknownRequirement { .. } => vec![
                "Ingest the requirement first with 'rfpgen ingest'".to_string(),
                "Check the id with 'rfpgen show <id>'".to_string(),
            ],
            Self::NothingToSynthesize { .. } | Self::NotSynthesisReady { .. } => vec![
                "Run 'rfpgen generate <id> --mode synthesis' first".to_string(),
            ],
            Self::RatingOutOfRange { .. } => vec!["Use a rating from 1 to 5".to_string()],
            Self::InvalidField { .. } => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

/// A generation mode outside the closed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown generation mode '{mode}' (expected one of: {expected})")]
pub struct MappingError {
    pub mode: String,
    expected: String,
}

impl MappingError {
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            expected: GenerationMode::names().join(", "),
        }
    }
}

/// Classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorClass {
    /// The requested model does not exist or is not served to this account
    ModelUnavailable,
    Auth,
    Quota,
    Outage,
    Timeout,
    Transport,
    EmptyResponse,
    Misconfigured,
}

impl ProviderErrorClass {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model_unavailable",
            Self::Auth => "auth",
            Self::Quota => "quota",
            Self::Outage => "outage",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::EmptyResponse => "empty_response",
            Self::Misconfigured => "misconfigured",
        }
    }
}

impl fmt::Display for ProviderErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one provider call, as seen by the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{class}: {message}")]
pub struct ProviderError {
    pub class: ProviderErrorClass,
    pub message: String,
}

impl ProviderError {
    #[must_use]
    pub fn new(class: ProviderErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: redact_secrets(&message.into()),
        }
    }
}

impl From<LlmError> for ProviderError {
    fn from(err: LlmError) -> Self {
        let class = match &err {
            LlmError::ModelUnavailable(_) => ProviderErrorClass::ModelUnavailable,
            LlmError::ProviderAuth(_) => ProviderErrorClass::Auth,
            LlmError::ProviderQuota(_) => ProviderErrorClass::Quota,
            LlmError::ProviderOutage(_) => ProviderErrorClass::Outage,
            LlmError::Timeout { .. } => ProviderErrorClass::Timeout,
            LlmError::Transport(_) => ProviderErrorClass::Transport,
            LlmError::EmptyResponse(_) => ProviderErrorClass::EmptyResponse,
            LlmError::Misconfiguration(_) => ProviderErrorClass::Misconfigured,
        };
        Self::new(class, err.to_string())
    }
}

/// Errors that can occur during LLM backend operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed responses)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// The requested model is not available (404, model_not_found)
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The provider answered without any text
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::ModelUnavailable(msg) => format!("LLM model is not available: {msg}"),
            Self::EmptyResponse(msg) => format!("LLM provider returned no text: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {:?}", duration)
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ModelUnavailable(_) => Some(
                "The configured model and its fallback were both rejected by the provider."
                    .to_string(),
            ),
            Self::Timeout { .. } => Some(
                "The generation deadline expired before the provider answered.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Check the provider's status page for known issues".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check the [credentials] table in .rfpgen/config.toml".to_string(),
                "Verify the API key is valid and not expired".to_string(),
            ],
            Self::ProviderQuota(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Check your provider's usage dashboard".to_string(),
            ],
            Self::ModelUnavailable(_) => vec![
                "Set a valid model or fallback_model under [providers.<name>]".to_string(),
            ],
            Self::EmptyResponse(_) => vec!["Retry the generation".to_string()],
            Self::Timeout { .. } => vec![
                "Increase [generation] deadline_secs or pass a larger --deadline-secs"
                    .to_string(),
            ],
            Self::Misconfiguration(_) => vec![
                "Check the provider configuration in .rfpgen/config.toml".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderAuth(_) | Self::Misconfiguration(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::ProviderIntegration,
        }
    }
}

/// Failures of the similarity backend.
///
/// These never abort a generation: the retriever turns them into an
/// unavailable status with an empty reference set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("similarity backend unreachable: {0}")]
    Unreachable(String),

    #[error("similarity backend returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("similarity backend misconfigured: {0}")]
    Misconfiguration(String),
}

/// Persistence failures. Fatal to the phase that triggered them.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("requirement {id} not found in storage")]
    NotFound { id: RequirementId },

    #[error("requirement {id} already exists")]
    AlreadyExists { id: RequirementId },

    #[error("failed to read requirement {id}: {reason}")]
    ReadFailed { id: RequirementId, reason: String },

    #[error("failed to write requirement {id}: {reason}")]
    WriteFailed { id: RequirementId, reason: String },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

impl UserFriendlyError for StorageError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { id } => format!("Requirement {id} is not in the store"),
            Self::AlreadyExists { id } => format!("Requirement {id} was already ingested"),
            Self::ReadFailed { id, reason } => {
                format!("Could not read requirement {id}: {reason}")
            }
            Self::WriteFailed { id, reason } => {
                format!("Could not save requirement {id}: {reason}")
            }
            Self::Unavailable(reason) => format!("Storage is unavailable: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::WriteFailed { .. } => Some(
                "Provider answers produced before the failed write may already be saved."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => vec!["Ingest the requirement with 'rfpgen ingest'".to_string()],
            Self::AlreadyExists { .. } => Vec::new(),
            _ => vec![
                "Check permissions and free space in the [storage] data_dir".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

/// Terminal failures of a generation request.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("every provider failed: {}", summarize_failures(.failures))]
    Exhausted {
        failures: Vec<(ProviderId, ProviderError)>,
    },

    #[error("storage failed during {phase}: {source}")]
    Storage {
        phase: String,
        #[source]
        source: StorageError,
    },

    #[error("illegal generation transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

fn summarize_failures(failures: &[(ProviderId, ProviderError)]) -> String {
    failures
        .iter()
        .map(|(provider, err)| format!("{provider} ({err})"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl GenerationError {
    /// True when every provider failure was a timeout (deadline expired).
    #[must_use]
    pub fn is_deadline_exceeded(&self) -> bool {
        match self {
            Self::Exhausted { failures } => {
                !failures.is_empty()
                    && failures
                        .iter()
                        .all(|(_, e)| e.class == ProviderErrorClass::Timeout)
            }
            _ => false,
        }
    }
}

impl UserFriendlyError for GenerationError {
    fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.user_message(),
            Self::Mapping(err) => err.to_string(),
            Self::Exhausted { failures } => format!(
                "No provider produced an answer: {}",
                summarize_failures(failures)
            ),
            Self::Storage { phase, source } => {
                format!("Saving results failed during {phase}: {}", source.user_message())
            }
            Self::InvalidTransition { from, to } => {
                format!("Internal state error: cannot move from {from} to {to}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Validation(err) => err.context(),
            Self::Exhausted { .. } => Some(
                "Generation tolerates partial failure, but needs at least one provider answer."
                    .to_string(),
            ),
            Self::Storage { source, .. } => source.context(),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Validation(err) => err.suggestions(),
            Self::Mapping(_) => vec![format!(
                "Use one of: {}",
                GenerationMode::names().join(", ")
            )],
            Self::Exhausted { failures } => {
                let mut out = vec!["Re-run with --verbose to see each provider call".to_string()];
                if failures
                    .iter()
                    .any(|(_, e)| e.class == ProviderErrorClass::Auth)
                {
                    out.push("Check the [credentials] table in .rfpgen/config.toml".to_string());
                }
                if self.is_deadline_exceeded() {
                    out.push("Increase the generation deadline".to_string());
                }
                out
            }
            Self::Storage { source, .. } => source.suggestions(),
            Self::InvalidTransition { .. } => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::Mapping(_) => ErrorCategory::Validation,
            Self::Exhausted { .. } => ErrorCategory::ProviderIntegration,
            Self::Storage { .. } => ErrorCategory::Storage,
            Self::InvalidTransition { .. } => ErrorCategory::Internal,
        }
    }
}

impl UserFriendlyError for RfpError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Generation(err) => err.user_message(),
            Self::Storage(err) => err.user_message(),
            Self::Validation(err) => err.user_message(),
            Self::Mapping(err) => err.to_string(),
            Self::Llm(err) => err.user_message(),
            Self::Retrieval(err) => err.to_string(),
            Self::Io(err) => format!("File system operation failed: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Generation(err) => err.context(),
            Self::Storage(err) => err.context(),
            Self::Validation(err) => err.context(),
            Self::Mapping(_) => None,
            Self::Llm(err) => err.context(),
            Self::Retrieval(_) => None,
            Self::Io(_) => Some(
                "This usually indicates a permissions issue or disk space problem.".to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Generation(err) => err.suggestions(),
            Self::Storage(err) => err.suggestions(),
            Self::Validation(err) => err.suggestions(),
            Self::Mapping(_) => vec![format!(
                "Use one of: {}",
                GenerationMode::names().join(", ")
            )],
            Self::Llm(err) => err.suggestions(),
            Self::Retrieval(_) => vec![
                "Check the [retrieval] endpoint in .rfpgen/config.toml".to_string(),
            ],
            Self::Io(_) => vec![
                "Check file permissions in the data directory".to_string(),
                "Ensure sufficient disk space is available".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Generation(err) => err.category(),
            Self::Storage(err) => err.category(),
            Self::Validation(err) => err.category(),
            Self::Mapping(_) => ErrorCategory::Validation,
            Self::Llm(err) => err.category(),
            Self::Retrieval(_) => ErrorCategory::Retrieval,
            Self::Io(_) => ErrorCategory::Storage,
        }
    }
}

impl RfpError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// Secrets are redacted from the rendered text.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {}\n", ctx));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {}\n", suggestion));
            }
        }

        redact_secrets(&output)
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            RfpError::Config(_)
            | RfpError::Validation(_)
            | RfpError::Mapping(_)
            | RfpError::Retrieval(_) => ExitCode::CLI_ARGS,
            RfpError::Storage(_) | RfpError::Io(_) => ExitCode::STORAGE_FAILURE,
            RfpError::Llm(_) => ExitCode::PROVIDER_FAILURE,
            RfpError::Generation(err) => match err {
                GenerationError::Validation(_) | GenerationError::Mapping(_) => {
                    ExitCode::CLI_ARGS
                }
                GenerationError::Storage { .. } => ExitCode::STORAGE_FAILURE,
                GenerationError::Exhausted { .. } if err.is_deadline_exceeded() => {
                    ExitCode::DEADLINE_EXCEEDED
                }
                GenerationError::Exhausted { .. } => ExitCode::PROVIDER_FAILURE,
                GenerationError::InvalidTransition { .. } => ExitCode::INTERNAL,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;

    #[test]
    fn test_llm_error_maps_to_provider_error_class() {
        let cases = vec![
            (LlmError::ModelUnavailable("m".into()), ProviderErrorClass::ModelUnavailable),
            (LlmError::ProviderAuth("a".into()), ProviderErrorClass::Auth),
            (LlmError::ProviderQuota("q".into()), ProviderErrorClass::Quota),
            (LlmError::ProviderOutage("o".into()), ProviderErrorClass::Outage),
            (
                LlmError::Timeout {
                    duration: Duration::from_secs(3),
                },
                ProviderErrorClass::Timeout,
            ),
            (LlmError::Transport("t".into()), ProviderErrorClass::Transport),
            (LlmError::EmptyResponse("e".into()), ProviderErrorClass::EmptyResponse),
            (LlmError::Misconfiguration("c".into()), ProviderErrorClass::Misconfigured),
        ];

        for (llm, expected) in cases {
            let provider: ProviderError = llm.into();
            assert_eq!(provider.class, expected);
        }
    }

    #[test]
    fn test_provider_error_message_is_redacted() {
        let err = ProviderError::new(
            ProviderErrorClass::Auth,
            "rejected key sk-abcdefghijklmnopqrstuvwxyz0123456789",
        );
        assert!(!err.message.contains("sk-abcdefghijklmnopqrstuvwxyz0123456789"));
        assert!(err.message.contains("[REDACTED_KEY]"));
    }

    #[test]
    fn test_exhausted_summary_lists_each_provider() {
        let err = GenerationError::Exhausted {
            failures: vec![
                (
                    ProviderId::OpenAi,
                    ProviderError::new(ProviderErrorClass::Quota, "429"),
                ),
                (
                    ProviderId::DeepSeek,
                    ProviderError::new(ProviderErrorClass::Outage, "503"),
                ),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("openai (quota: 429)"));
        assert!(text.contains("deepseek (outage: 503)"));
        assert!(!err.is_deadline_exceeded());
    }

    #[test]
    fn test_exit_code_mapping() {
        let err = RfpError::Validation(ValidationError::MissingRequirementId);
        assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);

        let err = RfpError::Mapping(MappingError::new("gemini"));
        assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);

        let err = RfpError::Storage(StorageError::Unavailable("disk".into()));
        assert_eq!(err.to_exit_code(), ExitCode::STORAGE_FAILURE);

        let err = RfpError::Generation(GenerationError::Exhausted {
            failures: vec![(
                ProviderId::Anthropic,
                ProviderError::new(ProviderErrorClass::Timeout, "deadline"),
            )],
        });
        assert_eq!(err.to_exit_code(), ExitCode::DEADLINE_EXCEEDED);

        let err = RfpError::Generation(GenerationError::Exhausted {
            failures: vec![(
                ProviderId::Anthropic,
                ProviderError::new(ProviderErrorClass::Auth, "401"),
            )],
        });
        assert_eq!(err.to_exit_code(), ExitCode::PROVIDER_FAILURE);
    }

    #[test]
    fn test_display_for_user_includes_suggestions() {
        let err = RfpError::Validation(ValidationError::UnknownRequirement {
            id: RequirementId::new(42),
        });
        let text = err.display_for_user();
        assert!(text.starts_with("Error: Requirement 42 was not found"));
        assert!(text.contains("Suggestions:"));
        assert!(text.contains("rfpgen ingest"));
    }
}
