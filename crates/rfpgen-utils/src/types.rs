use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

use crate::error::MappingError;

/// Identifier of a requirement record.
///
/// Requirement ids are assigned at ingestion (usually a spreadsheet row) and
/// are opaque to the generation engine beyond being positive integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementId(u64);

impl RequirementId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequirementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// The three language-model providers that answer requirements independently.
///
/// # Example
///
/// ```rust
/// use rfpgen_utils::types::ProviderId;
///
/// assert_eq!(ProviderId::Anthropic.as_str(), "anthropic");
/// assert_eq!(ProviderId::all().count(), 3);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Provider A
    OpenAi,
    /// Provider B
    Anthropic,
    /// Provider C
    DeepSeek,
}

impl ProviderId {
    /// Canonical lowercase name, used in configuration keys and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Human-facing label used when provider outputs are quoted in prompts.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::DeepSeek => "DeepSeek",
        }
    }

    /// Providers in dispatch order (A, B, C).
    pub fn all() -> impl Iterator<Item = ProviderId> {
        Self::iter()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "deepseek" => Ok(Self::DeepSeek),
            _ => Err(MappingError::new(s)),
        }
    }
}

/// A callable route through the provider gateway.
///
/// The three provider routes answer requirements; the synthesis route combines
/// their answers and is bound to whichever provider/model the configuration
/// designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRoute {
    OpenAi,
    Anthropic,
    DeepSeek,
    Synthesis,
}

impl ProviderRoute {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
            Self::Synthesis => "synthesis",
        }
    }

    /// The provider behind this route, `None` for synthesis.
    #[must_use]
    pub const fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::OpenAi => Some(ProviderId::OpenAi),
            Self::Anthropic => Some(ProviderId::Anthropic),
            Self::DeepSeek => Some(ProviderId::DeepSeek),
            Self::Synthesis => None,
        }
    }
}

impl From<ProviderId> for ProviderRoute {
    fn from(provider: ProviderId) -> Self {
        match provider {
            ProviderId::OpenAi => Self::OpenAi,
            ProviderId::Anthropic => Self::Anthropic,
            ProviderId::DeepSeek => Self::DeepSeek,
        }
    }
}

impl fmt::Display for ProviderRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation mode requested by the caller.
///
/// The same enum doubles as the provider marker persisted on a record: it names
/// the mode that produced `final_response`.
///
/// Parsing accepts the canonical names plus the legacy aliases `openAI`,
/// `claude` and `moa`; anything else is a [`MappingError`].
///
/// ```rust
/// use rfpgen_utils::types::GenerationMode;
///
/// let mode: GenerationMode = "moa".parse().unwrap();
/// assert_eq!(mode, GenerationMode::Synthesis);
/// assert!("gpt-5".parse::<GenerationMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    OpenAi,
    Anthropic,
    DeepSeek,
    Synthesis,
}

impl GenerationMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
            Self::Synthesis => "synthesis",
        }
    }

    /// The single provider for single-provider modes, `None` for synthesis.
    #[must_use]
    pub const fn single_provider(&self) -> Option<ProviderId> {
        match self {
            Self::OpenAi => Some(ProviderId::OpenAi),
            Self::Anthropic => Some(ProviderId::Anthropic),
            Self::DeepSeek => Some(ProviderId::DeepSeek),
            Self::Synthesis => None,
        }
    }

    #[must_use]
    pub const fn is_synthesis(&self) -> bool {
        matches!(self, Self::Synthesis)
    }

    /// Canonical names of every mode, for help text and error messages.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(|m| m.as_str()).collect()
    }
}

impl From<ProviderId> for GenerationMode {
    fn from(provider: ProviderId) -> Self {
        match provider {
            ProviderId::OpenAi => Self::OpenAi,
            ProviderId::Anthropic => Self::Anthropic,
            ProviderId::DeepSeek => Self::DeepSeek,
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "deepseek" => Ok(Self::DeepSeek),
            "synthesis" | "moa" => Ok(Self::Synthesis),
            _ => Err(MappingError::new(s)),
        }
    }
}

/// Source of a configuration value.
///
/// Indicates where a configuration value originated from in the precedence chain:
/// CLI arguments > config file > built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from a configuration file.
    Config,
    /// Built-in default value (lowest precedence).
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Config => write!(f, "config"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parses_canonical_and_legacy_names() {
        assert_eq!("openai".parse::<GenerationMode>().unwrap(), GenerationMode::OpenAi);
        assert_eq!("openAI".parse::<GenerationMode>().unwrap(), GenerationMode::OpenAi);
        assert_eq!("claude".parse::<GenerationMode>().unwrap(), GenerationMode::Anthropic);
        assert_eq!(" DeepSeek ".parse::<GenerationMode>().unwrap(), GenerationMode::DeepSeek);
        assert_eq!("moa".parse::<GenerationMode>().unwrap(), GenerationMode::Synthesis);
    }

    #[test]
    fn test_mode_outside_enumeration_is_mapping_error() {
        let err = "gemini".parse::<GenerationMode>().unwrap_err();
        assert_eq!(err.mode, "gemini");
        assert!(err.to_string().contains("synthesis"));
    }

    #[test]
    fn test_mode_round_trips_through_serde() {
        for mode in GenerationMode::iter() {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
            let back: GenerationMode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, mode);
        }
    }

    #[test]
    fn test_provider_route_mapping() {
        for provider in ProviderId::all() {
            let route = ProviderRoute::from(provider);
            assert_eq!(route.provider(), Some(provider));
            assert_eq!(route.as_str(), provider.as_str());
        }
        assert_eq!(ProviderRoute::Synthesis.provider(), None);
    }

    #[test]
    fn test_single_provider_modes() {
        assert_eq!(
            GenerationMode::DeepSeek.single_provider(),
            Some(ProviderId::DeepSeek)
        );
        assert!(GenerationMode::Synthesis.single_provider().is_none());
        assert!(GenerationMode::Synthesis.is_synthesis());
    }
}
