//! Credential resolution.
//!
//! API keys are resolved once, from the `[credentials]` table, into a
//! [`Credentials`] value that is handed to the provider gateway. Backends never
//! read the process environment themselves.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rfpgen_utils::error::ConfigError;
use rfpgen_utils::types::ProviderId;

use crate::model::Config;

/// Where a secret lives: `env:NAME` or `file:PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRef {
    Env(String),
    File(PathBuf),
}

impl FromStr for CredentialRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix("env:") {
            if name.is_empty() {
                return Err("env: reference needs a variable name".to_string());
            }
            return Ok(Self::Env(name.to_string()));
        }
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return Err("file: reference needs a path".to_string());
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        Err("expected env:NAME or file:PATH".to_string())
    }
}

impl fmt::Display for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(name) => write!(f, "env:{name}"),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

impl CredentialRef {
    fn resolve(&self) -> Result<String, String> {
        let value = match self {
            Self::Env(name) => std::env::var(name).map_err(|_| format!("{name} is not set"))?,
            Self::File(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?,
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err("value is empty".to_string());
        }
        Ok(value)
    }
}

/// A resolved API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

#[derive(Debug, Clone)]
struct Unresolved {
    reference: String,
    reason: String,
}

/// Per-provider API keys resolved from configuration.
///
/// Resolution is lenient: a provider whose key cannot be resolved keeps the
/// reason, which surfaces when that provider is called. Other providers are
/// unaffected.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: BTreeMap<ProviderId, Result<ApiKey, Unresolved>>,
}

impl Credentials {
    /// Resolve every provider's credential reference.
    #[must_use]
    pub fn resolve(config: &Config) -> Self {
        let mut keys = BTreeMap::new();
        for provider in ProviderId::all() {
            let reference = config.credential_ref(provider);
            let resolved = reference
                .parse::<CredentialRef>()
                .and_then(|r| r.resolve())
                .map(ApiKey::new)
                .map_err(|reason| Unresolved {
                    reference: reference.clone(),
                    reason,
                });
            if let Err(unresolved) = &resolved {
                tracing::debug!(
                    provider = %provider,
                    reference = %unresolved.reference,
                    "credential unresolved: {}",
                    unresolved.reason
                );
            }
            keys.insert(provider, resolved);
        }
        Self { keys }
    }

    /// Build credentials from literal keys, for tests and embedding.
    #[must_use]
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ProviderId, K)>,
        K: Into<String>,
    {
        Self {
            keys: pairs
                .into_iter()
                .map(|(p, k)| (p, Ok(ApiKey::new(k))))
                .collect(),
        }
    }

    /// The API key for `provider`, or why it is unavailable.
    pub fn api_key(&self, provider: ProviderId) -> Result<ApiKey, ConfigError> {
        match self.keys.get(&provider) {
            Some(Ok(key)) => Ok(key.clone()),
            Some(Err(unresolved)) => Err(ConfigError::CredentialUnavailable {
                provider: provider.as_str().to_string(),
                reference: unresolved.reference.clone(),
                reason: unresolved.reason.clone(),
            }),
            None => Err(ConfigError::CredentialUnavailable {
                provider: provider.as_str().to_string(),
                reference: "(none)".to_string(),
                reason: "no credential configured".to_string(),
            }),
        }
    }

    #[must_use]
    pub fn has_key(&self, provider: ProviderId) -> bool {
        matches!(self.keys.get(&provider), Some(Ok(_)))
    }
}
