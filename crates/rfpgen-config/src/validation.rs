use rfpgen_utils::error::ConfigError;
use rfpgen_utils::types::ProviderId;

use crate::credentials::CredentialRef;
use crate::model::Config;

fn invalid(key: impl Into<String>, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    }
}

fn check_score(key: &str, score: Option<f32>) -> Result<(), ConfigError> {
    if let Some(score) = score
        && !(0.0..=1.0).contains(&score)
    {
        return Err(invalid(key, format!("{score} is outside 0.0..=1.0")));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        // Per-provider model settings
        for provider in ProviderId::all() {
            let cfg = self.providers.get(provider);
            let prefix = format!("providers.{}", provider.as_str());

            if let Some(model) = &cfg.model
                && model.trim().is_empty()
            {
                return Err(invalid(format!("{prefix}.model"), "must not be empty"));
            }
            if let Some(max_tokens) = cfg.max_tokens
                && max_tokens == 0
            {
                return Err(invalid(format!("{prefix}.max_tokens"), "must be greater than 0"));
            }
            if let Some(temperature) = cfg.temperature
                && !(0.0..=2.0).contains(&temperature)
            {
                return Err(invalid(
                    format!("{prefix}.temperature"),
                    format!("{temperature} is outside 0.0..=2.0"),
                ));
            }
            if let Some(base_url) = &cfg.base_url
                && !(base_url.starts_with("https://") || base_url.starts_with("http://"))
            {
                return Err(invalid(
                    format!("{prefix}.base_url"),
                    "must be an http(s) URL",
                ));
            }
        }

        // Credential references must parse; resolution happens later and per provider
        for (provider, reference) in &self.credentials {
            if provider.parse::<ProviderId>().is_err() {
                return Err(invalid(
                    format!("credentials.{provider}"),
                    "unknown provider (expected openai, anthropic or deepseek)",
                ));
            }
            if let Err(reason) = reference.parse::<CredentialRef>() {
                return Err(invalid(format!("credentials.{provider}"), reason));
            }
        }

        // Synthesis
        if let Some(provider) = &self.synthesis.provider
            && provider.parse::<ProviderId>().is_err()
        {
            return Err(invalid(
                "synthesis.provider",
                format!("'{provider}' is not a known provider"),
            ));
        }
        if let Some(min) = self.synthesis.min_providers
            && !(1..=3).contains(&min)
        {
            return Err(invalid(
                "synthesis.min_providers",
                format!("{min} is outside 1..=3"),
            ));
        }

        // Retrieval
        if let Some(top_k) = self.retrieval.top_k
            && !(1..=50).contains(&top_k)
        {
            return Err(invalid("retrieval.top_k", format!("{top_k} is outside 1..=50")));
        }
        check_score("retrieval.min_score", self.retrieval.min_score)?;
        check_score("retrieval.prompt_min_score", self.retrieval.prompt_min_score)?;
        if let Some(timeout) = self.retrieval.timeout_secs
            && timeout == 0
        {
            return Err(invalid("retrieval.timeout_secs", "must be greater than 0"));
        }
        if let Some(endpoint) = &self.retrieval.endpoint
            && !(endpoint.starts_with("https://") || endpoint.starts_with("http://"))
        {
            return Err(invalid("retrieval.endpoint", "must be an http(s) URL"));
        }

        // Generation deadline
        if let Some(deadline) = self.generation.deadline_secs
            && !(1..=3600).contains(&deadline)
        {
            return Err(invalid(
                "generation.deadline_secs",
                format!("{deadline} is outside 1..=3600 seconds"),
            ));
        }

        Ok(())
    }
}
