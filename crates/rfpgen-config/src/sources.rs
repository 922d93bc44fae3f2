use std::collections::BTreeMap;

use rfpgen_utils::types::{ConfigSource, ProviderId};

use crate::model::Config;

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Default).to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    ///
    /// Every key is present; values that nobody set show their built-in default.
    /// Credential references are listed, never the secrets they point at.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: String, value: String| {
            let source = source_label(self.source_attribution.get(&key));
            config.insert(key, (value, source));
        };

        for provider in ProviderId::all() {
            let prefix = format!("providers.{}", provider.as_str());
            let settings = self.provider_settings(provider);
            add_config(
                format!("{prefix}.enabled"),
                self.provider_enabled(provider).to_string(),
            );
            add_config(format!("{prefix}.model"), settings.model);
            if let Some(fallback) = settings.fallback_model {
                add_config(format!("{prefix}.fallback_model"), fallback);
            }
            if let Some(base_url) = settings.base_url {
                add_config(format!("{prefix}.base_url"), base_url);
            }
            add_config(format!("{prefix}.max_tokens"), settings.max_tokens.to_string());
            add_config(
                format!("{prefix}.temperature"),
                settings.temperature.to_string(),
            );
            add_config(
                format!("credentials.{}", provider.as_str()),
                self.credential_ref(provider),
            );
        }

        let synthesis = self.synthesis_settings();
        add_config(
            "synthesis.provider".to_string(),
            self.synthesis_provider().to_string(),
        );
        add_config("synthesis.model".to_string(), synthesis.model);
        add_config(
            "synthesis.min_providers".to_string(),
            self.synthesis_min_providers().to_string(),
        );
        add_config(
            "synthesis.auto_continue".to_string(),
            self.auto_continue().to_string(),
        );

        add_config(
            "retrieval.endpoint".to_string(),
            self.retrieval
                .endpoint
                .clone()
                .unwrap_or_else(|| "(disabled)".to_string()),
        );
        add_config("retrieval.top_k".to_string(), self.retrieval_top_k().to_string());
        add_config(
            "retrieval.min_score".to_string(),
            self.retrieval_min_score().to_string(),
        );
        add_config(
            "retrieval.prompt_min_score".to_string(),
            self.prompt_min_score().to_string(),
        );
        add_config(
            "retrieval.prompt_max_references".to_string(),
            self.prompt_max_references().to_string(),
        );

        add_config(
            "storage.data_dir".to_string(),
            self.data_dir().display().to_string(),
        );
        add_config(
            "generation.deadline_secs".to_string(),
            self.generation
                .deadline_secs
                .map_or_else(|| "(none)".to_string(), |d| d.to_string()),
        );

        config
    }
}
