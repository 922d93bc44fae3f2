use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::{Path, PathBuf};

use rfpgen_utils::types::{ConfigSource, ProviderId};

use crate::model::{
    CliArgs, Config, GenerationConfig, ProviderConfig, ProvidersConfig, RetrievalConfig,
    StorageConfig, SynthesisConfig,
};

/// Environment variable pointing at a directory holding `config.toml`.
pub const RFPGEN_HOME_ENV: &str = "RFPGEN_HOME";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    providers: Option<ProvidersConfig>,
    credentials: Option<BTreeMap<String, String>>,
    synthesis: Option<SynthesisConfig>,
    retrieval: Option<RetrievalConfig>,
    storage: Option<StorageConfig>,
    generation: Option<GenerationConfig>,
}

/// Copy `from` into `into` when present and record where it came from.
fn layer<T>(
    into: &mut Option<T>,
    from: Option<T>,
    key: &str,
    source: &ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if from.is_some() {
        *into = from;
        attribution.insert(key.to_string(), source.clone());
    }
}

fn layer_provider(
    provider: ProviderId,
    into: &mut ProviderConfig,
    from: ProviderConfig,
    source: &ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    let prefix = format!("providers.{}", provider.as_str());
    layer(&mut into.enabled, from.enabled, &format!("{prefix}.enabled"), source, attribution);
    layer(&mut into.model, from.model, &format!("{prefix}.model"), source, attribution);
    layer(
        &mut into.fallback_model,
        from.fallback_model,
        &format!("{prefix}.fallback_model"),
        source,
        attribution,
    );
    layer(&mut into.base_url, from.base_url, &format!("{prefix}.base_url"), source, attribution);
    layer(
        &mut into.max_tokens,
        from.max_tokens,
        &format!("{prefix}.max_tokens"),
        source,
        attribution,
    );
    layer(
        &mut into.temperature,
        from.temperature,
        &format!("{prefix}.temperature"),
        source,
        attribution,
    );
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    anyhow::bail!(rfpgen_utils::error::ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    });
                }
                Some(explicit.clone())
            }
            None => match Self::home_config_file() {
                Some(path) => Some(path),
                None => Self::discover_config_file_from(start_dir)?,
            },
        };

        let mut config = Config::default();
        for key in [
            "synthesis.min_providers",
            "synthesis.auto_continue",
            "retrieval.top_k",
            "retrieval.min_score",
            "storage.data_dir",
        ] {
            config
                .source_attribution
                .insert(key.to_string(), ConfigSource::Default);
        }

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            config.apply_file(file_config);

            // Relative data_dir values are anchored at the project root that
            // holds the .rfpgen folder (or at RFPGEN_HOME itself).
            if let Some(dir) = &config.storage.data_dir
                && dir.is_relative()
                && let Some(anchor) = Self::config_anchor(path)
            {
                config.storage.data_dir = Some(anchor.join(dir));
            }
        }

        config.apply_cli(cli_args);
        config.validate()?;

        tracing::debug!(
            config_file = ?config_path,
            "Configuration resolved"
        );

        Ok(config)
    }

    fn apply_file(&mut self, file: TomlConfig) {
        let source = ConfigSource::Config;
        let attribution = &mut self.source_attribution;

        if let Some(providers) = file.providers {
            layer_provider(
                ProviderId::OpenAi,
                &mut self.providers.openai,
                providers.openai,
                &source,
                attribution,
            );
            layer_provider(
                ProviderId::Anthropic,
                &mut self.providers.anthropic,
                providers.anthropic,
                &source,
                attribution,
            );
            layer_provider(
                ProviderId::DeepSeek,
                &mut self.providers.deepseek,
                providers.deepseek,
                &source,
                attribution,
            );
        }

        if let Some(credentials) = file.credentials {
            for (provider, reference) in credentials {
                attribution.insert(format!("credentials.{provider}"), source.clone());
                self.credentials.insert(provider, reference);
            }
        }

        if let Some(s) = file.synthesis {
            layer(&mut self.synthesis.provider, s.provider, "synthesis.provider", &source, attribution);
            layer(&mut self.synthesis.model, s.model, "synthesis.model", &source, attribution);
            layer(
                &mut self.synthesis.fallback_model,
                s.fallback_model,
                "synthesis.fallback_model",
                &source,
                attribution,
            );
            layer(
                &mut self.synthesis.min_providers,
                s.min_providers,
                "synthesis.min_providers",
                &source,
                attribution,
            );
            layer(
                &mut self.synthesis.auto_continue,
                s.auto_continue,
                "synthesis.auto_continue",
                &source,
                attribution,
            );
        }

        if let Some(r) = file.retrieval {
            layer(&mut self.retrieval.endpoint, r.endpoint, "retrieval.endpoint", &source, attribution);
            layer(&mut self.retrieval.top_k, r.top_k, "retrieval.top_k", &source, attribution);
            layer(&mut self.retrieval.min_score, r.min_score, "retrieval.min_score", &source, attribution);
            layer(
                &mut self.retrieval.prompt_min_score,
                r.prompt_min_score,
                "retrieval.prompt_min_score",
                &source,
                attribution,
            );
            layer(
                &mut self.retrieval.prompt_max_references,
                r.prompt_max_references,
                "retrieval.prompt_max_references",
                &source,
                attribution,
            );
            layer(
                &mut self.retrieval.timeout_secs,
                r.timeout_secs,
                "retrieval.timeout_secs",
                &source,
                attribution,
            );
        }

        if let Some(st) = file.storage {
            layer(&mut self.storage.data_dir, st.data_dir, "storage.data_dir", &source, attribution);
        }

        if let Some(g) = file.generation {
            layer(
                &mut self.generation.deadline_secs,
                g.deadline_secs,
                "generation.deadline_secs",
                &source,
                attribution,
            );
        }
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        let source = ConfigSource::Cli;
        let attribution = &mut self.source_attribution;
        layer(
            &mut self.storage.data_dir,
            cli.data_dir.clone(),
            "storage.data_dir",
            &source,
            attribution,
        );
        layer(
            &mut self.synthesis.auto_continue,
            cli.auto_continue,
            "synthesis.auto_continue",
            &source,
            attribution,
        );
        layer(
            &mut self.generation.deadline_secs,
            cli.deadline_secs,
            "generation.deadline_secs",
            &source,
            attribution,
        );
        layer(
            &mut self.retrieval.endpoint,
            cli.retrieval_endpoint.clone(),
            "retrieval.endpoint",
            &source,
            attribution,
        );
    }

    fn config_anchor(config_path: &Path) -> Option<PathBuf> {
        let dir = config_path.parent()?;
        if dir.file_name().is_some_and(|name| name == ".rfpgen") {
            dir.parent().map(Path::to_path_buf)
        } else {
            Some(dir.to_path_buf())
        }
    }

    /// `$RFPGEN_HOME/config.toml` when the variable is set and the file exists.
    fn home_config_file() -> Option<PathBuf> {
        let home = env::var_os(RFPGEN_HOME_ENV)?;
        let path = PathBuf::from(home).join("config.toml");
        path.exists().then_some(path)
    }

    /// Search upward from `start_dir` for `.rfpgen/config.toml`, stopping at a
    /// repository root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".rfpgen").join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).map_err(|e| {
                    rfpgen_utils::error::ConfigError::InvalidFile(format!(
                        "{}: {}",
                        path.display(),
                        e.message()
                    ))
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let dir = root.join(".rfpgen");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_discover_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();

        let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();

        assert_eq!(config.synthesis_min_providers(), 2);
        assert_eq!(
            config.source_attribution.get("synthesis.min_providers"),
            Some(&ConfigSource::Default)
        );
        assert!(config.retrieval.endpoint.is_none());
    }

    #[test]
    #[serial]
    fn test_discover_finds_config_in_parent_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(
            temp.path(),
            r#"
[providers.anthropic]
model = "claude-3-5-sonnet-latest"
fallback_model = "claude-3-haiku-20240307"

[synthesis]
min_providers = 3
auto_continue = false

[credentials]
openai = "env:CORP_OPENAI_KEY"
"#,
        );
        let nested = temp.path().join("rfps").join("2026");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested, &CliArgs::default()).unwrap();

        let anthropic = config.provider_settings(ProviderId::Anthropic);
        assert_eq!(anthropic.model, "claude-3-5-sonnet-latest");
        assert_eq!(
            anthropic.fallback_model.as_deref(),
            Some("claude-3-haiku-20240307")
        );
        assert_eq!(config.synthesis_min_providers(), 3);
        assert!(!config.auto_continue());
        assert_eq!(config.credential_ref(ProviderId::OpenAi), "env:CORP_OPENAI_KEY");
        assert_eq!(
            config.source_attribution.get("providers.anthropic.model"),
            Some(&ConfigSource::Config)
        );
    }

    #[test]
    #[serial]
    fn test_cli_overrides_file_values() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(
            temp.path(),
            r#"
[synthesis]
auto_continue = true

[generation]
deadline_secs = 120
"#,
        );

        let cli = CliArgs {
            auto_continue: Some(false),
            deadline_secs: Some(30),
            ..CliArgs::default()
        };
        let config = Config::discover_from(temp.path(), &cli).unwrap();

        assert!(!config.auto_continue());
        assert_eq!(config.generation.deadline_secs, Some(30));
        assert_eq!(
            config.source_attribution.get("generation.deadline_secs"),
            Some(&ConfigSource::Cli)
        );
    }

    #[test]
    #[serial]
    fn test_relative_data_dir_is_anchored_at_config_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[storage]\ndata_dir = \"store\"\n");

        let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();

        assert_eq!(config.data_dir(), temp.path().join("store"));
    }

    #[test]
    #[serial]
    fn test_invalid_toml_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[synthesis\nmin_providers = 2");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration file"));
    }

    #[test]
    #[serial]
    fn test_explicit_missing_path_is_not_found() {
        let temp = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(temp.path().join("nope.toml")),
            ..CliArgs::default()
        };
        let err = Config::discover_from(temp.path(), &cli).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    #[serial]
    fn test_out_of_range_value_fails_validation() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[synthesis]\nmin_providers = 4\n");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(err.to_string().contains("synthesis.min_providers"));
    }

    #[test]
    #[serial]
    fn test_rfpgen_home_takes_precedence_over_upward_search() {
        let project = TempDir::new().unwrap();
        fs::create_dir(project.path().join(".git")).unwrap();
        write_config(project.path(), "[synthesis]\nmin_providers = 1\n");

        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.toml"),
            "[synthesis]\nmin_providers = 3\n[storage]\ndata_dir = \"data\"\n",
        )
        .unwrap();

        unsafe {
            env::set_var(RFPGEN_HOME_ENV, home.path());
        }
        let result = Config::discover_from(project.path(), &CliArgs::default());
        unsafe {
            env::remove_var(RFPGEN_HOME_ENV);
        }

        let config = result.unwrap();
        assert_eq!(config.synthesis_min_providers(), 3);
        assert_eq!(config.data_dir(), home.path().join("data"));
    }
}
