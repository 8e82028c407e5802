use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use xtract_utils::error::ConfigError;
use xtract_utils::types::ConfigSource;

use crate::model::{CliArgs, Config};

/// Environment variable pointing at a directory that holds `config.toml`
const XTRACT_HOME_ENV: &str = "XTRACT_HOME";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    llm: Option<TomlLlm>,
    server: Option<TomlServer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLlm {
    base_url: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
    extract: Option<TomlProfile>,
    validate: Option<TomlProfile>,
    resolve: Option<TomlProfile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlProfile {
    model: Option<String>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlServer {
    bind: Option<String>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory as the starting point for the upward
    /// search when no explicit path is provided.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read or parsed, or if the
    /// resulting configuration fails validation.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = env::current_dir().map_err(|e| ConfigError::DiscoveryFailed {
            reason: format!("Failed to get current directory: {e}"),
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid depending on the
    /// process working directory.
    ///
    /// # Errors
    ///
    /// See [`Config::discover`].
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::DiscoveryFailed {
                        reason: format!("Config file {} does not exist", explicit.display()),
                    });
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            debug!(path = %path.display(), "Loading config file");
            let file_config = Self::load_config_file(path)?;
            config.apply_file(file_config);
        }

        config.apply_cli(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Locate a config file without loading it.
    ///
    /// Order: `$XTRACT_HOME/config.toml`, then `.xtract/config.toml` in
    /// `start_dir` and each parent, stopping at a repository root marker.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        if let Some(home) = env::var_os(XTRACT_HOME_ENV) {
            let candidate = PathBuf::from(home).join("config.toml");
            if candidate.exists() {
                return Some(candidate);
            }
        }

        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".xtract").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
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

        None
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to read {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))
    }

    fn apply_file(&mut self, file: TomlConfig) {
        let source = ConfigSource::Config;

        if let Some(llm) = file.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
                self.attribute("llm.base_url", source);
            }
            if let Some(api_key_env) = llm.api_key_env {
                self.llm.api_key_env = api_key_env;
                self.attribute("llm.api_key_env", source);
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
                self.attribute("llm.timeout_secs", source);
            }
            if let Some(profile) = llm.extract {
                self.apply_profile("extract", profile);
            }
            if let Some(profile) = llm.validate {
                self.apply_profile("validate", profile);
            }
            if let Some(profile) = llm.resolve {
                self.apply_profile("resolve", profile);
            }
        }

        if let Some(server) = file.server
            && let Some(bind) = server.bind
        {
            self.server.bind = bind;
            self.attribute("server.bind", source);
        }
    }

    fn apply_profile(&mut self, role: &str, profile: TomlProfile) {
        let target = match role {
            "extract" => &mut self.llm.extract,
            "validate" => &mut self.llm.validate,
            _ => &mut self.llm.resolve,
        };
        let mut touched = Vec::new();
        if let Some(model) = profile.model {
            target.model = model;
            touched.push(format!("llm.{role}.model"));
        }
        if let Some(max_tokens) = profile.max_tokens {
            target.max_tokens = max_tokens;
            touched.push(format!("llm.{role}.max_tokens"));
        }
        for key in touched {
            self.attribute(&key, ConfigSource::Config);
        }
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        let source = ConfigSource::Cli;

        if let Some(bind) = &cli.bind {
            self.server.bind = bind.clone();
            self.attribute("server.bind", source);
        }
        if let Some(timeout_secs) = cli.timeout_secs {
            self.llm.timeout_secs = timeout_secs;
            self.attribute("llm.timeout_secs", source);
        }

        if let Some(model) = &cli.extract_model {
            self.llm.extract.model = model.clone();
            self.attribute("llm.extract.model", source);
        }
        if let Some(model) = &cli.validate_model {
            self.llm.validate.model = model.clone();
            self.attribute("llm.validate.model", source);
        }
        if let Some(model) = &cli.resolve_model {
            self.llm.resolve.model = model.clone();
            self.attribute("llm.resolve.model", source);
        }
    }

    fn attribute(&mut self, key: &str, source: ConfigSource) {
        self.source_attribution.insert(key.to_string(), source);
    }
}
