use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use xtract_utils::types::ConfigSource;

/// Default OpenAI-compatible chat completions endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default environment variable holding the provider API key
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default per-invocation timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default server bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Decoding temperature used by every model profile.
///
/// Not configurable: extraction, validation and resolution all decode greedily.
pub const PINNED_TEMPERATURE: f32 = 0.0;

/// Configuration for xtract operations.
///
/// # Configuration File Format
///
/// ```toml
/// [llm]
/// base_url = "https://api.openai.com/v1/chat/completions"
/// api_key_env = "OPENAI_API_KEY"
/// timeout_secs = 60
///
/// [llm.extract]
/// model = "gpt-4o-mini"
/// max_tokens = 200
///
/// [llm.validate]
/// model = "gpt-3.5-turbo"
/// max_tokens = 2
///
/// [llm.resolve]
/// model = "gpt-4o"
/// max_tokens = 300
///
/// [server]
/// bind = "127.0.0.1:8000"
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Source attribution for each setting (for `xtract config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Provider connection settings and the three model profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat completions endpoint
    pub base_url: String,
    /// Name of the environment variable that holds the API key
    pub api_key_env: String,
    /// Per-invocation timeout in seconds
    pub timeout_secs: u64,
    /// Cheap, fast model used for the first extraction
    pub extract: ModelProfile,
    /// Cheapest model, asked for a single `true`/`false` token
    pub validate: ModelProfile,
    /// Most capable model, used to re-extract when validation fails
    pub resolve: ModelProfile,
}

/// Model identifier plus output budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model: String,
    pub max_tokens: u32,
}

impl ModelProfile {
    #[must_use]
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
        }
    }

    /// Decoding temperature for this profile (always [`PINNED_TEMPERATURE`])
    #[must_use]
    pub const fn temperature(&self) -> f32 {
        PINNED_TEMPERATURE
    }

    #[must_use]
    pub fn default_extract() -> Self {
        Self::new("gpt-4o-mini", 200)
    }

    #[must_use]
    pub fn default_validate() -> Self {
        Self::new("gpt-3.5-turbo", 2)
    }

    #[must_use]
    pub fn default_resolve() -> Self {
        Self::new("gpt-4o", 300)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            extract: ModelProfile::default_extract(),
            validate: ModelProfile::default_validate(),
            resolve: ModelProfile::default_resolve(),
        }
    }
}

impl LlmConfig {
    /// Per-invocation timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Configuration overrides supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file path (skips discovery)
    pub config_path: Option<PathBuf>,
    /// Server bind address
    pub bind: Option<String>,
    /// Per-invocation timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Extraction model override
    pub extract_model: Option<String>,
    /// Validation model override
    pub validate_model: Option<String>,
    /// Resolution model override
    pub resolve_model: Option<String>,
}

/// Keys tracked in `source_attribution`, in display order
pub(crate) const ATTRIBUTED_KEYS: &[&str] = &[
    "llm.base_url",
    "llm.api_key_env",
    "llm.timeout_secs",
    "llm.extract.model",
    "llm.extract.max_tokens",
    "llm.validate.model",
    "llm.validate.max_tokens",
    "llm.resolve.model",
    "llm.resolve.max_tokens",
    "server.bind",
];

impl Default for Config {
    /// Built-in defaults, every key attributed to [`ConfigSource::Default`]
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
            source_attribution: ATTRIBUTED_KEYS
                .iter()
                .map(|key| ((*key).to_string(), ConfigSource::Default))
                .collect(),
        }
    }
}

impl Config {
    /// Effective settings as `(key, value, source)` rows, in a stable order.
    #[must_use]
    pub fn effective_settings(&self) -> Vec<(String, String, ConfigSource)> {
        ATTRIBUTED_KEYS
            .iter()
            .map(|key| {
                let value = match *key {
                    "llm.base_url" => self.llm.base_url.clone(),
                    "llm.api_key_env" => self.llm.api_key_env.clone(),
                    "llm.timeout_secs" => self.llm.timeout_secs.to_string(),
                    "llm.extract.model" => self.llm.extract.model.clone(),
                    "llm.extract.max_tokens" => self.llm.extract.max_tokens.to_string(),
                    "llm.validate.model" => self.llm.validate.model.clone(),
                    "llm.validate.max_tokens" => self.llm.validate.max_tokens.to_string(),
                    "llm.resolve.model" => self.llm.resolve.model.clone(),
                    "llm.resolve.max_tokens" => self.llm.resolve.max_tokens.to_string(),
                    "server.bind" => self.server.bind.clone(),
                    _ => String::new(),
                };
                let source = self
                    .source_attribution
                    .get(*key)
                    .copied()
                    .unwrap_or(ConfigSource::Default);
                ((*key).to_string(), value, source)
            })
            .collect()
    }
}
