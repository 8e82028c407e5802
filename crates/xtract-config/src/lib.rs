//! Configuration for xtract
//!
//! Values are resolved with precedence CLI flags > config file > built-in defaults.
//! See [`Config::discover`] for the discovery rules.

mod discovery;
mod model;
mod validation;

pub use model::{
    CliArgs, Config, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_BIND, DEFAULT_TIMEOUT_SECS,
    LlmConfig, ModelProfile, PINNED_TEMPERATURE, ServerConfig,
};
pub use xtract_utils::types::ConfigSource;
