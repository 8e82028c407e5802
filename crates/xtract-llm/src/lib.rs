//! LLM backend abstraction for xtract
//!
//! Every provider implements [`LlmBackend`], so the engine can run against the
//! OpenAI-compatible HTTP backend in production and a [`ScriptedBackend`] in tests.

mod http_client;
mod logged_backend;
mod openai_backend;
#[cfg(any(test, feature = "test-utils"))]
mod scripted_backend;
mod types;

use std::sync::Arc;

pub use logged_backend::LoggedBackend;
pub use openai_backend::{HttpParams, OpenAiBackend};
#[cfg(any(test, feature = "test-utils"))]
pub use scripted_backend::ScriptedBackend;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
pub use xtract_utils::error::LlmError;

use xtract_config::LlmConfig;

/// Build the production backend: the OpenAI-compatible client wrapped in
/// invocation logging.
///
/// One backend is shared by all three model roles; each invocation carries its
/// own model and output budget.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` if the API key is missing or the HTTP
/// client cannot be constructed.
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let backend = OpenAiBackend::new_from_config(config)?;
    Ok(Arc::new(LoggedBackend::new(Arc::new(backend))))
}

#[cfg(test)]
mod factory_tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_config_requires_api_key() {
        let config = LlmConfig {
            api_key_env: "XTRACT_FACTORY_TEST_KEY".to_string(),
            ..LlmConfig::default()
        };
        unsafe {
            std::env::remove_var(&config.api_key_env);
        }
        assert!(matches!(
            from_config(&config),
            Err(LlmError::Misconfiguration(_))
        ));

        unsafe {
            std::env::set_var(&config.api_key_env, "sk-factory");
        }
        let built = from_config(&config);
        unsafe {
            std::env::remove_var(&config.api_key_env);
        }
        assert!(built.is_ok());
    }
}
