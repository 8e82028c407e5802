use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::redaction::redact_error_message;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `XtractError` is what every extraction entry point returns. It provides:
/// - Detailed error information for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes and HTTP status classes
///
/// # Error Categories
///
/// | Category | Variants |
/// |----------|----------|
/// | `Input` | `MalformedInput` |
/// | `Template` | `UnknownTemplate` |
/// | `Configuration` | `Config`, `Llm(Misconfiguration)` |
/// | `Provider` | `Llm(..)` |
/// | `Internal` | `Prompt`, `Io` |
///
/// Library code returns `XtractError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum XtractError {
    #[error("Malformed request: {0}")]
    MalformedInput(String),

    #[error("Unknown template '{template}'")]
    UnknownTemplate {
        template: String,
        available: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt rendering error: {0}")]
    Prompt(#[from] PromptError),

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
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Template,
    Provider,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Input => write!(f, "Input"),
            Self::Template => write!(f, "Template"),
            Self::Provider => write!(f, "LLM Provider"),
            Self::Internal => write!(f, "Internal"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [llm] and [server] sections."
                    .to_string(),
            ),
            Self::DiscoveryFailed { .. } => Some(
                "xtract looks for --config, then $XTRACT_HOME/config.toml, then .xtract/config.toml \
                 in the current directory and its parents."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of your configuration file".to_string(),
                "Run 'xtract config' to see the effective configuration".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![
                format!("Correct the value of '{key}'"),
                "Remove the key to fall back to the built-in default".to_string(),
            ],
            Self::DiscoveryFailed { .. } => {
                vec!["Pass an explicit path with --config".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// LLM backend errors
///
/// Every provider failure maps to one of these. None of them is retried by xtract;
/// a failed invocation fails its field and therefore its whole request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, request construction)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error (missing API key, bad base URL)
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Provider answered but the body was not a usable completion
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether the failure is worth retrying by the caller.
    ///
    /// xtract itself never retries; this is surfaced so clients can decide.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ProviderQuota(_) | Self::ProviderOutage(_) | Self::Timeout { .. }
        )
    }
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {:?}", duration)
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::InvalidResponse(msg) => format!("LLM provider returned an unusable response: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => Some(
                "Transport errors occur when the LLM provider cannot be reached.".to_string(),
            ),
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate a missing or invalid API key.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Timeouts occur when an LLM invocation takes longer than llm.timeout_secs."
                    .to_string(),
            ),
            Self::Misconfiguration(_) => Some(
                "Configuration errors indicate missing or invalid LLM provider settings."
                    .to_string(),
            ),
            Self::InvalidResponse(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec![
                "Check network connectivity to the provider".to_string(),
                "Verify llm.base_url in your configuration".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that the API key environment variable is set and valid".to_string(),
            ],
            Self::ProviderQuota(_) | Self::ProviderOutage(_) => {
                vec!["Retry the request later".to_string()]
            }
            Self::Timeout { .. } => vec![
                "Increase llm.timeout_secs or pass --timeout-secs".to_string(),
            ],
            Self::Misconfiguration(_) => vec![
                "Set the API key variable named by llm.api_key_env (default OPENAI_API_KEY)"
                    .to_string(),
            ],
            Self::InvalidResponse(_) => vec![
                "Verify that llm.base_url points at an OpenAI-compatible chat completions endpoint"
                    .to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Misconfiguration(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Provider,
        }
    }
}

/// Prompt rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt '{prompt}' references variable '{{{name}}}' but no value was supplied")]
    MissingVariable { prompt: String, name: String },

    #[error("prompt '{prompt}' has an unterminated placeholder at byte {offset}")]
    UnterminatedPlaceholder { prompt: String, offset: usize },
}

impl UserFriendlyError for XtractError {
    fn user_message(&self) -> String {
        match self {
            Self::MalformedInput(reason) => format!("The request is malformed: {reason}"),
            Self::UnknownTemplate { template, .. } => {
                format!("Template '{template}' is not registered")
            }
            Self::Config(err) => err.user_message(),
            Self::Llm(err) => err.user_message(),
            Self::Prompt(err) => format!("Failed to render prompt: {err}"),
            Self::Io(err) => format!("I/O failure: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::MalformedInput(_) => Some(
                "Requests look like {\"request_id\": .., \"in\": {\"transcript\": [{\"speaker\": .., \
                 \"message\": ..}], \"language\": ..}, \"out\": \"<template>\"}."
                    .to_string(),
            ),
            Self::UnknownTemplate { available, .. } => {
                Some(format!("Registered templates: {}", available.join(", ")))
            }
            Self::Config(err) => err.context(),
            Self::Llm(err) => err.context(),
            Self::Prompt(_) | Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MalformedInput(_) => {
                vec!["Check the request body against the documented shape".to_string()]
            }
            Self::UnknownTemplate { .. } => {
                vec!["Run 'xtract templates' to list the registered templates".to_string()]
            }
            Self::Config(err) => err.suggestions(),
            Self::Llm(err) => err.suggestions(),
            Self::Prompt(_) | Self::Io(_) => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedInput(_) => ErrorCategory::Input,
            Self::UnknownTemplate { .. } => ErrorCategory::Template,
            Self::Config(err) => err.category(),
            Self::Llm(err) => err.category(),
            Self::Prompt(_) | Self::Io(_) => ErrorCategory::Internal,
        }
    }
}

impl XtractError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// The output is passed through credential redaction before it is returned.
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

        redact_error_message(&output)
    }

    /// Map this error to the appropriate CLI exit code.
    ///
    /// | Exit Code | Name | Description |
    /// |-----------|------|-------------|
    /// | 1 | INTERNAL | General failure |
    /// | 2 | CLI_ARGS | Invalid configuration or LLM misconfiguration |
    /// | 4 | INVALID_INPUT | Malformed request |
    /// | 5 | UNKNOWN_TEMPLATE | Template not registered |
    /// | 10 | LLM_TIMEOUT | Provider call timed out |
    /// | 70 | LLM_FAILURE | Provider call failed |
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            XtractError::Config(_) => ExitCode::CLI_ARGS,
            XtractError::MalformedInput(_) => ExitCode::INVALID_INPUT,
            XtractError::UnknownTemplate { .. } => ExitCode::UNKNOWN_TEMPLATE,
            XtractError::Llm(llm_err) => match llm_err {
                LlmError::Timeout { .. } => ExitCode::LLM_TIMEOUT,
                LlmError::Misconfiguration(_) => ExitCode::CLI_ARGS,
                LlmError::Transport(_)
                | LlmError::ProviderAuth(_)
                | LlmError::ProviderQuota(_)
                | LlmError::ProviderOutage(_)
                | LlmError::InvalidResponse(_) => ExitCode::LLM_FAILURE,
            },
            XtractError::Prompt(_) | XtractError::Io(_) => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(
            XtractError::MalformedInput("x".into()).to_exit_code(),
            ExitCode::INVALID_INPUT
        );
        assert_eq!(
            XtractError::UnknownTemplate {
                template: "nope".into(),
                available: vec!["soap_en".into()],
            }
            .to_exit_code(),
            ExitCode::UNKNOWN_TEMPLATE
        );
        assert_eq!(
            XtractError::Llm(LlmError::Timeout {
                duration: Duration::from_secs(3)
            })
            .to_exit_code(),
            ExitCode::LLM_TIMEOUT
        );
        assert_eq!(
            XtractError::Llm(LlmError::ProviderQuota("429".into())).to_exit_code(),
            ExitCode::LLM_FAILURE
        );
        assert_eq!(
            XtractError::Llm(LlmError::Misconfiguration("no key".into())).to_exit_code(),
            ExitCode::CLI_ARGS
        );
    }

    #[test]
    fn test_unknown_template_lists_available_templates() {
        let err = XtractError::UnknownTemplate {
            template: "soap_xx".into(),
            available: vec!["soap_en".into()],
        };
        let text = err.display_for_user();
        assert!(text.contains("soap_xx"));
        assert!(text.contains("Registered templates: soap_en"));
        assert!(text.contains("xtract templates"));
        assert_eq!(err.category(), ErrorCategory::Template);
    }

    #[test]
    fn test_display_for_user_redacts_keys() {
        let err = XtractError::Llm(LlmError::ProviderAuth(
            "rejected key sk-proj-abcdefghijklmnopqrstuvwxyz0123456789".into(),
        ));
        let text = err.display_for_user();
        assert!(!text.contains("abcdefghijklmnopqrstuvwxyz0123456789"));
        assert!(text.contains("[REDACTED_KEY]"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::ProviderOutage("503".into()).is_transient());
        assert!(LlmError::Timeout { duration: Duration::from_secs(1) }.is_transient());
        assert!(!LlmError::ProviderAuth("401".into()).is_transient());
        assert!(!LlmError::InvalidResponse("no choices".into()).is_transient());
    }

    #[test]
    fn test_misconfiguration_is_a_configuration_error() {
        let err = XtractError::Llm(LlmError::Misconfiguration("missing key".into()));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
