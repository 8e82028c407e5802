use std::net::SocketAddr;

use xtract_utils::error::ConfigError;

use crate::model::{Config, ModelProfile};

/// Upper bound for any profile's output budget
const MAX_TOKENS_LIMIT: u32 = 4096;

/// Upper bound for the per-invocation timeout
const MAX_TIMEOUT_SECS: u64 = 600;

fn invalid(key: impl Into<String>, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.llm.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(invalid(
                "llm.base_url",
                format!("'{}' must start with http:// or https://", self.llm.base_url),
            ));
        }

        if self.llm.api_key_env.trim().is_empty() {
            return Err(invalid("llm.api_key_env", "must not be empty"));
        }

        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be greater than 0"));
        }
        if self.llm.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "llm.timeout_secs",
                format!("exceeds maximum limit of {MAX_TIMEOUT_SECS} seconds"),
            ));
        }

        validate_profile("extract", &self.llm.extract)?;
        validate_profile("validate", &self.llm.validate)?;
        validate_profile("resolve", &self.llm.resolve)?;

        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "server.bind",
                format!("'{}' is not a socket address (host:port)", self.server.bind),
            ));
        }

        Ok(())
    }
}

fn validate_profile(role: &str, profile: &ModelProfile) -> Result<(), ConfigError> {
    if profile.model.trim().is_empty() {
        return Err(invalid(format!("llm.{role}.model"), "must not be empty"));
    }
    if profile.max_tokens == 0 {
        return Err(invalid(
            format!("llm.{role}.max_tokens"),
            "must be greater than 0",
        ));
    }
    if profile.max_tokens > MAX_TOKENS_LIMIT {
        return Err(invalid(
            format!("llm.{role}.max_tokens"),
            format!("exceeds maximum limit of {MAX_TOKENS_LIMIT}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid_key(config: &Config, expected_key: &str) {
        match config.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected InvalidValue for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let mut config = Config::default();
        config.llm.base_url = "ftp://example.com".to_string();
        assert_invalid_key(&config, "llm.base_url");
    }

    #[test]
    fn test_rejects_zero_and_oversized_budgets() {
        let mut config = Config::default();
        config.llm.validate.max_tokens = 0;
        assert_invalid_key(&config, "llm.validate.max_tokens");

        let mut config = Config::default();
        config.llm.resolve.max_tokens = MAX_TOKENS_LIMIT + 1;
        assert_invalid_key(&config, "llm.resolve.max_tokens");
    }

    #[test]
    fn test_rejects_blank_model() {
        let mut config = Config::default();
        config.llm.extract.model = "  ".to_string();
        assert_invalid_key(&config, "llm.extract.model");
    }

    #[test]
    fn test_rejects_timeout_out_of_range() {
        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert_invalid_key(&config, "llm.timeout_secs");

        config.llm.timeout_secs = MAX_TIMEOUT_SECS + 1;
        assert_invalid_key(&config, "llm.timeout_secs");
    }

    #[test]
    fn test_rejects_unparseable_bind() {
        let mut config = Config::default();
        config.server.bind = "localhost".to_string();
        assert_invalid_key(&config, "server.bind");
    }
}
