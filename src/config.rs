//! Configuration loaded from environment variables.
//!
//! `TELEGRAM_TOKEN` and `OPENAI_API_KEY` are required; their absence is fatal
//! at startup. Everything else has a default.

use crate::error::{Error, Result};

/// Default OpenAI-compatible API endpoint.
pub const DEFAULT_ENGINE_BASE_URL: &str = "https://api.openai.com";

/// Default model when `OPENAI_MODEL` is unset.
pub const DEFAULT_ENGINE_MODEL: &str = "gpt-4o-mini";

/// Default model request timeout in seconds.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 60;

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram Bot API token
    pub telegram_token: String,
    /// Model backend settings
    pub engine: EngineConfig,
}

/// Model backend configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_token = require(&lookup, "TELEGRAM_TOKEN")?;
        let api_key = require(&lookup, "OPENAI_API_KEY")?;

        let base_url = lookup("OPENAI_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENGINE_BASE_URL.to_string());
        let model = lookup("OPENAI_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENGINE_MODEL.to_string());
        let request_timeout_secs = lookup("ENGINE_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_ENGINE_TIMEOUT_SECS);

        Ok(Self {
            telegram_token,
            engine: EngineConfig {
                api_key,
                base_url,
                model,
                request_timeout_secs,
            },
        })
    }
}

fn require(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!(
            "{name} not found in environment variables"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn load(vars: &HashMap<String, String>) -> Result<Config> {
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn loads_with_defaults() {
        let vars = env(&[("TELEGRAM_TOKEN", "123:ABC"), ("OPENAI_API_KEY", "sk-test")]);
        let config = load(&vars).unwrap();
        assert_eq!(config.telegram_token, "123:ABC");
        assert_eq!(config.engine.api_key, "sk-test");
        assert_eq!(config.engine.base_url, DEFAULT_ENGINE_BASE_URL);
        assert_eq!(config.engine.model, DEFAULT_ENGINE_MODEL);
        assert_eq!(config.engine.request_timeout_secs, DEFAULT_ENGINE_TIMEOUT_SECS);
    }

    #[test]
    fn missing_telegram_token_is_fatal() {
        let vars = env(&[("OPENAI_API_KEY", "sk-test")]);
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("TELEGRAM_TOKEN"));
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let vars = env(&[("TELEGRAM_TOKEN", "123:ABC")]);
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn blank_token_is_treated_as_missing() {
        let vars = env(&[("TELEGRAM_TOKEN", "   "), ("OPENAI_API_KEY", "sk-test")]);
        assert!(load(&vars).is_err());
    }

    #[test]
    fn overrides_are_honored() {
        let vars = env(&[
            ("TELEGRAM_TOKEN", "123:ABC"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("ENGINE_TIMEOUT_SECS", "15"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.engine.base_url, "http://localhost:8080");
        assert_eq!(config.engine.model, "gpt-4o");
        assert_eq!(config.engine.request_timeout_secs, 15);
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        let vars = env(&[
            ("TELEGRAM_TOKEN", "123:ABC"),
            ("OPENAI_API_KEY", "sk-test"),
            ("ENGINE_TIMEOUT_SECS", "soon"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.engine.request_timeout_secs, DEFAULT_ENGINE_TIMEOUT_SECS);
    }
}
