//! Provider configuration.
//!
//! Loaded from a TOML file or straight from environment variables.  The
//! binary calls `dotenvy` before `from_env`, so a local `.env` works too.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

const ENV_PROVIDER: &str = "FRONTDESK_LLM_PROVIDER";
const ENV_MODEL: &str = "FRONTDESK_LLM_MODEL";
const ENV_DEEPSEEK_KEY: &str = "DEEPSEEK_API_KEY";
const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";

fn default_provider() -> String {
    "deepseek".to_owned()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Which LLM backend to use and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider name: `"deepseek"` or `"openai"`.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for the selected provider.
    #[serde(default)]
    pub api_key: String,

    /// Model override; each provider has a sensible default.
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL override, for OpenAI-compatible gateways.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: None,
            base_url: None,
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Build a config from environment variables.
    ///
    /// `FRONTDESK_LLM_PROVIDER` selects the backend (default `deepseek`),
    /// `FRONTDESK_LLM_MODEL` optionally overrides the model, and the API key
    /// comes from the provider's conventional variable (`DEEPSEEK_API_KEY`
    /// or `OPENAI_API_KEY`).
    pub fn from_env() -> Result<Self> {
        let provider = std::env::var(ENV_PROVIDER)
            .map(|p| p.trim().to_lowercase())
            .unwrap_or_else(|_| default_provider());

        let key_var = match provider.as_str() {
            "deepseek" => ENV_DEEPSEEK_KEY,
            "openai" => ENV_OPENAI_KEY,
            other => {
                return Err(AgentError::UnknownProvider {
                    name: other.to_owned(),
                    available: crate::llm::factory::available_providers().join(", "),
                });
            }
        };
        let api_key = std::env::var(key_var).unwrap_or_default();
        if api_key.is_empty() {
            return Err(AgentError::MissingApiKey { provider });
        }

        Ok(Self {
            provider,
            api_key,
            model: std::env::var(ENV_MODEL).ok().filter(|m| !m.is_empty()),
            base_url: None,
            request_timeout_secs: default_timeout_secs(),
        })
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| AgentError::ConfigError {
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        toml::from_str(&raw).map_err(|e| AgentError::ConfigError {
            reason: format!("invalid config {}: {e}", path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_roundtrip_with_defaults() {
        let cfg: AiConfig = toml::from_str(
            r#"
            provider = "openai"
            api_key = "sk-test"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.api_key, "sk-test");
        assert!(cfg.model.is_none());
        assert_eq!(cfg.request_timeout_secs, 60);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: AiConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.provider, "deepseek");
        assert!(cfg.api_key.is_empty());
    }
}
