//! Gateway configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SERVICE_PORT` | `3001` |
//! | `MCP_SERVER_COMMAND` | `patientdata-mcp` |
//! | `MCP_TIMEOUT_MS` | `5000` |
//! | `GROQ_API_KEY` | unset (chat disabled) |
//! | `GROQ_BASE_URL` | `https://api.groq.com/openai/v1` |
//! | `GROQ_MODEL` | `llama-3.1-8b-instant` |

use std::fmt;
use std::time::Duration;

use patientdata_bridge::BridgeConfig;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MCP_COMMAND: &str = "patientdata-mcp";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SERVICE_PORT must be a port number, got '{value}'")]
    InvalidPort { value: String },

    #[error("MCP_SERVER_COMMAND must name a program")]
    EmptyCommand,

    #[error("MCP_TIMEOUT_MS must be a positive integer, got '{value}'")]
    InvalidTimeout { value: String },
}

/// Credentials and model for the completion oracle.
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub bridge: BridgeConfig,
    /// `None` when no API key is configured; only `/api/chat` is affected.
    pub llm: Option<LlmConfig>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("SERVICE_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value })?,
            None => DEFAULT_PORT,
        };

        let command = lookup("MCP_SERVER_COMMAND").unwrap_or_else(|| DEFAULT_MCP_COMMAND.into());
        let mut bridge =
            BridgeConfig::from_command_line(&command).ok_or(ConfigError::EmptyCommand)?;

        if let Some(value) = lookup("MCP_TIMEOUT_MS") {
            let ms = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidTimeout { value })?;
            bridge.timings.timeout = Duration::from_millis(ms);
        }

        let llm = lookup(API_KEY_ENV)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(|api_key| LlmConfig {
                api_key,
                base_url: lookup("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.into()),
                model: lookup("GROQ_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.into()),
            });

        Ok(Self { port, bridge, llm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.bridge.program, "patientdata-mcp");
        assert_eq!(config.bridge.timings.timeout, Duration::from_secs(5));
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("SERVICE_PORT", "8080"),
            ("MCP_SERVER_COMMAND", "patientdata-mcp --data /tmp/p.json"),
            ("MCP_TIMEOUT_MS", "750"),
            ("GROQ_API_KEY", "gsk_test"),
            ("GROQ_MODEL", "other-model"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bridge.args, vec!["--data", "/tmp/p.json"]);
        assert_eq!(config.bridge.timings.timeout, Duration::from_millis(750));
        let llm = config.llm.unwrap();
        assert_eq!(llm.api_key, "gsk_test");
        assert_eq!(llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(llm.model, "other-model");
    }

    #[test]
    fn test_blank_api_key_disables_chat() {
        assert!(config(&[("GROQ_API_KEY", "   ")]).unwrap().llm.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert_eq!(
            config(&[("SERVICE_PORT", "http")]).unwrap_err(),
            ConfigError::InvalidPort {
                value: "http".to_string()
            }
        );
        assert_eq!(
            config(&[("MCP_SERVER_COMMAND", "  ")]).unwrap_err(),
            ConfigError::EmptyCommand
        );
        assert!(matches!(
            config(&[("MCP_TIMEOUT_MS", "0")]).unwrap_err(),
            ConfigError::InvalidTimeout { .. }
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let llm = LlmConfig {
            api_key: "gsk_secret".to_string(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
        };
        assert!(!format!("{:?}", llm).contains("gsk_secret"));
    }
}
