//! Service configuration.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Relay configuration, loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the Phabricator install.
    pub phabricator_url: String,
    /// Conduit API token.
    pub phabricator_token: String,
    /// Slack bot token (`chat:write` and `users:read` scopes).
    pub slack_token: String,
    /// Repository → channel map. Must contain `__default__`; may contain
    /// `__debug__` for skipped-event notes.
    pub channels: HashMap<String, String>,
    /// Default log level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Address the webhook server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config = Config::parse(
            r##"{
                "phabricator_url": "https://phab.example.com",
                "phabricator_token": "api-abc",
                "slack_token": "xoxb-def",
                "channels": {"__default__": "#general", "gadgets": "#gadgets-dev"},
                "log_level": "debug",
                "listen_addr": "127.0.0.1:9000"
            }"##,
        )
        .unwrap();

        assert_eq!(config.phabricator_url, "https://phab.example.com");
        assert_eq!(config.channels["gadgets"], "#gadgets-dev");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
    }

    #[test]
    fn log_level_and_listen_addr_have_defaults() {
        let config = Config::parse(
            r##"{
                "phabricator_url": "https://phab.example.com",
                "phabricator_token": "api-abc",
                "slack_token": "xoxb-def",
                "channels": {"__default__": "#general"}
            }"##,
        )
        .unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
    }

    #[test]
    fn missing_tokens_fail_to_parse() {
        let err = Config::parse(r#"{"channels": {}}"#).unwrap_err();
        assert!(err.to_string().contains("Failed to parse configuration"));
    }
}
