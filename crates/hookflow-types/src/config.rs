//! Global configuration types for Hookflow.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! server bind address, tool execution budgets, email providers and the
//! database connections available to DATABASE tools.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Hookflow platform.
///
/// Loaded from `~/.hookflow/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Email providers available to EMAIL tools.
    #[serde(default)]
    pub email: Vec<EmailProviderConfig>,

    /// Connection identifier -> SQLite URL for DATABASE tools.
    #[serde(default)]
    pub databases: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Execution budgets applied when a tool does not set its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_http_timeout_secs")]
    pub default_http_timeout_secs: u64,
    #[serde(default = "default_custom_timeout_secs")]
    pub custom_timeout_secs: u64,
    #[serde(default = "default_database_timeout_secs")]
    pub database_timeout_secs: u64,
    #[serde(default = "default_max_custom_output_bytes")]
    pub max_custom_output_bytes: usize,
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_custom_timeout_secs() -> u64 {
    30
}

fn default_database_timeout_secs() -> u64 {
    30
}

fn default_max_custom_output_bytes() -> usize {
    1024 * 1024
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            default_http_timeout_secs: default_http_timeout_secs(),
            custom_timeout_secs: default_custom_timeout_secs(),
            database_timeout_secs: default_database_timeout_secs(),
            max_custom_output_bytes: default_max_custom_output_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// How long shutdown waits for in-flight dispatched work.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

/// An HTTP email provider (JSON POST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailProviderConfig {
    /// Name referenced by `EmailToolConfig::provider`.
    pub name: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub from: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tools.default_http_timeout_secs, 30);
        assert_eq!(config.dispatch.shutdown_grace_secs, 10);
        assert!(config.email.is_empty());
        assert!(config.databases.is_empty());
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.tools.custom_timeout_secs, 30);
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
[server]
port = 9000

[tools]
custom_timeout_secs = 5

[databases]
analytics = "sqlite:///var/lib/hookflow/analytics.db"

[[email]]
name = "postmark"
endpoint = "https://api.postmarkapp.com/email"
api_key = "pm-key"
from = "bot@example.com"
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.tools.custom_timeout_secs, 5);
        assert_eq!(config.tools.default_http_timeout_secs, 30);
        assert_eq!(config.databases.len(), 1);
        assert_eq!(config.email[0].name, "postmark");
        assert_eq!(config.email[0].api_key.as_deref(), Some("pm-key"));
    }
}
