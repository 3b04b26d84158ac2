//! Global configuration loader for Hookflow.
//!
//! Reads `config.toml` from the data directory (`~/.hookflow/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::{Path, PathBuf};

use hookflow_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "HOOKFLOW_DATA_DIR";

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the data directory.
///
/// Priority: explicit override (CLI flag), then `HOOKFLOW_DATA_DIR`, then
/// `~/.hookflow`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hookflow")
}

/// SQLite URL of the platform database inside `data_dir`.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}/hookflow.db?mode=rwc", data_dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.server.port, 8080);
        assert!(config.databases.is_empty());
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
[server]
host = "0.0.0.0"
port = 9090

[dispatch]
shutdown_grace_secs = 3

[[email]]
name = "relay"
endpoint = "https://mail.internal/send"
from = "noreply@example.com"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.dispatch.shutdown_grace_secs, 3);
        assert_eq!(config.email.len(), 1);
        assert!(config.email[0].api_key.is_none());
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tools.custom_timeout_secs, 30);
    }

    #[test]
    fn resolve_data_dir_prefers_explicit() {
        let dir = resolve_data_dir(Some(PathBuf::from("/tmp/hf")));
        assert_eq!(dir, PathBuf::from("/tmp/hf"));
    }

    #[test]
    fn database_url_points_into_data_dir() {
        let url = database_url(Path::new("/var/lib/hookflow"));
        assert_eq!(url, "sqlite:///var/lib/hookflow/hookflow.db?mode=rwc");
    }
}
