//! Configuration management for Growth Chat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{GrowthError, Result};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Growth Chat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Local persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Chat behaviour settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Theme settings
    #[serde(default)]
    pub theme: ThemeConfig,
}

/// Backend server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the Growth backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for each HTTP request (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Request streamed replies from the chat endpoint
    #[serde(default)]
    pub stream: bool,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            stream: false,
        }
    }
}

/// Local persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the local store file; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Chat behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum characters accepted in a single message
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Characters of the first user message kept as the chat title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

fn default_max_message_chars() -> usize {
    4000
}

fn default_title_max_chars() -> usize {
    30
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

/// Theme configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Theme used when nothing has been stored yet ("light" or "dark")
    #[serde(default = "default_theme")]
    pub default: String,
}

fn default_theme() -> String {
    "light".to_string()
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            default: default_theme(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GrowthError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| GrowthError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("GROWTH_SERVER_URL") {
            self.server.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("GROWTH_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.server.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid GROWTH_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(stream) = std::env::var("GROWTH_STREAM") {
            match stream.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.server.stream = true,
                "0" | "false" | "no" | "off" => self.server.stream = false,
                _ => tracing::warn!("Invalid value for GROWTH_STREAM: {}", stream),
            }
        }

        if let Ok(path) = std::env::var("GROWTH_STORE_PATH") {
            tracing::debug!(path = %path, "Env override: GROWTH_STORE_PATH");
            self.storage.path = Some(path);
        }

        if let Ok(theme) = std::env::var("GROWTH_THEME") {
            self.theme.default = theme;
        }

        if let Ok(max_chars) = std::env::var("GROWTH_MAX_MESSAGE_CHARS") {
            if let Ok(value) = max_chars.parse() {
                self.chat.max_message_chars = value;
            } else {
                tracing::warn!("Invalid GROWTH_MAX_MESSAGE_CHARS: {}", max_chars);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(path) = &cli.store_path {
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.server.base_url).map_err(|e| {
            GrowthError::Config(format!(
                "Invalid server.base_url '{}': {}",
                self.server.base_url, e
            ))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GrowthError::Config(format!(
                "server.base_url must use http or https, got: {}",
                url.scheme()
            ))
            .into());
        }

        if self.server.timeout_seconds == 0 {
            return Err(GrowthError::Config(
                "server.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.max_message_chars == 0 {
            return Err(GrowthError::Config(
                "chat.max_message_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.title_max_chars == 0 {
            return Err(GrowthError::Config(
                "chat.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        Theme::parse_str(&self.theme.default).map_err(GrowthError::Config)?;

        if let Some(path) = &self.storage.path {
            if path.trim().is_empty() {
                return Err(
                    GrowthError::Config("storage.path cannot be empty".to_string()).into(),
                );
            }
        }

        Ok(())
    }

    /// Theme to use when the store holds no preference
    pub fn default_theme(&self) -> Theme {
        Theme::parse_str(&self.theme.default).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use serial_test::serial;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:5000");
        assert_eq!(config.server.timeout_seconds, 120);
        assert!(!config.server.stream);
        assert_eq!(config.chat.max_message_chars, 4000);
        assert_eq!(config.chat.title_max_chars, 30);
        assert_eq!(config.default_theme(), Theme::Light);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parses_partial_yaml() {
        let yaml = r#"
server:
  base_url: "https://growth.example.com"
  stream: true
theme:
  default: dark
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.base_url, "https://growth.example.com");
        assert!(config.server.stream);
        assert_eq!(config.server.timeout_seconds, 120);
        assert_eq!(config.default_theme(), Theme::Dark);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let mut config = Config::default();
        config.server.base_url = "localhost".to_string();
        assert!(config.validate().is_err());

        config.server.base_url = "ftp://localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let mut config = Config::default();
        config.server.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chat.max_message_chars = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chat.title_max_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_theme() {
        let mut config = Config::default();
        config.theme.default = "sepia".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sepia"));
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        let cli = Cli::try_parse_from(["growth", "chats", "list"]).unwrap();
        let config = Config::load("/nonexistent/growth.yaml", &cli).unwrap();
        assert_eq!(config.chat.max_message_chars, 4000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "chat:\n  title_max_chars: 12\n").unwrap();

        let cli = Cli::try_parse_from(["growth", "chats", "list"]).unwrap();
        let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.chat.title_max_chars, 12);
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server: [unclosed").unwrap();

        let cli = Cli::try_parse_from(["growth", "chats", "list"]).unwrap();
        let err = Config::load(path.to_str().unwrap(), &cli).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_cli_store_path_override() {
        let cli =
            Cli::try_parse_from(["growth", "--store-path", "/tmp/g.db", "chats", "list"]).unwrap();
        let mut config = Config::default();
        config.apply_cli_overrides(&cli);
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/g.db"));
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        std::env::set_var("GROWTH_SERVER_URL", "http://backend:8080");
        std::env::set_var("GROWTH_STREAM", "true");
        std::env::set_var("GROWTH_TIMEOUT_SECONDS", "not-a-number");
        std::env::set_var("GROWTH_MAX_MESSAGE_CHARS", "500");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.server.base_url, "http://backend:8080");
        assert!(config.server.stream);
        assert_eq!(config.server.timeout_seconds, 120);
        assert_eq!(config.chat.max_message_chars, 500);

        std::env::remove_var("GROWTH_SERVER_URL");
        std::env::remove_var("GROWTH_STREAM");
        std::env::remove_var("GROWTH_TIMEOUT_SECONDS");
        std::env::remove_var("GROWTH_MAX_MESSAGE_CHARS");
    }
}
