//! Configuration file handling for vitotrol-cli

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Vitodata account login
    pub login: Option<String>,
    /// Vitodata account password
    pub password: Option<String>,
    /// Endpoint URL override
    pub server: Option<String>,
    /// Default device selector
    pub device: Option<String>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("vitotrol-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        login: Option<&str>,
        password: Option<&str>,
        server: Option<&str>,
        device: Option<&str>,
    ) -> MergedConfig {
        MergedConfig {
            login: login.map(String::from).or_else(|| self.login.clone()),
            password: password.map(String::from).or_else(|| self.password.clone()),
            server: server
                .map(String::from)
                .or_else(|| self.server.clone())
                .unwrap_or_else(|| vitotrol_client::DEFAULT_ENDPOINT.to_string()),
            device: device.map(String::from).or_else(|| self.device.clone()),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub login: Option<String>,
    pub password: Option<String>,
    pub server: String,
    pub device: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_win_over_config() {
        let config = Config {
            login: Some("conf-login".to_string()),
            password: Some("conf-pass".to_string()),
            server: Some("http://conf/".to_string()),
            device: None,
        };

        let merged = config.merge_with_args(Some("arg-login"), None, None, Some("VT 200"));
        assert_eq!(merged.login.as_deref(), Some("arg-login"));
        assert_eq!(merged.password.as_deref(), Some("conf-pass"));
        assert_eq!(merged.server, "http://conf/");
        assert_eq!(merged.device.as_deref(), Some("VT 200"));
    }

    #[test]
    fn default_server_is_production() {
        let merged = Config::default().merge_with_args(None, None, None, None);
        assert_eq!(merged.server, vitotrol_client::DEFAULT_ENDPOINT);
    }
}
