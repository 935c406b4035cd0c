//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/smartmark/config.toml)
//! 3. Environment variables (SMARTMARK_* prefix)
//!
//! Environment variables take precedence over config file values. Backend
//! credentials are carried here but never interpreted; they are handed to
//! whatever gateway implementation the embedder wires in.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::list::DEFAULT_PAGE_SIZE;

/// Environment variable prefix
const ENV_PREFIX: &str = "SMARTMARK";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Endpoint of the backend row store (optional)
    #[serde(default)]
    pub store_url: Option<String>,

    /// API key / anon credential for the backend (optional)
    #[serde(default)]
    pub store_key: Option<String>,

    /// Where the OAuth provider sends the browser after consent
    #[serde(default)]
    pub oauth_redirect: Option<String>,

    /// Bookmarks shown per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: None,
            store_key: None,
            oauth_redirect: None,
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load configuration from the default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (SMARTMARK_STORE_URL, SMARTMARK_STORE_KEY,
    ///    SMARTMARK_OAUTH_REDIRECT, SMARTMARK_PAGE_SIZE)
    /// 2. Config file (~/.config/smartmark/config.toml or SMARTMARK_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_STORE_URL", ENV_PREFIX)) {
            self.store_url = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_STORE_KEY", ENV_PREFIX)) {
            self.store_key = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_OAUTH_REDIRECT", ENV_PREFIX)) {
            self.oauth_redirect = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_PAGE_SIZE", ENV_PREFIX)) {
            if let Ok(size) = val.parse::<u32>() {
                if size > 0 {
                    self.page_size = size;
                }
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with the SMARTMARK_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smartmark")
            .join("config.toml")
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
