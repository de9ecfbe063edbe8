//! Configuration management for Kanava
//!
//! This module handles loading, parsing, and validating configuration from
//! a YAML file with CLI overrides. Every field has a default, so a missing
//! config file yields a fully usable configuration.

use crate::cli::Cli;
use crate::error::{KanavaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Kanava
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Chat session settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Local store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Chat session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Show per-message character and token statistics
    #[serde(default = "default_show_stats")]
    pub show_stats: bool,

    /// Maximum conversation title length in characters
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

fn default_show_stats() -> bool {
    true
}

fn default_title_max_chars() -> usize {
    30
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            show_stats: default_show_stats(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

/// Local store settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Override for the store file path; defaults to the user data directory
    #[serde(default)]
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file with CLI overrides applied
    ///
    /// A missing file yields the default configuration. The CLI
    /// `--store-path` flag overrides the configured store path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    /// * `cli` - Parsed command-line arguments
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P, cli: &Cli) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| KanavaError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
            serde_yaml::from_str(&raw)
                .map_err(|e| KanavaError::Config(format!("Failed to parse {}: {}", path.display(), e)))?
        } else {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        if let Some(store_path) = &cli.store_path {
            config.store.path = Some(store_path.clone());
        }

        Ok(config)
    }

    /// Validate configuration invariants
    ///
    /// # Errors
    ///
    /// Returns error if any value is outside its valid range
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_seconds == 0 {
            return Err(KanavaError::Config(
                "api.timeout_seconds must be greater than zero".to_string(),
            )
            .into());
        }
        if self.chat.title_max_chars == 0 {
            return Err(KanavaError::Config(
                "chat.title_max_chars must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
