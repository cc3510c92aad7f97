//! Configuration Storage
//!
//! This module handles persistent storage of configuration data: LLM
//! settings, the default database file and the error log location.

use crate::assistant::error_log::DEFAULT_ERROR_LOG;
use crate::error::{AssistantError, Result};
use crate::llm::client::DEFAULT_TIMEOUT_SECS;
use crate::llm::provider::DEFAULT_TEMPERATURE;
use crate::llm::providers::openai::{DEFAULT_MODEL, OPENAI_API_BASE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Directory name under the platform config dir
const APP_DIR: &str = "sqlite-assistant";

/// Default database file
pub const DEFAULT_DATABASE: &str = "example.db";

/// Persistent configuration data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key for the completion endpoint
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Cap on generated tokens; the service default applies when unset
    pub max_tokens: Option<u32>,
    /// Completion request timeout in seconds
    pub timeout_secs: u64,
    /// Database opened when no path is given on the command line
    pub database: String,
    /// Append-only error log file
    pub error_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_API_BASE.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            database: DEFAULT_DATABASE.to_string(),
            error_log: DEFAULT_ERROR_LOG.to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the configuration directory path, creating it if needed
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                AssistantError::Config("Could not find configuration directory".to_string())
            })?
            .join(APP_DIR);

        fs::create_dir_all(&config_dir).map_err(|e| {
            AssistantError::Config(format!("Failed to create config directory: {}", e))
        })?;

        Ok(config_dir)
    }

    /// Get the configuration file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load configuration from `path`, falling back to defaults if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AssistantError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| AssistantError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AssistantError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| AssistantError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

/// Settings taken from the environment (`.env` included)
///
/// These take precedence over the file but are never written back to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl EnvOverrides {
    /// Read `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_BASE_URL`
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: var("OPENAI_API_KEY"),
            model: var("OPENAI_MODEL"),
            base_url: var("OPENAI_BASE_URL"),
        }
    }

    /// Merge over `config`
    pub fn apply(&self, config: &Config) -> Config {
        let mut effective = config.clone();
        if let Some(key) = &self.api_key {
            effective.api_key = Some(key.clone());
        }
        if let Some(model) = &self.model {
            effective.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            effective.base_url = base_url.clone();
        }
        effective
    }
}
