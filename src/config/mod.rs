//! Configuration module
//!
//! This module handles configuration management and the shared
//! application state of an interactive session.

pub mod storage;

use crate::assistant::{Assistant, ErrorLog};
use crate::database::connection::Database;
use crate::error::Result;
use crate::llm::provider::{GenerationParams, LLMProvider};
use crate::llm::providers::openai::OpenAIProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use storage::{Config, EnvOverrides};

/// Build the completion provider described by `config`
///
/// A missing API key still yields a provider; requests then fail with
/// `LLMApiKeyMissing` instead of reaching the network.
pub fn build_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let provider = OpenAIProvider::new(
        config.api_key.clone().unwrap_or_default(),
        Some(config.model.clone()),
    )?
    .with_base_url(config.base_url.clone())
    .with_timeout(config.timeout_secs)?;
    Ok(Arc::new(provider))
}

fn generation_params(config: &Config) -> GenerationParams {
    let params = GenerationParams::new().with_temperature(config.temperature);
    match config.max_tokens {
        Some(max_tokens) => params.with_max_tokens(max_tokens),
        None => params,
    }
}

/// Application state
pub struct AppState {
    /// Pipeline over the session database
    pub assistant: Assistant,
    /// Append-only error log
    pub error_log: ErrorLog,
    /// Stored configuration (what gets written back to disk)
    config: Config,
    /// Environment overrides applied on top of `config`
    overrides: EnvOverrides,
    /// Where to persist `config`; `None` keeps changes in memory
    config_path: Option<PathBuf>,
}

impl AppState {
    /// Create the session state around an open database
    pub fn new(
        db: Database,
        config: Config,
        overrides: EnvOverrides,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let effective = overrides.apply(&config);
        let assistant = Assistant::new(db, build_provider(&effective)?)
            .with_params(generation_params(&effective));

        Ok(Self {
            assistant,
            error_log: ErrorLog::new(&effective.error_log),
            config,
            overrides,
            config_path,
        })
    }

    /// Replace the completion provider (tests, alternative backends)
    pub fn with_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.assistant.set_provider(provider);
        self
    }

    /// Replace the error log
    pub fn with_error_log(mut self, error_log: ErrorLog) -> Self {
        self.error_log = error_log;
        self
    }

    /// Configuration in effect (file values with environment overrides)
    pub fn effective_config(&self) -> Config {
        self.overrides.apply(&self.config)
    }

    /// Whether `OPENAI_API_KEY` overrides the stored key
    pub fn api_key_from_env(&self) -> bool {
        self.overrides.api_key.is_some()
    }

    /// Whether `OPENAI_MODEL` overrides the stored model
    pub fn model_from_env(&self) -> bool {
        self.overrides.model.is_some()
    }

    /// Store an API key and save to disk
    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.config.api_key = Some(key);
        self.refresh()
    }

    /// Set the model and save to disk
    pub fn set_model(&mut self, model: String) -> Result<()> {
        self.config.model = model;
        self.refresh()
    }

    /// Rebuild the provider from the current configuration and persist it
    fn refresh(&mut self) -> Result<()> {
        let effective = self.effective_config();
        self.assistant.set_provider(build_provider(&effective)?);
        self.assistant.set_params(generation_params(&effective));
        self.save();
        Ok(())
    }

    /// Save configuration to disk
    fn save(&self) {
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                tracing::warn!(path = %path.display(), error = %e, "could not save configuration");
            }
        }
    }
}

/// Shared application state
pub type SharedState = Arc<RwLock<AppState>>;

/// Wrap the state for sharing with the REPL
pub fn create_shared_state(state: AppState) -> SharedState {
    Arc::new(RwLock::new(state))
}
