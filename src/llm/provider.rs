//! LLM Provider Trait
//!
//! This module defines the trait-based abstraction over chat-completion
//! services, so the pipeline can run against any compatible provider (or a
//! test double).

use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling temperature used for SQL synthesis
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// LLM message role
///
/// Requests carry a single user message holding the whole prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// LLM message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Token counts reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt + self.completion
    }
}

/// LLM response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LLMResponse {
    /// Generated text content
    pub content: String,
    /// Model that answered, when the service says
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
    /// Why generation stopped ("stop", "length", ...)
    pub finish_reason: Option<String>,
}

impl LLMResponse {
    /// Create a response carrying only text
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Whether the output was cut off by the token limit
    pub fn is_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

/// LLM generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate (provider default when unset)
    pub max_tokens: Option<u32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }
}

impl GenerationParams {
    /// Create new default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Trait for LLM providers
///
/// Implementations perform exactly one request per call. Every failure is
/// reported as [`AssistantError::Completion`]; nothing is retried.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a response from the LLM
    async fn generate(&self, messages: &[Message], params: &GenerationParams)
        -> Result<LLMResponse>;

    /// Send `prompt` as a single user message and return the raw text
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let messages = [Message::user(prompt)];
        let response = self.generate(&messages, params).await?;

        tracing::info!(
            provider = self.provider_name(),
            model = response.model.as_deref().unwrap_or(self.model()),
            prompt_tokens = response.usage.map(|u| u.prompt),
            completion_tokens = response.usage.map(|u| u.completion),
            total_tokens = response.usage.map(|u| u.total()),
            "completion received"
        );
        if response.is_truncated() {
            tracing::warn!(
                max_tokens = params.max_tokens,
                "completion stopped at the token limit; the SQL may be incomplete"
            );
        }
        Ok(response.content)
    }

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model identifier
    fn model(&self) -> &str;

    /// Check if the provider has an API key configured
    fn has_api_key(&self) -> bool;

    /// Validate the provider configuration
    fn validate_config(&self) -> Result<()> {
        if !self.has_api_key() {
            return Err(AssistantError::LLMApiKeyMissing(
                self.provider_name().to_string(),
            ));
        }
        Ok(())
    }
}
