//! OpenAI API Provider
//!
//! This module implements the LLMProvider trait for the OpenAI chat
//! completions API, and for any service exposing the same contract under a
//! different base URL.

use crate::error::{AssistantError, Result};
use crate::llm::client::LLMHttpClient;
use crate::llm::provider::{GenerationParams, LLMProvider, LLMResponse, Message, TokenUsage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// OpenAI API base URL
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const PROVIDER_NAME: &str = "OpenAI";

/// OpenAI-compatible chat completion provider
pub struct OpenAIProvider {
    /// API key for authentication
    api_key: String,
    /// Model to use (e.g., "gpt-4", "gpt-3.5-turbo")
    model: String,
    /// API base URL, without the `/chat/completions` suffix
    base_url: String,
    /// HTTP client for making requests
    client: LLMHttpClient,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `model` - Model identifier (defaults to gpt-3.5-turbo)
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: OPENAI_API_BASE.to_string(),
            client: LLMHttpClient::new(PROVIDER_NAME)?,
        })
    }

    /// Point the provider at a different OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Result<Self> {
        self.client = LLMHttpClient::with_timeout(PROVIDER_NAME, timeout_secs)?;
        Ok(self)
    }

    /// Full chat completions URL
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        params: &GenerationParams,
    ) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }

    /// Extract text content from OpenAI response
    fn extract_content(response: &OpenAIResponse) -> Result<String> {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone().unwrap_or_default())
            .ok_or_else(|| {
                AssistantError::completion(PROVIDER_NAME, "response contained no choices", None)
            })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    /// Generate a response from the chat completions API
    async fn generate(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<LLMResponse> {
        self.validate_config()?;

        let request = self.build_request(messages, params);
        let headers = self.client.build_headers(&self.api_key)?;

        tracing::debug!(model = %self.model, messages = messages.len(), "requesting completion");
        let response_text = self.client.post(&self.endpoint(), headers, &request).await?;

        let openai_response: OpenAIResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                AssistantError::completion(
                    PROVIDER_NAME,
                    format!("Failed to parse response: {}", e),
                    None,
                )
            })?;

        let content = Self::extract_content(&openai_response)?;

        Ok(LLMResponse {
            content,
            model: openai_response.model,
            usage: openai_response.usage.as_ref().map(|u| TokenUsage {
                prompt: u.prompt_tokens,
                completion: u.completion_tokens,
            }),
            finish_reason: openai_response
                .choices
                .first()
                .and_then(|c| c.finish_reason.clone()),
        })
    }

    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

/// Choice in OpenAI response
#[derive(Debug, Deserialize)]
struct Choice {
    message: OpenAIMessageResponse,
    finish_reason: Option<String>,
}

/// Message in OpenAI response
#[derive(Debug, Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
