//! LLM HTTP Client
//!
//! This module provides the HTTP client used to call chat-completion APIs.
//! Each call is a single attempt: transport failures, non-success statuses and
//! unreadable bodies all surface as [`AssistantError::Completion`].

use crate::error::{AssistantError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Default timeout for HTTP requests (in seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP client for LLM API requests
#[derive(Clone)]
pub struct LLMHttpClient {
    /// Reqwest HTTP client
    client: Client,
    /// Provider label used in error reports
    provider: String,
}

impl LLMHttpClient {
    /// Create a new HTTP client with the default timeout
    pub fn new(provider: impl Into<String>) -> Result<Self> {
        Self::with_timeout(provider, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(provider: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let provider = provider.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                AssistantError::completion(&provider, format!("failed to build HTTP client: {}", e), None)
            })?;

        Ok(Self { client, provider })
    }

    /// POST a JSON body and return the response body as text
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &T,
    ) -> Result<String> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            tracing::warn!(provider = %self.provider, status = status.as_u16(), "completion request rejected");
            return Err(AssistantError::completion(
                &self.provider,
                text,
                Some(status.as_u16()),
            ));
        }

        Ok(text)
    }

    fn transport_error(&self, error: reqwest::Error) -> AssistantError {
        tracing::warn!(provider = %self.provider, error = %error, "completion request failed");
        AssistantError::completion(
            &self.provider,
            error.to_string(),
            error.status().map(|s| s.as_u16()),
        )
    }

    /// Build standard headers for API requests
    pub fn build_headers(&self, api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
            AssistantError::completion(&self.provider, "API key contains invalid characters", None)
        })?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }
}
