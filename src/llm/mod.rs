//! LLM integration module
//!
//! This module provides the trait-based completion provider abstraction and
//! the OpenAI-compatible implementation.

pub mod client;
pub mod provider;

// Provider implementations
pub mod providers {
    pub mod openai;
}

// Re-exports
pub use provider::{GenerationParams, LLMProvider, LLMResponse, Message, MessageRole, TokenUsage};
pub use providers::openai::OpenAIProvider;
