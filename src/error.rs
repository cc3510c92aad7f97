//! Error types for the SQLite assistant
//!
//! This module defines the error types used throughout the application.

use std::error::Error as _;
use thiserror::Error;

/// Result type alias for the SQLite assistant
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Main error type for the SQLite assistant
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Database-related errors (connection, transactions)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Catalog could not be read
    #[error("Schema introspection failed: {message}")]
    Introspection {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    /// SQL statement failed to execute
    #[error("Query execution error for statement: {sql}")]
    QueryExecution {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    /// Nothing to execute (e.g. no SQL could be extracted)
    #[error("Query execution error: no SQL statement to execute")]
    EmptyStatement,

    /// Any failure of the language model call
    #[error("Completion failed ({provider}{}): {message}", status_suffix(.status))]
    Completion {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    /// No API key configured for the provider
    #[error("No API key configured for {0}. Use /config <api_key> or set OPENAI_API_KEY")]
    LLMApiKeyMissing(String),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input file is missing
    #[error("File does not exist: {0}")]
    FileNotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown `/` command
    #[error("Unknown command: {0}. Type /help for available commands")]
    UnknownCommand(String),

    /// Command given with wrong arguments
    #[error("Invalid syntax for {command}. Usage: {expected}")]
    InvalidCommandSyntax { command: String, expected: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(", HTTP {}", s)).unwrap_or_default()
}

impl AssistantError {
    /// Wrap a catalog read failure
    pub fn introspection(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Introspection {
            message: message.into(),
            source,
        }
    }

    /// Wrap a failed statement together with its SQL text
    pub fn query_execution(sql: impl Into<String>, source: sqlx::Error) -> Self {
        Self::QueryExecution {
            sql: sql.into(),
            source,
        }
    }

    /// Build a completion failure
    pub fn completion(
        provider: impl Into<String>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self::Completion {
            provider: provider.into(),
            message: message.into(),
            status,
        }
    }

    /// Whether SQL could not be generated or executed
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(
            self,
            Self::Completion { .. } | Self::QueryExecution { .. } | Self::EmptyStatement
        )
    }

    /// Mistakes in what the user typed; shown directly and not logged
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::InvalidInput(_)
                | Self::UnknownCommand(_)
                | Self::InvalidCommandSyntax { .. }
        )
    }

    /// Render the error together with its full source chain
    pub fn detailed(&self) -> String {
        let mut detail = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            detail.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_display_with_status() {
        let err = AssistantError::completion("OpenAI", "rate limited", Some(429));
        assert_eq!(err.to_string(), "Completion failed (OpenAI, HTTP 429): rate limited");
    }

    #[test]
    fn test_completion_display_without_status() {
        let err = AssistantError::completion("OpenAI", "connection refused", None);
        assert_eq!(err.to_string(), "Completion failed (OpenAI): connection refused");
    }

    #[test]
    fn test_pipeline_failure_classification() {
        assert!(AssistantError::completion("OpenAI", "x", None).is_pipeline_failure());
        assert!(
            AssistantError::query_execution("SELEC", sqlx::Error::RowNotFound).is_pipeline_failure()
        );
        assert!(AssistantError::EmptyStatement.is_pipeline_failure());
        assert!(!AssistantError::FileNotFound("a.csv".to_string()).is_pipeline_failure());
        assert!(!AssistantError::LLMApiKeyMissing("OpenAI".to_string()).is_pipeline_failure());
    }

    #[test]
    fn test_user_error_classification() {
        assert!(AssistantError::UnknownCommand("/x".to_string()).is_user_error());
        assert!(AssistantError::FileNotFound("a.csv".to_string()).is_user_error());
        assert!(!AssistantError::EmptyStatement.is_user_error());
        assert!(!AssistantError::Config("x".to_string()).is_user_error());
    }

    #[test]
    fn test_detailed_includes_source_chain() {
        let err = AssistantError::introspection("reading sqlite_master", sqlx::Error::RowNotFound);
        let detail = err.detailed();
        assert!(detail.starts_with("Schema introspection failed: reading sqlite_master"));
        assert!(detail.contains("caused by:"));
    }
}
