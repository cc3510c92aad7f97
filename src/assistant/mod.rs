//! Question answering pipeline
//!
//! Introspect schema → build prompt → complete → extract SQL → execute.
//! Every stage finishes before the next starts. The completion call is the
//! only await point that leaves the process; if it fails (or its future is
//! dropped) nothing is extracted or executed.

pub mod error_log;
pub mod extract;
pub mod prompt;

use crate::database::connection::Database;
use crate::database::executor::{self, QueryResult};
use crate::database::introspect;
use crate::database::loader::{self, ConflictAction, CsvTable, LoadOutcome};
use crate::database::schema::SchemaDescription;
use crate::error::Result;
use crate::llm::provider::{GenerationParams, LLMProvider};
use std::path::Path;
use std::sync::Arc;

pub use error_log::ErrorLog;
pub use extract::extract_sql;
pub use prompt::build_prompt;

/// Model output and the SQL extracted from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    /// Raw completion text
    pub completion: String,
    /// Extracted statement, possibly empty
    pub sql: String,
}

/// Result of a full question round trip
#[derive(Debug, Clone)]
pub struct Answer {
    pub synthesis: Synthesis,
    pub result: QueryResult,
}

/// Composes the pipeline stages over one database handle and one provider
pub struct Assistant {
    db: Database,
    provider: Arc<dyn LLMProvider>,
    params: GenerationParams,
}

impl Assistant {
    /// Create an assistant with default generation parameters
    pub fn new(db: Database, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            db,
            provider,
            params: GenerationParams::default(),
        }
    }

    /// Override generation parameters
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Swap the completion provider
    pub fn set_provider(&mut self, provider: Arc<dyn LLMProvider>) {
        self.provider = provider;
    }

    /// Replace generation parameters
    pub fn set_params(&mut self, params: GenerationParams) {
        self.params = params;
    }

    /// The completion provider
    pub fn provider(&self) -> &dyn LLMProvider {
        self.provider.as_ref()
    }

    /// Current generation parameters
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Read the current catalog
    pub async fn describe_schema(&self) -> Result<SchemaDescription> {
        introspect::describe_schema(&self.db).await
    }

    /// User table names
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        introspect::list_tables(&self.db).await
    }

    /// Ask the model for SQL answering `question`
    ///
    /// The schema is read fresh for every call.
    pub async fn synthesize_sql(&self, question: &str) -> Result<Synthesis> {
        let schema = self.describe_schema().await?;
        let prompt = build_prompt(&schema, question);

        tracing::info!(
            provider = self.provider.provider_name(),
            model = self.provider.model(),
            tables = schema.table_count(),
            "generating SQL"
        );
        let completion = self.provider.complete(&prompt, &self.params).await?;
        let sql = extract_sql(&completion);
        if sql.is_empty() {
            tracing::warn!("no SELECT statement found in completion");
        }

        Ok(Synthesis { completion, sql })
    }

    /// Execute SQL as-is
    pub async fn run_sql(&self, sql: &str) -> Result<QueryResult> {
        executor::run_sql(&self.db, sql).await
    }

    /// Synthesize SQL for `question` and execute it
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let synthesis = self.synthesize_sql(question).await?;
        let result = self.run_sql(&synthesis.sql).await?;
        Ok(Answer { synthesis, result })
    }

    /// Load a CSV file into `table`
    pub async fn load_csv(
        &self,
        path: impl AsRef<Path>,
        table: &str,
        on_conflict: Option<&ConflictAction>,
    ) -> Result<LoadOutcome> {
        let data = CsvTable::from_path(path)?;
        loader::load_table(&self.db, &data, table, on_conflict).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use crate::llm::provider::{LLMResponse, Message};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays a canned completion and records the prompts it was sent
    struct Scripted {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<(String, f32)>>,
    }

    impl Scripted {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for Scripted {
        async fn generate(
            &self,
            messages: &[Message],
            params: &GenerationParams,
        ) -> Result<LLMResponse> {
            let mut prompts = self.prompts.lock().unwrap();
            for message in messages {
                prompts.push((message.content.clone(), params.temperature));
            }
            match &self.reply {
                Ok(text) => Ok(LLMResponse::new(text.clone())),
                Err(message) => Err(AssistantError::completion("Scripted", message.clone(), None)),
            }
        }

        fn provider_name(&self) -> &str {
            "Scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        fn has_api_key(&self) -> bool {
            true
        }
    }

    async fn database() -> Database {
        let db = Database::in_memory().await.unwrap();
        executor::run_sql(
            &db,
            "CREATE TABLE sales (id INTEGER, product TEXT, amount REAL);
             INSERT INTO sales VALUES (1, 'tea', 3.5), (2, 'coffee', 4.0), (3, 'tea', 3.5);",
        )
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_synthesize_embeds_live_schema() {
        let provider = Scripted::ok("SELECT COUNT(*) FROM sales;");
        let assistant = Assistant::new(database().await, provider.clone());

        let synthesis = assistant.synthesize_sql("how many sales?").await.unwrap();
        assert_eq!(synthesis.sql, "SELECT COUNT(*) FROM sales;");

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        let (prompt, temperature) = &prompts[0];
        assert!(prompt.contains("- sales (id, product, amount)"));
        assert!(prompt.contains("User Query: \"how many sales?\""));
        assert_eq!(*temperature, 0.2);
    }

    #[tokio::test]
    async fn test_schema_read_fresh_each_time() {
        let provider = Scripted::ok("nothing");
        let assistant = Assistant::new(database().await, provider.clone());

        assistant.synthesize_sql("q").await.unwrap();
        assistant.run_sql("CREATE TABLE later (x TEXT)").await.unwrap();
        assistant.synthesize_sql("q").await.unwrap();

        let prompts = provider.prompts.lock().unwrap();
        assert!(!prompts[0].0.contains("- later (x)"));
        assert!(prompts[1].0.contains("- later (x)"));
    }

    #[tokio::test]
    async fn test_ask_executes_extracted_sql() {
        let provider = Scripted::ok(
            "- SQL Query\nSELECT product, SUM(amount) AS total FROM sales GROUP BY product ORDER BY product;",
        );
        let assistant = Assistant::new(database().await, provider);

        let answer = assistant.ask("revenue per product").await.unwrap();
        assert_eq!(answer.result.columns, vec!["product", "total"]);
        assert_eq!(answer.result.row_count(), 2);
    }

    #[tokio::test]
    async fn test_completion_failure_stops_pipeline() {
        let provider = Scripted::failing("network down");
        let assistant = Assistant::new(database().await, provider);

        let err = assistant.ask("anything").await.unwrap_err();
        assert!(matches!(err, AssistantError::Completion { .. }));
    }

    #[tokio::test]
    async fn test_empty_extraction_fails_at_execution() {
        let provider = Scripted::ok("I cannot answer that.");
        let assistant = Assistant::new(database().await, provider);

        let synthesis = assistant.synthesize_sql("?").await.unwrap();
        assert_eq!(synthesis.sql, "");
        assert!(matches!(
            assistant.ask("?").await,
            Err(AssistantError::EmptyStatement)
        ));
    }

    #[tokio::test]
    async fn test_over_captured_trailer_fails_execution() {
        let provider = Scripted::ok("SELECT * FROM sales;\nThis returns every sale.");
        let assistant = Assistant::new(database().await, provider);

        let err = assistant.ask("all sales").await.unwrap_err();
        assert!(matches!(err, AssistantError::QueryExecution { .. }));
    }

    #[tokio::test]
    async fn test_custom_params_forwarded() {
        let provider = Scripted::ok("SELECT 1;");
        let assistant = Assistant::new(database().await, provider.clone())
            .with_params(GenerationParams::new().with_temperature(0.0));

        assistant.synthesize_sql("one").await.unwrap();
        assert_eq!(provider.prompts.lock().unwrap()[0].1, 0.0);
    }
}
