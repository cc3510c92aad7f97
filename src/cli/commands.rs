//! Command handlers for CLI
//!
//! This module parses REPL input and implements every command. All request
//! failures are funnelled through [`execute`], which logs them and turns them
//! into a short message so the session can carry on.

use crate::config::SharedState;
use crate::database::loader::{ConflictAction, LoadOutcome};
use crate::error::{AssistantError, Result};
use std::path::Path;

/// Command types
#[derive(Debug, Clone, PartialEq)]
pub enum CommandType {
    /// Load a CSV file into a table
    Load {
        path: String,
        table: String,
        on_conflict: Option<ConflictAction>,
    },
    /// Run SQL directly
    Sql { sql: String },
    /// Natural language question
    Ask { question: String },
    /// List tables
    Tables,
    /// Show the schema description sent to the model
    Schema,
    /// Set the API key
    Config { key: String },
    /// Set the model
    Model { model: String },
    /// Show help message
    Help,
    /// Exit the application
    Quit,
}

/// Parsed command
#[derive(Debug, Clone)]
pub struct Command {
    /// The type of command
    pub command_type: CommandType,
}

impl From<CommandType> for Command {
    fn from(command_type: CommandType) -> Self {
        Self { command_type }
    }
}

fn syntax_error(command: &str, expected: &str) -> AssistantError {
    AssistantError::InvalidCommandSyntax {
        command: command.to_string(),
        expected: expected.to_string(),
    }
}

/// Text after the command word, untouched apart from surrounding whitespace
fn remainder<'a>(input: &'a str, cmd: &str) -> &'a str {
    input[cmd.len()..].trim()
}

/// Split a leading path off `args`; a path with spaces is written in quotes
fn split_path(args: &str) -> Option<(&str, &str)> {
    let args = args.trim_start();
    let quote = args.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &args[1..];
    let end = rest.find(quote)?;
    Some((&rest[..end], &rest[end + 1..]))
}

impl Command {
    /// Parse a command from user input
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        // Anything without a / prefix is a question for the model
        if !input.starts_with('/') {
            return Ok(CommandType::Ask {
                question: input.to_string(),
            }
            .into());
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts[0];

        let command_type = match cmd {
            "/load" => {
                const USAGE: &str =
                    "/load <csv_path | \"csv path\"> <table> [overwrite | skip | rename <new_table>]";
                let args = remainder(input, cmd);
                let (path, rest): (&str, Vec<&str>) = match split_path(args) {
                    Some((path, rest)) => (path, rest.split_whitespace().collect()),
                    None if args.starts_with(|c| c == '"' || c == '\'') => {
                        return Err(syntax_error(cmd, USAGE))
                    }
                    None => match parts.get(1) {
                        Some(path) => (*path, parts[2..].to_vec()),
                        None => return Err(syntax_error(cmd, USAGE)),
                    },
                };
                let extra_args = rest.len() == 3 && !rest[1].eq_ignore_ascii_case("rename");
                if path.is_empty() || rest.is_empty() || rest.len() > 3 || extra_args {
                    return Err(syntax_error(cmd, USAGE));
                }
                let on_conflict = match rest.get(1) {
                    None => None,
                    Some(action) => match action.to_lowercase().as_str() {
                        "overwrite" | "skip" | "rename" => {
                            Some(ConflictAction::parse(action, rest.get(2).copied())?)
                        }
                        _ => return Err(syntax_error(cmd, USAGE)),
                    },
                };
                CommandType::Load {
                    path: path.to_string(),
                    table: rest[0].to_string(),
                    on_conflict,
                }
            }
            "/sql" => {
                let sql = remainder(input, cmd);
                if sql.is_empty() {
                    return Err(syntax_error(cmd, "/sql <statement>"));
                }
                CommandType::Sql {
                    sql: sql.to_string(),
                }
            }
            "/ask" => CommandType::Ask {
                question: remainder(input, cmd).to_string(),
            },
            "/tables" => CommandType::Tables,
            "/schema" => CommandType::Schema,
            "/config" => {
                if parts.len() != 2 {
                    return Err(syntax_error(cmd, "/config <api_key>"));
                }
                CommandType::Config {
                    key: parts[1].to_string(),
                }
            }
            "/model" => {
                if parts.len() != 2 {
                    return Err(syntax_error(cmd, "/model <model_name>"));
                }
                CommandType::Model {
                    model: parts[1].to_string(),
                }
            }
            "/help" => CommandType::Help,
            "/quit" | "/exit" => CommandType::Quit,
            _ => return Err(AssistantError::UnknownCommand(cmd.to_string())),
        };

        Ok(command_type.into())
    }
}

const HELP: &str = r#"
SQLite Assistant Commands

Data:
  /load <csv> <table> [action]  Load a CSV file into a new table
                                action: overwrite | skip | rename <new_table>
                                quote paths with spaces: "my data.csv"
  /tables                       List tables in the database
  /schema                       Show the schema sent to the language model

Queries:
  /sql <statement>              Run SQL directly
  /ask <question>               Ask a question (AI-generated SQL)
  <question>                    Any text without a / prefix is a question

Configuration:
  /config <api_key>             Set the API key for the completion endpoint
  /model <model>                Set the model used for SQL generation

Session:
  /                             Open the command menu
  1-5                           Load CSV, Run SQL, Ask, List tables, Exit
  /help                         Show this help message
  /quit, /exit                  Exit

Examples:
  /load sales.csv sales
  /sql SELECT product, SUM(amount) FROM sales GROUP BY product
  Top 5 products this month
"#;

/// Load a CSV file through the session's assistant
pub async fn load(
    state: &SharedState,
    path: &str,
    table: &str,
    on_conflict: Option<&ConflictAction>,
) -> Result<LoadOutcome> {
    if !Path::new(path).exists() {
        return Err(AssistantError::FileNotFound(path.to_string()));
    }
    let state = state.read().await;
    state.assistant.load_csv(path, table, on_conflict).await
}

/// Handle a command and return the result message
pub async fn handle_command(command: &Command, state: SharedState) -> Result<String> {
    match &command.command_type {
        CommandType::Load {
            path,
            table,
            on_conflict,
        } => {
            let outcome = load(&state, path, table, on_conflict.as_ref()).await?;
            Ok(match outcome {
                LoadOutcome::Conflict { .. } => format!(
                    "{}\nRe-run with overwrite, skip or rename <new_table> at the end.",
                    outcome
                ),
                other => other.to_string(),
            })
        }
        CommandType::Sql { sql } => {
            let state = state.read().await;
            let result = state.assistant.run_sql(sql).await?;
            Ok(result.to_string())
        }
        CommandType::Ask { question } => {
            let state = state.read().await;
            let answer = state.assistant.ask(question).await?;
            Ok(format!(
                "🧾 LLM Output:\n{}\n\n📊 Executing SQL:\n{}\n\n{}",
                answer.synthesis.completion, answer.synthesis.sql, answer.result
            ))
        }
        CommandType::Tables => {
            let state = state.read().await;
            let tables = state.assistant.list_tables().await?;
            let mut out = String::from("📋 Tables in database:");
            for table in tables {
                out.push_str(&format!("\n - {}", table));
            }
            Ok(out)
        }
        CommandType::Schema => {
            let state = state.read().await;
            let schema = state.assistant.describe_schema().await?;
            if schema.is_empty() {
                Ok("(no tables)".to_string())
            } else {
                Ok(schema.to_string())
            }
        }
        CommandType::Config { key } => {
            let mut state = state.write().await;
            state.set_api_key(key.clone())?;
            let chars: Vec<char> = key.chars().collect();
            let masked_key = if chars.len() > 8 {
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}...{}", head, tail)
            } else {
                "***".to_string()
            };
            let mut message = format!("✓ API key configured ({})", masked_key);
            if state.api_key_from_env() {
                message.push_str(
                    "\n⚠️ OPENAI_API_KEY is set in the environment and stays in effect for this session.",
                );
            }
            Ok(message)
        }
        CommandType::Model { model } => {
            let mut state = state.write().await;
            state.set_model(model.clone())?;
            let mut message = format!("✓ Model set to {}", model);
            if state.model_from_env() {
                message.push_str(
                    "\n⚠️ OPENAI_MODEL is set in the environment and stays in effect for this session.",
                );
            }
            Ok(message)
        }
        CommandType::Help => Ok(HELP.to_string()),
        CommandType::Quit => Ok("👋 Exiting. Goodbye!".to_string()),
    }
}

/// Log a failed request and return the message to show the user
pub async fn report_error(state: &SharedState, error: &AssistantError) -> String {
    let state = state.read().await;
    if !error.is_user_error() {
        let detail = error.detailed();
        tracing::error!(error = %detail, "request failed");
        if let Err(log_error) = state.error_log.record(&detail) {
            tracing::warn!(error = %log_error, "could not write error log");
        }
    }
    format_error(error, state.error_log.path())
}

/// Run a command, catching and logging any failure
pub async fn execute(command: &Command, state: SharedState) -> String {
    match handle_command(command, state.clone()).await {
        Ok(message) => message,
        Err(e) => report_error(&state, &e).await,
    }
}

/// Format an error for display
pub fn format_error(error: &AssistantError, log_path: &Path) -> String {
    match error {
        e if e.is_pipeline_failure() => format!(
            "❌ Failed to generate or execute SQL. Check {} for details.",
            log_path.display()
        ),
        AssistantError::LLMApiKeyMissing(_) => format!("❌ {}", error),
        e if e.is_user_error() => format!("❌ {}", e),
        _ => format!(
            "❌ An error occurred. Check {} for details.",
            log_path.display()
        ),
    }
}
