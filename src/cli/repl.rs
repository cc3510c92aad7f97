//! REPL implementation
//!
//! This module implements the interactive Read-Eval-Print Loop. Each request
//! is handled to completion before the next line is read.

use crate::cli::command_menu::{self, MenuEntry, MenuResult};
use crate::cli::commands::{self, format_error, Command, CommandType};
use crate::config::SharedState;
use crate::database::loader::{ConflictAction, LoadOutcome};
use crate::error::{AssistantError, Result};
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::Context;
use rustyline::Helper;
use rustyline::{CompletionType, Config, Editor};
use std::path::PathBuf;

/// Completes `/` commands
struct CommandCompleter;

impl Completer for CommandCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> std::result::Result<(usize, Vec<String>), ReadlineError> {
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let matches = command_menu::command_names()
            .filter(|cmd| cmd.starts_with(line))
            .map(str::to_string)
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {}

impl Helper for CommandCompleter {}

fn history_path() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".sqlite-assistant").join("history"))
        .unwrap_or_else(|| ".sqlite-assistant-history".into())
}

/// Interactive session
pub struct Repl {
    editor: Editor<CommandCompleter, DefaultHistory>,
    /// Whether the REPL should continue running
    running: bool,
    state: SharedState,
    history_path: PathBuf,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(state: SharedState) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .build();

        let mut editor = Editor::<CommandCompleter, DefaultHistory>::with_config(config)
            .map_err(|e| {
                AssistantError::Io(std::io::Error::other(format!(
                    "Failed to initialize editor: {}",
                    e
                )))
            })?;
        editor.set_helper(Some(CommandCompleter));

        let history_path = history_path();
        if let Err(e) = editor.load_history(&history_path) {
            tracing::debug!(path = %history_path.display(), error = %e, "no history loaded");
        }

        Ok(Self {
            editor,
            running: true,
            state,
            history_path,
        })
    }

    /// Run the REPL loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        while self.running {
            let Some(line) = self.read_line("> ", "") else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line == "/" {
                match command_menu::show_command_menu() {
                    Ok(MenuResult::Selected(entry)) => self.run_entry(entry).await,
                    Ok(MenuResult::Cancelled) => println!(),
                    Ok(MenuResult::TextInput) => {
                        if let Some(input) = self.read_line("> ", "/") {
                            self.dispatch(&input).await;
                        }
                    }
                    Err(e) => println!("Error showing menu: {}", e),
                }
                continue;
            }

            if let Some(entry) = command_menu::shortcut(line) {
                self.run_entry(entry).await;
                continue;
            }

            let line = line.to_string();
            self.dispatch(&line).await;
        }

        self.save_history();
        Ok(())
    }

    /// Read one line, `None` once input is closed
    fn read_line(&mut self, prompt: &str, initial: &str) -> Option<String> {
        let read = if initial.is_empty() {
            self.editor.readline(prompt)
        } else {
            self.editor.readline_with_initial(prompt, (initial, ""))
        };

        match read {
            Ok(line) => Some(line),
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                Some(String::new())
            }
            Err(ReadlineError::Eof) => {
                println!();
                self.running = false;
                None
            }
            Err(err) => {
                println!("Error: {:?}", err);
                self.running = false;
                None
            }
        }
    }

    /// Run a menu entry, prefilling the prompt when it needs arguments
    async fn run_entry(&mut self, entry: &MenuEntry) {
        if !entry.takes_args {
            self.dispatch(entry.command).await;
            return;
        }
        let initial = format!("{} ", entry.command);
        if let Some(input) = self.read_line("> ", &initial) {
            self.dispatch(&input).await;
        }
    }

    /// Parse and handle one line of input
    async fn dispatch(&mut self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            return;
        }
        let _ = self.editor.add_history_entry(input);

        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                let state = self.state.read().await;
                println!("{}", format_error(&e, state.error_log.path()));
                return;
            }
        };

        match &command.command_type {
            CommandType::Quit => {
                println!("{}", commands::execute(&command, self.state.clone()).await);
                self.running = false;
            }
            CommandType::Load {
                path,
                table,
                on_conflict: None,
            } => {
                let (path, table) = (path.clone(), table.clone());
                self.load_interactive(&path, &table).await;
            }
            CommandType::Ask { .. } => {
                println!("🤖 Generating SQL via LLM...");
                println!("{}", commands::execute(&command, self.state.clone()).await);
            }
            _ => println!("{}", commands::execute(&command, self.state.clone()).await),
        }
    }

    /// Load a CSV file, asking what to do if the table already exists
    async fn load_interactive(&mut self, path: &str, table: &str) {
        let outcome = match commands::load(&self.state, path, table, None).await {
            Ok(LoadOutcome::Conflict { table }) => {
                println!("⚠️ Table '{}' already exists.", table);
                let Some(action) = self.ask_conflict_action() else {
                    return;
                };
                commands::load(&self.state, path, &table, Some(&action)).await
            }
            other => other,
        };

        match outcome {
            Ok(outcome) => println!("{}", outcome),
            Err(e) => println!("{}", commands::report_error(&self.state, &e).await),
        }
    }

    fn ask_conflict_action(&mut self) -> Option<ConflictAction> {
        let action = self.read_line("Type 'overwrite', 'rename', or 'skip': ", "")?;
        let new_name = if action.trim().eq_ignore_ascii_case("rename") {
            Some(self.read_line("Enter new table name: ", "")?)
        } else {
            None
        };

        match ConflictAction::parse(&action, new_name.as_deref()) {
            Ok(action) => Some(action),
            Err(e) => {
                println!("❌ {}", e);
                None
            }
        }
    }

    fn save_history(&mut self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = self.editor.save_history(&self.history_path) {
            tracing::debug!(path = %self.history_path.display(), error = %e, "history not saved");
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("📦 Welcome to SQLite Assistant v{}", env!("CARGO_PKG_VERSION"));
        println!();
        for entry in command_menu::MENU_ENTRIES {
            if let Some(digit) = entry.shortcut {
                println!("  {}. {}", digit, entry.description);
            }
        }
        println!();
        println!("Type a question, / for the command menu, or /help for more information.");
        println!();
    }
}
