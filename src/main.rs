// SQLite Assistant: ask questions about CSV data in plain language
//
// Usage: sqlite-assistant [DATABASE_PATH]

use anyhow::{Context, Result};
use sqlite_assistant::cli::Repl;
use sqlite_assistant::config::{create_shared_state, AppState, Config, EnvOverrides};
use sqlite_assistant::database::connection::Database;
use sqlite_assistant::logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_tracing();

    let config_path = match Config::config_file() {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(error = %e, "configuration will not be persisted");
            None
        }
    };
    let config = match &config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::new(),
    };

    let database = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.database.clone());
    let db = Database::connect(&database)
        .await
        .with_context(|| format!("could not open database {}", database))?;

    let state = AppState::new(db.clone(), config, EnvOverrides::from_env(), config_path)?;
    let mut repl = Repl::new(create_shared_state(state))?;
    let outcome = repl.run().await;

    db.close().await;
    Ok(outcome?)
}
