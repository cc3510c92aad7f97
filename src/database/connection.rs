//! Database connection
//!
//! This module opens the single SQLite handle shared by the whole session.

use crate::error::{AssistantError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Location of the SQLite database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Database file on disk (created if missing)
    File(String),
    /// Private in-memory database, alive for the session
    Memory,
}

impl DatabaseLocation {
    /// Parse a database URL or path
    ///
    /// Accepts plain paths (`example.db`), `sqlite://path`, `sqlite:path`
    /// and `sqlite::memory:` / `:memory:`.
    pub fn from_url(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        let path = if let Some(stripped) = trimmed.strip_prefix("sqlite://") {
            stripped
        } else if let Some(stripped) = trimmed.strip_prefix("sqlite:") {
            stripped
        } else {
            trimmed
        };

        if path.is_empty() {
            return Err(AssistantError::InvalidInput(
                "Database path must not be empty".to_string(),
            ));
        }

        if path == ":memory:" {
            Ok(DatabaseLocation::Memory)
        } else {
            Ok(DatabaseLocation::File(path.to_string()))
        }
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions> {
        match self {
            DatabaseLocation::Memory => Ok(SqliteConnectOptions::from_str("sqlite::memory:")?),
            DatabaseLocation::File(path) => Ok(SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)),
        }
    }
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseLocation::File(path) => write!(f, "{}", path),
            DatabaseLocation::Memory => write!(f, ":memory:"),
        }
    }
}

/// The session's database handle
///
/// Wraps a pool capped at one connection that never expires, so every stage
/// of the session sees the same connection (and the same in-memory database).
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    location: DatabaseLocation,
}

impl Database {
    /// Open the database at `url`
    pub async fn connect(url: &str) -> Result<Self> {
        let location = DatabaseLocation::from_url(url)?;
        let options = location.connect_options()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        tracing::debug!(database = %location, "opened SQLite database");

        Ok(Self { pool, location })
    }

    /// Open a fresh in-memory database
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the handle at the end of the session
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!(database = %self.location, "closed SQLite database");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_url() {
        assert_eq!(
            DatabaseLocation::from_url("example.db").unwrap(),
            DatabaseLocation::File("example.db".to_string())
        );
        assert_eq!(
            DatabaseLocation::from_url("sqlite://data/test.db").unwrap(),
            DatabaseLocation::File("data/test.db".to_string())
        );
        assert_eq!(
            DatabaseLocation::from_url("sqlite:test.db").unwrap(),
            DatabaseLocation::File("test.db".to_string())
        );
        assert_eq!(
            DatabaseLocation::from_url("sqlite::memory:").unwrap(),
            DatabaseLocation::Memory
        );
        assert_eq!(
            DatabaseLocation::from_url(":memory:").unwrap(),
            DatabaseLocation::Memory
        );
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(DatabaseLocation::from_url("").is_err());
        assert!(DatabaseLocation::from_url("sqlite://").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_survives_across_queries() {
        let db = Database::in_memory().await.unwrap();

        sqlx::query("CREATE TABLE t (x INTEGER)")
            .execute(db.pool())
            .await
            .unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM t")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_file_database_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("created.db");
        let db = Database::connect(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        db.close().await;
    }
}
