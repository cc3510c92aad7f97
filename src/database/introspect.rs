//! Schema Introspector
//!
//! Reads the SQLite catalog (`sqlite_master` and `PRAGMA table_info`) and
//! builds a SchemaDescription.
//!
//! Table names are interpolated into the PRAGMA statement as-is, the same way
//! the catalog reports them. A name containing a quote will break the
//! statement; this is a known injection surface and is left unescaped.

use crate::database::connection::Database;
use crate::database::schema::{SchemaDescription, TableSchema};
use crate::error::{AssistantError, Result};
use sqlx::Row;

const TABLES_QUERY: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'";

/// List user tables in catalog enumeration order
pub async fn list_tables(db: &Database) -> Result<Vec<String>> {
    let rows = sqlx::query(TABLES_QUERY)
        .fetch_all(db.pool())
        .await
        .map_err(|e| AssistantError::introspection("failed to list tables", e))?;

    rows.iter()
        .map(|row| {
            row.try_get::<String, _>("name")
                .map_err(|e| AssistantError::introspection("failed to read table name", e))
        })
        .collect()
}

/// List the column names of `table` in declared ordinal order
///
/// Returns an empty list when the table does not exist.
pub async fn table_columns(db: &Database, table: &str) -> Result<Vec<String>> {
    let pragma = format!("PRAGMA table_info('{}')", table);
    let rows = sqlx::query(&pragma)
        .fetch_all(db.pool())
        .await
        .map_err(|e| AssistantError::introspection(format!("failed to read columns of {}", table), e))?;

    let mut columns: Vec<(i64, String)> = rows
        .iter()
        .map(|row| -> std::result::Result<(i64, String), sqlx::Error> {
            Ok((row.try_get("cid")?, row.try_get("name")?))
        })
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| AssistantError::introspection(format!("failed to decode columns of {}", table), e))?;

    columns.sort_by_key(|(cid, _)| *cid);
    Ok(columns.into_iter().map(|(_, name)| name).collect())
}

/// Whether a table with this name exists
pub async fn table_exists(db: &Database, table: &str) -> Result<bool> {
    Ok(!table_columns(db, table).await?.is_empty())
}

/// Read the current catalog into a SchemaDescription
pub async fn describe_schema(db: &Database) -> Result<SchemaDescription> {
    let mut schema = SchemaDescription::new();

    for table in list_tables(db).await? {
        let columns = table_columns(db, &table).await?;
        schema.add_table(TableSchema::new(table, columns));
    }

    tracing::debug!(tables = schema.table_count(), "introspected schema");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> Database {
        let db = Database::in_memory().await.unwrap();
        for ddl in [
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT)",
            "CREATE TABLE orders (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER, total REAL)",
            "CREATE VIEW big_orders AS SELECT * FROM orders WHERE total > 100",
        ] {
            sqlx::query(ddl).execute(db.pool()).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_describe_schema_lines() {
        let db = setup().await;
        let schema = describe_schema(&db).await.unwrap();

        // sqlite_sequence (created by AUTOINCREMENT) and views are excluded
        assert_eq!(schema.table_count(), 2);
        assert_eq!(
            schema.to_string(),
            "- users (id, name, email)\n- orders (id, user_id, total)"
        );
    }

    #[tokio::test]
    async fn test_describe_schema_idempotent() {
        let db = setup().await;
        let first = describe_schema(&db).await.unwrap().to_string();
        let second = describe_schema(&db).await.unwrap().to_string();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_describe_schema_reflects_changes() {
        let db = setup().await;
        sqlx::query("ALTER TABLE users ADD COLUMN created_at TEXT")
            .execute(db.pool())
            .await
            .unwrap();

        let schema = describe_schema(&db).await.unwrap();
        let users = schema.tables.iter().find(|t| t.name == "users").unwrap();
        assert_eq!(users.columns, vec!["id", "name", "email", "created_at"]);
    }

    #[tokio::test]
    async fn test_empty_database() {
        let db = Database::in_memory().await.unwrap();
        let schema = describe_schema(&db).await.unwrap();
        assert!(schema.is_empty());
        assert_eq!(schema.to_string(), "");
    }

    #[tokio::test]
    async fn test_table_exists() {
        let db = setup().await;
        assert!(table_exists(&db, "users").await.unwrap());
        assert!(!table_exists(&db, "nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_tables_in_catalog_order() {
        let db = setup().await;
        assert_eq!(list_tables(&db).await.unwrap(), vec!["users", "orders"]);
    }
}
