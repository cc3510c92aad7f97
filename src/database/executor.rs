//! Query Executor
//!
//! Runs arbitrary SQL against the session database and materializes the
//! results. Reads and writes go through the same path; nothing is filtered.

use crate::database::connection::Database;
use crate::error::{AssistantError, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use futures::TryStreamExt;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Either, Executor, Row, Statement, TypeInfo, ValueRef};
use std::fmt;

/// A single cell, following SQLite storage classes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Tabular result of a statement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows in the order the engine returned them
    pub rows: Vec<Vec<Value>>,
    /// Rows changed by writing statements
    pub rows_affected: u64,
}

impl QueryResult {
    /// Number of rows returned
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the statement produced a result set
    pub fn has_result_set(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Render as a terminal table
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(self.columns.clone());

        for row in &self.rows {
            table.add_row(row.iter().map(|v| v.to_string()));
        }
        table
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_result_set() {
            return write!(f, "Statement executed. {} row(s) affected.", self.rows_affected);
        }
        writeln!(f, "{}", self.to_table())?;
        write!(f, "[{} rows x {} columns]", self.row_count(), self.columns.len())
    }
}

fn decode_value(row: &SqliteRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match raw.type_info().name() {
        "INTEGER" => Value::Integer(row.try_get(index)?),
        "REAL" => Value::Real(row.try_get(index)?),
        "BLOB" => Value::Blob(row.try_get(index)?),
        _ => Value::Text(row.try_get(index)?),
    };
    Ok(value)
}

fn decode_row(row: &SqliteRow) -> std::result::Result<Vec<Value>, sqlx::Error> {
    (0..row.len()).map(|i| decode_value(row, i)).collect()
}

/// Execute `sql` and collect its result
///
/// Multiple `;`-separated statements are allowed. The result set is the one
/// of the last statement that returned rows, and `rows_affected` sums the
/// writes of all of them.
pub async fn run_sql(db: &Database, sql: &str) -> Result<QueryResult> {
    if sql.trim().is_empty() {
        return Err(AssistantError::EmptyStatement);
    }

    let mut result = QueryResult::default();
    let mut statement_finished = false;

    {
        let mut stream = sqlx::raw_sql(sql).fetch_many(db.pool());
        while let Some(step) = stream
            .try_next()
            .await
            .map_err(|e| AssistantError::query_execution(sql, e))?
        {
            match step {
                Either::Left(done) => {
                    result.rows_affected += done.rows_affected();
                    statement_finished = true;
                }
                Either::Right(row) => {
                    if statement_finished {
                        // a later statement replaces the earlier result set
                        result.columns.clear();
                        result.rows.clear();
                        statement_finished = false;
                    }
                    if result.columns.is_empty() {
                        result.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }
                    let values = decode_row(&row).map_err(|e| AssistantError::query_execution(sql, e))?;
                    result.rows.push(values);
                }
            }
        }
    }

    // An empty result set still has a header
    if result.rows.is_empty() && result.columns.is_empty() {
        if let Ok(statement) = db.pool().prepare(sql).await {
            result.columns = statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
        }
    }

    tracing::debug!(
        rows = result.row_count(),
        rows_affected = result.rows_affected,
        "executed statement"
    );
    Ok(result)
}
