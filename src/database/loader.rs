//! CSV Loader
//!
//! Parses CSV data, infers a SQLite column type per column and loads the rows
//! into a newly created table.
//!
//! Type map (inferred kind -> declared type):
//! text -> TEXT, integer -> INTEGER, floating point -> REAL,
//! boolean -> INTEGER (stored as 1/0), datetime -> TEXT (original text kept).

use crate::database::connection::Database;
use crate::database::introspect;
use crate::error::{AssistantError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Sqlite, Transaction};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inferred kind of a CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Boolean,
    DateTime,
}

impl ColumnKind {
    /// Declared SQLite type for this kind
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Boolean => "INTEGER",
            ColumnKind::DateTime => "TEXT",
        }
    }

    /// Infer the kind of a column from its cells
    ///
    /// Empty cells are missing values. An integer column with missing values
    /// widens to REAL; a boolean column with missing values falls back to TEXT.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let cells: Vec<&str> = cells.into_iter().collect();
        let present: Vec<&str> = cells.iter().copied().filter(|c| !c.is_empty()).collect();
        let has_missing = present.len() < cells.len();

        if cells.is_empty() {
            return ColumnKind::Text;
        }
        if present.is_empty() {
            return ColumnKind::Real;
        }

        if !has_missing && present.iter().all(|c| parse_bool(c).is_some()) {
            return ColumnKind::Boolean;
        }
        if present.iter().all(|c| c.parse::<i64>().is_ok()) {
            return if has_missing {
                ColumnKind::Real
            } else {
                ColumnKind::Integer
            };
        }
        if present.iter().all(|c| parse_real(c).is_some()) {
            return ColumnKind::Real;
        }
        if present.iter().all(|c| is_datetime(c)) {
            return ColumnKind::DateTime;
        }
        ColumnKind::Text
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_real(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_datetime(cell: &str) -> bool {
    DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(cell, fmt).is_ok())
        || NaiveDate::parse_from_str(cell, DATE_FORMAT).is_ok()
}

/// Name blank headers `Unnamed: <i>` and suffix repeats with `.1`, `.2`, ...
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        // SQLite column names are case-insensitive
        while !seen.insert(candidate.to_lowercase()) {
            candidate = format!("{}.{}", base, n);
            n += 1;
        }
        headers.push(candidate);
    }
    headers
}

/// Parsed CSV data with inferred column kinds
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Header names
    pub headers: Vec<String>,
    /// Inferred kind per column
    pub kinds: Vec<ColumnKind>,
    /// Raw cells, normalized to the header width
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let raw: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if raw.is_empty() || raw.iter().all(|h| h.is_empty()) {
            return Err(AssistantError::InvalidInput("CSV data has no header row".to_string()));
        }
        let headers = unique_headers(raw);

        let width = headers.len();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().take(width).map(|c| c.to_string()).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        let kinds = (0..width)
            .map(|i| ColumnKind::infer(rows.iter().map(|r| r[i].as_str())))
            .collect();

        Ok(Self {
            headers,
            kinds,
            rows,
        })
    }

    /// Parse a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AssistantError::FileNotFound(path.display().to_string()));
        }
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        tracing::debug!(
            path = %path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "parsed CSV file"
        );
        Ok(table)
    }
}

/// What to do when the target table already exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictAction {
    /// Drop the existing table and load into a fresh one
    Overwrite,
    /// Load into a new table with this name instead
    Rename(String),
    /// Leave the database untouched
    Skip,
}

impl ConflictAction {
    /// Parse `overwrite`, `rename <name>` or `skip`
    ///
    /// Anything unrecognised is treated as `skip`.
    pub fn parse(action: &str, new_name: Option<&str>) -> Result<Self> {
        match action.trim().to_lowercase().as_str() {
            "overwrite" => Ok(ConflictAction::Overwrite),
            "rename" => match new_name.map(str::trim).filter(|n| !n.is_empty()) {
                Some(name) => Ok(ConflictAction::Rename(name.to_string())),
                None => Err(AssistantError::InvalidInput(
                    "rename requires a new table name".to_string(),
                )),
            },
            _ => Ok(ConflictAction::Skip),
        }
    }
}

/// Result of a load request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// New table created and loaded
    Created { table: String, rows: u64 },
    /// Existing table replaced
    Overwritten { table: String, rows: u64 },
    /// Existing table left as is
    Skipped { table: String },
    /// Table exists and no action was given
    Conflict { table: String },
}

impl std::fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadOutcome::Created { table, rows } => {
                write!(f, "✅ Table '{}' created and loaded ({} rows).", table, rows)
            }
            LoadOutcome::Overwritten { table, rows } => {
                write!(f, "✅ Table '{}' overwritten and loaded ({} rows).", table, rows)
            }
            LoadOutcome::Skipped { .. } => write!(f, "⏭️ Skipped loading."),
            LoadOutcome::Conflict { table } => write!(f, "⚠️ Table '{}' already exists.", table),
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create `table` with one declared column per CSV header
async fn create_table(tx: &mut Transaction<'_, Sqlite>, table: &str, data: &CsvTable) -> Result<()> {
    let columns: Vec<String> = data
        .headers
        .iter()
        .zip(&data.kinds)
        .map(|(name, kind)| format!("{} {}", quote_ident(name), kind.sql_type()))
        .collect();

    let ddl = format!("CREATE TABLE {} ({});", quote_ident(table), columns.join(", "));
    sqlx::query(&ddl).execute(&mut **tx).await?;
    Ok(())
}

/// Insert every CSV row into `table`
async fn insert_rows(tx: &mut Transaction<'_, Sqlite>, table: &str, data: &CsvTable) -> Result<u64> {
    let column_list: Vec<String> = data.headers.iter().map(|h| quote_ident(h)).collect();
    let placeholders = vec!["?"; data.headers.len()].join(", ");
    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        column_list.join(", "),
        placeholders
    );

    let mut inserted = 0;
    for row in &data.rows {
        let mut query = sqlx::query(&insert);
        for (cell, kind) in row.iter().zip(&data.kinds) {
            query = if cell.is_empty() {
                query.bind(Option::<String>::None)
            } else {
                match kind {
                    ColumnKind::Integer => query.bind(cell.parse::<i64>().ok()),
                    ColumnKind::Real => query.bind(parse_real(cell)),
                    ColumnKind::Boolean => query.bind(parse_bool(cell).map(i64::from)),
                    ColumnKind::Text | ColumnKind::DateTime => query.bind(cell.clone()),
                }
            };
        }
        inserted += query.execute(&mut **tx).await?.rows_affected();
    }
    Ok(inserted)
}

/// Create `table` and fill it in one transaction, dropping any existing
/// table first when `replace` is set
///
/// Nothing is changed unless every step succeeds.
pub async fn write_table(db: &Database, table: &str, data: &CsvTable, replace: bool) -> Result<u64> {
    let mut tx = db.pool().begin().await?;
    if replace {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
            .execute(&mut *tx)
            .await?;
    }
    create_table(&mut tx, table, data).await?;
    let rows = insert_rows(&mut tx, table, data).await?;
    tx.commit().await?;
    Ok(rows)
}

/// Create `table` from `data`, applying `on_conflict` if it already exists
pub async fn load_table(
    db: &Database,
    data: &CsvTable,
    table: &str,
    on_conflict: Option<&ConflictAction>,
) -> Result<LoadOutcome> {
    let table = table.trim();
    if table.is_empty() {
        return Err(AssistantError::InvalidInput("Table name must not be empty".to_string()));
    }

    if !introspect::table_exists(db, table).await? {
        let rows = write_table(db, table, data, false).await?;
        tracing::info!(table, rows, "loaded CSV into new table");
        return Ok(LoadOutcome::Created {
            table: table.to_string(),
            rows,
        });
    }

    match on_conflict {
        None => Ok(LoadOutcome::Conflict {
            table: table.to_string(),
        }),
        Some(ConflictAction::Skip) => Ok(LoadOutcome::Skipped {
            table: table.to_string(),
        }),
        Some(ConflictAction::Overwrite) => {
            let rows = write_table(db, table, data, true).await?;
            tracing::info!(table, rows, "overwrote table with CSV data");
            Ok(LoadOutcome::Overwritten {
                table: table.to_string(),
                rows,
            })
        }
        Some(ConflictAction::Rename(new_table)) => {
            let rows = write_table(db, new_table, data, false).await?;
            tracing::info!(table = %new_table, rows, "loaded CSV under new name");
            Ok(LoadOutcome::Created {
                table: new_table.clone(),
                rows,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::executor::{run_sql, Value};

    const PEOPLE: &str = "\
name,age,score,active,joined
alice,30,1.5,true,2024-01-02
bob,25,2.25,False,2024-02-03 10:30:00
";

    #[test]
    fn test_infer_kinds() {
        assert_eq!(ColumnKind::infer(["1", "2", "-3"]), ColumnKind::Integer);
        assert_eq!(ColumnKind::infer(["1", "", "3"]), ColumnKind::Real);
        assert_eq!(ColumnKind::infer(["1.5", "2"]), ColumnKind::Real);
        assert_eq!(ColumnKind::infer(["true", "FALSE"]), ColumnKind::Boolean);
        assert_eq!(ColumnKind::infer(["true", ""]), ColumnKind::Text);
        assert_eq!(
            ColumnKind::infer(["2024-01-01", "2024-01-02T08:00:00"]),
            ColumnKind::DateTime
        );
        assert_eq!(ColumnKind::infer(["a", "1"]), ColumnKind::Text);
        assert_eq!(ColumnKind::infer(["", ""]), ColumnKind::Real);
        assert_eq!(ColumnKind::infer(["inf"]), ColumnKind::Text);
    }

    #[test]
    fn test_type_map() {
        assert_eq!(ColumnKind::Text.sql_type(), "TEXT");
        assert_eq!(ColumnKind::Integer.sql_type(), "INTEGER");
        assert_eq!(ColumnKind::Real.sql_type(), "REAL");
        assert_eq!(ColumnKind::Boolean.sql_type(), "INTEGER");
        assert_eq!(ColumnKind::DateTime.sql_type(), "TEXT");
    }

    #[test]
    fn test_parse_csv_normalizes_rows() {
        let data = CsvTable::from_reader("a, b ,c\n1,2\n3,4,5,6\n".as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["a", "b", "c"]);
        assert_eq!(data.rows[0], vec!["1", "2", ""]);
        assert_eq!(data.rows[1], vec!["3", "4", "5"]);
    }

    #[test]
    fn test_repeated_and_blank_headers_renamed() {
        let data = CsvTable::from_reader("a,a,,b,a.1\n1,2,3,4,5\n".as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["a", "a.1", "Unnamed: 2", "b", "a.1.1"]);

        let data = CsvTable::from_reader("Id,id\n1,2\n".as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["Id", "id.1"]);
    }

    #[tokio::test]
    async fn test_repeated_headers_load() {
        let db = Database::in_memory().await.unwrap();
        let data = CsvTable::from_reader("a,a\n1,2\n".as_bytes()).unwrap();
        load_table(&db, &data, "pairs", None).await.unwrap();

        let result = run_sql(&db, "SELECT * FROM pairs").await.unwrap();
        assert_eq!(result.columns, vec!["a", "a.1"]);
        assert_eq!(result.rows, vec![vec![Value::Integer(1), Value::Integer(2)]]);
    }

    #[tokio::test]
    async fn test_failed_overwrite_keeps_existing_table() {
        let db = Database::in_memory().await.unwrap();
        let first = CsvTable::from_reader("x\n1\n2\n".as_bytes()).unwrap();
        load_table(&db, &first, "t", None).await.unwrap();

        // a header list SQLite rejects once the existing table is dropped
        let broken = CsvTable {
            headers: vec!["y".to_string(), "y".to_string()],
            kinds: vec![ColumnKind::Integer, ColumnKind::Integer],
            rows: vec![vec!["1".to_string(), "2".to_string()]],
        };
        assert!(load_table(&db, &broken, "t", Some(&ConflictAction::Overwrite))
            .await
            .is_err());

        let result = run_sql(&db, "SELECT x FROM t").await.unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = CsvTable::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, AssistantError::FileNotFound(_)));
    }

    #[test]
    fn test_conflict_action_parse() {
        assert_eq!(ConflictAction::parse("Overwrite", None).unwrap(), ConflictAction::Overwrite);
        assert_eq!(
            ConflictAction::parse("rename", Some("people_2")).unwrap(),
            ConflictAction::Rename("people_2".to_string())
        );
        assert!(ConflictAction::parse("rename", None).is_err());
        assert_eq!(ConflictAction::parse("whatever", None).unwrap(), ConflictAction::Skip);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let data = CsvTable::from_reader(PEOPLE.as_bytes()).unwrap();

        let outcome = load_table(&db, &data, "people", None).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Created {
                table: "people".to_string(),
                rows: 2
            }
        );

        let result = run_sql(&db, "SELECT * FROM people").await.unwrap();
        assert_eq!(result.columns, vec!["name", "age", "score", "active", "joined"]);
        assert_eq!(
            result.rows,
            vec![
                vec![
                    "alice".into(),
                    Value::Integer(30),
                    Value::Real(1.5),
                    Value::Integer(1),
                    "2024-01-02".into(),
                ],
                vec![
                    "bob".into(),
                    Value::Integer(25),
                    Value::Real(2.25),
                    Value::Integer(0),
                    "2024-02-03 10:30:00".into(),
                ],
            ]
        );
    }

    #[tokio::test]
    async fn test_declared_types() {
        let db = Database::in_memory().await.unwrap();
        let data = CsvTable::from_reader(PEOPLE.as_bytes()).unwrap();
        load_table(&db, &data, "people", None).await.unwrap();

        let result = run_sql(&db, "SELECT name, type FROM pragma_table_info('people')")
            .await
            .unwrap();
        let types: Vec<String> = result.rows.iter().map(|r| r[1].to_string()).collect();
        assert_eq!(types, vec!["TEXT", "INTEGER", "REAL", "INTEGER", "TEXT"]);
    }

    #[tokio::test]
    async fn test_missing_values_load_as_null() {
        let db = Database::in_memory().await.unwrap();
        let data = CsvTable::from_reader("id,qty\n1,\n2,5\n".as_bytes()).unwrap();
        load_table(&db, &data, "stock", None).await.unwrap();

        let result = run_sql(&db, "SELECT qty FROM stock").await.unwrap();
        assert_eq!(result.rows, vec![vec![Value::Null], vec![Value::Real(5.0)]]);
    }

    #[tokio::test]
    async fn test_conflict_policies() {
        let db = Database::in_memory().await.unwrap();
        let first = CsvTable::from_reader("x\n1\n2\n".as_bytes()).unwrap();
        let second = CsvTable::from_reader("x\n9\n".as_bytes()).unwrap();
        load_table(&db, &first, "t", None).await.unwrap();

        let outcome = load_table(&db, &second, "t", None).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Conflict { table: "t".to_string() });

        let outcome = load_table(&db, &second, "t", Some(&ConflictAction::Skip))
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped { table: "t".to_string() });
        assert_eq!(run_sql(&db, "SELECT * FROM t").await.unwrap().row_count(), 2);

        let rename = ConflictAction::Rename("t2".to_string());
        let outcome = load_table(&db, &second, "t", Some(&rename)).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Created {
                table: "t2".to_string(),
                rows: 1
            }
        );
        assert_eq!(run_sql(&db, "SELECT * FROM t").await.unwrap().row_count(), 2);

        let outcome = load_table(&db, &second, "t", Some(&ConflictAction::Overwrite))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Overwritten {
                table: "t".to_string(),
                rows: 1
            }
        );
        let result = run_sql(&db, "SELECT * FROM t").await.unwrap();
        assert_eq!(result.rows, vec![vec![Value::Integer(9)]]);
    }
}
