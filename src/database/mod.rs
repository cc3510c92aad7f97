//! Database module
//!
//! This module provides the session's SQLite handle, catalog introspection,
//! query execution and CSV loading.

pub mod connection;
pub mod executor;
pub mod introspect;
pub mod loader;
pub mod schema;

// Re-exports
pub use connection::{Database, DatabaseLocation};
pub use executor::{QueryResult, Value};
pub use loader::{ColumnKind, ConflictAction, CsvTable, LoadOutcome};
pub use schema::{SchemaDescription, TableSchema};
