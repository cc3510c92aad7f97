//! Schema data structures
//!
//! This module defines the catalog snapshot handed to the language model:
//! tables in catalog order, each with its column names in declared order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A table and its column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Column names in declared ordinal order
    pub columns: Vec<String>,
}

impl TableSchema {
    /// Create a new table entry
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {} ({})", self.name, self.columns.join(", "))
    }
}

/// Snapshot of the database catalog
///
/// Built fresh for every request; it is never cached, so it always reflects
/// the catalog at the time it was read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    /// Tables in catalog enumeration order
    pub tables: Vec<TableSchema>,
}

impl SchemaDescription {
    /// Create an empty description
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table
    pub fn add_table(&mut self, table: TableSchema) {
        self.tables.push(table);
    }

    /// Number of tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Whether the database has no user tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, table) in self.tables.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", table)?;
        }
        Ok(())
    }
}
