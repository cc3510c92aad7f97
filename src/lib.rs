//! SQLite Assistant Library
//!
//! Natural-language questions over a SQLite database: CSV files are loaded
//! into tables, the live schema and the question are sent to a language
//! model, and the SQL it returns is executed locally.
//! The main binary is in src/main.rs.

pub mod assistant;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod logging;
