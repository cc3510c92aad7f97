//! Error Log
//!
//! Append-only file sink for request failures. The file is created on first
//! write and only ever appended to; there is no rotation or size limit.

use crate::error::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default log file, relative to the working directory
pub const DEFAULT_ERROR_LOG: &str = "error_log.txt";

/// Durable append-only error log
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Log to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped entry
    pub fn record(&self, detail: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} - {}", Local::now().format("%Y-%m-%d %H:%M:%S%.6f"), detail)?;
        Ok(())
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG)
    }
}
