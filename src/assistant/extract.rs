//! SQL Extractor
//!
//! Pulls the SQL statement out of a free-text model response with a
//! line-oriented scan:
//!
//! - blank lines and lines starting with `-` are dropped;
//! - capture starts at the first line beginning with `select`
//!   (case-insensitive, leading whitespace ignored);
//! - once started, every following line is captured;
//! - a line containing `;` ends the capture one line later, so the line right
//!   after the terminator is captured as well.
//!
//! Only `select` starts a capture; `WITH`, `INSERT`, `PRAGMA` and friends are
//! never picked up. An empty result is not an error.

/// Extract the SQL segment of `response`
pub fn extract_sql(response: &str) -> String {
    let mut captured: Vec<&str> = Vec::new();
    let mut capturing = false;
    let mut terminated = false;

    for line in response.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('-') {
            continue;
        }

        if !capturing {
            if !trimmed.to_lowercase().starts_with("select") {
                continue;
            }
            capturing = true;
        }

        captured.push(line);
        if terminated {
            break;
        }
        terminated = line.contains(';');
    }

    captured.join("\n")
}
