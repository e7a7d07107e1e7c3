//! JSON I/O handling for the CLI
//!
//! - Input: one `QueryRequest` JSON object per line
//! - Output: one `QueryResult` JSON object per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde::Serialize;

use super::errors::{CliError, CliResult};
use crate::query::QueryRequest;

/// Parse one request line
pub fn parse_request(line: &str) -> CliResult<QueryRequest> {
    if line.trim().is_empty() {
        return Err(CliError::invalid_request("Empty input"));
    }
    serde_json::from_str(line).map_err(|e| CliError::invalid_request(format!("JSON error: {}", e)))
}

/// Read a single request from the first line of `reader`
pub fn read_request<R: BufRead>(reader: &mut R) -> CliResult<QueryRequest> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    parse_request(&line)
}

/// Write any serializable value as one JSON line
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)
        .map_err(|e| CliError::io_error(format!("JSON error: {}", e)))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
