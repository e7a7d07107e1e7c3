//! CLI module for feedstore
//!
//! Provides command-line interface for:
//! - init: Create the storage root
//! - query: One-shot query execution from stdin
//! - batch: Line-delimited query execution from stdin
//! - tables: List stored tables

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{batch, init, query, run, run_command, tables};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_json};
