//! CLI command implementations
//!
//! Every command loads the configuration first and opens the store from it.
//! Query failures are written to stdout as result objects; only configuration
//! and I/O problems surface as `CliError`.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{parse_request, read_request, write_json};
use crate::config::StoreConfig;
use crate::query::{QueryError, QueryResult};
use crate::store::Store;

/// Run the CLI
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a specific command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Init { config } => init(&config),
        Command::Query { config } => {
            let store = open_store(&config)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            query(&store, &mut stdin.lock(), &mut stdout.lock())
        }
        Command::Batch { config } => {
            let store = open_store(&config)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            batch(&store, stdin.lock(), &mut stdout.lock())
        }
        Command::Tables { config } => {
            let store = open_store(&config)?;
            let stdout = io::stdout();
            tables(&store, &mut stdout.lock())
        }
    }
}

fn open_store(config_path: &Path) -> CliResult<Store> {
    let config = StoreConfig::load(config_path)?;
    Ok(Store::from_config(&config))
}

/// Create the storage root named by the configuration
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = StoreConfig::load(config_path)?;
    let root = config.data_path();

    fs::create_dir_all(root).map_err(|e| {
        CliError::storage_error(format!("failed to create {}: {}", root.display(), e))
    })?;

    // Opening logs STORE_OPENED with the resolved root
    Store::from_config(&config);
    Ok(())
}

/// Execute one request read from `input`
pub fn query<R: BufRead, W: Write>(store: &Store, input: &mut R, output: &mut W) -> CliResult<()> {
    let request = read_request(input)?;
    let result = request.into_builder(store).execute();
    write_json(output, &result)
}

/// Execute one request per input line
///
/// Blank lines are skipped. A malformed line produces an error result line
/// and processing continues with the next line.
pub fn batch<R: BufRead, W: Write>(store: &Store, input: R, output: &mut W) -> CliResult<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let result = match parse_request(&line) {
            Ok(request) => request.into_builder(store).execute(),
            Err(e) => QueryResult::err(QueryError::new(e.code_str(), e.message())),
        };
        write_json(output, &result)?;
    }
    Ok(())
}

/// Write the table names as a JSON array
pub fn tables<W: Write>(store: &Store, output: &mut W) -> CliResult<()> {
    let names = store.list_tables()?;
    write_json(output, &names)
}
