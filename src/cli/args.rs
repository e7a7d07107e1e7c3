//! CLI argument definitions using clap
//!
//! Commands:
//! - feedstore init --config <path>
//! - feedstore query --config <path>
//! - feedstore batch --config <path>
//! - feedstore tables --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// feedstore - embedded document store with a relational-style query builder
#[derive(Parser, Debug)]
#[command(name = "feedstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the storage directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./feedstore.json")]
        config: PathBuf,
    },

    /// Execute one JSON query request from stdin and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./feedstore.json")]
        config: PathBuf,
    },

    /// Execute one JSON query request per stdin line
    Batch {
        /// Path to configuration file
        #[arg(long, default_value = "./feedstore.json")]
        config: PathBuf,
    },

    /// List tables as a JSON array
    Tables {
        /// Path to configuration file
        #[arg(long, default_value = "./feedstore.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
