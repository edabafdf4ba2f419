//! Argument parsing for the `mdoc` command.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Browse and search markdown documentation projects.
#[derive(Debug, Parser)]
#[command(name = "mdoc", version, about)]
pub struct Cli {
    /// Enable informational logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug logging (build and query timings)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the project outline extracted from the index document
    Outline {
        /// Project directory containing the index document
        dir: PathBuf,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Search every document reachable from the project outline
    Search {
        /// Project directory containing the index document
        dir: PathBuf,

        /// Query string
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with ANSI highlighting
    Text,
    /// Machine-readable JSON with HTML highlight markers
    Json,
}
