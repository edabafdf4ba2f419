//! mdoc CLI - outline and search for markdown documentation projects.
//!
//! This is the entry point for the `mdoc` command-line interface. Command
//! implementations live in the `commands` module.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    match cli.command {
        Commands::Outline { dir, format } => commands::outline(&dir, format).await,
        Commands::Search {
            dir,
            query,
            limit,
            format,
        } => commands::search(&dir, &query, limit, format).await,
    }
}

fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
