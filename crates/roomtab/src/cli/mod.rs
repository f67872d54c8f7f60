//! Roomtab app cli definition and entrypoint.
mod serve;
mod session;
pub mod ux;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roomtab_core::config::get_config;

use crate::log::setup_logging;

/// Roomtab - split shared household utility bills among roommates.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Show verbose logs.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive billing session. This is the default command.
    Session {
        /// Ledger file to operate on, overrides the configured path.
        #[arg(short, long)]
        ledger: Option<PathBuf>,
    },
    /// Serve the HTTP health endpoint.
    Serve {
        /// Port to bind, overrides the configured port.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Runs the main CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        setup_logging().context("Failed to set up logging")?;
    }

    // Load configuration
    let config = get_config(None).context("Failed to load configuration")?;

    match cli.command {
        Some(Commands::Serve { port }) => serve::execute(port, &config).await,
        Some(Commands::Session { ledger }) => session::execute(ledger, &config),
        None => session::execute(None, &config),
    }
}
