use std::path::PathBuf;

use anyhow::{Context, Result};
use roomtab_core::config::Config;

use crate::svc::session::Session;

mod commands;
mod repl;

/// Executes the session command, starting an interactive REPL over the
/// ledger file.
pub fn execute(ledger: Option<PathBuf>, config: &Config) -> Result<()> {
    let path = ledger.unwrap_or_else(|| config.ledger.clone());
    let session = Session::load(&path)
        .with_context(|| format!("Failed to load ledger '{}'", path.display()))?;
    repl::run(session)
}
