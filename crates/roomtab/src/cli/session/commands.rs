use clap::{Args, Parser, Subcommand};
use roomtab_core::split::{SharedUtility, SplitRule};

// -------------
// REPL commands
// -------------
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct CliCommand {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Attach a user, or apply a bill to the tracked users.
    Add(AddArgs),
    /// Show current totals for every tracked user and the public account.
    Info,
    /// Persist the ledger to disk.
    Update,
    /// Exit the session
    #[command(alias = "q", alias = "quit")]
    Exit,
}

#[derive(Args, Debug, PartialEq)]
pub struct AddArgs {
    /// Attach a user from the ledger to this session.
    #[arg(
        short = 'u',
        value_name = "NAME",
        conflicts_with_all = ["electric", "water", "gas", "network", "all", "split"]
    )]
    pub user: Option<String>,

    /// Apply an electricity bill.
    #[arg(short = 'e')]
    pub electric: bool,
    /// Apply a water bill.
    #[arg(short = 'w')]
    pub water: bool,
    /// Apply a gas bill.
    #[arg(short = 'g')]
    pub gas: bool,
    /// Apply a network bill.
    #[arg(short = 'n')]
    pub network: bool,

    /// Split evenly across all tracked users (default).
    #[arg(short = 'a', conflicts_with = "split")]
    pub all: bool,
    /// Split evenly across the named users only.
    #[arg(short = 's', value_name = "NAME", num_args = 1..)]
    pub split: Vec<String>,
}

/// What an `add` invocation asks for.
#[derive(Debug, PartialEq)]
pub enum AddRequest {
    AttachUser(String),
    Bill {
        category: BillCategory,
        rule: SplitRule,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillCategory {
    Electric,
    Water,
    Gas,
    Network,
}

impl BillCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BillCategory::Electric => "electricity",
            BillCategory::Water => "water",
            BillCategory::Gas => "gas",
            BillCategory::Network => "network",
        }
    }

    /// The uniform-split utility for this category; `None` for electricity,
    /// which needs per-user metering.
    pub fn shared_utility(&self) -> Option<SharedUtility> {
        match self {
            BillCategory::Electric => None,
            BillCategory::Water => Some(SharedUtility::Water),
            BillCategory::Gas => Some(SharedUtility::Gas),
            BillCategory::Network => Some(SharedUtility::Network),
        }
    }
}

impl AddArgs {
    /// Interprets the flag combination. Exactly one of `-u`, `-e`, `-w`,
    /// `-g`, `-n` must be given; a bill without `-a`/`-s` splits across all.
    pub fn request(&self) -> Result<AddRequest, String> {
        if let Some(user) = &self.user {
            return Ok(AddRequest::AttachUser(user.clone()));
        }

        let category = match (self.electric, self.water, self.gas, self.network) {
            (true, false, false, false) => BillCategory::Electric,
            (false, true, false, false) => BillCategory::Water,
            (false, false, true, false) => BillCategory::Gas,
            (false, false, false, true) => BillCategory::Network,
            _ => return Err("choose exactly one of -u, -e, -w, -g or -n".to_string()),
        };

        let rule = if self.split.is_empty() {
            SplitRule::All
        } else {
            SplitRule::Among(self.split.clone())
        };
        Ok(AddRequest::Bill { category, rule })
    }
}

/// Tokenizes a REPL input line for clap parsing.
pub fn parse_command_line(line: &str) -> Vec<String> {
    let trimmed_line = line.trim();
    shlex::split(trimmed_line).unwrap_or_else(|| {
        // Fallback for lines with unbalanced quotes
        trimmed_line
            .split_whitespace()
            .map(|s| s.to_string())
            .collect()
    })
}
