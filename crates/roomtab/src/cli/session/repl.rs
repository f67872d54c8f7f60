use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use roomtab_core::split::{ElectricBill, SplitRule};
use rustyline::completion::{Candidate, Completer};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Editor, Helper, Highlighter, Validator};
use tracing::debug;

use crate::cli::session::commands::{
    AddArgs, AddRequest, BillCategory, CliCommand, Command, parse_command_line,
};
use crate::cli::ux::{
    MessageType, format_electric_breakdown, format_shares, format_totals, style_text,
};
use crate::svc::session::Session;

type ReplEditor = Editor<Repl, DefaultHistory>;

// -------------
// REPL completion
// -------------
#[derive(Helper, Validator, Highlighter)]
struct Repl {
    pub command_names: Vec<String>,
    pub user_names: Vec<String>,
}

#[derive(Debug)]
struct CompletionCandidate {
    text: String,
    display_string: String,
}

impl CompletionCandidate {
    pub fn new(text: &str) -> Self {
        let display_string = style_text(text, MessageType::Footer).to_string();
        Self {
            text: text.to_owned(),
            display_string,
        }
    }
}

impl Candidate for CompletionCandidate {
    fn display(&self) -> &str {
        &self.display_string
    }

    fn replacement(&self) -> &str {
        &self.text
    }
}

// User name completion for `add -u` and `add -s`
fn user_compl(
    line: &str,
    pos: usize,
    user_names: &[String],
) -> rustyline::Result<(usize, Vec<CompletionCandidate>)> {
    let line_to_pos = &line[..pos];
    if let Some(space_pos) = line_to_pos.rfind(' ') {
        let name_prefix_start = space_pos + 1;
        if name_prefix_start <= line_to_pos.len() {
            let name_prefix = line_to_pos[name_prefix_start..].to_uppercase();
            let candidates = user_names
                .iter()
                .filter(|name| name.starts_with(&name_prefix))
                .map(|name| CompletionCandidate::new(name))
                .collect();
            return Ok((name_prefix_start, candidates));
        }
    }
    Ok((0, Vec::new()))
}

impl Completer for Repl {
    type Candidate = CompletionCandidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let line_to_pos = &line[..pos];

        // Name positions after -u/-s on an add line complete to known users.
        if line_to_pos.starts_with("add")
            && (line_to_pos.contains("-u") || line_to_pos.contains("-s"))
        {
            return user_compl(line, pos, &self.user_names);
        }

        // The first word completes to a command name.
        if line_to_pos.contains(' ') {
            return Ok((0, Vec::new()));
        }
        let candidates = self
            .command_names
            .iter()
            .filter(|name| name.starts_with(line_to_pos))
            .map(|name| CompletionCandidate::new(name))
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for Repl {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if line.is_empty() || pos < line.len() || line.contains(' ') {
            return None;
        }
        self.command_names
            .iter()
            .find(|&cmd_name| cmd_name.starts_with(line))
            .map(|cmd_name| cmd_name[line.len()..].into())
    }
}

fn format_prompt(session: &Session) -> String {
    let tracked = session.roster_names();
    let meta = if tracked.is_empty() {
        "[no tracked users, add one with: add -u <name>]".to_string()
    } else {
        format!("[tracking: {}]", tracked.join(", "))
    };
    format!(
        "\n{}\n{}",
        style_text(&meta, MessageType::Footer),
        style_text("> ", MessageType::Prompt)
    )
}

fn report_error(message: &str) {
    eprintln!("{}", style_text(message, MessageType::Error));
}

/// Runs the interactive REPL over a loaded session.
pub fn run(mut session: Session) -> Result<()> {
    println!("Welcome to roomtab! Type 'help' for commands, 'exit' to quit.");

    let config = rustyline::Config::builder()
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let command_names = CliCommand::command()
        .get_subcommands()
        .flat_map(|c| c.get_name_and_visible_aliases())
        .map(String::from)
        .collect::<Vec<_>>();

    let mut rl: ReplEditor = Editor::with_config(config)?;
    rl.set_helper(Some(Repl {
        command_names,
        user_names: session.catalog_names(),
    }));

    loop {
        let prompt = format_prompt(&session);
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(&line)?;
                let trimmed_line = line.trim();
                if trimmed_line.is_empty() {
                    continue;
                }

                let args = parse_command_line(trimmed_line);
                match CliCommand::try_parse_from(args) {
                    Ok(cli_command) => {
                        if !execute(cli_command.command, &mut session, &mut rl)? {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        e.print()?;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Type 'exit' to quit.");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nBye!");
                return Ok(());
            }
            Err(err) => {
                return Err(err.into());
            }
        }
    }
}

/// Executes a REPL command.
///
/// Returns `Ok(false)` if the REPL should exit. Command failures are
/// reported and the loop continues; only save failures propagate.
fn execute(command: Command, session: &mut Session, rl: &mut ReplEditor) -> Result<bool> {
    match command {
        Command::Info => {
            print!("{}", format_totals(&session.tracked_accounts(), session.public()));
            Ok(true)
        }
        Command::Update => {
            save(session)?;
            Ok(true)
        }
        Command::Exit => {
            if session.is_dirty() {
                println!("Unsaved changes discarded.");
            }
            println!("Bye!");
            Ok(false)
        }
        Command::Add(args) => {
            execute_add(&args, session, rl)?;
            Ok(true)
        }
    }
}

fn execute_add(args: &AddArgs, session: &mut Session, rl: &mut ReplEditor) -> Result<()> {
    let request = match args.request() {
        Ok(request) => request,
        Err(message) => {
            report_error(&message);
            return Ok(());
        }
    };

    match request {
        AddRequest::AttachUser(name) => {
            match session.attach_user(&name) {
                Ok(key) => println!("Tracking user: {key}"),
                Err(e) => report_error(&format!("Cannot attach user: {e}")),
            }
            Ok(())
        }
        AddRequest::Bill { category, rule } => {
            let applied = apply_bill(session, category, &rule, rl)?;
            if applied {
                confirm_save(session, rl)?;
            }
            Ok(())
        }
    }
}

/// Prompts for the bill inputs and applies it. Returns whether the ledger
/// was mutated; invalid input or a rejected split leaves it untouched.
fn apply_bill(
    session: &mut Session,
    category: BillCategory,
    rule: &SplitRule,
    rl: &mut ReplEditor,
) -> Result<bool> {
    debug!("Applying {} bill", category.label());
    match category.shared_utility() {
        Some(utility) => {
            let Some(total) = prompt_amount(rl, &format!("Total {} fee> ", utility.label()))?
            else {
                return Ok(false);
            };
            match session.shared_bill(utility, total, rule) {
                Ok(shares) => {
                    print!("{}", format_shares(utility.label(), &shares));
                    Ok(true)
                }
                Err(e) => {
                    report_error(&format!("Cannot split {} bill: {e}", utility.label()));
                    Ok(false)
                }
            }
        }
        None => {
            let Some(total_kwh) = prompt_amount(rl, "Total usage this period (kWh)> ")? else {
                return Ok(false);
            };
            let mut readings = BTreeMap::new();
            for name in session.roster_names() {
                let Some(reading) =
                    prompt_amount(rl, &format!("{name} current meter reading (kWh)> "))?
                else {
                    return Ok(false);
                };
                readings.insert(name, reading);
            }
            let Some(unit_price) = prompt_amount(rl, "Unit price per kWh> ")? else {
                return Ok(false);
            };

            let bill = ElectricBill {
                total_kwh,
                unit_price,
                readings,
            };
            match session.electric_bill(&bill, rule) {
                Ok(outcome) => {
                    print!("{}", format_electric_breakdown(&outcome, unit_price));
                    Ok(true)
                }
                Err(e) => {
                    report_error(&format!("Cannot split electricity bill: {e}"));
                    Ok(false)
                }
            }
        }
    }
}

/// Reads one numeric value. `Ok(None)` means the input was invalid or the
/// prompt was cancelled; the failure has already been reported.
fn prompt_amount(rl: &mut ReplEditor, prompt: &str) -> Result<Option<f64>> {
    let styled = style_text(prompt, MessageType::Prompt).to_string();
    match rl.readline(&styled) {
        Ok(line) => {
            let trimmed = line.trim();
            match trimmed.parse::<f64>() {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    report_error(&format!("'{trimmed}' is not a number, bill dropped"));
                    Ok(None)
                }
            }
        }
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
            println!("Bill dropped.");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn confirm_save(session: &mut Session, rl: &mut ReplEditor) -> Result<()> {
    let prompt = style_text("Save changes now? [y/N]> ", MessageType::Prompt).to_string();
    match rl.readline(&prompt) {
        Ok(line) if line.trim().eq_ignore_ascii_case("y") => save(session),
        Ok(_) => {
            println!("Not saved. Run 'update' to persist later.");
            Ok(())
        }
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
            println!("Not saved. Run 'update' to persist later.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

// A failed write terminates the session; there is no safe way to continue
// against a possibly half-written ledger.
fn save(session: &mut Session) -> Result<()> {
    session
        .save()
        .with_context(|| format!("Failed to save ledger '{}'", session.path().display()))?;
    println!("Ledger saved to {}", session.path().display());
    Ok(())
}
