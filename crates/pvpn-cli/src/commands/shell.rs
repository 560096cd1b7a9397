//! Interactive session
//!
//! Connection state and the event log only live as long as the supervisor,
//! so the shell keeps one alive and reads commands from stdin. Connects and
//! disconnects run in the background; their results are printed when they
//! finish, and `quit` waits for the ones still running.

use clap::{Parser, Subcommand};
use pvpn_core::{Direction, Supervisor, TransitionResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use super::{logs, profile, resolve_profile, tunnel};

#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
#[command(help_template = "{subcommands}")]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// List profiles
    List,
    /// Add a profile: add <name> <config-path>
    Add { name: String, config_path: String },
    /// Delete a profile, terminating any running helper for it
    Delete { profile: String },
    /// Bring a tunnel up in the background
    Connect { profile: String },
    /// Take a tunnel down in the background
    Disconnect { profile: String },
    /// Show every profile's status
    Status,
    /// Show the event log
    Logs,
    /// Clear the event log
    ClearLogs,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

type Finished = (String, TransitionResult);

/// Run the read-eval loop until `quit` or end of input
pub async fn run(supervisor: Supervisor) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: JoinSet<Finished> = JoinSet::new();

    println!("pvpn shell. Type 'help' for commands.");
    prompt()?;
    loop {
        tokio::select! {
            Some(done) = pending.join_next(), if !pending.is_empty() => {
                print_finished(done);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !execute(&supervisor, &mut pending, &line) {
                    break;
                }
                prompt()?;
            }
        }
    }

    if !pending.is_empty() {
        println!("Waiting for {} pending operation(s)...", pending.len());
    }
    while let Some(done) = pending.join_next().await {
        print_finished(done);
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("pvpn> ");
    std::io::stdout().flush()
}

fn print_finished(done: Result<Finished, tokio::task::JoinError>) {
    match done {
        Ok((identifier, result)) => {
            if let Err(e) = tunnel::report(&identifier, &result) {
                println!("Error: {e}");
            }
        }
        Err(e) => println!("Error: operation aborted: {e}"),
    }
}

/// Handle one input line. Returns false when the session should end.
fn execute(supervisor: &Supervisor, pending: &mut JoinSet<Finished>, line: &str) -> bool {
    let words = split_words(line);
    if words.is_empty() {
        return true;
    }

    let command = match ShellLine::try_parse_from(words) {
        Ok(parsed) => parsed.command,
        Err(e) => {
            // Covers `help` and usage errors alike
            if let Err(err) = e.print() {
                tracing::debug!("failed to print shell usage: {err}");
            }
            return true;
        }
    };

    let outcome = match command {
        ShellCommand::List => profile::list(supervisor, false),
        ShellCommand::Add { name, config_path } => profile::add(supervisor, &name, &config_path),
        ShellCommand::Delete { profile: identifier } => {
            profile::delete(supervisor, &identifier, true)
        }
        ShellCommand::Connect { profile: identifier } => {
            spawn_transition(supervisor, pending, identifier, Direction::Up);
            Ok(())
        }
        ShellCommand::Disconnect { profile: identifier } => {
            spawn_transition(supervisor, pending, identifier, Direction::Down);
            Ok(())
        }
        ShellCommand::Status => tunnel::status(supervisor, false),
        ShellCommand::Logs => logs::show(supervisor, false),
        ShellCommand::ClearLogs => {
            logs::clear(supervisor);
            Ok(())
        }
        ShellCommand::Quit => return false,
    };

    if let Err(e) = outcome {
        println!("Error: {e:#}");
    }
    true
}

fn spawn_transition(
    supervisor: &Supervisor,
    pending: &mut JoinSet<Finished>,
    identifier: String,
    direction: Direction,
) {
    let supervisor = supervisor.clone();
    let id = resolve_profile(&supervisor, &identifier);
    println!("{identifier}: started {direction}");
    pending.spawn(async move {
        let result = supervisor.request_transition(&id, direction).await;
        (identifier, result)
    });
}

/// Split a line on whitespace, keeping double- or single-quoted runs together
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}
