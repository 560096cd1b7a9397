//! pvpn CLI - Command-line interface for pvpn
//!
//! Provides `pvpn list`, `pvpn add`, `pvpn connect` and an interactive
//! `pvpn shell` that keeps one supervisor alive across commands.

mod commands;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use pvpn_core::{Supervisor, SupervisorConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pvpn")]
#[command(about = "pvpn - WireGuard profile manager")]
#[command(version)]
struct Cli {
    /// Data directory holding profiles.json and config.toml (defaults to ~/.pvpn)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Helper executable (defaults to wg-quick)
    #[arg(long, global = true, value_name = "PROGRAM")]
    helper: Option<String>,

    /// Helper timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List profiles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a profile
    Add {
        /// Display name
        name: String,
        /// WireGuard configuration file passed to the helper
        config_path: String,
    },
    /// Delete a profile
    Delete {
        /// Profile name or ID
        profile: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Bring a profile's tunnel up
    Connect {
        /// Profile name or ID
        profile: String,
    },
    /// Take a profile's tunnel down
    Disconnect {
        /// Profile name or ID
        profile: String,
    },
    /// Show the status of every profile
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the event log
    Logs {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session keeping connection state between commands
    Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<SupervisorConfig> {
    let mut config =
        SupervisorConfig::load(cli.data_dir.clone()).context("Failed to load configuration")?;
    if let Some(helper) = &cli.helper {
        config.helper.clone_from(helper);
        config.helper_args.clear();
    }
    if let Some(ms) = cli.timeout_ms {
        config.connect_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        helper = %config.helper,
        timeout_ms = config.connect_timeout.as_millis(),
        "configuration loaded"
    );
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;
    let supervisor = Supervisor::open(&config);

    match cli.command {
        Commands::List { json } => commands::profile::list(&supervisor, json),
        Commands::Add { name, config_path } => {
            commands::profile::add(&supervisor, &name, &config_path)
        }
        Commands::Delete { profile, force } => {
            commands::profile::delete(&supervisor, &profile, force)
        }
        Commands::Connect { profile } => commands::tunnel::connect(&supervisor, &profile).await,
        Commands::Disconnect { profile } => {
            commands::tunnel::disconnect(&supervisor, &profile).await
        }
        Commands::Status { json } => commands::tunnel::status(&supervisor, json),
        Commands::Logs { json } => commands::logs::show(&supervisor, json),
        Commands::Shell => commands::shell::run(supervisor).await,
    }
}
