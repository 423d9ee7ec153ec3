//! HRFlow CLI - Command-line interface for the HRFlow status workflow
//!
//! Provides commands for:
//! - Listing the configured status catalogs
//! - Checking whether a role set may perform a transition
//! - Listing reachable statuses
//! - Viewing and validating configuration
//! - Replaying update scenarios through the full pipeline

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hrflow_core::config::Config;

mod commands;
mod output;

use commands::{
    check::CheckCommand, config::ConfigCommand, replay::ReplayCommand,
    statuses::StatusesCommand, targets::TargetsCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "hrflow", version, about = "Timesheet and work-schedule status workflow")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the status catalog of each entity kind
    Statuses(StatusesCommand),
    /// Check whether a status transition is permitted
    Check(CheckCommand),
    /// List the statuses reachable from a status
    Targets(TargetsCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Run a scenario file through the update pipeline and print the audit trail
    Replay(ReplayCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if cli.config.is_some() {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        Config::load_or_default(&config_path)
    };

    // Setup tracing
    let level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Statuses(cmd) => cmd.execute(&config, format),
        Commands::Check(cmd) => cmd.execute(&config, format),
        Commands::Targets(cmd) => cmd.execute(&config, format),
        Commands::Config(cmd) => cmd.execute(&config_path, format),
        Commands::Replay(cmd) => cmd.execute(&config, format).await,
    }
}
