// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # MLS Wallet CLI
//!
//! The `mlsw` binary drives a local wallet: key material, clearance checks
//! against credential files, classified secrets, and the secure bridge.
//!
//! ## Commands
//!
//! - `mlsw keys generate|list|activate` - Local key material
//! - `mlsw clearance resolve` - Resolve a clearance grant from credential files
//! - `mlsw vault seal|open|list|delete` - Classified secrets
//! - `mlsw bridge serve` - Run the bridge over NDJSON on stdin/stdout
//! - `mlsw config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod context;

use commands::{BridgeCommand, ClearanceCommand, ConfigCommand, KeysCommand, VaultCommand};

/// MLS Wallet - clearance-bound keys and classified content
#[derive(Parser)]
#[command(name = "mlsw")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "MLS_WALLET_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "MLS_WALLET_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Local key material
    #[command(name = "keys")]
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },

    /// Clearance resolution
    #[command(name = "clearance")]
    Clearance {
        #[command(subcommand)]
        command: ClearanceCommand,
    },

    /// Classified secrets
    #[command(name = "vault")]
    Vault {
        #[command(subcommand)]
        command: VaultCommand,
    },

    /// Secure bridge
    #[command(name = "bridge")]
    Bridge {
        #[command(subcommand)]
        command: BridgeCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Keys { command }) => commands::keys::handle_command(command, cli.config).await,
        Some(Commands::Clearance { command }) => {
            commands::clearance::handle_command(command, cli.config).await
        }
        Some(Commands::Vault { command }) => commands::vault::handle_command(command, cli.config).await,
        Some(Commands::Bridge { command }) => commands::bridge::handle_command(command, cli.config).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging. Logs go to stderr so that
/// `bridge serve` can own stdout.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
