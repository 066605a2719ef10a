// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use mls_wallet_core::config::WalletConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./mls-wallet.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(output, examples),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. MLS_WALLET_CONFIG_PATH: {}",
            std::env::var("MLS_WALLET_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./mls-wallet.yaml");
        println!("  4. ~/.mls-wallet/config.yaml");
        println!("  5. /etc/mls-wallet/config.yaml");
        match WalletConfigManifest::discover_config() {
            Some(found) => println!("  Discovered: {}", found.display().to_string().green()),
            None => println!("  Discovered: {}", "(none, using defaults)".yellow()),
        }
        println!();
    }

    let config = WalletConfigManifest::load_or_default(config_override).context("Failed to load configuration")?;
    let spec = &config.spec;

    println!("{}", format!("Configuration '{}':", config.metadata.name).bold());
    println!("  Wallet: {}", spec.wallet_id);
    println!();

    println!("{}", "Trust:".bold());
    println!("  Issuer: {}", spec.trust.trusted_issuer);
    println!("  Schema: {}", spec.trust.known_schema);
    println!();

    println!("{}", "Bridge:".bold());
    println!("  Self origin: {}", spec.bridge.self_origin);
    println!(
        "  Opener origin: {}",
        spec.bridge.opener_origin.as_deref().unwrap_or("(none)")
    );
    println!("  Release ceiling: {}", spec.bridge.max_level);
    if spec.bridge.allowed_origins.is_empty() {
        println!("  Allowed origins: {}", "(none, all requests ignored)".yellow());
    } else {
        println!("  Allowed origins:");
        for origin in &spec.bridge.allowed_origins {
            println!("    - {}", origin);
        }
    }
    println!();

    println!("{}", "Storage:".bold());
    println!("  Backend: {:?}", spec.storage.backend);
    println!("  Path: {}", spec.storage.path.display());

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = WalletConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());
    Ok(())
}

fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    if with_examples {
        std::fs::write(&output, include_str!("../../templates/wallet-config-with-examples.yaml"))
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    } else {
        WalletConfigManifest::default()
            .to_yaml_file(&output)
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    }

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_template_is_valid() {
        let config = WalletConfigManifest::from_yaml_str(include_str!(
            "../../templates/wallet-config-with-examples.yaml"
        ))
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.spec.bridge.allowed_origins.len(), 2);
    }

    #[test]
    fn test_generate_minimal_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mls-wallet.yaml");
        generate(path.clone(), false).unwrap();
        let loaded = WalletConfigManifest::from_yaml_file(&path).unwrap();
        loaded.validate().unwrap();
    }
}
