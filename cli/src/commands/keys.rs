// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Key material commands
//!
//! Commands: generate, list, activate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use mls_wallet_core::keys::{KeyId, LocalKey};

use crate::context::CliContext;

#[derive(Subcommand)]
pub enum KeysCommand {
    /// Generate a new dual signing/agreement key
    Generate {
        /// Human-readable label
        #[arg(short, long)]
        label: Option<String>,

        /// Make the new key the wallet's active key
        #[arg(long)]
        activate: bool,
    },

    /// List stored keys
    List,

    /// Set the wallet's active key
    Activate {
        /// Key id as printed by `keys list`
        key_id: KeyId,
    },
}

pub async fn handle_command(command: KeysCommand, config_override: Option<PathBuf>) -> Result<()> {
    let ctx = CliContext::open(config_override)?;
    match command {
        KeysCommand::Generate { label, activate } => generate(&ctx, label, activate).await,
        KeysCommand::List => list(&ctx).await,
        KeysCommand::Activate { key_id } => activate(&ctx, key_id).await,
    }
}

async fn generate(ctx: &CliContext, label: Option<String>, activate: bool) -> Result<()> {
    let key = ctx
        .wallet
        .keys
        .generate_key(label.as_deref(), activate)
        .await
        .context("Failed to store generated key")?;

    println!("{}", format!("✓ Generated key {}", key.key_id).green());
    println!("  Label: {}", key.label);
    println!("  Agreement fingerprint: {}", key.agreement_key.fingerprint);
    println!("  Signing fingerprint:   {}", key.signing_key.fingerprint);
    Ok(())
}

async fn list(ctx: &CliContext) -> Result<()> {
    let keys = ctx.wallet.keys.list_keys().await.context("Failed to read keys")?;
    let active = ctx.wallet.keys.active_key().await?.map(|k| k.key_id());

    if keys.is_empty() {
        println!("{}", "No keys stored. Run `mlsw keys generate`.".yellow());
        return Ok(());
    }

    println!("{}", format!("Keys for wallet '{}':", ctx.wallet.wallet_id).bold());
    for key in &keys {
        let marker = if Some(key.key_id()) == active { "*".green().bold() } else { " ".normal() };
        let format = match key {
            LocalKey::Dual(_) => "dual",
            LocalKey::Legacy(_) => "legacy",
        };
        println!(
            "{} {} {} ({}, used {}x, created {})",
            marker,
            key.key_id(),
            key.label().bold(),
            format,
            key.usage_count(),
            key.created_at().format("%Y-%m-%d")
        );
        for fingerprint in key.fingerprints() {
            println!("      {}", fingerprint.to_string().dimmed());
        }
    }
    Ok(())
}

async fn activate(ctx: &CliContext, key_id: KeyId) -> Result<()> {
    ctx.wallet
        .keys
        .set_active(key_id)
        .await
        .with_context(|| format!("Failed to activate key {}", key_id))?;
    println!("{}", format!("✓ Active key is now {}", key_id).green());
    Ok(())
}
