// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Classified secret commands
//!
//! Commands: seal, open, list, delete

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::io::{Read, Write};
use std::path::PathBuf;

use mls_wallet_core::classification::ClassificationLevel;
use mls_wallet_core::clearance::ClearanceGrant;

use super::{parse_level, report_clearance_error};
use crate::context::{load_credentials, CliContext};

#[derive(Subcommand)]
pub enum VaultCommand {
    /// Encrypt and store a secret
    Seal {
        /// Secret name
        name: String,

        /// Classification of the secret
        #[arg(short, long, value_parser = parse_level)]
        level: ClassificationLevel,

        /// Credential JSON file proving clearance (repeatable)
        #[arg(short = 'f', long = "credential", value_name = "FILE", required = true)]
        credentials: Vec<PathBuf>,

        /// Secret value (default: read stdin)
        #[arg(long, conflicts_with = "input")]
        value: Option<String>,

        /// Read the secret from a file
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Decrypt a stored secret
    Open {
        /// Secret name
        name: String,

        /// Credential JSON file proving clearance (repeatable)
        #[arg(short = 'f', long = "credential", value_name = "FILE", required = true)]
        credentials: Vec<PathBuf>,

        /// Write plaintext to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List stored secrets
    List,

    /// Delete a stored secret
    Delete {
        /// Secret name
        name: String,
    },
}

pub async fn handle_command(command: VaultCommand, config_override: Option<PathBuf>) -> Result<()> {
    let ctx = CliContext::open(config_override)?;
    match command {
        VaultCommand::Seal {
            name,
            level,
            credentials,
            value,
            input,
        } => seal(&ctx, &name, level, &credentials, value, input).await,
        VaultCommand::Open {
            name,
            credentials,
            output,
        } => open(&ctx, &name, &credentials, output).await,
        VaultCommand::List => list(&ctx).await,
        VaultCommand::Delete { name } => {
            ctx.wallet.vault.delete_secret(&name).await?;
            println!("{}", format!("✓ Deleted secret '{}'", name).green());
            Ok(())
        }
    }
}

async fn grant_for(ctx: &CliContext, files: &[PathBuf], required: ClassificationLevel) -> Result<ClearanceGrant> {
    let credentials = load_credentials(files)?;
    match ctx.wallet.resolver.resolve(&credentials, required).await {
        Ok(grant) => Ok(grant),
        Err(e) => {
            report_clearance_error(&e);
            anyhow::bail!("Clearance denied")
        }
    }
}

async fn seal(
    ctx: &CliContext,
    name: &str,
    level: ClassificationLevel,
    files: &[PathBuf],
    value: Option<String>,
    input: Option<PathBuf>,
) -> Result<()> {
    let plaintext = match (value, input) {
        (Some(value), _) => value.into_bytes(),
        (None, Some(path)) => std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?,
        (None, None) => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };

    let grant = grant_for(ctx, files, level).await?;
    let metadata = ctx
        .wallet
        .vault
        .store_secret(name, &plaintext, level, &grant)
        .await
        .with_context(|| format!("Failed to seal secret '{}'", name))?;

    println!(
        "{}",
        format!("✓ Sealed '{}' at {} with key {}", name, metadata.classification, metadata.key_id).green()
    );
    Ok(())
}

async fn open(ctx: &CliContext, name: &str, files: &[PathBuf], output: Option<PathBuf>) -> Result<()> {
    let metadata = ctx.wallet.vault.describe_secret(name).await?;
    let grant = grant_for(ctx, files, metadata.classification).await?;
    let plaintext = ctx
        .wallet
        .vault
        .reveal_secret(name, &grant)
        .await
        .with_context(|| format!("Failed to open secret '{}'", name))?;

    match output {
        Some(path) => {
            std::fs::write(&path, &plaintext).with_context(|| format!("Failed to write {:?}", path))?;
            println!("{}", format!("✓ Wrote '{}' to {}", name, path.display()).green());
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn list(ctx: &CliContext) -> Result<()> {
    let records = ctx.wallet.vault.list_secrets().await?;
    if records.is_empty() {
        println!("{}", "No secrets stored.".yellow());
        return Ok(());
    }

    for record in records {
        println!(
            "{:<24} {:<13} key {} ({}) {}",
            record.name.bold(),
            record.metadata.classification.to_string(),
            record.metadata.key_id,
            record.metadata.label,
            record.metadata.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }
    Ok(())
}
