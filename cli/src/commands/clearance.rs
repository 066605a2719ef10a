// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Clearance commands
//!
//! Commands: resolve, inspect

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use mls_wallet_core::application::CredentialTrustValidator;
use mls_wallet_core::classification::ClassificationLevel;
use mls_wallet_core::config::WalletConfigManifest;

use super::{parse_level, report_clearance_error};
use crate::context::{load_credentials, CliContext};

#[derive(Subcommand)]
pub enum ClearanceCommand {
    /// Resolve a clearance grant for a required level
    Resolve {
        /// Credential JSON file (repeatable)
        #[arg(short = 'f', long = "credential", value_name = "FILE", required = true)]
        credentials: Vec<PathBuf>,

        /// Required classification level
        #[arg(short, long, value_parser = parse_level, default_value = "UNCLASSIFIED")]
        level: ClassificationLevel,
    },

    /// Show how credentials normalize and whether they are trusted
    Inspect {
        /// Credential JSON file (repeatable)
        #[arg(value_name = "FILE", required = true)]
        credentials: Vec<PathBuf>,
    },
}

pub async fn handle_command(command: ClearanceCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ClearanceCommand::Resolve { credentials, level } => resolve(config_override, credentials, level).await,
        ClearanceCommand::Inspect { credentials } => inspect(config_override, credentials),
    }
}

async fn resolve(config_override: Option<PathBuf>, files: Vec<PathBuf>, required: ClassificationLevel) -> Result<()> {
    let ctx = CliContext::open(config_override)?;
    let credentials = load_credentials(&files)?;

    match ctx.wallet.resolver.resolve(&credentials, required).await {
        Ok(grant) => {
            println!("{}", format!("✓ Clearance granted for {}", required).green());
            println!("  Held level: {}", grant.level.to_string().bold());
            println!("  Key: {} ({})", grant.key.key_id(), grant.key.label());
            println!(
                "  Accessible: {}",
                grant
                    .level
                    .accessible_levels()
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Ok(())
        }
        Err(e) => {
            report_clearance_error(&e);
            anyhow::bail!("Clearance denied")
        }
    }
}

fn inspect(config_override: Option<PathBuf>, files: Vec<PathBuf>) -> Result<()> {
    let manifest = WalletConfigManifest::load_or_default(config_override)?;
    let validator = CredentialTrustValidator::from_config(&manifest.spec.trust);

    for (index, credential) in load_credentials(&files)?.iter().enumerate() {
        let canonical = credential.normalize();
        println!(
            "{}",
            format!("Credential #{} {}", index + 1, credential.id().unwrap_or("")).bold()
        );
        println!("  Shape: {:?}", canonical.shape);
        println!("  Issuer: {}", canonical.issuer.as_deref().unwrap_or("(none)"));
        println!("  Schema: {}", canonical.schema_ref.as_deref().unwrap_or("(none)"));
        println!(
            "  Clearance: {}",
            canonical
                .clearance_level()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
        for (purpose, claim) in [
            ("agreement", &canonical.fingerprints.agreement),
            ("signing", &canonical.fingerprints.signing),
            ("legacy", &canonical.fingerprints.legacy),
        ] {
            if let Some(fp) = claim {
                println!("  {} fingerprint: {}", purpose, fp);
            }
        }
        match validator.validate(credential) {
            Ok(_) => println!("  {}", "✓ Trusted".green()),
            Err(e) => println!("  {} {}", "✗ Not trusted:".red(), e),
        }
        println!();
    }
    Ok(())
}
