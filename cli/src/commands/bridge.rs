// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Secure bridge commands
//!
//! Commands: serve, status
//!
//! `serve` speaks newline-delimited JSON so a host shell (or a test) can play
//! the role of the browser window plumbing. Clearance for every decrypt
//! request is resolved from the credential files passed with `-f`:
//!
//! ```text
//! stdin:  {"origin": "https://reader.example", "message": {"type": "PING", ...}}
//! stdout: {"targetOrigin": "https://reader.example", "message": {"type": "PONG", ...}}
//! ```

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use mls_wallet_core::bridge::{BridgeReadiness, OutboundMessage};
use mls_wallet_core::infrastructure::credential_source::InMemoryCredentialSource;

use crate::context::{load_credentials, CliContext};

#[derive(Subcommand)]
pub enum BridgeCommand {
    /// Run the bridge over NDJSON on stdin/stdout
    Serve {
        /// Credential JSON file the bridge resolves clearance from (repeatable)
        #[arg(short = 'f', long = "credential", value_name = "FILE")]
        credentials: Vec<PathBuf>,
    },

    /// Show whether key material is available to the bridge
    Status,
}

#[derive(Deserialize)]
struct InboundEnvelope {
    origin: String,
    #[serde(default)]
    message: Option<serde_json::Value>,
    /// Remote window closed.
    #[serde(default)]
    closed: bool,
}

pub async fn handle_command(command: BridgeCommand, config_override: Option<PathBuf>) -> Result<()> {
    let ctx = CliContext::open(config_override)?;
    match command {
        BridgeCommand::Serve { credentials } => serve(ctx, &credentials).await,
        BridgeCommand::Status => status(&ctx).await,
    }
}

async fn status(ctx: &CliContext) -> Result<()> {
    let bridge = &ctx.wallet.bridge;
    match bridge.refresh_readiness().await {
        BridgeReadiness::Ready { source } => {
            println!("{}", format!("✓ Bridge ready (key source: {:?})", source).green())
        }
        BridgeReadiness::NotReady => println!("{}", "Bridge not ready: no agreement key available".yellow()),
    }
    println!("  Wallet: {}", bridge.wallet_id());
    println!("  Allowed origins:");
    for origin in &ctx.manifest.spec.bridge.allowed_origins {
        println!("    - {}", origin);
    }
    println!("  Release ceiling: {}", ctx.manifest.spec.bridge.max_level);
    Ok(())
}

async fn serve(mut ctx: CliContext, credential_files: &[PathBuf]) -> Result<()> {
    let wallet = ctx.wallet.clone();
    let bridge = &wallet.bridge;

    let credentials = load_credentials(credential_files)?;
    if credentials.is_empty() {
        tracing::warn!("No credentials given; every decrypt request will be refused");
    }
    let held = credentials.len();
    bridge.attach_credential_source(Arc::new(InMemoryCredentialSource::new(credentials)));

    tracing::info!(
        wallet_id = bridge.wallet_id(),
        origins = ctx.manifest.spec.bridge.allowed_origins.len(),
        credentials = held,
        "Bridge serving on stdin/stdout"
    );
    bridge.refresh_readiness().await;
    flush_outbound(&mut ctx)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let envelope: InboundEnvelope = match serde_json::from_str(&line) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!("Ignoring unparseable envelope: {}", e);
                continue;
            }
        };

        if envelope.closed {
            bridge.close_session(&envelope.origin);
        } else if let Some(message) = envelope.message {
            bridge.handle_message(&envelope.origin, &message).await;
        }

        if !bridge.readiness().is_ready() {
            bridge.refresh_readiness().await;
        }
        flush_outbound(&mut ctx)?;
    }
    Ok(())
}

fn flush_outbound(ctx: &mut CliContext) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    while let Ok(OutboundMessage { target_origin, message }) = ctx.outbound.try_recv() {
        let line = serde_json::json!({ "targetOrigin": target_origin, "message": message });
        writeln!(stdout, "{}", line)?;
    }
    stdout.flush()?;
    Ok(())
}
