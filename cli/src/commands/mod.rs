// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the MLS wallet CLI

pub mod bridge;
pub mod clearance;
pub mod config;
pub mod keys;
pub mod vault;

pub use self::bridge::BridgeCommand;
pub use self::clearance::ClearanceCommand;
pub use self::config::ConfigCommand;
pub use self::keys::KeysCommand;
pub use self::vault::VaultCommand;

use colored::Colorize;
use mls_wallet_core::classification::ClassificationLevel;
use mls_wallet_core::clearance::ClearanceError;

/// Print a clearance failure the way the wallet holder should see it.
pub(crate) fn report_clearance_error(err: &ClearanceError) {
    let category = format!("{:?}", err.category()).to_uppercase();
    if err.is_security_event() {
        eprintln!("{} {}", "SECURITY".red().bold(), err.user_message().red());
    } else {
        eprintln!("{} {}", format!("[{}]", category).yellow(), err.user_message());
    }
    eprintln!("  {}", err.to_string().dimmed());
}

/// clap value parser for classification levels. Unlike the lenient domain
/// parse, unknown input is an error here.
pub(crate) fn parse_level(raw: &str) -> Result<ClassificationLevel, String> {
    ClassificationLevel::parse_strict(raw).ok_or_else(|| {
        format!("unknown classification level '{raw}' (expected UNCLASSIFIED, CONFIDENTIAL, SECRET or TOP_SECRET)")
    })
}
