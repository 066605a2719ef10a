// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wiring shared by every command: configuration, store, registry.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use mls_wallet_core::application::repository_factory::create_key_value_store;
use mls_wallet_core::application::{WalletContext, WalletRegistry};
use mls_wallet_core::bridge::OutboundMessage;
use mls_wallet_core::config::WalletConfigManifest;
use mls_wallet_core::credential::ClassificationCredential;
use mls_wallet_core::infrastructure::bridge_transport::ChannelTransport;
use mls_wallet_core::infrastructure::event_bus::EventBus;

pub struct CliContext {
    pub manifest: WalletConfigManifest,
    pub registry: WalletRegistry,
    pub wallet: Arc<WalletContext>,
    pub outbound: UnboundedReceiver<OutboundMessage>,
}

impl CliContext {
    pub fn open(config_override: Option<PathBuf>) -> Result<Self> {
        let manifest = WalletConfigManifest::load_or_default(config_override)
            .context("Failed to load configuration")?;
        manifest.validate().context("Configuration validation failed")?;

        let kv = create_key_value_store(&manifest.spec.storage).with_context(|| {
            format!("Failed to open wallet store at {:?}", manifest.spec.storage.path)
        })?;
        let (transport, outbound) = ChannelTransport::channel();
        let registry = WalletRegistry::new(&manifest.spec, kv, Arc::new(transport), EventBus::default());
        let wallet = registry
            .open(&manifest.spec.wallet_id)
            .with_context(|| format!("Failed to open wallet '{}'", manifest.spec.wallet_id))?;

        Ok(Self {
            manifest,
            registry,
            wallet,
            outbound,
        })
    }
}

/// Credentials from JSON files. Each file holds one credential object or an
/// array of them.
pub fn load_credentials(paths: &[PathBuf]) -> Result<Vec<ClassificationCredential>> {
    let mut credentials = Vec::new();
    for path in paths {
        credentials.extend(load_credential_file(path)?);
    }
    Ok(credentials)
}

fn load_credential_file(path: &Path) -> Result<Vec<ClassificationCredential>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credential file {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Credential file {:?} is not valid JSON", path))?;

    Ok(match value {
        serde_json::Value::Array(items) => items.into_iter().map(ClassificationCredential::from_value).collect(),
        other => vec![ClassificationCredential::from_value(other)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_single_and_array_files() {
        let dir = tempfile::tempdir().unwrap();
        let single = dir.path().join("single.json");
        let many = dir.path().join("many.json");
        std::fs::write(&single, r#"{"issuer":"did:web:a"}"#).unwrap();
        std::fs::write(&many, r#"[{"issuer":"did:web:b"},{"issuer":"did:web:c"}]"#).unwrap();

        let credentials = load_credentials(&[single, many]).unwrap();
        assert_eq!(credentials.len(), 3);
        assert_eq!(credentials[2].normalize().issuer.as_deref(), Some("did:web:c"));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(load_credentials(&[bad]).is_err());
    }
}
