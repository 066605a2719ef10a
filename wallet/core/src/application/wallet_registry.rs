// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Wallet Registry
//!
//! Composition root for per-wallet services. The host application owns one
//! registry and passes it (or the [`WalletContext`]s it hands out) down
//! explicitly; there is no process-wide lookup table.
//!
//! All wallets share one key-value store, event bus and bridge transport.
//! Each [`WalletContext`] namespaces its records by wallet id, so ids are
//! validated before a context is built.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::clearance_resolver::ClearanceResolver;
use crate::application::key_management::KeyManagementService;
use crate::application::repository_factory::{create_key_store, create_secret_store};
use crate::application::secure_bridge::SecureBridge;
use crate::application::trust_validator::CredentialTrustValidator;
use crate::application::vault_service::VaultService;
use crate::domain::bridge::BridgeTransport;
use crate::domain::config::{BridgeConfig, TrustConfig, WalletConfigSpec};
use crate::domain::events::WalletObserver;
use crate::domain::repository::{KeyStore, KeyStoreError, KeyValueStore};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::repositories::WalletStorageLayout;

/// Services bound to one wallet id.
pub struct WalletContext {
    pub wallet_id: String,
    pub key_store: Arc<dyn KeyStore>,
    pub keys: KeyManagementService,
    pub resolver: Arc<ClearanceResolver>,
    pub vault: VaultService,
    pub bridge: SecureBridge,
}

pub struct WalletRegistry {
    kv: Arc<dyn KeyValueStore>,
    trust: TrustConfig,
    bridge: BridgeConfig,
    transport: Arc<dyn BridgeTransport>,
    events: EventBus,
    wallets: RwLock<HashMap<String, Arc<WalletContext>>>,
}

impl WalletRegistry {
    pub fn new(
        spec: &WalletConfigSpec,
        kv: Arc<dyn KeyValueStore>,
        transport: Arc<dyn BridgeTransport>,
        events: EventBus,
    ) -> Self {
        Self {
            kv,
            trust: spec.trust.clone(),
            bridge: spec.bridge.clone(),
            transport,
            events,
            wallets: RwLock::new(HashMap::new()),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Context for `wallet_id`, created on first use.
    pub fn open(&self, wallet_id: &str) -> Result<Arc<WalletContext>, KeyStoreError> {
        if let Some(existing) = self.wallets.read().get(wallet_id) {
            return Ok(existing.clone());
        }

        let mut wallets = self.wallets.write();
        if let Some(existing) = wallets.get(wallet_id) {
            return Ok(existing.clone());
        }
        tracing::debug!(wallet_id, "Opening wallet context");
        let context = Arc::new(self.build(wallet_id)?);
        wallets.insert(wallet_id.to_string(), context.clone());
        Ok(context)
    }

    pub fn get(&self, wallet_id: &str) -> Option<Arc<WalletContext>> {
        self.wallets.read().get(wallet_id).cloned()
    }

    /// Drop the context for `wallet_id`. Persisted records are untouched.
    pub fn close(&self, wallet_id: &str) -> bool {
        self.wallets.write().remove(wallet_id).is_some()
    }

    pub fn wallet_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.wallets.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn build(&self, wallet_id: &str) -> Result<WalletContext, KeyStoreError> {
        let layout = WalletStorageLayout::new(wallet_id)?;
        let observer: Arc<dyn WalletObserver> = Arc::new(self.events.clone());
        let key_store = create_key_store(self.kv.clone(), wallet_id)?;
        let secrets = create_secret_store(self.kv.clone(), wallet_id)?;
        let resolver = Arc::new(ClearanceResolver::new(
            key_store.clone(),
            CredentialTrustValidator::from_config(&self.trust),
            observer.clone(),
        ));

        Ok(WalletContext {
            wallet_id: wallet_id.to_string(),
            keys: KeyManagementService::new(key_store.clone()),
            vault: VaultService::new(secrets, key_store.clone()),
            bridge: SecureBridge::new(
                layout,
                self.bridge.clone(),
                self.kv.clone(),
                resolver.clone(),
                self.transport.clone(),
                observer,
            ),
            resolver,
            key_store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bridge_transport::ChannelTransport;
    use crate::infrastructure::repositories::InMemoryKeyValueStore;

    fn registry() -> WalletRegistry {
        let (transport, _) = ChannelTransport::channel();
        WalletRegistry::new(
            &WalletConfigSpec::default(),
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::new(transport),
            EventBus::default(),
        )
    }

    #[tokio::test]
    async fn test_open_returns_same_context() {
        let registry = registry();
        let a = registry.open("alpha").unwrap();
        let again = registry.open("alpha").unwrap();
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(registry.wallet_ids(), vec!["alpha".to_string()]);
    }

    #[tokio::test]
    async fn test_wallets_are_isolated_and_survive_close() {
        let registry = registry();
        let alpha = registry.open("alpha").unwrap();
        alpha.keys.generate_key(None, true).await.unwrap();

        let beta = registry.open("beta").unwrap();
        assert!(beta.keys.list_keys().await.unwrap().is_empty());

        assert!(registry.close("alpha"));
        assert!(registry.get("alpha").is_none());
        let reopened = registry.open("alpha").unwrap();
        assert_eq!(reopened.keys.list_keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nested_wallet_id_cannot_reach_another_wallets_keys() {
        let registry = registry();
        assert!(matches!(
            registry.open("alice/keys/x"),
            Err(KeyStoreError::InvalidWalletId(_))
        ));
        assert!(registry.get("alice/keys/x").is_none());

        let alice = registry.open("alice").unwrap();
        let neighbour = registry.open("alice-keys-x").unwrap();
        let key = neighbour.keys.generate_key(None, true).await.unwrap();

        assert!(alice.keys.list_keys().await.unwrap().is_empty());
        assert!(alice
            .key_store
            .find_by_fingerprint(key.agreement_key.fingerprint.as_str())
            .await
            .unwrap()
            .is_none());
        assert!(alice.key_store.active().await.unwrap().is_none());
    }
}
