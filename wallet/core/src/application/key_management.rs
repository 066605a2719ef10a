// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Key-generation flow: the only writer of key material.

use std::sync::Arc;

use crate::domain::keys::{DualKeyMaterial, KeyId, LocalKey};
use crate::domain::repository::{KeyStore, KeyStoreError};
use crate::infrastructure::crypto::forge::KeyPairForge;

pub struct KeyManagementService {
    keys: Arc<dyn KeyStore>,
    forge: KeyPairForge,
}

impl KeyManagementService {
    pub fn new(keys: Arc<dyn KeyStore>) -> Self {
        Self {
            keys,
            forge: KeyPairForge::new(),
        }
    }

    /// Generate and store fresh dual-key material. The first key a wallet
    /// holds becomes its active key automatically.
    pub async fn generate_key(&self, label: Option<&str>, make_active: bool) -> Result<DualKeyMaterial, KeyStoreError> {
        let key = self.forge.generate(label);
        self.keys.save(&LocalKey::Dual(key.clone())).await?;

        if make_active || self.keys.active().await?.is_none() {
            self.keys.set_active(key.key_id).await?;
        }

        tracing::info!(
            key_id = %key.key_id,
            label = %key.label,
            agreement_fingerprint = %key.agreement_key.fingerprint,
            "Generated wallet key"
        );
        Ok(key)
    }

    /// Store key material created elsewhere, such as a legacy export.
    pub async fn import_key(&self, key: LocalKey) -> Result<KeyId, KeyStoreError> {
        if let LocalKey::Dual(dual) = &key {
            if !self.forge.verify_derivation(dual) {
                return Err(KeyStoreError::Corrupt {
                    key: dual.key_id.to_string(),
                    reason: "agreement key is not derived from signing key".to_string(),
                });
            }
        }
        let id = key.key_id();
        self.keys.save(&key).await?;
        Ok(id)
    }

    pub async fn list_keys(&self) -> Result<Vec<LocalKey>, KeyStoreError> {
        self.keys.list().await
    }

    pub async fn active_key(&self) -> Result<Option<LocalKey>, KeyStoreError> {
        self.keys.active().await
    }

    pub async fn set_active(&self, id: KeyId) -> Result<(), KeyStoreError> {
        self.keys.set_active(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repository_factory::create_key_store;
    use crate::infrastructure::repositories::InMemoryKeyValueStore;

    fn service() -> KeyManagementService {
        KeyManagementService::new(create_key_store(Arc::new(InMemoryKeyValueStore::new()), "w").unwrap())
    }

    #[tokio::test]
    async fn test_first_key_becomes_active() {
        let service = service();
        let first = service.generate_key(Some("first"), false).await.unwrap();
        let second = service.generate_key(Some("second"), false).await.unwrap();

        assert_eq!(service.active_key().await.unwrap().unwrap().key_id(), first.key_id);
        assert_eq!(service.list_keys().await.unwrap().len(), 2);

        service.set_active(second.key_id).await.unwrap();
        assert_eq!(service.active_key().await.unwrap().unwrap().key_id(), second.key_id);
    }

    #[tokio::test]
    async fn test_import_rejects_spliced_dual_key() {
        let service = service();
        let forge = KeyPairForge::new();
        let mut spliced = forge.generate(None);
        spliced.agreement_key = forge.generate(None).agreement_key;

        assert!(matches!(
            service.import_key(LocalKey::Dual(spliced)).await,
            Err(KeyStoreError::Corrupt { .. })
        ));
        assert!(service.list_keys().await.unwrap().is_empty());
    }
}
