// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete stores from the configured storage backend. Domain code
//! only sees the port traits; this is the one place that picks an adapter.

use std::sync::Arc;

use crate::domain::config::{StorageBackendKind, StorageConfig};
use crate::domain::repository::{KeyStore, KeyStoreError, KeyValueStore, SecretStore};
use crate::infrastructure::repositories::{
    InMemoryKeyValueStore, KvKeyStore, KvSecretStore, SledKeyValueStore, WalletStorageLayout,
};

/// Creates the raw key-value store for the configured backend
pub fn create_key_value_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, KeyStoreError> {
    match config.backend {
        StorageBackendKind::Memory => Ok(Arc::new(InMemoryKeyValueStore::new())),
        StorageBackendKind::Sled => {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| KeyStoreError::Backend(e.to_string()))?;
            }
            Ok(Arc::new(SledKeyValueStore::open(&config.path)?))
        }
    }
}

/// Creates the key store for one wallet over a shared key-value store
pub fn create_key_store(kv: Arc<dyn KeyValueStore>, wallet_id: &str) -> Result<Arc<dyn KeyStore>, KeyStoreError> {
    Ok(Arc::new(KvKeyStore::new(kv, WalletStorageLayout::new(wallet_id)?)))
}

/// Creates the secret store for one wallet over a shared key-value store
pub fn create_secret_store(
    kv: Arc<dyn KeyValueStore>,
    wallet_id: &str,
) -> Result<Arc<dyn SecretStore>, KeyStoreError> {
    Ok(Arc::new(KvSecretStore::new(kv, WalletStorageLayout::new(wallet_id)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sled_backend_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackendKind::Sled,
            path: dir.path().join("nested").join("store"),
        };
        let kv = create_key_value_store(&config).unwrap();
        kv.put("k", b"v".to_vec()).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_stores_share_backend_but_not_namespace() {
        let kv = create_key_value_store(&StorageConfig {
            backend: StorageBackendKind::Memory,
            path: Default::default(),
        })
        .unwrap();
        let a = create_key_store(kv.clone(), "a").unwrap();
        let b = create_key_store(kv.clone(), "b").unwrap();
        assert!(matches!(
            create_key_store(kv, "a/keys/b"),
            Err(KeyStoreError::InvalidWalletId(_))
        ));

        let key = crate::domain::keys::LocalKey::Dual(
            crate::infrastructure::crypto::forge::KeyPairForge::new().generate(None),
        );
        a.save(&key).await.unwrap();
        assert_eq!(a.list().await.unwrap().len(), 1);
        assert!(b.list().await.unwrap().is_empty());
    }
}
