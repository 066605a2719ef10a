// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::path::Path;

use crate::domain::repository::{KeyStoreError, KeyValueStore};

/// Durable [`KeyValueStore`] backed by an embedded sled database.
#[derive(Clone)]
pub struct SledKeyValueStore {
    db: sled::Db,
}

impl SledKeyValueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let db = sled::open(path.as_ref()).map_err(backend)?;
        tracing::debug!(path = ?path.as_ref(), "Opened sled key-value store");
        Ok(Self { db })
    }

    /// Store that lives only as long as the process.
    pub fn temporary() -> Result<Self, KeyStoreError> {
        let db = sled::Config::new().temporary(true).open().map_err(backend)?;
        Ok(Self { db })
    }
}

fn backend(e: sled::Error) -> KeyStoreError {
    KeyStoreError::Backend(e.to_string())
}

#[async_trait]
impl KeyValueStore for SledKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyStoreError> {
        Ok(self.db.get(key.as_bytes()).map_err(backend)?.map(|v| v.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KeyStoreError> {
        self.db.insert(key.as_bytes(), value).map_err(backend)?;
        self.db.flush_async().await.map_err(backend)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        self.db.remove(key.as_bytes()).map_err(backend)?;
        self.db.flush_async().await.map_err(backend)?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KeyStoreError> {
        let mut keys = Vec::new();
        for entry in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry.map_err(backend)?;
            let key = String::from_utf8(key.to_vec()).map_err(|e| KeyStoreError::Corrupt {
                key: String::from_utf8_lossy(&key).into_owned(),
                reason: e.to_string(),
            })?;
            keys.push(key);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sled_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledKeyValueStore::open(dir.path()).unwrap();
            store.put("wallet/w/keys/1", b"one".to_vec()).await.unwrap();
            store.put("wallet/w/keys/2", b"two".to_vec()).await.unwrap();
            store.put("wallet/x/keys/3", b"three".to_vec()).await.unwrap();
        }

        let store = SledKeyValueStore::open(dir.path()).unwrap();
        assert_eq!(store.get("wallet/w/keys/1").await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(
            store.keys_with_prefix("wallet/w/keys/").await.unwrap(),
            vec!["wallet/w/keys/1".to_string(), "wallet/w/keys/2".to_string()]
        );

        store.delete("wallet/w/keys/1").await.unwrap();
        assert!(store.get("wallet/w/keys/1").await.unwrap().is_none());
    }
}
