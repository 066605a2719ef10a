// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the persistence ports defined in
//! [`crate::domain::repository`].
//!
//! # Available Implementations
//!
//! ## Raw key-value stores
//! - **InMemoryKeyValueStore** - `BTreeMap` behind a lock, counts every access
//! - **SledKeyValueStore** - durable embedded store used by the CLI
//!
//! ## Typed stores over any `KeyValueStore`
//! - **KvKeyStore** - local key material and the active-key record
//! - **KvSecretStore** - named encrypted secrets
//!
//! # Storage layout
//!
//! ```text
//! wallet/{wallet_id}/keys/{key_id}     LocalKey JSON
//! wallet/{wallet_id}/active-key        LocalKey JSON of the active key (bridge fast path)
//! wallet/{wallet_id}/secrets/{name}    SecretRecord JSON
//! ```

pub mod sled_store;

pub use sled_store::SledKeyValueStore;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::keys::{KeyId, LocalKey};
use crate::domain::payload::SecretRecord;
use crate::domain::repository::{validate_wallet_id, KeyStore, KeyStoreError, KeyValueStore, SecretStore};

/// Key naming for one wallet's records. Only constructed for ids that pass
/// [`validate_wallet_id`], so no wallet's prefix can cover another's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletStorageLayout {
    wallet_id: String,
}

impl WalletStorageLayout {
    pub fn new(wallet_id: impl Into<String>) -> Result<Self, KeyStoreError> {
        let wallet_id = wallet_id.into();
        validate_wallet_id(&wallet_id)?;
        Ok(Self { wallet_id })
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    pub fn keys_prefix(&self) -> String {
        format!("wallet/{}/keys/", self.wallet_id)
    }

    pub fn key_record(&self, id: KeyId) -> String {
        format!("{}{}", self.keys_prefix(), id)
    }

    /// Well-known record the bridge reads on its fast path.
    pub fn active_key(&self) -> String {
        format!("wallet/{}/active-key", self.wallet_id)
    }

    pub fn secrets_prefix(&self) -> String {
        format!("wallet/{}/secrets/", self.wallet_id)
    }

    pub fn secret_record(&self, name: &str) -> String {
        format!("{}{}", self.secrets_prefix(), name)
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, KeyStoreError> {
    serde_json::to_vec(value).map_err(|e| KeyStoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, KeyStoreError> {
    serde_json::from_slice(bytes).map_err(|e| KeyStoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    accesses: Arc<AtomicU64>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations served so far, reads and writes alike.
    pub fn access_count(&self) -> u64 {
        self.accesses.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyStoreError> {
        self.touch();
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KeyStoreError> {
        self.touch();
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        self.touch();
        self.entries.write().remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KeyStoreError> {
        self.touch();
        Ok(self
            .entries
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

/// [`KeyStore`] over any [`KeyValueStore`].
#[derive(Clone)]
pub struct KvKeyStore {
    kv: Arc<dyn KeyValueStore>,
    layout: WalletStorageLayout,
}

impl KvKeyStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, layout: WalletStorageLayout) -> Self {
        Self { kv, layout }
    }

    pub fn layout(&self) -> &WalletStorageLayout {
        &self.layout
    }
}

#[async_trait]
impl KeyStore for KvKeyStore {
    async fn save(&self, key: &LocalKey) -> Result<(), KeyStoreError> {
        let record = self.layout.key_record(key.key_id());
        self.kv.put(&record, encode(&record, key)?).await?;

        // Keep the active record in step with the stored key
        let active_record = self.layout.active_key();
        if let Some(bytes) = self.kv.get(&active_record).await? {
            let active: LocalKey = decode(&active_record, &bytes)?;
            if active.key_id() == key.key_id() {
                self.kv.put(&active_record, encode(&active_record, key)?).await?;
            }
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<LocalKey>, KeyStoreError> {
        let mut keys = Vec::new();
        for record in self.kv.keys_with_prefix(&self.layout.keys_prefix()).await? {
            if let Some(bytes) = self.kv.get(&record).await? {
                keys.push(decode::<LocalKey>(&record, &bytes)?);
            }
        }
        keys.sort_by_key(|k| k.created_at());
        Ok(keys)
    }

    async fn find_by_id(&self, id: KeyId) -> Result<Option<LocalKey>, KeyStoreError> {
        let record = self.layout.key_record(id);
        match self.kv.get(&record).await? {
            Some(bytes) => Ok(Some(decode(&record, &bytes)?)),
            None => Ok(None),
        }
    }

    async fn active(&self) -> Result<Option<LocalKey>, KeyStoreError> {
        let record = self.layout.active_key();
        match self.kv.get(&record).await? {
            Some(bytes) => Ok(Some(decode(&record, &bytes)?)),
            None => Ok(None),
        }
    }

    async fn set_active(&self, id: KeyId) -> Result<(), KeyStoreError> {
        let key = self.find_by_id(id).await?.ok_or(KeyStoreError::NotFound(id))?;
        let record = self.layout.active_key();
        self.kv.put(&record, encode(&record, &key)?).await
    }

    async fn record_usage(&self, id: KeyId) -> Result<(), KeyStoreError> {
        let mut key = self.find_by_id(id).await?.ok_or(KeyStoreError::NotFound(id))?;
        key.increment_usage();
        self.save(&key).await
    }
}

/// [`SecretStore`] over any [`KeyValueStore`].
#[derive(Clone)]
pub struct KvSecretStore {
    kv: Arc<dyn KeyValueStore>,
    layout: WalletStorageLayout,
}

impl KvSecretStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, layout: WalletStorageLayout) -> Self {
        Self { kv, layout }
    }
}

#[async_trait]
impl SecretStore for KvSecretStore {
    async fn save(&self, record: &SecretRecord) -> Result<(), KeyStoreError> {
        let key = self.layout.secret_record(&record.name);
        self.kv.put(&key, encode(&key, record)?).await
    }

    async fn load(&self, name: &str) -> Result<Option<SecretRecord>, KeyStoreError> {
        let key = self.layout.secret_record(name);
        match self.kv.get(&key).await? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    async fn list_names(&self) -> Result<Vec<String>, KeyStoreError> {
        let prefix = self.layout.secrets_prefix();
        Ok(self
            .kv
            .keys_with_prefix(&prefix)
            .await?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<(), KeyStoreError> {
        self.kv.delete(&self.layout.secret_record(name)).await
    }
}
