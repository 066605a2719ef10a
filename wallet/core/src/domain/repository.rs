// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Persistence and Collaborator Ports
//!
//! Contracts for everything the wallet core consumes from outside. Interfaces
//! live here; implementations live in [`crate::infrastructure`].
//!
//! | Trait | Purpose | Implementations |
//! |-------|---------|-----------------|
//! | `KeyValueStore` | raw byte persistence surface | `InMemoryKeyValueStore`, `SledKeyValueStore` |
//! | `KeyStore` | typed local key material + active key pointer | `KvKeyStore` |
//! | `SecretStore` | named encrypted secrets | `KvSecretStore` |
//! | `IdentityAgent` | fallback agreement-key source for the bridge | `InMemoryIdentityAgent` |
//! | `CredentialSource` | credentials the bridge resolves clearance from | `InMemoryCredentialSource` |
//!
//! Resolution and bridge logic only read from these stores. Keys are written
//! by the key-generation flow; `record_usage` is called by the vault service.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::credential::ClassificationCredential;
use crate::domain::keys::{KeyId, LocalKey, SecretBytes};
use crate::domain::payload::SecretRecord;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Corrupt record at '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Key {0} not found")]
    NotFound(KeyId),

    #[error("Invalid wallet id '{0}': must be non-empty without '/' or control characters")]
    InvalidWalletId(String),
}

/// Wallet ids become one segment of every persisted record key, so a
/// separator inside an id would let one wallet's prefix cover another's.
pub fn validate_wallet_id(wallet_id: &str) -> Result<(), KeyStoreError> {
    if wallet_id.trim().is_empty() || wallet_id.contains('/') || wallet_id.chars().any(char::is_control) {
        return Err(KeyStoreError::InvalidWalletId(wallet_id.to_string()));
    }
    Ok(())
}

/// Byte-oriented key-value persistence supplied by the host application.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyStoreError>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KeyStoreError>;

    async fn delete(&self, key: &str) -> Result<(), KeyStoreError>;

    /// All keys starting with `prefix`, in lexicographic order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KeyStoreError>;
}

/// Locally stored key material for one wallet.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Save key material (create or update).
    async fn save(&self, key: &LocalKey) -> Result<(), KeyStoreError>;

    /// All keys, legacy and dual, oldest first.
    async fn list(&self) -> Result<Vec<LocalKey>, KeyStoreError>;

    async fn find_by_id(&self, id: KeyId) -> Result<Option<LocalKey>, KeyStoreError>;

    /// Key addressable by `fingerprint` (any purpose), if one is stored.
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<LocalKey>, KeyStoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|key| key.has_fingerprint(fingerprint)))
    }

    /// Key the wallet currently presents as its identity.
    async fn active(&self) -> Result<Option<LocalKey>, KeyStoreError>;

    async fn set_active(&self, id: KeyId) -> Result<(), KeyStoreError>;

    /// Increment the usage counter of a stored key.
    async fn record_usage(&self, id: KeyId) -> Result<(), KeyStoreError>;
}

/// Named encrypted secrets for one wallet.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn save(&self, record: &SecretRecord) -> Result<(), KeyStoreError>;

    async fn load(&self, name: &str) -> Result<Option<SecretRecord>, KeyStoreError>;

    async fn list_names(&self) -> Result<Vec<String>, KeyStoreError>;

    async fn delete(&self, name: &str) -> Result<(), KeyStoreError>;
}

/// External identity agent that owns DID resolution and a durable key store.
/// The bridge only uses it as a fallback source of agreement keys.
#[async_trait]
pub trait IdentityAgent: Send + Sync {
    /// Long-form decentralized identifiers known to the agent.
    async fn list_long_form_dids(&self) -> anyhow::Result<Vec<String>>;

    /// Agreement private key for `did`, or `None` if the agent holds none.
    async fn agreement_key(&self, did: &str) -> anyhow::Result<Option<SecretBytes>>;
}

/// Credentials currently held by the wallet, supplied by the host application.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn held_credentials(&self) -> anyhow::Result<Vec<ClassificationCredential>>;
}
