// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Vault Service
//!
//! Named, classified secrets persisted next to the wallet's keys. Every
//! operation takes a [`ClearanceGrant`]: the vault is keyed from the grant's
//! agreement key and limited to the grant's level.
//!
//! After each successful seal or open the grant key's usage counter is
//! incremented. This is the only write to stored key material outside key
//! generation.

use chrono::Utc;
use std::sync::Arc;

use crate::domain::classification::ClassificationLevel;
use crate::domain::clearance::ClearanceGrant;
use crate::domain::payload::{SecretMetadata, SecretRecord, VaultError};
use crate::domain::repository::{KeyStore, SecretStore};
use crate::infrastructure::crypto::vault::SymmetricVault;

pub struct VaultService {
    secrets: Arc<dyn SecretStore>,
    keys: Arc<dyn KeyStore>,
}

impl VaultService {
    pub fn new(secrets: Arc<dyn SecretStore>, keys: Arc<dyn KeyStore>) -> Self {
        Self { secrets, keys }
    }

    /// Seal `plaintext` at `level` under `name`, replacing any previous value.
    pub async fn store_secret(
        &self,
        name: &str,
        plaintext: &[u8],
        level: ClassificationLevel,
        grant: &ClearanceGrant,
    ) -> Result<SecretMetadata, VaultError> {
        validate_name(name)?;

        let vault = SymmetricVault::from_grant(grant)?;
        let payload = vault.encrypt(plaintext, level)?;

        let metadata = SecretMetadata {
            label: grant.key.label().to_string(),
            classification: level,
            key_id: grant.key.key_id(),
            created_at: Utc::now(),
        };
        self.secrets
            .save(&SecretRecord {
                name: name.to_string(),
                payload,
                metadata: metadata.clone(),
            })
            .await?;
        self.keys.record_usage(grant.key.key_id()).await?;

        tracing::info!(secret = name, %level, key_id = %metadata.key_id, "Secret sealed");
        Ok(metadata)
    }

    /// Open the secret stored under `name` at the grant's level.
    pub async fn reveal_secret(&self, name: &str, grant: &ClearanceGrant) -> Result<Vec<u8>, VaultError> {
        validate_name(name)?;

        let record = self
            .secrets
            .load(name)
            .await?
            .ok_or_else(|| VaultError::SecretNotFound(name.to_string()))?;

        if record.metadata.key_id != grant.key.key_id() {
            tracing::debug!(
                secret = name,
                sealed_with = %record.metadata.key_id,
                presented = %grant.key.key_id(),
                "Secret was sealed under a different key"
            );
        }

        let vault = SymmetricVault::from_grant(grant)?;
        let plaintext = vault.decrypt(&record.payload, grant.level)?;
        self.keys.record_usage(grant.key.key_id()).await?;

        tracing::info!(secret = name, level = %record.metadata.classification, "Secret opened");
        Ok(plaintext)
    }

    /// Metadata of one secret, readable without a grant.
    pub async fn describe_secret(&self, name: &str) -> Result<SecretMetadata, VaultError> {
        validate_name(name)?;
        self.secrets
            .load(name)
            .await?
            .map(|record| record.metadata)
            .ok_or_else(|| VaultError::SecretNotFound(name.to_string()))
    }

    /// Every stored secret, readable without a grant. Payloads stay sealed.
    pub async fn list_secrets(&self) -> Result<Vec<SecretRecord>, VaultError> {
        let mut records = Vec::new();
        for name in self.secrets.list_names().await? {
            if let Some(record) = self.secrets.load(&name).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub async fn delete_secret(&self, name: &str) -> Result<(), VaultError> {
        validate_name(name)?;
        self.secrets.delete(name).await?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), VaultError> {
    if name.trim().is_empty() || name.contains('/') || name.chars().any(char::is_control) {
        return Err(VaultError::InvalidSecretName(name.to_string()));
    }
    Ok(())
}
