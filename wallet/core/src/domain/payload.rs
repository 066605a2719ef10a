// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Encrypted payloads and locally persisted secrets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::classification::ClassificationLevel;
use crate::domain::encoding::base64_bytes;
use crate::domain::keys::KeyId;

/// AEAD ciphertext plus the nonce it was sealed with.
///
/// The nonce is freshly random for every encryption and never reused. The
/// classification label is authenticated as associated data, so relabeling a
/// payload makes it undecryptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub nonce: Vec<u8>,
    #[serde(default)]
    pub classification: ClassificationLevel,
}

#[derive(Debug, Error)]
pub enum VaultError {
    /// Wrong key, corrupted ciphertext, corrupted nonce or relabeled payload.
    /// Never carries partial plaintext.
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Clearance {held} does not dominate content classified {content}")]
    InsufficientClearance {
        held: ClassificationLevel,
        content: ClassificationLevel,
    },

    #[error("Key material has no agreement key")]
    NoAgreementKey,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Invalid secret name '{0}'")]
    InvalidSecretName(String),

    #[error("Secret store error: {0}")]
    Store(#[from] crate::domain::repository::KeyStoreError),
}

/// Unencrypted bookkeeping stored next to a secret's ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub label: String,
    pub classification: ClassificationLevel,
    pub key_id: KeyId,
    pub created_at: DateTime<Utc>,
}

/// One named secret as persisted in the local key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub name: String,
    pub payload: EncryptedPayload,
    pub metadata: SecretMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_format() {
        let payload = EncryptedPayload {
            ciphertext: vec![1, 2, 3],
            nonce: vec![0; 24],
            classification: ClassificationLevel::Secret,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["ciphertext"], "AQID");
        assert_eq!(json["classification"], "SECRET");
    }

    #[test]
    fn test_payload_without_classification_defaults_to_unclassified() {
        let payload: EncryptedPayload =
            serde_json::from_str(r#"{"ciphertext":"AQID","nonce":"AAAA"}"#).unwrap();
        assert_eq!(payload.classification, ClassificationLevel::Unclassified);
        assert_eq!(payload.nonce, vec![0, 0, 0]);
    }
}
