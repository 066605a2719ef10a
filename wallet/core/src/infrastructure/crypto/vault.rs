// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Symmetric Vault
//!
//! Seals opaque local secrets and bridge content with XChaCha20-Poly1305.
//!
//! ## Key schedule
//!
//! ```text
//! vault key = HKDF-SHA256(ikm = agreement private key, salt = none, info = "mls-wallet/vault/v1")
//! ```
//!
//! The raw agreement private key is never used as a cipher key directly.
//!
//! ## Invariants
//!
//! - 24-byte nonce drawn from the OS RNG on every `encrypt`; never reused.
//! - The payload's classification label is bound as associated data.
//! - Any failure on `decrypt` returns [`VaultError::DecryptionFailed`] with no
//!   partial plaintext.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use rand_core::{OsRng, RngCore};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

use crate::domain::classification::ClassificationLevel;
use crate::domain::clearance::ClearanceGrant;
use crate::domain::payload::{EncryptedPayload, VaultError};

pub const VAULT_KDF_INFO: &[u8] = b"mls-wallet/vault/v1";
pub const NONCE_LEN: usize = 24;
pub const AGREEMENT_SECRET_LEN: usize = 32;

pub struct SymmetricVault {
    cipher: XChaCha20Poly1305,
    clearance: ClassificationLevel,
}

impl fmt::Debug for SymmetricVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricVault")
            .field("clearance", &self.clearance)
            .finish_non_exhaustive()
    }
}

impl SymmetricVault {
    /// Vault keyed from an agreement private key, limited to `clearance`.
    pub fn from_agreement_secret(
        secret: &[u8],
        clearance: ClassificationLevel,
    ) -> Result<Self, VaultError> {
        if secret.len() != AGREEMENT_SECRET_LEN {
            return Err(VaultError::KeyDerivation(format!(
                "agreement key must be {} bytes, got {}",
                AGREEMENT_SECRET_LEN,
                secret.len()
            )));
        }

        let mut okm = Zeroizing::new([0u8; 32]);
        Hkdf::<Sha256>::new(None, secret)
            .expand(VAULT_KDF_INFO, &mut okm[..])
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

        let cipher = XChaCha20Poly1305::new_from_slice(&okm[..])
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

        Ok(Self { cipher, clearance })
    }

    /// Vault for the key and clearance level carried by a grant.
    pub fn from_grant(grant: &ClearanceGrant) -> Result<Self, VaultError> {
        let secret = grant.key.agreement_secret().ok_or(VaultError::NoAgreementKey)?;
        Self::from_agreement_secret(secret.expose(), grant.level)
    }

    pub fn clearance(&self) -> ClassificationLevel {
        self.clearance
    }

    /// Seal `plaintext` as content classified at `auth_level`.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        auth_level: ClassificationLevel,
    ) -> Result<EncryptedPayload, VaultError> {
        self.require(auth_level)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let aad = associated_data(auth_level);
        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), Payload { msg: plaintext, aad: &aad })
            .map_err(|_| VaultError::EncryptionFailed)?;

        Ok(EncryptedPayload {
            ciphertext,
            nonce: nonce.to_vec(),
            classification: auth_level,
        })
    }

    /// Open `payload` while acting at `auth_level`. The vault's clearance
    /// must dominate `auth_level`, which must dominate the payload's label.
    pub fn decrypt(
        &self,
        payload: &EncryptedPayload,
        auth_level: ClassificationLevel,
    ) -> Result<Vec<u8>, VaultError> {
        self.require(auth_level)?;
        if !auth_level.dominates(payload.classification) {
            return Err(VaultError::InsufficientClearance {
                held: auth_level,
                content: payload.classification,
            });
        }

        if payload.nonce.len() != NONCE_LEN {
            tracing::debug!(nonce_len = payload.nonce.len(), "Rejecting payload with malformed nonce");
            return Err(VaultError::DecryptionFailed);
        }

        let aad = associated_data(payload.classification);
        self.cipher
            .decrypt(
                XNonce::from_slice(&payload.nonce),
                Payload { msg: &payload.ciphertext, aad: &aad },
            )
            .map_err(|_| VaultError::DecryptionFailed)
    }

    fn require(&self, level: ClassificationLevel) -> Result<(), VaultError> {
        if self.clearance.dominates(level) {
            Ok(())
        } else {
            Err(VaultError::InsufficientClearance {
                held: self.clearance,
                content: level,
            })
        }
    }
}

fn associated_data(level: ClassificationLevel) -> Vec<u8> {
    format!("mls-wallet/content/{}", level.as_str()).into_bytes()
}
