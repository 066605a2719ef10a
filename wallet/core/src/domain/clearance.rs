// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Clearance Grant and Error Taxonomy
//!
//! A [`ClearanceGrant`] is the output of
//! [`crate::application::clearance_resolver::ClearanceResolver::resolve`]: a
//! trusted credential, the local key it is bound to, and the clearance level it
//! confers. Grants live only for the call that produced them and are never
//! cached, because the backing credential may be revoked between calls.
//!
//! ## Error categories
//!
//! | Category | Errors | Handling |
//! |----------|--------|----------|
//! | Trust | [`TrustError`] | not retried; "not a legitimate classification credential" |
//! | Clearance | [`ClearanceError::InsufficientClearance`] | not retried; show held vs. required |
//! | Binding | missing claim, key not found, [`BindingError::FingerprintMismatch`] | not retried; mismatch is a security event |
//! | Crypto | [`crate::domain::payload::VaultError`] | fails closed, safe to retry |
//! | Environment | [`crate::domain::repository::KeyStoreError`] | propagated as fatal |

use serde::Serialize;
use thiserror::Error;

use crate::domain::classification::ClassificationLevel;
use crate::domain::credential::ClassificationCredential;
use crate::domain::keys::{KeyPurpose, LocalKey};
use crate::domain::repository::KeyStoreError;

/// Short-lived proof that the principal currently holds a trusted,
/// sufficiently classified, key-bound credential.
#[derive(Debug, Clone)]
pub struct ClearanceGrant {
    pub credential: ClassificationCredential,
    pub key: LocalKey,
    pub level: ClassificationLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Trust,
    Clearance,
    Binding,
    Crypto,
    Environment,
}

/// Credential is not a legitimate classification credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    #[error("Credential issuer '{found}' is not the trusted issuer")]
    UntrustedIssuer { found: String },

    #[error("Credential does not reference a schema")]
    MissingSchema,

    #[error("Credential does not carry a classification claim")]
    MissingClassificationClaim,

    #[error("Credential expired at {valid_until}")]
    Expired { valid_until: String },
}

/// Local key does not match the key the credential was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("Credential carries no {purpose} key fingerprint claim")]
    MissingFingerprintClaim { purpose: KeyPurpose },

    #[error("{purpose} key fingerprint mismatch: credential claims {claimed}, local key is {local}")]
    FingerprintMismatch {
        purpose: KeyPurpose,
        claimed: String,
        local: String,
    },
}

/// Failure of a clearance resolution.
#[derive(Debug, Error)]
pub enum ClearanceError {
    #[error("No trusted classification credential found")]
    NoTrustedCredential,

    #[error("Insufficient clearance: hold {held}, need {required}")]
    InsufficientClearance {
        held: ClassificationLevel,
        required: ClassificationLevel,
    },

    #[error("Credential does not name the key it is bound to")]
    MissingKeyFingerprintClaim,

    #[error("No local key matches credential fingerprint {fingerprint}")]
    KeyNotFound { fingerprint: String },

    #[error("Key binding failed: {0}")]
    BindingFailed(#[source] BindingError),

    #[error("Key store unavailable: {0}")]
    KeyStore(#[from] KeyStoreError),
}

impl ClearanceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClearanceError::NoTrustedCredential => ErrorCategory::Trust,
            ClearanceError::InsufficientClearance { .. } => ErrorCategory::Clearance,
            ClearanceError::MissingKeyFingerprintClaim
            | ClearanceError::KeyNotFound { .. }
            | ClearanceError::BindingFailed(_) => ErrorCategory::Binding,
            ClearanceError::KeyStore(_) => ErrorCategory::Environment,
        }
    }

    /// `true` when the failure suggests tampering or credential confusion
    /// rather than low clearance.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            ClearanceError::BindingFailed(BindingError::FingerprintMismatch { .. })
        )
    }

    /// Text suitable for showing to the wallet holder.
    pub fn user_message(&self) -> String {
        match self {
            ClearanceError::NoTrustedCredential => {
                "This is not a legitimate classification credential.".to_string()
            }
            ClearanceError::InsufficientClearance { held, required } => {
                format!("You have {} clearance, but {} is required.", held, required)
            }
            ClearanceError::MissingKeyFingerprintClaim => {
                "Your clearance credential is not bound to a key. Request a re-issue.".to_string()
            }
            ClearanceError::KeyNotFound { .. } => {
                "The key your clearance credential was issued for is not stored on this device.".to_string()
            }
            ClearanceError::BindingFailed(_) => {
                "Your clearance credential does not match the key on this device. It may have been tampered with.".to_string()
            }
            ClearanceError::KeyStore(_) => "Local key storage is unavailable.".to_string(),
        }
    }
}
