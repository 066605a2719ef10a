// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Clearance Resolver
//!
//! Turns a set of held credentials into a [`ClearanceGrant`] for a required
//! classification level.
//!
//! ## Resolution
//!
//! ```text
//! credentials
//!   │ 1. skip those without classification markers, then keep the first
//!   │    that passes CredentialTrustValidator
//!   │ 2. none left                          -> NoTrustedCredential
//!   │ 3. held level does not dominate       -> InsufficientClearance {held, required}
//!   │ 4. no fingerprint claim               -> MissingKeyFingerprintClaim
//!   │ 5. no stored key for the claim        -> KeyNotFound
//!   │ 6. KeyBindingVerifier fails           -> BindingFailed
//!   ▼
//! ClearanceGrant {credential, key, level}
//! ```
//!
//! Step 5 looks for an exact fingerprint match across all stored keys. A
//! stored fingerprint within [`NEAR_MISS_MAX_DIFF`] characters of a claim is
//! also handed to the verifier, so an altered claim surfaces as a binding
//! failure. A claim for a key held on another device is `KeyNotFound`.
//!
//! The resolver never writes to the key store and never caches grants.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::application::binding_verifier::KeyBindingVerifier;
use crate::application::trust_validator::CredentialTrustValidator;
use crate::domain::classification::ClassificationLevel;
use crate::domain::clearance::{ClearanceError, ClearanceGrant};
use crate::domain::credential::{CanonicalCredential, ClassificationCredential, FingerprintClaims};
use crate::domain::events::{WalletEvent, WalletObserver};
use crate::domain::keys::LocalKey;
use crate::domain::repository::KeyStore;

/// Most differing characters at which a stored fingerprint still counts as a
/// tampered copy of a claim rather than a different key.
pub const NEAR_MISS_MAX_DIFF: usize = 2;

pub struct ClearanceResolver {
    key_store: Arc<dyn KeyStore>,
    validator: CredentialTrustValidator,
    verifier: KeyBindingVerifier,
    observer: Arc<dyn WalletObserver>,
}

impl ClearanceResolver {
    pub fn new(
        key_store: Arc<dyn KeyStore>,
        validator: CredentialTrustValidator,
        observer: Arc<dyn WalletObserver>,
    ) -> Self {
        Self {
            key_store,
            validator: validator.with_observer(observer.clone()),
            verifier: KeyBindingVerifier::new(observer.clone()),
            observer,
        }
    }

    pub async fn resolve(
        &self,
        credentials: &[ClassificationCredential],
        required: ClassificationLevel,
    ) -> Result<ClearanceGrant, ClearanceError> {
        self.resolve_at(credentials, required, Utc::now()).await
    }

    /// Resolve with `now` as the reference instant for credential expiry.
    pub async fn resolve_at(
        &self,
        credentials: &[ClassificationCredential],
        required: ClassificationLevel,
        now: DateTime<Utc>,
    ) -> Result<ClearanceGrant, ClearanceError> {
        match self.resolve_inner(credentials, required, now).await {
            Ok(grant) => {
                tracing::info!(
                    key_id = %grant.key.key_id(),
                    level = %grant.level,
                    %required,
                    "Clearance resolved"
                );
                self.observer.on_event(WalletEvent::ClearanceResolved {
                    key_id: grant.key.key_id(),
                    level: grant.level,
                    required,
                    resolved_at: Utc::now(),
                });
                Ok(grant)
            }
            Err(e) => {
                let held = match &e {
                    ClearanceError::InsufficientClearance { held, .. } => Some(*held),
                    _ => None,
                };
                if !e.is_security_event() {
                    tracing::warn!(category = ?e.category(), %required, "Clearance denied: {}", e);
                }
                self.observer.on_event(WalletEvent::ClearanceDenied {
                    reason: e.to_string(),
                    held,
                    required,
                    denied_at: Utc::now(),
                });
                Err(e)
            }
        }
    }

    async fn resolve_inner(
        &self,
        credentials: &[ClassificationCredential],
        required: ClassificationLevel,
        now: DateTime<Utc>,
    ) -> Result<ClearanceGrant, ClearanceError> {
        // 1-2. First trusted classification credential
        let (credential, canonical) = self
            .first_trusted(credentials, now)
            .ok_or(ClearanceError::NoTrustedCredential)?;

        // 3. Clearance level
        let held = canonical
            .clearance_level()
            .ok_or(ClearanceError::NoTrustedCredential)?;
        if !held.dominates(required) {
            return Err(ClearanceError::InsufficientClearance { held, required });
        }

        // 4. Bound-key claim
        let claims = &canonical.fingerprints;
        if claims.is_empty() {
            return Err(ClearanceError::MissingKeyFingerprintClaim);
        }

        // 5. Local key
        let key = self.locate_key(claims).await?;

        // 6. Binding
        self.verifier
            .verify(&key, claims)
            .map_err(ClearanceError::BindingFailed)?;

        Ok(ClearanceGrant {
            credential: credential.clone(),
            key,
            level: held,
        })
    }

    fn first_trusted<'a>(
        &self,
        credentials: &'a [ClassificationCredential],
        now: DateTime<Utc>,
    ) -> Option<(&'a ClassificationCredential, CanonicalCredential)> {
        credentials.iter().find_map(|credential| {
            let canonical = credential.normalize();
            if !canonical.looks_like_classification_credential() {
                tracing::debug!(
                    credential_id = credential.id().unwrap_or("<none>"),
                    "Credential carries no classification markers; skipping"
                );
                return None;
            }
            let canonical = self.validator.validate_normalized_at(credential, canonical, now).ok()?;
            Some((credential, canonical))
        })
    }

    async fn locate_key(&self, claims: &FingerprintClaims) -> Result<LocalKey, ClearanceError> {
        for claimed in claims.all() {
            if let Some(key) = self.key_store.find_by_fingerprint(claimed).await? {
                return Ok(key);
            }
        }

        let near_miss = self.key_store.list().await?.into_iter().find(|key| {
            key.fingerprints()
                .iter()
                .any(|fp| claims.all().any(|claimed| is_near_miss(fp.as_str(), claimed)))
        });
        if let Some(key) = near_miss {
            tracing::debug!(
                key_id = %key.key_id(),
                "Claimed fingerprint nearly matches a stored key; verifying binding"
            );
            return Ok(key);
        }

        Err(ClearanceError::KeyNotFound {
            fingerprint: claims.bound().unwrap_or_default().to_string(),
        })
    }
}

/// Same length and between one and [`NEAR_MISS_MAX_DIFF`] differing characters.
fn is_near_miss(stored: &str, claimed: &str) -> bool {
    if stored.len() != claimed.len() {
        return false;
    }
    let diff = stored.bytes().zip(claimed.bytes()).filter(|(a, b)| a != b).count();
    (1..=NEAR_MISS_MAX_DIFF).contains(&diff)
}
