// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Key Binding Verifier
//!
//! Compares the fingerprints a credential literally carries against a local
//! key. Nothing is derived or recomputed from the credential.
//!
//! | Local key | Required claim | Optional claim |
//! |-----------|----------------|----------------|
//! | dual | agreement (or legacy single claim) vs agreement fingerprint | signing vs signing fingerprint |
//! | legacy | the single bound claim vs the key's fingerprint | - |
//!
//! A mismatch is logged at `error` and published as
//! [`WalletEvent::KeyBindingMismatch`]; it is never downgraded to a warning.

use chrono::Utc;
use std::sync::Arc;

use crate::domain::clearance::BindingError;
use crate::domain::credential::FingerprintClaims;
use crate::domain::events::{NoopObserver, WalletEvent, WalletObserver};
use crate::domain::keys::{Fingerprint, KeyId, KeyPurpose, LocalKey};

#[derive(Clone)]
pub struct KeyBindingVerifier {
    observer: Arc<dyn WalletObserver>,
}

impl KeyBindingVerifier {
    pub fn new(observer: Arc<dyn WalletObserver>) -> Self {
        Self { observer }
    }

    pub fn verify(&self, key: &LocalKey, claims: &FingerprintClaims) -> Result<(), BindingError> {
        match key {
            LocalKey::Dual(dual) => {
                let claimed = claims
                    .agreement
                    .as_deref()
                    .or(claims.legacy.as_deref())
                    .ok_or(BindingError::MissingFingerprintClaim {
                        purpose: KeyPurpose::Agreement,
                    })?;
                self.compare(dual.key_id, KeyPurpose::Agreement, &dual.agreement_key.fingerprint, claimed)?;

                if let Some(signing) = claims.signing.as_deref() {
                    self.compare(dual.key_id, KeyPurpose::Signing, &dual.signing_key.fingerprint, signing)?;
                }
                Ok(())
            }
            LocalKey::Legacy(legacy) => {
                let claimed = claims.bound().ok_or(BindingError::MissingFingerprintClaim {
                    purpose: legacy.key.purpose,
                })?;
                self.compare(legacy.key_id, legacy.key.purpose, &legacy.key.fingerprint, claimed)
            }
        }
    }

    fn compare(
        &self,
        key_id: KeyId,
        purpose: KeyPurpose,
        local: &Fingerprint,
        claimed: &str,
    ) -> Result<(), BindingError> {
        if local.matches(claimed) {
            return Ok(());
        }

        tracing::error!(
            %key_id,
            %purpose,
            claimed,
            local = %local,
            "SECURITY: credential fingerprint does not match local key"
        );
        self.observer.on_event(WalletEvent::KeyBindingMismatch {
            key_id,
            purpose,
            claimed: claimed.to_string(),
            local: local.to_string(),
            detected_at: Utc::now(),
        });

        Err(BindingError::FingerprintMismatch {
            purpose,
            claimed: claimed.to_string(),
            local: local.to_string(),
        })
    }
}

impl Default for KeyBindingVerifier {
    fn default() -> Self {
        Self::new(Arc::new(NoopObserver))
    }
}
