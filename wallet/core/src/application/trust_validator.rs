// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Credential Trust Validator
//!
//! Decides whether a credential is a legitimate classification credential.
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. **Issuer pinning** - the canonical issuer must equal the single trusted
//!    issuer DID exactly. No issuer list, no revocation check.
//! 2. **Schema presence** - some schema reference must be present. A schema
//!    that differs from the last-known version is reported as drift and
//!    accepted; trust is anchored to the issuer, not the schema.
//! 3. **Claim presence** - a classification claim must exist in the
//!    normalized credential.
//! 4. **Expiry** - a `validUntil` in the past rejects the credential.
//!
//! The validator only reads the [`CanonicalCredential`]; shape probing lives
//! in [`ClassificationCredential::normalize`].

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::clearance::TrustError;
use crate::domain::config::{TrustConfig, KNOWN_CLEARANCE_SCHEMA, TRUSTED_ISSUER_DID};
use crate::domain::credential::{CanonicalCredential, ClassificationCredential, CredentialShape};
use crate::domain::events::{NoopObserver, WalletEvent, WalletObserver};

#[derive(Clone)]
pub struct CredentialTrustValidator {
    trusted_issuer: String,
    known_schema: String,
    observer: Arc<dyn WalletObserver>,
}

impl CredentialTrustValidator {
    pub fn new(trusted_issuer: impl Into<String>, known_schema: impl Into<String>) -> Self {
        Self {
            trusted_issuer: trusted_issuer.into(),
            known_schema: known_schema.into(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn from_config(config: &TrustConfig) -> Self {
        Self::new(config.trusted_issuer.clone(), config.known_schema.clone())
    }

    pub fn with_observer(mut self, observer: Arc<dyn WalletObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn trusted_issuer(&self) -> &str {
        &self.trusted_issuer
    }

    /// Validate against the current time.
    pub fn validate(&self, credential: &ClassificationCredential) -> Result<CanonicalCredential, TrustError> {
        self.validate_at(credential, Utc::now())
    }

    /// Validate with `now` as the reference instant for expiry. Returns the
    /// canonical form so callers do not normalize twice.
    pub fn validate_at(
        &self,
        credential: &ClassificationCredential,
        now: DateTime<Utc>,
    ) -> Result<CanonicalCredential, TrustError> {
        self.validate_normalized_at(credential, credential.normalize(), now)
    }

    /// Same as [`Self::validate_at`] for a credential the caller already normalized.
    pub fn validate_normalized_at(
        &self,
        credential: &ClassificationCredential,
        canonical: CanonicalCredential,
        now: DateTime<Utc>,
    ) -> Result<CanonicalCredential, TrustError> {
        match self.check(credential, &canonical, now) {
            Ok(()) => Ok(canonical),
            Err(e) => {
                tracing::warn!(
                    credential_id = credential.id().unwrap_or("<none>"),
                    shape = ?canonical.shape,
                    "Credential rejected: {}",
                    e
                );
                self.observer.on_event(WalletEvent::CredentialRejected {
                    credential_id: credential.id().map(str::to_string),
                    shape: canonical.shape,
                    reason: e.to_string(),
                    rejected_at: Utc::now(),
                });
                Err(e)
            }
        }
    }

    fn check(
        &self,
        credential: &ClassificationCredential,
        canonical: &CanonicalCredential,
        now: DateTime<Utc>,
    ) -> Result<(), TrustError> {
        if canonical.shape == CredentialShape::Unknown {
            tracing::debug!(
                credential_id = credential.id().unwrap_or("<none>"),
                "Credential matches no known shape"
            );
        }

        match canonical.issuer.as_deref() {
            Some(issuer) if issuer == self.trusted_issuer => {}
            other => {
                return Err(TrustError::UntrustedIssuer {
                    found: other.unwrap_or("<none>").to_string(),
                })
            }
        }

        let schema = canonical.schema_ref.as_deref().ok_or(TrustError::MissingSchema)?;
        if schema != self.known_schema {
            tracing::warn!(
                expected = %self.known_schema,
                found = %schema,
                "Credential schema differs from last-known version; accepting"
            );
            self.observer.on_event(WalletEvent::SchemaDrift {
                credential_id: credential.id().map(str::to_string),
                expected: self.known_schema.clone(),
                found: schema.to_string(),
                observed_at: Utc::now(),
            });
        }

        if canonical.clearance_claim.is_none() {
            return Err(TrustError::MissingClassificationClaim);
        }

        if let Some(valid_until) = canonical.valid_until {
            if valid_until <= now {
                return Err(TrustError::Expired {
                    valid_until: valid_until.to_rfc3339(),
                });
            }
        }

        Ok(())
    }
}

impl Default for CredentialTrustValidator {
    fn default() -> Self {
        Self::new(TRUSTED_ISSUER_DID, KNOWN_CLEARANCE_SCHEMA)
    }
}
