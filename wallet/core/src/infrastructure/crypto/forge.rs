// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Key Pair Forge
//!
//! Creates [`DualKeyMaterial`] from 32 bytes of OS randomness.
//!
//! ```text
//! seed (32 random bytes)
//!   └─ Ed25519 SigningKey::from_bytes(seed)          -> signing keypair
//!        └─ SHA-512(seed)[..32] (to_scalar_bytes)    -> X25519 StaticSecret
//!             └─ X25519 PublicKey::from(secret)      -> agreement keypair
//! ```
//!
//! The agreement key is never generated independently: it is the canonical
//! Ed25519-to-Curve25519 conversion of the signing key, so both public keys
//! name the same identity. [`KeyPairForge::verify_derivation`] re-runs the
//! transform to check imported material.

use chrono::Utc;
use ed25519_dalek::SigningKey;
use rand_core::{OsRng, RngCore};
use x25519_dalek::{PublicKey as AgreementPublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::domain::keys::{
    DualKeyMaterial, KeyHalf, KeyId, KeyPurpose, LegacyKeyMaterial, SecretBytes,
};
use crate::infrastructure::crypto::fingerprint::fingerprint;

pub const SEED_LEN: usize = 32;

const DEFAULT_LABEL: &str = "wallet-key";

#[derive(Debug, Default, Clone, Copy)]
pub struct KeyPairForge;

impl KeyPairForge {
    pub fn new() -> Self {
        Self
    }

    /// Generate fresh dual-key material from OS randomness.
    pub fn generate(&self, label: Option<&str>) -> DualKeyMaterial {
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        OsRng.fill_bytes(&mut seed[..]);
        self.derive_from_seed(&seed, label)
    }

    /// Deterministically derive dual-key material from `seed`.
    pub fn derive_from_seed(&self, seed: &[u8; SEED_LEN], label: Option<&str>) -> DualKeyMaterial {
        let signing = SigningKey::from_bytes(seed);
        let signing_public = signing.verifying_key().to_bytes().to_vec();

        let (agreement_private, agreement_public) = agreement_from_signing(&signing);

        let key = DualKeyMaterial {
            key_id: KeyId::new(),
            signing_key: KeyHalf {
                purpose: KeyPurpose::Signing,
                private_bytes: SecretBytes::new(signing.to_bytes().to_vec()),
                fingerprint: fingerprint(&signing_public),
                public_bytes: signing_public,
            },
            agreement_key: KeyHalf {
                purpose: KeyPurpose::Agreement,
                private_bytes: SecretBytes::new(agreement_private.to_vec()),
                fingerprint: fingerprint(&agreement_public),
                public_bytes: agreement_public,
            },
            label: label.unwrap_or(DEFAULT_LABEL).to_string(),
            created_at: Utc::now(),
            usage_count: 0,
        };

        tracing::debug!(
            key_id = %key.key_id,
            agreement_fingerprint = %key.agreement_key.fingerprint,
            "Forged dual-key material"
        );
        key
    }

    /// Single-purpose key in the legacy format.
    pub fn legacy_from_seed(
        &self,
        seed: &[u8; SEED_LEN],
        purpose: KeyPurpose,
        label: Option<&str>,
    ) -> LegacyKeyMaterial {
        let signing = SigningKey::from_bytes(seed);
        let (private_bytes, public_bytes) = match purpose {
            KeyPurpose::Signing => (
                signing.to_bytes().to_vec(),
                signing.verifying_key().to_bytes().to_vec(),
            ),
            KeyPurpose::Agreement => {
                let (private, public) = agreement_from_signing(&signing);
                (private.to_vec(), public)
            }
        };

        LegacyKeyMaterial {
            key_id: KeyId::new(),
            key: KeyHalf {
                purpose,
                private_bytes: SecretBytes::new(private_bytes),
                fingerprint: fingerprint(&public_bytes),
                public_bytes,
            },
            label: label.unwrap_or(DEFAULT_LABEL).to_string(),
            created_at: Utc::now(),
            usage_count: 0,
        }
    }

    /// `true` iff the agreement half is the canonical conversion of the
    /// signing half and both fingerprints match their public keys.
    pub fn verify_derivation(&self, key: &DualKeyMaterial) -> bool {
        let Ok(seed) = <[u8; SEED_LEN]>::try_from(key.signing_key.private_bytes.expose()) else {
            return false;
        };
        let seed = Zeroizing::new(seed);
        let signing = SigningKey::from_bytes(&seed);
        let (_, agreement_public) = agreement_from_signing(&signing);

        signing.verifying_key().as_bytes().as_slice() == key.signing_key.public_bytes.as_slice()
            && agreement_public == key.agreement_key.public_bytes
            && key.signing_key.fingerprint == fingerprint(&key.signing_key.public_bytes)
            && key.agreement_key.fingerprint == fingerprint(&key.agreement_key.public_bytes)
    }
}

fn agreement_from_signing(signing: &SigningKey) -> (Zeroizing<[u8; 32]>, Vec<u8>) {
    let scalar = Zeroizing::new(signing.to_scalar_bytes());
    let secret = StaticSecret::from(*scalar);
    let public = AgreementPublicKey::from(&secret);
    (Zeroizing::new(secret.to_bytes()), public.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use x25519_dalek::PublicKey;

    #[test]
    fn test_generate_produces_distinct_material() {
        let forge = KeyPairForge::new();
        let a = forge.generate(Some("a"));
        let b = forge.generate(None);
        assert_ne!(a.signing_key.public_bytes, b.signing_key.public_bytes);
        assert_ne!(a.agreement_key.fingerprint, b.agreement_key.fingerprint);
        assert_eq!(a.label, "a");
        assert_eq!(b.label, DEFAULT_LABEL);
        assert_eq!(a.usage_count, 0);
    }

    #[test]
    fn test_fingerprints_round_trip_from_public_bytes() {
        let key = KeyPairForge::new().generate(None);
        assert_eq!(fingerprint(&key.agreement_key.public_bytes), key.agreement_key.fingerprint);
        assert_eq!(fingerprint(&key.signing_key.public_bytes), key.signing_key.fingerprint);
    }

    #[test]
    fn test_derivation_is_deterministic_per_seed() {
        let forge = KeyPairForge::new();
        let seed = [42u8; SEED_LEN];
        let a = forge.derive_from_seed(&seed, None);
        let b = forge.derive_from_seed(&seed, None);
        assert_eq!(a.signing_key.public_bytes, b.signing_key.public_bytes);
        assert_eq!(a.agreement_key.public_bytes, b.agreement_key.public_bytes);
        assert_eq!(a.agreement_key.fingerprint, b.agreement_key.fingerprint);
        assert_ne!(a.key_id, b.key_id);
    }

    #[test]
    fn test_agreement_key_performs_diffie_hellman() {
        let forge = KeyPairForge::new();
        let alice = forge.generate(None);
        let bob = forge.generate(None);

        let alice_secret = StaticSecret::from(
            <[u8; 32]>::try_from(alice.agreement_key.private_bytes.expose()).unwrap(),
        );
        let bob_secret = StaticSecret::from(
            <[u8; 32]>::try_from(bob.agreement_key.private_bytes.expose()).unwrap(),
        );
        let alice_public = PublicKey::from(<[u8; 32]>::try_from(alice.agreement_key.public_bytes.as_slice()).unwrap());
        let bob_public = PublicKey::from(<[u8; 32]>::try_from(bob.agreement_key.public_bytes.as_slice()).unwrap());

        assert_eq!(
            alice_secret.diffie_hellman(&bob_public).as_bytes(),
            bob_secret.diffie_hellman(&alice_public).as_bytes()
        );
    }

    #[test]
    fn test_verify_derivation_detects_independent_agreement_key() {
        let forge = KeyPairForge::new();
        let key = forge.generate(None);
        assert!(forge.verify_derivation(&key));

        let other = forge.generate(None);
        let mut spliced = key.clone();
        spliced.agreement_key = other.agreement_key.clone();
        assert!(!forge.verify_derivation(&spliced));
    }

    #[test]
    fn test_legacy_agreement_key_matches_dual_conversion() {
        let forge = KeyPairForge::new();
        let seed = [7u8; SEED_LEN];
        let dual = forge.derive_from_seed(&seed, None);
        let legacy = forge.legacy_from_seed(&seed, KeyPurpose::Agreement, Some("old"));
        assert_eq!(legacy.key.fingerprint, dual.agreement_key.fingerprint);
        assert_eq!(legacy.key.purpose, KeyPurpose::Agreement);
    }
}
