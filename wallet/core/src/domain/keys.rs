// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Local Key Material
//!
//! Value objects for the keys a wallet holds locally. Two formats coexist:
//!
//! - [`DualKeyMaterial`]: an Ed25519 signing keypair plus an X25519 agreement
//!   keypair, both derived from one 32-byte seed (see
//!   [`crate::infrastructure::crypto::forge`]).
//! - [`LegacyKeyMaterial`]: a single keypair with a single purpose, issued by
//!   older wallet versions.
//!
//! ## Invariants
//!
//! - Key material is immutable after creation except `usage_count`.
//! - Private bytes are wiped on drop and never appear in `Debug` output.
//! - Fingerprints are produced by exactly one formatter
//!   ([`crate::infrastructure::crypto::fingerprint`]); this module only compares them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::domain::encoding::base64_bytes;

/// Stable identifier of a locally stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub Uuid);

impl KeyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KeyId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPurpose {
    Signing,
    Agreement,
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPurpose::Signing => f.write_str("signing"),
            KeyPurpose::Agreement => f.write_str("agreement"),
        }
    }
}

/// Uppercase, colon-separated SHA-256 fingerprint of a public key
/// (`"3A:F0:..."`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already formatted fingerprint. Only the fingerprint formatter
    /// should call this with freshly computed values.
    pub fn from_formatted(formatted: String) -> Self {
        Self(formatted)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, constant-time comparison against a claimed fingerprint string.
    pub fn matches(&self, claimed: &str) -> bool {
        self.0.as_bytes().ct_eq(claimed.as_bytes()).into()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Private key bytes, zeroized on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretBytes(#[serde(with = "base64_bytes")] Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}

/// One keypair plus its fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyHalf {
    pub purpose: KeyPurpose,
    pub private_bytes: SecretBytes,
    #[serde(with = "base64_bytes")]
    pub public_bytes: Vec<u8>,
    pub fingerprint: Fingerprint,
}

/// Signing + agreement keypairs derived from a single seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualKeyMaterial {
    pub key_id: KeyId,
    pub signing_key: KeyHalf,
    pub agreement_key: KeyHalf,
    pub label: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub usage_count: u64,
}

/// Single-purpose key issued by older wallet versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyKeyMaterial {
    pub key_id: KeyId,
    pub key: KeyHalf,
    pub label: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub usage_count: u64,
}

/// Any key the wallet holds locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum LocalKey {
    Dual(DualKeyMaterial),
    Legacy(LegacyKeyMaterial),
}

impl LocalKey {
    pub fn key_id(&self) -> KeyId {
        match self {
            LocalKey::Dual(k) => k.key_id,
            LocalKey::Legacy(k) => k.key_id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LocalKey::Dual(k) => &k.label,
            LocalKey::Legacy(k) => &k.label,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            LocalKey::Dual(k) => k.created_at,
            LocalKey::Legacy(k) => k.created_at,
        }
    }

    pub fn usage_count(&self) -> u64 {
        match self {
            LocalKey::Dual(k) => k.usage_count,
            LocalKey::Legacy(k) => k.usage_count,
        }
    }

    pub fn increment_usage(&mut self) {
        match self {
            LocalKey::Dual(k) => k.usage_count = k.usage_count.saturating_add(1),
            LocalKey::Legacy(k) => k.usage_count = k.usage_count.saturating_add(1),
        }
    }

    /// Every fingerprint this key can be addressed by.
    pub fn fingerprints(&self) -> Vec<&Fingerprint> {
        match self {
            LocalKey::Dual(k) => vec![&k.agreement_key.fingerprint, &k.signing_key.fingerprint],
            LocalKey::Legacy(k) => vec![&k.key.fingerprint],
        }
    }

    pub fn has_fingerprint(&self, claimed: &str) -> bool {
        self.fingerprints().iter().any(|fp| fp.matches(claimed))
    }

    /// Agreement private key, if this key carries one.
    pub fn agreement_secret(&self) -> Option<&SecretBytes> {
        match self {
            LocalKey::Dual(k) => Some(&k.agreement_key.private_bytes),
            LocalKey::Legacy(k) if k.key.purpose == KeyPurpose::Agreement => Some(&k.key.private_bytes),
            LocalKey::Legacy(_) => None,
        }
    }

    pub fn as_dual(&self) -> Option<&DualKeyMaterial> {
        match self {
            LocalKey::Dual(k) => Some(k),
            LocalKey::Legacy(_) => None,
        }
    }
}

impl From<DualKeyMaterial> for LocalKey {
    fn from(key: DualKeyMaterial) -> Self {
        LocalKey::Dual(key)
    }
}

impl From<LegacyKeyMaterial> for LocalKey {
    fn from(key: LegacyKeyMaterial) -> Self {
        LocalKey::Legacy(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half(purpose: KeyPurpose, fp: &str) -> KeyHalf {
        KeyHalf {
            purpose,
            private_bytes: SecretBytes::new(vec![7u8; 32]),
            public_bytes: vec![9u8; 32],
            fingerprint: Fingerprint::from_formatted(fp.to_string()),
        }
    }

    #[test]
    fn test_fingerprint_matching_is_exact() {
        let fp = Fingerprint::from_formatted("AB:CD:EF".to_string());
        assert!(fp.matches("AB:CD:EF"));
        assert!(!fp.matches("ab:cd:ef"));
        assert!(!fp.matches("AB:CD:E0"));
        assert!(!fp.matches("AB:CD"));
    }

    #[test]
    fn test_key_id_parses_from_display() {
        let id = KeyId::new();
        assert_eq!(id.to_string().parse::<KeyId>().unwrap(), id);
        assert!("not-a-uuid".parse::<KeyId>().is_err());
    }

    #[test]
    fn test_secret_bytes_debug_is_redacted() {
        let secret = SecretBytes::new(vec![0x41; 4]);
        let rendered = format!("{:?}", secret);
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("65"));
    }

    #[test]
    fn test_legacy_signing_key_has_no_agreement_secret() {
        let key = LocalKey::Legacy(LegacyKeyMaterial {
            key_id: KeyId::new(),
            key: half(KeyPurpose::Signing, "AA"),
            label: "old".to_string(),
            created_at: Utc::now(),
            usage_count: 0,
        });
        assert!(key.agreement_secret().is_none());
        assert!(key.has_fingerprint("AA"));
    }

    #[test]
    fn test_local_key_json_roundtrip_keeps_format_tag() {
        let mut key = LocalKey::Dual(DualKeyMaterial {
            key_id: KeyId::new(),
            signing_key: half(KeyPurpose::Signing, "01"),
            agreement_key: half(KeyPurpose::Agreement, "02"),
            label: "primary".to_string(),
            created_at: Utc::now(),
            usage_count: 0,
        });
        key.increment_usage();

        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["format"], "dual");
        assert_eq!(json["usage_count"], 1);

        let parsed: LocalKey = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.agreement_secret().unwrap().expose(), &[7u8; 32]);
    }
}
