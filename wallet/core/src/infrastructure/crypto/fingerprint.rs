// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The one fingerprint formatter. Forge and verifier must agree byte for byte,
//! so nothing else in the crate formats fingerprints.

use sha2::{Digest, Sha256};

use crate::domain::keys::{Fingerprint, LocalKey};

/// SHA-256 over the raw public key bytes, as uppercase colon-separated hex
/// pairs (`"9F:86:D0:..."`).
pub fn fingerprint(public_bytes: &[u8]) -> Fingerprint {
    let digest = Sha256::digest(public_bytes);
    let formatted = digest
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":");
    Fingerprint::from_formatted(formatted)
}

/// Exact equality between any of `stored`'s fingerprints and `claimed`.
pub fn fingerprint_matches(stored: &LocalKey, claimed: &str) -> bool {
    stored.has_fingerprint(claimed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(b"test");
        // sha256("test") = 9f86d081...
        assert!(fp.as_str().starts_with("9F:86:D0:81"));
        assert_eq!(fp.as_str().len(), 32 * 3 - 1);
        assert!(fp.as_str().split(':').all(|pair| pair.len() == 2));
        assert_eq!(fp.as_str(), fp.as_str().to_uppercase());
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(fingerprint(&[1, 2, 3]), fingerprint(&[1, 2, 3]));
        assert_ne!(fingerprint(&[1, 2, 3]), fingerprint(&[1, 2, 4]));
    }
}
