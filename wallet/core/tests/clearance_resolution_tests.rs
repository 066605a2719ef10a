// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end clearance resolution against a key store.
//!
//! Covers the resolution scenarios:
//! - A: trusted SECRET credential bound to a present key grants CONFIDENTIAL
//! - B: one-character fingerprint difference is a binding failure, not a missing key,
//!   while a credential issued for a key on another device is a missing key
//! - C: untrusted issuer is rejected regardless of claim content
//! plus determinism, legacy single-key credentials and wrapped credentials.

use chrono::{TimeZone, Utc};
use mls_wallet_core::application::{ClearanceResolver, CredentialTrustValidator, KeyManagementService};
use mls_wallet_core::classification::ClassificationLevel;
use mls_wallet_core::clearance::{BindingError, ClearanceError, ErrorCategory};
use mls_wallet_core::config::{KNOWN_CLEARANCE_SCHEMA, TRUSTED_ISSUER_DID};
use mls_wallet_core::credential::ClassificationCredential;
use mls_wallet_core::events::{NoopObserver, WalletEvent};
use mls_wallet_core::infrastructure::crypto::KeyPairForge;
use mls_wallet_core::infrastructure::event_bus::EventBus;
use mls_wallet_core::infrastructure::repositories::{InMemoryKeyValueStore, KvKeyStore, WalletStorageLayout};
use mls_wallet_core::keys::{KeyPurpose, LocalKey};
use mls_wallet_core::repository::KeyStore;
use serde_json::json;
use std::sync::Arc;

fn key_store() -> Arc<KvKeyStore> {
    Arc::new(KvKeyStore::new(
        Arc::new(InMemoryKeyValueStore::new()),
        WalletStorageLayout::new("wallet-under-test").unwrap(),
    ))
}

fn resolver(store: Arc<KvKeyStore>) -> ClearanceResolver {
    ClearanceResolver::new(store, CredentialTrustValidator::default(), Arc::new(NoopObserver))
}

fn clearance_credential(issuer: &str, level: &str, agreement_fp: &str) -> ClassificationCredential {
    ClassificationCredential::from_value(json!({
        "id": "urn:uuid:clearance-1",
        "type": ["VerifiableCredential", "ClassificationCredential"],
        "issuer": { "id": issuer },
        "credentialSchema": { "id": KNOWN_CLEARANCE_SCHEMA, "type": "JsonSchema" },
        "validUntil": "2099-12-31T23:59:59Z",
        "credentialSubject": {
            "id": "did:example:holder",
            "clearanceLevel": level,
            "agreementKeyFingerprint": agreement_fp
        }
    }))
}

fn alter_one_char(fingerprint: &str) -> String {
    let mut chars: Vec<char> = fingerprint.chars().collect();
    let last = chars.len() - 1;
    chars[last] = if chars[last] == '0' { '1' } else { '0' };
    chars.into_iter().collect()
}

#[tokio::test]
async fn scenario_a_secret_credential_grants_confidential() {
    let store = key_store();
    let key = KeyManagementService::new(store.clone())
        .generate_key(Some("primary"), true)
        .await
        .unwrap();
    let credential = clearance_credential(TRUSTED_ISSUER_DID, "SECRET", key.agreement_key.fingerprint.as_str());

    let grant = resolver(store)
        .resolve(&[credential.clone()], ClassificationLevel::Confidential)
        .await
        .unwrap();

    assert_eq!(grant.level, ClassificationLevel::Secret);
    assert_eq!(grant.key.key_id(), key.key_id);
    assert_eq!(grant.credential, credential);
}

#[tokio::test]
async fn scenario_b_one_character_difference_is_binding_failure() {
    let store = key_store();
    let key = KeyManagementService::new(store.clone())
        .generate_key(None, true)
        .await
        .unwrap();
    let altered = alter_one_char(key.agreement_key.fingerprint.as_str());
    assert_ne!(altered, key.agreement_key.fingerprint.as_str());

    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let resolver = ClearanceResolver::new(store, CredentialTrustValidator::default(), Arc::new(bus));

    let err = resolver
        .resolve(
            &[clearance_credential(TRUSTED_ISSUER_DID, "SECRET", &altered)],
            ClassificationLevel::Confidential,
        )
        .await
        .unwrap_err();

    match &err {
        ClearanceError::BindingFailed(BindingError::FingerprintMismatch { purpose, claimed, local }) => {
            assert_eq!(*purpose, KeyPurpose::Agreement);
            assert_eq!(claimed, &altered);
            assert_eq!(local, key.agreement_key.fingerprint.as_str());
        }
        other => panic!("expected BindingFailed, got {:?}", other),
    }
    assert!(err.is_security_event());
    assert_eq!(err.category(), ErrorCategory::Binding);

    let mut saw_mismatch = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, WalletEvent::KeyBindingMismatch { .. }) {
            saw_mismatch = true;
        }
    }
    assert!(saw_mismatch);
}

#[tokio::test]
async fn credential_for_key_on_another_device_is_key_not_found() {
    let store = key_store();
    KeyManagementService::new(store.clone())
        .generate_key(Some("this device"), true)
        .await
        .unwrap();
    let other_device = KeyPairForge::new().generate(Some("other device"));
    let claimed = other_device.agreement_key.fingerprint.to_string();

    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let resolver = ClearanceResolver::new(store, CredentialTrustValidator::default(), Arc::new(bus));

    let err = resolver
        .resolve(
            &[clearance_credential(TRUSTED_ISSUER_DID, "SECRET", &claimed)],
            ClassificationLevel::Confidential,
        )
        .await
        .unwrap_err();

    match &err {
        ClearanceError::KeyNotFound { fingerprint } => assert_eq!(fingerprint, &claimed),
        other => panic!("expected KeyNotFound, got {:?}", other),
    }
    assert!(!err.is_security_event());
    assert!(!err.user_message().contains("tampered"));
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, WalletEvent::KeyBindingMismatch { .. }),
            "foreign key reported as binding mismatch"
        );
    }
}

#[tokio::test]
async fn scenario_c_untrusted_issuer_is_rejected_regardless_of_claims() {
    let store = key_store();
    let key = KeyManagementService::new(store.clone())
        .generate_key(None, true)
        .await
        .unwrap();
    let fp = key.agreement_key.fingerprint.to_string();
    let resolver = resolver(store);

    for level in ["UNCLASSIFIED", "SECRET", "TOP_SECRET"] {
        let err = resolver
            .resolve(
                &[clearance_credential("did:web:clearance.100monkeys.ai.attacker", level, &fp)],
                ClassificationLevel::Unclassified,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClearanceError::NoTrustedCredential));
        assert_eq!(err.category(), ErrorCategory::Trust);
    }
}

#[tokio::test]
async fn resolve_is_deterministic() {
    let store = key_store();
    let key = KeyManagementService::new(store.clone())
        .generate_key(None, true)
        .await
        .unwrap();
    let resolver = resolver(store.clone());
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();

    let credentials = vec![clearance_credential(
        TRUSTED_ISSUER_DID,
        "top-secret",
        key.agreement_key.fingerprint.as_str(),
    )];
    let first = resolver
        .resolve_at(&credentials, ClassificationLevel::Secret, now)
        .await
        .unwrap();
    let second = resolver
        .resolve_at(&credentials, ClassificationLevel::Secret, now)
        .await
        .unwrap();
    assert_eq!(first.level, second.level);
    assert_eq!(first.key, second.key);

    let low = vec![clearance_credential(
        TRUSTED_ISSUER_DID,
        "confidential",
        key.agreement_key.fingerprint.as_str(),
    )];
    for _ in 0..2 {
        match resolver.resolve_at(&low, ClassificationLevel::TopSecret, now).await {
            Err(ClearanceError::InsufficientClearance { held, required }) => {
                assert_eq!(held, ClassificationLevel::Confidential);
                assert_eq!(required, ClassificationLevel::TopSecret);
            }
            other => panic!("expected InsufficientClearance, got {:?}", other),
        }
    }

    // Resolution never mutates the store
    assert_eq!(store.find_by_id(key.key_id).await.unwrap().unwrap().usage_count(), 0);
}

#[tokio::test]
async fn legacy_single_key_credential_binds_legacy_key() {
    let store = key_store();
    let legacy = KeyPairForge::new().legacy_from_seed(&[11u8; 32], KeyPurpose::Agreement, Some("2019 key"));
    let fp = legacy.key.fingerprint.to_string();
    store.save(&LocalKey::Legacy(legacy.clone())).await.unwrap();

    let credential = ClassificationCredential::from_value(json!({
        "issuer": TRUSTED_ISSUER_DID,
        "schemaId": "clearance-v1",
        "claims": [{ "classification": "Confidential", "keyFingerprint": fp }]
    }));

    let grant = resolver(store)
        .resolve(&[credential], ClassificationLevel::Confidential)
        .await
        .unwrap();
    assert_eq!(grant.level, ClassificationLevel::Confidential);
    assert_eq!(grant.key.key_id(), legacy.key_id);
    assert!(grant.key.agreement_secret().is_some());
}

#[tokio::test]
async fn wrapped_envelope_credential_resolves() {
    let store = key_store();
    let key = KeyManagementService::new(store.clone())
        .generate_key(None, true)
        .await
        .unwrap();

    let credential = ClassificationCredential::from_value(json!({
        "iss": TRUSTED_ISSUER_DID,
        "vc": {
            "type": ["VerifiableCredential", "SecurityClearanceCredential"],
            "credentialSchema": [{ "id": "https://schemas.100monkeys.ai/clearance/v3.json" }],
            "credentialSubject": {
                "classificationLevel": "top_secret",
                "agreementKeyFingerprint": key.agreement_key.fingerprint.as_str(),
                "signingKeyFingerprint": key.signing_key.fingerprint.as_str()
            }
        }
    }));

    let grant = resolver(store)
        .resolve(&[credential], ClassificationLevel::TopSecret)
        .await
        .unwrap();
    assert_eq!(grant.level, ClassificationLevel::TopSecret);
}

#[tokio::test]
async fn expired_credential_is_not_trusted() {
    let store = key_store();
    let key = KeyManagementService::new(store.clone())
        .generate_key(None, true)
        .await
        .unwrap();

    let mut raw = clearance_credential(TRUSTED_ISSUER_DID, "SECRET", key.agreement_key.fingerprint.as_str())
        .raw()
        .clone();
    raw["validUntil"] = json!("2020-01-01T00:00:00Z");

    let err = resolver(store)
        .resolve(&[ClassificationCredential::from_value(raw)], ClassificationLevel::Unclassified)
        .await
        .unwrap_err();
    assert!(matches!(err, ClearanceError::NoTrustedCredential));
}
