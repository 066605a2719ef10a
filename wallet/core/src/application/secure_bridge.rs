// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Secure Bridge
//!
//! Cross-window decrypt-on-behalf-of service. A companion window posts
//! `PING` and `DECRYPT_REQUEST` messages; the bridge answers through an
//! injected [`BridgeTransport`] without any network hop.
//!
//! ## Inbound pipeline
//!
//! ```text
//! (origin, message)
//!   ├─ origin == self_origin         -> ignored
//!   ├─ origin not in allow-list      -> dropped silently (no reply, no key lookup)
//!   ├─ not a BridgeMessage           -> dropped silently
//!   ├─ PING                          -> session Acknowledged, PONG immediately
//!   └─ DECRYPT_REQUEST               -> Received -> KeyResolving -> Decrypting -> Responded
//!                                       DECRYPT_RESPONSE | DECRYPT_ERROR {code}
//! ```
//!
//! ## Key resolution (per request)
//!
//! 1. **Fast path:** the wallet's active-key record in the key-value store.
//! 2. **Fallback:** only when an identity agent has been attached, each
//!    long-form DID the agent knows is asked for an agreement key until one
//!    is returned.
//!
//! ## Clearance (per request)
//!
//! Content above `max_level` is refused outright. Otherwise the credentials
//! from the attached [`CredentialSource`] are resolved through the
//! [`ClearanceResolver`] at the payload's classification; no source means no
//! credentials, and every request is refused with `CLEARANCE_EXCEEDED`.
//! Grants are resolved per request and never kept.
//!
//! ## Readiness
//!
//! The bridge starts `NotReady`. [`SecureBridge::refresh_readiness`] probes
//! both key sources and performs the `NotReady -> Ready` transition at most
//! once, sending `WALLET_READY` to the opener on that transition only.
//! Construction and [`SecureBridge::attach_identity_agent`] never signal.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::clearance_resolver::ClearanceResolver;
use crate::domain::bridge::{
    BridgeErrorCode, BridgeMessage, BridgeReadiness, BridgeSession, BridgeTransport, KeySourceKind,
    RequestPhase,
};
use crate::domain::classification::ClassificationLevel;
use crate::domain::clearance::ClearanceError;
use crate::domain::config::BridgeConfig;
use crate::domain::credential::ClassificationCredential;
use crate::domain::events::{WalletEvent, WalletObserver};
use crate::domain::keys::{LocalKey, SecretBytes};
use crate::domain::payload::{EncryptedPayload, VaultError};
use crate::domain::repository::{CredentialSource, IdentityAgent, KeyValueStore};
use crate::infrastructure::crypto::vault::{SymmetricVault, AGREEMENT_SECRET_LEN};
use crate::infrastructure::repositories::WalletStorageLayout;

pub struct SecureBridge {
    wallet_id: String,
    config: BridgeConfig,
    kv: Arc<dyn KeyValueStore>,
    layout: WalletStorageLayout,
    resolver: Arc<ClearanceResolver>,
    transport: Arc<dyn BridgeTransport>,
    observer: Arc<dyn WalletObserver>,
    identity_agent: RwLock<Option<Arc<dyn IdentityAgent>>>,
    credentials: RwLock<Option<Arc<dyn CredentialSource>>>,
    readiness: Mutex<BridgeReadiness>,
    sessions: Mutex<HashMap<String, BridgeSession>>,
}

impl SecureBridge {
    pub fn new(
        layout: WalletStorageLayout,
        config: BridgeConfig,
        kv: Arc<dyn KeyValueStore>,
        resolver: Arc<ClearanceResolver>,
        transport: Arc<dyn BridgeTransport>,
        observer: Arc<dyn WalletObserver>,
    ) -> Self {
        Self {
            wallet_id: layout.wallet_id().to_string(),
            layout,
            config,
            kv,
            resolver,
            transport,
            observer,
            identity_agent: RwLock::new(None),
            credentials: RwLock::new(None),
            readiness: Mutex::new(BridgeReadiness::NotReady),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    /// Hand the bridge an identity agent to use as fallback key source.
    /// Does not change readiness; call [`Self::refresh_readiness`] afterwards.
    pub fn attach_identity_agent(&self, agent: Arc<dyn IdentityAgent>) {
        *self.identity_agent.write() = Some(agent);
        tracing::debug!(wallet_id = %self.wallet_id, "Identity agent attached to bridge");
    }

    pub fn detach_identity_agent(&self) {
        *self.identity_agent.write() = None;
    }

    /// Hand the bridge the credentials it resolves clearance from.
    pub fn attach_credential_source(&self, source: Arc<dyn CredentialSource>) {
        *self.credentials.write() = Some(source);
        tracing::debug!(wallet_id = %self.wallet_id, "Credential source attached to bridge");
    }

    pub fn readiness(&self) -> BridgeReadiness {
        *self.readiness.lock()
    }

    /// Check key sources and move to `Ready` if key material is available.
    pub async fn refresh_readiness(&self) -> BridgeReadiness {
        let current = self.readiness();
        if current.is_ready() {
            return current;
        }

        let Some((_, source)) = self.resolve_agreement_key().await else {
            tracing::debug!(wallet_id = %self.wallet_id, "Bridge not ready: no key material available");
            return BridgeReadiness::NotReady;
        };

        let ready = BridgeReadiness::Ready { source };
        {
            let mut readiness = self.readiness.lock();
            if readiness.is_ready() {
                return *readiness;
            }
            *readiness = ready;
        }

        tracing::info!(wallet_id = %self.wallet_id, ?source, "Bridge ready");
        if let Some(opener) = &self.config.opener_origin {
            self.transport.post(
                opener,
                BridgeMessage::WalletReady {
                    wallet_id: self.wallet_id.clone(),
                    timestamp: Utc::now().timestamp_millis(),
                },
            );
        }
        self.observer.on_event(WalletEvent::BridgeReady {
            wallet_id: self.wallet_id.clone(),
            ready_at: Utc::now(),
        });
        ready
    }

    /// Current session state for `origin`, if one is open.
    pub fn session(&self, origin: &str) -> Option<BridgeSession> {
        self.sessions.lock().get(origin).cloned()
    }

    /// Forget the session for `origin` (its window went away).
    pub fn close_session(&self, origin: &str) -> bool {
        let removed = self.sessions.lock().remove(origin).is_some();
        if removed {
            tracing::debug!(origin, "Bridge session closed");
            self.observer.on_event(WalletEvent::BridgeSessionClosed {
                origin: origin.to_string(),
                closed_at: Utc::now(),
            });
        }
        removed
    }

    /// Entry point for raw text received from another window.
    pub async fn handle_text(&self, origin: &str, raw: &str) {
        if !self.accepts(origin) {
            return;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.handle_message(origin, &value).await,
            Err(e) => tracing::debug!(origin, "Dropping non-JSON bridge message: {}", e),
        }
    }

    /// Entry point for a structured message received from another window.
    pub async fn handle_message(&self, origin: &str, raw: &Value) {
        if !self.accepts(origin) {
            return;
        }

        let message = match serde_json::from_value::<BridgeMessage>(raw.clone()) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(origin, "Dropping malformed bridge message: {}", e);
                return;
            }
        };

        match message {
            BridgeMessage::Ping { source, .. } => self.on_ping(origin, &source),
            BridgeMessage::DecryptRequest {
                request_id,
                section_id,
                encrypted_content,
                ..
            } => {
                self.on_decrypt_request(origin, request_id, section_id, encrypted_content)
                    .await
            }
            other => {
                tracing::debug!(origin, message = ?other, "Ignoring outbound-only message type");
            }
        }
    }

    fn accepts(&self, origin: &str) -> bool {
        if origin == self.config.self_origin {
            tracing::trace!(origin, "Ignoring self-originated message");
            return false;
        }
        if !self.config.allowed_origins.iter().any(|allowed| allowed == origin) {
            tracing::debug!(origin, "Dropping message from origin outside allow-list");
            self.observer.on_event(WalletEvent::BridgeOriginRejected {
                origin: origin.to_string(),
                rejected_at: Utc::now(),
            });
            return false;
        }
        true
    }

    fn with_session<R>(&self, origin: &str, f: impl FnOnce(&mut BridgeSession) -> R) -> R {
        let mut sessions = self.sessions.lock();
        let session = sessions.entry(origin.to_string()).or_insert_with(|| {
            self.observer.on_event(WalletEvent::BridgeSessionOpened {
                origin: origin.to_string(),
                opened_at: Utc::now(),
            });
            BridgeSession::open(origin)
        });
        f(session)
    }

    fn on_ping(&self, origin: &str, source: &str) {
        self.with_session(origin, BridgeSession::acknowledge);
        tracing::debug!(origin, source, "PING received");
        self.transport.post(
            origin,
            BridgeMessage::Pong {
                wallet_id: self.wallet_id.clone(),
                timestamp: Utc::now().timestamp_millis(),
            },
        );
    }

    async fn on_decrypt_request(
        &self,
        origin: &str,
        request_id: String,
        section_id: String,
        payload: EncryptedPayload,
    ) {
        self.with_session(origin, BridgeSession::record_request);
        self.phase(origin, &request_id, RequestPhase::Received);

        let reply = match self.decrypt(origin, &request_id, &payload).await {
            Ok(plaintext) => BridgeMessage::DecryptResponse {
                request_id: request_id.clone(),
                section_id,
                plaintext,
                timestamp: Utc::now().timestamp_millis(),
            },
            Err(code) => {
                tracing::warn!(origin, %request_id, ?code, "Decrypt request failed");
                BridgeMessage::DecryptError {
                    request_id: request_id.clone(),
                    section_id,
                    error: code.user_message().to_string(),
                    code,
                    timestamp: Utc::now().timestamp_millis(),
                }
            }
        };

        self.transport.post(origin, reply);
        self.phase(origin, &request_id, RequestPhase::Responded);
    }

    async fn decrypt(
        &self,
        origin: &str,
        request_id: &str,
        payload: &EncryptedPayload,
    ) -> Result<String, BridgeErrorCode> {
        self.phase(origin, request_id, RequestPhase::KeyResolving);
        let (secret, source) = self
            .resolve_agreement_key()
            .await
            .ok_or(BridgeErrorCode::KeyUnavailable)?;
        tracing::debug!(origin, request_id, ?source, "Agreement key resolved");

        let level = self.authorize(payload.classification).await?;

        self.phase(origin, request_id, RequestPhase::Decrypting);
        let vault = SymmetricVault::from_agreement_secret(secret.expose(), level)
            .map_err(|_| BridgeErrorCode::KeyUnavailable)?;
        let plaintext = vault.decrypt(payload, level).map_err(|e| match e {
            VaultError::InsufficientClearance { .. } => BridgeErrorCode::ClearanceExceeded,
            _ => BridgeErrorCode::DecryptionFailed,
        })?;

        String::from_utf8(plaintext).map_err(|_| BridgeErrorCode::PlaintextNotUtf8)
    }

    /// Level the bridge may release at for content classified `required`:
    /// the resolved grant's level, capped by `max_level`.
    async fn authorize(&self, required: ClassificationLevel) -> Result<ClassificationLevel, BridgeErrorCode> {
        let ceiling = self.config.max_level;
        if !ceiling.dominates(required) {
            tracing::debug!(%required, %ceiling, "Content is above the bridge release ceiling");
            return Err(BridgeErrorCode::ClearanceExceeded);
        }

        let credentials = self.held_credentials().await;
        match self.resolver.resolve(&credentials, required).await {
            Ok(grant) => Ok(grant.level.min(ceiling)),
            Err(ClearanceError::KeyNotFound { .. }) | Err(ClearanceError::KeyStore(_)) => {
                Err(BridgeErrorCode::KeyUnavailable)
            }
            Err(_) => Err(BridgeErrorCode::ClearanceExceeded),
        }
    }

    async fn held_credentials(&self) -> Vec<ClassificationCredential> {
        let Some(source) = self.credentials.read().clone() else {
            tracing::debug!(wallet_id = %self.wallet_id, "No credential source attached");
            return Vec::new();
        };
        match source.held_credentials().await {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!(wallet_id = %self.wallet_id, "Credential source unavailable: {}", e);
                Vec::new()
            }
        }
    }

    fn phase(&self, origin: &str, request_id: &str, phase: RequestPhase) {
        self.observer.on_event(WalletEvent::BridgeRequestPhase {
            origin: origin.to_string(),
            request_id: request_id.to_string(),
            phase,
            at: Utc::now(),
        });
    }

    async fn resolve_agreement_key(&self) -> Option<(SecretBytes, KeySourceKind)> {
        if let Some(secret) = self.local_agreement_key().await {
            return Some((secret, KeySourceKind::LocalStore));
        }

        let agent = self.identity_agent.read().clone()?;
        let dids = match agent.list_long_form_dids().await {
            Ok(dids) => dids,
            Err(e) => {
                tracing::warn!("Identity agent could not list identifiers: {}", e);
                return None;
            }
        };

        for did in dids {
            match agent.agreement_key(&did).await {
                Ok(Some(secret)) if secret.len() == AGREEMENT_SECRET_LEN => {
                    return Some((secret, KeySourceKind::IdentityAgent));
                }
                Ok(Some(secret)) => {
                    tracing::debug!(%did, len = secret.len(), "Skipping agreement key with unexpected length");
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(%did, "Identity agent key lookup failed: {}", e),
            }
        }
        None
    }

    async fn local_agreement_key(&self) -> Option<SecretBytes> {
        let record = self.layout.active_key();
        let bytes = match self.kv.get(&record).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%record, "Key store read failed: {}", e);
                return None;
            }
        };

        match serde_json::from_slice::<LocalKey>(&bytes) {
            Ok(key) => key.agreement_secret().cloned(),
            Err(e) => {
                tracing::warn!(%record, "Active key record is unreadable: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::trust_validator::CredentialTrustValidator;
    use crate::domain::bridge::{OutboundMessage, SessionState};
    use crate::domain::config::{KNOWN_CLEARANCE_SCHEMA, TRUSTED_ISSUER_DID};
    use crate::domain::keys::DualKeyMaterial;
    use crate::domain::repository::KeyStore;
    use crate::infrastructure::bridge_transport::ChannelTransport;
    use crate::infrastructure::credential_source::InMemoryCredentialSource;
    use crate::infrastructure::crypto::forge::KeyPairForge;
    use crate::infrastructure::event_bus::EventBus;
    use crate::infrastructure::identity_agent::InMemoryIdentityAgent;
    use crate::infrastructure::repositories::{InMemoryKeyValueStore, KvKeyStore};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    const READER: &str = "https://reader.100monkeys.ai";
    const OPENER: &str = "https://portal.100monkeys.ai";

    fn config() -> BridgeConfig {
        BridgeConfig {
            allowed_origins: vec![READER.to_string(), OPENER.to_string()],
            self_origin: "https://wallet.100monkeys.ai".to_string(),
            opener_origin: Some(OPENER.to_string()),
            max_level: ClassificationLevel::Secret,
        }
    }

    fn layout() -> WalletStorageLayout {
        WalletStorageLayout::new("w-1").unwrap()
    }

    fn bridge_with(
        kv: Arc<dyn KeyValueStore>,
        config: BridgeConfig,
    ) -> (SecureBridge, UnboundedReceiver<OutboundMessage>, EventBus) {
        let (transport, outbound) = ChannelTransport::channel();
        let bus = EventBus::new(64);
        let resolver = ClearanceResolver::new(
            Arc::new(KvKeyStore::new(kv.clone(), layout())),
            CredentialTrustValidator::default(),
            Arc::new(bus.clone()),
        );
        let bridge = SecureBridge::new(
            layout(),
            config,
            kv,
            Arc::new(resolver),
            Arc::new(transport),
            Arc::new(bus.clone()),
        );
        (bridge, outbound, bus)
    }

    fn bridge(kv: Arc<dyn KeyValueStore>) -> (SecureBridge, UnboundedReceiver<OutboundMessage>, EventBus) {
        bridge_with(kv, config())
    }

    async fn store_key(kv: &Arc<dyn KeyValueStore>, activate: bool) -> DualKeyMaterial {
        let store = KvKeyStore::new(kv.clone(), layout());
        let key = KeyPairForge::new().generate(None);
        store.save(&LocalKey::Dual(key.clone())).await.unwrap();
        if activate {
            store.set_active(key.key_id).await.unwrap();
        }
        key
    }

    fn clearance_for(agreement_fp: &str, level: &str) -> InMemoryCredentialSource {
        InMemoryCredentialSource::new(vec![ClassificationCredential::from_value(json!({
            "type": ["VerifiableCredential", "ClassificationCredential"],
            "issuer": TRUSTED_ISSUER_DID,
            "credentialSchema": { "id": KNOWN_CLEARANCE_SCHEMA },
            "credentialSubject": { "clearanceLevel": level, "agreementKeyFingerprint": agreement_fp }
        }))])
    }

    fn sealed_request(key: &DualKeyMaterial, request_id: &str, level: ClassificationLevel) -> Value {
        let sealed = SymmetricVault::from_agreement_secret(key.agreement_key.private_bytes.expose(), ClassificationLevel::TopSecret)
            .unwrap()
            .encrypt(b"section text", level)
            .unwrap();
        serde_json::to_value(BridgeMessage::DecryptRequest {
            request_id: request_id.to_string(),
            section_id: "s".to_string(),
            encrypted_content: sealed,
            timestamp: 1,
        })
        .unwrap()
    }

    fn error_code(outbound: &mut UnboundedReceiver<OutboundMessage>) -> BridgeErrorCode {
        match outbound.try_recv().unwrap().message {
            BridgeMessage::DecryptError { code, .. } => code,
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ping_acknowledges_session() {
        let (bridge, mut outbound, _) = bridge(Arc::new(InMemoryKeyValueStore::new()));
        bridge
            .handle_message(READER, &json!({ "type": "PING", "source": "reader", "timestamp": 1 }))
            .await;

        let sent = outbound.try_recv().unwrap();
        assert_eq!(sent.target_origin, READER);
        assert!(matches!(sent.message, BridgeMessage::Pong { ref wallet_id, .. } if wallet_id == "w-1"));
        assert_eq!(bridge.session(READER).unwrap().state, SessionState::Acknowledged);

        assert!(bridge.close_session(READER));
        assert!(bridge.session(READER).is_none());
    }

    #[tokio::test]
    async fn test_self_origin_and_malformed_messages_are_ignored() {
        let (bridge, mut outbound, _) = bridge(Arc::new(InMemoryKeyValueStore::new()));
        bridge
            .handle_message("https://wallet.100monkeys.ai", &json!({ "type": "PING", "source": "me", "timestamp": 1 }))
            .await;
        bridge.handle_message(READER, &json!({ "type": "SELF_DESTRUCT" })).await;
        bridge.handle_text(READER, "{not json").await;

        assert!(outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_key_yields_typed_error() {
        let (bridge, mut outbound, _) = bridge(Arc::new(InMemoryKeyValueStore::new()));
        bridge
            .handle_message(
                READER,
                &json!({
                    "type": "DECRYPT_REQUEST",
                    "requestId": "r-1",
                    "sectionId": "s-1",
                    "encryptedContent": { "ciphertext": "AQID", "nonce": "AAAA" },
                    "timestamp": 1
                }),
            )
            .await;

        match outbound.try_recv().unwrap().message {
            BridgeMessage::DecryptError { request_id, code, .. } => {
                assert_eq!(request_id, "r-1");
                assert_eq!(code, BridgeErrorCode::KeyUnavailable);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_readiness_waits_for_key_material_and_signals_once() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let (bridge, mut outbound, _) = bridge(kv.clone());

        assert_eq!(bridge.readiness(), BridgeReadiness::NotReady);
        assert_eq!(bridge.refresh_readiness().await, BridgeReadiness::NotReady);
        assert!(outbound.try_recv().is_err());

        store_key(&kv, true).await;

        assert_eq!(
            bridge.refresh_readiness().await,
            BridgeReadiness::Ready { source: KeySourceKind::LocalStore }
        );
        let sent = outbound.try_recv().unwrap();
        assert_eq!(sent.target_origin, OPENER);
        assert!(matches!(sent.message, BridgeMessage::WalletReady { .. }));

        bridge.refresh_readiness().await;
        assert!(outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_identity_agent_fallback() {
        // Stored for clearance binding but not active, so the fast path misses
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let key = store_key(&kv, false).await;
        let agent = InMemoryIdentityAgent::new()
            .with_did("did:ion:empty:long", None)
            .with_did("did:ion:holder:long", Some(key.agreement_key.private_bytes.clone()));

        let (bridge, mut outbound, _) = bridge(kv);
        bridge.attach_identity_agent(Arc::new(agent));
        bridge.attach_credential_source(Arc::new(clearance_for(key.agreement_key.fingerprint.as_str(), "SECRET")));
        assert!(outbound.try_recv().is_err());

        assert_eq!(
            bridge.refresh_readiness().await,
            BridgeReadiness::Ready { source: KeySourceKind::IdentityAgent }
        );
        outbound.try_recv().unwrap();

        bridge
            .handle_message(READER, &sealed_request(&key, "r-9", ClassificationLevel::Confidential))
            .await;

        match outbound.try_recv().unwrap().message {
            BridgeMessage::DecryptResponse { plaintext, .. } => assert_eq!(plaintext, "section text"),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_content_above_ceiling_is_refused() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let key = store_key(&kv, true).await;
        let (bridge, mut outbound, _) = bridge(kv);
        bridge.attach_credential_source(Arc::new(clearance_for(key.agreement_key.fingerprint.as_str(), "TOP_SECRET")));

        bridge
            .handle_message(READER, &sealed_request(&key, "r-ts", ClassificationLevel::TopSecret))
            .await;
        assert_eq!(error_code(&mut outbound), BridgeErrorCode::ClearanceExceeded);
    }

    #[tokio::test]
    async fn test_wallet_without_credentials_releases_nothing() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let key = store_key(&kv, true).await;
        let (bridge, mut outbound, _) = bridge_with(
            kv,
            BridgeConfig {
                max_level: ClassificationLevel::TopSecret,
                ..config()
            },
        );

        for (id, level) in [
            ("r-ts", ClassificationLevel::TopSecret),
            ("r-u", ClassificationLevel::Unclassified),
        ] {
            bridge.handle_message(READER, &sealed_request(&key, id, level)).await;
            assert_eq!(error_code(&mut outbound), BridgeErrorCode::ClearanceExceeded);
        }
    }

    #[tokio::test]
    async fn test_release_follows_held_clearance_per_request() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let key = store_key(&kv, true).await;
        let (bridge, mut outbound, _) = bridge(kv);
        let source = Arc::new(clearance_for(key.agreement_key.fingerprint.as_str(), "CONFIDENTIAL"));
        bridge.attach_credential_source(source.clone());

        bridge
            .handle_message(READER, &sealed_request(&key, "r-s", ClassificationLevel::Secret))
            .await;
        assert_eq!(error_code(&mut outbound), BridgeErrorCode::ClearanceExceeded);

        bridge
            .handle_message(READER, &sealed_request(&key, "r-c", ClassificationLevel::Confidential))
            .await;
        assert!(matches!(
            outbound.try_recv().unwrap().message,
            BridgeMessage::DecryptResponse { ref request_id, .. } if request_id == "r-c"
        ));

        // Revocation takes effect on the next request
        source.clear();
        bridge
            .handle_message(READER, &sealed_request(&key, "r-c2", ClassificationLevel::Confidential))
            .await;
        assert_eq!(error_code(&mut outbound), BridgeErrorCode::ClearanceExceeded);
    }

    #[tokio::test]
    async fn test_credential_for_another_key_is_key_unavailable() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let key = store_key(&kv, true).await;
        let foreign = KeyPairForge::new().generate(None);
        let (bridge, mut outbound, _) = bridge(kv);
        bridge.attach_credential_source(Arc::new(clearance_for(foreign.agreement_key.fingerprint.as_str(), "SECRET")));

        bridge
            .handle_message(READER, &sealed_request(&key, "r-1", ClassificationLevel::Confidential))
            .await;
        assert_eq!(error_code(&mut outbound), BridgeErrorCode::KeyUnavailable);
    }

    #[tokio::test]
    async fn test_request_phases_are_published_in_order() {
        let (bridge, _outbound, bus) = bridge(Arc::new(InMemoryKeyValueStore::new()));
        let mut events = bus.subscribe_origin(READER);

        bridge
            .handle_message(
                READER,
                &json!({
                    "type": "DECRYPT_REQUEST",
                    "requestId": "r-2",
                    "sectionId": "s",
                    "encryptedContent": { "ciphertext": "AQID", "nonce": "AAAA" },
                    "timestamp": 1
                }),
            )
            .await;

        assert!(matches!(events.recv().await.unwrap(), WalletEvent::BridgeSessionOpened { .. }));
        let mut phases = Vec::new();
        for _ in 0..3 {
            if let WalletEvent::BridgeRequestPhase { phase, .. } = events.recv().await.unwrap() {
                phases.push(phase);
            }
        }
        // Key resolution fails, so Decrypting is skipped
        assert_eq!(
            phases,
            vec![RequestPhase::Received, RequestPhase::KeyResolving, RequestPhase::Responded]
        );
    }
}
