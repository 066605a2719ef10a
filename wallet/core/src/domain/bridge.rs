// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Secure Bridge Protocol Model
//!
//! Message schema and per-origin state for the cross-window decrypt bridge.
//! A companion browsing context asks the wallet to decrypt content without any
//! network hop; the wallet answers over the same in-process message channel.
//!
//! ```text
//! PING {source, timestamp}                         -> PONG {walletId, timestamp}
//! DECRYPT_REQUEST {requestId, sectionId, encryptedContent, timestamp}
//!                                                  -> DECRYPT_RESPONSE {requestId, sectionId, plaintext, timestamp}
//!                                                   | DECRYPT_ERROR {requestId, sectionId, error, code, timestamp}
//! WALLET_READY {walletId, timestamp}               (unsolicited, once, to the opener)
//! ```
//!
//! ## Session lifecycle
//!
//! `Unacknowledged -> Acknowledged` on the first `PING`. Each decrypt request
//! moves through [`RequestPhase`] `Received -> KeyResolving -> Decrypting -> Responded`.
//! Responses are correlated by `requestId`, never by arrival order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::payload::EncryptedPayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum BridgeMessage {
    Ping {
        source: String,
        timestamp: i64,
    },
    Pong {
        wallet_id: String,
        timestamp: i64,
    },
    DecryptRequest {
        request_id: String,
        section_id: String,
        encrypted_content: EncryptedPayload,
        timestamp: i64,
    },
    DecryptResponse {
        request_id: String,
        section_id: String,
        plaintext: String,
        timestamp: i64,
    },
    DecryptError {
        request_id: String,
        section_id: String,
        error: String,
        code: BridgeErrorCode,
        timestamp: i64,
    },
    WalletReady {
        wallet_id: String,
        timestamp: i64,
    },
}

impl BridgeMessage {
    /// Correlation id for decrypt traffic.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            BridgeMessage::DecryptRequest { request_id, .. }
            | BridgeMessage::DecryptResponse { request_id, .. }
            | BridgeMessage::DecryptError { request_id, .. } => Some(request_id),
            _ => None,
        }
    }
}

/// Machine-readable reason carried by `DECRYPT_ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeErrorCode {
    /// Neither the local store nor the identity agent yielded an agreement key.
    KeyUnavailable,
    DecryptionFailed,
    /// Content classification exceeds what the bridge may release.
    ClearanceExceeded,
    PlaintextNotUtf8,
}

impl BridgeErrorCode {
    pub fn user_message(self) -> &'static str {
        match self {
            BridgeErrorCode::KeyUnavailable => "No decryption key is available in this wallet.",
            BridgeErrorCode::DecryptionFailed => "The content could not be decrypted with this wallet's key.",
            BridgeErrorCode::ClearanceExceeded => "This content is classified above what the wallet may release.",
            BridgeErrorCode::PlaintextNotUtf8 => "The decrypted content is not text.",
        }
    }
}

/// A message addressed to a remote window.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub target_origin: String,
    pub message: BridgeMessage,
}

/// Fire-and-forget delivery to another window (the `postMessage` surface).
pub trait BridgeTransport: Send + Sync {
    fn post(&self, target_origin: &str, message: BridgeMessage);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unacknowledged,
    Acknowledged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Received,
    KeyResolving,
    Decrypting,
    Responded,
}

/// Implicit channel state for one allowed remote origin.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeSession {
    pub origin: String,
    pub state: SessionState,
    pub opened_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub requests_received: u64,
}

impl BridgeSession {
    pub fn open(origin: &str) -> Self {
        let now = Utc::now();
        Self {
            origin: origin.to_string(),
            state: SessionState::Unacknowledged,
            opened_at: now,
            last_seen: now,
            requests_received: 0,
        }
    }

    pub fn acknowledge(&mut self) {
        self.state = SessionState::Acknowledged;
        self.last_seen = Utc::now();
    }

    pub fn record_request(&mut self) {
        self.requests_received = self.requests_received.saturating_add(1);
        self.last_seen = Utc::now();
    }
}

/// Where the bridge found agreement key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySourceKind {
    LocalStore,
    IdentityAgent,
}

/// Explicit readiness state. `WALLET_READY` is sent on the
/// `NotReady -> Ready` transition and at no other time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeReadiness {
    NotReady,
    Ready { source: KeySourceKind },
}

impl BridgeReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, BridgeReadiness::Ready { .. })
    }
}
