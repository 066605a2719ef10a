// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Structured wallet events.
//!
//! Core services never print. They report what happened through an injected
//! [`WalletObserver`]; [`crate::infrastructure::event_bus::EventBus`] fans the
//! events out to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::bridge::RequestPhase;
use crate::domain::classification::ClassificationLevel;
use crate::domain::credential::CredentialShape;
use crate::domain::keys::{KeyId, KeyPurpose};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WalletEvent {
    CredentialRejected {
        credential_id: Option<String>,
        shape: CredentialShape,
        reason: String,
        rejected_at: DateTime<Utc>,
    },
    SchemaDrift {
        credential_id: Option<String>,
        expected: String,
        found: String,
        observed_at: DateTime<Utc>,
    },
    ClearanceResolved {
        key_id: KeyId,
        level: ClassificationLevel,
        required: ClassificationLevel,
        resolved_at: DateTime<Utc>,
    },
    ClearanceDenied {
        reason: String,
        held: Option<ClassificationLevel>,
        required: ClassificationLevel,
        denied_at: DateTime<Utc>,
    },
    /// Local key does not match the credential claim. Possible tampering.
    KeyBindingMismatch {
        key_id: KeyId,
        purpose: KeyPurpose,
        claimed: String,
        local: String,
        detected_at: DateTime<Utc>,
    },
    BridgeOriginRejected {
        origin: String,
        rejected_at: DateTime<Utc>,
    },
    BridgeSessionOpened {
        origin: String,
        opened_at: DateTime<Utc>,
    },
    BridgeSessionClosed {
        origin: String,
        closed_at: DateTime<Utc>,
    },
    BridgeRequestPhase {
        origin: String,
        request_id: String,
        phase: RequestPhase,
        at: DateTime<Utc>,
    },
    BridgeReady {
        wallet_id: String,
        ready_at: DateTime<Utc>,
    },
}

/// Receiver for wallet events. Implementations must not block.
pub trait WalletObserver: Send + Sync {
    fn on_event(&self, event: WalletEvent);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl WalletObserver for NoopObserver {
    fn on_event(&self, _event: WalletEvent) {}
}
