// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Wallet Events
//
// In-memory fan-out of WalletEvent using tokio broadcast channels. The bus is
// the production WalletObserver: services publish through the observer trait,
// CLI and host UI subscribe here.
//
// Events are not persisted; a subscriber that attaches late misses earlier events.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::{WalletEvent, WalletObserver};

/// Event bus for publishing and subscribing to wallet events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<WalletEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity.
    /// Once full, the oldest buffered events are dropped for slow receivers.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (256)
    pub fn with_default_capacity() -> Self {
        Self::new(256)
    }

    pub fn publish(&self, event: WalletEvent) {
        debug!(?event, "Publishing wallet event");

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all wallet events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to bridge events concerning one remote origin
    pub fn subscribe_origin(&self, origin: impl Into<String>) -> OriginEventReceiver {
        OriginEventReceiver {
            receiver: self.sender.subscribe(),
            origin: origin.into(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl WalletObserver for EventBus {
    fn on_event(&self, event: WalletEvent) {
        self.publish(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all wallet events
pub struct EventReceiver {
    receiver: broadcast::Receiver<WalletEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<WalletEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without waiting
    pub fn try_recv(&mut self) -> Result<WalletEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to one bridge origin
pub struct OriginEventReceiver {
    receiver: broadcast::Receiver<WalletEvent>,
    origin: String,
}

impl OriginEventReceiver {
    pub async fn recv(&mut self) -> Result<WalletEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if self.matches_origin(&event) {
                return Ok(event);
            }
        }
    }

    fn matches_origin(&self, event: &WalletEvent) -> bool {
        match event {
            WalletEvent::BridgeOriginRejected { origin, .. }
            | WalletEvent::BridgeSessionOpened { origin, .. }
            | WalletEvent::BridgeSessionClosed { origin, .. }
            | WalletEvent::BridgeRequestPhase { origin, .. } => origin == &self.origin,
            _ => false,
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}
