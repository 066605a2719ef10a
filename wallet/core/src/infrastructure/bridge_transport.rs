// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Channel-backed [`BridgeTransport`].
//!
//! The host window loop owns the receiving half and forwards each
//! [`OutboundMessage`] to the target window.

use tokio::sync::mpsc;

use crate::domain::bridge::{BridgeMessage, BridgeTransport, OutboundMessage};

#[derive(Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelTransport {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl BridgeTransport for ChannelTransport {
    fn post(&self, target_origin: &str, message: BridgeMessage) {
        let outbound = OutboundMessage {
            target_origin: target_origin.to_string(),
            message,
        };
        if self.sender.send(outbound).is_err() {
            tracing::debug!(target_origin, "Bridge transport receiver dropped; message discarded");
        }
    }
}
