// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod bridge_transport;
pub mod credential_source;
pub mod crypto;
pub mod event_bus;
pub mod identity_agent;
pub mod repositories;
