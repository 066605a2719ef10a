// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! MLS Wallet Core
//!
//! Decides, cryptographically, whether the wallet holder may encrypt or
//! decrypt content at a given classification level, and binds that decision
//! to a verifiable credential.
//!
//! # Architecture
//!
//! - **Domain:** classification policy, credential normalization, key material,
//!   grant and error taxonomy, bridge protocol model, ports
//! - **Application:** trust validation, key binding, clearance resolution,
//!   secret vault service, secure bridge, wallet registry
//! - **Infrastructure:** key forge and AEAD vault, key-value stores, identity
//!   agent, bridge transport, event bus

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
