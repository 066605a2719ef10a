// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: pure types, policies and ports. No I/O.

pub mod bridge;
pub mod classification;
pub mod clearance;
pub mod config;
pub mod credential;
pub mod encoding;
pub mod events;
pub mod keys;
pub mod payload;
pub mod repository;
