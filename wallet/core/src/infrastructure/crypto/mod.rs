// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod fingerprint;
pub mod forge;
pub mod vault;

pub use fingerprint::{fingerprint, fingerprint_matches};
pub use forge::KeyPairForge;
pub use vault::SymmetricVault;
