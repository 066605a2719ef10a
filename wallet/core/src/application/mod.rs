// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod binding_verifier;
pub mod clearance_resolver;
pub mod key_management;
pub mod repository_factory;
pub mod secure_bridge;
pub mod trust_validator;
pub mod vault_service;
pub mod wallet_registry;

pub use binding_verifier::KeyBindingVerifier;
pub use clearance_resolver::ClearanceResolver;
pub use key_management::KeyManagementService;
pub use secure_bridge::SecureBridge;
pub use trust_validator::CredentialTrustValidator;
pub use vault_service::VaultService;
pub use wallet_registry::{WalletContext, WalletRegistry};
