// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process identity agent used by the CLI and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::keys::SecretBytes;
use crate::domain::repository::IdentityAgent;

/// DID -> agreement key map. A DID registered without a key models an
/// identity whose key material the agent cannot release.
#[derive(Clone, Default)]
pub struct InMemoryIdentityAgent {
    identities: Arc<RwLock<BTreeMap<String, Option<SecretBytes>>>>,
}

impl InMemoryIdentityAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_did(self, did: impl Into<String>, agreement_key: Option<SecretBytes>) -> Self {
        self.insert(did, agreement_key);
        self
    }

    pub fn insert(&self, did: impl Into<String>, agreement_key: Option<SecretBytes>) {
        self.identities.write().insert(did.into(), agreement_key);
    }
}

#[async_trait]
impl IdentityAgent for InMemoryIdentityAgent {
    async fn list_long_form_dids(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.identities.read().keys().cloned().collect())
    }

    async fn agreement_key(&self, did: &str) -> anyhow::Result<Option<SecretBytes>> {
        match self.identities.read().get(did) {
            Some(key) => Ok(key.clone()),
            None => anyhow::bail!("Unknown DID '{}'", did),
        }
    }
}
