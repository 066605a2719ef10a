// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process credential source used by the CLI and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::domain::credential::ClassificationCredential;
use crate::domain::repository::CredentialSource;

#[derive(Clone, Default)]
pub struct InMemoryCredentialSource {
    credentials: Arc<RwLock<Vec<ClassificationCredential>>>,
}

impl InMemoryCredentialSource {
    pub fn new(credentials: Vec<ClassificationCredential>) -> Self {
        Self {
            credentials: Arc::new(RwLock::new(credentials)),
        }
    }

    pub fn push(&self, credential: ClassificationCredential) {
        self.credentials.write().push(credential);
    }

    /// Drop every held credential, e.g. after revocation.
    pub fn clear(&self) {
        self.credentials.write().clear();
    }
}

#[async_trait]
impl CredentialSource for InMemoryCredentialSource {
    async fn held_credentials(&self) -> anyhow::Result<Vec<ClassificationCredential>> {
        Ok(self.credentials.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_push_and_clear() {
        let source = InMemoryCredentialSource::default();
        assert!(source.held_credentials().await.unwrap().is_empty());

        source.push(ClassificationCredential::from_value(json!({ "id": "urn:uuid:c-1" })));
        let held = source.held_credentials().await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].id(), Some("urn:uuid:c-1"));

        source.clear();
        assert!(source.held_credentials().await.unwrap().is_empty());
    }
}
