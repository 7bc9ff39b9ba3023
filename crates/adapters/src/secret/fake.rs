// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory secret resolver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Credential, Secret, SecretError, SecretResolver};
use async_trait::async_trait;
use dw_core::SecretRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct FakeSecretResolver {
    secrets: Arc<Mutex<HashMap<String, Credential>>>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl FakeSecretResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reference: &str, username: &str, secret: &str) {
        self.secrets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                reference.to_string(),
                Credential::new(username, Secret::new(secret)),
            );
    }

    /// References looked up so far, in order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SecretResolver for FakeSecretResolver {
    async fn resolve(&self, reference: &SecretRef) -> Result<Credential, SecretError> {
        self.lookups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(reference.0.clone());
        self.secrets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&reference.0)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(reference.to_string()))
    }
}
