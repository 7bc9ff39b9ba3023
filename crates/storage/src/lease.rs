// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lease store driven by the core lease state machine

use crate::error::StorageError;
use crate::repository::LeaseStore;
use async_trait::async_trait;
use dw_core::{Clock, CoordinationEvent, HolderId, Lease, LeaseInput};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Leases held in memory, shared by every clone
///
/// Suitable for a single process; a multi-instance deployment backs
/// [`LeaseStore`] with a shared store instead.
#[derive(Clone)]
pub struct MemoryLeaseStore<C: Clock> {
    leases: Arc<Mutex<HashMap<String, Lease>>>,
    clock: C,
}

impl<C: Clock> MemoryLeaseStore<C> {
    pub fn new(clock: C) -> Self {
        Self {
            leases: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Current lease record for `key`, if one was ever taken
    pub fn get(&self, key: &str) -> Option<Lease> {
        self.leases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn apply(&self, key: &str, input: LeaseInput) -> (Lease, Vec<CoordinationEvent>) {
        let mut leases = self.leases.lock().unwrap_or_else(|e| e.into_inner());
        let current = leases
            .get(key)
            .cloned()
            .unwrap_or_else(|| Lease::new(key));
        let (next, events) = current.transition(input, &self.clock);
        leases.insert(key.to_string(), next.clone());
        (next, events)
    }
}

#[async_trait]
impl<C: Clock> LeaseStore for MemoryLeaseStore<C> {
    async fn acquire(
        &self,
        key: &str,
        holder: &HolderId,
        ttl: Duration,
    ) -> Result<bool, StorageError> {
        let (_, events) = self.apply(
            key,
            LeaseInput::Acquire {
                holder: holder.clone(),
                ttl,
            },
        );
        events.iter().for_each(CoordinationEvent::log);
        Ok(events.iter().any(|e| {
            matches!(
                e,
                CoordinationEvent::LeaseAcquired { .. } | CoordinationEvent::LeaseReclaimed { .. }
            )
        }))
    }

    async fn renew(
        &self,
        key: &str,
        holder: &HolderId,
        ttl: Duration,
    ) -> Result<bool, StorageError> {
        let (next, _) = self.apply(
            key,
            LeaseInput::Renew {
                holder: holder.clone(),
                ttl,
            },
        );
        Ok(next.is_held_by(holder, &self.clock))
    }

    async fn release(&self, key: &str, holder: &HolderId) -> Result<(), StorageError> {
        let (_, events) = self.apply(
            key,
            LeaseInput::Release {
                holder: holder.clone(),
            },
        );
        events.iter().for_each(CoordinationEvent::log);
        Ok(())
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
