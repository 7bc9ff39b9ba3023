// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notifier for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use dw_core::{DiscoveryNotification, OutcomeNotification};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCall {
    Discovery(DiscoveryNotification),
    Outcome(OutcomeNotification),
}

/// Fake notifier that records every call and can be told to fail
#[derive(Clone, Default)]
pub struct FakeNotifier {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
    failing: Arc<AtomicBool>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail (they are still recorded)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn discoveries(&self) -> Vec<DiscoveryNotification> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                NotifyCall::Discovery(n) => Some(n),
                NotifyCall::Outcome(_) => None,
            })
            .collect()
    }

    pub fn outcomes(&self) -> Vec<OutcomeNotification> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                NotifyCall::Outcome(n) => Some(n),
                NotifyCall::Discovery(_) => None,
            })
            .collect()
    }

    fn record(&self, call: NotifyCall) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        if self.failing.load(Ordering::SeqCst) {
            Err(NotifyError::Delivery("fake notifier set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn discovery(&self, n: &DiscoveryNotification) -> Result<(), NotifyError> {
        self.record(NotifyCall::Discovery(n.clone()))
    }

    async fn outcome(&self, n: &OutcomeNotification) -> Result<(), NotifyError> {
        self.record(NotifyCall::Outcome(n.clone()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
