// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Downstream notification adapters

mod log;
mod webhook;

pub use log::LogNotifier;
pub use webhook::WebhookNotifier;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, NotifyCall};

use async_trait::async_trait;
use dw_core::{DiscoveryNotification, OutcomeNotification};
use thiserror::Error;

/// Errors from notification delivery
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("endpoint rejected notification with status {0}")]
    Rejected(u16),
    #[error("could not encode notification: {0}")]
    Encode(String),
}

/// Publishes discoveries and execution outcomes downstream
#[async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    /// A new file was discovered
    async fn discovery(&self, notification: &DiscoveryNotification) -> Result<(), NotifyError>;

    /// An execution reached a terminal status
    async fn outcome(&self, notification: &OutcomeNotification) -> Result<(), NotifyError>;
}
