// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: remote listings, secrets and notifications

pub mod notify;
pub mod protocol;
pub mod secret;
pub mod traced;

pub use notify::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use protocol::{
    AdapterError, Connectors, FtpAdapter, HttpsAdapter, ListRequest, NamePattern,
    ObjectStorageAdapter, ProtocolAdapter,
};
pub use secret::{Credential, EnvSecretResolver, Secret, SecretError, SecretResolver};
pub use traced::{TracedNotifier, TracedProtocolAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifier, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use protocol::{FakeProtocolAdapter, ListCall};
#[cfg(any(test, feature = "test-support"))]
pub use secret::FakeSecretResolver;
