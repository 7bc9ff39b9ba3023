// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dw-core: Core library for the dropwatch file-arrival scheduler
//!
//! This crate provides:
//! - Domain records: configurations, executions, discovered files
//! - Pure state machines for executions, leases and the admission ceiling
//! - Date token resolution and time-zone aware schedule evaluation
//! - Clock and ID abstractions for deterministic tests

pub mod clock;
pub mod id;

pub mod configuration;
pub mod coordination;
pub mod discovery;
pub mod execution;
pub mod notification;
pub mod schedule;
pub mod settings;
pub mod token;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use configuration::{Configuration, ConnectionSettings, Protocol, SecretRef};
pub use coordination::{
    AdmissionCeiling, AdmissionInput, CoordinationEvent, HolderId, Lease, LeaseInput, LeaseState,
};
pub use discovery::{discovery_date, DiscoveredFile, DiscoveryKey, NotificationStatus, RemoteFile};
pub use execution::{
    ErrorCategory, Execution, ExecutionEvent, ExecutionStatus, InvalidTransition,
};
pub use id::{ConfigurationId, ExecutionId, IdGen, SequentialIdGen, TenantId, UuidIdGen};
pub use notification::{DiscoveryNotification, OutcomeNotification};
pub use schedule::{CronStrategy, ScheduleError, ScheduleEvaluator, ScheduleStrategy};
pub use settings::SchedulerSettings;
