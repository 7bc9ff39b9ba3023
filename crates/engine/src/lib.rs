// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dropwatch scheduling engine
//!
//! Ties the pure core to storage and adapters: the scheduler loop decides
//! what is due, the governor bounds how much runs, and the coordinator runs
//! one check and records what it found.

mod coordinator;
mod error;
mod governor;
mod scheduler;

pub use coordinator::ExecutionCoordinator;
pub use error::EngineError;
pub use governor::{Admission, AdmissionPermit, ConcurrencyGovernor, SkipReason};
pub use scheduler::{
    DrainReport, SchedulerDeps, SchedulerHandle, SchedulerLoop, SchedulerState, TickReport,
};
