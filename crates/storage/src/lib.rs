// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dw-storage: Repositories and leases for the dropwatch scheduler

mod error;
mod journal;
mod lease;
mod memory;
mod repository;
mod state;

pub use error::StorageError;
pub use journal::Journal;
pub use lease::MemoryLeaseStore;
pub use memory::MemoryStore;
pub use repository::{
    ConfigurationRepository, DiscoveryRepository, ExecutionRepository, LeaseStore, Repositories,
    StoreMaintenance,
};
pub use state::{StoreOp, StoreState};
