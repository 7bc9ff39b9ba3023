// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scheduling engine

use dw_core::ScheduleError;
use dw_storage::StorageError;
use thiserror::Error;

/// Errors that can occur in the engine
///
/// Adapter failures are not here: they are recorded on the execution.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("scheduler is stopped")]
    Stopped,
    #[error("scheduler is already running")]
    AlreadyStarted,
    #[error("scheduler task failed: {0}")]
    Task(String),
}
