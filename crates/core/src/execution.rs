// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution state machine
//!
//! One Execution is recorded per check attempt:
//! Pending -> Running -> {Completed, Failed}. Terminal states never move.

use crate::configuration::Configuration;
use crate::id::{ConfigurationId, ExecutionId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Current status of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Admitted, not yet started
    Pending,
    /// Adapter call in flight
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Pending => write!(f, "pending"),
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Why an adapter call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    AuthenticationFailure,
    ConnectionTimeout,
    ProtocolError,
    PermissionDenied,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::AuthenticationFailure => write!(f, "authentication_failure"),
            ErrorCategory::ConnectionTimeout => write!(f, "connection_timeout"),
            ErrorCategory::ProtocolError => write!(f, "protocol_error"),
            ErrorCategory::PermissionDenied => write!(f, "permission_denied"),
        }
    }
}

/// Events that move an execution forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    Start {
        at: DateTime<Utc>,
    },
    Complete {
        at: DateTime<Utc>,
        files_found: u32,
    },
    Fail {
        at: DateTime<Utc>,
        category: ErrorCategory,
        detail: String,
    },
}

impl ExecutionEvent {
    fn target(&self) -> ExecutionStatus {
        match self {
            ExecutionEvent::Start { .. } => ExecutionStatus::Running,
            ExecutionEvent::Complete { .. } => ExecutionStatus::Completed,
            ExecutionEvent::Fail { .. } => ExecutionStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("execution {id}: cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub id: ExecutionId,
    pub from: ExecutionStatus,
    pub to: ExecutionStatus,
}

/// One scheduled attempt to check a configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub configuration_id: ConfigurationId,
    pub tenant_id: TenantId,
    pub status: ExecutionStatus,
    /// The `next_due_at` that made this execution due
    pub scheduled_for: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Newly discovered files only; already-seen files do not count
    pub files_found: u32,
    pub error_category: Option<ErrorCategory>,
    pub error_detail: Option<String>,
}

impl Execution {
    /// A freshly admitted execution
    pub fn pending(
        id: ExecutionId,
        configuration: &Configuration,
        scheduled_for: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            configuration_id: configuration.id.clone(),
            tenant_id: configuration.tenant_id.clone(),
            status: ExecutionStatus::Pending,
            scheduled_for,
            started_at: None,
            completed_at: None,
            files_found: 0,
            error_category: None,
            error_detail: None,
        }
    }

    /// Pure state transition
    ///
    /// Only Pending -> Running and Running -> {Completed, Failed} are allowed.
    pub fn transition(&self, event: ExecutionEvent) -> Result<Execution, InvalidTransition> {
        let to = event.target();
        let allowed = matches!(
            (self.status, to),
            (ExecutionStatus::Pending, ExecutionStatus::Running)
                | (ExecutionStatus::Running, ExecutionStatus::Completed)
                | (ExecutionStatus::Running, ExecutionStatus::Failed)
        );
        if !allowed {
            return Err(InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }

        let next = match event {
            ExecutionEvent::Start { at } => Execution {
                status: ExecutionStatus::Running,
                started_at: Some(at),
                ..self.clone()
            },
            ExecutionEvent::Complete { at, files_found } => Execution {
                status: ExecutionStatus::Completed,
                completed_at: Some(at),
                files_found,
                ..self.clone()
            },
            ExecutionEvent::Fail {
                at,
                category,
                detail,
            } => Execution {
                status: ExecutionStatus::Failed,
                completed_at: Some(at),
                error_category: Some(category),
                error_detail: Some(detail),
                ..self.clone()
            },
        };
        Ok(next)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
