// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol adapters that list remote files matching a resolved pattern
//!
//! Every adapter honors the request timeout, never retries, and reports
//! failures as one of the [`ErrorCategory`] values. An empty listing is a
//! normal outcome, not an error.

mod ftp;
mod https;
mod object_storage;
mod pattern;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use ftp::FtpAdapter;
pub use https::HttpsAdapter;
pub use object_storage::ObjectStorageAdapter;
pub use pattern::NamePattern;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProtocolAdapter, ListCall};

use crate::secret::Credential;
use async_trait::async_trait;
use dw_core::{ConnectionSettings, ErrorCategory, Protocol, RemoteFile};
use std::time::Duration;
use thiserror::Error;

/// A categorized adapter failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category}: {detail}")]
pub struct AdapterError {
    pub category: ErrorCategory,
    pub detail: String,
}

impl AdapterError {
    pub fn new(category: ErrorCategory, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: detail.into(),
        }
    }

    pub fn authentication(detail: impl Into<String>) -> Self {
        Self::new(ErrorCategory::AuthenticationFailure, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ConnectionTimeout, detail)
    }

    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ProtocolError, detail)
    }

    pub fn permission(detail: impl Into<String>) -> Self {
        Self::new(ErrorCategory::PermissionDenied, detail)
    }

    /// Map an I/O error, treating timeouts specially
    pub fn from_io(context: &str, error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                Self::timeout(format!("{}: {}", context, error))
            }
            std::io::ErrorKind::PermissionDenied => {
                Self::permission(format!("{}: {}", context, error))
            }
            _ => Self::protocol(format!("{}: {}", context, error)),
        }
    }
}

/// What to list: a resolved directory and name pattern on one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub protocol: Protocol,
    /// Resolved directory path
    pub path: String,
    /// Resolved file name, may contain `*`/`?` globs
    pub name_pattern: String,
    pub connection: ConnectionSettings,
    pub timeout: Duration,
}

impl ListRequest {
    /// Directory path normalized to `/a/b` form (`/` for the root)
    pub fn directory(&self) -> String {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Directory joined with a file name
    pub fn file_path(&self, name: &str) -> String {
        let dir = self.directory();
        if dir == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", dir, name)
        }
    }
}

/// Adapter for listing files on a remote endpoint
#[async_trait]
pub trait ProtocolAdapter: Clone + Send + Sync + 'static {
    /// List remote files in `request.path` whose name matches `request.name_pattern`
    async fn list_matching(
        &self,
        request: &ListRequest,
        credential: Option<&Credential>,
    ) -> Result<Vec<RemoteFile>, AdapterError>;
}

/// Closed set of protocol adapters, dispatched by [`Protocol`]
#[derive(Clone)]
pub struct Connectors<F, H, O> {
    pub ftp: F,
    pub https: H,
    pub object_storage: O,
}

impl Connectors<FtpAdapter, HttpsAdapter, ObjectStorageAdapter> {
    /// Production adapters for every protocol
    pub fn real() -> Self {
        Self {
            ftp: FtpAdapter::new(),
            https: HttpsAdapter::new(),
            object_storage: ObjectStorageAdapter::new(),
        }
    }
}

impl<A: Clone> Connectors<A, A, A> {
    /// The same adapter behind every protocol (handy with fakes)
    pub fn uniform(adapter: A) -> Self {
        Self {
            ftp: adapter.clone(),
            https: adapter.clone(),
            object_storage: adapter,
        }
    }
}

#[async_trait]
impl<F, H, O> ProtocolAdapter for Connectors<F, H, O>
where
    F: ProtocolAdapter,
    H: ProtocolAdapter,
    O: ProtocolAdapter,
{
    async fn list_matching(
        &self,
        request: &ListRequest,
        credential: Option<&Credential>,
    ) -> Result<Vec<RemoteFile>, AdapterError> {
        match request.protocol {
            Protocol::Ftp => self.ftp.list_matching(request, credential).await,
            Protocol::Https => self.https.list_matching(request, credential).await,
            Protocol::ObjectStorage => {
                self.object_storage
                    .list_matching(request, credential)
                    .await
            }
        }
    }
}

/// Run a blocking client call on the blocking pool, bounded by `timeout`
pub(crate) async fn run_blocking<T, F>(timeout: Duration, call: F) -> Result<T, AdapterError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AdapterError> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(AdapterError::protocol(format!("adapter task failed: {}", join))),
        Err(_) => Err(AdapterError::timeout(format!(
            "no response within {}ms",
            timeout.as_millis()
        ))),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
