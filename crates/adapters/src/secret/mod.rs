// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution
//!
//! Configurations carry only a [`SecretRef`]. The resolver turns it into a
//! [`Credential`] right before an adapter connects. Secret values never
//! appear in `Debug` or `Display` output.

mod env;

pub use env::{EnvSecretResolver, DEFAULT_PREFIX};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSecretResolver;

use async_trait::async_trait;
use dw_core::SecretRef;
use std::fmt;
use thiserror::Error;

/// Errors from secret resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),
    #[error("secret {0} is malformed, expected username:secret")]
    Malformed(String),
}

/// A secret value that redacts itself in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plaintext, for handing to a protocol client
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// Username plus secret, as handed to an adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub secret: Secret,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: Secret) -> Self {
        Self {
            username: username.into(),
            secret,
        }
    }

    /// Parse a `username:secret` value; the secret may contain colons
    pub fn parse(reference: &SecretRef, raw: &str) -> Result<Self, SecretError> {
        let (username, secret) = raw
            .split_once(':')
            .ok_or_else(|| SecretError::Malformed(reference.to_string()))?;
        Ok(Self::new(username, Secret::new(secret)))
    }
}

/// Looks up credentials by reference
#[async_trait]
pub trait SecretResolver: Clone + Send + Sync + 'static {
    async fn resolve(&self, reference: &SecretRef) -> Result<Credential, SecretError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
