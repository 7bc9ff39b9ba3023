// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secrets read from the process environment

use super::{Credential, SecretError, SecretResolver};
use async_trait::async_trait;
use dw_core::SecretRef;

/// Variable prefix used by [`EnvSecretResolver::default`]
pub const DEFAULT_PREFIX: &str = "DW_SECRET_";

/// Resolves `ref` from the variable `<PREFIX><REF>`
///
/// The reference is upper-cased and every character outside `[A-Z0-9_]`
/// becomes `_`, so `partner-ftp` reads `DW_SECRET_PARTNER_FTP`. The value is
/// `username:secret`.
#[derive(Clone, Debug)]
pub struct EnvSecretResolver {
    prefix: String,
}

impl Default for EnvSecretResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvSecretResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, reference: &SecretRef) -> String {
        let suffix: String = reference
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

#[async_trait]
impl SecretResolver for EnvSecretResolver {
    async fn resolve(&self, reference: &SecretRef) -> Result<Credential, SecretError> {
        let name = self.variable_name(reference);
        let raw = std::env::var(&name).map_err(|_| SecretError::NotFound(reference.to_string()))?;
        Credential::parse(reference, &raw)
    }
}
