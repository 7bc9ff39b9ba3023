// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3-compatible object storage adapter
//!
//! The connection host names the bucket. The path pattern is a key prefix
//! listed one level deep.

use super::{AdapterError, ListRequest, NamePattern, ProtocolAdapter};
use crate::secret::Credential;
use async_trait::async_trait;
use dw_core::RemoteFile;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{ClientOptions, Error as ObjectStoreError, ObjectStore};

#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectStorageAdapter;

impl ObjectStorageAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn build_store(
    request: &ListRequest,
    credential: Option<&Credential>,
) -> Result<AmazonS3, AdapterError> {
    let settings = &request.connection;
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(settings.host.clone())
        .with_client_options(ClientOptions::new().with_timeout(request.timeout));

    if let Some(region) = &settings.region {
        builder = builder.with_region(region.clone());
    }
    if let Some(endpoint) = &settings.endpoint {
        builder = builder
            .with_endpoint(endpoint.clone())
            .with_allow_http(endpoint.starts_with("http://"));
    }
    builder = match credential {
        Some(c) => builder
            .with_access_key_id(c.username.clone())
            .with_secret_access_key(c.secret.expose().to_string()),
        None => builder.with_skip_signature(true),
    };

    builder
        .build()
        .map_err(|e| AdapterError::protocol(format!("invalid object storage settings: {}", e)))
}

/// Key prefix for a directory: `a/b/`, or the bucket root
pub(crate) fn prefix(request: &ListRequest) -> Path {
    Path::from(request.path.trim_matches('/'))
}

#[async_trait]
impl ProtocolAdapter for ObjectStorageAdapter {
    async fn list_matching(
        &self,
        request: &ListRequest,
        credential: Option<&Credential>,
    ) -> Result<Vec<RemoteFile>, AdapterError> {
        let store = build_store(request, credential)?;
        let prefix = prefix(request);
        let listing = tokio::time::timeout(
            request.timeout,
            store.list_with_delimiter(Some(&prefix)),
        )
        .await
        .map_err(|_| {
            AdapterError::timeout(format!(
                "no listing within {}ms",
                request.timeout.as_millis()
            ))
        })?;

        let listing = match listing {
            Ok(listing) => listing,
            Err(ObjectStoreError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(classify(e)),
        };

        let pattern = NamePattern::new(&request.name_pattern);
        let bucket = &request.connection.host;
        let scheme = request.protocol.scheme();
        let files = listing
            .objects
            .into_iter()
            .filter(|meta| {
                meta.location
                    .filename()
                    .is_some_and(|name| pattern.matches(name))
            })
            .map(|meta| {
                let mut file = RemoteFile::new(format!("{}://{}/{}", scheme, bucket, meta.location))
                    .with_last_modified(meta.last_modified);
                if let Ok(size) = u64::try_from(meta.size) {
                    file = file.with_size(size);
                }
                file
            })
            .collect();
        Ok(files)
    }
}

pub(crate) fn classify(error: ObjectStoreError) -> AdapterError {
    match error {
        ObjectStoreError::PermissionDenied { .. } => AdapterError::permission(error.to_string()),
        ObjectStoreError::Unauthenticated { .. } => {
            AdapterError::authentication(error.to_string())
        }
        other => {
            let text = other.to_string();
            let lower = text.to_ascii_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                AdapterError::timeout(text)
            } else {
                AdapterError::protocol(text)
            }
        }
    }
}

#[cfg(test)]
#[path = "object_storage_tests.rs"]
mod tests;
