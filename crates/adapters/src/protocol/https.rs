// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTPS adapter
//!
//! Exact names are checked with HEAD. Glob names fetch the directory index and
//! match the `href`s that name files directly inside it.

use super::{run_blocking, AdapterError, ListRequest, NamePattern, ProtocolAdapter};
use crate::secret::Credential;
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use dw_core::RemoteFile;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

#[allow(clippy::expect_used)]
static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"'#?]+)["']"#).expect("constant regex pattern is valid")
});

#[derive(Clone, Copy, Debug, Default)]
pub struct HttpsAdapter;

impl HttpsAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProtocolAdapter for HttpsAdapter {
    async fn list_matching(
        &self,
        request: &ListRequest,
        credential: Option<&Credential>,
    ) -> Result<Vec<RemoteFile>, AdapterError> {
        let request = request.clone();
        let credential = credential.cloned();
        run_blocking(request.timeout, move || {
            list_blocking(&request, credential.as_ref())
        })
        .await
    }
}

/// `https://authority`, or the configured endpoint when one is set
fn base_url(request: &ListRequest) -> String {
    match &request.connection.endpoint {
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None => format!(
            "{}://{}",
            request.protocol.scheme(),
            request.connection.authority()
        ),
    }
}

fn agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    ureq::Agent::new_with_config(config)
}

fn basic_auth(credential: &Credential) -> String {
    let raw = format!("{}:{}", credential.username, credential.secret.expose());
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(raw)
    )
}

fn list_blocking(
    request: &ListRequest,
    credential: Option<&Credential>,
) -> Result<Vec<RemoteFile>, AdapterError> {
    let agent = agent(request.timeout);
    let auth = credential.map(basic_auth);
    let pattern = NamePattern::new(&request.name_pattern);
    let base = base_url(request);

    if pattern.is_exact() {
        let url = format!("{}{}", base, request.file_path(pattern.as_str()));
        return head(&agent, &url, auth.as_deref()).map(|found| found.into_iter().collect());
    }

    let directory = request.directory();
    let index_url = if directory == "/" {
        format!("{}/", base)
    } else {
        format!("{}{}/", base, directory)
    };
    let Some(body) = get_index(&agent, &index_url, auth.as_deref())? else {
        return Ok(Vec::new());
    };

    let mut files = Vec::new();
    for name in index_names(&body, &directory) {
        if !pattern.matches(&name) {
            continue;
        }
        let url = format!("{}{}", index_url, name);
        if let Some(file) = head(&agent, &url, auth.as_deref())? {
            files.push(file);
        }
    }
    Ok(files)
}

/// Names of files directly inside `directory` linked from its index page, deduplicated
pub(crate) fn index_names(body: &str, directory: &str) -> BTreeSet<String> {
    let directory = directory.trim_end_matches('/');
    HREF.captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| name_in_directory(m.as_str(), directory))
        .collect()
}

/// Links to other directories (parents, subdirectories, other hosts' paths) yield None
fn name_in_directory(href: &str, directory: &str) -> Option<String> {
    // Absolute URLs and scheme-relative links keep only their path
    let path = match href.split_once("//") {
        Some((scheme, rest)) if scheme.is_empty() || scheme.ends_with(':') => {
            rest.find('/').map(|i| rest.split_at(i).1)?
        }
        _ => href,
    };
    let path = path.strip_prefix("./").unwrap_or(path);
    let name = match path.rsplit_once('/') {
        None => path,
        Some((parent, name)) if path.starts_with('/') && parent == directory => name,
        Some(_) => return None,
    };
    (!name.is_empty()).then(|| name.to_string())
}

fn head(agent: &ureq::Agent, url: &str, auth: Option<&str>) -> Result<Option<RemoteFile>, AdapterError> {
    let mut call = agent.head(url);
    if let Some(auth) = auth {
        call = call.header("Authorization", auth);
    }
    let response = call.call().map_err(classify)?;
    if !check_status(response.status().as_u16(), url)? {
        return Ok(None);
    }

    let headers = response.headers();
    let mut file = RemoteFile::new(url);
    if let Some(size) = headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        file = file.with_size(size);
    }
    if let Some(modified) = headers
        .get("last-modified")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
    {
        file = file.with_last_modified(modified.with_timezone(&Utc));
    }
    Ok(Some(file))
}

fn get_index(agent: &ureq::Agent, url: &str, auth: Option<&str>) -> Result<Option<String>, AdapterError> {
    let mut call = agent.get(url);
    if let Some(auth) = auth {
        call = call.header("Authorization", auth);
    }
    let mut response = call.call().map_err(classify)?;
    if !check_status(response.status().as_u16(), url)? {
        return Ok(None);
    }
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(classify)?;
    Ok(Some(body))
}

/// Ok(true) for success, Ok(false) for not found
pub(crate) fn check_status(status: u16, url: &str) -> Result<bool, AdapterError> {
    match status {
        200..=299 => Ok(true),
        404 | 410 => Ok(false),
        401 => Err(AdapterError::authentication(format!("{} rejected credentials", url))),
        403 => Err(AdapterError::permission(format!("{} forbidden", url))),
        408 | 504 => Err(AdapterError::timeout(format!("{} returned {}", url, status))),
        other => Err(AdapterError::protocol(format!("{} returned {}", url, other))),
    }
}

fn classify(error: ureq::Error) -> AdapterError {
    match error {
        ureq::Error::Timeout(t) => AdapterError::timeout(format!("timed out: {}", t)),
        ureq::Error::Io(io) => AdapterError::from_io("https", &io),
        other => AdapterError::protocol(other.to_string()),
    }
}

#[cfg(test)]
#[path = "https_tests.rs"]
mod tests;
