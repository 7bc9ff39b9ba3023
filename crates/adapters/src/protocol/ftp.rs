// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FTP adapter

use super::{run_blocking, AdapterError, ListRequest, NamePattern, ProtocolAdapter};
use crate::secret::Credential;
use async_trait::async_trait;
use dw_core::RemoteFile;
use std::net::{SocketAddr, ToSocketAddrs};
use suppaftp::{FtpError, FtpStream};

const DEFAULT_PORT: u16 = 21;
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Lists files with NLST, then asks SIZE and MDTM for each match
#[derive(Clone, Copy, Debug, Default)]
pub struct FtpAdapter;

impl FtpAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProtocolAdapter for FtpAdapter {
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

fn socket_addr(request: &ListRequest) -> Result<SocketAddr, AdapterError> {
    let port = request.connection.port.unwrap_or(DEFAULT_PORT);
    (request.connection.host.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| AdapterError::from_io("resolve host", &e))?
        .next()
        .ok_or_else(|| {
            AdapterError::protocol(format!("no address for {}", request.connection.host))
        })
}

fn list_blocking(
    request: &ListRequest,
    credential: Option<&Credential>,
) -> Result<Vec<RemoteFile>, AdapterError> {
    let addr = socket_addr(request)?;
    let mut ftp = FtpStream::connect_timeout(addr, request.timeout).map_err(classify)?;
    ftp.get_ref()
        .set_read_timeout(Some(request.timeout))
        .map_err(|e| AdapterError::from_io("set read timeout", &e))?;

    let (user, password) = match credential {
        Some(c) => (c.username.as_str(), c.secret.expose()),
        None => (ANONYMOUS_USER, ANONYMOUS_PASSWORD),
    };
    ftp.login(user, password).map_err(classify)?;

    let result = list_directory(&mut ftp, request);
    // The listing outcome matters more than a clean goodbye
    let _ = ftp.quit();
    result
}

fn list_directory(
    ftp: &mut FtpStream,
    request: &ListRequest,
) -> Result<Vec<RemoteFile>, AdapterError> {
    let directory = request.directory();
    let entries = match ftp.nlst(Some(&directory)) {
        Ok(entries) => entries,
        Err(e) if is_missing(&e) => return Ok(Vec::new()),
        Err(e) => return Err(classify(e)),
    };

    let pattern = NamePattern::new(&request.name_pattern);
    let authority = request.connection.authority();
    let scheme = request.protocol.scheme();
    let mut files = Vec::new();
    for entry in entries {
        let name = entry.rsplit('/').next().unwrap_or(&entry);
        if !pattern.matches(name) {
            continue;
        }
        let path = request.file_path(name);
        let mut file = RemoteFile::new(format!("{}://{}{}", scheme, authority, path));
        if let Ok(size) = ftp.size(&path) {
            file = file.with_size(size as u64);
        }
        if let Ok(modified) = ftp.mdtm(&path) {
            file = file.with_last_modified(modified.and_utc());
        }
        files.push(file);
    }
    Ok(files)
}

fn reply_code(error: &FtpError) -> Option<u32> {
    match error {
        FtpError::UnexpectedResponse(response) => Some(response.status.code()),
        _ => None,
    }
}

/// 550 on a listing means the directory is absent or empty
fn is_missing(error: &FtpError) -> bool {
    reply_code(error) == Some(550)
        && !error_text(error).to_ascii_lowercase().contains("permission")
}

fn error_text(error: &FtpError) -> String {
    match error {
        FtpError::UnexpectedResponse(response) => String::from_utf8_lossy(&response.body)
            .trim()
            .to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn classify(error: FtpError) -> AdapterError {
    if let FtpError::ConnectionError(io) = &error {
        return AdapterError::from_io("ftp connection", io);
    }
    let text = error_text(&error);
    match reply_code(&error) {
        Some(530) | Some(532) => AdapterError::authentication(text),
        Some(_) if text.to_ascii_lowercase().contains("permission") => {
            AdapterError::permission(text)
        }
        Some(code) => AdapterError::protocol(format!("{} {}", code, text)),
        None => AdapterError::protocol(text),
    }
}

#[cfg(test)]
#[path = "ftp_tests.rs"]
mod tests;
