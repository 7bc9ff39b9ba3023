// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only journal of store operations

use crate::error::StorageError;
use crate::state::{StoreOp, StoreState};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Durable, line-delimited JSON log of [`StoreOp`]s
pub struct Journal {
    path: PathBuf,
    file: File,
    sequence: u64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct JournalEntry {
    seq: u64,
    op: StoreOp,
}

impl Journal {
    /// Open or create a journal at the given path
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        // Count existing entries to set sequence number
        let reader = BufReader::new(File::open(path)?);
        let sequence = reader
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.is_empty())
            .count() as u64;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence,
        })
    }

    /// Append an operation and sync it to disk
    pub fn append(&mut self, op: &StoreOp) -> Result<u64, StorageError> {
        self.sequence += 1;
        let entry = JournalEntry {
            seq: self.sequence,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay all operations from the log
    pub fn replay(path: &Path) -> Result<Vec<StoreOp>, StorageError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut ops = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let entry: JournalEntry = serde_json::from_str(&line)?;
            ops.push(entry.op);
        }

        Ok(ops)
    }

    /// Rewrite the journal as the minimal set of operations producing `state`
    ///
    /// Writes to a sibling temp file and renames it over the journal.
    pub fn compact(&mut self, state: &StoreState) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("compact");
        let mut sequence = 0;
        {
            let mut out = File::create(&tmp)?;
            let ops = state
                .configurations
                .values()
                .map(|c| StoreOp::ConfigurationSave {
                    configuration: c.clone(),
                })
                .chain(state.executions.values().map(|e| StoreOp::ExecutionPut {
                    execution: e.clone(),
                }))
                .chain(
                    state
                        .discoveries
                        .values()
                        .map(|f| StoreOp::DiscoveryCreate { file: f.clone() }),
                );
            for op in ops {
                sequence += 1;
                let line = serde_json::to_string(&JournalEntry { seq: sequence, op })?;
                writeln!(out, "{}", line)?;
            }
            out.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        self.file = OpenOptions::new().append(true).read(true).open(&self.path)?;
        self.sequence = sequence;
        Ok(())
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
