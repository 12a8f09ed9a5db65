// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage
//!
//! One JSON object per line, each carrying a sequence number. Every append
//! is synced before it returns.

use dr_core::Operation;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write-ahead log for durable operation storage
pub struct Wal {
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path
    ///
    /// A torn final entry left by a crash is cut off so new appends start
    /// on a clean line.
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let scan = Self::scan(path)?;
        if scan.valid_len < file.metadata()?.len() {
            file.set_len(scan.valid_len)?;
        }
        if scan.missing_newline {
            writeln!(file)?;
        }

        let sequence = scan.entries.last().map(|entry| entry.seq).unwrap_or(0);
        Ok(Self { file, sequence })
    }

    /// Append an operation to the log
    ///
    /// On failure the file is cut back to its previous length, so an error
    /// never leaves a half-committed entry behind.
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        self.append_with(op, File::sync_all)
    }

    fn append_with(
        &mut self,
        op: &Operation,
        sync: impl FnOnce(&File) -> io::Result<()>,
    ) -> Result<u64, WalError> {
        let entry = WalEntry {
            seq: self.sequence + 1,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        let len = self.file.metadata()?.len();

        let written = writeln!(self.file, "{}", line).and_then(|()| sync(&self.file));
        if let Err(e) = written {
            if let Err(rollback) = self.file.set_len(len) {
                // The entry may still be on disk; keep seq unique for the next append
                tracing::error!(error = %rollback, "failed to roll back WAL append");
                self.sequence = entry.seq;
            }
            return Err(e.into());
        }

        self.sequence = entry.seq;
        Ok(self.sequence)
    }

    /// Sequence number of the last durable entry
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay all operations from the log
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        Ok(Self::scan(path)?
            .entries
            .into_iter()
            .map(|entry| entry.op)
            .collect())
    }

    fn scan(path: &Path) -> Result<Scan, WalError> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Scan::default()),
            Err(e) => return Err(e.into()),
        };

        let segments: Vec<&[u8]> = content.split_inclusive(|b| *b == b'\n').collect();
        let mut scan = Scan::default();

        for (index, segment) in segments.iter().enumerate() {
            let is_tail = index + 1 == segments.len();
            let line = segment
                .strip_suffix(b"\n")
                .unwrap_or(*segment)
                .trim_ascii_end();
            if line.trim_ascii().is_empty() {
                scan.valid_len += segment.len() as u64;
                continue;
            }
            match serde_json::from_slice::<WalEntry>(line) {
                Ok(entry) => {
                    scan.entries.push(entry);
                    scan.valid_len += segment.len() as u64;
                    scan.missing_newline = is_tail && !segment.ends_with(b"\n");
                }
                // A torn final write from a crash is dropped; anything earlier is corruption
                Err(e) if is_tail => {
                    tracing::warn!(line = index + 1, error = %e, "dropping truncated WAL entry");
                }
                Err(source) => {
                    return Err(WalError::Json {
                        line: index + 1,
                        source,
                    })
                }
            }
        }

        Ok(scan)
    }
}

#[derive(Default)]
struct Scan {
    entries: Vec<WalEntry>,
    /// Byte length of the well-formed prefix
    valid_len: u64,
    missing_newline: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
