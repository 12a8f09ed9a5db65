// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the store

use crate::wal::WalError;
use dr_core::RunId;
use thiserror::Error;

/// Errors returned by [`crate::RunStore`] implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Wal(#[from] WalError),
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    #[error("step {step} not found in run {run_id}")]
    StepNotFound { run_id: RunId, step: String },
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },
}
