// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the run engine

use dr_core::{PipelineId, RunId, StepsError};
use dr_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by engine operations
///
/// Step failures never appear here; they are recorded on the step row.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pipeline not found: {0}")]
    PipelineNotFound(PipelineId),
    #[error("pipeline run not found: {0}")]
    RunNotFound(RunId),
    #[error("pipeline run already queued or executing: {0}")]
    RunActive(RunId),
    #[error("invalid steps for pipeline {pipeline_id}: {source}")]
    InvalidSteps {
        pipeline_id: PipelineId,
        #[source]
        source: StepsError,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PipelineNotFound(_) | Self::RunNotFound(_))
    }
}

/// Errors delivered through a task handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("task abandoned before completion")]
    Abandoned,
}
