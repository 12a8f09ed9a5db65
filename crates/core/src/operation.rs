// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use crate::id::RunId;
use crate::pipeline::Pipeline;
use crate::run::{PipelineRun, PipelineRunStep, StepUpdate};
use crate::status::RunStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Register a pipeline definition
    PipelineCreate { pipeline: Pipeline },

    /// Insert a run row
    RunCreate { run: PipelineRun },

    /// Overwrite a run's status
    RunUpdate {
        id: RunId,
        status: RunStatus,
        at: DateTime<Utc>,
    },

    /// Insert a step row
    RunStepCreate { step: PipelineRunStep },

    /// Update a step row, addressed by run and step name
    RunStepUpdate {
        run_id: RunId,
        step: String,
        update: StepUpdate,
        at: DateTime<Utc>,
    },
}

impl Operation {
    /// Short name for log fields
    pub fn name(&self) -> &'static str {
        match self {
            Operation::PipelineCreate { .. } => "pipeline_create",
            Operation::RunCreate { .. } => "run_create",
            Operation::RunUpdate { .. } => "run_update",
            Operation::RunStepCreate { .. } => "run_step_create",
            Operation::RunStepUpdate { .. } => "run_step_update",
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
