// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline runs and their step rows

use crate::id::{FileVersionId, PipelineId, RunId, StepId};
use crate::status::{RunStatus, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One execution attempt of a pipeline against a file version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: RunId,
    pub pipeline_id: PipelineId,
    pub file_version_id: FileVersionId,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineRun {
    /// New run in `processing`
    pub fn new(
        id: RunId,
        pipeline_id: PipelineId,
        file_version_id: FileVersionId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            pipeline_id,
            file_version_id,
            status: RunStatus::Processing,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status of one named step within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunStep {
    pub id: StepId,
    pub pipeline_run_id: RunId,
    pub step: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineRunStep {
    /// New step row in `processing`
    pub fn new(id: StepId, pipeline_run_id: RunId, step: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            pipeline_run_id,
            step,
            status: StepStatus::Processing,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update in place
    pub fn apply(&mut self, update: &StepUpdate, at: DateTime<Utc>) {
        self.status = update.status;
        if let Some(message) = &update.error_message {
            self.error_message = Some(message.clone());
        }
        self.updated_at = at;
    }
}

/// Fields written by `update_run_step`
///
/// A `None` message leaves any previous message in place, so a step reset
/// to `processing` by a retry can still carry its old message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepUpdate {
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StepUpdate {
    pub fn status(status: StepStatus) -> Self {
        Self {
            status,
            error_message: None,
        }
    }

    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Errored,
            error_message: Some(message.into()),
        }
    }

    pub fn warned(message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Warned,
            error_message: Some(message.into()),
        }
    }
}

/// A run joined with its steps, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDetail {
    pub run: PipelineRun,
    pub steps: Vec<PipelineRunStep>,
}

impl RunDetail {
    /// Look up a step row by name
    pub fn step(&self, name: &str) -> Option<&PipelineRunStep> {
        self.steps.iter().find(|s| s.step == name)
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
