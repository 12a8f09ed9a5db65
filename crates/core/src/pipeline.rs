// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline definitions
//!
//! A pipeline is an ordered list of step names attached to a data room.
//! The order is the execution contract; the engine never reorders it.

use crate::id::{DataRoomId, PipelineId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Step names the default registry knows how to simulate
pub const DEFAULT_STEPS: &[&str] = &[
    "malware_scan",
    "pii_scan",
    "pii_review",
    "versioning",
    "data_validation",
    "ingestion",
    "control_checks",
];

/// Errors decoding a pipeline's step list
#[derive(Debug, Error)]
pub enum StepsError {
    #[error("malformed step list: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("duplicate step in pipeline: {0}")]
    Duplicate(String),
}

/// Step list as handed back by persistence
///
/// Rows written by older clients hold the list as a JSON-encoded string;
/// newer rows hold the decoded sequence. Both decode to the same list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepList {
    Decoded(Vec<String>),
    Encoded(String),
}

impl StepList {
    /// Decode to the ordered list of step names
    pub fn decode(&self) -> Result<Vec<String>, StepsError> {
        let steps: Vec<String> = match self {
            StepList::Decoded(steps) => steps.clone(),
            StepList::Encoded(raw) => serde_json::from_str(raw)?,
        };

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.as_str()) {
                return Err(StepsError::Duplicate(step.clone()));
            }
        }

        Ok(steps)
    }
}

impl From<Vec<String>> for StepList {
    fn from(steps: Vec<String>) -> Self {
        StepList::Decoded(steps)
    }
}

impl From<&[&str]> for StepList {
    fn from(steps: &[&str]) -> Self {
        StepList::Decoded(steps.iter().map(|s| s.to_string()).collect())
    }
}

/// A pipeline definition (read-only to the engine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub data_room_id: DataRoomId,
    pub name: String,
    pub steps: StepList,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pipeline {
    pub fn new(
        id: impl Into<PipelineId>,
        data_room_id: impl Into<DataRoomId>,
        name: impl Into<String>,
        steps: impl Into<StepList>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            data_room_id: data_room_id.into(),
            name: name.into(),
            steps: steps.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Ordered step names this pipeline declares
    pub fn step_names(&self) -> Result<Vec<String>, StepsError> {
        self.steps.decode()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
