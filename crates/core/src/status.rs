// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run and step status vocabularies
//!
//! A run moves `processing -> {processed, errored}`. A step moves
//! `processing -> {processed, errored, warned}`. Retry puts both back to
//! `processing` on the same rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Processing,
    Processed,
    Errored,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Processing => "processing",
            RunStatus::Processed => "processed",
            RunStatus::Errored => "errored",
        }
    }

    /// Whether the run has finished executing
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Processing)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Processing,
    Processed,
    Errored,
    /// Terminal, but does not fail the run
    Warned,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Processing => "processing",
            StepStatus::Processed => "processed",
            StepStatus::Errored => "errored",
            StepStatus::Warned => "warned",
        }
    }

    /// Whether this step halts the run
    pub fn is_failure(self) -> bool {
        matches!(self, StepStatus::Errored)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
