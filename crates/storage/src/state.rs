// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use crate::StoreError;
use dr_core::{Operation, Pipeline, PipelineId, PipelineRun, PipelineRunStep, RunId};
use std::collections::HashMap;

/// Rows built by applying operations in order
#[derive(Debug, Default)]
pub struct MaterializedState {
    pub pipelines: HashMap<PipelineId, Pipeline>,
    pub runs: HashMap<RunId, PipelineRun>,
    /// Step rows per run, in declaration order
    pub run_steps: HashMap<RunId, Vec<PipelineRunStep>>,
}

impl MaterializedState {
    /// Rebuild state from a replayed log
    pub fn from_operations(ops: impl IntoIterator<Item = Operation>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(&op);
        }
        state
    }

    /// Check that an operation can be applied
    ///
    /// Called before an operation is made durable, so the log never holds
    /// writes against rows that do not exist.
    pub fn check(&self, op: &Operation) -> Result<(), StoreError> {
        match op {
            Operation::PipelineCreate { pipeline } => {
                if self.pipelines.contains_key(&pipeline.id) {
                    return Err(StoreError::AlreadyExists {
                        kind: "pipeline",
                        id: pipeline.id.to_string(),
                    });
                }
            }

            Operation::RunCreate { run } => {
                if self.runs.contains_key(&run.id) {
                    return Err(StoreError::AlreadyExists {
                        kind: "run",
                        id: run.id.to_string(),
                    });
                }
            }

            Operation::RunUpdate { id, .. } => {
                if !self.runs.contains_key(id) {
                    return Err(StoreError::RunNotFound(id.clone()));
                }
            }

            Operation::RunStepCreate { step } => {
                if !self.runs.contains_key(&step.pipeline_run_id) {
                    return Err(StoreError::RunNotFound(step.pipeline_run_id.clone()));
                }
                if self.find_step(&step.pipeline_run_id, &step.step).is_some() {
                    return Err(StoreError::AlreadyExists {
                        kind: "run step",
                        id: format!("{}/{}", step.pipeline_run_id, step.step),
                    });
                }
            }

            Operation::RunStepUpdate { run_id, step, .. } => {
                if !self.runs.contains_key(run_id) {
                    return Err(StoreError::RunNotFound(run_id.clone()));
                }
                if self.find_step(run_id, step).is_none() {
                    return Err(StoreError::StepNotFound {
                        run_id: run_id.clone(),
                        step: step.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply an operation to update the state
    ///
    /// Updates addressed to missing rows are ignored.
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::PipelineCreate { pipeline } => {
                self.pipelines.insert(pipeline.id.clone(), pipeline.clone());
            }

            Operation::RunCreate { run } => {
                self.runs.insert(run.id.clone(), run.clone());
                self.run_steps.entry(run.id.clone()).or_default();
            }

            Operation::RunUpdate { id, status, at } => {
                if let Some(run) = self.runs.get_mut(id) {
                    run.status = *status;
                    run.updated_at = *at;
                }
            }

            Operation::RunStepCreate { step } => {
                let steps = self
                    .run_steps
                    .entry(step.pipeline_run_id.clone())
                    .or_default();
                match steps.iter_mut().find(|s| s.step == step.step) {
                    Some(existing) => *existing = step.clone(),
                    None => steps.push(step.clone()),
                }
            }

            Operation::RunStepUpdate {
                run_id,
                step,
                update,
                at,
            } => {
                if let Some(row) = self
                    .run_steps
                    .get_mut(run_id)
                    .and_then(|steps| steps.iter_mut().find(|s| &s.step == step))
                {
                    row.apply(update, *at);
                }
            }
        }
    }

    fn find_step(&self, run_id: &RunId, step: &str) -> Option<&PipelineRunStep> {
        self.run_steps
            .get(run_id)
            .and_then(|steps| steps.iter().find(|s| s.step == step))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
