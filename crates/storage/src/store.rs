// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence gateway used by the run engine

use crate::{MaterializedState, StoreError, Wal};
use chrono::{DateTime, Utc};
use dr_core::{
    Operation, Pipeline, PipelineId, PipelineRun, PipelineRunStep, RunId, RunStatus, StepUpdate,
};
use std::path::Path;
use std::sync::Mutex;

/// Durable store for pipelines, runs, and run steps
///
/// Calls are synchronous. Implementations must tolerate concurrent callers;
/// the engine takes no locks of its own around a sequence of calls.
pub trait RunStore: Send + Sync + 'static {
    fn create_pipeline(&self, pipeline: Pipeline) -> Result<(), StoreError>;

    fn get_pipeline(&self, id: &PipelineId) -> Result<Option<Pipeline>, StoreError>;

    fn create_run(&self, run: PipelineRun) -> Result<(), StoreError>;

    fn update_run(
        &self,
        id: &RunId,
        status: RunStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn get_run(&self, id: &RunId) -> Result<Option<PipelineRun>, StoreError>;

    /// All runs, oldest first
    fn list_runs(&self) -> Result<Vec<PipelineRun>, StoreError>;

    fn create_run_step(&self, step: PipelineRunStep) -> Result<(), StoreError>;

    fn update_run_step(
        &self,
        run_id: &RunId,
        step: &str,
        update: StepUpdate,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Step rows of a run in declaration order; empty for unknown runs
    fn list_run_steps(&self, run_id: &RunId) -> Result<Vec<PipelineRunStep>, StoreError>;
}

/// Store backed by materialized state, optionally journaled to a WAL
pub struct StateStore {
    wal: Option<Mutex<Wal>>,
    state: Mutex<MaterializedState>,
}

impl StateStore {
    /// Volatile store, used by tests and embedders without a state directory
    pub fn in_memory() -> Self {
        Self {
            wal: None,
            state: Mutex::new(MaterializedState::default()),
        }
    }

    /// Open a WAL-backed store, replaying existing entries
    pub fn open(wal_path: &Path) -> Result<Self, StoreError> {
        let wal = Wal::open(wal_path)?;
        let state = MaterializedState::from_operations(Wal::replay(wal_path)?);

        tracing::info!(
            path = %wal_path.display(),
            sequence = wal.sequence(),
            pipelines = state.pipelines.len(),
            runs = state.runs.len(),
            "store opened"
        );

        Ok(Self {
            wal: Some(Mutex::new(wal)),
            state: Mutex::new(state),
        })
    }

    /// Validate, journal, then apply an operation
    fn persist(&self, op: Operation) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.check(&op)?;
        if let Some(wal) = &self.wal {
            wal.lock().unwrap_or_else(|e| e.into_inner()).append(&op)?;
        }
        state.apply(&op);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&MaterializedState) -> T) -> T {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }
}

impl RunStore for StateStore {
    fn create_pipeline(&self, pipeline: Pipeline) -> Result<(), StoreError> {
        self.persist(Operation::PipelineCreate { pipeline })
    }

    fn get_pipeline(&self, id: &PipelineId) -> Result<Option<Pipeline>, StoreError> {
        Ok(self.read(|state| state.pipelines.get(id).cloned()))
    }

    fn create_run(&self, run: PipelineRun) -> Result<(), StoreError> {
        self.persist(Operation::RunCreate { run })
    }

    fn update_run(
        &self,
        id: &RunId,
        status: RunStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::RunUpdate {
            id: id.clone(),
            status,
            at,
        })
    }

    fn get_run(&self, id: &RunId) -> Result<Option<PipelineRun>, StoreError> {
        Ok(self.read(|state| state.runs.get(id).cloned()))
    }

    fn list_runs(&self) -> Result<Vec<PipelineRun>, StoreError> {
        let mut runs: Vec<PipelineRun> = self.read(|state| state.runs.values().cloned().collect());
        runs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(runs)
    }

    fn create_run_step(&self, step: PipelineRunStep) -> Result<(), StoreError> {
        self.persist(Operation::RunStepCreate { step })
    }

    fn update_run_step(
        &self,
        run_id: &RunId,
        step: &str,
        update: StepUpdate,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::RunStepUpdate {
            run_id: run_id.clone(),
            step: step.to_string(),
            update,
            at,
        })
    }

    fn list_run_steps(&self, run_id: &RunId) -> Result<Vec<PipelineRunStep>, StoreError> {
        Ok(self.read(|state| state.run_steps.get(run_id).cloned().unwrap_or_default()))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
