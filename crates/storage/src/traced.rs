// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::{RunStore, StoreError};
use chrono::{DateTime, Utc};
use dr_core::{
    Pipeline, PipelineId, PipelineRun, PipelineRunStep, RunId, RunStatus, StepUpdate,
};
use std::time::Instant;

/// Wrapper that adds tracing to any RunStore
///
/// Writes log at info with elapsed time; reads log at debug.
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn log_write<T>(result: &Result<T, StoreError>, start: Instant, done: &str) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(_) => tracing::info!(elapsed_ms, "{}", done),
        Err(e) => tracing::error!(elapsed_ms, error = %e, "write failed"),
    }
}

impl<S: RunStore> RunStore for TracedStore<S> {
    fn create_pipeline(&self, pipeline: Pipeline) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.create_pipeline", pipeline_id = %pipeline.id);
        let _guard = span.enter();

        let start = Instant::now();
        let result = self.inner.create_pipeline(pipeline);
        log_write(&result, start, "pipeline created");
        result
    }

    fn get_pipeline(&self, id: &PipelineId) -> Result<Option<Pipeline>, StoreError> {
        let result = self.inner.get_pipeline(id);
        if let Ok(None) = &result {
            tracing::debug!(pipeline_id = %id, "pipeline not found");
        }
        result
    }

    fn create_run(&self, run: PipelineRun) -> Result<(), StoreError> {
        let span = tracing::info_span!(
            "store.create_run",
            run_id = %run.id,
            pipeline_id = %run.pipeline_id
        );
        let _guard = span.enter();

        let start = Instant::now();
        let result = self.inner.create_run(run);
        log_write(&result, start, "run created");
        result
    }

    fn update_run(
        &self,
        id: &RunId,
        status: RunStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.update_run", run_id = %id, %status);
        let _guard = span.enter();

        let start = Instant::now();
        let result = self.inner.update_run(id, status, at);
        log_write(&result, start, "run updated");
        result
    }

    fn get_run(&self, id: &RunId) -> Result<Option<PipelineRun>, StoreError> {
        let result = self.inner.get_run(id);
        if let Ok(None) = &result {
            tracing::debug!(run_id = %id, "run not found");
        }
        result
    }

    fn list_runs(&self) -> Result<Vec<PipelineRun>, StoreError> {
        self.inner.list_runs()
    }

    fn create_run_step(&self, step: PipelineRunStep) -> Result<(), StoreError> {
        let span = tracing::info_span!(
            "store.create_run_step",
            run_id = %step.pipeline_run_id,
            step = %step.step
        );
        let _guard = span.enter();

        let start = Instant::now();
        let result = self.inner.create_run_step(step);
        log_write(&result, start, "run step created");
        result
    }

    fn update_run_step(
        &self,
        run_id: &RunId,
        step: &str,
        update: StepUpdate,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let span = tracing::info_span!(
            "store.update_run_step",
            run_id = %run_id,
            step,
            status = %update.status
        );
        let _guard = span.enter();

        if let Some(message) = &update.error_message {
            tracing::debug!(message, "recording step message");
        }

        let start = Instant::now();
        let result = self.inner.update_run_step(run_id, step, update, at);
        log_write(&result, start, "run step updated");
        result
    }

    fn list_run_steps(&self, run_id: &RunId) -> Result<Vec<PipelineRunStep>, StoreError> {
        self.inner.list_run_steps(run_id)
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
