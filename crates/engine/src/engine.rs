// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline run state machine

use crate::registry::{StepContext, StepHandler, StepOutcome, StepRegistry};
use crate::{EngineError, WorkQueue};
use dr_core::{
    Clock, DataRoomId, FileVersionId, IdGen, Pipeline, PipelineId, PipelineRun, PipelineRunStep,
    RunDetail, RunId, RunStatus, StepId, StepList, StepStatus, StepUpdate,
};
use dr_storage::{RunStore, StoreError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Simulated duration of each default step
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);

const UNKNOWN_ERROR: &str = "Unknown error";

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum runs executing at once
    pub concurrency: usize,
    /// Delay used by the default simulated step handlers
    pub default_step_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            default_step_delay: DEFAULT_STEP_DELAY,
        }
    }
}

/// Starts, retries, and reports pipeline runs
///
/// Start and retry write the run and its step rows synchronously, then hand
/// execution to the work queue and return. Progress is only observable by
/// re-reading the run.
pub struct PipelineEngine<S, C, I> {
    store: Arc<S>,
    registry: Arc<RwLock<StepRegistry>>,
    queue: WorkQueue,
    active: ActiveRuns,
    clock: C,
    id_gen: I,
}

impl<S, C, I> PipelineEngine<S, C, I>
where
    S: RunStore,
    C: Clock,
    I: IdGen,
{
    pub fn new(store: Arc<S>, clock: C, id_gen: I, config: EngineConfig) -> Self {
        Self {
            store,
            registry: Arc::new(RwLock::new(StepRegistry::with_defaults(
                config.default_step_delay,
            ))),
            queue: WorkQueue::new(config.concurrency),
            active: ActiveRuns::default(),
            clock,
            id_gen,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The queue runs execute on; exposed for pause/start/clear
    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Override or add the handler for one step name
    ///
    /// Applies to steps that start after the call, including in queued runs.
    pub fn set_handler(&self, step: impl Into<String>, handler: impl StepHandler) {
        self.registry
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .set_handler(step, handler);
    }

    /// Whether the run is queued or executing in this engine
    pub fn is_run_active(&self, run_id: &RunId) -> bool {
        self.active.contains(run_id)
    }

    /// Wait until no run is executing or queued
    pub async fn wait_idle(&self) {
        self.queue.on_idle().await
    }

    /// Register a pipeline; its steps must decode to a duplicate-free list
    pub fn create_pipeline(
        &self,
        data_room_id: DataRoomId,
        name: impl Into<String>,
        steps: StepList,
    ) -> Result<Pipeline, EngineError> {
        let pipeline = Pipeline::new(
            PipelineId::new(self.id_gen.next()),
            data_room_id,
            name,
            steps,
            self.clock.now(),
        );
        pipeline
            .step_names()
            .map_err(|source| EngineError::InvalidSteps {
                pipeline_id: pipeline.id.clone(),
                source,
            })?;
        self.store.create_pipeline(pipeline.clone())?;
        Ok(pipeline)
    }

    pub fn get_pipeline(&self, id: &PipelineId) -> Result<Option<Pipeline>, EngineError> {
        Ok(self.store.get_pipeline(id)?)
    }

    /// Create a run with one `processing` row per declared step and queue it
    ///
    /// Fails with `PipelineNotFound` before anything is written.
    pub fn start_pipeline_run(
        &self,
        pipeline_id: &PipelineId,
        file_version_id: &FileVersionId,
    ) -> Result<RunId, EngineError> {
        let pipeline = self.load_pipeline(pipeline_id)?;
        let steps = decode_steps(&pipeline)?;

        let now = self.clock.now();
        let run_id = RunId::new(self.id_gen.next());
        let claim = self.claim(&run_id)?;
        self.store.create_run(PipelineRun::new(
            run_id.clone(),
            pipeline_id.clone(),
            file_version_id.clone(),
            now,
        ))?;
        for step in &steps {
            self.store.create_run_step(PipelineRunStep::new(
                StepId::new(self.id_gen.next()),
                run_id.clone(),
                step.clone(),
                now,
            ))?;
        }

        tracing::info!(
            %run_id,
            %pipeline_id,
            %file_version_id,
            steps = steps.len(),
            "pipeline run created"
        );
        self.enqueue(
            claim,
            pipeline_id.clone(),
            file_version_id.clone(),
            steps,
        );
        Ok(run_id)
    }

    /// Reset a run and every declared step to `processing`, then re-run from the top
    ///
    /// Existing error messages are kept until a step records a new one. Steps
    /// added to the pipeline since the run was created get new rows. A run
    /// still queued or executing here is rejected with `RunActive`; runs left
    /// `processing` by an earlier process can be retried.
    pub fn retry_pipeline_run(&self, run_id: &RunId) -> Result<(), EngineError> {
        let run = self
            .store
            .get_run(run_id)?
            .ok_or_else(|| EngineError::RunNotFound(run_id.clone()))?;
        let claim = self.claim(run_id)?;
        let pipeline = self.load_pipeline(&run.pipeline_id)?;
        let steps = decode_steps(&pipeline)?;

        let now = self.clock.now();
        self.store.update_run(run_id, RunStatus::Processing, now)?;

        let existing = self.store.list_run_steps(run_id)?;
        for step in &steps {
            if existing.iter().any(|row| &row.step == step) {
                self.store.update_run_step(
                    run_id,
                    step,
                    StepUpdate::status(StepStatus::Processing),
                    now,
                )?;
            } else {
                self.store.create_run_step(PipelineRunStep::new(
                    StepId::new(self.id_gen.next()),
                    run_id.clone(),
                    step.clone(),
                    now,
                ))?;
            }
        }

        tracing::info!(
            %run_id,
            previous = %run.status,
            steps = steps.len(),
            "pipeline run retried"
        );
        self.enqueue(claim, run.pipeline_id, run.file_version_id, steps);
        Ok(())
    }

    /// The run and its steps, or `None` for an unknown id
    pub fn get_pipeline_run(&self, run_id: &RunId) -> Result<Option<RunDetail>, EngineError> {
        let Some(run) = self.store.get_run(run_id)? else {
            return Ok(None);
        };
        let steps = self.store.list_run_steps(run_id)?;
        Ok(Some(RunDetail { run, steps }))
    }

    fn load_pipeline(&self, id: &PipelineId) -> Result<Pipeline, EngineError> {
        self.store
            .get_pipeline(id)?
            .ok_or_else(|| EngineError::PipelineNotFound(id.clone()))
    }

    fn claim(&self, run_id: &RunId) -> Result<ActiveRun, EngineError> {
        self.active
            .claim(run_id)
            .ok_or_else(|| EngineError::RunActive(run_id.clone()))
    }

    fn enqueue(
        &self,
        claim: ActiveRun,
        pipeline_id: PipelineId,
        file_version_id: FileVersionId,
        steps: Vec<String>,
    ) {
        let run_id = claim.run_id.clone();
        let span = tracing::info_span!("pipeline_run", %run_id);
        let execution = RunExecution {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            clock: self.clock.clone(),
            run_id,
            _claim: claim,
            pipeline_id,
            file_version_id,
            steps,
        };
        // Fire-and-forget: the execution records its own outcome
        let _ = self.queue.submit(execution.run().instrument(span));
    }
}

fn decode_steps(pipeline: &Pipeline) -> Result<Vec<String>, EngineError> {
    pipeline
        .step_names()
        .map_err(|source| EngineError::InvalidSteps {
            pipeline_id: pipeline.id.clone(),
            source,
        })
}

/// Runs queued or executing in this process
#[derive(Clone, Default)]
struct ActiveRuns(Arc<Mutex<HashSet<RunId>>>);

impl ActiveRuns {
    /// `None` if the run is already active
    fn claim(&self, run_id: &RunId) -> Option<ActiveRun> {
        let mut runs = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if !runs.insert(run_id.clone()) {
            return None;
        }
        Some(ActiveRun {
            runs: self.clone(),
            run_id: run_id.clone(),
        })
    }

    fn contains(&self, run_id: &RunId) -> bool {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(run_id)
    }
}

/// Marks a run active until the execution ends or is dropped from the queue
struct ActiveRun {
    runs: ActiveRuns,
    run_id: RunId,
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.runs
            .0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.run_id);
    }
}

/// One queued pass over a run's steps
struct RunExecution<S, C> {
    store: Arc<S>,
    registry: Arc<RwLock<StepRegistry>>,
    clock: C,
    run_id: RunId,
    _claim: ActiveRun,
    pipeline_id: PipelineId,
    file_version_id: FileVersionId,
    steps: Vec<String>,
}

impl<S: RunStore, C: Clock> RunExecution<S, C> {
    async fn run(self) {
        let start = Instant::now();
        match self.execute().await {
            Ok(status) => tracing::info!(
                %status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "pipeline run finished"
            ),
            Err(e) => tracing::error!(
                error = %e,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "pipeline run aborted"
            ),
        }
    }

    /// Run steps in order, stopping at the first failure
    async fn execute(&self) -> Result<RunStatus, StoreError> {
        let mut failed = false;

        for step in &self.steps {
            let start = Instant::now();
            let update = match self.run_step(step).await {
                Ok(StepOutcome::Processed) => StepUpdate::status(StepStatus::Processed),
                Ok(StepOutcome::Warned(message)) => StepUpdate::warned(message),
                Err(message) => StepUpdate::errored(message),
            };
            let status = update.status;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &update.error_message {
                Some(message) if status.is_failure() => {
                    tracing::warn!(step, %status, elapsed_ms, message, "step failed")
                }
                Some(message) => tracing::info!(step, %status, elapsed_ms, message, "step finished"),
                None => tracing::info!(step, %status, elapsed_ms, "step finished"),
            }

            self.store
                .update_run_step(&self.run_id, step, update, self.clock.now())?;

            if status.is_failure() {
                failed = true;
                break;
            }
        }

        let status = if failed {
            RunStatus::Errored
        } else {
            RunStatus::Processed
        };
        self.store.update_run(&self.run_id, status, self.clock.now())?;
        Ok(status)
    }

    /// Invoke the step's handler; a missing handler or panic is a failure
    async fn run_step(&self, step: &str) -> Result<StepOutcome, String> {
        let handler = self
            .registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(step);
        let Some(handler) = handler else {
            return Err(format!("No handler for step: {}", step));
        };

        let ctx = StepContext {
            run_id: self.run_id.clone(),
            step: step.to_string(),
            file_version_id: self.file_version_id.clone(),
            pipeline_id: self.pipeline_id.clone(),
        };
        let task = async move { handler.run(ctx).await }.instrument(tracing::Span::current());
        let result = match tokio::spawn(task).await {
            Ok(result) => result.map_err(|failure| failure.message),
            Err(e) => Err(panic_message(e)),
        };
        result.map_err(|message| {
            if message.is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                message
            }
        })
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    let Ok(payload) = err.try_into_panic() else {
        return UNKNOWN_ERROR.to_string();
    };
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        UNKNOWN_ERROR.to_string()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
