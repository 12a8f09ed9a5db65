// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step handlers and the per-engine registry that resolves them

use async_trait::async_trait;
use dr_core::{FileVersionId, PipelineId, RunId, DEFAULT_STEPS};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Inputs handed to a step handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    pub run_id: RunId,
    pub step: String,
    pub file_version_id: FileVersionId,
    pub pipeline_id: PipelineId,
}

/// Successful result of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Processed,
    /// Completed with a note; the run continues
    Warned(String),
}

/// A step's failure reason, stored as the step's error message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StepFailure {
    pub message: String,
}

impl StepFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for StepFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for StepFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Executes the work of one named step
#[async_trait]
pub trait StepHandler: Send + Sync + 'static {
    async fn run(&self, ctx: StepContext) -> Result<StepOutcome, StepFailure>;
}

/// Handler backed by an async closure, see [`handler_fn`]
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a step handler
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(StepContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepOutcome, StepFailure>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> StepHandler for FnHandler<F>
where
    F: Fn(StepContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepOutcome, StepFailure>> + Send + 'static,
{
    async fn run(&self, ctx: StepContext) -> Result<StepOutcome, StepFailure> {
        (self.f)(ctx).await
    }
}

/// Default handler: sleeps, then succeeds
#[derive(Debug, Clone)]
pub struct SimulatedStep {
    delay: Duration,
}

impl SimulatedStep {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl StepHandler for SimulatedStep {
    async fn run(&self, ctx: StepContext) -> Result<StepOutcome, StepFailure> {
        tracing::debug!(run_id = %ctx.run_id, step = %ctx.step, "simulating step");
        tokio::time::sleep(self.delay).await;
        Ok(StepOutcome::Processed)
    }
}

/// Maps step names to handlers
///
/// Names are an open vocabulary: any string may be registered, and a pipeline
/// may declare names that have no handler (they error at execution time).
#[derive(Default, Clone)]
pub struct StepRegistry {
    handlers: HashMap<String, Arc<dyn StepHandler>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a simulated handler for every default step
    pub fn with_defaults(delay: Duration) -> Self {
        let mut registry = Self::new();
        registry.register_defaults(delay);
        registry
    }

    pub fn register_defaults(&mut self, delay: Duration) {
        for step in DEFAULT_STEPS {
            self.set_handler(*step, SimulatedStep::new(delay));
        }
    }

    /// Add or replace the handler for `step`
    pub fn set_handler(&mut self, step: impl Into<String>, handler: impl StepHandler) {
        self.handlers.insert(step.into(), Arc::new(handler));
    }

    pub fn get(&self, step: &str) -> Option<Arc<dyn StepHandler>> {
        self.handlers.get(step).cloned()
    }

    pub fn contains(&self, step: &str) -> bool {
        self.handlers.contains_key(step)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
