// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Pipeline run engine: step registry, bounded work queue, and run state machine

mod engine;
mod error;
mod queue;
mod registry;

pub use engine::{EngineConfig, PipelineEngine, DEFAULT_STEP_DELAY};
pub use error::{EngineError, QueueError};
pub use queue::{TaskHandle, WorkQueue};
pub use registry::{
    handler_fn, FnHandler, SimulatedStep, StepContext, StepFailure, StepHandler, StepOutcome,
    StepRegistry,
};
