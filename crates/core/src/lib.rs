// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dr-core: domain types for the data room pipeline run engine
//!
//! This crate provides:
//! - Identifiers and ID generation
//! - Pipelines, runs, and run steps with their status vocabularies
//! - Operations recorded by the storage layer
//! - A clock abstraction for testable timestamps

pub mod clock;
pub mod id;
pub mod operation;
pub mod pipeline;
pub mod run;
pub mod status;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{
    DataRoomId, FileVersionId, IdGen, PipelineId, RunId, SequentialIdGen, StepId, UuidIdGen,
};
pub use operation::Operation;
pub use pipeline::{Pipeline, StepList, StepsError, DEFAULT_STEPS};
pub use run::{PipelineRun, PipelineRunStep, RunDetail, StepUpdate};
pub use status::{RunStatus, StepStatus};
