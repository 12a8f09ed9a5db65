// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    processing = { StepStatus::Processing, "processing", false },
    processed = { StepStatus::Processed, "processed", false },
    errored = { StepStatus::Errored, "errored", true },
    warned = { StepStatus::Warned, "warned", false },
)]
fn step_status_vocabulary(status: StepStatus, text: &str, failure: bool) {
    assert_eq!(status.to_string(), text);
    assert_eq!(status.is_failure(), failure);
}

#[parameterized(
    processing = { RunStatus::Processing, "processing", false },
    processed = { RunStatus::Processed, "processed", true },
    errored = { RunStatus::Errored, "errored", true },
)]
fn run_status_vocabulary(status: RunStatus, text: &str, terminal: bool) {
    assert_eq!(status.to_string(), text);
    assert_eq!(status.is_terminal(), terminal);
}

#[test]
fn warned_is_not_a_run_status() {
    assert!(serde_json::from_str::<RunStatus>("\"warned\"").is_err());
}

#[test]
fn statuses_serialize_lowercase() {
    assert_eq!(
        serde_json::to_string(&StepStatus::Warned).unwrap(),
        "\"warned\""
    );
    assert_eq!(
        serde_json::from_str::<RunStatus>("\"errored\"").unwrap(),
        RunStatus::Errored
    );
}
