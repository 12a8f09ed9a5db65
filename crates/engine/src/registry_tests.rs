// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn ctx(step: &str) -> StepContext {
    StepContext {
        run_id: RunId::new("run-1"),
        step: step.to_string(),
        file_version_id: FileVersionId::new("v-1"),
        pipeline_id: PipelineId::new("p-1"),
    }
}

#[tokio::test]
async fn defaults_cover_every_known_step() {
    let registry = StepRegistry::with_defaults(Duration::ZERO);
    assert_eq!(registry.len(), DEFAULT_STEPS.len());

    for step in DEFAULT_STEPS {
        let handler = registry.get(step).unwrap();
        assert_eq!(handler.run(ctx(step)).await, Ok(StepOutcome::Processed));
    }
}

#[test]
fn unknown_step_has_no_handler() {
    let registry = StepRegistry::with_defaults(Duration::ZERO);
    assert!(registry.get("teleport").is_none());
    assert!(!registry.contains("teleport"));
}

#[tokio::test]
async fn set_handler_overrides_default() {
    let mut registry = StepRegistry::with_defaults(Duration::ZERO);
    registry.set_handler(
        "malware_scan",
        handler_fn(|_ctx| async { Err(StepFailure::new("Malware detected")) }),
    );

    let handler = registry.get("malware_scan").unwrap();
    let err = handler.run(ctx("malware_scan")).await.unwrap_err();
    assert_eq!(err.message, "Malware detected");
    assert_eq!(registry.len(), DEFAULT_STEPS.len());
}

#[tokio::test]
async fn set_handler_accepts_new_names() {
    let mut registry = StepRegistry::new();
    assert!(registry.is_empty());

    registry.set_handler(
        "ocr",
        handler_fn(|ctx: StepContext| async move {
            Ok(StepOutcome::Warned(format!("{} skipped pages", ctx.step)))
        }),
    );

    let handler = registry.get("ocr").unwrap();
    assert_eq!(
        handler.run(ctx("ocr")).await,
        Ok(StepOutcome::Warned("ocr skipped pages".to_string()))
    );
}

#[tokio::test]
async fn simulated_step_waits_for_its_delay() {
    let handler = SimulatedStep::new(Duration::from_millis(20));
    let start = std::time::Instant::now();
    handler.run(ctx("pii_scan")).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[test]
fn failure_converts_from_strings() {
    assert_eq!(StepFailure::from("boom").to_string(), "boom");
    assert_eq!(StepFailure::from(String::from("bang")).message, "bang");
}
