// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{handler_fn, StepFailure};
use dr_core::{FakeClock, SequentialIdGen};
use dr_storage::StateStore;
use tracing_subscriber::fmt::MakeWriter;

type TestEngine = PipelineEngine<StateStore, FakeClock, SequentialIdGen>;

fn setup() -> (TestEngine, FakeClock) {
    let clock = FakeClock::new();
    let engine = PipelineEngine::new(
        Arc::new(StateStore::in_memory()),
        clock.clone(),
        SequentialIdGen::new("id"),
        EngineConfig {
            concurrency: 1,
            default_step_delay: Duration::ZERO,
        },
    );
    (engine, clock)
}

fn pipeline(engine: &TestEngine, steps: &[&str]) -> PipelineId {
    engine
        .create_pipeline(DataRoomId::new("room-1"), "intake", StepList::from(steps))
        .unwrap()
        .id
}

#[test]
fn default_config() {
    let config = EngineConfig::default();
    assert_eq!(config.concurrency, 1);
    assert_eq!(config.default_step_delay, Duration::from_millis(100));
}

#[test]
fn create_pipeline_rejects_duplicate_steps() {
    let (engine, _) = setup();
    let err = engine
        .create_pipeline(
            DataRoomId::new("room-1"),
            "dupes",
            StepList::from(&["pii_scan", "pii_scan"][..]),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSteps { .. }));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn start_writes_rows_before_execution() {
    let (engine, _) = setup();
    let pipeline_id = pipeline(&engine, &["malware_scan", "pii_scan"]);

    engine.queue().pause();
    let run_id = engine
        .start_pipeline_run(&pipeline_id, &FileVersionId::new("v-1"))
        .unwrap();

    let detail = engine.get_pipeline_run(&run_id).unwrap().unwrap();
    assert_eq!(detail.run.status, RunStatus::Processing);
    let names: Vec<_> = detail.steps.iter().map(|s| s.step.as_str()).collect();
    assert_eq!(names, vec!["malware_scan", "pii_scan"]);
    assert!(detail
        .steps
        .iter()
        .all(|s| s.status == StepStatus::Processing));
    assert_eq!(engine.queue().size(), 1);

    engine.queue().start();
    engine.wait_idle().await;
}

#[tokio::test]
async fn timestamps_follow_the_clock() {
    let (engine, clock) = setup();
    let pipeline_id = pipeline(&engine, &["malware_scan"]);

    engine.queue().pause();
    let run_id = engine
        .start_pipeline_run(&pipeline_id, &FileVersionId::new("v-1"))
        .unwrap();
    let created = clock.now();

    clock.advance(chrono::Duration::seconds(30));
    engine.queue().start();
    engine.wait_idle().await;

    let detail = engine.get_pipeline_run(&run_id).unwrap().unwrap();
    assert_eq!(detail.run.created_at, created);
    assert_eq!(detail.run.updated_at, created + chrono::Duration::seconds(30));
    assert_eq!(detail.steps[0].updated_at, created + chrono::Duration::seconds(30));
}

#[tokio::test]
async fn empty_failure_message_becomes_unknown_error() {
    let (engine, _) = setup();
    engine.set_handler(
        "pii_scan",
        handler_fn(|_ctx| async { Err(StepFailure::new("")) }),
    );
    let pipeline_id = pipeline(&engine, &["pii_scan"]);

    let run_id = engine
        .start_pipeline_run(&pipeline_id, &FileVersionId::new("v-1"))
        .unwrap();
    engine.wait_idle().await;

    let detail = engine.get_pipeline_run(&run_id).unwrap().unwrap();
    let step = detail.step("pii_scan").unwrap();
    assert_eq!(step.status, StepStatus::Errored);
    assert_eq!(step.error_message.as_deref(), Some("Unknown error"));
}

#[tokio::test]
async fn panicking_handler_is_recorded_as_failure() {
    let (engine, _) = setup();
    engine.set_handler(
        "versioning",
        handler_fn(|_ctx| async {
            if true {
                panic!("index out of range");
            }
            Ok(StepOutcome::Processed)
        }),
    );
    let pipeline_id = pipeline(&engine, &["versioning", "ingestion"]);

    let run_id = engine
        .start_pipeline_run(&pipeline_id, &FileVersionId::new("v-1"))
        .unwrap();
    engine.wait_idle().await;

    let detail = engine.get_pipeline_run(&run_id).unwrap().unwrap();
    assert_eq!(detail.run.status, RunStatus::Errored);
    let step = detail.step("versioning").unwrap();
    assert_eq!(step.error_message.as_deref(), Some("index out of range"));
    assert_eq!(
        detail.step("ingestion").unwrap().status,
        StepStatus::Processing
    );
    assert!(engine.queue().is_idle());
}

#[tokio::test]
async fn retry_creates_rows_missing_from_the_run() {
    let (engine, clock) = setup();
    let pipeline_id = pipeline(&engine, &["malware_scan", "pii_scan"]);

    // A run whose step rows predate the pipeline's second step
    let run_id = RunId::new("legacy-run");
    engine
        .store()
        .create_run(PipelineRun::new(
            run_id.clone(),
            pipeline_id.clone(),
            FileVersionId::new("v-1"),
            clock.now(),
        ))
        .unwrap();
    engine
        .store()
        .create_run_step(PipelineRunStep::new(
            StepId::new("legacy-step"),
            run_id.clone(),
            "malware_scan".to_string(),
            clock.now(),
        ))
        .unwrap();

    engine.retry_pipeline_run(&run_id).unwrap();
    engine.wait_idle().await;

    let detail = engine.get_pipeline_run(&run_id).unwrap().unwrap();
    assert_eq!(detail.run.status, RunStatus::Processed);
    assert_eq!(detail.steps.len(), 2);
    assert!(detail
        .steps
        .iter()
        .all(|s| s.status == StepStatus::Processed));
}

#[tokio::test]
async fn retry_of_run_with_deleted_pipeline_is_not_found() {
    let (engine, clock) = setup();
    let run_id = RunId::new("orphan");
    engine
        .store()
        .create_run(PipelineRun::new(
            run_id.clone(),
            PipelineId::new("gone"),
            FileVersionId::new("v-1"),
            clock.now(),
        ))
        .unwrap();

    let err = engine.retry_pipeline_run(&run_id).unwrap_err();
    assert!(matches!(err, EngineError::PipelineNotFound(_)));
    assert!(err.is_not_found());

    // Run left untouched
    let run = engine.store().get_run(&run_id).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Processing);
}

#[tokio::test]
async fn handler_override_applies_to_queued_runs() {
    let (engine, _) = setup();
    let pipeline_id = pipeline(&engine, &["control_checks"]);

    engine.queue().pause();
    let run_id = engine
        .start_pipeline_run(&pipeline_id, &FileVersionId::new("v-1"))
        .unwrap();
    engine.set_handler(
        "control_checks",
        handler_fn(|_ctx| async { Err(StepFailure::new("control failed")) }),
    );
    engine.queue().start();
    engine.wait_idle().await;

    let detail = engine.get_pipeline_run(&run_id).unwrap().unwrap();
    assert_eq!(detail.run.status, RunStatus::Errored);
}

#[tokio::test]
async fn panic_message_reads_string_payloads() {
    let err = tokio::spawn(async {
        panic!("{} failed", "scan");
    })
    .await
    .unwrap_err();
    assert_eq!(panic_message(err), "scan failed");
}

#[tokio::test]
async fn retry_of_an_active_run_is_rejected() {
    let (engine, _) = setup();
    let pipeline_id = pipeline(&engine, &["malware_scan"]);

    engine.queue().pause();
    let run_id = engine
        .start_pipeline_run(&pipeline_id, &FileVersionId::new("v-1"))
        .unwrap();
    assert!(engine.is_run_active(&run_id));

    let err = engine.retry_pipeline_run(&run_id).unwrap_err();
    assert!(matches!(err, EngineError::RunActive(ref id) if id == &run_id));
    assert!(!err.is_not_found());
    assert_eq!(engine.queue().size(), 1);

    engine.queue().start();
    engine.wait_idle().await;
    assert!(!engine.is_run_active(&run_id));

    engine.retry_pipeline_run(&run_id).unwrap();
    engine.wait_idle().await;
    let detail = engine.get_pipeline_run(&run_id).unwrap().unwrap();
    assert_eq!(detail.run.status, RunStatus::Processed);
}

#[tokio::test]
async fn cleared_runs_can_be_retried() {
    let (engine, _) = setup();
    let pipeline_id = pipeline(&engine, &["malware_scan"]);

    engine.queue().pause();
    let run_id = engine
        .start_pipeline_run(&pipeline_id, &FileVersionId::new("v-1"))
        .unwrap();
    engine.queue().clear();
    assert!(!engine.is_run_active(&run_id));

    engine.queue().start();
    engine.retry_pipeline_run(&run_id).unwrap();
    engine.wait_idle().await;
    let detail = engine.get_pipeline_run(&run_id).unwrap().unwrap();
    assert_eq!(detail.run.status, RunStatus::Processed);
}

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn handler_logs_carry_the_run_span() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (engine, _) = setup();
    engine.set_handler(
        "ingestion",
        handler_fn(|_ctx| async {
            tracing::info!("indexing file");
            Ok(StepOutcome::Processed)
        }),
    );
    let pipeline_id = pipeline(&engine, &["ingestion"]);
    let run_id = engine
        .start_pipeline_run(&pipeline_id, &FileVersionId::new("v-1"))
        .unwrap();
    engine.wait_idle().await;

    let output = String::from_utf8_lossy(&logs.logs.lock().unwrap()).to_string();
    let line = output
        .lines()
        .find(|line| line.contains("indexing file"))
        .unwrap();
    assert!(line.contains(&format!("pipeline_run{{run_id={}}}", run_id)));
}
