// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use dr_core::{SystemClock, UuidIdGen};
use dr_engine::PipelineEngine;
use dr_storage::{RunStore, StateStore, StoreError, TracedStore};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::{Config, ConfigError};

/// Engine with the daemon's concrete store, clock, and ID types
pub type DaemonEngine = PipelineEngine<TracedStore<StateStore>, SystemClock, UuidIdGen>;

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // Held to maintain the exclusive lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub listener: UnixListener,
    pub engine: DaemonEngine,
    pub start_time: Instant,
    pub shutdown_requested: bool,
}

impl DaemonState {
    /// Stop starting runs, wait for executing ones, and remove runtime files
    ///
    /// Runs still waiting for a slot are dropped from the queue; they stay
    /// `processing` in the store and are reported on the next startup.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        let queue = self.engine.queue();
        queue.pause();
        let waiting = queue.size();
        if waiting > 0 {
            warn!(waiting, "dropping queued runs; they will remain processing");
        }
        queue.clear();
        if queue.pending() > 0 {
            info!(running = queue.pending(), "waiting for in-flight runs");
        }
        self.engine.wait_idle().await;

        for path in [
            &self.config.socket_path,
            &self.config.lock_path,
            &self.config.version_path,
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Lock first; a held lock belongs to a live daemon, so nothing is cleaned up
    let lock_file = acquire_lock(config)?;

    match startup_inner(config, lock_file).await {
        Ok(state) => Ok(state),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

fn acquire_lock(config: &Config) -> Result<File, LifecycleError> {
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

async fn startup_inner(config: &Config, lock_file: File) -> Result<DaemonState, LifecycleError> {
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // Load state from WAL
    let store = StateStore::open(&config.wal_path)?;
    reconcile_state(&store)?;

    let engine = PipelineEngine::new(
        Arc::new(TracedStore::new(store)),
        SystemClock,
        UuidIdGen,
        config.engine_config(),
    );

    // Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(
        state_dir = %config.state_dir.display(),
        concurrency = config.concurrency,
        "Daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        engine,
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [
        &config.socket_path,
        &config.version_path,
        &config.lock_path,
    ] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Warn about runs a previous process left unfinished
///
/// Returns the number of such runs. They are not resumed; `dr run retry`
/// re-executes them.
pub fn reconcile_state(store: &impl RunStore) -> Result<usize, LifecycleError> {
    let runs = store.list_runs()?;
    let stalled: Vec<_> = runs
        .iter()
        .filter(|r| !r.status.is_terminal())
        .collect();

    info!(runs = runs.len(), "Loaded state");

    if !stalled.is_empty() {
        warn!(
            "Found {} processing runs from previous session (retry to re-execute)",
            stalled.len()
        );
        for run in &stalled {
            warn!("  - {} (pipeline {})", run.id, run.pipeline_id);
        }
    }

    Ok(stalled.len())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
