// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency FIFO task queue
//!
//! Tasks start in submission order on the Tokio runtime, at most
//! `concurrency` at a time. A task holds its slot until it finishes or
//! panics; pausing only stops new starts.

use crate::QueueError;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct QueueState {
    waiting: VecDeque<Job>,
    running: usize,
    paused: bool,
}

struct Shared {
    concurrency: usize,
    state: Mutex<QueueState>,
    idle: Notify,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cloneable handle to a shared work queue
#[derive(Clone)]
pub struct WorkQueue {
    shared: Arc<Shared>,
}

/// Resolves with a submitted task's output
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task; errors if it was cleared or panicked
    pub async fn join(self) -> Result<T, QueueError> {
        self.rx.await.map_err(|_| QueueError::Abandoned)
    }
}

/// Returns the slot when a running task ends, including by panic
struct SlotGuard {
    shared: Arc<Shared>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.running = state.running.saturating_sub(1);
        }
        dispatch(&self.shared);
    }
}

/// Start as many waiting jobs as the limit allows
///
/// Outside a Tokio runtime (e.g. while one is shutting down) jobs stay queued.
fn dispatch(shared: &Arc<Shared>) {
    let runtime = tokio::runtime::Handle::try_current().ok();
    let ready = {
        let mut state = shared.lock();
        let mut ready = Vec::new();
        while runtime.is_some() && !state.paused && state.running < shared.concurrency {
            let Some(job) = state.waiting.pop_front() else {
                break;
            };
            state.running += 1;
            ready.push(job);
        }
        if state.running == 0 && state.waiting.is_empty() {
            shared.idle.notify_waiters();
        }
        ready
    };

    // Spawned outside the lock: a rejected spawn drops its guard immediately
    if let Some(runtime) = runtime {
        for job in ready {
            let guard = SlotGuard {
                shared: Arc::clone(shared),
            };
            runtime.spawn(async move {
                let _guard = guard;
                job.await;
            });
        }
    }
}

impl WorkQueue {
    /// Create a queue; a concurrency of zero is treated as one
    pub fn new(concurrency: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                concurrency: concurrency.max(1),
                state: Mutex::new(QueueState {
                    waiting: VecDeque::new(),
                    running: 0,
                    paused: false,
                }),
                idle: Notify::new(),
            }),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.shared.concurrency
    }

    /// Enqueue a task; it starts on the caller's Tokio runtime
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let output = task.await;
            // Receiver may have been dropped by a fire-and-forget caller
            let _ = tx.send(output);
        });
        self.shared.lock().waiting.push_back(job);
        dispatch(&self.shared);
        TaskHandle { rx }
    }

    /// Number of tasks currently executing
    pub fn pending(&self) -> usize {
        self.shared.lock().running
    }

    /// Number of tasks accepted but not yet started
    pub fn size(&self) -> usize {
        self.shared.lock().waiting.len()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// Stop starting new tasks
    pub fn pause(&self) {
        self.shared.lock().paused = true;
        tracing::debug!("work queue paused");
    }

    /// Resume starting tasks
    pub fn start(&self) {
        self.shared.lock().paused = false;
        tracing::debug!("work queue started");
        dispatch(&self.shared);
    }

    /// Drop every task that has not started; their handles report abandonment
    pub fn clear(&self) {
        let dropped = {
            let mut state = self.shared.lock();
            std::mem::take(&mut state.waiting)
        };
        if !dropped.is_empty() {
            tracing::info!(count = dropped.len(), "cleared waiting tasks");
        }
        drop(dropped);
        dispatch(&self.shared);
    }

    pub fn is_idle(&self) -> bool {
        let state = self.shared.lock();
        state.running == 0 && state.waiting.is_empty()
    }

    /// Resolve once nothing is running or waiting
    ///
    /// A paused queue with waiting tasks is not idle.
    pub async fn on_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
