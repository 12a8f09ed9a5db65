// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn handle_resolves_with_task_output() {
    let queue = WorkQueue::new(1);
    let handle = queue.submit(async { 21 * 2 });
    assert_eq!(handle.join().await, Ok(42));
    queue.on_idle().await;
    assert!(queue.is_idle());
}

#[tokio::test]
async fn zero_concurrency_is_clamped_to_one() {
    let queue = WorkQueue::new(0);
    assert_eq!(queue.concurrency(), 1);
    assert_eq!(queue.submit(async { "ran" }).join().await, Ok("ran"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_exceeds_concurrency() {
    let queue = WorkQueue::new(2);
    let active = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    for _ in 0..6 {
        let active = Arc::clone(&active);
        let max_seen = Arc::clone(&max_seen);
        queue.submit(async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(15)).await;
            active.fetch_sub(1, Ordering::SeqCst);
        });
    }

    assert_eq!(queue.pending(), 2);
    assert_eq!(queue.size(), 4);

    queue.on_idle().await;
    assert_eq!(max_seen.load(Ordering::SeqCst), 2);
    assert_eq!(queue.pending(), 0);
    assert_eq!(queue.size(), 0);
}

#[tokio::test]
async fn starts_tasks_in_submission_order() {
    let queue = WorkQueue::new(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..5 {
        let order = Arc::clone(&order);
        queue.submit(async move {
            order.lock().unwrap().push(i);
        });
    }

    queue.on_idle().await;
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn paused_queue_holds_tasks_until_started() {
    let queue = WorkQueue::new(1);
    queue.pause();
    assert!(queue.is_paused());

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let handle = queue.submit(async move {
        flag.store(true, Ordering::SeqCst);
    });

    settle().await;
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(queue.size(), 1);
    assert!(!queue.is_idle());

    queue.start();
    handle.join().await.unwrap();
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn pause_does_not_interrupt_running_task() {
    let queue = WorkQueue::new(1);
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let running = queue.submit(async move {
        let _ = release_rx.await;
        "finished"
    });
    let next = queue.submit(async { "next" });

    settle().await;
    queue.pause();
    assert_eq!(queue.pending(), 1);

    release_tx.send(()).unwrap();
    assert_eq!(running.join().await, Ok("finished"));

    settle().await;
    assert_eq!(queue.size(), 1);
    queue.start();
    assert_eq!(next.join().await, Ok("next"));
}

#[tokio::test]
async fn clear_abandons_waiting_tasks() {
    let queue = WorkQueue::new(1);
    queue.pause();

    let first = queue.submit(async { 1 });
    let second = queue.submit(async { 2 });
    assert_eq!(queue.size(), 2);

    queue.clear();
    assert_eq!(queue.size(), 0);
    assert_eq!(first.join().await, Err(QueueError::Abandoned));
    assert_eq!(second.join().await, Err(QueueError::Abandoned));

    queue.start();
    queue.on_idle().await;
}

#[tokio::test]
async fn panicking_task_releases_its_slot() {
    let queue = WorkQueue::new(1);
    let crashed = queue.submit(async {
        if true {
            panic!("boom");
        }
    });
    let after = queue.submit(async { "still running" });

    assert_eq!(crashed.join().await, Err(QueueError::Abandoned));
    assert_eq!(after.join().await, Ok("still running"));
    queue.on_idle().await;
}

#[tokio::test]
async fn on_idle_returns_immediately_when_empty() {
    let queue = WorkQueue::new(3);
    tokio::time::timeout(Duration::from_secs(1), queue.on_idle())
        .await
        .unwrap();
}

#[tokio::test]
async fn on_idle_waits_for_running_tasks() {
    let queue = WorkQueue::new(1);
    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);
    queue.submit(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        flag.store(true, Ordering::SeqCst);
    });

    queue.on_idle().await;
    assert!(done.load(Ordering::SeqCst));
}
