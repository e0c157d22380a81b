// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for offline queueing and reconciliation.
//!
//! Each test creates an isolated TestHarness with a temp SQLite queue and a
//! mock backend. Tests are independent and order-insensitive.

use std::time::Duration;

use chrono::{TimeZone, Utc};

use wiser_core::types::{DrainOutcome, DrainReport, QueuedMessage, Role, SkipReason, Trigger};
use wiser_core::OfflineQueue;
use wiser_sync::SendOutcome;
use wiser_test_utils::{wait_for, MockWakeHost, TestHarness};

const PATIENCE: Duration = Duration::from_secs(3);

// ---- Durable queue ----

#[tokio::test]
async fn test_enqueue_same_id_twice_keeps_one_entry() {
    let harness = TestHarness::builder().build().await.unwrap();

    harness.enqueue("m1", "first draft").await.unwrap();
    harness.enqueue("m1", "final text").await.unwrap();

    let all = harness.queue.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].content, "final text");
}

#[tokio::test]
async fn test_queue_survives_restart_and_drains_after() {
    let mut harness = TestHarness::builder().online(false).build().await.unwrap();
    harness.enqueue("a", "one").await.unwrap();
    harness.enqueue("b", "two").await.unwrap();

    harness.restart().await.unwrap();
    assert_eq!(harness.queued_ids().await.unwrap(), vec!["a", "b"]);

    harness.connectivity.set_online(true);
    let outcome = harness.worker.drain(Trigger::Startup).await.unwrap();
    assert_eq!(outcome.synced(), 2);
    assert!(harness.queued_ids().await.unwrap().is_empty());
    assert_eq!(harness.remote.stored_ids(), vec!["a", "b"]);
}

// ---- Drain semantics ----

#[tokio::test]
async fn test_drain_removes_exactly_the_successful_entries() {
    let harness = TestHarness::builder().build().await.unwrap();
    for id in ["s1", "f1", "s2", "f2", "s3"] {
        harness.enqueue(id, "payload").await.unwrap();
    }
    harness.remote.fail_on("f1");
    harness.remote.fail_on("f2");

    let outcome = harness.worker.drain(Trigger::Manual).await.unwrap();

    assert_eq!(
        outcome,
        DrainOutcome::Completed(DrainReport {
            attempted: 5,
            synced: 3,
            failed: 2
        })
    );
    assert_eq!(harness.queued_ids().await.unwrap(), vec!["f1", "f2"]);
    assert_eq!(harness.remote.stored_ids(), vec!["s1", "s2", "s3"]);
    assert_eq!(
        harness.notifier.messages(),
        vec!["3 offline messages synced"]
    );
}

#[tokio::test]
async fn test_failed_entries_retry_on_next_drain() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.enqueue("retry-me", "payload").await.unwrap();
    harness.remote.fail_all(true);

    assert_eq!(harness.worker.drain(Trigger::Manual).await.unwrap().synced(), 0);
    assert!(harness.notifier.messages().is_empty());

    harness.remote.clear_failures();
    assert_eq!(harness.worker.drain(Trigger::Wake).await.unwrap().synced(), 1);
    assert_eq!(harness.remote.calls(), vec!["retry-me", "retry-me"]);
    assert_eq!(harness.notifier.messages(), vec!["1 offline message synced"]);
}

#[tokio::test]
async fn test_write_timeout_leaves_entry_queued() {
    let harness = TestHarness::builder()
        .with_write_timeout(Duration::from_millis(30))
        .build()
        .await
        .unwrap();
    harness.enqueue("slow", "payload").await.unwrap();
    harness.remote.set_delay(Duration::from_millis(300));

    let outcome = harness.worker.drain(Trigger::Manual).await.unwrap();
    assert_eq!(outcome.synced(), 0);
    assert_eq!(harness.queued_ids().await.unwrap(), vec!["slow"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_triggers_run_one_drain() {
    let harness = TestHarness::builder().build().await.unwrap();
    for i in 0..4 {
        harness.enqueue(&format!("m{i}"), "payload").await.unwrap();
    }
    harness.remote.set_delay(Duration::from_millis(25));

    let mut handles = Vec::new();
    for trigger in [Trigger::Reconnected, Trigger::Wake, Trigger::Manual, Trigger::Wake] {
        let worker = harness.worker.clone();
        handles.push(tokio::spawn(async move { worker.drain(trigger).await }));
    }

    let mut completed = 0;
    let mut skipped = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            DrainOutcome::Completed(report) => {
                completed += 1;
                assert_eq!(report.synced, 4);
            }
            DrainOutcome::Skipped(SkipReason::AlreadyDraining) => skipped += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(completed, 1);
    assert_eq!(skipped, 3);
    assert_eq!(harness.remote.call_count(), 4);
    assert_eq!(harness.remote.max_concurrent(), 1);
}

#[tokio::test]
async fn test_offline_drain_makes_no_remote_calls() {
    let harness = TestHarness::builder().online(false).build().await.unwrap();
    harness.enqueue("a", "payload").await.unwrap();

    let outcome = harness.worker.drain(Trigger::Manual).await.unwrap();

    assert_eq!(outcome, DrainOutcome::Skipped(SkipReason::Offline));
    assert_eq!(harness.remote.call_count(), 0);
    assert_eq!(harness.queued_ids().await.unwrap(), vec!["a"]);
}

#[tokio::test]
async fn test_signed_out_drain_makes_no_remote_calls() {
    let harness = TestHarness::builder()
        .authenticated(false)
        .build()
        .await
        .unwrap();
    harness.enqueue("a", "payload").await.unwrap();

    let outcome = harness.worker.drain(Trigger::Manual).await.unwrap();
    assert_eq!(outcome, DrainOutcome::Skipped(SkipReason::Unauthenticated));
    assert_eq!(harness.remote.call_count(), 0);
}

// ---- Outbox ----

#[tokio::test]
async fn test_outbox_falls_back_to_queue_on_remote_failure() {
    let harness = TestHarness::builder().build().await.unwrap();
    let outbox = harness.outbox();
    harness.remote.fail_all(true);

    let message = QueuedMessage::new("chat-1", Role::User, "what is osmosis?").with_id("q1");
    assert_eq!(outbox.send(&message).await.unwrap(), SendOutcome::Queued);
    assert_eq!(harness.queued_ids().await.unwrap(), vec!["q1"]);

    harness.remote.clear_failures();
    let reply = QueuedMessage::new("chat-1", Role::Assistant, "Osmosis is...").with_id("r1");
    assert_eq!(outbox.send(&reply).await.unwrap(), SendOutcome::Delivered);
    assert_eq!(harness.queued_ids().await.unwrap(), vec!["q1"]);
}

// ---- Full scenario ----

#[tokio::test]
async fn test_offline_message_syncs_after_reconnect() {
    let harness = TestHarness::builder()
        .online(false)
        .with_reconnect_delay(Duration::from_millis(50))
        .build()
        .await
        .unwrap();
    let runner = harness.start_runner();

    // Sent while offline: queued, not written.
    let message = QueuedMessage::new("chat-42", Role::User, "offline question")
        .with_id("offline-1")
        .with_mode("study")
        .with_created_at(Utc.timestamp_millis_opt(1_767_225_600_123).unwrap());
    let outcome = harness.outbox().send(&message).await.unwrap();
    assert_eq!(outcome, SendOutcome::Queued);
    assert_eq!(harness.remote.call_count(), 0);

    harness.connectivity.set_online(true);

    let queue = harness.queue.clone();
    let drained = wait_for(
        || harness.remote.stored_ids() == vec!["offline-1".to_string()],
        PATIENCE,
    )
    .await;
    assert!(drained, "message was not synced after reconnect");
    assert!(
        wait_for(|| harness.notifier.messages().len() == 1, PATIENCE).await,
        "expected a sync notification"
    );
    assert!(queue.list_all().await.unwrap().is_empty());
    assert_eq!(harness.notifier.messages(), vec!["1 offline message synced"]);

    // The backend row carries the original fields.
    let written = harness.remote.written();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].chat_id.as_str(), "chat-42");
    assert_eq!(written[0].mode.as_deref(), Some("study"));
    assert_eq!(written[0].created_at, message.created_at);

    runner.shutdown().await;
}

#[tokio::test]
async fn test_wake_message_drives_drain() {
    let harness = TestHarness::builder()
        .drain_on_startup(false)
        .build()
        .await
        .unwrap();
    harness.enqueue("w1", "payload").await.unwrap();
    let runner = harness.start_runner();

    let host = MockWakeHost::new();
    wiser_sync::register_wake_callback(&host, runner.wake_callback());
    assert!(host.fire());

    assert!(wait_for(|| harness.remote.call_count() == 1, PATIENCE).await);
    assert!(wait_for(|| harness.notifier.messages().len() == 1, PATIENCE).await);
    assert!(harness.queued_ids().await.unwrap().is_empty());
    runner.shutdown().await;
}

#[tokio::test]
async fn test_runner_shutdown_stops_connectivity_delivery() {
    let harness = TestHarness::builder()
        .online(false)
        .with_reconnect_delay(Duration::from_millis(10))
        .build()
        .await
        .unwrap();
    harness.enqueue("late", "payload").await.unwrap();

    let runner = harness.start_runner();
    assert_eq!(harness.connectivity.subscriber_count(), 1);
    runner.shutdown().await;
    assert_eq!(harness.connectivity.subscriber_count(), 0);

    harness.connectivity.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.remote.call_count(), 0);
    assert_eq!(harness.queued_ids().await.unwrap(), vec!["late"]);
}

#[tokio::test]
async fn test_startup_drain_when_already_online() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.enqueue("boot", "payload").await.unwrap();

    let runner = harness.start_runner();
    assert!(wait_for(|| harness.remote.call_count() == 1, PATIENCE).await);
    assert!(wait_for(|| harness.notifier.messages().len() == 1, PATIENCE).await);
    runner.shutdown().await;
    assert!(harness.queued_ids().await.unwrap().is_empty());
}
