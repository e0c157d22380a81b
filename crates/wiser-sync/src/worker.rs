// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation worker: replays queued messages to the backend.
//!
//! A drain takes a snapshot of the queue, writes each entry in turn and
//! removes it only after the backend confirmed that exact entry. Failed
//! entries stay queued for the next drain. Only one drain runs at a time
//! per worker; overlapping triggers are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use wiser_core::types::{DrainOutcome, DrainReport, QueuedMessage, SkipReason, Trigger};
use wiser_core::{AuthState, NotificationSink, OfflineQueue, RemoteMessageWriter, WiserError};

use crate::connectivity::ConnectivityObserver;

/// Default bound on a single remote write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Coarse worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Draining,
}

/// Text of the post-drain notification, or `None` when nothing synced.
pub fn sync_notification(synced: usize) -> Option<String> {
    match synced {
        0 => None,
        1 => Some("1 offline message synced".to_string()),
        n => Some(format!("{n} offline messages synced")),
    }
}

/// Releases the single-flight flag on every exit path, unwinding included.
struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drains the offline queue into the remote store.
pub struct ReconciliationWorker {
    queue: Arc<dyn OfflineQueue>,
    remote: Arc<dyn RemoteMessageWriter>,
    auth: Arc<dyn AuthState>,
    connectivity: ConnectivityObserver,
    notifier: Arc<dyn NotificationSink>,
    write_timeout: Duration,
    draining: AtomicBool,
}

impl ReconciliationWorker {
    pub fn new(
        queue: Arc<dyn OfflineQueue>,
        remote: Arc<dyn RemoteMessageWriter>,
        auth: Arc<dyn AuthState>,
        connectivity: ConnectivityObserver,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            queue,
            remote,
            auth,
            connectivity,
            notifier,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            draining: AtomicBool::new(false),
        }
    }

    /// Overrides the per-write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn state(&self) -> WorkerState {
        if self.draining.load(Ordering::Acquire) {
            WorkerState::Draining
        } else {
            WorkerState::Idle
        }
    }

    /// Runs one drain pass unless another is in flight or gating fails.
    ///
    /// Returns `Err` only when the queue snapshot cannot be read. Per-entry
    /// failures are counted in the report and never abort the pass.
    pub async fn drain(&self, trigger: Trigger) -> Result<DrainOutcome, WiserError> {
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            debug!(%trigger, "drain already in progress, trigger dropped");
            return Ok(DrainOutcome::Skipped(SkipReason::AlreadyDraining));
        };

        if !self.auth.is_authenticated() {
            debug!(%trigger, "not authenticated, drain skipped");
            return Ok(DrainOutcome::Skipped(SkipReason::Unauthenticated));
        }
        if !self.connectivity.is_online() {
            debug!(%trigger, "offline, drain skipped");
            return Ok(DrainOutcome::Skipped(SkipReason::Offline));
        }

        let snapshot = self.queue.list_all().await.map_err(|e| {
            error!(%trigger, error = %e, "failed to read offline queue");
            e
        })?;

        if snapshot.is_empty() {
            debug!(%trigger, "offline queue empty");
            return Ok(DrainOutcome::Completed(DrainReport::default()));
        }

        info!(%trigger, pending = snapshot.len(), "draining offline queue");
        let mut report = DrainReport {
            attempted: snapshot.len(),
            ..DrainReport::default()
        };

        for message in &snapshot {
            if self.sync_one(message).await {
                report.synced += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            %trigger,
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failed,
            "drain complete"
        );
        if let Some(text) = sync_notification(report.synced) {
            self.notifier.notify(&text);
        }

        Ok(DrainOutcome::Completed(report))
    }

    /// Writes one entry and removes it on success. Returns whether it synced.
    async fn sync_one(&self, message: &QueuedMessage) -> bool {
        let write = tokio::time::timeout(self.write_timeout, self.remote.write_message(message))
            .await
            .unwrap_or(Err(WiserError::Timeout {
                duration: self.write_timeout,
            }));

        if let Err(e) = write {
            if e.is_remote_failure() {
                warn!(id = %message.id, chat_id = %message.chat_id, error = %e, "remote write failed, entry kept");
            } else {
                error!(id = %message.id, chat_id = %message.chat_id, error = %e, "remote writer error, entry kept");
            }
            return false;
        }

        match self.queue.remove(&message.id).await {
            Ok(()) => {
                debug!(id = %message.id, "entry synced");
                true
            }
            Err(e) => {
                // Written but still queued; the next drain replays it harmlessly.
                warn!(id = %message.id, error = %e, "failed to remove synced entry");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use wiser_core::Role;
    use wiser_test_utils::{MemoryQueue, MockNotifier, MockRemoteWriter, StaticAuth};

    struct Fixture {
        queue: Arc<MemoryQueue>,
        remote: Arc<MockRemoteWriter>,
        auth: Arc<StaticAuth>,
        connectivity: ConnectivityObserver,
        notifier: Arc<MockNotifier>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                queue: Arc::new(MemoryQueue::new()),
                remote: Arc::new(MockRemoteWriter::new()),
                auth: Arc::new(StaticAuth::new(true)),
                connectivity: ConnectivityObserver::new(true),
                notifier: Arc::new(MockNotifier::new()),
            }
        }

        fn worker(&self) -> ReconciliationWorker {
            ReconciliationWorker::new(
                self.queue.clone(),
                self.remote.clone(),
                self.auth.clone(),
                self.connectivity.clone(),
                self.notifier.clone(),
            )
        }

        async fn seed(&self, ids: &[&str]) {
            for id in ids {
                let msg = QueuedMessage::new("c1", Role::User, format!("body {id}")).with_id(*id);
                self.queue.enqueue(&msg).await.unwrap();
            }
        }
    }

    #[test]
    fn notification_text() {
        assert_eq!(sync_notification(0), None);
        assert_eq!(sync_notification(1).as_deref(), Some("1 offline message synced"));
        assert_eq!(sync_notification(3).as_deref(), Some("3 offline messages synced"));
    }

    #[tokio::test]
    async fn drains_everything_and_notifies_once() {
        let fx = Fixture::new();
        fx.seed(&["a", "b", "c"]).await;

        let outcome = fx.worker().drain(Trigger::Manual).await.unwrap();

        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                attempted: 3,
                synced: 3,
                failed: 0
            })
        );
        assert!(fx.queue.is_empty());
        assert_eq!(fx.remote.call_count(), 3);
        assert_eq!(fx.notifier.messages(), vec!["3 offline messages synced"]);
    }

    #[tokio::test]
    async fn empty_queue_is_silent() {
        let fx = Fixture::new();
        let outcome = fx.worker().drain(Trigger::Startup).await.unwrap();
        assert_eq!(outcome, DrainOutcome::Completed(DrainReport::default()));
        assert_eq!(fx.remote.call_count(), 0);
        assert!(fx.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn failed_entry_stays_and_others_sync() {
        let fx = Fixture::new();
        fx.seed(&["ok-1", "bad", "ok-2"]).await;
        fx.remote.fail_on("bad");

        let outcome = fx.worker().drain(Trigger::Reconnected).await.unwrap();

        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                attempted: 3,
                synced: 2,
                failed: 1
            })
        );
        assert_eq!(fx.queue.ids(), vec!["bad"]);
        assert_eq!(fx.notifier.messages(), vec!["2 offline messages synced"]);
    }

    #[tokio::test]
    async fn all_failures_produce_no_notification() {
        let fx = Fixture::new();
        fx.seed(&["x"]).await;
        fx.remote.fail_all(true);

        let outcome = fx.worker().drain(Trigger::Wake).await.unwrap();
        assert_eq!(outcome.synced(), 0);
        assert_eq!(fx.queue.len(), 1);
        assert!(fx.notifier.messages().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn per_entry_failure_is_logged_with_id() {
        let fx = Fixture::new();
        fx.seed(&["flaky"]).await;
        fx.remote.fail_on("flaky");

        fx.worker().drain(Trigger::Manual).await.unwrap();
        assert!(logs_contain("remote write failed, entry kept"));
        assert!(logs_contain("flaky"));
        assert!(logs_contain("drain complete"));
    }

    #[tokio::test]
    async fn offline_drain_leaves_queue_untouched() {
        let fx = Fixture::new();
        fx.seed(&["a"]).await;
        fx.connectivity.set_online(false);

        let outcome = fx.worker().drain(Trigger::Manual).await.unwrap();
        assert_eq!(outcome, DrainOutcome::Skipped(SkipReason::Offline));
        assert_eq!(fx.remote.call_count(), 0);
        assert_eq!(fx.queue.len(), 1);
    }

    #[tokio::test]
    async fn unauthenticated_drain_is_skipped() {
        let fx = Fixture::new();
        fx.seed(&["a"]).await;
        fx.auth.set(false);

        let outcome = fx.worker().drain(Trigger::Manual).await.unwrap();
        assert_eq!(outcome, DrainOutcome::Skipped(SkipReason::Unauthenticated));
        assert_eq!(fx.remote.call_count(), 0);
    }

    #[tokio::test]
    async fn slow_write_times_out_and_entry_is_kept() {
        let fx = Fixture::new();
        fx.seed(&["slow"]).await;
        fx.remote.set_delay(Duration::from_millis(200));

        let worker = fx.worker().with_write_timeout(Duration::from_millis(20));
        let outcome = worker.drain(Trigger::Manual).await.unwrap();

        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                attempted: 1,
                synced: 0,
                failed: 1
            })
        );
        assert_eq!(fx.queue.ids(), vec!["slow"]);
        assert_eq!(worker.state(), WorkerState::Idle);
    }

    #[tokio::test]
    async fn list_failure_returns_error_and_releases_flag() {
        let fx = Fixture::new();
        fx.seed(&["a"]).await;
        fx.queue.fail_list(true);
        let worker = fx.worker();

        let result = worker.drain(Trigger::Manual).await;
        assert!(matches!(result, Err(WiserError::Storage { .. })));
        assert_eq!(worker.state(), WorkerState::Idle);

        fx.queue.fail_list(false);
        let outcome = worker.drain(Trigger::Manual).await.unwrap();
        assert_eq!(outcome.synced(), 1);
    }

    #[tokio::test]
    async fn remove_failure_counts_as_failed() {
        let fx = Fixture::new();
        fx.seed(&["a", "b"]).await;
        fx.queue.fail_remove("a");

        let outcome = fx.worker().drain(Trigger::Manual).await.unwrap();
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                attempted: 2,
                synced: 1,
                failed: 1
            })
        );
        assert_eq!(fx.queue.ids(), vec!["a"]);
        assert_eq!(fx.notifier.messages(), vec!["1 offline message synced"]);
    }

    #[tokio::test]
    async fn overlapping_trigger_is_dropped() {
        let fx = Fixture::new();
        fx.seed(&["a", "b"]).await;
        fx.remote.set_delay(Duration::from_millis(50));
        let worker = Arc::new(fx.worker());

        let first = tokio::spawn({
            let worker = worker.clone();
            async move { worker.drain(Trigger::Reconnected).await }
        });
        // Let the first drain take the flag.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(worker.state(), WorkerState::Draining);

        let second = worker.drain(Trigger::Wake).await.unwrap();
        assert_eq!(second, DrainOutcome::Skipped(SkipReason::AlreadyDraining));

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.synced(), 2);
        assert_eq!(fx.remote.call_count(), 2);
        assert_eq!(fx.remote.max_concurrent(), 1);
        assert_eq!(worker.state(), WorkerState::Idle);
    }

    #[tokio::test]
    async fn entries_enqueued_mid_drain_wait_for_next_pass() {
        let fx = Fixture::new();
        fx.seed(&["a"]).await;
        fx.remote.set_delay(Duration::from_millis(40));
        let worker = Arc::new(fx.worker());

        let drain = tokio::spawn({
            let worker = worker.clone();
            async move { worker.drain(Trigger::Manual).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let late = QueuedMessage::new("c1", Role::User, "late").with_id("late");
        fx.queue.enqueue(&late).await.unwrap();

        assert_eq!(drain.await.unwrap().unwrap().synced(), 1);
        assert_eq!(fx.queue.ids(), vec!["late"]);

        fx.remote.set_delay(Duration::ZERO);
        assert_eq!(worker.drain(Trigger::Manual).await.unwrap().synced(), 1);
        assert!(fx.queue.is_empty());
    }

    #[tokio::test]
    async fn writes_carry_original_fields() {
        let fx = Fixture::new();
        let msg = QueuedMessage::new("chat-7", Role::Assistant, "answer")
            .with_id("m-7")
            .with_mode("quiz");
        fx.queue.enqueue(&msg).await.unwrap();

        fx.worker().drain(Trigger::Manual).await.unwrap();
        assert_eq!(fx.remote.written(), vec![msg]);
    }

    struct PanickingWriter;

    #[async_trait::async_trait]
    impl RemoteMessageWriter for PanickingWriter {
        async fn write_message(&self, message: &QueuedMessage) -> Result<(), WiserError> {
            panic!("writer blew up on {}", message.id);
        }
    }

    #[tokio::test]
    async fn panicking_write_releases_flag_and_keeps_entry() {
        let fx = Fixture::new();
        fx.seed(&["boom"]).await;
        let worker = Arc::new(ReconciliationWorker::new(
            fx.queue.clone(),
            Arc::new(PanickingWriter),
            fx.auth.clone(),
            fx.connectivity.clone(),
            fx.notifier.clone(),
        ));

        let joined = tokio::spawn({
            let worker = worker.clone();
            async move { worker.drain(Trigger::Manual).await }
        })
        .await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(worker.state(), WorkerState::Idle);
        assert_eq!(fx.queue.ids(), vec!["boom"]);
        assert!(fx.notifier.messages().is_empty());
    }

    struct MisconfiguredWriter;

    #[async_trait::async_trait]
    impl RemoteMessageWriter for MisconfiguredWriter {
        async fn write_message(&self, _message: &QueuedMessage) -> Result<(), WiserError> {
            Err(WiserError::Config("remote.base_url is not set".into()))
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn non_remote_writer_error_is_logged_as_error_and_entry_kept() {
        let fx = Fixture::new();
        fx.seed(&["cfg"]).await;
        let worker = ReconciliationWorker::new(
            fx.queue.clone(),
            Arc::new(MisconfiguredWriter),
            fx.auth.clone(),
            fx.connectivity.clone(),
            fx.notifier.clone(),
        );

        let outcome = worker.drain(Trigger::Manual).await.unwrap();
        assert_eq!(outcome.synced(), 0);
        assert_eq!(fx.queue.ids(), vec!["cfg"]);
        assert!(logs_contain("remote writer error, entry kept"));
        assert!(!logs_contain("remote write failed, entry kept"));
    }
}
