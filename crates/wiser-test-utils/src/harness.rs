// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end sync testing.
//!
//! `TestHarness` assembles a real SQLite offline queue in a temp directory
//! with a mock backend, mock notifier and host stand-ins, wired into a
//! reconciliation worker.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiser_config::model::StorageConfig;
use wiser_core::types::{QueuedMessage, Role};
use wiser_core::{OfflineQueue, PluginAdapter, WiserError};
use wiser_storage::SqliteOfflineQueue;
use wiser_sync::{ConnectivityObserver, Outbox, ReconciliationWorker, RunnerConfig, SyncRunner};

use crate::mock_host::StaticAuth;
use crate::mock_notifier::MockNotifier;
use crate::mock_remote::MockRemoteWriter;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    online: bool,
    authenticated: bool,
    write_timeout: Duration,
    runner: RunnerConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            online: true,
            authenticated: true,
            write_timeout: Duration::from_secs(2),
            runner: RunnerConfig {
                reconnect_delay: Duration::from_millis(20),
                drain_on_startup: true,
            },
        }
    }

    /// Initial connectivity status.
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.runner.reconnect_delay = delay;
        self
    }

    pub fn drain_on_startup(mut self, enabled: bool) -> Self {
        self.runner.drain_on_startup = enabled;
        self
    }

    /// Build the test harness, creating the queue database.
    pub async fn build(self) -> Result<TestHarness, WiserError> {
        // Create temp directory for SQLite
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| WiserError::Storage { source: e.into() })?;
        let db_path = temp_dir
            .path()
            .join("offline.db")
            .to_string_lossy()
            .to_string();

        let queue = Arc::new(SqliteOfflineQueue::open(storage_config(&db_path)).await?);
        let remote = Arc::new(MockRemoteWriter::new());
        let notifier = Arc::new(MockNotifier::new());
        let auth = Arc::new(StaticAuth::new(self.authenticated));
        let connectivity = ConnectivityObserver::new(self.online);

        let worker = ReconciliationWorker::new(
            queue.clone(),
            remote.clone(),
            auth.clone(),
            connectivity.clone(),
            notifier.clone(),
        )
        .with_write_timeout(self.write_timeout);

        Ok(TestHarness {
            worker: Arc::new(worker),
            queue,
            remote,
            notifier,
            auth,
            connectivity,
            write_timeout: self.write_timeout,
            runner_config: self.runner,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

fn storage_config(path: &str) -> StorageConfig {
    StorageConfig {
        database_path: path.to_string(),
        wal_mode: true,
    }
}

/// A complete sync environment with mock collaborators and temp storage.
pub struct TestHarness {
    /// Durable queue backed by a temp SQLite file.
    pub queue: Arc<SqliteOfflineQueue>,
    /// In-memory backend.
    pub remote: Arc<MockRemoteWriter>,
    pub notifier: Arc<MockNotifier>,
    pub auth: Arc<StaticAuth>,
    pub connectivity: ConnectivityObserver,
    pub worker: Arc<ReconciliationWorker>,
    write_timeout: Duration,
    runner_config: RunnerConfig,
    db_path: String,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    fn rebuild_worker(&mut self) {
        let worker = ReconciliationWorker::new(
            self.queue.clone(),
            self.remote.clone(),
            self.auth.clone(),
            self.connectivity.clone(),
            self.notifier.clone(),
        )
        .with_write_timeout(self.write_timeout);
        self.worker = Arc::new(worker);
    }

    /// Path of the queue database.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// An outbox over the same queue, backend and connectivity.
    pub fn outbox(&self) -> Outbox {
        Outbox::new(
            self.queue.clone(),
            self.remote.clone(),
            self.auth.clone(),
            self.connectivity.clone(),
        )
        .with_write_timeout(self.write_timeout)
    }

    /// Starts a sync runner with its own cancellation token.
    pub fn start_runner(&self) -> SyncRunner {
        SyncRunner::start(
            self.worker.clone(),
            self.connectivity.clone(),
            self.auth.clone(),
            self.runner_config,
            CancellationToken::new(),
        )
    }

    /// Queue a user message with a fixed id.
    pub async fn enqueue(&self, id: &str, content: &str) -> Result<QueuedMessage, WiserError> {
        let message = QueuedMessage::new("chat-test", Role::User, content).with_id(id);
        self.queue.enqueue(&message).await?;
        Ok(message)
    }

    /// Sorted ids currently in the durable queue.
    pub async fn queued_ids(&self) -> Result<Vec<String>, WiserError> {
        let mut ids: Vec<String> = self
            .queue
            .list_all()
            .await?
            .into_iter()
            .map(|m| m.id.0)
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Closes the queue and reopens it from disk, as after an app restart.
    ///
    /// The worker is rebuilt over the reopened queue; the mock backend keeps
    /// its state.
    pub async fn restart(&mut self) -> Result<(), WiserError> {
        self.queue.shutdown().await?;
        self.queue = Arc::new(SqliteOfflineQueue::open(storage_config(&self.db_path)).await?);
        self.rebuild_worker();
        Ok(())
    }
}
