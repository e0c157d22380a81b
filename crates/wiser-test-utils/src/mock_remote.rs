// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock remote writer for deterministic testing.
//!
//! `MockRemoteWriter` implements `RemoteMessageWriter` against an in-memory
//! table keyed by message id, with injectable failures and latency.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use wiser_core::traits::{PluginAdapter, RemoteMessageWriter};
use wiser_core::types::{AdapterType, HealthStatus, QueuedMessage};
use wiser_core::WiserError;

#[derive(Default)]
struct RemoteState {
    calls: Vec<String>,
    written: Vec<QueuedMessage>,
    table: BTreeMap<String, QueuedMessage>,
    fail_ids: HashSet<String>,
    fail_all: bool,
    delay: Duration,
}

/// A mock backend that records every write attempt.
///
/// Successful writes land in an id-keyed table where an existing row is left
/// untouched, like the real backend's ignore-duplicates insert.
pub struct MockRemoteWriter {
    state: Mutex<RemoteState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockRemoteWriter {
    /// Create a writer that accepts everything immediately.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RemoteState::default()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject every write of this id until [`clear_failures`](Self::clear_failures).
    pub fn fail_on(&self, id: &str) {
        self.lock().fail_ids.insert(id.to_string());
    }

    /// Reject every write while `fail` is true.
    pub fn fail_all(&self, fail: bool) {
        self.lock().fail_all = fail;
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.fail_ids.clear();
        state.fail_all = false;
    }

    /// Latency added before each write resolves.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    /// Number of write attempts, failed and abandoned ones included.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Ids of every write attempt in call order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Messages of every successful write, replays included.
    pub fn written(&self) -> Vec<QueuedMessage> {
        self.lock().written.clone()
    }

    /// Sorted ids present in the remote table.
    pub fn stored_ids(&self) -> Vec<String> {
        self.lock().table.keys().cloned().collect()
    }

    /// Highest number of writes that were in progress at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockRemoteWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockRemoteWriter {
    fn name(&self) -> &str {
        "mock-remote"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Remote
    }

    async fn health_check(&self) -> Result<HealthStatus, WiserError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WiserError> {
        Ok(())
    }
}

#[async_trait]
impl RemoteMessageWriter for MockRemoteWriter {
    async fn write_message(&self, message: &QueuedMessage) -> Result<(), WiserError> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(message.id.0.clone());
            state.delay
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.fail_all || state.fail_ids.contains(message.id.as_str()) {
            return Err(WiserError::RemoteWrite {
                message: format!("mock rejected {}", message.id),
                source: None,
            });
        }
        state.written.push(message.clone());
        state
            .table
            .entry(message.id.0.clone())
            .or_insert_with(|| message.clone());
        Ok(())
    }
}
