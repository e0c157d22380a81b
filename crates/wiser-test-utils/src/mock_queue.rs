// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory offline queue with injectable storage failures.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use wiser_core::traits::{OfflineQueue, PluginAdapter};
use wiser_core::types::{AdapterType, HealthStatus, MessageId, QueuedMessage};
use wiser_core::WiserError;

#[derive(Default)]
struct QueueState {
    entries: BTreeMap<String, QueuedMessage>,
    fail_enqueue: bool,
    fail_list: bool,
    fail_remove: HashSet<String>,
}

/// A non-durable [`OfflineQueue`] for worker and outbox tests.
#[derive(Default)]
pub struct MemoryQueue {
    state: Mutex<QueueState>,
}

fn injected(op: &str) -> WiserError {
    WiserError::Storage {
        source: format!("injected {op} failure").into(),
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_enqueue(&self, fail: bool) {
        self.lock().fail_enqueue = fail;
    }

    pub fn fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    /// Make `remove` of this id fail.
    pub fn fail_remove(&self, id: &str) {
        self.lock().fail_remove.insert(id.to_string());
    }

    /// Sorted ids currently queued.
    pub fn ids(&self) -> Vec<String> {
        self.lock().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for MemoryQueue {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Queue
    }

    async fn health_check(&self) -> Result<HealthStatus, WiserError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WiserError> {
        Ok(())
    }
}

#[async_trait]
impl OfflineQueue for MemoryQueue {
    async fn enqueue(&self, message: &QueuedMessage) -> Result<(), WiserError> {
        let mut state = self.lock();
        if state.fail_enqueue {
            return Err(injected("enqueue"));
        }
        let mut entry = message.clone();
        entry.pending = true;
        state.entries.insert(entry.id.0.clone(), entry);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<QueuedMessage>, WiserError> {
        let state = self.lock();
        if state.fail_list {
            return Err(injected("list"));
        }
        Ok(state.entries.values().cloned().collect())
    }

    async fn remove(&self, id: &MessageId) -> Result<(), WiserError> {
        let mut state = self.lock();
        if state.fail_remove.contains(id.as_str()) {
            return Err(injected("remove"));
        }
        state.entries.remove(id.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiser_core::Role;

    #[tokio::test]
    async fn behaves_like_a_keyed_queue() {
        let queue = MemoryQueue::new();
        let msg = QueuedMessage::new("c1", Role::User, "a").with_id("m1");
        queue.enqueue(&msg).await.unwrap();
        queue.enqueue(&msg).await.unwrap();
        assert_eq!(queue.ids(), vec!["m1"]);

        queue.remove(&MessageId::from("absent")).await.unwrap();
        queue.remove(&msg.id).await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn injected_failures_surface_as_storage_errors() {
        let queue = MemoryQueue::new();
        queue.fail_list(true);
        assert!(matches!(
            queue.list_all().await,
            Err(WiserError::Storage { .. })
        ));
    }
}
