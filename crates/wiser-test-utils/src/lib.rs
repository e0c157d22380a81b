// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Wiser sync tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a live backend.
//!
//! # Components
//!
//! - [`MockRemoteWriter`] - In-memory backend with failure and latency injection
//! - [`MemoryQueue`] - Non-durable offline queue with storage failure injection
//! - [`MockNotifier`] - Captures user-facing notifications
//! - [`StaticAuth`] / [`MockWakeHost`] - Host stand-ins
//! - [`TestHarness`] - SQLite-backed queue wired into a real worker

pub mod harness;
pub mod mock_host;
pub mod mock_notifier;
pub mod mock_queue;
pub mod mock_remote;

use std::time::Duration;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_host::{MockWakeHost, StaticAuth};
pub use mock_notifier::MockNotifier;
pub use mock_queue::MemoryQueue;
pub use mock_remote::MockRemoteWriter;

/// Polls `condition` until it holds or `timeout` elapses. Returns the final result.
pub async fn wait_for<F>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
