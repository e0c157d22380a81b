// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline reconciliation for the Wiser chat client.
//!
//! - [`ConnectivityObserver`] holds the host-reported network status
//! - [`ReconciliationWorker`] replays the offline queue, one drain at a time
//! - [`Outbox`] sends directly when possible and queues otherwise
//! - [`SyncRunner`] turns reconnects and wake signals into drains
//! - [`wake`] bridges the host's background wake facility

pub mod connectivity;
pub mod outbox;
pub mod runner;
pub mod shutdown;
pub mod wake;
pub mod worker;

pub use connectivity::{ConnectivityCallback, ConnectivityObserver, Subscription};
pub use outbox::{Outbox, SendOutcome};
pub use runner::{RunnerConfig, SyncRunner};
pub use wake::{register_wake_callback, SignalWakeHost, WakeBridge, WakeMessage};
pub use worker::{sync_notification, ReconciliationWorker, WorkerState, DEFAULT_WRITE_TIMEOUT};
