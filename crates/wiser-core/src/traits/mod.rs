// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the sync core.
//!
//! Concrete backends live in their own crates (`wiser-storage`,
//! `wiser-remote`) or in the host binary.

pub mod adapter;
pub mod auth;
pub mod notify;
pub mod queue;
pub mod remote;
pub mod wake;

pub use adapter::PluginAdapter;
pub use auth::AuthState;
pub use notify::NotificationSink;
pub use queue::OfflineQueue;
pub use remote::RemoteMessageWriter;
pub use wake::{BackgroundWakeHost, WakeCallback};
