// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host background-execution facility.

use std::sync::Arc;

use crate::error::WiserError;

/// Callback the host invokes when it decides a background sync may run.
pub type WakeCallback = Arc<dyn Fn() + Send + Sync>;

/// Best-effort registration with the host's background scheduler.
///
/// Registration is advisory. Hosts without such a facility return
/// [`WiserError::Unsupported`]; callers treat that as a missed opportunity,
/// never as a failure.
pub trait BackgroundWakeHost: Send + Sync {
    fn register(&self, callback: WakeCallback) -> Result<(), WiserError>;
}
