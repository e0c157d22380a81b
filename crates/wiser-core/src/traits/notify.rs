// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing notification sink.

/// Displays a short status line to the user. Fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}
