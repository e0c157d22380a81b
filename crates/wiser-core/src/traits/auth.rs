// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication state provider.

/// Reports whether a user is currently signed in.
///
/// Drains only run while this returns `true`.
pub trait AuthState: Send + Sync {
    fn is_authenticated(&self) -> bool;
}
