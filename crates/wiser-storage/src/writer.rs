// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer documentation and enforcement.
//!
//! All queue writes are serialized through `tokio-rusqlite`'s single
//! background thread. The `Database` struct IS the single writer.
//! Query modules accept `&Database` and call through `conn.call()`.
//!
//! **Do NOT create additional Connection instances for writes.**

// - `Database` wraps a single `tokio_rusqlite::Connection`
// - `SqliteOfflineQueue` owns exactly one `Database`
// - tokio-rusqlite serializes all closure calls on one background thread,
//   so an enqueue from the send path and a remove from a drain never race
