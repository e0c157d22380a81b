// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable on-device queue of messages awaiting remote confirmation.

use async_trait::async_trait;

use crate::error::WiserError;
use crate::types::{MessageId, QueuedMessage};

/// Persistent store of [`QueuedMessage`] entries keyed by id.
///
/// Every call goes to durable storage; implementations must not layer a cache
/// on top, so a read always reflects what survives a restart.
#[async_trait]
pub trait OfflineQueue: Send + Sync {
    /// Inserts the message, overwriting any entry with the same id.
    async fn enqueue(&self, message: &QueuedMessage) -> Result<(), WiserError>;

    /// Returns every queued entry. Order is unspecified.
    async fn list_all(&self) -> Result<Vec<QueuedMessage>, WiserError>;

    /// Deletes the entry with this id. Absent ids are not an error.
    async fn remove(&self, id: &MessageId) -> Result<(), WiserError>;
}
