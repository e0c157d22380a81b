// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote message-write endpoint.

use async_trait::async_trait;

use crate::error::WiserError;
use crate::types::QueuedMessage;

/// Writes a message to the hosted backend.
///
/// The write must be an idempotent insert keyed by `message.id`: writing the
/// same id twice never produces a second remote row. Implementations return
/// [`WiserError::RemoteWrite`] (or [`WiserError::Timeout`]) on failure.
#[async_trait]
pub trait RemoteMessageWriter: Send + Sync {
    async fn write_message(&self, message: &QueuedMessage) -> Result<(), WiserError>;
}
