// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send path that falls back to the offline queue.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use wiser_core::types::QueuedMessage;
use wiser_core::{AuthState, OfflineQueue, RemoteMessageWriter, WiserError};

use crate::connectivity::ConnectivityObserver;
use crate::worker::DEFAULT_WRITE_TIMEOUT;

/// Where a sent message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written to the backend directly.
    Delivered,
    /// Persisted locally; the reconciliation worker will replay it.
    Queued,
}

/// Writes messages remotely when possible and queues them otherwise.
pub struct Outbox {
    queue: Arc<dyn OfflineQueue>,
    remote: Arc<dyn RemoteMessageWriter>,
    auth: Arc<dyn AuthState>,
    connectivity: ConnectivityObserver,
    write_timeout: Duration,
}

impl Outbox {
    pub fn new(
        queue: Arc<dyn OfflineQueue>,
        remote: Arc<dyn RemoteMessageWriter>,
        auth: Arc<dyn AuthState>,
        connectivity: ConnectivityObserver,
    ) -> Self {
        Self {
            queue,
            remote,
            auth,
            connectivity,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Delivers `message` or queues it. Only a storage failure is an error.
    pub async fn send(&self, message: &QueuedMessage) -> Result<SendOutcome, WiserError> {
        if self.connectivity.is_online() && self.auth.is_authenticated() {
            let write =
                tokio::time::timeout(self.write_timeout, self.remote.write_message(message))
                    .await
                    .unwrap_or(Err(WiserError::Timeout {
                        duration: self.write_timeout,
                    }));
            match write {
                Ok(()) => {
                    debug!(id = %message.id, "message delivered");
                    return Ok(SendOutcome::Delivered);
                }
                Err(e) => info!(id = %message.id, error = %e, "send failed, queueing offline"),
            }
        } else {
            debug!(id = %message.id, "offline or signed out, queueing");
        }

        self.queue.enqueue(message).await?;
        Ok(SendOutcome::Queued)
    }
}
