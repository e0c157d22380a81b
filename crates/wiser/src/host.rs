// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-side collaborators for the command-line client.

use std::sync::Arc;

use tracing::info;
use wiser_config::WiserConfig;
use wiser_core::{AuthState, NotificationSink, WiserError};
use wiser_storage::SqliteOfflineQueue;

/// Signed in when the configuration carries a user access token.
#[derive(Debug, Clone, Copy)]
pub struct ConfigAuth {
    authenticated: bool,
}

impl ConfigAuth {
    pub fn from_config(config: &WiserConfig) -> Self {
        Self {
            authenticated: config
                .remote
                .access_token
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty()),
        }
    }
}

impl AuthState for ConfigAuth {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// Prints sync notifications to stdout.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, message: &str) {
        info!(notification = message, "user notification");
        println!("{message}");
    }
}

/// Opens the configured offline queue.
pub async fn open_queue(config: &WiserConfig) -> Result<Arc<SqliteOfflineQueue>, WiserError> {
    let queue = SqliteOfflineQueue::open(config.storage.clone()).await?;
    Ok(Arc::new(queue))
}
