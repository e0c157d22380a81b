// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the OfflineQueue trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use wiser_config::model::StorageConfig;
use wiser_core::types::{MessageId, QueuedMessage};
use wiser_core::{AdapterType, HealthStatus, OfflineQueue, PluginAdapter, WiserError};

use crate::database::Database;
use crate::models::StoredMessage;
use crate::queries;

/// SQLite-backed offline message queue.
///
/// Wraps a [`Database`] handle owned by this instance, so separate queues
/// (for example one per test) never share state. The database is lazily
/// opened by [`SqliteOfflineQueue::initialize`].
pub struct SqliteOfflineQueue {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteOfflineQueue {
    /// Create a new queue with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize a queue in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, WiserError> {
        let queue = Self::new(config);
        queue.initialize().await?;
        Ok(queue)
    }

    /// Opens the database and applies migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), WiserError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WiserError::Storage {
            source: "offline queue already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "offline queue initialized");
        Ok(())
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, WiserError> {
        self.db.get().ok_or_else(|| WiserError::Storage {
            source: "offline queue not initialized -- call initialize() first".into(),
        })
    }

    /// Number of queued messages.
    pub async fn count(&self) -> Result<usize, WiserError> {
        let n = queries::offline_messages::count(self.db()?).await?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Drops every queued message without syncing it.
    pub async fn clear(&self) -> Result<usize, WiserError> {
        let removed = queries::offline_messages::clear(self.db()?).await?;
        debug!(removed, "offline queue cleared");
        Ok(removed)
    }
}

#[async_trait]
impl PluginAdapter for SqliteOfflineQueue {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Queue
    }

    async fn health_check(&self) -> Result<HealthStatus, WiserError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1 FROM offline_messages LIMIT 1;")?;
                Ok(())
            })
            .await;
        Ok(match probe {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), WiserError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl OfflineQueue for SqliteOfflineQueue {
    async fn enqueue(&self, message: &QueuedMessage) -> Result<(), WiserError> {
        queries::offline_messages::enqueue(self.db()?, StoredMessage::from(message)).await?;
        debug!(id = %message.id, chat_id = %message.chat_id, "message queued offline");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<QueuedMessage>, WiserError> {
        let rows = queries::offline_messages::list_all(self.db()?).await?;
        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            match QueuedMessage::try_from(row) {
                Ok(msg) => messages.push(msg),
                // Undecodable rows can never sync; skip them rather than wedge every drain.
                Err(e) => warn!(error = %e, "skipping unreadable offline queue row"),
            }
        }
        Ok(messages)
    }

    async fn remove(&self, id: &MessageId) -> Result<(), WiserError> {
        let removed = queries::offline_messages::remove(self.db()?, id.as_str()).await?;
        debug!(id = %id, removed, "offline queue remove");
        Ok(())
    }
}
