// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the `offline_messages` table.
//!
//! The canonical message type is [`wiser_core::QueuedMessage`]; rows are read
//! as plain strings and decoded outside the connection thread.

use std::str::FromStr;

use thiserror::Error;
pub use wiser_core::types::{MessageId, QueuedMessage, Role};
use wiser_core::types::{format_timestamp, parse_timestamp, ChatId};

/// A raw `offline_messages` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: String,
    pub chat_id: String,
    pub content: String,
    pub role: String,
    pub mode: Option<String>,
    pub created_at: String,
}

/// A row that cannot be turned back into a [`QueuedMessage`].
#[derive(Debug, Error)]
pub enum RowDecodeError {
    #[error("row {id}: unknown role `{role}`")]
    Role { id: String, role: String },

    #[error("row {id}: bad created_at `{value}`: {source}")]
    CreatedAt {
        id: String,
        value: String,
        source: chrono::ParseError,
    },
}

impl From<&QueuedMessage> for StoredMessage {
    fn from(msg: &QueuedMessage) -> Self {
        Self {
            id: msg.id.0.clone(),
            chat_id: msg.chat_id.0.clone(),
            content: msg.content.clone(),
            role: msg.role.to_string(),
            mode: msg.mode.clone(),
            created_at: format_timestamp(&msg.created_at),
        }
    }
}

impl TryFrom<StoredMessage> for QueuedMessage {
    type Error = RowDecodeError;

    fn try_from(row: StoredMessage) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(|_| RowDecodeError::Role {
            id: row.id.clone(),
            role: row.role.clone(),
        })?;
        let created_at =
            parse_timestamp(&row.created_at).map_err(|source| RowDecodeError::CreatedAt {
                id: row.id.clone(),
                value: row.created_at.clone(),
                source,
            })?;
        Ok(QueuedMessage {
            id: MessageId(row.id),
            chat_id: ChatId(row.chat_id),
            content: row.content,
            role,
            mode: row.mode,
            created_at,
            pending: true,
        })
    }
}
