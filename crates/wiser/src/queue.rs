// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wiser enqueue`, `wiser list`, `wiser remove` and `wiser clear`.

use wiser_config::WiserConfig;
use wiser_core::types::{format_timestamp, MessageId, QueuedMessage, Role};
use wiser_core::{OfflineQueue, PluginAdapter, WiserError};

use crate::host::open_queue;

/// Arguments for `wiser enqueue`.
#[derive(Debug, Clone)]
pub struct EnqueueArgs {
    pub chat_id: String,
    pub role: Role,
    pub mode: Option<String>,
    pub id: Option<String>,
    pub content: String,
}

impl EnqueueArgs {
    fn into_message(self) -> QueuedMessage {
        let mut message = QueuedMessage::new(self.chat_id, self.role, self.content);
        if let Some(id) = self.id {
            message = message.with_id(id);
        }
        if let Some(mode) = self.mode {
            message = message.with_mode(mode);
        }
        message
    }
}

/// Queues a message for the next drain and prints its id.
pub async fn run_enqueue(config: &WiserConfig, args: EnqueueArgs) -> Result<(), WiserError> {
    let queue = open_queue(config).await?;
    let message = args.into_message();
    queue.enqueue(&message).await?;
    queue.shutdown().await?;
    println!("{}", message.id);
    Ok(())
}

/// Prints every queued message, oldest first.
pub async fn run_list(config: &WiserConfig, json: bool) -> Result<(), WiserError> {
    let queue = open_queue(config).await?;
    let listed = queue.list_all().await;
    queue.shutdown().await?;
    let mut messages = listed?;
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    if json {
        let rendered = serde_json::to_string_pretty(&messages)
            .map_err(|e| WiserError::Internal(format!("failed to render queue: {e}")))?;
        println!("{rendered}");
    } else if messages.is_empty() {
        println!("offline queue is empty");
    } else {
        for message in &messages {
            println!("{}", format_row(message));
        }
    }
    Ok(())
}

/// Removes one entry without syncing it.
pub async fn run_remove(config: &WiserConfig, id: &str) -> Result<(), WiserError> {
    let queue = open_queue(config).await?;
    queue.remove(&MessageId::from(id)).await?;
    queue.shutdown().await?;
    println!("removed {id}");
    Ok(())
}

/// Drops every queued entry.
pub async fn run_clear(config: &WiserConfig) -> Result<(), WiserError> {
    let queue = open_queue(config).await?;
    let removed = queue.clear().await?;
    queue.shutdown().await?;
    println!("cleared {removed} queued message(s)");
    Ok(())
}

fn format_row(message: &QueuedMessage) -> String {
    let mode = message.mode.as_deref().unwrap_or("-");
    format!(
        "{}  {}  chat={}  role={}  mode={}  {}",
        message.id,
        format_timestamp(&message.created_at),
        message.chat_id,
        message.role,
        mode,
        preview(&message.content, 48)
    )
}

/// First `max` characters of `content` on one line.
fn preview(content: &str, max: usize) -> String {
    let flat: String = content
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
