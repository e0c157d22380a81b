// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the queue, the remote writer, and the sync worker.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a chat message. Doubles as the remote idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generates a fresh client-side identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the conversation a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Author of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A chat message persisted locally until the remote write is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub content: String,
    pub role: Role,
    /// Conversation mode in effect when the message was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Client-side creation time, not the remote write time.
    pub created_at: DateTime<Utc>,
    /// True while the entry lives only on the device.
    #[serde(default = "default_pending")]
    pub pending: bool,
}

fn default_pending() -> bool {
    true
}

impl QueuedMessage {
    /// Creates a pending message with a freshly generated id, stamped now.
    ///
    /// Timestamps keep millisecond precision, the precision they are stored
    /// and sent with, so a message read back from the queue compares equal.
    pub fn new(chat_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            chat_id: ChatId(chat_id.into()),
            content: content.into(),
            role,
            mode: None,
            created_at: Utc::now().trunc_subsecs(3),
            pending: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = MessageId(id.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at.trunc_subsecs(3);
        self
    }
}

/// Formats a timestamp the way it is persisted and sent to the backend
/// (RFC 3339, millisecond precision, `Z` suffix).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a timestamp produced by [`format_timestamp`] (any RFC 3339 offset is accepted).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|ts| ts.with_timezone(&Utc))
}

/// What caused a drain attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    /// Application start while already online and authenticated.
    Startup,
    /// Connectivity came back.
    Reconnected,
    /// The host's background facility asked for a sync.
    Wake,
    /// Explicit request from the host application.
    Manual,
}

/// Counts for one completed drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries in the snapshot taken at the start of the pass.
    pub attempted: usize,
    /// Entries written remotely and removed from the queue.
    pub synced: usize,
    /// Entries left queued for the next pass.
    pub failed: usize,
}

/// Why a trigger did not start a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    AlreadyDraining,
    Offline,
    Unauthenticated,
}

/// Result of handing a trigger to the reconciliation worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed(DrainReport),
    Skipped(SkipReason),
}

impl DrainOutcome {
    /// Number of entries synced, zero when the drain was skipped.
    pub fn synced(&self) -> usize {
        match self {
            DrainOutcome::Completed(report) => report.synced,
            DrainOutcome::Skipped(_) => 0,
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a collaborator trait.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Queue,
    Remote,
    Wake,
}
