// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the REST messages endpoint.

use serde::{Deserialize, Serialize};
use wiser_core::types::{format_timestamp, QueuedMessage};

/// One row of the remote `messages` table, as sent in the insert body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRow<'a> {
    pub id: &'a str,
    pub chat_id: &'a str,
    pub content: &'a str,
    pub role: String,
    pub mode: Option<&'a str>,
    pub created_at: String,
}

impl<'a> From<&'a QueuedMessage> for MessageRow<'a> {
    fn from(msg: &'a QueuedMessage) -> Self {
        Self {
            id: msg.id.as_str(),
            chat_id: msg.chat_id.as_str(),
            content: &msg.content,
            role: msg.role.to_string(),
            mode: msg.mode.as_deref(),
            created_at: format_timestamp(&msg.created_at),
        }
    }
}

/// Error body returned by the REST layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiser_core::Role;

    #[test]
    fn row_keeps_original_created_at_and_null_mode() {
        let msg = QueuedMessage::new("c1", Role::User, "hello")
            .with_id("m1")
            .with_created_at(Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap());
        let json = serde_json::to_value(MessageRow::from(&msg)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "m1",
                "chat_id": "c1",
                "content": "hello",
                "role": "user",
                "mode": null,
                "created_at": "2026-02-03T04:05:06.000Z"
            })
        );
    }

    #[test]
    fn error_body_tolerates_missing_fields() {
        let err: ApiErrorResponse =
            serde_json::from_str(r#"{"message":"JWT expired","code":"PGRST301"}"#).unwrap();
        assert_eq!(err.code.as_deref(), Some("PGRST301"));
        assert!(err.hint.is_none());
    }
}
