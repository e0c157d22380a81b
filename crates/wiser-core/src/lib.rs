// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Wiser offline sync core.
//!
//! This crate provides the message types, error type, and collaborator traits
//! shared by the durable queue, the remote writer, and the reconciliation
//! worker. Backends implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WiserError;
pub use types::{
    AdapterType, ChatId, DrainOutcome, DrainReport, HealthStatus, MessageId, QueuedMessage, Role,
    SkipReason, Trigger,
};

pub use traits::{
    AuthState, BackgroundWakeHost, NotificationSink, OfflineQueue, PluginAdapter,
    RemoteMessageWriter, WakeCallback,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{format_timestamp, parse_timestamp};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    #[test]
    fn wiser_error_variants_render() {
        let storage = WiserError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert_eq!(storage.to_string(), "storage error: disk full");

        let remote = WiserError::RemoteWrite {
            message: "503 Service Unavailable".into(),
            source: None,
        };
        assert!(remote.is_remote_failure());

        let timeout = WiserError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        assert!(timeout.is_remote_failure());

        let unsupported = WiserError::Unsupported {
            feature: "background sync".into(),
        };
        assert!(!unsupported.is_remote_failure());
        assert!(!WiserError::Internal("x".into()).is_remote_failure());
    }

    #[test]
    fn role_parses_and_displays_lowercase() {
        use std::str::FromStr;

        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::from_str("assistant").unwrap(), Role::Assistant);
        assert!(Role::from_str("system").is_err());
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn new_message_is_pending_with_unique_id() {
        let a = QueuedMessage::new("c1", Role::User, "hello");
        let b = QueuedMessage::new("c1", Role::User, "hello");
        assert!(a.pending);
        assert_ne!(a.id, b.id);
        assert_eq!(a.chat_id, ChatId::from("c1"));
        assert!(a.mode.is_none());
    }

    #[test]
    fn timestamps_are_truncated_to_millis() {
        use chrono::Timelike;

        let fresh = QueuedMessage::new("c1", Role::User, "now");
        assert_eq!(fresh.created_at.nanosecond() % 1_000_000, 0);
        assert_eq!(parse_timestamp(&format_timestamp(&fresh.created_at)).unwrap(), fresh.created_at);

        let precise = Utc.timestamp_nanos(1_767_225_600_123_456_789);
        let msg = QueuedMessage::new("c1", Role::User, "then").with_created_at(precise);
        assert_eq!(msg.created_at, Utc.timestamp_millis_opt(1_767_225_600_123).unwrap());
    }

    #[test]
    fn builder_overrides_fields() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let msg = QueuedMessage::new("c1", Role::Assistant, "hi")
            .with_id("m1")
            .with_mode("tutor")
            .with_created_at(t0);
        assert_eq!(msg.id.as_str(), "m1");
        assert_eq!(msg.mode.as_deref(), Some("tutor"));
        assert_eq!(msg.created_at, t0);
    }

    #[test]
    fn message_json_uses_plain_ids() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let msg = QueuedMessage::new("c1", Role::User, "hello")
            .with_id("m1")
            .with_created_at(t0);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["id"], "m1");
        assert_eq!(json["chat_id"], "c1");
        assert_eq!(json["role"], "user");
        assert!(json.get("mode").is_none());
    }

    #[test]
    fn timestamp_format_is_millisecond_utc() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(&t0), "2026-03-01T12:00:00.000Z");
        let parsed = parse_timestamp("2026-03-01T13:00:00+01:00").unwrap();
        assert_eq!(parsed, t0);
    }

    #[test]
    fn drain_outcome_synced_count() {
        let report = DrainReport {
            attempted: 3,
            synced: 2,
            failed: 1,
        };
        assert_eq!(DrainOutcome::Completed(report).synced(), 2);
        assert_eq!(DrainOutcome::Skipped(SkipReason::Offline).synced(), 0);
        assert_eq!(SkipReason::AlreadyDraining.to_string(), "already_draining");
        assert_eq!(Trigger::Reconnected.to_string(), "reconnected");
    }

    proptest! {
        #[test]
        fn persisted_timestamps_keep_millisecond_precision(millis in 0i64..4_102_444_800_000) {
            let ts = Utc.timestamp_millis_opt(millis).unwrap();
            let parsed = parse_timestamp(&format_timestamp(&ts)).unwrap();
            prop_assert_eq!(parsed, ts);
        }
    }
}
