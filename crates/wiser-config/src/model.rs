// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Wiser offline sync core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Wiser configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WiserConfig {
    /// Host process settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Local durable queue settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reconciliation timing.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Hosted backend endpoint and credentials.
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Host process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage configuration for the offline queue.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "wiser-offline.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Reconciliation worker timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Delay between an online transition and the drain it triggers.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Upper bound for a single remote write.
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,

    /// Drain once at startup when already online and signed in.
    #[serde(default = "default_drain_on_startup")]
    pub drain_on_startup: bool,
}

impl SyncConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            write_timeout_secs: default_write_timeout_secs(),
            drain_on_startup: default_drain_on_startup(),
        }
    }
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_write_timeout_secs() -> u64 {
    10
}

fn default_drain_on_startup() -> bool {
    true
}

/// Hosted backend (REST) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`. `None` means no remote configured.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Public API key sent as the `apikey` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Signed-in user's access token. Its presence is what "authenticated" means
    /// for the host binary.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Table receiving synced messages.
    #[serde(default = "default_messages_table")]
    pub messages_table: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            access_token: None,
            messages_table: default_messages_table(),
        }
    }
}

fn default_messages_table() -> String {
    "messages".to_string()
}
