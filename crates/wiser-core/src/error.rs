// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Wiser offline sync core.

use thiserror::Error;

/// The primary error type used across all Wiser collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum WiserError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable storage errors (database open, query failure, corrupted rows).
    ///
    /// The queue stays consistent when this is returned: the failed write did not happen.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A single remote message write failed (network, server rejection).
    #[error("remote write error: {message}")]
    RemoteWrite {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The host environment does not offer the requested facility.
    #[error("unsupported on this platform: {feature}")]
    Unsupported { feature: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WiserError {
    /// Returns `true` for failures the reconciliation worker treats as
    /// "leave the entry queued and move on".
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            WiserError::RemoteWrite { .. } | WiserError::Timeout { .. }
        )
    }
}
