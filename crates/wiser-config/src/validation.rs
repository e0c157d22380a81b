// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive timeouts, and well-formed URLs.

use crate::diagnostic::ConfigError;
use crate::model::WiserConfig;

/// Longest accepted reconnect debounce. Anything longer defeats the purpose of
/// draining on reconnect.
const MAX_RECONNECT_DELAY_MS: u64 = 60_000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &WiserConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid_value(
            "storage.database_path",
            "must not be empty",
            "point it at a writable file such as `wiser-offline.db`",
        ));
    }

    if config.sync.write_timeout_secs == 0 {
        errors.push(ConfigError::invalid_value(
            "sync.write_timeout_secs",
            "must be greater than 0",
            "each remote write needs a bound; the default is 10",
        ));
    }

    if config.sync.reconnect_delay_ms > MAX_RECONNECT_DELAY_MS {
        errors.push(ConfigError::invalid_value(
            "sync.reconnect_delay_ms",
            format!(
                "is {}, above the {MAX_RECONNECT_DELAY_MS} ms limit",
                config.sync.reconnect_delay_ms
            ),
            "the default of 1000 rides out brief connectivity flaps",
        ));
    }

    if let Some(url) = config.remote.base_url.as_deref()
        && !is_http_url(url)
    {
        errors.push(ConfigError::invalid_value(
            "remote.base_url",
            format!("`{url}` is not an http:// or https:// URL"),
            "use the project URL, e.g. `https://<project>.supabase.co`",
        ));
    }

    if config.remote.messages_table.trim().is_empty() {
        errors.push(ConfigError::invalid_value(
            "remote.messages_table",
            "must not be empty",
            "the backend table is normally `messages`",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split('/').next().unwrap_or_default();
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}
