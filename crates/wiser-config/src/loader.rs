// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wiser.toml` > `~/.config/wiser/wiser.toml` > `/etc/wiser/wiser.toml`
//! with environment variable overrides via `WISER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WiserConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wiser/wiser.toml` (system-wide)
/// 3. `~/.config/wiser/wiser.toml` (user XDG config)
/// 4. `./wiser.toml` (local directory)
/// 5. `WISER_*` environment variables
pub fn load_config() -> Result<WiserConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<WiserConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WiserConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WiserConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WiserConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config files in merge order, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/wiser/wiser.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("wiser/wiser.toml"));
    }
    paths.push(PathBuf::from("wiser.toml"));
    paths
}

/// The figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(WiserConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` and not `Env::split("_")`: `WISER_SYNC_WRITE_TIMEOUT_SECS`
/// must map to `sync.write_timeout_secs`, not `sync.write.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("WISER_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env var name to its dotted, lowercase config key.
///
/// figment hands over the variable name in its original case.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["client", "storage", "sync", "remote"];
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
