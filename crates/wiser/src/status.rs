// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wiser status` command implementation.
//!
//! Reports how many messages are waiting in the offline queue and whether
//! the client is able to sync them.

use std::io::IsTerminal;

use serde::Serialize;
use wiser_config::WiserConfig;
use wiser_core::{AuthState, HealthStatus, PluginAdapter, WiserError};

use crate::host::{open_queue, ConfigAuth};

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    /// `healthy`, or the reason the queue is degraded or unhealthy.
    pub queue_health: String,
    pub queued: usize,
    pub remote_configured: bool,
    pub authenticated: bool,
}

impl StatusResponse {
    /// Whether a drain would currently be attempted.
    fn can_sync(&self) -> bool {
        self.remote_configured && self.authenticated
    }
}

/// Run the `wiser status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(config: &WiserConfig, json: bool, plain: bool) -> Result<(), WiserError> {
    let queue = open_queue(config).await?;
    let health = queue.health_check().await?;
    let queued = queue.count().await?;
    queue.shutdown().await?;

    let status = StatusResponse {
        database_path: config.storage.database_path.clone(),
        queue_health: describe_health(&health),
        queued,
        remote_configured: config.remote.base_url.is_some() && config.remote.api_key.is_some(),
        authenticated: ConfigAuth::from_config(config).is_authenticated(),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&status, use_color);
    }
    Ok(())
}

fn describe_health(health: &HealthStatus) -> String {
    match health {
        HealthStatus::Healthy => "healthy".to_string(),
        HealthStatus::Degraded(reason) => format!("degraded: {reason}"),
        HealthStatus::Unhealthy(reason) => format!("unhealthy: {reason}"),
    }
}

fn print_status(status: &StatusResponse, use_color: bool) {
    println!();
    println!("  wiser status");
    println!("  {}", "-".repeat(35));
    println!("    Queue:    {} ({})", status.database_path, status.queue_health);

    if use_color {
        use colored::Colorize;
        let queued = format!("{} pending", status.queued);
        if status.queued == 0 {
            println!("    Pending:  {}", queued.green());
        } else {
            println!("    Pending:  {}", queued.yellow());
        }
        if status.can_sync() {
            println!("    Sync:     {} ready", "✓".green());
        } else {
            println!("    Sync:     {} {}", "✗".red(), sync_blocker(status).red());
        }
    } else {
        println!("    Pending:  {} pending", status.queued);
        if status.can_sync() {
            println!("    Sync:     [OK] ready");
        } else {
            println!("    Sync:     [FAIL] {}", sync_blocker(status));
        }
    }
    println!();
}

fn sync_blocker(status: &StatusResponse) -> &'static str {
    if !status.remote_configured {
        "remote.base_url / remote.api_key not set"
    } else if !status.authenticated {
        "not signed in (remote.access_token not set)"
    } else {
        "ready"
    }
}
