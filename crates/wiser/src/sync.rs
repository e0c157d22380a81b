// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wiser sync` command implementation.
//!
//! Runs a single manual drain of the offline queue against the configured
//! backend. The device is assumed online for the duration of the command.

use std::sync::Arc;

use wiser_config::WiserConfig;
use wiser_core::types::{DrainOutcome, DrainReport, SkipReason, Trigger};
use wiser_core::{PluginAdapter, WiserError};
use wiser_remote::HttpMessageWriter;
use wiser_sync::{ConnectivityObserver, ReconciliationWorker};

use crate::host::{open_queue, ConfigAuth, ConsoleNotifier};

pub async fn run_sync(config: &WiserConfig) -> Result<(), WiserError> {
    let remote = Arc::new(HttpMessageWriter::new(config)?);
    let queue = open_queue(config).await?;

    let worker = ReconciliationWorker::new(
        queue.clone(),
        remote,
        Arc::new(ConfigAuth::from_config(config)),
        ConnectivityObserver::new(true),
        Arc::new(ConsoleNotifier),
    )
    .with_write_timeout(config.sync.write_timeout());

    let outcome = worker.drain(Trigger::Manual).await;
    queue.shutdown().await?;

    println!("{}", summarize(&outcome?));
    Ok(())
}

/// One-line summary printed after a manual drain.
fn summarize(outcome: &DrainOutcome) -> String {
    match outcome {
        DrainOutcome::Completed(DrainReport { attempted: 0, .. }) => {
            "nothing to sync".to_string()
        }
        DrainOutcome::Completed(report) if report.failed == 0 => {
            format!("sync complete: {} of {} synced", report.synced, report.attempted)
        }
        DrainOutcome::Completed(report) => format!(
            "sync incomplete: {} of {} synced, {} still queued",
            report.synced, report.attempted, report.failed
        ),
        DrainOutcome::Skipped(SkipReason::Unauthenticated) => {
            "not signed in: set remote.access_token to sync".to_string()
        }
        DrainOutcome::Skipped(reason) => format!("sync skipped: {reason}"),
    }
}
