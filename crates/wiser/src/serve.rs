// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wiser serve` command implementation.
//!
//! Keeps a sync runner alive for the life of the process. The embedding host
//! reports connectivity and background messages as lines on stdin:
//!
//! - `online` / `offline` report a connectivity change
//! - any other line is a background message tag (`sync-requested` drains)
//!
//! `SIGHUP` also requests a sync. `SIGINT`/`SIGTERM` stop the runner after
//! any in-flight drain finishes.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wiser_config::WiserConfig;
use wiser_core::{AuthState, PluginAdapter, WiserError};
use wiser_remote::HttpMessageWriter;
use wiser_sync::shutdown;
use wiser_sync::{
    ConnectivityObserver, ReconciliationWorker, RunnerConfig, SignalWakeHost, SyncRunner,
    WakeBridge,
};

use crate::host::{open_queue, ConfigAuth, ConsoleNotifier};

/// Runs the `wiser serve` command until SIGINT or SIGTERM.
pub async fn run_serve(config: WiserConfig, start_offline: bool) -> Result<(), WiserError> {
    info!("starting wiser serve");

    let remote = Arc::new(HttpMessageWriter::new(&config)?);
    let queue = open_queue(&config).await?;
    let auth: Arc<dyn AuthState> = Arc::new(ConfigAuth::from_config(&config));
    if !auth.is_authenticated() {
        warn!("no access token configured, queued messages will not sync");
    }

    let connectivity = ConnectivityObserver::new(!start_offline);
    let worker = Arc::new(
        ReconciliationWorker::new(
            queue.clone(),
            remote,
            auth.clone(),
            connectivity.clone(),
            Arc::new(ConsoleNotifier),
        )
        .with_write_timeout(config.sync.write_timeout()),
    );

    let cancel = shutdown::install_signal_handler();
    let runner = SyncRunner::start(
        worker,
        connectivity.clone(),
        auth,
        RunnerConfig::from(&config.sync),
        cancel.clone(),
    );

    let bridge = WakeBridge::new(runner.wake_callback());
    bridge.register_with(&SignalWakeHost::new(cancel.clone()));

    let host_input = tokio::spawn(read_host_events(connectivity, bridge, cancel));

    runner.join().await;
    host_input.abort();
    queue.shutdown().await?;
    info!("wiser serve stopped");
    Ok(())
}

/// What one stdin line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HostEvent {
    Connectivity(bool),
    Message(String),
}

fn parse_host_line(line: &str) -> Option<HostEvent> {
    match line.trim() {
        "" => None,
        "online" => Some(HostEvent::Connectivity(true)),
        "offline" => Some(HostEvent::Connectivity(false)),
        tag => Some(HostEvent::Message(tag.to_string())),
    }
}

fn apply_host_event(event: HostEvent, connectivity: &ConnectivityObserver, bridge: &WakeBridge) {
    match event {
        HostEvent::Connectivity(online) => {
            connectivity.set_online(online);
        }
        HostEvent::Message(tag) => {
            bridge.handle_tag(&tag);
        }
    }
}

async fn read_host_events(
    connectivity: ConnectivityObserver,
    bridge: WakeBridge,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Some(event) = parse_host_line(&line) {
                        apply_host_event(event, &connectivity, &bridge);
                    }
                }
                Ok(None) => {
                    debug!("host input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read host input");
                    break;
                }
            }
        }
    }
}
