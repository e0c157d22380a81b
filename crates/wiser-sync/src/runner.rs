// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-running task that turns triggers into drains.
//!
//! The runner listens for connectivity transitions and background wake
//! requests and hands each to the [`ReconciliationWorker`]. Drains run on
//! their own tasks so an overlapping trigger reaches the worker and is
//! dropped by its single-flight flag instead of being queued behind it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wiser_config::model::SyncConfig;
use wiser_core::types::Trigger;
use wiser_core::{AuthState, WakeCallback};

use crate::connectivity::ConnectivityObserver;
use crate::worker::ReconciliationWorker;

/// Runner timing and startup behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Delay between an online transition and the drain it triggers.
    pub reconnect_delay: Duration,
    /// Drain once at start when already online and authenticated.
    pub drain_on_startup: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(1000),
            drain_on_startup: true,
        }
    }
}

impl From<&SyncConfig> for RunnerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay(),
            drain_on_startup: config.drain_on_startup,
        }
    }
}

#[derive(Debug)]
enum Event {
    Connectivity(bool),
    Wake,
}

/// Handle to a running sync task.
pub struct SyncRunner {
    events: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SyncRunner {
    /// Subscribes to `connectivity` and spawns the trigger loop.
    ///
    /// Must be called from within a tokio runtime. The loop exits when
    /// `cancel` fires; drains already in flight are allowed to finish.
    pub fn start(
        worker: Arc<ReconciliationWorker>,
        connectivity: ConnectivityObserver,
        auth: Arc<dyn AuthState>,
        config: RunnerConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let subscription = {
            let tx = tx.clone();
            connectivity.subscribe(move |online| {
                let _ = tx.send(Event::Connectivity(online));
            })
        };

        // Decided before the loop is first polled: a transition reported after
        // this point goes through the reconnect delay.
        let startup =
            config.drain_on_startup && connectivity.is_online() && auth.is_authenticated();

        let task = TriggerLoop {
            worker,
            connectivity,
            auth,
            config,
            cancel: cancel.clone(),
            tasks: JoinSet::new(),
        };
        let handle = tokio::spawn(async move {
            task.run(startup, rx).await;
            drop(subscription);
            debug!("sync runner unsubscribed from connectivity");
        });

        Self {
            events: tx,
            cancel,
            handle,
        }
    }

    /// Callback suitable for [`crate::wake::register_wake_callback`].
    pub fn wake_callback(&self) -> WakeCallback {
        let tx = self.events.clone();
        Arc::new(move || {
            let _ = tx.send(Event::Wake);
        })
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the loop to exit after its token is cancelled elsewhere.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            error!(error = %e, "sync runner task failed");
        }
    }

    /// Cancels the loop and waits for in-flight drains to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.join().await;
    }
}

struct TriggerLoop {
    worker: Arc<ReconciliationWorker>,
    connectivity: ConnectivityObserver,
    auth: Arc<dyn AuthState>,
    config: RunnerConfig,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl TriggerLoop {
    async fn run(mut self, startup: bool, mut events: mpsc::UnboundedReceiver<Event>) {
        info!(
            reconnect_delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "sync runner started"
        );

        if startup {
            self.spawn_drain(Trigger::Startup);
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(event) = events.recv() => self.handle(event),
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "sync task ended abnormally");
                    }
                }
            }
        }

        // Pending debounces observe the token; running drains complete.
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "sync task ended abnormally");
            }
        }
        info!("sync runner stopped");
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Connectivity(true) => {
                if !self.auth.is_authenticated() {
                    debug!("back online but signed out, not scheduling drain");
                    return;
                }
                self.spawn_debounced_drain();
            }
            Event::Connectivity(false) => debug!("went offline"),
            Event::Wake => self.spawn_drain(Trigger::Wake),
        }
    }

    fn spawn_drain(&mut self, trigger: Trigger) {
        let worker = self.worker.clone();
        self.tasks.spawn(async move { run_drain(&worker, trigger).await });
    }

    fn spawn_debounced_drain(&mut self) {
        let worker = self.worker.clone();
        let connectivity = self.connectivity.clone();
        let auth = self.auth.clone();
        let cancel = self.cancel.clone();
        let delay = self.config.reconnect_delay;

        self.tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if !connectivity.is_online() || !auth.is_authenticated() {
                debug!("connectivity or session lost during reconnect delay");
                return;
            }
            run_drain(&worker, Trigger::Reconnected).await;
        });
    }
}

async fn run_drain(worker: &ReconciliationWorker, trigger: Trigger) {
    match worker.drain(trigger).await {
        Ok(outcome) => debug!(%trigger, ?outcome, "drain finished"),
        Err(e) => error!(%trigger, error = %e, "drain failed"),
    }
}
