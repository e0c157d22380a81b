// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background wake signal bridge.
//!
//! Hosts that can wake the app in the background (or deliver messages from a
//! background context) ask for a sync through this module. Registration is
//! best-effort: platforms without such a facility are silently skipped.

use std::str::FromStr;

use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wiser_core::{BackgroundWakeHost, WakeCallback, WiserError};

/// Messages a host background context can post to the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum WakeMessage {
    #[strum(serialize = "sync-requested")]
    SyncRequested,
}

impl WakeMessage {
    /// Parses a message tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::from_str(tag).ok()
    }
}

/// Asks the host to wake the app for syncs. Never fails.
///
/// [`WiserError::Unsupported`] is expected on some platforms and logged at
/// debug; any other registration error is logged at warn and dropped.
pub fn register_wake_callback(host: &dyn BackgroundWakeHost, callback: WakeCallback) {
    match host.register(callback) {
        Ok(()) => info!("background wake registered"),
        Err(WiserError::Unsupported { feature }) => {
            debug!(%feature, "background wake unavailable on this platform");
        }
        Err(e) => warn!(error = %e, "background wake registration failed"),
    }
}

/// Routes tagged messages from the host's background context to a callback.
#[derive(Clone)]
pub struct WakeBridge {
    callback: WakeCallback,
}

impl WakeBridge {
    pub fn new(callback: WakeCallback) -> Self {
        Self { callback }
    }

    /// Registers the bridge's callback with `host`.
    pub fn register_with(&self, host: &dyn BackgroundWakeHost) {
        register_wake_callback(host, self.callback.clone());
    }

    /// Handles one message by tag. Returns whether it requested a sync.
    pub fn handle_tag(&self, tag: &str) -> bool {
        match WakeMessage::from_tag(tag) {
            Some(message) => {
                self.handle(message);
                true
            }
            None => {
                debug!(tag, "ignoring background message");
                false
            }
        }
    }

    pub fn handle(&self, message: WakeMessage) {
        match message {
            WakeMessage::SyncRequested => {
                debug!("background sync requested");
                (self.callback)();
            }
        }
    }
}

/// Wake host backed by `SIGHUP`.
///
/// Each signal is delivered as [`WakeMessage::SyncRequested`]. Non-unix
/// targets report [`WiserError::Unsupported`].
pub struct SignalWakeHost {
    cancel: CancellationToken,
}

impl SignalWakeHost {
    /// The listener task stops when `cancel` fires.
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl BackgroundWakeHost for SignalWakeHost {
    #[cfg(unix)]
    fn register(&self, callback: WakeCallback) -> Result<(), WiserError> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut hangup = signal(SignalKind::hangup()).map_err(|e| {
            WiserError::Internal(format!("failed to install SIGHUP handler: {e}"))
        })?;
        let bridge = WakeBridge::new(callback);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = hangup.recv() => {
                        if received.is_none() {
                            break;
                        }
                        info!("received SIGHUP, requesting sync");
                        bridge.handle(WakeMessage::SyncRequested);
                    }
                }
            }
            debug!("SIGHUP wake listener stopped");
        });
        Ok(())
    }

    #[cfg(not(unix))]
    fn register(&self, _callback: WakeCallback) -> Result<(), WiserError> {
        Err(WiserError::Unsupported {
            feature: "SIGHUP wake".to_string(),
        })
    }
}
