// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stand-ins for the host application's auth state and wake facility.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use wiser_core::{AuthState, BackgroundWakeHost, WakeCallback, WiserError};

/// Auth state toggled by the test.
#[derive(Debug)]
pub struct StaticAuth {
    authenticated: AtomicBool,
}

impl StaticAuth {
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated: AtomicBool::new(authenticated),
        }
    }

    pub fn set(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }
}

impl AuthState for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }
}

enum Support {
    Supported,
    Unsupported,
    Failing(String),
}

/// A [`BackgroundWakeHost`] whose wakes are fired by the test.
pub struct MockWakeHost {
    support: Support,
    callback: Mutex<Option<WakeCallback>>,
}

impl MockWakeHost {
    /// A host that accepts registration.
    pub fn new() -> Self {
        Self::with_support(Support::Supported)
    }

    /// A host on a platform without background wake.
    pub fn unsupported() -> Self {
        Self::with_support(Support::Unsupported)
    }

    /// A host whose registration fails with an internal error.
    pub fn failing(reason: &str) -> Self {
        Self::with_support(Support::Failing(reason.to_string()))
    }

    fn with_support(support: Support) -> Self {
        Self {
            support,
            callback: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<WakeCallback>> {
        self.callback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_registered(&self) -> bool {
        self.lock().is_some()
    }

    /// Simulates the host waking the app. Returns whether a callback ran.
    pub fn fire(&self) -> bool {
        let callback = self.lock().clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl Default for MockWakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundWakeHost for MockWakeHost {
    fn register(&self, callback: WakeCallback) -> Result<(), WiserError> {
        match &self.support {
            Support::Supported => {
                *self.lock() = Some(callback);
                Ok(())
            }
            Support::Unsupported => Err(WiserError::Unsupported {
                feature: "background wake".to_string(),
            }),
            Support::Failing(reason) => Err(WiserError::Internal(reason.clone())),
        }
    }
}
