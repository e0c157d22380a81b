// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connectivity observer fed by the host environment.
//!
//! The host reports link status through [`ConnectivityObserver::set_online`].
//! Nothing here polls or probes reachability.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use tracing::{debug, info};

/// Callback invoked with the new status on each transition.
pub type ConnectivityCallback = Arc<dyn Fn(bool) + Send + Sync>;

struct Inner {
    state: Mutex<State>,
    /// Held for a whole delivery round. Unsubscribing from another thread
    /// waits on it, so no callback runs after `unsubscribe` returns.
    delivery: Mutex<()>,
    next_id: AtomicU64,
}

struct State {
    online: bool,
    subscribers: BTreeMap<u64, ConnectivityCallback>,
    /// Thread currently running callbacks, if any.
    delivering_on: Option<ThreadId>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the delivery lock unless this thread already holds it from
    /// inside a callback.
    fn enter_delivery(&self) -> Option<MutexGuard<'_, ()>> {
        let nested = self.lock().delivering_on == Some(thread::current().id());
        (!nested).then(|| self.delivery.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Marks the current thread as delivering; restores the previous marker on
/// drop, unwinding included.
struct DeliveringGuard<'a> {
    inner: &'a Inner,
    previous: Option<ThreadId>,
}

impl Drop for DeliveringGuard<'_> {
    fn drop(&mut self) {
        self.inner.lock().delivering_on = self.previous;
    }
}

/// Shared, cloneable view of the device's network status.
///
/// Callbacks run synchronously on the thread that reported the transition,
/// outside the state lock. They may read the status, report a new one, or
/// drop their own subscription. Rounds are serialized: a callback must not
/// block on another thread that is itself reporting or unsubscribing.
#[derive(Clone)]
pub struct ConnectivityObserver {
    inner: Arc<Inner>,
}

impl ConnectivityObserver {
    /// Creates an observer with the given initial status.
    pub fn new(initially_online: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    online: initially_online,
                    subscribers: BTreeMap::new(),
                    delivering_on: None,
                }),
                delivery: Mutex::new(()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current status as last reported by the host.
    pub fn is_online(&self) -> bool {
        self.inner.lock().online
    }

    /// Registers `callback` for every future transition.
    ///
    /// Delivery stops once the returned [`Subscription`] is unsubscribed or
    /// dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().subscribers.insert(id, Arc::new(callback));
        debug!(subscription = id, "connectivity subscriber added");
        Subscription {
            observer: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Reports the current status. Returns whether this was a transition.
    ///
    /// Reporting the status the observer already holds notifies nobody.
    pub fn set_online(&self, online: bool) -> bool {
        let _round = self.inner.enter_delivery();

        let (targets, _delivering) = {
            let mut state = self.inner.lock();
            if state.online == online {
                return false;
            }
            state.online = online;
            info!(online, subscribers = state.subscribers.len(), "connectivity changed");

            let previous = state.delivering_on.replace(thread::current().id());
            let targets: Vec<(u64, ConnectivityCallback)> = state
                .subscribers
                .iter()
                .map(|(id, callback)| (*id, callback.clone()))
                .collect();
            let guard = DeliveringGuard {
                inner: &self.inner,
                previous,
            };
            (targets, guard)
        };

        for (id, callback) in targets {
            // An earlier callback in this round may have unsubscribed it.
            let live = self.inner.lock().subscribers.contains_key(&id);
            if live {
                callback(online);
            }
        }
        true
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl Default for ConnectivityObserver {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Handle returned by [`ConnectivityObserver::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    observer: Weak<Inner>,
    id: u64,
}

impl Subscription {
    /// Stops delivery to this subscriber. No callback runs after this returns.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.observer.upgrade() {
            let _round = inner.enter_delivery();
            inner.lock().subscribers.remove(&self.id);
            debug!(subscription = self.id, "connectivity subscriber removed");
        }
    }
}
