//! Sync event bus
//!
//! Typed publish/subscribe for sync lifecycle events. Listeners are plain
//! closures keyed by [`EventKind`] that report failure by returning a
//! [`ListenerError`]; the bus logs it and keeps delivering to the others.
//!
//! A panicking listener is only contained when the binary unwinds. Release
//! builds set `panic = "abort"`, so listeners must not panic.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tracing::{trace, warn};

/// Events published by the sync orchestrator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// Data is older than the staleness threshold (or was never fetched)
    DataStale { age: Option<Duration> },
    Refreshed { orders: usize, files_ok: usize, files_failed: usize, signature: String },
    Invalidated { reason: String },
    Error { kind: String, message: String, context: String },
}

impl SyncEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DataStale { .. } => EventKind::DataStale,
            Self::Refreshed { .. } => EventKind::Refreshed,
            Self::Invalidated { .. } => EventKind::Invalidated,
            Self::Error { .. } => EventKind::Error,
        }
    }
}

/// Subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DataStale,
    Refreshed,
    Invalidated,
    Error,
}

/// Error returned by a listener; logged by the bus.
///
/// This is the only failure channel that survives every build profile.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type ListenerResult = Result<(), ListenerError>;

type Listener = Arc<dyn Fn(&SyncEvent) -> ListenerResult + Send + Sync>;

#[derive(Clone)]
struct Registration {
    id: u64,
    once: bool,
    listener: Listener,
}

#[derive(Default)]
struct BusInner {
    listeners: Mutex<HashMap<EventKind, Vec<Registration>>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn remove(&self, kind: EventKind, id: u64) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(registrations) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        before != registrations.len()
    }
}

/// Handle returned by [`EventBus::on`] and [`EventBus::once`]
#[derive(Debug, Clone)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener. Returns false when it was already gone.
    pub fn unsubscribe(&self) -> bool {
        self.bus.upgrade().is_some_and(|bus| bus.remove(self.kind, self.id))
    }
}

/// Typed event channel shared by the orchestrator and its consumers
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, kind: EventKind, once: bool, listener: Listener) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .entry(kind)
            .or_default()
            .push(Registration { id, once, listener });
        Subscription { kind, id, bus: Arc::downgrade(&self.inner) }
    }

    /// Subscribe to every event of `kind`
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&SyncEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.register(kind, false, Arc::new(listener))
    }

    /// Subscribe to the next event of `kind` only
    pub fn once<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&SyncEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.register(kind, true, Arc::new(listener))
    }

    pub fn off(&self, kind: EventKind, id: u64) -> bool {
        self.inner.remove(kind, id)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.listeners.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver an event to its listeners; returns how many were invoked.
    ///
    /// Listeners run outside the registry lock so they may subscribe or
    /// unsubscribe from within a callback. A listener error is logged and
    /// delivery continues; a panic is caught only under `panic = "unwind"`.
    pub fn emit(&self, event: &SyncEvent) -> usize {
        let kind = event.kind();
        let registrations = {
            let mut listeners = self.inner.listeners.lock();
            let Some(registered) = listeners.get_mut(&kind) else {
                return 0;
            };
            let snapshot = registered.clone();
            registered.retain(|registration| !registration.once);
            snapshot
        };

        trace!(?kind, listeners = registrations.len(), "emitting event");
        for registration in &registrations {
            let outcome = catch_unwind(AssertUnwindSafe(|| (registration.listener)(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(?kind, listener = registration.id, error = %err, "event listener failed");
                }
                Err(_) => {
                    warn!(?kind, listener = registration.id, "event listener panicked");
                }
            }
        }
        registrations.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<EventKind, usize> =
            self.inner.listeners.lock().iter().map(|(kind, regs)| (*kind, regs.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
