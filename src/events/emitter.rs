//! Default in-process event channel.

use super::channel::{EventChannel, Listener};
use crate::types::{EventKind, ListenerId, SetEvent};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Listener count per event kind above which a leak warning is logged.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Emitter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Warn once per event kind when more listeners than this are registered.
    /// `0` disables the check.
    /// Default: 10
    pub max_listeners: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}

/// Internal listener state.
struct Registration<V> {
    id: ListenerId,
    kind: EventKind,
    listener: Listener<V>,
}

/// Synchronous, registration-ordered event channel.
///
/// Listeners are snapshotted before dispatch, so a listener may register or
/// remove listeners (or mutate the collection) while an event is delivered.
/// A listener removed during a dispatch still receives that dispatch; one
/// added during a dispatch first sees the next event.
pub struct Emitter<V> {
    config: EmitterConfig,
    /// Registered listeners in registration order.
    listeners: RwLock<Vec<Registration<V>>>,
    /// Counter for generating listener IDs.
    next_id: AtomicU64,
    /// Kinds that already triggered the leak warning.
    warned: Mutex<HashSet<EventKind>>,
}

impl<V> Emitter<V> {
    /// Create an emitter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Create an emitter with a custom configuration.
    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            config,
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    fn check_leak(&self, kind: EventKind, count: usize) {
        let max = self.config.max_listeners;
        if max == 0 || count <= max {
            return;
        }

        if self.warned.lock().insert(kind) {
            warn!(
                event = kind.name(),
                count,
                max,
                "possible listener leak: more listeners than max_listeners registered"
            );
        }
    }
}

impl<V> EventChannel<V> for Emitter<V>
where
    V: Send + Sync + 'static,
{
    fn emit(&self, event: &SetEvent<V>) {
        let kind = event.kind();

        let listeners: Vec<Listener<V>> = {
            let registrations = self.listeners.read();
            registrations
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| Arc::clone(&r.listener))
                .collect()
        };

        for listener in listeners {
            listener(event);
        }
    }

    fn on(&self, kind: EventKind, listener: Listener<V>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));

        let count = {
            let mut registrations = self.listeners.write();
            registrations.push(Registration { id, kind, listener });
            registrations.iter().filter(|r| r.kind == kind).count()
        };

        self.check_leak(kind, count);
        id
    }

    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        // Listeners are dropped unlocked: their captures may re-enter this emitter.
        let removed = {
            let mut registrations = self.listeners.write();
            let index = registrations
                .iter()
                .position(|r| r.id == id && r.kind == kind);
            index.map(|index| registrations.remove(index))
        };
        removed.is_some()
    }

    fn remove_all_listeners(&self) {
        let removed = std::mem::take(&mut *self.listeners.write());
        drop(removed);
    }

    fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    fn sibling(&self) -> Self {
        Self::with_config(self.config.clone())
    }
}

impl<V> Default for Emitter<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Emitter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("config", &self.config)
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
