//! The event channel contract.

use crate::types::{EventKind, ListenerId, SetEvent};
use std::sync::Arc;

/// A registered callback.
pub type Listener<V> = Arc<dyn Fn(&SetEvent<V>) + Send + Sync>;

/// Listener registration and delivery for one collection instance.
///
/// Implementations must deliver synchronously: `emit` invokes every listener
/// registered for the event's kind, in registration order, exactly once, and
/// returns only after the last listener returned. Nothing is buffered,
/// retried or deferred.
///
/// `emit` must not hold internal locks while a listener runs, since
/// listeners routinely re-enter the collection (a subset mirroring a change
/// emits on its own channel from inside the master's dispatch).
pub trait EventChannel<V>: Send + Sync + 'static {
    /// Deliver `event` to every listener registered for its kind.
    fn emit(&self, event: &SetEvent<V>);

    /// Register a listener and return its id.
    fn on(&self, kind: EventKind, listener: Listener<V>) -> ListenerId;

    /// Deregister one listener. Returns false if it was not registered.
    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool;

    /// Deregister every listener.
    fn remove_all_listeners(&self);

    /// Number of listeners currently registered for `kind`.
    fn listener_count(&self, kind: EventKind) -> usize;

    /// A fresh channel with no listeners and the same configuration.
    ///
    /// Used to equip a derived subset with a channel of its own.
    fn sibling(&self) -> Self
    where
        Self: Sized;
}
