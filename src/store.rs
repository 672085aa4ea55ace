//! The collection interface shared by base collections and subsets.
//!
//! [`Observable`] is the event wiring: listener registration on a single
//! collection instance. [`Store`] adds the keyed read/write surface. Both
//! [`Collection`](crate::Collection) and [`Subset`](crate::Subset) implement
//! them, which is what lets a subset be derived from another subset.

use crate::error::Result;
use crate::events::{EventChannel, Subscription};
use crate::types::{CollectionId, Element, EventKind, ListenerId, SetEvent};
use parking_lot::RwLockWriteGuard;
use std::collections::HashMap;

/// Listener registration on one collection instance.
pub trait Observable<V: Element> {
    /// Identity used as `target` in every event this instance emits.
    fn id(&self) -> CollectionId;

    /// Register `listener` for `kind` events.
    ///
    /// Fails with `CollectionError::Disposed` if the collection was disposed,
    /// since a listener registered there would never fire.
    fn on<F>(&self, kind: EventKind, listener: F) -> Result<Subscription>
    where
        F: Fn(&SetEvent<V>) + Send + Sync + 'static;

    /// Deregister a listener by id. Returns false if it was not registered.
    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool;

    /// Deregister every listener on this instance.
    fn remove_all_listeners(&self);

    fn listener_count(&self, kind: EventKind) -> usize;
}

/// An observable keyed store.
///
/// Mutations notify synchronously: by the time `set` or `remove` returns,
/// every listener (and every derived subset, transitively) has seen the
/// change.
pub trait Store<V: Element>: Observable<V> + Clone + Send + Sync + 'static {
    /// Channel type used by this store and by subsets derived from it.
    type Channel: EventChannel<V>;

    fn channel(&self) -> &Self::Channel;

    /// Store `element` under `key`.
    ///
    /// No-op if the key already holds the same element (see
    /// [`Element::is_same`]). Replacing a value emits `remove` for the old
    /// value, then `add` for the new one.
    fn set(&self, key: impl Into<String>, element: V) -> &Self;

    /// `set` every pair, in the iterator's order, each with its own events.
    fn set_all<I, K>(&self, entries: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        for (key, element) in entries {
            self.set(key, element);
        }
        self
    }

    fn get(&self, key: &str) -> Option<V>;

    /// True if `key` is present, whatever its value.
    fn has(&self, key: &str) -> bool;

    /// Snapshot of all entries at call time.
    fn get_all(&self) -> HashMap<String, V>;

    /// Remove `key`, emitting `remove` if it was present.
    fn remove(&self, key: &str) -> Option<V>;

    /// Direct access to the live storage.
    ///
    /// Changes made through the guard bypass notification. Calling any other
    /// operation on the same collection while holding the guard deadlocks.
    fn entries_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, V>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release storage and every listener on this instance.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}
