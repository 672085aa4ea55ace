//! The base observable collection.

use crate::error::{CollectionError, Result};
use crate::events::{Emitter, EmitterConfig, EventChannel, Subscription};
use crate::store::{Observable, Store};
use crate::types::{CollectionId, Element, EventKind, ListenerId, SetEvent};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Shared state behind every handle to one collection.
struct CollectionInner<V, C> {
    id: CollectionId,
    entries: RwLock<HashMap<String, V>>,
    channel: C,
    disposed: AtomicBool,
}

/// A keyed store that emits `add` and `remove` events on every change.
///
/// `Collection` is a handle: cloning it is cheap and clones refer to the same
/// storage, channel and [`CollectionId`].
///
/// # Example
///
/// ```ignore
/// use keyed_set::{Collection, EventKind, Observable, Store};
///
/// let set = Collection::from_entries([("a", 1), ("b", 2)]);
/// let _added = set.on(EventKind::Add, |event| println!("{:?}", event))?;
///
/// set.set("c", 3).set("a", 10);
/// assert_eq!(set.get("a"), Some(10));
/// ```
pub struct Collection<V, C = Emitter<V>> {
    inner: Arc<CollectionInner<V, C>>,
}

impl<V: Element> Collection<V, Emitter<V>> {
    /// Create an empty collection with a default [`Emitter`].
    pub fn new() -> Self {
        Self::with_channel(Emitter::new())
    }

    /// Create an empty collection whose emitter uses `config`.
    pub fn with_config(config: EmitterConfig) -> Self {
        Self::with_channel(Emitter::with_config(config))
    }

    /// Create a collection holding `entries`, without emitting events.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        Self::from_entries_with_channel(entries, Emitter::new())
    }
}

impl<V: Element, C: EventChannel<V>> Collection<V, C> {
    /// Create an empty collection delivering events through `channel`.
    pub fn with_channel(channel: C) -> Self {
        Self::from_entries_with_channel(std::iter::empty::<(String, V)>(), channel)
    }

    /// Create a collection holding `entries` and delivering through `channel`.
    pub fn from_entries_with_channel<I, K>(entries: I, channel: C) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let entries: HashMap<String, V> = entries
            .into_iter()
            .map(|(key, element)| (key.into(), element))
            .collect();
        let id = CollectionId::next();

        debug!(collection = %id, entries = entries.len(), "collection created");

        Self {
            inner: Arc::new(CollectionInner {
                id,
                entries: RwLock::new(entries),
                channel,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Keys currently present, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.entries.read().keys().cloned().collect()
    }

    fn emit(&self, event: SetEvent<V>) {
        trace!(
            collection = %self.inner.id,
            event = event.name(),
            key = event.key(),
            "emit"
        );
        self.inner.channel.emit(&event);
    }

    /// Log and report use of a disposed collection.
    fn rejects(&self, operation: &'static str) -> bool {
        let disposed = self.inner.disposed.load(Ordering::Acquire);
        if disposed {
            warn!(collection = %self.inner.id, operation, "operation on disposed collection ignored");
        }
        disposed
    }
}

impl<V: Element, C: EventChannel<V>> Observable<V> for Collection<V, C> {
    fn id(&self) -> CollectionId {
        self.inner.id
    }

    fn on<F>(&self, kind: EventKind, listener: F) -> Result<Subscription>
    where
        F: Fn(&SetEvent<V>) + Send + Sync + 'static,
    {
        if self.is_disposed() {
            return Err(CollectionError::Disposed(self.inner.id));
        }

        let id = self.inner.channel.on(kind, Arc::new(listener));
        let weak: Weak<CollectionInner<V, C>> = Arc::downgrade(&self.inner);

        Ok(Subscription::new(kind, id, move || {
            if let Some(inner) = weak.upgrade() {
                inner.channel.remove_listener(kind, id);
            }
        }))
    }

    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.channel.remove_listener(kind, id)
    }

    fn remove_all_listeners(&self) {
        self.inner.channel.remove_all_listeners();
    }

    fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.channel.listener_count(kind)
    }
}

impl<V: Element, C: EventChannel<V>> Store<V> for Collection<V, C> {
    type Channel = C;

    fn channel(&self) -> &C {
        &self.inner.channel
    }

    fn set(&self, key: impl Into<String>, element: V) -> &Self {
        let key = key.into();
        if self.rejects("set") {
            return self;
        }

        let previous = self.inner.entries.read().get(&key).cloned();

        if let Some(previous) = previous {
            if previous.is_same(&element) {
                trace!(collection = %self.inner.id, key = %key, "set with identical element skipped");
                return self;
            }

            // The old value is announced while it is still stored.
            self.emit(SetEvent::Remove {
                target: self.inner.id,
                element: previous,
                key: key.clone(),
            });
        }

        self.inner
            .entries
            .write()
            .insert(key.clone(), element.clone());

        self.emit(SetEvent::Add {
            target: self.inner.id,
            element,
            key,
        });

        self
    }

    fn get(&self, key: &str) -> Option<V> {
        self.inner.entries.read().get(key).cloned()
    }

    fn has(&self, key: &str) -> bool {
        self.inner.entries.read().contains_key(key)
    }

    fn get_all(&self) -> HashMap<String, V> {
        self.inner.entries.read().clone()
    }

    fn remove(&self, key: &str) -> Option<V> {
        if self.rejects("remove") {
            return None;
        }

        let removed = self.inner.entries.write().remove(key);

        if let Some(element) = &removed {
            self.emit(SetEvent::Remove {
                target: self.inner.id,
                element: element.clone(),
                key: key.to_string(),
            });
        }

        removed
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, V>> {
        self.inner.entries.write()
    }

    fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let released = std::mem::take(&mut *self.inner.entries.write());
        drop(released);
        self.inner.channel.remove_all_listeners();

        debug!(collection = %self.inner.id, "collection disposed");
    }

    fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl<V, C> Clone for Collection<V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Element> Default for Collection<V, Emitter<V>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C> fmt::Debug for Collection<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.inner.id)
            .field("len", &self.inner.entries.read().len())
            .field("disposed", &self.inner.disposed.load(Ordering::Acquire))
            .finish()
    }
}
