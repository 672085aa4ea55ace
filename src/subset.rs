//! Live, filtered views of a collection.
//!
//! A [`Subset`] mirrors the entries of a master store that pass a filter and
//! keeps the mirror in sync by listening to the master's events. It is itself
//! a [`Store`], emitting its own `add`/`remove` events under its own id, so
//! subsets can be derived from subsets.
//!
//! Writes issued on a subset are forwarded to the master. The mirror only
//! ever changes in reaction to master events, so a subset cannot drift from
//! "master entries passing the filter".
//!
//! # Example
//!
//! ```ignore
//! let numbers = Collection::from_entries([("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
//! let even = numbers.subset_with(|n, _, _| n % 2 == 0)?;
//!
//! assert_eq!(even.len(), 2);
//!
//! numbers.set("e", 6);
//! assert!(even.has("e"));
//! ```

use crate::collection::Collection;
use crate::error::{CollectionError, Result};
use crate::events::{EventChannel, Subscription};
use crate::store::{Observable, Store};
use crate::types::{CollectionId, Element, EventKind, ListenerId, SetEvent};
use parking_lot::{Mutex, RwLockWriteGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Inclusion predicate for a subset.
///
/// Called with the element, its key, and the subset being filled. It runs
/// once per candidate when the subset is built and once per master `add`
/// event afterwards. It is never re-run for resident entries or on removal.
/// Writes made through the subset argument go to the master like any other.
pub type Filter<M, V> = Arc<dyn Fn(&V, &str, &Subset<M, V>) -> bool + Send + Sync>;

struct SubsetInner<M, V>
where
    M: Store<V>,
    V: Element,
{
    master: M,
    mirror: Collection<V, M::Channel>,
    /// Listeners on the master. Released on dispose or drop.
    links: Mutex<Vec<Subscription>>,
}

/// A filtered, live view of a master store.
///
/// Reads (`get`, `has`, `get_all`, `entries_mut`, `len`) see only the
/// subset's own mirror. Writes (`set`, `remove`) go to the master.
pub struct Subset<M, V>
where
    M: Store<V>,
    V: Element,
{
    inner: Arc<SubsetInner<M, V>>,
}

impl<M, V> Subset<M, V>
where
    M: Store<V>,
    V: Element,
{
    fn derive(master: &M, filter: Option<Filter<M, V>>) -> Result<Self> {
        if master.is_disposed() {
            return Err(CollectionError::Disposed(master.id()));
        }

        let subset = Self {
            inner: Arc::new(SubsetInner {
                master: master.clone(),
                mirror: Collection::with_channel(master.channel().sibling()),
                links: Mutex::new(Vec::new()),
            }),
        };

        // Master changes made by the filter while the mirror fills are not
        // mirrored: the listeners below attach afterwards.
        for (key, element) in master.get_all() {
            if admits(&filter, &element, &key, &subset) {
                subset.inner.mirror.entries_mut().insert(key, element);
            }
        }

        let weak = Arc::downgrade(&subset.inner);
        let on_add = master.on(EventKind::Add, move |event: &SetEvent<V>| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let subset = Subset { inner };
            if subset.is_disposed() {
                return;
            }
            if let SetEvent::Add { element, key, .. } = event {
                if admits(&filter, element, key, &subset) {
                    subset.inner.mirror.set(key.clone(), element.clone());
                }
            }
        })?;

        // Removal is unconditional: the filter gates inclusion only.
        let weak = Arc::downgrade(&subset.inner);
        let on_remove = master.on(EventKind::Remove, move |event: &SetEvent<V>| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.mirror.is_disposed() {
                inner.mirror.remove(event.key());
            }
        })?;

        subset.inner.links.lock().extend([on_add, on_remove]);

        debug!(
            subset = %subset.id(),
            master = %master.id(),
            entries = subset.len(),
            "subset created"
        );

        Ok(subset)
    }

    /// The store this subset derives from.
    pub fn get_master(&self) -> &M {
        &self.inner.master
    }

    /// Keys currently mirrored, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.mirror.keys()
    }
}

fn admits<M, V>(
    filter: &Option<Filter<M, V>>,
    element: &V,
    key: &str,
    subset: &Subset<M, V>,
) -> bool
where
    M: Store<V>,
    V: Element,
{
    filter.as_ref().map_or(true, |f| f(element, key, subset))
}

impl<M, V> Observable<V> for Subset<M, V>
where
    M: Store<V>,
    V: Element,
{
    fn id(&self) -> CollectionId {
        self.inner.mirror.id()
    }

    fn on<F>(&self, kind: EventKind, listener: F) -> Result<Subscription>
    where
        F: Fn(&SetEvent<V>) + Send + Sync + 'static,
    {
        self.inner.mirror.on(kind, listener)
    }

    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.mirror.remove_listener(kind, id)
    }

    fn remove_all_listeners(&self) {
        self.inner.mirror.remove_all_listeners();
    }

    fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.mirror.listener_count(kind)
    }
}

impl<M, V> Store<V> for Subset<M, V>
where
    M: Store<V>,
    V: Element,
{
    type Channel = M::Channel;

    fn channel(&self) -> &M::Channel {
        self.inner.mirror.channel()
    }

    fn set(&self, key: impl Into<String>, element: V) -> &Self {
        self.inner.master.set(key, element);
        self
    }

    fn get(&self, key: &str) -> Option<V> {
        self.inner.mirror.get(key)
    }

    fn has(&self, key: &str) -> bool {
        self.inner.mirror.has(key)
    }

    fn get_all(&self) -> HashMap<String, V> {
        self.inner.mirror.get_all()
    }

    fn remove(&self, key: &str) -> Option<V> {
        self.inner.master.remove(key)
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, V>> {
        self.inner.mirror.entries_mut()
    }

    fn len(&self) -> usize {
        self.inner.mirror.len()
    }

    fn dispose(&self) {
        // Detach from the master first so no event can reach the mirror
        // once it starts tearing down.
        let links = std::mem::take(&mut *self.inner.links.lock());
        drop(links);

        self.inner.mirror.dispose();
        debug!(subset = %self.inner.mirror.id(), "subset detached from master");
    }

    fn is_disposed(&self) -> bool {
        self.inner.mirror.is_disposed()
    }
}

impl<M, V> Clone for Subset<M, V>
where
    M: Store<V>,
    V: Element,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, V> fmt::Debug for Subset<M, V>
where
    M: Store<V>,
    V: Element,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subset")
            .field("id", &self.inner.mirror.id())
            .field("master", &self.inner.master.id())
            .field("len", &self.inner.mirror.len())
            .finish()
    }
}

/// Derivation of subsets, available on every [`Store`].
pub trait Subsetable<V: Element>: Store<V> {
    /// A live mirror of every entry.
    fn subset(&self) -> Result<Subset<Self, V>> {
        Subset::derive(self, None)
    }

    /// A live mirror of the entries accepted by `filter`.
    fn subset_with<F>(&self, filter: F) -> Result<Subset<Self, V>>
    where
        F: Fn(&V, &str, &Subset<Self, V>) -> bool + Send + Sync + 'static,
    {
        Subset::derive(self, Some(Arc::new(filter)))
    }
}

impl<V: Element, S: Store<V>> Subsetable<V> for S {}
