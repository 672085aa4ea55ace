//! Scoped listener registrations.

use crate::types::{EventKind, ListenerId};
use std::fmt;

type Release = Box<dyn FnOnce() + Send + Sync>;

/// Handle for a registered listener.
///
/// The listener stays registered while the handle lives. Dropping the handle
/// or calling [`unsubscribe`](Subscription::unsubscribe) removes it; use
/// [`detach`](Subscription::detach) to keep it registered for the life of
/// the collection instead.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
    kind: EventKind,
    id: ListenerId,
    release: Option<Release>,
}

impl Subscription {
    pub(crate) fn new<F>(kind: EventKind, id: ListenerId, release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            kind,
            id,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keep the listener registered and give up the handle.
    ///
    /// The returned id can still be passed to `remove_listener`.
    pub fn detach(mut self) -> ListenerId {
        self.release = None;
        self.id
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>) -> Subscription {
        let counter = Arc::clone(counter);
        Subscription::new(EventKind::Add, ListenerId(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_drop_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        drop(counting(&released));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        counting(&released).unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detach_never_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let id = counting(&released).detach();
        assert_eq!(id, ListenerId(1));
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }
}
