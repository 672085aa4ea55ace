//! Pull-based consumption of collection events.

use super::subscription::Subscription;
use crate::error::Result;
use crate::store::Observable;
use crate::types::{CollectionId, Element, EventKind, SetEvent};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

/// Default number of buffered events before a stream is dropped.
pub const DEFAULT_STREAM_BUFFER: usize = 1024;

/// Events of one collection, delivered through a bounded channel.
///
/// Both `add` and `remove` events are forwarded in emission order. If the
/// consumer falls behind and the buffer fills up, the stream is closed: the
/// sender is dropped, already buffered events stay readable, and later events
/// are discarded.
pub struct EventStream<V> {
    source: CollectionId,
    receiver: Receiver<SetEvent<V>>,
    sender: Arc<Mutex<Option<Sender<SetEvent<V>>>>>,
    _links: [Subscription; 2],
}

impl<V: Element> EventStream<V> {
    /// Subscribe to `source` with the default buffer size.
    pub fn new<S>(source: &S) -> Result<Self>
    where
        S: Observable<V>,
    {
        Self::with_buffer(source, DEFAULT_STREAM_BUFFER)
    }

    /// Subscribe to `source` buffering at most `buffer_size` events.
    pub fn with_buffer<S>(source: &S, buffer_size: usize) -> Result<Self>
    where
        S: Observable<V>,
    {
        let (sender, receiver) = bounded(buffer_size);
        let sender = Arc::new(Mutex::new(Some(sender)));
        let id = source.id();

        let on_add = source.on(EventKind::Add, forward(id, &sender))?;
        let on_remove = source.on(EventKind::Remove, forward(id, &sender))?;

        Ok(Self {
            source: id,
            receiver,
            sender,
            _links: [on_add, on_remove],
        })
    }

    /// The collection this stream observes.
    pub fn source(&self) -> CollectionId {
        self.source
    }

    /// True once the buffer overflowed.
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Receive the next event (blocking).
    pub fn recv(&self) -> std::result::Result<SetEvent<V>, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> std::result::Result<SetEvent<V>, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> std::result::Result<SetEvent<V>, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every event currently buffered.
    pub fn drain(&self) -> Vec<SetEvent<V>> {
        self.receiver.try_iter().collect()
    }
}

fn forward<V: Element>(
    source: CollectionId,
    sender: &Arc<Mutex<Option<Sender<SetEvent<V>>>>>,
) -> impl Fn(&SetEvent<V>) + Send + Sync + 'static {
    let sender = Arc::clone(sender);
    move |event: &SetEvent<V>| {
        let mut slot = sender.lock();
        let Some(tx) = slot.as_ref() else {
            return;
        };

        let capacity = tx.capacity();
        match tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(%source, ?capacity, "event stream buffer full, closing stream");
                *slot = None;
            }
            Err(TrySendError::Disconnected(_)) => {
                *slot = None;
            }
        }
    }
}
