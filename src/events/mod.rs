//! Event delivery for keyed collections.
//!
//! A collection never talks to listeners directly. It is built around an
//! [`EventChannel`], which owns listener registration and synchronous
//! fan-out:
//! - [`Emitter`] is the default in-process channel
//! - [`Subscription`] is the scoped token returned when a listener is
//!   registered; releasing it deregisters the listener
//! - [`EventStream`] forwards events into a bounded channel for consumers
//!   that prefer pulling to callbacks
//!
//! # Example
//!
//! ```ignore
//! let set: Collection<String> = Collection::new();
//!
//! let subscription = set.on(EventKind::Add, |event| {
//!     println!("{} was added under {}", event.element(), event.key());
//! })?;
//!
//! set.set("greeting", "hi".to_string());
//! subscription.unsubscribe();
//! ```

mod channel;
mod emitter;
mod stream;
mod subscription;

pub use channel::{EventChannel, Listener};
pub use emitter::{Emitter, EmitterConfig, DEFAULT_MAX_LISTENERS};
pub use stream::{EventStream, DEFAULT_STREAM_BUFFER};
pub use subscription::Subscription;
