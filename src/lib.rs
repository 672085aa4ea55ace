//! # Keyed Set
//!
//! An observable, key-addressed collection and live filtered views of it.
//!
//! ## Core Concepts
//!
//! - **Collection**: a keyed store that emits `add`/`remove` events on every change
//! - **Event channel**: the injected listener registry that delivers events synchronously
//! - **Subset**: a filtered mirror of a master store, kept in sync through its events
//! - **Subscription**: a scoped listener registration, released on drop
//!
//! ## Example
//!
//! ```ignore
//! use keyed_set::{Collection, EventKind, Observable, Store, Subsetable};
//!
//! let master = Collection::from_entries([("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
//! let even = master.subset_with(|n, _, _| n % 2 == 0)?;
//!
//! let _log = even.on(EventKind::Add, |event| {
//!     println!("even gained {} = {}", event.key(), event.element());
//! })?;
//!
//! master.set("e", 6); // prints "even gained e = 6"
//! master.set("f", 7); // filtered out
//!
//! // Writes through a subset land in the master
//! even.set("g", 8);
//! assert_eq!(master.get("g"), Some(8));
//!
//! even.dispose();
//! ```

pub mod collection;
pub mod error;
pub mod events;
pub mod store;
pub mod subset;
pub mod types;

// Re-exports
pub use collection::Collection;
pub use error::{CollectionError, Result};
pub use events::{
    Emitter, EmitterConfig, EventChannel, EventStream, Listener, Subscription,
    DEFAULT_MAX_LISTENERS, DEFAULT_STREAM_BUFFER,
};
pub use store::{Observable, Store};
pub use subset::{Filter, Subset, Subsetable};
pub use types::*;
