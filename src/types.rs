//! Core types for keyed collections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_COLLECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a collection instance.
///
/// Every `Collection` (and therefore every subset mirror) receives a fresh id
/// at construction. Cloned handles share the id of the instance they point to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub u64);

impl CollectionId {
    /// Allocate the next process-wide id.
    pub(crate) fn next() -> Self {
        CollectionId(NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionId({})", self.0)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a registered listener, unique within one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The two notifications a collection emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Add,
    Remove,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Add => "add",
            EventKind::Remove => "remove",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A change notification.
///
/// `target` is the collection that emitted the event. A subset re-emits
/// master changes under its own id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum SetEvent<V> {
    /// `key` now holds `element`.
    Add {
        target: CollectionId,
        element: V,
        key: String,
    },
    /// `key` no longer holds `element`.
    Remove {
        target: CollectionId,
        element: V,
        key: String,
    },
}

impl<V> SetEvent<V> {
    pub fn kind(&self) -> EventKind {
        match self {
            SetEvent::Add { .. } => EventKind::Add,
            SetEvent::Remove { .. } => EventKind::Remove,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn target(&self) -> CollectionId {
        match self {
            SetEvent::Add { target, .. } | SetEvent::Remove { target, .. } => *target,
        }
    }

    pub fn element(&self) -> &V {
        match self {
            SetEvent::Add { element, .. } | SetEvent::Remove { element, .. } => element,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SetEvent::Add { key, .. } | SetEvent::Remove { key, .. } => key,
        }
    }
}

/// A value that can be stored in a collection.
///
/// `is_same` decides whether `set` is a no-op. It is identity, not structural
/// equality: plain values compare by value, `Arc`s compare by pointer, so two
/// distinct allocations holding equal data are never the same element.
pub trait Element: Clone + Send + Sync + 'static {
    fn is_same(&self, other: &Self) -> bool;
}

macro_rules! impl_element_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Element for $ty {
                #[inline]
                fn is_same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

// Floats use IEEE `==`, so NaN is never the same as NaN.
impl_element_by_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str,
);

impl<T: ?Sized + Send + Sync + 'static> Element for Arc<T> {
    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_ids_are_unique() {
        let a = CollectionId::next();
        let b = CollectionId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_primitive_identity() {
        assert!(3i32.is_same(&3));
        assert!(!3i32.is_same(&4));
        assert!("C".to_string().is_same(&"C".to_string()));
        assert!(!f64::NAN.is_same(&f64::NAN));
    }

    #[test]
    fn test_arc_identity_is_by_pointer() {
        let a = Arc::new(vec![1, 2]);
        let b = Arc::new(vec![1, 2]);
        assert!(a.is_same(&Arc::clone(&a)));
        assert!(!a.is_same(&b));
    }

    #[test]
    fn test_event_serializes_with_name_tag() {
        let event = SetEvent::Add {
            target: CollectionId(7),
            element: "D".to_string(),
            key: "d".to_string(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"name": "add", "target": 7, "element": "D", "key": "d"})
        );

        let back: SetEvent<String> = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.kind(), EventKind::Add);
        assert_eq!(back.key(), "d");
    }
}
