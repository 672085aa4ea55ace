//! Error types for keyed collections.

use crate::types::CollectionId;
use thiserror::Error;

/// Main error type for collection operations.
///
/// Mutations on a live collection cannot fail; errors only arise when a
/// caller tries to attach new work to a collection that was already disposed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectionError {
    #[error("Collection disposed: {0}")]
    Disposed(CollectionId),
}

/// Result type for collection operations.
pub type Result<T> = std::result::Result<T, CollectionError>;
