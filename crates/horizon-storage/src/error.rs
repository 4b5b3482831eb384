//! Error types for storage operations.

use crate::index_path::IndexPath;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, MemoryStorageError>;

/// Why a single insertion failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsertionReason {
    /// The item index is past the end of its section.
    #[error("index path {0} is too big")]
    IndexPathTooBig(IndexPath),
}

/// Why a batch insertion failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchInsertionReason {
    /// The number of items differs from the number of index paths.
    #[error("items count does not match index paths count")]
    ItemsCountMismatch,
}

/// Why a lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchReason {
    /// No stored item equals the searched value.
    #[error("item not found: {item}")]
    ItemNotFound {
        /// Debug rendering of the searched value.
        item: String,
    },
}

/// Errors returned by [`MemoryStorage`](crate::MemoryStorage).
///
/// An operation that returns an error has not modified the storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryStorageError {
    /// A single insertion was rejected.
    #[error("insertion failed: {0}")]
    InsertionFailed(#[source] InsertionReason),

    /// A batch insertion was rejected.
    #[error("batch insertion failed: {0}")]
    BatchInsertionFailed(#[source] BatchInsertionReason),

    /// A search by value found nothing.
    #[error("search failed: {0}")]
    SearchFailed(#[source] SearchReason),
}

impl MemoryStorageError {
    /// Create an index-too-big insertion error.
    pub fn index_path_too_big(index_path: IndexPath) -> Self {
        Self::InsertionFailed(InsertionReason::IndexPathTooBig(index_path))
    }

    /// Create an items-count-mismatch batch error.
    pub fn items_count_mismatch() -> Self {
        Self::BatchInsertionFailed(BatchInsertionReason::ItemsCountMismatch)
    }

    /// Create an item-not-found search error.
    pub fn item_not_found(item: impl Into<String>) -> Self {
        Self::SearchFailed(SearchReason::ItemNotFound { item: item.into() })
    }
}
