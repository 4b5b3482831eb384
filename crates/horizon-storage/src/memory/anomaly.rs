//! Anomalies reported by [`MemoryStorage`](super::MemoryStorage).

use horizon_storage_core::Anomaly;

use crate::index_path::IndexPath;

/// A recoverable misuse of a memory storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemoryStorageAnomaly {
    /// A batch insertion was given different numbers of items and paths.
    BatchInsertionItemCountMismatch {
        items_count: usize,
        index_paths_count: usize,
    },
    /// A single insertion targeted a position past the end of its section.
    InsertionIndexPathTooBig {
        index_path: IndexPath,
        count_of_elements_in_section: usize,
    },
    /// A replacement did not find the item to replace.
    ReplaceItemFailedItemNotFound { item_description: String },
    /// A removal did not find the item to remove.
    RemoveItemFailedItemNotFound { item_description: String },
    /// A move did not find an item at its source.
    MoveItemFailedItemNotFound { index_path: IndexPath },
    /// A move targeted a position past the end of the destination section.
    MoveItemFailedIndexPathTooBig {
        index_path: IndexPath,
        count_of_elements_in_section: usize,
    },
    /// An untracked move had an out-of-range source or destination.
    MoveItemFailedInvalidIndexPaths {
        source_index_path: IndexPath,
        destination_index_path: IndexPath,
        source_elements_in_section: usize,
        destination_elements_in_section: usize,
    },
}

impl Anomaly for MemoryStorageAnomaly {
    fn debug_description(&self) -> String {
        match self {
            Self::BatchInsertionItemCountMismatch {
                items_count,
                index_paths_count,
            } => format!(
                "⚠️ [MemoryStorage] Failed to insert batch of items, items count: {items_count}, indexPaths count: {index_paths_count}"
            ),
            Self::InsertionIndexPathTooBig {
                index_path,
                count_of_elements_in_section,
            } => format!(
                "⚠️ [MemoryStorage] Failed to insert item into IndexPath: {index_path}, count of elements in the section: {count_of_elements_in_section}"
            ),
            Self::ReplaceItemFailedItemNotFound { item_description } => {
                format!("⚠️ [MemoryStorage] Failed to find item for replacement: {item_description}")
            }
            Self::RemoveItemFailedItemNotFound { item_description } => {
                format!("⚠️ [MemoryStorage] Failed to find item for removal: {item_description}")
            }
            Self::MoveItemFailedItemNotFound { index_path } => {
                format!("⚠️ [MemoryStorage] Failed to find item for moving at indexPath: {index_path}")
            }
            Self::MoveItemFailedIndexPathTooBig {
                index_path,
                count_of_elements_in_section,
            } => format!(
                "⚠️ [MemoryStorage] Failed to move item, destination indexPath is too big: {index_path}, number of items in section after removing source item: {count_of_elements_in_section}"
            ),
            Self::MoveItemFailedInvalidIndexPaths {
                source_index_path,
                destination_index_path,
                source_elements_in_section,
                destination_elements_in_section,
            } => format!(
                "⚠️ [MemoryStorage] Failed to move item, sourceIndexPath: {source_index_path}, destination indexPath: {destination_index_path}, number of items in source section: {source_elements_in_section}, number of items in destination section after removing source item: {destination_elements_in_section}"
            ),
        }
    }
}
