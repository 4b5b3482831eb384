//! Horizon Storage - sectioned data storage with animated change tracking.
//!
//! This crate keeps the data behind sectioned list and grid views and
//! describes every mutation as a [`StorageUpdate`] a view can animate:
//!
//! - **Memory storage**: [`MemoryStorage`], a multi-section store whose
//!   mutations are recorded one by one
//! - **Single-section storage**: [`SingleSectionStorage`], a one-section store
//!   that diffs whole snapshots with a pluggable algorithm
//! - **Change feeds**: [`FetchedResultsStorage`] and [`ReactiveStorage`],
//!   adapters for data owned by a persistence layer
//! - **Diffing**: [`LcsDiffer`] and [`HeckelDiffer`]
//! - **Accumulation**: strategies for merging new items into old ones
//!
//! # Deferred updates
//!
//! A storage delivers each transaction to its [`StorageUpdating`] delegate.
//! By default the storage's content only changes when the delegate replays
//! the update's deferred datasource closures, so a view can start animating
//! from the old content and swap in the new content when it is ready.
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use horizon_storage::prelude::*;
//!
//! #[derive(Default)]
//! struct View {
//!     pending: Mutex<Vec<StorageUpdate>>,
//! }
//!
//! impl StorageUpdating for View {
//!     fn storage_did_perform_update(&self, update: StorageUpdate) {
//!         self.pending.lock().push(update);
//!     }
//!
//!     fn storage_needs_reloading(&self) {}
//! }
//!
//! let storage = MemoryStorage::new();
//! let view = Arc::new(View::default());
//! storage.set_delegate(&view);
//!
//! storage.perform_updates(|| {
//!     storage.add_items(["a", "b"], 0);
//!     storage.add_item("c", 1);
//! });
//! assert_eq!(storage.number_of_sections(), 0);
//!
//! let mut update = view.pending.lock().remove(0);
//! assert_eq!(update.section_changes_of(ChangeType::Insert), vec![0, 1]);
//! update.apply_deferred_datasource_updates();
//! assert_eq!(storage.number_of_sections(), 2);
//! ```

pub mod accumulation;
pub mod config;
pub mod diff;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod index_path;
pub mod item;
pub mod memory;
pub mod prelude;
pub mod section;
pub mod single_section;
pub mod traits;
pub mod update;

pub use accumulation::{
    AccumulationStrategy, AdditiveAccumulationStrategy, DeleteOldValuesAccumulationStrategy,
    UpdateOldValuesAccumulationStrategy,
};
pub use config::{
    GRID_SECTION_FOOTER_KIND, GRID_SECTION_HEADER_KIND, LIST_SECTION_FOOTER_KIND,
    LIST_SECTION_HEADER_KIND, StorageConfig, SupplementaryKinds,
};
pub use diff::{
    EquatableDiffingAlgorithm, HashableDiffingAlgorithm, HeckelDiffer, LcsDiffer,
    SingleSectionOperation, apply_operations,
};
pub use dispatcher::UpdateDispatcher;
pub use error::{
    BatchInsertionReason, InsertionReason, MemoryStorageError, Result, SearchReason,
};
pub use feed::{
    ChangeFeedObserver, CollectionChange, FetchedResultsSource, FetchedResultsStorage,
    NotificationToken, ObservableCollection, ObservableResults, ReactiveSection, ReactiveStorage,
};
pub use index_path::{IndexPath, sorted_index_paths};
pub use item::{AnyItem, Identifiable};
pub use memory::{MemoryStorage, MemoryStorageAnomaly};
pub use section::{SectionId, SectionLocationIdentifying, SectionModel, SupplementaryMap};
pub use single_section::{
    EquatableDiffer, HashableDiffer, SectionDiffer, SingleSectionEquatableStorage,
    SingleSectionHashableStorage, SingleSectionStorage,
};
pub use traits::{
    HeaderFooterSettable, HeaderFooterStorage, Storage, StorageUpdating, SupplementaryStorage,
};
pub use update::{ChangeType, DatasourceUpdate, StorageUpdate};

pub use horizon_storage_core::{Anomaly, AnomalyHandler, ConnectionId, PerfSpan, Signal};
