//! Adapters that turn an external change feed into storage updates.
//!
//! A persistence layer that already owns the data reports its changes as a
//! callback sequence. The adapters here open a transaction when a change
//! sequence begins, translate each event into the [`StorageUpdate`]
//! vocabulary, and deliver the update when the sequence ends.
//!
//! - [`FetchedResultsStorage`] consumes the four-callback
//!   [`ChangeFeedObserver`] protocol over a [`FetchedResultsSource`].
//! - [`ReactiveStorage`] subscribes to [`ObservableResults`] collections, one
//!   per section, and consumes their [`CollectionChange`] notifications.
//!
//! Neither adapter enqueues datasource updates: by the time a change is
//! reported the source has already changed.
//!
//! [`StorageUpdate`]: crate::StorageUpdate

mod fetched_results;
mod reactive;

pub use fetched_results::{FetchedResultsSource, FetchedResultsStorage};
pub use reactive::{
    CollectionChange, NotificationToken, ObservableCollection, ObservableResults, ReactiveSection,
    ReactiveStorage,
};

use crate::index_path::IndexPath;
use crate::item::AnyItem;
use crate::update::ChangeType;

/// Receives the change callbacks of a fetched-results style feed.
///
/// A change sequence is always bracketed by
/// [`will_change_content`](Self::will_change_content) and
/// [`did_change_content`](Self::did_change_content).
pub trait ChangeFeedObserver: Send + Sync {
    /// A change sequence begins.
    fn will_change_content(&self);

    /// An object changed.
    ///
    /// `index_path` is the object's location before the change and
    /// `new_index_path` its location after. Inserts only carry the new
    /// location; deletes only carry the old one.
    fn did_change_object(
        &self,
        object: AnyItem,
        index_path: Option<IndexPath>,
        change: ChangeType,
        new_index_path: Option<IndexPath>,
    );

    /// A section changed.
    fn did_change_section(&self, section_index: usize, change: ChangeType);

    /// The change sequence ended.
    fn did_change_content(&self);
}
