//! Storage over a fetched-results style source.

use std::sync::Weak;

use horizon_storage_core::logging::targets;
use parking_lot::RwLock;

use crate::config::{GRID_SECTION_HEADER_KIND, LIST_SECTION_HEADER_KIND};
use crate::dispatcher::UpdateDispatcher;
use crate::index_path::IndexPath;
use crate::item::AnyItem;
use crate::traits::{Storage, StorageUpdating, SupplementaryStorage};
use crate::update::ChangeType;

use super::ChangeFeedObserver;

/// Read access to a sectioned result set owned by a persistence layer.
pub trait FetchedResultsSource: Send + Sync {
    /// Number of sections in the result set.
    fn number_of_sections(&self) -> usize;

    /// Number of objects in `section`, `0` for a missing section.
    fn number_of_objects(&self, section: usize) -> usize;

    /// The object at `index_path`.
    fn object(&self, index_path: IndexPath) -> Option<AnyItem>;

    /// The display name of `section`.
    fn section_name(&self, section: usize) -> Option<String>;
}

/// A read-only storage that mirrors a [`FetchedResultsSource`].
///
/// Attach it as the source's change observer; it translates every change
/// sequence into one [`StorageUpdate`](crate::StorageUpdate):
///
/// | Event | Recorded as |
/// |-------|-------------|
/// | insert | insert at the new location |
/// | delete | delete at the old location |
/// | move, locations differ | delete at the old, insert at the new location |
/// | move, same location | update at that location |
/// | update, location changed | delete at the old, insert at the new location |
/// | update | update at the location |
///
/// Section inserts, deletes and updates are recorded as section changes.
/// Section moves are not part of the feed and are ignored.
pub struct FetchedResultsStorage<S> {
    source: S,
    dispatcher: UpdateDispatcher,
    display_section_name_for_supplementary_kinds: RwLock<Vec<String>>,
}

impl<S: FetchedResultsSource> FetchedResultsStorage<S> {
    /// Creates a storage reading from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            dispatcher: UpdateDispatcher::new(),
            display_section_name_for_supplementary_kinds: RwLock::new(vec![
                LIST_SECTION_HEADER_KIND.to_string(),
                GRID_SECTION_HEADER_KIND.to_string(),
            ]),
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Supplementary kinds that resolve to the section name.
    pub fn display_section_name_for_supplementary_kinds(&self) -> Vec<String> {
        self.display_section_name_for_supplementary_kinds.read().clone()
    }

    /// Replaces the kinds that resolve to the section name.
    pub fn set_display_section_name_for_supplementary_kinds(&self, kinds: Vec<String>) {
        *self.display_section_name_for_supplementary_kinds.write() = kinds;
    }

    fn record(&self, change: ChangeType, index_path: IndexPath) {
        self.dispatcher
            .with_current_update(|update| update.record_object_change(change, vec![index_path]));
    }

    fn record_update(&self, index_path: IndexPath, object: AnyItem) {
        self.dispatcher
            .with_current_update(|update| update.record_object_update(index_path, object));
    }

    fn record_relocation(&self, from: IndexPath, to: IndexPath) {
        self.record(ChangeType::Delete, from);
        self.record(ChangeType::Insert, to);
    }
}

impl<S: FetchedResultsSource> ChangeFeedObserver for FetchedResultsStorage<S> {
    fn will_change_content(&self) {
        self.dispatcher.start_update();
    }

    fn did_change_object(
        &self,
        object: AnyItem,
        index_path: Option<IndexPath>,
        change: ChangeType,
        new_index_path: Option<IndexPath>,
    ) {
        if !self.dispatcher.has_current_update() {
            tracing::warn!(target: targets::FEED, %change, "object change outside of a change sequence");
            return;
        }
        match (change, index_path, new_index_path) {
            (ChangeType::Insert, _, Some(new)) => self.record(ChangeType::Insert, new),
            (ChangeType::Delete, Some(old), _) => self.record(ChangeType::Delete, old),
            (ChangeType::Move, Some(old), Some(new)) if old == new => self.record_update(old, object),
            (ChangeType::Move, Some(old), Some(new)) => self.record_relocation(old, new),
            (ChangeType::Update, Some(old), Some(new)) if old != new => self.record_relocation(old, new),
            (ChangeType::Update, Some(old), _) => self.record_update(old, object),
            (change, index_path, new_index_path) => {
                tracing::debug!(
                    target: targets::FEED,
                    %change,
                    ?index_path,
                    ?new_index_path,
                    "object change without the locations it needs"
                );
            }
        }
    }

    fn did_change_section(&self, section_index: usize, change: ChangeType) {
        if !self.dispatcher.has_current_update() {
            tracing::warn!(target: targets::FEED, %change, "section change outside of a change sequence");
            return;
        }
        match change {
            ChangeType::Insert | ChangeType::Delete | ChangeType::Update => {
                self.dispatcher
                    .with_current_update(|update| update.record_section_change(change, vec![section_index]));
            }
            ChangeType::Move => {
                tracing::trace!(target: targets::FEED, section_index, "ignoring section move");
            }
        }
    }

    fn did_change_content(&self) {
        self.dispatcher.finish_update();
    }
}

impl<S: FetchedResultsSource> Storage for FetchedResultsStorage<S> {
    fn number_of_sections(&self) -> usize {
        self.source.number_of_sections()
    }

    fn number_of_items(&self, section: usize) -> usize {
        self.source.number_of_objects(section)
    }

    fn item(&self, index_path: IndexPath) -> Option<AnyItem> {
        self.source.object(index_path)
    }

    fn set_delegate_weak(&self, delegate: Weak<dyn StorageUpdating>) {
        self.dispatcher.set_delegate(delegate);
    }

    fn clear_delegate(&self) {
        self.dispatcher.take_delegate();
    }
}

impl<S: FetchedResultsSource> SupplementaryStorage for FetchedResultsStorage<S> {
    fn supplementary_model(&self, kind: &str, index_path: IndexPath) -> Option<AnyItem> {
        let displays_name = self
            .display_section_name_for_supplementary_kinds
            .read()
            .iter()
            .any(|candidate| candidate == kind);
        if !displays_name || index_path.section >= self.source.number_of_sections() {
            return None;
        }
        self.source.section_name(index_path.section).map(AnyItem::new)
    }
}

impl<S> std::fmt::Debug for FetchedResultsStorage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedResultsStorage")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
