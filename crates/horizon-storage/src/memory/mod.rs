//! In-memory, multi-section storage with change tracking.
//!
//! [`MemoryStorage`] owns an ordered list of [`SectionModel`]s. Every tracked
//! mutation opens a transaction, records what it changed into a
//! [`StorageUpdate`], and delivers that update to the delegate when the
//! transaction closes. Mutations inside
//! [`perform_updates`](MemoryStorage::perform_updates) share one transaction.
//!
//! # Deferred datasource updates
//!
//! By default (see [`StorageConfig::defers_datasource_updates`]) a mutation
//! does not change the live sections. It computes its effect against a
//! staged copy, records the changes, and enqueues a datasource update on the
//! transaction. The live sections change when the delegate calls
//! [`StorageUpdate::apply_deferred_datasource_updates`]. Without a delegate
//! the update is applied as soon as the transaction closes.
//!
//! The staged copy outlives its transaction while any delivered update is
//! still unapplied, so a later update is recorded against the content the
//! delegate will have once it replays the earlier ones in order. A delegate
//! that drops an update without applying it gives up its edits.
//!
//! Errors and anomalies are still raised synchronously, at call time.
//!
//! # Example
//!
//! ```
//! use horizon_storage::{IndexPath, MemoryStorage, Storage};
//!
//! let storage = MemoryStorage::new();
//! storage.add_items([2, 4, 6], 0);
//! storage.add_item(5, 1);
//!
//! assert_eq!(storage.number_of_sections(), 2);
//! assert_eq!(storage.typed_item::<i32>(IndexPath::new(2, 0)), Some(6));
//! assert_eq!(storage.typed_item::<i32>(IndexPath::new(0, 1)), Some(5));
//! ```

mod anomaly;
mod edit;

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use horizon_storage_core::AnomalyHandler;
use horizon_storage_core::logging::targets;
use parking_lot::{Mutex, RwLock};

use crate::config::{StorageConfig, SupplementaryKinds};
use crate::dispatcher::UpdateDispatcher;
use crate::error::{MemoryStorageError, Result};
use crate::index_path::{IndexPath, sorted_index_paths};
use crate::item::AnyItem;
use crate::section::{SectionId, SectionLocationIdentifying, SectionModel, SupplementaryMap};
use crate::traits::{
    HeaderFooterSettable, HeaderFooterStorage, Storage, StorageUpdating, SupplementaryStorage,
};
use crate::update::ChangeType;

pub use anomaly::MemoryStorageAnomaly;
use edit::{SectionEdit, SectionOwner, Workspace, find_item, replay};

/// Live sections plus the staged projection deferred transactions run on.
pub(crate) struct SectionStore {
    sections: RwLock<Vec<SectionModel>>,
    staging: Mutex<Staging>,
}

#[derive(Default)]
struct Staging {
    /// Live sections with every delivered but unapplied edit already made.
    sections: Option<Vec<SectionModel>>,
    /// Delivered edit logs that have been neither replayed nor dropped.
    pending: usize,
    open: bool,
}

impl Staging {
    fn release_if_settled(&mut self) {
        if self.pending == 0 && !self.open {
            self.sections = None;
        }
    }
}

/// An edit log travelling with a delivered update.
///
/// Counts as pending from creation until it is replayed or dropped.
struct PendingEdits {
    store: Weak<SectionStore>,
    edits: Vec<SectionEdit>,
}

impl PendingEdits {
    fn new(store: &Arc<SectionStore>, edits: Vec<SectionEdit>) -> Self {
        store.staging.lock().pending += 1;
        Self {
            store: Arc::downgrade(store),
            edits,
        }
    }

    fn replay(self) {
        if let Some(store) = self.store.upgrade() {
            store.apply_edits(&self.edits);
        }
    }
}

impl Drop for PendingEdits {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            let mut staging = store.staging.lock();
            staging.pending = staging.pending.saturating_sub(1);
            staging.release_if_settled();
        }
    }
}

impl SectionLocationIdentifying for SectionStore {
    fn section_index(&self, id: SectionId) -> Option<usize> {
        self.sections
            .read_recursive()
            .iter()
            .position(|section| section.id() == id)
    }
}

impl SectionStore {
    fn owner(self: &Arc<Self>) -> SectionOwner {
        let weak: Weak<SectionStore> = Arc::downgrade(self);
        weak
    }

    fn apply_edits(self: &Arc<Self>, edits: &[SectionEdit]) {
        let owner = self.owner();
        replay(edits, &mut self.sections.write(), &owner);
    }

    /// Runs `op` on the live sections and, if present, the staged copy.
    fn update_both(self: &Arc<Self>, op: impl Fn(&mut Vec<SectionModel>, &SectionOwner)) {
        let owner = self.owner();
        op(&mut *self.sections.write(), &owner);
        if let Some(staged) = self.staging.lock().sections.as_mut() {
            op(staged, &owner);
        }
    }

    fn close_staging(&self) {
        let mut staging = self.staging.lock();
        staging.open = false;
        staging.release_if_settled();
    }
}

/// Creates sections up to and including `section` without recording them.
fn vivify_untracked(sections: &mut Vec<SectionModel>, section: usize, owner: &SectionOwner) {
    if sections.len() <= section {
        horizon_storage_core::storage_trace!(count = section + 1 - sections.len(), "creating untracked sections");
    }
    while sections.len() <= section {
        let mut model = SectionModel::new();
        model.set_owner(owner.clone());
        sections.push(model);
    }
}

/// A storage that keeps sectioned items in memory.
///
/// All methods take `&self`; the storage can be shared behind an `Arc`.
pub struct MemoryStorage {
    store: Arc<SectionStore>,
    dispatcher: UpdateDispatcher,
    anomaly_handler: AnomalyHandler<MemoryStorageAnomaly>,
    defers_datasource_updates: AtomicBool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty storage with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    /// Creates an empty storage.
    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            store: Arc::new(SectionStore {
                sections: RwLock::new(Vec::new()),
                staging: Mutex::new(Staging::default()),
            }),
            dispatcher: UpdateDispatcher::with_supplementary_kinds(config.supplementary_kinds),
            anomaly_handler: AnomalyHandler::new(),
            defers_datasource_updates: AtomicBool::new(config.defers_datasource_updates),
        }
    }

    /// The handler anomalies are reported to.
    pub fn anomaly_handler(&self) -> &AnomalyHandler<MemoryStorageAnomaly> {
        &self.anomaly_handler
    }

    /// Whether mutations are applied through deferred datasource updates.
    pub fn defers_datasource_updates(&self) -> bool {
        self.defers_datasource_updates.load(Ordering::SeqCst)
    }

    /// Switches deferred datasource updates on or off.
    ///
    /// Takes effect for the next transaction. Switch modes only while no
    /// delivered update is waiting to be applied.
    pub fn set_defers_datasource_updates(&self, defers: bool) {
        self.defers_datasource_updates.store(defers, Ordering::SeqCst);
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Opens a transaction unless one is already open.
    pub fn start_update(&self) {
        self.dispatcher.start_update();
    }

    /// Closes the open transaction and delivers its update.
    ///
    /// Inside [`perform_updates`](Self::perform_updates) this does nothing.
    pub fn finish_update(&self) {
        let store = &self.store;
        self.dispatcher.finish_update_with(|| {
            store.close_staging();
        });
    }

    /// Runs `block` so that every mutation in it is delivered as one update.
    pub fn perform_updates(&self, block: impl FnOnce()) {
        let store = &self.store;
        self.dispatcher.perform_updates(block, || {
            store.close_staging();
        });
    }

    /// Runs `block` with the delegate detached.
    ///
    /// Changes made in `block` are applied immediately and never delivered.
    /// The caller is responsible for reloading its view afterwards.
    pub fn update_without_animations(&self, block: impl FnOnce()) {
        let delegate = self.dispatcher.take_delegate();
        block();
        self.dispatcher.restore_delegate(delegate);
    }

    /// Runs one tracked operation inside a transaction.
    fn transaction<R>(&self, op: impl FnOnce(&mut Workspace<'_>) -> R) -> R {
        self.start_update();
        let owner = self.store.owner();
        let defers = self.defers_datasource_updates();

        let (result, mut outcome) = if defers {
            let mut staging = self.store.staging.lock();
            staging.open = true;
            let sections = staging
                .sections
                .get_or_insert_with(|| self.store.sections.read().clone());
            let mut workspace = Workspace::new(sections, owner, true);
            let result = op(&mut workspace);
            (result, workspace.finish())
        } else {
            let mut sections = self.store.sections.write();
            let mut workspace = Workspace::new(&mut sections, owner, false);
            let result = op(&mut workspace);
            (result, workspace.finish())
        };

        if let Some(edits) = outcome.edits.take().filter(|edits| !edits.is_empty()) {
            let pending = PendingEdits::new(&self.store, edits);
            outcome.update.enqueue_datasource_update(move |_| pending.replay());
        }
        self.dispatcher
            .with_current_update(|current| current.merge(outcome.update));

        for anomaly in outcome.anomalies {
            self.anomaly_handler.report_anomaly(anomaly);
        }
        self.finish_update();
        result
    }

    /// Runs an untracked change on the live sections and asks for a reload.
    fn reloading(&self, op: impl Fn(&mut Vec<SectionModel>, &SectionOwner)) {
        self.store.update_both(op);
        horizon_storage_core::storage_debug!("untracked change applied");
        self.dispatcher.storage_needs_reloading();
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Total number of items across all sections.
    pub fn total_number_of_items(&self) -> usize {
        self.store
            .sections
            .read()
            .iter()
            .map(SectionModel::number_of_items)
            .sum()
    }

    /// A snapshot of every section.
    pub fn sections(&self) -> Vec<SectionModel> {
        self.store.sections.read().clone()
    }

    /// A snapshot of the section at `index`.
    pub fn section(&self, index: usize) -> Option<SectionModel> {
        self.store.sections.read().get(index).cloned()
    }

    /// The items of `section`, or `None` if the section does not exist.
    pub fn items(&self, section: usize) -> Option<Vec<AnyItem>> {
        self.store
            .sections
            .read()
            .get(section)
            .map(|section| section.items().to_vec())
    }

    /// The items of `section` that are `T`.
    pub fn items_of_type<T: Any + Clone>(&self, section: usize) -> Vec<T> {
        self.store
            .sections
            .read()
            .get(section)
            .map(SectionModel::items_of_type::<T>)
            .unwrap_or_default()
    }

    /// The location of the first item equal to `value`.
    pub fn index_path<T: PartialEq + Any>(&self, value: &T) -> Option<IndexPath> {
        find_item(&self.store.sections.read(), value)
    }

    /// The locations of every value that is found, in the order given.
    pub fn index_paths<T: PartialEq + Any>(&self, values: &[T]) -> Vec<IndexPath> {
        let sections = self.store.sections.read();
        values
            .iter()
            .filter_map(|value| find_item(&sections, value))
            .collect()
    }

    /// Gives direct mutable access to one live section.
    ///
    /// This bypasses change tracking entirely: nothing is recorded, nothing
    /// is delivered, and the staged copy used for outstanding deferred
    /// updates does not see the edit. The caller must bring its view back in
    /// sync, usually with a reload.
    ///
    /// `f` runs on a copy with no storage lock held, so it may query the
    /// storage, including the section's own index. The copy is written back
    /// to wherever the section sits afterwards.
    pub fn with_section_mut<R>(&self, index: usize, f: impl FnOnce(&mut SectionModel) -> R) -> Option<R> {
        let mut section = self.store.sections.read().get(index)?.clone();
        let result = f(&mut section);
        let mut sections = self.store.sections.write();
        match sections.iter_mut().find(|slot| slot.id() == section.id()) {
            Some(slot) => *slot = section,
            None => tracing::debug!(target: targets::MEMORY, index, "section left the storage while being edited"),
        }
        Some(result)
    }

    // =========================================================================
    // Tracked mutations
    // =========================================================================

    /// Appends `item` to `section`, creating missing sections.
    pub fn add_item<T: Any + Send + Sync>(&self, item: T, section: usize) {
        self.add_items([item], section);
    }

    /// Appends `items` to `section`, creating missing sections.
    #[tracing::instrument(skip_all, target = "horizon_storage::memory", level = "trace", fields(section = section))]
    pub fn add_items<T: Any + Send + Sync>(&self, items: impl IntoIterator<Item = T>, section: usize) {
        let items: Vec<AnyItem> = items.into_iter().map(AnyItem::new).collect();
        self.transaction(|workspace| {
            workspace.ensure_section(section);
            let start = workspace.number_of_items(section);
            for offset in 0..items.len() {
                workspace
                    .record()
                    .record_object_change(ChangeType::Insert, vec![IndexPath::new(start + offset, section)]);
            }
            if !items.is_empty() {
                workspace.apply(SectionEdit::AppendItems { section, items });
            }
        });
    }

    /// Inserts `item` at `index_path`, creating missing sections.
    ///
    /// The location is checked first: a missing section counts as empty, so
    /// sections are only created when `index_path.item` is `0` for them.
    ///
    /// # Errors
    ///
    /// Fails with [`MemoryStorageError::InsertionFailed`] when the item index
    /// is past the end of the section. Nothing is changed in that case.
    pub fn insert_item<T: Any + Send + Sync>(&self, item: T, index_path: IndexPath) -> Result<()> {
        let item = AnyItem::new(item);
        self.transaction(|workspace| {
            let count = workspace.number_of_items(index_path.section);
            if index_path.item > count {
                workspace.report(MemoryStorageAnomaly::InsertionIndexPathTooBig {
                    index_path,
                    count_of_elements_in_section: count,
                });
                return Err(MemoryStorageError::index_path_too_big(index_path));
            }
            workspace.ensure_section(index_path.section);
            workspace.apply(SectionEdit::InsertItem { index_path, item });
            workspace
                .record()
                .record_object_change(ChangeType::Insert, vec![index_path]);
            Ok(())
        })
    }

    /// Inserts each item at its paired location, as one transaction.
    ///
    /// Pairs whose location is past the end of its section are skipped.
    ///
    /// # Errors
    ///
    /// Fails with [`MemoryStorageError::BatchInsertionFailed`] when the
    /// numbers of items and locations differ. Nothing is changed in that case.
    pub fn insert_items<T: Any + Send + Sync>(&self, items: Vec<T>, index_paths: &[IndexPath]) -> Result<()> {
        if items.len() != index_paths.len() {
            self.anomaly_handler
                .report_anomaly(MemoryStorageAnomaly::BatchInsertionItemCountMismatch {
                    items_count: items.len(),
                    index_paths_count: index_paths.len(),
                });
            return Err(MemoryStorageError::items_count_mismatch());
        }
        let pairs: Vec<(AnyItem, IndexPath)> = items
            .into_iter()
            .map(AnyItem::new)
            .zip(index_paths.iter().copied())
            .collect();
        self.transaction(|workspace| {
            for (item, index_path) in pairs {
                workspace.ensure_section(index_path.section);
                if index_path.item > workspace.number_of_items(index_path.section) {
                    tracing::trace!(target: targets::MEMORY, %index_path, "skipping insertion past end of section");
                    continue;
                }
                workspace.apply(SectionEdit::InsertItem { index_path, item });
                workspace
                    .record()
                    .record_object_change(ChangeType::Insert, vec![index_path]);
            }
        });
        Ok(())
    }

    /// Records an update for the first item equal to `value`.
    ///
    /// The stored item is attached as the updated value. A missing item makes
    /// this a no-op.
    pub fn reload_item<T: PartialEq + Any>(&self, value: &T) {
        self.transaction(|workspace| {
            let Some(index_path) = workspace.find(value) else {
                return;
            };
            if let Some(item) = workspace.item(index_path).cloned() {
                workspace.record().record_object_update(index_path, item);
            }
        });
    }

    /// Replaces the first item equal to `item_to_replace` with `replacing_item`.
    ///
    /// # Errors
    ///
    /// Fails with [`MemoryStorageError::SearchFailed`] if no item matches.
    pub fn replace_item<T, U>(&self, item_to_replace: &T, replacing_item: U) -> Result<()>
    where
        T: PartialEq + Debug + Any,
        U: Any + Send + Sync,
    {
        let replacing_item = AnyItem::new(replacing_item);
        self.transaction(|workspace| {
            let Some(index_path) = workspace.find(item_to_replace) else {
                let item_description = format!("{item_to_replace:?}");
                workspace.report(MemoryStorageAnomaly::ReplaceItemFailedItemNotFound {
                    item_description: item_description.clone(),
                });
                return Err(MemoryStorageError::item_not_found(item_description));
            };
            workspace.apply(SectionEdit::ReplaceItem {
                index_path,
                item: replacing_item.clone(),
            });
            workspace.record().record_object_update(index_path, replacing_item);
            Ok(())
        })
    }

    /// Removes the first item equal to `item`.
    ///
    /// # Errors
    ///
    /// Fails with [`MemoryStorageError::SearchFailed`] if no item matches.
    pub fn remove_item<T: PartialEq + Debug + Any>(&self, item: &T) -> Result<()> {
        self.transaction(|workspace| {
            let Some(index_path) = workspace.find(item) else {
                let item_description = format!("{item:?}");
                workspace.report(MemoryStorageAnomaly::RemoveItemFailedItemNotFound {
                    item_description: item_description.clone(),
                });
                return Err(MemoryStorageError::item_not_found(item_description));
            };
            workspace.apply(SectionEdit::RemoveItem(index_path));
            workspace
                .record()
                .record_object_change(ChangeType::Delete, vec![index_path]);
            Ok(())
        })
    }

    /// Removes every item equal to one of `items`. Missing items are skipped.
    ///
    /// Deletes are recorded in the order the items are given; removal runs
    /// from the highest location to the lowest.
    pub fn remove_items<T: PartialEq + Any>(&self, items: &[T]) {
        self.transaction(|workspace| {
            let mut index_paths: Vec<IndexPath> = Vec::with_capacity(items.len());
            for item in items {
                if let Some(index_path) = workspace.find(item) {
                    if !index_paths.contains(&index_path) {
                        index_paths.push(index_path);
                    }
                }
            }
            for index_path in sorted_index_paths(index_paths.clone(), false) {
                workspace.apply(SectionEdit::RemoveItem(index_path));
            }
            for index_path in index_paths {
                workspace
                    .record()
                    .record_object_change(ChangeType::Delete, vec![index_path]);
            }
        });
    }

    /// Removes the items at `index_paths`, highest location first.
    ///
    /// Each location is checked against the current content right before
    /// its removal; locations with no item are skipped.
    pub fn remove_items_at(&self, index_paths: &[IndexPath]) {
        self.transaction(|workspace| {
            for index_path in sorted_index_paths(index_paths.to_vec(), false) {
                if workspace.item(index_path).is_none() {
                    continue;
                }
                workspace.apply(SectionEdit::RemoveItem(index_path));
                workspace
                    .record()
                    .record_object_change(ChangeType::Delete, vec![index_path]);
            }
        });
    }

    /// Removes every item of `section`. A missing section is a no-op.
    pub fn remove_items_from_section(&self, section: usize) {
        self.transaction(|workspace| {
            if section >= workspace.number_of_sections() {
                return;
            }
            for item in 0..workspace.number_of_items(section) {
                workspace
                    .record()
                    .record_object_change(ChangeType::Delete, vec![IndexPath::new(item, section)]);
            }
            workspace.apply(SectionEdit::ClearSection(section));
        });
    }

    /// Deletes the sections at `indexes`. Out-of-range indexes are ignored.
    pub fn delete_sections(&self, indexes: impl IntoIterator<Item = usize>) {
        let indexes: BTreeSet<usize> = indexes.into_iter().collect();
        self.transaction(|workspace| {
            let count = workspace.number_of_sections();
            let valid: Vec<usize> = indexes.into_iter().filter(|index| *index < count).collect();
            for index in valid.iter().rev() {
                workspace.apply(SectionEdit::DeleteSection(*index));
            }
            for index in valid {
                workspace
                    .record()
                    .record_section_change(ChangeType::Delete, vec![index]);
            }
        });
    }

    /// Moves the section at `from` to `to`, creating missing sections.
    pub fn move_section(&self, from: usize, to: usize) {
        self.transaction(|workspace| {
            workspace.ensure_section(from);
            workspace.ensure_section(to);
            workspace.apply(SectionEdit::MoveSection { from, to });
            workspace
                .record()
                .record_section_change(ChangeType::Move, vec![from, to]);
        });
    }

    /// Moves the item at `from` to `to`, creating missing sections.
    ///
    /// A missing source item or a destination past the end of its section
    /// is reported as an anomaly and nothing is moved.
    pub fn move_item(&self, from: IndexPath, to: IndexPath) {
        self.transaction(|workspace| {
            if workspace.item(from).is_none() {
                workspace.report(MemoryStorageAnomaly::MoveItemFailedItemNotFound { index_path: from });
                return;
            }
            workspace.ensure_section(to.section);
            let mut available = workspace.number_of_items(to.section);
            if to.section == from.section {
                available -= 1;
            }
            if to.item > available {
                workspace.report(MemoryStorageAnomaly::MoveItemFailedIndexPathTooBig {
                    index_path: to,
                    count_of_elements_in_section: available,
                });
                return;
            }
            workspace.apply(SectionEdit::MoveItem { from, to });
            workspace
                .record()
                .record_object_change(ChangeType::Move, vec![from, to]);
        });
    }

    /// Inserts `section` at `index`, recording the section and its items.
    ///
    /// The section gets a fresh identity, so a snapshot taken with
    /// [`section`](Self::section) can be inserted next to its original. An
    /// index past the end is a no-op.
    pub fn insert_section(&self, mut section: SectionModel, index: usize) {
        section.renew_id();
        self.transaction(|workspace| {
            if index > workspace.number_of_sections() {
                tracing::trace!(target: targets::MEMORY, index, "section index past end, not inserting");
                return;
            }
            let item_count = section.number_of_items();
            workspace.apply(SectionEdit::InsertSection { index, section });
            workspace
                .record()
                .record_section_change(ChangeType::Insert, vec![index]);
            for item in 0..item_count {
                workspace
                    .record()
                    .record_object_change(ChangeType::Insert, vec![IndexPath::new(item, index)]);
            }
        });
    }

    // =========================================================================
    // Untracked mutations
    // =========================================================================

    /// Replaces the items of `section`, creating missing sections, and asks
    /// the delegate to reload.
    pub fn set_items<T: Any + Send + Sync>(&self, items: impl IntoIterator<Item = T>, section: usize) {
        let items: Vec<AnyItem> = items.into_iter().map(AnyItem::new).collect();
        self.reloading(|sections, owner| {
            vivify_untracked(sections, section, owner);
            *sections[section].items_mut() = items.clone();
        });
    }

    /// Replaces the items of sections `0..items.len()` and asks the delegate
    /// to reload.
    pub fn set_items_for_all_sections<T: Any + Send + Sync>(&self, items: Vec<Vec<T>>) {
        let items: Vec<Vec<AnyItem>> = items
            .into_iter()
            .map(|section| section.into_iter().map(AnyItem::new).collect())
            .collect();
        self.reloading(|sections, owner| {
            for (index, section_items) in items.iter().enumerate() {
                vivify_untracked(sections, index, owner);
                *sections[index].items_mut() = section_items.clone();
            }
        });
    }

    /// Replaces the section at `index`, creating missing sections, and asks
    /// the delegate to reload.
    pub fn set_section(&self, mut section: SectionModel, index: usize) {
        section.renew_id();
        self.reloading(|sections, owner| {
            vivify_untracked(sections, index, owner);
            let mut section = section.clone();
            section.set_owner(owner.clone());
            sections[index] = section;
        });
    }

    /// Empties every section and asks the delegate to reload.
    pub fn remove_all_items(&self) {
        self.reloading(|sections, _| {
            for section in sections.iter_mut() {
                section.items_mut().clear();
            }
        });
    }

    /// Sets the header model of `section` and asks the delegate to reload.
    pub fn set_section_header_model<T: Any + Send + Sync>(&self, model: Option<T>, section: usize) {
        let Some(kind) = self.dispatcher.supplementary_kinds().header else {
            horizon_storage_core::storage_warn!("header kind is not set, ignoring section header model");
            return;
        };
        self.set_supplementary_model(model.map(AnyItem::new), &kind, section);
    }

    /// Sets the footer model of `section` and asks the delegate to reload.
    pub fn set_section_footer_model<T: Any + Send + Sync>(&self, model: Option<T>, section: usize) {
        let Some(kind) = self.dispatcher.supplementary_kinds().footer else {
            horizon_storage_core::storage_warn!("footer kind is not set, ignoring section footer model");
            return;
        };
        self.set_supplementary_model(model.map(AnyItem::new), &kind, section);
    }

    fn set_supplementary_model(&self, model: Option<AnyItem>, kind: &str, section: usize) {
        self.reloading(|sections, owner| {
            vivify_untracked(sections, section, owner);
            sections[section].set_supplementary_model(model.clone(), kind, 0);
        });
    }

    /// Moves an item without recording or delivering anything.
    ///
    /// Meant for a view that already moved the item on screen, for example
    /// after a drag. Out-of-range locations are reported as an anomaly.
    pub fn move_item_without_animation(&self, from: IndexPath, to: IndexPath) {
        let moved = {
            let mut sections = self.store.sections.write();
            let source_count = sections.get(from.section).map_or(0, SectionModel::number_of_items);
            let destination_count = sections.get(to.section).map_or(0, |section| {
                let count = section.number_of_items();
                if to.section == from.section { count.saturating_sub(1) } else { count }
            });
            if edit::move_item(&mut sections, from, to) {
                Ok(())
            } else {
                Err(MemoryStorageAnomaly::MoveItemFailedInvalidIndexPaths {
                    source_index_path: from,
                    destination_index_path: to,
                    source_elements_in_section: source_count,
                    destination_elements_in_section: destination_count,
                })
            }
        };
        match moved {
            Ok(()) => {
                if let Some(staged) = self.store.staging.lock().sections.as_mut() {
                    edit::move_item(staged, from, to);
                }
            }
            Err(anomaly) => {
                self.anomaly_handler.report_anomaly(anomaly);
            }
        }
    }
}

impl Storage for MemoryStorage {
    fn number_of_sections(&self) -> usize {
        self.store.sections.read().len()
    }

    fn number_of_items(&self, section: usize) -> usize {
        self.store
            .sections
            .read()
            .get(section)
            .map_or(0, SectionModel::number_of_items)
    }

    fn item(&self, index_path: IndexPath) -> Option<AnyItem> {
        self.store
            .sections
            .read()
            .get(index_path.section)?
            .item(index_path.item)
            .cloned()
    }

    fn set_delegate_weak(&self, delegate: Weak<dyn StorageUpdating>) {
        self.dispatcher.set_delegate(delegate);
    }

    fn clear_delegate(&self) {
        self.dispatcher.take_delegate();
    }
}

impl SupplementaryStorage for MemoryStorage {
    fn supplementary_model(&self, kind: &str, index_path: IndexPath) -> Option<AnyItem> {
        self.store
            .sections
            .read()
            .get(index_path.section)?
            .supplementary_model(kind, index_path.item)
            .cloned()
    }
}

impl HeaderFooterStorage for MemoryStorage {
    fn supplementary_kinds(&self) -> SupplementaryKinds {
        self.dispatcher.supplementary_kinds()
    }

    fn set_supplementary_kinds(&self, kinds: SupplementaryKinds) {
        self.dispatcher.set_supplementary_kinds(kinds);
    }
}

impl HeaderFooterSettable for MemoryStorage {
    fn set_supplementaries(&self, models: Vec<SupplementaryMap>, kind: &str) {
        self.reloading(|sections, owner| {
            if models.is_empty() {
                for section in sections.iter_mut() {
                    section.set_supplementaries(kind, SupplementaryMap::new());
                }
                return;
            }
            vivify_untracked(sections, models.len() - 1, owner);
            for (section, section_models) in sections.iter_mut().zip(&models) {
                section.set_supplementaries(kind, section_models.clone());
            }
        });
    }
}

impl Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("sections", &self.store.sections.read().len())
            .field("defers_datasource_updates", &self.defers_datasource_updates())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

static_assertions::assert_impl_all!(MemoryStorage: Send, Sync);
