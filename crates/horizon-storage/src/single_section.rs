//! A one-section storage that animates changes by diffing snapshots.
//!
//! Where [`MemoryStorage`](crate::MemoryStorage) records each mutation as it
//! happens, a [`SingleSectionStorage`] only ever receives whole snapshots. It
//! diffs the current items against the new ones and delivers the resulting
//! operations as one [`StorageUpdate`]. The items themselves are swapped in by
//! the update's deferred datasource closure.
//!
//! ```
//! use horizon_storage::{
//!     EquatableDiffer, LcsDiffer, SingleSectionEquatableStorage, Storage,
//! };
//!
//! let storage = SingleSectionEquatableStorage::new(
//!     vec!["foo".to_string(), "bar".to_string()],
//!     EquatableDiffer::new(LcsDiffer),
//! );
//! storage.set_items(vec!["bar".to_string(), "foo".to_string()]);
//!
//! // Without a delegate the update is applied right away.
//! assert_eq!(storage.items(), vec!["bar".to_string(), "foo".to_string()]);
//! assert_eq!(storage.number_of_items(0), 2);
//! ```

use std::any::Any;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use horizon_storage_core::logging::{span_names, targets};
use parking_lot::RwLock;

use crate::accumulation::{AccumulationStrategy, AdditiveAccumulationStrategy};
use crate::config::{StorageConfig, SupplementaryKinds};
use crate::diff::{
    EquatableDiffingAlgorithm, HashableDiffingAlgorithm, HeckelDiffer, LcsDiffer,
    SingleSectionOperation,
};
use crate::dispatcher::UpdateDispatcher;
use crate::index_path::IndexPath;
use crate::item::{AnyItem, Identifiable};
use crate::section::{SectionModel, SupplementaryMap};
use crate::traits::{
    HeaderFooterSettable, HeaderFooterStorage, Storage, StorageUpdating, SupplementaryStorage,
};
use crate::update::{ChangeType, StorageUpdate};

/// Computes the operations between two snapshots of `T`.
///
/// Implemented by [`EquatableDiffer`] and [`HashableDiffer`], which adapt the
/// two diffing algorithm families to a single item type.
pub trait SectionDiffer<T>: Send + Sync {
    /// Computes the operations that turn `from` into `to`.
    fn calculate_diffs(&self, from: &[T], to: &[T]) -> Vec<SingleSectionOperation>;
}

/// Adapts an [`EquatableDiffingAlgorithm`] to a [`SectionDiffer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EquatableDiffer<D>(pub D);

impl<D> EquatableDiffer<D> {
    /// Wraps `differ`.
    pub fn new(differ: D) -> Self {
        Self(differ)
    }
}

impl<T, D> SectionDiffer<T> for EquatableDiffer<D>
where
    T: Identifiable + PartialEq,
    D: EquatableDiffingAlgorithm,
{
    fn calculate_diffs(&self, from: &[T], to: &[T]) -> Vec<SingleSectionOperation> {
        EquatableDiffingAlgorithm::diff(&self.0, from, to)
    }
}

/// Adapts a [`HashableDiffingAlgorithm`] to a [`SectionDiffer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HashableDiffer<D>(pub D);

impl<D> HashableDiffer<D> {
    /// Wraps `differ`.
    pub fn new(differ: D) -> Self {
        Self(differ)
    }
}

impl<T, D> SectionDiffer<T> for HashableDiffer<D>
where
    T: Identifiable + Hash + Eq,
    D: HashableDiffingAlgorithm,
{
    fn calculate_diffs(&self, from: &[T], to: &[T]) -> Vec<SingleSectionOperation> {
        HashableDiffingAlgorithm::diff(&self.0, from, to)
    }
}

/// A single-section storage diffed with an equality-only algorithm.
pub type SingleSectionEquatableStorage<T, D = LcsDiffer> = SingleSectionStorage<T, EquatableDiffer<D>>;

/// A single-section storage diffed with a hashable algorithm.
pub type SingleSectionHashableStorage<T, D = HeckelDiffer> = SingleSectionStorage<T, HashableDiffer<D>>;

/// A storage holding exactly one section of `T` items.
///
/// The section always exists, so [`number_of_sections`](Storage::number_of_sections)
/// is always `1`. Batching is not supported: every call to
/// [`set_items`](Self::set_items) or [`add_items`](Self::add_items) delivers
/// its own update.
pub struct SingleSectionStorage<T, C> {
    section: Arc<RwLock<SectionModel>>,
    differ: C,
    dispatcher: UpdateDispatcher,
    _items: PhantomData<fn() -> T>,
}

impl<T, C> SingleSectionStorage<T, C>
where
    T: Identifiable + Clone + Any + Send + Sync,
    C: SectionDiffer<T>,
{
    /// Creates a storage holding `items`.
    pub fn new(items: Vec<T>, differ: C) -> Self {
        Self::with_config(items, differ, StorageConfig::default())
    }

    /// Creates a storage holding `items`, using the kinds from `config`.
    ///
    /// Deferral is not configurable here: the items are always replaced by
    /// the update's datasource closure.
    pub fn with_config(items: Vec<T>, differ: C, config: StorageConfig) -> Self {
        Self {
            section: Arc::new(RwLock::new(SectionModel::with_items(items))),
            differ,
            dispatcher: UpdateDispatcher::with_supplementary_kinds(config.supplementary_kinds),
            _items: PhantomData,
        }
    }

    /// The current items.
    pub fn items(&self) -> Vec<T> {
        self.section.read().items_of_type::<T>()
    }

    /// The differ in use.
    pub fn differ(&self) -> &C {
        &self.differ
    }

    /// A snapshot of the section.
    pub fn section(&self) -> SectionModel {
        self.section.read().clone()
    }

    /// Diffs the current items against `new_items` and delivers the result.
    #[tracing::instrument(skip_all, target = "horizon_storage::diff", level = "trace", fields(count = new_items.len()))]
    pub fn set_items(&self, new_items: Vec<T>) {
        let operations = {
            let _span = tracing::trace_span!(target: targets::DIFF, span_names::DIFF).entered();
            self.differ.calculate_diffs(&self.items(), &new_items)
        };
        self.animate_changes(&operations, new_items);
    }

    /// Appends `new_items` to the current items and delivers the diff.
    pub fn add_items(&self, new_items: Vec<T>) {
        self.add_items_with(new_items, &AdditiveAccumulationStrategy);
    }

    /// Merges `new_items` into the current items using `strategy`, then
    /// delivers the diff.
    pub fn add_items_with(&self, new_items: Vec<T>, strategy: &impl AccumulationStrategy) {
        let accumulated = strategy.accumulate(&self.items(), &new_items);
        self.set_items(accumulated);
    }

    fn animate_changes(&self, operations: &[SingleSectionOperation], new_items: Vec<T>) {
        let mut update = StorageUpdate::new();
        let section: Weak<RwLock<SectionModel>> = Arc::downgrade(&self.section);
        update.enqueue_datasource_update(move |_| {
            if let Some(section) = section.upgrade() {
                section.write().set_items(new_items);
            }
        });
        for operation in operations {
            let (change, paths) = match *operation {
                SingleSectionOperation::Delete(item) => (ChangeType::Delete, vec![IndexPath::new(item, 0)]),
                SingleSectionOperation::Insert(item) => (ChangeType::Insert, vec![IndexPath::new(item, 0)]),
                SingleSectionOperation::Update(item) => (ChangeType::Update, vec![IndexPath::new(item, 0)]),
                SingleSectionOperation::Move { from, to } => (
                    ChangeType::Move,
                    vec![IndexPath::new(from, 0), IndexPath::new(to, 0)],
                ),
            };
            update.record_object_change(change, paths);
        }
        tracing::trace!(target: targets::DIFF, operations = operations.len(), "single section update ready");
        self.dispatcher.deliver(update);
    }
}

impl<T, C> Storage for SingleSectionStorage<T, C>
where
    T: Identifiable + Clone + Any + Send + Sync,
    C: SectionDiffer<T>,
{
    fn number_of_sections(&self) -> usize {
        1
    }

    fn number_of_items(&self, section: usize) -> usize {
        if section == 0 {
            self.section.read().number_of_items()
        } else {
            0
        }
    }

    fn item(&self, index_path: IndexPath) -> Option<AnyItem> {
        if index_path.section != 0 {
            return None;
        }
        self.section.read().item(index_path.item).cloned()
    }

    fn set_delegate_weak(&self, delegate: Weak<dyn StorageUpdating>) {
        self.dispatcher.set_delegate(delegate);
    }

    fn clear_delegate(&self) {
        self.dispatcher.take_delegate();
    }
}

impl<T, C> SupplementaryStorage for SingleSectionStorage<T, C>
where
    T: Identifiable + Clone + Any + Send + Sync,
    C: SectionDiffer<T>,
{
    fn supplementary_model(&self, kind: &str, index_path: IndexPath) -> Option<AnyItem> {
        if index_path.section != 0 {
            return None;
        }
        self.section
            .read()
            .supplementary_model(kind, index_path.item)
            .cloned()
    }
}

impl<T, C> HeaderFooterStorage for SingleSectionStorage<T, C>
where
    T: Identifiable + Clone + Any + Send + Sync,
    C: SectionDiffer<T>,
{
    fn supplementary_kinds(&self) -> SupplementaryKinds {
        self.dispatcher.supplementary_kinds()
    }

    fn set_supplementary_kinds(&self, kinds: SupplementaryKinds) {
        self.dispatcher.set_supplementary_kinds(kinds);
    }
}

impl<T, C> HeaderFooterSettable for SingleSectionStorage<T, C>
where
    T: Identifiable + Clone + Any + Send + Sync,
    C: SectionDiffer<T>,
{
    fn set_supplementaries(&self, models: Vec<SupplementaryMap>, kind: &str) {
        if models.len() > 1 {
            tracing::warn!(
                target: targets::STORAGE,
                sections = models.len(),
                "single section storage cannot hold supplementaries for more than one section"
            );
            return;
        }
        let models = models.into_iter().next().unwrap_or_default();
        self.section.write().set_supplementaries(kind, models);
        self.dispatcher.storage_needs_reloading();
    }
}

impl<T, C> std::fmt::Debug for SingleSectionStorage<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleSectionStorage")
            .field("items", &self.section.read().number_of_items())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

static_assertions::assert_impl_all!(SingleSectionEquatableStorage<String>: Send, Sync);
static_assertions::assert_impl_all!(SingleSectionHashableStorage<u64>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Holder {
        updates: Mutex<Vec<StorageUpdate>>,
        reloads: Mutex<usize>,
    }

    impl StorageUpdating for Holder {
        fn storage_did_perform_update(&self, update: StorageUpdate) {
            self.updates.lock().push(update);
        }

        fn storage_needs_reloading(&self) {
            *self.reloads.lock() += 1;
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_items_change_only_after_apply() {
        let storage = SingleSectionEquatableStorage::new(strings(&["a"]), EquatableDiffer::new(LcsDiffer));
        let holder = Arc::new(Holder::default());
        storage.set_delegate(&holder);

        storage.set_items(strings(&["a", "b"]));
        assert_eq!(storage.items(), strings(&["a"]));

        let mut update = holder.updates.lock().pop().unwrap();
        assert_eq!(update.object_changes, vec![(ChangeType::Insert, vec![IndexPath::new(1, 0)])]);
        update.apply_deferred_datasource_updates();
        assert_eq!(storage.items(), strings(&["a", "b"]));
    }

    #[test]
    fn test_unchanged_items_still_deliver_replacement() {
        let storage = SingleSectionHashableStorage::new(vec![1_u32, 2], HashableDiffer::new(HeckelDiffer));
        let holder = Arc::new(Holder::default());
        storage.set_delegate(&holder);

        storage.set_items(vec![1, 2]);
        let updates = holder.updates.lock();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].object_changes.is_empty());
        assert!(updates[0].contains_deferred_datasource_updates());
    }

    #[test]
    fn test_item_is_limited_to_first_section() {
        let storage = SingleSectionHashableStorage::new(vec![5_u32], HashableDiffer::new(HeckelDiffer));
        assert_eq!(storage.typed_item::<u32>(IndexPath::new(0, 0)), Some(5));
        assert!(storage.item(IndexPath::new(1, 0)).is_none());
        assert!(storage.item(IndexPath::new(0, 1)).is_none());
        assert_eq!(storage.number_of_items(1), 0);
    }

    #[test]
    fn test_supplementaries_for_many_sections_are_rejected() {
        let storage = SingleSectionHashableStorage::new(Vec::<u32>::new(), HashableDiffer::new(HeckelDiffer));
        let holder = Arc::new(Holder::default());
        storage.set_delegate(&holder);

        let header = |value: &str| SupplementaryMap::from([(0, AnyItem::new(value.to_string()))]);
        storage.set_supplementaries(vec![header("one"), header("two")], "Header");
        assert!(storage.supplementary_model("Header", IndexPath::new(0, 0)).is_none());
        assert_eq!(*holder.reloads.lock(), 0);

        storage.set_supplementaries(vec![header("one")], "Header");
        assert_eq!(
            storage
                .supplementary_model("Header", IndexPath::new(0, 0))
                .and_then(|model| model.downcast::<String>()),
            Some("one".to_string())
        );
        assert_eq!(*holder.reloads.lock(), 1);
    }
}
