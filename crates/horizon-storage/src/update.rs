//! Change sets describing one storage transaction.
//!
//! A [`StorageUpdate`] carries two things:
//!
//! - a structural description of what changed (section and item records),
//!   which a view uses to animate;
//! - a queue of deferred datasource updates, closures that bring the
//!   storage's real content to the described "after" state when the
//!   consumer replays them.
//!
//! Keeping the two apart lets a consumer begin its batch animation against
//! the "before" data and swap in the "after" data at the precise moment it
//! is ready.

use std::collections::HashMap;
use std::fmt;

use horizon_storage_core::logging::{span_names, targets};

use crate::index_path::IndexPath;
use crate::item::AnyItem;

/// The kind of a structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// Something was inserted.
    Insert,
    /// Something was deleted.
    Delete,
    /// Something was changed in place.
    Update,
    /// Something was moved. The record carries exactly a source and a destination.
    Move,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeType::Insert => "insert",
            ChangeType::Delete => "delete",
            ChangeType::Update => "update",
            ChangeType::Move => "move",
        };
        f.write_str(name)
    }
}

/// A deferred datasource update.
///
/// The closure receives the update it was enqueued on, so a replay can still
/// read the update's records.
pub type DatasourceUpdate = Box<dyn FnOnce(&StorageUpdate) + Send>;

/// The accumulated description of one transaction's structural changes.
///
/// # Equality
///
/// Two updates are equal when their section change lists and object change
/// lists are equal element by element, in order. Updated object values and
/// enqueued closures are not compared.
#[derive(Default)]
pub struct StorageUpdate {
    /// Section-level records, in the order they were made.
    pub section_changes: Vec<(ChangeType, Vec<usize>)>,
    /// Item-level records, in the order they were made.
    pub object_changes: Vec<(ChangeType, Vec<IndexPath>)>,
    /// Replacement values for update records, by location.
    pub updated_objects: HashMap<IndexPath, AnyItem>,
    enqueued_datasource_updates: Vec<DatasourceUpdate>,
}

impl StorageUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if there are no records and no deferred updates.
    pub fn is_empty(&self) -> bool {
        self.section_changes.is_empty()
            && self.object_changes.is_empty()
            && self.enqueued_datasource_updates.is_empty()
    }

    /// Records a section change.
    pub fn record_section_change(&mut self, change: ChangeType, indexes: Vec<usize>) {
        self.section_changes.push((change, indexes));
    }

    /// Records an item change.
    pub fn record_object_change(&mut self, change: ChangeType, index_paths: Vec<IndexPath>) {
        self.object_changes.push((change, index_paths));
    }

    /// Records an item update together with the item's new value.
    pub fn record_object_update(&mut self, index_path: IndexPath, value: AnyItem) {
        self.object_changes.push((ChangeType::Update, vec![index_path]));
        self.updated_objects.insert(index_path, value);
    }

    /// Appends a closure to the deferred update queue.
    pub fn enqueue_datasource_update<F>(&mut self, update: F)
    where
        F: FnOnce(&StorageUpdate) + Send + 'static,
    {
        self.enqueued_datasource_updates.push(Box::new(update));
    }

    /// `true` if the queue holds at least one closure.
    pub fn contains_deferred_datasource_updates(&self) -> bool {
        !self.enqueued_datasource_updates.is_empty()
    }

    /// Number of queued closures.
    pub fn enqueued_update_count(&self) -> usize {
        self.enqueued_datasource_updates.len()
    }

    /// Runs every queued closure in enqueue order and empties the queue.
    ///
    /// Calling this on an empty queue does nothing.
    pub fn apply_deferred_datasource_updates(&mut self) {
        if self.enqueued_datasource_updates.is_empty() {
            return;
        }
        let queued = std::mem::take(&mut self.enqueued_datasource_updates);
        let _span =
            tracing::trace_span!(target: targets::UPDATE, span_names::DEFERRED_APPLY, count = queued.len())
                .entered();
        for update in queued {
            update(self);
        }
    }

    /// Appends `other`'s records and queued closures after this update's own.
    pub fn merge(&mut self, other: StorageUpdate) {
        self.section_changes.extend(other.section_changes);
        self.object_changes.extend(other.object_changes);
        self.updated_objects.extend(other.updated_objects);
        self.enqueued_datasource_updates
            .extend(other.enqueued_datasource_updates);
    }

    /// The item-level records of one change type, flattened.
    pub fn object_changes_of(&self, change: ChangeType) -> Vec<IndexPath> {
        self.object_changes
            .iter()
            .filter(|(kind, _)| *kind == change)
            .flat_map(|(_, paths)| paths.iter().copied())
            .collect()
    }

    /// The section-level records of one change type, flattened.
    pub fn section_changes_of(&self, change: ChangeType) -> Vec<usize> {
        self.section_changes
            .iter()
            .filter(|(kind, _)| *kind == change)
            .flat_map(|(_, indexes)| indexes.iter().copied())
            .collect()
    }
}

impl PartialEq for StorageUpdate {
    fn eq(&self, other: &Self) -> bool {
        self.section_changes == other.section_changes && self.object_changes == other.object_changes
    }
}

impl Eq for StorageUpdate {}

impl fmt::Debug for StorageUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageUpdate")
            .field("section_changes", &self.section_changes)
            .field("object_changes", &self.object_changes)
            .field("updated_objects", &self.updated_objects.len())
            .field("enqueued_datasource_updates", &self.enqueued_datasource_updates.len())
            .finish()
    }
}

impl fmt::Display for StorageUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "StorageUpdate:")?;
        if !self.object_changes.is_empty() {
            writeln!(f, "Object changes:")?;
            for (change, paths) in &self.object_changes {
                let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
                writeln!(f, "  {change}: {}", paths.join(", "))?;
            }
        }
        if !self.section_changes.is_empty() {
            writeln!(f, "Section changes:")?;
            for (change, indexes) in &self.section_changes {
                writeln!(f, "  {change}: {indexes:?}")?;
            }
        }
        Ok(())
    }
}

static_assertions::assert_impl_all!(StorageUpdate: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_new_update_is_empty() {
        let update = StorageUpdate::new();
        assert!(update.is_empty());
        assert!(!update.contains_deferred_datasource_updates());
    }

    #[test]
    fn test_enqueued_closure_makes_update_non_empty() {
        let mut update = StorageUpdate::new();
        update.enqueue_datasource_update(|_| {});
        assert!(!update.is_empty());
        assert!(update.contains_deferred_datasource_updates());
        assert_eq!(update.enqueued_update_count(), 1);
    }

    #[test]
    fn test_apply_runs_in_order_and_clears() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut update = StorageUpdate::new();
        for n in 0..3 {
            let log = log.clone();
            update.enqueue_datasource_update(move |_| log.lock().push(n));
        }

        update.apply_deferred_datasource_updates();
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert!(!update.contains_deferred_datasource_updates());

        update.apply_deferred_datasource_updates();
        assert_eq!(log.lock().len(), 3);
    }

    #[test]
    fn test_closure_sees_records() {
        let seen = Arc::new(Mutex::new(0));
        let mut update = StorageUpdate::new();
        update.record_object_change(ChangeType::Insert, vec![IndexPath::new(0, 0)]);
        let seen_clone = seen.clone();
        update.enqueue_datasource_update(move |update| {
            *seen_clone.lock() = update.object_changes.len();
        });

        update.apply_deferred_datasource_updates();
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_equality_is_ordered() {
        let mut first = StorageUpdate::new();
        first.record_object_change(ChangeType::Insert, vec![IndexPath::new(0, 0)]);
        first.record_object_change(ChangeType::Delete, vec![IndexPath::new(1, 0)]);

        let mut second = StorageUpdate::new();
        second.record_object_change(ChangeType::Delete, vec![IndexPath::new(1, 0)]);
        second.record_object_change(ChangeType::Insert, vec![IndexPath::new(0, 0)]);
        assert_ne!(first, second);

        let mut third = StorageUpdate::new();
        third.record_object_change(ChangeType::Insert, vec![IndexPath::new(0, 0)]);
        third.record_object_change(ChangeType::Delete, vec![IndexPath::new(1, 0)]);
        third.enqueue_datasource_update(|_| {});
        assert_eq!(first, third);
    }

    #[test]
    fn test_move_pairs_are_order_sensitive() {
        let mut first = StorageUpdate::new();
        first.record_section_change(ChangeType::Move, vec![0, 1]);
        let mut second = StorageUpdate::new();
        second.record_section_change(ChangeType::Move, vec![1, 0]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_record_update_stores_value() {
        let mut update = StorageUpdate::new();
        update.record_object_update(IndexPath::new(1, 0), AnyItem::new(4));
        assert_eq!(update.object_changes_of(ChangeType::Update), vec![IndexPath::new(1, 0)]);
        assert_eq!(
            update.updated_objects.get(&IndexPath::new(1, 0)).and_then(|v| v.downcast::<i32>()),
            Some(4)
        );
    }

    #[test]
    fn test_display_lists_changes() {
        let mut update = StorageUpdate::new();
        update.record_section_change(ChangeType::Insert, vec![0]);
        update.record_object_change(ChangeType::Insert, vec![IndexPath::new(2, 0)]);
        let text = update.to_string();
        assert!(text.contains("insert: [0, 2]"));
        assert!(text.contains("insert: [0]"));
    }
}
