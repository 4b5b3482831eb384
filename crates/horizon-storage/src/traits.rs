//! Storage protocols.
//!
//! A storage is read through [`Storage`] and, optionally,
//! [`SupplementaryStorage`] / [`HeaderFooterStorage`]. It reports changes to a
//! single [`StorageUpdating`] delegate, which it holds weakly.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::config::SupplementaryKinds;
use crate::index_path::IndexPath;
use crate::item::AnyItem;
use crate::section::SupplementaryMap;
use crate::update::StorageUpdate;

/// The consumer side of the update-delivery protocol.
///
/// # Example
///
/// ```
/// use horizon_storage::{StorageUpdate, StorageUpdating};
///
/// struct ApplyImmediately;
///
/// impl StorageUpdating for ApplyImmediately {
///     fn storage_did_perform_update(&self, mut update: StorageUpdate) {
///         // A view would start its batch animation here.
///         update.apply_deferred_datasource_updates();
///     }
///
///     fn storage_needs_reloading(&self) {}
/// }
/// ```
pub trait StorageUpdating: Send + Sync {
    /// Called once per transaction with a non-empty update.
    ///
    /// The delegate owns the update. Any deferred datasource updates it
    /// carries change the storage only when the delegate replays them with
    /// [`StorageUpdate::apply_deferred_datasource_updates`].
    fn storage_did_perform_update(&self, update: StorageUpdate);

    /// Called when a mutation bypassed incremental change tracking.
    fn storage_needs_reloading(&self);
}

/// Read access shared by every storage.
pub trait Storage: Send + Sync {
    /// Number of sections.
    fn number_of_sections(&self) -> usize;

    /// Number of items in `section`, `0` for a missing section.
    fn number_of_items(&self, section: usize) -> usize;

    /// The item at `index_path`, or `None` when out of bounds.
    fn item(&self, index_path: IndexPath) -> Option<AnyItem>;

    /// Replaces the delegate.
    fn set_delegate_weak(&self, delegate: Weak<dyn StorageUpdating>);

    /// Removes the delegate.
    fn clear_delegate(&self);

    /// Attaches `delegate` without taking ownership of it.
    fn set_delegate<D>(&self, delegate: &Arc<D>)
    where
        Self: Sized,
        D: StorageUpdating + 'static,
    {
        let weak: Weak<D> = Arc::downgrade(delegate);
        self.set_delegate_weak(weak);
    }

    /// The item at `index_path`, downcast to `T`.
    fn typed_item<T: Any + Clone>(&self, index_path: IndexPath) -> Option<T>
    where
        Self: Sized,
    {
        self.item(index_path)?.downcast::<T>()
    }
}

/// Storages that expose supplementary models.
pub trait SupplementaryStorage: Storage {
    /// The supplementary model of `kind` for `index_path.section`, at
    /// supplementary index `index_path.item`.
    fn supplementary_model(&self, kind: &str, index_path: IndexPath) -> Option<AnyItem>;
}

/// Storages that know which supplementary kinds are headers and footers.
pub trait HeaderFooterStorage: SupplementaryStorage {
    /// The header and footer kinds in use.
    fn supplementary_kinds(&self) -> SupplementaryKinds;

    /// Replaces the header and footer kinds.
    fn set_supplementary_kinds(&self, kinds: SupplementaryKinds);

    /// Use list-style kinds.
    fn configure_for_list_usage(&self) {
        self.set_supplementary_kinds(SupplementaryKinds::list());
    }

    /// Use grid-style kinds.
    fn configure_for_grid_usage(&self) {
        self.set_supplementary_kinds(SupplementaryKinds::grid());
    }

    /// The header model of `section`.
    fn header_model(&self, section: usize) -> Option<AnyItem> {
        let kind = self.supplementary_kinds().header?;
        self.supplementary_model(&kind, IndexPath::new(0, section))
    }

    /// The footer model of `section`.
    fn footer_model(&self, section: usize) -> Option<AnyItem> {
        let kind = self.supplementary_kinds().footer?;
        self.supplementary_model(&kind, IndexPath::new(0, section))
    }
}

/// Storages whose supplementary models can be replaced wholesale.
///
/// Every setter here bypasses change tracking and ends with a reload
/// notification.
pub trait HeaderFooterSettable: HeaderFooterStorage {
    /// Sets the supplementary models of `kind`, one map per section.
    ///
    /// An empty `models` clears `kind` in every section.
    fn set_supplementaries(&self, models: Vec<SupplementaryMap>, kind: &str);

    /// Sets one header model per section.
    fn set_section_header_models<T: Any + Send + Sync>(&self, models: Vec<T>)
    where
        Self: Sized,
    {
        let Some(kind) = self.supplementary_kinds().header else {
            tracing::warn!(
                target: horizon_storage_core::logging::targets::STORAGE,
                "header kind is not set, ignoring section header models"
            );
            return;
        };
        self.set_supplementaries(index_zero_maps(models), &kind);
    }

    /// Sets one footer model per section.
    fn set_section_footer_models<T: Any + Send + Sync>(&self, models: Vec<T>)
    where
        Self: Sized,
    {
        let Some(kind) = self.supplementary_kinds().footer else {
            tracing::warn!(
                target: horizon_storage_core::logging::targets::STORAGE,
                "footer kind is not set, ignoring section footer models"
            );
            return;
        };
        self.set_supplementaries(index_zero_maps(models), &kind);
    }
}

fn index_zero_maps<T: Any + Send + Sync>(models: Vec<T>) -> Vec<SupplementaryMap> {
    models
        .into_iter()
        .map(|model| SupplementaryMap::from([(0, AnyItem::new(model))]))
        .collect()
}
