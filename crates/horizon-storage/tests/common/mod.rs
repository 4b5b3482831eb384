//! Shared helpers for storage integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use horizon_storage::{
    AnomalyHandler, MemoryStorage, MemoryStorageAnomaly, SectionModel, Storage, StorageUpdate,
    StorageUpdating,
};
use parking_lot::Mutex;

/// A delegate that records what it receives.
///
/// In applying mode every update's deferred datasource updates are replayed
/// on arrival, the way a view without animations would. In holding mode
/// updates are kept untouched until the test replays them.
#[derive(Default)]
pub struct StorageUpdatesObserver {
    holds_updates: bool,
    pub updates: Mutex<Vec<StorageUpdate>>,
    pub reload_count: Mutex<usize>,
}

impl StorageUpdatesObserver {
    pub fn applying() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn holding() -> Arc<Self> {
        Arc::new(Self {
            holds_updates: true,
            ..Self::default()
        })
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().len()
    }

    /// Removes and returns the most recent update.
    pub fn take_last_update(&self) -> Option<StorageUpdate> {
        self.updates.lock().pop()
    }

    pub fn did_reload(&self) -> bool {
        *self.reload_count.lock() > 0
    }

    /// Replays every held update in arrival order.
    pub fn apply_all(&self) {
        let mut updates = std::mem::take(&mut *self.updates.lock());
        for update in &mut updates {
            update.apply_deferred_datasource_updates();
        }
        self.updates.lock().extend(updates);
    }
}

impl StorageUpdating for StorageUpdatesObserver {
    fn storage_did_perform_update(&self, mut update: StorageUpdate) {
        if !self.holds_updates {
            update.apply_deferred_datasource_updates();
        }
        self.updates.lock().push(update);
    }

    fn storage_needs_reloading(&self) {
        *self.reload_count.lock() += 1;
    }
}

/// Collects every anomaly reported by `handler`.
pub fn capture_anomalies(handler: &AnomalyHandler<MemoryStorageAnomaly>) -> Arc<Mutex<Vec<MemoryStorageAnomaly>>> {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    handler.set_logging_enabled(false);
    handler.connect(move |anomaly| sink.lock().push(anomaly.clone()));
    captured
}

/// A memory storage with an applying observer attached.
pub fn observed_storage() -> (MemoryStorage, Arc<StorageUpdatesObserver>) {
    let storage = MemoryStorage::new();
    let observer = StorageUpdatesObserver::applying();
    storage.set_delegate(&observer);
    (storage, observer)
}

/// Every section's items downcast to `i32`.
pub fn int_sections(storage: &MemoryStorage) -> Vec<Vec<i32>> {
    storage
        .sections()
        .iter()
        .map(SectionModel::items_of_type::<i32>)
        .collect()
}

/// Installs a `tracing` subscriber that writes through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
