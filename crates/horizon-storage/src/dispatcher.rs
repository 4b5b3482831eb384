//! Transaction bookkeeping and update delivery.
//!
//! Every storage owns an [`UpdateDispatcher`]. A mutation opens a transaction
//! with [`start_update`](UpdateDispatcher::start_update), records into the
//! in-flight [`StorageUpdate`], and closes it with
//! [`finish_update`](UpdateDispatcher::finish_update). Inside
//! [`perform_updates`](UpdateDispatcher::perform_updates) closing is postponed
//! until the whole block has run, so the delegate receives exactly one update
//! for the batch.

use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_storage_core::logging::{span_names, targets};
use parking_lot::{Mutex, RwLock};

use crate::config::SupplementaryKinds;
use crate::traits::StorageUpdating;
use crate::update::StorageUpdate;

/// Shared transaction machinery for storages.
pub struct UpdateDispatcher {
    current_update: Mutex<Option<StorageUpdate>>,
    batching: AtomicBool,
    delegate: RwLock<Option<Weak<dyn StorageUpdating>>>,
    supplementary_kinds: RwLock<SupplementaryKinds>,
}

impl Default for UpdateDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the batching flag even if the batch block unwinds.
struct BatchGuard<'a>(&'a AtomicBool);

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl UpdateDispatcher {
    /// Creates a dispatcher with no delegate and no supplementary kinds.
    pub fn new() -> Self {
        Self::with_supplementary_kinds(SupplementaryKinds::default())
    }

    /// Creates a dispatcher using `kinds`.
    pub fn with_supplementary_kinds(kinds: SupplementaryKinds) -> Self {
        Self {
            current_update: Mutex::new(None),
            batching: AtomicBool::new(false),
            delegate: RwLock::new(None),
            supplementary_kinds: RwLock::new(kinds),
        }
    }

    // =========================================================================
    // Delegate
    // =========================================================================

    /// Replaces the delegate.
    pub fn set_delegate(&self, delegate: Weak<dyn StorageUpdating>) {
        *self.delegate.write() = Some(delegate);
    }

    /// Removes and returns the delegate.
    pub fn take_delegate(&self) -> Option<Weak<dyn StorageUpdating>> {
        self.delegate.write().take()
    }

    /// Restores a delegate previously returned by [`take_delegate`](Self::take_delegate).
    pub fn restore_delegate(&self, delegate: Option<Weak<dyn StorageUpdating>>) {
        *self.delegate.write() = delegate;
    }

    /// `true` if a live delegate is attached.
    pub fn has_delegate(&self) -> bool {
        self.delegate
            .read()
            .as_ref()
            .is_some_and(|delegate| delegate.strong_count() > 0)
    }

    // =========================================================================
    // Supplementary kinds
    // =========================================================================

    /// The header and footer kinds.
    pub fn supplementary_kinds(&self) -> SupplementaryKinds {
        self.supplementary_kinds.read().clone()
    }

    /// Replaces the header and footer kinds.
    pub fn set_supplementary_kinds(&self, kinds: SupplementaryKinds) {
        *self.supplementary_kinds.write() = kinds;
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// `true` while a [`perform_updates`](Self::perform_updates) block runs.
    pub fn is_batching(&self) -> bool {
        self.batching.load(Ordering::SeqCst)
    }

    /// `true` while a transaction is open.
    pub fn has_current_update(&self) -> bool {
        self.current_update.lock().is_some()
    }

    /// Opens a transaction unless one is already open.
    pub fn start_update(&self) {
        let mut current = self.current_update.lock();
        if current.is_none() {
            tracing::trace!(target: targets::UPDATE, "starting update");
            *current = Some(StorageUpdate::new());
        }
    }

    /// Runs `f` against the in-flight update, opening a transaction if needed.
    pub fn with_current_update<R>(&self, f: impl FnOnce(&mut StorageUpdate) -> R) -> R {
        let mut current = self.current_update.lock();
        f(current.get_or_insert_with(StorageUpdate::new))
    }

    /// Closes the transaction and delivers its update.
    pub fn finish_update(&self) {
        self.finish_update_with(|| {});
    }

    /// Closes the transaction, running `on_close` once it is actually closed.
    ///
    /// While batching this does nothing. Empty updates are dropped instead of
    /// delivered.
    pub fn finish_update_with(&self, on_close: impl FnOnce()) {
        if self.is_batching() {
            return;
        }
        let Some(update) = self.current_update.lock().take() else {
            return;
        };
        on_close();
        if update.is_empty() {
            tracing::trace!(target: targets::UPDATE, "suppressing empty update");
            return;
        }
        self.deliver(update);
    }

    /// Runs `block` as a single transaction.
    ///
    /// Nested calls run their block inside the outer transaction.
    pub fn perform_updates(&self, block: impl FnOnce(), on_close: impl FnOnce()) {
        if self.is_batching() {
            block();
            return;
        }
        {
            let _span = tracing::trace_span!(target: targets::UPDATE, span_names::TRANSACTION).entered();
            self.batching.store(true, Ordering::SeqCst);
            let _guard = BatchGuard(&self.batching);
            self.start_update();
            block();
        }
        self.finish_update_with(on_close);
    }

    /// Hands `update` to the delegate.
    ///
    /// Without a live delegate nobody can defer the update, so its datasource
    /// updates are applied on the spot.
    pub fn deliver(&self, mut update: StorageUpdate) {
        let delegate = self.delegate.read().as_ref().and_then(Weak::upgrade);
        match delegate {
            Some(delegate) => {
                tracing::debug!(
                    target: targets::UPDATE,
                    sections = update.section_changes.len(),
                    objects = update.object_changes.len(),
                    deferred = update.enqueued_update_count(),
                    "delivering update"
                );
                delegate.storage_did_perform_update(update);
            }
            None => {
                tracing::trace!(target: targets::UPDATE, "no delegate, applying update in place");
                update.apply_deferred_datasource_updates();
            }
        }
    }

    /// Tells the delegate to reload everything.
    pub fn storage_needs_reloading(&self) {
        let delegate = self.delegate.read().as_ref().and_then(Weak::upgrade);
        if let Some(delegate) = delegate {
            tracing::debug!(target: targets::UPDATE, "requesting reload");
            delegate.storage_needs_reloading();
        }
    }
}

impl std::fmt::Debug for UpdateDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateDispatcher")
            .field("current_update", &self.current_update.lock().is_some())
            .field("batching", &self.is_batching())
            .field("has_delegate", &self.has_delegate())
            .finish()
    }
}

static_assertions::assert_impl_all!(UpdateDispatcher: Send, Sync);
