//! Signal/slot fan-out for storage notifications.
//!
//! A [`Signal`] carries side-channel notifications that do not belong in a
//! storage's update stream: anomaly reports, and change notifications of
//! observable collections that a storage mirrors. Any number of slots may be
//! connected; each receives a reference to the emitted value.
//!
//! Slots run on the emitting thread, after the connection table has been
//! unlocked. A slot may therefore disconnect itself (or connect new slots)
//! while being invoked; newly connected slots first run on the next emission.
//!
//! ```
//! use horizon_storage_core::Signal;
//!
//! let item_count_changed = Signal::<usize>::new();
//! let id = item_count_changed.connect(|count| println!("now {count} items"));
//!
//! assert_eq!(item_count_changed.emit(3), 1);
//! item_count_changed.disconnect(id);
//! assert_eq!(item_count_changed.emit(4), 0);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of one connected slot, used to disconnect it.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A notification source with any number of connected slots.
///
/// Slots are invoked in connection order.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Creates a signal with no slots.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connects `slot`; keep the returned id to disconnect it later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connections.lock().insert(Arc::new(slot));
        tracing::trace!(target: targets::SIGNAL, ?id, "slot connected");
        id
    }

    /// Disconnects the slot behind `id`.
    ///
    /// Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.connections.lock().remove(id).is_some();
        if removed {
            tracing::trace!(target: targets::SIGNAL, ?id, "slot disconnected");
        }
        removed
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Invokes every connected slot with `args` and returns how many ran.
    #[tracing::instrument(skip_all, target = "horizon_storage_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> usize {
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in &slots {
            slot(&args);
        }
        slots.len()
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connection_count", &self.connections.lock().len())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
