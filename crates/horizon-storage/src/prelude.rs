//! Prelude module for Horizon Storage.
//!
//! ```
//! use horizon_storage::prelude::*;
//! ```
//!
//! This provides access to:
//! - The storages (`MemoryStorage`, `SingleSectionStorage`, feed adapters)
//! - The storage protocols (`Storage`, `StorageUpdating`, header/footer traits)
//! - Change sets (`StorageUpdate`, `ChangeType`, `IndexPath`)
//! - Diffing and accumulation strategies

// ============================================================================
// Values
// ============================================================================

pub use crate::index_path::IndexPath;
pub use crate::item::{AnyItem, Identifiable};
pub use crate::section::{SectionId, SectionModel, SupplementaryMap};

// ============================================================================
// Protocols
// ============================================================================

pub use crate::traits::{
    HeaderFooterSettable, HeaderFooterStorage, Storage, StorageUpdating, SupplementaryStorage,
};
pub use crate::update::{ChangeType, StorageUpdate};

// ============================================================================
// Storages
// ============================================================================

pub use crate::config::{StorageConfig, SupplementaryKinds};
pub use crate::error::{MemoryStorageError, Result};
pub use crate::feed::{ChangeFeedObserver, FetchedResultsStorage, ObservableCollection, ReactiveStorage};
pub use crate::memory::{MemoryStorage, MemoryStorageAnomaly};
pub use crate::single_section::{
    EquatableDiffer, HashableDiffer, SingleSectionEquatableStorage, SingleSectionHashableStorage,
};

// ============================================================================
// Strategies
// ============================================================================

pub use crate::accumulation::{
    AccumulationStrategy, AdditiveAccumulationStrategy, DeleteOldValuesAccumulationStrategy,
    UpdateOldValuesAccumulationStrategy,
};
pub use crate::diff::{HeckelDiffer, LcsDiffer, SingleSectionOperation};

// ============================================================================
// Diagnostics
// ============================================================================

pub use horizon_storage_core::{Anomaly, AnomalyHandler};
