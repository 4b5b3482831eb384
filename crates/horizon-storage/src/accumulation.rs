//! Strategies for merging a new batch of items into an existing collection.

use std::collections::HashMap;

use horizon_storage_core::logging::targets;

use crate::item::Identifiable;

/// Merges `new` items into `old` items.
pub trait AccumulationStrategy: Send + Sync {
    /// Returns the merged collection.
    fn accumulate<T: Identifiable + Clone>(&self, old: &[T], new: &[T]) -> Vec<T>;
}

/// Appends every new item. Duplicates are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditiveAccumulationStrategy;

impl AccumulationStrategy for AdditiveAccumulationStrategy {
    fn accumulate<T: Identifiable + Clone>(&self, old: &[T], new: &[T]) -> Vec<T> {
        let mut result = Vec::with_capacity(old.len() + new.len());
        result.extend_from_slice(old);
        result.extend_from_slice(new);
        result
    }
}

/// Replaces items that share an identifier in place; appends the rest.
///
/// ```
/// use horizon_storage::{AccumulationStrategy, UpdateOldValuesAccumulationStrategy};
///
/// let merged = UpdateOldValuesAccumulationStrategy.accumulate(&[1, 2, 3], &[4, 2]);
/// assert_eq!(merged, vec![1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOldValuesAccumulationStrategy;

impl AccumulationStrategy for UpdateOldValuesAccumulationStrategy {
    fn accumulate<T: Identifiable + Clone>(&self, old: &[T], new: &[T]) -> Vec<T> {
        let mut result = old.to_vec();
        let mut positions: HashMap<T::Identifier, usize> = HashMap::with_capacity(old.len());
        for (index, item) in old.iter().enumerate() {
            positions.entry(item.identifier()).or_insert(index);
        }
        for item in new {
            match positions.get(&item.identifier()) {
                Some(&index) => result[index] = item.clone(),
                None => {
                    positions.insert(item.identifier(), result.len());
                    result.push(item.clone());
                }
            }
        }
        result
    }
}

/// Appends every new item and removes old items that share an identifier
/// with a new one.
///
/// An updated identity therefore moves to the end of the collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOldValuesAccumulationStrategy;

impl AccumulationStrategy for DeleteOldValuesAccumulationStrategy {
    fn accumulate<T: Identifiable + Clone>(&self, old: &[T], new: &[T]) -> Vec<T> {
        let mut positions: HashMap<T::Identifier, usize> = HashMap::with_capacity(old.len());
        for (index, item) in old.iter().enumerate() {
            positions.entry(item.identifier()).or_insert(index);
        }

        let mut result = Vec::with_capacity(old.len() + new.len());
        result.extend_from_slice(old);
        let mut stale = Vec::new();
        for item in new {
            if let Some(index) = positions.remove(&item.identifier()) {
                stale.push(index);
            }
            result.push(item.clone());
        }

        stale.sort_unstable_by(|a, b| b.cmp(a));
        for index in stale {
            result.remove(index);
        }
        tracing::trace!(target: targets::DIFF, count = result.len(), "accumulated with old values deleted");
        result
    }
}
