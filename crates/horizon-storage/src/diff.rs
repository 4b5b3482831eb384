//! Diffing algorithms for a single ordered collection.
//!
//! A diff turns two snapshots into a list of [`SingleSectionOperation`]s that
//! a view can animate in one batch. Operations follow batch-update index
//! rules:
//!
//! - [`Delete`](SingleSectionOperation::Delete) and the source of a
//!   [`Move`](SingleSectionOperation::Move) refer to positions in the old
//!   snapshot;
//! - [`Insert`](SingleSectionOperation::Insert) and the destination of a
//!   move refer to positions in the new snapshot;
//! - [`Update`](SingleSectionOperation::Update) refers to a position in the
//!   old snapshot of an item that stays in place.
//!
//! Two algorithms are provided. [`LcsDiffer`] only needs equality and reports
//! inserts and deletes. [`HeckelDiffer`] needs hashable values and also
//! reports moves and updates.
//!
//! Identifiers must be unique within a snapshot. Duplicates never panic but
//! produce an unspecified (still internally consistent) diff.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use horizon_storage_core::logging::targets;

use crate::item::Identifiable;

/// One operation of a single-section diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingleSectionOperation {
    /// Remove the item at this old index.
    Delete(usize),
    /// Insert an item at this new index.
    Insert(usize),
    /// Move an item from an old index to a new index.
    Move {
        /// Index in the old snapshot.
        from: usize,
        /// Index in the new snapshot.
        to: usize,
    },
    /// Reload the item at this old index in place.
    Update(usize),
}

/// A diff that only relies on identity and equality.
pub trait EquatableDiffingAlgorithm: Send + Sync {
    /// Computes the operations that turn `from` into `to`.
    fn diff<T: Identifiable + PartialEq>(&self, from: &[T], to: &[T]) -> Vec<SingleSectionOperation>;
}

/// A diff that relies on hashable identity and full equality.
pub trait HashableDiffingAlgorithm: Send + Sync {
    /// Computes the operations that turn `from` into `to`.
    fn diff<T: Identifiable + Hash + Eq>(&self, from: &[T], to: &[T]) -> Vec<SingleSectionOperation>;
}

/// Longest-common-subsequence diff.
///
/// Two items match when they share an identifier and compare equal. Items
/// outside the longest common subsequence become deletes (highest index
/// first) followed by inserts (lowest index first).
///
/// ```
/// use horizon_storage::{EquatableDiffingAlgorithm, LcsDiffer, SingleSectionOperation};
///
/// let ops = EquatableDiffingAlgorithm::diff(&LcsDiffer, &["foo", "bar"], &["bar", "foo"]);
/// assert_eq!(
///     ops,
///     vec![SingleSectionOperation::Delete(0), SingleSectionOperation::Insert(1)]
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LcsDiffer;

impl LcsDiffer {
    fn matches<T: Identifiable + PartialEq>(a: &T, b: &T) -> bool {
        a.identifier() == b.identifier() && a == b
    }

    fn lcs_diff<T: Identifiable + PartialEq>(from: &[T], to: &[T]) -> Vec<SingleSectionOperation> {
        let rows = from.len() + 1;
        let cols = to.len() + 1;
        let mut table = vec![0_usize; rows * cols];
        let at = |i: usize, j: usize| i * cols + j;

        for i in 1..rows {
            for j in 1..cols {
                table[at(i, j)] = if Self::matches(&from[i - 1], &to[j - 1]) {
                    table[at(i - 1, j - 1)] + 1
                } else {
                    table[at(i, j - 1)].max(table[at(i - 1, j)])
                };
            }
        }

        let mut deletes = Vec::new();
        let mut inserts = Vec::new();
        let (mut i, mut j) = (from.len(), to.len());
        while i > 0 || j > 0 {
            if i == 0 {
                inserts.push(j - 1);
                j -= 1;
            } else if j == 0 {
                deletes.push(i - 1);
                i -= 1;
            } else if table[at(i, j)] == table[at(i, j - 1)] {
                inserts.push(j - 1);
                j -= 1;
            } else if table[at(i, j)] == table[at(i - 1, j)] {
                deletes.push(i - 1);
                i -= 1;
            } else {
                i -= 1;
                j -= 1;
            }
        }

        // Backtracking visits both lists from the end.
        deletes.sort_unstable_by(|a, b| b.cmp(a));
        inserts.sort_unstable();

        deletes
            .into_iter()
            .map(SingleSectionOperation::Delete)
            .chain(inserts.into_iter().map(SingleSectionOperation::Insert))
            .collect()
    }
}

impl EquatableDiffingAlgorithm for LcsDiffer {
    #[tracing::instrument(skip_all, target = "horizon_storage::diff", level = "trace", fields(from = from.len(), to = to.len()))]
    fn diff<T: Identifiable + PartialEq>(&self, from: &[T], to: &[T]) -> Vec<SingleSectionOperation> {
        Self::lcs_diff(from, to)
    }
}

impl HashableDiffingAlgorithm for LcsDiffer {
    fn diff<T: Identifiable + Hash + Eq>(&self, from: &[T], to: &[T]) -> Vec<SingleSectionOperation> {
        Self::lcs_diff(from, to)
    }
}

/// Identity-tracking diff after Paul Heckel's "isolating differences" method.
///
/// Items are paired across snapshots by identifier. Among paired items, one
/// whose rank among paired items is the same in both snapshots stays in
/// place; the rest move. Then:
///
/// - unpaired old items are deleted and unpaired new items inserted;
/// - a paired item that moved with an unchanged value becomes a move;
/// - a paired item that moved and changed becomes a delete plus an insert;
/// - a paired item that stayed in place and changed becomes an update.
///
/// Output order is deletes (ascending), then inserts and moves by new index,
/// then updates (ascending).
#[derive(Debug, Clone, Copy, Default)]
pub struct HeckelDiffer;

impl HashableDiffingAlgorithm for HeckelDiffer {
    #[tracing::instrument(skip_all, target = "horizon_storage::diff", level = "trace", fields(from = from.len(), to = to.len()))]
    fn diff<T: Identifiable + Hash + Eq>(&self, from: &[T], to: &[T]) -> Vec<SingleSectionOperation> {
        let mut old_by_identifier: HashMap<T::Identifier, usize> = HashMap::with_capacity(from.len());
        for (index, item) in from.iter().enumerate() {
            old_by_identifier.entry(item.identifier()).or_insert(index);
        }

        // Pair every new index with at most one old index.
        let mut new_to_old: Vec<Option<usize>> = vec![None; to.len()];
        let mut old_paired = vec![false; from.len()];
        for (new_index, item) in to.iter().enumerate() {
            if let Some(&old_index) = old_by_identifier.get(&item.identifier()) {
                if !old_paired[old_index] {
                    old_paired[old_index] = true;
                    new_to_old[new_index] = Some(old_index);
                }
            }
        }

        // Rank of each paired old item among paired old items.
        let mut old_rank = vec![0_usize; from.len()];
        let mut rank = 0;
        for (old_index, paired) in old_paired.iter().enumerate() {
            if *paired {
                old_rank[old_index] = rank;
                rank += 1;
            }
        }

        let mut deletes = Vec::new();
        let mut inserts_and_moves = Vec::new();
        let mut updates = Vec::new();
        let mut new_rank = 0;
        for (new_index, pairing) in new_to_old.iter().enumerate() {
            let Some(old_index) = *pairing else {
                inserts_and_moves.push(SingleSectionOperation::Insert(new_index));
                continue;
            };
            let stays = old_rank[old_index] == new_rank;
            let changed = from[old_index] != to[new_index];
            new_rank += 1;
            match (stays, changed) {
                (true, false) => {}
                (true, true) => updates.push(old_index),
                (false, false) => inserts_and_moves.push(SingleSectionOperation::Move {
                    from: old_index,
                    to: new_index,
                }),
                (false, true) => {
                    deletes.push(old_index);
                    inserts_and_moves.push(SingleSectionOperation::Insert(new_index));
                }
            }
        }
        deletes.extend(
            old_paired
                .iter()
                .enumerate()
                .filter(|(_, paired)| !**paired)
                .map(|(index, _)| index),
        );
        deletes.sort_unstable();
        updates.sort_unstable();

        let operations: Vec<_> = deletes
            .into_iter()
            .map(SingleSectionOperation::Delete)
            .chain(inserts_and_moves)
            .chain(updates.into_iter().map(SingleSectionOperation::Update))
            .collect();
        tracing::trace!(target: targets::DIFF, operations = operations.len(), "heckel diff computed");
        operations
    }
}

/// Replays `operations` against `from` the way a batch view update does.
///
/// Deletes and move sources are removed first (highest index first), then
/// inserts and move destinations are placed at their new indexes in
/// ascending order. Insert values are taken from `to`; updated items are
/// replaced by their new value. The result equals `to` for any diff produced
/// by this module.
pub fn apply_operations<T: Clone>(from: &[T], to: &[T], operations: &[SingleSectionOperation]) -> Vec<T> {
    let mut removed = Vec::new();
    let mut placed: Vec<(usize, T)> = Vec::new();
    let mut updated: HashSet<usize> = HashSet::new();

    for operation in operations {
        match *operation {
            SingleSectionOperation::Delete(index) => removed.push(index),
            SingleSectionOperation::Insert(index) => {
                if let Some(value) = to.get(index) {
                    placed.push((index, value.clone()));
                }
            }
            SingleSectionOperation::Move { from: source, to: destination } => {
                removed.push(source);
                if let Some(value) = from.get(source) {
                    placed.push((destination, value.clone()));
                }
            }
            SingleSectionOperation::Update(index) => {
                updated.insert(index);
            }
        }
    }

    // Updates keep their slot; resolve their new value by position after the batch.
    let mut result: Vec<(Option<usize>, T)> = from
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, value)| (Some(index), value))
        .collect();
    removed.sort_unstable_by(|a, b| b.cmp(a));
    removed.dedup();
    for index in removed {
        if index < result.len() {
            result.remove(index);
        }
    }
    placed.sort_by_key(|(index, _)| *index);
    for (index, value) in placed {
        let index = index.min(result.len());
        result.insert(index, (None, value));
    }
    result
        .into_iter()
        .enumerate()
        .map(|(position, (old_index, value))| match old_index {
            Some(old) if updated.contains(&old) => to.get(position).cloned().unwrap_or(value),
            _ => value,
        })
        .collect()
}
