//! The structural delta between two keyed sequences.

use std::collections::HashSet;
use std::hash::Hash;

use crate::diffable::Diffable;

/// A single move operation.
///
/// `from` is a coordinate in the old sequence, `to` a coordinate in
/// the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// Index of the item in the old sequence.
    pub from: usize,
    /// Index of the item in the new sequence.
    pub to: usize,
}

/// The result of one diff computation.
///
/// The four operation sets are disjoint: a moved item never appears
/// in `deletes` or `inserts`, and `updates` is keyed by identity so
/// it composes with a move when an item changed content *and*
/// position.
///
/// Replaying the operations in the canonical order (`deletes` in
/// descending old-index order, then moves, then `inserts` in
/// ascending new-index order, then in-place updates) transforms the
/// old sequence into exactly the new one. [`Delta::apply_to`]
/// realizes that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta<K: Hash + Eq> {
    /// Indices deleted from the old sequence, ascending.
    pub deletes: Vec<usize>,
    /// Indices inserted into the new sequence, ascending.
    pub inserts: Vec<usize>,
    /// Items present in both sequences at a shifted relative position.
    pub moves: Vec<Move>,
    /// Keys present in both sequences whose content equality failed.
    pub updates: HashSet<K>,
}

impl<K: Hash + Eq> Default for Delta<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: Hash + Eq> Delta<K> {
    /// Creates a delta with no operations.
    pub fn empty() -> Self {
        Self {
            deletes: Vec::new(),
            inserts: Vec::new(),
            moves: Vec::new(),
            updates: HashSet::new(),
        }
    }

    /// Returns `true` if the delta carries no operations at all.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty()
            && self.inserts.is_empty()
            && self.moves.is_empty()
            && self.updates.is_empty()
    }

    /// Total number of operations across all four sets.
    pub fn change_count(&self) -> usize {
        self.deletes.len() + self.inserts.len() + self.moves.len() + self.updates.len()
    }
}

impl<K: Hash + Eq> Delta<K> {
    /// Replays this delta against `old`, drawing inserted and updated
    /// content from `new`, and returns the resulting sequence.
    ///
    /// Moves are expanded into a removal at the source and an
    /// insertion at the target, the standard batch-mutation form.
    /// For a delta produced by [`diff`](crate::diff) from
    /// `(old, new)`, the result equals `new` exactly; that equality
    /// is the engine's correctness oracle.
    pub fn apply_to<T>(&self, old: &[T], new: &[T]) -> Vec<T>
    where
        T: Diffable<Key = K> + Clone,
    {
        let mut result: Vec<T> = old.to_vec();

        // Deletes and move sources leave the old coordinate space in
        // descending order so earlier indices stay valid.
        let mut removals: Vec<usize> = self
            .deletes
            .iter()
            .copied()
            .chain(self.moves.iter().map(|m| m.from))
            .collect();
        removals.sort_unstable_by(|a, b| b.cmp(a));
        for index in removals {
            result.remove(index);
        }

        // Inserts and move targets enter the new coordinate space in
        // ascending order.
        let mut insertions: Vec<(usize, T)> = self
            .inserts
            .iter()
            .map(|&i| (i, new[i].clone()))
            .chain(self.moves.iter().map(|m| (m.to, old[m.from].clone())))
            .collect();
        insertions.sort_unstable_by_key(|(i, _)| *i);
        for (index, item) in insertions {
            result.insert(index, item);
        }

        // Content updates are positionally in place: the structure
        // already matches `new`, so refresh from the same coordinate.
        for (index, item) in new.iter().enumerate() {
            if self.updates.contains(&item.diff_key()) {
                result[index] = item.clone();
            }
        }

        result
    }
}
