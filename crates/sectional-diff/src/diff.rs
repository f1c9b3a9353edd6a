//! The keyed diff computation.

use std::collections::HashMap;

use crate::delta::{Delta, Move};
use crate::diffable::Diffable;
use crate::error::{DiffError, DiffResult};

/// Computes the structural delta transforming `old` into `new`.
///
/// Matching is key-indexed, so the expected cost is linear in the
/// combined sequence length; there is no pairwise scan. Items present
/// in both sequences are classified by two independent tests:
///
/// - **Move**: the item's position is not fully explained by the
///   pure insertions and deletions around it, i.e.
///   `old_index - deletes_before(old_index) + inserts_before(new_index)`
///   differs from `new_index`. A swapped pair therefore reports two
///   moves, while an item merely shifted by a neighbor's insertion or
///   removal reports none.
/// - **Update**: [`content_eq`](Diffable::content_eq) fails for the
///   old and new occurrence. An item can move and update at once.
///
/// # Errors
///
/// Returns [`DiffError::DuplicateKey`] if either sequence contains
/// the same key twice. Identity collisions are a caller error and are
/// never resolved by guessing.
pub fn diff<T: Diffable>(old: &[T], new: &[T]) -> DiffResult<Delta<T::Key>, T::Key> {
    let old_index = index_by_key(old)?;
    let new_index = index_by_key(new)?;

    let mut delta = Delta::empty();

    // First pass over the old sequence: anything whose key vanished
    // is a delete. `delete_offsets[i]` counts deletions before `i`.
    let mut delete_offsets = vec![0usize; old.len()];
    let mut deleted = 0usize;
    for (i, item) in old.iter().enumerate() {
        delete_offsets[i] = deleted;
        if !new_index.contains_key(&item.diff_key()) {
            delta.deletes.push(i);
            deleted += 1;
        }
    }

    // Second pass over the new sequence: fresh keys are inserts;
    // surviving keys are checked for moves and content updates.
    let mut inserted = 0usize;
    for (i, item) in new.iter().enumerate() {
        let insert_offset = inserted;
        let key = item.diff_key();
        match old_index.get(&key) {
            None => {
                delta.inserts.push(i);
                inserted += 1;
            }
            Some(&old_i) => {
                if !old[old_i].content_eq(item) {
                    delta.updates.insert(key);
                }
                if old_i - delete_offsets[old_i] + insert_offset != i {
                    delta.moves.push(Move { from: old_i, to: i });
                }
            }
        }
    }

    tracing::trace!(
        target: "sectional_diff",
        old_len = old.len(),
        new_len = new.len(),
        deletes = delta.deletes.len(),
        inserts = delta.inserts.len(),
        moves = delta.moves.len(),
        updates = delta.updates.len(),
        "computed delta"
    );

    Ok(delta)
}

/// Builds a key → index table, rejecting duplicate keys.
fn index_by_key<T: Diffable>(items: &[T]) -> DiffResult<HashMap<T::Key, usize>, T::Key> {
    let mut index = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let key = item.diff_key();
        if index.insert(key.clone(), i).is_some() {
            return Err(DiffError::DuplicateKey { key });
        }
    }
    Ok(index)
}
