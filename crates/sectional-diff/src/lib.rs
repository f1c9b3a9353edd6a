//! Keyed sequence diffing for Sectional.
//!
//! Given two ordered sequences of identity-bearing items, [`diff`]
//! computes a set of structural operations (inserts, deletes, moves,
//! and content updates) that transforms the first sequence into the
//! second. The result is a [`Delta`] whose
//! operations are safe to replay against a live, index-addressed
//! container in the canonical order (deletes descending, then moves,
//! then inserts ascending, then in-place updates).
//!
//! Items opt in by implementing [`Diffable`], which separates
//! *identity* (a stable [`Diffable::Key`] that survives content
//! changes and reordering) from *content equality* (used to decide
//! whether an item that stayed in place still needs a refresh).
//!
//! # Example
//!
//! ```
//! use sectional_diff::diff;
//!
//! let old = vec!["a".to_string(), "b".to_string(), "c".to_string()];
//! let new = vec!["b".to_string(), "a".to_string(), "c".to_string(), "d".to_string()];
//!
//! let delta = diff(&old, &new).unwrap();
//! assert_eq!(delta.inserts, vec![3]);
//! assert!(delta.deletes.is_empty());
//! assert_eq!(delta.moves.len(), 2);
//! assert_eq!(delta.apply_to(&old, &new), new);
//! ```

mod delta;
mod diff;
mod diffable;
mod error;

pub use delta::{Delta, Move};
pub use diff::diff;
pub use diffable::Diffable;
pub use error::{DiffError, DiffResult};
