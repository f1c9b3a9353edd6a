//! Error types for the diff engine.

use std::fmt::Debug;

use thiserror::Error;

/// Errors produced while computing a delta.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError<K: Debug> {
    /// The same identity key appeared more than once within a single
    /// input sequence. Keyed diffing has no meaningful answer for
    /// colliding identities, so the computation is aborted rather
    /// than silently picking one occurrence.
    #[error("duplicate diff key {key:?} within one sequence")]
    DuplicateKey {
        /// The colliding key.
        key: K,
    },
}

/// Result type for diff operations.
pub type DiffResult<T, K> = std::result::Result<T, DiffError<K>>;
