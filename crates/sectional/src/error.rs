//! Error types for the adapter crate.

use std::fmt::Debug;

use thiserror::Error;

use sectional_diff::DiffError;

/// Errors a [`ListContainer`](crate::ListContainer) can report when
/// asked to apply a batch mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// The container rejected the batch, e.g. because its own state
    /// disagreed with the implied section counts.
    #[error("container rejected batch update: {reason}")]
    BatchRejected {
        /// Container-supplied explanation.
        reason: String,
    },
}

/// Errors that abort an update transaction.
///
/// None of these poison the adapter: the in-flight transaction is
/// abandoned (or downgraded to a full reload) and subsequent updates
/// proceed normally. Lookup misses are *not* errors; they are
/// `Option::None` returns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError<K: Debug> {
    /// The data source supplied colliding diff keys. The transaction
    /// is dropped and the section map left unchanged.
    #[error(transparent)]
    Diff(#[from] DiffError<K>),

    /// The container refused the computed batch. The adapter falls
    /// back to a full reload.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// The container's post-mutation section count disagrees with the
    /// installed section map. The adapter falls back to a full reload
    /// rather than leaving a corrupted mapping on screen.
    #[error("container reports {actual} sections, expected {expected}")]
    Inconsistent {
        /// Section count the map requires.
        expected: usize,
        /// Section count the container reported.
        actual: usize,
    },
}

/// Result type for adapter transactions.
pub type AdapterResult<T, K> = std::result::Result<T, AdapterError<K>>;
