//! Sectional: a keyed list/feed adapter.
//!
//! Sectional maps an ordered collection of data objects onto a
//! scrollable container of rendered sections. Each object owns one
//! [`SectionController`] for as long as its diff key stays in the
//! list; when the data changes, the adapter computes a keyed
//! structural delta (via [`sectional_diff`]) and applies it to the
//! container transactionally, so the screen never passes through an
//! inconsistent intermediate state.
//!
//! # Core types
//!
//! - [`ListAdapter`]: the facade owning the object/controller mapping
//!   and the update machinery
//! - [`AdapterDataSource`]: supplies objects and constructs
//!   controllers for newly-appearing keys
//! - [`ListContainer`]: the on-screen section container being driven
//! - [`SectionController`]: the per-object rendering delegate
//! - [`SectionMap`]: one transaction's object/controller snapshot
//!   with O(1) lookups in every direction
//! - [`WorkingRangeHandler`]: proximity notifications around the
//!   visible viewport
//!
//! # Data flow
//!
//! ```text
//! ┌─────────────┐  objects()   ┌──────────────┐  delta   ┌────────────┐
//! │ Data Source │─────────────>│ List Adapter │─────────>│ Container  │
//! │             │<─────────────│  (diff +     │          │ (sections) │
//! │             │ controller_  │   apply)     │  visible │            │
//! └─────────────┘   for()      └──────────────┘<─────────└────────────┘
//!                                     │
//!                              working range +
//!                              controller hooks
//! ```
//!
//! The adapter snapshots the data source, diffs against the previous
//! snapshot, tears down and creates controllers as keys disappear and
//! appear, hands the container one batch of structural mutations, and
//! atomically installs the new section map. The working range tracker
//! then notifies controllers entering or leaving the margin window
//! around the viewport.

mod adapter;
mod controller;
mod coordinator;
mod error;
pub mod logging;
mod section_map;
mod traits;
mod working_range;

pub use adapter::ListAdapter;
pub use controller::{ControllerId, SectionController};
pub use coordinator::UpdateState;
pub use error::{AdapterError, AdapterResult, ContainerError};
pub use section_map::SectionMap;
pub use traits::{AdapterDataSource, BatchUpdate, ListContainer};
pub use working_range::{RangeTransition, WorkingRangeHandler};

pub use sectional_diff::{diff, Delta, DiffError, DiffResult, Diffable, Move};
