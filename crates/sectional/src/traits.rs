//! Collaborator contracts: the data source and the container.
//!
//! The adapter core stays independent of any concrete widget toolkit
//! by talking to its two collaborators through these traits. The data
//! source supplies the ordered object list and constructs controllers
//! for newly-appearing keys; the container executes structural
//! mutations against the on-screen section list.

use sectional_diff::Move;

use crate::controller::SectionController;
use crate::error::ContainerError;

/// Supplies the adapter with objects and controllers.
pub trait AdapterDataSource<T>: Send + Sync {
    /// Returns the current ordered object list.
    ///
    /// Called exactly once per update transaction to take the
    /// snapshot that transaction diffs and renders.
    fn objects(&self) -> Vec<T>;

    /// Constructs the controller for a newly-appearing object.
    ///
    /// Called once per diff key, on the update in which that key
    /// first appears. The returned controller must be freshly
    /// initialized; the adapter binds it via
    /// [`SectionController::did_update`] before any other hook.
    fn controller_for(&self, object: &T) -> Box<dyn SectionController<T>>;
}

/// One transaction's structural mutations, in application order.
///
/// Indices are valid against the container's state at the start of
/// the batch: `deletes` in descending old-section order, then
/// `moves`, then `inserts` in ascending new-section order. Applying
/// in that order never invalidates a later index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchUpdate {
    /// Sections to delete, descending, in pre-batch coordinates.
    pub deletes: Vec<usize>,
    /// Sections to insert, ascending, in post-batch coordinates.
    pub inserts: Vec<usize>,
    /// Sections moving from a pre-batch to a post-batch coordinate.
    pub moves: Vec<Move>,
}

impl BatchUpdate {
    /// Returns `true` if the batch mutates nothing.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty() && self.moves.is_empty()
    }
}

/// The on-screen section container the adapter drives.
///
/// Implementations adapt a host toolkit's list widget. The adapter
/// guarantees at most one batch is in flight at a time and that
/// [`section_count`](ListContainer::section_count) is only expected
/// to match the logical section list between transactions; that
/// equality is the adapter's consistency oracle after every batch.
pub trait ListContainer: Send + Sync {
    /// Applies one transaction's structural mutations.
    ///
    /// A container that cannot apply the batch faithfully must return
    /// an error; the adapter then falls back to a full reload instead
    /// of leaving the screen inconsistent.
    fn apply_batch(&self, update: &BatchUpdate) -> Result<(), ContainerError>;

    /// Discards all rendered sections and redraws `section_count`
    /// fresh ones.
    fn reload_all(&self, section_count: usize);

    /// Redraws the content of the given sections without structural
    /// changes.
    fn reload_sections(&self, sections: &[usize]);

    /// The inclusive interval of currently visible sections, or
    /// `None` when nothing is rendered.
    fn visible_interval(&self) -> Option<(usize, usize)>;

    /// Number of sections currently rendered.
    fn section_count(&self) -> usize;

    /// Scrolls the viewport to the given section.
    fn scroll_to_section(&self, section: usize);
}
