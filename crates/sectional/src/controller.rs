//! Section controllers: the per-object rendering delegates.

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to a section controller.
    ///
    /// A controller keeps its id for as long as its object's diff key
    /// stays in the list, across moves and content updates. Ids are
    /// copyable and remain safe to hold after the controller is torn
    /// down; lookups through a stale id simply return `None`.
    pub struct ControllerId;
}

/// The capability set of a section controller.
///
/// Each data object in the list owns exactly one controller, created
/// lazily by the data source when the object's key first appears and
/// torn down when the key disappears. The adapter drives the
/// lifecycle; implementations only react:
///
/// - [`did_update`](SectionController::did_update) fires once when
///   the controller is first bound to its object and again whenever
///   the object's content changes under the same key.
/// - The working range hooks fire as the section crosses the margin
///   window around the visible viewport.
/// - [`did_remove`](SectionController::did_remove) is the teardown
///   hook, invoked before the controller is dropped.
///
/// Controllers never hold a reference back to their adapter; code
/// that needs adapter services addresses it through the
/// [`ControllerId`] handed out at creation.
pub trait SectionController<T>: Send {
    /// The controller was bound to `object`, either on creation or
    /// because the object's content changed.
    fn did_update(&mut self, object: &T);

    /// Number of rows this controller renders for its section.
    fn number_of_rows(&self) -> usize {
        1
    }

    /// The section entered the working range.
    fn did_enter_working_range(&mut self) {}

    /// The section left the working range.
    fn did_exit_working_range(&mut self) {}

    /// The object's key left the list; the controller is dropped
    /// after this returns.
    fn did_remove(&mut self) {}
}
