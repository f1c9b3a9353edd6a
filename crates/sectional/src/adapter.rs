//! The list adapter facade.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use slotmap::SlotMap;

use sectional_diff::{diff, Diffable};

use crate::controller::{ControllerId, SectionController};
use crate::coordinator::{Completion, UpdateQueue, UpdateRequest, UpdateState};
use crate::error::AdapterError;
use crate::logging::targets;
use crate::section_map::SectionMap;
use crate::traits::{AdapterDataSource, BatchUpdate, ListContainer};
use crate::working_range::WorkingRangeHandler;

type SharedController<T> = Arc<Mutex<Box<dyn SectionController<T>>>>;

/// Mutable adapter state guarded by one lock. Replaced wholesale at
/// transaction boundaries (the map) or keyed by identity (the
/// controllers), never partially exposed.
struct AdapterState<T: Diffable> {
    map: SectionMap<T>,
    controllers: SlotMap<ControllerId, SharedController<T>>,
    by_key: HashMap<T::Key, ControllerId>,
    working_range: WorkingRangeHandler,
}

/// Maps an ordered object list onto a container of rendered sections,
/// one section controller per object.
///
/// The adapter owns the object/controller mapping and the update
/// machinery; the data source and container are held behind trait
/// objects as external collaborators whose lifetime policy belongs to
/// the caller.
///
/// All operations are meant for one logical control thread (the UI
/// thread). The adapter is `Send + Sync` and internally consistent
/// regardless, but it never parallelizes: a transaction runs to
/// completion on the calling thread, and requests issued from inside
/// completion callbacks are queued, not interleaved.
///
/// # Example
///
/// ```ignore
/// let adapter = ListAdapter::new(source, container, 2);
/// adapter.perform_update(|finished| {
///     assert!(finished);
/// });
/// ```
pub struct ListAdapter<T: Diffable> {
    data_source: Arc<dyn AdapterDataSource<T>>,
    container: Arc<dyn ListContainer>,
    state: RwLock<AdapterState<T>>,
    queue: Mutex<UpdateQueue>,
}

impl<T> ListAdapter<T>
where
    T: Diffable + Clone + Send + Sync + 'static,
{
    /// Creates an adapter over a data source and container.
    ///
    /// `working_range_margin` is the number of sections beyond the
    /// visible interval, on each side, whose controllers receive
    /// working range notifications. Zero narrows the range to the
    /// visible interval itself.
    pub fn new(
        data_source: Arc<dyn AdapterDataSource<T>>,
        container: Arc<dyn ListContainer>,
        working_range_margin: usize,
    ) -> Self {
        Self {
            data_source,
            container,
            state: RwLock::new(AdapterState {
                map: SectionMap::empty(),
                controllers: SlotMap::with_key(),
                by_key: HashMap::new(),
                working_range: WorkingRangeHandler::new(working_range_margin),
            }),
            queue: Mutex::new(UpdateQueue::new()),
        }
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    /// Performs an incremental update from the previous object list
    /// to the data source's current one.
    ///
    /// The transaction snapshots the data source, diffs against the
    /// section map of the last completed transaction, tears down
    /// controllers for disappeared keys, creates controllers for new
    /// ones, applies the structural delta to the container, and
    /// installs the new map atomically.
    ///
    /// `completion` fires exactly once: `true` on success, `false`
    /// when the update was aborted (duplicate keys), downgraded to a
    /// full reload (container failure), or dropped because a reload
    /// superseded it while it was still queued.
    ///
    /// A call arriving while another transaction is in flight is
    /// queued and runs strictly after it, diffing against the map as
    /// the earlier transaction left it.
    pub fn perform_update(&self, completion: impl FnOnce(bool) + Send + 'static) {
        let completion: Completion = Box::new(completion);
        {
            let mut queue = self.queue.lock();
            if !queue.try_begin() {
                tracing::debug!(
                    target: targets::UPDATER,
                    "update deferred behind in-flight transaction"
                );
                queue.enqueue_update(completion);
                return;
            }
        }
        self.drive(UpdateRequest::Update(completion));
    }

    /// Discards the current object list and rebuilds everything from
    /// a fresh data source snapshot.
    ///
    /// Every section controller is torn down and replaced and the
    /// container redraws fully; no structural diffing takes place, so
    /// the result is equivalent to deleting every old section and
    /// inserting every new one regardless of content equality.
    ///
    /// Updates still waiting in the queue are dropped; their
    /// completions fire with `false`.
    pub fn reload(&self, completion: impl FnOnce(bool) + Send + 'static) {
        let completion: Completion = Box::new(completion);
        let mut queue = self.queue.lock();
        if queue.try_begin() {
            drop(queue);
            self.drive(UpdateRequest::Reload(completion));
        } else {
            let dropped = queue.enqueue_reload(completion);
            drop(queue);
            tracing::debug!(
                target: targets::UPDATER,
                dropped = dropped.len(),
                "reload deferred; superseded queued updates"
            );
            for completion in dropped {
                completion(false);
            }
        }
    }

    /// Refreshes the rendered content of the given objects, matched
    /// by diff key, without any structural diffing.
    ///
    /// For each matched key the stored object is replaced, its
    /// controller receives [`SectionController::did_update`], and the
    /// container is told to redraw that section's content. Keys not
    /// currently in the list are ignored.
    pub fn reload_objects(&self, objects: &[T]) {
        let mut sections = Vec::new();
        let mut refresh: Vec<(SharedController<T>, T)> = Vec::new();
        {
            let mut state = self.state.write();
            for object in objects {
                let Some(section) = state.map.replace_object(object.clone()) else {
                    continue;
                };
                sections.push(section);
                if let Some(id) = state.map.controller_at(section) {
                    if let Some(controller) = state.controllers.get(id) {
                        refresh.push((controller.clone(), object.clone()));
                    }
                }
            }
        }
        if sections.is_empty() {
            return;
        }
        tracing::debug!(
            target: targets::ADAPTER,
            sections = ?sections,
            "content-only reload"
        );
        for (controller, object) in refresh {
            controller.lock().did_update(&object);
        }
        self.container.reload_sections(&sections);
    }

    /// Re-runs the working range tracker against the container's
    /// current visible interval.
    ///
    /// The host calls this whenever the viewport scrolls; the adapter
    /// also calls it itself after every completed transaction.
    pub fn visible_range_did_change(&self) {
        self.refresh_working_range();
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Section index for an object, matched by diff key. O(1).
    pub fn section_for_object(&self, object: &T) -> Option<usize> {
        self.state.read().map.section_for_key(&object.diff_key())
    }

    /// The object rendered at a section. O(1).
    pub fn object_at_section(&self, section: usize) -> Option<T> {
        self.state.read().map.object_at(section).cloned()
    }

    /// Section index for a controller. O(1).
    pub fn section_for_controller(&self, controller: ControllerId) -> Option<usize> {
        self.state.read().map.section_for_controller(controller)
    }

    /// The controller owning an object, matched by diff key. O(1).
    pub fn controller_for_object(&self, object: &T) -> Option<ControllerId> {
        self.state.read().by_key.get(&object.diff_key()).copied()
    }

    /// A copy of the objects currently powering the adapter.
    pub fn objects(&self) -> Vec<T> {
        self.state.read().map.objects()
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.state.read().map.len()
    }

    /// Returns `true` if the adapter renders no sections.
    pub fn is_empty(&self) -> bool {
        self.state.read().map.is_empty()
    }

    /// Controllers of the currently visible sections, in section
    /// order.
    pub fn visible_controllers(&self) -> Vec<ControllerId> {
        let Some((lo, hi)) = self.container.visible_interval() else {
            return Vec::new();
        };
        let state = self.state.read();
        (lo..=hi)
            .filter_map(|section| state.map.controller_at(section))
            .collect()
    }

    /// Objects of the currently visible sections, in section order.
    pub fn visible_objects(&self) -> Vec<T> {
        let Some((lo, hi)) = self.container.visible_interval() else {
            return Vec::new();
        };
        let state = self.state.read();
        (lo..=hi)
            .filter_map(|section| state.map.object_at(section).cloned())
            .collect()
    }

    /// Scrolls the container to an object's section. No-op when the
    /// object is not in the list.
    pub fn scroll_to_object(&self, object: &T) {
        if let Some(section) = self.section_for_object(object) {
            self.container.scroll_to_section(section);
        }
    }

    /// The working range margin this adapter was created with.
    pub fn working_range_margin(&self) -> usize {
        self.state.read().working_range.margin()
    }

    /// Phase of the transaction currently in flight.
    pub fn update_state(&self) -> UpdateState {
        self.queue.lock().state()
    }

    /// Runs `f` against a controller, or returns `None` if the id is
    /// stale.
    pub fn with_controller<R>(
        &self,
        id: ControllerId,
        f: impl FnOnce(&dyn SectionController<T>) -> R,
    ) -> Option<R> {
        let controller = self.state.read().controllers.get(id).cloned()?;
        let guard = controller.lock();
        Some(f(guard.as_ref()))
    }

    /// Runs `f` against a controller mutably, or returns `None` if
    /// the id is stale.
    pub fn with_controller_mut<R>(
        &self,
        id: ControllerId,
        f: impl FnOnce(&mut dyn SectionController<T>) -> R,
    ) -> Option<R> {
        let controller = self.state.read().controllers.get(id).cloned()?;
        let mut guard = controller.lock();
        Some(f(guard.as_mut()))
    }

    // -------------------------------------------------------------------------
    // Transaction machinery
    // -------------------------------------------------------------------------

    /// Drains the request queue as the single driver. Completions run
    /// while the queue is still marked busy, so requests they issue
    /// are deferred rather than recursed into.
    fn drive(&self, first: UpdateRequest) {
        let mut request = first;
        loop {
            match request {
                UpdateRequest::Update(completion) => {
                    let finished = self.execute_update();
                    completion(finished);
                }
                UpdateRequest::Reload(completion) => {
                    let finished = self.execute_reload();
                    completion(finished);
                }
            }
            match self.queue.lock().take_next() {
                Some(next) => request = next,
                None => break,
            }
        }
    }

    fn set_state(&self, state: UpdateState) {
        self.queue.lock().set_state(state);
    }

    /// One incremental update transaction. Returns `true` when the
    /// delta applied cleanly.
    fn execute_update(&self) -> bool {
        let old_objects = self.state.read().map.objects();
        let new_objects = self.data_source.objects();

        let delta = match diff(&old_objects, &new_objects) {
            Ok(delta) => delta,
            Err(err) => {
                let err = AdapterError::from(err);
                tracing::warn!(
                    target: targets::UPDATER,
                    %err,
                    "update aborted; section map unchanged"
                );
                return false;
            }
        };

        if delta.is_empty() {
            tracing::trace!(target: targets::UPDATER, "no changes; update is a no-op");
            self.refresh_working_range();
            return true;
        }

        tracing::debug!(
            target: targets::UPDATER,
            deletes = delta.deletes.len(),
            inserts = delta.inserts.len(),
            moves = delta.moves.len(),
            updates = delta.updates.len(),
            "performing update"
        );
        self.set_state(UpdateState::Applying);

        // Tear down controllers whose keys disappeared, before
        // anything else observes the transition.
        let mut removed: Vec<SharedController<T>> = Vec::new();
        {
            let mut state = self.state.write();
            for &old_section in &delta.deletes {
                let key = old_objects[old_section].diff_key();
                if let Some(id) = state.by_key.remove(&key) {
                    state.working_range.remove(id);
                    if let Some(controller) = state.controllers.remove(id) {
                        removed.push(controller);
                    }
                }
            }
        }
        for controller in removed {
            controller.lock().did_remove();
        }

        // Resolve controllers for newly-appearing keys. The data
        // source runs with no adapter lock held.
        let created: Vec<(usize, Box<dyn SectionController<T>>)> = delta
            .inserts
            .iter()
            .map(|&section| {
                (
                    section,
                    self.data_source.controller_for(&new_objects[section]),
                )
            })
            .collect();

        let mut fresh: Vec<(usize, SharedController<T>)> = Vec::new();
        let new_map;
        {
            let mut state = self.state.write();
            for (section, controller) in created {
                let shared: SharedController<T> = Arc::new(Mutex::new(controller));
                let id = state.controllers.insert(shared.clone());
                state.by_key.insert(new_objects[section].diff_key(), id);
                fresh.push((section, shared));
            }
            new_map = SectionMap::build(new_objects.clone(), |object| {
                *state
                    .by_key
                    .get(&object.diff_key())
                    .expect("every surviving or inserted key has a controller")
            });
        }

        // Bind new controllers to their objects before the container
        // renders them.
        for (section, controller) in &fresh {
            controller.lock().did_update(&new_objects[*section]);
        }

        let mut deletes_descending = delta.deletes.clone();
        deletes_descending.sort_unstable_by(|a, b| b.cmp(a));
        let batch = BatchUpdate {
            deletes: deletes_descending,
            inserts: delta.inserts.clone(),
            moves: delta.moves.clone(),
        };
        let applied = self.container.apply_batch(&batch);

        // The new snapshot wins from here on, even on the fallback
        // path: the map installs and the container either applied the
        // batch or redraws fully.
        self.state.write().map = new_map;
        let expected = new_objects.len();

        if let Err(err) = applied {
            let err = AdapterError::<T::Key>::from(err);
            tracing::warn!(
                target: targets::UPDATER,
                %err,
                "container rejected batch; falling back to full reload"
            );
            self.container.reload_all(expected);
            self.refresh_working_range();
            return false;
        }

        let actual = self.container.section_count();
        if actual != expected {
            let err = AdapterError::<T::Key>::Inconsistent { expected, actual };
            tracing::warn!(
                target: targets::UPDATER,
                %err,
                "falling back to full reload"
            );
            self.container.reload_all(expected);
            self.refresh_working_range();
            return false;
        }

        // Content-level refresh for surviving keys whose equality
        // failed.
        if !delta.updates.is_empty() {
            let mut sections = Vec::new();
            let mut refresh: Vec<(SharedController<T>, usize)> = Vec::new();
            {
                let state = self.state.read();
                for (section, object) in new_objects.iter().enumerate() {
                    if !delta.updates.contains(&object.diff_key()) {
                        continue;
                    }
                    sections.push(section);
                    if let Some(id) = state.map.controller_at(section) {
                        if let Some(controller) = state.controllers.get(id) {
                            refresh.push((controller.clone(), section));
                        }
                    }
                }
            }
            for (controller, section) in refresh {
                controller.lock().did_update(&new_objects[section]);
            }
            self.container.reload_sections(&sections);
        }

        self.refresh_working_range();
        true
    }

    /// One full-reload transaction. Returns `true` unless the fresh
    /// snapshot itself is invalid.
    fn execute_reload(&self) -> bool {
        let new_objects = self.data_source.objects();

        // An all-insert diff against the empty list validates the
        // snapshot's keys; reload semantics are exactly that delta.
        if let Err(err) = diff(&[], &new_objects) {
            let err = AdapterError::from(err);
            tracing::warn!(
                target: targets::UPDATER,
                %err,
                "reload aborted; section map unchanged"
            );
            return false;
        }

        tracing::debug!(
            target: targets::UPDATER,
            sections = new_objects.len(),
            "reloading all data"
        );
        self.set_state(UpdateState::Applying);

        let removed: Vec<SharedController<T>> = {
            let mut state = self.state.write();
            state.by_key.clear();
            state.working_range.clear();
            state.controllers.drain().map(|(_, c)| c).collect()
        };
        for controller in removed {
            controller.lock().did_remove();
        }

        let created: Vec<Box<dyn SectionController<T>>> = new_objects
            .iter()
            .map(|object| self.data_source.controller_for(object))
            .collect();

        let fresh: Vec<SharedController<T>>;
        {
            let mut state = self.state.write();
            fresh = created
                .into_iter()
                .zip(new_objects.iter())
                .map(|(controller, object)| {
                    let shared: SharedController<T> = Arc::new(Mutex::new(controller));
                    let id = state.controllers.insert(shared.clone());
                    state.by_key.insert(object.diff_key(), id);
                    shared
                })
                .collect();
            let new_map = SectionMap::build(new_objects.clone(), |object| {
                *state
                    .by_key
                    .get(&object.diff_key())
                    .expect("every key has a fresh controller")
            });
            state.map = new_map;
        }

        for (controller, object) in fresh.iter().zip(new_objects.iter()) {
            controller.lock().did_update(object);
        }
        self.container.reload_all(new_objects.len());
        self.refresh_working_range();
        true
    }

    /// Recomputes the working range and fires boundary crossings.
    fn refresh_working_range(&self) {
        let visible = self.container.visible_interval();
        let (entering, exiting): (Vec<SharedController<T>>, Vec<SharedController<T>>) = {
            let mut state = self.state.write();
            let AdapterState {
                map,
                controllers,
                working_range,
                ..
            } = &mut *state;
            let transition = working_range.recompute(visible, map);
            let entering = transition
                .entering
                .iter()
                .filter_map(|&id| controllers.get(id).cloned())
                .collect();
            let exiting = transition
                .exiting
                .iter()
                .filter_map(|&id| controllers.get(id).cloned())
                .collect();
            (entering, exiting)
        };
        for controller in entering {
            controller.lock().did_enter_working_range();
        }
        for controller in exiting {
            controller.lock().did_exit_working_range();
        }
    }
}
