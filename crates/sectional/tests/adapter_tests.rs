//! End-to-end adapter transactions against a fake data source and
//! container: controller lifecycle, delta application, fallback
//! paths, update coalescing, and working range notifications.

use std::sync::Arc;

use parking_lot::Mutex;

use sectional::{
    AdapterDataSource, BatchUpdate, ContainerError, Diffable, ListAdapter, ListContainer,
    SectionController, UpdateState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    key: &'static str,
    version: u32,
}

impl Item {
    fn new(key: &'static str) -> Self {
        Self { key, version: 1 }
    }

    fn versioned(key: &'static str, version: u32) -> Self {
        Self { key, version }
    }
}

impl Diffable for Item {
    type Key = &'static str;

    fn diff_key(&self) -> &'static str {
        self.key
    }

    fn content_eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Updated(&'static str, u32),
    EnteredRange(&'static str),
    ExitedRange(&'static str),
    Removed(&'static str),
}

type EventLog = Arc<Mutex<Vec<Event>>>;

struct RecordingController {
    key: &'static str,
    events: EventLog,
}

impl SectionController<Item> for RecordingController {
    fn did_update(&mut self, object: &Item) {
        self.events.lock().push(Event::Updated(self.key, object.version));
    }

    fn did_enter_working_range(&mut self) {
        self.events.lock().push(Event::EnteredRange(self.key));
    }

    fn did_exit_working_range(&mut self) {
        self.events.lock().push(Event::ExitedRange(self.key));
    }

    fn did_remove(&mut self) {
        self.events.lock().push(Event::Removed(self.key));
    }
}

struct TestSource {
    objects: Mutex<Vec<Item>>,
    created: Mutex<Vec<&'static str>>,
    events: EventLog,
}

impl TestSource {
    fn new(items: Vec<Item>, events: EventLog) -> Self {
        Self {
            objects: Mutex::new(items),
            created: Mutex::new(Vec::new()),
            events,
        }
    }

    fn set(&self, items: Vec<Item>) {
        *self.objects.lock() = items;
    }

    fn created(&self) -> Vec<&'static str> {
        self.created.lock().clone()
    }
}

impl AdapterDataSource<Item> for TestSource {
    fn objects(&self) -> Vec<Item> {
        self.objects.lock().clone()
    }

    fn controller_for(&self, object: &Item) -> Box<dyn SectionController<Item>> {
        self.created.lock().push(object.key);
        Box::new(RecordingController {
            key: object.key,
            events: self.events.clone(),
        })
    }
}

#[derive(Default)]
struct TestContainer {
    count: Mutex<usize>,
    visible: Mutex<Option<(usize, usize)>>,
    fail_next_batch: Mutex<bool>,
    misreport_count: Mutex<bool>,
    batches: Mutex<Vec<BatchUpdate>>,
    full_reloads: Mutex<usize>,
    section_reloads: Mutex<Vec<Vec<usize>>>,
    scrolled_to: Mutex<Vec<usize>>,
}

impl TestContainer {
    fn set_visible(&self, interval: Option<(usize, usize)>) {
        *self.visible.lock() = interval;
    }
}

impl ListContainer for TestContainer {
    fn apply_batch(&self, update: &BatchUpdate) -> Result<(), ContainerError> {
        if std::mem::take(&mut *self.fail_next_batch.lock()) {
            return Err(ContainerError::BatchRejected {
                reason: "forced failure".to_string(),
            });
        }
        let mut count = self.count.lock();
        *count = *count - update.deletes.len() + update.inserts.len();
        self.batches.lock().push(update.clone());
        Ok(())
    }

    fn reload_all(&self, section_count: usize) {
        *self.count.lock() = section_count;
        *self.full_reloads.lock() += 1;
    }

    fn reload_sections(&self, sections: &[usize]) {
        self.section_reloads.lock().push(sections.to_vec());
    }

    fn visible_interval(&self) -> Option<(usize, usize)> {
        *self.visible.lock()
    }

    fn section_count(&self) -> usize {
        let count = *self.count.lock();
        if *self.misreport_count.lock() {
            count + 1
        } else {
            count
        }
    }

    fn scroll_to_section(&self, section: usize) {
        self.scrolled_to.lock().push(section);
    }
}

struct Fixture {
    source: Arc<TestSource>,
    container: Arc<TestContainer>,
    adapter: Arc<ListAdapter<Item>>,
    events: EventLog,
}

impl Fixture {
    fn new(items: Vec<Item>, margin: usize) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        let source = Arc::new(TestSource::new(items, events.clone()));
        let container = Arc::new(TestContainer::default());
        let adapter = Arc::new(ListAdapter::new(
            source.clone() as Arc<dyn AdapterDataSource<Item>>,
            container.clone() as Arc<dyn ListContainer>,
            margin,
        ));
        Self {
            source,
            container,
            adapter,
            events,
        }
    }

    /// Runs one update and asserts the completion outcome.
    fn update_expecting(&self, expected: bool) {
        let outcome = Arc::new(Mutex::new(None));
        let sink = outcome.clone();
        self.adapter
            .perform_update(move |finished| *sink.lock() = Some(finished));
        assert_eq!(*outcome.lock(), Some(expected));
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    fn clear_events(&self) {
        self.events.lock().clear();
    }
}

fn items(keys: &[&'static str]) -> Vec<Item> {
    keys.iter().map(|k| Item::new(k)).collect()
}

#[test]
fn initial_update_inserts_every_section() {
    let fx = Fixture::new(items(&["a", "b", "c"]), 0);
    fx.update_expecting(true);

    assert_eq!(fx.adapter.len(), 3);
    assert_eq!(fx.container.section_count(), 3);
    assert_eq!(fx.source.created(), vec!["a", "b", "c"]);

    let batches = fx.container.batches.lock();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].inserts, vec![0, 1, 2]);
    assert!(batches[0].deletes.is_empty());
    assert!(batches[0].moves.is_empty());

    // Every fresh controller was bound before anything else.
    assert_eq!(
        fx.events(),
        vec![
            Event::Updated("a", 1),
            Event::Updated("b", 1),
            Event::Updated("c", 1),
        ]
    );
}

#[test]
fn lookups_round_trip_after_a_transaction() {
    let fx = Fixture::new(items(&["a", "b"]), 0);
    fx.update_expecting(true);

    let a = Item::new("a");
    assert_eq!(fx.adapter.section_for_object(&a), Some(0));
    assert_eq!(fx.adapter.object_at_section(1), Some(Item::new("b")));
    assert_eq!(fx.adapter.object_at_section(9), None);
    assert_eq!(fx.adapter.objects(), items(&["a", "b"]));
    assert!(!fx.adapter.is_empty());

    let controller = fx.adapter.controller_for_object(&a).unwrap();
    assert_eq!(fx.adapter.section_for_controller(controller), Some(0));
    assert_eq!(fx.adapter.section_for_object(&Item::new("zz")), None);
    assert_eq!(fx.adapter.controller_for_object(&Item::new("zz")), None);
}

#[test]
fn moves_preserve_controller_identity() {
    let fx = Fixture::new(items(&["a", "b", "c"]), 0);
    fx.update_expecting(true);
    let a_controller = fx.adapter.controller_for_object(&Item::new("a")).unwrap();

    fx.source.set(items(&["b", "a", "c", "d"]));
    fx.update_expecting(true);

    assert_eq!(fx.adapter.objects(), items(&["b", "a", "c", "d"]));
    assert_eq!(fx.source.created(), vec!["a", "b", "c", "d"]);

    // The controller followed its key to the new section.
    assert_eq!(
        fx.adapter.controller_for_object(&Item::new("a")),
        Some(a_controller)
    );
    assert_eq!(fx.adapter.section_for_controller(a_controller), Some(1));

    let batches = fx.container.batches.lock();
    assert_eq!(batches[1].moves.len(), 2);
    assert_eq!(batches[1].inserts, vec![3]);
}

#[test]
fn disappeared_keys_tear_down_their_controllers() {
    let fx = Fixture::new(items(&["a", "b", "c"]), 0);
    fx.update_expecting(true);
    let b_controller = fx.adapter.controller_for_object(&Item::new("b")).unwrap();
    fx.clear_events();

    fx.source.set(items(&["a"]));
    fx.update_expecting(true);

    assert_eq!(
        fx.events(),
        vec![Event::Removed("b"), Event::Removed("c")]
    );
    assert_eq!(fx.adapter.len(), 1);
    assert_eq!(fx.adapter.section_for_controller(b_controller), None);
    assert!(fx
        .adapter
        .with_controller(b_controller, |_| ())
        .is_none());

    let batches = fx.container.batches.lock();
    // Deletes arrive in descending order, ready to apply.
    assert_eq!(batches[1].deletes, vec![2, 1]);
}

#[test]
fn content_change_refreshes_without_structure() {
    let fx = Fixture::new(vec![Item::versioned("a", 1), Item::new("b")], 0);
    fx.update_expecting(true);
    fx.clear_events();

    fx.source.set(vec![Item::versioned("a", 2), Item::new("b")]);
    fx.update_expecting(true);

    assert_eq!(fx.events(), vec![Event::Updated("a", 2)]);
    assert_eq!(fx.source.created(), vec!["a", "b"]);
    assert_eq!(
        fx.adapter.object_at_section(0),
        Some(Item::versioned("a", 2))
    );

    let batches = fx.container.batches.lock();
    assert!(batches[1].is_empty());
    assert_eq!(*fx.container.section_reloads.lock(), vec![vec![0]]);
}

#[test]
fn duplicate_keys_abort_and_leave_the_map_unchanged() {
    let fx = Fixture::new(items(&["a"]), 0);
    fx.update_expecting(true);

    fx.source.set(items(&["b", "b"]));
    fx.update_expecting(false);

    assert_eq!(fx.adapter.objects(), items(&["a"]));
    assert_eq!(fx.adapter.len(), 1);
    assert_eq!(*fx.container.full_reloads.lock(), 0);

    // The adapter is not poisoned; a valid update still goes through.
    fx.source.set(items(&["b", "c"]));
    fx.update_expecting(true);
    assert_eq!(fx.adapter.objects(), items(&["b", "c"]));
}

#[test]
fn rejected_batch_falls_back_to_full_reload() {
    let fx = Fixture::new(items(&["a"]), 0);
    fx.update_expecting(true);

    *fx.container.fail_next_batch.lock() = true;
    fx.source.set(items(&["a", "b"]));
    fx.update_expecting(false);

    // The new snapshot wins; the container redrew fully.
    assert_eq!(*fx.container.full_reloads.lock(), 1);
    assert_eq!(fx.adapter.objects(), items(&["a", "b"]));
    assert_eq!(fx.container.section_count(), 2);
}

#[test]
fn inconsistent_section_count_falls_back_to_full_reload() {
    let fx = Fixture::new(items(&["a"]), 0);
    fx.update_expecting(true);

    *fx.container.misreport_count.lock() = true;
    fx.source.set(items(&["a", "b"]));
    fx.update_expecting(false);

    assert_eq!(*fx.container.full_reloads.lock(), 1);
    assert_eq!(fx.adapter.objects(), items(&["a", "b"]));
}

#[test]
fn concurrent_update_requests_run_strictly_in_order() {
    let fx = Fixture::new(items(&["a"]), 0);
    let order: Arc<Mutex<Vec<(&'static str, bool)>>> = Arc::new(Mutex::new(Vec::new()));

    let adapter = fx.adapter.clone();
    let source = fx.source.clone();
    let order_outer = order.clone();
    let order_inner = order.clone();

    fx.adapter.perform_update(move |finished| {
        // Still inside the first transaction's drive loop.
        assert_ne!(adapter.update_state(), UpdateState::Idle);
        order_outer.lock().push(("first", finished));

        // The first transaction completed, so this snapshot diffs
        // against its result, and the request is deferred, not
        // recursed into.
        source.set(items(&["a", "b"]));
        adapter.perform_update(move |finished| {
            order_inner.lock().push(("second", finished));
        });
    });

    assert_eq!(
        *order.lock(),
        vec![("first", true), ("second", true)]
    );
    assert_eq!(fx.adapter.update_state(), UpdateState::Idle);
    assert_eq!(fx.adapter.objects(), items(&["a", "b"]));
    // The deferred update saw "a" already present: only "b" created.
    assert_eq!(fx.source.created(), vec!["a", "b"]);
}

#[test]
fn reload_replaces_every_controller() {
    let fx = Fixture::new(items(&["a", "b"]), 0);
    fx.update_expecting(true);
    let old_a = fx.adapter.controller_for_object(&Item::new("a")).unwrap();
    fx.clear_events();

    let outcome = Arc::new(Mutex::new(None));
    let sink = outcome.clone();
    fx.adapter.reload(move |finished| *sink.lock() = Some(finished));
    assert_eq!(*outcome.lock(), Some(true));

    // All deleted, then all inserted: teardown precedes rebinding
    // even though the keys never changed.
    assert_eq!(
        fx.events(),
        vec![
            Event::Removed("a"),
            Event::Removed("b"),
            Event::Updated("a", 1),
            Event::Updated("b", 1),
        ]
    );
    assert_eq!(*fx.container.full_reloads.lock(), 1);
    assert_eq!(fx.source.created(), vec!["a", "b", "a", "b"]);
    assert_ne!(
        fx.adapter.controller_for_object(&Item::new("a")),
        Some(old_a)
    );
}

#[test]
fn reload_supersedes_queued_updates() {
    let fx = Fixture::new(items(&["a"]), 0);
    let order: Arc<Mutex<Vec<(&'static str, bool)>>> = Arc::new(Mutex::new(Vec::new()));

    let adapter = fx.adapter.clone();
    let order_outer = order.clone();
    let order_update = order.clone();
    let order_reload = order.clone();

    fx.adapter.perform_update(move |finished| {
        order_outer.lock().push(("first", finished));
        adapter.perform_update(move |finished| {
            order_update.lock().push(("superseded", finished));
        });
        adapter.reload(move |finished| {
            order_reload.lock().push(("reload", finished));
        });
    });

    assert_eq!(
        *order.lock(),
        vec![("first", true), ("superseded", false), ("reload", true)]
    );
}

#[test]
fn working_range_margin_widens_the_viewport() {
    let keys: Vec<&'static str> = vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
    let fx = Fixture::new(items(&keys), 2);
    fx.container.set_visible(Some((4, 6)));
    fx.update_expecting(true);

    let entered: Vec<&'static str> = fx
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::EnteredRange(k) => Some(*k),
            _ => None,
        })
        .collect();
    assert_eq!(entered, vec!["2", "3", "4", "5", "6", "7", "8"]);

    // Shift the viewport by one: exactly one enter and one exit.
    fx.clear_events();
    fx.container.set_visible(Some((5, 7)));
    fx.adapter.visible_range_did_change();
    assert_eq!(
        fx.events(),
        vec![Event::EnteredRange("9"), Event::ExitedRange("2")]
    );
}

#[test]
fn empty_viewport_exits_the_whole_range() {
    let fx = Fixture::new(items(&["a", "b", "c"]), 1);
    fx.container.set_visible(Some((0, 2)));
    fx.update_expecting(true);
    fx.clear_events();

    fx.container.set_visible(None);
    fx.adapter.visible_range_did_change();

    let mut exited: Vec<&'static str> = fx
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::ExitedRange(k) => Some(*k),
            _ => None,
        })
        .collect();
    exited.sort_unstable();
    assert_eq!(exited, vec!["a", "b", "c"]);
}

#[test]
fn visible_queries_follow_the_container_interval() {
    let fx = Fixture::new(items(&["a", "b", "c", "d"]), 0);
    fx.update_expecting(true);

    fx.container.set_visible(Some((1, 2)));
    assert_eq!(fx.adapter.visible_objects(), items(&["b", "c"]));
    let visible = fx.adapter.visible_controllers();
    assert_eq!(visible.len(), 2);
    assert_eq!(fx.adapter.section_for_controller(visible[0]), Some(1));

    fx.container.set_visible(None);
    assert!(fx.adapter.visible_objects().is_empty());
    assert!(fx.adapter.visible_controllers().is_empty());
}

#[test]
fn scroll_to_object_targets_the_right_section() {
    let fx = Fixture::new(items(&["a", "b", "c"]), 0);
    fx.update_expecting(true);

    fx.adapter.scroll_to_object(&Item::new("b"));
    fx.adapter.scroll_to_object(&Item::new("missing"));
    assert_eq!(*fx.container.scrolled_to.lock(), vec![1]);
}

#[test]
fn reload_objects_refreshes_matched_keys_only() {
    let fx = Fixture::new(items(&["a", "b"]), 0);
    fx.update_expecting(true);
    fx.clear_events();

    fx.adapter
        .reload_objects(&[Item::versioned("a", 2), Item::versioned("zz", 9)]);

    assert_eq!(fx.events(), vec![Event::Updated("a", 2)]);
    assert_eq!(*fx.container.section_reloads.lock(), vec![vec![0]]);
    assert_eq!(
        fx.adapter.object_at_section(0),
        Some(Item::versioned("a", 2))
    );
    // No structural transaction happened.
    assert_eq!(fx.container.batches.lock().len(), 1);
    assert_eq!(fx.adapter.len(), 2);
}

#[test]
fn controllers_are_reachable_through_their_ids() {
    let fx = Fixture::new(items(&["a", "b"]), 0);
    fx.update_expecting(true);

    let id = fx.adapter.controller_for_object(&Item::new("b")).unwrap();
    let rows = fx.adapter.with_controller(id, |c| c.number_of_rows());
    assert_eq!(rows, Some(1));

    let touched = fx
        .adapter
        .with_controller_mut(id, |c| c.did_update(&Item::versioned("b", 3)));
    assert!(touched.is_some());
    assert!(fx.events().contains(&Event::Updated("b", 3)));
}
