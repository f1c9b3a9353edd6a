//! The section map: one transaction's object/controller snapshot.

use std::collections::HashMap;

use slotmap::SecondaryMap;

use sectional_diff::Diffable;

use crate::controller::ControllerId;

/// An ordered snapshot of `(object, controller)` pairs with O(1)
/// reverse lookups in every direction: key → section, controller →
/// section, section → object, section → controller.
///
/// Section indices are contiguous and zero-based, and match the live
/// container's section count whenever no transaction is mid-flight.
/// A map is built once per completed transaction and then never
/// mutated structurally; the adapter replaces it atomically. The only
/// in-place operation is [`replace_object`](SectionMap::replace_object),
/// a content-level refresh that leaves every index untouched.
pub struct SectionMap<T: Diffable> {
    entries: Vec<(T, ControllerId)>,
    key_to_section: HashMap<T::Key, usize>,
    controller_to_section: SecondaryMap<ControllerId, usize>,
}

impl<T: Diffable> SectionMap<T> {
    /// Creates a map with no sections.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            key_to_section: HashMap::new(),
            controller_to_section: SecondaryMap::new(),
        }
    }

    /// Builds a map from an ordered object snapshot, resolving each
    /// object to its controller. O(n).
    ///
    /// Keys must be unique; the adapter validates that through the
    /// diff engine before any map is built.
    pub fn build(objects: Vec<T>, mut resolve: impl FnMut(&T) -> ControllerId) -> Self {
        let mut key_to_section = HashMap::with_capacity(objects.len());
        let mut controller_to_section = SecondaryMap::new();
        let mut entries = Vec::with_capacity(objects.len());

        for (section, object) in objects.into_iter().enumerate() {
            let controller = resolve(&object);
            let previous = key_to_section.insert(object.diff_key(), section);
            debug_assert!(previous.is_none(), "duplicate key reached SectionMap::build");
            controller_to_section.insert(controller, section);
            entries.push((object, controller));
        }

        Self {
            entries,
            key_to_section,
            controller_to_section,
        }
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no sections.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Section index for a diff key.
    pub fn section_for_key(&self, key: &T::Key) -> Option<usize> {
        self.key_to_section.get(key).copied()
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.key_to_section.contains_key(key)
    }

    /// Section index for a controller.
    pub fn section_for_controller(&self, controller: ControllerId) -> Option<usize> {
        self.controller_to_section.get(controller).copied()
    }

    /// The object rendered at a section.
    pub fn object_at(&self, section: usize) -> Option<&T> {
        self.entries.get(section).map(|(object, _)| object)
    }

    /// The controller owning a section.
    pub fn controller_at(&self, section: usize) -> Option<ControllerId> {
        self.entries.get(section).map(|&(_, controller)| controller)
    }

    /// Controller ids in section order. Defensive copy.
    pub fn controller_ids(&self) -> Vec<ControllerId> {
        self.entries.iter().map(|&(_, controller)| controller).collect()
    }

    /// Replaces the stored object for its key, leaving the section
    /// structure untouched. Returns the section index, or `None` if
    /// the key is not present.
    pub fn replace_object(&mut self, object: T) -> Option<usize> {
        let section = self.section_for_key(&object.diff_key())?;
        self.entries[section].0 = object;
        Some(section)
    }
}

impl<T: Diffable + Clone> SectionMap<T> {
    /// Objects in section order. Defensive copy.
    pub fn objects(&self) -> Vec<T> {
        self.entries.iter().map(|(object, _)| object.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn build_map(keys: &[&str]) -> (SectionMap<String>, Vec<ControllerId>) {
        let mut slots: SlotMap<ControllerId, ()> = SlotMap::with_key();
        let ids: Vec<ControllerId> = keys.iter().map(|_| slots.insert(())).collect();
        let mut next = ids.clone().into_iter();
        let map = SectionMap::build(
            keys.iter().map(|k| (*k).to_string()).collect(),
            |_| next.next().unwrap(),
        );
        (map, ids)
    }

    #[test]
    fn test_empty_map() {
        let map: SectionMap<String> = SectionMap::empty();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.object_at(0), None);
        assert_eq!(map.controller_at(0), None);
    }

    #[test]
    fn test_lookups_in_all_directions() {
        let (map, ids) = build_map(&["a", "b", "c"]);

        assert_eq!(map.len(), 3);
        assert_eq!(map.section_for_key(&"b".to_string()), Some(1));
        assert_eq!(map.section_for_key(&"z".to_string()), None);
        assert_eq!(map.section_for_controller(ids[2]), Some(2));
        assert_eq!(map.object_at(0), Some(&"a".to_string()));
        assert_eq!(map.controller_at(1), Some(ids[1]));
        assert!(map.contains_key(&"c".to_string()));
    }

    #[test]
    fn test_snapshot_accessors_are_copies() {
        let (map, ids) = build_map(&["a", "b"]);

        let mut objects = map.objects();
        objects.push("c".to_string());
        assert_eq!(map.len(), 2);

        let controllers = map.controller_ids();
        assert_eq!(controllers, ids);
    }

    #[test]
    fn test_replace_object_keeps_structure() {
        // String identity and content coincide, so replace with the
        // same key to model a content-level refresh.
        let (mut map, ids) = build_map(&["a", "b"]);
        assert_eq!(map.replace_object("b".to_string()), Some(1));
        assert_eq!(map.replace_object("nope".to_string()), None);
        assert_eq!(map.controller_at(1), Some(ids[1]));
        assert_eq!(map.len(), 2);
    }
}
