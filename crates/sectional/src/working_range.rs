//! Working range tracking: proximity notifications around the
//! visible viewport.

use std::collections::HashSet;

use sectional_diff::Diffable;

use crate::controller::ControllerId;
use crate::logging::targets;
use crate::section_map::SectionMap;

/// The controllers crossing the range boundary in one recomputation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RangeTransition {
    /// Controllers newly inside the working range, in section order.
    pub entering: Vec<ControllerId>,
    /// Controllers newly outside the working range.
    pub exiting: Vec<ControllerId>,
}

impl RangeTransition {
    /// Returns `true` if no controller crossed the boundary.
    pub fn is_empty(&self) -> bool {
        self.entering.is_empty() && self.exiting.is_empty()
    }
}

/// Tracks which controllers sit inside the working range: the visible
/// section interval widened by a configured margin on both sides,
/// clamped to valid sections.
///
/// Membership is tracked by [`ControllerId`], not by section index,
/// so a controller that moves while staying inside the range receives
/// no spurious notifications. A zero margin narrows the range to the
/// visible interval itself.
pub struct WorkingRangeHandler {
    margin: usize,
    inside: HashSet<ControllerId>,
}

impl WorkingRangeHandler {
    /// Creates a handler with the given margin.
    pub fn new(margin: usize) -> Self {
        Self {
            margin,
            inside: HashSet::new(),
        }
    }

    /// The configured margin.
    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Recomputes the range against the current visible interval and
    /// section map, and returns the boundary crossings. Controllers
    /// already inside that remain inside are untouched.
    ///
    /// An empty visible interval empties the range: everything
    /// currently tracked exits.
    pub fn recompute<T: Diffable>(
        &mut self,
        visible: Option<(usize, usize)>,
        map: &SectionMap<T>,
    ) -> RangeTransition {
        let mut target = HashSet::new();
        let mut entering = Vec::new();

        if let Some((lo, hi)) = visible {
            if !map.is_empty() {
                let last = map.len() - 1;
                let range_lo = lo.saturating_sub(self.margin);
                let range_hi = hi.saturating_add(self.margin).min(last);
                for section in range_lo..=range_hi {
                    if let Some(controller) = map.controller_at(section) {
                        target.insert(controller);
                        if !self.inside.contains(&controller) {
                            entering.push(controller);
                        }
                    }
                }
                tracing::trace!(
                    target: targets::WORKING_RANGE,
                    visible_lo = lo,
                    visible_hi = hi,
                    range_lo,
                    range_hi,
                    "recomputed working range"
                );
            }
        }

        let exiting: Vec<ControllerId> = self
            .inside
            .iter()
            .copied()
            .filter(|controller| !target.contains(controller))
            .collect();

        self.inside = target;
        RangeTransition { entering, exiting }
    }

    /// Forgets a controller that is being torn down. No exit
    /// notification is owed; teardown supersedes it.
    pub fn remove(&mut self, controller: ControllerId) {
        self.inside.remove(&controller);
    }

    /// Forgets every tracked controller.
    pub fn clear(&mut self) {
        self.inside.clear();
    }

    /// Returns `true` if the controller is currently inside the range.
    pub fn contains(&self, controller: ControllerId) -> bool {
        self.inside.contains(&controller)
    }
}
