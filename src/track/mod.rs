//! Longitudinal size tracking
//!
//! A [`Tracker`] watches a set of named roots and records how much memory
//! they reach over time.  Every [`Tracker::record`] call runs the sizer
//! once and appends a timestamped [`TrackSnapshot`]; history is bounded by
//! an estimated-memory budget, and a record that would exceed the budget is
//! refused rather than silently dropping older history.
//!
//! Roots are non-owning handles: a root released from the heap stays in the
//! watch list and simply reports zero from then on.

use std::time::{Duration, Instant};

use crate::engine::errors::SizeError;
use crate::engine::sizer::{Sizer, SizerStats};
use crate::runtime::heap::{ObjRef, ObjectHeap};

/// One named root under observation.
#[derive(Debug, Clone)]
pub struct TrackedRoot {
    pub name: String,
    pub root: ObjRef,
}

/// Result of one recording pass.
#[derive(Debug, Clone)]
pub struct TrackSnapshot {
    /// Time since the tracker was created.
    pub elapsed: Duration,
    /// Combined total of all live tracked roots.
    pub total: usize,
    /// Per-root sizes, in watch-list order; 0 for roots no longer live.
    pub per_root: Vec<usize>,
    /// The sizer's counters for this pass.
    pub stats: SizerStats,
}

impl TrackSnapshot {
    /// Rough memory cost of keeping this snapshot in history.
    pub fn estimated_size(&self) -> usize {
        std::mem::size_of::<TrackSnapshot>() + self.per_root.len() * std::mem::size_of::<usize>()
    }
}

/// Records sizing passes over a fixed set of named roots.
#[derive(Debug)]
pub struct Tracker {
    roots: Vec<TrackedRoot>,
    snapshots: Vec<TrackSnapshot>,
    started: Instant,
    max_memory: usize,
    current_memory: usize,
}

impl Tracker {
    /// A tracker whose history may occupy at most `max_memory` estimated
    /// bytes.
    pub fn new(max_memory: usize) -> Self {
        Tracker {
            roots: Vec::new(),
            snapshots: Vec::new(),
            started: Instant::now(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a named root to the watch list.
    pub fn track(&mut self, name: &str, root: ObjRef) {
        self.roots.push(TrackedRoot {
            name: name.to_string(),
            root,
        });
    }

    pub fn roots(&self) -> &[TrackedRoot] {
        &self.roots
    }

    /// Run one sizing pass over the watch list and append the snapshot.
    pub fn record(
        &mut self,
        heap: &ObjectHeap,
        sizer: &mut Sizer,
    ) -> Result<&TrackSnapshot, SizeError> {
        let live: Vec<ObjRef> = self
            .roots
            .iter()
            .map(|t| t.root)
            .filter(|&r| heap.is_live(r))
            .collect();
        let live_sizes = sizer.each_of(heap, &live)?;

        let mut per_root = Vec::with_capacity(self.roots.len());
        let mut live_iter = live_sizes.into_iter();
        for tracked in &self.roots {
            if heap.is_live(tracked.root) {
                per_root.push(live_iter.next().unwrap_or(0));
            } else {
                per_root.push(0);
            }
        }

        let stats = sizer.stats();
        let snapshot = TrackSnapshot {
            elapsed: self.started.elapsed(),
            total: stats.total,
            per_root,
            stats,
        };
        let cost = snapshot.estimated_size();
        if self.current_memory + cost > self.max_memory {
            return Err(SizeError::HistoryLimitExceeded {
                current: self.current_memory,
                limit: self.max_memory,
            });
        }
        self.current_memory += cost;
        self.snapshots.push(snapshot);
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    pub fn get(&self, index: usize) -> Option<&TrackSnapshot> {
        self.snapshots.get(index)
    }

    pub fn latest(&self) -> Option<&TrackSnapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }

    /// Recorded sizes of one named root, oldest first.
    pub fn series(&self, name: &str) -> Vec<usize> {
        let index = match self.roots.iter().position(|t| t.name == name) {
            Some(index) => index,
            None => return Vec::new(),
        };
        self.snapshots
            .iter()
            .filter_map(|s| s.per_root.get(index).copied())
            .collect()
    }

    /// Change of one named root between the last two snapshots.
    pub fn delta(&self, name: &str) -> Option<i64> {
        let series = self.series(name);
        let last = *series.last()?;
        let previous = *series.get(series.len().checked_sub(2)?)?;
        Some(last as i64 - previous as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SizeConfig;
    use crate::runtime::object::Object;

    fn sizer(heap: &ObjectHeap) -> Sizer {
        Sizer::new(heap, SizeConfig::default()).unwrap()
    }

    #[test]
    fn record_appends_timestamped_snapshots() {
        let mut heap = ObjectHeap::new();
        let list = heap.alloc(Object::List(Vec::new()));
        let mut s = sizer(&heap);
        let mut tracker = Tracker::new(64 * 1024);
        tracker.track("cache", list);
        tracker.record(&heap, &mut s).unwrap();
        // grow the list, record again
        let item = heap.alloc(Object::Int(9));
        if let Some(Object::List(items)) = heap.get_mut(list) {
            items.push(item);
        }
        tracker.record(&heap, &mut s).unwrap();
        assert_eq!(tracker.len(), 2);
        let series = tracker.series("cache");
        assert!(series[1] > series[0], "growth must show in the series");
        assert!(tracker.delta("cache").unwrap() > 0);
    }

    #[test]
    fn released_roots_report_zero() {
        let mut heap = ObjectHeap::new();
        let list = heap.alloc(Object::List(Vec::new()));
        let mut s = sizer(&heap);
        let mut tracker = Tracker::new(64 * 1024);
        tracker.track("gone", list);
        tracker.record(&heap, &mut s).unwrap();
        heap.release(list);
        tracker.record(&heap, &mut s).unwrap();
        let series = tracker.series("gone");
        assert!(series[0] > 0);
        assert_eq!(series[1], 0);
    }

    #[test]
    fn history_budget_refuses_the_overflowing_record() {
        let mut heap = ObjectHeap::new();
        let list = heap.alloc(Object::List(Vec::new()));
        let mut s = sizer(&heap);
        let mut tracker = Tracker::new(1);
        tracker.track("cache", list);
        assert!(matches!(
            tracker.record(&heap, &mut s),
            Err(SizeError::HistoryLimitExceeded { .. })
        ));
        assert!(tracker.is_empty());
    }

    #[test]
    fn unknown_names_yield_empty_series() {
        let tracker = Tracker::new(1024);
        assert!(tracker.series("nope").is_empty());
        assert_eq!(tracker.delta("nope"), None);
    }
}
