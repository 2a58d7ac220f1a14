//! Per-type size profiles
//!
//! The sizer feeds every non-ignored object it sizes into a
//! [`ProfileTable`], which keeps one [`Profile`] per type key: running
//! total, instance count, and the largest flat size seen together with a
//! handle to that instance.  The handle is non-owning — profiling must
//! never keep an otherwise-dead object alive — so it is validated against
//! the heap before use.
//!
//! [`ProfileTable::ranked`] produces the report view: rows sorted by total
//! descending with count as the tie break, entries below a cutoff
//! percentage of the grand total collapsed into one summary row.

use rustc_hash::FxHashMap;

use crate::engine::descriptor::TypeKey;
use crate::runtime::heap::{ObjRef, ObjectHeap};

/// Running statistics for one type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Profile {
    /// Sum of flat sizes of every instance sized.
    pub total: usize,
    /// Instances sized.
    pub count: usize,
    /// Largest flat size seen.
    pub high: usize,
    /// The instance that produced `high`; never keeps it alive.
    pub high_ref: Option<ObjRef>,
}

impl Profile {
    fn record(&mut self, r: ObjRef, flat: usize) {
        self.total += flat;
        self.count += 1;
        if flat > self.high {
            self.high = flat;
            self.high_ref = Some(r);
        }
    }

    /// The largest instance, if it is still live.
    pub fn largest(&self, heap: &ObjectHeap) -> Option<ObjRef> {
        self.high_ref.filter(|&r| heap.is_live(r))
    }
}

/// One row of the ranked report view.
#[derive(Debug, Clone, Copy)]
pub struct ProfileRow {
    pub key: TypeKey,
    pub total: usize,
    pub count: usize,
    pub high: usize,
}

/// Entries that fell below the cutoff, rolled into one line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapsedRows {
    pub types: usize,
    pub total: usize,
    pub count: usize,
}

/// The ranked, threshold-filtered view of a profile table.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub rows: Vec<ProfileRow>,
    pub collapsed: Option<CollapsedRows>,
    pub grand_total: usize,
}

/// Per-type statistics for one sizing session.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    entries: FxHashMap<TypeKey, Profile>,
}

impl ProfileTable {
    pub fn new() -> Self {
        ProfileTable::default()
    }

    /// Record one sized instance under its type key.
    pub fn record(&mut self, key: TypeKey, r: ObjRef, flat: usize) {
        self.entries.entry(key).or_default().record(r, flat);
    }

    pub fn get(&self, key: TypeKey) -> Option<&Profile> {
        self.entries.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &Profile)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sum of every profile's total.
    pub fn grand_total(&self) -> usize {
        self.entries.values().map(|p| p.total).sum()
    }

    /// Ranked view: rows sorted by (total, count) descending.  Entries whose
    /// total is below `cutoff` percent of the grand total collapse into a
    /// single summary row; a cutoff of 0 keeps every row.
    pub fn ranked(&self, cutoff: f64) -> ProfileView {
        let grand_total = self.grand_total();
        let mut rows: Vec<ProfileRow> = self
            .entries
            .iter()
            .map(|(&key, p)| ProfileRow {
                key,
                total: p.total,
                count: p.count,
                high: p.high,
            })
            .collect();
        rows.sort_by(|a, b| (b.total, b.count).cmp(&(a.total, a.count)));

        let mut collapsed: Option<CollapsedRows> = None;
        if cutoff > 0.0 && grand_total > 0 {
            let floor = (grand_total as f64) * cutoff / 100.0;
            let mut kept = Vec::with_capacity(rows.len());
            let mut below = CollapsedRows::default();
            for row in rows {
                if (row.total as f64) < floor {
                    below.types += 1;
                    below.total += row.total;
                    below.count += row.count;
                } else {
                    kept.push(row);
                }
            }
            rows = kept;
            if below.types > 0 {
                collapsed = Some(below);
            }
        }
        ProfileView {
            rows,
            collapsed,
            grand_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::object::{BuiltinKind, Object};

    fn key(kind: BuiltinKind) -> TypeKey {
        TypeKey::Builtin(kind)
    }

    #[test]
    fn profiles_track_the_largest_instance() {
        let mut heap = ObjectHeap::new();
        let small = heap.alloc(Object::Int(1));
        let big = heap.alloc(Object::Int(2));
        let mut table = ProfileTable::new();
        table.record(key(BuiltinKind::Int), small, 32);
        table.record(key(BuiltinKind::Int), big, 96);
        table.record(key(BuiltinKind::Int), small, 32);
        let p = table.get(key(BuiltinKind::Int)).copied().unwrap();
        assert_eq!(p.count, 3);
        assert_eq!(p.total, 160);
        assert_eq!(p.high, 96);
        assert_eq!(p.largest(&heap), Some(big));
    }

    #[test]
    fn largest_handle_does_not_outlive_its_object() {
        let mut heap = ObjectHeap::new();
        let r = heap.alloc(Object::Int(7));
        let mut table = ProfileTable::new();
        table.record(key(BuiltinKind::Int), r, 32);
        heap.release(r);
        let p = table.get(key(BuiltinKind::Int)).unwrap();
        assert_eq!(p.largest(&heap), None);
        assert_eq!(p.high, 32, "the recorded size survives the object");
    }

    #[test]
    fn ranked_view_sorts_and_collapses_below_cutoff() {
        let mut heap = ObjectHeap::new();
        let r = heap.alloc(Object::None);
        let mut table = ProfileTable::new();
        table.record(key(BuiltinKind::Str), r, 900);
        table.record(key(BuiltinKind::List), r, 80);
        table.record(key(BuiltinKind::Int), r, 20);
        // grand total 1000; 5% cutoff keeps str and list
        let view = table.ranked(5.0);
        assert_eq!(view.grand_total, 1000);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].total, 900);
        assert_eq!(view.rows[1].total, 80);
        let below = view.collapsed.unwrap();
        assert_eq!(below.types, 1);
        assert_eq!(below.total, 20);

        let full = table.ranked(0.0);
        assert_eq!(full.rows.len(), 3);
        assert!(full.collapsed.is_none());
    }

    #[test]
    fn ties_on_total_break_by_count() {
        let mut heap = ObjectHeap::new();
        let r = heap.alloc(Object::None);
        let mut table = ProfileTable::new();
        table.record(key(BuiltinKind::Int), r, 100);
        table.record(key(BuiltinKind::Float), r, 50);
        table.record(key(BuiltinKind::Float), r, 50);
        let view = table.ranked(0.0);
        assert_eq!(view.rows[0].count, 2, "higher count wins the tie");
    }
}
