#![forbid(unsafe_code)]

//! The ordered row sequence and its lifecycle slots.

use std::collections::HashMap;
use std::ops::Range;

use progrid_core::{Row, RowId, Span};

use crate::lifecycle::RowLifecycle;

/// A row together with its surface state.
#[derive(Debug, Clone)]
pub struct Slot {
    pub row: Row,
    pub lifecycle: RowLifecycle,
}

impl Slot {
    #[must_use]
    pub fn new(row: Row) -> Self {
        Self {
            row,
            lifecycle: RowLifecycle::new(),
        }
    }
}

/// Ordered rows with an id index.
///
/// The index is rebuilt after every structural change, so `position` is
/// always consistent with the slot order.
#[derive(Debug, Clone, Default)]
pub struct RowSequence {
    slots: Vec<Slot>,
    index: HashMap<RowId, usize>,
}

impl RowSequence {
    /// Wrap rows in fresh (unloaded) slots.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut seq = Self {
            slots: rows.into_iter().map(Slot::new).collect(),
            index: HashMap::new(),
        };
        seq.reindex();
        seq
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// Index of the row with `id`.
    #[inline]
    #[must_use]
    pub fn position(&self, id: RowId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Slot of the row with `id`.
    pub fn slot_mut(&mut self, id: RowId) -> Option<&mut Slot> {
        let index = self.position(id)?;
        self.slots.get_mut(index)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.slots.iter().map(|s| &s.row)
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> + '_ {
        self.slots.iter_mut().map(|s| &mut s.row)
    }

    /// Scroll-axis bounds of the row at `index`.
    ///
    /// Panics if `index` is out of bounds, like slice indexing.
    #[inline]
    #[must_use]
    pub fn span_at(&self, index: usize) -> Span {
        self.slots[index].row.layout().span()
    }

    /// Check if any row belongs to `group_key`.
    #[must_use]
    pub fn contains_group(&self, group_key: &str) -> bool {
        self.slots.iter().any(|s| s.row.group_key() == group_key)
    }

    /// Maximal runs of consecutive rows with `group_key`, in order.
    #[must_use]
    pub fn group_runs(&self, group_key: &str) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start: Option<usize> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            match (slot.row.group_key() == group_key, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    runs.push(s..i);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push(s..self.slots.len());
        }
        runs
    }

    /// `(start_index, leading_sort_key)` of every group run, in order.
    #[must_use]
    pub fn group_leads(&self) -> Vec<(usize, u64)> {
        let mut leads = Vec::new();
        let mut previous: Option<&str> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            let key = slot.row.group_key();
            if previous != Some(key) {
                leads.push((i, slot.row.sort_key()));
                previous = Some(key);
            }
        }
        leads
    }

    /// Smallest and largest sort key over all rows.
    #[must_use]
    pub fn key_bounds(&self) -> Option<(u64, u64)> {
        self.slots.iter().fold(None, |acc, slot| {
            let k = slot.row.sort_key();
            Some(match acc {
                None => (k, k),
                Some((lo, hi)) => (lo.min(k), hi.max(k)),
            })
        })
    }

    /// Replace `range` with `slots` in one splice and return the removed slots.
    pub fn splice(&mut self, range: Range<usize>, slots: Vec<Slot>) -> Vec<Slot> {
        let removed: Vec<Slot> = self.slots.splice(range, slots).collect();
        self.reindex();
        removed
    }

    fn reindex(&mut self) {
        self.index.clear();
        self.index.extend(
            self.slots
                .iter()
                .enumerate()
                .map(|(i, slot)| (slot.row.id(), i)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progrid_core::{MediaRecord, RowIdAllocator, parse_records};

    fn seq(records: &[(&str, u64)]) -> RowSequence {
        let records: Vec<MediaRecord> = records
            .iter()
            .map(|(g, k)| MediaRecord::new(*g, *k, format!("{g}{k}")))
            .collect();
        RowSequence::from_rows(parse_records(&records, &mut RowIdAllocator::new()))
    }

    #[test]
    fn runs_and_leads() {
        let s = seq(&[("a", 1), ("a", 2), ("b", 5), ("a", 9)]);
        assert_eq!(s.group_runs("a"), vec![0..3, 5..7]);
        assert_eq!(s.group_runs("b"), vec![3..5]);
        assert!(s.group_runs("zzz").is_empty());
        assert!(s.contains_group("b"));
        assert!(!s.contains_group("zzz"));
        assert_eq!(s.group_leads(), vec![(0, 1), (3, 5), (5, 9)]);
        assert_eq!(s.key_bounds(), Some((1, 9)));
    }

    #[test]
    fn splice_reindexes() {
        let mut s = seq(&[("a", 1), ("b", 2), ("c", 3)]);
        let last = s.get(5).map(|slot| slot.row.id());
        let removed = s.splice(0..2, Vec::new());
        assert_eq!(removed.len(), 2);
        assert_eq!(s.len(), 4);
        assert_eq!(last.and_then(|id| s.position(id)), Some(3));
        assert_eq!(removed[0].row.id().get(), 0);
        assert_eq!(s.position(removed[0].row.id()), None);
    }

    #[test]
    fn empty_sequence_has_no_bounds() {
        let s = RowSequence::default();
        assert!(s.is_empty());
        assert_eq!(s.key_bounds(), None);
        assert!(s.group_leads().is_empty());
    }
}
