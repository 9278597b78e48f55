#![forbid(unsafe_code)]

//! Load/hide decisions against the buffer window.
//!
//! A row is loadable iff its bounds intersect the buffer window (edges
//! inclusive). Rows are laid out with strictly increasing `y`, so the
//! loadable rows form one contiguous index range that two binary searches
//! find. The scheduler remembers the previous live range and emits only the
//! rows that left it as hides, which keeps a scroll frame proportional to the
//! rows entering or leaving the window.
//!
//! After a mutation indices shift, so the engine calls
//! [`VisibilityScheduler::invalidate`] and the next plan sweeps every row.
//!
//! # Invariants
//!
//! - `Load` and `Hide` are mutually exclusive and exhaustive per row.
//! - A row fully inside the window is always `Load`.
//! - Planning twice with the same window yields the same live range and no
//!   hides the second time.

use std::ops::Range;

use progrid_core::Span;

/// Decision for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Row should have a surface.
    Load,
    /// Row should have no surface.
    Hide,
}

/// Decide whether a row with bounds `row` should be on surface.
#[inline]
#[must_use]
pub fn decide(row: Span, window: Span) -> Visibility {
    if row.end < window.start || row.start > window.end {
        Visibility::Hide
    } else {
        Visibility::Load
    }
}

/// Work for one visibility pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityPlan {
    /// Rows to load (or re-style).
    pub load: Range<usize>,
    /// Rows to hide. Either range may be empty.
    pub hide: [Range<usize>; 2],
    /// Whether this plan covers every row.
    pub full_sweep: bool,
}

impl VisibilityPlan {
    /// Indices to hide, in ascending order.
    pub fn hides(&self) -> impl Iterator<Item = usize> + '_ {
        self.hide[0].clone().chain(self.hide[1].clone())
    }

    /// Number of rows this plan touches.
    #[must_use]
    pub fn touched(&self) -> usize {
        self.load.len() + self.hide[0].len() + self.hide[1].len()
    }
}

/// Tracks the live range between passes.
#[derive(Debug, Clone)]
pub struct VisibilityScheduler {
    live: Range<usize>,
    full_sweep: bool,
}

impl Default for VisibilityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityScheduler {
    /// A scheduler whose first plan sweeps every row.
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: 0..0,
            full_sweep: true,
        }
    }

    /// Forget the live range; the next plan sweeps every row.
    pub fn invalidate(&mut self) {
        self.full_sweep = true;
    }

    /// Live range computed by the last plan.
    #[must_use]
    pub fn live(&self) -> Range<usize> {
        self.live.clone()
    }

    /// Plan a pass over `len` rows whose bounds are given by `span_at`.
    ///
    /// `span_at` must be non-decreasing in both `start` and `end`.
    pub fn plan<F>(&mut self, len: usize, span_at: F, window: Span) -> VisibilityPlan
    where
        F: Fn(usize) -> Span,
    {
        let new = live_range(len, &span_at, window);
        let full_sweep = self.full_sweep;
        let hide = if full_sweep {
            [0..new.start, new.end..len]
        } else {
            let old = clamp(self.live.clone(), len);
            difference(old, &new)
        };
        self.live = new.clone();
        self.full_sweep = false;
        VisibilityPlan {
            load: new,
            hide,
            full_sweep,
        }
    }
}

/// Index range of rows intersecting `window`.
pub fn live_range<F>(len: usize, span_at: F, window: Span) -> Range<usize>
where
    F: Fn(usize) -> Span,
{
    let start = partition_point(len, |i| span_at(i).end < window.start);
    let end = partition_point(len, |i| span_at(i).start <= window.end);
    start..end.max(start)
}

/// First row containing `offset`, if any.
///
/// Rows before the partition point end above `offset` and rows after it
/// start below the first candidate, so the candidate is the only possible
/// first match.
pub fn active_index<F>(len: usize, span_at: F, offset: i64) -> Option<usize>
where
    F: Fn(usize) -> Span,
{
    let i = partition_point(len, |i| span_at(i).end < offset);
    (i < len && span_at(i).start <= offset).then_some(i)
}

/// Last row starting at or above `offset`, else the first row.
pub fn preceding_index<F>(len: usize, span_at: F, offset: i64) -> Option<usize>
where
    F: Fn(usize) -> Span,
{
    (len > 0).then(|| partition_point(len, |i| span_at(i).start <= offset).saturating_sub(1))
}

fn partition_point<P>(len: usize, pred: P) -> usize
where
    P: Fn(usize) -> bool,
{
    let (mut lo, mut hi) = (0usize, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    range.start.min(len)..range.end.min(len)
}

fn difference(old: Range<usize>, new: &Range<usize>) -> [Range<usize>; 2] {
    if old.is_empty() {
        return [0..0, 0..0];
    }
    if new.is_empty() {
        return [old, 0..0];
    }
    let before = old.start..old.end.min(new.start);
    let after = old.start.max(new.end)..old.end;
    [
        if before.is_empty() { 0..0 } else { before },
        if after.is_empty() { 0..0 } else { after },
    ]
}
