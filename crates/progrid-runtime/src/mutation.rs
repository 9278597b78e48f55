#![forbid(unsafe_code)]

//! Group upsert and delete.
//!
//! Both operations work on whole group runs. Rows leaving the sequence are
//! hidden first, so no surface outlives its row. Upserted groups keep the
//! sequence ordered by leading sort key:
//!
//! 1. An existing run is replaced in place when the new leading key still
//!    sits between its neighbours' keys.
//! 2. Otherwise the group goes to the head if its leading key is below every
//!    existing row, to the tail if above every one, and else before the first
//!    group whose leading key is greater.
//! 3. A landing point followed by a group with a smaller leading key (the
//!    sequence was built from unordered input) is logged and resolved by
//!    appending.

use progrid_core::{GridError, MediaRecord, RenderBackend, Row, RowIdAllocator, parse_records};

use crate::sequence::{RowSequence, Slot};

/// Where an upserted group landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Replaced an existing run starting at `at`.
    Replaced { at: usize },
    /// Inserted at index 0.
    Head,
    /// Appended after every row.
    Tail,
    /// Inserted before the first group with a greater leading key.
    Scan { at: usize },
    /// Ordering violation; appended at `at`.
    Fallback { at: usize },
}

impl Placement {
    /// Index of the group's header after the mutation, given the length of
    /// the sequence before insertion.
    #[must_use]
    pub const fn index(self, len_before: usize) -> usize {
        match self {
            Self::Head => 0,
            Self::Tail => len_before,
            Self::Replaced { at } | Self::Scan { at } | Self::Fallback { at } => at,
        }
    }
}

/// Outcome of a group mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    /// Group the mutation targeted.
    pub group_key: String,
    /// Rows removed from the sequence.
    pub removed: usize,
    /// Rows inserted into the sequence.
    pub inserted: usize,
    /// Removed rows that still had a surface.
    pub hidden: usize,
    /// Landing point of an upsert; `None` for deletes.
    pub placement: Option<Placement>,
    /// Whether a layout and visibility pass followed.
    pub relayout: bool,
}

impl MutationReport {
    fn empty(group_key: &str) -> Self {
        Self {
            group_key: group_key.to_string(),
            removed: 0,
            inserted: 0,
            hidden: 0,
            placement: None,
            relayout: false,
        }
    }

    /// Check if the sequence changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.removed > 0 || self.inserted > 0
    }
}

/// Validate records of one group and build its header and media rows.
///
/// Records are stably sorted by sort key.
pub fn build_group(records: &[MediaRecord], ids: &mut RowIdAllocator) -> Result<Vec<Row>, GridError> {
    let first = records.first().ok_or(GridError::EmptyGroup)?;
    if let Some(other) = records.iter().find(|r| r.group_key != first.group_key) {
        return Err(GridError::MixedGroupKeys {
            expected: first.group_key.clone(),
            found: other.group_key.clone(),
        });
    }
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.sort_key);
    Ok(parse_records(&sorted, ids))
}

/// Insert or replace the group formed by `rows`.
///
/// `rows` must come from [`build_group`]: one header followed by media rows
/// of a single group.
pub fn upsert<B>(seq: &mut RowSequence, rows: Vec<Row>, backend: &mut B) -> MutationReport
where
    B: RenderBackend + ?Sized,
{
    let Some(head) = rows.first() else {
        return MutationReport::empty("");
    };
    let group_key = head.group_key().to_string();
    let lead = head.sort_key();
    let runs = seq.group_runs(&group_key);
    let hidden = hide_runs(seq, &runs, backend);
    let inserted = rows.len();
    let slots: Vec<Slot> = rows.into_iter().map(Slot::new).collect();

    let (removed, placement) = match runs.as_slice() {
        [run] if fits_in_place(seq, run.start, run.end, lead) => {
            let removed = seq.splice(run.clone(), slots).len();
            (removed, Placement::Replaced { at: run.start })
        }
        _ => {
            let removed = remove_runs(seq, &runs);
            let placement = find_insertion(seq, &group_key, lead);
            let at = placement.index(seq.len());
            seq.splice(at..at, slots);
            (removed, placement)
        }
    };

    tracing::debug!(
        target: "progrid.mutation",
        group = %group_key,
        removed,
        inserted,
        hidden,
        placement = ?placement,
        "upserted group"
    );
    MutationReport {
        group_key,
        removed,
        inserted,
        hidden,
        placement: Some(placement),
        relayout: true,
    }
}

/// Remove every row of `group_key`.
pub fn delete<B>(seq: &mut RowSequence, group_key: &str, backend: &mut B) -> MutationReport
where
    B: RenderBackend + ?Sized,
{
    let runs = seq.group_runs(group_key);
    if runs.is_empty() {
        tracing::debug!(
            target: "progrid.mutation",
            group = %group_key,
            "delete of unknown group skipped"
        );
        return MutationReport::empty(group_key);
    }
    let hidden = hide_runs(seq, &runs, backend);
    let removed = remove_runs(seq, &runs);
    tracing::debug!(
        target: "progrid.mutation",
        group = %group_key,
        removed,
        hidden,
        "deleted group"
    );
    MutationReport {
        group_key: group_key.to_string(),
        removed,
        inserted: 0,
        hidden,
        placement: None,
        relayout: true,
    }
}

/// Landing point for a new group with leading key `lead`.
pub fn find_insertion(seq: &RowSequence, group_key: &str, lead: u64) -> Placement {
    let Some((lo, hi)) = seq.key_bounds() else {
        return Placement::Head;
    };
    if lead < lo {
        return Placement::Head;
    }
    if lead > hi {
        return Placement::Tail;
    }

    let leads = seq.group_leads();
    let Some(p) = leads.iter().position(|&(_, key)| key > lead) else {
        return Placement::Scan { at: seq.len() };
    };
    let at = leads[p].0;
    // Every lead before `p` is <= `lead`; a smaller lead after it means the
    // sequence itself is out of order.
    if let Some(&(offender, offending_lead)) = leads[p + 1..].iter().find(|&&(_, key)| key < lead) {
        tracing::warn!(
            target: "progrid.mutation",
            group = %group_key,
            lead,
            at,
            offender,
            offending_lead,
            "ordering violation, appending group"
        );
        return Placement::Fallback { at: seq.len() };
    }
    Placement::Scan { at }
}

fn fits_in_place(seq: &RowSequence, start: usize, end: usize, lead: u64) -> bool {
    let leads = seq.group_leads();
    let before = leads.iter().rev().find(|&&(i, _)| i < start).map(|&(_, k)| k);
    let after = leads.iter().find(|&&(i, _)| i >= end).map(|&(_, k)| k);
    before.is_none_or(|k| k <= lead) && after.is_none_or(|k| lead <= k)
}

fn hide_runs<B>(seq: &mut RowSequence, runs: &[std::ops::Range<usize>], backend: &mut B) -> usize
where
    B: RenderBackend + ?Sized,
{
    let mut hidden = 0;
    for run in runs {
        for i in run.clone() {
            if let Some(slot) = seq.get_mut(i)
                && slot.lifecycle.hide(backend)
            {
                tracing::trace!(target: "progrid.lifecycle", row = %slot.row.id(), "hid removed row");
                hidden += 1;
            }
        }
    }
    hidden
}

fn remove_runs(seq: &mut RowSequence, runs: &[std::ops::Range<usize>]) -> usize {
    runs.iter()
        .rev()
        .map(|run| seq.splice(run.clone(), Vec::new()).len())
        .sum()
}
