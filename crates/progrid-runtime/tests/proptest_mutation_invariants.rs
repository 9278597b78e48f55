//! Property-based invariant tests for group mutation.
//!
//! 1. After any series of upserts into an ordered sequence, group leading
//!    keys are non-decreasing and no ordering fallback happens.
//! 2. Every group occupies exactly one contiguous run headed by its header.
//! 3. Deleting a group removes exactly its rows and preserves the order of
//!    everything else.
//! 4. Row ids stay unique across mutations.

use std::collections::HashSet;

use progrid_core::{
    Content, ContentId, MediaRecord, RenderBackend, RowIdAllocator, RowLayout, SurfaceFlags,
    SurfaceId, SurfaceSpec,
};
use progrid_runtime::mutation::{self, Placement};
use progrid_runtime::sequence::RowSequence;
use proptest::prelude::*;

#[derive(Default)]
struct NullBackend {
    next: u64,
}

impl RenderBackend for NullBackend {
    fn create_surface(&mut self, _spec: &SurfaceSpec) -> SurfaceId {
        self.next += 1;
        SurfaceId(self.next)
    }
    fn apply_layout(&mut self, _surface: SurfaceId, _layout: &RowLayout) {}
    fn attach_content(&mut self, _surface: SurfaceId, _content: Content) -> ContentId {
        self.next += 1;
        ContentId(self.next)
    }
    fn detach_content(&mut self, _surface: SurfaceId, _content: ContentId) {}
    fn set_flags(&mut self, _surface: SurfaceId, _flags: SurfaceFlags) {}
    fn remove_surface(&mut self, _surface: SurfaceId) {}
}

// ── Strategies ────────────────────────────────────────────────────────────

/// `(group index, leading key, media count)` upserts.
fn upserts_strategy() -> impl Strategy<Value = Vec<(u8, u64, usize)>> {
    prop::collection::vec((0u8..10, 0u64..1_000, 1usize..5), 1..30)
}

fn records(group: u8, lead: u64, count: usize) -> Vec<MediaRecord> {
    (0..count)
        .map(|i| MediaRecord::new(format!("g{group}"), lead + i as u64, format!("{group}-{i}")))
        .collect()
}

fn runs_are_contiguous(seq: &RowSequence) -> bool {
    let mut seen = HashSet::new();
    let mut previous: Option<&str> = None;
    for slot in seq.slots() {
        let key = slot.row.group_key();
        if previous != Some(key) {
            if !seen.insert(key.to_string()) || !slot.row.is_header() {
                return false;
            }
            previous = Some(key);
        }
    }
    true
}

fn apply(upserts: &[(u8, u64, usize)]) -> (RowSequence, Vec<Placement>) {
    let mut ids = RowIdAllocator::new();
    let mut seq = RowSequence::default();
    let mut backend = NullBackend::default();
    let mut placements = Vec::new();
    for &(group, lead, count) in upserts {
        let rows = mutation::build_group(&records(group, lead, count), &mut ids).unwrap();
        let report = mutation::upsert(&mut seq, rows, &mut backend);
        placements.extend(report.placement);
    }
    (seq, placements)
}

proptest! {
    #[test]
    fn upserts_keep_groups_ordered(upserts in upserts_strategy()) {
        let (seq, placements) = apply(&upserts);
        let leads: Vec<u64> = seq.group_leads().iter().map(|&(_, k)| k).collect();
        prop_assert!(leads.windows(2).all(|w| w[0] <= w[1]), "leads {:?}", leads);
        let fell_back = placements.iter().any(|p| matches!(p, Placement::Fallback { .. }));
        prop_assert!(!fell_back, "fallback placement in {:?}", placements);
    }

    #[test]
    fn groups_are_single_runs(upserts in upserts_strategy()) {
        let (seq, _) = apply(&upserts);
        prop_assert!(runs_are_contiguous(&seq));
        let distinct: HashSet<u8> = upserts.iter().map(|u| u.0).collect();
        let headers = seq.slots().iter().filter(|s| s.row.is_header()).count();
        prop_assert_eq!(headers, distinct.len());
    }

    #[test]
    fn delete_removes_exactly_one_group(upserts in upserts_strategy(), victim in 0u8..10) {
        let (mut seq, _) = apply(&upserts);
        let key = format!("g{victim}");
        let before: Vec<_> = seq
            .slots()
            .iter()
            .filter(|s| s.row.group_key() != key)
            .map(|s| s.row.id())
            .collect();
        let expected_removed = seq.len() - before.len();
        let report = mutation::delete(&mut seq, &key, &mut NullBackend::default());
        prop_assert_eq!(report.removed, expected_removed);
        prop_assert_eq!(report.relayout, expected_removed > 0);
        let after: Vec<_> = seq.slots().iter().map(|s| s.row.id()).collect();
        prop_assert_eq!(after, before);
    }

    #[test]
    fn ids_stay_unique(upserts in upserts_strategy()) {
        let (seq, _) = apply(&upserts);
        let ids: HashSet<_> = seq.slots().iter().map(|s| s.row.id()).collect();
        prop_assert_eq!(ids.len(), seq.len());
    }
}
