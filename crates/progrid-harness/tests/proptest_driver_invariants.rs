//! Property-based invariant tests for a grid driven end to end.
//!
//! After every step of a random session (scrolls, resizes, timer ticks,
//! fetch completions, upserts, deletes):
//!
//! 1. Each row owns at most one surface, and exactly one iff its span
//!    intersects the buffer window.
//! 2. Every live surface belongs to a row that is still in the sequence.
//! 3. The backend never saw an operation on a missing surface or content.
//! 4. The reported total extent equals a fresh measurement of the rows.
//! 5. Only rows with a surface are Loading or Loaded.

use std::collections::HashSet;

use progrid_core::{ContainerMetrics, GridConfig, MediaRecord};
use progrid_harness::replay::{Driver, Step};
use progrid_layout::{LayoutParams, measure_extent};
use progrid_runtime::{GridHandlers, Phase};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn group(index: u8, count: usize) -> Vec<MediaRecord> {
    let lead = u64::from(index) * 100;
    (0..count)
        .map(|i| MediaRecord::new(format!("g{index}"), lead + i as u64, format!("{index}-{i}")))
        .collect()
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0i64..8_000).prop_map(|offset| Step::Scroll { offset }),
        1 => (200u32..1_200, 100u32..1_000).prop_map(|(cross_extent, viewport_extent)| {
            Step::Resize { cross_extent, viewport_extent }
        }),
        2 => (0u64..300).prop_map(|ms| Step::Advance { ms }),
        2 => (0usize..4).prop_map(|fail_every| Step::Resolve { fail_every }),
        1 => (0u8..12, 1usize..12).prop_map(|(g, n)| Step::Upsert { records: group(g, n) }),
        1 => (0u8..12).prop_map(|g| Step::Delete { group_key: format!("g{g}") }),
    ]
}

fn session_strategy() -> impl Strategy<Value = (Vec<(u8, usize)>, Vec<Step>)> {
    (
        prop::collection::btree_map(0u8..12, 1usize..15, 0..8)
            .prop_map(|groups| groups.into_iter().collect()),
        prop::collection::vec(step_strategy(), 1..40),
    )
}

fn check(driver: &Driver) -> Result<(), TestCaseError> {
    let grid = driver.grid();
    let window = grid.viewport().buffer_window();
    let backend = grid.backend();
    prop_assert!(backend.violations().is_empty(), "{:?}", backend.violations());

    let mut ids = HashSet::new();
    for row in grid.rows() {
        ids.insert(row.id());
        let expected = usize::from(row.layout().span().overlaps(&window));
        prop_assert_eq!(backend.surfaces_for(row.id()), expected, "row {}", row.id());
        if expected == 0 {
            prop_assert_eq!(grid.phase(row.id()), Some(Phase::Unloaded));
        }
    }
    for surface in backend.surfaces().values() {
        prop_assert!(ids.contains(&surface.row), "orphan surface for {}", surface.row);
    }

    let params = LayoutParams::from_config(grid.config());
    prop_assert_eq!(grid.total_extent(), measure_extent(grid.rows(), &params));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sessions_keep_surfaces_consistent((groups, steps) in session_strategy()) {
        let records: Vec<MediaRecord> = groups.iter().flat_map(|&(g, n)| group(g, n)).collect();
        let mut driver = Driver::new(
            &records,
            GridConfig::default(),
            GridHandlers::default(),
            ContainerMetrics::new(0, 800),
            600,
        )
        .unwrap();
        driver.enable().unwrap();
        check(&driver)?;
        for step in &steps {
            driver.apply(step).unwrap();
            check(&driver)?;
        }
    }
}
