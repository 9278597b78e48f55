//! Property-based invariant tests for the layout pass.
//!
//! 1. Adjacent rows never overlap and never leave more than one spacing gap.
//! 2. Total extent equals the sum of heights plus spacing between rows.
//! 3. Passes are deterministic for a fixed window state.
//! 4. `measure_extent` agrees with `place`.
//! 5. Every row spans the full cross extent at x = 0.

use progrid_core::{GridConfig, MediaRecord, Row, RowIdAllocator, Transition, parse_records};
use progrid_layout::{LayoutParams, measure_extent, place};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn params_strategy() -> impl Strategy<Value = LayoutParams> {
    (1u32..=300, 1u32..=200, 0u32..=40).prop_map(|(header, row, spacing)| {
        let config = GridConfig::default()
            .with_heights(header, row)
            .with_spacing(spacing);
        LayoutParams::from_config(&config)
    })
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(0u8..6, 0..120).prop_map(|groups| {
        let mut sorted = groups;
        sorted.sort_unstable();
        let records: Vec<MediaRecord> = sorted
            .iter()
            .enumerate()
            .map(|(i, g)| MediaRecord::new(format!("g{g}"), i as u64, format!("{i}.bin")))
            .collect();
        parse_records(&records, &mut RowIdAllocator::new())
    })
}

proptest! {
    #[test]
    fn no_gap_no_overlap(params in params_strategy(), mut rows in rows_strategy(), cross in 0u32..2000) {
        place(rows.iter_mut(), &params, cross, Transition::None);
        for pair in rows.windows(2) {
            let (a, b) = (pair[0].layout(), pair[1].layout());
            prop_assert_eq!(a.y + i64::from(a.height) + i64::from(params.spacing), b.y);
        }
    }

    #[test]
    fn total_extent_formula(params in params_strategy(), mut rows in rows_strategy()) {
        let (extent, count) = place(rows.iter_mut(), &params, 100, Transition::None);
        let heights: i64 = rows.iter().map(|r| i64::from(r.layout().height)).sum();
        let expected = if count == 0 {
            0
        } else {
            heights + i64::from(params.spacing) * (count as i64 - 1)
        };
        prop_assert_eq!(extent, expected);
        prop_assert_eq!(measure_extent(rows.iter(), &params), extent);
    }

    #[test]
    fn passes_are_deterministic(params in params_strategy(), mut rows in rows_strategy(), cross in 0u32..2000) {
        place(rows.iter_mut(), &params, cross, Transition::None);
        let first: Vec<_> = rows.iter().map(|r| *r.layout()).collect();
        place(rows.iter_mut(), &params, cross, Transition::None);
        let second: Vec<_> = rows.iter().map(|r| *r.layout()).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn rows_fill_cross_axis(params in params_strategy(), mut rows in rows_strategy(), cross in 0u32..2000) {
        place(rows.iter_mut(), &params, cross, Transition::None);
        for row in &rows {
            prop_assert_eq!(row.layout().x, 0);
            prop_assert_eq!(row.layout().width, cross);
            prop_assert_eq!(row.layout().height, params.size_of(row.kind()));
        }
    }
}
