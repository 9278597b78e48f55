//! Property-based invariant tests for record parsing.
//!
//! 1. Exactly one media row per record, in input order.
//! 2. One header per group boundary, placed directly before the group.
//! 3. Headers carry the sort key of their group's first record.
//! 4. Row ids are unique.

use std::collections::HashSet;

use progrid_core::{MediaRecord, RowBody, RowIdAllocator, parse_records};
use proptest::prelude::*;

fn records_strategy() -> impl Strategy<Value = Vec<MediaRecord>> {
    prop::collection::vec(0u8..5, 0..80).prop_map(|groups| {
        groups
            .iter()
            .enumerate()
            .map(|(i, g)| MediaRecord::new(format!("g{g}"), i as u64 * 3, format!("{i}.mp3")))
            .collect()
    })
}

proptest! {
    #[test]
    fn one_media_row_per_record(records in records_strategy()) {
        let rows = parse_records(&records, &mut RowIdAllocator::new());
        let media: Vec<&str> = rows
            .iter()
            .filter_map(|r| match r.body() {
                RowBody::Media { media_ref } => Some(media_ref.as_str()),
                RowBody::Header { .. } => None,
            })
            .collect();
        let expected: Vec<&str> = records.iter().map(|r| r.media_ref.as_str()).collect();
        prop_assert_eq!(media, expected);
    }

    #[test]
    fn headers_mark_group_boundaries(records in records_strategy()) {
        let rows = parse_records(&records, &mut RowIdAllocator::new());
        let boundaries = records
            .iter()
            .enumerate()
            .filter(|(i, r)| *i == 0 || records[i - 1].group_key != r.group_key)
            .count();
        prop_assert_eq!(rows.iter().filter(|r| r.is_header()).count(), boundaries);

        for (i, row) in rows.iter().enumerate() {
            if row.is_header() {
                let next = &rows[i + 1];
                prop_assert!(!next.is_header());
                prop_assert_eq!(next.group_key(), row.group_key());
                prop_assert_eq!(next.sort_key(), row.sort_key());
            }
        }
    }

    #[test]
    fn ids_are_unique(records in records_strategy()) {
        let rows = parse_records(&records, &mut RowIdAllocator::new());
        let ids: HashSet<_> = rows.iter().map(|r| r.id()).collect();
        prop_assert_eq!(ids.len(), rows.len());
    }
}
