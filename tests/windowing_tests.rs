//! Tests for the windowing engine.
//!
//! These verify that the visible item run is contiguous, in bounds, and
//! positioned at the cumulative estimated sizes for any item count, extent
//! and scroll offset.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use pagegrid::layout::{AxisWindow, SizeEstimator};
use proptest::prelude::*;
use test_case::test_case;

#[test_case(0.0 => Some((0, 9)) ; "top of list")]
#[test_case(45.0 => Some((1, 10)) ; "one row down")]
#[test_case(44.0 => Some((0, 10)) ; "partial first row")]
#[test_case(4050.0 => Some((90, 99)) ; "bottom of list")]
#[test_case(99_999.0 => Some((90, 99)) ; "past the end")]
#[test_case(-300.0 => Some((0, 9)) ; "negative offset")]
fn visible_rows_at_offset(offset: f32) -> Option<(usize, usize)> {
    let mut window = AxisWindow::fixed(45.0, 0);
    window.compute(100, Some(450.0), offset).unwrap().visible
}

#[test_case(0, 0 ; "no overscan")]
#[test_case(3, 3 ; "small overscan")]
#[test_case(50, 20 ; "overscan wider than the list")]
fn overscan_extends_both_ends(overscan: usize, expected_before: usize) {
    let mut window = AxisWindow::fixed(10.0, overscan);
    let range = window.compute(40, Some(100.0), 200.0).unwrap();
    let (first, last) = range.visible.unwrap();
    let (lo, hi) = range.index_range().unwrap();
    assert_eq!(first - lo, expected_before);
    assert_eq!(hi, (last + overscan).min(39));
}

#[test]
fn test_item_count_zero() {
    let mut window = AxisWindow::fixed(45.0, 5);
    let range = window.compute(0, Some(450.0), 0.0).unwrap();
    assert!(range.items.is_empty());
    assert_eq!(range.total_extent, 0.0);
}

#[test]
fn test_growing_count_keeps_previous_rows() {
    let mut window = AxisWindow::fixed(45.0, 5);
    let before = window.compute(20, Some(450.0), 300.0).unwrap();
    let after = window.compute(100, Some(450.0), 300.0).unwrap();
    let after_indices: Vec<usize> = after.items.iter().map(|i| i.index).collect();
    for item in &before.items {
        assert!(after_indices.contains(&item.index));
    }
    assert_eq!(before.visible, after.visible);
}

#[test]
fn test_independent_axes() {
    let mut rows = AxisWindow::fixed(45.0, 0);
    let mut cols = AxisWindow::fixed(250.0, 0);
    let r = rows.compute(100, Some(450.0), 0.0).unwrap();
    let c = cols.compute(8, Some(1000.0), 0.0).unwrap();
    assert_eq!(r.visible, Some((0, 9)));
    assert_eq!(c.visible, Some((0, 3)));
    assert_eq!(c.total_extent, 2000.0);
}

#[test]
fn test_million_rows_keep_exact_offsets() {
    let mut window = AxisWindow::fixed(45.0, 5);
    let range = window
        .compute(1_000_000, Some(900.0), 40_000_000.0)
        .unwrap();
    assert_eq!(range.total_extent, 45_000_000.0);
    assert_eq!(range.visible.map(|(first, _)| first), Some(888_888));
    for item in &range.items {
        assert_eq!(item.start, (item.index as f64 * 45.0) as f32);
        assert_eq!(item.size, 45.0);
    }
    // 44_999_955 rounds to the nearest f32
    assert_eq!(window.offset_of(999_999, 1_000_000).unwrap(), Some(44_999_956.0));
    assert_eq!(window.index_at_offset(44_999_956.0), Some(999_999));
}

#[test]
fn test_hit_testing() {
    let mut window = AxisWindow::new(SizeEstimator::per_index(|i| 20.0 + i as f32), 0);
    window.compute(10, Some(100.0), 0.0).unwrap();
    // edges: 0, 20, 41, 63
    assert_eq!(window.index_at_offset(0.0), Some(0));
    assert_eq!(window.index_at_offset(40.9), Some(1));
    assert_eq!(window.index_at_offset(41.0), Some(2));
    assert_eq!(window.index_at_offset(-1.0), None);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_fixed_items_contiguous_and_aligned(
        count in 0usize..2_000,
        size in 1u16..100,
        extent in 1.0f32..3_000.0,
        offset in -500.0f32..250_000.0,
        overscan in 0usize..8,
    ) {
        let size = f32::from(size);
        let mut window = AxisWindow::fixed(size, overscan);
        let range = window.compute(count, Some(extent), offset).unwrap();

        prop_assert_eq!(range.total_extent, size * count as f32);
        prop_assert_eq!(range.items.is_empty(), count == 0);
        for item in &range.items {
            prop_assert!(item.index < count);
            prop_assert_eq!(item.start, item.index as f32 * size);
            prop_assert_eq!(item.size, size);
        }
        for pair in range.items.windows(2) {
            prop_assert_eq!(pair[1].index, pair[0].index + 1);
            prop_assert_eq!(pair[1].start, pair[0].end());
        }
    }

    #[test]
    fn prop_variable_items_cover_viewport(
        sizes in proptest::collection::vec(1u8..=60, 1..400),
        extent in 1.0f32..2_000.0,
        offset in 0.0f32..30_000.0,
    ) {
        let table: Vec<f32> = sizes.iter().map(|&s| f32::from(s)).collect();
        let lookup = table.clone();
        let mut window = AxisWindow::new(
            SizeEstimator::per_index(move |i| lookup.get(i).copied().unwrap_or(1.0)),
            2,
        );
        let count = table.len();
        let range = window.compute(count, Some(extent), offset).unwrap();
        let total: f32 = table.iter().sum();
        prop_assert_eq!(range.total_extent, total);

        let mut expected_start = 0.0f32;
        let mut starts = Vec::with_capacity(count);
        for size in &table {
            starts.push(expected_start);
            expected_start += size;
        }
        for item in &range.items {
            prop_assert_eq!(item.start, starts[item.index]);
            prop_assert_eq!(item.size, table[item.index]);
        }

        let clamped = offset.clamp(0.0, (total - extent).max(0.0));
        let (first, last) = range.visible.unwrap();
        let first_item = range.items.iter().find(|i| i.index == first).unwrap();
        let last_item = range.items.iter().find(|i| i.index == last).unwrap();
        prop_assert!(first_item.start <= clamped && clamped < first_item.end());
        prop_assert!(last_item.end() >= (clamped + extent).min(total));
    }

    #[test]
    fn prop_unmeasured_container_is_always_empty(count in 0usize..500, offset in -10.0f32..10_000.0) {
        let mut window = AxisWindow::fixed(45.0, 5);
        prop_assert!(window.compute(count, None, offset).unwrap().items.is_empty());
    }
}
