//! Windowing along a single axis.
//!
//! An [`AxisWindow`] maps a scroll offset and a container extent to the run of
//! item indices that intersect the viewport, plus their pixel offsets. Item
//! edges are kept as a prefix-sum table so offset lookups are O(log n).
//! Rows, columns and header columns each use their own instance.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::check_extent;
use crate::error::{GridError, Result};

/// Per-index size estimate for one axis.
#[derive(Clone)]
pub enum SizeEstimator {
    /// Every item has the same size
    Fixed(f32),
    /// Size computed per item index
    PerIndex(Arc<dyn Fn(usize) -> f32 + Send + Sync>),
}

impl SizeEstimator {
    /// Build an estimator from a closure.
    pub fn per_index(f: impl Fn(usize) -> f32 + Send + Sync + 'static) -> Self {
        Self::PerIndex(Arc::new(f))
    }

    /// Estimated size of the item at `index`.
    ///
    /// # Errors
    /// Returns [`GridError::Estimator`] when the estimate is not a positive finite number.
    pub fn estimate(&self, index: usize) -> Result<f32> {
        let size = match self {
            Self::Fixed(size) => *size,
            Self::PerIndex(f) => f(index),
        };
        check_extent(&format!("size of item {index}"), size)?;
        Ok(size)
    }
}

impl fmt::Debug for SizeEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(size) => f.debug_tuple("Fixed").field(size).finish(),
            Self::PerIndex(_) => f.write_str("PerIndex(..)"),
        }
    }
}

/// A single item currently in view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VirtualItem {
    /// Item index along the axis
    pub index: usize,
    /// Offset of the item's leading edge
    pub start: f32,
    /// Item extent along the axis
    pub size: f32,
}

impl VirtualItem {
    /// Offset of the trailing edge.
    pub fn end(&self) -> f32 {
        self.start + self.size
    }
}

/// Result of windowing one axis for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisRange {
    /// Items to materialize, overscan included, in ascending index order
    pub items: Vec<VirtualItem>,
    /// Sum of all item sizes, for scrollbar sizing
    pub total_extent: f32,
    /// Strictly visible index range (inclusive), without overscan
    pub visible: Option<(usize, usize)>,
}

impl AxisRange {
    fn empty(total_extent: f32) -> Self {
        Self {
            items: Vec::new(),
            total_extent,
            visible: None,
        }
    }

    /// Inclusive index range of the materialized items.
    pub fn index_range(&self) -> Option<(usize, usize)> {
        let first = self.items.first()?;
        let last = self.items.last()?;
        Some((first.index, last.index))
    }

    /// Whether nothing is materialized.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Windowing engine for one axis.
#[derive(Clone, Debug)]
pub struct AxisWindow {
    estimator: SizeEstimator,
    overscan: usize,
    /// `positions[i]` = leading edge of item i; one trailing entry for the final edge.
    /// Accumulated in f64 so long lists keep exact edges past f32's integer range.
    positions: Vec<f64>,
}

impl AxisWindow {
    /// Create a window with the given estimator and overscan margin.
    pub fn new(estimator: SizeEstimator, overscan: usize) -> Self {
        Self {
            estimator,
            overscan,
            positions: vec![0.0],
        }
    }

    /// Window whose items all share one size.
    pub fn fixed(size: f32, overscan: usize) -> Self {
        Self::new(SizeEstimator::Fixed(size), overscan)
    }

    /// Overscan margin in items.
    pub fn overscan(&self) -> usize {
        self.overscan
    }

    /// Number of items the position table currently covers.
    fn known_count(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }

    /// Grow or shrink the position table to exactly `count` items.
    fn ensure(&mut self, count: usize) -> Result<()> {
        if self.positions.is_empty() {
            self.positions.push(0.0);
        }
        let known = self.known_count();
        match count.cmp(&known) {
            Ordering::Less => self.positions.truncate(count + 1),
            Ordering::Equal => {}
            Ordering::Greater => {
                let mut edge = self.positions.last().copied().unwrap_or(0.0);
                self.positions.reserve(count - known);
                for index in known..count {
                    edge += f64::from(self.estimator.estimate(index)?);
                    self.positions.push(edge);
                }
            }
        }
        Ok(())
    }

    /// Sum of estimated sizes for `count` items.
    pub fn total_extent(&mut self, count: usize) -> Result<f32> {
        self.ensure(count)?;
        Ok(narrow(self.positions.last().copied().unwrap_or(0.0)))
    }

    /// Leading edge of `index` given `count` items, or `None` when out of range.
    pub fn offset_of(&mut self, index: usize, count: usize) -> Result<Option<f32>> {
        if index >= count {
            return Ok(None);
        }
        self.ensure(count)?;
        Ok(self.positions.get(index).copied().map(narrow))
    }

    /// Find the item at an offset among the items laid out by the last call (binary search).
    pub fn index_at_offset(&self, offset: f32) -> Option<usize> {
        let count = self.known_count();
        let offset = f64::from(offset);
        if count == 0 || !(0.0..self.positions.last().copied().unwrap_or(0.0)).contains(&offset) {
            return None;
        }
        Some(self.index_at(offset, count))
    }

    /// Largest index whose leading edge is at or before `offset`.
    fn index_at(&self, offset: f64, count: usize) -> usize {
        let starts = self.positions.get(..count).unwrap_or(&self.positions);
        let index = match starts
            .binary_search_by(|pos| pos.partial_cmp(&offset).unwrap_or(Ordering::Equal))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        index.min(count.saturating_sub(1))
    }

    /// Last index whose leading edge lies strictly before `offset`.
    fn last_index_before(&self, offset: f64, count: usize) -> usize {
        let starts = self.positions.get(..count).unwrap_or(&self.positions);
        starts
            .partition_point(|&pos| pos < offset)
            .saturating_sub(1)
            .min(count.saturating_sub(1))
    }

    fn item(&self, index: usize) -> Option<VirtualItem> {
        let start = self.positions.get(index).copied()?;
        let end = self.positions.get(index + 1).copied()?;
        Some(VirtualItem {
            index,
            start: narrow(start),
            size: narrow(end - start),
        })
    }

    /// Compute the items intersecting `[offset, offset + extent]`, extended by overscan.
    ///
    /// `extent` is `None` while the container has not been measured; the result is
    /// then empty. The offset is clamped to the scrollable range.
    ///
    /// # Errors
    /// Returns [`GridError::Estimator`] if the estimator yields an invalid size.
    pub fn compute(&mut self, count: usize, extent: Option<f32>, offset: f32) -> Result<AxisRange> {
        self.ensure(count)?;
        let total = self.positions.last().copied().unwrap_or(0.0);
        let total_extent = narrow(total);
        let Some(extent) = extent.filter(|e| e.is_finite() && *e > 0.0).map(f64::from) else {
            return Ok(AxisRange::empty(total_extent));
        };
        if count == 0 {
            return Ok(AxisRange::empty(total_extent));
        }

        let max_offset = (total - extent).max(0.0);
        let offset = if offset.is_finite() {
            f64::from(offset).clamp(0.0, max_offset)
        } else {
            0.0
        };

        let first = self.index_at(offset, count);
        let last = self.last_index_before(offset + extent, count).max(first);
        let start = first.saturating_sub(self.overscan);
        let end = last.saturating_add(self.overscan).min(count - 1);

        let items: Vec<VirtualItem> = (start..=end).filter_map(|i| self.item(i)).collect();
        if items.len() != end - start + 1 {
            return Err(GridError::Other(format!(
                "position table out of sync for items {start}..={end}"
            )));
        }

        Ok(AxisRange {
            items,
            total_extent,
            visible: Some((first, last)),
        })
    }
}

/// Narrow an edge for the render layer.
#[allow(clippy::cast_possible_truncation)]
fn narrow(edge: f64) -> f32 {
    edge as f32
}
