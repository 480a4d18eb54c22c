//! Windowing engine for computing visible rows and columns.
//!
//! This module handles:
//! - Prefix-sum item positions from per-index size estimates
//! - Binary search from a scroll offset to the first visible item
//! - Overscanned visible ranges per axis
//! - Viewport scroll state and clamping

mod axis;
mod viewport;

pub use axis::{AxisRange, AxisWindow, SizeEstimator, VirtualItem};
pub use viewport::Viewport;
