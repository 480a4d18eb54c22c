//! Grid configuration.
//!
//! All values have defaults, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default estimated row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f32 = 45.0;

/// Default estimated column width in pixels.
pub const DEFAULT_COLUMN_WIDTH: f32 = 250.0;

/// Default number of extra items materialized on each side of the visible range.
pub const DEFAULT_OVERSCAN: usize = 5;

/// Offset added to a cache page number to form the remote page number.
pub const DEFAULT_PAGE_BASE: u32 = 1;

/// Tunables for windowing and paging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Records per page
    pub page_size: usize,
    /// Estimated height of every row
    pub row_height: f32,
    /// Estimated width of columns that do not declare their own
    pub column_width: f32,
    /// Extra items rendered before and after the visible range
    pub overscan: usize,
    /// Remote page number of cache page 0 (1 for 1-indexed APIs)
    pub page_base: u32,
    /// Request every page covering the visible range, not only the page at its end
    pub fetch_whole_range: bool,
    /// Failed attempts after which a page is no longer refetched automatically
    pub max_fetch_attempts: Option<u32>,
    /// Loaded pages kept in memory; `None` keeps every page
    pub max_cached_pages: Option<usize>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            row_height: DEFAULT_ROW_HEIGHT,
            column_width: DEFAULT_COLUMN_WIDTH,
            overscan: DEFAULT_OVERSCAN,
            page_base: DEFAULT_PAGE_BASE,
            fetch_whole_range: false,
            max_fetch_attempts: None,
            max_cached_pages: None,
        }
    }
}

impl GridConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would break paging or offset math.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(GridError::Config("page size must be at least 1".into()));
        }
        check_extent("row height", self.row_height)?;
        check_extent("column width", self.column_width)?;
        if self.max_fetch_attempts == Some(0) {
            return Err(GridError::Config(
                "max fetch attempts must be at least 1".into(),
            ));
        }
        if self.max_cached_pages == Some(0) {
            return Err(GridError::Config(
                "max cached pages must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Sizes must be finite and strictly positive.
pub(crate) fn check_extent(what: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GridError::Estimator(format!("{what} must be positive, got {value}")))
    }
}
