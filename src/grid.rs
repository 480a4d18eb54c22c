//! Grid engine tying windowing, paging and fetch coordination together.
//!
//! The engine owns all mutable state and is driven by explicit events:
//! resize, scroll, and fetch completion. Each event recomputes the visible
//! row range and lets the coordinator request whatever page it needs.

use serde::Serialize;

use crate::config::{check_extent, GridConfig};
use crate::error::Result;
use crate::fetch::{FetchCoordinator, PageFetcher, PageInbox, PageOutcome};
use crate::layout::{AxisWindow, SizeEstimator, Viewport, VirtualItem};
use crate::projection::{resolve_cell, CellValue, Column, FieldAccess};
use crate::store::PagedStore;

/// Everything the render layer needs for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Height of the scrollable body
    pub total_row_extent: f32,
    /// Width of the scrollable body
    pub total_column_extent: f32,
    /// Rows to materialize
    pub rows: Vec<VirtualItem>,
    /// Body columns to materialize
    pub columns: Vec<VirtualItem>,
    /// Header cells to materialize
    pub headers: Vec<VirtualItem>,
    /// Addressable row count
    pub row_count: usize,
}

/// Windowed, paged grid over remote records of type `R`.
#[derive(Debug)]
pub struct GridEngine<R> {
    config: GridConfig,
    viewport: Viewport,
    rows: AxisWindow,
    columns: AxisWindow,
    headers: AxisWindow,
    column_defs: Vec<Column>,
    store: PagedStore<R>,
    coordinator: FetchCoordinator,
}

impl<R> GridEngine<R> {
    /// Create an engine for the given columns.
    ///
    /// # Errors
    /// Returns a configuration or estimator error if any size is invalid.
    pub fn new(config: GridConfig, columns: Vec<Column>) -> Result<Self> {
        config.validate()?;
        let widths: Vec<f32> = columns
            .iter()
            .map(|c| c.width.unwrap_or(config.column_width))
            .collect();
        for (column, width) in columns.iter().zip(&widths) {
            check_extent(&format!("width of column {:?}", column.id), *width)?;
        }
        let default_width = config.column_width;
        let column_estimator = SizeEstimator::per_index(move |i| {
            widths.get(i).copied().unwrap_or(default_width)
        });

        Ok(Self {
            viewport: Viewport::new(),
            rows: AxisWindow::fixed(config.row_height, config.overscan),
            columns: AxisWindow::new(column_estimator.clone(), config.overscan),
            headers: AxisWindow::new(column_estimator, config.overscan),
            column_defs: columns,
            store: PagedStore::new(config.page_size)?,
            coordinator: FetchCoordinator::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn store(&self) -> &PagedStore<R> {
        &self.store
    }

    pub fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }

    pub fn columns(&self) -> &[Column] {
        &self.column_defs
    }

    /// Rows addressable by the windowing engine.
    pub fn row_count(&self) -> usize {
        self.store.row_count()
    }

    /// Header label of a column.
    pub fn header(&self, col: usize) -> Option<&str> {
        self.column_defs.get(col).map(Column::label)
    }

    /// Issue the first page request if nothing is known yet.
    pub fn start<F: PageFetcher + ?Sized>(&mut self, fetcher: &mut F) -> Result<bool> {
        let started = self.store.total_size().is_none()
            && self.store.cached_pages() == 0
            && self.coordinator.ensure_page(&mut self.store, 0, fetcher)?;
        self.refresh(fetcher)?;
        Ok(started)
    }

    fn total_extents(&mut self) -> Result<(f32, f32)> {
        let width = self.columns.total_extent(self.column_defs.len())?;
        let height = self.rows.total_extent(self.store.row_count())?;
        Ok((width, height))
    }

    /// Overscanned row range currently materialized.
    pub fn visible_rows(&mut self) -> Result<Option<(usize, usize)>> {
        let range = self.rows.compute(
            self.store.row_count(),
            self.viewport.height,
            self.viewport.scroll_y,
        )?;
        Ok(range.index_range())
    }

    /// Recompute the row range and fetch whatever page it needs.
    ///
    /// Returns the number of fetches issued.
    pub fn refresh<F: PageFetcher + ?Sized>(&mut self, fetcher: &mut F) -> Result<usize> {
        let range = self.visible_rows()?;
        self.coordinator
            .on_visible_range(&mut self.store, range, fetcher)
    }

    /// Container was measured or resized.
    pub fn resize<F: PageFetcher + ?Sized>(
        &mut self,
        width: f32,
        height: f32,
        fetcher: &mut F,
    ) -> Result<usize> {
        self.viewport.resize(width, height);
        let (total_width, total_height) = self.total_extents()?;
        self.viewport.clamp_scroll(total_width, total_height);
        self.refresh(fetcher)
    }

    /// Scroll to an absolute position.
    pub fn set_scroll<F: PageFetcher + ?Sized>(
        &mut self,
        x: f32,
        y: f32,
        fetcher: &mut F,
    ) -> Result<usize> {
        let (total_width, total_height) = self.total_extents()?;
        if !self.viewport.set_scroll(x, y, total_width, total_height) {
            return Ok(0);
        }
        self.refresh(fetcher)
    }

    /// Scroll by a delta.
    pub fn scroll_by<F: PageFetcher + ?Sized>(
        &mut self,
        delta_x: f32,
        delta_y: f32,
        fetcher: &mut F,
    ) -> Result<usize> {
        let (x, y) = (self.viewport.scroll_x, self.viewport.scroll_y);
        self.set_scroll(x + delta_x, y + delta_y, fetcher)
    }

    /// Scroll so that `row` is at the top of the viewport.
    pub fn scroll_to_row<F: PageFetcher + ?Sized>(
        &mut self,
        row: usize,
        fetcher: &mut F,
    ) -> Result<usize> {
        let count = self.store.row_count();
        let Some(y) = self.rows.offset_of(row, count)? else {
            return Ok(0);
        };
        let x = self.viewport.scroll_x;
        self.set_scroll(x, y, fetcher)
    }

    /// Apply a completed fetch and re-evaluate the visible range.
    ///
    /// Returns `true` if the page loaded.
    pub fn resolve<F: PageFetcher + ?Sized>(
        &mut self,
        outcome: PageOutcome<R>,
        fetcher: &mut F,
    ) -> Result<bool> {
        let loaded = self.coordinator.complete(&mut self.store, outcome)?;
        let (total_width, total_height) = self.total_extents()?;
        self.viewport.clamp_scroll(total_width, total_height);
        self.refresh(fetcher)?;
        Ok(loaded)
    }

    /// Apply every outcome waiting in an inbox. Returns the number applied.
    pub fn drain<F: PageFetcher + ?Sized>(
        &mut self,
        inbox: &PageInbox<R>,
        fetcher: &mut F,
    ) -> Result<usize> {
        let outcomes = inbox.drain();
        let count = outcomes.len();
        for outcome in outcomes {
            self.resolve(outcome, fetcher)?;
        }
        Ok(count)
    }

    /// Re-request every page whose fetch failed.
    pub fn retry_failed<F: PageFetcher + ?Sized>(&mut self, fetcher: &mut F) -> Result<usize> {
        self.coordinator.retry_failed(&mut self.store, fetcher)
    }

    /// Compute the visible rows, columns and header cells.
    pub fn frame(&mut self) -> Result<Frame> {
        let row_count = self.store.row_count();
        let col_count = self.column_defs.len();
        let rows = self
            .rows
            .compute(row_count, self.viewport.height, self.viewport.scroll_y)?;
        let columns =
            self.columns
                .compute(col_count, self.viewport.width, self.viewport.scroll_x)?;
        let headers =
            self.headers
                .compute(col_count, self.viewport.width, self.viewport.scroll_x)?;
        Ok(Frame {
            total_row_extent: rows.total_extent,
            total_column_extent: columns.total_extent,
            rows: rows.items,
            columns: columns.items,
            headers: headers.items,
            row_count,
        })
    }
}

impl<R: FieldAccess> GridEngine<R> {
    /// Resolve one cell in O(1).
    pub fn cell(&self, row: usize, col: usize) -> CellValue {
        match self.column_defs.get(col) {
            Some(column) => resolve_cell(&self.store.row(row), column),
            None => CellValue::Empty,
        }
    }
}
