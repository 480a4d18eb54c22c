//! pagegrid - windowed virtualization over remotely paginated records
//!
//! Displays a large, remotely paginated record set in a scrollable grid
//! without loading every record and without materializing off-screen cells:
//! - Windowing engine mapping a scroll viewport to visible rows and columns
//! - Sparse page cache with per-page load status and an index-aligned flat view
//! - Fetch coordinator issuing at most one request per page as the viewport moves
//! - WASM binding driving a JavaScript `fetchPage` function
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { GridView } from 'pagegrid';
//! await init();
//! const view = new GridView('{"pageSize": 20}', columnsJson, (page) =>
//!   fetch(`/api/character?page=${page}`).then((r) => r.json()));
//! view.set_render_callback(() => requestAnimationFrame(draw));
//! view.start();
//! container.addEventListener('scroll', () => view.sync_from_element(container));
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod grid;
pub mod layout;
pub mod projection;
pub mod store;

#[cfg(target_arch = "wasm32")]
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use config::GridConfig;
pub use error::{GridError, Result};
pub use fetch::{
    FetchCoordinator, PageFetcher, PageInbox, PageOutcome, PageRequest, PageResponse, PageSender,
};
pub use grid::{Frame, GridEngine};
pub use layout::{AxisRange, AxisWindow, SizeEstimator, Viewport, VirtualItem};
pub use projection::{CellValue, Column, FieldAccess, FieldPath};
pub use store::{PageStatus, PagedStore, Row, Slot};

#[cfg(target_arch = "wasm32")]
pub use viewer::GridView;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
