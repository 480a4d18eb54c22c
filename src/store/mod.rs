//! Paged data store.
//!
//! Holds the sparse, page-keyed record cache, the per-page load status, and
//! the flattened view consumed by the render layer.

mod page;
mod paged;

pub use page::{PageStatus, Row, Slot};
pub use paged::PagedStore;
