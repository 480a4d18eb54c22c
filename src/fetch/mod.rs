//! Fetch coordination.
//!
//! Translates visible row ranges into page requests, dispatches them to a
//! [`PageFetcher`], and merges completed fetches back into the store.

mod coordinator;
mod inbox;
mod request;

pub use coordinator::FetchCoordinator;
pub use inbox::{PageInbox, PageSender};
pub use request::{PageFetcher, PageOutcome, PageRequest, PageResponse};
