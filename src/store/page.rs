//! Page status and row slot types.

use serde::Serialize;

/// Load status of a single page.
///
/// Transitions are `Unrequested -> Pending -> Success`. A failed fetch moves a
/// page from `Pending` back to `Unrequested`; nothing leaves `Success`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageStatus {
    #[default]
    Unrequested,
    Pending,
    Success,
}

impl PageStatus {
    /// Whether a fetch has been issued or completed for the page.
    pub fn is_requested(self) -> bool {
        !matches!(self, Self::Unrequested)
    }
}

/// One row position in the flattened sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot<R> {
    /// Reserved row whose record has not arrived
    Placeholder,
    /// Resolved record
    Loaded(R),
}

impl<R> Slot<R> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn record(&self) -> Option<&R> {
        match self {
            Self::Loaded(record) => Some(record),
            Self::Placeholder => None,
        }
    }
}

/// Borrowed view of a row, as seen by the render layer.
#[derive(Debug, PartialEq)]
pub enum Row<'a, R> {
    /// Index is past the end of the addressable range
    Missing,
    /// Row is reserved but not resolved
    Placeholder,
    /// Row is resolved
    Loaded(&'a R),
}

impl<R> Row<'_, R> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

/// Cached page entry.
#[derive(Clone, Debug)]
pub(crate) struct Page<R> {
    pub(crate) status: PageStatus,
    pub(crate) slots: Vec<Slot<R>>,
    /// Number of failed fetches since the page was last resolved
    pub(crate) failures: u32,
}

impl<R> Page<R> {
    /// A pending page holding a full run of placeholders.
    pub(crate) fn pending(page_size: usize) -> Self {
        Self {
            status: PageStatus::Pending,
            slots: placeholders(page_size),
            failures: 0,
        }
    }
}

pub(crate) fn placeholders<R>(count: usize) -> Vec<Slot<R>> {
    std::iter::repeat_with(|| Slot::Placeholder)
        .take(count)
        .collect()
}
