//! Sparse page cache with a flattened, index-aligned view.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::ops::{Range, RangeInclusive};

use super::page::{placeholders, Page, PageStatus, Row, Slot};
use crate::error::{GridError, Result};

/// Sparse cache of remote pages keyed by zero-based page number.
///
/// The flattened view is the concatenation of pages in ascending page order.
/// Every page number from 0 up to the highest known page contributes a run of
/// rows, so row indices never shift when pages resolve out of order.
#[derive(Debug)]
pub struct PagedStore<R> {
    page_size: usize,
    pages: BTreeMap<usize, Page<R>>,
    /// Reported total record count; `None` until the first response
    total_size: Option<usize>,
    flattened: OnceCell<Vec<Slot<R>>>,
}

impl<R> PagedStore<R> {
    /// Create an empty store.
    ///
    /// # Errors
    /// Returns [`GridError::Config`] when `page_size` is zero.
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(GridError::Config("page size must be at least 1".into()));
        }
        Ok(Self {
            page_size,
            pages: BTreeMap::new(),
            total_size: None,
            flattened: OnceCell::new(),
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Total size reported by the most recent response.
    pub fn total_size(&self) -> Option<usize> {
        self.total_size
    }

    /// Page number containing a row index.
    pub fn page_of(&self, index: usize) -> usize {
        index / self.page_size
    }

    /// Row indices covered by a page.
    pub fn page_rows(&self, page: usize) -> Range<usize> {
        let start = page.saturating_mul(self.page_size);
        start..start.saturating_add(self.page_size)
    }

    /// Status of a page; pages never seen are `Unrequested`.
    pub fn status(&self, page: usize) -> PageStatus {
        self.pages
            .get(&page)
            .map_or(PageStatus::Unrequested, |p| p.status)
    }

    /// Failed fetch attempts recorded for a page.
    pub fn failures(&self, page: usize) -> u32 {
        self.pages.get(&page).map_or(0, |p| p.failures)
    }

    /// Pages that failed and are waiting to be requested again.
    pub fn failed_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|(_, p)| p.status == PageStatus::Unrequested && p.failures > 0)
            .map(|(&n, _)| n)
            .collect()
    }

    /// Pages with a fetch outstanding.
    pub fn pending_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|(_, p)| p.status == PageStatus::Pending)
            .map(|(&n, _)| n)
            .collect()
    }

    /// Number of rows addressable by the windowing engine.
    ///
    /// The reported total is authoritative once known. Before that, the
    /// placeholder runs of requested pages are counted.
    pub fn row_count(&self) -> usize {
        match self.total_size {
            Some(total) => total,
            None => self.span_len(),
        }
    }

    /// Length of the flattened sequence without building it.
    fn span_len(&self) -> usize {
        let Some((&last, last_page)) = self.pages.last_key_value() else {
            return 0;
        };
        last.saturating_mul(self.page_size)
            .saturating_add(last_page.slots.len())
    }

    fn invalidate(&mut self) {
        self.flattened.take();
    }

    fn check_page(&self, page: usize) -> Result<()> {
        if page.checked_mul(self.page_size).is_none() {
            return Err(GridError::InvalidPageRequest(format!(
                "page {page} overflows the row index space"
            )));
        }
        if let Some(total) = self.total_size {
            let last_page = total.saturating_sub(1) / self.page_size;
            if page > last_page {
                return Err(GridError::InvalidPageRequest(format!(
                    "page {page} is past the last page {last_page} of {total} records"
                )));
            }
        }
        Ok(())
    }

    /// Mark a page as pending and reserve its rows with placeholders.
    ///
    /// Returns `true` when the page moved from `Unrequested` to `Pending`; the
    /// caller issues exactly one fetch for each `true`. Pages already pending or
    /// loaded are left untouched.
    ///
    /// # Errors
    /// Returns [`GridError::InvalidPageRequest`] for pages outside the reported total.
    pub fn request_page(&mut self, page: usize) -> Result<bool> {
        self.check_page(page)?;
        let page_size = self.page_size;
        let transitioned = match self.pages.get_mut(&page) {
            None => {
                self.pages.insert(page, Page::pending(page_size));
                true
            }
            Some(entry) if entry.status == PageStatus::Unrequested => {
                entry.status = PageStatus::Pending;
                entry.slots = placeholders(page_size);
                true
            }
            Some(_) => false,
        };
        if transitioned {
            log::debug!("page {page} pending");
            self.invalidate();
        }
        Ok(transitioned)
    }

    /// Merge a fetched page, replacing its placeholders.
    ///
    /// Safe to call for a page that was never requested. A second call for the
    /// same page overwrites the first.
    ///
    /// # Errors
    /// Returns [`GridError::InvalidPageRequest`] if more than `page_size` records arrive.
    pub fn receive_page(
        &mut self,
        page: usize,
        records: Vec<R>,
        total_size: usize,
    ) -> Result<()> {
        if records.len() > self.page_size {
            return Err(GridError::InvalidPageRequest(format!(
                "page {page} holds {} records, page size is {}",
                records.len(),
                self.page_size
            )));
        }
        if page.checked_mul(self.page_size).is_none() {
            return Err(GridError::InvalidPageRequest(format!(
                "page {page} overflows the row index space"
            )));
        }

        if self.total_size != Some(total_size) {
            log::info!("total size {:?} -> {total_size}", self.total_size);
            self.total_size = Some(total_size);
        }

        let received = records.len();
        let mut slots: Vec<Slot<R>> = records.into_iter().map(Slot::Loaded).collect();
        let is_final = self.page_rows(page).end >= total_size;
        if received < self.page_size && !is_final {
            log::warn!(
                "page {page} returned {received} of {} records before the end of {total_size}; padding",
                self.page_size
            );
            slots.extend(placeholders(self.page_size - received));
        }

        let entry = self.pages.entry(page).or_insert_with(|| Page {
            status: PageStatus::Unrequested,
            slots: Vec::new(),
            failures: 0,
        });
        if entry.status == PageStatus::Success {
            log::debug!("page {page} received again, keeping latest");
        }
        entry.status = PageStatus::Success;
        entry.slots = slots;
        entry.failures = 0;
        log::info!("page {page} loaded with {received} records");

        self.invalidate();
        Ok(())
    }

    /// Record a failed fetch, returning a pending page to `Unrequested`.
    ///
    /// Returns `true` if the page was pending. Loaded pages never regress.
    pub fn fail_page(&mut self, page: usize) -> bool {
        match self.pages.get_mut(&page) {
            Some(entry) if entry.status == PageStatus::Pending => {
                entry.status = PageStatus::Unrequested;
                entry.failures = entry.failures.saturating_add(1);
                log::warn!("page {page} failed ({} attempts)", entry.failures);
                true
            }
            _ => false,
        }
    }

    /// Drop loaded pages until at most `max_loaded` remain.
    ///
    /// Pages inside `keep` and pages still pending are never dropped; the rest
    /// go farthest from `keep` first. A dropped page returns to `Unrequested`
    /// with a placeholder run, so row indices do not move and the page is
    /// fetched again when it comes back into view. Returns the dropped pages.
    pub fn evict(&mut self, max_loaded: usize, keep: RangeInclusive<usize>) -> Vec<usize> {
        let loaded = self
            .pages
            .values()
            .filter(|p| p.status == PageStatus::Success)
            .count();
        if loaded <= max_loaded {
            return Vec::new();
        }
        let excess = loaded - max_loaded;
        let distance = |page: usize| {
            if page < *keep.start() {
                keep.start() - page
            } else {
                page.saturating_sub(*keep.end())
            }
        };
        // (page, distance from the kept range), farthest first
        let mut candidates: Vec<(usize, usize)> = self
            .pages
            .iter()
            .filter(|(_, p)| p.status == PageStatus::Success)
            .map(|(&n, _)| (n, distance(n)))
            .filter(|&(_, d)| d > 0)
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

        let page_size = self.page_size;
        let mut evicted = Vec::with_capacity(excess);
        for (page, _) in candidates.into_iter().take(excess) {
            if let Some(entry) = self.pages.get_mut(&page) {
                entry.status = PageStatus::Unrequested;
                entry.slots = placeholders(page_size);
                entry.failures = 0;
                evicted.push(page);
            }
        }
        if !evicted.is_empty() {
            log::debug!("evicted pages {evicted:?}");
            self.invalidate();
        }
        evicted
    }

    /// Look up a row in O(1).
    pub fn row(&self, index: usize) -> Row<'_, R> {
        if index >= self.row_count() {
            return Row::Missing;
        }
        let page = self.page_of(index);
        let offset = index % self.page_size;
        match self
            .pages
            .get(&page)
            .and_then(|p| p.slots.get(offset))
            .and_then(Slot::record)
        {
            Some(record) => Row::Loaded(record),
            None => Row::Placeholder,
        }
    }

    /// Number of pages in the cache, whatever their status.
    pub fn cached_pages(&self) -> usize {
        self.pages.len()
    }
}

impl<R: Clone> PagedStore<R> {
    /// Concatenate pages in ascending page order.
    ///
    /// Page numbers below the highest known page that were never requested
    /// contribute a full run of placeholders. The result is cached until the
    /// next request or response.
    pub fn flatten(&self) -> &[Slot<R>] {
        self.flattened.get_or_init(|| {
            let mut out = Vec::with_capacity(self.span_len());
            let Some(&last) = self.pages.keys().next_back() else {
                return out;
            };
            for page in 0..=last {
                match self.pages.get(&page) {
                    Some(entry) => out.extend(entry.slots.iter().cloned()),
                    None => out.extend(placeholders(self.page_size)),
                }
            }
            out
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;

    fn records(page: usize, count: usize) -> Vec<u32> {
        (0..count).map(|i| (page * 100 + i) as u32).collect()
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(PagedStore::<u32>::new(0).is_err());
    }

    #[test]
    fn test_request_installs_placeholders() {
        let mut store = PagedStore::<u32>::new(4).unwrap();
        assert!(store.request_page(0).unwrap());
        assert_eq!(store.status(0), PageStatus::Pending);
        assert_eq!(store.flatten().len(), 4);
        assert!(store.flatten().iter().all(Slot::is_placeholder));
        assert_eq!(store.row_count(), 4);
    }

    #[test]
    fn test_request_is_idempotent() {
        let mut store = PagedStore::<u32>::new(4).unwrap();
        assert!(store.request_page(1).unwrap());
        assert!(!store.request_page(1).unwrap());
        assert_eq!(store.pending_pages(), vec![1]);
    }

    #[test]
    fn test_receive_without_request() {
        let mut store = PagedStore::new(4).unwrap();
        store.receive_page(0, records(0, 4), 10).unwrap();
        assert_eq!(store.status(0), PageStatus::Success);
        assert_eq!(store.total_size(), Some(10));
    }

    #[test]
    fn test_success_never_regresses() {
        let mut store = PagedStore::new(4).unwrap();
        store.request_page(0).unwrap();
        store.receive_page(0, records(0, 4), 8).unwrap();
        assert!(!store.request_page(0).unwrap());
        assert!(!store.fail_page(0));
        assert_eq!(store.status(0), PageStatus::Success);
    }

    #[test]
    fn test_failure_resets_to_unrequested() {
        let mut store = PagedStore::<u32>::new(4).unwrap();
        store.request_page(2).unwrap();
        assert!(store.fail_page(2));
        assert_eq!(store.status(2), PageStatus::Unrequested);
        assert_eq!(store.failures(2), 1);
        assert_eq!(store.failed_pages(), vec![2]);
        // Placeholder run keeps indices aligned while waiting for the retry
        assert_eq!(store.flatten().len(), 12);
        assert!(store.request_page(2).unwrap());
        assert!(store.failed_pages().is_empty());
    }

    #[test]
    fn test_gap_is_filled_with_placeholders() {
        let mut store = PagedStore::new(4).unwrap();
        store.receive_page(0, records(0, 4), 12).unwrap();
        store.receive_page(2, records(2, 4), 12).unwrap();
        let flat = store.flatten();
        assert_eq!(flat.len(), 12);
        assert_eq!(flat[8], Slot::Loaded(200));
        assert!(flat[4..8].iter().all(Slot::is_placeholder));
    }

    #[test]
    fn test_short_final_page() {
        let mut store = PagedStore::new(4).unwrap();
        store.receive_page(0, records(0, 4), 6).unwrap();
        store.receive_page(1, records(1, 2), 6).unwrap();
        assert_eq!(store.flatten().len(), 6);
        assert_eq!(store.row(5), Row::Loaded(&101));
        assert_eq!(store.row(6), Row::Missing);
    }

    #[test]
    fn test_short_middle_page_is_padded() {
        let mut store = PagedStore::new(4).unwrap();
        store.receive_page(0, records(0, 3), 20).unwrap();
        store.receive_page(1, records(1, 4), 20).unwrap();
        assert_eq!(store.row(3), Row::Placeholder);
        assert_eq!(store.row(4), Row::Loaded(&100));
    }

    #[test]
    fn test_oversized_page_rejected() {
        let mut store = PagedStore::new(4).unwrap();
        let err = store.receive_page(0, records(0, 5), 20).unwrap_err();
        assert!(matches!(err, GridError::InvalidPageRequest(_)));
        assert_eq!(store.status(0), PageStatus::Unrequested);
    }

    #[test]
    fn test_request_past_total_rejected() {
        let mut store = PagedStore::new(4).unwrap();
        store.receive_page(0, records(0, 4), 10).unwrap();
        assert!(store.request_page(2).unwrap());
        assert!(matches!(
            store.request_page(3).unwrap_err(),
            GridError::InvalidPageRequest(_)
        ));
    }

    #[test]
    fn test_row_count_clamped_to_total() {
        let mut store = PagedStore::<u32>::new(4).unwrap();
        store.request_page(0).unwrap();
        store.request_page(1).unwrap();
        assert_eq!(store.row_count(), 8);
        store.receive_page(0, records(0, 4), 6).unwrap();
        assert_eq!(store.row_count(), 6);
        // Pending tail still over-allocates placeholders in the flattened view
        assert_eq!(store.flatten().len(), 8);
        assert_eq!(store.row(5), Row::Placeholder);
    }

    #[test]
    fn test_flatten_cache_invalidated() {
        let mut store = PagedStore::new(2).unwrap();
        store.request_page(0).unwrap();
        assert!(store.flatten()[0].is_placeholder());
        store.receive_page(0, records(0, 2), 2).unwrap();
        assert_eq!(store.flatten()[0], Slot::Loaded(0));
    }

    #[test]
    fn test_evict_farthest_loaded_pages() {
        let mut store = PagedStore::new(2).unwrap();
        for page in 0..6 {
            store.receive_page(page, records(page, 2), 12).unwrap();
        }
        // Distances from page 3: 0 -> 3, 5 and 1 -> 2
        let evicted = store.evict(3, 3..=3);
        assert_eq!(evicted, vec![0, 5, 1]);
        assert_eq!(store.status(0), PageStatus::Unrequested);
        assert_eq!(store.status(2), PageStatus::Success);
        assert_eq!(store.row(0), Row::Placeholder);
        assert_eq!(store.row(4), Row::Loaded(&200));
        assert_eq!(store.flatten().len(), 12);
        // Evicted pages can be requested again
        assert!(store.request_page(0).unwrap());
    }

    #[test]
    fn test_evict_spares_pending_and_kept_pages() {
        let mut store = PagedStore::new(2).unwrap();
        store.receive_page(0, records(0, 2), 20).unwrap();
        store.receive_page(1, records(1, 2), 20).unwrap();
        store.request_page(9).unwrap();
        assert!(store.evict(0, 0..=1).is_empty());
        assert_eq!(store.evict(1, 0..=0), vec![1]);
        assert_eq!(store.status(9), PageStatus::Pending);
        assert!(store.evict(5, 9..=9).is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = PagedStore::new(2).unwrap();
        store.receive_page(0, vec![1, 2], 4).unwrap();
        store.receive_page(0, vec![3, 4], 4).unwrap();
        assert_eq!(store.row(0), Row::Loaded(&3));
    }
}
