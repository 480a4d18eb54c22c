//! Drives page requests from the visible row range.

use std::ops::RangeInclusive;

use super::request::{PageFetcher, PageOutcome, PageRequest};
use crate::config::GridConfig;
use crate::error::Result;
use crate::store::{PageStatus, PagedStore};

/// Decides which pages must be resident and issues at most one fetch per page.
#[derive(Clone, Debug)]
pub struct FetchCoordinator {
    page_base: u32,
    fetch_whole_range: bool,
    max_attempts: Option<u32>,
    max_cached_pages: Option<usize>,
    /// Last row range acted on; identical ranges are ignored
    last_range: Option<(usize, usize)>,
    issued: u64,
}

impl FetchCoordinator {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            page_base: config.page_base,
            fetch_whole_range: config.fetch_whole_range,
            max_attempts: config.max_fetch_attempts,
            max_cached_pages: config.max_cached_pages,
            last_range: None,
            issued: 0,
        }
    }

    /// Number of fetches dispatched so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Forget the last range so the next call re-evaluates it.
    pub fn reset_range(&mut self) {
        self.last_range = None;
    }

    /// Pages that must be resident for an inclusive row range.
    ///
    /// By default only the page holding the last row, `floor(end / page_size)`,
    /// which runs ahead of a forward scroll.
    pub fn target_pages(&self, page_size: usize, range: (usize, usize)) -> RangeInclusive<usize> {
        let page_size = page_size.max(1);
        let (start, end) = range;
        let last = end / page_size;
        let first = if self.fetch_whole_range {
            start.min(end) / page_size
        } else {
            last
        };
        first..=last
    }

    /// React to a change of the visible row range.
    ///
    /// Does nothing when the range equals the previous one. The range is only
    /// remembered once every target page was handled, so a failed call is
    /// re-evaluated next time. Returns the number of fetches issued.
    pub fn on_visible_range<R, F>(
        &mut self,
        store: &mut PagedStore<R>,
        range: Option<(usize, usize)>,
        fetcher: &mut F,
    ) -> Result<usize>
    where
        F: PageFetcher + ?Sized,
    {
        if range == self.last_range {
            return Ok(0);
        }
        let Some(bounds) = range else {
            self.last_range = None;
            return Ok(0);
        };

        let mut issued = 0;
        for page in self.target_pages(store.page_size(), bounds) {
            if !self.may_refetch(store, page) {
                continue;
            }
            if self.ensure_page(store, page, fetcher)? {
                issued += 1;
            }
        }
        self.last_range = range;
        Ok(issued)
    }

    fn may_refetch<R>(&self, store: &PagedStore<R>, page: usize) -> bool {
        let Some(max) = self.max_attempts else {
            return true;
        };
        let failures = store.failures(page);
        if failures >= max {
            log::warn!("page {page} failed {failures} times, not refetching automatically");
            return false;
        }
        true
    }

    /// Request `page` if it is `Unrequested` and dispatch its fetch.
    ///
    /// The status check and the transition to `Pending` happen in one
    /// exclusive borrow of the store, so a page is never fetched twice.
    pub fn ensure_page<R, F>(
        &mut self,
        store: &mut PagedStore<R>,
        page: usize,
        fetcher: &mut F,
    ) -> Result<bool>
    where
        F: PageFetcher + ?Sized,
    {
        let request = PageRequest::new(page, self.page_base)?;
        if !store.request_page(page)? {
            log::debug!("page {page} already {:?}", store.status(page));
            return Ok(false);
        }
        log::debug!("fetching page {page} (remote page {})", request.api_page);
        self.issued += 1;
        fetcher.fetch(request);
        Ok(true)
    }

    /// Apply a completed fetch to the store.
    ///
    /// Fetch failures return the page to `Unrequested` and are not propagated.
    /// When the page cache is bounded, loaded pages far from the last visible
    /// range are evicted afterwards. Returns `true` if the page was loaded.
    ///
    /// # Errors
    /// Returns [`GridError::InvalidPageRequest`](crate::GridError::InvalidPageRequest)
    /// if the response is inconsistent with the page size; the page is reset first.
    pub fn complete<R>(
        &mut self,
        store: &mut PagedStore<R>,
        outcome: PageOutcome<R>,
    ) -> Result<bool> {
        let page = outcome.request.page;
        match outcome.result {
            Ok(response) => {
                if let Err(e) = store.receive_page(page, response.records, response.total_count) {
                    store.fail_page(page);
                    return Err(e);
                }
                if let Some(max) = self.max_cached_pages {
                    let keep = match self.last_range {
                        Some((start, end)) => store.page_of(start)..=store.page_of(end),
                        None => page..=page,
                    };
                    store.evict(max, keep);
                }
                Ok(true)
            }
            Err(e) => {
                log::warn!("fetch of page {page} failed: {e}");
                store.fail_page(page);
                Ok(false)
            }
        }
    }

    /// Re-issue a failed page regardless of the attempt limit.
    pub fn retry<R, F>(
        &mut self,
        store: &mut PagedStore<R>,
        page: usize,
        fetcher: &mut F,
    ) -> Result<bool>
    where
        F: PageFetcher + ?Sized,
    {
        if store.status(page) != PageStatus::Unrequested {
            return Ok(false);
        }
        self.ensure_page(store, page, fetcher)
    }

    /// Retry every failed page. Returns the number of fetches issued.
    pub fn retry_failed<R, F>(
        &mut self,
        store: &mut PagedStore<R>,
        fetcher: &mut F,
    ) -> Result<usize>
    where
        F: PageFetcher + ?Sized,
    {
        let mut issued = 0;
        for page in store.failed_pages() {
            if self.retry(store, page, fetcher)? {
                issued += 1;
            }
        }
        Ok(issued)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn coordinator() -> FetchCoordinator {
        FetchCoordinator::new(&GridConfig::default())
    }

    #[test]
    fn test_target_page_uses_range_end() {
        let c = coordinator();
        assert_eq!(c.target_pages(20, (15, 25)), 1..=1);
        assert_eq!(c.target_pages(20, (0, 19)), 0..=0);
    }

    #[test]
    fn test_whole_range_targets() {
        let config = GridConfig {
            fetch_whole_range: true,
            ..GridConfig::default()
        };
        let c = FetchCoordinator::new(&config);
        assert_eq!(c.target_pages(20, (15, 45)), 0..=2);
    }

    #[test]
    fn test_same_range_is_ignored() {
        let mut c = coordinator();
        let mut store = PagedStore::<u32>::new(20).unwrap();
        let mut calls = Vec::new();
        let mut fetcher = |r: PageRequest| calls.push(r);
        assert_eq!(c.on_visible_range(&mut store, Some((0, 10)), &mut fetcher).unwrap(), 1);
        assert_eq!(c.on_visible_range(&mut store, Some((0, 10)), &mut fetcher).unwrap(), 0);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], PageRequest { page: 0, api_page: 1 });
    }

    #[test]
    fn test_failure_then_scroll_back_refetches() {
        let mut c = coordinator();
        let mut store = PagedStore::<u32>::new(20).unwrap();
        let mut calls = Vec::new();
        let mut fetcher = |r: PageRequest| calls.push(r.page);

        c.on_visible_range(&mut store, Some((0, 10)), &mut fetcher).unwrap();
        let request = PageRequest::new(0, 1).unwrap();
        assert!(!c.complete(&mut store, PageOutcome::failure(request, "offline")).unwrap());
        assert_eq!(store.status(0), PageStatus::Unrequested);

        c.on_visible_range(&mut store, Some((0, 11)), &mut fetcher).unwrap();
        assert_eq!(calls, vec![0, 0]);
    }

    #[test]
    fn test_attempt_limit() {
        let config = GridConfig {
            max_fetch_attempts: Some(1),
            ..GridConfig::default()
        };
        let mut c = FetchCoordinator::new(&config);
        let mut store = PagedStore::<u32>::new(20).unwrap();
        let mut count = 0;
        let mut fetcher = |_: PageRequest| count += 1;

        c.on_visible_range(&mut store, Some((0, 5)), &mut fetcher).unwrap();
        c.complete(&mut store, PageOutcome::failure(PageRequest::new(0, 1).unwrap(), "500"))
            .unwrap();
        c.on_visible_range(&mut store, Some((0, 6)), &mut fetcher).unwrap();
        assert_eq!(c.issued(), 1);

        assert_eq!(c.retry_failed(&mut store, &mut fetcher).unwrap(), 1);
        assert_eq!(store.status(0), PageStatus::Pending);
        drop(fetcher);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_failed_range_is_evaluated_again() {
        let mut c = coordinator();
        let mut store = PagedStore::<u32>::new(20).unwrap();
        let mut calls = Vec::new();
        let mut fetcher = |r: PageRequest| calls.push(r.page);
        store.receive_page(0, vec![0; 20], 20).unwrap();

        // Page 1 is past the reported total
        assert!(c.on_visible_range(&mut store, Some((10, 25)), &mut fetcher).is_err());
        assert!(c.on_visible_range(&mut store, Some((10, 25)), &mut fetcher).is_err());

        // Total grows; the same range now reaches page 1
        store.receive_page(0, vec![0; 20], 40).unwrap();
        assert_eq!(c.on_visible_range(&mut store, Some((10, 25)), &mut fetcher).unwrap(), 1);
        assert_eq!(c.on_visible_range(&mut store, Some((10, 25)), &mut fetcher).unwrap(), 0);
        drop(fetcher);
        assert_eq!(calls, vec![1]);
    }

    #[test]
    fn test_bounded_cache_evicts_far_pages() {
        let config = GridConfig {
            max_cached_pages: Some(2),
            ..GridConfig::default()
        };
        let mut c = FetchCoordinator::new(&config);
        let mut store = PagedStore::<u32>::new(20).unwrap();
        let mut calls = Vec::new();
        let mut fetcher = |r: PageRequest| calls.push(r.page);

        for (range, page) in [((0, 10), 0), ((15, 25), 1), ((35, 45), 2)] {
            c.on_visible_range(&mut store, Some(range), &mut fetcher).unwrap();
            let request = PageRequest::new(page, 1).unwrap();
            c.complete(&mut store, PageOutcome::success(request, 100, vec![7; 20]))
                .unwrap();
        }
        assert_eq!(store.status(0), PageStatus::Unrequested);
        assert_eq!(store.status(1), PageStatus::Success);
        assert_eq!(store.status(2), PageStatus::Success);

        // Scrolling back refetches the evicted page
        c.on_visible_range(&mut store, Some((0, 5)), &mut fetcher).unwrap();
        drop(fetcher);
        assert_eq!(calls, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_oversized_response_resets_page() {
        let mut c = coordinator();
        let mut store = PagedStore::<u32>::new(2).unwrap();
        let request = PageRequest::new(0, 1).unwrap();
        c.ensure_page(&mut store, 0, &mut |_: PageRequest| {}).unwrap();
        let err = c
            .complete(&mut store, PageOutcome::success(request, 10, vec![1, 2, 3]))
            .unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(store.status(0), PageStatus::Unrequested);
    }
}
