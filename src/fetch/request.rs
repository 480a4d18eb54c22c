//! Page fetch request and response shapes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// A fetch the coordinator wants issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Zero-based page number in the local cache
    pub page: usize,
    /// Page number sent to the remote source (`page + page_base`)
    pub api_page: u64,
}

impl PageRequest {
    /// Build a request, applying the remote page offset.
    ///
    /// # Errors
    /// Returns [`GridError::InvalidPageRequest`] if the remote page number overflows.
    pub fn new(page: usize, page_base: u32) -> Result<Self> {
        let api_page = u64::try_from(page)
            .ok()
            .and_then(|p| p.checked_add(u64::from(page_base)))
            .ok_or_else(|| {
                GridError::InvalidPageRequest(format!("page {page} has no remote page number"))
            })?;
        Ok(Self { page, api_page })
    }
}

/// One page of records as returned by the remote source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<R> {
    /// Total number of records available remotely
    #[serde(alias = "count")]
    pub total_count: usize,
    /// Records of the page, in order
    #[serde(alias = "results")]
    pub records: Vec<R>,
}

impl<R: DeserializeOwned> PageResponse<R> {
    /// Decode a response body.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Completed fetch, successful or not.
#[derive(Debug)]
pub struct PageOutcome<R> {
    pub request: PageRequest,
    pub result: Result<PageResponse<R>>,
}

impl<R> PageOutcome<R> {
    pub fn success(request: PageRequest, total_count: usize, records: Vec<R>) -> Self {
        Self {
            request,
            result: Ok(PageResponse {
                total_count,
                records,
            }),
        }
    }

    pub fn failure(request: PageRequest, message: impl Into<String>) -> Self {
        Self {
            request,
            result: Err(GridError::Fetch(message.into())),
        }
    }
}

/// Remote data source collaborator.
///
/// `fetch` is fire-and-forget: the implementation starts the request and later
/// hands a [`PageOutcome`] back to the owner of the store.
pub trait PageFetcher {
    fn fetch(&mut self, request: PageRequest);
}

impl<F: FnMut(PageRequest)> PageFetcher for F {
    fn fetch(&mut self, request: PageRequest) {
        self(request);
    }
}
