//! Structured error types for pagegrid.
//!
//! Fetch failures are recoverable and never leave the fetch coordinator; the
//! remaining variants indicate a broken integration and are surfaced to the caller.

/// All errors that can occur while windowing, paging and fetching.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Network or decode failure reported by the remote data source.
    #[error("Page fetch failed: {0}")]
    Fetch(String),

    /// Page number out of range or page contents inconsistent with the page size.
    #[error("Invalid page request: {0}")]
    InvalidPageRequest(String),

    /// Size estimator produced a non-positive or non-finite extent.
    #[error("Size estimator failed: {0}")]
    Estimator(String),

    /// Invalid grid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl GridError {
    /// Whether the error can be retried by re-requesting the page.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

impl From<String> for GridError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fetch_is_recoverable() {
        assert!(GridError::Fetch("timeout".into()).is_recoverable());
        assert!(!GridError::Estimator("size 0".into()).is_recoverable());
        assert!(!GridError::InvalidPageRequest("page -1".into()).is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = GridError::InvalidPageRequest("page 3 has 21 records".into());
        assert_eq!(err.to_string(), "Invalid page request: page 3 has 21 records");
        let err: GridError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
