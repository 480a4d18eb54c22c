//! Main GridView struct - the JavaScript entry point for the grid engine.
//!
//! This module provides the WASM-exported `GridView` struct that handles:
//! - Building the engine from JSON configuration and column definitions
//! - Forwarding resize and scroll events to the windowing engine
//! - Dispatching page fetches to a JavaScript `fetchPage(apiPage)` function
//! - Handing frames and cell values to the JavaScript render layer
//!
//! All engine state lives behind one `Rc<RefCell<..>>`; fetch completions are
//! applied on the same thread when their promise resolves.

mod fetch;
mod scroll;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::config::GridConfig;
use crate::grid::GridEngine;
use crate::projection::columns_from_json;
use crate::store::PageStatus;

use fetch::JsFetcher;

/// State shared with pending fetch futures
pub(crate) struct SharedState {
    pub(crate) engine: GridEngine<Value>,
    pub(crate) render_callback: Option<Function>,
}

/// The grid view exported to JavaScript
#[wasm_bindgen]
pub struct GridView {
    state: Rc<RefCell<SharedState>>,
    fetch_page: Function,
}

#[wasm_bindgen]
impl GridView {
    /// Create a grid view.
    ///
    /// `fetch_page` is called with the remote page number and must return a
    /// promise of `{ totalCount, records }`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: &str,
        columns_json: &str,
        fetch_page: Function,
    ) -> Result<GridView, JsValue> {
        console_error_panic_hook::set_once();

        let config = if config_json.trim().is_empty() {
            GridConfig::default()
        } else {
            GridConfig::from_json(config_json)?
        };
        let columns = columns_from_json(columns_json)?;
        let engine = GridEngine::new(config, columns)?;

        Ok(GridView {
            state: Rc::new(RefCell::new(SharedState {
                engine,
                render_callback: None,
            })),
            fetch_page,
        })
    }

    fn fetcher(&self) -> JsFetcher {
        JsFetcher::new(self.fetch_page.clone(), Rc::downgrade(&self.state))
    }

    /// Request the first page.
    #[wasm_bindgen]
    pub fn start(&mut self) -> Result<bool, JsValue> {
        let mut fetcher = self.fetcher();
        let started = self.state.borrow_mut().engine.start(&mut fetcher)?;
        Ok(started)
    }

    /// Resize the scroll container
    #[wasm_bindgen]
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), JsValue> {
        let mut fetcher = self.fetcher();
        self.state
            .borrow_mut()
            .engine
            .resize(width, height, &mut fetcher)?;
        self.request_render();
        Ok(())
    }

    /// Set absolute scroll position
    #[wasm_bindgen]
    pub fn set_scroll(&mut self, x: f32, y: f32) -> Result<(), JsValue> {
        let mut fetcher = self.fetcher();
        self.state.borrow_mut().engine.set_scroll(x, y, &mut fetcher)?;
        self.request_render();
        Ok(())
    }

    /// Scroll by delta amounts
    #[wasm_bindgen]
    pub fn scroll(&mut self, delta_x: f32, delta_y: f32) -> Result<(), JsValue> {
        let mut fetcher = self.fetcher();
        self.state
            .borrow_mut()
            .engine
            .scroll_by(delta_x, delta_y, &mut fetcher)?;
        self.request_render();
        Ok(())
    }

    /// Scroll so that a row is at the top of the viewport
    #[wasm_bindgen]
    pub fn scroll_to_row(&mut self, row: usize) -> Result<(), JsValue> {
        let mut fetcher = self.fetcher();
        self.state
            .borrow_mut()
            .engine
            .scroll_to_row(row, &mut fetcher)?;
        self.request_render();
        Ok(())
    }

    /// Visible rows, columns and headers with their offsets.
    #[wasm_bindgen]
    pub fn frame(&mut self) -> Result<JsValue, JsValue> {
        let frame = self.state.borrow_mut().engine.frame()?;
        serde_wasm_bindgen::to_value(&frame)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Value of one cell: `{ kind: "placeholder" | "empty" | "text", value? }`.
    #[wasm_bindgen]
    pub fn cell(&self, row: usize, col: usize) -> Result<JsValue, JsValue> {
        let value = self.state.borrow().engine.cell(row, col);
        serde_wasm_bindgen::to_value(&value)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Header label of a column
    #[wasm_bindgen]
    pub fn header(&self, col: usize) -> Option<String> {
        self.state.borrow().engine.header(col).map(str::to_string)
    }

    /// Addressable row count
    #[wasm_bindgen]
    pub fn row_count(&self) -> usize {
        self.state.borrow().engine.row_count()
    }

    /// Total size reported by the remote source, if any response arrived
    #[wasm_bindgen]
    pub fn total_size(&self) -> Option<usize> {
        self.state.borrow().engine.store().total_size()
    }

    /// Load status of a page: `UNREQUESTED`, `PENDING` or `SUCCESS`
    #[wasm_bindgen]
    pub fn page_status(&self, page: usize) -> String {
        match self.state.borrow().engine.store().status(page) {
            PageStatus::Unrequested => "UNREQUESTED",
            PageStatus::Pending => "PENDING",
            PageStatus::Success => "SUCCESS",
        }
        .to_string()
    }

    /// Re-request every page whose fetch failed. Returns the number of fetches issued.
    #[wasm_bindgen]
    pub fn retry_failed(&mut self) -> Result<usize, JsValue> {
        let mut fetcher = self.fetcher();
        let issued = self.state.borrow_mut().engine.retry_failed(&mut fetcher)?;
        Ok(issued)
    }

    /// Register a JS callback to request a render on the next animation frame.
    #[wasm_bindgen]
    pub fn set_render_callback(&mut self, callback: Option<Function>) {
        self.state.borrow_mut().render_callback = callback;
    }

    fn request_render(&self) {
        let callback = self.state.borrow().render_callback.clone();
        invoke_render_callback(callback);
    }
}

pub(crate) fn invoke_render_callback(callback: Option<Function>) {
    if let Some(callback) = callback {
        let _ = callback.call0(&JsValue::NULL);
    }
}
