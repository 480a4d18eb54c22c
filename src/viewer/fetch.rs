//! Page fetches through a JavaScript `fetchPage(apiPage)` function.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Promise};
use serde_json::Value;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use super::{invoke_render_callback, SharedState};
use crate::error::{GridError, Result};
use crate::fetch::{PageFetcher, PageOutcome, PageRequest, PageResponse};

/// Fetcher that calls into JavaScript and applies the result when the promise settles.
pub(crate) struct JsFetcher {
    fetch_page: Function,
    state: Weak<RefCell<SharedState>>,
}

impl JsFetcher {
    pub(crate) fn new(fetch_page: Function, state: Weak<RefCell<SharedState>>) -> Self {
        Self { fetch_page, state }
    }
}

impl PageFetcher for JsFetcher {
    fn fetch(&mut self, request: PageRequest) {
        let call = match u32::try_from(request.api_page) {
            Ok(api_page) => self
                .fetch_page
                .call1(&JsValue::NULL, &JsValue::from(api_page))
                .map_err(|e| js_error(&e)),
            Err(_) => Err(GridError::Fetch(format!(
                "remote page {} exceeds the JavaScript integer range",
                request.api_page
            ))),
        };

        let fetch_page = self.fetch_page.clone();
        let state = self.state.clone();
        spawn_local(async move {
            let result = match call {
                Ok(value) => await_response(value).await,
                Err(e) => Err(e),
            };
            // Viewer dropped while the fetch was in flight
            let Some(state) = state.upgrade() else {
                return;
            };
            deliver(&state, fetch_page, PageOutcome { request, result });
        });
    }
}

async fn await_response(value: JsValue) -> Result<PageResponse<Value>> {
    let body = JsFuture::from(Promise::resolve(&value))
        .await
        .map_err(|e| js_error(&e))?;
    serde_wasm_bindgen::from_value(body)
        .map_err(|e| GridError::Fetch(format!("malformed page response: {e}")))
}

fn js_error(value: &JsValue) -> GridError {
    GridError::Fetch(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// Apply a completed fetch on the owning thread, then request a render.
fn deliver(state: &Rc<RefCell<SharedState>>, fetch_page: Function, outcome: PageOutcome<Value>) {
    let mut fetcher = JsFetcher::new(fetch_page, Rc::downgrade(state));
    let callback = {
        let mut s = state.borrow_mut();
        if let Err(e) = s.engine.resolve(outcome, &mut fetcher) {
            log::error!("failed to apply page: {e}");
        }
        s.render_callback.clone()
    };
    invoke_render_callback(callback);
}
