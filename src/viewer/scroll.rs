//! Scroll container synchronization for `GridView`.
//!
//! The host page owns a native scroll container; its geometry is read back
//! into the engine on every scroll or resize event.

use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use super::GridView;

#[wasm_bindgen]
impl GridView {
    /// Read scroll position and client size from the scroll container.
    ///
    /// A container that is not laid out yet (zero client size) leaves the
    /// viewport unmeasured, so nothing is virtualized until it is.
    #[wasm_bindgen]
    pub fn sync_from_element(&mut self, element: &HtmlElement) -> Result<(), JsValue> {
        let width = element.client_width();
        let height = element.client_height();
        let (width, height) = if width > 0 && height > 0 {
            (width as f32, height as f32)
        } else {
            (f32::NAN, f32::NAN)
        };
        let x = element.scroll_left() as f32;
        let y = element.scroll_top() as f32;

        let mut fetcher = self.fetcher();
        {
            let mut s = self.state.borrow_mut();
            s.engine.resize(width, height, &mut fetcher)?;
            s.engine.set_scroll(x, y, &mut fetcher)?;
        }
        self.request_render();
        Ok(())
    }
}
