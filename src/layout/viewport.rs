//! Viewport state management for scrolling.

/// Viewport state - the visible area of the grid body
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Horizontal scroll position in content coordinates
    pub scroll_x: f32,
    /// Vertical scroll position in content coordinates
    pub scroll_y: f32,
    /// Container width in pixels, `None` until measured
    pub width: Option<f32>,
    /// Container height in pixels, `None` until measured
    pub height: Option<f32>,
}

impl Viewport {
    /// Create an unmeasured viewport scrolled to the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with known container dimensions
    pub fn measured(width: f32, height: f32) -> Self {
        let mut viewport = Self::new();
        viewport.resize(width, height);
        viewport
    }

    /// Whether both dimensions have been measured
    pub fn is_measured(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// Resize the viewport. Non-finite or negative sizes count as unmeasured.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = measured_extent(width);
        self.height = measured_extent(height);
    }

    /// Clamp scroll position to the scrollable range of the content.
    pub fn clamp_scroll(&mut self, total_width: f32, total_height: f32) {
        let max_x = (total_width - self.width.unwrap_or(0.0)).max(0.0);
        let max_y = (total_height - self.height.unwrap_or(0.0)).max(0.0);
        self.scroll_x = sanitize(self.scroll_x).clamp(0.0, max_x);
        self.scroll_y = sanitize(self.scroll_y).clamp(0.0, max_y);
    }

    /// Scroll by delta amounts. Returns true if the position changed.
    pub fn scroll_by(
        &mut self,
        delta_x: f32,
        delta_y: f32,
        total_width: f32,
        total_height: f32,
    ) -> bool {
        self.set_scroll(
            self.scroll_x + delta_x,
            self.scroll_y + delta_y,
            total_width,
            total_height,
        )
    }

    /// Set absolute scroll position. Returns true if the position changed.
    pub fn set_scroll(&mut self, x: f32, y: f32, total_width: f32, total_height: f32) -> bool {
        let (old_x, old_y) = (self.scroll_x, self.scroll_y);
        self.scroll_x = x;
        self.scroll_y = y;
        self.clamp_scroll(total_width, total_height);
        (self.scroll_x - old_x).abs() > f32::EPSILON || (self.scroll_y - old_y).abs() > f32::EPSILON
    }

    /// Convert content coordinates to screen coordinates
    pub fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.scroll_x, y - self.scroll_y)
    }

    /// Convert screen coordinates to content coordinates
    pub fn to_content(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        (screen_x + self.scroll_x, screen_y + self.scroll_y)
    }
}

fn measured_extent(value: f32) -> Option<f32> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unmeasured() {
        let viewport = Viewport::new();
        assert!(!viewport.is_measured());
        assert_eq!(viewport.scroll_y, 0.0);
    }

    #[test]
    fn test_resize_rejects_nan() {
        let mut viewport = Viewport::measured(800.0, 600.0);
        assert!(viewport.is_measured());
        viewport.resize(f32::NAN, 600.0);
        assert_eq!(viewport.width, None);
        assert_eq!(viewport.height, Some(600.0));
    }

    #[test]
    fn test_clamp_scroll() {
        let mut viewport = Viewport::measured(500.0, 450.0);
        assert!(viewport.set_scroll(10_000.0, 10_000.0, 1250.0, 4500.0));
        assert_eq!(viewport.scroll_x, 750.0);
        assert_eq!(viewport.scroll_y, 4050.0);

        assert!(viewport.scroll_by(-10_000.0, -50.0, 1250.0, 4500.0));
        assert_eq!(viewport.scroll_x, 0.0);
        assert_eq!(viewport.scroll_y, 4000.0);
    }

    #[test]
    fn test_unchanged_scroll_reports_false() {
        let mut viewport = Viewport::measured(500.0, 450.0);
        assert!(!viewport.set_scroll(0.0, -20.0, 1250.0, 4500.0));
    }

    #[test]
    fn test_content_smaller_than_viewport() {
        let mut viewport = Viewport::measured(500.0, 450.0);
        viewport.set_scroll(30.0, 30.0, 250.0, 90.0);
        assert_eq!((viewport.scroll_x, viewport.scroll_y), (0.0, 0.0));
    }

    #[test]
    fn test_coordinate_round_trip() {
        let mut viewport = Viewport::measured(500.0, 450.0);
        viewport.set_scroll(100.0, 200.0, 5000.0, 5000.0);
        assert_eq!(viewport.to_screen(150.0, 260.0), (50.0, 60.0));
        assert_eq!(viewport.to_content(50.0, 60.0), (150.0, 260.0));
    }
}
