use crate::model::{Document, Point, Size};

/// Zoom range shared by the discrete controls and the scroll gesture.
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 3.0;
/// Increment of the zoom-in / zoom-out commands.
pub const ZOOM_STEP: f32 = 0.1;
/// Increment per scroll notch of the modifier+scroll gesture.
pub const GESTURE_ZOOM_STEP: f32 = 0.02;
pub const FIT_PADDING: f32 = 50.0;

/// Pan offset (screen pixels) and zoom factor of the interactive view.
///
/// Screen points are relative to the canvas origin, not the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pan: Point,
    zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Point::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(pan: Point, zoom: f32) -> Self {
        Self {
            pan,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn document_to_screen(&self, p: Point) -> Point {
        p * self.zoom + self.pan
    }

    pub fn screen_to_document(&self, p: Point) -> Point {
        (p - self.pan) / self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    pub fn pan_by(&mut self, delta: Point) {
        self.pan += delta;
    }

    /// Scroll-gesture zoom. A negative `scroll_y` (scrolling up) zooms in. The
    /// document point under `screen_anchor` stays under the pointer.
    pub fn zoom_gesture(&mut self, screen_anchor: Point, scroll_y: f32) {
        if scroll_y == 0.0 {
            return;
        }
        let step = if scroll_y > 0.0 {
            -GESTURE_ZOOM_STEP
        } else {
            GESTURE_ZOOM_STEP
        };
        let before = self.screen_to_document(screen_anchor);
        self.set_zoom(self.zoom + step);
        let after = self.document_to_screen(before);
        self.pan += screen_anchor - after;
    }

    /// Frames every shape (plus [`FIT_PADDING`]) inside a canvas of `canvas`
    /// size without ever magnifying past 100%. Returns `false` for an empty
    /// document, leaving the view untouched.
    pub fn fit_to_view(&mut self, doc: &Document, canvas: Size) -> bool {
        let Some(bounds) = doc.bounds() else {
            return false;
        };
        let padded = bounds.expand(FIT_PADDING);
        let scale_x = canvas.width / padded.width();
        let scale_y = canvas.height / padded.height();
        let zoom = scale_x.min(scale_y).min(1.0);
        if !zoom.is_finite() || zoom <= 0.0 {
            return false;
        }
        self.zoom = clamp_zoom(zoom);
        self.pan = Point::new(-padded.min.x * self.zoom, -padded.min.y * self.zoom);
        tracing::debug!(zoom = self.zoom, "fit to view");
        true
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}
