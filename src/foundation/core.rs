pub use kurbo::{Point, Rect, Vec2};

/// Master artwork canvas dimensions in natural (unscaled) pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Target display area used to derive the screen scale ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Ratio that fits this canvas inside `viewport` without upscaling.
    ///
    /// The smaller of the two axis ratios is used so the whole artwork stays
    /// visible; the result is clamped to at most `1.0` because legacy pieces
    /// were authored at their natural resolution.
    pub fn scale_to_fit(self, viewport: Viewport) -> f64 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        let rw = f64::from(viewport.width) / f64::from(self.width);
        let rh = f64::from(viewport.height) / f64::from(self.height);
        rw.min(rh).min(1.0)
    }
}
