//! Pan/zoom transform between image space and canvas space.
//!
//! `canvas = image * scale - offset`. The offset is expressed in canvas pixels.

use crate::foundation::core::{Affine, ImageSize, Point, Vec2};

/// Viewport camera of one view.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    scale: f64,
    offset: Vec2,
    width: f64,
    height: f64,
    image: ImageSize,
    max_scale: f64,
    visibility_margin: f64,
    closing_distance: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            width: 1.0,
            height: 1.0,
            image: ImageSize::new(1, 1),
            max_scale: 50.0,
            visibility_margin: 20.0,
            closing_distance: 8.0,
        }
    }
}

impl Camera {
    /// Camera over a `width` x `height` canvas.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            ..Self::default()
        }
    }

    /// Same camera with different limits.
    pub fn with_limits(mut self, max_scale: f64, visibility_margin: f64, closing_distance: f64) -> Self {
        self.max_scale = max_scale;
        self.visibility_margin = visibility_margin;
        self.closing_distance = closing_distance;
        self
    }

    /// Current magnification.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current offset in canvas pixels.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Move the viewport without clamping.
    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Canvas size in pixels.
    pub fn canvas_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Image being looked at.
    pub fn image(&self) -> ImageSize {
        self.image
    }

    /// Resize the canvas.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    /// Switch to another image, optionally fitting it to the canvas.
    pub fn set_image(&mut self, image: ImageSize, reset_zoom: bool) {
        self.image = ImageSize::new(image.width.max(1), image.height.max(1));
        if reset_zoom {
            self.scale_to_fit();
        }
    }

    fn ratios(&self) -> (f64, f64) {
        (
            self.width / f64::from(self.image.width),
            self.height / f64::from(self.image.height),
        )
    }

    /// Scale at which the whole image fits the canvas.
    pub fn scale_to_fit_value(&self) -> f64 {
        let (w, h) = self.ratios();
        w.min(h)
    }

    /// Smallest scale zooming out may reach.
    pub fn min_zoom(&self) -> f64 {
        self.scale_to_fit_value() / 2.0
    }

    /// Fit the image and center it horizontally.
    pub fn scale_to_fit(&mut self) {
        self.scale = self.scale_to_fit_value();
        let border = self.width - f64::from(self.image.width) * self.scale;
        self.offset = Vec2::new(-border / 2.0, 0.0);
    }

    /// Canvas point to image point.
    pub fn canvas_to_image(&self, p: Point) -> Point {
        ((p.to_vec2() + self.offset) / self.scale).to_point()
    }

    /// Image point to canvas point.
    pub fn image_to_canvas(&self, p: Point) -> Point {
        (p.to_vec2() * self.scale - self.offset).to_point()
    }

    /// Canvas length to image length.
    pub fn canvas_len_to_image(&self, len: f64) -> f64 {
        len / self.scale
    }

    /// Affine mapping image space onto the canvas.
    pub fn transform(&self) -> Affine {
        Affine::translate(-self.offset) * Affine::scale(self.scale)
    }

    /// Return `true` when `cursor` (canvas) is close enough to `first` (image) to close a path.
    pub fn cursor_is_closing_path(&self, cursor: Point, first: Point) -> bool {
        self.canvas_to_image(cursor).distance(first) < self.closing_distance / self.scale
    }

    /// Zoom by `factor` keeping the image point under `at` (canvas) fixed.
    pub fn zoom(&mut self, factor: f64, at: Point) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let src = self.canvas_to_image(at);
        self.scale = (self.scale * factor).clamp(self.min_zoom().min(self.max_scale), self.max_scale);
        self.offset = src.to_vec2() * self.scale - at.to_vec2();
    }

    /// Zoom so that the canvas rectangle spanned by `p1` and `p2` fills the viewport.
    pub fn zoom_to_box(&mut self, p1: Point, p2: Point) {
        let a = self.canvas_to_image(p1);
        let b = self.canvas_to_image(p2);
        let (nw, nh) = ((b.x - a.x).abs(), (b.y - a.y).abs());
        if nw <= f64::EPSILON || nh <= f64::EPSILON {
            return;
        }
        let (w, h) = (self.width, self.height);
        self.scale = if w / h < nw / nh {
            (w / nw).min(self.max_scale)
        } else {
            (h / nh).min(self.max_scale)
        };
        let start = Vec2::new(a.x.min(b.x), a.y.min(b.y)) * self.scale;
        let end = Vec2::new(a.x.max(b.x), a.y.max(b.y)) * self.scale;
        let viewport_end = start + Vec2::new(w, h);
        self.offset = start - (viewport_end - end) * 0.5;
    }

    /// Scroll by `delta` canvas pixels divided by `scaling`, keeping a margin of image visible.
    pub fn scroll(&mut self, delta: Vec2, scaling: f64) {
        self.offset += delta / scaling.max(f64::EPSILON);
        let margin = self.visibility_margin;
        let max_x = f64::from(self.image.width) * self.scale - margin;
        let max_y = f64::from(self.image.height) * self.scale - margin;
        let min_x = -self.width + margin;
        let min_y = -self.height + margin;
        self.offset.x = clamp_offset(self.offset.x, min_x, max_x);
        self.offset.y = clamp_offset(self.offset.y, min_y, max_y);
    }
}

// upper bound wins when the image is smaller than the margins
fn clamp_offset(v: f64, min: f64, max: f64) -> f64 {
    if v > max {
        max
    } else if v < min {
        min
    } else {
        v
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/camera.rs"]
mod tests;
