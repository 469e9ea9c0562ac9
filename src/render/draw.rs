use crate::foundation::core::{Affine, BezPath, Point, Rgba8};
use crate::geometry::ring;

/// Draw operation emitted by annotation renderers.
///
/// Paths are given in their own space and mapped to canvas pixels by `transform`. Stroke widths
/// are measured after the transform.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fill `path` with the even-odd rule.
    FillPath {
        /// Outline, possibly with several subpaths.
        path: BezPath,
        /// Path space to canvas pixels.
        transform: Affine,
        /// Straight-alpha color.
        color: Rgba8,
        /// Multiplied into the color alpha.
        opacity: f32,
    },
    /// Stroke `path` with a line of `width`.
    StrokePath {
        /// Outline.
        path: BezPath,
        /// Path space to canvas pixels.
        transform: Affine,
        /// Straight-alpha color.
        color: Rgba8,
        /// Line width in canvas pixels.
        width: f64,
        /// Multiplied into the color alpha.
        opacity: f32,
    },
}

/// Ordered draw operations for one layer; later operations paint over earlier ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    /// Operations in paint order.
    pub ops: Vec<DrawOp>,
}

impl DrawList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Return `true` when nothing is drawn.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append a fill.
    pub fn fill(&mut self, path: BezPath, transform: Affine, color: Rgba8, opacity: f32) {
        self.ops.push(DrawOp::FillPath {
            path,
            transform,
            color,
            opacity,
        });
    }

    /// Append a stroke of `width` canvas pixels. `path` is mapped by `transform` first.
    pub fn stroke(&mut self, path: &BezPath, transform: Affine, color: Rgba8, width: f64) {
        self.ops.push(DrawOp::StrokePath {
            path: transform * path.clone(),
            transform: Affine::IDENTITY,
            color,
            width,
            opacity: 1.0,
        });
    }

    /// Append a filled square handle of `size` canvas pixels centered on `p` (image space).
    pub fn handle(&mut self, p: Point, transform: Affine, color: Rgba8, size: f64) {
        let c = transform * p;
        let h = size / 2.0;
        let square = [
            Point::new(c.x - h, c.y - h),
            Point::new(c.x + h, c.y - h),
            Point::new(c.x + h, c.y + h),
            Point::new(c.x - h, c.y + h),
        ];
        self.fill(ring::to_bezpath(&square, true), Affine::IDENTITY, color, 1.0);
    }

    /// Append all operations of `other`.
    pub fn extend(&mut self, other: DrawList) {
        self.ops.extend(other.ops);
    }
}

/// Per-annotation drawing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawStyle {
    /// Image space to canvas space.
    pub transform: Affine,
    /// Camera scale (canvas pixels per image pixel).
    pub scale: f64,
    /// Class color.
    pub color: Rgba8,
    /// Selected annotations show vertex handles.
    pub selected: bool,
    /// Highlighted annotations use a heavier outline.
    pub highlighted: bool,
}

impl DrawStyle {
    /// Style for an unselected, unhighlighted annotation.
    pub fn new(transform: Affine, scale: f64, color: Rgba8) -> Self {
        Self {
            transform,
            scale,
            color,
            selected: false,
            highlighted: false,
        }
    }

    /// Fill opacity for the current state.
    pub fn fill_opacity(&self) -> f32 {
        match (self.selected, self.highlighted) {
            (true, _) => 0.4,
            (false, true) => 0.3,
            (false, false) => 0.15,
        }
    }

    /// Outline width in canvas pixels.
    pub fn stroke_width(&self) -> f64 {
        if self.highlighted || self.selected {
            2.0
        } else {
            1.0
        }
    }
}
