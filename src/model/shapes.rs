//! In-memory geometry for every built-in annotation type, in image coordinates.

use crate::animation::interpolate::{Lerp, interpolate_path, match_cardinal_points};
use crate::foundation::core::{Point, Rect, Vec2};
use crate::geometry::ring;

/// Polygon with an outer path and optional extra rings (holes or disjoint parts, even-odd).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PolygonData {
    /// Main ring.
    pub path: Vec<Point>,
    /// Extra rings produced by boolean operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_paths: Vec<Vec<Point>>,
}

impl PolygonData {
    /// Single-ring polygon.
    pub fn new(path: Vec<Point>) -> Self {
        Self {
            path,
            additional_paths: Vec::new(),
        }
    }

    /// All rings, main ring first.
    pub fn rings(&self) -> Vec<Vec<Point>> {
        std::iter::once(self.path.clone())
            .chain(self.additional_paths.iter().cloned())
            .collect()
    }

    /// Build from boolean output; `None` when there is no ring.
    pub fn from_rings(mut rings: Vec<Vec<Point>>) -> Option<Self> {
        if rings.is_empty() {
            return None;
        }
        let path = rings.remove(0);
        Some(Self {
            path,
            additional_paths: rings,
        })
    }
}

impl Lerp for PolygonData {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            path: interpolate_path(&a.path, &b.path, t),
            additional_paths: if a.additional_paths.len() == b.additional_paths.len() {
                a.additional_paths
                    .iter()
                    .zip(&b.additional_paths)
                    .map(|(p, q)| interpolate_path(p, q, t))
                    .collect()
            } else {
                a.additional_paths.clone()
            },
        }
    }
}

/// Ellipse described by its center and the four cardinal points of its axes.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EllipseData {
    /// Center point.
    pub center: Point,
    /// End of the minor/major axis above the center (before rotation).
    pub top: Point,
    /// End of the axis to the right of the center.
    pub right: Point,
    /// End of the axis below the center.
    pub bottom: Point,
    /// End of the axis to the left of the center.
    pub left: Point,
}

impl EllipseData {
    /// Build from center, radii and rotation angle (radians).
    pub fn from_radii(center: Point, rx: f64, ry: f64, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let along = Vec2::new(cos, sin);
        let across = Vec2::new(-sin, cos);
        Self {
            center,
            right: center + along * rx,
            left: center - along * rx,
            bottom: center + across * ry,
            top: center - across * ry,
        }
    }

    /// Cardinal points counter-clockwise on screen: right, top, left, bottom.
    pub fn cardinal(&self) -> [Point; 4] {
        [self.right, self.top, self.left, self.bottom]
    }

    fn from_cardinal(center: Point, c: [Point; 4]) -> Self {
        Self {
            center,
            right: c[0],
            top: c[1],
            left: c[2],
            bottom: c[3],
        }
    }

    /// Horizontal radius (center to `right`).
    pub fn radius_x(&self) -> f64 {
        self.center.distance(self.right)
    }

    /// Vertical radius (center to `top`).
    pub fn radius_y(&self) -> f64 {
        self.center.distance(self.top)
    }

    /// Rotation of the `right` axis in radians.
    pub fn angle(&self) -> f64 {
        let v = self.right - self.center;
        v.y.atan2(v.x)
    }

    /// Polygon approximation with `segments` vertices.
    pub fn to_polygon(&self, segments: usize) -> Vec<Point> {
        let n = segments.max(8);
        let (rx, ry, angle) = (self.radius_x(), self.radius_y(), self.angle());
        let (sin, cos) = angle.sin_cos();
        (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * (i as f64) / (n as f64);
                let (x, y) = (rx * t.cos(), ry * t.sin());
                Point::new(
                    self.center.x + x * cos - y * sin,
                    self.center.y + x * sin + y * cos,
                )
            })
            .collect()
    }

    /// Exact axis-aligned bounds of the rotated ellipse.
    pub fn bounds(&self) -> Rect {
        let (rx, ry, angle) = (self.radius_x(), self.radius_y(), self.angle());
        let (sin, cos) = angle.sin_cos();
        let hw = ((rx * cos).powi(2) + (ry * sin).powi(2)).sqrt();
        let hh = ((rx * sin).powi(2) + (ry * cos).powi(2)).sqrt();
        Rect::new(
            self.center.x - hw,
            self.center.y - hh,
            self.center.x + hw,
            self.center.y + hh,
        )
    }

    fn translate(&mut self, d: Vec2) {
        self.center += d;
        self.top += d;
        self.right += d;
        self.bottom += d;
        self.left += d;
    }
}

impl Lerp for EllipseData {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let prev = a.cardinal();
        let next = match_cardinal_points(&prev, &b.cardinal());
        let pts: [Point; 4] = std::array::from_fn(|i| <Point as Lerp>::lerp(&prev[i], &next[i], t));
        Self::from_cardinal(<Point as Lerp>::lerp(&a.center, &b.center, t), pts)
    }
}

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBoxData {
    /// Rectangle in image space, `x0 <= x1` and `y0 <= y1`.
    pub rect: Rect,
}

impl BoundingBoxData {
    /// Box spanned by two corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            rect: Rect::from_points(a, b),
        }
    }

    /// Corners clockwise on screen starting at the top-left.
    pub fn corners(&self) -> [Point; 4] {
        let r = self.rect;
        [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ]
    }
}

impl Lerp for BoundingBoxData {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let (ra, rb) = (a.rect, b.rect);
        Self {
            rect: Rect::new(
                <f64 as Lerp>::lerp(&ra.x0, &rb.x0, t),
                <f64 as Lerp>::lerp(&ra.y0, &rb.y0, t),
                <f64 as Lerp>::lerp(&ra.x1, &rb.x1, t),
                <f64 as Lerp>::lerp(&ra.y1, &rb.y1, t),
            ),
        }
    }
}

/// Single point.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeypointData {
    /// Position in image space.
    pub point: Point,
}

impl Lerp for KeypointData {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            point: <Point as Lerp>::lerp(&a.point, &b.point, t),
        }
    }
}

/// Open polyline.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PolylineData {
    /// Vertices in drawing order.
    pub path: Vec<Point>,
}

impl Lerp for PolylineData {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            path: interpolate_path(&a.path, &b.path, t),
        }
    }
}

/// Type-tagged geometry payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "geometry", rename_all = "snake_case")]
pub enum AnnotationData {
    /// Polygon, possibly with extra rings.
    Polygon(PolygonData),
    /// Rotated ellipse.
    Ellipse(EllipseData),
    /// Axis-aligned box.
    BoundingBox(BoundingBoxData),
    /// Point.
    Keypoint(KeypointData),
    /// Open polyline.
    Polyline(PolylineData),
    /// Whole-image tag without geometry.
    Tag,
    /// Geometry of a plugin-defined type, kept as raw JSON.
    Custom(serde_json::Value),
}

impl AnnotationData {
    /// Variant name as used in wire payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Polygon(_) => "polygon",
            Self::Ellipse(_) => "ellipse",
            Self::BoundingBox(_) => "bounding_box",
            Self::Keypoint(_) => "keypoint",
            Self::Polyline(_) => "polyline",
            Self::Tag => "tag",
            Self::Custom(_) => "custom",
        }
    }

    /// Editable vertices (polygon main ring, box corners, ellipse cardinal points, ...).
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            Self::Polygon(p) => p.path.clone(),
            Self::Ellipse(e) => e.cardinal().to_vec(),
            Self::BoundingBox(b) => b.corners().to_vec(),
            Self::Keypoint(k) => vec![k.point],
            Self::Polyline(p) => p.path.clone(),
            Self::Tag | Self::Custom(_) => Vec::new(),
        }
    }

    /// Move the whole shape by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Self::Polygon(p) => {
                p.path = ring::translate(&p.path, delta);
                for r in &mut p.additional_paths {
                    *r = ring::translate(r, delta);
                }
            }
            Self::Ellipse(e) => e.translate(delta),
            Self::BoundingBox(b) => b.rect = b.rect + delta,
            Self::Keypoint(k) => k.point += delta,
            Self::Polyline(p) => p.path = ring::translate(&p.path, delta),
            Self::Tag | Self::Custom(_) => {}
        }
    }

    /// Move vertex `index` (as listed by [`AnnotationData::vertices`]) by `delta`.
    ///
    /// Box corners keep the box axis-aligned; ellipse axis points move their opposite point
    /// symmetrically. Returns `false` when the index does not exist.
    pub fn move_vertex(&mut self, index: usize, delta: Vec2) -> bool {
        match self {
            Self::Polygon(p) => match p.path.get_mut(index) {
                Some(v) => {
                    *v += delta;
                    true
                }
                None => false,
            },
            Self::Polyline(p) => match p.path.get_mut(index) {
                Some(v) => {
                    *v += delta;
                    true
                }
                None => false,
            },
            Self::Keypoint(k) if index == 0 => {
                k.point += delta;
                true
            }
            Self::BoundingBox(b) if index < 4 => {
                let corners = b.corners();
                let moved = corners[index] + delta;
                let opposite = corners[(index + 2) % 4];
                *b = BoundingBoxData::from_corners(moved, opposite);
                true
            }
            Self::Ellipse(e) if index < 4 => {
                let mut c = e.cardinal();
                c[index] += delta;
                c[(index + 2) % 4] -= delta;
                *e = EllipseData::from_cardinal(e.center, c);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/shapes.rs"]
mod tests;
