//! Built-in renderers for the core annotation types.

use std::rc::Rc;

use crate::animation::interpolate::{InterpolationAlgorithm, Lerp};
use crate::foundation::core::{Affine, BezPath, Point, Rect};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::geometry::ring;
use crate::model::shapes::AnnotationData;
use crate::render::draw::{DrawList, DrawStyle};
use crate::render::registry::AnnotationRenderer;

const HANDLE_SIZE: f64 = 6.0;
const KEYPOINT_RADIUS: f64 = 4.0;
const ELLIPSE_SEGMENTS: usize = 64;

/// Interpolate two geometries of the same variant.
pub fn lerp_data(
    prev: &AnnotationData,
    next: &AnnotationData,
    t: f64,
    algorithm: InterpolationAlgorithm,
) -> CanvasmarkResult<AnnotationData> {
    match algorithm {
        InterpolationAlgorithm::Linear => linear(prev, next, t),
    }
}

fn linear(prev: &AnnotationData, next: &AnnotationData, t: f64) -> CanvasmarkResult<AnnotationData> {
    use AnnotationData as D;
    Ok(match (prev, next) {
        (D::Polygon(a), D::Polygon(b)) => D::Polygon(Lerp::lerp(a, b, t)),
        (D::Ellipse(a), D::Ellipse(b)) => D::Ellipse(Lerp::lerp(a, b, t)),
        (D::BoundingBox(a), D::BoundingBox(b)) => D::BoundingBox(Lerp::lerp(a, b, t)),
        (D::Keypoint(a), D::Keypoint(b)) => D::Keypoint(Lerp::lerp(a, b, t)),
        (D::Polyline(a), D::Polyline(b)) => D::Polyline(Lerp::lerp(a, b, t)),
        (D::Tag, D::Tag) => D::Tag,
        (a, b) => {
            return Err(CanvasmarkError::validation(format!(
                "cannot interpolate '{}' into '{}'",
                a.kind(),
                b.kind()
            )));
        }
    })
}

fn mismatch(expected: &str, got: &AnnotationData) -> CanvasmarkError {
    CanvasmarkError::render(format!(
        "{expected} renderer got '{}' geometry",
        got.kind()
    ))
}

fn draw_outlined(path: BezPath, vertices: &[Point], style: &DrawStyle, out: &mut DrawList) {
    out.stroke(&path, style.transform, style.color, style.stroke_width());
    out.fill(path, style.transform, style.color, style.fill_opacity());
    if style.selected {
        for v in vertices {
            out.handle(*v, style.transform, style.color, HANDLE_SIZE);
        }
    }
}

/// Closed polygons, including extra rings.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolygonRenderer;

impl AnnotationRenderer for PolygonRenderer {
    fn annotation_type(&self) -> &str {
        "polygon"
    }

    fn draw(
        &self,
        data: &AnnotationData,
        style: &DrawStyle,
        out: &mut DrawList,
    ) -> CanvasmarkResult<()> {
        let AnnotationData::Polygon(p) = data else {
            return Err(mismatch("polygon", data));
        };
        let mut path = ring::to_bezpath(&p.path, true);
        for extra in &p.additional_paths {
            path.extend(ring::to_bezpath(extra, true));
        }
        draw_outlined(path, &p.path, style, out);
        Ok(())
    }

    fn bounding_box(&self, data: &AnnotationData) -> Option<Rect> {
        let AnnotationData::Polygon(p) = data else {
            return None;
        };
        let all: Vec<Point> = p.rings().into_iter().flatten().collect();
        ring::bounding_box(&all)
    }

    fn centroid(&self, data: &AnnotationData) -> Option<Point> {
        let AnnotationData::Polygon(p) = data else {
            return None;
        };
        ring::centroid(&p.path)
    }

    fn contains_point(&self, data: &AnnotationData, point: Point, tolerance: f64) -> bool {
        let AnnotationData::Polygon(p) = data else {
            return false;
        };
        ring::rings_contain_point(&p.rings(), point) || ring::near_boundary(&p.path, point, tolerance)
    }

    fn supports_interpolation(&self) -> bool {
        true
    }

    fn interpolate_by_default(&self) -> bool {
        true
    }

    fn interpolate(
        &self,
        prev: &AnnotationData,
        next: &AnnotationData,
        t: f64,
        algorithm: InterpolationAlgorithm,
    ) -> CanvasmarkResult<AnnotationData> {
        lerp_data(prev, next, t, algorithm)
    }
}

/// Rotated ellipses.
#[derive(Clone, Copy, Debug, Default)]
pub struct EllipseRenderer;

impl AnnotationRenderer for EllipseRenderer {
    fn annotation_type(&self) -> &str {
        "ellipse"
    }

    fn draw(
        &self,
        data: &AnnotationData,
        style: &DrawStyle,
        out: &mut DrawList,
    ) -> CanvasmarkResult<()> {
        let AnnotationData::Ellipse(e) = data else {
            return Err(mismatch("ellipse", data));
        };
        let path = ring::to_bezpath(&e.to_polygon(ELLIPSE_SEGMENTS), true);
        draw_outlined(path, &e.cardinal(), style, out);
        Ok(())
    }

    fn bounding_box(&self, data: &AnnotationData) -> Option<Rect> {
        match data {
            AnnotationData::Ellipse(e) => Some(e.bounds()),
            _ => None,
        }
    }

    fn centroid(&self, data: &AnnotationData) -> Option<Point> {
        match data {
            AnnotationData::Ellipse(e) => Some(e.center),
            _ => None,
        }
    }

    fn contains_point(&self, data: &AnnotationData, point: Point, tolerance: f64) -> bool {
        let AnnotationData::Ellipse(e) = data else {
            return false;
        };
        let (rx, ry) = (e.radius_x() + tolerance, e.radius_y() + tolerance);
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let (sin, cos) = e.angle().sin_cos();
        let d = point - e.center;
        let along = cos * d.x + sin * d.y;
        let across = -sin * d.x + cos * d.y;
        (along / rx).powi(2) + (across / ry).powi(2) <= 1.0
    }

    fn supports_interpolation(&self) -> bool {
        true
    }

    fn interpolate_by_default(&self) -> bool {
        true
    }

    fn interpolate(
        &self,
        prev: &AnnotationData,
        next: &AnnotationData,
        t: f64,
        algorithm: InterpolationAlgorithm,
    ) -> CanvasmarkResult<AnnotationData> {
        lerp_data(prev, next, t, algorithm)
    }
}

/// Axis-aligned boxes.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundingBoxRenderer;

impl AnnotationRenderer for BoundingBoxRenderer {
    fn annotation_type(&self) -> &str {
        "bounding_box"
    }

    fn draw(
        &self,
        data: &AnnotationData,
        style: &DrawStyle,
        out: &mut DrawList,
    ) -> CanvasmarkResult<()> {
        let AnnotationData::BoundingBox(b) = data else {
            return Err(mismatch("bounding_box", data));
        };
        let corners = b.corners();
        draw_outlined(ring::to_bezpath(&corners, true), &corners, style, out);
        Ok(())
    }

    fn bounding_box(&self, data: &AnnotationData) -> Option<Rect> {
        match data {
            AnnotationData::BoundingBox(b) => Some(b.rect),
            _ => None,
        }
    }

    fn contains_point(&self, data: &AnnotationData, point: Point, tolerance: f64) -> bool {
        match data {
            AnnotationData::BoundingBox(b) => b.rect.inflate(tolerance, tolerance).contains(point),
            _ => false,
        }
    }

    fn supports_interpolation(&self) -> bool {
        true
    }

    fn interpolate_by_default(&self) -> bool {
        true
    }

    fn interpolate(
        &self,
        prev: &AnnotationData,
        next: &AnnotationData,
        t: f64,
        algorithm: InterpolationAlgorithm,
    ) -> CanvasmarkResult<AnnotationData> {
        lerp_data(prev, next, t, algorithm)
    }
}

/// Single points, drawn as fixed-size dots.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeypointRenderer;

impl AnnotationRenderer for KeypointRenderer {
    fn annotation_type(&self) -> &str {
        "keypoint"
    }

    fn draw(
        &self,
        data: &AnnotationData,
        style: &DrawStyle,
        out: &mut DrawList,
    ) -> CanvasmarkResult<()> {
        let AnnotationData::Keypoint(k) = data else {
            return Err(mismatch("keypoint", data));
        };
        let radius = if style.highlighted || style.selected {
            KEYPOINT_RADIUS * 1.5
        } else {
            KEYPOINT_RADIUS
        };
        let dot = ring::circle(style.transform * k.point, radius, 16);
        out.fill(ring::to_bezpath(&dot, true), Affine::IDENTITY, style.color, 1.0);
        Ok(())
    }

    fn bounding_box(&self, data: &AnnotationData) -> Option<Rect> {
        match data {
            AnnotationData::Keypoint(k) => Some(Rect::from_points(k.point, k.point)),
            _ => None,
        }
    }

    fn contains_point(&self, data: &AnnotationData, point: Point, tolerance: f64) -> bool {
        match data {
            AnnotationData::Keypoint(k) => k.point.distance(point) <= tolerance,
            _ => false,
        }
    }

    fn supports_interpolation(&self) -> bool {
        true
    }

    fn interpolate_by_default(&self) -> bool {
        true
    }

    fn interpolate(
        &self,
        prev: &AnnotationData,
        next: &AnnotationData,
        t: f64,
        algorithm: InterpolationAlgorithm,
    ) -> CanvasmarkResult<AnnotationData> {
        lerp_data(prev, next, t, algorithm)
    }
}

/// Open polylines; stroked only.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolylineRenderer;

impl AnnotationRenderer for PolylineRenderer {
    fn annotation_type(&self) -> &str {
        "polyline"
    }

    fn draw(
        &self,
        data: &AnnotationData,
        style: &DrawStyle,
        out: &mut DrawList,
    ) -> CanvasmarkResult<()> {
        let AnnotationData::Polyline(p) = data else {
            return Err(mismatch("polyline", data));
        };
        let path = ring::to_bezpath(&p.path, false);
        out.stroke(&path, style.transform, style.color, style.stroke_width());
        if style.selected {
            for v in &p.path {
                out.handle(*v, style.transform, style.color, HANDLE_SIZE);
            }
        }
        Ok(())
    }

    fn bounding_box(&self, data: &AnnotationData) -> Option<Rect> {
        match data {
            AnnotationData::Polyline(p) => ring::bounding_box(&p.path),
            _ => None,
        }
    }

    fn contains_point(&self, data: &AnnotationData, point: Point, tolerance: f64) -> bool {
        let AnnotationData::Polyline(p) = data else {
            return false;
        };
        p.path
            .windows(2)
            .any(|w| ring::distance_to_segment(point, w[0], w[1]) <= tolerance)
    }

    fn supports_interpolation(&self) -> bool {
        true
    }

    fn interpolate(
        &self,
        prev: &AnnotationData,
        next: &AnnotationData,
        t: f64,
        algorithm: InterpolationAlgorithm,
    ) -> CanvasmarkResult<AnnotationData> {
        lerp_data(prev, next, t, algorithm)
    }
}

/// Whole-image tags; nothing to draw or hit.
#[derive(Clone, Copy, Debug, Default)]
pub struct TagRenderer;

impl AnnotationRenderer for TagRenderer {
    fn annotation_type(&self) -> &str {
        "tag"
    }

    fn draw(&self, _: &AnnotationData, _: &DrawStyle, _: &mut DrawList) -> CanvasmarkResult<()> {
        Ok(())
    }

    fn bounding_box(&self, _: &AnnotationData) -> Option<Rect> {
        None
    }

    fn contains_point(&self, _: &AnnotationData, _: Point, _: f64) -> bool {
        false
    }
}

pub(crate) fn builtin_renderers() -> Vec<Rc<dyn AnnotationRenderer>> {
    vec![
        Rc::new(PolygonRenderer),
        Rc::new(EllipseRenderer),
        Rc::new(BoundingBoxRenderer),
        Rc::new(KeypointRenderer),
        Rc::new(PolylineRenderer),
        Rc::new(TagRenderer),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderers.rs"]
mod tests;
