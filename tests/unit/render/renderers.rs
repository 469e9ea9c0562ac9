use super::*;

use crate::foundation::core::{Rgba8, Vec2};
use crate::model::shapes::{EllipseData, KeypointData, PolygonData, PolylineData};
use crate::render::draw::DrawOp;

fn square(x0: f64, y0: f64, size: f64) -> AnnotationData {
    AnnotationData::Polygon(PolygonData::new(vec![
        Point::new(x0, y0),
        Point::new(x0, y0 + size),
        Point::new(x0 + size, y0 + size),
        Point::new(x0 + size, y0),
    ]))
}

fn style() -> DrawStyle {
    DrawStyle::new(Affine::IDENTITY, 1.0, Rgba8::new(255, 0, 0, 255))
}

#[test]
fn polygon_draws_outline_then_fill() {
    let mut out = DrawList::new();
    PolygonRenderer.draw(&square(0.0, 0.0, 10.0), &style(), &mut out).unwrap();
    assert_eq!(out.len(), 2);
    assert!(matches!(out.ops[0], DrawOp::StrokePath { .. }));
    assert!(matches!(out.ops[1], DrawOp::FillPath { opacity, .. } if (opacity - 0.15).abs() < 1e-6));
}

#[test]
fn selected_polygon_adds_vertex_handles() {
    let mut out = DrawList::new();
    let mut s = style();
    s.selected = true;
    PolygonRenderer.draw(&square(0.0, 0.0, 10.0), &s, &mut out).unwrap();
    assert_eq!(out.len(), 6);
}

#[test]
fn renderer_rejects_foreign_geometry() {
    let mut out = DrawList::new();
    let err = PolygonRenderer
        .draw(&AnnotationData::Tag, &style(), &mut out)
        .unwrap_err();
    assert!(matches!(err, CanvasmarkError::Render(_)));
}

#[test]
fn polygon_queries() {
    let sq = square(0.0, 0.0, 10.0);
    assert_eq!(PolygonRenderer.bounding_box(&sq), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    assert_eq!(PolygonRenderer.centroid(&sq), Some(Point::new(5.0, 5.0)));
    assert!(PolygonRenderer.contains_point(&sq, Point::new(5.0, 5.0), 0.0));
    assert!(!PolygonRenderer.contains_point(&sq, Point::new(11.0, 5.0), 0.0));
    assert!(PolygonRenderer.contains_point(&sq, Point::new(11.0, 5.0), 2.0));
}

#[test]
fn ellipse_hit_test_respects_rotation() {
    let e = AnnotationData::Ellipse(EllipseData::from_radii(
        Point::new(0.0, 0.0),
        10.0,
        2.0,
        std::f64::consts::FRAC_PI_2,
    ));
    assert!(EllipseRenderer.contains_point(&e, Point::new(0.0, 9.0), 0.0));
    assert!(!EllipseRenderer.contains_point(&e, Point::new(9.0, 0.0), 0.0));
    assert_eq!(EllipseRenderer.centroid(&e), Some(Point::new(0.0, 0.0)));
}

#[test]
fn keypoint_draws_a_dot_in_canvas_space() {
    let k = AnnotationData::Keypoint(KeypointData {
        point: Point::new(5.0, 5.0),
    });
    let mut s = style();
    s.transform = Affine::scale(2.0);
    let mut out = DrawList::new();
    KeypointRenderer.draw(&k, &s, &mut out).unwrap();
    let DrawOp::FillPath { path, transform, .. } = &out.ops[0] else {
        panic!("expected fill");
    };
    assert_eq!(*transform, Affine::IDENTITY);
    let bbox = kurbo::Shape::bounding_box(path);
    assert!((bbox.center() - Point::new(10.0, 10.0)).hypot() < 1e-9);
    assert!(KeypointRenderer.contains_point(&k, Point::new(6.0, 5.0), 1.5));
}

#[test]
fn polyline_hits_near_segments_only() {
    let l = AnnotationData::Polyline(PolylineData {
        path: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
    });
    assert!(PolylineRenderer.contains_point(&l, Point::new(5.0, 1.0), 2.0));
    assert!(!PolylineRenderer.contains_point(&l, Point::new(5.0, 5.0), 2.0));
}

#[test]
fn interpolation_midpoint_of_polygons() {
    let a = square(0.0, 0.0, 10.0);
    let mut b = a.clone();
    b.translate(Vec2::new(10.0, 20.0));
    let mid = PolygonRenderer
        .interpolate(&a, &b, 0.5, InterpolationAlgorithm::Linear)
        .unwrap();
    assert_eq!(mid.vertices()[0], Point::new(5.0, 10.0));
    assert_eq!(mid.vertices()[2], Point::new(15.0, 20.0));
}

#[test]
fn interpolation_requires_matching_kinds() {
    assert!(lerp_data(&square(0.0, 0.0, 1.0), &AnnotationData::Tag, 0.5, InterpolationAlgorithm::Linear).is_err());
    assert!(TagRenderer
        .interpolate(&AnnotationData::Tag, &AnnotationData::Tag, 0.5, InterpolationAlgorithm::Linear)
        .is_err());
}
