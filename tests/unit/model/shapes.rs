use super::*;

fn approx(a: Point, b: Point) -> bool {
    a.distance(b) < 1e-9
}

#[test]
fn ellipse_from_radii_places_cardinal_points() {
    let e = EllipseData::from_radii(Point::new(10.0, 10.0), 4.0, 2.0, 0.0);
    assert!(approx(e.right, Point::new(14.0, 10.0)));
    assert!(approx(e.left, Point::new(6.0, 10.0)));
    assert!(approx(e.top, Point::new(10.0, 8.0)));
    assert!(approx(e.bottom, Point::new(10.0, 12.0)));
    assert!((e.radius_x() - 4.0).abs() < 1e-9);
    assert!((e.radius_y() - 2.0).abs() < 1e-9);
    let b = e.bounds();
    assert!((b.width() - 8.0).abs() < 1e-9 && (b.height() - 4.0).abs() < 1e-9);
}

#[test]
fn ellipse_interpolation_ignores_quarter_turn_relabeling() {
    let a = EllipseData::from_radii(Point::new(0.0, 0.0), 10.0, 5.0, 0.0);
    let b = EllipseData::from_radii(Point::new(20.0, 0.0), 12.0, 6.0, 0.0);
    let relabeled = EllipseData {
        center: b.center,
        right: b.top,
        top: b.left,
        left: b.bottom,
        bottom: b.right,
    };

    let canonical = EllipseData::lerp(&a, &b, 0.5);
    let from_relabeled = EllipseData::lerp(&a, &relabeled, 0.5);

    let mut x: Vec<(i64, i64)> = canonical
        .cardinal()
        .iter()
        .map(|p| ((p.x * 1e6).round() as i64, (p.y * 1e6).round() as i64))
        .collect();
    let mut y: Vec<(i64, i64)> = from_relabeled
        .cardinal()
        .iter()
        .map(|p| ((p.x * 1e6).round() as i64, (p.y * 1e6).round() as i64))
        .collect();
    x.sort();
    y.sort();
    assert_eq!(x, y);
    assert!(approx(from_relabeled.center, Point::new(10.0, 0.0)));
}

#[test]
fn box_corners_stay_axis_aligned_when_dragged() {
    let mut data = AnnotationData::BoundingBox(BoundingBoxData::from_corners(
        Point::new(0.0, 0.0),
        Point::new(10.0, 10.0),
    ));
    assert!(data.move_vertex(2, Vec2::new(5.0, -15.0)));
    match data {
        AnnotationData::BoundingBox(b) => assert_eq!(b.rect, Rect::new(0.0, -5.0, 15.0, 0.0)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn translate_moves_every_ring() {
    let mut data = AnnotationData::Polygon(PolygonData {
        path: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
        additional_paths: vec![vec![Point::new(5.0, 5.0)]],
    });
    data.translate(Vec2::new(1.0, 2.0));
    match &data {
        AnnotationData::Polygon(p) => {
            assert_eq!(p.path[0], Point::new(1.0, 2.0));
            assert_eq!(p.additional_paths[0][0], Point::new(6.0, 7.0));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!data.move_vertex(9, Vec2::new(1.0, 1.0)));
}

#[test]
fn polygon_rings_round_trip() {
    let rings = vec![
        vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
        vec![Point::new(5.0, 5.0), Point::new(6.0, 5.0), Point::new(5.0, 6.0)],
    ];
    let p = PolygonData::from_rings(rings.clone()).unwrap();
    assert_eq!(p.rings(), rings);
    assert!(PolygonData::from_rings(Vec::new()).is_none());
}
