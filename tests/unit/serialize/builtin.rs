use super::*;

use serde_json::json;

#[test]
fn polygon_reads_path_and_extra_rings() {
    let v = json!({
        "path": [{"x": 0.0, "y": 0.0}, {"x": 4.0, "y": 0.0}, {"x": 4.0, "y": 4.0}],
        "additional_paths": [[{"x": 1.0, "y": 1.0}, {"x": 2.0, "y": 1.0}, {"x": 2.0, "y": 2.0}]]
    });
    let AnnotationData::Polygon(p) = PolygonSerializer.deserialize(&v).unwrap() else {
        panic!("expected polygon");
    };
    assert_eq!(p.path[1], Point::new(4.0, 0.0));
    assert_eq!(p.additional_paths.len(), 1);
    assert_eq!(PolygonSerializer.serialize(&AnnotationData::Polygon(p)).unwrap(), v);
}

#[test]
fn polygon_omits_empty_extra_rings() {
    let data = AnnotationData::Polygon(PolygonData::new(vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
    ]));
    let v = PolygonSerializer.serialize(&data).unwrap();
    assert!(v.get("additional_paths").is_none());
}

#[test]
fn polygon_needs_three_points() {
    let v = json!({ "path": [{"x": 0, "y": 0}, {"x": 4, "y": 0}] });
    assert!(matches!(
        PolygonSerializer.deserialize(&v),
        Err(CanvasmarkError::Validation(_))
    ));
}

#[test]
fn bounding_box_uses_origin_and_size() {
    let data = BoundingBoxSerializer
        .deserialize(&json!({"x": 1, "y": 2, "w": 3, "h": 4}))
        .unwrap();
    assert_eq!(
        data,
        AnnotationData::BoundingBox(BoundingBoxData {
            rect: Rect::new(1.0, 2.0, 4.0, 6.0)
        })
    );
    assert!(
        BoundingBoxSerializer
            .deserialize(&json!({"x": 1, "y": 2, "w": -3, "h": 4}))
            .is_err()
    );
}

#[test]
fn ellipse_expands_to_cardinal_points() {
    let data = EllipseSerializer
        .deserialize(&json!({"center": {"x": 10, "y": 10}, "radius": {"x": 4, "y": 2}, "angle": 0}))
        .unwrap();
    let AnnotationData::Ellipse(e) = &data else {
        panic!("expected ellipse");
    };
    assert_eq!(e.right, Point::new(14.0, 10.0));
    assert_eq!(e.left, Point::new(6.0, 10.0));
    assert_eq!(e.top, Point::new(10.0, 8.0));
    assert_eq!(e.bottom, Point::new(10.0, 12.0));

    let back = EllipseSerializer.serialize(&data).unwrap();
    assert_eq!(back["radius"]["x"], json!(4.0));
    assert_eq!(back["radius"]["y"], json!(2.0));
    assert_eq!(back["angle"], json!(0.0));
}

#[test]
fn keypoint_and_polyline() {
    assert_eq!(
        KeypointSerializer.deserialize(&json!({"x": 3, "y": 4})).unwrap(),
        AnnotationData::Keypoint(KeypointData {
            point: Point::new(3.0, 4.0)
        })
    );
    assert!(
        PolylineSerializer
            .deserialize(&json!({"path": [{"x": 0, "y": 0}]}))
            .is_err()
    );
}

#[test]
fn tag_has_no_geometry() {
    assert_eq!(TagSerializer.deserialize(&json!({})).unwrap(), AnnotationData::Tag);
    assert_eq!(TagSerializer.serialize(&AnnotationData::Tag).unwrap(), json!({}));
}

#[test]
fn serializers_reject_foreign_geometry() {
    assert!(matches!(
        KeypointSerializer.serialize(&AnnotationData::Tag),
        Err(CanvasmarkError::Serde(_))
    ));
}
