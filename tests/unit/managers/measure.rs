use super::*;

use std::rc::Rc;

use crate::foundation::core::{ImageSize, Point, Rect, Vec2};
use crate::foundation::notice::RecordingNotifier;
use crate::model::shapes::{BoundingBoxData, KeypointData, PolygonData, PolylineData};
use crate::persist::memory::MemoryBridge;
use crate::render::registry::RendererRegistry;

fn mm() -> MeasureRegion {
    MeasureRegion {
        rect: Rect::new(2.0, 2.0, 100.0, 100.0),
        delta: Vec2::new(0.5, 2.0),
        unit: "mm".to_string(),
        high_priority: true,
    }
}

fn values(ms: &[Measure]) -> Vec<(&'static str, f64)> {
    ms.iter().map(|m| (m.name, m.value)).collect()
}

#[test]
fn box_and_polygon_sizes_are_calibrated() {
    let b = AnnotationData::BoundingBox(BoundingBoxData::from_corners(
        Point::new(0.0, 0.0),
        Point::new(10.0, 4.0),
    ));
    assert_eq!(values(&measure_data(&b, &mm()).unwrap()), [("width", 5.0), ("height", 8.0)]);

    let p = AnnotationData::Polygon(PolygonData::new(vec![
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(4.0, 4.0),
        Point::new(0.0, 4.0),
    ]));
    let ms = measure_data(&p, &mm()).unwrap();
    assert_eq!(values(&ms), [("width", 2.0), ("height", 8.0), ("area", 16.0)]);
    assert_eq!(ms[2].unit, "mm²");
}

#[test]
fn polygon_holes_are_not_measured() {
    let square = |x0: f64, x1: f64| {
        vec![
            Point::new(x0, x0),
            Point::new(x1, x0),
            Point::new(x1, x1),
            Point::new(x0, x1),
        ]
    };
    let p = AnnotationData::Polygon(PolygonData {
        path: square(0.0, 10.0),
        additional_paths: vec![square(2.0, 4.0), square(20.0, 23.0)],
    });
    let ms = measure_data(&p, &MeasureRegion::pixels(ImageSize::new(50, 50))).unwrap();
    assert_eq!(ms.iter().find(|m| m.name == "area").map(|m| m.value), Some(100.0 - 4.0 + 9.0));
}

#[test]
fn polyline_length_and_keypoint_position() {
    let region = MeasureRegion::pixels(ImageSize::new(50, 50));
    let line = AnnotationData::Polyline(PolylineData {
        path: vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0), Point::new(3.0, 10.0)],
    });
    let ms = measure_data(&line, &region).unwrap();
    assert_eq!(values(&ms), [("length", 11.0)]);
    assert_eq!(label(&ms), "11.00 px");

    let kp = AnnotationData::Keypoint(KeypointData {
        point: Point::new(4.0, 6.0),
    });
    assert_eq!(values(&measure_data(&kp, &mm()).unwrap()), [("x", 1.0), ("y", 8.0)]);
    assert!(measure_data(&AnnotationData::Tag, &region).is_none());
}

fn store_with_box() -> AnnotationManager {
    let mut store = AnnotationManager::new(
        RendererRegistry::with_builtins(),
        Rc::new(MemoryBridge::new()),
        Rc::new(RecordingNotifier::new()),
    );
    store.set_annotations(vec![
        Annotation::new_static(
            "bounding_box",
            1,
            AnnotationData::BoundingBox(BoundingBoxData::from_corners(
                Point::new(0.0, 0.0),
                Point::new(2.0, 3.0),
            )),
        )
        .with_id("a"),
    ]);
    store
}

#[test]
fn reset_requires_a_region_and_keeps_drawing_entry() {
    let store = store_with_box();
    let region = MeasureRegion::pixels(ImageSize::new(10, 10));
    let mut measures = MeasureManager::new(true);

    measures.reset(&MeasureInputs {
        annotations: &store,
        frame: FrameIndex(0),
        region: None,
    });
    assert!(measures.entries().is_empty());

    let drawing = AnnotationData::Keypoint(KeypointData {
        point: Point::new(1.0, 1.0),
    });
    measures.update_drawing(&drawing, Some(&region));
    measures.reset(&MeasureInputs {
        annotations: &store,
        frame: FrameIndex(0),
        region: Some(&region),
    });
    assert_eq!(measures.get("a").unwrap().label, "2.00 × 3.00 px");
    assert!(measures.get(DRAWING_ANNOTATION_ID).is_some());

    measures.remove_drawing();
    assert!(measures.get(DRAWING_ANNOTATION_ID).is_none());
}

#[test]
fn disabling_clears_and_blocks_updates() {
    let store = store_with_box();
    let region = MeasureRegion::pixels(ImageSize::new(10, 10));
    let mut measures = MeasureManager::new(true);
    let inputs = MeasureInputs {
        annotations: &store,
        frame: FrameIndex(0),
        region: Some(&region),
    };
    measures.reset(&inputs);
    assert_eq!(measures.entries().len(), 1);
    measures.set_enabled(false);
    assert!(measures.entries().is_empty());
    measures.update_for(&inputs, &store.annotations()[0]);
    assert!(measures.entries().is_empty());
}
