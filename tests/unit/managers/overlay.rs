use super::*;

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::core::{FrameRange, Rgba8};
use crate::foundation::notice::RecordingNotifier;
use crate::model::annotation::AnnotationClass;
use crate::model::shapes::{AnnotationData, BoundingBoxData, KeypointData};
use crate::model::video::VideoAnnotationData;
use crate::persist::memory::MemoryBridge;
use crate::render::registry::RendererRegistry;

fn store() -> AnnotationManager {
    let mut m = AnnotationManager::new(
        RendererRegistry::with_builtins(),
        Rc::new(MemoryBridge::new()),
        Rc::new(RecordingNotifier::new()),
    );
    m.set_classes([AnnotationClass {
        id: 7,
        name: "car".to_string(),
        color: Rgba8::new(255, 0, 0, 255),
        annotation_types: vec!["bounding_box".to_string()],
    }]);
    m
}

fn bbox(id: &str, class_id: u64) -> Annotation {
    Annotation::new_static(
        "bounding_box",
        class_id,
        AnnotationData::BoundingBox(BoundingBoxData::from_corners(
            Point::new(0.0, 0.0),
            Point::new(10.0, 20.0),
        )),
    )
    .with_id(id)
}

fn always(_: &Annotation) -> bool {
    true
}

fn inputs<'a>(store: &'a AnnotationManager, frame: u64) -> OverlayInputs<'a> {
    OverlayInputs {
        annotations: store,
        frame: FrameIndex(frame),
        transform: Affine::scale(2.0),
        should_render: &always,
    }
}

#[test]
fn reset_labels_visible_annotations_at_their_centroid() {
    let mut store = store();
    let mut a = bbox("a", 7);
    if let crate::model::annotation::AnnotationBody::Static { sub, .. } = &mut a.body {
        sub.text = Some("red".to_string());
        sub.instance_id = Some(3);
    }
    let mut hidden = bbox("h", 7);
    hidden.is_visible = false;
    store.set_annotations(vec![a, bbox("b", 99), hidden]);

    let mut overlays = OverlayManager::new();
    overlays.reset(&inputs(&store, 0));
    assert_eq!(overlays.entries().len(), 2);
    let a = overlays.get(&"a".into()).unwrap();
    assert_eq!(a.label, "car");
    assert_eq!(a.position, Point::new(5.0, 10.0));
    assert_eq!(a.canvas_position, Point::new(10.0, 20.0));
    assert_eq!(a.fragments, ["red", "#3"]);
    assert_eq!(overlays.get(&"b".into()).unwrap().label, "#99");
}

#[test]
fn video_overlay_is_removed_outside_segments() {
    let mut store = store();
    let mut video = VideoAnnotationData::single(
        FrameIndex(0),
        AnnotationData::Keypoint(KeypointData {
            point: Point::new(1.0, 1.0),
        }),
    );
    video.segments = vec![FrameRange::new(FrameIndex(0), FrameIndex(5)).unwrap()];
    let v = Annotation::new_video("keypoint", 7, video).with_id("v");
    store.set_annotations(vec![v.clone()]);

    let mut overlays = OverlayManager::new();
    overlays.update_for(&inputs(&store, 2), &v);
    assert!(overlays.get(&"v".into()).is_some());
    overlays.update_for(&inputs(&store, 8), &v);
    assert!(overlays.get(&"v".into()).is_none());
}

#[test]
fn missing_renderer_and_opted_out_annotations_have_no_overlay() {
    let store = store();
    let custom = Annotation::new_static("mask", 7, AnnotationData::Custom(serde_json::json!({})));
    let overlays = OverlayManager::new();
    assert!(overlays.compute(&inputs(&store, 0), &custom).is_none());

    let never = |_: &Annotation| false;
    let opted_out = OverlayInputs {
        should_render: &never,
        ..inputs(&store, 0)
    };
    assert!(overlays.compute(&opted_out, &bbox("a", 7)).is_none());
}

#[test]
fn listeners_see_every_change_until_released() {
    let mut store = store();
    store.set_annotations(vec![bbox("a", 7)]);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut overlays = OverlayManager::new();
    let sink = seen.clone();
    let mut handle = overlays.subscribe(Box::new(
        move |m: &BTreeMap<AnnotationId, OverlayRecord>| sink.borrow_mut().push(m.len()),
    ));

    overlays.reset(&inputs(&store, 0));
    overlays.update_for(&inputs(&store, 0), &bbox("a", 7));
    overlays.remove_for(&"a".into());
    handle.release();
    overlays.reset(&inputs(&store, 0));
    // the unchanged update is not announced
    assert_eq!(*seen.borrow(), vec![1, 0]);
}
