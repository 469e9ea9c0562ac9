use super::*;

use crate::foundation::core::FrameRange;
use crate::foundation::notice::RecordingNotifier;
use crate::model::shapes::{KeypointData, PolygonData};
use crate::model::video::VideoAnnotationData;
use crate::persist::bridge::PersistOp;
use crate::persist::memory::MemoryBridge;

fn square(x: f64, y: f64, s: f64) -> AnnotationData {
    AnnotationData::Polygon(PolygonData::new(vec![
        Point::new(x, y),
        Point::new(x + s, y),
        Point::new(x + s, y + s),
        Point::new(x, y + s),
    ]))
}

fn kp(x: f64, y: f64) -> AnnotationData {
    AnnotationData::Keypoint(KeypointData {
        point: Point::new(x, y),
    })
}

fn poly(id: &str, z: i64) -> Annotation {
    Annotation::new_static("polygon", 1, square(0.0, 0.0, 10.0))
        .with_id(id)
        .with_z_index(z)
}

fn manager() -> (AnnotationManager, Rc<MemoryBridge>, Rc<RecordingNotifier>) {
    let bridge = Rc::new(MemoryBridge::new());
    let notifier = Rc::new(RecordingNotifier::new());
    let m = AnnotationManager::new(
        RendererRegistry::with_builtins(),
        bridge.clone(),
        notifier.clone(),
    );
    (m, bridge, notifier)
}

fn ids(m: &AnnotationManager) -> Vec<&str> {
    m.annotations().iter().map(|a| a.id.as_str()).collect()
}

#[test]
fn set_annotations_orders_by_descending_z() {
    let (mut m, _, _) = manager();
    m.set_annotations(vec![poly("a", 1), poly("b", 3), poly("c", 2)]);
    assert_eq!(ids(&m), ["b", "c", "a"]);
    assert_eq!(m.take_changes(), vec![AnnotationChange::Reset]);
    assert!(m.take_changes().is_empty());
}

#[test]
fn next_z_index_of_empty_store_is_one() {
    let (mut m, _, _) = manager();
    assert_eq!(m.next_z_index(), 1);
    m.set_annotations(vec![poly("a", 4)]);
    assert_eq!(m.next_z_index(), 5);
}

#[test]
fn insert_keeps_order_and_update_preserves_flags() {
    let (mut m, _, _) = manager();
    m.set_annotations(vec![poly("a", 1), poly("c", 3)]);
    m.insert_local(poly("b", 2));
    assert_eq!(ids(&m), ["c", "b", "a"]);

    assert!(m.select(&"b".into()));
    let mut changed = poly("b", 2);
    changed.body = AnnotationBody::Static {
        data: square(5.0, 5.0, 1.0),
        sub: SubAnnotations::default(),
    };
    let old = m.update_local(changed).unwrap();
    assert!(old.is_selected);
    let b = m.get(&"b".into()).unwrap();
    assert!(b.is_selected);
    assert_eq!(b.static_data(), Some(&square(5.0, 5.0, 1.0)));
}

#[test]
fn z_change_shifts_annotations_in_between() {
    let (mut m, _, _) = manager();
    m.set_annotations(vec![poly("a", 1), poly("b", 2), poly("c", 3)]);
    assert!(m.bring_to_front(&"a".into()));
    assert_eq!(ids(&m), ["a", "c", "b"]);
    let z: Vec<i64> = m.annotations().iter().map(|a| a.z_index).collect();
    assert_eq!(z, [3, 2, 1]);
    assert!(!m.bring_to_front(&"a".into()));
}

#[test]
fn selection_is_exclusive_and_cycles_visible_annotations() {
    let (mut m, _, _) = manager();
    m.set_annotations(vec![poly("a", 1), poly("b", 2), poly("c", 3)]);
    m.set_visible(&"b".into(), false);

    assert_eq!(m.select_next(), Some(AnnotationId::from("c")));
    assert_eq!(m.select_next(), Some(AnnotationId::from("a")));
    assert_eq!(m.select_next(), Some(AnnotationId::from("c")));
    assert_eq!(m.select_previous(), Some(AnnotationId::from("a")));
    assert_eq!(
        m.annotations().iter().filter(|a| a.is_selected).count(),
        1
    );
    m.deselect_all();
    assert!(m.selected().is_none());
    assert!(!m.select(&"zz".into()));
}

#[test]
fn find_top_at_prefers_highest_z_and_skips_hidden() {
    let (mut m, _, _) = manager();
    m.set_annotations(vec![poly("low", 1), poly("high", 2)]);
    let p = Point::new(5.0, 5.0);
    let hit = m.find_top_at(p, 0.0, FrameIndex(0), |_| true).unwrap();
    assert_eq!(hit.id.as_str(), "high");

    m.set_visible(&"high".into(), false);
    let hit = m.find_top_at(p, 0.0, FrameIndex(0), |_| true).unwrap();
    assert_eq!(hit.id.as_str(), "low");
    assert!(m.find_top_at(Point::new(50.0, 50.0), 0.0, FrameIndex(0), |_| true).is_none());
}

#[test]
fn video_inference_interpolates_through_renderer() {
    let (m, _, _) = manager();
    let mut video = VideoAnnotationData::single(FrameIndex(0), kp(0.0, 0.0));
    video.insert_keyframe(FrameIndex(10), kp(10.0, 20.0));
    video.segments = vec![FrameRange::new(FrameIndex(0), FrameIndex(11)).unwrap()];
    let a = Annotation::new_video("keypoint", 1, video);

    let mid = m.infer_video_data(&a, FrameIndex(5)).unwrap().unwrap();
    assert!(mid.interpolated);
    assert_eq!(mid.data, kp(5.0, 10.0));
    assert!(m.infer_video_data(&a, FrameIndex(11)).unwrap().is_none());
    assert_eq!(m.data_at(&a, FrameIndex(10)).unwrap().into_owned(), kp(10.0, 20.0));
}

#[test]
fn static_annotations_have_no_video_inference() {
    let (mut m, _, _) = manager();
    let a = poly("a", 1);
    assert!(m.infer_video_data(&a, FrameIndex(0)).is_err());
    m.set_annotations(vec![a]);
    assert!(m.video_sub_annotations(&"a".into(), FrameIndex(0)).is_err());
}

#[test]
fn sub_annotations_attach_to_video_frame() {
    let (mut m, _, _) = manager();
    let mut video = VideoAnnotationData::single(FrameIndex(0), kp(0.0, 0.0));
    video.segments = vec![FrameRange::new(FrameIndex(0), FrameIndex(10)).unwrap()];
    m.set_annotations(vec![Annotation::new_video("keypoint", 1, video).with_id("v")]);

    let sub = SubAnnotations {
        text: Some("car".to_string()),
        ..SubAnnotations::default()
    };
    let updated = m
        .with_sub_annotations(&"v".into(), sub.clone(), FrameIndex(3))
        .unwrap();
    m.update_local(updated);
    assert_eq!(
        m.video_sub_annotations(&"v".into(), FrameIndex(7)).unwrap(),
        Some(sub)
    );
    assert_eq!(
        m.video_sub_annotations(&"v".into(), FrameIndex(1)).unwrap(),
        Some(SubAnnotations::default())
    );
    assert!(
        m.with_sub_annotations(&"v".into(), SubAnnotations::default(), FrameIndex(12))
            .is_err()
    );
}

#[test]
fn stage_events_apply_in_bulk() {
    let (mut m, _, _) = manager();
    m.set_annotations(vec![poly("a", 1), poly("b", 2), poly("c", 3)]);
    m.take_changes();

    let (tx, rx) = crossbeam_channel::unbounded();
    m.connect_stage_events(rx);
    tx.send(StageEvent::Removed(vec!["a".into(), "c".into()])).unwrap();
    tx.send(StageEvent::Added(vec![poly("d", 5)])).unwrap();
    assert_eq!(m.sync_stage_events(), 2);
    assert_eq!(ids(&m), ["d", "b"]);
    assert_eq!(m.get(&"b".into()).unwrap().z_index, 2);
    assert_eq!(
        m.take_changes(),
        vec![
            AnnotationChange::Removed("a".into()),
            AnnotationChange::Removed("c".into()),
            AnnotationChange::Inserted("d".into()),
        ]
    );
    assert_eq!(m.sync_stage_events(), 0);
}

#[test]
fn persist_create_rolls_back_on_rejection() {
    let (mut m, bridge, notifier) = manager();
    assert!(pollster::block_on(m.persist_create(poly("a", 1))));
    assert_eq!(bridge.len(), 1);

    bridge.set_failing(PersistOp::Create, true);
    assert!(!pollster::block_on(m.persist_create(poly("b", 2))));
    assert!(!m.contains(&"b".into()));
    assert_eq!(notifier.warning_count(), 1);
}

#[test]
fn rejected_create_over_a_stored_id_restores_it() {
    let (mut m, bridge, notifier) = manager();
    m.set_annotations(vec![poly("a", 1)]);
    bridge.set_failing(PersistOp::Create, true);

    let mut replacement = poly("a", 1);
    replacement.body = AnnotationBody::Static {
        data: square(5.0, 5.0, 1.0),
        sub: SubAnnotations::default(),
    };
    assert!(!pollster::block_on(m.persist_create(replacement)));
    assert!(m.contains(&"a".into()));
    assert_eq!(
        m.get(&"a".into()).unwrap().static_data(),
        Some(&square(0.0, 0.0, 10.0))
    );
    assert_eq!(notifier.warning_count(), 1);
}

#[test]
fn stage_updates_keep_host_z_indices() {
    let (mut m, _, _) = manager();
    m.set_annotations(vec![poly("a", 1), poly("b", 2), poly("c", 3)]);
    m.apply_stage_event(StageEvent::Updated(vec![poly("a", 3)]));

    let z = |id: &str| m.get(&id.into()).unwrap().z_index;
    assert_eq!((z("a"), z("b"), z("c")), (3, 2, 3));

    m.update_local(poly("b", 3));
    let z = |id: &str| m.get(&id.into()).unwrap().z_index;
    assert_eq!((z("a"), z("b")), (2, 3));
}

#[test]
fn persist_update_and_delete_restore_previous_state_on_rejection() {
    let (mut m, bridge, notifier) = manager();
    m.set_annotations(vec![poly("a", 1)]);
    bridge.set_failing(PersistOp::Update, true);
    bridge.set_failing(PersistOp::Delete, true);

    let mut moved = poly("a", 1);
    moved.body = AnnotationBody::Static {
        data: square(3.0, 3.0, 2.0),
        sub: SubAnnotations::default(),
    };
    assert!(!pollster::block_on(m.persist_update(moved)));
    assert_eq!(
        m.get(&"a".into()).unwrap().static_data(),
        Some(&square(0.0, 0.0, 10.0))
    );

    assert!(!pollster::block_on(m.persist_delete(&"a".into())));
    assert!(m.contains(&"a".into()));
    assert_eq!(notifier.warning_count(), 2);
    assert_eq!(bridge.update_calls(), 1);
    assert_eq!(bridge.delete_calls(), 1);
}
