use super::*;

use std::rc::Rc;

use crate::actions::manager::ActionManager;
use crate::foundation::notice::RecordingNotifier;
use crate::model::annotation::AnnotationId;
use crate::model::shapes::KeypointData;
use crate::persist::memory::MemoryBridge;
use crate::render::registry::RendererRegistry;

fn ring(v: &[(f64, f64)]) -> Vec<Point> {
    v.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

fn polygon(id: &str, z: i64, v: &[(f64, f64)]) -> Annotation {
    Annotation::new_static(
        "polygon",
        1,
        AnnotationData::Polygon(PolygonData::new(ring(v))),
    )
    .with_id(id)
    .with_z_index(z)
}

fn a() -> Annotation {
    polygon("a", 1, &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)])
}

fn b() -> Annotation {
    polygon("b", 2, &[(5.0, 5.0), (5.0, 15.0), (15.0, 15.0), (15.0, 5.0)])
}

fn path_of(store: &AnnotationManager, id: &str) -> Vec<Point> {
    match store.get(&AnnotationId::from(id)).and_then(|a| a.static_data()) {
        Some(AnnotationData::Polygon(p)) => p.path.clone(),
        other => panic!("expected polygon, got {other:?}"),
    }
}

fn setup() -> (AnnotationManager, Rc<MemoryBridge>, Rc<RecordingNotifier>) {
    let bridge = Rc::new(MemoryBridge::new());
    let notifier = Rc::new(RecordingNotifier::new());
    let mut store = AnnotationManager::new(
        RendererRegistry::with_builtins(),
        bridge.clone(),
        notifier.clone(),
    );
    store.set_annotations(vec![a(), b()]);
    (store, bridge, notifier)
}

#[test]
fn merge_unions_into_target_and_deletes_other() {
    let (mut store, _, _) = setup();
    let mut history = ActionManager::new(10);
    let merge = MergePolygons::new(&a(), &b()).unwrap();
    assert!(pollster::block_on(history.commit(Box::new(merge), &mut store)));

    assert_eq!(
        path_of(&store, "a"),
        ring(&[
            (15.0, 15.0),
            (15.0, 5.0),
            (10.0, 5.0),
            (10.0, 0.0),
            (0.0, 0.0),
            (0.0, 10.0),
            (5.0, 10.0),
            (5.0, 15.0),
        ])
    );
    assert!(!store.contains(&"b".into()));

    assert!(pollster::block_on(history.undo(&mut store)));
    assert_eq!(path_of(&store, "a"), a_path());
    assert_eq!(store.get(&"b".into()), Some(&b()));
}

fn a_path() -> Vec<Point> {
    ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)])
}

#[test]
fn subtract_keeps_uncovered_part_of_cutter() {
    let (mut store, _, _) = setup();
    let mut history = ActionManager::new(10);
    let subtract = SubtractPolygons::new(&a(), &b()).unwrap();
    assert!(pollster::block_on(history.commit(Box::new(subtract), &mut store)));
    assert_eq!(
        path_of(&store, "a"),
        ring(&[
            (15.0, 15.0),
            (15.0, 5.0),
            (10.0, 5.0),
            (10.0, 10.0),
            (5.0, 10.0),
            (5.0, 15.0),
        ])
    );
    assert_eq!(store.get(&"b".into()), Some(&b()));

    assert!(pollster::block_on(history.undo(&mut store)));
    assert_eq!(path_of(&store, "a"), a_path());
}

#[test]
fn subtracting_identical_shape_fails_without_persisting() {
    let (mut store, bridge, notifier) = setup();
    let mut history = ActionManager::new(10);
    let twin = polygon("twin", 3, &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
    store.insert_local(twin.clone());

    let subtract = SubtractPolygons::new(&a(), &twin).unwrap();
    assert!(subtract.result().is_none());
    assert!(!pollster::block_on(history.commit(Box::new(subtract), &mut store)));
    assert_eq!(notifier.warning_count(), 1);
    assert_eq!(bridge.update_calls(), 0);
    assert_eq!(bridge.delete_calls(), 0);
    assert_eq!(path_of(&store, "a"), a_path());
    assert!(!history.can_undo());
}

#[test]
fn boolean_edits_require_static_polygons() {
    let point = Annotation::new_static(
        "keypoint",
        1,
        AnnotationData::Keypoint(KeypointData {
            point: Point::new(1.0, 1.0),
        }),
    );
    assert!(MergePolygons::new(&a(), &point).is_err());
    assert!(SubtractPolygons::new(&point, &a()).is_err());
    assert!(MergePolygons::new(&a(), &a()).is_err());
}
