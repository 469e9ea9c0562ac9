use super::*;

use crate::model::shapes::AnnotationData;

#[test]
fn stores_updates_and_deletes() {
    let bridge = MemoryBridge::new();
    let a = Annotation::new_static("tag", 1, AnnotationData::Tag);

    let created = pollster::block_on(bridge.create(&a)).unwrap();
    assert_eq!(created, a);
    assert_eq!(bridge.len(), 1);

    let mut b = a.clone();
    b.z_index = 4;
    pollster::block_on(bridge.update(&b)).unwrap();
    assert_eq!(bridge.stored(&a.id).map(|s| s.z_index), Some(4));

    pollster::block_on(bridge.delete(&b)).unwrap();
    assert!(bridge.is_empty());
    assert_eq!(
        (bridge.create_calls(), bridge.update_calls(), bridge.delete_calls()),
        (1, 1, 1)
    );
}

#[test]
fn injected_failures_count_calls_and_store_nothing() {
    let bridge = MemoryBridge::new();
    bridge.set_failing(PersistOp::Create, true);
    let a = Annotation::new_static("tag", 1, AnnotationData::Tag);

    let err = pollster::block_on(bridge.create(&a)).unwrap_err();
    assert_eq!(err.op, PersistOp::Create);
    assert_eq!(err.id, a.id);
    assert_eq!(bridge.create_calls(), 1);
    assert!(bridge.is_empty());

    bridge.set_failing(PersistOp::Create, false);
    assert!(pollster::block_on(bridge.create(&a)).is_ok());
}

#[test]
fn persist_error_converts_to_engine_error() {
    let err = PersistError::new(PersistOp::Delete, AnnotationId::from("x"), "gone");
    let e: crate::foundation::error::CanvasmarkError = err.into();
    assert_eq!(e.to_string(), "persistence error: delete of annotation x failed: gone");
}
