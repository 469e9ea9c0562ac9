use super::*;

use crate::foundation::core::ImageSize;
use crate::foundation::notice::RecordingNotifier;
use crate::managers::measure::DRAWING_ANNOTATION_ID;
use crate::model::shapes::BoundingBoxData;
use crate::persist::bridge::PersistOp;

struct Fixture {
    view: View,
    bridge: Rc<MemoryBridge>,
    notices: Rc<RecordingNotifier>,
}

fn fixture() -> Fixture {
    let bridge = Rc::new(MemoryBridge::new());
    let notices = Rc::new(RecordingNotifier::new());
    let services = ViewServices {
        bridge: bridge.clone(),
        notifier: notices.clone(),
        provider: Rc::new(BlankProvider),
        scheduler: Rc::new(ManualScheduler::new()),
    };
    let mut view = View::new(
        &EditorConfig::default(),
        RendererRegistry::with_builtins(),
        services,
        100.0,
        100.0,
    );
    view.set_classes([AnnotationClass {
        id: 1,
        name: "car".to_string(),
        color: Rgba8::new(255, 0, 0, 255),
        annotation_types: vec!["bounding_box".to_string()],
    }]);
    view.set_item(ItemInfo::image("img", ImageSize::new(100, 100)));
    pollster::block_on(view.run_pending());
    Fixture {
        view,
        bridge,
        notices,
    }
}

fn bbox() -> AnnotationData {
    AnnotationData::BoundingBox(BoundingBoxData::from_corners(
        Point::new(10.0, 10.0),
        Point::new(40.0, 30.0),
    ))
}

fn video(frames: u64) -> ItemInfo {
    ItemInfo::video("clip", ImageSize::new(100, 100), frames, None)
}

fn always(_: &Annotation) -> bool {
    true
}

#[test]
fn drawing_without_a_class_warns() {
    let mut f = fixture();
    assert_eq!(f.view.queue_create("bounding_box", bbox()), None);
    assert_eq!(f.view.pending_len(), 0);
    assert_eq!(f.notices.warning_count(), 1);
    assert_eq!(f.notices.notices()[0].content, "Select a class before drawing");
}

#[test]
fn created_annotation_goes_through_history() {
    let mut f = fixture();
    f.view.set_active_class(Some(1));

    let id = pollster::block_on(f.view.create_annotation("bounding_box", bbox())).unwrap();
    assert!(f.view.annotations().contains(&id));
    assert_eq!(f.bridge.create_calls(), 1);
    assert!(f.view.actions().can_undo());

    f.view.undo();
    assert_eq!(pollster::block_on(f.view.run_pending()), 1);
    assert!(!f.view.annotations().contains(&id));
    assert_eq!(f.bridge.delete_calls(), 1);

    f.view.redo();
    pollster::block_on(f.view.run_pending());
    assert!(f.view.annotations().contains(&id));
}

#[test]
fn rejected_create_is_rolled_back() {
    let mut f = fixture();
    f.view.set_active_class(Some(1));
    f.bridge.set_failing(PersistOp::Create, true);

    assert_eq!(pollster::block_on(f.view.create_annotation("bounding_box", bbox())), None);
    assert!(f.view.annotations().is_empty());
    assert!(!f.view.actions().can_undo());
    assert_eq!(f.notices.warning_count(), 1);
}

#[test]
fn switching_items_clears_history_and_queue() {
    let mut f = fixture();
    f.view.set_active_class(Some(1));
    pollster::block_on(f.view.create_annotation("bounding_box", bbox())).unwrap();
    f.view.queue_create("bounding_box", bbox());

    f.view.set_item(ItemInfo::image("other", ImageSize::new(50, 50)));
    assert!(!f.view.actions().can_undo());
    assert_eq!(f.view.pending_len(), 1);
    assert!(f.view.is_loading());
    pollster::block_on(f.view.run_pending());
    assert!(!f.view.is_loading());
    assert_eq!(f.view.camera().image(), ImageSize::new(50, 50));
}

#[test]
fn frame_jumps_keep_history() {
    let mut f = fixture();
    f.view.set_item(video(10));
    pollster::block_on(f.view.run_pending());
    f.view.set_active_class(Some(1));
    pollster::block_on(f.view.create_annotation("bounding_box", bbox())).unwrap();

    assert_eq!(f.view.jump_to_frame(FrameIndex(20)).unwrap(), FrameIndex(9));
    f.view.jump_to_frame(FrameIndex(4)).unwrap();
    assert_eq!(f.view.pending_len(), 1);
    pollster::block_on(f.view.run_pending());
    assert_eq!(f.view.frame(), FrameIndex(4));
    assert!(f.view.actions().can_undo());
}

#[test]
fn video_annotations_start_as_one_keyframe() {
    let mut f = fixture();
    f.view.set_item(video(10));
    pollster::block_on(f.view.run_pending());
    f.view.jump_to_frame(FrameIndex(3)).unwrap();
    pollster::block_on(f.view.run_pending());
    f.view.set_active_class(Some(1));

    let id = pollster::block_on(f.view.create_annotation("bounding_box", bbox())).unwrap();
    let stored = f.view.annotations().get(&id).unwrap();
    let track = stored.video().unwrap();
    assert_eq!(track.frames.keys().copied().collect::<Vec<_>>(), vec![FrameIndex(3)]);
    assert!(track.segment_at(FrameIndex(3)).is_some());
}

#[test]
fn playback_needs_a_video_and_wraps_after_the_last_frame() {
    let mut f = fixture();
    assert!(f.view.play().is_err());

    f.view.set_item(video(2));
    pollster::block_on(f.view.run_pending());
    f.view.play().unwrap();
    assert_eq!(f.view.tick_playback().unwrap(), Some(FrameIndex(1)));
    assert_eq!(f.view.tick_playback().unwrap(), None);
    pollster::block_on(f.view.run_pending());
    assert_eq!(f.view.frame(), FrameIndex(1));

    assert_eq!(f.view.tick_playback().unwrap(), Some(FrameIndex(0)));
    pollster::block_on(f.view.run_pending());
    assert_eq!(f.view.frame(), FrameIndex(0));
    assert!(f.view.playback().is_playing());
}

#[test]
fn switching_items_resets_the_window_level() {
    let mut f = fixture();
    f.view.set_window_level(WindowLevel::default().dragged(Vec2::new(40.0, 20.0)));
    assert_ne!(f.view.window_level(), WindowLevel::default());
    f.view.set_item(ItemInfo::image("other", ImageSize::new(100, 100)));
    assert_eq!(f.view.window_level(), WindowLevel::default());
}

#[test]
fn host_item_changes_switch_the_item() {
    let mut f = fixture();
    f.view.set_active_class(Some(1));
    pollster::block_on(f.view.create_annotation("bounding_box", bbox())).unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();
    f.view.connect_item_changes(rx);
    assert!(!f.view.sync_item_change());

    tx.send(ItemInfo::image("first", ImageSize::new(60, 60))).unwrap();
    tx.send(video(5)).unwrap();
    pollster::block_on(f.view.run_pending());
    assert_eq!(f.view.items().item().map(|i| i.id.as_str()), Some("clip"));
    assert_eq!(f.view.items().frame_count(), 5);
    assert!(!f.view.is_loading());
    assert!(!f.view.actions().can_undo());
    assert!(!f.view.sync_item_change());
}

#[test]
fn refresh_derives_overlays_and_measures() {
    let mut f = fixture();
    f.view.set_active_class(Some(1));
    let id = pollster::block_on(f.view.create_annotation("bounding_box", bbox())).unwrap();

    f.view.refresh(&always);
    let overlay = f.view.overlays().get(&id).unwrap();
    assert_eq!(overlay.label, "car");
    assert!(f.view.measures().get(id.as_str()).is_some());

    f.view.refresh(&|a: &Annotation| a.id != id);
    assert!(f.view.overlays().get(&id).is_some());
    f.view.mark_stale();
    f.view.refresh(&|a: &Annotation| a.id != id);
    assert!(f.view.overlays().get(&id).is_none());
}

#[test]
fn drawing_preview_is_measured_until_cleared() {
    let mut f = fixture();
    f.view.set_drawing("bounding_box", bbox());
    assert_eq!(f.view.drawing().map(|(t, _)| t), Some("bounding_box"));
    assert!(f.view.measures().get(DRAWING_ANNOTATION_ID).is_some());

    f.view.clear_drawing();
    assert!(f.view.drawing().is_none());
    assert!(f.view.measures().get(DRAWING_ANNOTATION_ID).is_none());
}

#[test]
fn redraw_only_when_a_layer_is_dirty() {
    let mut f = fixture();
    f.view.refresh(&always);
    let frame = f.view.redraw(&always).unwrap().unwrap();
    assert_eq!((frame.width, frame.height), (100, 100));
    assert!(f.view.redraw(&always).unwrap().is_none());

    f.view.set_window_level(WindowLevel::default().dragged(Vec2::new(10.0, -5.0)));
    assert!(f.view.layers().main.is_dirty());
    assert!(f.view.redraw(&always).unwrap().is_some());
}

#[test]
fn window_level_width_stays_positive() {
    let level = WindowLevel::default().dragged(Vec2::new(-1000.0, 3.0));
    assert_eq!(level.width, 1.0);
    assert_eq!(level.center, 130.5);
}

#[test]
fn camera_moves_dirty_every_layer() {
    let mut f = fixture();
    f.view.refresh(&always);
    f.view.redraw(&always).unwrap();

    f.view.zoom(2.0, Point::new(50.0, 50.0));
    assert!(f.view.layers().iter().all(|l| l.is_dirty()));
    assert_eq!(f.view.camera().scale(), 2.0);
}
