use super::*;

fn region(unit: &str, high: bool) -> MeasureRegion {
    MeasureRegion {
        rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        delta: Vec2::new(0.5, 0.5),
        unit: unit.to_string(),
        high_priority: high,
    }
}

#[test]
fn set_item_schedules_first_frame() {
    let mut items = ItemManager::new(Rc::new(BlankProvider));
    assert!(!items.is_loading());
    items.set_item(ItemInfo::video("v", ImageSize::new(4, 4), 10, None));
    assert!(items.is_loading());
    assert_eq!(pollster::block_on(items.finish_loading()).unwrap(), Some(FrameIndex(0)));
    assert!(!items.is_loading());
    assert_eq!(items.frame_data().unwrap().size, ImageSize::new(4, 4));
}

#[test]
fn requested_frames_are_clamped() {
    let mut items = ItemManager::new(Rc::new(BlankProvider));
    assert!(items.request_frame(FrameIndex(3)).is_err());
    items.set_item(ItemInfo::video("v", ImageSize::new(4, 4), 10, None));
    assert_eq!(items.request_frame(FrameIndex(30)).unwrap(), FrameIndex(9));
    pollster::block_on(items.finish_loading()).unwrap();
    assert_eq!(items.frame(), FrameIndex(9));
}

#[test]
fn fps_falls_back_when_unknown() {
    let mut items = ItemManager::new(Rc::new(BlankProvider));
    items.set_item(ItemInfo::video("v", ImageSize::new(4, 4), 10, None));
    assert_eq!(items.fps(25.0).unwrap().as_f64(), 25.0);
    items.set_item(ItemInfo::video(
        "w",
        ImageSize::new(4, 4),
        10,
        Some(Fps::new(12, 1).unwrap()),
    ));
    assert_eq!(items.fps(25.0).unwrap().as_f64(), 12.0);
}

#[test]
fn measure_region_prefers_high_priority_and_hides_while_loading() {
    let mut items = ItemManager::new(Rc::new(BlankProvider));
    assert!(items.measure_region().is_none());

    let mut video = ItemInfo::video("v", ImageSize::new(4, 4), 10, None);
    video.measure_regions = vec![region("mm", false), region("cm", true)];
    items.set_item(video);
    assert!(items.measure_region().is_none());
    pollster::block_on(items.finish_loading()).unwrap();
    assert_eq!(items.measure_region().unwrap().unit, "cm");

    items.set_item(ItemInfo::image("i", ImageSize::new(8, 6)));
    pollster::block_on(items.finish_loading()).unwrap();
    let r = items.measure_region().unwrap();
    assert_eq!((r.unit.as_str(), r.rect), ("px", Rect::new(0.0, 0.0, 8.0, 6.0)));
}

#[test]
fn poll_change_returns_latest_announcement() {
    let mut items = ItemManager::new(Rc::new(BlankProvider));
    assert!(items.poll_change().is_none());
    let (tx, rx) = crossbeam_channel::unbounded();
    items.connect_changes(rx);
    tx.send(ItemInfo::image("a", ImageSize::new(1, 1))).unwrap();
    tx.send(ItemInfo::image("b", ImageSize::new(1, 1))).unwrap();
    assert_eq!(items.poll_change().unwrap().id, "b");
    assert!(items.poll_change().is_none());
}
