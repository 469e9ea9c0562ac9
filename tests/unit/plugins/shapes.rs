use super::*;

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::foundation::core::{ImageSize, Rgba8};
use crate::foundation::notice::RecordingNotifier;
use crate::managers::item::ItemInfo;
use crate::model::annotation::AnnotationClass;
use crate::view::pane::ViewServices;

fn editor(notices: &Rc<RecordingNotifier>) -> Editor {
    let services = ViewServices {
        notifier: notices.clone(),
        ..ViewServices::in_memory()
    };
    let mut editor = Editor::new(EditorConfig::default(), services).unwrap();
    editor.add_view(100.0, 100.0);
    editor.install_all_plugins().unwrap();
    let view = editor.active_view_mut().unwrap();
    view.set_classes([AnnotationClass {
        id: 2,
        name: "sign".to_string(),
        color: Rgba8::new(255, 255, 0, 255),
        annotation_types: vec!["bounding_box".to_string(), "tag".to_string()],
    }]);
    view.set_active_class(Some(2));
    editor
        .set_item(ItemInfo::image("img", ImageSize::new(100, 100)))
        .unwrap();
    pollster::block_on(editor.run_pending());
    editor
}

fn only_data(editor: &Editor) -> AnnotationData {
    let store = editor.active_view().unwrap().annotations();
    assert_eq!(store.len(), 1);
    store.annotations()[0].static_data().cloned().unwrap()
}

#[test]
fn drag_shapes_need_an_area() {
    let a = Point::new(10.0, 10.0);
    assert!(DragShape::BoundingBox.data(a, Point::new(10.0, 30.0)).is_none());
    assert!(DragShape::Ellipse.data(a, Point::new(20.0, 10.0)).is_none());
    let Some(AnnotationData::Ellipse(e)) = DragShape::Ellipse.data(a, Point::new(4.0, 15.0)) else {
        panic!("expected an ellipse");
    };
    assert_eq!(e.center, a);
    assert!((e.radius_x() - 6.0).abs() < 1e-9);
    assert!((e.radius_y() - 5.0).abs() < 1e-9);
}

#[test]
fn bounding_box_follows_the_drag() {
    let notices = Rc::new(RecordingNotifier::new());
    let mut editor = editor(&notices);
    editor.activate_tool("bounding_box_tool").unwrap();

    editor.pointer_down(&PointerEvent::at(30.0, 40.0));
    editor.pointer_move(&PointerEvent::at(10.0, 10.0));
    assert_eq!(
        editor.active_view().unwrap().drawing().map(|(t, _)| t),
        Some("bounding_box")
    );
    editor.pointer_up(&PointerEvent::at(10.0, 10.0));
    pollster::block_on(editor.run_pending());

    let AnnotationData::BoundingBox(b) = only_data(&editor) else {
        panic!("expected a box");
    };
    assert_eq!((b.rect.x0, b.rect.y0, b.rect.x1, b.rect.y1), (10.0, 10.0, 30.0, 40.0));
}

#[test]
fn keypoint_is_placed_per_click() {
    let notices = Rc::new(RecordingNotifier::new());
    let mut editor = editor(&notices);
    editor.activate_tool("keypoint_tool").unwrap();
    editor.pointer_down(&PointerEvent::at(12.0, 34.0));
    pollster::block_on(editor.run_pending());
    assert_eq!(
        only_data(&editor),
        AnnotationData::Keypoint(KeypointData {
            point: Point::new(12.0, 34.0)
        })
    );
}

#[test]
fn polyline_finishes_on_its_last_vertex() {
    let notices = Rc::new(RecordingNotifier::new());
    let mut editor = editor(&notices);
    editor.activate_tool("polyline_tool").unwrap();
    for (x, y) in [(10.0, 10.0), (40.0, 10.0), (40.0, 10.5)] {
        editor.pointer_down(&PointerEvent::at(x, y));
    }
    pollster::block_on(editor.run_pending());
    let AnnotationData::Polyline(line) = only_data(&editor) else {
        panic!("expected a polyline");
    };
    assert_eq!(line.path, vec![Point::new(10.0, 10.0), Point::new(40.0, 10.0)]);
}

#[test]
fn polygon_draft_edits_with_keys() {
    let notices = Rc::new(RecordingNotifier::new());
    let mut editor = editor(&notices);
    editor.activate_tool("polygon_tool").unwrap();
    for (x, y) in [(10.0, 10.0), (60.0, 10.0), (60.0, 60.0), (90.0, 90.0)] {
        editor.pointer_down(&PointerEvent::at(x, y));
    }
    assert_eq!(editor.key_down(&KeyEvent::key("backspace")), CallbackStatus::Stop);
    assert_eq!(editor.key_down(&KeyEvent::key("enter")), CallbackStatus::Stop);
    pollster::block_on(editor.run_pending());

    let AnnotationData::Polygon(p) = only_data(&editor) else {
        panic!("expected a polygon");
    };
    assert_eq!(p.path.len(), 3);
    assert_eq!(p.path[2], Point::new(60.0, 60.0));
}

#[test]
fn escape_cancels_a_draft_before_deselecting() {
    let notices = Rc::new(RecordingNotifier::new());
    let mut editor = editor(&notices);
    editor.activate_tool("polygon_tool").unwrap();
    editor.pointer_down(&PointerEvent::at(10.0, 10.0));
    editor.pointer_down(&PointerEvent::at(20.0, 10.0));

    assert_eq!(editor.key_down(&KeyEvent::key("escape")), CallbackStatus::Stop);
    assert!(editor.active_view().unwrap().drawing().is_none());
    editor.key_down(&KeyEvent::key("enter"));
    pollster::block_on(editor.run_pending());
    assert!(editor.active_view().unwrap().annotations().is_empty());
}

#[test]
fn close_command_needs_three_vertices() {
    let notices = Rc::new(RecordingNotifier::new());
    let mut editor = editor(&notices);
    editor.activate_tool("polygon_tool").unwrap();
    editor.pointer_down(&PointerEvent::at(10.0, 10.0));
    editor.pointer_down(&PointerEvent::at(20.0, 10.0));
    editor.run_command("polygon_tool.close").unwrap();
    pollster::block_on(editor.run_pending());
    assert!(editor.active_view().unwrap().annotations().is_empty());
}

#[test]
fn close_points_are_skipped() {
    let notices = Rc::new(RecordingNotifier::new());
    let mut editor = editor(&notices);
    let tool = Rc::new(RefCell::new(PathTool::polygon()));
    let _h = editor.registry().tools.register("probe_polygon", tool.clone());
    editor.activate_tool("probe_polygon").unwrap();
    editor.pointer_down(&PointerEvent::at(10.0, 10.0));
    editor.pointer_down(&PointerEvent::at(10.5, 10.0));
    editor.pointer_down(&PointerEvent::at(30.0, 10.0));
    assert_eq!(
        tool.borrow().points(),
        vec![Point::new(10.0, 10.0), Point::new(30.0, 10.0)]
    );
}

#[test]
fn tag_is_applied_once_per_class() {
    let notices = Rc::new(RecordingNotifier::new());
    let mut editor = editor(&notices);
    editor.run_command("tag_tool.apply").unwrap();
    pollster::block_on(editor.run_pending());
    editor.run_command("tag_tool.apply").unwrap();
    pollster::block_on(editor.run_pending());

    assert_eq!(only_data(&editor), AnnotationData::Tag);
    assert_eq!(notices.warning_count(), 1);
    assert_eq!(
        notices.notices().last().map(|n| n.content.as_str()),
        Some("This tag is already applied")
    );
}
