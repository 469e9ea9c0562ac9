use super::*;

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::foundation::core::{ImageSize, Rgba8};
use crate::managers::item::ItemInfo;
use crate::model::annotation::{AnnotationClass, AnnotationId};
use crate::view::pane::ViewServices;

fn editor() -> (Editor, Rc<RefCell<BrushTool>>) {
    let mut editor = Editor::new(EditorConfig::default(), ViewServices::in_memory()).unwrap();
    editor.add_view(100.0, 100.0);
    editor.install_all_plugins().unwrap();
    let view = editor.active_view_mut().unwrap();
    view.set_classes([AnnotationClass {
        id: 1,
        name: "area".to_string(),
        color: Rgba8::new(0, 128, 255, 255),
        annotation_types: vec!["polygon".to_string()],
    }]);
    view.set_active_class(Some(1));
    editor
        .set_item(ItemInfo::image("img", ImageSize::new(100, 100)))
        .unwrap();
    pollster::block_on(editor.run_pending());

    let tool = Rc::new(RefCell::new(BrushTool::new()));
    let _ = editor.registry().tools.register("probe_brush", tool.clone());
    editor.activate_tool("probe_brush").unwrap();
    (editor, tool)
}

fn polygon(editor: &Editor, id: &AnnotationId) -> PolygonData {
    let view = editor.active_view().unwrap();
    match view.annotations().get(id).and_then(|a| a.static_data()) {
        Some(AnnotationData::Polygon(p)) => p.clone(),
        other => panic!("expected a polygon, got {other:?}"),
    }
}

#[test]
fn radius_starts_from_config_and_follows_brackets() {
    let (mut editor, tool) = editor();
    assert_eq!(tool.borrow().radius(), 10.0);

    assert_eq!(editor.key_down(&KeyEvent::key("[")), CallbackStatus::Stop);
    assert_eq!(tool.borrow().radius(), 8.0);
    editor.key_down(&KeyEvent::key("]"));
    assert_eq!(tool.borrow().radius(), 10.0);

    for _ in 0..20 {
        editor.key_down(&KeyEvent::key("["));
    }
    assert_eq!(tool.borrow().radius(), 1.0);
}

#[test]
fn stroke_without_selection_creates_a_polygon() {
    let (mut editor, _) = editor();
    editor.pointer_down(&PointerEvent::at(50.0, 50.0));
    assert_eq!(
        editor.active_view().unwrap().drawing().map(|(t, _)| t),
        Some("polygon")
    );
    editor.pointer_move(&PointerEvent::at(60.0, 50.0));
    editor.pointer_up(&PointerEvent::at(60.0, 50.0));
    pollster::block_on(editor.run_pending());

    let view = editor.active_view().unwrap();
    assert!(view.drawing().is_none());
    assert_eq!(view.annotations().len(), 1);
    let id = view.annotations().annotations()[0].id.clone();
    let p = polygon(&editor, &id);
    assert!(ring::rings_contain_point(&p.rings(), Point::new(55.0, 50.0)));
    assert!(p.path.iter().all(|v| v.x >= 39.0 && v.x <= 71.0));
}

#[test]
fn stroke_grows_the_selected_polygon() {
    let (mut editor, _) = editor();
    let square = vec![
        Point::new(10.0, 10.0),
        Point::new(40.0, 10.0),
        Point::new(40.0, 40.0),
        Point::new(10.0, 40.0),
    ];
    let view = editor.active_view_mut().unwrap();
    let id = view
        .queue_create("polygon", AnnotationData::Polygon(PolygonData::new(square.clone())))
        .unwrap();
    pollster::block_on(editor.run_pending());
    editor.active_view_mut().unwrap().annotations_mut().select(&id);

    editor.pointer_down(&PointerEvent::at(42.0, 25.0));
    assert!(editor.active_view().unwrap().overlays().get(&id).is_none());
    editor.pointer_up(&PointerEvent::at(42.0, 25.0));
    pollster::block_on(editor.run_pending());

    let view = editor.active_view().unwrap();
    assert_eq!(view.annotations().len(), 1);
    let grown = polygon(&editor, &id);
    assert!(ring::rings_contain_point(&grown.rings(), Point::new(48.0, 25.0)));
    assert!(ring::rings_contain_point(&grown.rings(), Point::new(15.0, 15.0)));

    editor.active_view_mut().unwrap().undo();
    pollster::block_on(editor.run_pending());
    assert_eq!(polygon(&editor, &id).path, square);
}
