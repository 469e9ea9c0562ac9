//! Drawing plugins, one per built-in annotation type.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::editor::ToolContext;
use crate::foundation::callback::CallbackStatus;
use crate::foundation::core::Point;
use crate::foundation::error::CanvasmarkResult;
use crate::foundation::input::{KeyEvent, PointerEvent};
use crate::managers::plugin::{Plugin, PluginContext};
use crate::managers::tool::{Tool, ToolSetup};
use crate::model::annotation::AnnotationId;
use crate::model::shapes::{
    AnnotationData, BoundingBoxData, EllipseData, KeypointData, PolygonData, PolylineData,
};
use crate::plugins::navigation::setup_navigation;
use crate::plugins::{register_tool_with_commands, register_type};
use crate::render::renderers::{
    BoundingBoxRenderer, EllipseRenderer, KeypointRenderer, PolygonRenderer, PolylineRenderer,
    TagRenderer,
};
use crate::serialize::builtin::{
    BoundingBoxSerializer, EllipseSerializer, KeypointSerializer, PolygonSerializer,
    PolylineSerializer, TagSerializer,
};
use crate::view::pane::View;

// ---- click-by-click paths (polygon, polyline) ----------------------------------------------------

#[derive(Debug, Default)]
struct PathDraft {
    points: Vec<Point>,
    cursor: Option<Point>,
}

/// Click-by-click path drawing. Closed paths become polygons, open ones polylines.
#[derive(Debug)]
pub struct PathTool {
    closed: bool,
    draft: Rc<RefCell<PathDraft>>,
}

impl PathTool {
    /// Polygon drawing: closes on the first vertex.
    pub fn polygon() -> Self {
        Self {
            closed: true,
            draft: Rc::default(),
        }
    }

    /// Polyline drawing: finishes on the last vertex.
    pub fn polyline() -> Self {
        Self {
            closed: false,
            ..Self::polygon()
        }
    }

    /// Vertices placed so far.
    pub fn points(&self) -> Vec<Point> {
        self.draft.borrow().points.clone()
    }

    /// Turn the draft into an annotation if it has enough vertices.
    pub fn finish(&self, view: &mut View) -> Option<AnnotationId> {
        finish_path(self.closed, &self.draft, view)
    }
}

fn path_type(closed: bool) -> &'static str {
    if closed { "polygon" } else { "polyline" }
}

fn path_data(closed: bool, path: Vec<Point>) -> AnnotationData {
    if closed {
        AnnotationData::Polygon(PolygonData::new(path))
    } else {
        AnnotationData::Polyline(PolylineData { path })
    }
}

fn finish_path(closed: bool, draft: &RefCell<PathDraft>, view: &mut View) -> Option<AnnotationId> {
    let points = {
        let mut d = draft.borrow_mut();
        d.cursor = None;
        std::mem::take(&mut d.points)
    };
    view.clear_drawing();
    let min = if closed { 3 } else { 2 };
    if points.len() < min {
        return None;
    }
    view.queue_create(path_type(closed), path_data(closed, points))
}

fn show_path(closed: bool, draft: &PathDraft, view: &mut View) {
    let mut path = draft.points.clone();
    path.extend(draft.cursor);
    if path.is_empty() {
        view.clear_drawing();
    } else {
        view.set_drawing(path_type(closed), path_data(closed, path));
    }
}

impl Tool for PathTool {
    fn activate(&mut self, setup: &mut ToolSetup<'_>) {
        let closed = self.closed;

        let draft = Rc::clone(&self.draft);
        setup.on_pointer_down(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            if !ev.is_primary() {
                return CallbackStatus::Continue;
            }
            let camera = ctx.view.camera();
            let p = camera.canvas_to_image(ev.position);
            let finishing = {
                let d = draft.borrow();
                let anchor = if closed { d.points.first() } else { d.points.last() };
                let enough = d.points.len() >= if closed { 3 } else { 2 };
                enough && anchor.is_some_and(|&a| camera.cursor_is_closing_path(ev.position, a))
            };
            if finishing {
                finish_path(closed, &draft, ctx.view);
                return CallbackStatus::Stop;
            }
            let mut d = draft.borrow_mut();
            if d
                .points
                .last()
                .is_some_and(|last| last.distance(p) < ctx.config.min_point_distance)
            {
                return CallbackStatus::Stop;
            }
            d.points.push(p);
            d.cursor = None;
            show_path(closed, &d, ctx.view);
            CallbackStatus::Stop
        });

        let draft = Rc::clone(&self.draft);
        setup.on_pointer_move(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            let mut d = draft.borrow_mut();
            if d.points.is_empty() {
                return CallbackStatus::Continue;
            }
            d.cursor = Some(ctx.view.camera().canvas_to_image(ev.position));
            show_path(closed, &d, ctx.view);
            CallbackStatus::Stop
        });

        let draft = Rc::clone(&self.draft);
        setup.on_key_down(move |ctx: &mut ToolContext<'_>, ev: &KeyEvent| {
            if draft.borrow().points.is_empty() {
                return CallbackStatus::Continue;
            }
            match ev.key.as_str() {
                "enter" => {
                    finish_path(closed, &draft, ctx.view);
                }
                "escape" => {
                    *draft.borrow_mut() = PathDraft::default();
                    ctx.view.clear_drawing();
                }
                "backspace" => {
                    let mut d = draft.borrow_mut();
                    d.points.pop();
                    show_path(closed, &d, ctx.view);
                }
                _ => return CallbackStatus::Continue,
            }
            CallbackStatus::Stop
        });

        setup_navigation(setup);
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self.draft.borrow_mut() = PathDraft::default();
    }
}

// ---- press-drag-release shapes (bounding box, ellipse) -------------------------------------------

/// Shape spanned by a drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragShape {
    /// Box between press and release.
    BoundingBox,
    /// Axis-aligned ellipse centered on the press point.
    Ellipse,
}

impl DragShape {
    fn annotation_type(self) -> &'static str {
        match self {
            Self::BoundingBox => "bounding_box",
            Self::Ellipse => "ellipse",
        }
    }

    /// Geometry spanned by a drag from `start` to `end`; `None` when it has no area.
    pub fn data(self, start: Point, end: Point) -> Option<AnnotationData> {
        match self {
            Self::BoundingBox => {
                let b = BoundingBoxData::from_corners(start, end);
                (b.rect.width() > 0.0 && b.rect.height() > 0.0).then_some(AnnotationData::BoundingBox(b))
            }
            Self::Ellipse => {
                let (rx, ry) = ((end.x - start.x).abs(), (end.y - start.y).abs());
                (rx > 0.0 && ry > 0.0)
                    .then(|| AnnotationData::Ellipse(EllipseData::from_radii(start, rx, ry, 0.0)))
            }
        }
    }
}

/// Draws a [`DragShape`].
#[derive(Debug)]
pub struct DragShapeTool {
    shape: DragShape,
    start: Rc<Cell<Option<Point>>>,
}

impl DragShapeTool {
    /// Tool drawing `shape`.
    pub fn new(shape: DragShape) -> Self {
        Self {
            shape,
            start: Rc::default(),
        }
    }
}

impl Tool for DragShapeTool {
    fn activate(&mut self, setup: &mut ToolSetup<'_>) {
        let shape = self.shape;

        let start = Rc::clone(&self.start);
        setup.on_pointer_down(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            if !ev.is_primary() {
                return CallbackStatus::Continue;
            }
            start.set(Some(ctx.view.camera().canvas_to_image(ev.position)));
            CallbackStatus::Stop
        });

        let start = Rc::clone(&self.start);
        setup.on_pointer_move(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            let Some(s) = start.get() else {
                return CallbackStatus::Continue;
            };
            let p = ctx.view.camera().canvas_to_image(ev.position);
            match shape.data(s, p) {
                Some(data) => ctx.view.set_drawing(shape.annotation_type(), data),
                None => ctx.view.clear_drawing(),
            }
            CallbackStatus::Stop
        });

        let start = Rc::clone(&self.start);
        setup.on_pointer_up(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            let Some(s) = start.take() else {
                return CallbackStatus::Continue;
            };
            ctx.view.clear_drawing();
            let p = ctx.view.camera().canvas_to_image(ev.position);
            if let Some(data) = shape.data(s, p) {
                ctx.view.queue_create(shape.annotation_type(), data);
            }
            CallbackStatus::Stop
        });

        setup_navigation(setup);
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.start.set(None);
    }
}

// ---- single-click shapes (keypoint, tag) ---------------------------------------------------------

/// Places a keypoint per click.
#[derive(Debug, Default)]
pub struct KeypointTool;

impl Tool for KeypointTool {
    fn activate(&mut self, setup: &mut ToolSetup<'_>) {
        setup.on_pointer_down(|ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            if !ev.is_primary() {
                return CallbackStatus::Continue;
            }
            let point = ctx.view.camera().canvas_to_image(ev.position);
            ctx.view
                .queue_create("keypoint", AnnotationData::Keypoint(KeypointData { point }));
            CallbackStatus::Stop
        });
        setup_navigation(setup);
    }
}

/// Tags the whole item with the active class, once per class.
pub fn apply_tag(view: &mut View) -> Option<AnnotationId> {
    let class_id = view.active_class()?;
    let tagged = view
        .annotations()
        .annotations()
        .iter()
        .any(|a| a.annotation_type == "tag" && a.class_id == class_id);
    if tagged {
        view.warn("This tag is already applied");
        return None;
    }
    view.queue_create("tag", AnnotationData::Tag)
}

/// Applies a tag per click.
#[derive(Debug, Default)]
pub struct TagTool;

impl Tool for TagTool {
    fn activate(&mut self, setup: &mut ToolSetup<'_>) {
        setup.on_pointer_down(|ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            if !ev.is_primary() {
                return CallbackStatus::Continue;
            }
            if ctx.view.active_class().is_none() {
                ctx.view.warn("Select a class before drawing");
            } else {
                apply_tag(ctx.view);
            }
            CallbackStatus::Stop
        });
        setup_navigation(setup);
    }
}

// ---- plugins -------------------------------------------------------------------------------------

/// Polygon drawing.
#[derive(Debug, Default)]
pub struct PolygonPlugin;

impl Plugin for PolygonPlugin {
    fn name(&self) -> &str {
        "polygon"
    }

    fn annotation_types(&self) -> Vec<String> {
        vec!["polygon".to_string()]
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_type(ctx, Rc::new(PolygonRenderer), Rc::new(PolygonSerializer));
        let tool = Rc::new(RefCell::new(PathTool::polygon()));
        register_tool_with_commands(ctx, "polygon_tool", "p", Rc::clone(&tool));
        ctx.register_command("polygon_tool.close", move |c: &mut ToolContext<'_>| {
            tool.borrow().finish(c.view);
        });
        Ok(())
    }
}

/// Polyline drawing.
#[derive(Debug, Default)]
pub struct PolylinePlugin;

impl Plugin for PolylinePlugin {
    fn name(&self) -> &str {
        "polyline"
    }

    fn annotation_types(&self) -> Vec<String> {
        vec!["polyline".to_string()]
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_type(ctx, Rc::new(PolylineRenderer), Rc::new(PolylineSerializer));
        let tool = Rc::new(RefCell::new(PathTool::polyline()));
        register_tool_with_commands(ctx, "polyline_tool", "l", Rc::clone(&tool));
        ctx.register_command("polyline_tool.finish", move |c: &mut ToolContext<'_>| {
            tool.borrow().finish(c.view);
        });
        Ok(())
    }
}

/// Bounding box drawing.
#[derive(Debug, Default)]
pub struct BoundingBoxPlugin;

impl Plugin for BoundingBoxPlugin {
    fn name(&self) -> &str {
        "bounding_box"
    }

    fn annotation_types(&self) -> Vec<String> {
        vec!["bounding_box".to_string()]
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_type(ctx, Rc::new(BoundingBoxRenderer), Rc::new(BoundingBoxSerializer));
        let tool = Rc::new(RefCell::new(DragShapeTool::new(DragShape::BoundingBox)));
        register_tool_with_commands(ctx, "bounding_box_tool", "b", tool);
        Ok(())
    }
}

/// Ellipse drawing.
#[derive(Debug, Default)]
pub struct EllipsePlugin;

impl Plugin for EllipsePlugin {
    fn name(&self) -> &str {
        "ellipse"
    }

    fn annotation_types(&self) -> Vec<String> {
        vec!["ellipse".to_string()]
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_type(ctx, Rc::new(EllipseRenderer), Rc::new(EllipseSerializer));
        let tool = Rc::new(RefCell::new(DragShapeTool::new(DragShape::Ellipse)));
        register_tool_with_commands(ctx, "ellipse_tool", "e", tool);
        Ok(())
    }
}

/// Keypoint placement.
#[derive(Debug, Default)]
pub struct KeypointPlugin;

impl Plugin for KeypointPlugin {
    fn name(&self) -> &str {
        "keypoint"
    }

    fn annotation_types(&self) -> Vec<String> {
        vec!["keypoint".to_string()]
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_type(ctx, Rc::new(KeypointRenderer), Rc::new(KeypointSerializer));
        register_tool_with_commands(ctx, "keypoint_tool", "k", Rc::new(RefCell::new(KeypointTool)));
        Ok(())
    }
}

/// Whole-item tags.
#[derive(Debug, Default)]
pub struct TagPlugin;

impl Plugin for TagPlugin {
    fn name(&self) -> &str {
        "tag"
    }

    fn annotation_types(&self) -> Vec<String> {
        vec!["tag".to_string()]
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_type(ctx, Rc::new(TagRenderer), Rc::new(TagSerializer));
        register_tool_with_commands(ctx, "tag_tool", "t", Rc::new(RefCell::new(TagTool)));
        ctx.register_command("tag_tool.apply", |c: &mut ToolContext<'_>| {
            apply_tag(c.view);
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugins/shapes.rs"]
mod tests;
