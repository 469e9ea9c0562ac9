//! Selection, moving and reshaping, plus the polygon merge/subtract options.

use std::cell::RefCell;
use std::rc::Rc;

use crate::actions::annotation::UpdateAnnotation;
use crate::actions::manager::Action;
use crate::actions::polygon::{MergePolygons, SubtractPolygons};
use crate::actions::video::add_keyframe;
use crate::editor::ToolContext;
use crate::foundation::callback::CallbackStatus;
use crate::foundation::core::Point;
use crate::foundation::error::CanvasmarkResult;
use crate::foundation::input::PointerEvent;
use crate::managers::plugin::{Plugin, PluginContext};
use crate::managers::tool::{Tool, ToolSetup};
use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::shapes::AnnotationData;
use crate::plugins::navigation::setup_navigation;
use crate::plugins::register_tool_with_commands;

/// Option category of the polygon boolean edits; at most one is active.
pub const POLYGON_BOOL_CATEGORY: &str = "polygon-bool";
/// Option: the next clicked polygon is merged into the selected one.
pub const POLYGON_MERGE: &str = "polygon_merge";
/// Option: the next clicked polygon is cut by the selected one.
pub const POLYGON_SUBTRACT: &str = "polygon_subtract";

// Grab radius around vertices and outlines, in canvas pixels.
const GRAB_RADIUS: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Grab {
    Shape,
    Vertex(usize),
}

#[derive(Debug)]
struct Drag {
    before: Annotation,
    current: AnnotationData,
    grab: Grab,
    last: Point,
    moved: bool,
}

/// Select, drag and reshape annotations.
///
/// While dragging, the edited geometry is shown as the drawing preview and the stored
/// annotation is hidden from the overlay; releasing commits one undoable update.
#[derive(Debug, Default)]
pub struct EditTool {
    drag: Rc<RefCell<Option<Drag>>>,
}

impl EditTool {
    /// Idle tool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the annotation being dragged.
    pub fn dragging(&self) -> Option<AnnotationId> {
        self.drag
            .borrow()
            .as_ref()
            .filter(|d| d.moved)
            .map(|d| d.before.id.clone())
    }
}

fn grab_at(ctx: &ToolContext<'_>, p: Point, tolerance: f64) -> Option<(Annotation, AnnotationData, Grab)> {
    let frame = ctx.view.frame();
    let store = ctx.view.annotations();
    if let Some(selected) = store.selected()
        && let Some(data) = store.data_at(selected, frame)
        && let Some(i) = data.vertices().iter().position(|v| v.distance(p) <= tolerance)
    {
        return Some((selected.clone(), data.into_owned(), Grab::Vertex(i)));
    }
    let hit = store.find_top_at(p, tolerance, frame, |_| true)?;
    let data = store.data_at(hit, frame)?.into_owned();
    Some((hit.clone(), data, Grab::Shape))
}

fn boolean_edit(ctx: &mut ToolContext<'_>, op: &str, p: Point, tolerance: f64) {
    let frame = ctx.view.frame();
    let store = ctx.view.annotations();
    let Some(target) = store.selected().cloned() else {
        ctx.view.warn("Select a polygon first");
        return;
    };
    let Some(other) = store
        .find_top_at(p, tolerance, frame, |a| {
            a.annotation_type == "polygon" && a.id != target.id
        })
        .cloned()
    else {
        return;
    };
    let action: CanvasmarkResult<Box<dyn Action>> = if op == POLYGON_MERGE {
        MergePolygons::new(&target, &other).map(|a| Box::new(a) as Box<dyn Action>)
    } else {
        SubtractPolygons::new(&target, &other).map(|a| Box::new(a) as Box<dyn Action>)
    };
    match action {
        Ok(action) => ctx.view.commit(action),
        Err(err) => ctx.view.warn(err.to_string()),
    }
    ctx.options().deactivate(op);
}

fn finished(drag: Drag, ctx: &mut ToolContext<'_>) -> Option<UpdateAnnotation> {
    if drag.before.is_video() {
        match add_keyframe(&drag.before, ctx.view.frame(), drag.current) {
            Ok(action) => Some(action),
            Err(err) => {
                ctx.view.warn(err.to_string());
                None
            }
        }
    } else {
        let mut after = drag.before.clone();
        *after.static_data_mut()? = drag.current;
        let label = match drag.grab {
            Grab::Shape => "move annotation",
            Grab::Vertex(_) => "move vertex",
        };
        Some(UpdateAnnotation::new(drag.before, after).labeled(label))
    }
}

impl Tool for EditTool {
    fn activate(&mut self, setup: &mut ToolSetup<'_>) {
        let drag = Rc::clone(&self.drag);
        setup.on_pointer_down(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            if !ev.is_primary() {
                return CallbackStatus::Continue;
            }
            let camera = ctx.view.camera();
            let p = camera.canvas_to_image(ev.position);
            let tolerance = camera.canvas_len_to_image(GRAB_RADIUS);

            if let Some(op) = ctx.options().active_in(POLYGON_BOOL_CATEGORY) {
                boolean_edit(ctx, &op, p, tolerance);
                return CallbackStatus::Stop;
            }

            match grab_at(ctx, p, tolerance) {
                Some((before, current, grab)) => {
                    ctx.view.annotations_mut().select(&before.id);
                    *drag.borrow_mut() = Some(Drag {
                        before,
                        current,
                        grab,
                        last: p,
                        moved: false,
                    });
                    CallbackStatus::Stop
                }
                None => {
                    ctx.view.annotations_mut().deselect_all();
                    CallbackStatus::Continue
                }
            }
        });

        let drag = Rc::clone(&self.drag);
        setup.on_pointer_move(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            let camera = ctx.view.camera();
            let p = camera.canvas_to_image(ev.position);
            let tolerance = camera.canvas_len_to_image(GRAB_RADIUS);

            if drag.borrow().is_none() {
                let frame = ctx.view.frame();
                let hit = ctx
                    .view
                    .annotations()
                    .find_top_at(p, tolerance, frame, |_| true)
                    .map(|a| a.id.clone());
                let store = ctx.view.annotations_mut();
                match hit {
                    Some(id) => store.highlight(&id),
                    None => store.unhighlight_all(),
                }
                return CallbackStatus::Continue;
            }

            let mut slot = drag.borrow_mut();
            let Some(d) = slot.as_mut() else {
                return CallbackStatus::Continue;
            };
            let delta = p - d.last;
            d.last = p;
            match d.grab {
                Grab::Shape => d.current.translate(delta),
                Grab::Vertex(i) => {
                    d.current.move_vertex(i, delta);
                }
            }
            if !d.moved {
                d.moved = true;
                ctx.view.mark_stale();
            }
            ctx.view
                .set_drawing(&d.before.annotation_type, d.current.clone());
            CallbackStatus::Stop
        });

        let drag = Rc::clone(&self.drag);
        setup.on_pointer_up(move |ctx: &mut ToolContext<'_>, _: &PointerEvent| {
            let Some(d) = drag.borrow_mut().take() else {
                return CallbackStatus::Continue;
            };
            if d.moved {
                ctx.view.clear_drawing();
                ctx.view.mark_stale();
                if let Some(action) = finished(d, ctx) {
                    ctx.view.commit(Box::new(action));
                }
            }
            CallbackStatus::Stop
        });

        setup_navigation(setup);
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.drag.borrow_mut().take();
    }

    fn should_render(&self, annotation: &Annotation) -> bool {
        self.dragging().is_none_or(|id| id != annotation.id)
    }
}

/// The edit tool and the polygon boolean options.
#[derive(Debug, Default)]
pub struct EditPlugin;

impl Plugin for EditPlugin {
    fn name(&self) -> &str {
        "edit"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_tool_with_commands(ctx, "edit_tool", "v", Rc::new(RefCell::new(EditTool::new())));
        for (option, command) in [
            (POLYGON_MERGE, "edit_tool.activate_polygon_merge"),
            (POLYGON_SUBTRACT, "edit_tool.activate_polygon_subtract"),
        ] {
            ctx.register_option(option, Some(POLYGON_BOOL_CATEGORY));
            ctx.register_command(command, move |c: &mut ToolContext<'_>| {
                c.options().activate(option);
                c.activate_tool("edit_tool");
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugins/edit.rs"]
mod tests;
