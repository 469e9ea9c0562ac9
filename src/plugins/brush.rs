//! Brush painting into polygons.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::actions::annotation::UpdateAnnotation;
use crate::editor::ToolContext;
use crate::foundation::callback::CallbackStatus;
use crate::foundation::core::Point;
use crate::foundation::error::CanvasmarkResult;
use crate::foundation::input::{KeyEvent, PointerEvent};
use crate::geometry::{boolean, ring};
use crate::managers::plugin::{Plugin, PluginContext};
use crate::managers::tool::{Tool, ToolSetup};
use crate::model::annotation::Annotation;
use crate::model::shapes::{AnnotationData, PolygonData};
use crate::plugins::navigation::setup_navigation;
use crate::plugins::register_tool_with_commands;

const TIP_SEGMENTS: usize = 24;
const MIN_RADIUS: f64 = 1.0;
const RADIUS_STEP: f64 = 1.25;

#[derive(Debug)]
struct Stroke {
    base: Option<Annotation>,
    rings: Vec<Vec<Point>>,
}

impl Stroke {
    fn stamp(&mut self, at: Point, radius: f64) {
        let tip = ring::translate(&ring::circle(Point::ZERO, radius, TIP_SEGMENTS), at.to_vec2());
        self.rings = boolean::union(&self.rings, &[tip]);
    }

    fn polygon(&self) -> Option<AnnotationData> {
        PolygonData::from_rings(self.rings.clone()).map(AnnotationData::Polygon)
    }
}

fn selected_static_polygon(ctx: &ToolContext<'_>) -> Option<Annotation> {
    ctx.view
        .annotations()
        .selected()
        .filter(|a| matches!(a.static_data(), Some(AnnotationData::Polygon(_))))
        .cloned()
}

/// Paints a circular tip; the stroke is unioned into the selected polygon, or becomes a new one.
#[derive(Debug, Default)]
pub struct BrushTool {
    radius: Rc<Cell<f64>>,
    stroke: Rc<RefCell<Option<Stroke>>>,
}

impl BrushTool {
    /// Tool with the radius taken from the configuration on first activation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tip radius in image pixels.
    pub fn radius(&self) -> f64 {
        self.radius.get()
    }
}

impl Tool for BrushTool {
    fn activate(&mut self, setup: &mut ToolSetup<'_>) {
        if self.radius.get() <= 0.0 {
            self.radius.set(setup.config.brush_radius);
        }

        let (radius, stroke) = (Rc::clone(&self.radius), Rc::clone(&self.stroke));
        setup.on_pointer_down(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            if !ev.is_primary() {
                return CallbackStatus::Continue;
            }
            let p = ctx.view.camera().canvas_to_image(ev.position);
            let base = selected_static_polygon(ctx);
            let rings = base
                .as_ref()
                .and_then(|a| match a.static_data() {
                    Some(AnnotationData::Polygon(poly)) => Some(poly.rings()),
                    _ => None,
                })
                .unwrap_or_default();
            let mut s = Stroke { base, rings };
            s.stamp(p, radius.get());
            if let Some(data) = s.polygon() {
                ctx.view.set_drawing("polygon", data);
            }
            *stroke.borrow_mut() = Some(s);
            ctx.view.mark_stale();
            CallbackStatus::Stop
        });

        let (radius, stroke) = (Rc::clone(&self.radius), Rc::clone(&self.stroke));
        setup.on_pointer_move(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            let mut slot = stroke.borrow_mut();
            let Some(s) = slot.as_mut() else {
                return CallbackStatus::Continue;
            };
            s.stamp(ctx.view.camera().canvas_to_image(ev.position), radius.get());
            if let Some(data) = s.polygon() {
                ctx.view.set_drawing("polygon", data);
            }
            CallbackStatus::Stop
        });

        let stroke = Rc::clone(&self.stroke);
        setup.on_pointer_up(move |ctx: &mut ToolContext<'_>, _: &PointerEvent| {
            let Some(s) = stroke.borrow_mut().take() else {
                return CallbackStatus::Continue;
            };
            ctx.view.clear_drawing();
            ctx.view.mark_stale();
            let Some(data) = s.polygon() else {
                return CallbackStatus::Stop;
            };
            match s.base {
                Some(before) => {
                    let mut after = before.clone();
                    if let Some(slot) = after.static_data_mut() {
                        *slot = data;
                    }
                    ctx.view
                        .commit(Box::new(UpdateAnnotation::new(before, after).labeled("brush stroke")));
                }
                None => {
                    ctx.view.queue_create("polygon", data);
                }
            }
            CallbackStatus::Stop
        });

        let radius = Rc::clone(&self.radius);
        setup.on_key_down(move |_: &mut ToolContext<'_>, ev: &KeyEvent| {
            match ev.key.as_str() {
                "[" => radius.set((radius.get() / RADIUS_STEP).max(MIN_RADIUS)),
                "]" => radius.set(radius.get() * RADIUS_STEP),
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
        self.stroke.borrow_mut().take();
    }

    fn should_render(&self, annotation: &Annotation) -> bool {
        self.stroke
            .borrow()
            .as_ref()
            .and_then(|s| s.base.as_ref())
            .is_none_or(|base| base.id != annotation.id)
    }
}

/// The brush tool.
#[derive(Debug, Default)]
pub struct BrushPlugin;

impl Plugin for BrushPlugin {
    fn name(&self) -> &str {
        "brush"
    }

    fn annotation_types(&self) -> Vec<String> {
        vec!["polygon".to_string()]
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_tool_with_commands(ctx, "brush_tool", "r", Rc::new(RefCell::new(BrushTool::new())));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugins/brush.rs"]
mod tests;
