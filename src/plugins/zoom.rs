//! Box zoom.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::editor::ToolContext;
use crate::foundation::callback::CallbackStatus;
use crate::foundation::core::Point;
use crate::foundation::error::CanvasmarkResult;
use crate::foundation::input::PointerEvent;
use crate::managers::plugin::{Plugin, PluginContext};
use crate::managers::tool::{Tool, ToolSetup};
use crate::plugins::register_tool_with_commands;

/// Drag a box to zoom to it, then hand back to the previous tool.
#[derive(Debug, Default)]
pub struct ZoomTool {
    start: Rc<Cell<Option<Point>>>,
}

impl Tool for ZoomTool {
    fn activate(&mut self, setup: &mut ToolSetup<'_>) {
        let start = Rc::clone(&self.start);
        setup.on_pointer_down(move |_: &mut ToolContext<'_>, ev: &PointerEvent| {
            if !ev.is_primary() {
                return CallbackStatus::Continue;
            }
            start.set(Some(ev.position));
            CallbackStatus::Stop
        });

        let start = Rc::clone(&self.start);
        setup.on_pointer_move(move |_: &mut ToolContext<'_>, _: &PointerEvent| {
            if start.get().is_some() {
                CallbackStatus::Stop
            } else {
                CallbackStatus::Continue
            }
        });

        let start = Rc::clone(&self.start);
        setup.on_pointer_up(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            let Some(from) = start.take() else {
                return CallbackStatus::Continue;
            };
            ctx.view.zoom_to_box(from, ev.position);
            ctx.activate_previous_tool();
            CallbackStatus::Stop
        });
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.start.set(None);
    }
}

/// The zoom tool.
#[derive(Debug, Default)]
pub struct ZoomPlugin;

impl Plugin for ZoomPlugin {
    fn name(&self) -> &str {
        "zoom"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        register_tool_with_commands(ctx, "zoom_tool", "z", Rc::new(RefCell::new(ZoomTool::default())));
        Ok(())
    }
}
