//! Camera handlers shared by every tool. Tools register them last so their own gestures win.

use std::cell::Cell;
use std::rc::Rc;

use crate::editor::ToolContext;
use crate::foundation::callback::CallbackStatus;
use crate::foundation::core::Point;
use crate::foundation::input::{PointerEvent, WheelEvent};
use crate::managers::tool::ToolSetup;

/// Ctrl/meta + wheel zooms around the cursor.
pub(crate) fn setup_zoom(setup: &mut ToolSetup<'_>) {
    setup.on_wheel(|ctx: &mut ToolContext<'_>, ev: &WheelEvent| {
        if !(ev.modifiers.ctrl || ev.modifiers.meta) {
            return CallbackStatus::Continue;
        }
        let step = ctx.config.zoom_step;
        let factor = if ev.delta.y < 0.0 { step } else { 1.0 / step };
        ctx.view.zoom(factor, ev.position);
        CallbackStatus::Stop
    });
}

/// Plain wheel scrolls.
pub(crate) fn setup_scroll(setup: &mut ToolSetup<'_>) {
    setup.on_wheel(|ctx: &mut ToolContext<'_>, ev: &WheelEvent| {
        ctx.view.scroll(ev.delta);
        CallbackStatus::Stop
    });
}

/// Dragging with any button no earlier handler claimed pans the image.
pub(crate) fn setup_panning(setup: &mut ToolSetup<'_>) {
    let last: Rc<Cell<Option<Point>>> = Rc::new(Cell::new(None));

    let down = Rc::clone(&last);
    setup.on_pointer_down(move |_: &mut ToolContext<'_>, ev: &PointerEvent| {
        down.set(Some(ev.position));
        CallbackStatus::Stop
    });

    let moving = Rc::clone(&last);
    setup.on_pointer_move(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
        let Some(prev) = moving.get() else {
            return CallbackStatus::Continue;
        };
        ctx.view.pan(ev.position - prev);
        moving.set(Some(ev.position));
        CallbackStatus::Stop
    });

    setup.on_pointer_up(move |_: &mut ToolContext<'_>, _: &PointerEvent| {
        if last.take().is_some() {
            CallbackStatus::Stop
        } else {
            CallbackStatus::Continue
        }
    });
}

/// Zoom, scroll and panning.
pub(crate) fn setup_navigation(setup: &mut ToolSetup<'_>) {
    setup_zoom(setup);
    setup_scroll(setup);
    setup_panning(setup);
}
