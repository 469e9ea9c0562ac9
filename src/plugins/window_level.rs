//! Window-level adjustment while a key is held.
//!
//! The handlers are editor-wide and registered at install, so they run ahead of the active
//! tool's. A press only claims the pointer once the key has been held past
//! `hold_to_activate_ms`; a short tap falls through to the keybinding table.

use std::cell::Cell;
use std::rc::Rc;

use crate::editor::ToolContext;
use crate::foundation::callback::CallbackStatus;
use crate::foundation::core::Point;
use crate::foundation::error::CanvasmarkResult;
use crate::foundation::input::{KeyEvent, PointerEvent};
use crate::managers::plugin::{Plugin, PluginContext};

/// Key that adjusts the window level while held.
pub const WINDOW_LEVEL_KEY: &str = "w";

#[derive(Debug, Default)]
struct HoldState {
    pressed_at: Cell<Option<u64>>,
    active: Cell<bool>,
    last: Cell<Option<Point>>,
}

impl HoldState {
    fn release(&self) -> bool {
        self.pressed_at.set(None);
        self.last.set(None);
        self.active.replace(false)
    }
}

/// Hold-to-activate window-level dragging.
#[derive(Debug, Default)]
pub struct WindowLevelPlugin;

impl Plugin for WindowLevelPlugin {
    fn name(&self) -> &str {
        "window_level"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        let state = Rc::new(HoldState::default());
        let hold_ms = ctx.config.hold_to_activate_ms;

        let s = Rc::clone(&state);
        ctx.on_key_down(move |_: &mut ToolContext<'_>, ev: &KeyEvent| {
            if ev.key != WINDOW_LEVEL_KEY {
                return CallbackStatus::Continue;
            }
            if s.active.get() {
                return CallbackStatus::Stop;
            }
            match s.pressed_at.get() {
                Some(at) if ev.repeat && ev.timestamp_ms.saturating_sub(at) >= hold_ms => {
                    tracing::debug!("window level adjustment active");
                    s.active.set(true);
                    CallbackStatus::Stop
                }
                Some(_) => CallbackStatus::Continue,
                None => {
                    s.pressed_at.set(Some(ev.timestamp_ms));
                    CallbackStatus::Continue
                }
            }
        });

        let s = Rc::clone(&state);
        ctx.on_pointer_move(move |ctx: &mut ToolContext<'_>, ev: &PointerEvent| {
            if !s.active.get() {
                return CallbackStatus::Continue;
            }
            if let Some(prev) = s.last.get() {
                let level = ctx.view.window_level().dragged(ev.position - prev);
                ctx.view.set_window_level(level);
            }
            s.last.set(Some(ev.position));
            CallbackStatus::Stop
        });

        ctx.on_key_up(move |_: &mut ToolContext<'_>, ev: &KeyEvent| {
            if ev.key != WINDOW_LEVEL_KEY {
                return CallbackStatus::Continue;
            }
            if state.release() {
                CallbackStatus::Stop
            } else {
                CallbackStatus::Continue
            }
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugins/window_level.rs"]
mod tests;
