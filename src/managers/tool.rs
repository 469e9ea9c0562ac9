//! Tools, their input handlers and the single-active-tool lifecycle.
//!
//! A tool registers handlers while it is activated; every handler returns a handle that the
//! manager keeps and releases on deactivation, so no callback of a torn-down tool can fire.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::EditorConfig;
use crate::editor::ToolContext;
use crate::foundation::callback::{CallbackCollection, CallbackHandle, CallbackStatus, release_all};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::foundation::input::{KeyEvent, PointerEvent, WheelEvent};
use crate::foundation::registry::NamedRegistry;
use crate::model::annotation::Annotation;

/// Input handler for events of type `E`.
pub type Handler<E> = dyn FnMut(&mut ToolContext<'_>, &E) -> CallbackStatus;

/// Editor-wide handler lists, dispatched in registration order.
#[derive(Clone, Default)]
pub struct InputHandlers {
    /// Pointer pressed.
    pub pointer_down: CallbackCollection<Handler<PointerEvent>>,
    /// Pointer moved.
    pub pointer_move: CallbackCollection<Handler<PointerEvent>>,
    /// Pointer released.
    pub pointer_up: CallbackCollection<Handler<PointerEvent>>,
    /// Wheel or trackpad scroll.
    pub wheel: CallbackCollection<Handler<WheelEvent>>,
    /// Key pressed (including auto-repeat).
    pub key_down: CallbackCollection<Handler<KeyEvent>>,
    /// Key released.
    pub key_up: CallbackCollection<Handler<KeyEvent>>,
}

impl std::fmt::Debug for InputHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandlers")
            .field("pointer_down", &self.pointer_down.len())
            .field("pointer_move", &self.pointer_move.len())
            .field("pointer_up", &self.pointer_up.len())
            .field("wheel", &self.wheel.len())
            .field("key_down", &self.key_down.len())
            .field("key_up", &self.key_up.len())
            .finish()
    }
}

/// Registration surface handed to [`Tool::activate`]. Every registration is released when the
/// tool is deactivated.
pub struct ToolSetup<'a> {
    handlers: &'a InputHandlers,
    handles: &'a mut Vec<CallbackHandle>,
    /// Editor configuration.
    pub config: &'a EditorConfig,
}

impl<'a> ToolSetup<'a> {
    pub(crate) fn new(
        handlers: &'a InputHandlers,
        handles: &'a mut Vec<CallbackHandle>,
        config: &'a EditorConfig,
    ) -> Self {
        Self {
            handlers,
            handles,
            config,
        }
    }

    /// Keep `handle` until the tool is deactivated.
    pub fn keep(&mut self, handle: CallbackHandle) {
        self.handles.push(handle);
    }

    /// Handle pointer presses.
    pub fn on_pointer_down(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &PointerEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.pointer_down.register(Box::new(f));
        self.keep(h);
    }

    /// Handle pointer moves.
    pub fn on_pointer_move(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &PointerEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.pointer_move.register(Box::new(f));
        self.keep(h);
    }

    /// Handle pointer releases.
    pub fn on_pointer_up(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &PointerEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.pointer_up.register(Box::new(f));
        self.keep(h);
    }

    /// Handle wheel events.
    pub fn on_wheel(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &WheelEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.wheel.register(Box::new(f));
        self.keep(h);
    }

    /// Handle key presses.
    pub fn on_key_down(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &KeyEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.key_down.register(Box::new(f));
        self.keep(h);
    }

    /// Handle key releases.
    pub fn on_key_up(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &KeyEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.key_up.register(Box::new(f));
        self.keep(h);
    }
}

/// An input mode translating gestures into annotation mutations.
pub trait Tool {
    /// Register handlers. Called when the tool becomes the active one.
    fn activate(&mut self, setup: &mut ToolSetup<'_>);

    /// Called after the tool's handlers were released.
    fn deactivate(&mut self) {}

    /// Drop any gesture in progress (item switch, explicit cancel).
    fn reset(&mut self) {}

    /// Return `false` to hide `annotation` from overlays while this tool is active.
    fn should_render(&self, _annotation: &Annotation) -> bool {
        true
    }
}

/// Shared table of tools by name.
pub type ToolRegistry = NamedRegistry<RefCell<dyn Tool>>;

/// Toggleable option of a tool. Options sharing a category are mutually exclusive.
#[derive(Debug)]
pub struct ToolOption {
    category: Option<String>,
    active: Cell<bool>,
}

impl ToolOption {
    /// Inactive option in `category`.
    pub fn new(category: Option<&str>) -> Self {
        Self {
            category: category.map(str::to_string),
            active: Cell::new(false),
        }
    }

    /// Category name.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Whether the option is on.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// Shared table of tool options. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct ToolOptions {
    options: NamedRegistry<ToolOption>,
}

impl ToolOptions {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare option `id`; releasing the handle removes it.
    pub fn register(&self, id: &str, category: Option<&str>) -> CallbackHandle {
        self.options.register(id, Rc::new(ToolOption::new(category)))
    }

    /// Turn `id` on, turning off every other option of its category. Unknown ids return `false`.
    pub fn activate(&self, id: &str) -> bool {
        let Some(option) = self.options.get(id) else {
            return false;
        };
        if let Some(category) = option.category() {
            for name in self.options.names() {
                if name == id {
                    continue;
                }
                if let Some(other) = self.options.get(&name).filter(|o| o.category() == Some(category)) {
                    other.active.set(false);
                }
            }
        }
        option.active.set(true);
        true
    }

    /// Turn `id` off.
    pub fn deactivate(&self, id: &str) {
        if let Some(option) = self.options.get(id) {
            option.active.set(false);
        }
    }

    /// Turn every option of `category` off.
    pub fn deactivate_category(&self, category: &str) {
        for name in self.options.names() {
            if let Some(o) = self.options.get(&name).filter(|o| o.category() == Some(category)) {
                o.active.set(false);
            }
        }
    }

    /// Whether `id` is declared and on.
    pub fn is_active(&self, id: &str) -> bool {
        self.options.get(id).is_some_and(|o| o.is_active())
    }

    /// The option currently on in `category`.
    pub fn active_in(&self, category: &str) -> Option<String> {
        self.options.names().into_iter().find(|name| {
            self.options
                .get(name)
                .is_some_and(|o| o.is_active() && o.category() == Some(category))
        })
    }

    /// Whether `id` is declared.
    pub fn contains(&self, id: &str) -> bool {
        self.options.contains(id)
    }
}

struct ActiveTool {
    name: String,
    tool: Rc<RefCell<dyn Tool>>,
    handles: Vec<CallbackHandle>,
}

/// Tracks the single active tool and the one before it.
#[derive(Default)]
pub struct ToolManager {
    active: Option<ActiveTool>,
    previous: Option<String>,
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("active", &self.active_name())
            .field("previous", &self.previous)
            .finish()
    }
}

impl ToolManager {
    /// No active tool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the active tool.
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    /// Name of the tool active before the current one.
    pub fn previous_name(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Number of handler registrations the active tool holds.
    pub fn active_handle_count(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.handles.len())
    }

    /// Make `name` the active tool. Re-activating the active tool is a no-op.
    #[tracing::instrument(skip(self, tools, handlers, config))]
    pub fn activate(
        &mut self,
        name: &str,
        tools: &ToolRegistry,
        handlers: &InputHandlers,
        config: &EditorConfig,
    ) -> CanvasmarkResult<()> {
        if self.active_name() == Some(name) {
            return Ok(());
        }
        let tool = tools
            .get(name)
            .ok_or_else(|| CanvasmarkError::precondition(format!("unknown tool {name}")))?;
        if let Some(old) = self.deactivate() {
            self.previous = Some(old);
        }
        let mut handles = Vec::new();
        {
            let mut t = tool
                .try_borrow_mut()
                .map_err(|_| CanvasmarkError::precondition(format!("tool {name} is busy")))?;
            t.activate(&mut ToolSetup::new(handlers, &mut handles, config));
        }
        tracing::debug!(tool = name, handlers = handles.len(), "tool activated");
        self.active = Some(ActiveTool {
            name: name.to_string(),
            tool,
            handles,
        });
        Ok(())
    }

    /// Deactivate the active tool, releasing its handlers. Returns its name.
    pub fn deactivate(&mut self) -> Option<String> {
        let mut active = self.active.take()?;
        release_all(&mut active.handles);
        if let Ok(mut t) = active.tool.try_borrow_mut() {
            t.deactivate();
        }
        tracing::debug!(tool = %active.name, "tool deactivated");
        Some(active.name)
    }

    /// Reactivate the previous tool.
    pub fn activate_previous(
        &mut self,
        tools: &ToolRegistry,
        handlers: &InputHandlers,
        config: &EditorConfig,
    ) -> CanvasmarkResult<()> {
        let Some(previous) = self.previous.clone() else {
            return Err(CanvasmarkError::precondition("no previous tool"));
        };
        self.activate(&previous, tools, handlers, config)
    }

    /// Reset the active tool's gesture state.
    pub fn reset_active(&self) {
        if let Some(active) = &self.active {
            if let Ok(mut t) = active.tool.try_borrow_mut() {
                t.reset();
            }
        }
    }

    /// Ask the active tool whether `annotation` gets an overlay.
    pub fn should_render(&self, annotation: &Annotation) -> bool {
        match &self.active {
            Some(active) => active
                .tool
                .try_borrow()
                .map_or(true, |t| t.should_render(annotation)),
            None => true,
        }
    }

    /// Deactivate the active tool if it is no longer registered. Returns `true` if it was.
    pub fn drop_unregistered(&mut self, tools: &ToolRegistry) -> bool {
        let gone = self
            .active
            .as_ref()
            .is_some_and(|a| tools.get(&a.name).is_none_or(|t| !Rc::ptr_eq(&t, &a.tool)));
        if gone {
            self.deactivate();
        }
        if self.previous.as_deref().is_some_and(|p| !tools.contains(p)) {
            self.previous = None;
        }
        gone
    }
}

#[cfg(test)]
#[path = "../../tests/unit/managers/tool.rs"]
mod tests;
