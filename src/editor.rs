//! The editor: plugins, tools, commands and the views they act on.
//!
//! Every capability table lives in one [`Registry`] owned by the editor instance, so several
//! editors can coexist without sharing state. Input events go to the active view through the
//! handlers registered by the active tool and by installed plugins.

use std::rc::Rc;

use crate::actions::annotation::DeleteAnnotation;
use crate::config::EditorConfig;
use crate::foundation::callback::{CallbackCollection, CallbackHandle, CallbackStatus, release_all};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::foundation::input::{KeyEvent, PointerEvent, WheelEvent};
use crate::managers::commands::CommandRegistry;
use crate::managers::item::ItemInfo;
use crate::managers::plugin::{Plugin, PluginManager};
use crate::managers::tool::{Handler, InputHandlers, ToolManager, ToolOptions, ToolRegistry};
use crate::model::annotation::Annotation;
use crate::render::cpu::FrameRgba;
use crate::render::registry::RendererRegistry;
use crate::serialize::registry::SerializerRegistry;
use crate::view::pane::{View, ViewServices};

/// Capability tables of one editor. Clones share the tables.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    /// Renderers by annotation type.
    pub renderers: RendererRegistry,
    /// Serializers by annotation type.
    pub serializers: SerializerRegistry,
    /// Tools by name.
    pub tools: ToolRegistry,
    /// Commands and keybindings.
    pub commands: CommandRegistry,
    /// Tool options.
    pub options: ToolOptions,
}

impl Registry {
    /// Empty tables.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Editor-level operation requested from inside a handler or command. Requests run once the
/// current dispatch has finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorRequest {
    /// Switch to the named tool.
    ActivateTool(String),
    /// Switch back to the previous tool.
    ActivatePreviousTool,
    /// Leave the active tool.
    DeactivateTool,
    /// Run the named command.
    RunCommand(String),
}

/// What a handler or command gets to work with.
pub struct ToolContext<'a> {
    /// The active view.
    pub view: &'a mut View,
    /// Capability tables.
    pub registry: &'a Registry,
    /// Editor configuration.
    pub config: &'a EditorConfig,
    requests: &'a mut Vec<EditorRequest>,
}

impl<'a> ToolContext<'a> {
    pub(crate) fn new(
        view: &'a mut View,
        registry: &'a Registry,
        config: &'a EditorConfig,
        requests: &'a mut Vec<EditorRequest>,
    ) -> Self {
        Self {
            view,
            registry,
            config,
            requests,
        }
    }

    /// Tool options.
    pub fn options(&self) -> &ToolOptions {
        &self.registry.options
    }

    /// Switch to `name` after this dispatch.
    pub fn activate_tool(&mut self, name: &str) {
        self.requests.push(EditorRequest::ActivateTool(name.to_string()));
    }

    /// Switch back to the previous tool after this dispatch.
    pub fn activate_previous_tool(&mut self) {
        self.requests.push(EditorRequest::ActivatePreviousTool);
    }

    /// Leave the active tool after this dispatch.
    pub fn deactivate_tool(&mut self) {
        self.requests.push(EditorRequest::DeactivateTool);
    }

    /// Run command `name` after this dispatch.
    pub fn run_command(&mut self, name: &str) {
        self.requests.push(EditorRequest::RunCommand(name.to_string()));
    }
}

// Requests may trigger further requests; a command chain longer than this is dropped.
const MAX_REQUEST_ROUNDS: usize = 16;

fn no_view() -> CanvasmarkError {
    CanvasmarkError::precondition("editor has no view")
}

/// A plugin-extensible annotation editor.
pub struct Editor {
    config: EditorConfig,
    services: ViewServices,
    registry: Registry,
    handlers: InputHandlers,
    tools: ToolManager,
    plugins: PluginManager,
    views: Vec<View>,
    active_view: usize,
    requests: Vec<EditorRequest>,
    core_handles: Vec<CallbackHandle>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("tools", &self.tools)
            .field("plugins", &self.plugins)
            .field("views", &self.views.len())
            .field("active_view", &self.active_view)
            .finish_non_exhaustive()
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.tools.deactivate();
        release_all(&mut self.core_handles);
    }
}

impl Editor {
    /// Editor with the built-in plugins known (not installed) and the core commands bound.
    pub fn new(config: EditorConfig, services: ViewServices) -> CanvasmarkResult<Self> {
        config.validate()?;
        let mut editor = Self {
            config,
            services,
            registry: Registry::new(),
            handlers: InputHandlers::default(),
            tools: ToolManager::new(),
            plugins: PluginManager::new(),
            views: Vec::new(),
            active_view: 0,
            requests: Vec::new(),
            core_handles: Vec::new(),
        };
        for plugin in crate::plugins::builtin_plugins() {
            editor.plugins.register(plugin);
        }
        editor.register_core_commands();
        Ok(editor)
    }

    fn register_core_commands(&mut self) {
        let commands = &self.registry.commands;
        let handles = [
            commands.register("editor.undo", |ctx: &mut ToolContext<'_>| ctx.view.undo()),
            commands.register("editor.redo", |ctx: &mut ToolContext<'_>| ctx.view.redo()),
            commands.register("editor.delete_selected", |ctx: &mut ToolContext<'_>| {
                if let Some(selected) = ctx.view.annotations().selected().cloned() {
                    ctx.view.commit(Box::new(DeleteAnnotation::new(selected)));
                }
            }),
            commands.register("editor.select_next", |ctx: &mut ToolContext<'_>| {
                ctx.view.annotations_mut().select_next();
            }),
            commands.register("editor.select_previous", |ctx: &mut ToolContext<'_>| {
                ctx.view.annotations_mut().select_previous();
            }),
            commands.register("editor.deselect", |ctx: &mut ToolContext<'_>| {
                ctx.view.annotations_mut().deselect_all();
            }),
            commands.bind("ctrl+z", "editor.undo"),
            commands.bind("meta+z", "editor.undo"),
            commands.bind("ctrl+shift+z", "editor.redo"),
            commands.bind("ctrl+y", "editor.redo"),
            commands.bind("delete", "editor.delete_selected"),
            commands.bind("backspace", "editor.delete_selected"),
            commands.bind("tab", "editor.select_next"),
            commands.bind("shift+tab", "editor.select_previous"),
            commands.bind("escape", "editor.deselect"),
        ];
        self.core_handles.extend(handles);
    }

    // ---- accessors -----------------------------------------------------------------------------

    /// Configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Capability tables.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Editor-wide input handler lists.
    pub fn handlers(&self) -> &InputHandlers {
        &self.handlers
    }

    /// Tool lifecycle state.
    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    /// Plugin state.
    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    // ---- views ---------------------------------------------------------------------------------

    /// Add a view over a `width` x `height` canvas and make it active. Returns its index.
    pub fn add_view(&mut self, width: f64, height: f64) -> usize {
        let view = View::new(
            &self.config,
            self.registry.renderers.clone(),
            self.services.clone(),
            width,
            height,
        );
        self.views.push(view);
        self.active_view = self.views.len() - 1;
        self.active_view
    }

    /// Every view.
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// View `index`.
    pub fn view(&self, index: usize) -> Option<&View> {
        self.views.get(index)
    }

    /// Mutable view `index`.
    pub fn view_mut(&mut self, index: usize) -> Option<&mut View> {
        self.views.get_mut(index)
    }

    /// The view receiving input.
    pub fn active_view(&self) -> Option<&View> {
        self.views.get(self.active_view)
    }

    /// Mutable view receiving input.
    pub fn active_view_mut(&mut self) -> Option<&mut View> {
        self.views.get_mut(self.active_view)
    }

    /// Route input to view `index`. The active tool is reset.
    pub fn set_active_view(&mut self, index: usize) -> CanvasmarkResult<()> {
        if index >= self.views.len() {
            return Err(CanvasmarkError::precondition(format!("no view {index}")));
        }
        if index != self.active_view {
            self.tools.reset_active();
            if let Some(view) = self.views.get_mut(self.active_view) {
                view.clear_drawing();
            }
            self.active_view = index;
        }
        Ok(())
    }

    /// Show `item` in the active view. Clears its history and resets the active tool.
    pub fn set_item(&mut self, item: ItemInfo) -> CanvasmarkResult<()> {
        let view = self.views.get_mut(self.active_view).ok_or_else(no_view)?;
        view.set_item(item);
        self.tools.reset_active();
        Ok(())
    }

    /// Request `frame` in the active view.
    pub fn jump_to_frame(&mut self, frame: FrameIndex) -> CanvasmarkResult<FrameIndex> {
        self.active_view_mut().ok_or_else(no_view)?.jump_to_frame(frame)
    }

    /// One playback interval of the active view.
    pub fn tick_playback(&mut self) -> CanvasmarkResult<Option<FrameIndex>> {
        self.active_view_mut().ok_or_else(no_view)?.tick_playback()
    }

    // ---- plugins -------------------------------------------------------------------------------

    /// Make `plugin` available for installation.
    pub fn register_plugin(&mut self, plugin: Rc<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    /// Install plugin `name`.
    pub fn install_plugin(&mut self, name: &str) -> CanvasmarkResult<()> {
        self.plugins
            .install(name, &self.registry, &self.handlers, &self.config)?;
        self.mark_views_stale();
        Ok(())
    }

    /// Uninstall plugin `name`. An active tool it registered is deactivated.
    pub fn uninstall_plugin(&mut self, name: &str) -> bool {
        let removed = self
            .plugins
            .uninstall(name, &self.registry, &self.handlers, &self.config);
        if removed {
            if self.tools.drop_unregistered(&self.registry.tools) {
                if let Some(view) = self.views.get_mut(self.active_view) {
                    view.clear_drawing();
                }
            }
            self.mark_views_stale();
        }
        removed
    }

    /// Install every known plugin.
    #[tracing::instrument(skip(self))]
    pub fn install_all_plugins(&mut self) -> CanvasmarkResult<()> {
        self.plugins
            .install_all(&self.registry, &self.handlers, &self.config)?;
        self.mark_views_stale();
        Ok(())
    }

    /// Install the plugins relevant to the active view. Returns their names.
    pub fn install_plugins_for_view(&mut self) -> CanvasmarkResult<Vec<String>> {
        let view = self.views.get(self.active_view).ok_or_else(no_view)?;
        let names = self.plugins.plugins_for_view(view);
        for name in &names {
            self.plugins
                .install(name, &self.registry, &self.handlers, &self.config)?;
        }
        self.mark_views_stale();
        Ok(names)
    }

    fn mark_views_stale(&mut self) {
        for view in &mut self.views {
            view.mark_stale();
        }
    }

    // ---- tools and commands --------------------------------------------------------------------

    /// Make `name` the active tool.
    pub fn activate_tool(&mut self, name: &str) -> CanvasmarkResult<()> {
        if self.tools.active_name() == Some(name) {
            return Ok(());
        }
        self.tools
            .activate(name, &self.registry.tools, &self.handlers, &self.config)?;
        self.after_tool_switch();
        Ok(())
    }

    /// Reactivate the tool active before the current one.
    pub fn activate_previous_tool(&mut self) -> CanvasmarkResult<()> {
        self.tools
            .activate_previous(&self.registry.tools, &self.handlers, &self.config)?;
        self.after_tool_switch();
        Ok(())
    }

    /// Leave the active tool.
    pub fn deactivate_tool(&mut self) {
        if self.tools.deactivate().is_some() {
            self.after_tool_switch();
        }
    }

    fn after_tool_switch(&mut self) {
        if let Some(view) = self.views.get_mut(self.active_view) {
            view.clear_drawing();
            view.mark_stale();
        }
        self.refresh();
    }

    /// Register an application command; releasing the handle removes it.
    pub fn register_command(
        &mut self,
        name: &str,
        f: impl Fn(&mut ToolContext<'_>) + 'static,
    ) -> CallbackHandle {
        self.registry.commands.register(name, f)
    }

    /// Run command `name` against the active view.
    pub fn run_command(&mut self, name: &str) -> CanvasmarkResult<()> {
        self.invoke_command(name)?;
        self.process_requests();
        self.refresh();
        Ok(())
    }

    fn invoke_command(&mut self, name: &str) -> CanvasmarkResult<()> {
        let command = self
            .registry
            .commands
            .get(name)
            .ok_or_else(|| CanvasmarkError::precondition(format!("unknown command {name}")))?;
        let view = self.views.get_mut(self.active_view).ok_or_else(no_view)?;
        tracing::debug!(command = name, "running command");
        command(&mut ToolContext::new(
            view,
            &self.registry,
            &self.config,
            &mut self.requests,
        ));
        Ok(())
    }

    fn process_requests(&mut self) {
        for _ in 0..MAX_REQUEST_ROUNDS {
            if self.requests.is_empty() {
                return;
            }
            for request in std::mem::take(&mut self.requests) {
                let result = match &request {
                    EditorRequest::ActivateTool(name) => self.activate_tool(name),
                    EditorRequest::ActivatePreviousTool => self.activate_previous_tool(),
                    EditorRequest::DeactivateTool => {
                        self.deactivate_tool();
                        Ok(())
                    }
                    EditorRequest::RunCommand(name) => self.invoke_command(name),
                };
                if let Err(err) = result {
                    tracing::warn!(?request, error = %err, "editor request failed");
                }
            }
        }
        if !self.requests.is_empty() {
            tracing::warn!(dropped = self.requests.len(), "editor request chain too long");
            self.requests.clear();
        }
    }

    // ---- input ---------------------------------------------------------------------------------

    fn dispatch<E: 'static>(
        &mut self,
        handlers: CallbackCollection<Handler<E>>,
        event: &E,
    ) -> CallbackStatus {
        let status = match self.views.get_mut(self.active_view) {
            Some(view) => {
                let mut ctx =
                    ToolContext::new(view, &self.registry, &self.config, &mut self.requests);
                handlers.dispatch(|h| h(&mut ctx, event))
            }
            None => CallbackStatus::Continue,
        };
        self.process_requests();
        self.refresh();
        status
    }

    /// Pointer pressed on the canvas.
    pub fn pointer_down(&mut self, event: &PointerEvent) -> CallbackStatus {
        let handlers = self.handlers.pointer_down.clone();
        self.dispatch(handlers, event)
    }

    /// Pointer moved over the canvas.
    pub fn pointer_move(&mut self, event: &PointerEvent) -> CallbackStatus {
        let handlers = self.handlers.pointer_move.clone();
        self.dispatch(handlers, event)
    }

    /// Pointer released.
    pub fn pointer_up(&mut self, event: &PointerEvent) -> CallbackStatus {
        let handlers = self.handlers.pointer_up.clone();
        self.dispatch(handlers, event)
    }

    /// Wheel over the canvas.
    pub fn wheel(&mut self, event: &WheelEvent) -> CallbackStatus {
        let handlers = self.handlers.wheel.clone();
        self.dispatch(handlers, event)
    }

    /// Key pressed. Events no handler claimed fall through to the keybinding table.
    pub fn key_down(&mut self, event: &KeyEvent) -> CallbackStatus {
        let handlers = self.handlers.key_down.clone();
        if self.dispatch(handlers, event) == CallbackStatus::Stop {
            return CallbackStatus::Stop;
        }
        if event.repeat {
            return CallbackStatus::Continue;
        }
        let Some(command) = self.registry.commands.command_for(&event.binding()) else {
            return CallbackStatus::Continue;
        };
        match self.run_command(&command) {
            Ok(()) => CallbackStatus::Stop,
            Err(err) => {
                tracing::warn!(%command, error = %err, "bound command failed");
                CallbackStatus::Continue
            }
        }
    }

    /// Key released.
    pub fn key_up(&mut self, event: &KeyEvent) -> CallbackStatus {
        let handlers = self.handlers.key_up.clone();
        self.dispatch(handlers, event)
    }

    // ---- update and render ---------------------------------------------------------------------

    /// Apply queued operations in every view, then refresh derived state. Returns how many
    /// operations succeeded.
    pub async fn run_pending(&mut self) -> usize {
        self.sync_item_changes();
        let mut done = 0;
        for view in &mut self.views {
            done += view.run_pending().await;
        }
        self.refresh();
        done
    }

    // Host item changes; a switch in the active view resets the active tool like `set_item`.
    fn sync_item_changes(&mut self) {
        for (i, view) in self.views.iter_mut().enumerate() {
            if view.sync_item_change() && i == self.active_view {
                self.tools.reset_active();
            }
        }
    }

    /// Apply host item changes, then bring overlays, measures and layer flags of every view up
    /// to date.
    pub fn refresh(&mut self) {
        self.sync_item_changes();
        let tools = &self.tools;
        let active_filter = |a: &Annotation| tools.should_render(a);
        let all = |_: &Annotation| true;
        for (i, view) in self.views.iter_mut().enumerate() {
            if i == self.active_view {
                view.refresh(&active_filter);
            } else {
                view.refresh(&all);
            }
        }
    }

    /// Rasterize the active view if it has dirty layers.
    pub fn redraw(&mut self) -> CanvasmarkResult<Option<FrameRgba>> {
        let tools = &self.tools;
        let view = self.views.get_mut(self.active_view).ok_or_else(no_view)?;
        view.redraw(&|a: &Annotation| tools.should_render(a))
    }
}

#[cfg(test)]
#[path = "../tests/unit/editor/editor.rs"]
mod tests;
