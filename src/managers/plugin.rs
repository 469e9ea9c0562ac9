//! Plugin installation and the capability registrations each plugin owns.
//!
//! A plugin only touches the editor through a [`PluginContext`]; every registration made there
//! yields a handle the manager keeps per plugin and releases on uninstall.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::config::EditorConfig;
use crate::editor::{Registry, ToolContext};
use crate::foundation::callback::{CallbackHandle, CallbackStatus, release_all};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::foundation::input::{KeyEvent, PointerEvent, WheelEvent};
use crate::managers::tool::{InputHandlers, Tool};
use crate::model::annotation::AnnotationClass;
use crate::render::registry::AnnotationRenderer;
use crate::serialize::registry::Serializer;
use crate::view::pane::View;

/// A named capability bundle.
pub trait Plugin {
    /// Unique plugin name.
    fn name(&self) -> &str;

    /// Annotation types this plugin is relevant for. Empty means "always relevant".
    fn annotation_types(&self) -> Vec<String> {
        Vec::new()
    }

    /// Register tools, renderers, serializers, commands and keybindings.
    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()>;

    /// Called before the plugin's registrations are released.
    fn deactivate(&self, _ctx: &mut PluginContext<'_>) {}
}

/// Registration surface handed to a plugin. Everything registered here is released when the
/// plugin is uninstalled.
pub struct PluginContext<'a> {
    registry: &'a Registry,
    handlers: &'a InputHandlers,
    handles: &'a mut Vec<CallbackHandle>,
    /// Editor configuration.
    pub config: &'a EditorConfig,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        handlers: &'a InputHandlers,
        handles: &'a mut Vec<CallbackHandle>,
        config: &'a EditorConfig,
    ) -> Self {
        Self {
            registry,
            handlers,
            handles,
            config,
        }
    }

    /// Shared tables, for lookups.
    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Number of registrations made so far.
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Keep `handle` until uninstall.
    pub fn keep(&mut self, handle: CallbackHandle) {
        self.handles.push(handle);
    }

    /// Register `tool` under `name`.
    pub fn register_tool<T: Tool + 'static>(&mut self, name: &str, tool: Rc<RefCell<T>>) {
        let tool: Rc<RefCell<dyn Tool>> = tool;
        let h = self.registry.tools.register(name, tool);
        self.keep(h);
    }

    /// Register the renderer for its annotation type.
    pub fn register_renderer(&mut self, renderer: Rc<dyn AnnotationRenderer>) {
        let h = self.registry.renderers.register(renderer);
        self.keep(h);
    }

    /// Register the serializer for its annotation type.
    pub fn register_serializer(&mut self, serializer: Rc<dyn Serializer>) {
        let h = self.registry.serializers.register(serializer);
        self.keep(h);
    }

    /// Register command `name`.
    pub fn register_command(&mut self, name: &str, f: impl Fn(&mut ToolContext<'_>) + 'static) {
        let h = self.registry.commands.register(name, f);
        self.keep(h);
    }

    /// Bind a key combination to a command.
    pub fn bind_key(&mut self, binding: &str, command: &str) {
        let h = self.registry.commands.bind(binding, command);
        self.keep(h);
    }

    /// Declare a tool option.
    pub fn register_option(&mut self, id: &str, category: Option<&str>) {
        let h = self.registry.options.register(id, category);
        self.keep(h);
    }

    /// Editor-wide pointer-move handler, independent of the active tool.
    pub fn on_pointer_move(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &PointerEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.pointer_move.register(Box::new(f));
        self.keep(h);
    }

    /// Editor-wide wheel handler.
    pub fn on_wheel(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &WheelEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.wheel.register(Box::new(f));
        self.keep(h);
    }

    /// Editor-wide key-down handler.
    pub fn on_key_down(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &KeyEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.key_down.register(Box::new(f));
        self.keep(h);
    }

    /// Editor-wide key-up handler.
    pub fn on_key_up(
        &mut self,
        f: impl FnMut(&mut ToolContext<'_>, &KeyEvent) -> CallbackStatus + 'static,
    ) {
        let h = self.handlers.key_up.register(Box::new(f));
        self.keep(h);
    }
}

/// Known plugins and the handles of the installed ones.
#[derive(Default)]
pub struct PluginManager {
    known: BTreeMap<String, Rc<dyn Plugin>>,
    installed: BTreeMap<String, Vec<CallbackHandle>>,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("known", &self.known.keys().collect::<Vec<_>>())
            .field("installed", &self.installed.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginManager {
    /// No plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `plugin` known (not installed). Replaces a plugin of the same name.
    pub fn register(&mut self, plugin: Rc<dyn Plugin>) {
        self.known.insert(plugin.name().to_string(), plugin);
    }

    /// Names of every known plugin, sorted.
    pub fn known_names(&self) -> Vec<String> {
        self.known.keys().cloned().collect()
    }

    /// Names of the installed plugins, sorted.
    pub fn installed_names(&self) -> Vec<String> {
        self.installed.keys().cloned().collect()
    }

    /// Whether `name` is installed.
    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.contains_key(name)
    }

    /// Number of live registrations held for `name`.
    pub fn handle_count(&self, name: &str) -> usize {
        self.installed.get(name).map_or(0, Vec::len)
    }

    /// Activate plugin `name`. Installing twice is a no-op; a failing activation releases
    /// whatever it registered before failing.
    #[tracing::instrument(skip(self, registry, handlers, config))]
    pub fn install(
        &mut self,
        name: &str,
        registry: &Registry,
        handlers: &InputHandlers,
        config: &EditorConfig,
    ) -> CanvasmarkResult<()> {
        if self.is_installed(name) {
            return Ok(());
        }
        let plugin = self
            .known
            .get(name)
            .cloned()
            .ok_or_else(|| CanvasmarkError::precondition(format!("unknown plugin {name}")))?;
        let mut handles = Vec::new();
        let result = plugin.activate(&mut PluginContext::new(registry, handlers, &mut handles, config));
        if let Err(err) = result {
            release_all(&mut handles);
            return Err(err);
        }
        tracing::debug!(plugin = name, handles = handles.len(), "plugin installed");
        self.installed.insert(name.to_string(), handles);
        Ok(())
    }

    /// Deactivate plugin `name` and release everything it registered.
    #[tracing::instrument(skip(self, registry, handlers, config))]
    pub fn uninstall(
        &mut self,
        name: &str,
        registry: &Registry,
        handlers: &InputHandlers,
        config: &EditorConfig,
    ) -> bool {
        let Some(mut handles) = self.installed.remove(name) else {
            return false;
        };
        if let Some(plugin) = self.known.get(name).cloned() {
            plugin.deactivate(&mut PluginContext::new(registry, handlers, &mut handles, config));
        }
        release_all(&mut handles);
        tracing::debug!(plugin = name, "plugin uninstalled");
        true
    }

    /// Install every known plugin, stopping at the first failure.
    pub fn install_all(
        &mut self,
        registry: &Registry,
        handlers: &InputHandlers,
        config: &EditorConfig,
    ) -> CanvasmarkResult<()> {
        for name in self.known_names() {
            self.install(&name, registry, handlers, config)?;
        }
        Ok(())
    }

    /// Uninstall every installed plugin.
    pub fn uninstall_all(&mut self, registry: &Registry, handlers: &InputHandlers, config: &EditorConfig) {
        for name in self.installed_names() {
            self.uninstall(&name, registry, handlers, config);
        }
    }

    /// Known plugins relevant for `types`: those declaring one of them, plus the generic ones.
    pub fn plugins_for_types(&self, types: &BTreeSet<String>) -> Vec<String> {
        self.known
            .iter()
            .filter(|(_, p)| {
                let own = p.annotation_types();
                own.is_empty() || own.iter().any(|t| types.contains(t))
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Plugins relevant for a dataset with `classes`.
    pub fn plugins_for_dataset<'c>(
        &self,
        classes: impl IntoIterator<Item = &'c AnnotationClass>,
    ) -> Vec<String> {
        let types = classes
            .into_iter()
            .flat_map(|c| c.annotation_types.iter().cloned())
            .collect();
        self.plugins_for_types(&types)
    }

    /// Plugins relevant for `view`: its classes' types plus the types of its annotations.
    pub fn plugins_for_view(&self, view: &View) -> Vec<String> {
        let store = view.annotations();
        let types: BTreeSet<String> = store
            .classes()
            .flat_map(|c| c.annotation_types.iter().cloned())
            .chain(store.annotations().iter().map(|a| a.annotation_type.clone()))
            .collect();
        self.plugins_for_types(&types)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/managers/plugin.rs"]
mod tests;
