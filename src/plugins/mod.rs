//! Built-in plugins: one per annotation type plus the editing, navigation and video helpers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::editor::ToolContext;
use crate::managers::plugin::{Plugin, PluginContext};
use crate::managers::tool::Tool;
use crate::render::registry::AnnotationRenderer;
use crate::serialize::registry::Serializer;

pub mod brush;
pub mod edit;
pub(crate) mod navigation;
pub mod shapes;
pub mod video;
pub mod window_level;
pub mod zoom;

/// Every built-in plugin, not yet installed.
pub fn builtin_plugins() -> Vec<Rc<dyn Plugin>> {
    vec![
        Rc::new(shapes::PolygonPlugin),
        Rc::new(shapes::BoundingBoxPlugin),
        Rc::new(shapes::EllipsePlugin),
        Rc::new(shapes::KeypointPlugin),
        Rc::new(shapes::PolylinePlugin),
        Rc::new(shapes::TagPlugin),
        Rc::new(edit::EditPlugin),
        Rc::new(brush::BrushPlugin),
        Rc::new(zoom::ZoomPlugin),
        Rc::new(window_level::WindowLevelPlugin),
        Rc::new(video::VideoPlugin),
    ]
}

/// Register the renderer and serializer of one annotation type.
pub(crate) fn register_type(
    ctx: &mut PluginContext<'_>,
    renderer: Rc<dyn AnnotationRenderer>,
    serializer: Rc<dyn Serializer>,
) {
    ctx.register_renderer(renderer);
    ctx.register_serializer(serializer);
}

/// Register `tool` under `name` with its `<name>.activate` and `<name>.cancel` commands, and bind
/// `key` to activation.
pub(crate) fn register_tool_with_commands<T: Tool + 'static>(
    ctx: &mut PluginContext<'_>,
    name: &str,
    key: &str,
    tool: Rc<RefCell<T>>,
) {
    ctx.register_tool(name, Rc::clone(&tool));
    let activate = format!("{name}.activate");
    let target = name.to_string();
    ctx.register_command(&activate, move |c: &mut ToolContext<'_>| c.activate_tool(&target));
    ctx.register_command(&format!("{name}.cancel"), move |c: &mut ToolContext<'_>| {
        if let Ok(mut t) = tool.try_borrow_mut() {
            t.reset();
        }
        c.view.clear_drawing();
    });
    ctx.bind_key(key, &activate);
}
