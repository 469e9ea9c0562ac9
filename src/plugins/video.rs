//! Playback and frame stepping commands.

use crate::editor::ToolContext;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::CanvasmarkResult;
use crate::managers::plugin::{Plugin, PluginContext};

fn report(ctx: &ToolContext<'_>, result: CanvasmarkResult<impl Sized>) {
    if let Err(err) = result {
        ctx.view.warn(err.to_string());
    }
}

/// `video.*` commands and their keys.
#[derive(Debug, Default)]
pub struct VideoPlugin;

impl Plugin for VideoPlugin {
    fn name(&self) -> &str {
        "video"
    }

    fn activate(&self, ctx: &mut PluginContext<'_>) -> CanvasmarkResult<()> {
        ctx.register_command("video.play", |c: &mut ToolContext<'_>| {
            let result = c.view.play();
            report(c, result);
        });
        ctx.register_command("video.pause", |c: &mut ToolContext<'_>| c.view.pause());
        ctx.register_command("video.toggle", |c: &mut ToolContext<'_>| {
            let result = c.view.toggle_playback();
            report(c, result);
        });
        ctx.register_command("video.next_frame", |c: &mut ToolContext<'_>| {
            let next = c.view.frame().next();
            let result = c.view.jump_to_frame(next);
            report(c, result);
        });
        ctx.register_command("video.previous_frame", |c: &mut ToolContext<'_>| {
            let previous = FrameIndex(c.view.frame().0.saturating_sub(1));
            let result = c.view.jump_to_frame(previous);
            report(c, result);
        });
        ctx.bind_key("space", "video.toggle");
        ctx.bind_key("arrowright", "video.next_frame");
        ctx.bind_key("arrowleft", "video.previous_frame");
        Ok(())
    }
}
