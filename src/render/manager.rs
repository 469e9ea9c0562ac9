use std::borrow::Cow;

use crate::foundation::core::{Affine, Rgba8};
use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::shapes::AnnotationData;
use crate::render::draw::{DrawList, DrawStyle};
use crate::render::registry::RendererRegistry;

/// One annotation ready to paint: resolved geometry (inferred for video) and class color.
#[derive(Clone, Debug)]
pub struct PaintItem<'a> {
    /// Annotation being painted.
    pub annotation: &'a Annotation,
    /// Geometry at the current frame.
    pub data: Cow<'a, AnnotationData>,
    /// Draw color.
    pub color: Rgba8,
}

/// Result of one paint pass.
#[derive(Clone, Debug, Default)]
pub struct PaintOutcome {
    /// Draw operations, back to front.
    pub list: DrawList,
    /// Annotations skipped because their renderer was missing or failed.
    pub skipped: Vec<AnnotationId>,
}

/// Turns annotations into draw operations through the renderer registry.
#[derive(Clone, Debug, Default)]
pub struct RenderManager {
    renderers: RendererRegistry,
}

impl RenderManager {
    /// Manager drawing through `renderers`.
    pub fn new(renderers: RendererRegistry) -> Self {
        Self { renderers }
    }

    /// Renderer table in use.
    pub fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }

    /// Paint `items` in the given order (back to front).
    ///
    /// A missing or failing renderer skips that annotation with a warning; the pass itself never
    /// fails.
    #[tracing::instrument(skip_all)]
    pub fn paint<'a>(
        &self,
        items: impl IntoIterator<Item = PaintItem<'a>>,
        transform: Affine,
        scale: f64,
    ) -> PaintOutcome {
        let mut out = PaintOutcome::default();
        for item in items {
            let a = item.annotation;
            let Some(renderer) = self.renderers.get(&a.annotation_type) else {
                tracing::warn!(id = %a.id, annotation_type = %a.annotation_type, "no renderer, skipping annotation");
                out.skipped.push(a.id.clone());
                continue;
            };
            let style = DrawStyle {
                selected: a.is_selected,
                highlighted: a.is_highlighted,
                ..DrawStyle::new(transform, scale, item.color)
            };
            let mut ops = DrawList::new();
            match renderer.draw(&item.data, &style, &mut ops) {
                Ok(()) => out.list.extend(ops),
                Err(err) => {
                    tracing::warn!(id = %a.id, error = %err, "renderer failed, skipping annotation");
                    out.skipped.push(a.id.clone());
                }
            }
        }
        tracing::debug!(ops = out.list.len(), skipped = out.skipped.len(), "paint pass");
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/manager.rs"]
mod tests;
