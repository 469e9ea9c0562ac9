//! Per-annotation-type draw routines and geometric queries.

use std::rc::Rc;

use crate::animation::interpolate::InterpolationAlgorithm;
use crate::foundation::callback::CallbackHandle;
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::foundation::registry::NamedRegistry;
use crate::model::shapes::AnnotationData;
use crate::render::draw::{DrawList, DrawStyle};

/// Draws one annotation type and answers geometric questions about it.
pub trait AnnotationRenderer {
    /// Annotation type handled by this renderer.
    fn annotation_type(&self) -> &str;

    /// Append the draw operations for `data` to `out`.
    fn draw(&self, data: &AnnotationData, style: &DrawStyle, out: &mut DrawList)
    -> CanvasmarkResult<()>;

    /// Axis-aligned bounds in image space; `None` for geometry-less types.
    fn bounding_box(&self, data: &AnnotationData) -> Option<Rect>;

    /// Anchor point for labels, in image space.
    fn centroid(&self, data: &AnnotationData) -> Option<Point> {
        self.bounding_box(data).map(|r| r.center())
    }

    /// Hit test in image space. `tolerance` widens thin shapes (image pixels).
    fn contains_point(&self, data: &AnnotationData, point: Point, tolerance: f64) -> bool;

    /// Whether keyframes of this type can be interpolated.
    fn supports_interpolation(&self) -> bool {
        false
    }

    /// Whether new video annotations of this type interpolate by default.
    fn interpolate_by_default(&self) -> bool {
        false
    }

    /// Geometry between two keyframes at factor `t`.
    fn interpolate(
        &self,
        _prev: &AnnotationData,
        _next: &AnnotationData,
        _t: f64,
        _algorithm: InterpolationAlgorithm,
    ) -> CanvasmarkResult<AnnotationData> {
        Err(CanvasmarkError::precondition(format!(
            "'{}' does not support interpolation",
            self.annotation_type()
        )))
    }
}

/// Shared renderer table. Clones refer to the same table.
#[derive(Clone, Debug, Default)]
pub struct RendererRegistry {
    entries: NamedRegistry<dyn AnnotationRenderer>,
}

impl RendererRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in renderer.
    pub fn with_builtins() -> Self {
        let reg = Self::new();
        for r in crate::render::renderers::builtin_renderers() {
            reg.entries.insert(r.annotation_type().to_string(), r);
        }
        reg
    }

    /// Register (or replace) the renderer for its type; releasing the handle removes it.
    pub fn register(&self, renderer: Rc<dyn AnnotationRenderer>) -> CallbackHandle {
        let name = renderer.annotation_type().to_string();
        self.entries.register(name, renderer)
    }

    /// Renderer for `annotation_type`.
    pub fn get(&self, annotation_type: &str) -> Option<Rc<dyn AnnotationRenderer>> {
        self.entries.get(annotation_type)
    }

    /// Renderer for `annotation_type`, or a [`CanvasmarkError::Render`].
    pub fn require(&self, annotation_type: &str) -> CanvasmarkResult<Rc<dyn AnnotationRenderer>> {
        self.get(annotation_type).ok_or_else(|| {
            CanvasmarkError::render(format!("no renderer registered for '{annotation_type}'"))
        })
    }

    /// Return `true` when a renderer exists for `annotation_type`.
    pub fn contains(&self, annotation_type: &str) -> bool {
        self.entries.contains(annotation_type)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<String> {
        self.entries.names()
    }
}
