//! Boolean edits between two polygon annotations.

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::actions::manager::Action;
use crate::foundation::core::Point;
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::foundation::notice::Notice;
use crate::geometry::boolean;
use crate::managers::annotation::AnnotationManager;
use crate::model::annotation::Annotation;
use crate::model::shapes::{AnnotationData, PolygonData};

fn polygon_rings(annotation: &Annotation) -> CanvasmarkResult<Vec<Vec<Point>>> {
    match annotation.static_data() {
        Some(AnnotationData::Polygon(p)) => Ok(p.rings()),
        _ => Err(CanvasmarkError::precondition(format!(
            "annotation {} is not a static polygon",
            annotation.id
        ))),
    }
}

fn with_rings(annotation: &Annotation, rings: Vec<Vec<Point>>) -> Option<Annotation> {
    let polygon = PolygonData::from_rings(rings)?;
    let mut out = annotation.clone();
    *out.static_data_mut()? = AnnotationData::Polygon(polygon);
    Some(out)
}

/// Union `other` into `target` and delete `other`.
///
/// Undo restores the target geometry and re-creates `other` with its original id.
#[derive(Clone, Debug)]
pub struct MergePolygons {
    target: Annotation,
    other: Annotation,
    merged: Annotation,
}

impl MergePolygons {
    /// Prepare the merge; both annotations must be static polygons.
    pub fn new(target: &Annotation, other: &Annotation) -> CanvasmarkResult<Self> {
        if target.id == other.id {
            return Err(CanvasmarkError::precondition(
                "cannot merge an annotation with itself",
            ));
        }
        let union = boolean::union(&polygon_rings(target)?, &polygon_rings(other)?);
        let merged = with_rings(target, union)
            .ok_or_else(|| CanvasmarkError::validation("union of two polygons is empty"))?;
        Ok(Self {
            target: target.clone(),
            other: other.clone(),
            merged,
        })
    }

    /// Target as written by [`Action::apply`].
    pub fn merged(&self) -> &Annotation {
        &self.merged
    }
}

impl Action for MergePolygons {
    fn label(&self) -> &str {
        "merge polygons"
    }

    fn apply<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move {
            if !annotations.persist_update(self.merged.clone()).await {
                return false;
            }
            if annotations.persist_delete(&self.other.id).await {
                return true;
            }
            annotations.persist_update(self.target.clone()).await;
            false
        }
        .boxed_local()
    }

    fn undo<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move {
            if !annotations.persist_update(self.target.clone()).await {
                return false;
            }
            if annotations.persist_create(self.other.clone()).await {
                return true;
            }
            annotations.persist_update(self.merged.clone()).await;
            false
        }
        .boxed_local()
    }
}

/// Replace `target` with the part of `cutter` that `target` does not cover; `cutter` is kept.
///
/// An empty result fails with one warning and no persistence call.
#[derive(Clone, Debug)]
pub struct SubtractPolygons {
    target: Annotation,
    result: Option<Annotation>,
}

impl SubtractPolygons {
    /// Prepare the subtraction; both annotations must be static polygons.
    pub fn new(target: &Annotation, cutter: &Annotation) -> CanvasmarkResult<Self> {
        let rings = boolean::difference(&polygon_rings(cutter)?, &polygon_rings(target)?);
        Ok(Self {
            target: target.clone(),
            result: with_rings(target, rings),
        })
    }

    /// Target as written by [`Action::apply`], `None` when the subtraction is empty.
    pub fn result(&self) -> Option<&Annotation> {
        self.result.as_ref()
    }
}

impl Action for SubtractPolygons {
    fn label(&self) -> &str {
        "subtract polygons"
    }

    fn apply<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move {
            let Some(result) = self.result.clone() else {
                annotations
                    .notifier()
                    .notify(Notice::warning("Subtraction would leave an empty polygon"));
                return false;
            };
            annotations.persist_update(result).await
        }
        .boxed_local()
    }

    fn undo<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move { annotations.persist_update(self.target.clone()).await }.boxed_local()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/actions/polygon.rs"]
mod tests;
