use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::actions::manager::Action;
use crate::managers::annotation::AnnotationManager;
use crate::model::annotation::Annotation;

/// Create one annotation; undo deletes it again.
#[derive(Clone, Debug)]
pub struct CreateAnnotation {
    annotation: Annotation,
}

impl CreateAnnotation {
    /// Action creating `annotation` (its id is kept across redo).
    pub fn new(annotation: Annotation) -> Self {
        Self { annotation }
    }
}

impl Action for CreateAnnotation {
    fn label(&self) -> &str {
        "create annotation"
    }

    fn apply<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move { annotations.persist_create(self.annotation.clone()).await }.boxed_local()
    }

    fn undo<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move {
            if let Some(current) = annotations.get(&self.annotation.id) {
                self.annotation = current.clone();
            }
            annotations.persist_delete(&self.annotation.id).await
        }
        .boxed_local()
    }
}

/// Delete one annotation; undo re-creates it with the same id and geometry.
#[derive(Clone, Debug)]
pub struct DeleteAnnotation {
    annotation: Annotation,
}

impl DeleteAnnotation {
    /// Action deleting `annotation`.
    pub fn new(annotation: Annotation) -> Self {
        Self { annotation }
    }
}

impl Action for DeleteAnnotation {
    fn label(&self) -> &str {
        "delete annotation"
    }

    fn apply<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move { annotations.persist_delete(&self.annotation.id).await }.boxed_local()
    }

    fn undo<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move { annotations.persist_create(self.annotation.clone()).await }.boxed_local()
    }
}

/// Replace an annotation with a new version; undo restores the old one.
#[derive(Clone, Debug)]
pub struct UpdateAnnotation {
    before: Annotation,
    after: Annotation,
    label: &'static str,
}

impl UpdateAnnotation {
    /// Action turning `before` into `after` (same id).
    pub fn new(before: Annotation, after: Annotation) -> Self {
        Self {
            before,
            after,
            label: "update annotation",
        }
    }

    /// Same action with a more specific log label.
    pub fn labeled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Value written by [`Action::apply`].
    pub fn after(&self) -> &Annotation {
        &self.after
    }
}

impl Action for UpdateAnnotation {
    fn label(&self) -> &str {
        self.label
    }

    fn apply<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move { annotations.persist_update(self.after.clone()).await }.boxed_local()
    }

    fn undo<'a>(&'a mut self, annotations: &'a mut AnnotationManager) -> LocalBoxFuture<'a, bool> {
        async move { annotations.persist_update(self.before.clone()).await }.boxed_local()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/actions/annotation.rs"]
mod tests;
