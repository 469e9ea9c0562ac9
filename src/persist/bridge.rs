//! Boundary to the host's annotation backend.

use futures::future::LocalBoxFuture;

use crate::foundation::error::CanvasmarkError;
use crate::model::annotation::{Annotation, AnnotationId};

/// Which persistence call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PersistOp {
    /// Create.
    Create,
    /// Update.
    Update,
    /// Delete.
    Delete,
}

impl std::fmt::Display for PersistOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Rejection reported by the backend.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{op} of annotation {id} failed: {reason}")]
pub struct PersistError {
    /// Failed call.
    pub op: PersistOp,
    /// Annotation concerned.
    pub id: AnnotationId,
    /// Backend message.
    pub reason: String,
}

impl PersistError {
    /// Build an error for `op` on `id`.
    pub fn new(op: PersistOp, id: AnnotationId, reason: impl Into<String>) -> Self {
        Self {
            op,
            id,
            reason: reason.into(),
        }
    }
}

impl From<PersistError> for CanvasmarkError {
    fn from(err: PersistError) -> Self {
        CanvasmarkError::persistence(err.to_string())
    }
}

/// Async create/update/delete supplied by the host.
///
/// Futures are local: the engine runs on one thread and awaits them from its event loop.
pub trait PersistenceBridge {
    /// Persist a new annotation, returning the stored entity.
    fn create<'a>(
        &'a self,
        annotation: &'a Annotation,
    ) -> LocalBoxFuture<'a, Result<Annotation, PersistError>>;

    /// Persist changes to an existing annotation, returning the stored entity.
    fn update<'a>(
        &'a self,
        annotation: &'a Annotation,
    ) -> LocalBoxFuture<'a, Result<Annotation, PersistError>>;

    /// Delete an annotation.
    fn delete<'a>(&'a self, annotation: &'a Annotation) -> LocalBoxFuture<'a, Result<(), PersistError>>;
}
