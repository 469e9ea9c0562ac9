/// Convenience result type used across canvasmark.
pub type CanvasmarkResult<T> = Result<T, CanvasmarkError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum CanvasmarkError {
    /// Invalid user-provided geometry, payload or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A caller invariant was violated (wrong annotation kind, missing view, ...).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The persistence bridge rejected a create/update/delete.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Missing or failing renderer for an annotation type.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing wire data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CanvasmarkError {
    /// Build a [`CanvasmarkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CanvasmarkError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`CanvasmarkError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`CanvasmarkError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CanvasmarkError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for CanvasmarkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
