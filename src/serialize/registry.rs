//! Per-annotation-type mapping between wire JSON and in-memory geometry.

use std::rc::Rc;

use serde_json::Value;

use crate::foundation::callback::CallbackHandle;
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::foundation::registry::NamedRegistry;
use crate::model::shapes::AnnotationData;

/// Bidirectional wire mapping for one annotation type.
pub trait Serializer {
    /// Annotation type name, also the key of the geometry inside a `data` object.
    fn annotation_type(&self) -> &str;

    /// Parse the geometry stored under the type key.
    fn deserialize(&self, value: &Value) -> CanvasmarkResult<AnnotationData>;

    /// Produce the value stored under the type key.
    fn serialize(&self, data: &AnnotationData) -> CanvasmarkResult<Value>;
}

/// Shared serializer table. Clones refer to the same table.
#[derive(Clone, Debug, Default)]
pub struct SerializerRegistry {
    entries: NamedRegistry<dyn Serializer>,
}

impl SerializerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in serializer.
    pub fn with_builtins() -> Self {
        let reg = Self::new();
        for s in crate::serialize::builtin::builtin_serializers() {
            reg.entries.insert(s.annotation_type().to_string(), s);
        }
        reg
    }

    /// Register (or replace) the serializer for its type; releasing the handle removes it.
    pub fn register(&self, serializer: Rc<dyn Serializer>) -> CallbackHandle {
        let name = serializer.annotation_type().to_string();
        self.entries.register(name, serializer)
    }

    /// Serializer for `annotation_type`.
    pub fn get(&self, annotation_type: &str) -> Option<Rc<dyn Serializer>> {
        self.entries.get(annotation_type)
    }

    /// Return `true` when a serializer exists for `annotation_type`.
    pub fn contains(&self, annotation_type: &str) -> bool {
        self.entries.contains(annotation_type)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<String> {
        self.entries.names()
    }

    /// Parse geometry for `annotation_type`.
    pub fn deserialize(
        &self,
        annotation_type: &str,
        value: &Value,
    ) -> CanvasmarkResult<AnnotationData> {
        self.require(annotation_type)?.deserialize(value)
    }

    /// Serialize geometry for `annotation_type`.
    pub fn serialize(&self, annotation_type: &str, data: &AnnotationData) -> CanvasmarkResult<Value> {
        self.require(annotation_type)?.serialize(data)
    }

    fn require(&self, annotation_type: &str) -> CanvasmarkResult<Rc<dyn Serializer>> {
        self.get(annotation_type).ok_or_else(|| {
            CanvasmarkError::serde(format!("no serializer registered for '{annotation_type}'"))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/serialize/registry.rs"]
mod tests;
