//! Derived label overlays, one per visible annotation.

use std::collections::BTreeMap;

use crate::foundation::callback::{CallbackCollection, CallbackHandle, CallbackStatus};
use crate::foundation::core::{Affine, FrameIndex, Point};
use crate::managers::annotation::AnnotationManager;
use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::sub::SubAnnotations;

/// Label overlay anchored at an annotation's centroid.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct OverlayRecord {
    /// Annotation the overlay belongs to.
    pub annotation_id: AnnotationId,
    /// Class name, or `#<class id>` for unknown classes.
    pub label: String,
    /// Anchor in image space.
    pub position: Point,
    /// Anchor in canvas space.
    pub canvas_position: Point,
    /// Sub-annotation texts shown under the label.
    pub fragments: Vec<String>,
}

/// Listener notified with the whole map after every change.
pub type OverlayListener = dyn FnMut(&BTreeMap<AnnotationId, OverlayRecord>);

/// Inputs needed to derive overlays.
pub struct OverlayInputs<'a> {
    /// Annotation store.
    pub annotations: &'a AnnotationManager,
    /// Current frame.
    pub frame: FrameIndex,
    /// Image-to-canvas transform.
    pub transform: Affine,
    /// Annotations the active tool hides (e.g. while editing them).
    pub should_render: &'a dyn Fn(&Annotation) -> bool,
}

fn fragments(sub: &SubAnnotations) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(text) = &sub.text {
        out.push(text.clone());
    }
    if let Some(id) = sub.instance_id {
        out.push(format!("#{id}"));
    }
    if !sub.attributes.is_empty() {
        out.push(sub.attributes.join(", "));
    }
    out
}

/// Overlay map of one view.
#[derive(Default)]
pub struct OverlayManager {
    entries: BTreeMap<AnnotationId, OverlayRecord>,
    listeners: CallbackCollection<OverlayListener>,
}

impl std::fmt::Debug for OverlayManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayManager")
            .field("entries", &self.entries.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl OverlayManager {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current overlays.
    pub fn entries(&self) -> &BTreeMap<AnnotationId, OverlayRecord> {
        &self.entries
    }

    /// Overlay of `id`.
    pub fn get(&self, id: &AnnotationId) -> Option<&OverlayRecord> {
        self.entries.get(id)
    }

    /// Observe changes; releasing the handle unsubscribes.
    pub fn subscribe(&self, listener: Box<OverlayListener>) -> CallbackHandle {
        self.listeners.register(listener)
    }

    fn emit(&self) {
        let entries = &self.entries;
        self.listeners.dispatch(|l| {
            l(entries);
            CallbackStatus::Continue
        });
    }

    /// Overlay for `annotation`, `None` when it is hidden or has nothing to show at this frame.
    pub fn compute(&self, inputs: &OverlayInputs<'_>, annotation: &Annotation) -> Option<OverlayRecord> {
        if !annotation.is_visible || !(inputs.should_render)(annotation) {
            return None;
        }
        let store = inputs.annotations;
        let renderer = store.renderers().get(&annotation.annotation_type)?;
        let data = store.data_at(annotation, inputs.frame)?;
        let position = renderer.centroid(&data)?;
        let label = store
            .class(annotation.class_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("#{}", annotation.class_id));
        let fragments = store
            .sub_annotations_at(annotation, inputs.frame)
            .map(|s| fragments(&s))
            .unwrap_or_default();
        Some(OverlayRecord {
            annotation_id: annotation.id.clone(),
            label,
            position,
            canvas_position: inputs.transform * position,
            fragments,
        })
    }

    /// Recompute the whole map from the visible annotations.
    pub fn reset(&mut self, inputs: &OverlayInputs<'_>) {
        self.entries = inputs
            .annotations
            .annotations()
            .iter()
            .filter_map(|a| self.compute(inputs, a))
            .map(|r| (r.annotation_id.clone(), r))
            .collect();
        self.emit();
    }

    /// Recompute the overlay of one annotation; it is removed when nothing is left to show.
    pub fn update_for(&mut self, inputs: &OverlayInputs<'_>, annotation: &Annotation) {
        match self.compute(inputs, annotation) {
            Some(record) => {
                if self.entries.get(&annotation.id) == Some(&record) {
                    return;
                }
                self.entries.insert(annotation.id.clone(), record);
                self.emit();
            }
            None => self.remove_for(&annotation.id),
        }
    }

    /// Drop the overlay of `id`.
    pub fn remove_for(&mut self, id: &AnnotationId) {
        if self.entries.remove(id).is_some() {
            self.emit();
        }
    }

    /// Drop every overlay.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.emit();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/managers/overlay.rs"]
mod tests;
