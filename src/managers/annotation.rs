//! Authoritative in-memory annotation store of one view.
//!
//! Annotations are kept ordered by descending `z_index` at all times. Local mutations are
//! recorded as [`AnnotationChange`]s which the owning view drains to refresh layers and derived
//! maps. Persistence goes through the host's [`PersistenceBridge`] with optimistic local updates
//! that are rolled back when the backend rejects them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::rc::Rc;

use crossbeam_channel::Receiver;

use crate::animation::interpolate::InterpolationAlgorithm;
use crate::foundation::core::{FrameIndex, Point};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::foundation::notice::{Notice, Notifier};
use crate::model::annotation::{Annotation, AnnotationBody, AnnotationClass, AnnotationId};
use crate::model::shapes::AnnotationData;
use crate::model::sub::SubAnnotations;
use crate::model::video::InferredFrame;
use crate::persist::bridge::PersistenceBridge;
use crate::render::registry::RendererRegistry;

/// Bulk change pushed by the host's stage state.
#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    /// Annotations created elsewhere.
    Added(Vec<Annotation>),
    /// Annotations deleted elsewhere.
    Removed(Vec<AnnotationId>),
    /// Annotations changed elsewhere.
    Updated(Vec<Annotation>),
}

/// Local mutation record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationChange {
    /// The whole set was replaced.
    Reset,
    /// One annotation was inserted.
    Inserted(AnnotationId),
    /// One annotation changed (geometry, flags or z-order).
    Updated(AnnotationId),
    /// One annotation was removed.
    Removed(AnnotationId),
}

/// Annotation store of one view.
pub struct AnnotationManager {
    annotations: Vec<Annotation>,
    classes: BTreeMap<u64, AnnotationClass>,
    renderers: RendererRegistry,
    bridge: Rc<dyn PersistenceBridge>,
    notifier: Rc<dyn Notifier>,
    stage_events: Option<Receiver<StageEvent>>,
    default_interpolation: InterpolationAlgorithm,
    changes: Vec<AnnotationChange>,
}

impl std::fmt::Debug for AnnotationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationManager")
            .field("annotations", &self.annotations.len())
            .field("classes", &self.classes.len())
            .field("pending_changes", &self.changes.len())
            .finish()
    }
}

impl AnnotationManager {
    /// Empty store persisting through `bridge` and reporting through `notifier`.
    pub fn new(
        renderers: RendererRegistry,
        bridge: Rc<dyn PersistenceBridge>,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            annotations: Vec::new(),
            classes: BTreeMap::new(),
            renderers,
            bridge,
            notifier,
            stage_events: None,
            default_interpolation: InterpolationAlgorithm::default(),
            changes: Vec::new(),
        }
    }

    /// Interpolation used for video annotations that do not name one.
    pub fn set_default_interpolation(&mut self, algorithm: InterpolationAlgorithm) {
        self.default_interpolation = algorithm;
    }

    /// Notifier used for user-facing warnings.
    pub fn notifier(&self) -> &Rc<dyn Notifier> {
        &self.notifier
    }

    /// Renderer table used for hit testing and interpolation.
    pub fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }

    // ---- classes -------------------------------------------------------------------------------

    /// Replace the known annotation classes.
    pub fn set_classes(&mut self, classes: impl IntoIterator<Item = AnnotationClass>) {
        self.classes = classes.into_iter().map(|c| (c.id, c)).collect();
        self.changes.push(AnnotationChange::Reset);
    }

    /// Class `id`.
    pub fn class(&self, id: u64) -> Option<&AnnotationClass> {
        self.classes.get(&id)
    }

    /// All known classes, by id.
    pub fn classes(&self) -> impl Iterator<Item = &AnnotationClass> {
        self.classes.values()
    }

    // ---- reads ---------------------------------------------------------------------------------

    /// Annotations ordered by descending `z_index`.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Number of stored annotations.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Return `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Annotation `id`.
    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| &a.id == id)
    }

    /// Return `true` when `id` is stored.
    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.get(id).is_some()
    }

    fn index_of(&self, id: &AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| &a.id == id)
    }

    /// Visible annotations accepted by `filter`, front to back.
    pub fn visible_annotations<'a>(
        &'a self,
        filter: impl Fn(&Annotation) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.annotations
            .iter()
            .filter(move |a| a.is_visible && filter(a))
    }

    /// Highest `z_index` in the store, 0 when empty.
    pub fn max_z_index(&self) -> i64 {
        self.annotations.first().map_or(0, |a| a.z_index.max(0))
    }

    /// `z_index` for a newly created annotation.
    pub fn next_z_index(&self) -> i64 {
        self.max_z_index() + 1
    }

    /// Drain the local change log.
    pub fn take_changes(&mut self) -> Vec<AnnotationChange> {
        std::mem::take(&mut self.changes)
    }

    // ---- local mutations -----------------------------------------------------------------------

    /// Replace the whole set. The stored order is descending `z_index` whatever the input order.
    #[tracing::instrument(skip_all, fields(count = annotations.len()))]
    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.sort();
        self.changes.push(AnnotationChange::Reset);
    }

    fn sort(&mut self) {
        self.annotations
            .sort_by(|a, b| b.z_index.cmp(&a.z_index));
    }

    /// Insert `annotation`, or replace the stored one with the same id.
    pub fn insert_local(&mut self, annotation: Annotation) {
        if self.contains(&annotation.id) {
            self.update_local(annotation);
            return;
        }
        let id = annotation.id.clone();
        let at = self
            .annotations
            .partition_point(|a| a.z_index > annotation.z_index);
        self.annotations.insert(at, annotation);
        self.changes.push(AnnotationChange::Inserted(id));
    }

    /// Replace the stored annotation with the same id, keeping its visibility, selection and
    /// highlight state. A `z_index` change shifts the annotations in between so the ordering
    /// stays dense. Returns the previous value.
    pub fn update_local(&mut self, annotation: Annotation) -> Option<Annotation> {
        self.replace(annotation, true)
    }

    fn replace(&mut self, mut annotation: Annotation, shift_others: bool) -> Option<Annotation> {
        let Some(i) = self.index_of(&annotation.id) else {
            self.insert_local(annotation);
            return None;
        };
        let old = self.annotations.remove(i);
        annotation.is_visible = old.is_visible;
        annotation.is_selected = old.is_selected;
        annotation.is_highlighted = old.is_highlighted;
        if shift_others {
            self.shift_z_indices(&annotation.id, old.z_index, annotation.z_index);
        }

        let id = annotation.id.clone();
        let at = self
            .annotations
            .partition_point(|a| a.z_index > annotation.z_index);
        self.annotations.insert(at, annotation);
        self.changes.push(AnnotationChange::Updated(id));
        Some(old)
    }

    fn shift_z_indices(&mut self, id: &AnnotationId, old_z: i64, new_z: i64) {
        if old_z == new_z {
            return;
        }
        for a in self.annotations.iter_mut().filter(|a| &a.id != id) {
            if new_z > old_z && a.z_index > old_z && a.z_index <= new_z {
                a.z_index -= 1;
            } else if new_z < old_z && a.z_index >= new_z && a.z_index < old_z {
                a.z_index += 1;
            }
        }
        self.sort();
    }

    /// Remove `id`, returning the stored value.
    pub fn remove_local(&mut self, id: &AnnotationId) -> Option<Annotation> {
        let i = self.index_of(id)?;
        let old = self.annotations.remove(i);
        self.changes.push(AnnotationChange::Removed(id.clone()));
        Some(old)
    }

    /// Give `id` the highest `z_index`.
    pub fn bring_to_front(&mut self, id: &AnnotationId) -> bool {
        let max = self.max_z_index();
        let Some(mut a) = self.get(id).cloned() else {
            return false;
        };
        if a.z_index == max && self.annotations.first().is_some_and(|f| &f.id == id) {
            return false;
        }
        a.z_index = max;
        self.update_local(a);
        true
    }

    fn set_flag(&mut self, id: &AnnotationId, f: impl Fn(&mut Annotation)) {
        if let Some(i) = self.index_of(id) {
            f(&mut self.annotations[i]);
            self.changes.push(AnnotationChange::Updated(id.clone()));
        }
    }

    /// Show or hide `id`.
    pub fn set_visible(&mut self, id: &AnnotationId, visible: bool) {
        self.set_flag(id, |a| a.is_visible = visible);
    }

    // ---- selection -----------------------------------------------------------------------------

    /// Selected annotation.
    pub fn selected(&self) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is_selected)
    }

    /// Highlighted annotation.
    pub fn highlighted(&self) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is_highlighted)
    }

    /// Select `id`, deselecting every other annotation. Returns `false` when `id` is unknown.
    pub fn select(&mut self, id: &AnnotationId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.deselect_all();
        self.set_flag(id, |a| a.is_selected = true);
        true
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        let ids: Vec<AnnotationId> = self
            .annotations
            .iter()
            .filter(|a| a.is_selected)
            .map(|a| a.id.clone())
            .collect();
        for id in ids {
            self.set_flag(&id, |a| a.is_selected = false);
        }
    }

    /// Highlight `id` (hover), clearing any other highlight.
    pub fn highlight(&mut self, id: &AnnotationId) {
        if self.highlighted().is_some_and(|a| &a.id == id) {
            return;
        }
        self.unhighlight_all();
        self.set_flag(id, |a| a.is_highlighted = true);
    }

    /// Clear every highlight.
    pub fn unhighlight_all(&mut self) {
        let ids: Vec<AnnotationId> = self
            .annotations
            .iter()
            .filter(|a| a.is_highlighted)
            .map(|a| a.id.clone())
            .collect();
        for id in ids {
            self.set_flag(&id, |a| a.is_highlighted = false);
        }
    }

    /// Select the visible annotation after the selected one (front to back, wrapping).
    pub fn select_next(&mut self) -> Option<AnnotationId> {
        self.select_step(1)
    }

    /// Select the visible annotation before the selected one (wrapping).
    pub fn select_previous(&mut self) -> Option<AnnotationId> {
        self.select_step(-1)
    }

    fn select_step(&mut self, step: isize) -> Option<AnnotationId> {
        let visible: Vec<AnnotationId> = self
            .annotations
            .iter()
            .filter(|a| a.is_visible)
            .map(|a| a.id.clone())
            .collect();
        if visible.is_empty() {
            return None;
        }
        let n = visible.len() as isize;
        let next = match self
            .selected()
            .and_then(|s| visible.iter().position(|id| id == &s.id))
        {
            Some(cur) => (cur as isize + step).rem_euclid(n),
            None if step > 0 => 0,
            None => n - 1,
        };
        let id = visible[next as usize].clone();
        self.select(&id);
        Some(id)
    }

    // ---- geometry at a frame -------------------------------------------------------------------

    /// Geometry and keyframe status of a video annotation at `frame`.
    ///
    /// Interpolation goes through the renderer of the annotation type; without an interpolating
    /// renderer the previous keyframe holds. Static annotations are a precondition failure.
    pub fn infer_video_data(
        &self,
        annotation: &Annotation,
        frame: FrameIndex,
    ) -> CanvasmarkResult<Option<InferredFrame>> {
        let AnnotationBody::Video(video) = &annotation.body else {
            return Err(CanvasmarkError::precondition(format!(
                "annotation {} is not a video annotation",
                annotation.id
            )));
        };
        let renderer = self
            .renderers
            .get(&annotation.annotation_type)
            .filter(|r| r.supports_interpolation());
        match renderer {
            Some(r) => {
                let f = |p: &AnnotationData,
                         n: &AnnotationData,
                         t: f64,
                         algo: InterpolationAlgorithm| r.interpolate(p, n, t, algo);
                video.infer_data(frame, Some(&f), self.default_interpolation)
            }
            None => video.infer_data(frame, None, self.default_interpolation),
        }
    }

    /// Geometry of `annotation` at `frame`: the static data, or the inferred video data.
    ///
    /// Inference failures are logged and treated as "nothing to show".
    pub fn data_at<'a>(
        &self,
        annotation: &'a Annotation,
        frame: FrameIndex,
    ) -> Option<Cow<'a, AnnotationData>> {
        match &annotation.body {
            AnnotationBody::Static { data, .. } => Some(Cow::Borrowed(data)),
            AnnotationBody::Video(_) => match self.infer_video_data(annotation, frame) {
                Ok(inferred) => inferred.map(|f| Cow::Owned(f.data)),
                Err(err) => {
                    tracing::warn!(id = %annotation.id, error = %err, "video inference failed");
                    None
                }
            },
        }
    }

    /// Sub-annotations of a video annotation at `frame`, walking back to the nearest sub-frame.
    pub fn video_sub_annotations(
        &self,
        id: &AnnotationId,
        frame: FrameIndex,
    ) -> CanvasmarkResult<Option<SubAnnotations>> {
        let a = self
            .get(id)
            .ok_or_else(|| CanvasmarkError::precondition(format!("unknown annotation {id}")))?;
        match &a.body {
            AnnotationBody::Video(v) => Ok(v.infer_sub_annotations(frame)),
            AnnotationBody::Static { .. } => Err(CanvasmarkError::precondition(format!(
                "annotation {id} has no video sub-annotations"
            ))),
        }
    }

    /// Sub-annotations of any annotation at `frame`.
    pub fn sub_annotations_at(&self, annotation: &Annotation, frame: FrameIndex) -> Option<SubAnnotations> {
        match &annotation.body {
            AnnotationBody::Static { sub, .. } => Some(sub.clone()),
            AnnotationBody::Video(v) => v.infer_sub_annotations(frame),
        }
    }

    /// Copy of `id` with `sub` attached (at `frame` for video annotations).
    pub fn with_sub_annotations(
        &self,
        id: &AnnotationId,
        sub: SubAnnotations,
        frame: FrameIndex,
    ) -> CanvasmarkResult<Annotation> {
        let mut a = self
            .get(id)
            .cloned()
            .ok_or_else(|| CanvasmarkError::precondition(format!("unknown annotation {id}")))?;
        match &mut a.body {
            AnnotationBody::Static { sub: s, .. } => *s = sub,
            AnnotationBody::Video(v) => {
                if v.segment_at(frame).is_none() {
                    return Err(CanvasmarkError::precondition(format!(
                        "annotation {id} is not present at frame {}",
                        frame.0
                    )));
                }
                v.sub_frames.insert(frame, sub);
            }
        }
        Ok(a)
    }

    /// Top-most visible annotation under `point` (image space) at `frame`.
    pub fn find_top_at(
        &self,
        point: Point,
        tolerance: f64,
        frame: FrameIndex,
        filter: impl Fn(&Annotation) -> bool,
    ) -> Option<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.is_visible && filter(a))
            .find(|a| {
                let Some(renderer) = self.renderers.get(&a.annotation_type) else {
                    return false;
                };
                self.data_at(a, frame)
                    .is_some_and(|d| renderer.contains_point(&d, point, tolerance))
            })
    }

    // ---- external events -----------------------------------------------------------------------

    /// Subscribe to the host's stage change stream.
    pub fn connect_stage_events(&mut self, events: Receiver<StageEvent>) {
        self.stage_events = Some(events);
    }

    /// Apply every pending stage event. Returns the number of events applied.
    pub fn sync_stage_events(&mut self) -> usize {
        let Some(rx) = self.stage_events.clone() else {
            return 0;
        };
        let mut applied = 0;
        for event in rx.try_iter() {
            self.apply_stage_event(event);
            applied += 1;
        }
        applied
    }

    /// Apply one stage event to the local cache. Host values, `z_index` included, are stored as
    /// given.
    pub fn apply_stage_event(&mut self, event: StageEvent) {
        match event {
            StageEvent::Added(list) | StageEvent::Updated(list) => {
                for a in list {
                    if self.contains(&a.id) {
                        self.replace(a, false);
                    } else {
                        self.insert_local(a);
                    }
                }
            }
            StageEvent::Removed(ids) => {
                for id in &ids {
                    self.remove_local(id);
                }
            }
        }
    }

    // ---- persistence ---------------------------------------------------------------------------

    fn warn(&self, content: String) {
        self.notifier.notify(Notice::warning(content));
    }

    /// Insert `annotation` and persist it. On rejection the store is put back as it was (a
    /// previously stored annotation with the same id is restored) and a warning is dispatched.
    #[tracing::instrument(skip_all, fields(id = %annotation.id))]
    pub async fn persist_create(&mut self, annotation: Annotation) -> bool {
        let bridge = Rc::clone(&self.bridge);
        let before = self.get(&annotation.id).cloned();
        self.insert_local(annotation.clone());
        match bridge.create(&annotation).await {
            Ok(stored) => {
                self.update_local(stored);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "create rejected, rolling back");
                match before {
                    Some(prev) => {
                        self.update_local(prev);
                    }
                    None => {
                        self.remove_local(&annotation.id);
                    }
                }
                self.warn(format!("Failed to save annotation: {err}"));
                false
            }
        }
    }

    /// Replace the stored annotation with `annotation` and persist it. On rejection the previous
    /// value is restored and a warning is dispatched.
    #[tracing::instrument(skip_all, fields(id = %annotation.id))]
    pub async fn persist_update(&mut self, annotation: Annotation) -> bool {
        let Some(before) = self.get(&annotation.id).cloned() else {
            self.warn(format!("Cannot update unknown annotation {}", annotation.id));
            return false;
        };
        let bridge = Rc::clone(&self.bridge);
        self.update_local(annotation.clone());
        match bridge.update(&annotation).await {
            Ok(stored) => {
                self.update_local(stored);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "update rejected, rolling back");
                self.update_local(before);
                self.warn(format!("Failed to update annotation: {err}"));
                false
            }
        }
    }

    /// Remove `id` and persist the deletion. On rejection the annotation is restored and a
    /// warning is dispatched.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn persist_delete(&mut self, id: &AnnotationId) -> bool {
        let Some(before) = self.remove_local(id) else {
            return false;
        };
        let bridge = Rc::clone(&self.bridge);
        match bridge.delete(&before).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "delete rejected, rolling back");
                self.insert_local(before);
                self.warn(format!("Failed to delete annotation: {err}"));
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/managers/annotation.rs"]
mod tests;
