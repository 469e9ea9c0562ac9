//! One editing pane: annotations, history, derived maps, camera and layers for one item.
//!
//! Mutations requested from input handlers are queued and applied by [`View::run_pending`],
//! the only place where the view awaits the persistence bridge or the frame loader. Derived
//! state (overlays, measures, dirty layers) is brought up to date by [`View::refresh`].

use std::collections::VecDeque;
use std::rc::Rc;

use crossbeam_channel::Receiver;

use crate::actions::annotation::CreateAnnotation;
use crate::actions::manager::{Action, ActionManager};
use crate::config::EditorConfig;
use crate::foundation::core::{FrameIndex, Point, Rgba8, Vec2};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::foundation::notice::{Notice, Notifier, TracingNotifier};
use crate::managers::annotation::{AnnotationChange, AnnotationManager};
use crate::managers::item::{BlankProvider, ItemInfo, ItemManager, ItemProvider};
use crate::managers::measure::{MeasureInputs, MeasureManager};
use crate::managers::overlay::{OverlayInputs, OverlayManager};
use crate::model::annotation::{Annotation, AnnotationClass, AnnotationId};
use crate::model::shapes::AnnotationData;
use crate::model::video::VideoAnnotationData;
use crate::persist::bridge::PersistenceBridge;
use crate::persist::memory::MemoryBridge;
use crate::render::cpu::{CpuRasterizer, FrameRgba};
use crate::render::draw::DrawStyle;
use crate::render::layer::{FrameScheduler, LayerSet, ManualScheduler};
use crate::render::manager::{PaintItem, PaintOutcome, RenderManager};
use crate::render::registry::RendererRegistry;
use crate::serialize::payload::{StageAnnotationPayload, decode_payloads};
use crate::serialize::registry::SerializerRegistry;
use crate::view::camera::Camera;
use crate::view::playback::{Playback, Tick};

const DEFAULT_COLOR: Rgba8 = Rgba8::new(0, 200, 255, 255);
const DRAWING_COLOR: Rgba8 = Rgba8::new(255, 220, 0, 255);

/// Host collaborators shared by every view of an editor.
#[derive(Clone)]
pub struct ViewServices {
    /// Persistence backend.
    pub bridge: Rc<dyn PersistenceBridge>,
    /// Sink for user-facing warnings.
    pub notifier: Rc<dyn Notifier>,
    /// Frame loader.
    pub provider: Rc<dyn ItemProvider>,
    /// Redraw scheduler.
    pub scheduler: Rc<dyn FrameScheduler>,
}

impl ViewServices {
    /// In-memory services: nothing leaves the process and redraws are driven by the caller.
    pub fn in_memory() -> Self {
        Self {
            bridge: Rc::new(MemoryBridge::new()),
            notifier: Rc::new(TracingNotifier),
            provider: Rc::new(BlankProvider),
            scheduler: Rc::new(ManualScheduler::new()),
        }
    }
}

impl std::fmt::Debug for ViewServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewServices").finish_non_exhaustive()
    }
}

/// Display window for high bit-depth images.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct WindowLevel {
    /// Center of the window.
    pub center: f64,
    /// Width of the window.
    pub width: f64,
}

impl Default for WindowLevel {
    fn default() -> Self {
        Self {
            center: 127.5,
            width: 255.0,
        }
    }
}

impl WindowLevel {
    /// Shift by a pointer drag: horizontal moves change the width, vertical ones the center.
    pub fn dragged(self, delta: Vec2) -> Self {
        Self {
            center: self.center + delta.y,
            width: (self.width + delta.x).max(1.0),
        }
    }
}

enum PendingOp {
    Commit(Box<dyn Action>),
    Undo,
    Redo,
    LoadFrame,
}

/// One editing pane.
pub struct View {
    config: EditorConfig,
    annotations: AnnotationManager,
    actions: ActionManager,
    overlays: OverlayManager,
    measures: MeasureManager,
    items: ItemManager,
    camera: Camera,
    layers: LayerSet,
    render: RenderManager,
    playback: Playback,
    window_level: WindowLevel,
    active_class: Option<u64>,
    drawing: Option<(String, AnnotationData)>,
    pending: VecDeque<PendingOp>,
    services: ViewServices,
    stale: bool,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("annotations", &self.annotations)
            .field("actions", &self.actions)
            .field("items", &self.items)
            .field("camera", &self.camera)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl View {
    /// Empty view over a `width` x `height` canvas.
    pub fn new(
        config: &EditorConfig,
        renderers: RendererRegistry,
        services: ViewServices,
        width: f64,
        height: f64,
    ) -> Self {
        let mut annotations = AnnotationManager::new(
            renderers.clone(),
            Rc::clone(&services.bridge),
            Rc::clone(&services.notifier),
        );
        annotations.set_default_interpolation(config.default_interpolation);
        let camera = Camera::new(width, height).with_limits(
            config.max_scale,
            config.visibility_margin,
            config.closing_distance,
        );
        Self {
            config: config.clone(),
            annotations,
            actions: ActionManager::new(config.history_limit),
            overlays: OverlayManager::new(),
            measures: MeasureManager::new(config.show_measures),
            items: ItemManager::new(Rc::clone(&services.provider)),
            camera,
            layers: LayerSet::new(Rc::clone(&services.scheduler)),
            render: RenderManager::new(renderers),
            playback: Playback::new(),
            window_level: WindowLevel::default(),
            active_class: None,
            drawing: None,
            pending: VecDeque::new(),
            services,
            stale: true,
        }
    }

    // ---- accessors -----------------------------------------------------------------------------

    /// Annotation store.
    pub fn annotations(&self) -> &AnnotationManager {
        &self.annotations
    }

    /// Mutable annotation store. Local edits are picked up by the next [`View::refresh`].
    pub fn annotations_mut(&mut self) -> &mut AnnotationManager {
        &mut self.annotations
    }

    /// Undo/redo history.
    pub fn actions(&self) -> &ActionManager {
        &self.actions
    }

    /// Label overlays.
    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    /// Measurements.
    pub fn measures(&self) -> &MeasureManager {
        &self.measures
    }

    /// Turn measurements on or off.
    pub fn set_show_measures(&mut self, show: bool) {
        self.measures.set_enabled(show);
        self.stale = true;
    }

    /// Current item and frame.
    pub fn items(&self) -> &ItemManager {
        &self.items
    }

    /// Viewport camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Canvas layers.
    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    /// Playback state.
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Current frame.
    pub fn frame(&self) -> FrameIndex {
        self.items.frame()
    }

    /// A frame load is pending.
    pub fn is_loading(&self) -> bool {
        self.items.is_loading()
    }

    /// Number of queued operations.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Editor configuration this view was built with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Dispatch a warning to the host.
    pub fn warn(&self, content: impl Into<String>) {
        self.services.notifier.notify(Notice::warning(content));
    }

    // ---- classes and content -------------------------------------------------------------------

    /// Replace the annotation classes of the dataset.
    pub fn set_classes(&mut self, classes: impl IntoIterator<Item = AnnotationClass>) {
        self.annotations.set_classes(classes);
    }

    /// Class assigned to newly drawn annotations.
    pub fn active_class(&self) -> Option<u64> {
        self.active_class
    }

    /// Choose the class of newly drawn annotations.
    pub fn set_active_class(&mut self, class_id: Option<u64>) {
        self.active_class = class_id;
    }

    /// Replace the annotations with decoded stage payloads. Returns the number decoded.
    pub fn load_annotations(
        &mut self,
        payloads: &[StageAnnotationPayload],
        serializers: &SerializerRegistry,
    ) -> usize {
        let decoded = decode_payloads(payloads, serializers);
        let n = decoded.len();
        self.annotations.set_annotations(decoded);
        n
    }

    // ---- item and frames -----------------------------------------------------------------------

    /// Show `item`: clears the history, stops playback, drops queued edits, resets the window
    /// level, re-creates the layers and schedules the first frame.
    #[tracing::instrument(skip_all, fields(item = %item.id))]
    pub fn set_item(&mut self, item: ItemInfo) {
        self.actions.clear();
        self.playback.pause();
        self.window_level = WindowLevel::default();
        self.pending.clear();
        self.drawing = None;
        self.measures.remove_drawing();
        self.camera.set_image(item.size, true);
        self.items.set_item(item);
        self.layers = LayerSet::new(Rc::clone(&self.services.scheduler));
        self.layers.changed_all();
        self.pending.push_back(PendingOp::LoadFrame);
        self.stale = true;
    }

    /// Subscribe to item changes pushed by the host. A change is applied like
    /// [`View::set_item`] by the next [`View::sync_item_change`] or [`View::run_pending`].
    pub fn connect_item_changes(&mut self, changes: Receiver<ItemInfo>) {
        self.items.connect_changes(changes);
    }

    /// Switch to the latest item announced by the host, if any. Returns `true` on a switch.
    pub fn sync_item_change(&mut self) -> bool {
        match self.items.poll_change() {
            Some(item) => {
                self.set_item(item);
                true
            }
            None => false,
        }
    }

    /// Request `frame` (clamped to the item); it is loaded by the next [`View::run_pending`].
    pub fn jump_to_frame(&mut self, frame: FrameIndex) -> CanvasmarkResult<FrameIndex> {
        let frame = self.items.request_frame(frame)?;
        if !self.pending.iter().any(|op| matches!(op, PendingOp::LoadFrame)) {
            self.pending.push_back(PendingOp::LoadFrame);
        }
        Ok(frame)
    }

    /// Start playback at the item rate (or the configured fallback).
    pub fn play(&mut self) -> CanvasmarkResult<()> {
        if !self.items.item().is_some_and(ItemInfo::is_video) {
            return Err(CanvasmarkError::precondition("playback needs a video item"));
        }
        let fps = self.items.fps(self.config.fallback_fps)?;
        self.playback.play(fps);
        Ok(())
    }

    /// Stop playback.
    pub fn pause(&mut self) {
        self.playback.pause();
    }

    /// Toggle playback.
    pub fn toggle_playback(&mut self) -> CanvasmarkResult<()> {
        if self.playback.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Handle one playback interval. Returns the frame requested, if any; after the last frame
    /// playback wraps to frame 0.
    pub fn tick_playback(&mut self) -> CanvasmarkResult<Option<FrameIndex>> {
        match self.playback.tick(self.items.is_loading()) {
            Tick::Idle | Tick::Skipped => Ok(None),
            Tick::Advance => {
                let count = self.items.frame_count();
                if count == 0 {
                    self.playback.pause();
                    return Ok(None);
                }
                let next = FrameIndex((self.frame().0 + 1) % count);
                self.jump_to_frame(next).map(Some)
            }
        }
    }

    // ---- camera --------------------------------------------------------------------------------

    fn camera_moved(&mut self) {
        self.layers.changed_all();
        self.stale = true;
    }

    /// Resize the canvas.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.camera.set_canvas_size(width, height);
        self.camera_moved();
    }

    /// Fit the image to the canvas.
    pub fn scale_to_fit(&mut self) {
        self.camera.scale_to_fit();
        self.camera_moved();
    }

    /// Zoom by `factor` keeping the canvas point `at` fixed.
    pub fn zoom(&mut self, factor: f64, at: Point) {
        self.camera.zoom(factor, at);
        self.camera_moved();
    }

    /// Zoom so the canvas box `p1`-`p2` fills the view.
    pub fn zoom_to_box(&mut self, p1: Point, p2: Point) {
        self.camera.zoom_to_box(p1, p2);
        self.camera_moved();
    }

    /// Wheel scroll, clamped so part of the image stays visible.
    pub fn scroll(&mut self, delta: Vec2) {
        self.camera.scroll(delta, self.config.scroll_scaling);
        self.camera_moved();
    }

    /// Drag the image by `delta` canvas pixels.
    pub fn pan(&mut self, delta: Vec2) {
        let offset = self.camera.offset() - delta;
        self.camera.set_offset(offset);
        self.camera_moved();
    }

    /// Current window level.
    pub fn window_level(&self) -> WindowLevel {
        self.window_level
    }

    /// Change the window level.
    pub fn set_window_level(&mut self, level: WindowLevel) {
        self.window_level = level;
        self.layers.main.changed();
    }

    // ---- drawing preview -----------------------------------------------------------------------

    /// Shape being drawn by the active tool.
    pub fn drawing(&self) -> Option<(&str, &AnnotationData)> {
        self.drawing.as_ref().map(|(t, d)| (t.as_str(), d))
    }

    /// Show `data` as the in-progress shape and measure it.
    pub fn set_drawing(&mut self, annotation_type: &str, data: AnnotationData) {
        let region = self.items.measure_region();
        self.measures.update_drawing(&data, region.as_ref());
        self.drawing = Some((annotation_type.to_string(), data));
        self.layers.overlay.changed();
    }

    /// Drop the in-progress shape.
    pub fn clear_drawing(&mut self) {
        if self.drawing.take().is_some() {
            self.layers.overlay.changed();
        }
        self.measures.remove_drawing();
    }

    // ---- mutations -----------------------------------------------------------------------------

    /// Annotation of `annotation_type` holding `data`, in the active class, on top of the
    /// others. On a video item it becomes a one-keyframe track at the current frame. Without an
    /// active class a warning is dispatched and `None` returned.
    pub fn build_annotation(&self, annotation_type: &str, data: AnnotationData) -> Option<Annotation> {
        let Some(class_id) = self.active_class else {
            self.warn("Select a class before drawing");
            return None;
        };
        let z = self.annotations.next_z_index();
        let annotation = if self.items.item().is_some_and(ItemInfo::is_video) {
            let mut video = VideoAnnotationData::single(self.frame(), data);
            video.interpolated = self
                .annotations
                .renderers()
                .get(annotation_type)
                .is_some_and(|r| r.interpolate_by_default());
            Annotation::new_video(annotation_type, class_id, video)
        } else {
            Annotation::new_static(annotation_type, class_id, data)
        };
        Some(annotation.with_z_index(z))
    }

    /// Queue creation of a new annotation (see [`View::build_annotation`]). Returns its id.
    pub fn queue_create(&mut self, annotation_type: &str, data: AnnotationData) -> Option<AnnotationId> {
        let annotation = self.build_annotation(annotation_type, data)?;
        let id = annotation.id.clone();
        self.commit(Box::new(CreateAnnotation::new(annotation)));
        Some(id)
    }

    /// Create and persist a new annotation through the history. Returns its id once stored.
    pub async fn create_annotation(
        &mut self,
        annotation_type: &str,
        data: AnnotationData,
    ) -> Option<AnnotationId> {
        let id = self.queue_create(annotation_type, data)?;
        self.run_pending().await;
        self.annotations.contains(&id).then_some(id)
    }

    /// Queue `action` for commit.
    pub fn commit(&mut self, action: Box<dyn Action>) {
        self.pending.push_back(PendingOp::Commit(action));
    }

    /// Queue an undo.
    pub fn undo(&mut self) {
        self.pending.push_back(PendingOp::Undo);
    }

    /// Queue a redo.
    pub fn redo(&mut self) {
        self.pending.push_back(PendingOp::Redo);
    }

    /// Apply queued operations in order, awaiting persistence and frame loads. Returns how many
    /// operations succeeded.
    pub async fn run_pending(&mut self) -> usize {
        self.sync_item_change();
        let mut done = 0;
        while let Some(op) = self.pending.pop_front() {
            let ok = match op {
                PendingOp::Commit(action) => self.actions.commit(action, &mut self.annotations).await,
                PendingOp::Undo => self.actions.undo(&mut self.annotations).await,
                PendingOp::Redo => self.actions.redo(&mut self.annotations).await,
                PendingOp::LoadFrame => match self.items.finish_loading().await {
                    Ok(loaded) => {
                        if loaded.is_some() {
                            self.layers.main.changed();
                            self.stale = true;
                        }
                        loaded.is_some()
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "frame load failed");
                        self.warn(format!("Failed to load frame: {err}"));
                        false
                    }
                },
            };
            done += usize::from(ok);
        }
        done
    }

    // ---- derived state -------------------------------------------------------------------------

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
        self.layers.overlay.changed();
    }

    /// Apply host stage events, then bring overlays, measures and layer flags up to date with
    /// every change since the last call. `should_render` is the active tool's overlay filter.
    pub fn refresh(&mut self, should_render: &dyn Fn(&Annotation) -> bool) {
        self.annotations.sync_stage_events();
        let changes = self.annotations.take_changes();
        if changes.is_empty() && !self.stale {
            return;
        }
        self.layers.annotations.changed();
        self.layers.overlay.changed();

        let full = std::mem::take(&mut self.stale)
            || changes.iter().any(|c| matches!(c, AnnotationChange::Reset));
        let region = self.items.measure_region();
        let overlay_inputs = OverlayInputs {
            annotations: &self.annotations,
            frame: self.items.frame(),
            transform: self.camera.transform(),
            should_render,
        };
        let measure_inputs = MeasureInputs {
            annotations: &self.annotations,
            frame: self.items.frame(),
            region: region.as_ref(),
        };
        if full {
            self.overlays.reset(&overlay_inputs);
            self.measures.reset(&measure_inputs);
            return;
        }
        for change in changes {
            match change {
                AnnotationChange::Inserted(id) | AnnotationChange::Updated(id) => {
                    if let Some(a) = self.annotations.get(&id) {
                        self.overlays.update_for(&overlay_inputs, a);
                        self.measures.update_for(&measure_inputs, a);
                    }
                }
                AnnotationChange::Removed(id) => {
                    self.overlays.remove_for(&id);
                    self.measures.remove_for(id.as_str());
                }
                AnnotationChange::Reset => {}
            }
        }
    }

    /// Draw operations for the visible annotations (back to front) plus the drawing preview.
    pub fn paint(&self, should_render: &dyn Fn(&Annotation) -> bool) -> PaintOutcome {
        let frame = self.items.frame();
        let store = &self.annotations;
        let items = store
            .annotations()
            .iter()
            .rev()
            .filter(|a| a.is_visible && should_render(a))
            .filter_map(|a| {
                Some(PaintItem {
                    annotation: a,
                    data: store.data_at(a, frame)?,
                    color: store.class(a.class_id).map_or(DEFAULT_COLOR, |c| c.color),
                })
            });
        let transform = self.camera.transform();
        let mut out = self.render.paint(items, transform, self.camera.scale());
        if let Some((annotation_type, data)) = &self.drawing {
            let style = DrawStyle {
                highlighted: true,
                ..DrawStyle::new(transform, self.camera.scale(), DRAWING_COLOR)
            };
            let drawn = self
                .render
                .renderers()
                .require(annotation_type)
                .and_then(|r| r.draw(data, &style, &mut out.list));
            if let Err(err) = drawn {
                tracing::warn!(error = %err, "drawing preview skipped");
            }
        }
        out
    }

    /// Rasterize the annotation and overlay layers if any layer is dirty, clearing the flags.
    #[tracing::instrument(skip_all)]
    pub fn redraw(
        &mut self,
        should_render: &dyn Fn(&Annotation) -> bool,
    ) -> CanvasmarkResult<Option<FrameRgba>> {
        let dirty = self.layers.iter().fold(false, |acc, l| l.take_dirty() | acc);
        if !dirty {
            return Ok(None);
        }
        let (w, h) = self.camera.canvas_size();
        let outcome = self.paint(should_render);
        let raster = CpuRasterizer::new(w.round() as u32, h.round() as u32)?;
        raster.rasterize(&outcome.list).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/pane.rs"]
mod tests;
