//! Dirty-flag canvas layers and the frame scheduler they wake up.

use std::cell::Cell;
use std::rc::Rc;

/// Host hook that runs a redraw pass on the next animation frame.
pub trait FrameScheduler {
    /// Ask for one redraw pass. Hosts may coalesce requests.
    fn request_frame(&self);
}

/// Scheduler that only counts requests; the host (or a test) drives redraws itself.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requests: Cell<usize>,
}

impl ManualScheduler {
    /// New scheduler with no pending request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests since the last [`ManualScheduler::take`].
    pub fn pending(&self) -> usize {
        self.requests.get()
    }

    /// Reset the counter, returning its previous value.
    pub fn take(&self) -> usize {
        self.requests.replace(0)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

/// Layer roles owned by a view, back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Image or video frame.
    Main,
    /// Annotation geometry.
    Annotations,
    /// Labels and in-progress drawings.
    Overlay,
}

/// One drawing surface with a dirty flag.
pub struct Layer {
    kind: LayerKind,
    dirty: Cell<bool>,
    scheduler: Rc<dyn FrameScheduler>,
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("kind", &self.kind)
            .field("dirty", &self.dirty.get())
            .finish()
    }
}

impl Layer {
    /// Clean layer bound to `scheduler`.
    pub fn new(kind: LayerKind, scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            kind,
            dirty: Cell::new(false),
            scheduler,
        }
    }

    /// Role of this layer.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Mark the layer dirty. Only the clean-to-dirty transition requests a frame, so any number of
    /// mutations between two redraws cost one pass.
    pub fn changed(&self) {
        if !self.dirty.replace(true) {
            tracing::trace!(layer = ?self.kind, "layer dirty, frame requested");
            self.scheduler.request_frame();
        }
    }

    /// Return `true` if a redraw is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Clear the dirty flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }
}

/// The three layers of a view.
#[derive(Debug)]
pub struct LayerSet {
    /// Image layer.
    pub main: Layer,
    /// Annotation layer.
    pub annotations: Layer,
    /// Overlay layer.
    pub overlay: Layer,
}

impl LayerSet {
    /// Fresh clean layers sharing `scheduler`.
    pub fn new(scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            main: Layer::new(LayerKind::Main, Rc::clone(&scheduler)),
            annotations: Layer::new(LayerKind::Annotations, Rc::clone(&scheduler)),
            overlay: Layer::new(LayerKind::Overlay, scheduler),
        }
    }

    /// Mark every layer dirty.
    pub fn changed_all(&self) {
        self.main.changed();
        self.annotations.changed();
        self.overlay.changed();
    }

    /// Layers in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        [&self.main, &self.annotations, &self.overlay].into_iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layer.rs"]
mod tests;
