//! Measurement overlays (sizes, areas, lengths) in calibrated units.

use std::collections::BTreeMap;

use crate::foundation::callback::{CallbackCollection, CallbackHandle, CallbackStatus};
use crate::foundation::core::FrameIndex;
use crate::geometry::ring;
use crate::managers::annotation::AnnotationManager;
use crate::managers::item::MeasureRegion;
use crate::model::annotation::Annotation;
use crate::model::shapes::AnnotationData;

/// Entry id used for the shape currently being drawn.
pub const DRAWING_ANNOTATION_ID: &str = "drawing-annotation";

/// One measured quantity.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Measure {
    /// Quantity name (`"width"`, `"area"`, ...).
    pub name: &'static str,
    /// Value in `unit`.
    pub value: f64,
    /// Unit, squared for areas.
    pub unit: String,
}

/// Measurements of one annotation.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MeasureOverlay {
    /// Annotation id, or [`DRAWING_ANNOTATION_ID`].
    pub id: String,
    /// Short human-readable summary.
    pub label: String,
    /// Individual quantities.
    pub measures: Vec<Measure>,
}

/// Listener notified with the whole map after every change.
pub type MeasureListener = dyn FnMut(&BTreeMap<String, MeasureOverlay>);

/// Inputs needed to derive measurements.
pub struct MeasureInputs<'a> {
    /// Annotation store.
    pub annotations: &'a AnnotationManager,
    /// Current frame.
    pub frame: FrameIndex,
    /// Calibration; `None` means nothing can be measured (e.g. while loading).
    pub region: Option<&'a MeasureRegion>,
}

fn m(name: &'static str, value: f64, unit: &str) -> Measure {
    Measure {
        name,
        value,
        unit: unit.to_string(),
    }
}

/// Measure `data` under `region`. Geometry-less types yield `None`.
pub fn measure_data(data: &AnnotationData, region: &MeasureRegion) -> Option<Vec<Measure>> {
    let (dx, dy) = (region.delta.x, region.delta.y);
    let unit = region.unit.as_str();
    let area_unit = format!("{unit}²");
    let size = |w: f64, h: f64| [m("width", w * dx, unit), m("height", h * dy, unit)];

    let out = match data {
        AnnotationData::BoundingBox(b) => size(b.rect.width(), b.rect.height()).to_vec(),
        AnnotationData::Polygon(p) => {
            let bounds = ring::bounding_box(&p.path)?;
            let mut v = size(bounds.width(), bounds.height()).to_vec();
            v.push(m("area", ring::even_odd_area(&p.rings()) * dx * dy, &area_unit));
            v
        }
        AnnotationData::Ellipse(e) => {
            let (rx, ry) = (e.radius_x(), e.radius_y());
            let mut v = size(2.0 * rx, 2.0 * ry).to_vec();
            v.push(m("area", std::f64::consts::PI * rx * ry * dx * dy, &area_unit));
            v
        }
        AnnotationData::Polyline(p) => {
            let length = p
                .path
                .windows(2)
                .map(|w| ((w[1].x - w[0].x) * dx).hypot((w[1].y - w[0].y) * dy))
                .sum();
            vec![m("length", length, unit)]
        }
        AnnotationData::Keypoint(k) => vec![
            m("x", (k.point.x - region.rect.x0) * dx, unit),
            m("y", (k.point.y - region.rect.y0) * dy, unit),
        ],
        AnnotationData::Tag | AnnotationData::Custom(_) => return None,
    };
    Some(out)
}

fn label(measures: &[Measure]) -> String {
    let find = |name| measures.iter().find(|m| m.name == name);
    match (find("width"), find("height"), find("length"), find("x")) {
        (Some(w), Some(h), _, _) => format!("{:.2} × {:.2} {}", w.value, h.value, w.unit),
        (_, _, Some(l), _) => format!("{:.2} {}", l.value, l.unit),
        (_, _, _, Some(x)) => {
            let y = find("y").map_or(0.0, |y| y.value);
            format!("({:.2}, {:.2}) {}", x.value, y, x.unit)
        }
        _ => String::new(),
    }
}

fn overlay(id: String, data: &AnnotationData, region: &MeasureRegion) -> Option<MeasureOverlay> {
    let measures = measure_data(data, region)?;
    Some(MeasureOverlay {
        id,
        label: label(&measures),
        measures,
    })
}

/// Measure map of one view.
pub struct MeasureManager {
    enabled: bool,
    entries: BTreeMap<String, MeasureOverlay>,
    listeners: CallbackCollection<MeasureListener>,
}

impl std::fmt::Debug for MeasureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasureManager")
            .field("enabled", &self.enabled)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl MeasureManager {
    /// Empty map; `enabled` mirrors the `show_measures` setting.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: BTreeMap::new(),
            listeners: CallbackCollection::new(),
        }
    }

    /// Whether measurements are computed.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn measurements on or off; turning them off clears the map.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled && !self.entries.is_empty() {
            self.entries.clear();
            self.emit();
        }
    }

    /// Current measurements keyed by annotation id.
    pub fn entries(&self) -> &BTreeMap<String, MeasureOverlay> {
        &self.entries
    }

    /// Measurements of `id`.
    pub fn get(&self, id: &str) -> Option<&MeasureOverlay> {
        self.entries.get(id)
    }

    /// Observe changes; releasing the handle unsubscribes.
    pub fn subscribe(&self, listener: Box<MeasureListener>) -> CallbackHandle {
        self.listeners.register(listener)
    }

    fn emit(&self) {
        let entries = &self.entries;
        self.listeners.dispatch(|l| {
            l(entries);
            CallbackStatus::Continue
        });
    }

    /// Measurements of `annotation` at the current frame.
    pub fn compute(&self, inputs: &MeasureInputs<'_>, annotation: &Annotation) -> Option<MeasureOverlay> {
        if !self.enabled || !annotation.is_visible {
            return None;
        }
        let region = inputs.region?;
        let data = inputs.annotations.data_at(annotation, inputs.frame)?;
        overlay(annotation.id.to_string(), &data, region)
    }

    /// Recompute every visible annotation.
    pub fn reset(&mut self, inputs: &MeasureInputs<'_>) {
        let drawing = self.entries.remove(DRAWING_ANNOTATION_ID);
        self.entries = inputs
            .annotations
            .annotations()
            .iter()
            .filter_map(|a| self.compute(inputs, a))
            .map(|o| (o.id.clone(), o))
            .collect();
        if let Some(d) = drawing.filter(|_| self.enabled) {
            self.entries.insert(d.id.clone(), d);
        }
        self.emit();
    }

    /// Recompute one annotation; it is removed when nothing can be measured.
    pub fn update_for(&mut self, inputs: &MeasureInputs<'_>, annotation: &Annotation) {
        match self.compute(inputs, annotation) {
            Some(o) => self.put(o),
            None => self.remove_for(annotation.id.as_str()),
        }
    }

    /// Measure the shape being drawn under [`DRAWING_ANNOTATION_ID`].
    pub fn update_drawing(&mut self, data: &AnnotationData, region: Option<&MeasureRegion>) {
        if !self.enabled {
            return;
        }
        match region.and_then(|r| overlay(DRAWING_ANNOTATION_ID.to_string(), data, r)) {
            Some(o) => self.put(o),
            None => self.remove_drawing(),
        }
    }

    /// Drop the drawing measurement.
    pub fn remove_drawing(&mut self) {
        self.remove_for(DRAWING_ANNOTATION_ID);
    }

    fn put(&mut self, o: MeasureOverlay) {
        if self.entries.get(&o.id) == Some(&o) {
            return;
        }
        self.entries.insert(o.id.clone(), o);
        self.emit();
    }

    /// Drop the measurements of `id`.
    pub fn remove_for(&mut self, id: &str) {
        if self.entries.remove(id).is_some() {
            self.emit();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/managers/measure.rs"]
mod tests;
