//! Engine tunables.
//!
//! Defaults match the interactive editor. A config can be loaded from JSON and then patched from
//! `CANVASMARK_*` environment variables; a malformed or out-of-range variable is rejected.

use crate::animation::interpolate::InterpolationAlgorithm;
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};

/// Editor-wide configuration shared by every view.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Maximum number of undoable actions kept per view.
    pub history_limit: usize,
    /// Canvas-space radius around the first vertex that closes a polygon being drawn.
    pub closing_distance: f64,
    /// Minimum image-space distance between consecutive drawn vertices.
    pub min_point_distance: f64,
    /// Magnification applied by one zoom step.
    pub zoom_step: f64,
    /// Upper bound for the camera scale.
    pub max_scale: f64,
    /// Divisor applied to wheel deltas when scrolling.
    pub scroll_scaling: f64,
    /// Canvas pixels of image that must stay visible while scrolling.
    pub visibility_margin: f64,
    /// Playback rate used when the item carries no fps metadata.
    pub fallback_fps: f64,
    /// How long a key must be held before hold-to-activate handlers claim it.
    pub hold_to_activate_ms: u64,
    /// Whether measure overlays are computed.
    pub show_measures: bool,
    /// Radius of the brush tip in image pixels.
    pub brush_radius: f64,
    /// Interpolation used for video annotations that do not name one.
    pub default_interpolation: InterpolationAlgorithm,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            closing_distance: 8.0,
            min_point_distance: 2.0,
            zoom_step: 1.25,
            max_scale: 50.0,
            scroll_scaling: 2.0,
            visibility_margin: 20.0,
            fallback_fps: 30.0,
            hold_to_activate_ms: 300,
            show_measures: true,
            brush_radius: 10.0,
            default_interpolation: InterpolationAlgorithm::Linear,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> CanvasmarkResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `CANVASMARK_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> CanvasmarkResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `CANVASMARK_*` overrides from an arbitrary lookup. A malformed value, or one that
    /// leaves the config invalid, is a validation error.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CanvasmarkResult<Self> {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> CanvasmarkResult<Option<T>> {
            let Some(raw) = lookup(key) else {
                return Ok(None);
            };
            raw.trim().parse::<T>().map(Some).map_err(|_| {
                CanvasmarkError::validation(format!("{key}: malformed value '{raw}'"))
            })
        }

        if let Some(v) = parsed(&lookup, "CANVASMARK_HISTORY_LIMIT")? {
            self.history_limit = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_CLOSING_DISTANCE")? {
            self.closing_distance = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_MIN_POINT_DISTANCE")? {
            self.min_point_distance = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_ZOOM_STEP")? {
            self.zoom_step = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_MAX_SCALE")? {
            self.max_scale = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_SCROLL_SCALING")? {
            self.scroll_scaling = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_VISIBILITY_MARGIN")? {
            self.visibility_margin = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_FALLBACK_FPS")? {
            self.fallback_fps = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_HOLD_TO_ACTIVATE_MS")? {
            self.hold_to_activate_ms = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_SHOW_MEASURES")? {
            self.show_measures = v;
        }
        if let Some(v) = parsed(&lookup, "CANVASMARK_BRUSH_RADIUS")? {
            self.brush_radius = v;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> CanvasmarkResult<()> {
        if self.history_limit == 0 {
            return Err(CanvasmarkError::validation("history_limit must be > 0"));
        }
        if !(self.max_scale.is_finite() && self.max_scale > 0.0) {
            return Err(CanvasmarkError::validation("max_scale must be > 0"));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(CanvasmarkError::validation("zoom_step must be > 1"));
        }
        if !(self.scroll_scaling.is_finite() && self.scroll_scaling > 0.0) {
            return Err(CanvasmarkError::validation("scroll_scaling must be > 0"));
        }
        if !(self.fallback_fps.is_finite() && self.fallback_fps > 0.0) {
            return Err(CanvasmarkError::validation("fallback_fps must be > 0"));
        }
        if self.closing_distance < 0.0 || self.min_point_distance < 0.0 || self.brush_radius <= 0.0
        {
            return Err(CanvasmarkError::validation(
                "distances must be non-negative and brush_radius > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
