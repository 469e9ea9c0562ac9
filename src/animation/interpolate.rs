use crate::foundation::core::{Point, Vec2};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::geometry::ring;

/// Interpolation contract for keyframed geometry.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// Interpolation scheme stored on video annotations.
///
/// The wire names `"linear"` and the versioned `"linear-1.0"` / `"linear-1.1"` all map to
/// [`InterpolationAlgorithm::Linear`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterpolationAlgorithm {
    /// Componentwise linear interpolation between the surrounding keyframes.
    #[default]
    Linear,
}

impl InterpolationAlgorithm {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear-1.1",
        }
    }
}

impl std::str::FromStr for InterpolationAlgorithm {
    type Err = CanvasmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "linear" | "linear-1.0" | "linear-1.1" => Ok(Self::Linear),
            other => Err(CanvasmarkError::validation(format!(
                "unknown interpolation algorithm '{other}'"
            ))),
        }
    }
}

impl serde::Serialize for InterpolationAlgorithm {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for InterpolationAlgorithm {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Clamp an interpolation factor and reject NaN.
pub fn checked_factor(t: f64) -> CanvasmarkResult<f64> {
    if t.is_nan() {
        return Err(CanvasmarkError::validation("interpolation factor is NaN"));
    }
    Ok(t.clamp(0.0, 1.0))
}

/// Interpolate two vertex paths.
///
/// Equal-length paths are interpolated vertex by vertex. Otherwise the shorter path is first
/// resampled (midpoints on its longest edges) up to the longer vertex count.
pub fn interpolate_path(prev: &[Point], next: &[Point], t: f64) -> Vec<Point> {
    if prev.len() == next.len() {
        return prev
            .iter()
            .zip(next)
            .map(|(a, b)| <Point as Lerp>::lerp(a, b, t))
            .collect();
    }
    let n = prev.len().max(next.len());
    let a = ring::resample(prev, n);
    let b = ring::resample(next, n);
    if a.len() != b.len() {
        // one side had fewer than two points and could not be resampled
        return if t < 0.5 { prev.to_vec() } else { next.to_vec() };
    }
    a.iter().zip(&b).map(|(p, q)| <Point as Lerp>::lerp(p, q, t)).collect()
}

/// Relabel `next` (cardinal points listed counter-clockwise, e.g. right/top/left/bottom) by the
/// cyclic shift that moves the points the least relative to `prev`.
///
/// A shape whose labels were rotated by a multiple of 90° between keyframes is thereby matched
/// to itself instead of appearing to spin.
pub fn match_cardinal_points(prev: &[Point; 4], next: &[Point; 4]) -> [Point; 4] {
    let mut best = *next;
    let mut best_cost = f64::INFINITY;
    for shift in 0..4 {
        let candidate: [Point; 4] = std::array::from_fn(|i| next[(i + shift) % 4]);
        let cost: f64 = prev
            .iter()
            .zip(&candidate)
            .map(|(a, b)| (*a - *b).hypot2())
            .sum();
        if cost < best_cost - 1e-12 {
            best_cost = cost;
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
#[path = "../../tests/unit/animation/interpolate.rs"]
mod tests;
