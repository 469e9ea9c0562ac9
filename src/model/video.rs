//! Keyframed video annotation tracks and per-frame inference.
//!
//! Only keyframes are stored. Geometry for any other frame inside a segment is derived on read
//! from the nearest keyframes around it and is never written back.

use std::collections::BTreeMap;

use crate::animation::interpolate::{InterpolationAlgorithm, checked_factor};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::model::shapes::AnnotationData;
use crate::model::sub::SubAnnotations;

/// One stored frame of a video annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoKeyframe {
    /// Keyframe flag as carried on the wire.
    pub keyframe: bool,
    /// Geometry at this frame.
    pub data: AnnotationData,
}

impl VideoKeyframe {
    /// Keyframe holding `data`.
    pub fn new(data: AnnotationData) -> Self {
        Self {
            keyframe: true,
            data,
        }
    }
}

/// Geometry derived for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct InferredFrame {
    /// Geometry to draw.
    pub data: AnnotationData,
    /// The frame is a stored keyframe.
    pub is_keyframe: bool,
    /// The geometry was interpolated between two keyframes.
    pub interpolated: bool,
}

/// Interpolation callback supplied by the renderer of the annotation type.
pub type InterpolateFn<'a> = &'a dyn Fn(
    &AnnotationData,
    &AnnotationData,
    f64,
    InterpolationAlgorithm,
) -> CanvasmarkResult<AnnotationData>;

/// Keyframed geometry plus the frame ranges in which the annotation exists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoAnnotationData {
    /// Keyframes, ascending by frame.
    pub frames: BTreeMap<FrameIndex, VideoKeyframe>,
    /// Sub-annotation keyframes, ascending by frame.
    pub sub_frames: BTreeMap<FrameIndex, SubAnnotations>,
    /// Half-open frame ranges in which the annotation is present.
    pub segments: Vec<FrameRange>,
    /// Whether frames between keyframes are interpolated (otherwise the previous keyframe holds).
    pub interpolated: bool,
    /// Explicit interpolation algorithm; `None` means the editor default.
    pub interpolate_algorithm: Option<InterpolationAlgorithm>,
}

impl VideoAnnotationData {
    /// Track with one keyframe at `frame` and a single one-frame segment.
    pub fn single(frame: FrameIndex, data: AnnotationData) -> Self {
        let mut frames = BTreeMap::new();
        frames.insert(frame, VideoKeyframe::new(data));
        Self {
            frames,
            sub_frames: BTreeMap::new(),
            segments: vec![FrameRange {
                start: frame,
                end: frame.next(),
            }],
            interpolated: true,
            interpolate_algorithm: None,
        }
    }

    /// Segment containing `frame`.
    pub fn segment_at(&self, frame: FrameIndex) -> Option<FrameRange> {
        self.segments.iter().copied().find(|s| s.contains(frame))
    }

    /// Geometry at `frame`.
    ///
    /// Outside every segment the result is `None`. Inside, a stored keyframe wins; with only a
    /// previous (or only a next) keyframe that one is held; between two keyframes the geometry is
    /// interpolated when the track is interpolated and `interpolate` is available, otherwise the
    /// previous keyframe holds.
    pub fn infer_data(
        &self,
        frame: FrameIndex,
        interpolate: Option<InterpolateFn<'_>>,
        default_algorithm: InterpolationAlgorithm,
    ) -> CanvasmarkResult<Option<InferredFrame>> {
        if self.segment_at(frame).is_none() {
            return Ok(None);
        }
        if let Some(kf) = self.frames.get(&frame) {
            return Ok(Some(InferredFrame {
                data: kf.data.clone(),
                is_keyframe: true,
                interpolated: false,
            }));
        }

        let prev = self.frames.range(..frame).next_back();
        let next = self.frames.range(frame.next()..).next();
        let held = |kf: &VideoKeyframe| InferredFrame {
            data: kf.data.clone(),
            is_keyframe: false,
            interpolated: false,
        };

        match (prev, next) {
            (None, None) => Ok(None),
            (Some((_, p)), None) => Ok(Some(held(p))),
            (None, Some((_, n))) => Ok(Some(held(n))),
            (Some((pf, p)), Some((nf, n))) => match interpolate {
                Some(f) if self.interpolated => {
                    let t = checked_factor((frame.0 - pf.0) as f64 / (nf.0 - pf.0) as f64)?;
                    let algorithm = self.interpolate_algorithm.unwrap_or(default_algorithm);
                    Ok(Some(InferredFrame {
                        data: f(&p.data, &n.data, t, algorithm)?,
                        is_keyframe: false,
                        interpolated: true,
                    }))
                }
                _ => Ok(Some(held(p))),
            },
        }
    }

    /// Sub-annotations at `frame`: the latest sub-frame at or before it, `None` outside segments.
    pub fn infer_sub_annotations(&self, frame: FrameIndex) -> Option<SubAnnotations> {
        self.segment_at(frame)?;
        Some(
            self.sub_frames
                .range(..=frame)
                .next_back()
                .map(|(_, s)| s.clone())
                .unwrap_or_default(),
        )
    }

    /// Store `data` as a keyframe at `frame`, extending the segment that ends right there.
    pub fn insert_keyframe(&mut self, frame: FrameIndex, data: AnnotationData) {
        self.frames.insert(frame, VideoKeyframe::new(data));
        if self.segment_at(frame).is_some() {
            return;
        }
        if let Some(seg) = self.segments.iter_mut().find(|s| s.end == frame) {
            seg.end = frame.next();
        } else if let Some(seg) = self.segments.iter_mut().find(|s| s.start == frame.next()) {
            seg.start = frame;
        } else {
            self.segments.push(FrameRange {
                start: frame,
                end: frame.next(),
            });
            self.segments.sort_by_key(|s| s.start);
        }
    }

    /// Remove the keyframe at `frame`. The last keyframe cannot be removed.
    pub fn remove_keyframe(&mut self, frame: FrameIndex) -> CanvasmarkResult<VideoKeyframe> {
        if !self.frames.contains_key(&frame) {
            return Err(CanvasmarkError::precondition(format!(
                "no keyframe at frame {}",
                frame.0
            )));
        }
        if self.frames.len() == 1 {
            return Err(CanvasmarkError::validation(
                "cannot remove the only keyframe of a video annotation",
            ));
        }
        self.frames
            .remove(&frame)
            .ok_or_else(|| CanvasmarkError::precondition("keyframe vanished"))
    }

    /// Move or resize the annotation's presence to `range`.
    ///
    /// When the span length is unchanged the whole track is translated: keyframes and segments
    /// move by the same delta, and keyframes pushed outside `[0, total_frames)` are clipped back
    /// onto the first or last frame. A resize only replaces the segments.
    pub fn with_segment_range(
        &self,
        range: FrameRange,
        total_frames: u64,
    ) -> CanvasmarkResult<Self> {
        if total_frames == 0 {
            return Err(CanvasmarkError::precondition("video has no frames"));
        }
        let range = FrameRange::new(range.start, FrameIndex(range.end.0.min(total_frames)))?;
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return Ok(Self {
                segments: vec![range],
                ..self.clone()
            });
        };
        let (from_start, from_end) = (first.start.0 as i64, last.end.0 as i64);
        let (to_start, to_end) = (range.start.0 as i64, range.end.0 as i64);

        let mut out = self.clone();
        out.segments = vec![range];
        if from_end - from_start != to_end - to_start {
            return Ok(out);
        }

        let delta = to_start - from_start;
        if delta == 0 {
            out.segments = self.segments.clone();
            return Ok(out);
        }
        if self.segments.len() > 1 {
            out.segments = self.segments.iter().map(|s| s.shift(delta)).collect();
        }

        let shifted: BTreeMap<i64, VideoKeyframe> = self
            .frames
            .iter()
            .map(|(f, kf)| (f.0 as i64 + delta, kf.clone()))
            .collect();
        out.frames = clip_to_video(shifted, total_frames as i64 - 1)?;
        out.sub_frames = self
            .sub_frames
            .iter()
            .filter_map(|(f, s)| {
                let g = f.0 as i64 + delta;
                (0..total_frames as i64)
                    .contains(&g)
                    .then(|| (FrameIndex(g as u64), s.clone()))
            })
            .collect();
        Ok(out)
    }
}

fn clip_to_video(
    mut frames: BTreeMap<i64, VideoKeyframe>,
    last: i64,
) -> CanvasmarkResult<BTreeMap<FrameIndex, VideoKeyframe>> {
    let below: Vec<i64> = frames.range(..0).map(|(f, _)| *f).collect();
    let above: Vec<i64> = frames.range(last + 1..).map(|(f, _)| *f).collect();
    if !below.is_empty() && !above.is_empty() {
        return Err(CanvasmarkError::validation(
            "one segment translation cannot push keyframes both below 0 and past the last frame",
        ));
    }

    // the keyframe nearest to the edge survives on the edge frame unless one is already there
    if let Some(&nearest) = below.last() {
        let kf = frames.get(&nearest).cloned();
        for f in &below {
            frames.remove(f);
        }
        if let Some(kf) = kf {
            frames.entry(0).or_insert(kf);
        }
    } else if let Some(&nearest) = above.first() {
        let kf = frames.get(&nearest).cloned();
        for f in &above {
            frames.remove(f);
        }
        if let Some(kf) = kf {
            frames.entry(last).or_insert(kf);
        }
    }

    Ok(frames
        .into_iter()
        .filter(|(f, _)| (0..=last).contains(f))
        .map(|(f, kf)| (FrameIndex(f as u64), kf))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/model/video.rs"]
mod tests;
