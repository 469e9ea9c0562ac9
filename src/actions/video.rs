//! Keyframe and segment edits on video annotations, expressed as [`UpdateAnnotation`]s.

use crate::actions::annotation::UpdateAnnotation;
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::model::annotation::{Annotation, AnnotationBody};
use crate::model::shapes::AnnotationData;
use crate::model::video::VideoAnnotationData;

fn edit_video(
    annotation: &Annotation,
    edit: impl FnOnce(&VideoAnnotationData) -> CanvasmarkResult<VideoAnnotationData>,
) -> CanvasmarkResult<Annotation> {
    let AnnotationBody::Video(video) = &annotation.body else {
        return Err(CanvasmarkError::precondition(format!(
            "annotation {} is not a video annotation",
            annotation.id
        )));
    };
    let mut after = annotation.clone();
    after.body = AnnotationBody::Video(edit(video)?);
    Ok(after)
}

/// Store `data` as a keyframe of `annotation` at `frame`.
pub fn add_keyframe(
    annotation: &Annotation,
    frame: FrameIndex,
    data: AnnotationData,
) -> CanvasmarkResult<UpdateAnnotation> {
    let after = edit_video(annotation, |v| {
        let mut v = v.clone();
        v.insert_keyframe(frame, data);
        Ok(v)
    })?;
    Ok(UpdateAnnotation::new(annotation.clone(), after).labeled("add keyframe"))
}

/// Drop the keyframe of `annotation` at `frame`.
pub fn remove_keyframe(annotation: &Annotation, frame: FrameIndex) -> CanvasmarkResult<UpdateAnnotation> {
    let after = edit_video(annotation, |v| {
        let mut v = v.clone();
        v.remove_keyframe(frame)?;
        v.sub_frames.remove(&frame);
        Ok(v)
    })?;
    Ok(UpdateAnnotation::new(annotation.clone(), after).labeled("remove keyframe"))
}

/// Move or resize the presence of `annotation` to `range` on a video of `total_frames` frames.
pub fn update_segment(
    annotation: &Annotation,
    range: FrameRange,
    total_frames: u64,
) -> CanvasmarkResult<UpdateAnnotation> {
    let after = edit_video(annotation, |v| v.with_segment_range(range, total_frames))?;
    Ok(UpdateAnnotation::new(annotation.clone(), after).labeled("update segment"))
}

/// Toggle interpolation between keyframes of `annotation`.
pub fn set_interpolated(annotation: &Annotation, interpolated: bool) -> CanvasmarkResult<UpdateAnnotation> {
    let after = edit_video(annotation, |v| {
        Ok(VideoAnnotationData {
            interpolated,
            ..v.clone()
        })
    })?;
    Ok(UpdateAnnotation::new(annotation.clone(), after).labeled("set interpolation"))
}

#[cfg(test)]
#[path = "../../tests/unit/actions/video.rs"]
mod tests;
