use super::*;
use crate::animation::interpolate::Lerp;
use crate::foundation::core::Point;
use crate::model::shapes::KeypointData;

fn kp(x: f64, y: f64) -> AnnotationData {
    AnnotationData::Keypoint(KeypointData {
        point: Point::new(x, y),
    })
}

fn lerp_keypoints(
    a: &AnnotationData,
    b: &AnnotationData,
    t: f64,
    _: InterpolationAlgorithm,
) -> CanvasmarkResult<AnnotationData> {
    match (a, b) {
        (AnnotationData::Keypoint(a), AnnotationData::Keypoint(b)) => {
            Ok(AnnotationData::Keypoint(KeypointData::lerp(a, b, t)))
        }
        _ => Err(CanvasmarkError::render("not keypoints")),
    }
}

fn track() -> VideoAnnotationData {
    let mut v = VideoAnnotationData::single(FrameIndex(0), kp(0.0, 0.0));
    v.insert_keyframe(FrameIndex(10), kp(10.0, 20.0));
    v.segments = vec![FrameRange::new(FrameIndex(0), FrameIndex(20)).unwrap()];
    v
}

#[test]
fn keyframes_are_returned_verbatim() {
    let v = track();
    let f = v
        .infer_data(FrameIndex(10), Some(&lerp_keypoints), InterpolationAlgorithm::Linear)
        .unwrap()
        .unwrap();
    assert!(f.is_keyframe);
    assert_eq!(f.data, kp(10.0, 20.0));
}

#[test]
fn frames_between_keyframes_are_interpolated() {
    let v = track();
    let f = v
        .infer_data(FrameIndex(5), Some(&lerp_keypoints), InterpolationAlgorithm::Linear)
        .unwrap()
        .unwrap();
    assert!(f.interpolated);
    assert_eq!(f.data, kp(5.0, 10.0));
}

#[test]
fn without_interpolation_the_previous_keyframe_holds() {
    let mut v = track();
    let f = v
        .infer_data(FrameIndex(5), None, InterpolationAlgorithm::Linear)
        .unwrap()
        .unwrap();
    assert_eq!(f.data, kp(0.0, 0.0));

    v.interpolated = false;
    let f = v
        .infer_data(FrameIndex(5), Some(&lerp_keypoints), InterpolationAlgorithm::Linear)
        .unwrap()
        .unwrap();
    assert_eq!(f.data, kp(0.0, 0.0));
}

#[test]
fn after_the_last_keyframe_it_holds_and_outside_segments_it_vanishes() {
    let v = track();
    let f = v
        .infer_data(FrameIndex(15), Some(&lerp_keypoints), InterpolationAlgorithm::Linear)
        .unwrap()
        .unwrap();
    assert_eq!(f.data, kp(10.0, 20.0));
    assert!(
        v.infer_data(FrameIndex(20), Some(&lerp_keypoints), InterpolationAlgorithm::Linear)
            .unwrap()
            .is_none()
    );
}

#[test]
fn before_the_first_keyframe_the_next_one_is_used() {
    let mut v = VideoAnnotationData::single(FrameIndex(5), kp(1.0, 1.0));
    v.segments = vec![FrameRange::new(FrameIndex(0), FrameIndex(10)).unwrap()];
    let f = v
        .infer_data(FrameIndex(2), None, InterpolationAlgorithm::Linear)
        .unwrap()
        .unwrap();
    assert_eq!(f.data, kp(1.0, 1.0));
}

#[test]
fn insert_keyframe_extends_adjacent_segment() {
    let mut v = VideoAnnotationData::single(FrameIndex(3), kp(0.0, 0.0));
    v.insert_keyframe(FrameIndex(4), kp(1.0, 0.0));
    assert_eq!(v.segments, vec![FrameRange::new(FrameIndex(3), FrameIndex(5)).unwrap()]);
    v.insert_keyframe(FrameIndex(9), kp(1.0, 0.0));
    assert_eq!(v.segments.len(), 2);
}

#[test]
fn last_keyframe_cannot_be_removed() {
    let mut v = track();
    assert!(v.remove_keyframe(FrameIndex(10)).is_ok());
    assert!(matches!(
        v.remove_keyframe(FrameIndex(0)),
        Err(CanvasmarkError::Validation(_))
    ));
    assert!(matches!(
        v.remove_keyframe(FrameIndex(7)),
        Err(CanvasmarkError::Precondition(_))
    ));
}

#[test]
fn sub_annotations_follow_previous_sub_frame() {
    let mut v = track();
    v.sub_frames.insert(
        FrameIndex(3),
        SubAnnotations {
            text: Some("car".into()),
            ..Default::default()
        },
    );
    assert!(v.infer_sub_annotations(FrameIndex(1)).unwrap().is_empty());
    assert_eq!(
        v.infer_sub_annotations(FrameIndex(8)).unwrap().text.as_deref(),
        Some("car")
    );
    assert!(v.infer_sub_annotations(FrameIndex(25)).is_none());
}

#[test]
fn translating_segments_moves_and_clips_keyframes() {
    let v = track();
    let moved = v
        .with_segment_range(FrameRange::new(FrameIndex(5), FrameIndex(25)).unwrap(), 30)
        .unwrap();
    assert_eq!(
        moved.frames.keys().copied().collect::<Vec<_>>(),
        vec![FrameIndex(5), FrameIndex(15)]
    );

    let clipped = v
        .with_segment_range(FrameRange::new(FrameIndex(5), FrameIndex(25)).unwrap(), 12)
        .unwrap();
    assert_eq!(clipped.segments, vec![FrameRange::new(FrameIndex(5), FrameIndex(12)).unwrap()]);
    assert_eq!(clipped.frames, v.frames);
}

#[test]
fn clipping_keeps_nearest_keyframe_on_the_last_frame() {
    let mut v = VideoAnnotationData::single(FrameIndex(0), kp(0.0, 0.0));
    v.insert_keyframe(FrameIndex(8), kp(8.0, 0.0));
    v.insert_keyframe(FrameIndex(9), kp(9.0, 0.0));
    v.segments = vec![FrameRange::new(FrameIndex(0), FrameIndex(10)).unwrap()];
    let moved = v
        .with_segment_range(FrameRange::new(FrameIndex(5), FrameIndex(15)).unwrap(), 15)
        .unwrap();
    assert_eq!(
        moved.frames.keys().copied().collect::<Vec<_>>(),
        vec![FrameIndex(5), FrameIndex(13), FrameIndex(14)]
    );

    v.segments = vec![FrameRange::new(FrameIndex(0), FrameIndex(5)).unwrap()];
    let pushed = v
        .with_segment_range(FrameRange::new(FrameIndex(10), FrameIndex(15)).unwrap(), 15)
        .unwrap();
    assert_eq!(
        pushed.frames.keys().copied().collect::<Vec<_>>(),
        vec![FrameIndex(10), FrameIndex(14)]
    );
    assert_eq!(pushed.frames.get(&FrameIndex(14)).map(|k| &k.data), Some(&kp(8.0, 0.0)));
}

#[test]
fn resizing_only_replaces_segments() {
    let v = track();
    let resized = v
        .with_segment_range(FrameRange::new(FrameIndex(0), FrameIndex(40)).unwrap(), 100)
        .unwrap();
    assert_eq!(resized.frames, v.frames);
    assert_eq!(resized.segments, vec![FrameRange::new(FrameIndex(0), FrameIndex(40)).unwrap()]);
}
