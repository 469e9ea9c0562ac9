//! Stage annotation payloads as exchanged with the host.
//!
//! A static `data` object holds the geometry under its type key next to optional
//! sub-annotation keys:
//!
//! ```json
//! { "polygon": { "path": [{"x": 0, "y": 0}, ...] }, "text": { "text": "car" } }
//! ```
//!
//! A video `data` object carries keyframes instead:
//!
//! ```json
//! {
//!   "frames": { "0": { "keyframe": true, "keypoint": { "x": 1, "y": 2 } } },
//!   "sub_frames": { "0": { "text": { "text": "car" } } },
//!   "segments": [[0, 10]],
//!   "interpolated": true
//! }
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::animation::interpolate::InterpolationAlgorithm;
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::model::annotation::{Annotation, AnnotationBody, AnnotationId};
use crate::model::sub::SubAnnotations;
use crate::model::video::{VideoAnnotationData, VideoKeyframe};
use crate::serialize::registry::SerializerRegistry;

const TEXT_KEY: &str = "text";
const INSTANCE_ID_KEY: &str = "instance_id";
const ATTRIBUTES_KEY: &str = "attributes";
const SUB_KEYS: [&str; 3] = [TEXT_KEY, INSTANCE_ID_KEY, ATTRIBUTES_KEY];

/// One annotation as stored in a workflow stage.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageAnnotationPayload {
    /// Annotation id.
    pub id: AnnotationId,
    /// Annotation class id.
    pub annotation_class_id: u64,
    /// Type-keyed geometry (static) or keyframes (video).
    pub data: Value,
    /// Paint order.
    #[serde(default)]
    pub z_index: i64,
    /// Owning workflow stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_stage_id: Option<String>,
}

fn object<'a>(value: &'a Value, what: &str) -> CanvasmarkResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CanvasmarkError::serde(format!("{what} must be a JSON object")))
}

/// Geometry key of a data object: the first key with a registered serializer.
fn detect_type(obj: &Map<String, Value>, registry: &SerializerRegistry) -> CanvasmarkResult<String> {
    obj.keys()
        .filter(|k| !SUB_KEYS.contains(&k.as_str()) && k.as_str() != "keyframe")
        .find(|k| registry.contains(k))
        .cloned()
        .ok_or_else(|| {
            CanvasmarkError::serde(format!(
                "no registered annotation type among keys {:?}",
                obj.keys().collect::<Vec<_>>()
            ))
        })
}

fn sub_from_wire(obj: &Map<String, Value>) -> CanvasmarkResult<SubAnnotations> {
    let mut sub = SubAnnotations::default();
    if let Some(v) = obj.get(TEXT_KEY) {
        sub.text = v.get("text").and_then(Value::as_str).map(str::to_string);
    }
    if let Some(v) = obj.get(INSTANCE_ID_KEY) {
        sub.instance_id = v.get("value").and_then(Value::as_u64);
    }
    if let Some(list) = obj.get(ATTRIBUTES_KEY).and_then(|v| v.get("attributes")) {
        sub.attributes = serde_json::from_value(list.clone())?;
    }
    Ok(sub)
}

fn sub_to_wire(sub: &SubAnnotations, obj: &mut Map<String, Value>) {
    if let Some(text) = &sub.text {
        obj.insert(TEXT_KEY.into(), serde_json::json!({ "text": text }));
    }
    if let Some(id) = sub.instance_id {
        obj.insert(INSTANCE_ID_KEY.into(), serde_json::json!({ "value": id }));
    }
    if !sub.attributes.is_empty() {
        obj.insert(
            ATTRIBUTES_KEY.into(),
            serde_json::json!({ "attributes": sub.attributes }),
        );
    }
}

fn frame_key(key: &str) -> CanvasmarkResult<FrameIndex> {
    key.parse::<u64>()
        .map(FrameIndex)
        .map_err(|_| CanvasmarkError::serde(format!("invalid frame index '{key}'")))
}

fn video_from_wire(
    obj: &Map<String, Value>,
    registry: &SerializerRegistry,
) -> CanvasmarkResult<(String, VideoAnnotationData)> {
    let frames_obj = obj
        .get("frames")
        .and_then(Value::as_object)
        .ok_or_else(|| CanvasmarkError::serde("frames must be a JSON object"))?;
    let mut annotation_type = None;
    let mut frames = BTreeMap::new();
    let mut sub_frames = BTreeMap::new();

    for (key, frame) in frames_obj {
        let idx = frame_key(key)?;
        let frame = object(frame, "video frame")?;
        if annotation_type.is_none() {
            annotation_type = detect_type(frame, registry).ok();
        }
        let found = annotation_type
            .as_ref()
            .and_then(|ty| frame.get(ty).map(|g| (ty.clone(), g)));
        let Some((ty, geometry)) = found else {
            // sub-annotation-only frame
            sub_frames.insert(idx, sub_from_wire(frame)?);
            continue;
        };
        let keyframe = frame
            .get("keyframe")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        frames.insert(
            idx,
            VideoKeyframe {
                keyframe,
                data: registry.deserialize(&ty, geometry)?,
            },
        );
        let sub = sub_from_wire(frame)?;
        if !sub.is_empty() {
            sub_frames.insert(idx, sub);
        }
    }

    if let Some(Value::Object(extra)) = obj.get("sub_frames") {
        for (key, frame) in extra {
            sub_frames.insert(frame_key(key)?, sub_from_wire(object(frame, "sub frame")?)?);
        }
    }

    let annotation_type = annotation_type
        .ok_or_else(|| CanvasmarkError::validation("video annotation has no keyframes"))?;

    let segments = match obj.get("segments") {
        Some(v) => {
            let raw: Vec<[u64; 2]> = serde_json::from_value(v.clone())?;
            raw.into_iter()
                .map(|[s, e]| FrameRange::new(FrameIndex(s), FrameIndex(e)))
                .collect::<CanvasmarkResult<Vec<_>>>()?
        }
        None => Vec::new(),
    };
    let interpolated = obj
        .get("interpolated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let interpolate_algorithm = match obj.get("interpolate_algorithm") {
        Some(Value::String(s)) => Some(s.parse::<InterpolationAlgorithm>()?),
        _ => None,
    };

    Ok((
        annotation_type,
        VideoAnnotationData {
            frames,
            sub_frames,
            segments,
            interpolated,
            interpolate_algorithm,
        },
    ))
}

fn video_to_wire(
    annotation_type: &str,
    video: &VideoAnnotationData,
    registry: &SerializerRegistry,
) -> CanvasmarkResult<Value> {
    let mut frames = Map::new();
    for (idx, kf) in &video.frames {
        let mut frame = Map::new();
        frame.insert("keyframe".into(), Value::Bool(kf.keyframe));
        frame.insert(
            annotation_type.into(),
            registry.serialize(annotation_type, &kf.data)?,
        );
        frames.insert(idx.0.to_string(), Value::Object(frame));
    }
    let mut sub_frames = Map::new();
    for (idx, sub) in &video.sub_frames {
        let mut frame = Map::new();
        sub_to_wire(sub, &mut frame);
        sub_frames.insert(idx.0.to_string(), Value::Object(frame));
    }
    let segments: Vec<[u64; 2]> = video
        .segments
        .iter()
        .map(|s| [s.start.0, s.end.0])
        .collect();

    let mut obj = Map::new();
    obj.insert("frames".into(), Value::Object(frames));
    obj.insert("sub_frames".into(), Value::Object(sub_frames));
    obj.insert("segments".into(), serde_json::to_value(segments)?);
    obj.insert("interpolated".into(), Value::Bool(video.interpolated));
    if let Some(algo) = video.interpolate_algorithm {
        obj.insert("interpolate_algorithm".into(), serde_json::to_value(algo)?);
    }
    Ok(Value::Object(obj))
}

impl StageAnnotationPayload {
    /// Decode into an [`Annotation`] using `registry` for the geometry.
    pub fn to_annotation(&self, registry: &SerializerRegistry) -> CanvasmarkResult<Annotation> {
        let obj = object(&self.data, "annotation data")?;
        let (annotation_type, body) = if obj.contains_key("frames") {
            let (ty, video) = video_from_wire(obj, registry)?;
            (ty, AnnotationBody::Video(video))
        } else {
            let ty = detect_type(obj, registry)?;
            let geometry = obj
                .get(&ty)
                .ok_or_else(|| CanvasmarkError::serde(format!("missing '{ty}' geometry")))?;
            let data = registry.deserialize(&ty, geometry)?;
            let sub = sub_from_wire(obj)?;
            (ty, AnnotationBody::Static { data, sub })
        };
        Ok(Annotation {
            id: self.id.clone(),
            annotation_type,
            class_id: self.annotation_class_id,
            z_index: self.z_index,
            workflow_stage_id: self.workflow_stage_id.clone(),
            is_visible: true,
            is_selected: false,
            is_highlighted: false,
            body,
        })
    }

    /// Encode `annotation` using `registry` for the geometry.
    pub fn from_annotation(
        annotation: &Annotation,
        registry: &SerializerRegistry,
    ) -> CanvasmarkResult<Self> {
        let data = match &annotation.body {
            AnnotationBody::Static { data, sub } => {
                let mut obj = Map::new();
                obj.insert(
                    annotation.annotation_type.clone(),
                    registry.serialize(&annotation.annotation_type, data)?,
                );
                sub_to_wire(sub, &mut obj);
                Value::Object(obj)
            }
            AnnotationBody::Video(video) => {
                video_to_wire(&annotation.annotation_type, video, registry)?
            }
        };
        Ok(Self {
            id: annotation.id.clone(),
            annotation_class_id: annotation.class_id,
            data,
            z_index: annotation.z_index,
            workflow_stage_id: annotation.workflow_stage_id.clone(),
        })
    }
}

/// Decode a list of payloads, skipping (and logging) the ones that cannot be decoded.
pub fn decode_payloads(
    payloads: &[StageAnnotationPayload],
    registry: &SerializerRegistry,
) -> Vec<Annotation> {
    payloads
        .iter()
        .filter_map(|p| match p.to_annotation(registry) {
            Ok(a) => Some(a),
            Err(err) => {
                tracing::warn!(id = %p.id, error = %err, "skipping undecodable annotation payload");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/serialize/payload.rs"]
mod tests;
