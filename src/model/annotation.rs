use std::fmt;

use crate::foundation::core::Rgba8;
use crate::model::shapes::AnnotationData;
use crate::model::sub::SubAnnotations;
use crate::model::video::VideoAnnotationData;

/// Stage-unique annotation identifier.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct AnnotationId(pub String);

impl AnnotationId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Classification applied to annotations.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationClass {
    /// Class id referenced by `Annotation::class_id`.
    pub id: u64,
    /// Display name used in overlay labels.
    pub name: String,
    /// Draw color.
    pub color: Rgba8,
    /// Annotation types this class may be used with.
    #[serde(default)]
    pub annotation_types: Vec<String>,
}

/// Static geometry or a keyframed video track.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationBody {
    /// Geometry on a single image.
    Static {
        /// Geometry.
        data: AnnotationData,
        /// Attached sub-annotations.
        sub: SubAnnotations,
    },
    /// Keyframed geometry on a video.
    Video(VideoAnnotationData),
}

/// A persisted geometric + classification entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Stage-unique id.
    pub id: AnnotationId,
    /// Annotation type name (`"polygon"`, `"ellipse"`, ...), selects renderer and serializer.
    pub annotation_type: String,
    /// Annotation class id.
    pub class_id: u64,
    /// Paint and selection order; higher is in front.
    pub z_index: i64,
    /// Workflow stage owning the annotation.
    pub workflow_stage_id: Option<String>,
    /// Hidden annotations are neither drawn nor hit-tested.
    pub is_visible: bool,
    /// Selection state (at most one selected per view through the manager API).
    pub is_selected: bool,
    /// Hover highlight state.
    pub is_highlighted: bool,
    /// Geometry.
    pub body: AnnotationBody,
}

impl Annotation {
    /// New visible static annotation with a generated id and `z_index` 0.
    pub fn new_static(annotation_type: impl Into<String>, class_id: u64, data: AnnotationData) -> Self {
        Self::with_body(
            annotation_type,
            class_id,
            AnnotationBody::Static {
                data,
                sub: SubAnnotations::default(),
            },
        )
    }

    /// New visible video annotation with a generated id and `z_index` 0.
    pub fn new_video(
        annotation_type: impl Into<String>,
        class_id: u64,
        video: VideoAnnotationData,
    ) -> Self {
        Self::with_body(annotation_type, class_id, AnnotationBody::Video(video))
    }

    fn with_body(annotation_type: impl Into<String>, class_id: u64, body: AnnotationBody) -> Self {
        Self {
            id: AnnotationId::generate(),
            annotation_type: annotation_type.into(),
            class_id,
            z_index: 0,
            workflow_stage_id: None,
            is_visible: true,
            is_selected: false,
            is_highlighted: false,
            body,
        }
    }

    /// Same annotation with another id.
    pub fn with_id(mut self, id: impl Into<AnnotationId>) -> Self {
        self.id = id.into();
        self
    }

    /// Same annotation with another `z_index`.
    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.z_index = z_index;
        self
    }

    /// Return `true` for video annotations.
    pub fn is_video(&self) -> bool {
        matches!(self.body, AnnotationBody::Video(_))
    }

    /// Static geometry, `None` for video annotations.
    pub fn static_data(&self) -> Option<&AnnotationData> {
        match &self.body {
            AnnotationBody::Static { data, .. } => Some(data),
            AnnotationBody::Video(_) => None,
        }
    }

    /// Mutable static geometry, `None` for video annotations.
    pub fn static_data_mut(&mut self) -> Option<&mut AnnotationData> {
        match &mut self.body {
            AnnotationBody::Static { data, .. } => Some(data),
            AnnotationBody::Video(_) => None,
        }
    }

    /// Video track, `None` for static annotations.
    pub fn video(&self) -> Option<&VideoAnnotationData> {
        match &self.body {
            AnnotationBody::Video(v) => Some(v),
            AnnotationBody::Static { .. } => None,
        }
    }
}

impl From<String> for AnnotationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
