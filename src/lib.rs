//! Canvasmark is a plugin-extensible annotation engine for images and videos.
//!
//! The public API is editor-oriented:
//!
//! - Create an [`Editor`] with an [`EditorConfig`] and the host's [`ViewServices`]
//! - Install plugins (see [`plugins::builtin_plugins`]) to get tools, renderers and serializers
//! - Feed input events, then drive [`Editor::run_pending`] and [`Editor::redraw`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod actions;
pub(crate) mod animation;
pub(crate) mod config;
pub(crate) mod editor;
/// Ring helpers and polygon booleans.
pub mod geometry;
pub(crate) mod managers;
pub(crate) mod model;
pub(crate) mod persist;
pub mod plugins;
pub(crate) mod render;
pub(crate) mod serialize;
pub(crate) mod view;

pub use crate::foundation::callback::{CallbackCollection, CallbackHandle, CallbackStatus, release_all};
pub use crate::foundation::core::{
    Affine, BezPath, Fps, FrameIndex, FrameRange, ImageSize, Point, Rect, Rgba8, Vec2,
};
pub use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
pub use crate::foundation::input::{
    KeyEvent, Modifiers, PointerButton, PointerEvent, PointerKind, WheelEvent,
};
pub use crate::foundation::notice::{
    Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier,
};
pub use crate::foundation::registry::NamedRegistry;

pub use crate::actions::annotation::{CreateAnnotation, DeleteAnnotation, UpdateAnnotation};
pub use crate::actions::manager::{Action, ActionManager};
pub use crate::actions::polygon::{MergePolygons, SubtractPolygons};
pub use crate::actions::video::{add_keyframe, remove_keyframe, set_interpolated, update_segment};
pub use crate::animation::interpolate::{InterpolationAlgorithm, Lerp};
pub use crate::config::EditorConfig;
pub use crate::editor::{Editor, EditorRequest, Registry, ToolContext};
pub use crate::managers::annotation::{AnnotationChange, AnnotationManager, StageEvent};
pub use crate::managers::commands::{Command, CommandRegistry};
pub use crate::managers::item::{
    BlankProvider, FrameData, ItemInfo, ItemKind, ItemManager, ItemProvider, MeasureRegion,
};
pub use crate::managers::measure::{
    DRAWING_ANNOTATION_ID, Measure, MeasureInputs, MeasureManager, MeasureOverlay, measure_data,
};
pub use crate::managers::overlay::{OverlayInputs, OverlayManager, OverlayRecord};
pub use crate::managers::plugin::{Plugin, PluginContext, PluginManager};
pub use crate::managers::tool::{
    Handler, InputHandlers, Tool, ToolManager, ToolOption, ToolOptions, ToolRegistry, ToolSetup,
};
pub use crate::model::annotation::{Annotation, AnnotationBody, AnnotationClass, AnnotationId};
pub use crate::model::shapes::{
    AnnotationData, BoundingBoxData, EllipseData, KeypointData, PolygonData, PolylineData,
};
pub use crate::model::sub::SubAnnotations;
pub use crate::model::video::{InferredFrame, VideoAnnotationData, VideoKeyframe};
pub use crate::persist::bridge::{PersistError, PersistOp, PersistenceBridge};
pub use crate::persist::memory::MemoryBridge;
pub use crate::render::cpu::{CpuRasterizer, FrameRgba};
pub use crate::render::draw::{DrawList, DrawOp, DrawStyle};
pub use crate::render::layer::{FrameScheduler, Layer, LayerKind, LayerSet, ManualScheduler};
pub use crate::render::manager::{PaintItem, PaintOutcome, RenderManager};
pub use crate::render::registry::{AnnotationRenderer, RendererRegistry};
pub use crate::render::renderers::{
    BoundingBoxRenderer, EllipseRenderer, KeypointRenderer, PolygonRenderer, PolylineRenderer,
    TagRenderer,
};
pub use crate::serialize::builtin::{
    BoundingBoxSerializer, EllipseSerializer, KeypointSerializer, PolygonSerializer,
    PolylineSerializer, TagSerializer,
};
pub use crate::serialize::payload::{StageAnnotationPayload, decode_payloads};
pub use crate::serialize::registry::{Serializer, SerializerRegistry};
pub use crate::view::camera::Camera;
pub use crate::view::pane::{View, ViewServices, WindowLevel};
pub use crate::view::playback::{Playback, Tick};
