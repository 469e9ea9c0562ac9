//! Wire formats of the built-in annotation types.
//!
//! | type | wire |
//! |---|---|
//! | `polygon` | `{ path: [{x, y}], additional_paths?: [[{x, y}]] }` |
//! | `bounding_box` | `{ x, y, w, h }` |
//! | `ellipse` | `{ center: {x, y}, radius: {x, y}, angle }` |
//! | `keypoint` | `{ x, y }` |
//! | `polyline` | `{ path: [{x, y}] }` |
//! | `tag` | `{}` |

use std::rc::Rc;

use serde_json::Value;

use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};
use crate::model::shapes::{
    AnnotationData, BoundingBoxData, EllipseData, KeypointData, PolygonData, PolylineData,
};
use crate::serialize::registry::Serializer;

#[derive(serde::Serialize, serde::Deserialize)]
struct WirePoint {
    x: f64,
    y: f64,
}

impl From<Point> for WirePoint {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<&WirePoint> for Point {
    fn from(p: &WirePoint) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WirePolygon {
    path: Vec<WirePoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    additional_paths: Vec<Vec<WirePoint>>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WireBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WireEllipse {
    center: WirePoint,
    radius: WirePoint,
    #[serde(default)]
    angle: f64,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WirePath {
    path: Vec<WirePoint>,
}

fn finite(values: &[f64], what: &str) -> CanvasmarkResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CanvasmarkError::validation(format!(
            "{what} has non-finite coordinates"
        )))
    }
}

fn to_path(points: &[WirePoint], what: &str) -> CanvasmarkResult<Vec<Point>> {
    let path: Vec<Point> = points.iter().map(Point::from).collect();
    for p in &path {
        finite(&[p.x, p.y], what)?;
    }
    Ok(path)
}

fn from_path(points: &[Point]) -> Vec<WirePoint> {
    points.iter().copied().map(WirePoint::from).collect()
}

fn mismatch(expected: &str, got: &AnnotationData) -> CanvasmarkError {
    CanvasmarkError::serde(format!(
        "{expected} serializer cannot encode '{}' geometry",
        got.kind()
    ))
}

/// `polygon`: main path plus optional extra rings.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolygonSerializer;

impl Serializer for PolygonSerializer {
    fn annotation_type(&self) -> &str {
        "polygon"
    }

    fn deserialize(&self, value: &Value) -> CanvasmarkResult<AnnotationData> {
        let wire: WirePolygon = serde_json::from_value(value.clone())?;
        let path = to_path(&wire.path, "polygon")?;
        if path.len() < 3 {
            return Err(CanvasmarkError::validation(format!(
                "polygon needs at least 3 points, got {}",
                path.len()
            )));
        }
        let additional_paths = wire
            .additional_paths
            .iter()
            .map(|r| to_path(r, "polygon"))
            .collect::<CanvasmarkResult<Vec<_>>>()?;
        Ok(AnnotationData::Polygon(PolygonData {
            path,
            additional_paths,
        }))
    }

    fn serialize(&self, data: &AnnotationData) -> CanvasmarkResult<Value> {
        let AnnotationData::Polygon(p) = data else {
            return Err(mismatch("polygon", data));
        };
        Ok(serde_json::to_value(WirePolygon {
            path: from_path(&p.path),
            additional_paths: p.additional_paths.iter().map(|r| from_path(r)).collect(),
        })?)
    }
}

/// `bounding_box`: top-left corner plus size.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundingBoxSerializer;

impl Serializer for BoundingBoxSerializer {
    fn annotation_type(&self) -> &str {
        "bounding_box"
    }

    fn deserialize(&self, value: &Value) -> CanvasmarkResult<AnnotationData> {
        let w: WireBox = serde_json::from_value(value.clone())?;
        finite(&[w.x, w.y, w.w, w.h], "bounding_box")?;
        if w.w < 0.0 || w.h < 0.0 {
            return Err(CanvasmarkError::validation(
                "bounding_box width and height must be >= 0",
            ));
        }
        Ok(AnnotationData::BoundingBox(BoundingBoxData {
            rect: Rect::new(w.x, w.y, w.x + w.w, w.y + w.h),
        }))
    }

    fn serialize(&self, data: &AnnotationData) -> CanvasmarkResult<Value> {
        let AnnotationData::BoundingBox(b) = data else {
            return Err(mismatch("bounding_box", data));
        };
        let r = b.rect.abs();
        Ok(serde_json::to_value(WireBox {
            x: r.x0,
            y: r.y0,
            w: r.width(),
            h: r.height(),
        })?)
    }
}

/// `ellipse`: center, radii and rotation; expanded to cardinal points in memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct EllipseSerializer;

impl Serializer for EllipseSerializer {
    fn annotation_type(&self) -> &str {
        "ellipse"
    }

    fn deserialize(&self, value: &Value) -> CanvasmarkResult<AnnotationData> {
        let w: WireEllipse = serde_json::from_value(value.clone())?;
        finite(
            &[w.center.x, w.center.y, w.radius.x, w.radius.y, w.angle],
            "ellipse",
        )?;
        if w.radius.x < 0.0 || w.radius.y < 0.0 {
            return Err(CanvasmarkError::validation("ellipse radii must be >= 0"));
        }
        Ok(AnnotationData::Ellipse(EllipseData::from_radii(
            Point::from(&w.center),
            w.radius.x,
            w.radius.y,
            w.angle,
        )))
    }

    fn serialize(&self, data: &AnnotationData) -> CanvasmarkResult<Value> {
        let AnnotationData::Ellipse(e) = data else {
            return Err(mismatch("ellipse", data));
        };
        Ok(serde_json::to_value(WireEllipse {
            center: e.center.into(),
            radius: WirePoint {
                x: e.radius_x(),
                y: e.radius_y(),
            },
            angle: e.angle(),
        })?)
    }
}

/// `keypoint`: a single point.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeypointSerializer;

impl Serializer for KeypointSerializer {
    fn annotation_type(&self) -> &str {
        "keypoint"
    }

    fn deserialize(&self, value: &Value) -> CanvasmarkResult<AnnotationData> {
        let w: WirePoint = serde_json::from_value(value.clone())?;
        finite(&[w.x, w.y], "keypoint")?;
        Ok(AnnotationData::Keypoint(KeypointData {
            point: Point::from(&w),
        }))
    }

    fn serialize(&self, data: &AnnotationData) -> CanvasmarkResult<Value> {
        let AnnotationData::Keypoint(k) = data else {
            return Err(mismatch("keypoint", data));
        };
        Ok(serde_json::to_value(WirePoint::from(k.point))?)
    }
}

/// `polyline`: an open path.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolylineSerializer;

impl Serializer for PolylineSerializer {
    fn annotation_type(&self) -> &str {
        "polyline"
    }

    fn deserialize(&self, value: &Value) -> CanvasmarkResult<AnnotationData> {
        let w: WirePath = serde_json::from_value(value.clone())?;
        let path = to_path(&w.path, "polyline")?;
        if path.len() < 2 {
            return Err(CanvasmarkError::validation(format!(
                "polyline needs at least 2 points, got {}",
                path.len()
            )));
        }
        Ok(AnnotationData::Polyline(PolylineData { path }))
    }

    fn serialize(&self, data: &AnnotationData) -> CanvasmarkResult<Value> {
        let AnnotationData::Polyline(p) = data else {
            return Err(mismatch("polyline", data));
        };
        Ok(serde_json::to_value(WirePath {
            path: from_path(&p.path),
        })?)
    }
}

/// `tag`: no geometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct TagSerializer;

impl Serializer for TagSerializer {
    fn annotation_type(&self) -> &str {
        "tag"
    }

    fn deserialize(&self, value: &Value) -> CanvasmarkResult<AnnotationData> {
        match value {
            Value::Object(_) | Value::Null => Ok(AnnotationData::Tag),
            other => Err(CanvasmarkError::serde(format!(
                "tag geometry must be an object, got {other}"
            ))),
        }
    }

    fn serialize(&self, data: &AnnotationData) -> CanvasmarkResult<Value> {
        match data {
            AnnotationData::Tag => Ok(Value::Object(serde_json::Map::new())),
            other => Err(mismatch("tag", other)),
        }
    }
}

pub(crate) fn builtin_serializers() -> Vec<Rc<dyn Serializer>> {
    vec![
        Rc::new(PolygonSerializer),
        Rc::new(BoundingBoxSerializer),
        Rc::new(EllipseSerializer),
        Rc::new(KeypointSerializer),
        Rc::new(PolylineSerializer),
        Rc::new(TagSerializer),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/serialize/builtin.rs"]
mod tests;
