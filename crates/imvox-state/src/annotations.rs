//! Annotation geometry stored inline on annotation layers
//!
//! Annotations are a closed discriminated family: `point`, `line`,
//! `axis_aligned_bounding_box`, and `ellipsoid`. Unlike tools, a bare
//! string is not accepted; every annotation is a JSON object with a
//! `type` discriminant.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use imvox_json::{
    emit, emit_field, impl_json_eq, AccessMode, FromJson, JsonObject, NumberOrString, StateError,
    StateResult, ToJson, TypedList,
};

fn emit_kind(map: &mut Map<String, Value>, kind: &str) {
    map.insert("type".to_string(), Value::String(kind.to_string()));
}

/// Fields shared by every annotation kind.
#[derive(Debug, Clone)]
pub struct AnnotationBase {
    id: Option<String>,
    description: Option<String>,
    segments: Option<TypedList<TypedList<u64>>>,
    props: Option<TypedList<NumberOrString>>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl AnnotationBase {
    fn new() -> Self {
        AnnotationBase {
            id: None,
            description: None,
            segments: None,
            props: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// Consumes the shared keys; everything still on the cursor afterwards
    /// is preserved verbatim.
    fn from_object(mut obj: JsonObject) -> StateResult<Self> {
        let mode = obj.mode();
        let id = obj.take("id")?;
        let description = obj.take("description")?;
        let segments = obj.take("segments")?;
        let props = obj.take("props")?;
        Ok(AnnotationBase {
            id,
            description,
            segments,
            props,
            extra: obj.into_extra(),
            mode,
        })
    }

    fn emit_into(&self, map: &mut Map<String, Value>) {
        emit_field(map, "id", &self.id);
        emit_field(map, "description", &self.description);
        emit_field(map, "segments", &self.segments);
        emit_field(map, "props", &self.props);
        imvox_json::extend_extra(map, &self.extra);
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.id = id;
        Ok(())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.description = description;
        Ok(())
    }

    /// Segment ids associated per linked segmentation relationship.
    pub fn segments(&self) -> Option<&TypedList<TypedList<u64>>> {
        self.segments.as_ref()
    }

    pub fn set_segments(&mut self, segments: Option<TypedList<TypedList<u64>>>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.segments = segments;
        Ok(())
    }

    /// Per-annotation property values, parallel to the layer's property specs.
    pub fn props(&self) -> Option<&TypedList<NumberOrString>> {
        self.props.as_ref()
    }

    pub fn set_props(&mut self, props: Option<TypedList<NumberOrString>>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.props = props;
        Ok(())
    }
}

macro_rules! annotation_base_accessors {
    () => {
        pub fn base(&self) -> &AnnotationBase {
            &self.base
        }

        pub fn base_mut(&mut self) -> &mut AnnotationBase {
            &mut self.base
        }

        pub fn with_id(mut self, id: impl Into<String>) -> Self {
            self.base.id = Some(id.into());
            self
        }

        pub fn with_description(mut self, description: impl Into<String>) -> Self {
            self.base.description = Some(description.into());
            self
        }
    };
}

/// A single point.
#[derive(Debug, Clone)]
pub struct PointAnnotation {
    base: AnnotationBase,
    point: Vec<f32>,
}

impl PointAnnotation {
    pub fn new(point: Vec<f32>) -> Self {
        PointAnnotation {
            base: AnnotationBase::new(),
            point,
        }
    }

    pub fn point(&self) -> &[f32] {
        &self.point
    }

    pub fn set_point(&mut self, point: Vec<f32>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.point = point;
        Ok(())
    }

    annotation_base_accessors!();
}

impl FromJson for PointAnnotation {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let point = obj.require("point")?;
        Ok(PointAnnotation {
            point,
            base: AnnotationBase::from_object(obj)?,
        })
    }
}

impl ToJson for PointAnnotation {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "point");
        emit(&mut map, "point", &self.point);
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

/// A line segment between two points.
#[derive(Debug, Clone)]
pub struct LineAnnotation {
    base: AnnotationBase,
    point_a: Vec<f32>,
    point_b: Vec<f32>,
}

impl LineAnnotation {
    pub fn new(point_a: Vec<f32>, point_b: Vec<f32>) -> Self {
        LineAnnotation {
            base: AnnotationBase::new(),
            point_a,
            point_b,
        }
    }

    pub fn point_a(&self) -> &[f32] {
        &self.point_a
    }

    pub fn point_b(&self) -> &[f32] {
        &self.point_b
    }

    pub fn set_point_a(&mut self, point: Vec<f32>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.point_a = point;
        Ok(())
    }

    pub fn set_point_b(&mut self, point: Vec<f32>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.point_b = point;
        Ok(())
    }

    annotation_base_accessors!();
}

impl FromJson for LineAnnotation {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let point_a = obj.require("pointA")?;
        let point_b = obj.require("pointB")?;
        Ok(LineAnnotation {
            point_a,
            point_b,
            base: AnnotationBase::from_object(obj)?,
        })
    }
}

impl ToJson for LineAnnotation {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "line");
        emit(&mut map, "pointA", &self.point_a);
        emit(&mut map, "pointB", &self.point_b);
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

/// A box aligned to the coordinate axes, spanned by two corners.
#[derive(Debug, Clone)]
pub struct AxisAlignedBoundingBoxAnnotation {
    base: AnnotationBase,
    point_a: Vec<f32>,
    point_b: Vec<f32>,
}

impl AxisAlignedBoundingBoxAnnotation {
    pub fn new(point_a: Vec<f32>, point_b: Vec<f32>) -> Self {
        AxisAlignedBoundingBoxAnnotation {
            base: AnnotationBase::new(),
            point_a,
            point_b,
        }
    }

    pub fn point_a(&self) -> &[f32] {
        &self.point_a
    }

    pub fn point_b(&self) -> &[f32] {
        &self.point_b
    }

    pub fn set_point_a(&mut self, point: Vec<f32>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.point_a = point;
        Ok(())
    }

    pub fn set_point_b(&mut self, point: Vec<f32>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.point_b = point;
        Ok(())
    }

    annotation_base_accessors!();
}

impl FromJson for AxisAlignedBoundingBoxAnnotation {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let point_a = obj.require("pointA")?;
        let point_b = obj.require("pointB")?;
        Ok(AxisAlignedBoundingBoxAnnotation {
            point_a,
            point_b,
            base: AnnotationBase::from_object(obj)?,
        })
    }
}

impl ToJson for AxisAlignedBoundingBoxAnnotation {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "axis_aligned_bounding_box");
        emit(&mut map, "pointA", &self.point_a);
        emit(&mut map, "pointB", &self.point_b);
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

/// An axis-aligned ellipsoid given by center and per-axis radii.
#[derive(Debug, Clone)]
pub struct EllipsoidAnnotation {
    base: AnnotationBase,
    center: Vec<f32>,
    radii: Vec<f32>,
}

impl EllipsoidAnnotation {
    pub fn new(center: Vec<f32>, radii: Vec<f32>) -> Self {
        EllipsoidAnnotation {
            base: AnnotationBase::new(),
            center,
            radii,
        }
    }

    pub fn center(&self) -> &[f32] {
        &self.center
    }

    pub fn radii(&self) -> &[f32] {
        &self.radii
    }

    pub fn set_center(&mut self, center: Vec<f32>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.center = center;
        Ok(())
    }

    pub fn set_radii(&mut self, radii: Vec<f32>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.radii = radii;
        Ok(())
    }

    annotation_base_accessors!();
}

impl FromJson for EllipsoidAnnotation {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let center = obj.require("center")?;
        let radii = obj.require("radii")?;
        Ok(EllipsoidAnnotation {
            center,
            radii,
            base: AnnotationBase::from_object(obj)?,
        })
    }
}

impl ToJson for EllipsoidAnnotation {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "ellipsoid");
        emit(&mut map, "center", &self.center);
        emit(&mut map, "radii", &self.radii);
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

/// Any annotation, dispatched on the wire discriminant.
#[derive(Debug, Clone)]
pub enum Annotation {
    Point(PointAnnotation),
    Line(LineAnnotation),
    AxisAlignedBoundingBox(AxisAlignedBoundingBoxAnnotation),
    Ellipsoid(EllipsoidAnnotation),
}

type AnnotationCtor = fn(&Value, AccessMode) -> StateResult<Annotation>;

const ANNOTATION_KINDS: &[(&str, AnnotationCtor)] = &[
    ("point", |v, m| {
        PointAnnotation::from_json(v, m).map(Annotation::Point)
    }),
    ("line", |v, m| {
        LineAnnotation::from_json(v, m).map(Annotation::Line)
    }),
    ("axis_aligned_bounding_box", |v, m| {
        AxisAlignedBoundingBoxAnnotation::from_json(v, m).map(Annotation::AxisAlignedBoundingBox)
    }),
    ("ellipsoid", |v, m| {
        EllipsoidAnnotation::from_json(v, m).map(Annotation::Ellipsoid)
    }),
];

impl Annotation {
    /// The wire discriminant of this annotation.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Annotation::Point(_) => "point",
            Annotation::Line(_) => "line",
            Annotation::AxisAlignedBoundingBox(_) => "axis_aligned_bounding_box",
            Annotation::Ellipsoid(_) => "ellipsoid",
        }
    }

    pub fn base(&self) -> &AnnotationBase {
        match self {
            Annotation::Point(a) => a.base(),
            Annotation::Line(a) => a.base(),
            Annotation::AxisAlignedBoundingBox(a) => a.base(),
            Annotation::Ellipsoid(a) => a.base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut AnnotationBase {
        match self {
            Annotation::Point(a) => a.base_mut(),
            Annotation::Line(a) => a.base_mut(),
            Annotation::AxisAlignedBoundingBox(a) => a.base_mut(),
            Annotation::Ellipsoid(a) => a.base_mut(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.base().id()
    }
}

impl FromJson for Annotation {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| StateError::type_mismatch("object", value))?;
        let name = match map.get("type") {
            Some(Value::String(name)) => name.as_str(),
            Some(other) => return Err(StateError::type_mismatch("string", other)),
            None => return Err(StateError::missing_field("type")),
        };
        let ctor = ANNOTATION_KINDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, ctor)| ctor)
            .ok_or_else(|| StateError::unknown_type("annotation", name))?;
        ctor(value, mode)
    }
}

impl ToJson for Annotation {
    fn to_json(&self) -> Value {
        match self {
            Annotation::Point(a) => a.to_json(),
            Annotation::Line(a) => a.to_json(),
            Annotation::AxisAlignedBoundingBox(a) => a.to_json(),
            Annotation::Ellipsoid(a) => a.to_json(),
        }
    }
}

impl From<PointAnnotation> for Annotation {
    fn from(a: PointAnnotation) -> Self {
        Annotation::Point(a)
    }
}

impl From<LineAnnotation> for Annotation {
    fn from(a: LineAnnotation) -> Self {
        Annotation::Line(a)
    }
}

impl From<AxisAlignedBoundingBoxAnnotation> for Annotation {
    fn from(a: AxisAlignedBoundingBoxAnnotation) -> Self {
        Annotation::AxisAlignedBoundingBox(a)
    }
}

impl From<EllipsoidAnnotation> for Annotation {
    fn from(a: EllipsoidAnnotation) -> Self {
        Annotation::Ellipsoid(a)
    }
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Annotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Annotation::from_json(&value, AccessMode::ReadWrite).map_err(D::Error::custom)
    }
}

/// Declares one typed property carried by every annotation of a layer.
///
/// The `enum_values`/`enum_labels` keys are snake_case on the wire; this
/// departure from the camelCase convention is part of the format.
#[derive(Debug, Clone)]
pub struct AnnotationPropertySpec {
    id: String,
    property_type: String,
    description: Option<String>,
    default: Option<NumberOrString>,
    enum_values: Option<TypedList<NumberOrString>>,
    enum_labels: Option<TypedList<String>>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl AnnotationPropertySpec {
    pub fn new(id: impl Into<String>, property_type: impl Into<String>) -> Self {
        AnnotationPropertySpec {
            id: id.into(),
            property_type: property_type.into(),
            description: None,
            default: None,
            enum_values: None,
            enum_labels: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn property_type(&self) -> &str {
        &self.property_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default(&self) -> Option<&NumberOrString> {
        self.default.as_ref()
    }

    pub fn enum_values(&self) -> Option<&TypedList<NumberOrString>> {
        self.enum_values.as_ref()
    }

    pub fn enum_labels(&self) -> Option<&TypedList<String>> {
        self.enum_labels.as_ref()
    }

    pub fn set_description(&mut self, description: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.description = description;
        Ok(())
    }

    pub fn set_default(&mut self, default: Option<NumberOrString>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.default = default;
        Ok(())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl FromJson for AnnotationPropertySpec {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let id = obj.require("id")?;
        let property_type = obj.require("type")?;
        let description = obj.take("description")?;
        let default = obj.take("default")?;
        let enum_values = obj.take("enum_values")?;
        let enum_labels = obj.take("enum_labels")?;
        Ok(AnnotationPropertySpec {
            id,
            property_type,
            description,
            default,
            enum_values,
            enum_labels,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for AnnotationPropertySpec {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit(&mut map, "id", &self.id);
        emit(&mut map, "type", &self.property_type);
        emit_field(&mut map, "description", &self.description);
        emit_field(&mut map, "default", &self.default);
        emit_field(&mut map, "enum_values", &self.enum_values);
        emit_field(&mut map, "enum_labels", &self.enum_labels);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl_json_eq!(
    PointAnnotation,
    LineAnnotation,
    AxisAlignedBoundingBoxAnnotation,
    EllipsoidAnnotation,
    Annotation,
    AnnotationPropertySpec,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_round_trip() {
        let input = json!({
            "type": "point",
            "point": [1.5, 2.5, 3.5],
            "id": "a1",
            "segments": [[5, 7]],
        });
        let annotation = Annotation::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert!(matches!(annotation, Annotation::Point(_)));
        assert_eq!(annotation.id(), Some("a1"));
        assert_eq!(annotation.to_json(), input);
    }

    #[test]
    fn test_each_kind_dispatches() {
        let line = json!({"type": "line", "pointA": [0.0], "pointB": [1.0]});
        assert!(matches!(
            Annotation::from_json(&line, AccessMode::ReadWrite).unwrap(),
            Annotation::Line(_)
        ));
        let bbox = json!({
            "type": "axis_aligned_bounding_box",
            "pointA": [0.0, 0.0],
            "pointB": [1.0, 1.0],
        });
        assert!(matches!(
            Annotation::from_json(&bbox, AccessMode::ReadWrite).unwrap(),
            Annotation::AxisAlignedBoundingBox(_)
        ));
        let ellipsoid = json!({
            "type": "ellipsoid",
            "center": [0.0, 0.0, 0.0],
            "radii": [10.0, 10.0, 5.0],
        });
        assert!(matches!(
            Annotation::from_json(&ellipsoid, AccessMode::ReadWrite).unwrap(),
            Annotation::Ellipsoid(_)
        ));
    }

    #[test]
    fn test_unknown_kind() {
        let err = Annotation::from_json(
            &json!({"type": "polygon", "points": []}),
            AccessMode::ReadWrite,
        )
        .unwrap_err();
        assert_eq!(
            err,
            StateError::UnknownType {
                family: "annotation",
                name: "polygon".to_string()
            }
        );
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Annotation::from_json(&json!("point"), AccessMode::ReadWrite).is_err());
        let err =
            Annotation::from_json(&json!({"point": [1.0]}), AccessMode::ReadWrite).unwrap_err();
        assert!(matches!(err, StateError::InvalidValue(_)));
    }

    #[test]
    fn test_segment_strings_canonicalize() {
        let input = json!({"type": "point", "point": [0.0], "segments": [["5", 7]]});
        let annotation = Annotation::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(annotation.to_json()["segments"], json!([[5, 7]]));
    }

    #[test]
    fn test_property_spec_snake_case_keys() {
        let input = json!({
            "id": "class",
            "type": "uint8",
            "default": 0,
            "enum_values": [0, 1, 2],
            "enum_labels": ["none", "soma", "axon"],
        });
        let spec = AnnotationPropertySpec::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(spec.id(), "class");
        assert_eq!(spec.property_type(), "uint8");
        assert_eq!(spec.to_json(), input);
    }

    #[test]
    fn test_builder() {
        let annotation = PointAnnotation::new(vec![1.0, 2.0, 3.0])
            .with_id("p1")
            .with_description("soma center");
        assert_eq!(annotation.base().description(), Some("soma center"));
        let v = annotation.to_json();
        assert_eq!(v["type"], json!("point"));
        assert_eq!(v["point"], json!([1.0, 2.0, 3.0]));
    }
}
