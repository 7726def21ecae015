//! UI tools bindable to keys or listed in tool palettes
//!
//! Tools form an open discriminated family on the wire: `{"type": name,
//! ...}`, with a bare string accepted as shorthand for a tool with no other
//! fields. Unknown discriminants are rejected so misspelled bindings fail
//! loudly instead of silently dropping state.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use imvox_json::{
    emit_field, impl_json_eq, AccessMode, FromJson, JsonObject, StateError, StateResult, ToJson,
};

/// Every recognized tool discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    AnnotatePoint,
    AnnotateLine,
    AnnotateBoundingBox,
    AnnotateSphere,
    Blend,
    Opacity,
    VolumeRendering,
    VolumeRenderingGain,
    VolumeRenderingDepthSamples,
    CrossSectionRenderScale,
    SelectedAlpha,
    NotSelectedAlpha,
    ObjectAlpha,
    HideSegmentZero,
    HoverHighlight,
    BaseSegmentColoring,
    IgnoreNullVisibleSet,
    ColorSeed,
    SegmentDefaultColor,
    MeshRenderScale,
    MeshSilhouetteRendering,
    Saturation,
    SkeletonRenderingMode2d,
    SkeletonRenderingMode3d,
    SkeletonRenderingLineWidth2d,
    SkeletonRenderingLineWidth3d,
    ShaderControl,
    MergeSegments,
    SplitSegments,
    SelectSegments,
    Dimension,
}

/// Wire name of every tool kind, in registration order.
const TOOL_KINDS: &[(&str, ToolKind)] = &[
    ("annotatePoint", ToolKind::AnnotatePoint),
    ("annotateLine", ToolKind::AnnotateLine),
    ("annotateBoundingBox", ToolKind::AnnotateBoundingBox),
    ("annotateSphere", ToolKind::AnnotateSphere),
    ("blend", ToolKind::Blend),
    ("opacity", ToolKind::Opacity),
    ("volumeRendering", ToolKind::VolumeRendering),
    ("volumeRenderingGain", ToolKind::VolumeRenderingGain),
    ("volumeRenderingDepthSamples", ToolKind::VolumeRenderingDepthSamples),
    ("crossSectionRenderScale", ToolKind::CrossSectionRenderScale),
    ("selectedAlpha", ToolKind::SelectedAlpha),
    ("notSelectedAlpha", ToolKind::NotSelectedAlpha),
    ("objectAlpha", ToolKind::ObjectAlpha),
    ("hideSegmentZero", ToolKind::HideSegmentZero),
    ("hoverHighlight", ToolKind::HoverHighlight),
    ("baseSegmentColoring", ToolKind::BaseSegmentColoring),
    ("ignoreNullVisibleSet", ToolKind::IgnoreNullVisibleSet),
    ("colorSeed", ToolKind::ColorSeed),
    ("segmentDefaultColor", ToolKind::SegmentDefaultColor),
    ("meshRenderScale", ToolKind::MeshRenderScale),
    ("meshSilhouetteRendering", ToolKind::MeshSilhouetteRendering),
    ("saturation", ToolKind::Saturation),
    ("skeletonRendering.mode2d", ToolKind::SkeletonRenderingMode2d),
    ("skeletonRendering.mode3d", ToolKind::SkeletonRenderingMode3d),
    ("skeletonRendering.lineWidth2d", ToolKind::SkeletonRenderingLineWidth2d),
    ("skeletonRendering.lineWidth3d", ToolKind::SkeletonRenderingLineWidth3d),
    ("shaderControl", ToolKind::ShaderControl),
    ("mergeSegments", ToolKind::MergeSegments),
    ("splitSegments", ToolKind::SplitSegments),
    ("selectSegments", ToolKind::SelectSegments),
    ("dimension", ToolKind::Dimension),
];

impl ToolKind {
    /// Resolves a wire discriminant.
    pub fn from_name(name: &str) -> StateResult<Self> {
        TOOL_KINDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, kind)| kind)
            .ok_or_else(|| StateError::unknown_type("tool", name))
    }

    pub fn as_str(self) -> &'static str {
        TOOL_KINDS
            .iter()
            .find(|&&(_, kind)| kind == self)
            .map(|&(name, _)| name)
            .unwrap_or("")
    }

    /// Whether the tool operates on a specific layer.
    ///
    /// The annotation-placement tools bind to the active layer implicitly
    /// and never carry a `layer` field; every other kind does.
    pub fn is_layer_tool(self) -> bool {
        !matches!(
            self,
            ToolKind::AnnotatePoint
                | ToolKind::AnnotateLine
                | ToolKind::AnnotateBoundingBox
                | ToolKind::AnnotateSphere
        )
    }
}

/// One tool binding.
#[derive(Debug, Clone)]
pub struct Tool {
    kind: ToolKind,
    layer: Option<String>,
    control: Option<String>,
    dimension: Option<String>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl Tool {
    pub fn new(kind: ToolKind) -> Self {
        Tool {
            kind,
            layer: None,
            control: None,
            dimension: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// Parses either the bare-string or object wire form.
    pub fn parse(value: &Value) -> StateResult<Self> {
        Tool::from_json(value, AccessMode::ReadWrite)
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Name of the layer this tool applies to, for palette-scoped tools.
    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn set_layer(&mut self, layer: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        if !self.kind.is_layer_tool() {
            return Err(StateError::InvalidValue(format!(
                "tool {:?} does not apply to a layer",
                self.kind.as_str()
            )));
        }
        self.layer = layer;
        Ok(())
    }

    /// The shader control name; present exactly for shader-control tools.
    pub fn control(&self) -> Option<&str> {
        self.control.as_deref()
    }

    pub fn set_control(&mut self, control: impl Into<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        if self.kind != ToolKind::ShaderControl {
            return Err(StateError::InvalidValue(format!(
                "tool {:?} does not take a shader control",
                self.kind.as_str()
            )));
        }
        self.control = Some(control.into());
        Ok(())
    }

    /// The dimension name; present exactly for dimension tools.
    pub fn dimension(&self) -> Option<&str> {
        self.dimension.as_deref()
    }

    pub fn set_dimension(&mut self, dimension: impl Into<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        if self.kind != ToolKind::Dimension {
            return Err(StateError::InvalidValue(format!(
                "tool {:?} does not take a dimension",
                self.kind.as_str()
            )));
        }
        self.dimension = Some(dimension.into());
        Ok(())
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }
}

impl FromJson for Tool {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        // Bare string shorthand for {"type": ...}.
        if let Value::String(name) = value {
            let kind = ToolKind::from_name(name)?;
            if kind == ToolKind::ShaderControl || kind == ToolKind::Dimension {
                return Err(StateError::InvalidValue(format!(
                    "tool {name:?} requires additional fields"
                )));
            }
            return Ok(Tool {
                kind,
                layer: None,
                control: None,
                dimension: None,
                extra: Map::new(),
                mode,
            });
        }
        let mut obj = JsonObject::from_value(value, mode)?;
        let name: String = obj.require("type")?;
        let kind = ToolKind::from_name(&name)?;
        let layer = if kind.is_layer_tool() {
            obj.take("layer")?
        } else {
            None
        };
        let control = if kind == ToolKind::ShaderControl {
            Some(obj.require("control")?)
        } else {
            None
        };
        let dimension = if kind == ToolKind::Dimension {
            Some(obj.require("dimension")?)
        } else {
            None
        };
        Ok(Tool {
            kind,
            layer,
            control,
            dimension,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for Tool {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.kind.as_str().to_string()));
        emit_field(&mut map, "layer", &self.layer);
        emit_field(&mut map, "control", &self.control);
        emit_field(&mut map, "dimension", &self.dimension);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl_json_eq!(Tool);

impl Serialize for Tool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Tool::from_json(&value, AccessMode::ReadWrite).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_string_shorthand() {
        let tool = Tool::parse(&json!("blend")).unwrap();
        assert_eq!(tool.kind(), ToolKind::Blend);
        assert_eq!(tool.to_json(), json!({"type": "blend"}));
    }

    #[test]
    fn test_unknown_discriminant() {
        let err = Tool::parse(&json!("blendd")).unwrap_err();
        assert_eq!(
            err,
            StateError::UnknownType {
                family: "tool",
                name: "blendd".to_string()
            }
        );
        let err = Tool::parse(&json!({"type": "warp"})).unwrap_err();
        assert!(matches!(err, StateError::UnknownType { .. }));
    }

    #[test]
    fn test_missing_discriminant() {
        let err = Tool::parse(&json!({"layer": "seg"})).unwrap_err();
        assert!(matches!(err, StateError::InvalidValue(_)));
    }

    #[test]
    fn test_shader_control_requires_control() {
        let tool =
            Tool::parse(&json!({"type": "shaderControl", "control": "normalized"})).unwrap();
        assert_eq!(tool.kind(), ToolKind::ShaderControl);
        assert_eq!(tool.control(), Some("normalized"));
        assert!(Tool::parse(&json!({"type": "shaderControl"})).is_err());
        assert!(Tool::parse(&json!("shaderControl")).is_err());
    }

    #[test]
    fn test_dimension_tool() {
        let tool = Tool::parse(&json!({"type": "dimension", "dimension": "z"})).unwrap();
        assert_eq!(tool.dimension(), Some("z"));
        assert!(Tool::parse(&json!({"type": "dimension"})).is_err());
    }

    #[test]
    fn test_layer_field_only_on_layer_tools() {
        let tool = Tool::parse(&json!({"type": "opacity", "layer": "img"})).unwrap();
        assert_eq!(tool.layer(), Some("img"));

        // Annotation tools bind implicitly; a layer key is preserved as an
        // unknown key rather than interpreted.
        let tool = Tool::parse(&json!({"type": "annotatePoint", "layer": "img"})).unwrap();
        assert_eq!(tool.layer(), None);
        assert_eq!(tool.to_json(), json!({"type": "annotatePoint", "layer": "img"}));

        let mut tool = Tool::parse(&json!("annotateLine")).unwrap();
        assert!(tool.set_layer(Some("img".to_string())).is_err());
    }

    #[test]
    fn test_every_registered_kind_round_trips() {
        for &(name, kind) in TOOL_KINDS {
            assert_eq!(ToolKind::from_name(name).unwrap(), kind);
            assert_eq!(kind.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let input = json!({"type": "colorSeed", "layer": "seg", "custom": [1, 2]});
        let tool = Tool::parse(&input).unwrap();
        assert_eq!(tool.to_json(), input);
    }
}
