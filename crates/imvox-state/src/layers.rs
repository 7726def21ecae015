//! The five layer kinds and their shared base state
//!
//! Layers are the discriminated heart of the state tree: `image`,
//! `segmentation`, `pointAnnotation`, `annotation`, and `mesh`. Every
//! variant embeds [`LayerBase`], which carries the cross-kind fields
//! (local dimensions, panels, tool bindings) and the preserved unknown
//! keys.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use imvox_json::{
    emit_field, emit_nonempty, impl_json_eq, AccessMode, BoolOrString, EmptyWithMode, FromJson,
    JsonObject, StateError, StateResult, ToJson, TypedList, TypedMap,
};

use crate::annotations::{Annotation, AnnotationPropertySpec};
use crate::colors::hex_string_from_segment_id;
use crate::equivalence::EquivalenceMap;
use crate::interp::{
    interpolate_linear, interpolate_linear_optional_vectors, Interpolate,
};
use crate::coords::CoordinateSpace;
use crate::navigation::DimensionPlaybackVelocity;
use crate::panels::LayerSidePanelState;
use crate::segments::{StarredSegments, VisibleSegments};
use crate::shader::ShaderControls;
use crate::source::LayerDataSources;
use crate::tools::Tool;

fn emit_kind(map: &mut Map<String, Value>, kind: &str) {
    map.insert("type".to_string(), Value::String(kind.to_string()));
}

/// State common to every layer kind.
#[derive(Debug, Clone)]
pub struct LayerBase {
    local_dimensions: CoordinateSpace,
    local_position: Option<Vec<f32>>,
    local_velocity: TypedMap<String, DimensionPlaybackVelocity>,
    tab: Option<String>,
    panels: TypedList<LayerSidePanelState>,
    pick: Option<bool>,
    tool_bindings: TypedMap<String, Tool>,
    tool: Option<Tool>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl LayerBase {
    fn new() -> Self {
        LayerBase {
            local_dimensions: CoordinateSpace::new(),
            local_position: None,
            local_velocity: TypedMap::new(),
            tab: None,
            panels: TypedList::new(),
            pick: None,
            tool_bindings: TypedMap::new(),
            tool: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// Consumes the shared keys; everything left on the cursor is kept
    /// verbatim as unknown keys.
    fn from_object(mut obj: JsonObject) -> StateResult<Self> {
        let mode = obj.mode();
        let local_dimensions = obj.take_or_empty("localDimensions")?;
        let local_position = obj.take("localPosition")?;
        let local_velocity = obj.take_or_empty("localVelocity")?;
        let tab = obj.take("tab")?;
        let panels = obj.take_or_empty("panels")?;
        let pick = obj.take("pick")?;
        let tool_bindings = obj.take_or_empty("toolBindings")?;
        let tool = obj.take("tool")?;
        Ok(LayerBase {
            local_dimensions,
            local_position,
            local_velocity,
            tab,
            panels,
            pick,
            tool_bindings,
            tool,
            extra: obj.into_extra(),
            mode,
        })
    }

    fn emit_into(&self, map: &mut Map<String, Value>) {
        emit_nonempty(map, "localDimensions", self.local_dimensions.to_json());
        emit_field(map, "localPosition", &self.local_position);
        emit_nonempty(map, "localVelocity", self.local_velocity.to_json());
        emit_field(map, "tab", &self.tab);
        emit_nonempty(map, "panels", self.panels.to_json());
        emit_field(map, "pick", &self.pick);
        emit_nonempty(map, "toolBindings", self.tool_bindings.to_json());
        emit_field(map, "tool", &self.tool);
        imvox_json::extend_extra(map, &self.extra);
    }

    /// Position blends; everything else sticks to the start side.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let mut c = a.clone();
        c.local_position = interpolate_linear_optional_vectors(
            a.local_position.as_ref(),
            b.local_position.as_ref(),
            t,
        );
        c
    }

    pub fn local_dimensions(&self) -> &CoordinateSpace {
        &self.local_dimensions
    }

    pub fn set_local_dimensions(&mut self, dimensions: CoordinateSpace) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.local_dimensions = dimensions;
        Ok(())
    }

    pub fn local_position(&self) -> Option<&Vec<f32>> {
        self.local_position.as_ref()
    }

    pub fn set_local_position(&mut self, position: Option<Vec<f32>>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.local_position = position;
        Ok(())
    }

    pub fn local_velocity(&self) -> &TypedMap<String, DimensionPlaybackVelocity> {
        &self.local_velocity
    }

    pub fn local_velocity_mut(&mut self) -> &mut TypedMap<String, DimensionPlaybackVelocity> {
        &mut self.local_velocity
    }

    pub fn tab(&self) -> Option<&str> {
        self.tab.as_deref()
    }

    pub fn set_tab(&mut self, tab: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.tab = tab;
        Ok(())
    }

    pub fn panels(&self) -> &TypedList<LayerSidePanelState> {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut TypedList<LayerSidePanelState> {
        &mut self.panels
    }

    pub fn pick(&self) -> Option<bool> {
        self.pick
    }

    pub fn set_pick(&mut self, pick: Option<bool>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.pick = pick;
        Ok(())
    }

    /// Key-binding to tool assignments scoped to this layer.
    pub fn tool_bindings(&self) -> &TypedMap<String, Tool> {
        &self.tool_bindings
    }

    pub fn tool_bindings_mut(&mut self) -> &mut TypedMap<String, Tool> {
        &mut self.tool_bindings
    }

    pub fn tool(&self) -> Option<&Tool> {
        self.tool.as_ref()
    }

    pub fn set_tool(&mut self, tool: Option<Tool>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.tool = tool;
        Ok(())
    }
}

macro_rules! layer_base_accessors {
    () => {
        pub fn base(&self) -> &LayerBase {
            &self.base
        }

        pub fn base_mut(&mut self) -> &mut LayerBase {
            &mut self.base
        }
    };
}

/// Accepted string tokens for the image volume-rendering mode.
const VOLUME_RENDERING_MODES: &[&str] = &["off", "on", "max", "min"];

fn check_volume_rendering(value: &BoolOrString) -> StateResult<()> {
    match value.as_token() {
        Some(token) if !VOLUME_RENDERING_MODES.contains(&token) => Err(
            StateError::InvalidValue(format!("invalid volume rendering mode: {token:?}")),
        ),
        _ => Ok(()),
    }
}

/// Raw image channels rendered through a shader.
#[derive(Debug, Clone)]
pub struct ImageLayer {
    base: LayerBase,
    source: LayerDataSources,
    shader: Option<String>,
    shader_controls: ShaderControls,
    opacity: Option<f64>,
    blend: Option<String>,
    volume_rendering: Option<BoolOrString>,
    volume_rendering_gain: Option<f64>,
    volume_rendering_depth_samples: Option<f64>,
    cross_section_render_scale: Option<f64>,
    annotation_color: Option<String>,
}

impl ImageLayer {
    pub fn new() -> Self {
        ImageLayer {
            base: LayerBase::new(),
            source: LayerDataSources::new(),
            shader: None,
            shader_controls: ShaderControls::new(),
            opacity: None,
            blend: None,
            volume_rendering: None,
            volume_rendering_gain: None,
            volume_rendering_depth_samples: None,
            cross_section_render_scale: None,
            annotation_color: None,
        }
    }

    layer_base_accessors!();

    pub fn source(&self) -> &LayerDataSources {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut LayerDataSources {
        &mut self.source
    }

    pub fn shader(&self) -> Option<&str> {
        self.shader.as_deref()
    }

    pub fn set_shader(&mut self, shader: impl Into<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.shader = Some(shader.into());
        Ok(())
    }

    pub fn shader_controls(&self) -> &ShaderControls {
        &self.shader_controls
    }

    pub fn shader_controls_mut(&mut self) -> &mut ShaderControls {
        &mut self.shader_controls
    }

    /// Defaults to 0.5.
    pub fn opacity(&self) -> f64 {
        self.opacity.unwrap_or(0.5)
    }

    pub fn set_opacity(&mut self, opacity: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.opacity = Some(opacity);
        Ok(())
    }

    pub fn blend(&self) -> Option<&str> {
        self.blend.as_deref()
    }

    pub fn set_blend(&mut self, blend: Option<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.blend = blend;
        Ok(())
    }

    /// Defaults to disabled.
    pub fn volume_rendering(&self) -> BoolOrString {
        self.volume_rendering
            .clone()
            .unwrap_or(BoolOrString::Bool(false))
    }

    pub fn set_volume_rendering(&mut self, value: BoolOrString) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        check_volume_rendering(&value)?;
        self.volume_rendering = Some(value);
        Ok(())
    }

    /// Defaults to 0.
    pub fn volume_rendering_gain(&self) -> f64 {
        self.volume_rendering_gain.unwrap_or(0.0)
    }

    pub fn set_volume_rendering_gain(&mut self, gain: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.volume_rendering_gain = Some(gain);
        Ok(())
    }

    /// Defaults to 64.
    pub fn volume_rendering_depth_samples(&self) -> f64 {
        self.volume_rendering_depth_samples.unwrap_or(64.0)
    }

    pub fn set_volume_rendering_depth_samples(&mut self, samples: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.volume_rendering_depth_samples = Some(samples);
        Ok(())
    }

    /// Defaults to 1.
    pub fn cross_section_render_scale(&self) -> f64 {
        self.cross_section_render_scale.unwrap_or(1.0)
    }

    pub fn set_cross_section_render_scale(&mut self, scale: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.cross_section_render_scale = Some(scale);
        Ok(())
    }

    pub fn annotation_color(&self) -> Option<&str> {
        self.annotation_color.as_deref()
    }

    pub fn set_annotation_color(&mut self, color: Option<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.annotation_color = color;
        Ok(())
    }

    pub fn with_source(mut self, source: LayerDataSources) -> Self {
        self.source = source;
        self
    }

    pub fn with_shader(mut self, shader: impl Into<String>) -> Self {
        self.shader = Some(shader.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

impl Default for ImageLayer {
    fn default() -> Self {
        ImageLayer::new()
    }
}

impl FromJson for ImageLayer {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let source = obj.take_or_empty("source")?;
        let shader = obj.take("shader")?;
        let shader_controls = obj.take_or_empty("shaderControls")?;
        let opacity = obj.take("opacity")?;
        let blend = obj.take("blend")?;
        let volume_rendering: Option<BoolOrString> = obj.take("volumeRendering")?;
        if let Some(value) = &volume_rendering {
            check_volume_rendering(value)?;
        }
        let volume_rendering_gain = obj.take("volumeRenderingGain")?;
        let volume_rendering_depth_samples = obj.take("volumeRenderingDepthSamples")?;
        let cross_section_render_scale = obj.take("crossSectionRenderScale")?;
        let annotation_color = obj.take("annotationColor")?;
        Ok(ImageLayer {
            source,
            shader,
            shader_controls,
            opacity,
            blend,
            volume_rendering,
            volume_rendering_gain,
            volume_rendering_depth_samples,
            cross_section_render_scale,
            annotation_color,
            base: LayerBase::from_object(obj)?,
        })
    }
}

impl ToJson for ImageLayer {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "image");
        emit_nonempty(&mut map, "source", self.source.to_json());
        emit_field(&mut map, "shader", &self.shader);
        emit_nonempty(&mut map, "shaderControls", self.shader_controls.to_json());
        emit_field(&mut map, "opacity", &self.opacity);
        emit_field(&mut map, "blend", &self.blend);
        emit_field(&mut map, "volumeRendering", &self.volume_rendering);
        emit_field(&mut map, "volumeRenderingGain", &self.volume_rendering_gain);
        emit_field(
            &mut map,
            "volumeRenderingDepthSamples",
            &self.volume_rendering_depth_samples,
        );
        emit_field(
            &mut map,
            "crossSectionRenderScale",
            &self.cross_section_render_scale,
        );
        emit_field(&mut map, "annotationColor", &self.annotation_color);
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

impl Interpolate for ImageLayer {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let mut c = a.clone();
        c.base = LayerBase::interpolate(&a.base, &b.base, t);
        c.opacity = Some(interpolate_linear(a.opacity(), b.opacity(), t));
        c
    }
}

/// Linked segmentation color group: a group name, or explicitly disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentationColorGroup {
    Group(String),
    Disabled,
}

impl FromJson for SegmentationColorGroup {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::String(s) => Ok(SegmentationColorGroup::Group(s.clone())),
            Value::Bool(false) => Ok(SegmentationColorGroup::Disabled),
            _ => Err(StateError::InvalidValue(format!(
                "expected group name or false, got {value}"
            ))),
        }
    }
}

impl ToJson for SegmentationColorGroup {
    fn to_json(&self) -> Value {
        match self {
            SegmentationColorGroup::Group(s) => Value::String(s.clone()),
            SegmentationColorGroup::Disabled => Value::Bool(false),
        }
    }
}

/// Rendering options for skeleton representations of segments.
#[derive(Debug, Clone)]
pub struct SkeletonRenderingOptions {
    shader: Option<String>,
    shader_controls: ShaderControls,
    mode2d: Option<String>,
    line_width2d: Option<f64>,
    mode3d: Option<String>,
    line_width3d: Option<f64>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl SkeletonRenderingOptions {
    pub fn new() -> Self {
        SkeletonRenderingOptions {
            shader: None,
            shader_controls: ShaderControls::new(),
            mode2d: None,
            line_width2d: None,
            mode3d: None,
            line_width3d: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn shader(&self) -> Option<&str> {
        self.shader.as_deref()
    }

    pub fn set_shader(&mut self, shader: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.shader = shader;
        Ok(())
    }

    pub fn shader_controls(&self) -> &ShaderControls {
        &self.shader_controls
    }

    pub fn shader_controls_mut(&mut self) -> &mut ShaderControls {
        &mut self.shader_controls
    }

    pub fn mode2d(&self) -> Option<&str> {
        self.mode2d.as_deref()
    }

    pub fn set_mode2d(&mut self, mode2d: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.mode2d = mode2d;
        Ok(())
    }

    /// Defaults to 2.
    pub fn line_width2d(&self) -> f64 {
        self.line_width2d.unwrap_or(2.0)
    }

    pub fn set_line_width2d(&mut self, width: f64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.line_width2d = Some(width);
        Ok(())
    }

    pub fn mode3d(&self) -> Option<&str> {
        self.mode3d.as_deref()
    }

    pub fn set_mode3d(&mut self, mode3d: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.mode3d = mode3d;
        Ok(())
    }

    /// Defaults to 1.
    pub fn line_width3d(&self) -> f64 {
        self.line_width3d.unwrap_or(1.0)
    }

    pub fn set_line_width3d(&mut self, width: f64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.line_width3d = Some(width);
        Ok(())
    }
}

impl Default for SkeletonRenderingOptions {
    fn default() -> Self {
        SkeletonRenderingOptions::new()
    }
}

impl EmptyWithMode for SkeletonRenderingOptions {
    fn empty_with_mode(mode: AccessMode) -> Self {
        SkeletonRenderingOptions {
            shader_controls: ShaderControls::empty_with_mode(mode),
            mode,
            ..SkeletonRenderingOptions::new()
        }
    }
}

impl FromJson for SkeletonRenderingOptions {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let shader = obj.take("shader")?;
        let shader_controls = obj.take_or_empty("shaderControls")?;
        let mode2d = obj.take("mode2d")?;
        let line_width2d = obj.take("lineWidth2d")?;
        let mode3d = obj.take("mode3d")?;
        let line_width3d = obj.take("lineWidth3d")?;
        Ok(SkeletonRenderingOptions {
            shader,
            shader_controls,
            mode2d,
            line_width2d,
            mode3d,
            line_width3d,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for SkeletonRenderingOptions {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "shader", &self.shader);
        emit_nonempty(&mut map, "shaderControls", self.shader_controls.to_json());
        emit_field(&mut map, "mode2d", &self.mode2d);
        emit_field(&mut map, "lineWidth2d", &self.line_width2d);
        emit_field(&mut map, "mode3d", &self.mode3d);
        emit_field(&mut map, "lineWidth3d", &self.line_width3d);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

/// Labeled segmentation rendered from a segment id volume.
#[derive(Debug, Clone)]
pub struct SegmentationLayer {
    base: LayerBase,
    source: LayerDataSources,
    starred_segments: StarredSegments,
    equivalences: EquivalenceMap,
    hide_segment_zero: Option<bool>,
    hover_highlight: Option<bool>,
    base_segment_coloring: Option<bool>,
    selected_alpha: Option<f64>,
    not_selected_alpha: Option<f64>,
    object_alpha: Option<f64>,
    saturation: Option<f64>,
    ignore_null_visible_set: Option<bool>,
    skeleton_rendering: SkeletonRenderingOptions,
    color_seed: Option<i64>,
    cross_section_render_scale: Option<f64>,
    mesh_render_scale: Option<f64>,
    mesh_silhouette_rendering: Option<f64>,
    segment_query: Option<String>,
    segment_colors: TypedMap<u64, String>,
    segment_default_color: Option<String>,
    linked_segmentation_group: Option<String>,
    linked_segmentation_color_group: Option<SegmentationColorGroup>,
    annotation_color: Option<String>,
}

impl SegmentationLayer {
    pub fn new() -> Self {
        SegmentationLayer {
            base: LayerBase::new(),
            source: LayerDataSources::new(),
            starred_segments: StarredSegments::new(),
            equivalences: EquivalenceMap::new(),
            hide_segment_zero: None,
            hover_highlight: None,
            base_segment_coloring: None,
            selected_alpha: None,
            not_selected_alpha: None,
            object_alpha: None,
            saturation: None,
            ignore_null_visible_set: None,
            skeleton_rendering: SkeletonRenderingOptions::new(),
            color_seed: None,
            cross_section_render_scale: None,
            mesh_render_scale: None,
            mesh_silhouette_rendering: None,
            segment_query: None,
            segment_colors: TypedMap::new(),
            segment_default_color: None,
            linked_segmentation_group: None,
            linked_segmentation_color_group: None,
            annotation_color: None,
        }
    }

    layer_base_accessors!();

    pub fn source(&self) -> &LayerDataSources {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut LayerDataSources {
        &mut self.source
    }

    /// The full starred list, including hidden segments.
    pub fn starred_segments(&self) -> &StarredSegments {
        &self.starred_segments
    }

    pub fn starred_segments_mut(&mut self) -> &mut StarredSegments {
        &mut self.starred_segments
    }

    /// Live view of the visible starred segments.
    pub fn segments(&self) -> VisibleSegments {
        self.starred_segments.visible()
    }

    /// Replaces the starred list with the given segments, all visible.
    pub fn set_segments(&mut self, ids: impl IntoIterator<Item = u64>) -> StateResult<()> {
        self.starred_segments.set_visible(ids)
    }

    pub fn equivalences(&self) -> &EquivalenceMap {
        &self.equivalences
    }

    pub fn equivalences_mut(&mut self) -> &mut EquivalenceMap {
        &mut self.equivalences
    }

    /// Defaults to true.
    pub fn hide_segment_zero(&self) -> bool {
        self.hide_segment_zero.unwrap_or(true)
    }

    pub fn set_hide_segment_zero(&mut self, hide: bool) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.hide_segment_zero = Some(hide);
        Ok(())
    }

    /// Defaults to true.
    pub fn hover_highlight(&self) -> bool {
        self.hover_highlight.unwrap_or(true)
    }

    pub fn set_hover_highlight(&mut self, highlight: bool) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.hover_highlight = Some(highlight);
        Ok(())
    }

    /// Defaults to false.
    pub fn base_segment_coloring(&self) -> bool {
        self.base_segment_coloring.unwrap_or(false)
    }

    pub fn set_base_segment_coloring(&mut self, coloring: bool) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.base_segment_coloring = Some(coloring);
        Ok(())
    }

    /// Defaults to 0.5.
    pub fn selected_alpha(&self) -> f64 {
        self.selected_alpha.unwrap_or(0.5)
    }

    pub fn set_selected_alpha(&mut self, alpha: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.selected_alpha = Some(alpha);
        Ok(())
    }

    /// Defaults to 0.
    pub fn not_selected_alpha(&self) -> f64 {
        self.not_selected_alpha.unwrap_or(0.0)
    }

    pub fn set_not_selected_alpha(&mut self, alpha: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.not_selected_alpha = Some(alpha);
        Ok(())
    }

    /// Defaults to 1.
    pub fn object_alpha(&self) -> f64 {
        self.object_alpha.unwrap_or(1.0)
    }

    pub fn set_object_alpha(&mut self, alpha: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.object_alpha = Some(alpha);
        Ok(())
    }

    /// Defaults to 1.
    pub fn saturation(&self) -> f64 {
        self.saturation.unwrap_or(1.0)
    }

    pub fn set_saturation(&mut self, saturation: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.saturation = Some(saturation);
        Ok(())
    }

    /// Defaults to true.
    pub fn ignore_null_visible_set(&self) -> bool {
        self.ignore_null_visible_set.unwrap_or(true)
    }

    pub fn set_ignore_null_visible_set(&mut self, ignore: bool) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.ignore_null_visible_set = Some(ignore);
        Ok(())
    }

    pub fn skeleton_rendering(&self) -> &SkeletonRenderingOptions {
        &self.skeleton_rendering
    }

    pub fn skeleton_rendering_mut(&mut self) -> &mut SkeletonRenderingOptions {
        &mut self.skeleton_rendering
    }

    /// Shortcut to the skeleton rendering shader.
    pub fn skeleton_shader(&self) -> Option<&str> {
        self.skeleton_rendering.shader()
    }

    pub fn set_skeleton_shader(&mut self, shader: impl Into<String>) -> StateResult<()> {
        self.skeleton_rendering.set_shader(Some(shader.into()))
    }

    /// Defaults to 0.
    pub fn color_seed(&self) -> i64 {
        self.color_seed.unwrap_or(0)
    }

    pub fn set_color_seed(&mut self, seed: i64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.color_seed = Some(seed);
        Ok(())
    }

    /// Defaults to 1.
    pub fn cross_section_render_scale(&self) -> f64 {
        self.cross_section_render_scale.unwrap_or(1.0)
    }

    pub fn set_cross_section_render_scale(&mut self, scale: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.cross_section_render_scale = Some(scale);
        Ok(())
    }

    /// Defaults to 10.
    pub fn mesh_render_scale(&self) -> f64 {
        self.mesh_render_scale.unwrap_or(10.0)
    }

    pub fn set_mesh_render_scale(&mut self, scale: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.mesh_render_scale = Some(scale);
        Ok(())
    }

    /// Defaults to 0 (disabled).
    pub fn mesh_silhouette_rendering(&self) -> f64 {
        self.mesh_silhouette_rendering.unwrap_or(0.0)
    }

    pub fn set_mesh_silhouette_rendering(&mut self, value: f64) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.mesh_silhouette_rendering = Some(value);
        Ok(())
    }

    pub fn segment_query(&self) -> Option<&str> {
        self.segment_query.as_deref()
    }

    pub fn set_segment_query(&mut self, query: Option<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.segment_query = query;
        Ok(())
    }

    /// Explicit per-segment color overrides.
    pub fn segment_colors(&self) -> &TypedMap<u64, String> {
        &self.segment_colors
    }

    pub fn segment_colors_mut(&mut self) -> &mut TypedMap<u64, String> {
        &mut self.segment_colors
    }

    pub fn segment_default_color(&self) -> Option<&str> {
        self.segment_default_color.as_deref()
    }

    pub fn set_segment_default_color(&mut self, color: Option<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.segment_default_color = color;
        Ok(())
    }

    pub fn linked_segmentation_group(&self) -> Option<&str> {
        self.linked_segmentation_group.as_deref()
    }

    pub fn set_linked_segmentation_group(&mut self, group: Option<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.linked_segmentation_group = group;
        Ok(())
    }

    pub fn linked_segmentation_color_group(&self) -> Option<&SegmentationColorGroup> {
        self.linked_segmentation_color_group.as_ref()
    }

    pub fn set_linked_segmentation_color_group(
        &mut self,
        group: Option<SegmentationColorGroup>,
    ) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.linked_segmentation_color_group = group;
        Ok(())
    }

    pub fn annotation_color(&self) -> Option<&str> {
        self.annotation_color.as_deref()
    }

    pub fn set_annotation_color(&mut self, color: Option<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.annotation_color = color;
        Ok(())
    }

    /// The hex color each visible segment renders with under the current
    /// color seed, in visibility order.
    pub fn segment_html_colors(&self) -> TypedMap<u64, String> {
        self.segments()
            .iter()
            .map(|id| (id, hex_string_from_segment_id(self.color_seed() as u32, id)))
            .collect()
    }

    pub fn with_source(mut self, source: LayerDataSources) -> Self {
        self.source = source;
        self
    }
}

impl Default for SegmentationLayer {
    fn default() -> Self {
        SegmentationLayer::new()
    }
}

impl FromJson for SegmentationLayer {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let source = obj.take_or_empty("source")?;
        let starred_segments = obj.take_or_empty("segments")?;
        let equivalences = obj.take_or_empty("equivalences")?;
        let hide_segment_zero = obj.take("hideSegmentZero")?;
        let hover_highlight = obj.take("hoverHighlight")?;
        let base_segment_coloring = obj.take("baseSegmentColoring")?;
        let selected_alpha = obj.take("selectedAlpha")?;
        let not_selected_alpha = obj.take("notSelectedAlpha")?;
        let object_alpha = obj.take("objectAlpha")?;
        let saturation = obj.take("saturation")?;
        let ignore_null_visible_set = obj.take("ignoreNullVisibleSet")?;
        let skeleton_rendering = obj.take_or_empty("skeletonRendering")?;
        let color_seed = obj.take("colorSeed")?;
        let cross_section_render_scale = obj.take("crossSectionRenderScale")?;
        let mesh_render_scale = obj.take("meshRenderScale")?;
        let mesh_silhouette_rendering = obj.take("meshSilhouetteRendering")?;
        let segment_query = obj.take("segmentQuery")?;
        let segment_colors = obj.take_or_empty("segmentColors")?;
        let segment_default_color = obj.take("segmentDefaultColor")?;
        let linked_segmentation_group = obj.take("linkedSegmentationGroup")?;
        let linked_segmentation_color_group = obj.take("linkedSegmentationColorGroup")?;
        let annotation_color = obj.take("annotationColor")?;
        Ok(SegmentationLayer {
            source,
            starred_segments,
            equivalences,
            hide_segment_zero,
            hover_highlight,
            base_segment_coloring,
            selected_alpha,
            not_selected_alpha,
            object_alpha,
            saturation,
            ignore_null_visible_set,
            skeleton_rendering,
            color_seed,
            cross_section_render_scale,
            mesh_render_scale,
            mesh_silhouette_rendering,
            segment_query,
            segment_colors,
            segment_default_color,
            linked_segmentation_group,
            linked_segmentation_color_group,
            annotation_color,
            base: LayerBase::from_object(obj)?,
        })
    }
}

impl ToJson for SegmentationLayer {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "segmentation");
        emit_nonempty(&mut map, "source", self.source.to_json());
        emit_nonempty(&mut map, "segments", self.starred_segments.to_json());
        emit_nonempty(&mut map, "equivalences", self.equivalences.to_json());
        emit_field(&mut map, "hideSegmentZero", &self.hide_segment_zero);
        emit_field(&mut map, "hoverHighlight", &self.hover_highlight);
        emit_field(&mut map, "baseSegmentColoring", &self.base_segment_coloring);
        emit_field(&mut map, "selectedAlpha", &self.selected_alpha);
        emit_field(&mut map, "notSelectedAlpha", &self.not_selected_alpha);
        emit_field(&mut map, "objectAlpha", &self.object_alpha);
        emit_field(&mut map, "saturation", &self.saturation);
        emit_field(&mut map, "ignoreNullVisibleSet", &self.ignore_null_visible_set);
        emit_nonempty(&mut map, "skeletonRendering", self.skeleton_rendering.to_json());
        emit_field(&mut map, "colorSeed", &self.color_seed);
        emit_field(
            &mut map,
            "crossSectionRenderScale",
            &self.cross_section_render_scale,
        );
        emit_field(&mut map, "meshRenderScale", &self.mesh_render_scale);
        emit_field(
            &mut map,
            "meshSilhouetteRendering",
            &self.mesh_silhouette_rendering,
        );
        emit_field(&mut map, "segmentQuery", &self.segment_query);
        emit_nonempty(&mut map, "segmentColors", self.segment_colors.to_json());
        emit_field(&mut map, "segmentDefaultColor", &self.segment_default_color);
        emit_field(
            &mut map,
            "linkedSegmentationGroup",
            &self.linked_segmentation_group,
        );
        emit_field(
            &mut map,
            "linkedSegmentationColorGroup",
            &self.linked_segmentation_color_group,
        );
        emit_field(&mut map, "annotationColor", &self.annotation_color);
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

impl Interpolate for SegmentationLayer {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let mut c = a.clone();
        c.base = LayerBase::interpolate(&a.base, &b.base, t);
        c.selected_alpha = Some(interpolate_linear(a.selected_alpha(), b.selected_alpha(), t));
        c.not_selected_alpha = Some(interpolate_linear(
            a.not_selected_alpha(),
            b.not_selected_alpha(),
            t,
        ));
        c.object_alpha = Some(interpolate_linear(a.object_alpha(), b.object_alpha(), t));
        c
    }
}

/// Annotations stored inline or in an annotation data source.
#[derive(Debug, Clone)]
pub struct AnnotationLayer {
    base: LayerBase,
    source: LayerDataSources,
    annotations: TypedList<Annotation>,
    annotation_properties: TypedList<AnnotationPropertySpec>,
    annotation_relationships: TypedList<String>,
    linked_segmentation_layer: TypedMap<String, String>,
    filter_by_segmentation: TypedList<String>,
    ignore_null_segment_filter: Option<bool>,
    shader: Option<String>,
    shader_controls: ShaderControls,
    swap_visible_segments_on_move: Option<bool>,
    annotation_color: Option<String>,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        AnnotationLayer {
            base: LayerBase::new(),
            source: LayerDataSources::new(),
            annotations: TypedList::new(),
            annotation_properties: TypedList::new(),
            annotation_relationships: TypedList::new(),
            linked_segmentation_layer: TypedMap::new(),
            filter_by_segmentation: TypedList::new(),
            ignore_null_segment_filter: None,
            shader: None,
            shader_controls: ShaderControls::new(),
            swap_visible_segments_on_move: None,
            annotation_color: None,
        }
    }

    layer_base_accessors!();

    pub fn source(&self) -> &LayerDataSources {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut LayerDataSources {
        &mut self.source
    }

    pub fn annotations(&self) -> &TypedList<Annotation> {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut TypedList<Annotation> {
        &mut self.annotations
    }

    pub fn annotation_properties(&self) -> &TypedList<AnnotationPropertySpec> {
        &self.annotation_properties
    }

    pub fn annotation_properties_mut(&mut self) -> &mut TypedList<AnnotationPropertySpec> {
        &mut self.annotation_properties
    }

    pub fn annotation_relationships(&self) -> &TypedList<String> {
        &self.annotation_relationships
    }

    pub fn annotation_relationships_mut(&mut self) -> &mut TypedList<String> {
        &mut self.annotation_relationships
    }

    /// Relationship name to segmentation layer name links.
    pub fn linked_segmentation_layer(&self) -> &TypedMap<String, String> {
        &self.linked_segmentation_layer
    }

    pub fn linked_segmentation_layer_mut(&mut self) -> &mut TypedMap<String, String> {
        &mut self.linked_segmentation_layer
    }

    pub fn filter_by_segmentation(&self) -> &TypedList<String> {
        &self.filter_by_segmentation
    }

    pub fn filter_by_segmentation_mut(&mut self) -> &mut TypedList<String> {
        &mut self.filter_by_segmentation
    }

    /// Defaults to true.
    pub fn ignore_null_segment_filter(&self) -> bool {
        self.ignore_null_segment_filter.unwrap_or(true)
    }

    pub fn set_ignore_null_segment_filter(&mut self, ignore: bool) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.ignore_null_segment_filter = Some(ignore);
        Ok(())
    }

    pub fn shader(&self) -> Option<&str> {
        self.shader.as_deref()
    }

    pub fn set_shader(&mut self, shader: impl Into<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.shader = Some(shader.into());
        Ok(())
    }

    pub fn shader_controls(&self) -> &ShaderControls {
        &self.shader_controls
    }

    pub fn shader_controls_mut(&mut self) -> &mut ShaderControls {
        &mut self.shader_controls
    }

    /// Defaults to true. The wire key spells "visble" without the second
    /// "i"; the misspelling is part of the format.
    pub fn swap_visible_segments_on_move(&self) -> bool {
        self.swap_visible_segments_on_move.unwrap_or(true)
    }

    pub fn set_swap_visible_segments_on_move(&mut self, swap: bool) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.swap_visible_segments_on_move = Some(swap);
        Ok(())
    }

    pub fn annotation_color(&self) -> Option<&str> {
        self.annotation_color.as_deref()
    }

    pub fn set_annotation_color(&mut self, color: Option<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.annotation_color = color;
        Ok(())
    }
}

impl Default for AnnotationLayer {
    fn default() -> Self {
        AnnotationLayer::new()
    }
}

impl FromJson for AnnotationLayer {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let source = obj.take_or_empty("source")?;
        let annotations = obj.take_or_empty("annotations")?;
        let annotation_properties = obj.take_or_empty("annotationProperties")?;
        let annotation_relationships = obj.take_or_empty("annotationRelationships")?;
        let linked_segmentation_layer = obj.take_or_empty("linkedSegmentationLayer")?;
        let filter_by_segmentation = obj.take_or_empty("filterBySegmentation")?;
        let ignore_null_segment_filter = obj.take("ignoreNullSegmentFilter")?;
        let shader = obj.take("shader")?;
        let shader_controls = obj.take_or_empty("shaderControls")?;
        let swap_visible_segments_on_move = obj.take("swapVisbleSegmentsOnMove")?;
        let annotation_color = obj.take("annotationColor")?;
        Ok(AnnotationLayer {
            source,
            annotations,
            annotation_properties,
            annotation_relationships,
            linked_segmentation_layer,
            filter_by_segmentation,
            ignore_null_segment_filter,
            shader,
            shader_controls,
            swap_visible_segments_on_move,
            annotation_color,
            base: LayerBase::from_object(obj)?,
        })
    }
}

impl ToJson for AnnotationLayer {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "annotation");
        emit_nonempty(&mut map, "source", self.source.to_json());
        emit_nonempty(&mut map, "annotations", self.annotations.to_json());
        emit_nonempty(
            &mut map,
            "annotationProperties",
            self.annotation_properties.to_json(),
        );
        emit_nonempty(
            &mut map,
            "annotationRelationships",
            self.annotation_relationships.to_json(),
        );
        emit_nonempty(
            &mut map,
            "linkedSegmentationLayer",
            self.linked_segmentation_layer.to_json(),
        );
        emit_nonempty(
            &mut map,
            "filterBySegmentation",
            self.filter_by_segmentation.to_json(),
        );
        emit_field(
            &mut map,
            "ignoreNullSegmentFilter",
            &self.ignore_null_segment_filter,
        );
        emit_field(&mut map, "shader", &self.shader);
        emit_nonempty(&mut map, "shaderControls", self.shader_controls.to_json());
        emit_field(
            &mut map,
            "swapVisbleSegmentsOnMove",
            &self.swap_visible_segments_on_move,
        );
        emit_field(&mut map, "annotationColor", &self.annotation_color);
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

impl Interpolate for AnnotationLayer {
    /// Annotation layers do not animate; the start state holds.
    fn interpolate(a: &Self, _b: &Self, _t: f64) -> Self {
        a.clone()
    }
}

/// Bare point list kept for compatibility with older states.
#[derive(Debug, Clone)]
pub struct PointAnnotationLayer {
    base: LayerBase,
    points: TypedList<[f32; 3]>,
}

impl PointAnnotationLayer {
    pub fn new() -> Self {
        PointAnnotationLayer {
            base: LayerBase::new(),
            points: TypedList::new(),
        }
    }

    layer_base_accessors!();

    pub fn points(&self) -> &TypedList<[f32; 3]> {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut TypedList<[f32; 3]> {
        &mut self.points
    }
}

impl Default for PointAnnotationLayer {
    fn default() -> Self {
        PointAnnotationLayer::new()
    }
}

impl FromJson for PointAnnotationLayer {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let points = obj.take_or_empty("points")?;
        Ok(PointAnnotationLayer {
            points,
            base: LayerBase::from_object(obj)?,
        })
    }
}

impl ToJson for PointAnnotationLayer {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "pointAnnotation");
        emit_nonempty(&mut map, "points", self.points.to_json());
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

impl Interpolate for PointAnnotationLayer {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let mut c = a.clone();
        c.base = LayerBase::interpolate(&a.base, &b.base, t);
        c
    }
}

/// A single mesh with per-vertex attributes.
#[derive(Debug, Clone)]
pub struct SingleMeshLayer {
    base: LayerBase,
    source: LayerDataSources,
    vertex_attribute_sources: Option<TypedList<String>>,
    shader: Option<String>,
    vertex_attribute_names: Option<TypedList<Option<String>>>,
}

impl SingleMeshLayer {
    pub fn new() -> Self {
        SingleMeshLayer {
            base: LayerBase::new(),
            source: LayerDataSources::new(),
            vertex_attribute_sources: None,
            shader: None,
            vertex_attribute_names: None,
        }
    }

    layer_base_accessors!();

    pub fn source(&self) -> &LayerDataSources {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut LayerDataSources {
        &mut self.source
    }

    pub fn vertex_attribute_sources(&self) -> Option<&TypedList<String>> {
        self.vertex_attribute_sources.as_ref()
    }

    pub fn set_vertex_attribute_sources(
        &mut self,
        sources: Option<TypedList<String>>,
    ) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.vertex_attribute_sources = sources;
        Ok(())
    }

    pub fn shader(&self) -> Option<&str> {
        self.shader.as_deref()
    }

    pub fn set_shader(&mut self, shader: impl Into<String>) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.shader = Some(shader.into());
        Ok(())
    }

    /// Attribute names; an entry can be null to skip a source attribute.
    pub fn vertex_attribute_names(&self) -> Option<&TypedList<Option<String>>> {
        self.vertex_attribute_names.as_ref()
    }

    pub fn set_vertex_attribute_names(
        &mut self,
        names: Option<TypedList<Option<String>>>,
    ) -> StateResult<()> {
        self.base.mode.ensure_mutable()?;
        self.vertex_attribute_names = names;
        Ok(())
    }
}

impl Default for SingleMeshLayer {
    fn default() -> Self {
        SingleMeshLayer::new()
    }
}

impl FromJson for SingleMeshLayer {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let source = obj.take_or_empty("source")?;
        let vertex_attribute_sources = obj.take("vertexAttributeSources")?;
        let shader = obj.take("shader")?;
        let vertex_attribute_names = obj.take("vertexAttributeNames")?;
        Ok(SingleMeshLayer {
            source,
            vertex_attribute_sources,
            shader,
            vertex_attribute_names,
            base: LayerBase::from_object(obj)?,
        })
    }
}

impl ToJson for SingleMeshLayer {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_kind(&mut map, "mesh");
        emit_nonempty(&mut map, "source", self.source.to_json());
        emit_field(
            &mut map,
            "vertexAttributeSources",
            &self.vertex_attribute_sources,
        );
        emit_field(&mut map, "shader", &self.shader);
        emit_field(&mut map, "vertexAttributeNames", &self.vertex_attribute_names);
        self.base.emit_into(&mut map);
        Value::Object(map)
    }
}

impl Interpolate for SingleMeshLayer {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let mut c = a.clone();
        c.base = LayerBase::interpolate(&a.base, &b.base, t);
        c
    }
}

/// Any layer kind, dispatched on the wire discriminant.
#[derive(Debug, Clone)]
pub enum Layer {
    Image(ImageLayer),
    Segmentation(SegmentationLayer),
    PointAnnotation(PointAnnotationLayer),
    Annotation(AnnotationLayer),
    Mesh(SingleMeshLayer),
}

type LayerCtor = fn(&Value, AccessMode) -> StateResult<Layer>;

const LAYER_KINDS: &[(&str, LayerCtor)] = &[
    ("image", |v, m| ImageLayer::from_json(v, m).map(Layer::Image)),
    ("segmentation", |v, m| {
        SegmentationLayer::from_json(v, m).map(Layer::Segmentation)
    }),
    ("pointAnnotation", |v, m| {
        PointAnnotationLayer::from_json(v, m).map(Layer::PointAnnotation)
    }),
    ("annotation", |v, m| {
        AnnotationLayer::from_json(v, m).map(Layer::Annotation)
    }),
    ("mesh", |v, m| {
        SingleMeshLayer::from_json(v, m).map(Layer::Mesh)
    }),
];

impl Layer {
    /// The wire discriminant of this layer.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Layer::Image(_) => "image",
            Layer::Segmentation(_) => "segmentation",
            Layer::PointAnnotation(_) => "pointAnnotation",
            Layer::Annotation(_) => "annotation",
            Layer::Mesh(_) => "mesh",
        }
    }

    pub fn base(&self) -> &LayerBase {
        match self {
            Layer::Image(l) => l.base(),
            Layer::Segmentation(l) => l.base(),
            Layer::PointAnnotation(l) => l.base(),
            Layer::Annotation(l) => l.base(),
            Layer::Mesh(l) => l.base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut LayerBase {
        match self {
            Layer::Image(l) => l.base_mut(),
            Layer::Segmentation(l) => l.base_mut(),
            Layer::PointAnnotation(l) => l.base_mut(),
            Layer::Annotation(l) => l.base_mut(),
            Layer::Mesh(l) => l.base_mut(),
        }
    }
}

impl FromJson for Layer {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| StateError::type_mismatch("object", value))?;
        let name = match map.get("type") {
            Some(Value::String(name)) => name.as_str(),
            Some(other) => return Err(StateError::type_mismatch("string", other)),
            None => return Err(StateError::missing_field("type")),
        };
        let ctor = LAYER_KINDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, ctor)| ctor)
            .ok_or_else(|| StateError::unknown_type("layer", name))?;
        ctor(value, mode)
    }
}

impl ToJson for Layer {
    fn to_json(&self) -> Value {
        match self {
            Layer::Image(l) => l.to_json(),
            Layer::Segmentation(l) => l.to_json(),
            Layer::PointAnnotation(l) => l.to_json(),
            Layer::Annotation(l) => l.to_json(),
            Layer::Mesh(l) => l.to_json(),
        }
    }
}

impl Interpolate for Layer {
    /// Same-kind layers blend per kind; mismatched kinds hold the start
    /// state.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Layer::Image(a), Layer::Image(b)) => Layer::Image(Interpolate::interpolate(a, b, t)),
            (Layer::Segmentation(a), Layer::Segmentation(b)) => {
                Layer::Segmentation(Interpolate::interpolate(a, b, t))
            }
            (Layer::PointAnnotation(a), Layer::PointAnnotation(b)) => {
                Layer::PointAnnotation(Interpolate::interpolate(a, b, t))
            }
            (Layer::Annotation(a), Layer::Annotation(b)) => {
                Layer::Annotation(Interpolate::interpolate(a, b, t))
            }
            (Layer::Mesh(a), Layer::Mesh(b)) => Layer::Mesh(Interpolate::interpolate(a, b, t)),
            _ => a.clone(),
        }
    }
}

impl From<ImageLayer> for Layer {
    fn from(layer: ImageLayer) -> Self {
        Layer::Image(layer)
    }
}

impl From<SegmentationLayer> for Layer {
    fn from(layer: SegmentationLayer) -> Self {
        Layer::Segmentation(layer)
    }
}

impl From<PointAnnotationLayer> for Layer {
    fn from(layer: PointAnnotationLayer) -> Self {
        Layer::PointAnnotation(layer)
    }
}

impl From<AnnotationLayer> for Layer {
    fn from(layer: AnnotationLayer) -> Self {
        Layer::Annotation(layer)
    }
}

impl From<SingleMeshLayer> for Layer {
    fn from(layer: SingleMeshLayer) -> Self {
        Layer::Mesh(layer)
    }
}

impl Serialize for Layer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Layer::from_json(&value, AccessMode::ReadWrite).map_err(D::Error::custom)
    }
}

impl_json_eq!(
    ImageLayer,
    SegmentationLayer,
    AnnotationLayer,
    PointAnnotationLayer,
    SingleMeshLayer,
    SkeletonRenderingOptions,
    Layer,
);
