//! The top-level viewer state tree.
//!
//! `ViewerState` aggregates global navigation, rendering toggles, the
//! layer list, the panel layout, and the side-panel states. Every field
//! is optional on the wire; an untouched state round-trips as `{}`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use imvox_json::{
    emit_field, emit_nonempty, impl_json_eq, AccessMode, FromJson, JsonObject, StateResult, ToJson,
    TypedList, TypedMap,
};

use crate::coords::CoordinateSpace;
use crate::interp::{
    interpolate_linear_optional_vectors, interpolate_zoom, quaternion_slerp, Interpolate,
};
use crate::layout::{DataPanelLayout, Layout};
use crate::managed::Layers;
use crate::navigation::DimensionPlaybackVelocity;
use crate::panels::{
    HelpPanelState, LayerListPanelState, SelectedLayerState, StatisticsDisplayState, ToolPalette,
};
use crate::tools::Tool;

/// Complete state of a viewer, shareable as one JSON object.
#[derive(Debug, Clone)]
pub struct ViewerState {
    title: Option<String>,
    dimensions: CoordinateSpace,
    relative_display_scales: Option<TypedMap<String, f64>>,
    display_dimensions: Option<TypedList<String>>,
    position: Option<Vec<f32>>,
    velocity: TypedMap<String, DimensionPlaybackVelocity>,
    cross_section_orientation: Option<[f32; 4]>,
    cross_section_scale: Option<f64>,
    cross_section_depth: Option<f64>,
    projection_scale: Option<f64>,
    projection_depth: Option<f64>,
    projection_orientation: Option<[f32; 4]>,
    show_slices: Option<bool>,
    hide_cross_section_background_3d: Option<bool>,
    show_axis_lines: Option<bool>,
    wire_frame: Option<bool>,
    enable_adaptive_downsampling: Option<bool>,
    show_scale_bar: Option<bool>,
    show_default_annotations: Option<bool>,
    gpu_memory_limit: Option<i64>,
    system_memory_limit: Option<i64>,
    concurrent_downloads: Option<i64>,
    prefetch: Option<bool>,
    layers: Layers,
    layout: Option<Layout>,
    cross_section_background_color: Option<String>,
    projection_background_color: Option<String>,
    selected_layer: SelectedLayerState,
    statistics: StatisticsDisplayState,
    help_panel: HelpPanelState,
    layer_list_panel: LayerListPanelState,
    partial_viewport: Option<[f64; 4]>,
    tool_bindings: TypedMap<String, Tool>,
    tool_palettes: TypedMap<String, ToolPalette>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl ViewerState {
    pub fn new() -> Self {
        ViewerState {
            title: None,
            dimensions: CoordinateSpace::new(),
            relative_display_scales: None,
            display_dimensions: None,
            position: None,
            velocity: TypedMap::new(),
            cross_section_orientation: None,
            cross_section_scale: None,
            cross_section_depth: None,
            projection_scale: None,
            projection_depth: None,
            projection_orientation: None,
            show_slices: None,
            hide_cross_section_background_3d: None,
            show_axis_lines: None,
            wire_frame: None,
            enable_adaptive_downsampling: None,
            show_scale_bar: None,
            show_default_annotations: None,
            gpu_memory_limit: None,
            system_memory_limit: None,
            concurrent_downloads: None,
            prefetch: None,
            layers: Layers::new(),
            layout: None,
            cross_section_background_color: None,
            projection_background_color: None,
            selected_layer: SelectedLayerState::new(),
            statistics: StatisticsDisplayState::new(),
            help_panel: HelpPanelState::new(),
            layer_list_panel: LayerListPanelState::new(),
            partial_viewport: None,
            tool_bindings: TypedMap::new(),
            tool_palettes: TypedMap::new(),
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.title = title;
        Ok(())
    }

    /// Global coordinate space shared by all layers.
    pub fn dimensions(&self) -> &CoordinateSpace {
        &self.dimensions
    }

    pub fn dimensions_mut(&mut self) -> &mut CoordinateSpace {
        &mut self.dimensions
    }

    pub fn set_dimensions(&mut self, dimensions: CoordinateSpace) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.dimensions = dimensions;
        Ok(())
    }

    pub fn relative_display_scales(&self) -> Option<&TypedMap<String, f64>> {
        self.relative_display_scales.as_ref()
    }

    pub fn set_relative_display_scales(
        &mut self,
        scales: Option<TypedMap<String, f64>>,
    ) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.relative_display_scales = scales;
        Ok(())
    }

    pub fn display_dimensions(&self) -> Option<&TypedList<String>> {
        self.display_dimensions.as_ref()
    }

    pub fn set_display_dimensions(
        &mut self,
        dimensions: Option<TypedList<String>>,
    ) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.display_dimensions = dimensions;
        Ok(())
    }

    /// Global position within [`dimensions`](ViewerState::dimensions).
    pub fn position(&self) -> Option<&Vec<f32>> {
        self.position.as_ref()
    }

    pub fn set_position(&mut self, position: Option<Vec<f32>>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.position = position;
        Ok(())
    }

    pub fn velocity(&self) -> &TypedMap<String, DimensionPlaybackVelocity> {
        &self.velocity
    }

    pub fn velocity_mut(&mut self) -> &mut TypedMap<String, DimensionPlaybackVelocity> {
        &mut self.velocity
    }

    pub fn cross_section_orientation(&self) -> Option<[f32; 4]> {
        self.cross_section_orientation
    }

    pub fn set_cross_section_orientation(
        &mut self,
        orientation: Option<[f32; 4]>,
    ) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.cross_section_orientation = orientation;
        Ok(())
    }

    pub fn cross_section_scale(&self) -> Option<f64> {
        self.cross_section_scale
    }

    pub fn set_cross_section_scale(&mut self, scale: Option<f64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.cross_section_scale = scale;
        Ok(())
    }

    pub fn cross_section_depth(&self) -> Option<f64> {
        self.cross_section_depth
    }

    pub fn set_cross_section_depth(&mut self, depth: Option<f64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.cross_section_depth = depth;
        Ok(())
    }

    pub fn projection_scale(&self) -> Option<f64> {
        self.projection_scale
    }

    pub fn set_projection_scale(&mut self, scale: Option<f64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.projection_scale = scale;
        Ok(())
    }

    pub fn projection_depth(&self) -> Option<f64> {
        self.projection_depth
    }

    pub fn set_projection_depth(&mut self, depth: Option<f64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.projection_depth = depth;
        Ok(())
    }

    pub fn projection_orientation(&self) -> Option<[f32; 4]> {
        self.projection_orientation
    }

    pub fn set_projection_orientation(&mut self, orientation: Option<[f32; 4]>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.projection_orientation = orientation;
        Ok(())
    }

    /// Defaults to true.
    pub fn show_slices(&self) -> bool {
        self.show_slices.unwrap_or(true)
    }

    pub fn set_show_slices(&mut self, show: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.show_slices = Some(show);
        Ok(())
    }

    /// Defaults to false.
    pub fn hide_cross_section_background_3d(&self) -> bool {
        self.hide_cross_section_background_3d.unwrap_or(false)
    }

    pub fn set_hide_cross_section_background_3d(&mut self, hide: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.hide_cross_section_background_3d = Some(hide);
        Ok(())
    }

    /// Defaults to true.
    pub fn show_axis_lines(&self) -> bool {
        self.show_axis_lines.unwrap_or(true)
    }

    pub fn set_show_axis_lines(&mut self, show: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.show_axis_lines = Some(show);
        Ok(())
    }

    /// Defaults to false.
    pub fn wire_frame(&self) -> bool {
        self.wire_frame.unwrap_or(false)
    }

    pub fn set_wire_frame(&mut self, wire_frame: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.wire_frame = Some(wire_frame);
        Ok(())
    }

    /// Defaults to true.
    pub fn enable_adaptive_downsampling(&self) -> bool {
        self.enable_adaptive_downsampling.unwrap_or(true)
    }

    pub fn set_enable_adaptive_downsampling(&mut self, enable: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.enable_adaptive_downsampling = Some(enable);
        Ok(())
    }

    /// Defaults to true.
    pub fn show_scale_bar(&self) -> bool {
        self.show_scale_bar.unwrap_or(true)
    }

    pub fn set_show_scale_bar(&mut self, show: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.show_scale_bar = Some(show);
        Ok(())
    }

    /// Defaults to true.
    pub fn show_default_annotations(&self) -> bool {
        self.show_default_annotations.unwrap_or(true)
    }

    pub fn set_show_default_annotations(&mut self, show: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.show_default_annotations = Some(show);
        Ok(())
    }

    pub fn gpu_memory_limit(&self) -> Option<i64> {
        self.gpu_memory_limit
    }

    pub fn set_gpu_memory_limit(&mut self, limit: Option<i64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.gpu_memory_limit = limit;
        Ok(())
    }

    pub fn system_memory_limit(&self) -> Option<i64> {
        self.system_memory_limit
    }

    pub fn set_system_memory_limit(&mut self, limit: Option<i64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.system_memory_limit = limit;
        Ok(())
    }

    pub fn concurrent_downloads(&self) -> Option<i64> {
        self.concurrent_downloads
    }

    pub fn set_concurrent_downloads(&mut self, downloads: Option<i64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.concurrent_downloads = downloads;
        Ok(())
    }

    /// Defaults to true.
    pub fn prefetch(&self) -> bool {
        self.prefetch.unwrap_or(true)
    }

    pub fn set_prefetch(&mut self, prefetch: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.prefetch = Some(prefetch);
        Ok(())
    }

    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut Layers {
        &mut self.layers
    }

    pub fn set_layers(&mut self, layers: Layers) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.layers = layers;
        Ok(())
    }

    /// Defaults to the `"4panel"` arrangement.
    pub fn layout(&self) -> Layout {
        self.layout
            .clone()
            .unwrap_or_else(|| Layout::DataPanel(DataPanelLayout::new("4panel")))
    }

    pub fn set_layout(&mut self, layout: impl Into<Layout>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.layout = Some(layout.into());
        Ok(())
    }

    pub fn cross_section_background_color(&self) -> Option<&str> {
        self.cross_section_background_color.as_deref()
    }

    pub fn set_cross_section_background_color(&mut self, color: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.cross_section_background_color = color;
        Ok(())
    }

    pub fn projection_background_color(&self) -> Option<&str> {
        self.projection_background_color.as_deref()
    }

    pub fn set_projection_background_color(&mut self, color: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.projection_background_color = color;
        Ok(())
    }

    pub fn selected_layer(&self) -> &SelectedLayerState {
        &self.selected_layer
    }

    pub fn selected_layer_mut(&mut self) -> &mut SelectedLayerState {
        &mut self.selected_layer
    }

    pub fn statistics(&self) -> &StatisticsDisplayState {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut StatisticsDisplayState {
        &mut self.statistics
    }

    pub fn help_panel(&self) -> &HelpPanelState {
        &self.help_panel
    }

    pub fn help_panel_mut(&mut self) -> &mut HelpPanelState {
        &mut self.help_panel
    }

    pub fn layer_list_panel(&self) -> &LayerListPanelState {
        &self.layer_list_panel
    }

    pub fn layer_list_panel_mut(&mut self) -> &mut LayerListPanelState {
        &mut self.layer_list_panel
    }

    /// Fraction of the viewport this state occupies, as
    /// `[left, top, width, height]`. Defaults to the full viewport.
    pub fn partial_viewport(&self) -> [f64; 4] {
        self.partial_viewport.unwrap_or([0.0, 0.0, 1.0, 1.0])
    }

    pub fn set_partial_viewport(&mut self, viewport: [f64; 4]) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.partial_viewport = Some(viewport);
        Ok(())
    }

    pub fn tool_bindings(&self) -> &TypedMap<String, Tool> {
        &self.tool_bindings
    }

    pub fn tool_bindings_mut(&mut self) -> &mut TypedMap<String, Tool> {
        &mut self.tool_bindings
    }

    pub fn tool_palettes(&self) -> &TypedMap<String, ToolPalette> {
        &self.tool_palettes
    }

    pub fn tool_palettes_mut(&mut self) -> &mut TypedMap<String, ToolPalette> {
        &mut self.tool_palettes
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        ViewerState::new()
    }
}

impl FromJson for ViewerState {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let title = obj.take("title")?;
        let dimensions = obj.take_or_empty("dimensions")?;
        let relative_display_scales = obj.take("relativeDisplayScales")?;
        let display_dimensions = obj.take("displayDimensions")?;
        let position = obj.take("position")?;
        let velocity = obj.take_or_empty("velocity")?;
        let cross_section_orientation = obj.take("crossSectionOrientation")?;
        let cross_section_scale = obj.take("crossSectionScale")?;
        let cross_section_depth = obj.take("crossSectionDepth")?;
        let projection_scale = obj.take("projectionScale")?;
        let projection_depth = obj.take("projectionDepth")?;
        let projection_orientation = obj.take("projectionOrientation")?;
        let show_slices = obj.take("showSlices")?;
        let hide_cross_section_background_3d = obj.take("hideCrossSectionBackground3D")?;
        let show_axis_lines = obj.take("showAxisLines")?;
        let wire_frame = obj.take("wireFrame")?;
        let enable_adaptive_downsampling = obj.take("enableAdaptiveDownsampling")?;
        let show_scale_bar = obj.take("showScaleBar")?;
        let show_default_annotations = obj.take("showDefaultAnnotations")?;
        let gpu_memory_limit = obj.take("gpuMemoryLimit")?;
        let system_memory_limit = obj.take("systemMemoryLimit")?;
        let concurrent_downloads = obj.take("concurrentDownloads")?;
        let prefetch = obj.take("prefetch")?;
        let layers = obj.take_or_empty("layers")?;
        let layout = obj.take("layout")?;
        let cross_section_background_color = obj.take("crossSectionBackgroundColor")?;
        let projection_background_color = obj.take("projectionBackgroundColor")?;
        let selected_layer = obj.take_or_empty("selectedLayer")?;
        let statistics = obj.take_or_empty("statistics")?;
        let help_panel = obj.take_or_empty("helpPanel")?;
        let layer_list_panel = obj.take_or_empty("layerListPanel")?;
        let partial_viewport = obj.take("partialViewport")?;
        let tool_bindings = obj.take_or_empty("toolBindings")?;
        let tool_palettes = obj.take_or_empty("toolPalettes")?;
        Ok(ViewerState {
            title,
            dimensions,
            relative_display_scales,
            display_dimensions,
            position,
            velocity,
            cross_section_orientation,
            cross_section_scale,
            cross_section_depth,
            projection_scale,
            projection_depth,
            projection_orientation,
            show_slices,
            hide_cross_section_background_3d,
            show_axis_lines,
            wire_frame,
            enable_adaptive_downsampling,
            show_scale_bar,
            show_default_annotations,
            gpu_memory_limit,
            system_memory_limit,
            concurrent_downloads,
            prefetch,
            layers,
            layout,
            cross_section_background_color,
            projection_background_color,
            selected_layer,
            statistics,
            help_panel,
            layer_list_panel,
            partial_viewport,
            tool_bindings,
            tool_palettes,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for ViewerState {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "title", &self.title);
        emit_nonempty(&mut map, "dimensions", self.dimensions.to_json());
        emit_field(
            &mut map,
            "relativeDisplayScales",
            &self.relative_display_scales,
        );
        emit_field(&mut map, "displayDimensions", &self.display_dimensions);
        emit_field(&mut map, "position", &self.position);
        emit_nonempty(&mut map, "velocity", self.velocity.to_json());
        emit_field(
            &mut map,
            "crossSectionOrientation",
            &self.cross_section_orientation,
        );
        emit_field(&mut map, "crossSectionScale", &self.cross_section_scale);
        emit_field(&mut map, "crossSectionDepth", &self.cross_section_depth);
        emit_field(&mut map, "projectionScale", &self.projection_scale);
        emit_field(&mut map, "projectionDepth", &self.projection_depth);
        emit_field(
            &mut map,
            "projectionOrientation",
            &self.projection_orientation,
        );
        emit_field(&mut map, "showSlices", &self.show_slices);
        emit_field(
            &mut map,
            "hideCrossSectionBackground3D",
            &self.hide_cross_section_background_3d,
        );
        emit_field(&mut map, "showAxisLines", &self.show_axis_lines);
        emit_field(&mut map, "wireFrame", &self.wire_frame);
        emit_field(
            &mut map,
            "enableAdaptiveDownsampling",
            &self.enable_adaptive_downsampling,
        );
        emit_field(&mut map, "showScaleBar", &self.show_scale_bar);
        emit_field(
            &mut map,
            "showDefaultAnnotations",
            &self.show_default_annotations,
        );
        emit_field(&mut map, "gpuMemoryLimit", &self.gpu_memory_limit);
        emit_field(&mut map, "systemMemoryLimit", &self.system_memory_limit);
        emit_field(&mut map, "concurrentDownloads", &self.concurrent_downloads);
        emit_field(&mut map, "prefetch", &self.prefetch);
        emit_nonempty(&mut map, "layers", self.layers.to_json());
        emit_field(&mut map, "layout", &self.layout);
        emit_field(
            &mut map,
            "crossSectionBackgroundColor",
            &self.cross_section_background_color,
        );
        emit_field(
            &mut map,
            "projectionBackgroundColor",
            &self.projection_background_color,
        );
        emit_nonempty(&mut map, "selectedLayer", self.selected_layer.to_json());
        emit_nonempty(&mut map, "statistics", self.statistics.to_json());
        emit_nonempty(&mut map, "helpPanel", self.help_panel.to_json());
        emit_nonempty(&mut map, "layerListPanel", self.layer_list_panel.to_json());
        emit_field(&mut map, "partialViewport", &self.partial_viewport);
        emit_nonempty(&mut map, "toolBindings", self.tool_bindings.to_json());
        emit_nonempty(&mut map, "toolPalettes", self.tool_palettes.to_json());
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl Interpolate for ViewerState {
    /// Blends navigation, the layer list, and the layout; every other
    /// field holds the start state.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let mut c = a.clone();
        c.position =
            interpolate_linear_optional_vectors(a.position.as_ref(), b.position.as_ref(), t);
        c.projection_scale = interpolate_zoom(a.projection_scale, b.projection_scale, t);
        c.projection_orientation = Some(quaternion_slerp(
            a.projection_orientation.as_ref(),
            b.projection_orientation.as_ref(),
            t,
        ));
        c.cross_section_scale = interpolate_zoom(a.cross_section_scale, b.cross_section_scale, t);
        c.cross_section_orientation = Some(quaternion_slerp(
            a.cross_section_orientation.as_ref(),
            b.cross_section_orientation.as_ref(),
            t,
        ));
        c.layers = Interpolate::interpolate(&a.layers, &b.layers, t);
        c.layout = Some(Interpolate::interpolate(&a.layout(), &b.layout(), t));
        c
    }
}

impl Serialize for ViewerState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ViewerState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ViewerState::from_json(&value, AccessMode::ReadWrite).map_err(D::Error::custom)
    }
}

impl_json_eq!(ViewerState);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{ImageLayer, Layer};
    use crate::managed::ManagedLayer;
    use imvox_json::StateError;
    use serde_json::json;

    #[test]
    fn test_empty_state() {
        let state = ViewerState::new();
        assert_eq!(state.to_json(), json!({}));
        assert!(state.show_slices());
        assert!(state.prefetch());
        assert!(!state.wire_frame());
        assert_eq!(state.partial_viewport(), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(state.gpu_memory_limit(), None);
        assert_eq!(state.layout().kind_name(), "4panel");
    }

    #[test]
    fn test_full_round_trip() {
        let input = json!({
            "title": "cutout",
            "dimensions": {
                "x": [4e-9, "m"],
                "y": [4e-9, "m"],
                "z": [4e-8, "m"],
            },
            "position": [1500.0, 1500.0, 75.0],
            "velocity": {"z": {"velocity": 20.0}},
            "crossSectionScale": 2.0,
            "projectionScale": 1024.0,
            "projectionOrientation": [0.0, 0.0, 0.0, 1.0],
            "showSlices": false,
            "gpuMemoryLimit": 2000000000i64,
            "prefetch": false,
            "layers": [
                {
                    "type": "image",
                    "source": "zarr://s3://bucket/raw",
                    "name": "raw",
                    "opacity": 0.75,
                },
                {
                    "type": "segmentation",
                    "source": "precomputed://gs://bucket/seg",
                    "name": "seg",
                    "segments": ["5", "11"],
                    "visible": false,
                },
            ],
            "layout": "xy-3d",
            "selectedLayer": {"layer": "seg", "visible": true},
            "partialViewport": [0.0, 0.0, 0.5, 1.0],
            "sessionNote": {"keep": "me"},
        });
        let state = ViewerState::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(state.title(), Some("cutout"));
        assert!(!state.show_slices());
        assert!(!state.prefetch());
        assert_eq!(state.cross_section_scale(), Some(2.0));
        assert_eq!(state.layers().len(), 2);
        assert!(!state.layers().get("seg").unwrap().visible());
        assert_eq!(state.layout().kind_name(), "xy-3d");
        assert_eq!(state.selected_layer().layer(), Some("seg"));
        assert_eq!(state.selected_layer().location().visible(), Some(true));
        assert_eq!(state.partial_viewport(), [0.0, 0.0, 0.5, 1.0]);
        assert_eq!(state.to_json(), input);
    }

    #[test]
    fn test_layers_object_form_normalizes_to_array() {
        let state = ViewerState::from_json(
            &json!({"layers": {"raw": {"type": "image"}}}),
            AccessMode::ReadWrite,
        )
        .unwrap();
        assert_eq!(
            state.to_json(),
            json!({"layers": [{"type": "image", "name": "raw"}]})
        );
    }

    #[test]
    fn test_layout_stays_off_wire_until_touched() {
        let mut state = ViewerState::new();
        assert_eq!(state.layout().kind_name(), "4panel");
        assert_eq!(state.to_json(), json!({}));

        state.set_layout(DataPanelLayout::new("3d")).unwrap();
        assert_eq!(state.to_json(), json!({"layout": "3d"}));
    }

    #[test]
    fn test_mutation_through_accessors() {
        let mut state = ViewerState::new();
        state.set_title(Some("session".to_string())).unwrap();
        state
            .layers_mut()
            .append(ManagedLayer::new("raw", ImageLayer::new()))
            .unwrap();
        state.set_show_axis_lines(false).unwrap();
        state.selected_layer_mut().set_layer(Some("raw".to_string())).unwrap();
        assert_eq!(
            state.to_json(),
            json!({
                "title": "session",
                "showAxisLines": false,
                "layers": [{"type": "image", "name": "raw"}],
                "selectedLayer": {"layer": "raw"},
            })
        );
    }

    #[test]
    fn test_interpolation_blends_navigation_and_layers() {
        let a = ViewerState::from_json(
            &json!({
                "title": "start",
                "position": [0.0, 0.0, 0.0],
                "projectionScale": 1.0,
                "layers": [{"type": "image", "name": "raw", "opacity": 0.25}],
            }),
            AccessMode::ReadWrite,
        )
        .unwrap();
        let b = ViewerState::from_json(
            &json!({
                "title": "end",
                "position": [10.0, 20.0, 40.0],
                "projectionScale": 4.0,
                "layers": [{"type": "image", "name": "raw", "opacity": 0.75}],
            }),
            AccessMode::ReadWrite,
        )
        .unwrap();
        let c = ViewerState::interpolate(&a, &b, 0.5);
        assert_eq!(c.position(), Some(&vec![5.0, 10.0, 20.0]));
        // Zoom factors blend in log space.
        assert_eq!(c.projection_scale(), Some(2.0));
        // Orientations materialize, defaulting to the identity rotation.
        assert_eq!(c.projection_orientation(), Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(c.cross_section_orientation(), Some([0.0, 0.0, 0.0, 1.0]));
        let opacity = match c.layers().get("raw").unwrap().layer() {
            Layer::Image(image) => image.opacity(),
            other => panic!("wrong kind: {:?}", other.kind_name()),
        };
        assert_eq!(opacity, 0.5);
        // The layout getter default becomes explicit.
        assert_eq!(c.to_json()["layout"], json!("4panel"));
        // Non-animated fields hold the start state.
        assert_eq!(c.title(), Some("start"));
    }

    #[test]
    fn test_read_only_state() {
        let mut state = ViewerState::from_json(
            &json!({
                "position": [1.0, 2.0, 3.0],
                "layers": [{"type": "image", "name": "raw"}],
            }),
            AccessMode::ReadOnly,
        )
        .unwrap();
        assert_eq!(
            state.set_title(Some("x".to_string())),
            Err(StateError::ReadOnly)
        );
        assert_eq!(state.set_show_slices(false), Err(StateError::ReadOnly));
        assert_eq!(
            state
                .layers_mut()
                .append(ManagedLayer::new("x", ImageLayer::new())),
            Err(StateError::ReadOnly)
        );
        assert_eq!(
            state.selected_layer_mut().set_layer(None),
            Err(StateError::ReadOnly)
        );
        // Absent subtrees decode read-only as well.
        assert!(state.tool_palettes_mut().insert("p".to_string(), ToolPalette::new()).is_err());
    }

    #[test]
    fn test_serde_bridge() {
        let state = ViewerState::from_json(
            &json!({"layers": [{"type": "image", "name": "raw"}]}),
            AccessMode::ReadWrite,
        )
        .unwrap();
        let text = serde_json::to_string(&state).unwrap();
        let back: ViewerState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, state);
    }
}
