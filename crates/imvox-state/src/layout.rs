//! Panel layout specifications
//!
//! A layout is either a named data-panel arrangement (`"xy"`, `"4panel"`,
//! ...), a row/column stack of child layouts, or a nested layer group
//! viewer with its own navigation state. The wire form of a data-panel
//! layout collapses to a bare string whenever only the name is set.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use imvox_json::{
    emit_field, emit_nonempty, impl_json_eq, AccessMode, EmptyWithMode, FromJson, JsonObject,
    StateError, StateResult, ToJson, TypedList, TypedMap,
};

use crate::interp::{interpolate_linear, Interpolate};
use crate::navigation::{
    DimensionPlaybackVelocity, LinkedDepthRange, LinkedOrientationState, LinkedPosition,
    LinkedZoomFactor,
};
use crate::tools::Tool;

/// The named data-panel arrangements.
pub const DATA_PANEL_LAYOUTS: &[&str] = &[
    "xy",
    "yz",
    "xz",
    "xy-3d",
    "yz-3d",
    "xz-3d",
    "4panel",
    "4panel-alt",
    "3d",
];

/// One pinned cross-section view.
#[derive(Debug, Clone)]
pub struct CrossSection {
    width: Option<i64>,
    height: Option<i64>,
    position: LinkedPosition,
    orientation: LinkedOrientationState,
    scale: LinkedZoomFactor,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl CrossSection {
    pub fn new() -> Self {
        CrossSection {
            width: None,
            height: None,
            position: LinkedPosition::new(),
            orientation: LinkedOrientationState::new(),
            scale: LinkedZoomFactor::new(),
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// Defaults to 1000.
    pub fn width(&self) -> i64 {
        self.width.unwrap_or(1000)
    }

    pub fn set_width(&mut self, width: i64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.width = Some(width);
        Ok(())
    }

    /// Defaults to 1000.
    pub fn height(&self) -> i64 {
        self.height.unwrap_or(1000)
    }

    pub fn set_height(&mut self, height: i64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.height = Some(height);
        Ok(())
    }

    pub fn position(&self) -> &LinkedPosition {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut LinkedPosition {
        &mut self.position
    }

    pub fn orientation(&self) -> &LinkedOrientationState {
        &self.orientation
    }

    pub fn orientation_mut(&mut self) -> &mut LinkedOrientationState {
        &mut self.orientation
    }

    pub fn scale(&self) -> &LinkedZoomFactor {
        &self.scale
    }

    pub fn scale_mut(&mut self) -> &mut LinkedZoomFactor {
        &mut self.scale
    }
}

impl Default for CrossSection {
    fn default() -> Self {
        CrossSection::new()
    }
}

impl FromJson for CrossSection {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let width = obj.take("width")?;
        let height = obj.take("height")?;
        let position = obj.take_or_empty("position")?;
        let orientation = obj.take_or_empty("orientation")?;
        let scale = obj.take_or_empty("scale")?;
        Ok(CrossSection {
            width,
            height,
            position,
            orientation,
            scale,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for CrossSection {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "width", &self.width);
        emit_field(&mut map, "height", &self.height);
        emit_nonempty(&mut map, "position", self.position.to_json());
        emit_nonempty(&mut map, "orientation", self.orientation.to_json());
        emit_nonempty(&mut map, "scale", self.scale.to_json());
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl Interpolate for CrossSection {
    /// Blending materializes every field, defaults included.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let mut c = a.clone();
        c.width = Some(interpolate_linear(a.width() as f64, b.width() as f64, t) as i64);
        c.height = Some(interpolate_linear(a.height() as f64, b.height() as f64, t) as i64);
        c.position = Interpolate::interpolate(&a.position, &b.position, t);
        c.orientation = Interpolate::interpolate(&a.orientation, &b.orientation, t);
        c.scale = Interpolate::interpolate(&a.scale, &b.scale, t);
        c
    }
}

/// Named cross-sections of a data-panel layout.
pub type CrossSectionMap = TypedMap<String, CrossSection>;

impl Interpolate for CrossSectionMap {
    /// Keys present on both sides blend; keys only in `a` are kept as-is.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        a.iter()
            .map(|(k, va)| match b.get(k) {
                Some(vb) => (k.clone(), CrossSection::interpolate(va, vb, t)),
                None => (k.clone(), va.clone()),
            })
            .collect()
    }
}

/// A named data-panel arrangement, optionally with pinned cross-sections.
#[derive(Debug, Clone)]
pub struct DataPanelLayout {
    layout_type: String,
    cross_sections: CrossSectionMap,
    orthographic_projection: Option<bool>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl DataPanelLayout {
    pub fn new(layout_type: impl Into<String>) -> Self {
        DataPanelLayout {
            layout_type: layout_type.into(),
            cross_sections: CrossSectionMap::new(),
            orthographic_projection: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn layout_type(&self) -> &str {
        &self.layout_type
    }

    pub fn set_layout_type(&mut self, layout_type: impl Into<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.layout_type = layout_type.into();
        Ok(())
    }

    pub fn cross_sections(&self) -> &CrossSectionMap {
        &self.cross_sections
    }

    pub fn cross_sections_mut(&mut self) -> &mut CrossSectionMap {
        &mut self.cross_sections
    }

    /// Defaults to false.
    pub fn orthographic_projection(&self) -> bool {
        self.orthographic_projection.unwrap_or(false)
    }

    pub fn set_orthographic_projection(&mut self, orthographic: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.orthographic_projection = Some(orthographic);
        Ok(())
    }
}

impl FromJson for DataPanelLayout {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        // Bare string shorthand for {"type": ...}.
        if let Value::String(layout_type) = value {
            return Ok(DataPanelLayout {
                layout_type: layout_type.clone(),
                cross_sections: CrossSectionMap::empty_with_mode(mode),
                orthographic_projection: None,
                extra: Map::new(),
                mode,
            });
        }
        let mut obj = JsonObject::from_value(value, mode)?;
        let layout_type = obj.require("type")?;
        let cross_sections = obj.take_or_empty("crossSections")?;
        let orthographic_projection = obj.take("orthographicProjection")?;
        Ok(DataPanelLayout {
            layout_type,
            cross_sections,
            orthographic_projection,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for DataPanelLayout {
    /// Collapses to the bare name when only the name carries information.
    fn to_json(&self) -> Value {
        if self.cross_sections.is_empty() && !self.orthographic_projection() {
            return Value::String(self.layout_type.clone());
        }
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.layout_type.clone()));
        emit_nonempty(&mut map, "crossSections", self.cross_sections.to_json());
        emit_field(
            &mut map,
            "orthographicProjection",
            &self.orthographic_projection,
        );
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl Interpolate for DataPanelLayout {
    /// Blends the cross-sections; a name mismatch or an empty start side
    /// holds the start state.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        if a.layout_type != b.layout_type || a.cross_sections.is_empty() {
            return a.clone();
        }
        let mut c = a.clone();
        c.cross_sections = Interpolate::interpolate(&a.cross_sections, &b.cross_sections, t);
        c
    }
}

/// A row or column of child layouts.
#[derive(Debug, Clone)]
pub struct StackLayout {
    stack_type: String,
    flex: Option<f64>,
    children: TypedList<Layout>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl StackLayout {
    pub fn new(stack_type: impl Into<String>, children: impl IntoIterator<Item = Layout>) -> Self {
        StackLayout {
            stack_type: stack_type.into(),
            flex: None,
            children: children.into_iter().collect(),
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn stack_type(&self) -> &str {
        &self.stack_type
    }

    /// Defaults to 1.
    pub fn flex(&self) -> f64 {
        self.flex.unwrap_or(1.0)
    }

    pub fn set_flex(&mut self, flex: f64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.flex = Some(flex);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> &TypedList<Layout> {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut TypedList<Layout> {
        &mut self.children
    }
}

/// A row-oriented stack of child layouts.
pub fn row_layout(children: impl IntoIterator<Item = Layout>) -> StackLayout {
    StackLayout::new("row", children)
}

/// A column-oriented stack of child layouts.
pub fn column_layout(children: impl IntoIterator<Item = Layout>) -> StackLayout {
    StackLayout::new("column", children)
}

impl FromJson for StackLayout {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let stack_type = obj.require("type")?;
        let flex = obj.take("flex")?;
        let children = obj.take_or_empty("children")?;
        Ok(StackLayout {
            stack_type,
            flex,
            children,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for StackLayout {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.stack_type.clone()));
        emit_field(&mut map, "flex", &self.flex);
        emit_nonempty(&mut map, "children", self.children.to_json());
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl Interpolate for StackLayout {
    /// Children blend pairwise when the two stacks have the same
    /// orientation and arity; otherwise the start state holds.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        if a.stack_type != b.stack_type || a.children.len() != b.children.len() {
            return a.clone();
        }
        let mut c = a.clone();
        c.children = a
            .children
            .iter()
            .zip(b.children.iter())
            .map(|(ca, cb)| Interpolate::interpolate(ca, cb, t))
            .collect();
        c
    }
}

/// A nested viewer showing a subset of layers with its own navigation.
#[derive(Debug, Clone)]
pub struct LayerGroupViewer {
    flex: Option<f64>,
    layers: TypedList<String>,
    layout: Option<DataPanelLayout>,
    position: LinkedPosition,
    velocity: TypedMap<String, DimensionPlaybackVelocity>,
    cross_section_orientation: LinkedOrientationState,
    cross_section_scale: LinkedZoomFactor,
    cross_section_depth: LinkedDepthRange,
    projection_orientation: LinkedOrientationState,
    projection_scale: LinkedZoomFactor,
    projection_depth: LinkedDepthRange,
    tool_bindings: TypedMap<String, Tool>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl LayerGroupViewer {
    pub fn new() -> Self {
        LayerGroupViewer {
            flex: None,
            layers: TypedList::new(),
            layout: None,
            position: LinkedPosition::new(),
            velocity: TypedMap::new(),
            cross_section_orientation: LinkedOrientationState::new(),
            cross_section_scale: LinkedZoomFactor::new(),
            cross_section_depth: LinkedDepthRange::new(),
            projection_orientation: LinkedOrientationState::new(),
            projection_scale: LinkedZoomFactor::new(),
            projection_depth: LinkedDepthRange::new(),
            tool_bindings: TypedMap::new(),
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// Defaults to 1.
    pub fn flex(&self) -> f64 {
        self.flex.unwrap_or(1.0)
    }

    pub fn set_flex(&mut self, flex: f64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.flex = Some(flex);
        Ok(())
    }

    /// Names of the layers shown in this group.
    pub fn layers(&self) -> &TypedList<String> {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut TypedList<String> {
        &mut self.layers
    }

    /// Defaults to the `"xy"` arrangement.
    pub fn layout(&self) -> DataPanelLayout {
        self.layout
            .clone()
            .unwrap_or_else(|| DataPanelLayout::new("xy"))
    }

    pub fn set_layout(&mut self, layout: DataPanelLayout) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.layout = Some(layout);
        Ok(())
    }

    pub fn position(&self) -> &LinkedPosition {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut LinkedPosition {
        &mut self.position
    }

    pub fn velocity(&self) -> &TypedMap<String, DimensionPlaybackVelocity> {
        &self.velocity
    }

    pub fn velocity_mut(&mut self) -> &mut TypedMap<String, DimensionPlaybackVelocity> {
        &mut self.velocity
    }

    pub fn cross_section_orientation(&self) -> &LinkedOrientationState {
        &self.cross_section_orientation
    }

    pub fn cross_section_orientation_mut(&mut self) -> &mut LinkedOrientationState {
        &mut self.cross_section_orientation
    }

    pub fn cross_section_scale(&self) -> &LinkedZoomFactor {
        &self.cross_section_scale
    }

    pub fn cross_section_scale_mut(&mut self) -> &mut LinkedZoomFactor {
        &mut self.cross_section_scale
    }

    pub fn cross_section_depth(&self) -> &LinkedDepthRange {
        &self.cross_section_depth
    }

    pub fn cross_section_depth_mut(&mut self) -> &mut LinkedDepthRange {
        &mut self.cross_section_depth
    }

    pub fn projection_orientation(&self) -> &LinkedOrientationState {
        &self.projection_orientation
    }

    pub fn projection_orientation_mut(&mut self) -> &mut LinkedOrientationState {
        &mut self.projection_orientation
    }

    pub fn projection_scale(&self) -> &LinkedZoomFactor {
        &self.projection_scale
    }

    pub fn projection_scale_mut(&mut self) -> &mut LinkedZoomFactor {
        &mut self.projection_scale
    }

    pub fn projection_depth(&self) -> &LinkedDepthRange {
        &self.projection_depth
    }

    pub fn projection_depth_mut(&mut self) -> &mut LinkedDepthRange {
        &mut self.projection_depth
    }

    pub fn tool_bindings(&self) -> &TypedMap<String, Tool> {
        &self.tool_bindings
    }

    pub fn tool_bindings_mut(&mut self) -> &mut TypedMap<String, Tool> {
        &mut self.tool_bindings
    }

    pub fn with_layers(mut self, layers: impl IntoIterator<Item = String>) -> Self {
        self.layers = layers.into_iter().collect();
        self
    }
}

impl Default for LayerGroupViewer {
    fn default() -> Self {
        LayerGroupViewer::new()
    }
}

impl FromJson for LayerGroupViewer {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        obj.take_value("type");
        let flex = obj.take("flex")?;
        let layers = obj.take_or_empty("layers")?;
        let layout = obj.take("layout")?;
        let position = obj.take_or_empty("position")?;
        let velocity = obj.take_or_empty("velocity")?;
        let cross_section_orientation = obj.take_or_empty("crossSectionOrientation")?;
        let cross_section_scale = obj.take_or_empty("crossSectionScale")?;
        let cross_section_depth = obj.take_or_empty("crossSectionDepth")?;
        let projection_orientation = obj.take_or_empty("projectionOrientation")?;
        let projection_scale = obj.take_or_empty("projectionScale")?;
        let projection_depth = obj.take_or_empty("projectionDepth")?;
        let tool_bindings = obj.take_or_empty("toolBindings")?;
        Ok(LayerGroupViewer {
            flex,
            layers,
            layout,
            position,
            velocity,
            cross_section_orientation,
            cross_section_scale,
            cross_section_depth,
            projection_orientation,
            projection_scale,
            projection_depth,
            tool_bindings,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for LayerGroupViewer {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String("viewer".to_string()));
        emit_field(&mut map, "flex", &self.flex);
        emit_nonempty(&mut map, "layers", self.layers.to_json());
        emit_field(&mut map, "layout", &self.layout);
        emit_nonempty(&mut map, "position", self.position.to_json());
        emit_nonempty(&mut map, "velocity", self.velocity.to_json());
        emit_nonempty(
            &mut map,
            "crossSectionOrientation",
            self.cross_section_orientation.to_json(),
        );
        emit_nonempty(
            &mut map,
            "crossSectionScale",
            self.cross_section_scale.to_json(),
        );
        emit_nonempty(
            &mut map,
            "crossSectionDepth",
            self.cross_section_depth.to_json(),
        );
        emit_nonempty(
            &mut map,
            "projectionOrientation",
            self.projection_orientation.to_json(),
        );
        emit_nonempty(&mut map, "projectionScale", self.projection_scale.to_json());
        emit_nonempty(&mut map, "projectionDepth", self.projection_depth.to_json());
        emit_nonempty(&mut map, "toolBindings", self.tool_bindings.to_json());
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl Interpolate for LayerGroupViewer {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let mut c = a.clone();
        c.layout = Some(Interpolate::interpolate(&a.layout(), &b.layout(), t));
        c.position = Interpolate::interpolate(&a.position, &b.position, t);
        c.cross_section_orientation = Interpolate::interpolate(
            &a.cross_section_orientation,
            &b.cross_section_orientation,
            t,
        );
        c.cross_section_scale =
            Interpolate::interpolate(&a.cross_section_scale, &b.cross_section_scale, t);
        c.projection_orientation = Interpolate::interpolate(
            &a.projection_orientation,
            &b.projection_orientation,
            t,
        );
        c.projection_scale =
            Interpolate::interpolate(&a.projection_scale, &b.projection_scale, t);
        c
    }
}

/// Any layout specification, dispatched on the wire discriminant.
#[derive(Debug, Clone)]
pub enum Layout {
    Stack(StackLayout),
    Group(LayerGroupViewer),
    DataPanel(DataPanelLayout),
}

type LayoutCtor = fn(&Value, AccessMode) -> StateResult<Layout>;

fn stack_ctor(value: &Value, mode: AccessMode) -> StateResult<Layout> {
    StackLayout::from_json(value, mode).map(Layout::Stack)
}

fn group_ctor(value: &Value, mode: AccessMode) -> StateResult<Layout> {
    LayerGroupViewer::from_json(value, mode).map(Layout::Group)
}

fn panel_ctor(value: &Value, mode: AccessMode) -> StateResult<Layout> {
    DataPanelLayout::from_json(value, mode).map(Layout::DataPanel)
}

const LAYOUT_KINDS: &[(&str, LayoutCtor)] = &[
    ("row", stack_ctor),
    ("column", stack_ctor),
    ("viewer", group_ctor),
    ("xy", panel_ctor),
    ("yz", panel_ctor),
    ("xz", panel_ctor),
    ("xy-3d", panel_ctor),
    ("yz-3d", panel_ctor),
    ("xz-3d", panel_ctor),
    ("4panel", panel_ctor),
    ("4panel-alt", panel_ctor),
    ("3d", panel_ctor),
];

impl Layout {
    /// The wire discriminant of this layout.
    pub fn kind_name(&self) -> &str {
        match self {
            Layout::Stack(stack) => stack.stack_type(),
            Layout::Group(_) => "viewer",
            Layout::DataPanel(panel) => panel.layout_type(),
        }
    }

    fn dispatch(name: &str, value: &Value, mode: AccessMode) -> StateResult<Self> {
        let ctor = LAYOUT_KINDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, ctor)| ctor)
            .ok_or_else(|| StateError::unknown_type("layout", name))?;
        ctor(value, mode)
    }
}

impl FromJson for Layout {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::String(name) => {
                // A bare name is shorthand for an object carrying only the
                // discriminant.
                let mut synthetic = Map::new();
                synthetic.insert("type".to_string(), Value::String(name.clone()));
                Layout::dispatch(name, &Value::Object(synthetic), mode)
            }
            Value::Object(map) => {
                let name = match map.get("type") {
                    Some(Value::String(name)) => name.as_str(),
                    Some(other) => return Err(StateError::type_mismatch("string", other)),
                    None => return Err(StateError::missing_field("type")),
                };
                Layout::dispatch(name, value, mode)
            }
            _ => Err(StateError::type_mismatch("layout name or object", value)),
        }
    }
}

impl ToJson for Layout {
    fn to_json(&self) -> Value {
        match self {
            Layout::Stack(stack) => stack.to_json(),
            Layout::Group(group) => group.to_json(),
            Layout::DataPanel(panel) => panel.to_json(),
        }
    }
}

impl Interpolate for Layout {
    /// Same-kind layouts blend per kind; mismatched kinds hold the start
    /// state.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Layout::Stack(a), Layout::Stack(b)) => {
                Layout::Stack(Interpolate::interpolate(a, b, t))
            }
            (Layout::Group(a), Layout::Group(b)) => {
                Layout::Group(Interpolate::interpolate(a, b, t))
            }
            (Layout::DataPanel(a), Layout::DataPanel(b)) => {
                Layout::DataPanel(Interpolate::interpolate(a, b, t))
            }
            _ => a.clone(),
        }
    }
}

impl From<StackLayout> for Layout {
    fn from(layout: StackLayout) -> Self {
        Layout::Stack(layout)
    }
}

impl From<LayerGroupViewer> for Layout {
    fn from(viewer: LayerGroupViewer) -> Self {
        Layout::Group(viewer)
    }
}

impl From<DataPanelLayout> for Layout {
    fn from(panel: DataPanelLayout) -> Self {
        Layout::DataPanel(panel)
    }
}

impl Serialize for Layout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Layout::from_json(&value, AccessMode::ReadWrite).map_err(D::Error::custom)
    }
}

impl_json_eq!(CrossSection, DataPanelLayout, StackLayout, LayerGroupViewer, Layout);
