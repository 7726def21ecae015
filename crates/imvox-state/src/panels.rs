//! Dockable side panel states
//!
//! Every panel shares the same placement fields (side, size, flex, grid
//! cell); the concrete panels add their own payload on top.

use serde_json::{Map, Value};

use imvox_json::{
    emit_field, emit_nonempty, impl_json_eq, AccessMode, EmptyWithMode, FromJson, JsonObject,
    StateResult, ToJson, TypedList, TypedSet,
};

use crate::tools::Tool;

/// Placement of a dockable panel.
#[derive(Debug, Clone)]
pub struct SidePanelLocation {
    side: Option<String>,
    visible: Option<bool>,
    size: Option<i64>,
    flex: Option<f64>,
    row: Option<i64>,
    col: Option<i64>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl SidePanelLocation {
    fn new() -> Self {
        SidePanelLocation {
            side: None,
            visible: None,
            size: None,
            flex: None,
            row: None,
            col: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    fn from_object(mut obj: JsonObject) -> StateResult<Self> {
        let mode = obj.mode();
        let side = obj.take("side")?;
        let visible = obj.take("visible")?;
        let size = obj.take("size")?;
        let flex = obj.take("flex")?;
        let row = obj.take("row")?;
        let col = obj.take("col")?;
        Ok(SidePanelLocation {
            side,
            visible,
            size,
            flex,
            row,
            col,
            extra: obj.into_extra(),
            mode,
        })
    }

    fn emit_into(&self, map: &mut Map<String, Value>) {
        emit_field(map, "side", &self.side);
        emit_field(map, "visible", &self.visible);
        emit_field(map, "size", &self.size);
        emit_field(map, "flex", &self.flex);
        emit_field(map, "row", &self.row);
        emit_field(map, "col", &self.col);
        imvox_json::extend_extra(map, &self.extra);
    }

    pub fn side(&self) -> Option<&str> {
        self.side.as_deref()
    }

    pub fn set_side(&mut self, side: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.side = side;
        Ok(())
    }

    pub fn visible(&self) -> Option<bool> {
        self.visible
    }

    pub fn set_visible(&mut self, visible: Option<bool>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.visible = visible;
        Ok(())
    }

    /// Size along the docked axis, in pixels.
    pub fn size(&self) -> Option<i64> {
        self.size
    }

    pub fn set_size(&mut self, size: Option<i64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.size = size;
        Ok(())
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

    pub fn row(&self) -> Option<i64> {
        self.row
    }

    pub fn set_row(&mut self, row: Option<i64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.row = row;
        Ok(())
    }

    pub fn col(&self) -> Option<i64> {
        self.col
    }

    pub fn set_col(&mut self, col: Option<i64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.col = col;
        Ok(())
    }
}

impl EmptyWithMode for SidePanelLocation {
    fn empty_with_mode(mode: AccessMode) -> Self {
        SidePanelLocation {
            mode,
            ..SidePanelLocation::new()
        }
    }
}

macro_rules! panel_location_accessors {
    () => {
        pub fn location(&self) -> &SidePanelLocation {
            &self.location
        }

        pub fn location_mut(&mut self) -> &mut SidePanelLocation {
            &mut self.location
        }
    };
}

/// Panel showing the currently selected layer.
#[derive(Debug, Clone, Default)]
pub struct SelectedLayerState {
    location: SidePanelLocation,
    layer: Option<String>,
}

impl SelectedLayerState {
    pub fn new() -> Self {
        SelectedLayerState::default()
    }

    panel_location_accessors!();

    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn set_layer(&mut self, layer: Option<String>) -> StateResult<()> {
        self.location.mode.ensure_mutable()?;
        self.layer = layer;
        Ok(())
    }
}

impl EmptyWithMode for SelectedLayerState {
    fn empty_with_mode(mode: AccessMode) -> Self {
        SelectedLayerState {
            location: SidePanelLocation::empty_with_mode(mode),
            layer: None,
        }
    }
}

impl FromJson for SelectedLayerState {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let layer = obj.take("layer")?;
        Ok(SelectedLayerState {
            layer,
            location: SidePanelLocation::from_object(obj)?,
        })
    }
}

impl ToJson for SelectedLayerState {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "layer", &self.layer);
        self.location.emit_into(&mut map);
        Value::Object(map)
    }
}

/// Per-layer side panel with its selected and pinned tabs.
#[derive(Debug, Clone, Default)]
pub struct LayerSidePanelState {
    location: SidePanelLocation,
    tab: Option<String>,
    tabs: TypedSet<String>,
}

impl LayerSidePanelState {
    pub fn new() -> Self {
        LayerSidePanelState::default()
    }

    panel_location_accessors!();

    pub fn tab(&self) -> Option<&str> {
        self.tab.as_deref()
    }

    pub fn set_tab(&mut self, tab: Option<String>) -> StateResult<()> {
        self.location.mode.ensure_mutable()?;
        self.tab = tab;
        Ok(())
    }

    pub fn tabs(&self) -> &TypedSet<String> {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TypedSet<String> {
        &mut self.tabs
    }
}

impl FromJson for LayerSidePanelState {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let tab = obj.take("tab")?;
        let tabs = obj.take_or_empty("tabs")?;
        Ok(LayerSidePanelState {
            tab,
            tabs,
            location: SidePanelLocation::from_object(obj)?,
        })
    }
}

impl ToJson for LayerSidePanelState {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "tab", &self.tab);
        emit_nonempty(&mut map, "tabs", self.tabs.to_json());
        self.location.emit_into(&mut map);
        Value::Object(map)
    }
}

/// Panel of pinned tools.
#[derive(Debug, Clone, Default)]
pub struct ToolPalette {
    location: SidePanelLocation,
    tools: TypedList<Tool>,
    query: Option<String>,
}

impl ToolPalette {
    pub fn new() -> Self {
        ToolPalette::default()
    }

    panel_location_accessors!();

    pub fn tools(&self) -> &TypedList<Tool> {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut TypedList<Tool> {
        &mut self.tools
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn set_query(&mut self, query: Option<String>) -> StateResult<()> {
        self.location.mode.ensure_mutable()?;
        self.query = query;
        Ok(())
    }
}

impl FromJson for ToolPalette {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let tools = obj.take_or_empty("tools")?;
        let query = obj.take("query")?;
        Ok(ToolPalette {
            tools,
            query,
            location: SidePanelLocation::from_object(obj)?,
        })
    }
}

impl ToJson for ToolPalette {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_nonempty(&mut map, "tools", self.tools.to_json());
        emit_field(&mut map, "query", &self.query);
        self.location.emit_into(&mut map);
        Value::Object(map)
    }
}

macro_rules! plain_panel_state {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            location: SidePanelLocation,
        }

        impl $name {
            pub fn new() -> Self {
                $name::default()
            }

            panel_location_accessors!();
        }

        impl EmptyWithMode for $name {
            fn empty_with_mode(mode: AccessMode) -> Self {
                $name {
                    location: SidePanelLocation::empty_with_mode(mode),
                }
            }
        }

        impl FromJson for $name {
            fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
                let obj = JsonObject::from_value(value, mode)?;
                Ok($name {
                    location: SidePanelLocation::from_object(obj)?,
                })
            }
        }

        impl ToJson for $name {
            fn to_json(&self) -> Value {
                let mut map = Map::new();
                self.location.emit_into(&mut map);
                Value::Object(map)
            }
        }
    };
}

plain_panel_state!(
    /// Panel showing download and processing statistics.
    StatisticsDisplayState
);
plain_panel_state!(
    /// Panel listing all layers.
    LayerListPanelState
);
plain_panel_state!(
    /// Panel showing key bindings and help text.
    HelpPanelState
);

impl Default for SidePanelLocation {
    fn default() -> Self {
        SidePanelLocation::new()
    }
}

impl_json_eq!(
    SelectedLayerState,
    LayerSidePanelState,
    ToolPalette,
    StatisticsDisplayState,
    LayerListPanelState,
    HelpPanelState,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selected_layer_round_trip() {
        let input = json!({
            "layer": "ground truth",
            "side": "right",
            "visible": true,
            "size": 300,
        });
        let state = SelectedLayerState::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(state.layer(), Some("ground truth"));
        assert_eq!(state.location().side(), Some("right"));
        assert_eq!(state.location().flex(), 1.0);
        assert_eq!(state.to_json(), input);
    }

    #[test]
    fn test_layer_side_panel_tabs() {
        let input = json!({"tab": "rendering", "tabs": ["rendering", "source"]});
        let state = LayerSidePanelState::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert!(state.tabs().contains(&"source".to_string()));
        assert_eq!(state.to_json(), input);
    }

    #[test]
    fn test_tool_palette_round_trip() {
        let input = json!({
            "side": "left",
            "tools": [{"type": "opacity", "layer": "image"}],
            "query": "alpha",
        });
        let palette = ToolPalette::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(palette.tools().len(), 1);
        assert_eq!(palette.to_json(), input);
    }

    #[test]
    fn test_plain_panels_preserve_unknown_keys() {
        let input = json!({"visible": false, "futureOption": 3});
        let state = HelpPanelState::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(state.to_json(), input);
        let stats = StatisticsDisplayState::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(stats.to_json(), input);
    }

    #[test]
    fn test_read_only_panel() {
        let mut state =
            LayerSidePanelState::from_json(&json!({"tab": "source"}), AccessMode::ReadOnly)
                .unwrap();
        assert!(state.set_tab(None).is_err());
        assert!(state.tabs_mut().add("rendering".to_string()).is_err());
    }
}
