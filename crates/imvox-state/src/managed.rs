//! The named, ordered collection of layers in a viewer state.
//!
//! Each layer travels with a name plus visibility and archival flags that
//! live outside the layer's own JSON. The wire form accepts either an
//! array of objects carrying a `"name"` key or a name-to-layer object;
//! emission always uses the array form, which preserves ordering.

use serde_json::{Map, Value};

use imvox_json::{
    impl_json_eq, AccessMode, EmptyWithMode, FromJson, JsonObject, StateError, StateResult, ToJson,
};

use crate::interp::Interpolate;
use crate::layers::Layer;

/// A layer bound to a name and visibility flags.
#[derive(Debug, Clone)]
pub struct ManagedLayer {
    name: String,
    layer: Layer,
    visible: Option<bool>,
    archived: Option<bool>,
    mode: AccessMode,
}

impl ManagedLayer {
    pub fn new(name: impl Into<String>, layer: impl Into<Layer>) -> Self {
        ManagedLayer {
            name: name.into(),
            layer: layer.into(),
            visible: None,
            archived: None,
            mode: AccessMode::ReadWrite,
        }
    }

    /// Decodes the name-to-layer object form; the map key wins over any
    /// `"name"` key inside the layer object.
    pub fn from_named_json(
        name: impl Into<String>,
        value: &Value,
        mode: AccessMode,
    ) -> StateResult<Self> {
        ManagedLayer::from_object_parts(Some(name.into()), value, mode)
    }

    fn from_object_parts(
        outer_name: Option<String>,
        value: &Value,
        mode: AccessMode,
    ) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let inner_name = obj.take_value("name");
        let name = match outer_name {
            Some(name) => name,
            None => match inner_name {
                Some(Value::String(name)) => name,
                Some(Value::Number(number)) => number.to_string(),
                Some(other) => return Err(StateError::type_mismatch("string", &other)),
                None => return Err(StateError::missing_field("name")),
            },
        };
        let visible = obj.take("visible")?;
        let archived = obj.take("archived")?;
        let layer = Layer::from_json(&Value::Object(obj.into_extra()), mode)?;
        Ok(ManagedLayer {
            name,
            layer,
            visible,
            archived,
            mode,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.name = name.into();
        Ok(())
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }

    pub fn set_layer(&mut self, layer: impl Into<Layer>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.layer = layer.into();
        Ok(())
    }

    /// Effective visibility; an archived layer is never visible.
    pub fn visible(&self) -> bool {
        !self.archived() && self.visible.unwrap_or(true)
    }

    pub fn set_visible(&mut self, visible: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.visible = Some(visible);
        Ok(())
    }

    /// Defaults to false.
    pub fn archived(&self) -> bool {
        self.archived.unwrap_or(false)
    }

    pub fn set_archived(&mut self, archived: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.archived = Some(archived);
        Ok(())
    }
}

impl FromJson for ManagedLayer {
    /// Decodes the array-element form, which must carry a `"name"` key.
    /// Numeric names are formatted to strings.
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        ManagedLayer::from_object_parts(None, value, mode)
    }
}

impl ToJson for ManagedLayer {
    fn to_json(&self) -> Value {
        let mut map = match self.layer.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert("name".to_string(), Value::String(self.name.clone()));
        if self.archived() {
            map.insert("archived".to_string(), Value::Bool(true));
        } else if !self.visible() {
            map.insert("visible".to_string(), Value::Bool(false));
        }
        Value::Object(map)
    }
}

/// Ordered list of managed layers, indexable by name.
///
/// Duplicate names are representable; name lookups resolve to the first
/// match.
#[derive(Debug, Clone)]
pub struct Layers {
    layers: Vec<ManagedLayer>,
    mode: AccessMode,
}

impl Layers {
    pub fn new() -> Self {
        Layers {
            layers: Vec::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Position of the first layer with the given name.
    pub fn index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ManagedLayer> {
        self.index(name).map(|i| &self.layers[i])
    }

    pub fn get_index(&self, index: usize) -> Option<&ManagedLayer> {
        self.layers.get(index)
    }

    pub fn get_mut(&mut self, name: &str) -> StateResult<Option<&mut ManagedLayer>> {
        self.mode.ensure_mutable()?;
        let index = self.index(name);
        Ok(index.map(move |i| &mut self.layers[i]))
    }

    pub fn get_index_mut(&mut self, index: usize) -> StateResult<Option<&mut ManagedLayer>> {
        self.mode.ensure_mutable()?;
        Ok(self.layers.get_mut(index))
    }

    pub fn append(&mut self, layer: ManagedLayer) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.layers.push(layer);
        Ok(())
    }

    /// Replaces the first layer with this name in place, or appends when
    /// the name is new. The replacement starts with fresh visibility
    /// flags.
    pub fn set(&mut self, name: impl Into<String>, layer: impl Into<Layer>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        let managed = ManagedLayer::new(name, layer);
        match self.index(managed.name()) {
            Some(i) => self.layers[i] = managed,
            None => self.layers.push(managed),
        }
        Ok(())
    }

    /// Removes and returns the first layer with this name.
    pub fn remove(&mut self, name: &str) -> StateResult<ManagedLayer> {
        self.mode.ensure_mutable()?;
        match self.index(name) {
            Some(i) => Ok(self.layers.remove(i)),
            None => Err(StateError::NotFound(format!("layer {name:?} not found"))),
        }
    }

    pub fn clear(&mut self) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.layers.clear();
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManagedLayer> {
        self.layers.iter()
    }
}

impl Default for Layers {
    fn default() -> Self {
        Layers::new()
    }
}

impl EmptyWithMode for Layers {
    fn empty_with_mode(mode: AccessMode) -> Self {
        Layers {
            layers: Vec::new(),
            mode,
        }
    }
}

impl FromIterator<ManagedLayer> for Layers {
    fn from_iter<I: IntoIterator<Item = ManagedLayer>>(iter: I) -> Self {
        Layers {
            layers: iter.into_iter().collect(),
            mode: AccessMode::ReadWrite,
        }
    }
}

impl FromJson for Layers {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let layers = match value {
            Value::Object(map) => map
                .iter()
                .map(|(name, spec)| ManagedLayer::from_named_json(name.clone(), spec, mode))
                .collect::<StateResult<Vec<_>>>()?,
            Value::Array(items) => items
                .iter()
                .map(|item| ManagedLayer::from_json(item, mode))
                .collect::<StateResult<Vec<_>>>()?,
            other => return Err(StateError::type_mismatch("layer list or object", other)),
        };
        Ok(Layers { layers, mode })
    }
}

impl ToJson for Layers {
    fn to_json(&self) -> Value {
        Value::Array(self.layers.iter().map(ToJson::to_json).collect())
    }
}

impl Interpolate for Layers {
    /// Layers sharing a name across both sides blend; the rest hold the
    /// start state. Ordering follows the start side.
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        let layers = a
            .layers
            .iter()
            .map(|ma| match b.get(ma.name()) {
                Some(mb) => {
                    let mut mc = ma.clone();
                    mc.layer = Interpolate::interpolate(ma.layer(), mb.layer(), t);
                    mc
                }
                None => ma.clone(),
            })
            .collect();
        Layers {
            layers,
            mode: a.mode,
        }
    }
}

impl_json_eq!(ManagedLayer, Layers);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::ImageLayer;
    use serde_json::json;

    #[test]
    fn test_object_form_decodes_and_emits_array() {
        let input = json!({
            "raw": {"type": "image", "source": "zarr://s3://bucket/raw"},
            "seg": {"type": "segmentation"},
        });
        let layers = Layers::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers.index("seg"), Some(1));
        assert_eq!(
            layers.to_json(),
            json!([
                {"type": "image", "source": "zarr://s3://bucket/raw", "name": "raw"},
                {"type": "segmentation", "name": "seg"},
            ])
        );
    }

    #[test]
    fn test_array_form_requires_name() {
        let layers = Layers::from_json(
            &json!([{"type": "image", "name": "raw"}]),
            AccessMode::ReadWrite,
        )
        .unwrap();
        assert_eq!(layers.get_index(0).unwrap().name(), "raw");

        let err =
            Layers::from_json(&json!([{"type": "image"}]), AccessMode::ReadWrite).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidValue("missing required field \"name\"".to_string())
        );
    }

    #[test]
    fn test_numeric_names_are_formatted() {
        let layers = Layers::from_json(
            &json!([{"type": "segmentation", "name": 5}]),
            AccessMode::ReadWrite,
        )
        .unwrap();
        assert_eq!(layers.get_index(0).unwrap().name(), "5");
        assert!(Layers::from_json(
            &json!([{"type": "segmentation", "name": true}]),
            AccessMode::ReadWrite,
        )
        .is_err());
    }

    #[test]
    fn test_map_key_wins_over_inner_name() {
        let layers = Layers::from_json(
            &json!({"outer": {"type": "image", "name": "inner"}}),
            AccessMode::ReadWrite,
        )
        .unwrap();
        let managed = layers.get("outer").unwrap();
        assert_eq!(managed.name(), "outer");
        assert_eq!(
            managed.to_json(),
            json!({"type": "image", "name": "outer"})
        );
    }

    #[test]
    fn test_visibility_emission() {
        let mut managed = ManagedLayer::new("raw", ImageLayer::new());
        assert!(managed.visible());
        assert_eq!(managed.to_json(), json!({"type": "image", "name": "raw"}));

        // An explicit true is still the default and stays off the wire.
        managed.set_visible(true).unwrap();
        assert_eq!(managed.to_json(), json!({"type": "image", "name": "raw"}));

        managed.set_visible(false).unwrap();
        assert!(!managed.visible());
        assert_eq!(
            managed.to_json(),
            json!({"type": "image", "name": "raw", "visible": false})
        );

        // Archival overrides visibility and suppresses the visible key.
        managed.set_archived(true).unwrap();
        assert!(!managed.visible());
        assert_eq!(
            managed.to_json(),
            json!({"type": "image", "name": "raw", "archived": true})
        );
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut layers = Layers::new();
        layers.append(ManagedLayer::new("a", ImageLayer::new())).unwrap();
        layers.append(ManagedLayer::new("b", ImageLayer::new())).unwrap();
        layers.get_mut("b").unwrap().unwrap().set_visible(false).unwrap();

        let replacement = ImageLayer::new().with_opacity(0.75);
        layers.set("b", replacement).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers.index("b"), Some(1));
        // The replacement does not inherit the old visibility flag.
        assert!(layers.get("b").unwrap().visible());

        layers.set("c", ImageLayer::new()).unwrap();
        assert_eq!(layers.index("c"), Some(2));
    }

    #[test]
    fn test_remove_missing_name() {
        let mut layers = Layers::new();
        layers.append(ManagedLayer::new("a", ImageLayer::new())).unwrap();
        let removed = layers.remove("a").unwrap();
        assert_eq!(removed.name(), "a");
        assert_eq!(
            layers.remove("a"),
            Err(StateError::NotFound("layer \"a\" not found".to_string()))
        );
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let mut layers = Layers::new();
        layers.append(ManagedLayer::new("x", ImageLayer::new())).unwrap();
        layers
            .append(ManagedLayer::new("x", ImageLayer::new().with_opacity(0.25)))
            .unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers.index("x"), Some(0));
        layers.remove("x").unwrap();
        assert_eq!(layers.len(), 1);
        let held = match layers.get("x").unwrap().layer() {
            Layer::Image(image) => image.opacity(),
            other => panic!("wrong kind: {:?}", other.kind_name()),
        };
        assert_eq!(held, 0.25);
    }

    #[test]
    fn test_interpolation_matches_by_name() {
        let a = Layers::from_json(
            &json!([
                {"type": "image", "name": "raw", "opacity": 0.25},
                {"type": "image", "name": "only-a", "opacity": 0.25},
            ]),
            AccessMode::ReadWrite,
        )
        .unwrap();
        let b = Layers::from_json(
            &json!([
                {"type": "image", "name": "raw", "opacity": 0.75},
            ]),
            AccessMode::ReadWrite,
        )
        .unwrap();
        let c = Interpolate::interpolate(&a, &b, 0.5);
        let opacity = |layers: &Layers, name: &str| match layers.get(name).unwrap().layer() {
            Layer::Image(image) => image.opacity(),
            other => panic!("wrong kind: {:?}", other.kind_name()),
        };
        assert_eq!(opacity(&c, "raw"), 0.5);
        assert_eq!(opacity(&c, "only-a"), 0.25);
    }

    #[test]
    fn test_interpolation_holds_mismatched_kinds() {
        let a = Layers::from_json(
            &json!([{"type": "image", "name": "x", "opacity": 0.25}]),
            AccessMode::ReadWrite,
        )
        .unwrap();
        let b = Layers::from_json(
            &json!([{"type": "segmentation", "name": "x"}]),
            AccessMode::ReadWrite,
        )
        .unwrap();
        let c = Interpolate::interpolate(&a, &b, 0.5);
        assert_eq!(c, a);
    }

    #[test]
    fn test_read_only_layers() {
        let mut layers = Layers::from_json(
            &json!({"raw": {"type": "image", "opacity": 0.25}}),
            AccessMode::ReadOnly,
        )
        .unwrap();
        assert_eq!(
            layers.append(ManagedLayer::new("x", ImageLayer::new())),
            Err(StateError::ReadOnly)
        );
        assert_eq!(layers.set("raw", ImageLayer::new()), Err(StateError::ReadOnly));
        assert_eq!(layers.remove("raw").unwrap_err(), StateError::ReadOnly);
        assert!(layers.get_mut("raw").is_err());

        // The non-gated accessors still read.
        assert!(layers.get("raw").unwrap().visible());
    }
}
