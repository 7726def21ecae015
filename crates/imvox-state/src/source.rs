//! Layer data sources: remote URLs and in-process local sources
//!
//! The wire format allows several shorthands, each normalized on decode:
//! a bare string is a source with only a `url`, a bare boolean is a
//! subsource with only `enabled`, and a single source stands in for a
//! one-element source list.

use serde_json::{Map, Value};
use uuid::Uuid;

use imvox_json::{
    emit_field, emit_nonempty, impl_json_eq, AccessMode, EmptyWithMode, FromJson, JsonObject,
    StateResult, ToJson, TypedList, TypedMap,
};

use crate::coords::CoordinateSpaceTransform;

/// What kind of in-process data a local source serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSourceKind {
    Volume,
    Skeleton,
}

impl LocalSourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LocalSourceKind::Volume => "volume",
            LocalSourceKind::Skeleton => "skeleton",
        }
    }
}

/// Handle to data served from this process rather than a remote store.
///
/// The handle itself never appears in JSON; it is substituted for its
/// `local://` URL when assigned to a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSourceHandle {
    kind: LocalSourceKind,
    token: Uuid,
}

impl LocalSourceHandle {
    fn new(kind: LocalSourceKind) -> Self {
        LocalSourceHandle {
            kind,
            token: Uuid::new_v4(),
        }
    }

    /// A handle for locally served volume data.
    pub fn volume() -> Self {
        LocalSourceHandle::new(LocalSourceKind::Volume)
    }

    /// A handle for locally served skeleton data.
    pub fn skeleton() -> Self {
        LocalSourceHandle::new(LocalSourceKind::Skeleton)
    }

    pub fn kind(&self) -> LocalSourceKind {
        self.kind
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    /// The URL this handle is substituted for on the wire.
    pub fn url(&self) -> String {
        format!("local://{}/{}", self.kind.as_str(), self.token.simple())
    }
}

/// One named subsource of a data source.
#[derive(Debug, Clone)]
pub struct LayerDataSubsource {
    enabled: Option<bool>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl LayerDataSubsource {
    pub fn new(enabled: bool) -> Self {
        LayerDataSubsource {
            enabled: Some(enabled),
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn enabled(&self) -> Option<bool> {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: Option<bool>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.enabled = enabled;
        Ok(())
    }
}

impl FromJson for LayerDataSubsource {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        // Bare boolean shorthand for {"enabled": ...}.
        if let Value::Bool(enabled) = value {
            return Ok(LayerDataSubsource {
                enabled: Some(*enabled),
                extra: Map::new(),
                mode,
            });
        }
        let mut obj = JsonObject::from_value(value, mode)?;
        let enabled = obj.take("enabled")?;
        Ok(LayerDataSubsource {
            enabled,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for LayerDataSubsource {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "enabled", &self.enabled);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

/// One data source of a layer.
#[derive(Debug, Clone)]
pub struct LayerDataSource {
    url: Option<String>,
    transform: Option<CoordinateSpaceTransform>,
    subsources: TypedMap<String, LayerDataSubsource>,
    enable_default_subsources: Option<bool>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl LayerDataSource {
    pub fn new(url: impl Into<String>) -> Self {
        LayerDataSource {
            url: Some(url.into()),
            transform: None,
            subsources: TypedMap::new(),
            enable_default_subsources: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.url = Some(url.into());
        Ok(())
    }

    pub fn transform(&self) -> Option<&CoordinateSpaceTransform> {
        self.transform.as_ref()
    }

    pub fn set_transform(&mut self, transform: Option<CoordinateSpaceTransform>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.transform = transform;
        Ok(())
    }

    pub fn subsources(&self) -> &TypedMap<String, LayerDataSubsource> {
        &self.subsources
    }

    pub fn subsources_mut(&mut self) -> &mut TypedMap<String, LayerDataSubsource> {
        &mut self.subsources
    }

    /// Whether unnamed subsources are enabled; defaults to true.
    pub fn enable_default_subsources(&self) -> bool {
        self.enable_default_subsources.unwrap_or(true)
    }

    pub fn set_enable_default_subsources(&mut self, enable: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.enable_default_subsources = Some(enable);
        Ok(())
    }

    pub fn with_transform(mut self, transform: CoordinateSpaceTransform) -> Self {
        self.transform = Some(transform);
        self
    }
}

impl From<&LocalSourceHandle> for LayerDataSource {
    fn from(handle: &LocalSourceHandle) -> Self {
        LayerDataSource::new(handle.url())
    }
}

impl FromJson for LayerDataSource {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        // Bare string shorthand for {"url": ...}.
        if let Value::String(url) = value {
            return Ok(LayerDataSource {
                url: Some(url.clone()),
                transform: None,
                subsources: TypedMap::empty_with_mode(mode),
                enable_default_subsources: None,
                extra: Map::new(),
                mode,
            });
        }
        let mut obj = JsonObject::from_value(value, mode)?;
        let url = obj.take("url")?;
        let transform = obj.take("transform")?;
        let subsources = obj.take_or_empty("subsources")?;
        let enable_default_subsources = obj.take("enableDefaultSubsources")?;
        Ok(LayerDataSource {
            url,
            transform,
            subsources,
            enable_default_subsources,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for LayerDataSource {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "url", &self.url);
        emit_field(&mut map, "transform", &self.transform);
        emit_nonempty(&mut map, "subsources", self.subsources.to_json());
        emit_field(&mut map, "enableDefaultSubsources", &self.enable_default_subsources);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

/// The ordered data sources of a layer.
#[derive(Debug, Clone, Default)]
pub struct LayerDataSources {
    sources: TypedList<LayerDataSource>,
}

impl LayerDataSources {
    pub fn new() -> Self {
        LayerDataSources::default()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LayerDataSource> {
        self.sources.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayerDataSource> {
        self.sources.iter()
    }

    pub fn push(&mut self, source: LayerDataSource) -> StateResult<()> {
        self.sources.push(source)
    }

    pub fn remove(&mut self, index: usize) -> StateResult<LayerDataSource> {
        self.sources.remove(index)
    }

    pub fn clear(&mut self) -> StateResult<()> {
        self.sources.clear()
    }
}

impl EmptyWithMode for LayerDataSources {
    fn empty_with_mode(mode: AccessMode) -> Self {
        LayerDataSources {
            sources: TypedList::empty_with_mode(mode),
        }
    }
}

impl FromJson for LayerDataSources {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let sources = match value {
            Value::Null => TypedList::empty_with_mode(mode),
            // A single source, in either shorthand or object form, is a
            // one-element list.
            Value::String(_) | Value::Object(_) => {
                TypedList::from_json(&Value::Array(vec![value.clone()]), mode)?
            }
            _ => TypedList::from_json(value, mode)?,
        };
        Ok(LayerDataSources { sources })
    }
}

impl ToJson for LayerDataSources {
    fn to_json(&self) -> Value {
        self.sources.to_json()
    }
}

impl_json_eq!(LayerDataSubsource, LayerDataSource, LayerDataSources);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subsource_bool_shorthand() {
        let sub =
            LayerDataSubsource::from_json(&json!(false), AccessMode::ReadWrite).unwrap();
        assert_eq!(sub.enabled(), Some(false));
        assert_eq!(sub.to_json(), json!({"enabled": false}));
    }

    #[test]
    fn test_source_string_shorthand() {
        let source = LayerDataSource::from_json(
            &json!("precomputed://gs://bucket/image"),
            AccessMode::ReadWrite,
        )
        .unwrap();
        assert_eq!(source.url(), Some("precomputed://gs://bucket/image"));
        assert_eq!(source.to_json(), json!({"url": "precomputed://gs://bucket/image"}));
    }

    #[test]
    fn test_source_full_round_trip() {
        let input = json!({
            "url": "zarr://s3://bucket/volume",
            "subsources": {"default": true, "bounds": false},
            "enableDefaultSubsources": false,
        });
        let source = LayerDataSource::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert!(!source.enable_default_subsources());
        assert_eq!(
            source.to_json(),
            json!({
                "url": "zarr://s3://bucket/volume",
                "subsources": {"default": {"enabled": true}, "bounds": {"enabled": false}},
                "enableDefaultSubsources": false,
            })
        );
    }

    #[test]
    fn test_sources_single_element_coercions() {
        for input in [json!("n5://host/data"), json!({"url": "n5://host/data"})] {
            let sources = LayerDataSources::from_json(&input, AccessMode::ReadWrite).unwrap();
            assert_eq!(sources.len(), 1);
            assert_eq!(sources.get(0).unwrap().url(), Some("n5://host/data"));
        }
        let sources =
            LayerDataSources::from_json(&json!(["a://x", "b://y"]), AccessMode::ReadWrite)
                .unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.to_json(), json!([{"url": "a://x"}, {"url": "b://y"}]));
    }

    #[test]
    fn test_local_source_url() {
        let handle = LocalSourceHandle::volume();
        let url = handle.url();
        assert!(url.starts_with("local://volume/"));
        assert_eq!(url.len(), "local://volume/".len() + 32);

        let source = LayerDataSource::from(&handle);
        assert_eq!(source.url(), Some(url.as_str()));

        assert!(LocalSourceHandle::skeleton().url().starts_with("local://skeleton/"));
    }

    #[test]
    fn test_distinct_handles_get_distinct_tokens() {
        assert_ne!(LocalSourceHandle::volume().url(), LocalSourceHandle::volume().url());
    }
}
