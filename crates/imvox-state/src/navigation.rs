//! Navigation state shared between linked viewer panels
//!
//! Position, zoom, depth range, and orientation can each be linked to the
//! global viewer navigation, unlinked, or tracked relative to it. A
//! [`Linked`] wrapper carries the link mode alongside the local value.

use serde_json::{Map, Value};

use imvox_json::{
    emit_field, impl_json_eq, AccessMode, EmptyWithMode, FromJson, JsonObject, StateError,
    StateResult, ToJson,
};

use crate::interp::{
    interpolate_linear_optional_vectors, interpolate_zoom, quaternion_slerp, Interpolate,
};

/// How a panel-local navigation value follows the global one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationLink {
    /// Follows the global value
    #[default]
    Linked,
    /// Fully independent
    Unlinked,
    /// Tracks the global value at a fixed offset
    Relative,
}

impl NavigationLink {
    /// Parses a link mode, case-insensitively.
    pub fn parse(s: &str) -> StateResult<Self> {
        match s.to_lowercase().as_str() {
            "linked" => Ok(NavigationLink::Linked),
            "unlinked" => Ok(NavigationLink::Unlinked),
            "relative" => Ok(NavigationLink::Relative),
            _ => Err(StateError::InvalidValue(format!(
                "invalid navigation link type: {s:?}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NavigationLink::Linked => "linked",
            NavigationLink::Unlinked => "unlinked",
            NavigationLink::Relative => "relative",
        }
    }
}

impl FromJson for NavigationLink {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        let s = value
            .as_str()
            .ok_or_else(|| StateError::type_mismatch("string", value))?;
        NavigationLink::parse(s)
    }
}

impl ToJson for NavigationLink {
    fn to_json(&self) -> Value {
        Value::String(self.as_str().to_string())
    }
}

/// A navigation value together with its link mode.
///
/// The `link` field defaults to [`NavigationLink::Linked`]; the value is
/// only meaningful when the panel is unlinked or relative.
#[derive(Debug, Clone)]
pub struct Linked<T> {
    link: Option<NavigationLink>,
    value: Option<T>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

/// Panel position, linked to the global position by default.
pub type LinkedPosition = Linked<Vec<f32>>;
/// Cross-section zoom factor with a link mode.
pub type LinkedZoomFactor = Linked<f64>;
/// Projection depth range with a link mode.
pub type LinkedDepthRange = Linked<f64>;
/// Orientation quaternion with a link mode.
pub type LinkedOrientationState = Linked<[f32; 4]>;

impl<T> Linked<T> {
    pub fn new() -> Self {
        Linked {
            link: None,
            value: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// The link mode, defaulting to linked.
    pub fn link(&self) -> NavigationLink {
        self.link.unwrap_or_default()
    }

    pub fn set_link(&mut self, link: NavigationLink) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.link = Some(link);
        Ok(())
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Option<T>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.value = value;
        Ok(())
    }

    pub fn with_link(mut self, link: NavigationLink) -> Self {
        self.link = Some(link);
        self
    }

    pub fn with_value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }
}

impl<T: Clone> Linked<T> {
    /// Shared shape of every linked-value blend: the link mode is pinned to
    /// the start side, and the payload only blends when both sides agree on
    /// a mode other than linked.
    fn interpolate_with(
        a: &Self,
        b: &Self,
        t: f64,
        blend: impl FnOnce(Option<&T>, Option<&T>, f64) -> Option<T>,
    ) -> Self {
        let mut c = a.clone();
        c.link = Some(a.link());
        if a.link() == b.link() && a.link() != NavigationLink::Linked {
            c.value = blend(a.value.as_ref(), b.value.as_ref(), t);
        }
        c
    }
}

impl<T> Default for Linked<T> {
    fn default() -> Self {
        Linked::new()
    }
}

impl<T> EmptyWithMode for Linked<T> {
    fn empty_with_mode(mode: AccessMode) -> Self {
        Linked {
            link: None,
            value: None,
            extra: Map::new(),
            mode,
        }
    }
}

impl<T: FromJson> FromJson for Linked<T> {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let link = obj.take("link")?;
        let value = obj.take("value")?;
        Ok(Linked {
            link,
            value,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl<T: ToJson> ToJson for Linked<T> {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "link", &self.link);
        emit_field(&mut map, "value", &self.value);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl Interpolate for LinkedPosition {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        Linked::interpolate_with(a, b, t, |a, b, t| {
            interpolate_linear_optional_vectors(a, b, t)
        })
    }
}

impl Interpolate for LinkedZoomFactor {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        Linked::interpolate_with(a, b, t, |a, b, t| interpolate_zoom(a.copied(), b.copied(), t))
    }
}

impl Interpolate for LinkedOrientationState {
    fn interpolate(a: &Self, b: &Self, t: f64) -> Self {
        Linked::interpolate_with(a, b, t, |a, b, t| Some(quaternion_slerp(a, b, t)))
    }
}

impl_json_eq!(
    LinkedPosition,
    LinkedZoomFactor,
    LinkedOrientationState,
);

/// Playback settings for stepping one coordinate dimension over time.
#[derive(Debug, Clone)]
pub struct DimensionPlaybackVelocity {
    velocity: Option<f64>,
    at_boundary: Option<String>,
    paused: Option<bool>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl DimensionPlaybackVelocity {
    pub fn new() -> Self {
        DimensionPlaybackVelocity {
            velocity: None,
            at_boundary: None,
            paused: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// Playback speed in coordinate units per second; defaults to 10.
    pub fn velocity(&self) -> f64 {
        self.velocity.unwrap_or(10.0)
    }

    pub fn set_velocity(&mut self, velocity: f64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.velocity = Some(velocity);
        Ok(())
    }

    /// Behavior at the dimension bounds; defaults to `"reverse"`.
    pub fn at_boundary(&self) -> &str {
        self.at_boundary.as_deref().unwrap_or("reverse")
    }

    pub fn set_at_boundary(&mut self, at_boundary: impl Into<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.at_boundary = Some(at_boundary.into());
        Ok(())
    }

    /// Whether playback starts paused; defaults to true.
    pub fn paused(&self) -> bool {
        self.paused.unwrap_or(true)
    }

    pub fn set_paused(&mut self, paused: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.paused = Some(paused);
        Ok(())
    }
}

impl Default for DimensionPlaybackVelocity {
    fn default() -> Self {
        DimensionPlaybackVelocity::new()
    }
}

impl FromJson for DimensionPlaybackVelocity {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let velocity = obj.take("velocity")?;
        let at_boundary = obj.take("atBoundary")?;
        let paused = obj.take("paused")?;
        Ok(DimensionPlaybackVelocity {
            velocity,
            at_boundary,
            paused,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for DimensionPlaybackVelocity {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "velocity", &self.velocity);
        emit_field(&mut map, "atBoundary", &self.at_boundary);
        emit_field(&mut map, "paused", &self.paused);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl_json_eq!(DimensionPlaybackVelocity);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_link_parse_is_case_insensitive() {
        assert_eq!(NavigationLink::parse("LINKED").unwrap(), NavigationLink::Linked);
        assert_eq!(NavigationLink::parse("relative").unwrap(), NavigationLink::Relative);
        assert!(NavigationLink::parse("detached").is_err());
    }

    #[test]
    fn test_linked_round_trip() {
        let input = json!({"link": "unlinked", "value": [1.0, 2.0, 3.0]});
        let position =
            LinkedPosition::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(position.link(), NavigationLink::Unlinked);
        assert_eq!(position.value(), Some(&vec![1.0, 2.0, 3.0]));
        assert_eq!(position.to_json(), input);
    }

    #[test]
    fn test_linked_default_omits_fields() {
        let position = LinkedPosition::from_json(&json!({}), AccessMode::ReadWrite).unwrap();
        assert_eq!(position.link(), NavigationLink::Linked);
        assert_eq!(position.to_json(), json!({}));
    }

    #[test]
    fn test_interpolate_blends_only_when_unlinked() {
        let a = LinkedZoomFactor::new()
            .with_link(NavigationLink::Unlinked)
            .with_value(1.0);
        let b = LinkedZoomFactor::new()
            .with_link(NavigationLink::Unlinked)
            .with_value(4.0);
        let c = Interpolate::interpolate(&a, &b, 0.5);
        assert_eq!(c.value(), Some(&2.0));
        assert_eq!(c.link(), NavigationLink::Unlinked);

        let a = LinkedZoomFactor::new().with_value(1.0);
        let b = LinkedZoomFactor::new().with_value(4.0);
        let c = Interpolate::interpolate(&a, &b, 0.5);
        // Both sides linked: the global value governs, so no blend happens.
        assert_eq!(c.value(), Some(&1.0));
        assert_eq!(c.to_json()["link"], json!("linked"));
    }

    #[test]
    fn test_interpolate_orientation_materializes_value() {
        let a = LinkedOrientationState::new().with_link(NavigationLink::Unlinked);
        let b = LinkedOrientationState::new().with_link(NavigationLink::Unlinked);
        let c = Interpolate::interpolate(&a, &b, 0.5);
        assert_eq!(c.value(), Some(&[0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_playback_velocity_defaults() {
        let v = DimensionPlaybackVelocity::from_json(&json!({}), AccessMode::ReadWrite).unwrap();
        assert_eq!(v.velocity(), 10.0);
        assert_eq!(v.at_boundary(), "reverse");
        assert!(v.paused());
        assert_eq!(v.to_json(), json!({}));
    }

    #[test]
    fn test_playback_velocity_round_trip() {
        let input = json!({"velocity": 2.5, "atBoundary": "loop", "paused": false});
        let v = DimensionPlaybackVelocity::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(v.velocity(), 2.5);
        assert_eq!(v.at_boundary(), "loop");
        assert!(!v.paused());
        assert_eq!(v.to_json(), input);
    }
}
