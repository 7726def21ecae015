//! Shader control parameters attached to rendering layers
//!
//! A shader control value on the wire can be a number, a string, or one of
//! two parameter objects. Decoding canonicalizes digit strings to integers
//! but keeps every other string verbatim, since controls also carry colors
//! and enum tokens.

use serde_json::{Map, Number, Value};

use imvox_json::{
    emit_field, impl_json_eq, parse_uint64, AccessMode, FromJson, JsonObject, NumberOrString,
    StateError, StateResult, ToJson, TypedList, TypedMap,
};

/// Per-layer shader control map, keyed by control name.
pub type ShaderControls = TypedMap<String, ShaderControlValue>;

/// Parameters of an inverse-lerp mapping from data values to `[0, 1]`.
///
/// The `range` and `window` bounds keep each element's integer or float
/// wire form, so `[0, 255]` does not come back as `[0.0, 255.0]`.
#[derive(Debug, Clone)]
pub struct InvlerpParameters {
    range: Option<[Number; 2]>,
    window: Option<[Number; 2]>,
    channel: Option<TypedList<i64>>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl InvlerpParameters {
    pub fn new() -> Self {
        InvlerpParameters {
            range: None,
            window: None,
            channel: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn range(&self) -> Option<&[Number; 2]> {
        self.range.as_ref()
    }

    pub fn set_range(&mut self, range: Option<[Number; 2]>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.range = range;
        Ok(())
    }

    pub fn window(&self) -> Option<&[Number; 2]> {
        self.window.as_ref()
    }

    pub fn set_window(&mut self, window: Option<[Number; 2]>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.window = window;
        Ok(())
    }

    pub fn channel(&self) -> Option<&TypedList<i64>> {
        self.channel.as_ref()
    }

    pub fn set_channel(&mut self, channel: Option<TypedList<i64>>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.channel = channel;
        Ok(())
    }
}

impl Default for InvlerpParameters {
    fn default() -> Self {
        InvlerpParameters::new()
    }
}

impl FromJson for InvlerpParameters {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let range = obj.take("range")?;
        let window = obj.take("window")?;
        let channel = obj.take("channel")?;
        Ok(InvlerpParameters {
            range,
            window,
            channel,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for InvlerpParameters {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "range", &self.range);
        emit_field(&mut map, "window", &self.window);
        emit_field(&mut map, "channel", &self.channel);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

/// Parameters of a transfer-function control.
#[derive(Debug, Clone)]
pub struct TransferFunctionParameters {
    window: Option<[Number; 2]>,
    channel: Option<TypedList<i64>>,
    control_points: Option<TypedList<TypedList<NumberOrString>>>,
    default_color: Option<String>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl TransferFunctionParameters {
    pub fn new() -> Self {
        TransferFunctionParameters {
            window: None,
            channel: None,
            control_points: None,
            default_color: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn window(&self) -> Option<&[Number; 2]> {
        self.window.as_ref()
    }

    pub fn set_window(&mut self, window: Option<[Number; 2]>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.window = window;
        Ok(())
    }

    pub fn channel(&self) -> Option<&TypedList<i64>> {
        self.channel.as_ref()
    }

    pub fn set_channel(&mut self, channel: Option<TypedList<i64>>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.channel = channel;
        Ok(())
    }

    /// Control points as `[position, color-or-opacity]` rows.
    pub fn control_points(&self) -> Option<&TypedList<TypedList<NumberOrString>>> {
        self.control_points.as_ref()
    }

    pub fn set_control_points(
        &mut self,
        control_points: Option<TypedList<TypedList<NumberOrString>>>,
    ) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.control_points = control_points;
        Ok(())
    }

    pub fn default_color(&self) -> Option<&str> {
        self.default_color.as_deref()
    }

    pub fn set_default_color(&mut self, color: Option<String>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.default_color = color;
        Ok(())
    }
}

impl Default for TransferFunctionParameters {
    fn default() -> Self {
        TransferFunctionParameters::new()
    }
}

impl FromJson for TransferFunctionParameters {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let window = obj.take("window")?;
        let channel = obj.take("channel")?;
        let control_points = obj.take("controlPoints")?;
        let default_color = obj.take("defaultColor")?;
        Ok(TransferFunctionParameters {
            window,
            channel,
            control_points,
            default_color,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for TransferFunctionParameters {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_field(&mut map, "window", &self.window);
        emit_field(&mut map, "channel", &self.channel);
        emit_field(&mut map, "controlPoints", &self.control_points);
        emit_field(&mut map, "defaultColor", &self.default_color);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

/// One value in a layer's shader control map.
#[derive(Debug, Clone)]
pub enum ShaderControlValue {
    /// Plain numeric control, keeping its int/float wire form
    Number(Number),
    /// Non-numeric token such as a color or enum value
    Text(String),
    /// Inverse-lerp normalization parameters
    Invlerp(InvlerpParameters),
    /// Transfer-function parameters
    TransferFunction(TransferFunctionParameters),
}

impl FromJson for ShaderControlValue {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::Number(n) => Ok(ShaderControlValue::Number(n.clone())),
            Value::String(s) => {
                // Digit strings canonicalize to integers; anything else
                // passes through untouched.
                if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
                    let v = parse_uint64(s)?;
                    Ok(ShaderControlValue::Number(Number::from(v)))
                } else {
                    Ok(ShaderControlValue::Text(s.clone()))
                }
            }
            Value::Object(map) => {
                if map.contains_key("controlPoints") {
                    TransferFunctionParameters::from_json(value, mode)
                        .map(ShaderControlValue::TransferFunction)
                } else {
                    InvlerpParameters::from_json(value, mode).map(ShaderControlValue::Invlerp)
                }
            }
            _ => Err(StateError::type_mismatch(
                "shader control parameters",
                value,
            )),
        }
    }
}

impl ToJson for ShaderControlValue {
    fn to_json(&self) -> Value {
        match self {
            ShaderControlValue::Number(n) => Value::Number(n.clone()),
            ShaderControlValue::Text(s) => Value::String(s.clone()),
            ShaderControlValue::Invlerp(p) => p.to_json(),
            ShaderControlValue::TransferFunction(p) => p.to_json(),
        }
    }
}

impl From<f64> for ShaderControlValue {
    fn from(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => ShaderControlValue::Number(n),
            None => ShaderControlValue::Text(value.to_string()),
        }
    }
}

impl From<i64> for ShaderControlValue {
    fn from(value: i64) -> Self {
        ShaderControlValue::Number(Number::from(value))
    }
}

impl_json_eq!(InvlerpParameters, TransferFunctionParameters, ShaderControlValue);

#[cfg(test)]
mod tests {
    use super::*;
    use imvox_json::TypedMap;
    use serde_json::json;

    #[test]
    fn test_digit_strings_become_integers() {
        let v = ShaderControlValue::from_json(&json!("42"), AccessMode::ReadWrite).unwrap();
        assert_eq!(v.to_json(), json!(42));
    }

    #[test]
    fn test_other_strings_pass_through() {
        for s in ["#ff0000", "1e5", "-3", "", "max"] {
            let v = ShaderControlValue::from_json(&json!(s), AccessMode::ReadWrite).unwrap();
            assert_eq!(v.to_json(), json!(s));
        }
    }

    #[test]
    fn test_numbers_keep_wire_form() {
        let int = ShaderControlValue::from_json(&json!(7), AccessMode::ReadWrite).unwrap();
        assert_eq!(int.to_json(), json!(7));
        let float = ShaderControlValue::from_json(&json!(0.25), AccessMode::ReadWrite).unwrap();
        assert_eq!(float.to_json(), json!(0.25));
    }

    #[test]
    fn test_objects_dispatch_on_control_points() {
        let invlerp = ShaderControlValue::from_json(
            &json!({"range": [0, 255], "channel": [1]}),
            AccessMode::ReadWrite,
        )
        .unwrap();
        assert!(matches!(invlerp, ShaderControlValue::Invlerp(_)));
        assert_eq!(invlerp.to_json(), json!({"range": [0, 255], "channel": [1]}));

        let tf = ShaderControlValue::from_json(
            &json!({"controlPoints": [[0, "#000000"], [255, "#ffffff"]], "defaultColor": "#808080"}),
            AccessMode::ReadWrite,
        )
        .unwrap();
        assert!(matches!(tf, ShaderControlValue::TransferFunction(_)));
    }

    #[test]
    fn test_bool_rejected() {
        let err = ShaderControlValue::from_json(&json!(true), AccessMode::ReadWrite).unwrap_err();
        assert!(matches!(err, StateError::TypeMismatch { .. }));
    }

    #[test]
    fn test_invlerp_range_keeps_int_form() {
        let p = InvlerpParameters::from_json(
            &json!({"range": [0, 65535], "window": [0.5, 0.75]}),
            AccessMode::ReadWrite,
        )
        .unwrap();
        assert_eq!(p.to_json(), json!({"range": [0, 65535], "window": [0.5, 0.75]}));
    }

    #[test]
    fn test_control_map() {
        let input = json!({"brightness": 0.5, "colormap": "#ff00ff", "normalized": {"range": [0, 100]}});
        let controls =
            TypedMap::<String, ShaderControlValue>::from_json(&input, AccessMode::ReadWrite)
                .unwrap();
        assert_eq!(controls.len(), 3);
        assert_eq!(controls.to_json(), input);
    }
}
