//! Typed-value coercion between raw JSON and canonical in-memory values
//!
//! This module defines:
//! - AccessMode: the depth-propagating read-only flag
//! - FromJson/ToJson: the decode/encode contract every typed value implements
//! - Scalar, array, and union coercions (uint64 strings, number-or-string)

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Number, Value};

use crate::error::{StateError, StateResult};

lazy_static! {
    static ref UINT64_STR_PATTERN: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Whether an instance accepts mutation.
///
/// The mode is fixed at construction and propagates to every nested object,
/// container, and view decoded from the same input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Mutations allowed
    #[default]
    ReadWrite,
    /// Every mutating operation fails with [`StateError::ReadOnly`]
    ReadOnly,
}

impl AccessMode {
    /// True when mutations are rejected
    pub fn is_read_only(self) -> bool {
        matches!(self, AccessMode::ReadOnly)
    }

    /// Fails with [`StateError::ReadOnly`] unless mutations are allowed
    pub fn ensure_mutable(self) -> StateResult<()> {
        match self {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(StateError::ReadOnly),
        }
    }
}

/// Decode a canonical typed value from raw JSON.
///
/// Decoding validates eagerly: the entire subtree is checked before any
/// value is produced, so a failed decode never leaves partial state behind.
pub trait FromJson: Sized {
    /// Decodes `value`, propagating `mode` into nested objects and containers.
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self>;
}

/// Encode a typed value back to plain JSON.
pub trait ToJson {
    /// Emits the JSON-safe form of this value.
    fn to_json(&self) -> Value;
}

/// Containers and wrappers that materialize empty under a given mode.
///
/// An absent key decodes to an empty instance bound to the enclosing
/// object's access mode, so read-only still reaches containers the input
/// never mentioned.
pub trait EmptyWithMode {
    fn empty_with_mode(mode: AccessMode) -> Self;
}

/// Deep copy through serialization, always producing a mutable value.
///
/// This is the only way to escape a read-only tree: the copy owns fresh
/// backing storage and never aliases the original.
pub fn deep_mutable_copy<T: FromJson + ToJson>(value: &T) -> StateResult<T> {
    T::from_json(&value.to_json(), AccessMode::ReadWrite)
}

/// Parses a decimal string as an unsigned 64-bit integer.
///
/// A leading sign, whitespace, or any non-digit character is rejected, as is
/// any value outside the uint64 range.
pub fn parse_uint64(s: &str) -> StateResult<u64> {
    if !UINT64_STR_PATTERN.is_match(s) {
        return Err(StateError::InvalidValue(format!(
            "invalid uint64 string: {s:?}"
        )));
    }
    s.parse::<u64>()
        .map_err(|_| StateError::InvalidValue(format!("uint64 out of range: {s:?}")))
}

impl FromJson for bool {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| StateError::type_mismatch("boolean", value))
    }
}

impl ToJson for bool {
    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromJson for String {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| StateError::type_mismatch("string", value))
    }
}

impl ToJson for String {
    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromJson for f64 {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        value
            .as_f64()
            .ok_or_else(|| StateError::type_mismatch("number", value))
    }
}

impl ToJson for f64 {
    fn to_json(&self) -> Value {
        Number::from_f64(*self).map_or(Value::Null, Value::Number)
    }
}

impl FromJson for f32 {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        f64::from_json(value, mode).map(|v| v as f32)
    }
}

impl ToJson for f32 {
    fn to_json(&self) -> Value {
        f64::from(*self).to_json()
    }
}

impl FromJson for i64 {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        if let Some(v) = value.as_i64() {
            return Ok(v);
        }
        // Exactly integral floats count as integers (e.g. 1000.0).
        if let Some(v) = value.as_f64() {
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                return Ok(v as i64);
            }
        }
        Err(StateError::type_mismatch("integer", value))
    }
}

impl ToJson for i64 {
    fn to_json(&self) -> Value {
        Value::Number(Number::from(*self))
    }
}

impl FromJson for u64 {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    return Ok(v);
                }
                if let Some(v) = n.as_i64() {
                    return Err(StateError::InvalidValue(format!("invalid uint64: {v}")));
                }
                if let Some(v) = n.as_f64() {
                    if v.fract() == 0.0 && v >= 0.0 && v < u64::MAX as f64 {
                        return Ok(v as u64);
                    }
                    return Err(StateError::InvalidValue(format!("invalid uint64: {v}")));
                }
                Err(StateError::type_mismatch("uint64", value))
            }
            Value::String(s) => parse_uint64(s),
            _ => Err(StateError::type_mismatch("uint64", value)),
        }
    }
}

impl ToJson for u64 {
    fn to_json(&self) -> Value {
        Value::Number(Number::from(*self))
    }
}

impl FromJson for Number {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::Number(n) => Ok(n.clone()),
            _ => Err(StateError::type_mismatch("number", value)),
        }
    }
}

impl ToJson for Number {
    fn to_json(&self) -> Value {
        Value::Number(self.clone())
    }
}

impl FromJson for Value {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        Ok(value.clone())
    }
}

impl ToJson for Value {
    fn to_json(&self) -> Value {
        self.clone()
    }
}

impl<T: FromJson> FromJson for Option<T> {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_json(value, mode).map(Some),
        }
    }
}

impl<T: ToJson> ToJson for Option<T> {
    fn to_json(&self) -> Value {
        match self {
            Some(v) => v.to_json(),
            None => Value::Null,
        }
    }
}

impl<T: FromJson> FromJson for Vec<T> {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| StateError::type_mismatch("array", value))?;
        items.iter().map(|v| T::from_json(v, mode)).collect()
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(ToJson::to_json).collect())
    }
}

impl<T: FromJson, const N: usize> FromJson for [T; N] {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| StateError::type_mismatch(format!("array of length {N}"), value))?;
        if items.len() != N {
            return Err(StateError::TypeMismatch {
                expected: format!("array of length {N}"),
                actual: format!("array of length {}", items.len()),
            });
        }
        let decoded = items
            .iter()
            .map(|v| T::from_json(v, mode))
            .collect::<StateResult<Vec<T>>>()?;
        <[T; N]>::try_from(decoded)
            .map_err(|_| StateError::type_mismatch(format!("array of length {N}"), value))
    }
}

impl<T: ToJson, const N: usize> ToJson for [T; N] {
    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(ToJson::to_json).collect())
    }
}

/// A JSON number, or a string when the text is not numeric.
///
/// Digit strings canonicalize to integers and other numeric-looking strings
/// to floats; everything else stays a string (used by annotation properties
/// and shader control points, where color names mix with numbers).
#[derive(Debug, Clone, PartialEq)]
pub enum NumberOrString {
    /// Numeric value, preserving its int/float wire form
    Number(Number),
    /// Non-numeric text
    Text(String),
}

impl FromJson for NumberOrString {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::Number(n) => Ok(NumberOrString::Number(n.clone())),
            Value::String(s) => {
                if let Ok(v) = s.parse::<i64>() {
                    return Ok(NumberOrString::Number(Number::from(v)));
                }
                if let Ok(v) = s.parse::<u64>() {
                    return Ok(NumberOrString::Number(Number::from(v)));
                }
                if let Ok(v) = s.parse::<f64>() {
                    if let Some(n) = Number::from_f64(v) {
                        return Ok(NumberOrString::Number(n));
                    }
                }
                Ok(NumberOrString::Text(s.clone()))
            }
            _ => Err(StateError::type_mismatch("number or string", value)),
        }
    }
}

impl ToJson for NumberOrString {
    fn to_json(&self) -> Value {
        match self {
            NumberOrString::Number(n) => Value::Number(n.clone()),
            NumberOrString::Text(s) => Value::String(s.clone()),
        }
    }
}

/// A JSON boolean, or one of a field-specific set of string tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolOrString {
    /// Plain boolean
    Bool(bool),
    /// String token; the owning field validates membership
    Text(String),
}

impl BoolOrString {
    /// The token when this is a string value
    pub fn as_token(&self) -> Option<&str> {
        match self {
            BoolOrString::Bool(_) => None,
            BoolOrString::Text(s) => Some(s),
        }
    }
}

impl FromJson for BoolOrString {
    fn from_json(value: &Value, _mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::Bool(b) => Ok(BoolOrString::Bool(*b)),
            Value::String(s) => Ok(BoolOrString::Text(s.clone())),
            _ => Err(StateError::type_mismatch("boolean or string", value)),
        }
    }
}

impl ToJson for BoolOrString {
    fn to_json(&self) -> Value {
        match self {
            BoolOrString::Bool(b) => Value::Bool(*b),
            BoolOrString::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for BoolOrString {
    fn from(value: bool) -> Self {
        BoolOrString::Bool(value)
    }
}

impl From<&str> for BoolOrString {
    fn from(value: &str) -> Self {
        BoolOrString::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_uint64() {
        assert_eq!(parse_uint64("0").unwrap(), 0);
        assert_eq!(parse_uint64("18446744073709551615").unwrap(), u64::MAX);
        assert!(matches!(
            parse_uint64("-1"),
            Err(StateError::InvalidValue(_))
        ));
        assert!(matches!(
            parse_uint64("18446744073709551616"),
            Err(StateError::InvalidValue(_))
        ));
        assert!(parse_uint64("12abc").is_err());
        assert!(parse_uint64("").is_err());
    }

    #[test]
    fn test_u64_from_json() {
        let mode = AccessMode::ReadWrite;
        assert_eq!(u64::from_json(&json!(42), mode).unwrap(), 42);
        assert_eq!(u64::from_json(&json!("42"), mode).unwrap(), 42);
        assert_eq!(u64::from_json(&json!(42.0), mode).unwrap(), 42);
        assert!(matches!(
            u64::from_json(&json!(-1), mode),
            Err(StateError::InvalidValue(_))
        ));
        // 2^64 parses as a float and lands outside the uint64 range.
        assert!(matches!(
            u64::from_json(&json!(18446744073709551616.0), mode),
            Err(StateError::InvalidValue(_))
        ));
        assert!(u64::from_json(&json!(true), mode).is_err());
    }

    #[test]
    fn test_i64_accepts_integral_floats() {
        let mode = AccessMode::ReadWrite;
        assert_eq!(i64::from_json(&json!(1000.0), mode).unwrap(), 1000);
        assert_eq!(i64::from_json(&json!(-5), mode).unwrap(), -5);
        assert!(i64::from_json(&json!(1.5), mode).is_err());
    }

    #[test]
    fn test_fixed_array_length() {
        let mode = AccessMode::ReadWrite;
        let q = <[f32; 4]>::from_json(&json!([0.0, 0.0, 0.0, 1.0]), mode).unwrap();
        assert_eq!(q, [0.0, 0.0, 0.0, 1.0]);
        let err = <[f32; 4]>::from_json(&json!([1.0, 2.0]), mode).unwrap_err();
        assert!(matches!(err, StateError::TypeMismatch { .. }));
    }

    #[test]
    fn test_option_null() {
        let mode = AccessMode::ReadWrite;
        assert_eq!(
            <Option<String>>::from_json(&json!(null), mode).unwrap(),
            None
        );
        assert_eq!(
            <Option<String>>::from_json(&json!("x"), mode).unwrap(),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_number_or_string() {
        let mode = AccessMode::ReadWrite;
        assert_eq!(
            NumberOrString::from_json(&json!("12"), mode).unwrap(),
            NumberOrString::Number(Number::from(12))
        );
        assert_eq!(
            NumberOrString::from_json(&json!("-3"), mode).unwrap(),
            NumberOrString::Number(Number::from(-3))
        );
        assert_eq!(
            NumberOrString::from_json(&json!("1.5"), mode).unwrap().to_json(),
            json!(1.5)
        );
        assert_eq!(
            NumberOrString::from_json(&json!("#ff0000"), mode).unwrap(),
            NumberOrString::Text("#ff0000".to_string())
        );
        assert_eq!(
            NumberOrString::from_json(&json!(7), mode).unwrap().to_json(),
            json!(7)
        );
        assert!(NumberOrString::from_json(&json!(true), mode).is_err());
    }

    #[test]
    fn test_bool_or_string() {
        let mode = AccessMode::ReadWrite;
        assert_eq!(
            BoolOrString::from_json(&json!(false), mode).unwrap(),
            BoolOrString::Bool(false)
        );
        assert_eq!(
            BoolOrString::from_json(&json!("max"), mode).unwrap().as_token(),
            Some("max")
        );
        assert!(BoolOrString::from_json(&json!(1), mode).is_err());
    }

    #[test]
    fn test_deep_mutable_copy() {
        let original: Vec<f64> = vec![1.0, 2.0, 3.0];
        let copy = deep_mutable_copy(&original).unwrap();
        assert_eq!(original, copy);
    }

    #[test]
    fn test_access_mode() {
        assert!(AccessMode::ReadWrite.ensure_mutable().is_ok());
        assert_eq!(
            AccessMode::ReadOnly.ensure_mutable(),
            Err(StateError::ReadOnly)
        );
        assert!(AccessMode::ReadOnly.is_read_only());
    }
}
