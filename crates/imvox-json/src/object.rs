//! Decode cursor and emit helpers for JSON objects
//!
//! Decoding a wrapped structure walks a [`JsonObject`] cursor: each declared
//! key is taken out of the map, validated, and stored in a typed field; the
//! keys nobody claimed survive as the extra map and are replayed on encode.

use serde_json::{Map, Value};

use crate::error::{StateError, StateResult};
use crate::value::{AccessMode, EmptyWithMode, FromJson, ToJson};

// Keeps the key visible in coercion failures.
fn tag_key(err: StateError, key: &str) -> StateError {
    match err {
        StateError::TypeMismatch { expected, actual } => StateError::TypeMismatch {
            expected: format!("{expected} for key {key:?}"),
            actual,
        },
        other => other,
    }
}

/// Consuming view over one JSON object during decoding.
#[derive(Debug, Clone)]
pub struct JsonObject {
    map: Map<String, Value>,
    mode: AccessMode,
}

impl JsonObject {
    /// Starts a cursor over `value`, which must be a JSON object.
    pub fn from_value(value: &Value, mode: AccessMode) -> StateResult<Self> {
        match value {
            Value::Object(map) => Ok(JsonObject {
                map: map.clone(),
                mode,
            }),
            _ => Err(StateError::type_mismatch("object", value)),
        }
    }

    /// An empty cursor, used when building defaults.
    pub fn empty(mode: AccessMode) -> Self {
        JsonObject {
            map: Map::new(),
            mode,
        }
    }

    /// The access mode nested values inherit.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Removes `key` and decodes it, treating absent and `null` as `None`.
    pub fn take<T: FromJson>(&mut self, key: &str) -> StateResult<Option<T>> {
        match self.map.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => T::from_json(&raw, self.mode)
                .map(Some)
                .map_err(|err| tag_key(err, key)),
        }
    }

    /// Removes `key` and decodes it, failing when it is absent or `null`.
    pub fn require<T: FromJson>(&mut self, key: &str) -> StateResult<T> {
        self.take(key)?
            .ok_or_else(|| StateError::missing_field(key))
    }

    /// Removes `key` and decodes it, with absent and `null` decoding to an
    /// empty container that inherits this object's access mode.
    pub fn take_or_empty<T: FromJson + EmptyWithMode>(&mut self, key: &str) -> StateResult<T> {
        match self.map.remove(key) {
            None | Some(Value::Null) => Ok(T::empty_with_mode(self.mode)),
            Some(raw) => T::from_json(&raw, self.mode).map_err(|err| tag_key(err, key)),
        }
    }

    /// Removes `key` without decoding it.
    pub fn take_value(&mut self, key: &str) -> Option<Value> {
        match self.map.remove(key) {
            None | Some(Value::Null) => None,
            Some(raw) => Some(raw),
        }
    }

    /// Whether `key` is still present on the cursor.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// The keys nobody claimed, preserved verbatim for re-encoding.
    pub fn into_extra(self) -> Map<String, Value> {
        self.map
    }
}

/// Inserts `key` unconditionally.
pub fn emit<T: ToJson>(map: &mut Map<String, Value>, key: &str, value: &T) {
    map.insert(key.to_string(), value.to_json());
}

/// Inserts `key` only when the field holds a value.
pub fn emit_field<T: ToJson>(map: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v.to_json());
    }
}

/// Inserts `key` unless the encoded value is an empty object or array.
pub fn emit_nonempty(map: &mut Map<String, Value>, key: &str, value: Value) {
    let skip = match &value {
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    };
    if !skip {
        map.insert(key.to_string(), value);
    }
}

/// Replays preserved unknown keys into an output map.
pub fn extend_extra(map: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        map.insert(key.clone(), value.clone());
    }
}

/// Derives `PartialEq` from the encoded JSON form.
///
/// Object comparison through `serde_json::Value` ignores key order, which
/// matches the wire contract: two states are equal when they serialize to
/// the same JSON.
#[macro_export]
macro_rules! impl_json_eq {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    $crate::ToJson::to_json(self) == $crate::ToJson::to_json(other)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_and_extra() {
        let input = json!({"a": 1, "b": "x", "custom": {"nested": true}});
        let mut obj = JsonObject::from_value(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(obj.take::<i64>("a").unwrap(), Some(1));
        assert_eq!(obj.take::<String>("b").unwrap(), Some("x".to_string()));
        assert_eq!(obj.take::<i64>("missing").unwrap(), None);
        let extra = obj.into_extra();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra["custom"], json!({"nested": true}));
    }

    #[test]
    fn test_null_reads_as_absent() {
        let input = json!({"a": null});
        let mut obj = JsonObject::from_value(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(obj.take::<i64>("a").unwrap(), None);
        assert!(obj.into_extra().is_empty());
    }

    #[test]
    fn test_require_missing_field() {
        let input = json!({});
        let mut obj = JsonObject::from_value(&input, AccessMode::ReadWrite).unwrap();
        let err = obj.require::<String>("type").unwrap_err();
        assert!(matches!(err, StateError::InvalidValue(_)));
    }

    #[test]
    fn test_take_reports_key_on_mismatch() {
        let input = json!({"opacity": "high"});
        let mut obj = JsonObject::from_value(&input, AccessMode::ReadWrite).unwrap();
        let err = obj.take::<f64>("opacity").unwrap_err();
        assert!(err.to_string().contains("opacity"));
    }

    #[test]
    fn test_take_or_empty_inherits_mode() {
        let mut obj = JsonObject::from_value(&json!({}), AccessMode::ReadOnly).unwrap();
        let mut list: crate::TypedList<i64> = obj.take_or_empty("items").unwrap();
        assert!(list.is_empty());
        assert!(list.push(1).is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = JsonObject::from_value(&json!([1, 2]), AccessMode::ReadWrite).unwrap_err();
        assert!(matches!(err, StateError::TypeMismatch { .. }));
    }

    #[test]
    fn test_emit_helpers() {
        let mut map = Map::new();
        emit(&mut map, "always", &1i64);
        emit_field(&mut map, "present", &Some(2i64));
        emit_field::<i64>(&mut map, "absent", &None);
        emit_nonempty(&mut map, "empty", json!({}));
        emit_nonempty(&mut map, "full", json!({"k": 1}));
        assert_eq!(
            Value::Object(map),
            json!({"always": 1, "present": 2, "full": {"k": 1}})
        );
    }
}
