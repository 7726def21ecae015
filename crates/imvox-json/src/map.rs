//! Keyed container that keeps insertion order
//!
//! JSON object keys are always strings on the wire, so keys round-trip
//! through the [`JsonKey`] trait; segment-color maps use uint64 keys.

use std::collections::HashMap;
use std::hash::Hash;

use serde_json::{Map, Value};

use crate::error::{StateError, StateResult};
use crate::value::{parse_uint64, AccessMode, EmptyWithMode, FromJson, ToJson};

/// Key type usable in a [`TypedMap`].
pub trait JsonKey: Clone + Eq + Hash {
    /// Decodes a JSON object key.
    fn parse_key(key: &str) -> StateResult<Self>;
    /// Encodes back to a JSON object key.
    fn encode_key(&self) -> String;
}

impl JsonKey for String {
    fn parse_key(key: &str) -> StateResult<Self> {
        Ok(key.to_string())
    }

    fn encode_key(&self) -> String {
        self.clone()
    }
}

impl JsonKey for u64 {
    fn parse_key(key: &str) -> StateResult<Self> {
        parse_uint64(key)
    }

    fn encode_key(&self) -> String {
        self.to_string()
    }
}

/// A JSON object decoded into typed key/value pairs, preserving insertion
/// order.
///
/// Overwriting an existing key keeps its original position. Lookup misses on
/// removal fail with [`StateError::NotFound`].
#[derive(Debug, Clone)]
pub struct TypedMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
    mode: AccessMode,
}

impl<K: JsonKey, V> TypedMap<K, V> {
    /// An empty, mutable map.
    pub fn new() -> Self {
        TypedMap {
            entries: Vec::new(),
            index: HashMap::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Mutable access to one value, gated on the access mode.
    pub fn get_mut(&mut self, key: &K) -> StateResult<Option<&mut V>> {
        self.mode.ensure_mutable()?;
        match self.index.get(key) {
            Some(&pos) => Ok(Some(&mut self.entries[pos].1)),
            None => Ok(None),
        }
    }

    /// Inserts or overwrites; an overwritten key keeps its position.
    pub fn insert(&mut self, key: K, value: V) -> StateResult<Option<V>> {
        self.mode.ensure_mutable()?;
        match self.index.get(&key) {
            Some(&pos) => {
                let old = std::mem::replace(&mut self.entries[pos].1, value);
                Ok(Some(old))
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                Ok(None)
            }
        }
    }

    /// Inserts every pair in order; later pairs win on duplicate keys.
    pub fn update(&mut self, iter: impl IntoIterator<Item = (K, V)>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        for (key, value) in iter {
            let _ = self.insert(key, value)?;
        }
        Ok(())
    }

    /// Removes `key`, failing with [`StateError::NotFound`] when absent.
    pub fn remove(&mut self, key: &K) -> StateResult<V> {
        self.mode.ensure_mutable()?;
        let pos = self
            .index
            .remove(key)
            .ok_or_else(|| StateError::NotFound(format!("key {:?}", key.encode_key())))?;
        let (_, value) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Ok(value)
    }

    pub fn clear(&mut self) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.entries.clear();
        self.index.clear();
        Ok(())
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: JsonKey, V> Default for TypedMap<K, V> {
    fn default() -> Self {
        TypedMap::new()
    }
}

impl<K: JsonKey, V> EmptyWithMode for TypedMap<K, V> {
    fn empty_with_mode(mode: AccessMode) -> Self {
        TypedMap {
            entries: Vec::new(),
            index: HashMap::new(),
            mode,
        }
    }
}

impl<K: JsonKey, V> FromIterator<(K, V)> for TypedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TypedMap::new();
        for (k, v) in iter {
            let _ = map.insert(k, v);
        }
        map
    }
}

impl<K: JsonKey, V: PartialEq> PartialEq for TypedMap<K, V> {
    /// Map equality ignores insertion order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl<K: JsonKey, V: FromJson> FromJson for TypedMap<K, V> {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let raw = value
            .as_object()
            .ok_or_else(|| StateError::type_mismatch("object", value))?;
        let mut entries = Vec::with_capacity(raw.len());
        let mut index = HashMap::with_capacity(raw.len());
        for (key, item) in raw {
            let key = K::parse_key(key)?;
            let item = V::from_json(item, mode)?;
            index.insert(key.clone(), entries.len());
            entries.push((key, item));
        }
        Ok(TypedMap {
            entries,
            index,
            mode,
        })
    }
}

impl<K: JsonKey, V: ToJson> ToJson for TypedMap<K, V> {
    fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            map.insert(key.encode_key(), value.to_json());
        }
        Value::Object(map)
    }
}
