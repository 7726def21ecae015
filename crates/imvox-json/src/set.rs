//! Unordered-membership container that still iterates in insertion order

use serde_json::Value;

use crate::error::{StateError, StateResult};
use crate::value::{AccessMode, EmptyWithMode, FromJson, ToJson};

/// A JSON array treated as a set of unique elements.
///
/// Decoding drops duplicates, keeping the first occurrence; equality ignores
/// order, like a mathematical set, but iteration and encoding stay in
/// insertion order so output is deterministic.
#[derive(Debug, Clone)]
pub struct TypedSet<T> {
    items: Vec<T>,
    mode: AccessMode,
}

impl<T: PartialEq> TypedSet<T> {
    /// An empty, mutable set.
    pub fn new() -> Self {
        TypedSet {
            items: Vec::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Adds an element; returns whether it was newly inserted.
    pub fn add(&mut self, item: T) -> StateResult<bool> {
        self.mode.ensure_mutable()?;
        if self.items.contains(&item) {
            return Ok(false);
        }
        self.items.push(item);
        Ok(true)
    }

    /// Removes an element when present; absent elements are not an error.
    pub fn discard(&mut self, item: &T) -> StateResult<bool> {
        self.mode.ensure_mutable()?;
        match self.items.iter().position(|i| i == item) {
            Some(pos) => {
                self.items.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Adds every element of `iter`.
    pub fn update(&mut self, iter: impl IntoIterator<Item = T>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        for item in iter {
            if !self.items.contains(&item) {
                self.items.push(item);
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.items.clear();
        Ok(())
    }
}

impl<T: PartialEq> Default for TypedSet<T> {
    fn default() -> Self {
        TypedSet::new()
    }
}

impl<T: PartialEq> EmptyWithMode for TypedSet<T> {
    fn empty_with_mode(mode: AccessMode) -> Self {
        TypedSet {
            items: Vec::new(),
            mode,
        }
    }
}

impl<T: PartialEq> FromIterator<T> for TypedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = TypedSet::new();
        for item in iter {
            if !set.items.contains(&item) {
                set.items.push(item);
            }
        }
        set
    }
}

impl<T: PartialEq> PartialEq for TypedSet<T> {
    /// Set equality ignores insertion order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.items.iter().all(|item| other.contains(item))
    }
}

impl<T: FromJson + PartialEq> FromJson for TypedSet<T> {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let raw = value
            .as_array()
            .ok_or_else(|| StateError::type_mismatch("array", value))?;
        let mut items: Vec<T> = Vec::with_capacity(raw.len());
        for item in raw {
            let item = T::from_json(item, mode)?;
            if !items.contains(&item) {
                items.push(item);
            }
        }
        Ok(TypedSet { items, mode })
    }
}

impl<T: ToJson> ToJson for TypedSet<T> {
    fn to_json(&self) -> Value {
        Value::Array(self.items.iter().map(ToJson::to_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_dedupes_keeping_first() {
        let set =
            TypedSet::<i64>::from_json(&json!([3, 1, 3, 2, 1]), AccessMode::ReadWrite).unwrap();
        assert_eq!(set.to_json(), json!([3, 1, 2]));
    }

    #[test]
    fn test_membership_ops() {
        let mut set = TypedSet::<String>::new();
        assert!(set.add("a".to_string()).unwrap());
        assert!(!set.add("a".to_string()).unwrap());
        set.update(["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.discard(&"a".to_string()).unwrap());
        assert!(!set.discard(&"a".to_string()).unwrap());
        assert!(set.contains(&"b".to_string()));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = TypedSet::<i64>::from_json(&json!([1, 2, 3]), AccessMode::ReadWrite).unwrap();
        let b = TypedSet::<i64>::from_json(&json!([3, 2, 1]), AccessMode::ReadWrite).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_read_only() {
        let mut set = TypedSet::<i64>::from_json(&json!([1]), AccessMode::ReadOnly).unwrap();
        assert_eq!(set.add(2), Err(StateError::ReadOnly));
        assert_eq!(set.discard(&1), Err(StateError::ReadOnly));
        assert!(set.contains(&1));
    }
}
