//! Ordered, homogeneous container with validate-before-write semantics

use serde_json::Value;

use crate::error::{StateError, StateResult};
use crate::value::{AccessMode, EmptyWithMode, FromJson, ToJson};

/// A JSON array decoded into typed elements, preserving order.
///
/// Mutations respect the access mode of the tree the list was decoded from;
/// out-of-range indices fail with [`StateError::NotFound`].
#[derive(Debug, Clone)]
pub struct TypedList<T> {
    items: Vec<T>,
    mode: AccessMode,
}

impl<T> TypedList<T> {
    /// An empty, mutable list.
    pub fn new() -> Self {
        TypedList {
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

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Mutable access to one element, gated on the access mode.
    pub fn get_mut(&mut self, index: usize) -> StateResult<&mut T> {
        self.mode.ensure_mutable()?;
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or_else(|| index_error(index, len))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Appends an element.
    pub fn push(&mut self, item: T) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.items.push(item);
        Ok(())
    }

    /// Inserts before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, item: T) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        if index > self.items.len() {
            return Err(index_error(index, self.items.len()));
        }
        self.items.insert(index, item);
        Ok(())
    }

    /// Replaces the element at `index`.
    pub fn set(&mut self, index: usize, item: T) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        let len = self.items.len();
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(index_error(index, len)),
        }
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&mut self, index: usize) -> StateResult<T> {
        self.mode.ensure_mutable()?;
        if index >= self.items.len() {
            return Err(index_error(index, self.items.len()));
        }
        Ok(self.items.remove(index))
    }

    /// Appends every element of `iter`.
    pub fn extend(&mut self, iter: impl IntoIterator<Item = T>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.items.extend(iter);
        Ok(())
    }

    pub fn clear(&mut self) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.items.clear();
        Ok(())
    }
}

fn index_error(index: usize, len: usize) -> StateError {
    StateError::NotFound(format!("index {index} out of range for list of length {len}"))
}

impl<T> Default for TypedList<T> {
    fn default() -> Self {
        TypedList::new()
    }
}

impl<T> EmptyWithMode for TypedList<T> {
    fn empty_with_mode(mode: AccessMode) -> Self {
        TypedList {
            items: Vec::new(),
            mode,
        }
    }
}

impl<T> From<Vec<T>> for TypedList<T> {
    fn from(items: Vec<T>) -> Self {
        TypedList {
            items,
            mode: AccessMode::ReadWrite,
        }
    }
}

impl<T> FromIterator<T> for TypedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        TypedList::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<'a, T> IntoIterator for &'a TypedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: PartialEq> PartialEq for TypedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: FromJson> FromJson for TypedList<T> {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let items = Vec::<T>::from_json(value, mode)?;
        Ok(TypedList { items, mode })
    }
}

impl<T: ToJson> ToJson for TypedList<T> {
    fn to_json(&self) -> Value {
        Value::Array(self.items.iter().map(ToJson::to_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_preserves_order() {
        let list =
            TypedList::<i64>::from_json(&json!([3, 1, 2]), AccessMode::ReadWrite).unwrap();
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(list.to_json(), json!([3, 1, 2]));
    }

    #[test]
    fn test_element_validation_is_eager() {
        let err = TypedList::<i64>::from_json(&json!([1, "x", 3]), AccessMode::ReadWrite)
            .unwrap_err();
        assert!(matches!(err, StateError::TypeMismatch { .. }));
    }

    #[test]
    fn test_mutation() {
        let mut list = TypedList::<String>::new();
        list.push("a".to_string()).unwrap();
        list.push("c".to_string()).unwrap();
        list.insert(1, "b".to_string()).unwrap();
        list.set(2, "C".to_string()).unwrap();
        assert_eq!(list.to_json(), json!(["a", "b", "C"]));
        assert_eq!(list.remove(0).unwrap(), "a");
        assert!(matches!(list.remove(5), Err(StateError::NotFound(_))));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let mut list = TypedList::<i64>::from_json(&json!([1]), AccessMode::ReadOnly).unwrap();
        assert_eq!(list.push(2), Err(StateError::ReadOnly));
        assert_eq!(list.set(0, 9), Err(StateError::ReadOnly));
        assert_eq!(list.clear(), Err(StateError::ReadOnly));
        assert_eq!(list.get(0), Some(&1));
    }
}
