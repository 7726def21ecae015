//! Equivalence classes over uint64 segment ids
//!
//! Segmentation layers can declare sets of segment ids that should be
//! treated as one object. The wire form is a list of groups; internally
//! the groups form a union-find structure, and encoding emits each class
//! in canonical sorted order so output is deterministic.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use imvox_json::{
    impl_json_eq, AccessMode, EmptyWithMode, FromJson, StateError, StateResult, ToJson,
};

/// Union-find over segment ids, with sorted canonical output.
#[derive(Debug, Clone)]
pub struct EquivalenceMap {
    // Merged-away slots stay behind as empty tombstones.
    classes: Vec<BTreeSet<u64>>,
    index: HashMap<u64, usize>,
    mode: AccessMode,
}

impl EquivalenceMap {
    pub fn new() -> Self {
        EquivalenceMap {
            classes: Vec::new(),
            index: HashMap::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// Number of ids that belong to some multi-member class.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether the two ids are in the same class.
    pub fn equivalent(&self, a: u64, b: u64) -> bool {
        if a == b {
            return true;
        }
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(ca), Some(cb)) => ca == cb,
            _ => false,
        }
    }

    /// Canonical representative of an id's class: the smallest member.
    /// An id never mentioned is its own representative.
    pub fn representative(&self, id: u64) -> u64 {
        match self.index.get(&id) {
            Some(&slot) => self.classes[slot].first().copied().unwrap_or(id),
            None => id,
        }
    }

    /// Members of an id's class in ascending order.
    pub fn members(&self, id: u64) -> Vec<u64> {
        match self.index.get(&id) {
            Some(&slot) => self.classes[slot].iter().copied().collect(),
            None => vec![id],
        }
    }

    /// Merges the classes of `a` and `b`.
    pub fn union(&mut self, a: u64, b: u64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.union_unchecked(a, b);
        Ok(())
    }

    fn union_unchecked(&mut self, a: u64, b: u64) {
        match (self.index.get(&a).copied(), self.index.get(&b).copied()) {
            (None, None) => {
                let slot = self.classes.len();
                self.classes.push(BTreeSet::from([a, b]));
                self.index.insert(a, slot);
                self.index.insert(b, slot);
            }
            (Some(slot), None) => {
                self.classes[slot].insert(b);
                self.index.insert(b, slot);
            }
            (None, Some(slot)) => {
                self.classes[slot].insert(a);
                self.index.insert(a, slot);
            }
            (Some(sa), Some(sb)) if sa != sb => {
                let merged = std::mem::take(&mut self.classes[sb]);
                for id in &merged {
                    self.index.insert(*id, sa);
                }
                self.classes[sa].extend(merged);
            }
            _ => {}
        }
    }

    /// Dissolves the class containing `id`.
    pub fn delete_set(&mut self, id: u64) -> StateResult<bool> {
        self.mode.ensure_mutable()?;
        match self.index.get(&id).copied() {
            Some(slot) => {
                for member in std::mem::take(&mut self.classes[slot]) {
                    self.index.remove(&member);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.classes.clear();
        self.index.clear();
        Ok(())
    }

    /// Classes with at least two members, each sorted, ordered by their
    /// smallest member.
    pub fn groups(&self) -> Vec<Vec<u64>> {
        let mut groups: Vec<Vec<u64>> = self
            .classes
            .iter()
            .filter(|class| class.len() > 1)
            .map(|class| class.iter().copied().collect())
            .collect();
        groups.sort_by_key(|group| group[0]);
        groups
    }
}

impl Default for EquivalenceMap {
    fn default() -> Self {
        EquivalenceMap::new()
    }
}

impl EmptyWithMode for EquivalenceMap {
    fn empty_with_mode(mode: AccessMode) -> Self {
        EquivalenceMap {
            classes: Vec::new(),
            index: HashMap::new(),
            mode,
        }
    }
}

impl FromJson for EquivalenceMap {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let raw = value
            .as_array()
            .ok_or_else(|| StateError::type_mismatch("array of groups", value))?;
        let mut map = EquivalenceMap::new();
        for group in raw {
            let ids = Vec::<u64>::from_json(group, mode)?;
            if let Some((&first, rest)) = ids.split_first() {
                if rest.is_empty() {
                    // A singleton group still registers its id.
                    map.union_unchecked(first, first);
                }
                for &id in rest {
                    map.union_unchecked(first, id);
                }
            }
        }
        map.mode = mode;
        Ok(map)
    }
}

impl ToJson for EquivalenceMap {
    fn to_json(&self) -> Value {
        Value::Array(
            self.groups()
                .into_iter()
                .map(|group| Value::Array(group.into_iter().map(|id| id.to_json()).collect()))
                .collect(),
        )
    }
}

impl_json_eq!(EquivalenceMap);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_groups_merge_and_canonicalize() {
        let map = EquivalenceMap::from_json(
            &json!([[40, 10, 30], [7, 5], [30, 2]]),
            AccessMode::ReadWrite,
        )
        .unwrap();
        assert!(map.equivalent(40, 2));
        assert!(!map.equivalent(40, 5));
        assert_eq!(map.representative(40), 2);
        assert_eq!(map.representative(5), 5);
        assert_eq!(map.to_json(), json!([[2, 10, 30, 40], [5, 7]]));
    }

    #[test]
    fn test_union_and_delete() {
        let mut map = EquivalenceMap::new();
        map.union(3, 9).unwrap();
        map.union(9, 1).unwrap();
        assert_eq!(map.members(3), vec![1, 3, 9]);
        assert!(map.delete_set(9).unwrap());
        assert!(!map.equivalent(3, 9));
        assert!(!map.delete_set(9).unwrap());
    }

    #[test]
    fn test_unknown_id_is_its_own_class() {
        let map = EquivalenceMap::new();
        assert_eq!(map.representative(12), 12);
        assert_eq!(map.members(12), vec![12]);
        assert!(map.equivalent(12, 12));
    }

    #[test]
    fn test_string_ids_accepted() {
        let map =
            EquivalenceMap::from_json(&json!([["5", 6]]), AccessMode::ReadWrite).unwrap();
        assert!(map.equivalent(5, 6));
    }

    #[test]
    fn test_read_only() {
        let mut map =
            EquivalenceMap::from_json(&json!([[1, 2]]), AccessMode::ReadOnly).unwrap();
        assert_eq!(map.union(3, 4), Err(StateError::ReadOnly));
        assert_eq!(map.clear(), Err(StateError::ReadOnly));
        assert!(map.equivalent(1, 2));
    }
}
