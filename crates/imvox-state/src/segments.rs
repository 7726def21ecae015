//! Starred segment lists and the live visible-subset view
//!
//! A segmentation layer keeps one ordered list of starred segments, each
//! flagged visible or hidden. [`VisibleSegments`] is a view over the same
//! backing store, so changes through either handle are seen by both. Wire
//! form is a list of decimal-digit strings, with a `!` prefix marking a
//! starred-but-hidden segment.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use imvox_json::{
    parse_uint64, AccessMode, EmptyWithMode, FromJson, StateError, StateResult, ToJson,
};

/// Insertion-ordered segment id to visibility flag mapping.
#[derive(Debug, Default)]
struct SegmentStore {
    entries: Vec<(u64, bool)>,
    index: HashMap<u64, usize>,
}

impl SegmentStore {
    fn get(&self, id: u64) -> Option<bool> {
        self.index.get(&id).map(|&pos| self.entries[pos].1)
    }

    fn insert(&mut self, id: u64, visible: bool) {
        match self.index.get(&id) {
            Some(&pos) => self.entries[pos].1 = visible,
            None => {
                self.index.insert(id, self.entries.len());
                self.entries.push((id, visible));
            }
        }
    }

    fn remove(&mut self, id: u64) -> Option<bool> {
        let pos = self.index.remove(&id)?;
        let (_, visible) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(visible)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

/// One segment given to [`StarredSegments::update`], in any accepted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentSpec {
    /// A segment id, starred visible
    Id(u64),
    /// A segment id with an explicit visibility flag
    Flagged(u64, bool),
    /// Wire form: decimal digits, `!`-prefixed when hidden
    Encoded(String),
}

impl SegmentSpec {
    fn resolve(&self) -> StateResult<(u64, bool)> {
        match self {
            SegmentSpec::Id(id) => Ok((*id, true)),
            SegmentSpec::Flagged(id, visible) => Ok((*id, *visible)),
            SegmentSpec::Encoded(s) => match s.strip_prefix('!') {
                Some(rest) => Ok((parse_uint64(rest)?, false)),
                None => Ok((parse_uint64(s)?, true)),
            },
        }
    }
}

impl From<u64> for SegmentSpec {
    fn from(id: u64) -> Self {
        SegmentSpec::Id(id)
    }
}

impl From<(u64, bool)> for SegmentSpec {
    fn from((id, visible): (u64, bool)) -> Self {
        SegmentSpec::Flagged(id, visible)
    }
}

impl From<&str> for SegmentSpec {
    fn from(s: &str) -> Self {
        SegmentSpec::Encoded(s.to_string())
    }
}

impl From<String> for SegmentSpec {
    fn from(s: String) -> Self {
        SegmentSpec::Encoded(s)
    }
}

/// The starred segments of a segmentation layer, in insertion order.
pub struct StarredSegments {
    store: Rc<RefCell<SegmentStore>>,
    mode: AccessMode,
}

impl StarredSegments {
    pub fn new() -> Self {
        StarredSegments {
            store: Rc::new(RefCell::new(SegmentStore::default())),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn len(&self) -> usize {
        self.store.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().entries.is_empty()
    }

    /// Whether `id` is starred, visible or not.
    pub fn contains(&self, id: u64) -> bool {
        self.store.borrow().index.contains_key(&id)
    }

    /// Visibility of a starred segment; `None` when not starred.
    pub fn get(&self, id: u64) -> Option<bool> {
        self.store.borrow().get(id)
    }

    /// Stars a segment as visible; a segment already starred keeps its
    /// current visibility.
    pub fn add(&mut self, id: u64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        let mut store = self.store.borrow_mut();
        if store.get(id).is_none() {
            store.insert(id, true);
        }
        Ok(())
    }

    /// Stars a segment with an explicit visibility, overwriting any
    /// existing flag.
    pub fn insert(&mut self, id: u64, visible: bool) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.store.borrow_mut().insert(id, visible);
        Ok(())
    }

    /// Unstars a segment, failing with [`StateError::NotFound`] when it is
    /// not starred.
    pub fn remove(&mut self, id: u64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        match self.store.borrow_mut().remove(id) {
            Some(_) => Ok(()),
            None => Err(StateError::NotFound(format!("segment {id}"))),
        }
    }

    /// Unstars a segment when present.
    pub fn discard(&mut self, id: u64) -> StateResult<bool> {
        self.mode.ensure_mutable()?;
        Ok(self.store.borrow_mut().remove(id).is_some())
    }

    /// Unstars every segment.
    pub fn clear(&mut self) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.store.borrow_mut().clear();
        Ok(())
    }

    /// Merges in segments given in any [`SegmentSpec`] form.
    ///
    /// Every spec is resolved before any is applied, so an invalid entry
    /// leaves the list untouched. Later entries for the same id win.
    pub fn update<S: Into<SegmentSpec>>(
        &mut self,
        specs: impl IntoIterator<Item = S>,
    ) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        let resolved = specs
            .into_iter()
            .map(|spec| spec.into().resolve())
            .collect::<StateResult<Vec<_>>>()?;
        let mut store = self.store.borrow_mut();
        for (id, visible) in resolved {
            store.insert(id, visible);
        }
        Ok(())
    }

    /// Merges in another starred list; its visibility flags overwrite ours.
    pub fn merge(&mut self, other: &StarredSegments) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        let pairs = other.store.borrow().entries.clone();
        let mut store = self.store.borrow_mut();
        for (id, visible) in pairs {
            store.insert(id, visible);
        }
        Ok(())
    }

    /// `(id, visible)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, bool)> {
        self.store.borrow().entries.clone().into_iter()
    }

    /// Starred ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = u64> {
        self.iter().map(|(id, _)| id)
    }

    /// A live view of the visible subset, sharing this backing store.
    pub fn visible(&self) -> VisibleSegments {
        VisibleSegments {
            store: Rc::clone(&self.store),
            mode: self.mode,
        }
    }

    /// Replaces the entire starred list with the given segments, all
    /// visible.
    pub fn set_visible(&mut self, ids: impl IntoIterator<Item = u64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        let mut store = self.store.borrow_mut();
        store.clear();
        for id in ids {
            store.insert(id, true);
        }
        Ok(())
    }
}

impl Default for StarredSegments {
    fn default() -> Self {
        StarredSegments::new()
    }
}

impl EmptyWithMode for StarredSegments {
    fn empty_with_mode(mode: AccessMode) -> Self {
        StarredSegments {
            store: Rc::new(RefCell::new(SegmentStore::default())),
            mode,
        }
    }
}

impl Clone for StarredSegments {
    /// Cloning detaches: the copy owns fresh, mutable storage and never
    /// aliases the original.
    fn clone(&self) -> Self {
        let store = self.store.borrow();
        StarredSegments {
            store: Rc::new(RefCell::new(SegmentStore {
                entries: store.entries.clone(),
                index: store.index.clone(),
            })),
            mode: AccessMode::ReadWrite,
        }
    }
}

impl std::fmt::Debug for StarredSegments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl PartialEq for StarredSegments {
    /// Equality compares the id to flag mapping, ignoring order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(id, v)| other.get(id) == Some(v))
    }
}

impl FromJson for StarredSegments {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| StateError::type_mismatch("array", value))?;
        let mut store = SegmentStore::default();
        for item in items {
            let (id, visible) = match item {
                Value::Number(n) => {
                    if let Some(id) = n.as_u64() {
                        (id, true)
                    } else if n.is_i64() {
                        return Err(StateError::InvalidValue(format!("invalid uint64: {n}")));
                    } else {
                        return Err(StateError::type_mismatch("uint64 or string", item));
                    }
                }
                Value::String(s) => SegmentSpec::Encoded(s.clone()).resolve()?,
                _ => return Err(StateError::type_mismatch("uint64 or string", item)),
            };
            store.insert(id, visible);
        }
        Ok(StarredSegments {
            store: Rc::new(RefCell::new(store)),
            mode,
        })
    }
}

impl ToJson for StarredSegments {
    fn to_json(&self) -> Value {
        Value::Array(
            self.iter()
                .map(|(id, visible)| {
                    Value::String(if visible { format!("{id}") } else { format!("!{id}") })
                })
                .collect(),
        )
    }
}

/// Live view of the visible segments within a [`StarredSegments`] list.
pub struct VisibleSegments {
    store: Rc<RefCell<SegmentStore>>,
    mode: AccessMode,
}

impl VisibleSegments {
    /// Number of visible segments.
    pub fn len(&self) -> usize {
        self.store
            .borrow()
            .entries
            .iter()
            .filter(|(_, visible)| *visible)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` is starred and visible.
    pub fn contains(&self, id: u64) -> bool {
        self.store.borrow().get(id) == Some(true)
    }

    /// Stars a segment and marks it visible.
    pub fn add(&mut self, id: u64) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.store.borrow_mut().insert(id, true);
        Ok(())
    }

    /// Unstars a segment entirely, hidden or not.
    pub fn discard(&mut self, id: u64) -> StateResult<bool> {
        self.mode.ensure_mutable()?;
        Ok(self.store.borrow_mut().remove(id).is_some())
    }

    /// Unstars every segment, not just the visible ones.
    pub fn clear(&mut self) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.store.borrow_mut().clear();
        Ok(())
    }

    /// Visible ids in starred order.
    pub fn iter(&self) -> impl Iterator<Item = u64> {
        self.store
            .borrow()
            .entries
            .iter()
            .filter(|(_, visible)| *visible)
            .map(|(id, _)| *id)
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// A detached copy holding only the currently visible segments.
    pub fn copy(&self) -> VisibleSegments {
        let mut store = SegmentStore::default();
        for id in self.iter() {
            store.insert(id, true);
        }
        VisibleSegments {
            store: Rc::new(RefCell::new(store)),
            mode: AccessMode::ReadWrite,
        }
    }
}

impl std::fmt::Debug for VisibleSegments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl PartialEq for VisibleSegments {
    /// Set equality over visible ids.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }
}
