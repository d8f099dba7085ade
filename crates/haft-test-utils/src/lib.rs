//! Reference models and invariant checks for Haft development.
//!
//! The models are deliberately naive: plain collections whose behaviour is
//! obvious, driven in lockstep with the real structures by integration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use haft_alloc::{HandleMap, HandleSet, KeyedHandleSet, LruHandleSet};
use haft_core::{HandleIndex, MapKey};
use indexmap::IndexMap;

/// The first `count` keys (scanning upward from zero) whose home slot is
/// `slot` in a table of `capacity` slots.
///
/// Used to build deliberate collision chains, including runs that start in
/// the last slot and wrap to the front of the table.
pub fn keys_homed_at(capacity: usize, slot: usize, count: usize) -> Vec<u32> {
    assert!(slot < capacity, "slot {slot} outside table of {capacity}");
    (0u32..)
        .filter(|&k| k.home_slot(capacity) == slot)
        .take(count)
        .collect()
}

/// Assert the allocator's dense view agrees with its validity checks.
pub fn assert_set_consistent<H: HandleIndex>(set: &HandleSet<H>) {
    let live = set.handles();
    assert_eq!(live.len(), set.len());
    let mut seen = HashSet::with_capacity(live.len());
    for &h in live {
        assert!(seen.insert(h), "handle {h} appears twice in dense view");
        assert!(set.is_valid(h), "dense handle {h} reports invalid");
    }
    let valid = (0..set.max_handles())
        .filter(|&i| set.is_valid(H::from_index(i)))
        .count();
    assert_eq!(valid, set.len(), "validity disagrees with dense count");
}

/// Assert every entry of `map` is reachable by lookup and every key in
/// `expected` maps to its handle.
pub fn assert_map_matches<K, H>(map: &HandleMap<K, H>, expected: &IndexMap<K, H>)
where
    K: MapKey + Hash,
    H: HandleIndex,
{
    assert_eq!(map.len(), expected.len());
    for (&k, &h) in expected {
        assert_eq!(map.find(k), Some(h), "key {k:?} not found");
    }
    for (k, h) in map.iter() {
        assert_eq!(expected.get(&k), Some(&h), "unexpected entry {k:?} -> {h}");
    }
}

/// Reference model of a keyed handle set: live registrations in
/// registration order.
#[derive(Debug, Default)]
pub struct ModelKeyed<K: Hash + Eq, H> {
    pub entries: IndexMap<K, H>,
    pub max_handles: usize,
}

impl<K: MapKey + Hash, H: HandleIndex> ModelKeyed<K, H> {
    pub fn new(max_handles: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_handles,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.max_handles
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn record(&mut self, key: K, handle: H) {
        let prev = self.entries.insert(key, handle);
        assert!(prev.is_none(), "model already holds key {key:?}");
    }

    pub fn forget_key(&mut self, key: K) -> Option<H> {
        self.entries.shift_remove(&key)
    }

    pub fn forget_handle(&mut self, handle: H) -> Option<K> {
        let pos = self.entries.values().position(|&h| h == handle)?;
        self.entries.shift_remove_index(pos).map(|(k, _)| k)
    }

    /// Key at position `pick` (modulo the live count).
    pub fn nth_key(&self, pick: usize) -> Option<K> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries
            .get_index(pick % self.entries.len())
            .map(|(&k, _)| k)
    }
}

/// Assert a keyed set and its model agree in both directions.
pub fn assert_keyed_matches<K, H>(set: &KeyedHandleSet<K, H>, model: &ModelKeyed<K, H>)
where
    K: MapKey + Hash,
    H: HandleIndex,
{
    assert_eq!(set.len(), model.len());
    for (&k, &h) in &model.entries {
        assert_eq!(set.find(k), Some(h), "key {k:?} lost");
        assert!(set.is_valid(h), "handle {h} of key {k:?} not live");
    }
    let mut live: Vec<H> = set.handles().to_vec();
    let mut expected: Vec<H> = model.entries.values().copied().collect();
    live.sort_unstable();
    expected.sort_unstable();
    assert_eq!(live, expected);
}

/// Reference model of LRU order: front is most recently used.
#[derive(Debug, Default)]
pub struct ModelLru<H> {
    pub order: VecDeque<H>,
}

impl<H: Copy + Eq + Debug> ModelLru<H> {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    pub fn alloc(&mut self, handle: H) {
        assert!(!self.order.contains(&handle), "model already holds {handle:?}");
        self.order.push_front(handle);
    }

    pub fn touch(&mut self, handle: H) {
        self.free(handle);
        self.order.push_front(handle);
    }

    pub fn free(&mut self, handle: H) {
        let pos = self
            .order
            .iter()
            .position(|&h| h == handle)
            .unwrap_or_else(|| panic!("model does not hold {handle:?}"));
        self.order.remove(pos);
    }

    pub fn nth(&self, pick: usize) -> Option<H> {
        if self.order.is_empty() {
            return None;
        }
        self.order.get(pick % self.order.len()).copied()
    }
}

/// Assert an LRU set's recency order and link walk match the model.
pub fn assert_lru_matches<H: HandleIndex>(lru: &LruHandleSet<H>, model: &ModelLru<H>) {
    let order: Vec<H> = lru.iter().collect();
    let expected: Vec<H> = model.order.iter().copied().collect();
    assert_eq!(order, expected);
    assert_eq!(lru.front(), model.order.front().copied());
    assert_eq!(lru.back(), model.order.back().copied());
    let mut backwards = Vec::with_capacity(order.len());
    let mut cursor = lru.back();
    while let Some(h) = cursor {
        backwards.push(h);
        cursor = lru.prev(h);
    }
    backwards.reverse();
    assert_eq!(backwards, expected, "prev links disagree with next links");
}
