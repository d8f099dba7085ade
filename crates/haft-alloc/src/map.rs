//! Open-addressing map from keys to handles.
//!
//! [`HandleMap`] stores `(key, handle)` slot records in one fixed block and
//! resolves collisions by linear probing from `mix(key) % capacity`. A slot
//! is empty iff its handle is the sentinel.
//!
//! # No-gap invariant
//!
//! For every occupied slot, probing from its key's home slot reaches it
//! without crossing an empty slot. Lookups rely on this to stop at the first
//! empty slot. Removal keeps it without tombstones: after vacating a slot it
//! walks the run of occupied slots that follows (wrapping at the end of the
//! table) and re-inserts every entry whose probe would now stop at the gap.

use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use haft_core::{Handle, HandleError, HandleIndex, MapKey};

use crate::storage::{HeapProvider, SlotBlock, SlotProvider};

/// Largest slot count a map accepts.
pub const MAX_MAP_CAPACITY: usize = u32::MAX as usize;

#[derive(Clone, Copy, Debug)]
struct Slot<K, H> {
    key: K,
    handle: H,
}

/// Fixed-capacity key to handle map.
///
/// Size the table at roughly 1.5x the number of live entries to keep probe
/// sequences short. It never grows.
pub struct HandleMap<K: MapKey, H: HandleIndex = Handle> {
    slots: SlotBlock<Slot<K, H>>,
    len: usize,
}

impl<K: MapKey, H: HandleIndex> HandleMap<K, H> {
    /// Create a map with `capacity` slots on the global heap.
    pub fn new(capacity: usize) -> Result<Self, HandleError> {
        Self::with_provider(&Arc::new(HeapProvider), capacity)
    }

    /// Create a map whose slot block comes from `provider`.
    pub fn with_provider<P: SlotProvider + 'static>(
        provider: &Arc<P>,
        capacity: usize,
    ) -> Result<Self, HandleError> {
        if capacity == 0 || capacity > MAX_MAP_CAPACITY {
            return Err(HandleError::InvalidCapacity {
                requested: capacity,
                max: MAX_MAP_CAPACITY,
            });
        }
        let empty = Slot {
            key: K::default(),
            handle: H::INVALID,
        };
        let slots = SlotBlock::acquire(provider, capacity, empty)?;
        tracing::debug!(capacity, "handle map created");
        Ok(Self { slots, len: 0 })
    }

    /// Insert `key -> handle`.
    ///
    /// Fails with [`HandleError::SentinelHandle`] for the sentinel,
    /// [`HandleError::DuplicateKey`] if `key` is present, and
    /// [`HandleError::MapFull`] if the probe wraps without finding an empty
    /// slot. O(1) expected, O(capacity) worst case.
    pub fn insert(&mut self, key: K, handle: H) -> Result<(), HandleError> {
        if handle.is_invalid() {
            return Err(HandleError::SentinelHandle);
        }
        let first = key.home_slot(self.slots.len());
        let mut idx = first;
        loop {
            let slot = &mut self.slots[idx];
            if slot.handle.is_invalid() {
                *slot = Slot { key, handle };
                self.len += 1;
                return Ok(());
            }
            if slot.key == key {
                return Err(HandleError::DuplicateKey);
            }
            idx = self.next_slot(idx);
            if idx == first {
                return Err(HandleError::MapFull {
                    capacity: self.slots.len(),
                });
            }
        }
    }

    /// Handle stored under `key`.
    #[inline]
    pub fn find(&self, key: K) -> Option<H> {
        self.find_index(key).map(|idx| self.slots[idx].handle)
    }

    /// Whether `key` is present.
    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        self.find_index(key).is_some()
    }

    /// Remove `key`, returning the handle it mapped to.
    pub fn remove_by_key(&mut self, key: K) -> Option<H> {
        let idx = self.find_index(key)?;
        let handle = self.slots[idx].handle;
        self.remove_index(idx);
        Some(handle)
    }

    /// Remove the first slot holding `handle`, returning its key.
    ///
    /// Scans the whole table: O(capacity).
    pub fn remove_by_handle(&mut self, handle: H) -> Option<K> {
        if handle.is_invalid() {
            return None;
        }
        let idx = self.slots.iter().position(|slot| slot.handle == handle)?;
        let key = self.slots[idx].key;
        self.remove_index(idx);
        Some(key)
    }

    /// Empty every slot. O(capacity).
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.handle = H::INVALID;
        }
        self.len = 0;
        tracing::debug!(capacity = self.slots.len(), "handle map reset");
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot count fixed at construction.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Entries in physical slot order (not insertion order).
    ///
    /// Each call starts a fresh pass from slot 0.
    pub fn iter(&self) -> Iter<'_, K, H> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }

    fn find_index(&self, key: K) -> Option<usize> {
        let first = key.home_slot(self.slots.len());
        let mut idx = first;
        loop {
            let slot = &self.slots[idx];
            if slot.handle.is_invalid() {
                return None;
            }
            if slot.key == key {
                return Some(idx);
            }
            idx = self.next_slot(idx);
            if idx == first {
                return None;
            }
        }
    }

    /// Vacate `removed` and close the gap it leaves.
    fn remove_index(&mut self, removed: usize) {
        self.slots[removed].handle = H::INVALID;
        self.len -= 1;

        let mut idx = self.next_slot(removed);
        while !self.slots[idx].handle.is_invalid() {
            let Slot { key, handle } = self.slots[idx];
            if self.find_index(key) != Some(idx) {
                self.slots[idx].handle = H::INVALID;
                self.len -= 1;
                // The entry's own slot is free, so the probe always lands.
                let reinserted = self.insert(key, handle);
                debug_assert!(reinserted.is_ok(), "re-insert of {key:?} failed");
            }
            idx = self.next_slot(idx);
        }
    }

    #[inline]
    fn next_slot(&self, idx: usize) -> usize {
        let next = idx + 1;
        if next == self.slots.len() {
            0
        } else {
            next
        }
    }
}

impl<K: MapKey, H: HandleIndex> fmt::Debug for HandleMap<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K: MapKey, H: HandleIndex> IntoIterator for &'a HandleMap<K, H> {
    type Item = (K, H);
    type IntoIter = Iter<'a, K, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One-shot pass over the occupied slots of a [`HandleMap`].
pub struct Iter<'a, K, H> {
    slots: std::slice::Iter<'a, Slot<K, H>>,
    remaining: usize,
}

impl<K: MapKey, H: HandleIndex> Iterator for Iter<'_, K, H> {
    type Item = (K, H);

    fn next(&mut self) -> Option<(K, H)> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.slots.find(|slot| !slot.handle.is_invalid())?;
        self.remaining -= 1;
        Some((slot.key, slot.handle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: MapKey, H: HandleIndex> ExactSizeIterator for Iter<'_, K, H> {}

impl<K: MapKey, H: HandleIndex> FusedIterator for Iter<'_, K, H> {}
