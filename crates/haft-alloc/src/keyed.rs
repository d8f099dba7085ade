//! Handle allocator with key-based lookup.
//!
//! [`KeyedHandleSet`] allocates a handle and registers it under a caller key
//! in one step. Each live handle maps to exactly one key and back.

use std::fmt;
use std::sync::Arc;

use haft_core::{CapacityConfig, Handle, HandleError, HandleIndex, MapKey};

use crate::map::{HandleMap, Iter};
use crate::set::HandleSet;
use crate::storage::{HeapProvider, SlotProvider};

/// Fixed-capacity allocator whose handles are registered under keys.
pub struct KeyedHandleSet<K: MapKey, H: HandleIndex = Handle> {
    set: HandleSet<H>,
    map: HandleMap<K, H>,
}

impl<K: MapKey, H: HandleIndex> KeyedHandleSet<K, H> {
    /// Create a keyed set of `max_handles` handles with a map of
    /// `1.5 * max_handles` slots, on the global heap.
    pub fn new(max_handles: usize) -> Result<Self, HandleError> {
        Self::with_config(&Arc::new(HeapProvider), CapacityConfig::new(max_handles))
    }

    /// Create a keyed set from an explicit capacity configuration.
    pub fn with_config<P: SlotProvider + 'static>(
        provider: &Arc<P>,
        config: CapacityConfig,
    ) -> Result<Self, HandleError> {
        config.validate::<H>()?;
        Ok(Self {
            set: HandleSet::with_provider(provider, config.max_handles)?,
            map: HandleMap::with_provider(provider, config.map_capacity)?,
        })
    }

    /// Allocate a handle registered under `key`.
    ///
    /// All or nothing: if the key is already present or the map is full the
    /// freshly allocated handle is returned to the allocator before the error
    /// is reported.
    pub fn alloc(&mut self, key: K) -> Result<H, HandleError> {
        let handle = self.set.alloc().ok_or(HandleError::Exhausted {
            capacity: self.set.max_handles(),
        })?;
        if let Err(err) = self.map.insert(key, handle) {
            tracing::trace!(?key, %handle, %err, "keyed alloc rolled back");
            self.set.free(handle);
            return Err(err);
        }
        Ok(handle)
    }

    /// Release the handle registered under `key`.
    ///
    /// Returns the freed handle, or `None` (a no-op) if `key` is absent.
    pub fn free_by_key(&mut self, key: K) -> Option<H> {
        let handle = self.map.remove_by_key(key)?;
        self.set.free(handle);
        Some(handle)
    }

    /// Release `handle` and its key registration.
    ///
    /// Returns the key it was registered under, or `None` (a no-op) if the
    /// handle is not live.
    pub fn free_by_handle(&mut self, handle: H) -> Option<K> {
        if !self.set.is_valid(handle) {
            return None;
        }
        let key = self.map.remove_by_handle(handle)?;
        self.set.free(handle);
        Some(key)
    }

    /// Handle registered under `key`.
    #[inline]
    pub fn find(&self, key: K) -> Option<H> {
        self.map.find(key)
    }

    /// Whether `handle` is currently allocated.
    #[inline]
    pub fn is_valid(&self, handle: H) -> bool {
        self.set.is_valid(handle)
    }

    /// Live handles in allocator dense order.
    #[inline]
    pub fn handles(&self) -> &[H] {
        self.set.handles()
    }

    /// The live handle at dense position `at`.
    #[inline]
    pub fn handle_at(&self, at: usize) -> Option<H> {
        self.set.handle_at(at)
    }

    /// `(key, handle)` registrations in map slot order.
    pub fn iter(&self) -> Iter<'_, K, H> {
        self.map.iter()
    }

    /// Number of live handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Whether no handle is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Whether every handle is live.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.set.is_full()
    }

    /// Handle capacity fixed at construction.
    #[inline]
    pub fn max_handles(&self) -> usize {
        self.set.max_handles()
    }

    /// Slot count of the backing map.
    #[inline]
    pub fn map_capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Free every handle and drop every registration.
    pub fn reset(&mut self) {
        self.map.reset();
        self.set.reset();
    }
}

impl<K: MapKey, H: HandleIndex> fmt::Debug for KeyedHandleSet<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedHandleSet")
            .field("len", &self.len())
            .field("max_handles", &self.max_handles())
            .field("entries", &self.map)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BudgetProvider;

    fn keyed(n: usize) -> KeyedHandleSet<u32, u16> {
        KeyedHandleSet::new(n).unwrap()
    }

    #[test]
    fn duplicate_key_rolls_back() {
        let mut k = keyed(2);
        assert_eq!(k.map_capacity(), 3);
        let a = k.alloc(0xA).unwrap();
        assert_eq!(k.len(), 1);
        assert_eq!(k.alloc(0xA), Err(HandleError::DuplicateKey));
        assert_eq!(k.len(), 1);
        assert_eq!(k.find(0xA), Some(a));
    }

    #[test]
    fn exhaustion_leaves_map_untouched() {
        let mut k = keyed(2);
        k.alloc(1).unwrap();
        k.alloc(2).unwrap();
        assert_eq!(k.alloc(3), Err(HandleError::Exhausted { capacity: 2 }));
        assert_eq!(k.find(3), None);
        assert_eq!(k.iter().count(), 2);
    }

    #[test]
    fn free_by_key_and_handle() {
        let mut k = keyed(4);
        let a = k.alloc(10).unwrap();
        let b = k.alloc(20).unwrap();
        assert_eq!(k.free_by_key(10), Some(a));
        assert!(!k.is_valid(a));
        assert_eq!(k.find(10), None);
        assert_eq!(k.free_by_handle(b), Some(20));
        assert!(k.is_empty());
        assert_eq!(k.find(20), None);
    }

    #[test]
    fn freeing_absent_is_a_no_op() {
        let mut k = keyed(4);
        let a = k.alloc(10).unwrap();
        assert_eq!(k.free_by_key(99), None);
        assert_eq!(k.free_by_handle(3), None);
        assert_eq!(k.free_by_handle(u16::INVALID), None);
        assert!(k.is_valid(a));
        assert_eq!(k.len(), 1);
    }

    #[test]
    fn key_can_be_reused_after_free() {
        let mut k = keyed(2);
        let a = k.alloc(5).unwrap();
        k.free_by_key(5);
        let b = k.alloc(5).unwrap();
        assert_eq!(a, b);
        assert_eq!(k.find(5), Some(b));
    }

    #[test]
    fn map_sized_to_handles_never_fills_first() {
        let provider = Arc::new(HeapProvider);
        let config = CapacityConfig::new(3).with_map_capacity(3);
        let mut k: KeyedHandleSet<u32, u16> = KeyedHandleSet::with_config(&provider, config).unwrap();
        for key in 0..3 {
            k.alloc(key).unwrap();
        }
        assert_eq!(k.alloc(3), Err(HandleError::Exhausted { capacity: 3 }));
        k.free_by_key(0);
        // Handle and map slot are free again.
        assert!(k.alloc(7).is_ok());
        assert_eq!(k.len(), 3);
    }

    #[test]
    fn undersized_map_rejected() {
        let config = CapacityConfig::new(4).with_map_capacity(2);
        assert!(matches!(
            KeyedHandleSet::<u32, u16>::with_config(&Arc::new(HeapProvider), config),
            Err(HandleError::MapTooSmall { .. })
        ));
    }

    #[test]
    fn reset_clears_both() {
        let mut k = keyed(3);
        k.alloc(1).unwrap();
        k.alloc(2).unwrap();
        k.reset();
        assert!(k.is_empty());
        assert_eq!(k.find(1), None);
        assert!(k.alloc(1).is_ok());
    }

    #[test]
    fn iter_pairs_keys_with_handles() {
        let mut k = keyed(4);
        let a = k.alloc(11).unwrap();
        let b = k.alloc(22).unwrap();
        let mut pairs: Vec<(u32, u16)> = k.iter().collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(11, a), (22, b)]);
    }

    #[test]
    fn two_blocks_from_provider() {
        let provider = Arc::new(BudgetProvider::new(1 << 16));
        let _k: KeyedHandleSet<u64, u32> =
            KeyedHandleSet::with_config(&provider, CapacityConfig::new(32)).unwrap();
        assert_eq!(provider.allocations(), 2);
    }

    #[test]
    fn rebuild_under_exact_budget() {
        // 8 u16 handles (32 bytes) plus 12 map slots of (u32, u16) (96 bytes).
        let provider = Arc::new(BudgetProvider::new(32 + 12 * 8));
        for round in 0..3u32 {
            let mut k: KeyedHandleSet<u32, u16> =
                KeyedHandleSet::with_config(&provider, CapacityConfig::new(8)).unwrap();
            k.alloc(round).unwrap();
            assert_eq!(provider.remaining_bytes(), 0);
        }
        assert_eq!(provider.allocations(), 6);
        assert_eq!(provider.releases(), 6);
        assert_eq!(provider.used_bytes(), 0);
    }

    #[test]
    fn failed_build_releases_partial_grant() {
        // Room for the handle block only; the map block is refused.
        let provider = Arc::new(BudgetProvider::new(32));
        let err = KeyedHandleSet::<u32, u16>::with_config(&provider, CapacityConfig::new(8));
        assert!(matches!(err, Err(HandleError::StorageExhausted { .. })));
        assert_eq!(provider.allocations(), 1);
        assert_eq!(provider.releases(), 1);
        assert_eq!(provider.used_bytes(), 0);
    }
}
