//! Sparse/dense handle allocator.
//!
//! [`HandleSet`] hands out handles in `[0, max_handles)` with O(1)
//! alloc, free and validity checks, without pointers or free flags.
//!
//! The single slot block is split in two halves:
//!
//! ```text
//! [ dense[0..len) live | dense[len..max) free | sparse[0..max) ]
//! ```
//!
//! For every live handle `h`: `sparse[h] < len && dense[sparse[h]] == h`.
//! Free handles may have stale sparse entries; the equality alone decides
//! validity.

use std::fmt;
use std::sync::Arc;

use haft_core::{CapacityConfig, Handle, HandleError, HandleIndex};

use crate::storage::{HeapProvider, SlotBlock, SlotProvider};

/// Fixed-capacity handle allocator.
///
/// Freeing swaps the last live handle into the freed position, so the order
/// of [`handles`](Self::handles) is not stable across alloc/free cycles.
/// Recycling is LIFO-biased: the most recently freed handle is the next one
/// allocated.
pub struct HandleSet<H: HandleIndex = Handle> {
    /// `[dense | sparse]`, each `max_handles` long.
    slots: SlotBlock<H>,
    max_handles: usize,
    len: usize,
}

impl<H: HandleIndex> HandleSet<H> {
    /// Create a set of `max_handles` handles on the global heap.
    pub fn new(max_handles: usize) -> Result<Self, HandleError> {
        Self::with_provider(&Arc::new(HeapProvider), max_handles)
    }

    /// Create a set whose slot block comes from `provider`.
    ///
    /// Fails with [`HandleError::InvalidCapacity`] if `max_handles` is zero
    /// or does not fit below the sentinel of `H`.
    pub fn with_provider<P: SlotProvider + 'static>(
        provider: &Arc<P>,
        max_handles: usize,
    ) -> Result<Self, HandleError> {
        CapacityConfig::new(max_handles).validate_handles::<H>()?;
        let slots = SlotBlock::acquire(provider, 2 * max_handles, H::default())?;
        let mut set = Self {
            slots,
            max_handles,
            len: 0,
        };
        set.fill_identity();
        tracing::debug!(max_handles, "handle set created");
        Ok(set)
    }

    /// Allocate a handle, or `None` if all handles are live.
    #[inline]
    pub fn alloc(&mut self) -> Option<H> {
        if self.len == self.max_handles {
            return None;
        }
        let (dense, sparse) = self.slots.split_at_mut(self.max_handles);
        let handle = dense[self.len];
        sparse[handle.index()] = H::from_index(self.len);
        self.len += 1;
        Some(handle)
    }

    /// Whether `handle` is currently allocated.
    ///
    /// Out-of-range values and the sentinel are never valid.
    #[inline]
    pub fn is_valid(&self, handle: H) -> bool {
        let (dense, sparse) = self.slots.split_at(self.max_handles);
        match sparse.get(handle.index()) {
            Some(&index) => index.index() < self.len && dense[index.index()] == handle,
            None => false,
        }
    }

    /// Release a live handle.
    ///
    /// `handle` must be valid. Freeing anything else corrupts the set; debug
    /// builds assert instead. Use [`try_free`](Self::try_free) when the
    /// handle comes from an untrusted source.
    #[inline]
    pub fn free(&mut self, handle: H) {
        debug_assert!(self.is_valid(handle), "freeing unallocated handle {handle}");
        let (dense, sparse) = self.slots.split_at_mut(self.max_handles);
        let index = sparse[handle.index()];
        self.len -= 1;
        let last = dense[self.len];
        dense[self.len] = handle;
        sparse[last.index()] = index;
        dense[index.index()] = last;
    }

    /// Release `handle`, rejecting handles that are not allocated.
    pub fn try_free(&mut self, handle: H) -> Result<(), HandleError> {
        if !self.is_valid(handle) {
            return Err(HandleError::InvalidHandle {
                index: handle.index(),
            });
        }
        self.free(handle);
        Ok(())
    }

    /// Free every handle. O(max_handles).
    pub fn reset(&mut self) {
        self.fill_identity();
        tracing::debug!(max_handles = self.max_handles, "handle set reset");
    }

    /// Live handles in current dense order.
    #[inline]
    pub fn handles(&self) -> &[H] {
        &self.slots[..self.len]
    }

    /// The live handle at dense position `at`.
    #[inline]
    pub fn handle_at(&self, at: usize) -> Option<H> {
        self.handles().get(at).copied()
    }

    /// Number of live handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no handle is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether every handle is live.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.max_handles
    }

    /// Capacity fixed at construction.
    #[inline]
    pub fn max_handles(&self) -> usize {
        self.max_handles
    }

    fn fill_identity(&mut self) {
        let dense = &mut self.slots[..self.max_handles];
        for (i, slot) in dense.iter_mut().enumerate() {
            *slot = H::from_index(i);
        }
        self.len = 0;
    }
}

impl<H: HandleIndex> fmt::Debug for HandleSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleSet")
            .field("len", &self.len)
            .field("max_handles", &self.max_handles)
            .field("handles", &self.handles())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BudgetProvider;

    #[test]
    fn alloc_four_then_exhausted() {
        let mut set = HandleSet::<u16>::new(4).unwrap();
        let mut got: Vec<u16> = (0..4).map(|_| set.alloc().unwrap()).collect();
        got.sort_unstable();
        assert_eq!(got, vec![0, 1, 2, 3]);
        assert_eq!(set.len(), 4);
        assert!(set.is_full());
        assert_eq!(set.alloc(), None);
    }

    #[test]
    fn freed_handle_is_recycled() {
        let mut set = HandleSet::<u16>::new(4).unwrap();
        for _ in 0..4 {
            set.alloc().unwrap();
        }
        set.free(2);
        assert!(!set.is_valid(2));
        assert_eq!(set.alloc(), Some(2));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn free_does_not_touch_other_handles() {
        let mut set = HandleSet::<u32>::new(8).unwrap();
        let hs: Vec<u32> = (0..5).map(|_| set.alloc().unwrap()).collect();
        set.free(hs[1]);
        for &h in &hs {
            assert_eq!(set.is_valid(h), h != hs[1]);
        }
    }

    #[test]
    fn fresh_set_has_no_valid_handles() {
        let set = HandleSet::<u16>::new(16).unwrap();
        assert!(set.is_empty());
        assert!((0..16).all(|h| !set.is_valid(h)));
    }

    #[test]
    fn out_of_range_and_sentinel_are_invalid() {
        let mut set = HandleSet::<u16>::new(4).unwrap();
        set.alloc().unwrap();
        assert!(!set.is_valid(4));
        assert!(!set.is_valid(1000));
        assert!(!set.is_valid(u16::INVALID));
    }

    #[test]
    fn try_free_rejects_double_free() {
        let mut set = HandleSet::<u16>::new(4).unwrap();
        let h = set.alloc().unwrap();
        assert_eq!(set.try_free(h), Ok(()));
        assert_eq!(
            set.try_free(h),
            Err(HandleError::InvalidHandle { index: h as usize })
        );
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn handles_view_enumerates_live() {
        let mut set = HandleSet::<u16>::new(6).unwrap();
        for _ in 0..5 {
            set.alloc().unwrap();
        }
        set.free(0);
        set.free(3);
        let mut live = set.handles().to_vec();
        live.sort_unstable();
        assert_eq!(live, vec![1, 2, 4]);
        assert_eq!(set.handle_at(3), None);
        assert!(set.handle_at(0).is_some());
    }

    #[test]
    fn lifo_recycling() {
        let mut set = HandleSet::<u16>::new(8).unwrap();
        for _ in 0..4 {
            set.alloc().unwrap();
        }
        set.free(1);
        set.free(3);
        assert_eq!(set.alloc(), Some(3));
        assert_eq!(set.alloc(), Some(1));
    }

    #[test]
    fn reset_frees_everything() {
        let mut set = HandleSet::<u16>::new(3).unwrap();
        for _ in 0..3 {
            set.alloc().unwrap();
        }
        set.reset();
        assert!(set.is_empty());
        assert_eq!(set.alloc(), Some(0));
        assert_eq!(set.alloc(), Some(1));
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            HandleSet::<u16>::new(0),
            Err(HandleError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn full_width_capacity_accepted() {
        let mut set = HandleSet::<u16>::new(u16::MAX as usize).unwrap();
        let mut last = 0;
        while let Some(h) = set.alloc() {
            last = h;
        }
        assert_eq!(last, u16::MAX - 1);
        assert_eq!(set.len(), 65_535);
    }

    #[test]
    fn single_block_from_provider() {
        let provider = Arc::new(BudgetProvider::new(1024));
        let _set = HandleSet::<u16>::with_provider(&provider, 10).unwrap();
        assert_eq!(provider.allocations(), 1);
        assert_eq!(provider.used_bytes(), 2 * 10 * 2);
    }

    #[test]
    fn provider_refusal_propagates() {
        let provider = Arc::new(BudgetProvider::new(8));
        assert!(matches!(
            HandleSet::<u32>::with_provider(&provider, 10),
            Err(HandleError::StorageExhausted { .. })
        ));
    }

    #[test]
    fn dropped_set_returns_its_budget() {
        let provider = Arc::new(BudgetProvider::new(2 * 8 * 2));
        {
            let set = HandleSet::<u16>::with_provider(&provider, 8).unwrap();
            assert_eq!(set.max_handles(), 8);
            assert_eq!(provider.remaining_bytes(), 0);
        }
        assert_eq!(provider.releases(), 1);
        assert_eq!(provider.used_bytes(), 0);
        let again = HandleSet::<u16>::with_provider(&provider, 8);
        assert!(again.is_ok());
        assert_eq!(provider.allocations(), 2);
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        proptest! {
            #[test]
            fn matches_set_model(ops in proptest::collection::vec(any::<(bool, u8)>(), 0..200)) {
                let mut set = HandleSet::<u16>::new(32).unwrap();
                let mut model = BTreeSet::new();
                for (is_alloc, pick) in ops {
                    if is_alloc {
                        match set.alloc() {
                            Some(h) => {
                                prop_assert!(model.insert(h));
                            }
                            None => {
                                prop_assert_eq!(model.len(), 32);
                            }
                        }
                    } else if !model.is_empty() {
                        let h = *model.iter().nth(pick as usize % model.len()).unwrap();
                        set.free(h);
                        model.remove(&h);
                    }
                    prop_assert_eq!(set.len(), model.len());
                    let valid = (0..32u16).filter(|&h| set.is_valid(h)).count();
                    prop_assert_eq!(valid, model.len());
                    for &h in &model {
                        prop_assert!(set.is_valid(h));
                    }
                }
            }
        }
    }
}
