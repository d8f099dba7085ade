//! Handle allocator with recency ordering.
//!
//! [`LruHandleSet`] pairs a [`HandleSet`] with a [`HandleList`] over the same
//! domain. Every live handle is exactly one list node: the front is the most
//! recently allocated or touched, the back the least. Callers evict from
//! [`back`](LruHandleSet::back).

use std::fmt;
use std::sync::Arc;

use haft_core::{Handle, HandleError, HandleIndex};

use crate::list::{HandleList, Iter};
use crate::set::HandleSet;
use crate::storage::{HeapProvider, SlotProvider};

/// Fixed-capacity allocator that tracks least-recently-used order.
pub struct LruHandleSet<H: HandleIndex = Handle> {
    set: HandleSet<H>,
    list: HandleList<H>,
}

impl<H: HandleIndex> LruHandleSet<H> {
    /// Create an LRU set of `max_handles` handles on the global heap.
    pub fn new(max_handles: usize) -> Result<Self, HandleError> {
        Self::with_provider(&Arc::new(HeapProvider), max_handles)
    }

    /// Create an LRU set whose two blocks come from `provider`.
    ///
    /// Both constituents share `max_handles`, so their handle domains match.
    pub fn with_provider<P: SlotProvider + 'static>(
        provider: &Arc<P>,
        max_handles: usize,
    ) -> Result<Self, HandleError> {
        Ok(Self {
            set: HandleSet::with_provider(provider, max_handles)?,
            list: HandleList::with_provider(provider, max_handles)?,
        })
    }

    /// Allocate a handle and mark it most recently used.
    pub fn alloc(&mut self) -> Option<H> {
        let handle = self.set.alloc()?;
        self.list.push_front(handle);
        Some(handle)
    }

    /// Whether `handle` is currently allocated.
    #[inline]
    pub fn is_valid(&self, handle: H) -> bool {
        self.set.is_valid(handle)
    }

    /// Release a live handle.
    ///
    /// The list node is unlinked while the handle is still known valid, then
    /// the handle goes back to the allocator.
    pub fn free(&mut self, handle: H) {
        debug_assert!(self.is_valid(handle), "freeing unallocated handle {handle}");
        self.list.remove(handle);
        self.set.free(handle);
    }

    /// Checked [`free`](Self::free).
    pub fn try_free(&mut self, handle: H) -> Result<(), HandleError> {
        self.check_valid(handle)?;
        self.free(handle);
        Ok(())
    }

    /// Move a live handle to the most-recently-used position. O(1).
    pub fn touch(&mut self, handle: H) {
        debug_assert!(self.is_valid(handle), "touching unallocated handle {handle}");
        self.list.remove(handle);
        self.list.push_front(handle);
    }

    /// Checked [`touch`](Self::touch).
    pub fn try_touch(&mut self, handle: H) -> Result<(), HandleError> {
        self.check_valid(handle)?;
        self.touch(handle);
        Ok(())
    }

    /// Most recently used handle.
    #[inline]
    pub fn front(&self) -> Option<H> {
        self.list.front()
    }

    /// Least recently used handle: the eviction candidate.
    #[inline]
    pub fn back(&self) -> Option<H> {
        self.list.back()
    }

    /// Next less-recently-used handle after `handle`.
    #[inline]
    pub fn next(&self, handle: H) -> Option<H> {
        self.list.next(handle)
    }

    /// Next more-recently-used handle before `handle`.
    #[inline]
    pub fn prev(&self, handle: H) -> Option<H> {
        self.list.prev(handle)
    }

    /// Live handles from most to least recently used.
    pub fn iter(&self) -> Iter<'_, H> {
        self.list.iter()
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

    /// Capacity fixed at construction.
    #[inline]
    pub fn max_handles(&self) -> usize {
        self.set.max_handles()
    }

    /// Free every handle and clear the recency order.
    pub fn reset(&mut self) {
        self.list.reset();
        self.set.reset();
    }

    fn check_valid(&self, handle: H) -> Result<(), HandleError> {
        if self.is_valid(handle) {
            Ok(())
        } else {
            Err(HandleError::InvalidHandle {
                index: handle.index(),
            })
        }
    }
}

impl<H: HandleIndex> fmt::Debug for LruHandleSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruHandleSet")
            .field("len", &self.len())
            .field("max_handles", &self.max_handles())
            .field("recency", &self.list)
            .finish()
    }
}
