//! Intrusive doubly-linked list over the handle domain.
//!
//! [`HandleList`] keeps one `{prev, next}` link record per handle value, so
//! a handle *is* its own list node and linking never allocates. The
//! sentinel terminates both ends.
//!
//! A handle is linked iff it has a neighbour or is the front. `remove`
//! resets the node's links, which keeps that check exact.

use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use haft_core::{CapacityConfig, Handle, HandleError, HandleIndex};

use crate::storage::{HeapProvider, SlotBlock, SlotProvider};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Link<H> {
    prev: H,
    next: H,
}

impl<H: HandleIndex> Link<H> {
    const UNLINKED: Self = Self {
        prev: H::INVALID,
        next: H::INVALID,
    };
}

/// Fixed-capacity doubly-linked list of handles.
///
/// `push_*` require the handle to be unlinked; `remove`, `next` and `prev`
/// require it to be linked. Violations are caught by `debug_assert!` only;
/// the `try_*` variants check and return an error instead.
pub struct HandleList<H: HandleIndex = Handle> {
    links: SlotBlock<Link<H>>,
    front: H,
    back: H,
}

impl<H: HandleIndex> HandleList<H> {
    /// Create a list over handles `[0, capacity)` on the global heap.
    pub fn new(capacity: usize) -> Result<Self, HandleError> {
        Self::with_provider(&Arc::new(HeapProvider), capacity)
    }

    /// Create a list whose link block comes from `provider`.
    pub fn with_provider<P: SlotProvider + 'static>(
        provider: &Arc<P>,
        capacity: usize,
    ) -> Result<Self, HandleError> {
        CapacityConfig::new(capacity).validate_handles::<H>()?;
        let links = SlotBlock::acquire(provider, capacity, Link::<H>::UNLINKED)?;
        tracing::debug!(capacity, "handle list created");
        Ok(Self {
            links,
            front: H::INVALID,
            back: H::INVALID,
        })
    }

    /// Append `handle` after the current back.
    #[inline]
    pub fn push_back(&mut self, handle: H) {
        debug_assert!(self.can_link(handle), "cannot link handle {handle}");
        self.insert_after(self.back, handle);
    }

    /// Prepend `handle` before the current front.
    #[inline]
    pub fn push_front(&mut self, handle: H) {
        debug_assert!(self.can_link(handle), "cannot link handle {handle}");
        self.insert_before(self.front, handle);
    }

    /// Checked [`push_back`](Self::push_back).
    pub fn try_push_back(&mut self, handle: H) -> Result<(), HandleError> {
        self.check_unlinked(handle)?;
        self.push_back(handle);
        Ok(())
    }

    /// Checked [`push_front`](Self::push_front).
    pub fn try_push_front(&mut self, handle: H) -> Result<(), HandleError> {
        self.check_unlinked(handle)?;
        self.push_front(handle);
        Ok(())
    }

    /// Unlink and return the back handle.
    pub fn pop_back(&mut self) -> Option<H> {
        let back = self.back();
        if let Some(handle) = back {
            self.remove(handle);
        }
        back
    }

    /// Unlink and return the front handle.
    pub fn pop_front(&mut self) -> Option<H> {
        let front = self.front();
        if let Some(handle) = front {
            self.remove(handle);
        }
        front
    }

    /// First handle, if any.
    #[inline]
    pub fn front(&self) -> Option<H> {
        non_sentinel(self.front)
    }

    /// Last handle, if any.
    #[inline]
    pub fn back(&self) -> Option<H> {
        non_sentinel(self.back)
    }

    /// Successor of a linked handle.
    #[inline]
    pub fn next(&self, handle: H) -> Option<H> {
        debug_assert!(self.is_linked(handle), "handle {handle} is not linked");
        non_sentinel(self.links[handle.index()].next)
    }

    /// Predecessor of a linked handle.
    #[inline]
    pub fn prev(&self, handle: H) -> Option<H> {
        debug_assert!(self.is_linked(handle), "handle {handle} is not linked");
        non_sentinel(self.links[handle.index()].prev)
    }

    /// Splice a linked handle out of the list.
    pub fn remove(&mut self, handle: H) {
        debug_assert!(self.is_linked(handle), "handle {handle} is not linked");
        let Link { prev, next } = self.links[handle.index()];

        if prev.is_invalid() {
            self.front = next;
        } else {
            self.links[prev.index()].next = next;
        }

        if next.is_invalid() {
            self.back = prev;
        } else {
            self.links[next.index()].prev = prev;
        }

        self.links[handle.index()] = Link::<H>::UNLINKED;
    }

    /// Checked [`remove`](Self::remove).
    pub fn try_remove(&mut self, handle: H) -> Result<(), HandleError> {
        if !self.is_linked(handle) {
            return Err(HandleError::NotLinked {
                index: handle.index(),
            });
        }
        self.remove(handle);
        Ok(())
    }

    /// Whether `handle` is currently in the list. O(1).
    #[inline]
    pub fn is_linked(&self, handle: H) -> bool {
        match self.links.get(handle.index()) {
            Some(link) => {
                !link.prev.is_invalid() || !link.next.is_invalid() || self.front == handle
            }
            None => false,
        }
    }

    /// Whether the list has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.front.is_invalid()
    }

    /// Size of the handle domain.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.links.len()
    }

    /// Unlink every handle. O(capacity).
    pub fn reset(&mut self) {
        self.links.fill(Link::<H>::UNLINKED);
        self.front = H::INVALID;
        self.back = H::INVALID;
        tracing::debug!(capacity = self.links.len(), "handle list reset");
    }

    /// Front-to-back traversal.
    pub fn iter(&self) -> Iter<'_, H> {
        Iter {
            list: self,
            cursor: self.front,
        }
    }

    fn insert_before(&mut self, before: H, handle: H) {
        let mut link = Link {
            prev: H::INVALID,
            next: before,
        };
        if !before.is_invalid() {
            let prev = self.links[before.index()].prev;
            if !prev.is_invalid() {
                self.links[prev.index()].next = handle;
            }
            link.prev = prev;
            self.links[before.index()].prev = handle;
        }
        self.links[handle.index()] = link;
        self.update_front_back(handle);
    }

    fn insert_after(&mut self, after: H, handle: H) {
        let mut link = Link {
            prev: after,
            next: H::INVALID,
        };
        if !after.is_invalid() {
            let next = self.links[after.index()].next;
            if !next.is_invalid() {
                self.links[next.index()].prev = handle;
            }
            link.next = next;
            self.links[after.index()].next = handle;
        }
        self.links[handle.index()] = link;
        self.update_front_back(handle);
    }

    fn update_front_back(&mut self, handle: H) {
        let link = self.links[handle.index()];
        if link.prev.is_invalid() {
            self.front = handle;
        }
        if link.next.is_invalid() {
            self.back = handle;
        }
    }

    fn can_link(&self, handle: H) -> bool {
        handle.index() < self.links.len() && !self.is_linked(handle)
    }

    fn check_unlinked(&self, handle: H) -> Result<(), HandleError> {
        if handle.is_invalid() {
            return Err(HandleError::SentinelHandle);
        }
        if handle.index() >= self.links.len() {
            return Err(HandleError::InvalidHandle {
                index: handle.index(),
            });
        }
        if self.is_linked(handle) {
            return Err(HandleError::AlreadyLinked {
                index: handle.index(),
            });
        }
        Ok(())
    }
}

impl<H: HandleIndex> fmt::Debug for HandleList<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, H: HandleIndex> IntoIterator for &'a HandleList<H> {
    type Item = H;
    type IntoIter = Iter<'a, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Front-to-back iterator over a [`HandleList`].
pub struct Iter<'a, H: HandleIndex> {
    list: &'a HandleList<H>,
    cursor: H,
}

impl<H: HandleIndex> Iterator for Iter<'_, H> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        let current = non_sentinel(self.cursor)?;
        self.cursor = self.list.links[current.index()].next;
        Some(current)
    }
}

impl<H: HandleIndex> FusedIterator for Iter<'_, H> {}

#[inline]
fn non_sentinel<H: HandleIndex>(handle: H) -> Option<H> {
    if handle.is_invalid() {
        None
    } else {
        Some(handle)
    }
}
