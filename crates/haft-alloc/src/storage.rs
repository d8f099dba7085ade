//! Backing-store providers.
//!
//! Every structure acquires its slot array from a [`SlotProvider`] exactly
//! once, at construction, and hands the bytes back exactly once, when it is
//! dropped. No operation in between allocates or frees memory.

use std::fmt;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use haft_core::HandleError;

/// A capability that grants and takes back slot-block memory.
///
/// Each block costs one [`reserve`](Self::reserve) before it exists and one
/// [`release`](Self::release) of the same byte count when it drops.
pub trait SlotProvider: Send + Sync {
    /// Reserve `bytes` for one block, or refuse.
    fn reserve(&self, bytes: usize) -> Result<(), HandleError>;

    /// Return the `bytes` of a block that was granted by this provider.
    fn release(&self, bytes: usize);
}

/// Global-heap provider used by every `new()` constructor. Never refuses.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapProvider;

impl SlotProvider for HeapProvider {
    #[inline]
    fn reserve(&self, _bytes: usize) -> Result<(), HandleError> {
        Ok(())
    }

    #[inline]
    fn release(&self, _bytes: usize) {}
}

/// Heap provider with a fixed byte budget.
///
/// Useful when a subsystem must stay within a memory envelope, and in tests
/// to check how many blocks a structure acquires. Bytes return to the budget
/// when the structure holding them drops.
#[derive(Debug)]
pub struct BudgetProvider {
    budget_bytes: usize,
    used_bytes: AtomicUsize,
    allocations: AtomicUsize,
    releases: AtomicUsize,
}

impl BudgetProvider {
    /// Create a provider that holds at most `budget_bytes` at once.
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            budget_bytes,
            used_bytes: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    /// Number of blocks granted so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Number of blocks returned so far.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }

    /// Bytes currently held by live blocks.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::Relaxed)
    }

    /// Bytes still available.
    pub fn remaining_bytes(&self) -> usize {
        self.budget_bytes - self.used_bytes()
    }
}

impl SlotProvider for BudgetProvider {
    fn reserve(&self, bytes: usize) -> Result<(), HandleError> {
        let budget = self.budget_bytes;
        self.used_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                used.checked_add(bytes).filter(|&total| total <= budget)
            })
            .map_err(|used| HandleError::StorageExhausted {
                requested_bytes: bytes,
                remaining_bytes: budget - used,
            })?;
        self.allocations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release(&self, bytes: usize) {
        let prev = self.used_bytes.fetch_sub(bytes, Ordering::Relaxed);
        debug_assert!(prev >= bytes, "released {bytes} bytes, only {prev} held");
        self.releases.fetch_add(1, Ordering::Relaxed);
    }
}

/// A fixed slot array on loan from a provider.
///
/// Dereferences to `[T]`. Dropping it releases its bytes to the provider.
pub(crate) struct SlotBlock<T> {
    slots: Box<[T]>,
    bytes: usize,
    provider: Arc<dyn SlotProvider>,
}

impl<T: Copy> SlotBlock<T> {
    /// Reserve `len` slots from `provider`, each initialised to `fill`.
    pub(crate) fn acquire<P: SlotProvider + 'static>(
        provider: &Arc<P>,
        len: usize,
        fill: T,
    ) -> Result<Self, HandleError> {
        let bytes = len.checked_mul(size_of::<T>()).unwrap_or(usize::MAX);
        provider.reserve(bytes)?;
        Ok(Self {
            slots: vec![fill; len].into_boxed_slice(),
            bytes,
            provider: provider.clone(),
        })
    }
}

impl<T> Deref for SlotBlock<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.slots
    }
}

impl<T> DerefMut for SlotBlock<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.slots
    }
}

impl<T> Drop for SlotBlock<T> {
    fn drop(&mut self) {
        self.provider.release(self.bytes);
    }
}

impl<T> fmt::Debug for SlotBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotBlock")
            .field("len", &self.slots.len())
            .field("bytes", &self.bytes)
            .finish()
    }
}
