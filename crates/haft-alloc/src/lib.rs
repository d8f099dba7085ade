//! Fixed-capacity, allocation-free handle primitives.
//!
//! Handles are small integers standing in for objects owned elsewhere
//! (textures, buffers, pipelines). Every structure here acquires its slot
//! block once at construction and never allocates afterwards.
//!
//! # Architecture
//!
//! ```text
//! KeyedHandleSet ──┬── HandleSet   (sparse/dense allocator)
//!                  └── HandleMap   (open addressing, backward-shift delete)
//! LruHandleSet ────┬── HandleSet
//!                  └── HandleList  (intrusive doubly-linked list)
//! ```
//!
//! Composites call down into their parts; nothing calls back up.
//!
//! # Contracts
//!
//! Operations whose precondition a caller can violate (`free` of a dead
//! handle, `remove` of an unlinked node) trust the caller and check with
//! `debug_assert!`. Each has a checked `try_*` twin returning
//! [`HandleError`] for untrusted input.
//!
//! No structure is `Sync`-safe to mutate from several threads: callers
//! serialise access.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod keyed;
pub mod list;
pub mod lru;
pub mod map;
pub mod set;
pub mod storage;

pub use haft_core::{CapacityConfig, Handle, HandleError, HandleIndex, MapKey, INVALID_HANDLE};
pub use keyed::KeyedHandleSet;
pub use list::HandleList;
pub use lru::LruHandleSet;
pub use map::HandleMap;
pub use set::HandleSet;
pub use storage::{BudgetProvider, HeapProvider, SlotProvider};
