//! Haft: fixed-capacity handle primitives for engine resource tables.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Haft sub-crates. For most users, adding `haft` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use haft::prelude::*;
//!
//! // A texture cache: one handle per texture id, evicted least recently used.
//! let mut by_id: KeyedHandleSet<u64> = KeyedHandleSet::new(64).unwrap();
//! let mut recency: LruHandleSet = LruHandleSet::new(64).unwrap();
//!
//! let slot = recency.alloc().unwrap();
//! let tex = by_id.alloc(0xDEAD_BEEF).unwrap();
//! assert_eq!(by_id.find(0xDEAD_BEEF), Some(tex));
//! assert_eq!(by_id.alloc(0xDEAD_BEEF), Err(HandleError::DuplicateKey));
//!
//! recency.touch(slot);
//! assert_eq!(recency.back(), Some(slot));
//! assert_eq!(by_id.free_by_key(0xDEAD_BEEF), Some(tex));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `haft-core` | Handle width, errors, capacity config, hash mixers |
//! | [`alloc`] | `haft-alloc` | Handle set, list, LRU set, map, keyed set, slot providers |
//!
//! # Features
//!
//! - `wide-handles`: [`Handle`](types::Handle) becomes `u32`, raising the
//!   capacity ceiling from 65 535 to 4 294 967 295 handles.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Handle width, errors, capacity configuration and mixers (`haft-core`).
pub use haft_core as types;

/// The handle structures and their storage providers (`haft-alloc`).
///
/// [`alloc::KeyedHandleSet`] and [`alloc::LruHandleSet`] are composites of
/// [`alloc::HandleSet`] with [`alloc::HandleMap`] and
/// [`alloc::HandleList`] respectively.
pub use haft_alloc as alloc;

/// Common imports for typical Haft usage.
///
/// ```rust
/// use haft::prelude::*;
/// ```
pub mod prelude {
    // Handles
    pub use haft_core::{Handle, HandleIndex, INVALID_HANDLE};

    // Errors and config
    pub use haft_core::{CapacityConfig, HandleError};

    // Structures
    pub use haft_alloc::{HandleList, HandleMap, HandleSet, KeyedHandleSet, LruHandleSet};

    // Storage
    pub use haft_alloc::{BudgetProvider, HeapProvider, SlotProvider};
}
