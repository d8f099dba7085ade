//! Error types for the Haft handle primitives.
//!
//! Expected steady-state outcomes (an exhausted allocator, an absent key)
//! are reported through `Option` by the structures themselves. This enum
//! covers construction failures and the checked (`try_*`) entry points
//! that reject caller contract violations instead of corrupting state.

use std::error::Error;
use std::fmt;

/// Errors produced by handle structures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandleError {
    /// A capacity was zero, too large for the handle width, or otherwise
    /// inconsistent with the structure being built.
    InvalidCapacity {
        /// The capacity that was requested.
        requested: usize,
        /// The largest capacity the configuration accepts.
        max: usize,
    },
    /// A keyed map was configured with fewer slots than the handles it backs.
    MapTooSmall {
        /// Configured slot count of the map.
        map_capacity: usize,
        /// Number of handles the map must be able to hold.
        max_handles: usize,
    },
    /// The handle is not currently allocated (or is out of range).
    InvalidHandle {
        /// Index of the offending handle.
        index: usize,
    },
    /// The handle is not linked into the list.
    NotLinked {
        /// Index of the offending handle.
        index: usize,
    },
    /// The handle is already linked into the list.
    AlreadyLinked {
        /// Index of the offending handle.
        index: usize,
    },
    /// The sentinel handle was passed where a real handle is required.
    SentinelHandle,
    /// Every handle is in use.
    Exhausted {
        /// Capacity of the exhausted allocator.
        capacity: usize,
    },
    /// The key is already present in the map.
    DuplicateKey,
    /// The map has no empty slot left.
    MapFull {
        /// Slot capacity of the map.
        capacity: usize,
    },
    /// The backing-store provider refused the allocation.
    StorageExhausted {
        /// Bytes requested by the structure.
        requested_bytes: usize,
        /// Bytes the provider still had available.
        remaining_bytes: usize,
    },
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCapacity { requested, max } => {
                write!(f, "invalid capacity {requested} (must be in 1..={max})")
            }
            Self::MapTooSmall {
                map_capacity,
                max_handles,
            } => {
                write!(
                    f,
                    "map capacity {map_capacity} cannot hold {max_handles} handles"
                )
            }
            Self::InvalidHandle { index } => write!(f, "handle {index} is not allocated"),
            Self::NotLinked { index } => write!(f, "handle {index} is not linked"),
            Self::AlreadyLinked { index } => write!(f, "handle {index} is already linked"),
            Self::SentinelHandle => write!(f, "the invalid-handle sentinel cannot be stored"),
            Self::Exhausted { capacity } => {
                write!(f, "all {capacity} handles are allocated")
            }
            Self::DuplicateKey => write!(f, "key already present"),
            Self::MapFull { capacity } => write!(f, "handle map full ({capacity} slots)"),
            Self::StorageExhausted {
                requested_bytes,
                remaining_bytes,
            } => {
                write!(
                    f,
                    "backing store exhausted: requested {requested_bytes} bytes, {remaining_bytes} bytes remaining"
                )
            }
        }
    }
}

impl Error for HandleError {}
