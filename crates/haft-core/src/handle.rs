//! Handle width and the [`INVALID_HANDLE`] sentinel.
//!
//! A handle is a small unsigned integer in `[0, max_handles)`. The maximum
//! value of the chosen width is reserved as the "no handle" sentinel, so a
//! structure can never hold more than `H::MAX_CAPACITY` handles.

use std::fmt;
use std::hash::Hash;

/// An unsigned integer type usable as a handle.
///
/// Implemented for `u16` and `u32`. All structures in the workspace are
/// generic over this trait and default to [`Handle`], so a build normally
/// uses one width everywhere.
pub trait HandleIndex:
    Copy + Eq + Ord + Hash + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The sentinel meaning "no handle": the maximum value of the width.
    const INVALID: Self;

    /// Largest legal capacity. Equal to `INVALID` so every valid handle
    /// stays strictly below the sentinel.
    const MAX_CAPACITY: usize;

    /// Widen to a `usize` index.
    fn index(self) -> usize;

    /// Narrow an index into a handle.
    ///
    /// Callers guarantee `index <= MAX_CAPACITY`; larger values truncate.
    fn from_index(index: usize) -> Self;

    /// Whether this is the sentinel.
    #[inline]
    fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

impl HandleIndex for u16 {
    const INVALID: Self = u16::MAX;
    const MAX_CAPACITY: usize = u16::MAX as usize;

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        debug_assert!(index <= Self::MAX_CAPACITY, "index {index} overflows u16 handle");
        index as u16
    }
}

impl HandleIndex for u32 {
    const INVALID: Self = u32::MAX;
    const MAX_CAPACITY: usize = u32::MAX as usize;

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        debug_assert!(index <= Self::MAX_CAPACITY, "index {index} overflows u32 handle");
        index as u32
    }
}

/// The handle width selected for this build.
///
/// 16-bit by default; 32-bit with the `wide-handles` feature.
#[cfg(not(feature = "wide-handles"))]
pub type Handle = u16;

/// The handle width selected for this build.
///
/// 16-bit by default; 32-bit with the `wide-handles` feature.
#[cfg(feature = "wide-handles")]
pub type Handle = u32;

/// Sentinel for the build's [`Handle`] width.
pub const INVALID_HANDLE: Handle = <Handle as HandleIndex>::INVALID;
