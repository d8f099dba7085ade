//! Avalanche mixers for open-addressing keys.
//!
//! Not cryptographic: collisions are resolved by probing, so the mixers
//! only need to spread nearby integer keys across the table.

use std::fmt;

/// First multiplier of the 32-bit finalizer.
const MIX32_A: u32 = 2_246_822_519;
/// Second multiplier of the 32-bit finalizer.
const MIX32_B: u32 = 2_654_435_761;

/// First multiplier of the 64-bit finalizer.
const MIX64_A: u64 = 14_029_467_366_897_019_727;
/// Second multiplier of the 64-bit finalizer.
const MIX64_B: u64 = 11_400_714_785_074_694_791;

/// Mix a 32-bit key: multiply, rotate left 13, multiply.
#[inline]
pub const fn mix32(x: u32) -> u32 {
    x.wrapping_mul(MIX32_A)
        .rotate_left(13)
        .wrapping_mul(MIX32_B)
}

/// Mix a 64-bit key: multiply, rotate left 31, multiply.
#[inline]
pub const fn mix64(x: u64) -> u64 {
    x.wrapping_mul(MIX64_A)
        .rotate_left(31)
        .wrapping_mul(MIX64_B)
}

/// A key type accepted by `HandleMap`.
///
/// `Default` supplies the filler for empty slots; it is never compared
/// against because emptiness is tracked through the handle column.
pub trait MapKey: Copy + Eq + Default + fmt::Debug {
    /// Hash value used to pick the key's home slot.
    fn mix(self) -> u64;

    /// Home slot of this key in a table of `capacity` slots.
    #[inline]
    fn home_slot(self, capacity: usize) -> usize {
        (self.mix() % capacity as u64) as usize
    }
}

impl MapKey for u16 {
    #[inline]
    fn mix(self) -> u64 {
        u64::from(mix32(u32::from(self)))
    }
}

impl MapKey for u32 {
    #[inline]
    fn mix(self) -> u64 {
        u64::from(mix32(self))
    }
}

impl MapKey for u64 {
    #[inline]
    fn mix(self) -> u64 {
        mix64(self)
    }
}

impl MapKey for usize {
    #[inline]
    fn mix(self) -> u64 {
        mix64(self as u64)
    }
}
