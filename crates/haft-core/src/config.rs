//! Capacity configuration.

use crate::error::HandleError;
use crate::handle::HandleIndex;

/// Capacities for a handle structure.
///
/// Validated once at construction; a structure never resizes afterwards.
/// Structures without a map ignore `map_capacity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapacityConfig {
    /// Number of handles the allocator can hand out at once.
    pub max_handles: usize,

    /// Slot count of the open-addressing map backing keyed lookups.
    ///
    /// Default: `max_handles + max_handles / 2`. The slack keeps probe
    /// sequences short; it must never be below `max_handles`.
    pub map_capacity: usize,
}

impl CapacityConfig {
    /// Create a config for `max_handles` handles with the default map capacity.
    pub fn new(max_handles: usize) -> Self {
        Self {
            max_handles,
            map_capacity: Self::default_map_capacity(max_handles),
        }
    }

    /// Override the map slot count.
    #[must_use]
    pub fn with_map_capacity(mut self, map_capacity: usize) -> Self {
        self.map_capacity = map_capacity;
        self
    }

    /// Map capacity recommended for `max_handles` live handles (1.5x).
    pub fn default_map_capacity(max_handles: usize) -> usize {
        max_handles + max_handles / 2
    }

    /// Check `max_handles` against the handle width `H`.
    pub fn validate_handles<H: HandleIndex>(&self) -> Result<(), HandleError> {
        if self.max_handles == 0 || self.max_handles > H::MAX_CAPACITY {
            return Err(HandleError::InvalidCapacity {
                requested: self.max_handles,
                max: H::MAX_CAPACITY,
            });
        }
        Ok(())
    }

    /// Check both capacities for a keyed structure.
    pub fn validate<H: HandleIndex>(&self) -> Result<(), HandleError> {
        self.validate_handles::<H>()?;
        if self.map_capacity < self.max_handles {
            return Err(HandleError::MapTooSmall {
                map_capacity: self.map_capacity,
                max_handles: self.max_handles,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_capacity_is_one_and_a_half() {
        assert_eq!(CapacityConfig::new(2).map_capacity, 3);
        assert_eq!(CapacityConfig::new(100).map_capacity, 150);
        assert_eq!(CapacityConfig::new(1).map_capacity, 1);
    }

    #[test]
    fn zero_handles_rejected() {
        let err = CapacityConfig::new(0).validate_handles::<u16>().unwrap_err();
        assert_eq!(
            err,
            HandleError::InvalidCapacity {
                requested: 0,
                max: 65_535
            }
        );
    }

    #[test]
    fn capacity_must_stay_below_sentinel() {
        assert!(CapacityConfig::new(65_535).validate_handles::<u16>().is_ok());
        assert!(CapacityConfig::new(65_536).validate_handles::<u16>().is_err());
        assert!(CapacityConfig::new(65_536).validate_handles::<u32>().is_ok());
    }

    #[test]
    fn undersized_map_rejected() {
        let config = CapacityConfig::new(10).with_map_capacity(9);
        assert_eq!(
            config.validate::<u16>(),
            Err(HandleError::MapTooSmall {
                map_capacity: 9,
                max_handles: 10
            })
        );
        assert!(config.with_map_capacity(10).validate::<u16>().is_ok());
    }
}
