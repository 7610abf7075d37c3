//! Configuration types for a simulation run.

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

/// Upper bound (exclusive) on the number of skiers.
pub const MAX_SKIERS: i64 = 20_000;
/// Allowed number of bus stops.
pub const STOPS_RANGE: std::ops::RangeInclusive<i64> = 1..=10;
/// Allowed bus capacity.
pub const CAPACITY_RANGE: std::ops::RangeInclusive<i64> = 10..=100;
/// Allowed maximum walking delay in microseconds.
pub const WALK_RANGE: std::ops::RangeInclusive<i64> = 0..=10_000;
/// Allowed maximum travel delay between stops in microseconds.
pub const TRAVEL_RANGE: std::ops::RangeInclusive<i64> = 0..=1_000;

/// Raw, unvalidated simulation parameters in CLI order `L Z K TL TB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawArgs {
    pub skiers: i64,
    pub stops: i64,
    pub capacity: i64,
    pub max_walk_us: i64,
    pub max_travel_us: i64,
}

/// Validated simulation parameters.
///
/// Every field is guaranteed to be inside its documented range, so the
/// protocol code never has to re-check them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of skiers (L)
    pub skiers: usize,
    /// Number of bus stops (Z)
    pub stops: usize,
    /// Bus capacity (K)
    pub capacity: usize,
    /// Maximum walking delay to a stop, microseconds (TL)
    pub max_walk_us: u64,
    /// Maximum travel delay between stops, microseconds (TB)
    pub max_travel_us: u64,
}

impl SimulationConfig {
    /// Validate the five parameters, reporting the first one out of range.
    pub fn new(
        skiers: i64,
        stops: i64,
        capacity: i64,
        max_walk_us: i64,
        max_travel_us: i64,
    ) -> Result<Self, ArgumentError> {
        Self::try_from(RawArgs {
            skiers,
            stops,
            capacity,
            max_walk_us,
            max_travel_us,
        })
    }
}

impl TryFrom<RawArgs> for SimulationConfig {
    type Error = ArgumentError;

    fn try_from(raw: RawArgs) -> Result<Self, Self::Error> {
        if !(0..MAX_SKIERS).contains(&raw.skiers) {
            return Err(ArgumentError::Skiers(raw.skiers));
        }
        if !STOPS_RANGE.contains(&raw.stops) {
            return Err(ArgumentError::Stops(raw.stops));
        }
        if !CAPACITY_RANGE.contains(&raw.capacity) {
            return Err(ArgumentError::Capacity(raw.capacity));
        }
        if !WALK_RANGE.contains(&raw.max_walk_us) {
            return Err(ArgumentError::WalkTime(raw.max_walk_us));
        }
        if !TRAVEL_RANGE.contains(&raw.max_travel_us) {
            return Err(ArgumentError::TravelTime(raw.max_travel_us));
        }

        // All values are non-negative and small after the checks above.
        Ok(Self {
            skiers: raw.skiers as usize,
            stops: raw.stops as usize,
            capacity: raw.capacity as usize,
            max_walk_us: raw.max_walk_us as u64,
            max_travel_us: raw.max_travel_us as u64,
        })
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            skiers: 0,
            stops: 1,
            capacity: 10,
            max_walk_us: 0,
            max_travel_us: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_boundaries() {
        assert!(SimulationConfig::new(0, 1, 10, 0, 0).is_ok());
        let config = SimulationConfig::new(19_999, 10, 100, 10_000, 1_000).unwrap();
        assert_eq!(config.skiers, 19_999);
        assert_eq!(config.stops, 10);
        assert_eq!(config.capacity, 100);
    }

    #[test]
    fn test_rejects_each_argument() {
        assert_eq!(
            SimulationConfig::new(20_000, 1, 10, 0, 0),
            Err(ArgumentError::Skiers(20_000))
        );
        assert_eq!(
            SimulationConfig::new(-1, 1, 10, 0, 0),
            Err(ArgumentError::Skiers(-1))
        );
        assert_eq!(
            SimulationConfig::new(1, 0, 10, 0, 0),
            Err(ArgumentError::Stops(0))
        );
        assert_eq!(
            SimulationConfig::new(1, 11, 10, 0, 0),
            Err(ArgumentError::Stops(11))
        );
        assert_eq!(
            SimulationConfig::new(1, 1, 9, 0, 0),
            Err(ArgumentError::Capacity(9))
        );
        assert_eq!(
            SimulationConfig::new(1, 1, 101, 0, 0),
            Err(ArgumentError::Capacity(101))
        );
        assert_eq!(
            SimulationConfig::new(1, 1, 10, 10_001, 0),
            Err(ArgumentError::WalkTime(10_001))
        );
        assert_eq!(
            SimulationConfig::new(1, 1, 10, 0, -5),
            Err(ArgumentError::TravelTime(-5))
        );
    }

    #[test]
    fn test_first_invalid_argument_wins() {
        assert_eq!(
            SimulationConfig::new(30_000, 0, 0, -1, -1),
            Err(ArgumentError::Skiers(30_000))
        );
    }
}
