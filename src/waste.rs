//! Spent fuel lifecycle
//!
//! Fuel moves core -> spent fuel pool -> dry casks. Transfers are random
//! events, but each one moves fuel between two holding states in the same
//! tick so nothing is lost on the way.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::control::ControlState;
use crate::random_walk::{round2, step};
use crate::reactor::ParameterStatus;

pub mod constants {
    pub const USAGE_CHANCE: f64 = 0.02;
    pub const USAGE_RATE: f64 = 0.05;          // [%] per event at 1x
    pub const USAGE_FULL: f64 = 100.0;

    /// Chance per tick that a spent batch leaves the core once usage is full
    pub const DISCHARGE_CHANCE: f64 = 0.1;
    pub const POOL_PER_BATCH: f64 = 2.0;       // [%] of pool capacity
    pub const POOL_MAX: f64 = 100.0;

    /// Pool fill level above which casks get loaded
    pub const CASK_LOADING_LEVEL: f64 = 90.0;
    pub const CASK_CHANCE: f64 = 0.2;
    pub const POOL_PER_CASK: f64 = 10.0;
    /// Display capacity of the dry cask pad; the model does not enforce it
    pub const DRY_CASK_CAPACITY: u32 = 24;

    pub const POOL_TEMP_BASE: f64 = 30.0;      // [°C]
    pub const POOL_TEMP_PER_PCT: f64 = 0.15;
    pub const POOL_TEMP_MIN: f64 = 25.0;
    pub const POOL_TEMP_MAX: f64 = 50.0;
    pub const POOL_TEMP_VOLATILITY: f64 = 0.2;

    pub const RADIATION_BASE: f64 = 1.0;       // [mSv/h]
    pub const RADIATION_PER_PCT: f64 = 0.03;
    pub const RADIATION_MIN: f64 = 0.5;
    pub const RADIATION_MAX: f64 = 5.0;
    pub const RADIATION_VOLATILITY: f64 = 0.1;

    // Dashboard status bands
    pub const USAGE_WARNING: f64 = 80.0;
    pub const USAGE_CRITICAL: f64 = 95.0;
    pub const POOL_WARNING: f64 = 70.0;
    pub const POOL_CRITICAL: f64 = 90.0;
    pub const POOL_TEMP_WARNING: f64 = 40.0;
    pub const POOL_TEMP_CRITICAL: f64 = 45.0;
    pub const RADIATION_WARNING: f64 = 3.0;
    pub const RADIATION_CRITICAL: f64 = 4.0;
}

/// Graded waste inventory readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WasteParameter {
    FuelUsage,
    PoolCapacity,
    SpentFuelTemperature,
    WasteRadiation,
}

impl WasteParameter {
    pub const ALL: [WasteParameter; 4] = [
        WasteParameter::FuelUsage,
        WasteParameter::PoolCapacity,
        WasteParameter::SpentFuelTemperature,
        WasteParameter::WasteRadiation,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteState {
    pub fuel_usage_percentage: f64,     // [%] of the current core batch
    pub spent_fuel_pool_capacity: f64,  // [%] filled
    pub spent_fuel_temperature: f64,    // [°C]
    pub dry_cask_occupancy: u32,
    pub waste_radiation_level: f64,     // [mSv/h]
    pub time_last_updated: DateTime<Utc>,
}

impl Default for WasteState {
    fn default() -> Self {
        Self {
            fuel_usage_percentage: 34.0,
            spent_fuel_pool_capacity: 45.0,
            spent_fuel_temperature: 38.0,
            dry_cask_occupancy: 12,
            waste_radiation_level: 2.3,
            time_last_updated: Utc::now(),
        }
    }
}

impl WasteState {
    /// Free cask slots on the pad
    pub fn dry_cask_free(&self) -> u32 {
        constants::DRY_CASK_CAPACITY.saturating_sub(self.dry_cask_occupancy)
    }

    /// Dashboard status of one reading. All four get worse as they rise.
    pub fn status(&self, param: WasteParameter) -> ParameterStatus {
        use constants::*;
        let (value, warning, critical) = match param {
            WasteParameter::FuelUsage => {
                (self.fuel_usage_percentage, USAGE_WARNING, USAGE_CRITICAL)
            }
            WasteParameter::PoolCapacity => {
                (self.spent_fuel_pool_capacity, POOL_WARNING, POOL_CRITICAL)
            }
            WasteParameter::SpentFuelTemperature => {
                (self.spent_fuel_temperature, POOL_TEMP_WARNING, POOL_TEMP_CRITICAL)
            }
            WasteParameter::WasteRadiation => {
                (self.waste_radiation_level, RADIATION_WARNING, RADIATION_CRITICAL)
            }
        };
        ParameterStatus::rising(value, warning, critical)
    }
}

pub fn target_pool_temperature(pool_capacity: f64) -> f64 {
    constants::POOL_TEMP_BASE + pool_capacity * constants::POOL_TEMP_PER_PCT
}

pub fn target_waste_radiation(pool_capacity: f64) -> f64 {
    constants::RADIATION_BASE + pool_capacity * constants::RADIATION_PER_PCT
}

/// Advance the waste inventory by one tick.
pub fn advance<R: Rng + ?Sized>(
    state: &WasteState,
    control: &ControlState,
    now: DateTime<Utc>,
    rng: &mut R,
) -> WasteState {
    use constants::*;

    if control.is_frozen() {
        return state.clone();
    }

    let mut usage = state.fuel_usage_percentage;
    if rng.gen_bool(USAGE_CHANCE) {
        usage = round2(usage + USAGE_RATE * control.time_multiplier).min(USAGE_FULL);
    }

    // core -> pool
    let mut pool = state.spent_fuel_pool_capacity;
    if usage >= USAGE_FULL && rng.gen_bool(DISCHARGE_CHANCE) {
        usage = 0.0;
        pool = (pool + POOL_PER_BATCH).min(POOL_MAX);
    }

    let spent_fuel_temperature = step(
        rng,
        target_pool_temperature(pool),
        POOL_TEMP_MIN,
        POOL_TEMP_MAX,
        POOL_TEMP_VOLATILITY,
    );

    // pool -> cask
    let mut casks = state.dry_cask_occupancy;
    if pool > CASK_LOADING_LEVEL && rng.gen_bool(CASK_CHANCE) {
        pool -= POOL_PER_CASK;
        casks += 1;
    }

    let waste_radiation_level = step(
        rng,
        target_waste_radiation(pool),
        RADIATION_MIN,
        RADIATION_MAX,
        RADIATION_VOLATILITY,
    );

    WasteState {
        fuel_usage_percentage: round2(usage),
        spent_fuel_pool_capacity: round2(pool),
        spent_fuel_temperature,
        dry_cask_occupancy: casks,
        waste_radiation_level,
        time_last_updated: now,
    }
}
