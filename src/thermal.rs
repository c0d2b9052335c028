//! Thermal cycle efficiency
//!
//! Ambient temperature drives the cooling towers, and cooling tower
//! performance feeds both heat rate and turbine efficiency.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::control::ControlState;
use crate::random_walk::{round_to, step};
use crate::reactor::ParameterStatus;

pub mod constants {
    pub const AMBIENT_MEAN: f64 = 20.0;      // [°C]
    pub const AMBIENT_AMPLITUDE: f64 = 8.0;
    pub const AMBIENT_MIN: f64 = 5.0;
    pub const AMBIENT_MAX: f64 = 35.0;
    pub const AMBIENT_VOLATILITY: f64 = 0.5;

    pub const COOLING_REFERENCE_TEMP: f64 = 15.0; // [°C]
    pub const COOLING_TEMP_SPAN: f64 = 40.0;
    pub const DESIGN_COOLING_EFFICIENCY: f64 = 85.0; // [%]

    pub const HEAT_RATE_BASE: f64 = 10_000.0; // [BTU/kWh]
    pub const HEAT_RATE_PENALTY: f64 = 10.0;  // per % of lost cooling
    pub const HEAT_RATE_MIN: f64 = 9_800.0;
    pub const HEAT_RATE_MAX: f64 = 10_600.0;
    pub const HEAT_RATE_VOLATILITY: f64 = 20.0;

    pub const TURBINE_DESIGN_EFFICIENCY: f64 = 92.0; // [%]
    pub const TURBINE_PENALTY_DIVISOR: f64 = 10.0;
    pub const TURBINE_MIN: f64 = 88.0;
    pub const TURBINE_MAX: f64 = 93.0;
    pub const TURBINE_VOLATILITY: f64 = 0.1;

    pub const CONDENSER_MIN: f64 = 4.8;       // [kPa]
    pub const CONDENSER_MAX: f64 = 5.4;
    pub const CONDENSER_VOLATILITY: f64 = 0.05;

    pub const FEEDWATER_MIN: f64 = 215.0;     // [°C]
    pub const FEEDWATER_MAX: f64 = 225.0;
    pub const FEEDWATER_VOLATILITY: f64 = 0.2;

    // Dashboard status bands
    pub const HEAT_RATE_WARNING: f64 = 10_200.0;
    pub const HEAT_RATE_CRITICAL: f64 = 10_400.0;
    pub const TURBINE_WARNING: f64 = 91.0;
    pub const TURBINE_CRITICAL: f64 = 89.0;
    pub const CONDENSER_WARNING: f64 = 5.2;
    pub const CONDENSER_CRITICAL: f64 = 5.3;
    pub const COOLING_WARNING: f64 = 75.0;
    pub const COOLING_CRITICAL: f64 = 70.0;
}

/// Graded thermal cycle readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThermalParameter {
    HeatRate,
    TurbineEfficiency,
    CondenserVacuum,
    CoolingTowerEfficiency,
}

impl ThermalParameter {
    pub const ALL: [ThermalParameter; 4] = [
        ThermalParameter::HeatRate,
        ThermalParameter::TurbineEfficiency,
        ThermalParameter::CondenserVacuum,
        ThermalParameter::CoolingTowerEfficiency,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalState {
    pub heat_rate: f64,                // [BTU/kWh]
    pub turbine_efficiency: f64,       // [%]
    pub condenser_vacuum: f64,         // [kPa]
    pub feedwater_temperature: f64,    // [°C]
    pub ambient_temperature: f64,      // [°C]
    pub cooling_tower_efficiency: f64, // [%]
    pub time_last_updated: DateTime<Utc>,
}

impl Default for ThermalState {
    fn default() -> Self {
        Self {
            heat_rate: 10_200.0,
            turbine_efficiency: 92.0,
            condenser_vacuum: 5.1,
            feedwater_temperature: 220.0,
            ambient_temperature: 25.0,
            cooling_tower_efficiency: 85.0,
            time_last_updated: Utc::now(),
        }
    }
}

impl ThermalState {
    /// Dashboard status of one reading.
    pub fn status(&self, param: ThermalParameter) -> ParameterStatus {
        use constants::*;
        match param {
            ThermalParameter::HeatRate => {
                ParameterStatus::rising(self.heat_rate, HEAT_RATE_WARNING, HEAT_RATE_CRITICAL)
            }
            ThermalParameter::TurbineEfficiency => ParameterStatus::falling(
                self.turbine_efficiency,
                TURBINE_WARNING,
                TURBINE_CRITICAL,
            ),
            ThermalParameter::CondenserVacuum => ParameterStatus::rising(
                self.condenser_vacuum,
                CONDENSER_WARNING,
                CONDENSER_CRITICAL,
            ),
            ThermalParameter::CoolingTowerEfficiency => ParameterStatus::falling(
                self.cooling_tower_efficiency,
                COOLING_WARNING,
                COOLING_CRITICAL,
            ),
        }
    }
}

/// Daily ambient temperature cycle
pub fn baseline_ambient(hour: u32) -> f64 {
    let phase = hour as f64 / 24.0 * 2.0 * PI;
    constants::AMBIENT_MEAN + phase.sin() * constants::AMBIENT_AMPLITUDE
}

/// Relative cooling capacity; falls as ambient rises.
pub fn cooling_factor(ambient: f64) -> f64 {
    1.0 - (ambient - constants::COOLING_REFERENCE_TEMP) / constants::COOLING_TEMP_SPAN
}

pub fn cooling_tower_efficiency(ambient: f64) -> f64 {
    round_to(constants::DESIGN_COOLING_EFFICIENCY * cooling_factor(ambient), 1)
}

/// Heat rate the plant drifts toward for a given cooling tower efficiency
pub fn target_heat_rate(cooling_efficiency: f64) -> f64 {
    constants::HEAT_RATE_BASE
        + (constants::DESIGN_COOLING_EFFICIENCY - cooling_efficiency) * constants::HEAT_RATE_PENALTY
}

/// Turbine efficiency the plant drifts toward for a given cooling tower efficiency
pub fn target_turbine_efficiency(cooling_efficiency: f64) -> f64 {
    let lost_cooling = constants::DESIGN_COOLING_EFFICIENCY - cooling_efficiency;
    constants::TURBINE_DESIGN_EFFICIENCY - lost_cooling / constants::TURBINE_PENALTY_DIVISOR
}

/// Advance the thermal cycle by one tick at local `hour`.
pub fn advance<R: Rng + ?Sized>(
    state: &ThermalState,
    control: &ControlState,
    hour: u32,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ThermalState {
    use constants::*;

    if control.is_frozen() {
        return state.clone();
    }

    let ambient_temperature = step(
        rng,
        baseline_ambient(hour),
        AMBIENT_MIN,
        AMBIENT_MAX,
        AMBIENT_VOLATILITY,
    );
    let cooling_tower_efficiency = cooling_tower_efficiency(ambient_temperature);

    let heat_rate = step(
        rng,
        target_heat_rate(cooling_tower_efficiency),
        HEAT_RATE_MIN,
        HEAT_RATE_MAX,
        HEAT_RATE_VOLATILITY,
    );
    let turbine_efficiency = step(
        rng,
        target_turbine_efficiency(cooling_tower_efficiency),
        TURBINE_MIN,
        TURBINE_MAX,
        TURBINE_VOLATILITY,
    );

    let condenser_vacuum = step(
        rng,
        state.condenser_vacuum,
        CONDENSER_MIN,
        CONDENSER_MAX,
        CONDENSER_VOLATILITY,
    );
    let feedwater_temperature = step(
        rng,
        state.feedwater_temperature,
        FEEDWATER_MIN,
        FEEDWATER_MAX,
        FEEDWATER_VOLATILITY,
    );

    ThermalState {
        heat_rate,
        turbine_efficiency,
        condenser_vacuum,
        feedwater_temperature,
        ambient_temperature,
        cooling_tower_efficiency,
        time_last_updated: now,
    }
}
