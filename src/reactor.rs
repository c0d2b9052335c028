//! Reactor core model
//!
//! Core temperature, primary loop, coolant flow, burnup, control rods and
//! containment. Every tick walks each gauge inside its operating band (bands
//! widen under emergency scenarios) and re-derives the SCRAM signal from the
//! safety thresholds.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::control::ControlState;
use crate::random_walk::step;

/// Operating envelope of the reactor model
pub mod constants {
    pub const NUM_CONTROL_RODS: usize = 5;

    pub const BASE_VOLATILITY: f64 = 0.5;
    pub const EMERGENCY_VOLATILITY: f64 = 2.0;

    pub const CORE_TEMP_MIN: f64 = 315.0;       // [°C]
    pub const CORE_TEMP_MAX: f64 = 330.0;
    pub const CORE_TEMP_MAX_LOCA: f64 = 380.0;

    pub const PRIMARY_PRESSURE_MIN: f64 = 15.0; // [MPa]
    pub const PRIMARY_PRESSURE_MAX: f64 = 15.8;
    pub const PRIMARY_PRESSURE_MAX_LOCA: f64 = 16.5;
    pub const PRIMARY_PRESSURE_SCALE: f64 = 0.1;

    pub const COOLANT_FLOW_MIN: f64 = 52_000.0; // [m³/h]
    pub const COOLANT_FLOW_MIN_LOCA: f64 = 40_000.0;
    pub const COOLANT_FLOW_MAX: f64 = 58_000.0;
    pub const COOLANT_FLOW_SCALE: f64 = 100.0;

    pub const BURNUP_CHANCE: f64 = 0.05;
    pub const BURNUP_RATE: f64 = 0.01;          // [%] per tick at 1x
    pub const BURNUP_MAX: f64 = 100.0;

    pub const ROD_MOVE_CHANCE: f64 = 0.2;
    pub const ROD_MIN: f64 = 0.0;               // [%] inserted
    pub const ROD_MAX: f64 = 100.0;

    pub const CONTAINMENT_MIN: f64 = 100.0;     // [kPa]
    pub const CONTAINMENT_MAX: f64 = 103.0;
    pub const CONTAINMENT_MAX_EMERGENCY: f64 = 115.0;
    pub const CONTAINMENT_SCALE: f64 = 0.2;

    pub const RADIATION_MIN: f64 = 0.1;         // [mSv/h]
    pub const RADIATION_MAX: f64 = 0.15;
    pub const RADIATION_MAX_EMERGENCY: f64 = 0.8;
    pub const RADIATION_SCALE: f64 = 0.01;
}

/// Reactor snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactorState {
    pub core_temperature: f64,       // [°C]
    pub primary_loop_pressure: f64,  // [MPa]
    pub coolant_flow_rate: f64,      // [m³/h]
    pub fuel_burnup: f64,            // [%]
    pub control_rod_positions: [f64; constants::NUM_CONTROL_RODS], // [%] inserted, by rod
    pub containment_pressure: f64,   // [kPa]
    pub radiation_level: f64,        // [mSv/h]
    pub scram_active: bool,
    pub time_last_updated: DateTime<Utc>,
}

impl Default for ReactorState {
    fn default() -> Self {
        Self {
            core_temperature: 320.0,
            primary_loop_pressure: 15.5,
            coolant_flow_rate: 55_000.0,
            fuel_burnup: 34.0,
            control_rod_positions: [65.0, 60.0, 70.0, 55.0, 62.0],
            containment_pressure: 101.3,
            radiation_level: 0.12,
            scram_active: false,
            time_last_updated: Utc::now(),
        }
    }
}

// ============================================================================
// Safety thresholds
// ============================================================================

/// Monitored safety parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    CoreTemperature,
    PrimaryPressure,
    CoolantFlow,
    RadiationLevel,
    ContainmentPressure,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::CoreTemperature,
        Parameter::PrimaryPressure,
        Parameter::CoolantFlow,
        Parameter::RadiationLevel,
        Parameter::ContainmentPressure,
    ];
}

/// Dashboard status of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStatus {
    Normal,
    Warning,
    Critical,
}

impl ParameterStatus {
    /// Grade a reading that gets worse as it rises.
    pub fn rising(value: f64, warning: f64, critical: f64) -> Self {
        if value > critical {
            ParameterStatus::Critical
        } else if value > warning {
            ParameterStatus::Warning
        } else {
            ParameterStatus::Normal
        }
    }

    /// Grade a reading that gets worse as it falls.
    pub fn falling(value: f64, warning: f64, critical: f64) -> Self {
        if value < critical {
            ParameterStatus::Critical
        } else if value < warning {
            ParameterStatus::Warning
        } else {
            ParameterStatus::Normal
        }
    }
}

/// Automatic shutdown limits. A breach of any one trips SCRAM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyThresholds {
    pub high_core_temperature: f64,     // [°C]
    pub high_primary_pressure: f64,     // [MPa]
    pub low_coolant_flow: f64,          // [m³/h]
    pub high_radiation: f64,            // [mSv/h]
    pub high_containment_pressure: f64, // [kPa]
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl SafetyThresholds {
    pub const STANDARD: SafetyThresholds = SafetyThresholds {
        high_core_temperature: 340.0,
        high_primary_pressure: 16.0,
        low_coolant_flow: 50_000.0,
        high_radiation: 0.5,
        high_containment_pressure: 110.0,
    };

    /// Is `param` past its trip limit in `state`?
    pub fn is_breached(&self, state: &ReactorState, param: Parameter) -> bool {
        match param {
            Parameter::CoreTemperature => state.core_temperature > self.high_core_temperature,
            Parameter::PrimaryPressure => state.primary_loop_pressure > self.high_primary_pressure,
            Parameter::CoolantFlow => state.coolant_flow_rate < self.low_coolant_flow,
            Parameter::RadiationLevel => state.radiation_level > self.high_radiation,
            Parameter::ContainmentPressure => {
                state.containment_pressure > self.high_containment_pressure
            }
        }
    }

    /// All parameters currently past their trip limit
    pub fn breached(&self, state: &ReactorState) -> Vec<Parameter> {
        Parameter::ALL
            .into_iter()
            .filter(|param| self.is_breached(state, *param))
            .collect()
    }

    pub fn scram_required(&self, state: &ReactorState) -> bool {
        Parameter::ALL
            .iter()
            .any(|param| self.is_breached(state, *param))
    }

    /// Dashboard status. Critical coincides with a trip; the warning band
    /// sits just inside each limit.
    pub fn status(&self, state: &ReactorState, param: Parameter) -> ParameterStatus {
        if self.is_breached(state, param) {
            return ParameterStatus::Critical;
        }
        let warning = match param {
            Parameter::CoreTemperature => {
                state.core_temperature >= self.high_core_temperature - 10.0
            }
            Parameter::PrimaryPressure => {
                state.primary_loop_pressure >= self.high_primary_pressure - 0.3
            }
            Parameter::CoolantFlow => state.coolant_flow_rate < self.low_coolant_flow + 2_000.0,
            Parameter::RadiationLevel => state.radiation_level >= self.high_radiation / 2.0,
            Parameter::ContainmentPressure => {
                state.containment_pressure >= self.high_containment_pressure - 5.0
            }
        };
        if warning {
            ParameterStatus::Warning
        } else {
            ParameterStatus::Normal
        }
    }
}

// ============================================================================
// Tick
// ============================================================================

/// Advance the reactor by one tick.
///
/// Training mode returns `state` untouched, timestamp included.
pub fn advance<R: Rng + ?Sized>(
    state: &ReactorState,
    control: &ControlState,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ReactorState {
    use constants::*;

    if control.is_frozen() {
        return state.clone();
    }

    let volatility = if control.emergency_active() {
        EMERGENCY_VOLATILITY
    } else {
        BASE_VOLATILITY
    };
    let loca = control.is_loca();

    let core_temperature = step(
        rng,
        state.core_temperature,
        CORE_TEMP_MIN,
        if loca { CORE_TEMP_MAX_LOCA } else { CORE_TEMP_MAX },
        volatility,
    );

    let primary_loop_pressure = step(
        rng,
        state.primary_loop_pressure,
        PRIMARY_PRESSURE_MIN,
        if loca { PRIMARY_PRESSURE_MAX_LOCA } else { PRIMARY_PRESSURE_MAX },
        volatility * PRIMARY_PRESSURE_SCALE,
    );

    let coolant_flow_rate = step(
        rng,
        state.coolant_flow_rate,
        if loca { COOLANT_FLOW_MIN_LOCA } else { COOLANT_FLOW_MIN },
        COOLANT_FLOW_MAX,
        volatility * COOLANT_FLOW_SCALE,
    );

    let mut fuel_burnup = state.fuel_burnup;
    if rng.gen_bool(BURNUP_CHANCE) {
        fuel_burnup = (fuel_burnup + BURNUP_RATE * control.time_multiplier).min(BURNUP_MAX);
    }

    let mut control_rod_positions = state.control_rod_positions;
    if rng.gen_bool(ROD_MOVE_CHANCE) {
        let rod = rng.gen_range(0..NUM_CONTROL_RODS);
        control_rod_positions[rod] =
            step(rng, control_rod_positions[rod], ROD_MIN, ROD_MAX, volatility);
    }

    let containment_pressure = step(
        rng,
        state.containment_pressure,
        CONTAINMENT_MIN,
        if control.emergency_active() { CONTAINMENT_MAX_EMERGENCY } else { CONTAINMENT_MAX },
        volatility * CONTAINMENT_SCALE,
    );

    let radiation_level = step(
        rng,
        state.radiation_level,
        RADIATION_MIN,
        if control.emergency_active() { RADIATION_MAX_EMERGENCY } else { RADIATION_MAX },
        volatility * RADIATION_SCALE,
    );

    let mut next = ReactorState {
        core_temperature,
        primary_loop_pressure,
        coolant_flow_rate,
        fuel_burnup,
        control_rod_positions,
        containment_pressure,
        radiation_level,
        scram_active: false,
        time_last_updated: now,
    };
    next.scram_active = SafetyThresholds::STANDARD.scram_required(&next);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{EmergencyKind, Mode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn emergency(kind: EmergencyKind) -> ControlState {
        ControlState {
            emergency: Some(kind),
            ..ControlState::default()
        }
    }

    #[test]
    fn test_nominal_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let control = ControlState::default();
        let mut state = ReactorState::default();
        for _ in 0..2000 {
            state = advance(&state, &control, Utc::now(), &mut rng);
            assert!((315.0..=330.0).contains(&state.core_temperature));
            assert!((15.0..=15.8).contains(&state.primary_loop_pressure));
            assert!((52_000.0..=58_000.0).contains(&state.coolant_flow_rate));
            assert!((100.0..=103.0).contains(&state.containment_pressure));
            assert!((0.1..=0.15).contains(&state.radiation_level));
            assert!(state.control_rod_positions.iter().all(|p| (0.0..=100.0).contains(p)));
            // Nominal bands sit inside every trip limit
            assert!(!state.scram_active);
        }
    }

    #[test]
    fn test_loca_widened_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let control = emergency(EmergencyKind::Loca);
        let mut state = ReactorState::default();
        for _ in 0..1000 {
            state = advance(&state, &control, Utc::now(), &mut rng);
            assert!(state.core_temperature <= 380.0);
            assert!(state.core_temperature >= 315.0);
            assert!(state.primary_loop_pressure <= 16.5);
            assert!(state.coolant_flow_rate >= 40_000.0);
            assert!(state.containment_pressure <= 115.0);
            assert!(state.radiation_level <= 0.8);
        }
    }

    #[test]
    fn test_non_loca_emergency_keeps_core_band() {
        let mut rng = StdRng::seed_from_u64(5);
        let control = emergency(EmergencyKind::Cyber);
        let mut state = ReactorState::default();
        let mut max_containment: f64 = 0.0;
        for _ in 0..3000 {
            state = advance(&state, &control, Utc::now(), &mut rng);
            assert!(state.core_temperature <= 330.0);
            assert!(state.coolant_flow_rate >= 52_000.0);
            max_containment = max_containment.max(state.containment_pressure);
        }
        // Emergency noise pushes containment past its nominal ceiling
        assert!(max_containment > 103.0);
    }

    #[test]
    fn test_scram_matches_thresholds_on_returned_state() {
        let mut rng = StdRng::seed_from_u64(9);
        let control = emergency(EmergencyKind::Loca);
        let mut state = ReactorState::default();
        let mut tripped = false;
        for _ in 0..3000 {
            state = advance(&state, &control, Utc::now(), &mut rng);
            let expected = state.core_temperature > 340.0
                || state.primary_loop_pressure > 16.0
                || state.coolant_flow_rate < 50_000.0
                || state.radiation_level > 0.5
                || state.containment_pressure > 110.0;
            assert_eq!(state.scram_active, expected);
            tripped |= state.scram_active;
        }
        assert!(tripped, "LOCA noise should eventually trip the reactor");
    }

    #[test]
    fn test_training_freezes_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let control = ControlState {
            mode: Mode::Training,
            ..ControlState::default()
        };
        let state = ReactorState::default();
        for _ in 0..100 {
            assert_eq!(advance(&state, &control, Utc::now(), &mut rng), state);
        }
    }

    #[test]
    fn test_burnup_is_monotonic_and_scaled() {
        let mut rng = StdRng::seed_from_u64(17);
        let control = ControlState {
            time_multiplier: 5.0,
            ..ControlState::default()
        };
        let mut state = ReactorState::default();
        for _ in 0..2000 {
            let next = advance(&state, &control, Utc::now(), &mut rng);
            let delta = next.fuel_burnup - state.fuel_burnup;
            assert!(delta == 0.0 || (delta - 0.05).abs() < 1e-9);
            state = next;
        }
        assert!(state.fuel_burnup > 34.0);
    }

    #[test]
    fn test_burnup_caps_at_100() {
        let mut rng = StdRng::seed_from_u64(23);
        let control = ControlState {
            time_multiplier: 1000.0,
            ..ControlState::default()
        };
        let mut state = ReactorState { fuel_burnup: 99.0, ..ReactorState::default() };
        for _ in 0..500 {
            state = advance(&state, &control, Utc::now(), &mut rng);
            assert!(state.fuel_burnup <= 100.0);
        }
        assert_eq!(state.fuel_burnup, 100.0);
    }

    #[test]
    fn test_at_most_one_rod_moves_per_tick() {
        let mut rng = StdRng::seed_from_u64(29);
        let control = ControlState::default();
        let mut state = ReactorState::default();
        for _ in 0..1000 {
            let next = advance(&state, &control, Utc::now(), &mut rng);
            let moved = state
                .control_rod_positions
                .iter()
                .zip(next.control_rod_positions.iter())
                .filter(|(a, b)| a != b)
                .count();
            assert!(moved <= 1);
            state = next;
        }
    }

    #[test]
    fn test_threshold_evaluation() {
        let thresholds = SafetyThresholds::STANDARD;
        let mut state = ReactorState::default();
        assert!(thresholds.breached(&state).is_empty());
        assert!(!thresholds.scram_required(&state));

        state.core_temperature = 340.0;
        assert!(!thresholds.scram_required(&state), "limit itself is not a breach");
        assert_eq!(thresholds.status(&state, Parameter::CoreTemperature), ParameterStatus::Warning);

        state.core_temperature = 345.0;
        state.coolant_flow_rate = 45_000.0;
        assert_eq!(
            thresholds.breached(&state),
            vec![Parameter::CoreTemperature, Parameter::CoolantFlow]
        );
        assert_eq!(thresholds.status(&state, Parameter::CoolantFlow), ParameterStatus::Critical);
    }

    #[test]
    fn test_status_grading() {
        assert_eq!(ParameterStatus::rising(10.0, 20.0, 30.0), ParameterStatus::Normal);
        assert_eq!(ParameterStatus::rising(20.0, 20.0, 30.0), ParameterStatus::Normal);
        assert_eq!(ParameterStatus::rising(25.0, 20.0, 30.0), ParameterStatus::Warning);
        assert_eq!(ParameterStatus::rising(31.0, 20.0, 30.0), ParameterStatus::Critical);
        assert_eq!(ParameterStatus::falling(95.0, 91.0, 89.0), ParameterStatus::Normal);
        assert_eq!(ParameterStatus::falling(90.0, 91.0, 89.0), ParameterStatus::Warning);
        assert_eq!(ParameterStatus::falling(88.5, 91.0, 89.0), ParameterStatus::Critical);
    }

    #[test]
    fn test_warning_bands() {
        let thresholds = SafetyThresholds::STANDARD;
        let state = ReactorState {
            primary_loop_pressure: 15.75,
            coolant_flow_rate: 51_000.0,
            radiation_level: 0.3,
            containment_pressure: 106.0,
            ..ReactorState::default()
        };
        for param in [
            Parameter::PrimaryPressure,
            Parameter::CoolantFlow,
            Parameter::RadiationLevel,
            Parameter::ContainmentPressure,
        ] {
            assert_eq!(thresholds.status(&state, param), ParameterStatus::Warning, "{param:?}");
        }
        assert_eq!(
            thresholds.status(&ReactorState::default(), Parameter::CoreTemperature),
            ParameterStatus::Normal
        );
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let json = serde_json::to_value(ReactorState::default()).unwrap();
        assert_eq!(json["coreTemperature"], 320.0);
        assert_eq!(json["scramActive"], false);
        assert_eq!(json["controlRodPositions"].as_array().unwrap().len(), 5);
        assert!(json.get("timeLastUpdated").is_some());
    }
}
