//! Plant simulation engine
//!
//! Owns the four model states, the control flags and the RNG behind a single
//! lock. Each update call takes the lock once: read the control flags,
//! compute the next state, commit. Separate model updates are independent,
//! so state across models is last-writer-wins with no cross-model atomicity
//! (use [`SimulationEngine::update_all`] to advance everything under one
//! lock).

use chrono::{Local, Timelike, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::SimulationConfig;
use crate::control::{validate_time_multiplier, ControlState, EmergencyKind, EmergencyStatus, Mode};
use crate::energy::{self, EnergyMixState};
use crate::error::{Result, SimError};
use crate::reactor::{self, constants::NUM_CONTROL_RODS, ReactorState, SafetyThresholds};
use crate::thermal::{self, ThermalState};
use crate::waste::{self, WasteState};

/// Source of the hour of day used by the daily cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Local wall clock
    System,
    /// Always the given hour (0-23)
    Fixed(u32),
}

impl Clock {
    pub fn hour(&self) -> u32 {
        match self {
            Clock::System => Local::now().hour(),
            Clock::Fixed(hour) => *hour,
        }
    }
}

/// Everything a dashboard renders, taken at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantSnapshot {
    pub reactor: ReactorState,
    pub energy: EnergyMixState,
    pub thermal: ThermalState,
    pub waste: WasteState,
    pub control: ControlState,
}

struct EngineState {
    reactor: ReactorState,
    energy: EnergyMixState,
    thermal: ThermalState,
    waste: WasteState,
    control: ControlState,
    rng: StdRng,
}

impl EngineState {
    fn new(control: ControlState, rng: StdRng) -> Self {
        Self {
            reactor: ReactorState::default(),
            energy: EnergyMixState::default(),
            thermal: ThermalState::default(),
            waste: WasteState::default(),
            control,
            rng,
        }
    }

    fn snapshot(&self) -> PlantSnapshot {
        PlantSnapshot {
            reactor: self.reactor.clone(),
            energy: self.energy.clone(),
            thermal: self.thermal.clone(),
            waste: self.waste.clone(),
            control: self.control,
        }
    }

    fn advance_reactor(&mut self) -> ReactorState {
        let was_tripped = self.reactor.scram_active;
        let next = reactor::advance(&self.reactor, &self.control, Utc::now(), &mut self.rng);
        if next.scram_active && !was_tripped {
            log::warn!(
                "SCRAM: thresholds breached {:?}",
                SafetyThresholds::STANDARD.breached(&next)
            );
        } else if was_tripped && !next.scram_active {
            log::info!("SCRAM cleared, all parameters back inside limits");
        }
        log::debug!(
            "reactor tick: T={:.2}°C P={:.2}MPa flow={:.0}m³/h rad={:.3}mSv/h",
            next.core_temperature,
            next.primary_loop_pressure,
            next.coolant_flow_rate,
            next.radiation_level
        );
        self.reactor = next.clone();
        next
    }

    fn advance_energy(&mut self, hour: u32, demand_peak_hour: u32) -> EnergyMixState {
        let next = energy::advance(
            &self.energy,
            &self.control,
            hour,
            demand_peak_hour,
            Utc::now(),
            &mut self.rng,
        );
        log::debug!(
            "energy tick: nuclear={:.0}MW demand={:.0}MW balance={:?}",
            next.nuclear,
            next.demand,
            next.balance()
        );
        self.energy = next.clone();
        next
    }

    fn advance_thermal(&mut self, hour: u32) -> ThermalState {
        let next = thermal::advance(&self.thermal, &self.control, hour, Utc::now(), &mut self.rng);
        log::debug!(
            "thermal tick: ambient={:.1}°C heat rate={:.0} turbine={:.2}%",
            next.ambient_temperature,
            next.heat_rate,
            next.turbine_efficiency
        );
        self.thermal = next.clone();
        next
    }

    fn advance_waste(&mut self) -> WasteState {
        let next = waste::advance(&self.waste, &self.control, Utc::now(), &mut self.rng);
        if next.fuel_usage_percentage < self.waste.fuel_usage_percentage {
            log::info!(
                "Spent batch discharged to pool (pool at {:.1}%)",
                next.spent_fuel_pool_capacity
            );
        }
        if next.dry_cask_occupancy > self.waste.dry_cask_occupancy {
            log::info!(
                "Dry cask loaded ({} on pad, pool at {:.1}%)",
                next.dry_cask_occupancy,
                next.spent_fuel_pool_capacity
            );
        }
        log::debug!(
            "waste tick: usage={:.2}% pool={:.2}% casks={}",
            next.fuel_usage_percentage,
            next.spent_fuel_pool_capacity,
            next.dry_cask_occupancy
        );
        self.waste = next.clone();
        next
    }
}

/// Shared plant simulation
pub struct SimulationEngine {
    state: Mutex<EngineState>,
    clock: Clock,
    demand_peak_hour: u32,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationEngine {
    /// Engine at factory defaults, seeded from OS entropy, following the wall clock.
    pub fn new() -> Self {
        Self::build(ControlState::default(), StdRng::from_entropy(), Clock::System, 0)
    }

    /// Reproducible engine for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(ControlState::default(), StdRng::seed_from_u64(seed), Clock::System, 0)
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let clock = config.fixed_hour.map_or(Clock::System, Clock::Fixed);
        let control = ControlState {
            mode: config.initial_mode,
            emergency: None,
            time_multiplier: config.time_multiplier,
        };
        Ok(Self::build(control, rng, clock, config.demand_peak_hour))
    }

    fn build(control: ControlState, rng: StdRng, clock: Clock, demand_peak_hour: u32) -> Self {
        Self {
            state: Mutex::new(EngineState::new(control, rng)),
            clock,
            demand_peak_hour,
        }
    }

    /// Replace the hour-of-day source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    // Every tick leaves the state consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Model snapshots and ticks
    // ========================================================================

    pub fn initial_reactor(&self) -> ReactorState {
        self.lock().reactor.clone()
    }

    pub fn update_reactor(&self) -> ReactorState {
        self.lock().advance_reactor()
    }

    pub fn initial_energy_mix(&self) -> EnergyMixState {
        self.lock().energy.clone()
    }

    pub fn update_energy_mix(&self) -> EnergyMixState {
        let hour = self.clock.hour();
        self.lock().advance_energy(hour, self.demand_peak_hour)
    }

    pub fn initial_thermal(&self) -> ThermalState {
        self.lock().thermal.clone()
    }

    pub fn update_thermal(&self) -> ThermalState {
        let hour = self.clock.hour();
        self.lock().advance_thermal(hour)
    }

    pub fn initial_waste(&self) -> WasteState {
        self.lock().waste.clone()
    }

    pub fn update_waste(&self) -> WasteState {
        self.lock().advance_waste()
    }

    /// Current state of the whole plant without advancing it
    pub fn snapshot(&self) -> PlantSnapshot {
        self.lock().snapshot()
    }

    /// Advance every model once under a single lock.
    pub fn update_all(&self) -> PlantSnapshot {
        let hour = self.clock.hour();
        let mut state = self.lock();
        state.advance_reactor();
        state.advance_energy(hour, self.demand_peak_hour);
        state.advance_thermal(hour);
        state.advance_waste();
        state.snapshot()
    }

    // ========================================================================
    // Control surface
    // ========================================================================

    pub fn control(&self) -> ControlState {
        self.lock().control
    }

    pub fn set_mode(&self, mode: Mode) {
        let mut state = self.lock();
        if state.control.mode != mode {
            log::info!("Simulation mode: {} -> {}", state.control.mode, mode);
        }
        state.control.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.lock().control.mode
    }

    /// Start an emergency scenario. Replaces any scenario already running.
    pub fn activate_emergency(&self, kind: EmergencyKind) {
        let mut state = self.lock();
        match state.control.emergency {
            Some(previous) if previous != kind => {
                log::warn!("Emergency scenario {} replaced by {}", previous, kind)
            }
            Some(_) => {}
            None => log::warn!("Emergency scenario {} activated", kind),
        }
        state.control.emergency = Some(kind);
    }

    pub fn deactivate_emergency(&self) {
        let mut state = self.lock();
        if let Some(kind) = state.control.emergency.take() {
            log::info!("Emergency scenario {} cleared", kind);
        }
    }

    pub fn emergency_status(&self) -> EmergencyStatus {
        self.lock().control.emergency_status()
    }

    /// Set the time acceleration. Non-positive or non-finite values are
    /// rejected and the current multiplier is kept.
    pub fn set_time_multiplier(&self, value: f64) -> Result<()> {
        let value = validate_time_multiplier(value)?;
        let mut state = self.lock();
        log::info!("Time multiplier: {}x -> {}x", state.control.time_multiplier, value);
        state.control.time_multiplier = value;
        Ok(())
    }

    pub fn time_multiplier(&self) -> f64 {
        self.lock().control.time_multiplier
    }

    /// Restore all four models to factory defaults and clear any emergency.
    /// Mode and time multiplier are kept.
    pub fn reset_to_defaults(&self) {
        let mut state = self.lock();
        state.reactor = ReactorState::default();
        state.energy = EnergyMixState::default();
        state.thermal = ThermalState::default();
        state.waste = WasteState::default();
        state.control.emergency = None;
        log::info!("Simulation reset to defaults");
    }

    /// Operator override of a single rod, bypassing the random walk.
    ///
    /// The index must name one of the five rods and the position must lie
    /// in `[0, 100]`; anything else is rejected without touching the state.
    pub fn set_manual_rod_position(&self, index: usize, position: f64) -> Result<()> {
        if index >= NUM_CONTROL_RODS {
            return Err(SimError::InvalidArgument(format!(
                "control rod index {index} out of range (0..{NUM_CONTROL_RODS})"
            )));
        }
        if !position.is_finite() || !(0.0..=100.0).contains(&position) {
            return Err(SimError::InvalidArgument(format!(
                "control rod position must be within 0-100%, got {position}"
            )));
        }
        let mut state = self.lock();
        state.reactor.control_rod_positions[index] = position;
        log::info!("Control rod {} set to {:.1}% by operator", index, position);
        Ok(())
    }
}
