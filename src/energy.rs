//! Grid energy mix
//!
//! Renewables and demand follow the time of day; the plant covers whatever
//! the renewables leave over (residual dispatch) within its output envelope.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::control::ControlState;
use crate::random_walk::{round2, round_to, step};

pub mod constants {
    pub const SOLAR_PEAK_MW: f64 = 200.0;
    pub const SOLAR_NIGHT_FACTOR: f64 = 0.1;
    pub const SOLAR_MIN: f64 = 0.0;
    pub const SOLAR_MAX: f64 = 300.0;
    pub const SOLAR_VOLATILITY: f64 = 10.0;

    pub const WIND_BASELINE_MW: f64 = 300.0;
    pub const WIND_FACTOR_CENTER: f64 = 0.7;
    pub const WIND_FACTOR_MIN: f64 = 0.3;
    pub const WIND_FACTOR_MAX: f64 = 1.0;
    pub const WIND_FACTOR_VOLATILITY: f64 = 0.1;
    pub const WIND_MIN: f64 = 100.0;
    pub const WIND_MAX: f64 = 500.0;
    pub const WIND_VOLATILITY: f64 = 20.0;

    pub const HYDRO_MIN: f64 = 350.0;
    pub const HYDRO_MAX: f64 = 450.0;
    pub const HYDRO_VOLATILITY: f64 = 5.0;

    pub const DEMAND_MEAN_MW: f64 = 1500.0;
    pub const DEMAND_AMPLITUDE_MW: f64 = 300.0;
    pub const DEMAND_MIN: f64 = 1400.0;
    pub const DEMAND_MAX: f64 = 2000.0;
    pub const DEMAND_VOLATILITY: f64 = 30.0;

    pub const NUCLEAR_MIN_MW: f64 = 600.0;
    pub const NUCLEAR_MAX_MW: f64 = 1200.0;

    /// Coal-equivalent emissions avoided per MW generated [t]
    pub const CO2_PER_MW: f64 = 0.82;

    /// Deficit below which the grid is considered short [MW]
    pub const SHORTFALL_MW: f64 = 100.0;
}

/// Energy mix snapshot, all outputs in MW
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyMixState {
    pub nuclear: f64,
    pub solar: f64,
    pub wind: f64,
    pub hydro: f64,
    pub demand: f64,
    pub co2_avoided: f64, // [t] for this tick, not a running total
    pub time_last_updated: DateTime<Utc>,
}

impl Default for EnergyMixState {
    fn default() -> Self {
        Self {
            nuclear: 1000.0,
            solar: 200.0,
            wind: 300.0,
            hydro: 400.0,
            demand: 1700.0,
            co2_avoided: 1450.0,
            time_last_updated: Utc::now(),
        }
    }
}

/// Percentage share of each source, rounded to whole percent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationShares {
    pub nuclear: f64,
    pub solar: f64,
    pub wind: f64,
    pub hydro: f64,
}

/// Supply versus demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridBalance {
    Surplus,
    Deficit,
    Shortfall,
}

impl EnergyMixState {
    pub fn total_generation(&self) -> f64 {
        self.nuclear + self.solar + self.wind + self.hydro
    }

    /// Generation minus demand
    pub fn surplus(&self) -> f64 {
        self.total_generation() - self.demand
    }

    pub fn balance(&self) -> GridBalance {
        let surplus = self.surplus();
        if surplus >= 0.0 {
            GridBalance::Surplus
        } else if surplus >= -constants::SHORTFALL_MW {
            GridBalance::Deficit
        } else {
            GridBalance::Shortfall
        }
    }

    /// Shares of total generation. A zero total reports 0% everywhere.
    pub fn shares(&self) -> GenerationShares {
        let total = self.total_generation();
        if total <= 0.0 || !total.is_finite() {
            return GenerationShares::default();
        }
        let pct = |mw: f64| round_to(mw / total * 100.0, 0);
        GenerationShares {
            nuclear: pct(self.nuclear),
            solar: pct(self.solar),
            wind: pct(self.wind),
            hydro: pct(self.hydro),
        }
    }
}

/// Daylight factor: peaks at noon, decays linearly over 7..=17, floor at night.
pub fn solar_factor(hour: u32) -> f64 {
    if (7..=17).contains(&hour) {
        1.0 - (12.0 - hour as f64).abs() / 10.0
    } else {
        constants::SOLAR_NIGHT_FACTOR
    }
}

/// Daily demand curve peaking at `peak_hour`.
pub fn baseline_demand(hour: u32, peak_hour: u32) -> f64 {
    let phase = (hour as f64 - peak_hour as f64) / 24.0 * 2.0 * PI;
    constants::DEMAND_MEAN_MW + constants::DEMAND_AMPLITUDE_MW * phase.cos()
}

/// Residual dispatch: the plant covers demand left after renewables,
/// held inside its physical output envelope.
pub fn dispatch_nuclear(demand: f64, solar: f64, wind: f64, hydro: f64) -> f64 {
    let residual = demand - solar - wind - hydro;
    round2(residual.clamp(constants::NUCLEAR_MIN_MW, constants::NUCLEAR_MAX_MW))
}

/// Advance the energy mix by one tick at local `hour`.
pub fn advance<R: Rng + ?Sized>(
    state: &EnergyMixState,
    control: &ControlState,
    hour: u32,
    demand_peak_hour: u32,
    now: DateTime<Utc>,
    rng: &mut R,
) -> EnergyMixState {
    use constants::*;

    if control.is_frozen() {
        return state.clone();
    }

    let solar = step(
        rng,
        SOLAR_PEAK_MW * solar_factor(hour),
        SOLAR_MIN,
        SOLAR_MAX,
        SOLAR_VOLATILITY,
    );

    let wind_factor = step(
        rng,
        WIND_FACTOR_CENTER,
        WIND_FACTOR_MIN,
        WIND_FACTOR_MAX,
        WIND_FACTOR_VOLATILITY,
    );
    let wind = step(
        rng,
        WIND_BASELINE_MW * wind_factor,
        WIND_MIN,
        WIND_MAX,
        WIND_VOLATILITY,
    );

    let hydro = step(rng, state.hydro, HYDRO_MIN, HYDRO_MAX, HYDRO_VOLATILITY);

    let demand = step(
        rng,
        baseline_demand(hour, demand_peak_hour),
        DEMAND_MIN,
        DEMAND_MAX,
        DEMAND_VOLATILITY,
    );

    let nuclear = dispatch_nuclear(demand, solar, wind, hydro);
    let co2_avoided = round2(CO2_PER_MW * (nuclear + solar + wind + hydro));

    EnergyMixState {
        nuclear,
        solar,
        wind,
        hydro,
        demand,
        co2_avoided,
        time_last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Mode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_solar_factor_shape() {
        assert_eq!(solar_factor(12), 1.0);
        assert!((solar_factor(7) - 0.5).abs() < 1e-12);
        assert!((solar_factor(17) - 0.5).abs() < 1e-12);
        assert_eq!(solar_factor(3), 0.1);
        assert_eq!(solar_factor(23), 0.1);
        assert!(solar_factor(10) < solar_factor(11));
    }

    #[test]
    fn test_demand_peaks_at_configured_hour() {
        assert!((baseline_demand(0, 0) - 1800.0).abs() < 1e-9);
        assert!((baseline_demand(12, 0) - 1200.0).abs() < 1e-9);
        assert!((baseline_demand(18, 18) - 1800.0).abs() < 1e-9);
        assert!(baseline_demand(18, 18) > baseline_demand(12, 18));
    }

    #[test]
    fn test_residual_dispatch() {
        // Residual inside the envelope is passed through
        assert_eq!(dispatch_nuclear(1700.0, 100.0, 200.0, 400.0), 1000.0);
        // Oversupplied grid holds the plant at minimum output
        assert_eq!(dispatch_nuclear(1400.0, 300.0, 500.0, 450.0), 600.0);
        // Undersupplied grid caps the plant at maximum output
        assert_eq!(dispatch_nuclear(2000.0, 0.0, 100.0, 350.0), 1200.0);
    }

    #[test]
    fn test_bounds_and_dispatch_over_a_day() {
        let mut rng = StdRng::seed_from_u64(99);
        let control = ControlState::default();
        let mut state = EnergyMixState::default();
        for tick in 0..2400u32 {
            let hour = (tick / 100) % 24;
            state = advance(&state, &control, hour, 0, Utc::now(), &mut rng);
            assert!((0.0..=300.0).contains(&state.solar));
            assert!((100.0..=500.0).contains(&state.wind));
            assert!((350.0..=450.0).contains(&state.hydro));
            assert!((1400.0..=2000.0).contains(&state.demand));
            assert!((600.0..=1200.0).contains(&state.nuclear));

            let residual = state.demand - state.solar - state.wind - state.hydro;
            if (600.0..=1200.0).contains(&residual) {
                assert!((state.nuclear - residual).abs() < 1e-6);
            }
            let expected_co2 = 0.82 * state.total_generation();
            assert!((state.co2_avoided - expected_co2).abs() < 0.01);
        }
    }

    #[test]
    fn test_co2_is_not_accumulated() {
        let mut rng = StdRng::seed_from_u64(4);
        let control = ControlState::default();
        let mut state = EnergyMixState::default();
        for _ in 0..100 {
            state = advance(&state, &control, 12, 0, Utc::now(), &mut rng);
            // Bounded by the largest possible generation
            assert!(state.co2_avoided <= 0.82 * (1200.0 + 300.0 + 500.0 + 450.0));
        }
    }

    #[test]
    fn test_training_freezes_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let control = ControlState {
            mode: Mode::Training,
            ..ControlState::default()
        };
        let state = EnergyMixState::default();
        assert_eq!(advance(&state, &control, 12, 0, Utc::now(), &mut rng), state);
    }

    #[test]
    fn test_shares() {
        let state = EnergyMixState::default();
        let shares = state.shares();
        assert_eq!(shares.nuclear, 53.0);
        assert_eq!(shares.solar, 11.0);
        assert_eq!(shares.wind, 16.0);
        assert_eq!(shares.hydro, 21.0);
    }

    #[test]
    fn test_shares_zero_generation() {
        let state = EnergyMixState {
            nuclear: 0.0,
            solar: 0.0,
            wind: 0.0,
            hydro: 0.0,
            ..EnergyMixState::default()
        };
        let shares = state.shares();
        assert_eq!(shares, GenerationShares::default());
        assert!(shares.nuclear.is_finite());
    }

    #[test]
    fn test_balance() {
        let mut state = EnergyMixState::default();
        assert_eq!(state.surplus(), 200.0);
        assert_eq!(state.balance(), GridBalance::Surplus);
        state.demand = 1950.0;
        assert_eq!(state.balance(), GridBalance::Deficit);
        state.demand = 2100.0;
        assert_eq!(state.balance(), GridBalance::Shortfall);
    }
}
