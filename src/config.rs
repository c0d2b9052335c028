//! Simulation configuration
//!
//! Loaded from `config/simulation.json` when present. Every field has a
//! default, so a partial file (or no file at all) is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::control::{validate_time_multiplier, Mode};
use crate::error::{Result, SimError};

/// Locations searched by [`SimulationConfig::load`], in order
const CONFIG_PATHS: [&str; 2] = ["config/simulation.json", "../config/simulation.json"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Fixed RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Hour of day at which grid demand peaks (0-23)
    pub demand_peak_hour: u32,
    /// Pin the hour-of-day clock instead of following the wall clock
    pub fixed_hour: Option<u32>,
    pub initial_mode: Mode,
    pub time_multiplier: f64,

    // Runner cadences [ms]
    pub reactor_interval_ms: u64,
    pub energy_interval_ms: u64,
    pub thermal_interval_ms: u64,
    pub waste_interval_ms: u64,
    /// Stop the runner after this many reactor ticks
    pub max_ticks: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            demand_peak_hour: 0,
            fixed_hour: None,
            initial_mode: Mode::Live,
            time_multiplier: 1.0,
            reactor_interval_ms: 2_000,
            energy_interval_ms: 3_000,
            thermal_interval_ms: 3_000,
            waste_interval_ms: 3_000,
            max_ticks: None,
        }
    }
}

impl SimulationConfig {
    /// Load the first config file found, falling back to defaults.
    pub fn load() -> Self {
        for path in CONFIG_PATHS {
            if !Path::new(path).exists() {
                continue;
            }
            match Self::from_path(path) {
                Ok(config) => {
                    log::info!("Loaded simulation config from {}", path);
                    return config;
                }
                Err(e) => log::warn!("Ignoring config {}: {}", path, e),
            }
        }
        log::warn!("No simulation config found, using defaults");
        Self::default()
    }

    /// Read and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.demand_peak_hour > 23 {
            return Err(SimError::InvalidArgument(format!(
                "demandPeakHour must be within 0-23, got {}",
                self.demand_peak_hour
            )));
        }
        if let Some(hour) = self.fixed_hour {
            if hour > 23 {
                return Err(SimError::InvalidArgument(format!(
                    "fixedHour must be within 0-23, got {hour}"
                )));
            }
        }
        validate_time_multiplier(self.time_multiplier)?;
        let intervals = [
            ("reactorIntervalMs", self.reactor_interval_ms),
            ("energyIntervalMs", self.energy_interval_ms),
            ("thermalIntervalMs", self.thermal_interval_ms),
            ("wasteIntervalMs", self.waste_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(SimError::InvalidArgument(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}
