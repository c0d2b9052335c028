//! Nuclear Plant Simulation Engine
//!
//! Time-evolving state of a simulated nuclear power plant for training and
//! demo dashboards: reactor core, grid energy mix, thermal cycle and spent
//! fuel handling. Values come from bounded random walks with domain-specific
//! drift, not from reactor physics.

pub mod config;
pub mod control;
pub mod energy;
pub mod engine;
pub mod error;
pub mod random_walk;
pub mod reactor;
pub mod runner;
pub mod thermal;
pub mod waste;

pub use config::SimulationConfig;
pub use control::{ControlState, EmergencyKind, EmergencyStatus, Mode};
pub use energy::EnergyMixState;
pub use engine::{Clock, PlantSnapshot, SimulationEngine};
pub use error::{Result, SimError};
pub use reactor::{ParameterStatus, ReactorState, SafetyThresholds};
pub use thermal::{ThermalParameter, ThermalState};
pub use waste::{WasteParameter, WasteState};
