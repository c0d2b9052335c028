//! Headless polling loop
//!
//! Stands in for the dashboard tabs: each model is polled on its own
//! interval and every fresh snapshot is handed to a sink.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::SimulationConfig;
use crate::energy::EnergyMixState;
use crate::engine::SimulationEngine;
use crate::reactor::ReactorState;
use crate::thermal::ThermalState;
use crate::waste::WasteState;

/// One polled snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "model", content = "state", rename_all = "lowercase")]
pub enum Frame {
    Reactor(ReactorState),
    Energy(EnergyMixState),
    Thermal(ThermalState),
    Waste(WasteState),
}

/// Tick counts for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub reactor_ticks: u64,
    pub energy_ticks: u64,
    pub thermal_ticks: u64,
    pub waste_ticks: u64,
}

/// Poll the engine until `shutdown` resolves or `config.max_ticks` reactor
/// ticks have been produced.
pub async fn run<F, S>(
    engine: Arc<SimulationEngine>,
    config: &SimulationConfig,
    shutdown: S,
    mut sink: F,
) -> RunStats
where
    F: FnMut(Frame),
    S: Future<Output = ()>,
{
    let mut reactor_timer = interval(Duration::from_millis(config.reactor_interval_ms));
    let mut energy_timer = interval(Duration::from_millis(config.energy_interval_ms));
    let mut thermal_timer = interval(Duration::from_millis(config.thermal_interval_ms));
    let mut waste_timer = interval(Duration::from_millis(config.waste_interval_ms));
    for timer in [&mut reactor_timer, &mut energy_timer, &mut thermal_timer, &mut waste_timer] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    tokio::pin!(shutdown);
    let mut stats = RunStats::default();

    // First frames come from the current state, like a tab's first render
    sink(Frame::Reactor(engine.initial_reactor()));
    sink(Frame::Energy(engine.initial_energy_mix()));
    sink(Frame::Thermal(engine.initial_thermal()));
    sink(Frame::Waste(engine.initial_waste()));
    reactor_timer.tick().await;
    energy_timer.tick().await;
    thermal_timer.tick().await;
    waste_timer.tick().await;

    loop {
        // Biased so that timers firing at the same instant resolve in a fixed order
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                log::info!("Shutdown requested");
                break;
            }
            _ = energy_timer.tick() => {
                sink(Frame::Energy(engine.update_energy_mix()));
                stats.energy_ticks += 1;
            }
            _ = thermal_timer.tick() => {
                sink(Frame::Thermal(engine.update_thermal()));
                stats.thermal_ticks += 1;
            }
            _ = waste_timer.tick() => {
                sink(Frame::Waste(engine.update_waste()));
                stats.waste_ticks += 1;
            }
            _ = reactor_timer.tick() => {
                sink(Frame::Reactor(engine.update_reactor()));
                stats.reactor_ticks += 1;
                if config.max_ticks.is_some_and(|max| stats.reactor_ticks >= max) {
                    log::info!("Reached {} reactor ticks, stopping", stats.reactor_ticks);
                    break;
                }
            }
        }
    }

    stats
}
