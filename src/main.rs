//! Nuclear Plant Simulator - headless runner
//!
//! Polls every model on its dashboard cadence and prints each snapshot as a
//! JSON line. `RUST_LOG=info` shows control and safety events on stderr.

use std::io::Write;
use std::sync::Arc;

use nuclear_plant_sim_lib::runner::{self, Frame};
use nuclear_plant_sim_lib::{SimulationConfig, SimulationEngine};

fn emit(frame: Frame) {
    let mut stdout = std::io::stdout().lock();
    match serde_json::to_string(&frame) {
        Ok(line) => {
            if let Err(e) = writeln!(stdout, "{}", line) {
                log::error!("Failed to write frame: {}", e);
            }
        }
        Err(e) => log::error!("Failed to serialize frame: {}", e),
    }
}

fn main() {
    // Initialize logging
    env_logger::init();

    let config = SimulationConfig::load();
    let engine = match SimulationEngine::from_config(&config) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            log::error!("Invalid simulation config: {}", e);
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let stats = runtime.block_on(runner::run(
        engine,
        &config,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        },
        emit,
    ));

    log::info!(
        "Simulation stopped after {} reactor, {} energy, {} thermal, {} waste ticks",
        stats.reactor_ticks,
        stats.energy_ticks,
        stats.thermal_ticks,
        stats.waste_ticks
    );
}
