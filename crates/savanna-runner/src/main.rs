//! Headless driver for the savanna simulation.

mod driver;
mod export;
mod settings;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use savanna_core::RunnerConfig;
use savanna_world::Simulation;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Run a savanna simulation without a user interface
#[derive(Parser, Debug)]
#[command(name = "savanna-runner")]
#[command(about = "Run a savanna ecosystem simulation and export its statistics")]
struct Args {
    /// Configuration file (.json or .toml); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Number of days to simulate, overriding the configuration
    #[arg(long)]
    days: Option<u32>,

    /// Where to write the statistics export, overriding the configuration
    #[arg(long)]
    export: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_telemetry(args.json_logs)?;

    let mut config = match &args.config {
        Some(path) => settings::load_config(path).await?,
        None => RunnerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(days) = args.days {
        config.days = Some(days);
    }
    if let Some(export) = &args.export {
        config.export_path = Some(export.display().to_string());
    }
    config.validate()?;

    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        seed = config.seed,
        days = ?config.days,
        initial_animals = config.initial_animals,
        "Starting savanna run"
    );

    let mut simulation = Simulation::new(config.simulation.clone(), config.seed)?;
    simulation.spawn_animals(config.initial_animals as usize)?;

    if let Some(position) = config.followed_animal {
        match simulation.animal_at(position).map(|animal| animal.id) {
            Some(id) => simulation.follow_animal(id)?,
            None => warn!(%position, "No animal to follow at the configured position"),
        }
    }

    let stop_reason = match driver::drive(&mut simulation, &config, shutdown_signal()).await {
        Ok(reason) => reason,
        Err(err) => {
            error!(%run_id, day = simulation.current_day(), "Run aborted: {:#}", err);
            return Err(err);
        }
    };

    let overall = simulation.overall_statistics();
    info!(
        %run_id,
        ?stop_reason,
        days = overall.days_recorded,
        mean_animals = overall.mean_animals,
        peak_animals = overall.peak_animals,
        mean_energy = overall.mean_energy,
        "Run finished"
    );

    if let Some(path) = &config.export_path {
        let record = export::RunExport::from_simulation(run_id, &simulation, &config, stop_reason);
        export::write_export(PathBuf::from(path).as_path(), &record).await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
