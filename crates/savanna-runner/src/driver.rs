//! Interval-driven day loop.

use anyhow::Result;
use savanna_core::RunnerConfig;
use savanna_world::Simulation;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    DayLimit,
    Extinct,
    Shutdown,
}

/// Run days until the day limit, extinction, or `shutdown` resolves.
/// Any simulation error aborts the run.
pub async fn drive(
    simulation: &mut Simulation,
    config: &RunnerConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<StopReason> {
    tokio::pin!(shutdown);

    let mut ticker = (config.day_interval_ms > 0).then(|| {
        let mut ticker = interval(Duration::from_millis(config.day_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    let mut days_run = 0u32;
    loop {
        if config.days.is_some_and(|limit| days_run >= limit) {
            info!(days_run, "Day limit reached");
            return Ok(StopReason::DayLimit);
        }

        if simulation.day_statistics().animals == 0 {
            warn!(event = "extinction", day = simulation.current_day(), "No animals left alive");
            return Ok(StopReason::Extinct);
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(days_run, "Stopping on shutdown request");
                return Ok(StopReason::Shutdown);
            }
            _ = next_tick(&mut ticker) => {}
        }

        let statistics = simulation.run_day()?;
        days_run += 1;

        if statistics.day % config.statistics_interval == 0 {
            info!(
                event = "statistics",
                day = statistics.day,
                animals = statistics.animals,
                plants = statistics.plants,
                mean_energy = statistics.mean_energy,
                mean_lifespan = statistics.mean_lifespan,
                mean_children = statistics.mean_children,
                dominant_gene = ?statistics.dominant_gene(),
                "Population statistics"
            );
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => tokio::task::yield_now().await,
    }
}
