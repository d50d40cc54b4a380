//! Statistics export written at the end of a run.

use crate::driver::StopReason;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use savanna_core::{DayStatistics, FollowedAnimalStatistics, OverallStatistics, RunnerConfig};
use savanna_world::Simulation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunExport {
    pub run_id: Uuid,
    pub exported_at: DateTime<Utc>,
    pub stop_reason: StopReason,
    pub days_simulated: u32,
    pub config: RunnerConfig,
    pub overall: OverallStatistics,
    pub followed: Option<FollowedAnimalStatistics>,
    pub history: Vec<DayStatistics>,
}

impl RunExport {
    pub fn from_simulation(
        run_id: Uuid,
        simulation: &Simulation,
        config: &RunnerConfig,
        stop_reason: StopReason,
    ) -> Self {
        Self {
            run_id,
            exported_at: Utc::now(),
            stop_reason,
            days_simulated: simulation.history().len() as u32,
            config: config.clone(),
            overall: simulation.overall_statistics().clone(),
            followed: simulation.followed_statistics(),
            history: simulation.history().to_vec(),
        }
    }
}

pub async fn write_export(path: &Path, export: &RunExport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let bytes = serde_json::to_vec_pretty(export).map_err(savanna_core::Error::from)?;
    fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    info!(
        run_id = %export.run_id,
        path = %path.display(),
        days = export.days_simulated,
        "Statistics exported"
    );
    Ok(())
}
