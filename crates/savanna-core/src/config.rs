//! Configuration types for the simulation.

use crate::{Direction, Error, Result, Vector2d};
use serde::{Deserialize, Serialize};

/// Parameters consumed by the simulation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
    /// Energy of animals spawned at the start; also the reproduction threshold
    pub start_energy: i32,
    /// Energy a plant yields when eaten
    pub plant_energy: i32,
    /// Energy cost of a single move
    pub move_energy: i32,
    /// Jungle dimensions relative to the map dimensions
    pub jungle_ratio: f64,
    /// Number of loci in every genome
    pub genome_length: i32,
    /// Number of distinct gene symbols (at most one per direction)
    pub number_of_gene_types: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 30,
            start_energy: 50,
            plant_energy: 20,
            move_energy: 1,
            jungle_ratio: 0.5,
            genome_length: 32,
            number_of_gene_types: 8,
        }
    }
}

impl SimulationConfig {
    /// Check every field, failing on the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if self.width < 1 || self.height < 1 {
            return Err(Error::invalid_argument(format!(
                "map dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        for (name, value) in [
            ("startEnergy", self.start_energy),
            ("plantEnergy", self.plant_energy),
            ("moveEnergy", self.move_energy),
        ] {
            if value < 0 {
                return Err(Error::invalid_argument(format!(
                    "{} can't be negative, got {}",
                    name, value
                )));
            }
        }

        jungle_dimensions(self.width, self.height, self.jungle_ratio)?;

        if self.genome_length < 0 {
            return Err(Error::invalid_argument("genome length can't be negative"));
        }

        if self.number_of_gene_types < 0
            || self.number_of_gene_types > self.genome_length
            || self.number_of_gene_types as usize > Direction::COUNT
        {
            return Err(Error::invalid_argument(format!(
                "number of gene types must be in [0, min(genomeLength, {})], got {}",
                Direction::COUNT,
                self.number_of_gene_types
            )));
        }

        if self.number_of_gene_types == 0 && self.genome_length > 0 {
            return Err(Error::invalid_argument(
                "a non-empty genome needs at least one gene type",
            ));
        }

        Ok(())
    }

    pub fn cell_count(&self) -> i64 {
        self.width as i64 * self.height as i64
    }
}

/// Compute the jungle size for a map, rejecting ratios that do not divide the
/// map into whole cells
pub fn jungle_dimensions(width: i32, height: i32, jungle_ratio: f64) -> Result<(i32, i32)> {
    if !jungle_ratio.is_finite() || jungle_ratio < 0.0 {
        return Err(Error::invalid_argument(format!(
            "jungle ratio must be a non-negative number, got {}",
            jungle_ratio
        )));
    }

    let jungle_width = width as f64 * jungle_ratio;
    let jungle_height = height as f64 * jungle_ratio;

    if jungle_width.fract() != 0.0 || jungle_height.fract() != 0.0 {
        return Err(Error::invalid_argument(format!(
            "jungle ratio {} does not fit a {}x{} map",
            jungle_ratio, width, height
        )));
    }

    if jungle_width > width as f64 || jungle_height > height as f64 {
        return Err(Error::invalid_argument(format!(
            "jungle {}x{} is larger than the {}x{} map",
            jungle_width, jungle_height, width, height
        )));
    }

    Ok((jungle_width as i32, jungle_height as i32))
}

/// Headless runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunnerConfig {
    /// Engine parameters
    pub simulation: SimulationConfig,
    /// Number of animals placed before the first day
    pub initial_animals: u32,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Stop after this many days (runs until extinction or shutdown if unset)
    pub days: Option<u32>,
    /// Delay between two days (milliseconds, 0 runs back to back)
    pub day_interval_ms: u64,
    /// Log a statistics summary every N days
    pub statistics_interval: u32,
    /// Follow the strongest animal standing on this cell after spawning
    pub followed_animal: Option<Vector2d>,
    /// Where to write the statistics export (JSON)
    pub export_path: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            initial_animals: 40,
            seed: 0,
            days: Some(1_000),
            day_interval_ms: 0,
            statistics_interval: 100,
            followed_animal: None,
            export_path: None,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;

        if self.initial_animals as i64 > self.simulation.cell_count() {
            return Err(Error::invalid_argument(format!(
                "{} initial animals don't fit on {} cells",
                self.initial_animals,
                self.simulation.cell_count()
            )));
        }

        if self.statistics_interval == 0 {
            return Err(Error::Config("statisticsInterval must be at least 1".to_string()));
        }

        Ok(())
    }
}
