//! Statistics snapshot records handed to presentation and export layers.

use crate::{AnimalId, Day, Direction};
use serde::{Deserialize, Serialize};

/// Population tally per gene type, indexed by `Direction::code()`
pub type GeneCounts = [u64; Direction::COUNT];

/// State of the whole population at the end of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatistics {
    pub day: Day,
    pub animals: u64,
    pub plants: u64,
    pub mean_energy: f64,
    pub mean_lifespan: f64,
    pub mean_children: f64,
    pub gene_counts: GeneCounts,
}

impl DayStatistics {
    /// Gene type carried most often across the living population
    pub fn dominant_gene(&self) -> Option<Direction> {
        let (code, count) = self
            .gene_counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;

        if *count == 0 {
            return None;
        }
        Direction::from_code(code as u8)
    }
}

/// Lineage of the followed animal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowedAnimalStatistics {
    pub animal: AnimalId,
    /// Direct children born since following started
    pub children: u64,
    /// Children plus every animal descending from them
    pub descendants: u64,
    /// `None` while the animal is alive
    pub death_day: Option<Day>,
}

impl FollowedAnimalStatistics {
    pub fn is_alive(&self) -> bool {
        self.death_day.is_none()
    }
}

/// Averages over every recorded day of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStatistics {
    pub days_recorded: u32,
    pub mean_animals: f64,
    pub mean_plants: f64,
    pub mean_energy: f64,
    pub mean_lifespan: f64,
    pub mean_children: f64,
    pub peak_animals: u64,
    pub mean_gene_counts: [f64; Direction::COUNT],
}

impl OverallStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every day of a history into a fresh summary
    pub fn from_history<'a>(history: impl IntoIterator<Item = &'a DayStatistics>) -> Self {
        let mut overall = Self::new();
        for day in history {
            overall.update(day);
        }
        overall
    }

    /// Update the averages with one more day
    pub fn update(&mut self, day: &DayStatistics) {
        let n = self.days_recorded as f64;
        let new_n = n + 1.0;

        // Incremental mean
        let fold = |mean: f64, value: f64| (mean * n + value) / new_n;

        self.mean_animals = fold(self.mean_animals, day.animals as f64);
        self.mean_plants = fold(self.mean_plants, day.plants as f64);
        self.mean_energy = fold(self.mean_energy, day.mean_energy);
        self.mean_lifespan = fold(self.mean_lifespan, day.mean_lifespan);
        self.mean_children = fold(self.mean_children, day.mean_children);

        for (mean, count) in self.mean_gene_counts.iter_mut().zip(day.gene_counts) {
            *mean = fold(*mean, count as f64);
        }

        self.peak_animals = self.peak_animals.max(day.animals);
        self.days_recorded += 1;
    }
}
