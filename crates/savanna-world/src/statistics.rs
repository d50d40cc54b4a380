//! Running population statistics and the followed-animal lineage.
//!
//! The manager never sees an animal directly. It is fed through
//! `register_animal` and the entity events it is subscribed to, and keeps
//! id-keyed bookkeeping only.

use crate::events::{Event, Observer};
use savanna_core::{
    AnimalId, Day, DayStatistics, FollowedAnimalStatistics, GeneCounts, OverallStatistics, Result,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct FollowedLineage {
    animal: AnimalId,
    children: HashSet<AnimalId>,
    descendants: HashSet<AnimalId>,
    death_day: Option<Day>,
}

#[derive(Debug, Default, Clone, Copy)]
struct DailyCounters {
    births: u64,
    deaths: u64,
}

#[derive(Debug)]
pub struct StatisticsManager {
    current_day: Day,

    population: u64,
    energy_sum: i64,
    lifespan_sum: u64,
    dead: u64,
    children_sum: u64,
    gene_counts: GeneCounts,
    plants: u64,

    birth_days: HashMap<AnimalId, Day>,
    children: HashMap<AnimalId, u64>,
    followed: Option<FollowedLineage>,

    history: Vec<DayStatistics>,
    overall: OverallStatistics,
    today: DailyCounters,
}

impl Default for StatisticsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsManager {
    pub fn new() -> Self {
        Self {
            current_day: 1,
            population: 0,
            energy_sum: 0,
            lifespan_sum: 0,
            dead: 0,
            children_sum: 0,
            gene_counts: [0; 8],
            plants: 0,
            birth_days: HashMap::new(),
            children: HashMap::new(),
            followed: None,
            history: Vec::new(),
            overall: OverallStatistics::new(),
            today: DailyCounters::default(),
        }
    }

    pub fn current_day(&self) -> Day {
        self.current_day
    }

    /// Count a new animal, born on the current day
    pub fn register_animal(&mut self, id: AnimalId, energy: i32, gene_counts: GeneCounts) {
        self.birth_days.insert(id, self.current_day);
        self.children.insert(id, 0);
        self.population += 1;
        self.energy_sum += energy as i64;

        for (total, count) in self.gene_counts.iter_mut().zip(gene_counts) {
            *total += count;
        }
    }

    /// Start following an animal, forgetting any previous lineage
    pub fn set_followed(&mut self, animal: AnimalId) {
        self.followed = Some(FollowedLineage {
            animal,
            children: HashSet::new(),
            descendants: HashSet::new(),
            death_day: None,
        });
        debug!(event = "follow_started", %animal, "Following animal");
    }

    pub fn begin_day(&mut self) {
        self.today = DailyCounters::default();
    }

    /// Record the snapshot of the finished day and move on to the next one
    pub fn end_day(&mut self) -> DayStatistics {
        let statistics = self.day_statistics();

        info!(
            event = "day_finished",
            day = statistics.day,
            animals = statistics.animals,
            plants = statistics.plants,
            births = self.today.births,
            deaths = self.today.deaths,
            mean_energy = statistics.mean_energy,
            mean_lifespan = statistics.mean_lifespan,
            mean_children = statistics.mean_children,
            "Day finished"
        );

        self.overall.update(&statistics);
        self.history.push(statistics.clone());
        self.current_day += 1;

        statistics
    }

    pub fn day_statistics(&self) -> DayStatistics {
        let population = self.population as f64;

        let mean_lifespan = if self.dead > 0 {
            self.lifespan_sum as f64 / self.dead as f64
        } else {
            mean(self.current_day as f64, population)
        };

        DayStatistics {
            day: self.current_day,
            animals: self.population,
            plants: self.plants,
            mean_energy: mean(self.energy_sum as f64, population),
            mean_lifespan,
            mean_children: mean(self.children_sum as f64, population),
            gene_counts: self.gene_counts,
        }
    }

    pub fn followed_statistics(&self) -> Option<FollowedAnimalStatistics> {
        self.followed.as_ref().map(|lineage| FollowedAnimalStatistics {
            animal: lineage.animal,
            children: lineage.children.len() as u64,
            descendants: lineage.descendants.len() as u64,
            death_day: lineage.death_day,
        })
    }

    pub fn overall_statistics(&self) -> &OverallStatistics {
        &self.overall
    }

    pub fn history(&self) -> &[DayStatistics] {
        &self.history
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn dead_count(&self) -> u64 {
        self.dead
    }

    pub fn children_of(&self, animal: AnimalId) -> Option<u64> {
        self.children.get(&animal).copied()
    }

    fn animal_born(&mut self, parent: AnimalId, child: AnimalId) {
        *self.children.entry(parent).or_insert(0) += 1;
        self.children_sum += 1;
        self.today.births += 1;

        if let Some(lineage) = self.followed.as_mut() {
            if parent == lineage.animal {
                lineage.children.insert(child);
                lineage.descendants.insert(child);
            } else if lineage.descendants.contains(&parent) {
                lineage.descendants.insert(child);
            }
        }
    }

    fn animal_died(&mut self, animal: AnimalId, energy: i32, gene_counts: GeneCounts) {
        let Some(birth_day) = self.birth_days.remove(&animal) else {
            warn!(event = "unknown_death", %animal, "Death of an unregistered animal ignored");
            return;
        };

        self.population = self.population.saturating_sub(1);
        self.dead += 1;
        self.today.deaths += 1;
        self.lifespan_sum += self.current_day.saturating_sub(birth_day) as u64;
        self.energy_sum -= energy as i64;

        for (total, count) in self.gene_counts.iter_mut().zip(gene_counts) {
            *total = total.saturating_sub(count);
        }

        let children = self.children.remove(&animal).unwrap_or(0);
        self.children_sum = self.children_sum.saturating_sub(children);

        if let Some(lineage) = self.followed.as_mut() {
            if lineage.animal == animal && lineage.death_day.is_none() {
                lineage.death_day = Some(self.current_day);
                debug!(event = "followed_died", %animal, day = self.current_day, "Followed animal died");
            }
        }
    }
}

fn mean(sum: f64, count: f64) -> f64 {
    if count == 0.0 {
        0.0
    } else {
        sum / count
    }
}

impl Observer for StatisticsManager {
    fn notify(&mut self, event: &Event) -> Result<()> {
        match *event {
            Event::EnergyChanged { delta, .. } => self.energy_sum += delta as i64,
            Event::Born { parent, child } => self.animal_born(parent, child),
            Event::Died {
                animal,
                energy,
                gene_counts,
            } => self.animal_died(animal, energy, gene_counts),
            Event::PlantCreated { .. } => self.plants += 1,
            Event::PlantEaten { .. } => self.plants = self.plants.saturating_sub(1),
            Event::PositionChanged { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savanna_core::Vector2d;

    const TALLY: GeneCounts = [1, 1, 1, 1, 1, 1, 1, 1];

    #[test]
    fn test_empty_manager() {
        let stats = StatisticsManager::new();
        let day = stats.day_statistics();

        assert_eq!(day.day, 1);
        assert_eq!(day.animals, 0);
        assert_eq!(day.mean_energy, 0.0);
        assert_eq!(day.mean_lifespan, 0.0);
        assert_eq!(day.mean_children, 0.0);
        assert!(stats.followed_statistics().is_none());
    }

    #[test]
    fn test_register_and_energy() {
        let mut stats = StatisticsManager::new();
        stats.register_animal(AnimalId(0), 10, TALLY);
        stats.register_animal(AnimalId(1), 20, TALLY);

        stats
            .notify(&Event::EnergyChanged {
                animal: AnimalId(0),
                delta: -4,
                energy: 6,
            })
            .unwrap();

        let day = stats.day_statistics();
        assert_eq!(day.animals, 2);
        assert_eq!(day.mean_energy, 13.0);
        assert_eq!(day.gene_counts, [2; 8]);
        // Nobody died yet: current day over population
        assert_eq!(day.mean_lifespan, 0.5);
    }

    #[test]
    fn test_death_bookkeeping() {
        let mut stats = StatisticsManager::new();
        stats.register_animal(AnimalId(0), 10, TALLY);
        stats.register_animal(AnimalId(1), 10, TALLY);
        stats
            .notify(&Event::Born {
                parent: AnimalId(0),
                child: AnimalId(2),
            })
            .unwrap();

        stats.end_day();
        stats.end_day();
        stats
            .notify(&Event::Died {
                animal: AnimalId(0),
                energy: 10,
                gene_counts: TALLY,
            })
            .unwrap();

        let day = stats.day_statistics();
        assert_eq!(day.day, 3);
        assert_eq!(day.animals, 1);
        assert_eq!(day.mean_lifespan, 2.0);
        assert_eq!(day.mean_energy, 10.0);
        assert_eq!(day.mean_children, 0.0);
        assert_eq!(day.gene_counts, TALLY);
        assert_eq!(stats.dead_count(), 1);
        assert_eq!(stats.children_of(AnimalId(0)), None);

        // Unknown deaths are ignored
        stats
            .notify(&Event::Died {
                animal: AnimalId(9),
                energy: 0,
                gene_counts: TALLY,
            })
            .unwrap();
        assert_eq!(stats.population(), 1);
    }

    #[test]
    fn test_plant_counter() {
        let mut stats = StatisticsManager::new();
        let position = Vector2d::new(1, 1);
        stats.notify(&Event::PlantCreated { position }).unwrap();
        stats.notify(&Event::PlantCreated { position: Vector2d::ZERO }).unwrap();
        stats.notify(&Event::PlantEaten { position }).unwrap();

        assert_eq!(stats.day_statistics().plants, 1);
    }

    #[test]
    fn test_followed_lineage() {
        let mut stats = StatisticsManager::new();
        stats.register_animal(AnimalId(0), 10, TALLY);
        stats.set_followed(AnimalId(0));

        let born = |parent, child| Event::Born {
            parent: AnimalId(parent),
            child: AnimalId(child),
        };
        stats.notify(&born(0, 1)).unwrap();
        stats.notify(&born(5, 1)).unwrap();
        stats.notify(&born(1, 2)).unwrap();
        stats.notify(&born(2, 3)).unwrap();
        stats.notify(&born(7, 8)).unwrap();

        let followed = stats.followed_statistics().unwrap();
        assert_eq!(followed.children, 1);
        assert_eq!(followed.descendants, 3);
        assert!(followed.is_alive());

        stats.end_day();
        stats
            .notify(&Event::Died {
                animal: AnimalId(0),
                energy: 0,
                gene_counts: TALLY,
            })
            .unwrap();
        assert_eq!(stats.followed_statistics().unwrap().death_day, Some(2));

        stats.set_followed(AnimalId(1));
        let followed = stats.followed_statistics().unwrap();
        assert_eq!(followed.children, 0);
        assert_eq!(followed.descendants, 0);
    }

    #[test]
    fn test_end_day_records_history() {
        let mut stats = StatisticsManager::new();
        stats.register_animal(AnimalId(0), 4, TALLY);

        let first = stats.end_day();
        stats.register_animal(AnimalId(1), 8, TALLY);
        let second = stats.end_day();

        assert_eq!(first.day, 1);
        assert_eq!(second.day, 2);
        assert_eq!(stats.current_day(), 3);
        assert_eq!(stats.history(), &[first, second][..]);

        let overall = stats.overall_statistics();
        assert_eq!(overall.days_recorded, 2);
        assert_eq!(overall.mean_animals, 1.5);
        assert_eq!(overall.peak_animals, 2);
    }
}
