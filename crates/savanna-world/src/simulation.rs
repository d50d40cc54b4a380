//! Simulation engine driving the daily pipeline.
//!
//! A day runs five phases in a fixed order: remove the animals that died the
//! day before, move every animal, feed animals standing on plants, let crowded
//! cells reproduce, and grow new plants. Every entity call is followed by a
//! dispatch of the events it published, so the map and the statistics are up to
//! date before the next entity acts.

use crate::animal::Animal;
use crate::arena::AnimalArena;
use crate::entity::{MapEntity, Occupant};
use crate::events::{Event, EventBus, EventKind, Observer, Subscriber};
use crate::plant::Plant;
use crate::statistics::StatisticsManager;
use crate::world_map::WorldMap;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use savanna_core::{
    AnimalId, Day, DayStatistics, Direction, Error, FollowedAnimalStatistics, OverallStatistics,
    Result, SimulationConfig, Vector2d,
};
use savanna_genome::Genotype;
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument, trace};

pub struct Simulation {
    config: SimulationConfig,
    map: WorldMap,
    animals: AnimalArena,
    plants: BTreeMap<Vector2d, Plant>,
    statistics: StatisticsManager,
    bus: EventBus,
    /// Animals that died since the last removal phase
    dead_buffer: Vec<AnimalId>,
    rng: ChaCha8Rng,
    /// Set when a phase failed half-way; the indexes can no longer be trusted
    poisoned: bool,
}

impl Simulation {
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let map = WorldMap::new(config.width, config.height, config.jungle_ratio)?;

        info!(
            width = config.width,
            height = config.height,
            jungle = ?map.jungle_size(),
            seed,
            "Created simulation"
        );

        Ok(Self {
            config,
            map,
            animals: AnimalArena::new(),
            plants: BTreeMap::new(),
            statistics: StatisticsManager::new(),
            bus: EventBus::new(),
            dead_buffer: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            poisoned: false,
        })
    }

    /// Run the five phases of one day and return its statistics
    #[instrument(skip(self), fields(day = self.statistics.current_day()))]
    pub fn run_day(&mut self) -> Result<DayStatistics> {
        self.remove_dead_animals()?;
        self.move_animals()?;
        self.eat_plants()?;
        self.reproduce_animals()?;
        self.generate_plants()
    }

    /// Phase 1: retire the animals that died since the last call
    pub fn remove_dead_animals(&mut self) -> Result<()> {
        self.guarded("remove_dead_animals", |sim| {
            let dead = std::mem::take(&mut sim.dead_buffer);
            for id in &dead {
                sim.map.remove_animal(*id)?;
                sim.animals.remove(*id);
            }

            if !dead.is_empty() {
                debug!(event = "dead_removed", count = dead.len(), "Removed dead animals");
            }

            sim.statistics.begin_day();
            Ok(())
        })
    }

    /// Phase 2: every animal alive at the start of the phase makes one move
    pub fn move_animals(&mut self) -> Result<()> {
        self.guarded("move_animals", |sim| {
            let bounds = sim.map.bounds();
            let move_cost = sim.config.move_energy;

            for id in sim.map.live_animals() {
                let animal = sim
                    .animals
                    .get_mut(id)
                    .ok_or_else(|| Error::InvalidState(format!("{} is on the map but not in the arena", id)))?;

                animal.random_move(move_cost, bounds, &mut sim.rng, &mut sim.bus);
                sim.dispatch()?;
            }
            Ok(())
        })
    }

    /// Phase 3: plants under living animals are eaten
    pub fn eat_plants(&mut self) -> Result<()> {
        self.guarded("eat_plants", |sim| {
            let plant_energy = sim.config.plant_energy;
            let mut eaten = Vec::new();

            for position in sim.plants.keys().copied().collect::<Vec<_>>() {
                let ids = sim.map.animals_at(position);
                if ids.is_empty() {
                    continue;
                }

                let mut cohort = sim.take_cohort(&ids)?;
                let mut living: Vec<&mut Animal> =
                    cohort.iter_mut().filter(|animal| animal.is_alive()).collect();

                if !living.is_empty() {
                    Animal::eat(&mut living, plant_energy, &mut sim.bus);
                    eaten.push(position);
                }

                sim.animals.restore(cohort)?;
                sim.dispatch()?;
            }

            for position in &eaten {
                if let Some(plant) = sim.plants.remove(position) {
                    plant.remove_plant(&mut sim.bus);
                    sim.dispatch()?;
                }
            }

            if !eaten.is_empty() {
                debug!(event = "plants_eaten", count = eaten.len(), "Plants eaten");
            }
            Ok(())
        })
    }

    /// Phase 4: each cell with at least two living animals may produce a child.
    /// A child is placed as soon as it is born but takes no part in this phase.
    pub fn reproduce_animals(&mut self) -> Result<()> {
        self.guarded("reproduce_animals", |sim| {
            let start_energy = sim.config.start_energy;
            let birth_day = sim.statistics.current_day();
            let first_newborn = sim.animals.next_id();
            let mut births = 0usize;

            for position in sim.map.occupied_positions() {
                let ids: Vec<AnimalId> = sim
                    .map
                    .animals_at(position)
                    .into_iter()
                    .filter(|id| *id < first_newborn)
                    .collect();
                if ids.len() < 2 {
                    continue;
                }

                let mut cohort = sim.take_cohort(&ids)?;
                let mut living: Vec<&mut Animal> =
                    cohort.iter_mut().filter(|animal| animal.is_alive()).collect();

                let child = if living.len() >= 2 {
                    Animal::reproduce(
                        &mut living,
                        &sim.map,
                        start_energy,
                        sim.animals.next_id(),
                        birth_day,
                        &mut sim.rng,
                        &mut sim.bus,
                    )
                } else {
                    Ok(None)
                };

                sim.animals.restore(cohort)?;
                sim.dispatch()?;
                if let Some(child) = child? {
                    sim.register_animal(child)?;
                    births += 1;
                }
            }

            if births > 0 {
                debug!(event = "animals_born", count = births, "Children joined the world");
            }
            Ok(())
        })
    }

    /// Phase 5: grow at most one jungle and one steppe plant, then close the day
    pub fn generate_plants(&mut self) -> Result<DayStatistics> {
        self.guarded("generate_plants", |sim| {
            if let Some(position) = sim.map.random_free_jungle_position(&mut sim.rng) {
                sim.grow_plant(position)?;
            }
            if let Some(position) = sim.map.random_free_steppe_position(&mut sim.rng) {
                sim.grow_plant(position)?;
            }

            Ok(sim.statistics.end_day())
        })
    }

    /// Place `count` animals with random genomes on distinct random cells
    pub fn spawn_animals(&mut self, count: usize) -> Result<Vec<AnimalId>> {
        if count as i64 > self.config.cell_count() {
            return Err(Error::invalid_argument(format!(
                "Cannot spawn {} animals on a map with {} cells",
                count,
                self.config.cell_count()
            )));
        }

        let mut cells: Vec<Vector2d> = (0..self.config.width)
            .flat_map(|x| (0..self.config.height).map(move |y| Vector2d::new(x, y)))
            .collect();
        let (chosen, _) = cells.partial_shuffle(&mut self.rng, count);
        let chosen = chosen.to_vec();

        let mut spawned = Vec::with_capacity(count);
        for position in chosen {
            let genotype = Genotype::random(
                self.config.genome_length,
                self.config.number_of_gene_types,
                &mut self.rng,
            )?;
            let orientation = Direction::all()
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(Direction::N);

            let animal = Animal::new(
                self.animals.next_id(),
                position,
                self.config.start_energy,
                genotype,
                self.statistics.current_day(),
            )?
            .with_orientation(orientation);

            spawned.push(self.register_animal(animal)?);
        }

        info!(event = "animals_spawned", count, "Spawned animals");
        Ok(spawned)
    }

    /// Place one animal with a chosen energy and genome
    pub fn spawn_animal_at(
        &mut self,
        position: Vector2d,
        energy: i32,
        genotype: Genotype,
    ) -> Result<AnimalId> {
        if genotype.len() as i32 != self.config.genome_length
            || genotype.gene_types() as i32 != self.config.number_of_gene_types
        {
            return Err(Error::invalid_argument(format!(
                "Genotype {} does not match a genome of {} loci and {} gene types",
                genotype, self.config.genome_length, self.config.number_of_gene_types
            )));
        }

        let animal = Animal::new(
            self.animals.next_id(),
            position,
            energy,
            genotype,
            self.statistics.current_day(),
        )?;
        self.register_animal(animal)
    }

    /// Grow a plant on a chosen cell
    pub fn place_plant(&mut self, position: Vector2d) -> Result<()> {
        if !self.map.is_inside_map(position) {
            return Err(Error::invalid_argument(format!(
                "{} is outside the map",
                position
            )));
        }
        if self.plants.contains_key(&position) {
            return Err(Error::invalid_argument(format!(
                "A plant already grows at {}",
                position
            )));
        }

        self.grow_plant(position)
    }

    /// Follow the lineage of a living animal, replacing any previous one
    pub fn follow_animal(&mut self, id: AnimalId) -> Result<()> {
        let animal = self
            .animals
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("{} does not exist", id)))?;

        if !animal.is_alive() {
            return Err(Error::invalid_argument(format!("{} is dead", id)));
        }

        self.statistics.set_followed(id);
        Ok(())
    }

    pub fn animal(&self, id: AnimalId) -> Option<&Animal> {
        self.animals.get(id)
    }

    /// Strongest animal on the cell
    pub fn animal_at(&self, position: Vector2d) -> Option<&Animal> {
        self.map.animal_at(position).and_then(|id| self.animals.get(id))
    }

    pub fn animals_at(&self, position: Vector2d) -> Vec<&Animal> {
        self.map
            .animals_at(position)
            .into_iter()
            .filter_map(|id| self.animals.get(id))
            .collect()
    }

    pub fn plant_at(&self, position: Vector2d) -> Option<&Plant> {
        self.plants.get(&position)
    }

    /// What should be drawn on the cell: the entity with the lowest priority
    pub fn occupant_at(&self, position: Vector2d) -> Option<Occupant> {
        let animal = self
            .animal_at(position)
            .map(|animal| (animal.priority(), Occupant::Animal(animal.id)));
        let plant = self
            .plant_at(position)
            .map(|plant| (plant.priority(), Occupant::Plant(plant.position())));

        animal
            .into_iter()
            .chain(plant)
            .min_by_key(|(priority, _)| *priority)
            .map(|(_, occupant)| occupant)
    }

    /// Animals on the map, including the dead ones awaiting removal
    pub fn animal_count(&self) -> usize {
        self.map.animal_count()
    }

    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    pub fn current_day(&self) -> Day {
        self.statistics.current_day()
    }

    pub fn day_statistics(&self) -> DayStatistics {
        self.statistics.day_statistics()
    }

    pub fn overall_statistics(&self) -> &OverallStatistics {
        self.statistics.overall_statistics()
    }

    pub fn followed_statistics(&self) -> Option<FollowedAnimalStatistics> {
        self.statistics.followed_statistics()
    }

    pub fn history(&self) -> &[DayStatistics] {
        self.statistics.history()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn register_animal(&mut self, mut animal: Animal) -> Result<AnimalId> {
        if animal.id != self.animals.next_id() {
            return Err(Error::InvalidState(format!(
                "{} registered out of order, expected {}",
                animal.id,
                self.animals.next_id()
            )));
        }

        self.map.place(&mut animal)?;

        for kind in [EventKind::EnergyChanged, EventKind::Died, EventKind::Born] {
            animal.subscribe(kind, Subscriber::Statistics);
        }
        animal.subscribe(EventKind::Died, Subscriber::Simulation);

        self.statistics
            .register_animal(animal.id, animal.energy(), animal.genotype().gene_counts());

        trace!(animal = %animal.id, position = %animal.position(), "Registered animal");
        self.animals.insert(animal)
    }

    fn grow_plant(&mut self, position: Vector2d) -> Result<()> {
        let mut plant = Plant::new(position);
        plant.subscribe(Subscriber::WorldMap);
        plant.subscribe(Subscriber::Statistics);

        plant.notify_created(&mut self.bus);
        self.plants.insert(position, plant);
        self.dispatch()
    }

    /// Lend the animals of one cell out of the arena, giving all of them back
    /// if any is missing
    fn take_cohort(&mut self, ids: &[AnimalId]) -> Result<Vec<Animal>> {
        let mut cohort = Vec::with_capacity(ids.len());
        for id in ids {
            match self.animals.take(*id) {
                Ok(animal) => cohort.push(animal),
                Err(err) => {
                    self.animals.restore(cohort)?;
                    return Err(err);
                }
            }
        }
        Ok(cohort)
    }

    /// Route every queued event to the component it is addressed to
    fn dispatch(&mut self) -> Result<()> {
        while let Some(envelope) = self.bus.pop() {
            match envelope.subscriber {
                Subscriber::WorldMap => self.map.notify(&envelope.event)?,
                Subscriber::Statistics => self.statistics.notify(&envelope.event)?,
                Subscriber::Simulation => {
                    if let Event::Died { animal, .. } = envelope.event {
                        self.dead_buffer.push(animal);
                    }
                }
            }
        }
        Ok(())
    }

    fn guarded<T>(
        &mut self,
        phase: &'static str,
        run: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.poisoned {
            return Err(Error::InvalidState(format!(
                "simulation is poisoned, refusing to run {}",
                phase
            )));
        }

        let result = run(self);
        if let Err(err) = &result {
            self.poisoned = true;
            self.bus.clear();
            error!(event = "phase_failed", phase, error = %err, "Simulation phase failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            width: 10,
            height: 6,
            start_energy: 20,
            plant_energy: 5,
            move_energy: 1,
            jungle_ratio: 0.5,
            genome_length: 8,
            number_of_gene_types: 8,
        }
    }

    fn genotype() -> Genotype {
        Genotype::from_genes(vec![0, 1, 2, 3, 4, 5, 6, 7], 8).unwrap()
    }

    fn assert_pools_consistent(sim: &Simulation) {
        let map = sim.map();
        for x in 0..map.width() {
            for y in 0..map.height() {
                let position = Vector2d::new(x, y);
                let empty = map.animal_at(position).is_none() && !map.has_plant(position);
                assert_eq!(map.is_free(position), empty, "pool membership of {}", position);
            }
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.jungle_ratio = 0.3;
        assert!(matches!(Simulation::new(config, 1), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_spawn_animals() {
        let mut sim = Simulation::new(config(), 1).unwrap();
        let ids = sim.spawn_animals(60).unwrap();

        assert_eq!(ids.len(), 60);
        assert_eq!(sim.animal_count(), 60);
        // One animal per cell
        for x in 0..10 {
            for y in 0..6 {
                assert_eq!(sim.animals_at(Vector2d::new(x, y)).len(), 1);
            }
        }
        assert_eq!(sim.map().free_jungle_count(), 0);
        assert_eq!(sim.map().free_steppe_count(), 0);
        assert_eq!(sim.day_statistics().animals, 60);

        assert!(matches!(sim.spawn_animals(61), Err(Error::InvalidArgument(_))));
        assert_eq!(sim.animal_count(), 60);
    }

    #[test]
    fn test_spawn_rejects_foreign_genome() {
        let mut sim = Simulation::new(config(), 1).unwrap();
        let short = Genotype::from_genes(vec![0, 1], 2).unwrap();
        assert!(sim.spawn_animal_at(Vector2d::ZERO, 10, short).is_err());
        assert!(sim.spawn_animal_at(Vector2d::new(10, 0), 10, genotype()).is_err());
        assert_eq!(sim.animal_count(), 0);
    }

    #[test]
    fn test_plant_shared_between_strongest() {
        let mut sim = Simulation::new(config(), 1).unwrap();
        let position = Vector2d::new(1, 1);
        let first = sim.spawn_animal_at(position, 7, genotype()).unwrap();
        let second = sim.spawn_animal_at(position, 7, genotype()).unwrap();
        sim.place_plant(position).unwrap();
        assert_eq!(sim.occupant_at(position), Some(Occupant::Animal(first)));

        sim.eat_plants().unwrap();

        assert_eq!(sim.animal(first).unwrap().energy(), 9);
        assert_eq!(sim.animal(second).unwrap().energy(), 9);
        assert!(sim.plant_at(position).is_none());
        assert!(!sim.map().has_plant(position));
        assert!(!sim.map().is_free(position));
        assert_eq!(sim.day_statistics().plants, 0);
        assert_eq!(sim.day_statistics().mean_energy, 9.0);
    }

    #[test]
    fn test_place_plant_validation() {
        let mut sim = Simulation::new(config(), 1).unwrap();
        sim.place_plant(Vector2d::new(4, 4)).unwrap();
        assert_eq!(sim.occupant_at(Vector2d::new(4, 4)), Some(Occupant::Plant(Vector2d::new(4, 4))));

        assert!(sim.place_plant(Vector2d::new(4, 4)).is_err());
        assert!(sim.place_plant(Vector2d::new(-1, 4)).is_err());
        assert_eq!(sim.plant_count(), 1);
    }

    #[test]
    fn test_reproduction_energy_split() {
        let mut sim = Simulation::new(config(), 1).unwrap();
        let position = Vector2d::new(2, 2);
        let first = sim.spawn_animal_at(position, 10, genotype()).unwrap();
        let second = sim.spawn_animal_at(position, 14, genotype()).unwrap();

        sim.reproduce_animals().unwrap();

        assert_eq!(sim.animal_count(), 3);
        assert_eq!(sim.animal(first).unwrap().energy(), 8);
        assert_eq!(sim.animal(second).unwrap().energy(), 11);

        let child = sim.animal(AnimalId(2)).unwrap();
        assert_eq!(child.energy(), 6);
        assert_eq!(child.position(), Vector2d::new(2, 3));
        assert_eq!(sim.animal_at(Vector2d::new(2, 3)).unwrap().id, AnimalId(2));

        let statistics = sim.day_statistics();
        assert_eq!(statistics.animals, 3);
        assert_eq!(statistics.mean_energy, 25.0 / 3.0);
        assert_eq!(statistics.mean_children, 2.0 / 3.0);
    }

    #[test]
    fn test_children_see_earlier_children() {
        let mut sim = Simulation::new(config(), 1).unwrap();
        for position in [Vector2d::new(2, 2), Vector2d::new(1, 2)] {
            sim.spawn_animal_at(position, 20, genotype()).unwrap();
            sim.spawn_animal_at(position, 20, genotype()).unwrap();
        }
        sim.spawn_animal_at(Vector2d::new(1, 3), 1, genotype()).unwrap();

        // The pair at (1, 2) goes first and takes (2, 3), so the pair at (2, 2)
        // must move on to (3, 3)
        sim.reproduce_animals().unwrap();

        assert_eq!(sim.animal_count(), 7);
        assert_eq!(sim.animals_at(Vector2d::new(2, 3)).len(), 1);
        assert_eq!(sim.animals_at(Vector2d::new(3, 3)).len(), 1);
        assert_pools_consistent(&sim);
    }

    #[test]
    fn test_newborn_waits_for_next_day() {
        let mut config = config();
        config.width = 1;
        config.height = 2;
        config.jungle_ratio = 0.0;
        config.start_energy = 4;
        let mut sim = Simulation::new(config, 1).unwrap();

        sim.spawn_animal_at(Vector2d::new(0, 0), 20, genotype()).unwrap();
        sim.spawn_animal_at(Vector2d::new(0, 0), 20, genotype()).unwrap();
        let weak_first = sim.spawn_animal_at(Vector2d::new(0, 1), 8, genotype()).unwrap();
        let weak_second = sim.spawn_animal_at(Vector2d::new(0, 1), 8, genotype()).unwrap();

        sim.reproduce_animals().unwrap();

        // The first child lands on (0, 1), the only neighbor, before that cell is
        // visited; it would be the strongest there but stays out of the pairing
        let newborn = sim.animal(AnimalId(4)).unwrap();
        assert_eq!(newborn.position(), Vector2d::new(0, 1));
        assert_eq!(newborn.energy(), 10);
        assert_eq!(sim.statistics.children_of(AnimalId(4)), Some(0));

        assert_eq!(sim.animal(weak_first).unwrap().energy(), 6);
        assert_eq!(sim.animal(weak_second).unwrap().energy(), 6);
        assert_eq!(sim.animal(AnimalId(5)).unwrap().energy(), 4);
        assert_eq!(sim.animal_count(), 6);
    }

    #[test]
    fn test_huge_plant_energy_saturates() {
        let mut config = config();
        config.plant_energy = i32::MAX;
        let mut sim = Simulation::new(config, 1).unwrap();
        let position = Vector2d::new(1, 1);
        let eater = sim.spawn_animal_at(position, 10, genotype()).unwrap();
        sim.place_plant(position).unwrap();

        sim.eat_plants().unwrap();
        sim.place_plant(position).unwrap();
        sim.eat_plants().unwrap();

        assert_eq!(sim.animal(eater).unwrap().energy(), i32::MAX);
        assert_eq!(sim.day_statistics().mean_energy, i32::MAX as f64);
    }

    #[test]
    fn test_dead_animal_counted_until_removal() {
        let mut config = config();
        config.move_energy = 5;
        let mut sim = Simulation::new(config, 1).unwrap();
        let doomed = sim.spawn_animal_at(Vector2d::ZERO, 3, genotype()).unwrap();

        let statistics = sim.run_day().unwrap();

        assert_eq!(statistics.animals, 0);
        assert_eq!(statistics.mean_lifespan, 0.0);
        assert_eq!(sim.animal_count(), 1);
        assert!(!sim.animal(doomed).unwrap().is_alive());

        sim.remove_dead_animals().unwrap();
        assert_eq!(sim.animal_count(), 0);
        assert!(sim.animal(doomed).is_none());
    }

    #[test]
    fn test_dead_animals_skip_eating_and_reproduction() {
        let mut config = config();
        config.move_energy = 50;
        let mut sim = Simulation::new(config, 1).unwrap();
        let first = sim.spawn_animal_at(Vector2d::new(3, 3), 30, genotype()).unwrap();
        sim.spawn_animal_at(Vector2d::new(3, 3), 30, genotype()).unwrap();

        sim.move_animals().unwrap();
        let position = sim.animal(first).unwrap().position();
        sim.place_plant(position).unwrap();

        sim.eat_plants().unwrap();
        sim.reproduce_animals().unwrap();

        assert_eq!(sim.animal(first).unwrap().energy(), 0);
        assert!(sim.plant_at(position).is_some());
        assert_eq!(sim.animal_count(), 2);
    }

    #[test]
    fn test_pool_invariant_over_many_days() {
        let mut sim = Simulation::new(config(), 3).unwrap();
        sim.spawn_animals(20).unwrap();

        for _ in 0..50 {
            sim.run_day().unwrap();

            assert_pools_consistent(&sim);
            assert_eq!(sim.map().plant_count(), sim.plant_count());
        }

        assert_eq!(sim.current_day(), 51);
        assert_eq!(sim.history().len(), 50);
        assert_eq!(sim.overall_statistics().days_recorded, 50);
    }

    #[test]
    fn test_same_seed_same_history() {
        let run = |seed| {
            let mut sim = Simulation::new(config(), seed).unwrap();
            sim.spawn_animals(15).unwrap();
            for _ in 0..30 {
                sim.run_day().unwrap();
            }
            (sim.history().to_vec(), sim.map().plant_positions())
        };

        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_followed_lineage() {
        let mut config = config();
        config.start_energy = 4;
        config.jungle_ratio = 0.0;
        let mut sim = Simulation::new(config, 1).unwrap();

        let followed = sim.spawn_animal_at(Vector2d::new(2, 2), 20, genotype()).unwrap();
        sim.spawn_animal_at(Vector2d::new(2, 2), 20, genotype()).unwrap();
        sim.follow_animal(followed).unwrap();

        // Child lands on the free northern neighbor (2, 3)
        sim.reproduce_animals().unwrap();
        let child = sim.animal_at(Vector2d::new(2, 3)).unwrap().id;
        sim.spawn_animal_at(Vector2d::new(2, 3), 20, genotype()).unwrap();

        // The followed pair has a second child, the first child has a grandchild
        sim.reproduce_animals().unwrap();
        assert_eq!(sim.animal_count(), 6);
        assert!(sim.statistics.children_of(child).unwrap() >= 1);

        let lineage = sim.followed_statistics().unwrap();
        assert_eq!(lineage.animal, followed);
        assert_eq!(lineage.children, 2);
        assert_eq!(lineage.descendants, 3);
        assert!(lineage.is_alive());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_indexes_stay_consistent(seed in any::<u64>(), animals in 0usize..30) {
            let mut sim = Simulation::new(config(), seed).unwrap();
            sim.spawn_animals(animals).unwrap();

            for _ in 0..10 {
                sim.run_day().unwrap();
            }

            let map = sim.map();
            prop_assert_eq!(
                map.free_jungle_count() + map.free_steppe_count(),
                (0..map.width())
                    .flat_map(|x| (0..map.height()).map(move |y| Vector2d::new(x, y)))
                    .filter(|position| map.animal_at(*position).is_none() && !map.has_plant(*position))
                    .count()
            );
            prop_assert_eq!(
                sim.day_statistics().animals as usize,
                map.live_animals()
                    .into_iter()
                    .filter(|id| sim.animal(*id).is_some_and(|animal| animal.is_alive()))
                    .count()
            );
        }
    }

    #[test]
    fn test_follow_unknown_animal() {
        let mut sim = Simulation::new(config(), 1).unwrap();
        assert!(matches!(sim.follow_animal(AnimalId(3)), Err(Error::NotFound(_))));
        assert!(sim.followed_statistics().is_none());
    }

    #[test]
    fn test_run_day_advances_day() {
        let mut sim = Simulation::new(config(), 5).unwrap();
        sim.spawn_animals(10).unwrap();

        let first = sim.run_day().unwrap();
        let second = sim.run_day().unwrap();

        assert_eq!(first.day, 1);
        assert_eq!(second.day, 2);
        assert_eq!(sim.current_day(), 3);
        assert!(sim.plant_count() <= 4);
        assert!(!sim.is_poisoned());
    }
}
