//! Spatial index of the toroidal world.
//!
//! The map knows which animals stand on which cell (bucketed and sorted by
//! energy), which cells carry a plant, and which cells are free for new plants.
//! Free cells are split into a jungle pool and a steppe pool; a cell belongs to
//! exactly one of them iff it holds neither an animal nor a plant.

use crate::animal::Animal;
use crate::events::{Event, EventKind, Observer, Subscriber};
use rand::Rng;
use savanna_core::{jungle_dimensions, AnimalId, Error, Result, Vector2d};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::trace;

/// Width and height of a map, with toroidal wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn wrap(&self, position: Vector2d) -> Vector2d {
        position.wrap(self.width, self.height)
    }

    pub fn contains(&self, position: Vector2d) -> bool {
        position.follows(&Vector2d::ZERO)
            && position.precedes(&Vector2d::new(self.width - 1, self.height - 1))
    }
}

/// Set of positions supporting uniform random draws
#[derive(Debug, Clone, Default)]
pub struct PositionPool {
    positions: Vec<Vector2d>,
    index: HashMap<Vector2d, usize>,
}

impl PositionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: Vector2d) -> bool {
        if self.index.contains_key(&position) {
            return false;
        }
        self.index.insert(position, self.positions.len());
        self.positions.push(position);
        true
    }

    pub fn remove(&mut self, position: Vector2d) -> bool {
        let Some(slot) = self.index.remove(&position) else {
            return false;
        };

        self.positions.swap_remove(slot);
        if let Some(moved) = self.positions.get(slot) {
            self.index.insert(*moved, slot);
        }
        true
    }

    pub fn contains(&self, position: Vector2d) -> bool {
        self.index.contains_key(&position)
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vector2d> {
        if self.positions.is_empty() {
            return None;
        }
        Some(self.positions[rng.gen_range(0..self.positions.len())])
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Cached view of an animal inside a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BucketEntry {
    id: AnimalId,
    energy: i32,
}

pub struct WorldMap {
    bounds: Bounds,
    jungle_width: i32,
    jungle_height: i32,
    jungle_lower_left: Vector2d,
    jungle_upper_right: Vector2d,

    live_animals: Vec<AnimalId>,
    animal_positions: HashMap<AnimalId, Vector2d>,
    buckets: BTreeMap<Vector2d, Vec<BucketEntry>>,
    plants: BTreeSet<Vector2d>,

    free_jungle: PositionPool,
    free_steppe: PositionPool,
}

impl WorldMap {
    /// Create a map with a centered jungle whose sides are `jungle_ratio` times
    /// the map sides
    pub fn new(width: i32, height: i32, jungle_ratio: f64) -> Result<Self> {
        if width < 1 || height < 1 {
            return Err(Error::invalid_argument(format!(
                "Map dimensions can't be zero or negative, got {}x{}",
                width, height
            )));
        }

        let (jungle_width, jungle_height) = jungle_dimensions(width, height, jungle_ratio)?;

        let jungle_lower_left = Vector2d::new((width - jungle_width) / 2, (height - jungle_height) / 2);
        let jungle_upper_right = Vector2d::new(
            (width + jungle_width) / 2 - 1,
            (height + jungle_height) / 2 - 1,
        );

        let mut map = Self {
            bounds: Bounds { width, height },
            jungle_width,
            jungle_height,
            jungle_lower_left,
            jungle_upper_right,
            live_animals: Vec::new(),
            animal_positions: HashMap::new(),
            buckets: BTreeMap::new(),
            plants: BTreeSet::new(),
            free_jungle: PositionPool::new(),
            free_steppe: PositionPool::new(),
        };

        for x in 0..width {
            for y in 0..height {
                map.release_if_free(Vector2d::new(x, y));
            }
        }

        Ok(map)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn width(&self) -> i32 {
        self.bounds.width
    }

    pub fn height(&self) -> i32 {
        self.bounds.height
    }

    pub fn jungle_size(&self) -> (i32, i32) {
        (self.jungle_width, self.jungle_height)
    }

    /// Lower-left and upper-right jungle cells (inclusive)
    pub fn jungle_corners(&self) -> (Vector2d, Vector2d) {
        (self.jungle_lower_left, self.jungle_upper_right)
    }

    pub fn is_inside_map(&self, position: Vector2d) -> bool {
        self.bounds.contains(position)
    }

    pub fn is_inside_jungle(&self, position: Vector2d) -> bool {
        self.jungle_width > 0
            && self.jungle_height > 0
            && position.follows(&self.jungle_lower_left)
            && position.precedes(&self.jungle_upper_right)
    }

    /// Index an animal at its current position and start observing it
    pub fn place(&mut self, animal: &mut Animal) -> Result<()> {
        let position = animal.position();

        if !self.is_inside_map(position) {
            return Err(Error::invalid_argument(format!(
                "{} is outside the {}x{} map",
                position,
                self.width(),
                self.height()
            )));
        }

        if self.animal_positions.contains_key(&animal.id) {
            return Err(Error::invalid_argument(format!(
                "{} is already on the map",
                animal.id
            )));
        }

        animal.subscribe(EventKind::PositionChanged, Subscriber::WorldMap);
        animal.subscribe(EventKind::EnergyChanged, Subscriber::WorldMap);

        self.live_animals.push(animal.id);
        self.animal_positions.insert(animal.id, position);
        self.insert_into_bucket(
            position,
            BucketEntry {
                id: animal.id,
                energy: animal.energy(),
            },
        );
        self.claim(position);

        Ok(())
    }

    /// Forget an animal. Its cell becomes free again if nothing else is on it.
    pub fn remove_animal(&mut self, id: AnimalId) -> Result<()> {
        let position = self
            .animal_positions
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("{} is not on the map", id)))?;

        self.live_animals.retain(|live| *live != id);
        self.remove_from_bucket(position, id)?;
        self.release_if_free(position);

        Ok(())
    }

    /// Highest-energy animal standing on the cell
    pub fn animal_at(&self, position: Vector2d) -> Option<AnimalId> {
        self.buckets
            .get(&position)
            .and_then(|bucket| bucket.first())
            .map(|entry| entry.id)
    }

    /// Animals on the cell, strongest first
    pub fn animals_at(&self, position: Vector2d) -> Vec<AnimalId> {
        self.buckets
            .get(&position)
            .map(|bucket| bucket.iter().map(|entry| entry.id).collect())
            .unwrap_or_default()
    }

    pub fn has_plant(&self, position: Vector2d) -> bool {
        self.plants.contains(&position)
    }

    pub fn position_of(&self, id: AnimalId) -> Option<Vector2d> {
        self.animal_positions.get(&id).copied()
    }

    pub fn contains_animal(&self, id: AnimalId) -> bool {
        self.animal_positions.contains_key(&id)
    }

    pub fn animal_count(&self) -> usize {
        self.live_animals.len()
    }

    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    /// Copy of the live set in placement order
    pub fn live_animals(&self) -> Vec<AnimalId> {
        self.live_animals.clone()
    }

    /// Copy of the occupied cells in position order
    pub fn occupied_positions(&self) -> Vec<Vector2d> {
        self.buckets.keys().copied().collect()
    }

    /// Copy of the plant cells in position order
    pub fn plant_positions(&self) -> Vec<Vector2d> {
        self.plants.iter().copied().collect()
    }

    pub fn free_jungle_count(&self) -> usize {
        self.free_jungle.len()
    }

    pub fn free_steppe_count(&self) -> usize {
        self.free_steppe.len()
    }

    pub fn is_free(&self, position: Vector2d) -> bool {
        self.free_jungle.contains(position) || self.free_steppe.contains(position)
    }

    pub fn random_free_jungle_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vector2d> {
        self.free_jungle.choose(rng)
    }

    pub fn random_free_steppe_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vector2d> {
        self.free_steppe.choose(rng)
    }

    /// Any cell of the map, free or not
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector2d {
        Vector2d::new(
            rng.gen_range(0..self.bounds.width),
            rng.gen_range(0..self.bounds.height),
        )
    }

    fn position_changed(&mut self, id: AnimalId, from: Vector2d, to: Vector2d) -> Result<()> {
        let entry = self.remove_from_bucket(from, id)?;
        self.insert_into_bucket(to, entry);
        self.animal_positions.insert(id, to);

        self.release_if_free(from);
        self.claim(to);

        trace!(animal = %id, %from, %to, "Map updated animal position");
        Ok(())
    }

    fn energy_changed(&mut self, id: AnimalId, energy: i32) -> Result<()> {
        let position = self
            .animal_positions
            .get(&id)
            .copied()
            .ok_or_else(|| Error::InvalidState(format!("energy change for unindexed {}", id)))?;

        let bucket = self
            .buckets
            .get_mut(&position)
            .ok_or_else(|| Error::InvalidState(format!("no bucket at {} for {}", position, id)))?;

        if let Some(entry) = bucket.iter_mut().find(|entry| entry.id == id) {
            entry.energy = energy;
        }
        bucket.sort_by_key(|entry| Reverse(entry.energy));

        Ok(())
    }

    fn plant_created(&mut self, position: Vector2d) -> Result<()> {
        if !self.plants.insert(position) {
            return Err(Error::InvalidState(format!(
                "a plant already grows at {}",
                position
            )));
        }
        self.claim(position);
        Ok(())
    }

    fn plant_eaten(&mut self, position: Vector2d) -> Result<()> {
        if !self.plants.remove(&position) {
            return Err(Error::InvalidState(format!("no plant to eat at {}", position)));
        }
        self.release_if_free(position);
        Ok(())
    }

    fn insert_into_bucket(&mut self, position: Vector2d, entry: BucketEntry) {
        let bucket = self.buckets.entry(position).or_default();
        bucket.push(entry);
        bucket.sort_by_key(|entry| Reverse(entry.energy));
    }

    fn remove_from_bucket(&mut self, position: Vector2d, id: AnimalId) -> Result<BucketEntry> {
        let bucket = self
            .buckets
            .get_mut(&position)
            .ok_or_else(|| Error::InvalidState(format!("no animals indexed at {}", position)))?;

        let slot = bucket
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| Error::InvalidState(format!("{} is not indexed at {}", id, position)))?;

        let entry = bucket.remove(slot);
        if bucket.is_empty() {
            self.buckets.remove(&position);
        }
        Ok(entry)
    }

    /// Return the cell to its free pool if it holds no animal and no plant
    fn release_if_free(&mut self, position: Vector2d) {
        if self.buckets.contains_key(&position) || self.plants.contains(&position) {
            return;
        }

        if self.is_inside_jungle(position) {
            self.free_jungle.insert(position);
        } else {
            self.free_steppe.insert(position);
        }
    }

    fn claim(&mut self, position: Vector2d) {
        if self.is_inside_jungle(position) {
            self.free_jungle.remove(position);
        } else {
            self.free_steppe.remove(position);
        }
    }
}

impl Observer for WorldMap {
    fn notify(&mut self, event: &Event) -> Result<()> {
        match *event {
            Event::PositionChanged { animal, from, to } => self.position_changed(animal, from, to),
            Event::EnergyChanged { animal, energy, .. } => self.energy_changed(animal, energy),
            Event::PlantCreated { position } => self.plant_created(position),
            Event::PlantEaten { position } => self.plant_eaten(position),
            Event::Died { .. } | Event::Born { .. } => Ok(()),
        }
    }
}
