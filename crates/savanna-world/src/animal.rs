//! Animal state and behavior.

use crate::entity::MapEntity;
use crate::events::{Event, EventBus, EventKind, Subscriber, Subscriptions};
use crate::world_map::{Bounds, WorldMap};
use rand::seq::SliceRandom;
use rand::Rng;
use savanna_core::{AnimalId, Day, Direction, Error, Result, Vector2d};
use savanna_genome::Genotype;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalState {
    Alive,
    /// Terminal; the animal stays indexed until the next removal phase
    Dead,
}

/// An animal in the simulation
#[derive(Debug, Clone)]
pub struct Animal {
    pub id: AnimalId,
    position: Vector2d,
    energy: i32,
    orientation: Direction,
    genotype: Genotype,
    birth_day: Day,
    state: AnimalState,
    subscriptions: Subscriptions,
}

impl Animal {
    pub fn new(
        id: AnimalId,
        position: Vector2d,
        energy: i32,
        genotype: Genotype,
        birth_day: Day,
    ) -> Result<Self> {
        if energy < 0 {
            return Err(Error::invalid_argument(format!(
                "Start energy can't be negative, got {}",
                energy
            )));
        }

        Ok(Self {
            id,
            position,
            energy,
            orientation: Direction::N,
            genotype,
            birth_day,
            state: AnimalState::Alive,
            subscriptions: Subscriptions::new(),
        })
    }

    pub fn with_orientation(mut self, orientation: Direction) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn position(&self) -> Vector2d {
        self.position
    }

    pub fn energy(&self) -> i32 {
        self.energy
    }

    pub fn orientation(&self) -> Direction {
        self.orientation
    }

    pub fn genotype(&self) -> &Genotype {
        &self.genotype
    }

    pub fn birth_day(&self) -> Day {
        self.birth_day
    }

    pub fn state(&self) -> AnimalState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state == AnimalState::Alive
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub fn subscribe(&mut self, kind: EventKind, subscriber: Subscriber) {
        self.subscriptions.subscribe(kind, subscriber);
    }

    /// Step one cell towards `direction`, wrapping around the map edges
    pub fn move_towards(&mut self, direction: Direction, bounds: Bounds, bus: &mut EventBus) {
        let from = self.position;
        let to = bounds.wrap(from + direction.to_unit_vector());

        bus.publish(
            &self.subscriptions,
            Event::PositionChanged {
                animal: self.id,
                from,
                to,
            },
        );
        self.position = to;
    }

    /// Turn towards a direction drawn from the genome, step, and pay for it.
    /// An empty genome keeps the current orientation.
    pub fn random_move<R: Rng + ?Sized>(
        &mut self,
        move_cost: i32,
        bounds: Bounds,
        rng: &mut R,
        bus: &mut EventBus,
    ) {
        if !self.is_alive() {
            return;
        }

        if let Some(direction) = self.genotype.random_direction(rng) {
            self.orientation = direction;
        }
        self.move_towards(self.orientation, bounds, bus);

        let spent = move_cost.min(self.energy).max(0);
        self.change_energy(-spent, bus);

        if self.energy <= 0 {
            self.die(bus);
        }
    }

    /// Split a plant between the strongest living occupants of a cell
    pub fn eat(occupants: &mut [&mut Animal], plant_energy: i32, bus: &mut EventBus) {
        let Some(max_energy) = occupants
            .iter()
            .filter(|animal| animal.is_alive())
            .map(|animal| animal.energy)
            .max()
        else {
            return;
        };

        let mut receivers: Vec<&mut &mut Animal> = occupants
            .iter_mut()
            .filter(|animal| animal.is_alive() && animal.energy == max_energy)
            .collect();

        let share = plant_energy / receivers.len() as i32;
        for animal in receivers.iter_mut() {
            animal.change_energy(share, bus);
        }

        trace!(
            receivers = receivers.len(),
            share,
            "Plant shared"
        );
    }

    /// Let the two strongest eligible occupants of a cell produce a child.
    ///
    /// An animal is eligible when it holds at least half of `start_energy`.
    /// The returned child is not yet registered anywhere; the caller places it.
    #[allow(clippy::too_many_arguments)]
    pub fn reproduce<R: Rng + ?Sized>(
        occupants: &mut [&mut Animal],
        map: &WorldMap,
        start_energy: i32,
        child_id: AnimalId,
        birth_day: Day,
        rng: &mut R,
        bus: &mut EventBus,
    ) -> Result<Option<Animal>> {
        if occupants.len() < 2 {
            return Err(Error::invalid_argument(format!(
                "Reproduction needs at least 2 animals, got {}",
                occupants.len()
            )));
        }

        let mut eligible: Vec<usize> = (0..occupants.len())
            .filter(|&i| {
                let animal = &occupants[i];
                animal.is_alive() && 2 * animal.energy as i64 >= start_energy as i64
            })
            .collect();

        if eligible.len() < 2 {
            return Ok(None);
        }

        eligible.sort_by_key(|&i| std::cmp::Reverse(occupants[i].energy));
        let max_energy = occupants[eligible[0]].energy;
        let strongest = eligible
            .iter()
            .take_while(|&&i| occupants[i].energy == max_energy)
            .count();

        let (first, second) = if strongest > 2 {
            let a = rng.gen_range(0..strongest);
            let mut b = rng.gen_range(0..strongest - 1);
            if b >= a {
                b += 1;
            }
            (eligible[a], eligible[b])
        } else {
            (eligible[0], eligible[1])
        };

        let genotype = Genotype::crossover(&occupants[first].genotype, &occupants[second].genotype, rng)?;
        let position = child_position(occupants[first].position, map, rng);

        let first_energy = occupants[first].energy;
        let second_energy = occupants[second].energy;
        let child_energy = ((first_energy as i64 + second_energy as i64) / 4) as i32;

        for (parent, energy) in [(first, first_energy), (second, second_energy)] {
            let parent = &mut occupants[parent];
            parent.change_energy(-(energy / 4), bus);
            bus.publish(
                &parent.subscriptions,
                Event::Born {
                    parent: parent.id,
                    child: child_id,
                },
            );
        }

        let orientation = Direction::all()
            .choose(rng)
            .copied()
            .unwrap_or(Direction::N);

        let child = Animal::new(child_id, position, child_energy, genotype, birth_day)?
            .with_orientation(orientation);

        debug!(
            event = "animal_born",
            child = %child_id,
            first_parent = %occupants[first].id,
            second_parent = %occupants[second].id,
            %position,
            energy = child_energy,
            "Animal born"
        );

        Ok(Some(child))
    }

    /// Mark the animal dead and tell its observers. Dying twice is a no-op.
    pub fn die(&mut self, bus: &mut EventBus) {
        if !self.is_alive() {
            return;
        }

        self.state = AnimalState::Dead;
        bus.publish(
            &self.subscriptions,
            Event::Died {
                animal: self.id,
                energy: self.energy,
                gene_counts: self.genotype.gene_counts(),
            },
        );

        debug!(event = "animal_died", animal = %self.id, position = %self.position, "Animal died");
    }

    /// Apply `delta`, saturating at the `i32` range. The published delta is
    /// the amount actually applied.
    fn change_energy(&mut self, delta: i32, bus: &mut EventBus) {
        let energy = self.energy.saturating_add(delta);
        let applied = (energy as i64 - self.energy as i64) as i32;
        self.energy = energy;

        bus.publish(
            &self.subscriptions,
            Event::EnergyChanged {
                animal: self.id,
                delta: applied,
                energy,
            },
        );
    }
}

/// First in-bounds neighbor without an animal, in `Direction` order, else any
/// in-bounds neighbor. A map without neighbors keeps the child on the parent.
fn child_position<R: Rng + ?Sized>(parent: Vector2d, map: &WorldMap, rng: &mut R) -> Vector2d {
    let neighbors: Vec<Vector2d> = parent
        .adjacent_points()
        .into_iter()
        .filter(|point| map.is_inside_map(*point))
        .collect();

    if let Some(free) = neighbors.iter().find(|point| map.animal_at(**point).is_none()) {
        return *free;
    }

    neighbors.choose(rng).copied().unwrap_or(parent)
}

impl MapEntity for Animal {
    fn position(&self) -> Vector2d {
        self.position
    }

    fn priority(&self) -> u8 {
        0
    }
}
