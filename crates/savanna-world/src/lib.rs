//! Entities, spatial index, statistics and the day-by-day simulation engine.

pub mod animal;
pub mod arena;
pub mod entity;
pub mod events;
pub mod plant;
pub mod simulation;
pub mod statistics;
pub mod world_map;

pub use animal::{Animal, AnimalState};
pub use arena::AnimalArena;
pub use entity::{MapEntity, Occupant};
pub use events::{Event, EventBus, EventKind, Observer, Subscriber, Subscriptions};
pub use plant::Plant;
pub use simulation::Simulation;
pub use statistics::StatisticsManager;
pub use world_map::{Bounds, WorldMap};
