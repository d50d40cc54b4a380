//! Shared shape of everything that occupies a map cell.

use savanna_core::{AnimalId, Vector2d};
use serde::{Deserialize, Serialize};

pub trait MapEntity {
    fn position(&self) -> Vector2d;

    /// Drawing priority, lower values are shown on top
    fn priority(&self) -> u8;
}

/// What a presentation layer should show for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    Animal(AnimalId),
    Plant(Vector2d),
}
