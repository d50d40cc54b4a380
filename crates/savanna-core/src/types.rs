//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Simulation day counter. Day 1 is the first simulated day.
pub type Day = u32;

/// Stable identifier for an animal. Identifiers are handed out in increasing
/// order and never reused within one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnimalId(pub u64);

impl AnimalId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AnimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animal#{}", self.0)
    }
}

/// Integer 2D vector, used both for map positions and unit steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Vector2d {
    pub x: i32,
    pub y: i32,
}

impl Vector2d {
    pub const ZERO: Vector2d = Vector2d { x: 0, y: 0 };
    pub const ONE: Vector2d = Vector2d { x: 1, y: 1 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True if both coordinates are less than or equal to `other`'s
    pub fn precedes(&self, other: &Vector2d) -> bool {
        self.x <= other.x && self.y <= other.y
    }

    /// True if both coordinates are greater than or equal to `other`'s
    pub fn follows(&self, other: &Vector2d) -> bool {
        self.x >= other.x && self.y >= other.y
    }

    pub fn upper_right(&self, other: &Vector2d) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    pub fn lower_left(&self, other: &Vector2d) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// The 8 points whose difference from this one is a `Direction` unit vector,
    /// in `Direction::all()` order
    pub fn adjacent_points(&self) -> [Vector2d; 8] {
        Direction::all().map(|direction| *self + direction.to_unit_vector())
    }

    /// Apply toroidal wrapping for given world dimensions
    pub fn wrap(&self, width: i32, height: i32) -> Self {
        Self {
            x: ((self.x % width) + width) % width,
            y: ((self.y % height) + height) % height,
        }
    }
}

impl Add for Vector2d {
    type Output = Vector2d;

    fn add(self, other: Vector2d) -> Vector2d {
        Vector2d::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2d {
    type Output = Vector2d;

    fn sub(self, other: Vector2d) -> Vector2d {
        Vector2d::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vector2d {
    type Output = Vector2d;

    fn neg(self) -> Vector2d {
        Vector2d::new(-self.x, -self.y)
    }
}

impl fmt::Display for Vector2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction for movement. The discriminant doubles as the gene code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    N = 0,
    NE = 1,
    E = 2,
    SE = 3,
    S = 4,
    SW = 5,
    W = 6,
    NW = 7,
}

impl Direction {
    pub const COUNT: usize = 8;

    pub fn to_unit_vector(&self) -> Vector2d {
        match self {
            Direction::N => Vector2d::new(0, 1),
            Direction::NE => Vector2d::new(1, 1),
            Direction::E => Vector2d::new(1, 0),
            Direction::SE => Vector2d::new(1, -1),
            Direction::S => Vector2d::new(0, -1),
            Direction::SW => Vector2d::new(-1, -1),
            Direction::W => Vector2d::new(-1, 0),
            Direction::NW => Vector2d::new(-1, 1),
        }
    }

    pub fn all() -> [Direction; 8] {
        [
            Direction::N,
            Direction::NE,
            Direction::E,
            Direction::SE,
            Direction::S,
            Direction::SW,
            Direction::W,
            Direction::NW,
        ]
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Direction> {
        Direction::all().get(code as usize).copied()
    }

    pub fn opposite(&self) -> Direction {
        Direction::all()[(self.code() as usize + 4) % Self::COUNT]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        };
        f.write_str(name)
    }
}
