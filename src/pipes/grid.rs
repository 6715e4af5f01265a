//! Integer grid primitives: coordinates, axis directions, bounds, occupancy.

use std::collections::HashMap;
use std::ops::Add;

use crate::util::Rng;

/// Identifies a pipe within its field (index into the field's pipe list).
/// Pipes are only ever removed all at once, so indices stay stable.
pub type PipeId = usize;

/// A point on the integer grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoord {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbor one step along `dir`
    #[inline]
    pub fn step(self, dir: Direction) -> Self {
        self + dir.delta()
    }
}

impl Add for GridCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// One of the three grid axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// A unit step along exactly one axis (6 possible values).
/// Not a general vector; pipes only ever move one cell at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub axis: Axis,
    pub sign: i32,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction { axis: Axis::X, sign: 1 },
        Direction { axis: Axis::X, sign: -1 },
        Direction { axis: Axis::Y, sign: 1 },
        Direction { axis: Axis::Y, sign: -1 },
        Direction { axis: Axis::Z, sign: 1 },
        Direction { axis: Axis::Z, sign: -1 },
    ];

    /// The coordinate delta of one step in this direction
    #[inline]
    pub fn delta(self) -> GridCoord {
        match self.axis {
            Axis::X => GridCoord::new(self.sign, 0, 0),
            Axis::Y => GridCoord::new(0, self.sign, 0),
            Axis::Z => GridCoord::new(0, 0, self.sign),
        }
    }

    /// Recover the direction from two adjacent coordinates.
    /// Returns None if the points are not exactly one axis-aligned step apart.
    pub fn between(from: GridCoord, to: GridCoord) -> Option<Direction> {
        let (dx, dy, dz) = (to.x - from.x, to.y - from.y, to.z - from.z);
        match (dx, dy, dz) {
            (s, 0, 0) if s.abs() == 1 => Some(Direction { axis: Axis::X, sign: s }),
            (0, s, 0) if s.abs() == 1 => Some(Direction { axis: Axis::Y, sign: s }),
            (0, 0, s) if s.abs() == 1 => Some(Direction { axis: Axis::Z, sign: s }),
            _ => None,
        }
    }
}

/// Axis-aligned integer box constraining all pipe coordinates (inclusive)
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: GridCoord,
    pub max: GridCoord,
}

impl Bounds {
    pub const fn new(min: GridCoord, max: GridCoord) -> Self {
        Self { min, max }
    }

    /// The default pipe field volume
    pub const fn standard() -> Self {
        Self::new(GridCoord::new(-10, -10, -10), GridCoord::new(10, 10, 10))
    }

    #[inline]
    pub fn contains(&self, c: GridCoord) -> bool {
        c.x >= self.min.x
            && c.x <= self.max.x
            && c.y >= self.min.y
            && c.y <= self.max.y
            && c.z >= self.min.z
            && c.z <= self.max.z
    }

    /// Uniformly random integer coordinate within the box (inclusive)
    pub fn random_coord(&self, rng: &mut Rng) -> GridCoord {
        GridCoord::new(
            rng.range_i32(self.min.x, self.max.x),
            rng.range_i32(self.min.y, self.max.y),
            rng.range_i32(self.min.z, self.max.z),
        )
    }
}

/// Sparse map of claimed grid cells, keeping pipes from growing through
/// each other. Bounds checking is the caller's job; this is pure lookup.
#[derive(Debug, Default)]
pub struct OccupancyGrid {
    cells: HashMap<GridCoord, PipeId>,
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a cell. Unconditional overwrite; callers check `get` first.
    #[inline]
    pub fn set(&mut self, coord: GridCoord, owner: PipeId) {
        self.cells.insert(coord, owner);
    }

    /// Owner of a cell, if claimed
    #[inline]
    pub fn get(&self, coord: GridCoord) -> Option<PipeId> {
        self.cells.get(&coord).copied()
    }

    /// Drop all claims at once
    pub fn clear(&mut self) {
        self.cells = HashMap::new();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
