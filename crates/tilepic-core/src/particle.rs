//! The particle record and tile-crossing direction.

use std::fmt;

/// A single macro-particle: position along `x` and three velocity
/// components.
///
/// Particles carry no identity. Only the tile that holds a particle
/// matters, never its slot or its order within the tile.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    /// Position in grid units, `0 <= x < nx` once wrapped.
    pub x: f32,
    /// Velocity along `x`.
    pub vx: f32,
    /// Velocity along `y`.
    pub vy: f32,
    /// Velocity along `z`.
    pub vz: f32,
}

impl Particle {
    /// Number of coordinates stored per particle.
    pub const COORDS: usize = 4;

    /// Create a particle from position and velocity.
    pub const fn new(x: f32, vx: f32, vy: f32, vz: f32) -> Self {
        Self { x, vx, vy, vz }
    }

    /// A particle at rest at position `x`.
    pub const fn at_rest(x: f32) -> Self {
        Self::new(x, 0.0, 0.0, 0.0)
    }

    /// Squared speed `vx² + vy² + vz²`.
    pub fn speed_squared(&self) -> f32 {
        self.vx * self.vx + self.vy * self.vy + self.vz * self.vz
    }
}

/// Which neighbour tile a departing particle is headed for.
///
/// Tiles form a ring (periodic boundary), so `Left` of tile 0 is the last
/// tile and `Right` of the last tile is tile 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Towards decreasing `x`.
    Left,
    /// Towards increasing `x`.
    Right,
}

impl Direction {
    /// Both directions, in buffer order.
    pub const ALL: [Direction; 2] = [Direction::Left, Direction::Right];

    /// Index into per-direction count arrays (`Left = 0`, `Right = 1`).
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// The direction pointing back.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// The tile reached by stepping once in this direction from `tile`
    /// on a ring of `tiles` tiles.
    pub const fn neighbour(self, tile: usize, tiles: usize) -> usize {
        match self {
            Self::Left => (tile + tiles - 1) % tiles,
            Self::Right => (tile + 1) % tiles,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn direction_indices_are_distinct() {
        assert_eq!(Direction::Left.index(), 0);
        assert_eq!(Direction::Right.index(), 1);
        assert_eq!(Direction::ALL.map(Direction::index), [0, 1]);
    }

    #[test]
    fn neighbour_wraps_at_both_ends() {
        assert_eq!(Direction::Left.neighbour(0, 4), 3);
        assert_eq!(Direction::Right.neighbour(3, 4), 0);
        assert_eq!(Direction::Right.neighbour(1, 4), 2);
    }

    #[test]
    fn single_tile_is_its_own_neighbour() {
        assert_eq!(Direction::Left.neighbour(0, 1), 0);
        assert_eq!(Direction::Right.neighbour(0, 1), 0);
    }

    #[test]
    fn speed_squared_sums_components() {
        let p = Particle::new(0.5, 1.0, 2.0, 2.0);
        assert_eq!(p.speed_squared(), 9.0);
        assert_eq!(Particle::at_rest(3.0).speed_squared(), 0.0);
    }

    proptest! {
        #[test]
        fn opposite_neighbour_returns_home(tiles in 1usize..64, tile in 0usize..64) {
            let tile = tile % tiles;
            for dir in Direction::ALL {
                let there = dir.neighbour(tile, tiles);
                prop_assert_eq!(dir.opposite().neighbour(there, tiles), tile);
            }
        }
    }
}
