//! Static decomposition of the mesh into fixed-width tiles.

use std::ops::Range;

use tilepic_core::Direction;

use crate::error::GridError;
use crate::grid::Grid;

/// Partition of `[0, nx)` into `mx1` tiles of `mx` cells each.
///
/// Tile `t` owns cells `[t*mx, (t+1)*mx)`. Construction requires `nx` to
/// be a multiple of `mx`, so the tiles cover the domain exactly with no
/// gaps, overlaps, or irregular last tile.
///
/// # Examples
///
/// ```
/// use tilepic_grid::{Grid, TilePartition};
///
/// let grid = Grid::new(8).unwrap();
/// let tiles = TilePartition::new(&grid, 4).unwrap();
/// assert_eq!(tiles.count(), 2);
/// assert_eq!(tiles.tile_of(3.9), Some(0));
/// assert_eq!(tiles.tile_of(4.0), Some(1));
/// assert_eq!(tiles.tile_of(8.0), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePartition {
    nx: usize,
    mx: usize,
    mx1: usize,
}

impl TilePartition {
    /// Partition `grid` into tiles of `mx` cells.
    pub fn new(grid: &Grid, mx: usize) -> Result<Self, GridError> {
        let nx = grid.nx();
        if mx == 0 {
            return Err(GridError::ZeroTileWidth);
        }
        if nx % mx != 0 {
            return Err(GridError::IrregularTiles { nx, mx });
        }
        Ok(Self {
            nx,
            mx,
            mx1: nx.div_ceil(mx),
        })
    }

    /// Number of tiles (`mx1`).
    pub fn count(&self) -> usize {
        self.mx1
    }

    /// Cells per tile (`mx`).
    pub fn width(&self) -> usize {
        self.mx
    }

    /// Number of active grid cells.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// The cell range owned by `tile`.
    pub fn cells(&self, tile: usize) -> Range<usize> {
        tile * self.mx..(tile + 1) * self.mx
    }

    /// First grid cell of `tile`.
    pub fn offset(&self, tile: usize) -> usize {
        tile * self.mx
    }

    /// Lower (inclusive) and upper (exclusive) position bounds of `tile`.
    pub fn bounds(&self, tile: usize) -> (f32, f32) {
        let r = self.cells(tile);
        (r.start as f32, r.end as f32)
    }

    /// Whether position `x` lies inside `tile`.
    #[inline]
    pub fn contains(&self, tile: usize, x: f32) -> bool {
        let (lo, hi) = self.bounds(tile);
        x >= lo && x < hi
    }

    /// The tile owning position `x`, or `None` if `x` is outside
    /// `[0, nx)` or not finite.
    #[inline]
    pub fn tile_of(&self, x: f32) -> Option<usize> {
        if !(x >= 0.0 && x < self.nx as f32) {
            return None;
        }
        Some((x as usize / self.mx).min(self.mx1 - 1))
    }

    /// The tile one step away from `tile` in `dir`, wrapping periodically.
    pub fn neighbour(&self, tile: usize, dir: Direction) -> usize {
        dir.neighbour(tile, self.mx1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn partition(nx: usize, mx: usize) -> TilePartition {
        TilePartition::new(&Grid::new(nx).unwrap(), mx).unwrap()
    }

    #[test]
    fn zero_width_rejected() {
        let g = Grid::new(8).unwrap();
        assert_eq!(TilePartition::new(&g, 0), Err(GridError::ZeroTileWidth));
    }

    #[test]
    fn irregular_last_tile_rejected() {
        let g = Grid::new(10).unwrap();
        assert_eq!(
            TilePartition::new(&g, 4),
            Err(GridError::IrregularTiles { nx: 10, mx: 4 })
        );
    }

    #[test]
    fn tile_wider_than_grid_rejected() {
        let g = Grid::new(8).unwrap();
        assert!(TilePartition::new(&g, 16).is_err());
    }

    #[test]
    fn single_tile_covers_domain() {
        let p = partition(8, 8);
        assert_eq!(p.count(), 1);
        assert_eq!(p.bounds(0), (0.0, 8.0));
        assert_eq!(p.neighbour(0, Direction::Left), 0);
    }

    #[test]
    fn tile_of_rejects_outside_and_nan() {
        let p = partition(8, 4);
        assert_eq!(p.tile_of(-0.1), None);
        assert_eq!(p.tile_of(8.0), None);
        assert_eq!(p.tile_of(f32::NAN), None);
        assert_eq!(p.tile_of(f32::INFINITY), None);
    }

    #[test]
    fn neighbours_wrap() {
        let p = partition(32, 8);
        assert_eq!(p.neighbour(0, Direction::Left), 3);
        assert_eq!(p.neighbour(3, Direction::Right), 0);
    }

    proptest! {
        #[test]
        fn tiles_partition_domain(mx in 1usize..16, mx1 in 1usize..16) {
            let p = partition(mx * mx1, mx);
            prop_assert_eq!(p.count(), mx1);
            let mut next = 0;
            for t in 0..p.count() {
                let r = p.cells(t);
                prop_assert_eq!(r.start, next);
                prop_assert_eq!(r.len(), mx);
                next = r.end;
            }
            prop_assert_eq!(next, p.nx());
        }

        #[test]
        fn tile_of_agrees_with_contains(mx in 1usize..16, mx1 in 1usize..16, frac in 0.0f32..1.0) {
            let p = partition(mx * mx1, mx);
            let x = frac * p.nx() as f32;
            prop_assume!(x < p.nx() as f32);
            let t = p.tile_of(x).unwrap();
            prop_assert!(p.contains(t, x));
        }
    }
}
