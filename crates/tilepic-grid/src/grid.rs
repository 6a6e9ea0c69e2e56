//! The periodic 1D mesh.

use crate::error::GridError;

/// Number of trailing guard cells appended to every grid field.
///
/// Linear weighting reaches at most one cell past the particle's cell,
/// so a single guard cell absorbs every wraparound contribution.
pub const GUARD_CELLS: usize = 1;

/// A periodic 1D mesh of `nx` active cells with unit spacing.
///
/// # Examples
///
/// ```
/// use tilepic_grid::{Grid, GUARD_CELLS};
///
/// let grid = Grid::from_exponent(9).unwrap();
/// assert_eq!(grid.nx(), 512);
/// assert_eq!(grid.nxe(), 512 + GUARD_CELLS);
/// assert!(grid.is_power_of_two());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    nx: usize,
}

impl Grid {
    /// Create a grid with `nx` active cells.
    ///
    /// Returns `Err(GridError::EmptyGrid)` if `nx == 0`.
    pub fn new(nx: usize) -> Result<Self, GridError> {
        if nx == 0 {
            return Err(GridError::EmptyGrid);
        }
        Ok(Self { nx })
    }

    /// Create a grid of `2^indx` cells.
    pub fn from_exponent(indx: u32) -> Result<Self, GridError> {
        let nx = 1usize
            .checked_shl(indx)
            .filter(|_| indx < usize::BITS - 1)
            .ok_or(GridError::ExponentTooLarge { indx })?;
        Self::new(nx)
    }

    /// Number of active cells.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Number of stored cells including guards.
    pub fn nxe(&self) -> usize {
        self.nx + GUARD_CELLS
    }

    /// Domain length as `f32`, the periodic wrap distance.
    pub fn length(&self) -> f32 {
        self.nx as f32
    }

    /// Whether `nx` is a power of two (required by the spectral solver).
    pub fn is_power_of_two(&self) -> bool {
        self.nx.is_power_of_two()
    }

    /// Wrap a position into `[0, nx)`.
    ///
    /// Only a single period is removed, which is all a stable push can
    /// produce. A value that rounds up to exactly `nx` after wrapping is
    /// mapped to 0.
    pub fn wrap(&self, x: f32) -> f32 {
        let len = self.length();
        let mut x = x;
        if x < 0.0 {
            x += len;
        } else if x >= len {
            x -= len;
        }
        if x >= len {
            x = 0.0;
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_cells_rejected() {
        assert_eq!(Grid::new(0), Err(GridError::EmptyGrid));
    }

    #[test]
    fn exponent_builds_power_of_two() {
        let g = Grid::from_exponent(3).unwrap();
        assert_eq!(g.nx(), 8);
        assert!(g.is_power_of_two());
        assert!(!Grid::new(12).unwrap().is_power_of_two());
    }

    #[test]
    fn huge_exponent_rejected() {
        assert!(matches!(
            Grid::from_exponent(usize::BITS),
            Err(GridError::ExponentTooLarge { .. })
        ));
    }

    #[test]
    fn wrap_handles_both_edges() {
        let g = Grid::new(8).unwrap();
        assert_eq!(g.wrap(3.5), 3.5);
        assert_eq!(g.wrap(8.5), 0.5);
        assert_eq!(g.wrap(-0.5), 7.5);
        assert_eq!(g.wrap(8.0), 0.0);
    }

    #[test]
    fn wrap_rounding_to_length_maps_to_zero() {
        let g = Grid::new(8).unwrap();
        let x = g.wrap(-1.0e-9);
        assert!(x < 8.0);
        assert!(x >= 0.0);
    }
}
