//! Grid-resident fields with `N` components per cell.

use std::ops::{Index, IndexMut};

use crate::grid::Grid;

/// A field of `N` `f32` components per cell over a [`Grid`], including
/// the trailing guard cells.
///
/// Charge density and the longitudinal field use `N = 1`; the transverse
/// current, acceleration density, momentum flux, magnetic field, and
/// transverse electric field use `N = 2`; the total electric field uses
/// `N = 3`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field1d<const N: usize> {
    nx: usize,
    cells: Vec<[f32; N]>,
}

/// A single-component field.
pub type ScalarField = Field1d<1>;

impl<const N: usize> Field1d<N> {
    /// A zeroed field over `grid`.
    pub fn zeros(grid: &Grid) -> Self {
        Self {
            nx: grid.nx(),
            cells: vec![[0.0; N]; grid.nxe()],
        }
    }

    /// Number of active cells.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// All stored cells, guards included.
    pub fn cells(&self) -> &[[f32; N]] {
        &self.cells
    }

    /// Mutable access to all stored cells, guards included.
    pub fn cells_mut(&mut self) -> &mut [[f32; N]] {
        &mut self.cells
    }

    /// The active cells `[0, nx)`.
    pub fn active(&self) -> &[[f32; N]] {
        &self.cells[..self.nx]
    }

    /// Mutable access to the active cells `[0, nx)`.
    pub fn active_mut(&mut self) -> &mut [[f32; N]] {
        &mut self.cells[..self.nx]
    }

    /// Split into the active cells and the guard cells.
    pub fn split_guard_mut(&mut self) -> (&mut [[f32; N]], &mut [[f32; N]]) {
        self.cells.split_at_mut(self.nx)
    }

    /// Reset every cell, guards included, to zero.
    pub fn zero(&mut self) {
        self.cells.fill([0.0; N]);
    }

    /// Copy component `c` of the active cells into `out`.
    pub fn gather_component(&self, c: usize, out: &mut [f32]) {
        for (o, cell) in out.iter_mut().zip(self.active()) {
            *o = cell[c];
        }
    }

    /// Overwrite component `c` of the active cells from `values`.
    pub fn scatter_component(&mut self, c: usize, values: &[f32]) {
        for (cell, v) in self.active_mut().iter_mut().zip(values) {
            cell[c] = *v;
        }
    }

    /// Linear interpolation between cell `n` and `n + 1`, with `dxp` the
    /// fractional offset of the sample point from cell `n`.
    ///
    /// `n + 1` may be the guard cell, so read-side fields must have their
    /// guards refreshed first.
    #[inline]
    pub fn interpolate(&self, n: usize, dxp: f32) -> [f32; N] {
        let amx = 1.0 - dxp;
        let a = &self.cells[n];
        let b = &self.cells[n + 1];
        std::array::from_fn(|c| amx * a[c] + dxp * b[c])
    }

    /// Sum over active cells of the squared magnitude of every component.
    pub fn sum_squares(&self) -> f64 {
        self.active()
            .iter()
            .flat_map(|cell| cell.iter())
            .map(|&v| f64::from(v) * f64::from(v))
            .sum()
    }
}

impl<const N: usize> Index<usize> for Field1d<N> {
    type Output = [f32; N];

    fn index(&self, i: usize) -> &Self::Output {
        &self.cells[i]
    }
}

impl<const N: usize> IndexMut<usize> for Field1d<N> {
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.cells[i]
    }
}
