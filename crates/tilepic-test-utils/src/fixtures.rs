//! Reusable grid, tile, and particle fixtures.

use tilepic_core::Particle;
use tilepic_grid::{Field1d, Grid, TilePartition};
use tilepic_tiles::{census, distribute, DepartureTable, ParticleStore, StoreLayout, TransferBuffer};

/// `np` particles evenly spaced over `[0, nx)`, all with velocity `v`.
///
/// Particle `j` sits at `(j + 0.5) * nx / np`, so no particle lies on a
/// tile boundary when `np` is a multiple of the tile count.
pub fn lattice(nx: usize, np: usize, v: [f32; 3]) -> Vec<Particle> {
    let dx = nx as f32 / np as f32;
    (0..np)
        .map(|j| Particle::new((j as f32 + 0.5) * dx, v[0], v[1], v[2]))
        .collect()
}

/// Particles at rest at the given positions.
pub fn at_positions(xs: &[f32]) -> Vec<Particle> {
    xs.iter().copied().map(Particle::at_rest).collect()
}

/// Particles at the given positions moving along `x` with `vx`.
pub fn moving(xs: &[f32], vx: f32) -> Vec<Particle> {
    xs.iter().map(|&x| Particle::new(x, vx, 0.0, 0.0)).collect()
}

/// A grid and its tile partition.
pub struct TileFixture {
    pub grid: Grid,
    pub partition: TilePartition,
}

impl TileFixture {
    /// `nx` cells split into tiles of `mx` cells.
    ///
    /// # Panics
    ///
    /// Panics if `nx` or `mx` are not a valid grid/tile pair.
    pub fn new(nx: usize, mx: usize) -> Self {
        let grid = Grid::new(nx).expect("valid grid size");
        let partition = TilePartition::new(&grid, mx).expect("valid tile width");
        Self { grid, partition }
    }

    /// Census-sized layout for `particles` with the given slack.
    pub fn layout(&self, particles: &[Particle], slack: f32) -> StoreLayout {
        census(particles, &self.partition)
            .expect("particles inside the domain")
            .layout(slack)
    }

    /// Distribute `particles` into a store sized by census with `slack`.
    pub fn store(&self, particles: &[Particle], slack: f32) -> ParticleStore {
        let layout = self.layout(particles, slack);
        distribute(particles, &self.partition, &layout).expect("distribution fits")
    }

    /// Distribute `particles` into a store with explicit capacities.
    pub fn store_with(&self, particles: &[Particle], layout: StoreLayout) -> ParticleStore {
        distribute(particles, &self.partition, &layout).expect("distribution fits")
    }

    /// Departure table and transfer buffer matching `store`'s layout.
    pub fn sort_buffers(&self, store: &ParticleStore) -> (DepartureTable, TransferBuffer) {
        let layout = store.layout();
        (
            DepartureTable::new(self.partition.count(), layout.ntmax),
            TransferBuffer::new(self.partition.count(), layout.npbmx),
        )
    }

    /// A zeroed field over the fixture grid.
    pub fn zeros<const N: usize>(&self) -> Field1d<N> {
        Field1d::zeros(&self.grid)
    }
}
