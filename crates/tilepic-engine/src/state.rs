//! Everything a run mutates from step to step.

use tilepic_grid::{Field1d, Grid, ScalarField, TilePartition};
use tilepic_tiles::{DepartureTable, ParticleStore, TransferBuffer};
use tilepic_kernels::DepositScratch;

/// The grid-resident fields of the Darwin model.
#[derive(Clone, Debug)]
pub struct Fields {
    /// Charge density.
    pub qe: ScalarField,
    /// Longitudinal electric field.
    pub fxe: ScalarField,
    /// Transverse current density.
    pub cue: Field1d<2>,
    /// Acceleration density.
    pub dcu: Field1d<2>,
    /// Momentum flux.
    pub amu: Field1d<2>,
    /// Transverse electric field, kept across steps.
    pub cus: Field1d<2>,
    /// Total electric field `(fxe, cus)`.
    pub exyze: Field1d<3>,
    /// Magnetic field `(by, bz)`, external field included.
    pub byze: Field1d<2>,
}

impl Fields {
    /// All fields zeroed over `grid`.
    pub fn zeros(grid: &Grid) -> Self {
        Self {
            qe: Field1d::zeros(grid),
            fxe: Field1d::zeros(grid),
            cue: Field1d::zeros(grid),
            dcu: Field1d::zeros(grid),
            amu: Field1d::zeros(grid),
            cus: Field1d::zeros(grid),
            exyze: Field1d::zeros(grid),
            byze: Field1d::zeros(grid),
        }
    }
}

/// One deposit scratch per moment width.
#[derive(Clone, Debug)]
pub(crate) struct Scratch {
    pub(crate) charge: DepositScratch<1>,
    pub(crate) current: DepositScratch<2>,
    pub(crate) moments: DepositScratch<4>,
    pub(crate) current_moments: DepositScratch<6>,
}

impl Scratch {
    fn new(partition: &TilePartition) -> Self {
        Self {
            charge: DepositScratch::new(partition),
            current: DepositScratch::new(partition),
            moments: DepositScratch::new(partition),
            current_moments: DepositScratch::new(partition),
        }
    }
}

/// Particles, their sort buffers, fields, and deposit scratch.
///
/// Owned by exactly one [`Simulation`](crate::Simulation). The
/// [`ParticleStore`] is the only particle storage in a run; every phase
/// borrows it in turn.
#[derive(Debug)]
pub struct SimulationState {
    pub(crate) store: ParticleStore,
    pub(crate) departures: DepartureTable,
    pub(crate) buffer: TransferBuffer,
    pub(crate) fields: Fields,
    pub(crate) scratch: Scratch,
}

impl SimulationState {
    /// State around an already distributed `store`, with sort buffers
    /// sized from its layout and all fields zero.
    pub fn new(grid: &Grid, store: ParticleStore) -> Self {
        let tiles = store.tiles();
        let layout = *store.layout();
        let scratch = Scratch::new(store.partition());
        Self {
            departures: DepartureTable::new(tiles, layout.ntmax),
            buffer: TransferBuffer::new(tiles, layout.npbmx),
            fields: Fields::zeros(grid),
            scratch,
            store,
        }
    }

    /// The tiled particles.
    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// The fields as of the end of the last step.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilepic_test_utils::{lattice, TileFixture};

    #[test]
    fn sort_buffers_follow_the_store_layout() {
        let fx = TileFixture::new(32, 8);
        let store = fx.store(&lattice(32, 96, [0.5, 0.0, 0.0]), 0.5);
        let layout = *store.layout();
        let state = SimulationState::new(&fx.grid, store);
        assert_eq!(state.departures.capacity(), layout.ntmax);
        assert_eq!(state.buffer.capacity(), layout.npbmx);
        assert_eq!(state.store().total(), 96);
        assert_eq!(state.fields().exyze.nx(), 32);
        assert!(state.fields().cus.active().iter().all(|c| *c == [0.0; 2]));
    }
}
