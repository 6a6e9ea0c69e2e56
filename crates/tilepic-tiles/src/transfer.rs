//! Staging area for particles moving between tiles.

use tilepic_core::{Direction, OverflowError, Particle, Phase, Resource};

use crate::departures::DepartureTable;
use crate::segment::TiledVec;

/// Per-tile staging segments of `npbmx` slots.
///
/// Each tile's segment holds its departing particles grouped by
/// direction: `[offsets[0], offsets[1])` heading left and
/// `[offsets[1], offsets[2])` heading right.
#[derive(Clone, Debug)]
pub struct TransferBuffer {
    pub(crate) slots: TiledVec<Particle>,
    pub(crate) offsets: Vec<[usize; 3]>,
}

impl TransferBuffer {
    /// Empty buffer for `tiles` tiles with `npbmx` slots each.
    pub fn new(tiles: usize, npbmx: usize) -> Self {
        Self {
            slots: TiledVec::new(Resource::TransferBuffer, tiles, npbmx),
            offsets: vec![[0; 3]; tiles],
        }
    }

    /// Slot capacity per tile (`npbmx`).
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Compute each tile's direction offsets from the departure counts.
    ///
    /// Validates every tile before committing anything, so on error the
    /// buffer is left as it was.
    pub fn plan(&mut self, departures: &DepartureTable) -> Result<(), OverflowError> {
        let capacity = self.capacity();
        let overflow = departures
            .ncl
            .iter()
            .enumerate()
            .filter_map(|(tile, ncl)| {
                let requested = ncl[0] + ncl[1];
                (requested > capacity).then_some(OverflowError {
                    phase: Phase::SortCopyOut,
                    resource: Resource::TransferBuffer,
                    tile: Some(tile),
                    capacity,
                    requested,
                })
            })
            .reduce(OverflowError::worst);
        if let Some(e) = overflow {
            return Err(e);
        }
        for (offsets, ncl) in self.offsets.iter_mut().zip(&departures.ncl) {
            *offsets = [0, ncl[0], ncl[0] + ncl[1]];
        }
        Ok(())
    }

    /// Particles staged by `tile` heading towards `dir`.
    pub fn outgoing(&self, tile: usize, dir: Direction) -> &[Particle] {
        let offsets = self.offsets[tile];
        let i = dir.index();
        &self.slots.get(tile)[offsets[i]..offsets[i + 1]]
    }

    /// Number of particles staged by `tile` towards `dir`, per the plan.
    pub fn planned(&self, tile: usize, dir: Direction) -> usize {
        let offsets = self.offsets[tile];
        offsets[dir.index() + 1] - offsets[dir.index()]
    }

    /// Total staged particles.
    pub fn total(&self) -> usize {
        self.slots.total_len()
    }

    /// Drop every staged particle and offset.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.offsets.fill([0; 3]);
    }
}
