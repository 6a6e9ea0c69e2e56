//! The tiled particle store.

use rayon::prelude::*;
use tilepic_core::{OverflowError, Particle, Phase, Resource};
use tilepic_grid::TilePartition;

use crate::layout::StoreLayout;
use crate::segment::{TileSegment, TiledVec};

/// All particles, grouped by owning tile.
///
/// Each tile owns a contiguous segment of `nppmx0` slots and a live
/// count. Slot order within a tile carries no meaning. After
/// [`distribute`](crate::census::distribute) and after every
/// [`reorder`](crate::reorder::reorder), every live particle lies inside
/// its tile's bounds.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    partition: TilePartition,
    layout: StoreLayout,
    pub(crate) particles: TiledVec<Particle>,
}

impl ParticleStore {
    /// An empty store with one segment per tile of `partition`.
    pub fn new(partition: TilePartition, layout: StoreLayout) -> Self {
        Self {
            particles: TiledVec::new(Resource::TileStore, partition.count(), layout.nppmx0),
            partition,
            layout,
        }
    }

    /// The tile partition this store is laid out for.
    pub fn partition(&self) -> &TilePartition {
        &self.partition
    }

    /// The capacities this store was sized with.
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Number of tiles.
    pub fn tiles(&self) -> usize {
        self.particles.tiles()
    }

    /// Slot capacity of every tile (`nppmx0`).
    pub fn capacity(&self) -> usize {
        self.particles.capacity()
    }

    /// Live particle count of `tile`.
    pub fn count(&self, tile: usize) -> usize {
        self.particles.len(tile)
    }

    /// Live particle counts, in tile order.
    pub fn counts(&self) -> &[usize] {
        self.particles.lens()
    }

    /// Total number of live particles.
    pub fn total(&self) -> usize {
        self.particles.total_len()
    }

    /// Largest live tile occupancy.
    pub fn max_count(&self) -> usize {
        self.counts().iter().copied().max().unwrap_or(0)
    }

    /// The live particles of `tile`.
    pub fn tile(&self, tile: usize) -> &[Particle] {
        self.particles.get(tile)
    }

    /// Every live particle, tile by tile.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.particles.iter_tiles().flatten()
    }

    /// Parallel iterator over each tile's live particles.
    pub fn par_tiles(&self) -> impl IndexedParallelIterator<Item = &[Particle]> + '_ {
        self.particles.par_tiles()
    }

    /// Parallel iterator handing each tile's segment to one worker.
    ///
    /// Intended for kernels that update particles in place. Writers must
    /// not move particles between tiles; that is the job of
    /// [`reorder`](crate::reorder::reorder).
    pub fn par_tiles_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = TileSegment<'_, Particle>> + '_ {
        self.particles.par_segments_mut()
    }

    /// Append `p` to `tile` without checking ownership.
    pub fn insert(&mut self, tile: usize, p: Particle, phase: Phase) -> Result<(), OverflowError> {
        self.particles.push(tile, p, phase)
    }

    /// Every live particle copied into one unordered list.
    pub fn to_vec(&self) -> Vec<Particle> {
        self.iter().copied().collect()
    }
}
