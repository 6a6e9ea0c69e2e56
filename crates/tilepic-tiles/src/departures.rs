//! Departure records written by the pusher and consumed by the sorter.

use rayon::prelude::*;
use tilepic_core::{Direction, OverflowError, Phase, Resource};

use crate::segment::{TileSegment, TiledVec};

/// One particle leaving its tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Departure {
    /// Slot of the departing particle in its current tile.
    pub slot: usize,
    /// Neighbour tile it is headed for.
    pub direction: Direction,
}

impl Default for Departure {
    fn default() -> Self {
        Self {
            slot: 0,
            direction: Direction::Left,
        }
    }
}

/// Per-tile departure lists (`ntmax` records each) plus per-direction
/// counts `ncl`.
#[derive(Clone, Debug)]
pub struct DepartureTable {
    pub(crate) records: TiledVec<Departure>,
    pub(crate) ncl: Vec<[usize; 2]>,
}

impl DepartureTable {
    /// Empty lists for `tiles` tiles with `ntmax` records each.
    pub fn new(tiles: usize, ntmax: usize) -> Self {
        Self {
            records: TiledVec::new(Resource::DepartureList, tiles, ntmax),
            ncl: vec![[0; 2]; tiles],
        }
    }

    /// Record capacity per tile (`ntmax`).
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Departure records of `tile`, slots ascending.
    pub fn records(&self, tile: usize) -> &[Departure] {
        self.records.get(tile)
    }

    /// Departures from `tile` towards `dir`.
    pub fn ncl(&self, tile: usize, dir: Direction) -> usize {
        self.ncl[tile][dir.index()]
    }

    /// Departures from `tile` in both directions.
    pub fn leaving(&self, tile: usize) -> usize {
        self.ncl[tile].iter().sum()
    }

    /// Total departures over all tiles.
    pub fn total(&self) -> usize {
        self.records.total_len()
    }

    /// Drop every record and count.
    pub fn clear(&mut self) {
        self.records.clear();
        self.ncl.fill([0; 2]);
    }

    /// Parallel iterator handing each tile's list to one worker.
    pub fn par_lists_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = DepartureList<'_>> + '_ {
        self.records
            .par_segments_mut()
            .zip(self.ncl.par_iter_mut())
            .map(|(records, ncl)| DepartureList {
                records,
                ncl,
                dropped: 0,
            })
    }
}

/// Exclusive view of one tile's departure list.
///
/// Records beyond capacity are counted but not stored, so the pusher can
/// finish its pass and report how many records the tile actually needed.
#[derive(Debug)]
pub struct DepartureList<'a> {
    records: TileSegment<'a, Departure>,
    ncl: &'a mut [usize; 2],
    dropped: usize,
}

impl DepartureList<'_> {
    /// Tile this list belongs to.
    pub fn tile(&self) -> usize {
        self.records.tile()
    }

    /// Reset the list before a new pass.
    pub fn clear(&mut self) {
        self.records.clear();
        *self.ncl = [0; 2];
        self.dropped = 0;
    }

    /// Record that `slot` leaves towards `direction`.
    pub fn record(&mut self, slot: usize, direction: Direction) {
        let departure = Departure { slot, direction };
        if self.dropped > 0 || self.records.push(departure, Phase::Push).is_err() {
            self.dropped += 1;
        } else {
            self.ncl[direction.index()] += 1;
        }
    }

    /// Number of records stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has departed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.dropped == 0
    }

    /// The overflow if more departures were recorded than fit.
    pub fn overflow(&self) -> Option<OverflowError> {
        (self.dropped > 0).then(|| {
            self.records
                .overflow(Phase::Push, self.records.len() + self.dropped)
        })
    }
}
