//! Moving departed particles into their new tiles.
//!
//! The reorder runs after every push:
//!
//! 1. the pusher has already written departure records and `ncl`;
//! 2. direction offsets are computed and every capacity the move needs
//!    (transfer buffer and destination tile store) is validated;
//! 3. copy-out: each tile stages its departing particles and closes the
//!    holes they leave;
//! 4. copy-in: each tile appends what its neighbours staged for it.
//!
//! Steps 3 and 4 are each one parallel pass over tiles. Nothing is
//! written until step 2 has passed for every tile.

use rayon::prelude::*;
use tracing::info_span;

use tilepic_core::{Direction, OverflowError, Particle, Phase, Resource};

use crate::departures::{Departure, DepartureTable};
use crate::segment::TileSegment;
use crate::store::ParticleStore;
use crate::transfer::TransferBuffer;

/// Outcome of a reorder pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortSummary {
    /// Particles that changed tile.
    pub moved: usize,
}

/// Relocate every departed particle to its neighbour tile.
///
/// Total occupancy is conserved. On success the departure table and the
/// transfer buffer are cleared, and every particle is inside its tile
/// (given the pusher only recorded particles bound for adjacent tiles).
pub fn reorder(
    store: &mut ParticleStore,
    departures: &mut DepartureTable,
    buffer: &mut TransferBuffer,
) -> Result<SortSummary, OverflowError> {
    let _span = info_span!("reorder", departures = departures.total()).entered();
    let before = store.total();
    let moved = departures.total();
    if moved == 0 {
        return Ok(SortSummary::default());
    }

    buffer
        .plan(departures)
        .inspect_err(|e| tracing::error!(%e, "transfer buffer too small"))?;
    check_arrivals(store, departures)
        .inspect_err(|e| tracing::error!(%e, "tile store too small"))?;

    copy_out(store, departures, buffer);
    copy_in(store, buffer);

    departures.clear();
    buffer.clear();
    debug_assert_eq!(store.total(), before, "reorder must conserve particles");
    Ok(SortSummary { moved })
}

/// Validate that every tile can hold what stays plus what arrives.
fn check_arrivals(
    store: &ParticleStore,
    departures: &DepartureTable,
) -> Result<(), OverflowError> {
    let partition = store.partition();
    let capacity = store.capacity();
    (0..store.tiles())
        .filter_map(|tile| {
            let from_left = partition.neighbour(tile, Direction::Left);
            let from_right = partition.neighbour(tile, Direction::Right);
            let arriving = departures.ncl(from_left, Direction::Right)
                + departures.ncl(from_right, Direction::Left);
            let requested = store.count(tile).saturating_sub(departures.leaving(tile)) + arriving;
            (requested > capacity).then_some(OverflowError {
                phase: Phase::SortCopyIn,
                resource: Resource::TileStore,
                tile: Some(tile),
                capacity,
                requested,
            })
        })
        .reduce(OverflowError::worst)
        .map_or(Ok(()), Err)
}

fn copy_out(
    store: &mut ParticleStore,
    departures: &DepartureTable,
    buffer: &mut TransferBuffer,
) {
    let offsets = &buffer.offsets;
    store
        .particles
        .par_segments_mut()
        .zip(departures.records.par_tiles())
        .zip(buffer.slots.par_segments_mut())
        .zip(offsets.par_iter())
        .for_each(|(((mut tile, leaving), mut staged), offsets)| {
            let live = tile.live();
            staged.fill_with(offsets[2], |slots| {
                let mut cursor = [offsets[0], offsets[1]];
                for d in leaving {
                    let i = d.direction.index();
                    slots[cursor[i]] = live[d.slot];
                    cursor[i] += 1;
                }
            });
            close_holes(&mut tile, leaving);
        });
}

/// Remove the departed slots from a tile, filling each hole below the new
/// length with the highest remaining particle above it.
fn close_holes(tile: &mut TileSegment<'_, Particle>, leaving: &[Departure]) {
    let len = tile.len();
    let keep = len - leaving.len();
    let live = tile.live_mut();
    // Departed slots are ascending. Holes at or above `keep` vanish with the
    // truncation; the ones below are filled from the tail, skipping tail
    // slots that are themselves holes.
    let mut tail_holes = leaving.iter().rev().map(|d| d.slot).peekable();
    let mut src = len;
    for hole in leaving.iter().map(|d| d.slot).take_while(|&s| s < keep) {
        loop {
            src -= 1;
            if tail_holes.peek() == Some(&src) {
                tail_holes.next();
            } else {
                break;
            }
        }
        live[hole] = live[src];
    }
    tile.truncate(keep);
}

fn copy_in(store: &mut ParticleStore, buffer: &TransferBuffer) {
    let partition = *store.partition();
    store.particles.par_segments_mut().for_each(|mut tile| {
        let t = tile.tile();
        let left = partition.neighbour(t, Direction::Left);
        let right = partition.neighbour(t, Direction::Right);
        let appended = tile
            .extend_from_slice(buffer.outgoing(left, Direction::Right), Phase::SortCopyIn)
            .and_then(|()| {
                tile.extend_from_slice(buffer.outgoing(right, Direction::Left), Phase::SortCopyIn)
            });
        // Capacities were validated by check_arrivals.
        debug_assert!(appended.is_ok(), "{appended:?}");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::StoreLayout;
    use tilepic_grid::{Grid, TilePartition};

    fn store_of(nx: usize, mx: usize, cap: usize, tiles: &[&[f32]]) -> ParticleStore {
        let p = TilePartition::new(&Grid::new(nx).unwrap(), mx).unwrap();
        let mut s = ParticleStore::new(p, StoreLayout::with_capacities(cap, cap, cap));
        for (t, xs) in tiles.iter().enumerate() {
            for &x in *xs {
                s.insert(t, Particle::at_rest(x), Phase::Distribution).unwrap();
            }
        }
        s
    }

    fn record(table: &mut DepartureTable, tile: usize, moves: &[(usize, Direction)]) {
        table.par_lists_mut().for_each(|mut list| {
            if list.tile() == tile {
                for &(slot, dir) in moves {
                    list.record(slot, dir);
                }
            }
        });
    }

    #[test]
    fn nothing_to_move_is_a_no_op() {
        let mut s = store_of(8, 4, 4, &[&[1.0], &[5.0]]);
        let mut d = DepartureTable::new(2, 2);
        let mut b = TransferBuffer::new(2, 2);
        assert_eq!(reorder(&mut s, &mut d, &mut b).unwrap().moved, 0);
        assert_eq!(s.counts(), &[1, 1]);
    }

    #[test]
    fn close_holes_keeps_survivors() {
        let mut s = store_of(8, 8, 8, &[&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]]);
        let leaving = [
            Departure { slot: 1, direction: Direction::Left },
            Departure { slot: 4, direction: Direction::Left },
            Departure { slot: 5, direction: Direction::Left },
        ];
        close_holes(&mut s.particles.segment_mut(0), &leaving);
        let mut xs: Vec<f32> = s.tile(0).iter().map(|p| p.x).collect();
        xs.sort_by(f32::total_cmp);
        assert_eq!(xs, vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn close_holes_all_departed() {
        let mut s = store_of(8, 8, 8, &[&[0.0, 1.0]]);
        let leaving = [
            Departure { slot: 0, direction: Direction::Left },
            Departure { slot: 1, direction: Direction::Right },
        ];
        close_holes(&mut s.particles.segment_mut(0), &leaving);
        assert_eq!(s.count(0), 0);
    }

    #[test]
    fn moves_to_both_neighbours_with_wraparound() {
        // Positions already updated by a pusher; slots record where they went.
        let mut s = store_of(12, 4, 4, &[&[11.5, 1.0, 4.2], &[5.0], &[9.0, 0.5]]);
        let mut d = DepartureTable::new(3, 2);
        record(&mut d, 0, &[(0, Direction::Left), (2, Direction::Right)]);
        record(&mut d, 2, &[(1, Direction::Right)]);
        let mut b = TransferBuffer::new(3, 2);
        let summary = reorder(&mut s, &mut d, &mut b).unwrap();
        assert_eq!(summary.moved, 3);
        assert_eq!(s.counts(), &[2, 2, 2]);
        assert_eq!(s.total(), 6);
        for t in 0..3 {
            for p in s.tile(t) {
                assert!(s.partition().contains(t, p.x), "tile {t} holds {}", p.x);
            }
        }
        assert_eq!(d.total(), 0);
        assert_eq!(b.total(), 0);
    }

    #[test]
    fn transfer_overflow_writes_nothing() {
        let mut s = store_of(8, 4, 4, &[&[4.5, 5.5], &[]]);
        let mut d = DepartureTable::new(2, 2);
        record(&mut d, 0, &[(0, Direction::Right), (1, Direction::Right)]);
        let mut b = TransferBuffer::new(2, 1);
        let err = reorder(&mut s, &mut d, &mut b).unwrap_err();
        assert_eq!(err.resource, Resource::TransferBuffer);
        assert_eq!(err.tile, Some(0));
        assert_eq!(err.requested, 2);
        assert_eq!(s.counts(), &[2, 0]);
    }

    #[test]
    fn copy_in_overflow_writes_nothing() {
        let mut s = store_of(8, 4, 2, &[&[4.5], &[5.0, 6.0]]);
        let mut d = DepartureTable::new(2, 2);
        record(&mut d, 0, &[(0, Direction::Right)]);
        let mut b = TransferBuffer::new(2, 2);
        let err = reorder(&mut s, &mut d, &mut b).unwrap_err();
        assert_eq!(err.phase, Phase::SortCopyIn);
        assert_eq!(err.resource, Resource::TileStore);
        assert_eq!(err.tile, Some(1));
        assert_eq!(err.capacity, 2);
        assert_eq!(err.requested, 3);
        assert_eq!(s.counts(), &[1, 2]);
    }

    #[test]
    fn two_tiles_exchange_through_both_sides() {
        let mut s = store_of(8, 4, 4, &[&[5.0, 7.9], &[0.5, 1.0]]);
        let mut d = DepartureTable::new(2, 2);
        record(&mut d, 0, &[(0, Direction::Right), (1, Direction::Left)]);
        record(&mut d, 1, &[(0, Direction::Left), (1, Direction::Right)]);
        let mut b = TransferBuffer::new(2, 2);
        reorder(&mut s, &mut d, &mut b).unwrap();
        assert_eq!(s.counts(), &[2, 2]);
        assert!(s.tile(0).iter().all(|p| p.x < 4.0));
        assert!(s.tile(1).iter().all(|p| p.x >= 4.0));
    }
}
