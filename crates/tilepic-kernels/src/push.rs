//! The Boris pusher with departure detection.

use rayon::prelude::*;
use tracing::info_span;

use tilepic_core::{Direction, PicError};
use tilepic_grid::Grid;
use tilepic_tiles::{DepartureTable, ParticleStore};

use crate::boris::{BorisKick, PushFields, PushParams};

/// Outcome of a push pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PushSummary {
    /// Time-centred kinetic energy `½ Σ |v + qtmh·E|²` (unit mass).
    pub wke: f64,
    /// Particles that left their tile.
    pub departures: usize,
}

struct TileOutcome {
    energy: f64,
    departures: usize,
    error: Option<PicError>,
}

/// The more serious of two push failures: a skipped tile outranks an
/// overflow, and ties keep the lower tile.
fn more_serious(a: PicError, b: PicError) -> PicError {
    match (a, b) {
        (PicError::Overflow(x), PicError::Overflow(y)) => PicError::Overflow(x.worst(y)),
        (skip @ PicError::TileSkip { .. }, PicError::Overflow(_)) => skip,
        (PicError::Overflow(_), skip @ PicError::TileSkip { .. }) => skip,
        (a, _) => a,
    }
}

/// Advance every particle one step and record tile departures.
///
/// Velocities get a Boris update in the interpolated fields, then
/// positions move by `vx·dtc` and wrap periodically. A particle whose
/// wrapped position is outside its tile gets a departure record pointing
/// `Left` if it crossed the tile's lower edge and `Right` otherwise.
/// Storage slots do not change; [`reorder`](tilepic_tiles::reorder())
/// moves the particles afterwards.
///
/// Every tile finishes its pass even if another tile fails. Errors:
/// [`PicError::TileSkip`] if a particle went past a neighbouring tile,
/// or a departure-list overflow if a tile recorded more than `ntmax`
/// departures (the most severe failure is reported).
pub fn push(
    store: &mut ParticleStore,
    departures: &mut DepartureTable,
    grid: &Grid,
    fields: &PushFields<'_>,
    params: &PushParams,
) -> Result<PushSummary, PicError> {
    let _span = info_span!("push", particles = store.total()).entered();
    let kick = BorisKick::new(params);
    let partition = *store.partition();
    let dtc = params.dtc;

    let outcomes: Vec<TileOutcome> = store
        .par_tiles_mut()
        .zip(departures.par_lists_mut())
        .map(|(mut particles, mut leaving)| {
            let tile = particles.tile();
            let (lo, _) = partition.bounds(tile);
            let mut energy = 0.0f64;
            let mut skipped = None;
            leaving.clear();
            for (slot, p) in particles.live_mut().iter_mut().enumerate() {
                let k = kick.at(p, fields);
                energy += f64::from(k.energy);
                [p.vx, p.vy, p.vz] = k.velocity;
                let raw = p.x + p.vx * dtc;
                let x = grid.wrap(raw);
                p.x = x;
                if partition.contains(tile, x) {
                    continue;
                }
                let dir = if raw < lo {
                    Direction::Left
                } else {
                    Direction::Right
                };
                if partition.tile_of(x) != Some(partition.neighbour(tile, dir)) {
                    skipped.get_or_insert(PicError::TileSkip { tile, slot, x });
                }
                leaving.record(slot, dir);
            }
            let error = skipped.or_else(|| leaving.overflow().map(PicError::from));
            TileOutcome {
                energy,
                departures: leaving.len(),
                error,
            }
        })
        .collect();

    let mut summary = PushSummary::default();
    let mut failure: Option<PicError> = None;
    for outcome in outcomes {
        summary.wke += outcome.energy;
        summary.departures += outcome.departures;
        if let Some(e) = outcome.error {
            failure = Some(match failure {
                Some(f) => more_serious(f, e),
                None => e,
            });
        }
    }
    summary.wke *= 0.5;
    if let Some(e) = failure {
        tracing::error!(%e, "push failed");
        return Err(e);
    }
    Ok(summary)
}
