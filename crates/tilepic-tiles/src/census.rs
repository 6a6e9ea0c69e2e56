//! Census, initial distribution, and the tile-ownership check.

use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::info_span;

use tilepic_core::{Misplaced, OverflowError, Particle, Phase, PicError, Resource};
use tilepic_grid::TilePartition;

use crate::layout::StoreLayout;
use crate::store::ParticleStore;

/// Input particles counted per rayon work item.
const CHUNK: usize = 4096;

/// Misplaced particles kept verbatim in a check failure.
const MAX_SAMPLES: usize = 4;

/// Per-tile particle counts of an unordered particle list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Census {
    counts: Vec<usize>,
}

impl Census {
    /// Particle count of each tile.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Largest tile occupancy (`nppmx`).
    pub fn nppmx(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Number of particles counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Capacities for a store holding this population.
    pub fn layout(&self, slack: f32) -> StoreLayout {
        StoreLayout::from_census(self.nppmx(), slack)
    }
}

/// Domain overflow for a particle at `x` on a grid of `nx` cells.
///
/// `requested` is the extent the domain would need to contain `x`.
fn outside_domain(phase: Phase, nx: usize, x: f32) -> OverflowError {
    let requested = if !x.is_finite() {
        usize::MAX
    } else if x < 0.0 {
        nx.saturating_add((-x.floor()) as usize)
    } else {
        (x.floor() as usize).saturating_add(1)
    };
    OverflowError {
        phase,
        resource: Resource::Domain,
        tile: None,
        capacity: nx,
        requested,
    }
}

#[derive(Clone, Debug)]
struct Tally {
    counts: Vec<usize>,
    outside: Option<OverflowError>,
}

impl Tally {
    fn new(tiles: usize) -> Self {
        Self {
            counts: vec![0; tiles],
            outside: None,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.outside = match (self.outside, other.outside) {
            (Some(a), Some(b)) => Some(a.worst(b)),
            (a, b) => a.or(b),
        };
        self
    }
}

/// Count particles per tile.
///
/// Read-only and deterministic: running it twice on the same input gives
/// the same counts. Fails with a [`Resource::Domain`] overflow naming the
/// worst offender if any position lies outside `[0, nx)`.
pub fn census(
    particles: &[Particle],
    partition: &TilePartition,
) -> Result<Census, OverflowError> {
    let _span = info_span!("census", particles = particles.len()).entered();
    let tiles = partition.count();
    let nx = partition.nx();
    let tally = particles
        .par_chunks(CHUNK)
        .fold(
            || Tally::new(tiles),
            |mut acc, chunk| {
                for p in chunk {
                    match partition.tile_of(p.x) {
                        Some(t) => acc.counts[t] += 1,
                        None => {
                            let e = outside_domain(Phase::Census, nx, p.x);
                            acc.outside = Some(acc.outside.map_or(e, |w| w.worst(e)));
                        }
                    }
                }
                acc
            },
        )
        .reduce(|| Tally::new(tiles), Tally::merge);
    match tally.outside {
        Some(e) => {
            tracing::error!(%e, "particle outside the domain");
            Err(e)
        }
        None => Ok(Census {
            counts: tally.counts,
        }),
    }
}

/// Copy an unordered particle list into a freshly allocated tiled store.
///
/// Input order is preserved within each tile. One counting-sort pass
/// groups the input indices by owning tile; tiles then copy their own
/// particles in parallel. Fails if a particle is outside the domain or if
/// a tile's occupancy would exceed `layout.nppmx0`, in which case nothing
/// is copied.
pub fn distribute(
    particles: &[Particle],
    partition: &TilePartition,
    layout: &StoreLayout,
) -> Result<ParticleStore, OverflowError> {
    let _span = info_span!("distribute", nppmx0 = layout.nppmx0).entered();
    let nx = partition.nx();
    let owners = particles
        .par_iter()
        .map(|p| {
            partition
                .tile_of(p.x)
                .ok_or_else(|| outside_domain(Phase::Distribution, nx, p.x))
        })
        .collect::<Result<Vec<usize>, OverflowError>>()?;

    // offsets[t]..offsets[t + 1] is tile t's run in `order`.
    let tiles = partition.count();
    let mut offsets = vec![0usize; tiles + 1];
    for &o in &owners {
        offsets[o + 1] += 1;
    }
    let overflow = offsets[1..]
        .iter()
        .enumerate()
        .filter(|&(_, &n)| n > layout.nppmx0)
        .map(|(tile, &n)| OverflowError {
            phase: Phase::Distribution,
            resource: Resource::TileStore,
            tile: Some(tile),
            capacity: layout.nppmx0,
            requested: n,
        })
        .reduce(OverflowError::worst);
    if let Some(e) = overflow {
        tracing::error!(%e, "initial distribution does not fit");
        return Err(e);
    }
    for t in 0..tiles {
        offsets[t + 1] += offsets[t];
    }
    let mut cursor = offsets[..tiles].to_vec();
    let mut order = vec![0usize; owners.len()];
    for (i, &o) in owners.iter().enumerate() {
        order[cursor[o]] = i;
        cursor[o] += 1;
    }

    let mut store = ParticleStore::new(*partition, *layout);
    store.par_tiles_mut().for_each(|mut seg| {
        let tile = seg.tile();
        let mine = &order[offsets[tile]..offsets[tile + 1]];
        seg.fill_with(mine.len(), |slots| {
            for (slot, &i) in slots.iter_mut().zip(mine) {
                *slot = particles[i];
            }
        });
    });
    Ok(store)
}

/// Verify every live particle lies inside the tile holding it.
pub fn check(store: &ParticleStore) -> Result<(), PicError> {
    let _span = info_span!("check", particles = store.total()).entered();
    let partition = store.partition();
    let (count, samples) = store
        .par_tiles()
        .enumerate()
        .map(|(tile, live)| {
            let mut count = 0;
            let mut samples: SmallVec<[Misplaced; MAX_SAMPLES]> = SmallVec::new();
            for (slot, p) in live.iter().enumerate() {
                if !partition.contains(tile, p.x) {
                    count += 1;
                    if samples.len() < MAX_SAMPLES {
                        samples.push(Misplaced { tile, slot, x: p.x });
                    }
                }
            }
            (count, samples)
        })
        .reduce(
            || (0, SmallVec::new()),
            |(na, mut sa), (nb, sb)| {
                let room = MAX_SAMPLES - sa.len();
                sa.extend(sb.into_iter().take(room));
                (na + nb, sa)
            },
        );
    if count == 0 {
        Ok(())
    } else {
        let err = PicError::Misplaced { count, samples };
        tracing::error!(%err, "tile ownership violated");
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilepic_grid::Grid;

    fn partition(nx: usize, mx: usize) -> TilePartition {
        TilePartition::new(&Grid::new(nx).unwrap(), mx).unwrap()
    }

    fn at(xs: &[f32]) -> Vec<Particle> {
        xs.iter().copied().map(Particle::at_rest).collect()
    }

    #[test]
    fn census_counts_per_tile() {
        let p = partition(8, 4);
        let c = census(&at(&[0.0, 1.5, 3.99, 4.0, 7.5]), &p).unwrap();
        assert_eq!(c.counts(), &[3, 2]);
        assert_eq!(c.nppmx(), 3);
        assert_eq!(c.total(), 5);
    }

    #[test]
    fn census_is_idempotent() {
        let p = partition(16, 4);
        let xs: Vec<f32> = (0..10_000).map(|i| (i as f32 * 0.37) % 16.0).collect();
        let parts = at(&xs);
        assert_eq!(census(&parts, &p).unwrap(), census(&parts, &p).unwrap());
    }

    #[test]
    fn census_rejects_outside_domain() {
        let p = partition(8, 4);
        let err = census(&at(&[1.0, 9.5, 8.0]), &p).unwrap_err();
        assert_eq!(err.phase, Phase::Census);
        assert_eq!(err.resource, Resource::Domain);
        assert_eq!(err.capacity, 8);
        assert_eq!(err.requested, 10);
    }

    #[test]
    fn census_reports_negative_and_nan() {
        let p = partition(8, 4);
        let err = census(&at(&[-2.5]), &p).unwrap_err();
        assert_eq!(err.requested, 11);
        let err = census(&at(&[-2.5, f32::NAN]), &p).unwrap_err();
        assert_eq!(err.requested, usize::MAX);
    }

    #[test]
    fn distribute_preserves_input_order_within_tile() {
        let p = partition(8, 4);
        let parts = at(&[5.0, 1.0, 6.0, 2.0]);
        let layout = census(&parts, &p).unwrap().layout(0.2);
        let store = distribute(&parts, &p, &layout).unwrap();
        let xs: Vec<f32> = store.iter().map(|q| q.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 5.0, 6.0]);
        check(&store).unwrap();
    }

    #[test]
    fn distribute_overflow_names_tile() {
        let p = partition(8, 4);
        let parts = at(&[0.5, 1.5, 2.5, 4.5]);
        let err = distribute(&parts, &p, &StoreLayout::with_capacities(2, 1, 1)).unwrap_err();
        assert_eq!(err.phase, Phase::Distribution);
        assert_eq!(err.resource, Resource::TileStore);
        assert_eq!(err.tile, Some(0));
        assert_eq!(err.capacity, 2);
        assert_eq!(err.requested, 3);
    }

    #[test]
    fn distribute_rejects_outside_domain() {
        let p = partition(8, 4);
        let err = distribute(&at(&[-0.5]), &p, &StoreLayout::with_capacities(4, 1, 1)).unwrap_err();
        assert_eq!(err.resource, Resource::Domain);
        assert_eq!(err.phase, Phase::Distribution);
    }

    #[test]
    fn distribute_reports_worst_tile_overflow() {
        let p = partition(8, 2);
        let parts = at(&[0.5, 0.6, 0.7, 2.5, 6.1, 6.2, 6.3, 6.4]);
        let err = distribute(&parts, &p, &StoreLayout::with_capacities(2, 1, 1)).unwrap_err();
        assert_eq!(err.tile, Some(3));
        assert_eq!(err.requested, 4);
    }

    #[test]
    fn distribute_with_many_small_tiles() {
        let p = partition(4096, 1);
        let xs: Vec<f32> = (0..40_000).map(|i| (i as f32 * 7.31) % 4096.0).collect();
        let parts = at(&xs);
        let c = census(&parts, &p).unwrap();
        let store = distribute(&parts, &p, &c.layout(0.0)).unwrap();
        assert_eq!(store.counts(), c.counts());
        check(&store).unwrap();
        for t in [0, 17, 4095] {
            let expected: Vec<f32> = xs
                .iter()
                .copied()
                .filter(|&x| p.tile_of(x) == Some(t))
                .collect();
            let got: Vec<f32> = store.tile(t).iter().map(|q| q.x).collect();
            assert_eq!(got, expected, "tile {t}");
        }
    }

    #[test]
    fn check_reports_misplaced() {
        let p = partition(8, 4);
        let mut store = ParticleStore::new(p, StoreLayout::with_capacities(4, 1, 1));
        store.insert(0, Particle::at_rest(1.0), Phase::Check).unwrap();
        store.insert(0, Particle::at_rest(6.0), Phase::Check).unwrap();
        store.insert(1, Particle::at_rest(0.5), Phase::Check).unwrap();
        match check(&store) {
            Err(PicError::Misplaced { count, samples }) => {
                assert_eq!(count, 2);
                assert_eq!(samples[0], Misplaced { tile: 0, slot: 1, x: 6.0 });
                assert_eq!(samples[1].tile, 1);
            }
            other => panic!("expected misplaced, got {other:?}"),
        }
    }
}
