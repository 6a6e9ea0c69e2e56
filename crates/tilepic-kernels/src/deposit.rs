//! Linear-weighted deposits from tiled particles onto the grid.
//!
//! Every deposit variant shares one algorithm. A particle at `x` with
//! `n = ⌊x⌋` and `dxp = x - n` adds `qm·(1 - dxp)·m` to cell `n` and
//! `qm·dxp·m` to cell `n + 1`, where `m` is the particle's moment as
//! computed by a [`Contribution`].
//!
//! The deposit runs in two tile-parallel passes:
//!
//! 1. each tile accumulates into a private scratch segment of `mx + 1`
//!    cells, the last cell being the spill into the next tile;
//! 2. each tile sums its own `mx` cells with the left neighbour's spill
//!    into a disjoint chunk of the grid.
//!
//! The last tile's spill lands in the guard cell, to be folded by
//! [`add_guards`](tilepic_grid::guard::add_guards). No two workers ever
//! write the same cell, and the summation order is fixed, so the result
//! does not depend on the number of threads.

use rayon::prelude::*;
use tracing::info_span;

use tilepic_core::Particle;
use tilepic_grid::{Field1d, TilePartition};
use tilepic_tiles::ParticleStore;

use crate::boris::{BorisKick, PushFields, PushParams};

/// A per-particle moment with `N` components.
pub trait Contribution<const N: usize>: Sync {
    /// Short name used in tracing spans.
    const NAME: &'static str;

    /// The moment carried by `p`, before charge and shape weighting.
    fn moment(&self, p: &Particle) -> [f32; N];
}

/// Charge density.
#[derive(Clone, Copy, Debug, Default)]
pub struct Charge;

impl Contribution<1> for Charge {
    const NAME: &'static str = "charge";

    #[inline]
    fn moment(&self, _p: &Particle) -> [f32; 1] {
        [1.0]
    }
}

/// Transverse current density `(jy, jz)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Current;

impl Contribution<2> for Current {
    const NAME: &'static str = "current";

    #[inline]
    fn moment(&self, p: &Particle) -> [f32; 2] {
        [p.vy, p.vz]
    }
}

/// Acceleration density `dcu` and momentum flux `amu`.
///
/// Each particle is advanced by one Boris step in the current fields
/// (without moving it or writing its new velocity back). With `v` the
/// old and `v'` the new velocity and `v̄ = (v + v')/2`, the moment is
/// `[(v'y - vy)/dt, (v'z - vz)/dt, v̄x·v̄y, v̄x·v̄z]`.
#[derive(Clone, Copy, Debug)]
pub struct Acceleration<'a> {
    fields: PushFields<'a>,
    kick: BorisKick,
    dti: f32,
}

impl<'a> Acceleration<'a> {
    /// Moments of particles advanced in `fields` with `params`.
    pub fn new(fields: PushFields<'a>, params: &PushParams) -> Self {
        Self {
            fields,
            kick: BorisKick::new(params),
            dti: 1.0 / params.dt,
        }
    }

    #[inline]
    fn mean_and_rate(&self, p: &Particle) -> ([f32; 3], [f32; 2]) {
        let v = self.kick.at(p, &self.fields).velocity;
        let mean = [0.5 * (v[0] + p.vx), 0.5 * (v[1] + p.vy), 0.5 * (v[2] + p.vz)];
        let rate = [(v[1] - p.vy) * self.dti, (v[2] - p.vz) * self.dti];
        (mean, rate)
    }
}

impl Contribution<4> for Acceleration<'_> {
    const NAME: &'static str = "acceleration";

    #[inline]
    fn moment(&self, p: &Particle) -> [f32; 4] {
        let (vb, rate) = self.mean_and_rate(p);
        [rate[0], rate[1], vb[0] * vb[1], vb[0] * vb[2]]
    }
}

/// Time-centred current plus acceleration density and momentum flux in
/// one pass: `[v̄y, v̄z, dcu_y, dcu_z, amu_xy, amu_xz]`.
#[derive(Clone, Copy, Debug)]
pub struct CurrentAcceleration<'a>(pub Acceleration<'a>);

impl Contribution<6> for CurrentAcceleration<'_> {
    const NAME: &'static str = "current_acceleration";

    #[inline]
    fn moment(&self, p: &Particle) -> [f32; 6] {
        let (vb, rate) = self.0.mean_and_rate(p);
        [
            vb[1],
            vb[2],
            rate[0],
            rate[1],
            vb[0] * vb[1],
            vb[0] * vb[2],
        ]
    }
}

/// Where summed deposit cells go.
///
/// `cells` covers every stored cell including the guard, in grid order.
/// Implementations add into their fields; they never overwrite.
pub trait DepositTarget<const N: usize> {
    /// Add the summed cells into the target.
    fn add_cells(&mut self, cells: &[[f32; N]]);
}

impl<const N: usize> DepositTarget<N> for Field1d<N> {
    fn add_cells(&mut self, cells: &[[f32; N]]) {
        for (dst, src) in self.cells_mut().iter_mut().zip(cells) {
            for c in 0..N {
                dst[c] += src[c];
            }
        }
    }
}

/// Split target for [`Acceleration`]: `dcu` and `amu`.
#[derive(Debug)]
pub struct DarwinMoments<'a> {
    /// Acceleration density.
    pub dcu: &'a mut Field1d<2>,
    /// Momentum flux.
    pub amu: &'a mut Field1d<2>,
}

impl DepositTarget<4> for DarwinMoments<'_> {
    fn add_cells(&mut self, cells: &[[f32; 4]]) {
        let dcu = self.dcu.cells_mut().iter_mut();
        let amu = self.amu.cells_mut().iter_mut();
        for ((d, a), s) in dcu.zip(amu).zip(cells) {
            d[0] += s[0];
            d[1] += s[1];
            a[0] += s[2];
            a[1] += s[3];
        }
    }
}

/// Split target for [`CurrentAcceleration`]: `cue`, `dcu`, and `amu`.
#[derive(Debug)]
pub struct DarwinCurrentMoments<'a> {
    /// Transverse current.
    pub cue: &'a mut Field1d<2>,
    /// Acceleration density.
    pub dcu: &'a mut Field1d<2>,
    /// Momentum flux.
    pub amu: &'a mut Field1d<2>,
}

impl DepositTarget<6> for DarwinCurrentMoments<'_> {
    fn add_cells(&mut self, cells: &[[f32; 6]]) {
        let cue = self.cue.cells_mut().iter_mut();
        let dcu = self.dcu.cells_mut().iter_mut();
        let amu = self.amu.cells_mut().iter_mut();
        for (((j, d), a), s) in cue.zip(dcu).zip(amu).zip(cells) {
            j[0] += s[0];
            j[1] += s[1];
            d[0] += s[2];
            d[1] += s[3];
            a[0] += s[4];
            a[1] += s[5];
        }
    }
}

/// Reusable per-tile scratch for an `N`-component deposit.
#[derive(Clone, Debug)]
pub struct DepositScratch<const N: usize> {
    mx: usize,
    /// `mx + 1` cells per tile.
    tiles: Vec<[f32; N]>,
    /// Summed cells, `nx` active plus the guard.
    summed: Vec<[f32; N]>,
}

impl<const N: usize> DepositScratch<N> {
    /// Scratch for a deposit over `partition`.
    pub fn new(partition: &TilePartition) -> Self {
        let mx = partition.width();
        Self {
            mx,
            tiles: vec![[0.0; N]; partition.count() * (mx + 1)],
            summed: vec![[0.0; N]; partition.nx() + 1],
        }
    }
}

/// Add the `qm`-weighted moments of every particle in `store` to
/// `target`.
///
/// The target is not cleared first, so depositing two particle sets in
/// turn equals depositing their union. The guard cell receives the spill
/// past the last active cell.
pub fn deposit<const N: usize, C, T>(
    store: &ParticleStore,
    contribution: &C,
    qm: f32,
    scratch: &mut DepositScratch<N>,
    target: &mut T,
) where
    C: Contribution<N>,
    T: DepositTarget<N> + ?Sized,
{
    let _span = info_span!("deposit", kind = C::NAME, particles = store.total()).entered();
    let partition = store.partition();
    let mx = scratch.mx;
    debug_assert_eq!(mx, partition.width());

    scratch
        .tiles
        .par_chunks_mut(mx + 1)
        .zip(store.par_tiles())
        .enumerate()
        .for_each(|(tile, (cells, particles))| {
            cells.fill([0.0; N]);
            let offset = partition.offset(tile);
            for p in particles {
                let n = p.x as usize;
                let dxp = qm * (p.x - n as f32);
                let amx = qm - dxp;
                let m = contribution.moment(p);
                let local = n - offset;
                for c in 0..N {
                    cells[local][c] += amx * m[c];
                    cells[local + 1][c] += dxp * m[c];
                }
            }
        });

    let tiles = &scratch.tiles;
    let nx = partition.nx();
    let mx1 = partition.count();
    let (active, guard) = scratch.summed.split_at_mut(nx);
    active
        .par_chunks_mut(mx)
        .enumerate()
        .for_each(|(tile, out)| {
            let own = &tiles[tile * (mx + 1)..tile * (mx + 1) + mx];
            out.copy_from_slice(own);
            if tile > 0 {
                let spill = tiles[tile * (mx + 1) - 1];
                for c in 0..N {
                    out[0][c] += spill[c];
                }
            }
        });
    guard[0] = tiles[mx1 * (mx + 1) - 1];

    target.add_cells(&scratch.summed);
}
