//! Darwin field solves in Fourier space.
//!
//! For each mode `k = 2πj/nx` (signed, `-nx/2 < j < nx/2`) with smoothing
//! `s(k) = exp(-(k·ax)²/2)`:
//!
//! | solve | result | energy |
//! |---|---|---|
//! | longitudinal | `Ex = -i·k·at1·q`, `at1 = affp·s²/k²` | `we = nx·Σ at1·|q|²` |
//! | magnetic | `By = -i·k·ci²·at1·Jz`, `Bz = i·k·ci²·at1·Jy` | `wm = nx·Σ ci²·at1·(|Jy|² + |Jz|²)` |
//! | transverse | `Et = -ci²·affp·s²·D/(k² + wpm·ci²)`, `D = dcu - i·k·amu` | `wf = nx·Σ |Et|²/(affp·s²)` |
//!
//! Energies sum over `0 < j < nx/2`. Mode 0 and the Nyquist mode are
//! set to zero in every result.

use num_complex::Complex32;
use tracing::info_span;

use tilepic_grid::{Field1d, Grid, GridError, ScalarField};

use crate::fft::Fft;

/// The three field solves the time step needs.
///
/// Each reads the active cells of its inputs, overwrites the active cells
/// of its output, and returns the field energy of the result.
pub trait FieldSolver {
    /// Longitudinal electric field `fxe` from charge density `qe`.
    fn longitudinal(&mut self, qe: &ScalarField, fxe: &mut ScalarField) -> f64;

    /// Magnetic field `(by, bz)` from transverse current `cue`.
    fn magnetic(&mut self, cue: &Field1d<2>, byze: &mut Field1d<2>) -> f64;

    /// Transverse electric field `cus` from acceleration density `dcu`
    /// and momentum flux `amu`.
    fn transverse(&mut self, dcu: &Field1d<2>, amu: &Field1d<2>, cus: &mut Field1d<2>) -> f64;
}

/// Per-mode form factors.
#[derive(Clone, Copy, Debug, Default)]
struct Mode {
    /// Signed wavenumber, zero for mode 0 and Nyquist.
    k: f32,
    /// `affp·s²`.
    shape: f32,
    /// `affp·s²/k²`.
    at1: f32,
    /// `affp·s²/(k² + wpm·ci²)`.
    shifted: f32,
}

/// Spectral solver for the Darwin model on a periodic grid.
#[derive(Clone, Debug)]
pub struct DarwinSolver {
    nx: usize,
    ci: f32,
    wpm: f32,
    fft: Fft,
    modes: Vec<Mode>,
    a: Vec<Complex32>,
    b: Vec<Complex32>,
}

impl DarwinSolver {
    /// Prepare tables for `grid` with smoothing length `ax`, particle
    /// normalization `affp`, and inverse light speed `ci`.
    ///
    /// Returns `Err(GridError::NotPowerOfTwo)` unless `nx` is a power of
    /// two. The shift starts at zero; see [`set_shift`](Self::set_shift).
    pub fn new(grid: &Grid, ax: f32, affp: f32, ci: f32) -> Result<Self, GridError> {
        let fft = Fft::new(grid)?;
        let nx = grid.nx();
        let modes = (0..nx)
            .map(|j| {
                if j == 0 || 2 * j == nx {
                    return Mode::default();
                }
                let signed = if 2 * j < nx {
                    j as f64
                } else {
                    j as f64 - nx as f64
                };
                let k = 2.0 * std::f64::consts::PI * signed / nx as f64;
                let s = (-0.5 * (k * f64::from(ax)).powi(2)).exp();
                let shape = f64::from(affp) * s * s;
                Mode {
                    k: k as f32,
                    shape: shape as f32,
                    at1: (shape / (k * k)) as f32,
                    shifted: (shape / (k * k)) as f32,
                }
            })
            .collect();
        Ok(Self {
            nx,
            ci,
            wpm: 0.0,
            fft,
            modes,
            a: vec![Complex32::default(); nx],
            b: vec![Complex32::default(); nx],
        })
    }

    /// Set the plasma-frequency shift `wpm` of the transverse operator.
    pub fn set_shift(&mut self, wpm: f32) {
        self.wpm = wpm;
        let shift = f64::from(wpm) * f64::from(self.ci) * f64::from(self.ci);
        for m in &mut self.modes {
            if m.k != 0.0 {
                let k = f64::from(m.k);
                m.shifted = (f64::from(m.shape) / (k * k + shift)) as f32;
            }
        }
    }

    /// The current shift.
    pub fn shift(&self) -> f32 {
        self.wpm
    }
}

/// Whether mode `j` is a positive, non-Nyquist mode.
#[inline]
fn in_energy_band(j: usize, nx: usize) -> bool {
    j > 0 && 2 * j < nx
}

fn load<const N: usize>(buf: &mut [Complex32], field: &Field1d<N>, c: usize) {
    for (z, cell) in buf.iter_mut().zip(field.active()) {
        *z = Complex32::new(cell[c], 0.0);
    }
}

fn store<const N: usize>(buf: &[Complex32], field: &mut Field1d<N>, c: usize) {
    for (cell, z) in field.active_mut().iter_mut().zip(buf) {
        cell[c] = z.re;
    }
}

/// `-i·x`.
#[inline]
fn minus_i(x: Complex32) -> Complex32 {
    Complex32::new(x.im, -x.re)
}

impl FieldSolver for DarwinSolver {
    fn longitudinal(&mut self, qe: &ScalarField, fxe: &mut ScalarField) -> f64 {
        let _span = info_span!("field_solve", kind = "longitudinal").entered();
        load(&mut self.a, qe, 0);
        self.fft.forward(&mut self.a);
        let nx = self.nx;
        let mut we = 0.0f64;
        for (j, (z, m)) in self.a.iter_mut().zip(&self.modes).enumerate() {
            let q = *z;
            if in_energy_band(j, nx) {
                we += f64::from(m.at1) * f64::from(q.norm_sqr());
            }
            *z = minus_i(q) * (m.k * m.at1);
        }
        self.fft.inverse(&mut self.a);
        store(&self.a, fxe, 0);
        self.nx as f64 * we
    }

    fn magnetic(&mut self, cue: &Field1d<2>, byze: &mut Field1d<2>) -> f64 {
        let _span = info_span!("field_solve", kind = "magnetic").entered();
        load(&mut self.a, cue, 0);
        load(&mut self.b, cue, 1);
        self.fft.forward(&mut self.a);
        self.fft.forward(&mut self.b);
        let ci2 = self.ci * self.ci;
        let nx = self.nx;
        let mut wm = 0.0f64;
        let pairs = self.a.iter_mut().zip(self.b.iter_mut());
        for (j, ((jy, jz), m)) in pairs.zip(&self.modes).enumerate() {
            let (y, z) = (*jy, *jz);
            if in_energy_band(j, nx) {
                wm += f64::from(ci2 * m.at1) * f64::from(y.norm_sqr() + z.norm_sqr());
            }
            let g = ci2 * m.k * m.at1;
            *jy = minus_i(z) * g;
            *jz = -minus_i(y) * g;
        }
        self.fft.inverse(&mut self.a);
        self.fft.inverse(&mut self.b);
        store(&self.a, byze, 0);
        store(&self.b, byze, 1);
        self.nx as f64 * wm
    }

    fn transverse(&mut self, dcu: &Field1d<2>, amu: &Field1d<2>, cus: &mut Field1d<2>) -> f64 {
        let _span = info_span!("field_solve", kind = "transverse").entered();
        let ci2 = self.ci * self.ci;
        let nx = self.nx;
        let mut wf = 0.0f64;
        for c in 0..2 {
            load(&mut self.a, dcu, c);
            load(&mut self.b, amu, c);
            self.fft.forward(&mut self.a);
            self.fft.forward(&mut self.b);
            let pairs = self.a.iter_mut().zip(&self.b);
            for (j, ((d, a), m)) in pairs.zip(&self.modes).enumerate() {
                let rhs = *d + minus_i(*a) * m.k;
                let et = rhs * (-ci2 * m.shifted);
                if in_energy_band(j, nx) && m.shape > 0.0 {
                    wf += f64::from(et.norm_sqr()) / f64::from(m.shape);
                }
                *d = et;
            }
            self.fft.inverse(&mut self.a);
            store(&self.a, cus, c);
        }
        self.nx as f64 * wf
    }
}
