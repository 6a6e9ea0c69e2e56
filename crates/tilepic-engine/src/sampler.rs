//! Initial particle loading: uniform lattice positions, Maxwellian
//! velocities.
//!
//! Deterministic for a given seed: the velocity stream comes from a
//! seeded ChaCha8 generator and is drawn in particle order on the calling
//! thread.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tilepic_core::Particle;
use tilepic_grid::Grid;

use crate::config::SimConfig;

/// A drifting Maxwellian velocity distribution on a uniform lattice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Maxwellian {
    /// Thermal velocity per component.
    pub thermal: [f32; 3],
    /// Mean velocity per component.
    pub drift: [f32; 3],
    /// Generator seed.
    pub seed: u64,
}

impl Maxwellian {
    /// The distribution described by `config`.
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            thermal: config.thermal(),
            drift: config.drift(),
            seed: config.seed,
        }
    }

    /// Draw `np` particles over `grid`.
    ///
    /// Particle `j` sits at `(j + ½)·nx/np`. Velocities are `vt·N(0, 1)`
    /// per component, then shifted so the sample mean of each component
    /// equals the drift.
    pub fn sample(&self, grid: &Grid, np: usize) -> Vec<Particle> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let dx = f64::from(grid.length()) / np as f64;
        let mut particles: Vec<Particle> = (0..np)
            .map(|j| {
                let x = ((j as f64 + 0.5) * dx) as f32;
                let vx = self.thermal[0] * normal(&mut rng) as f32;
                let vy = self.thermal[1] * normal(&mut rng) as f32;
                let vz = self.thermal[2] * normal(&mut rng) as f32;
                Particle::new(x, vx, vy, vz)
            })
            .collect();
        if np > 0 {
            self.recentre(&mut particles);
        }
        particles
    }

    fn recentre(&self, particles: &mut [Particle]) {
        let np = particles.len() as f64;
        let mut sums = [0.0f64; 3];
        for p in particles.iter() {
            sums[0] += f64::from(p.vx);
            sums[1] += f64::from(p.vy);
            sums[2] += f64::from(p.vz);
        }
        let shift: [f32; 3] =
            std::array::from_fn(|c| (sums[c] / np - f64::from(self.drift[c])) as f32);
        for p in particles.iter_mut() {
            p.vx -= shift[0];
            p.vy -= shift[1];
            p.vz -= shift[2];
        }
    }
}

/// A standard normal deviate by Box-Muller.
fn normal(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-300);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
