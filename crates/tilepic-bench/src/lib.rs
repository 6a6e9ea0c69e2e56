//! Benchmark profiles and fixtures for the tilepic engine.
//!
//! - [`reference_profile`]: the reference electron run (512 cells, 18432
//!   particles)
//! - [`stress_profile`]: 16x the cells and particles of the reference run
//! - [`thermal_store`]: a distributed Maxwellian particle store for
//!   kernel-level benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tilepic_core::{Particle, PicError};
use tilepic_engine::{ConfigError, Maxwellian, SimConfig};
use tilepic_grid::Grid;
use tilepic_tiles::{census, distribute, ParticleStore};

/// The reference Darwin run: `nx = 512`, `np = 18432`, tiles of 32.
pub fn reference_profile(seed: u64) -> SimConfig {
    SimConfig {
        seed,
        ..SimConfig::default()
    }
}

/// A heavier run: `nx = 8192`, `np = 294912`, tiles of 32.
pub fn stress_profile(seed: u64) -> SimConfig {
    SimConfig {
        indx: 13,
        npx: 294_912,
        seed,
        ..SimConfig::default()
    }
}

/// Initial particles of `config`, tiled with its slack.
///
/// Returns the grid, the unordered particles, and the distributed store.
pub fn thermal_store(
    config: &SimConfig,
) -> Result<(Grid, Vec<Particle>, ParticleStore), ConfigError> {
    config.validate()?;
    let (grid, partition) = config.partition()?;
    let particles = Maxwellian::from_config(config).sample(&grid, config.npx);
    let layout = census(&particles, &partition)
        .map_err(PicError::from)?
        .layout(config.slack);
    let store = distribute(&particles, &partition, &layout).map_err(PicError::from)?;
    Ok((grid, particles, store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_are_valid() {
        reference_profile(1).validate().unwrap();
        stress_profile(1).validate().unwrap();
        assert_eq!(stress_profile(1).nx(), 16 * reference_profile(1).nx());
    }

    #[test]
    fn thermal_store_holds_every_particle() {
        let config = SimConfig {
            indx: 6,
            npx: 640,
            mx: 16,
            ..SimConfig::default()
        };
        let (grid, particles, store) = thermal_store(&config).unwrap();
        assert_eq!(grid.nx(), 64);
        assert_eq!(particles.len(), 640);
        assert_eq!(store.total(), 640);
    }
}
