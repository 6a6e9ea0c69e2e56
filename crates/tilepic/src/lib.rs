//! tilepic: a tiled, shared-memory particle-in-cell engine for the
//! 1-2/2D Darwin plasma model.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all tilepic sub-crates. Most users only need this one dependency.
//!
//! # Quick start
//!
//! ```rust
//! use tilepic::prelude::*;
//!
//! let config = SimConfig {
//!     indx: 6,
//!     npx: 1024,
//!     mx: 8,
//!     tend: 0.3,
//!     threads: Some(2),
//!     ..SimConfig::default()
//! };
//! let mut sim = Simulation::new(config).unwrap();
//! let reports = sim.run().unwrap();
//! assert_eq!(reports.len(), 3);
//! assert_eq!(sim.state().store().total(), 1024);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tilepic-core` | `Particle`, `Direction`, overflow and engine errors |
//! | [`grid`] | `tilepic-grid` | Periodic grid, fields, tile partition, guard cells |
//! | [`tiles`] | `tilepic-tiles` | Tiled particle store, census, reorder |
//! | [`kernels`] | `tilepic-kernels` | Deposits and the Boris push |
//! | [`field`] | `tilepic-field` | FFT and the Darwin field solver |
//! | [`engine`] | `tilepic-engine` | Configuration, time-step driver, diagnostics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Particle record and error types (`tilepic-core`).
pub use tilepic_core as types;

/// Periodic grid, grid fields, and the tile partition (`tilepic-grid`).
///
/// Guard-cell folding and the field glue of a time step live in
/// [`grid::guard`].
pub use tilepic_grid as grid;

/// Tiled particle storage and migration (`tilepic-tiles`).
///
/// [`tiles::census()`], [`tiles::distribute`], and [`tiles::check`] build
/// and validate a [`tiles::ParticleStore`]; [`tiles::reorder()`] moves
/// departed particles between tiles after each push.
pub use tilepic_tiles as tiles;

/// Particle kernels (`tilepic-kernels`).
pub use tilepic_kernels as kernels;

/// Spectral Darwin field solves (`tilepic-field`).
pub use tilepic_field as field;

/// Time-step driver (`tilepic-engine`).
///
/// [`engine::Simulation`] runs a full Darwin electron simulation from an
/// [`engine::SimConfig`].
pub use tilepic_engine as engine;

/// Common imports for typical tilepic usage.
///
/// ```rust
/// use tilepic::prelude::*;
/// ```
pub mod prelude {
    // Core types and errors
    pub use tilepic_core::{Direction, OverflowError, Particle, Phase, PicError, Resource};

    // Grid
    pub use tilepic_grid::{Field1d, Grid, GridError, ScalarField, TilePartition};

    // Tiles
    pub use tilepic_tiles::{census, check, distribute, reorder, ParticleStore, StoreLayout};

    // Kernels
    pub use tilepic_kernels::{deposit, push, PushFields, PushParams};

    // Field solve
    pub use tilepic_field::{DarwinSolver, FieldSolver};

    // Engine
    pub use tilepic_engine::{
        ConfigError, Energies, PhaseTimings, SimConfig, Simulation, StepError, StepReport,
    };
}
