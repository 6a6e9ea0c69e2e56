//! Time-step driver for the tiled 1-2/2D Darwin particle-in-cell model.
//!
//! A [`Simulation`] owns a rayon worker pool and one
//! [`SimulationState`]: the tiled particle store, its sort buffers, the
//! grid fields, and the deposit scratch. Each [`step()`](Simulation::step)
//! runs, in order:
//!
//! ```text
//!  deposit cue, qe ─► fold guards ─► solve fxe, byze ─► copy guards
//!        │
//!        ▼
//!  exyze = (fxe, cus) ─► deposit dcu, amu ─► solve cus ─► exyze
//!        │
//!        ▼
//!  ndc × { deposit cue, dcu, amu ─► solve byze, cus ─► exyze }
//!        │
//!        ▼
//!  push (departures) ─► reorder
//! ```
//!
//! Configuration lives in [`SimConfig`] and is validated once, when the
//! simulation is built. Per-step energies come back in a [`StepReport`];
//! wall-clock time per phase accumulates in [`PhaseTimings`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod sampler;
pub mod simulation;
pub mod state;

pub use config::{ConfigError, SimConfig};
pub use metrics::{Energies, ParticleCost, PhaseTimings, Stage, StepReport};
pub use sampler::Maxwellian;
pub use simulation::{Simulation, StepError};
pub use state::{Fields, SimulationState};
