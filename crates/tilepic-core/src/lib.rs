//! Core types for the tilepic particle-in-cell engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the particle record, the boundary-crossing [`Direction`], and the
//! error taxonomy shared by every phase of a time step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod particle;

pub use error::{Misplaced, OverflowError, Phase, PicError, Resource};
pub use particle::{Direction, Particle};
