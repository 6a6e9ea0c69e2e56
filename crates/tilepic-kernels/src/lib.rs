//! Particle kernels: grid deposits and the Boris push.
//!
//! Both kernels are tile-parallel. A worker owns one tile's particle
//! segment (and, for the push, its departure list) for the duration of
//! the pass.
//!
//! - [`deposit`](deposit::deposit) weights a per-particle moment onto the
//!   grid with linear (cloud-in-cell) weighting. The moment comes from a
//!   [`Contribution`] variant; the destination is a [`DepositTarget`].
//! - [`push`](push::push) advances velocities and positions and records
//!   every particle that left its tile.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boris;
pub mod deposit;
pub mod push;

pub use boris::{BorisKick, PushFields, PushParams};
pub use deposit::{
    deposit, Acceleration, Charge, Contribution, Current, CurrentAcceleration, DarwinCurrentMoments,
    DarwinMoments, DepositScratch, DepositTarget,
};
pub use push::{push, PushSummary};
