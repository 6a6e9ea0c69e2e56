//! Periodic spectral field solves for the 1-2/2D Darwin model.
//!
//! [`Fft`] holds forward and inverse `rustfft` plans for the grid length,
//! made once per grid. [`DarwinSolver`] implements
//! [`FieldSolver`] on top of it with precomputed per-mode form factors
//! (Green's function times a Gaussian smoothing `s(k)`).
//!
//! All solves read the active cells of their inputs and overwrite the
//! active cells of their outputs. Guard cells are left to the caller
//! ([`copy_guards`](tilepic_grid::guard::copy_guards)).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod fft;
pub mod solver;

pub use fft::Fft;
pub use solver::{DarwinSolver, FieldSolver};
