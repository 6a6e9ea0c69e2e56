//! Periodic 1D mesh, grid-resident fields, and the tile partition.
//!
//! # Layout
//!
//! A [`Grid`] has `nx` active cells followed by [`GUARD_CELLS`] trailing
//! guard cell(s). Deposits may spill one cell past the last active cell;
//! [`guard::add_guards`] folds that spill back into cell 0, and
//! [`guard::copy_guards`] refreshes the guard from cell 0 before fields
//! are interpolated at particle positions.
//!
//! A [`TilePartition`] splits `[0, nx)` into `mx1` tiles of `mx` cells.
//! Tiles are the unit of parallel work everywhere in the engine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod grid;
pub mod guard;
pub mod partition;

pub use error::GridError;
pub use field::{Field1d, ScalarField};
pub use grid::{Grid, GUARD_CELLS};
pub use partition::TilePartition;
