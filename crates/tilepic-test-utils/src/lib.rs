//! Test fixtures for tilepic development.
//!
//! Provides particle-set builders ([`lattice`], [`at_positions`]) and a
//! [`TileFixture`] that bundles a grid with its tile partition and builds
//! stores, departure tables, and transfer buffers sized for a scenario.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{at_positions, lattice, moving, TileFixture};
