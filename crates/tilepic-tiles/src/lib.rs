//! Tiled particle storage and tile-to-tile particle management.
//!
//! # Architecture
//!
//! ```text
//! ParticleStore
//! └── TiledVec<Particle>   one fixed-capacity segment (nppmx0) per tile
//! DepartureTable
//! └── TiledVec<Departure>  one fixed-capacity list (ntmax) per tile + ncl
//! TransferBuffer
//! └── TiledVec<Particle>   one staging segment (npbmx) per tile + offsets
//! ```
//!
//! Every per-tile segment is exclusively owned by the worker processing
//! that tile, so the parallel phases need no locks or atomics. Capacities
//! are fixed by [`StoreLayout`] after the [`census()`]; exceeding one is
//! reported as an [`OverflowError`](tilepic_core::OverflowError) before
//! any write takes place.
//!
//! # Phases
//!
//! 1. [`census::census`]: count particles per tile, size the layout.
//! 2. [`census::distribute`]: copy the unordered list into tiles.
//! 3. [`census::check`]: validate tile ownership (debug pass).
//! 4. [`reorder::reorder`]: consume departure records written by the
//!    pusher and move particles into their new tiles.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod census;
pub mod departures;
pub mod layout;
pub mod reorder;
pub mod segment;
pub mod store;
pub mod transfer;

pub use census::{census, check, distribute, Census};
pub use departures::{Departure, DepartureList, DepartureTable};
pub use layout::StoreLayout;
pub use reorder::{reorder, SortSummary};
pub use segment::{TileSegment, TiledVec};
pub use store::ParticleStore;
pub use transfer::TransferBuffer;
