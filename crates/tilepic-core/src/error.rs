//! Error types for the tiled particle engine.
//!
//! Every fixed-capacity buffer in the engine (tile store, departure list,
//! transfer buffer) reports exhaustion as an [`OverflowError`] before the
//! offending write happens. [`PicError`] adds the two validation failures
//! that are not capacity problems.

use std::error::Error;
use std::fmt;

use smallvec::SmallVec;

/// The engine phase in which an error was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Per-tile particle counting before the store is built.
    Census,
    /// Copying the unordered particle list into tiles.
    Distribution,
    /// Tile-ownership validation.
    Check,
    /// Particle push and departure detection.
    Push,
    /// Sort step 2/3: staging departing particles in the transfer buffer.
    SortCopyOut,
    /// Sort step 4: appending arriving particles to their new tile.
    SortCopyIn,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Census => write!(f, "census"),
            Self::Distribution => write!(f, "distribution"),
            Self::Check => write!(f, "check"),
            Self::Push => write!(f, "push"),
            Self::SortCopyOut => write!(f, "sort copy-out"),
            Self::SortCopyIn => write!(f, "sort copy-in"),
        }
    }
}

/// The fixed-capacity resource that would have been exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The periodic domain `[0, nx)` itself: a particle lies outside it.
    /// Capacity and request are measured in cells.
    Domain,
    /// A tile's particle segment (`nppmx0` slots).
    TileStore,
    /// A tile's departure-record list (`ntmax` entries).
    DepartureList,
    /// A tile's transfer-buffer segment (`npbmx` slots).
    TransferBuffer,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain => write!(f, "domain"),
            Self::TileStore => write!(f, "tile store"),
            Self::DepartureList => write!(f, "departure list"),
            Self::TransferBuffer => write!(f, "transfer buffer"),
        }
    }
}

/// A fixed-capacity buffer would be exceeded.
///
/// Always carries the offending capacity and the size that was requested.
/// Overflow is fatal for the run: capacities are sized once from the
/// census and the usual remedy is a larger slack fraction or a smaller
/// tile width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverflowError {
    /// Phase that detected the overflow.
    pub phase: Phase,
    /// Which buffer overflowed.
    pub resource: Resource,
    /// Offending tile, if the resource is per tile.
    pub tile: Option<usize>,
    /// Allocated capacity.
    pub capacity: usize,
    /// Size that would have been needed.
    pub requested: usize,
}

impl OverflowError {
    /// How far the request exceeds the capacity.
    pub fn excess(&self) -> usize {
        self.requested.saturating_sub(self.capacity)
    }

    /// Keep whichever of two overflows is worse (larger excess, then lower
    /// tile index), so parallel reductions report a deterministic error.
    pub fn worst(self, other: Self) -> Self {
        let key = |e: &Self| (std::cmp::Reverse(e.excess()), e.tile);
        if key(&other) < key(&self) {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for OverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} overflow during {}", self.resource, self.phase)?;
        if let Some(tile) = self.tile {
            write!(f, " in tile {tile}")?;
        }
        write!(
            f,
            ": requested {}, capacity {} (excess {})",
            self.requested,
            self.capacity,
            self.excess()
        )
    }
}

impl Error for OverflowError {}

/// A particle found outside the tile that holds it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Misplaced {
    /// Tile holding the particle.
    pub tile: usize,
    /// Slot within the tile.
    pub slot: usize,
    /// The particle's position.
    pub x: f32,
}

/// Fatal errors from the tiled particle engine.
#[derive(Clone, Debug, PartialEq)]
pub enum PicError {
    /// A fixed-capacity buffer would be exceeded.
    Overflow(OverflowError),
    /// The consistency check found particles outside their owning tile.
    Misplaced {
        /// Total number of misplaced particles.
        count: usize,
        /// The first few offenders, in tile order.
        samples: SmallVec<[Misplaced; 4]>,
    },
    /// A particle moved past the neighbouring tile in a single push; the
    /// sort only relocates particles to adjacent tiles.
    TileSkip {
        /// Tile the particle started in.
        tile: usize,
        /// Slot within that tile.
        slot: usize,
        /// Position after the push.
        x: f32,
    },
}

impl fmt::Display for PicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow(e) => write!(f, "{e}"),
            Self::Misplaced { count, samples } => {
                write!(f, "{count} particle(s) outside their tile")?;
                if let Some(first) = samples.first() {
                    write!(
                        f,
                        ", first at tile {} slot {} (x = {})",
                        first.tile, first.slot, first.x
                    )?;
                }
                Ok(())
            }
            Self::TileSkip { tile, slot, x } => write!(
                f,
                "particle in tile {tile} slot {slot} moved beyond a neighbouring tile (x = {x})"
            ),
        }
    }
}

impl Error for PicError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Overflow(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OverflowError> for PicError {
    fn from(e: OverflowError) -> Self {
        Self::Overflow(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn overflow(tile: usize, capacity: usize, requested: usize) -> OverflowError {
        OverflowError {
            phase: Phase::SortCopyIn,
            resource: Resource::TileStore,
            tile: Some(tile),
            capacity,
            requested,
        }
    }

    #[test]
    fn excess_is_saturating() {
        assert_eq!(overflow(0, 10, 13).excess(), 3);
        assert_eq!(overflow(0, 10, 4).excess(), 0);
    }

    #[test]
    fn worst_prefers_larger_excess() {
        let a = overflow(3, 10, 11);
        let b = overflow(5, 10, 14);
        assert_eq!(a.worst(b), b);
        assert_eq!(b.worst(a), b);
    }

    #[test]
    fn worst_breaks_ties_by_lower_tile() {
        let a = overflow(3, 10, 12);
        let b = overflow(1, 10, 12);
        assert_eq!(a.worst(b), b);
        assert_eq!(b.worst(a), b);
    }

    #[test]
    fn display_names_phase_tile_and_excess() {
        let msg = overflow(2, 8, 11).to_string();
        assert_eq!(
            msg,
            "tile store overflow during sort copy-in in tile 2: requested 11, capacity 8 (excess 3)"
        );
    }

    #[test]
    fn display_without_tile() {
        let e = OverflowError {
            phase: Phase::Census,
            resource: Resource::Domain,
            tile: None,
            capacity: 64,
            requested: 70,
        };
        assert_eq!(
            e.to_string(),
            "domain overflow during census: requested 70, capacity 64 (excess 6)"
        );
    }

    #[test]
    fn pic_error_wraps_overflow_as_source() {
        let err: PicError = overflow(0, 1, 2).into();
        assert!(err.source().is_some());
        assert!(matches!(err, PicError::Overflow(_)));
    }

    #[test]
    fn misplaced_display_reports_first_sample() {
        let err = PicError::Misplaced {
            count: 2,
            samples: smallvec![Misplaced {
                tile: 1,
                slot: 0,
                x: 0.5
            }],
        };
        assert_eq!(
            err.to_string(),
            "2 particle(s) outside their tile, first at tile 1 slot 0 (x = 0.5)"
        );
        assert!(err.source().is_none());
    }
}
