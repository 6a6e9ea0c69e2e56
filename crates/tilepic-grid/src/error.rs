//! Error types for grid and partition construction.

use std::fmt;

/// Errors arising from grid or tile-partition construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// Attempted to construct a grid with zero cells.
    EmptyGrid,
    /// Tile width `mx` was zero.
    ZeroTileWidth,
    /// `nx` is not a multiple of the tile width, which would leave an
    /// irregular last tile.
    IrregularTiles {
        /// Number of grid cells.
        nx: usize,
        /// Requested tile width.
        mx: usize,
    },
    /// The spectral solver needs a power-of-two grid.
    NotPowerOfTwo {
        /// Number of grid cells.
        nx: usize,
    },
    /// The grid exponent would overflow the cell count.
    ExponentTooLarge {
        /// The requested exponent.
        indx: u32,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid must have at least one cell"),
            Self::ZeroTileWidth => write!(f, "tile width must be at least one cell"),
            Self::IrregularTiles { nx, mx } => {
                write!(f, "grid of {nx} cells is not a multiple of tile width {mx}")
            }
            Self::NotPowerOfTwo { nx } => {
                write!(f, "grid of {nx} cells is not a power of two")
            }
            Self::ExponentTooLarge { indx } => {
                write!(f, "grid exponent {indx} is too large")
            }
        }
    }
}

impl std::error::Error for GridError {}
