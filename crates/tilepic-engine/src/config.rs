//! Run configuration, validation, and error types.
//!
//! [`SimConfig`] carries every scalar the Darwin run needs. Its
//! [`Default`] reproduces the reference electron run (512 cells, 18432
//! particles, 100 steps). [`validate()`](SimConfig::validate) checks it
//! once at startup; nothing downstream re-validates.

use std::error::Error;
use std::fmt;

use tilepic_core::PicError;
use tilepic_grid::{Grid, GridError, TilePartition};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`SimConfig`] or building a
/// [`Simulation`](crate::Simulation) from it.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Grid or tile partition construction failed.
    Grid(GridError),
    /// `npx` is zero.
    NoParticles,
    /// A parameter that must be finite and strictly positive is not.
    NotPositive {
        /// Parameter name.
        name: &'static str,
        /// The offending value.
        value: f32,
    },
    /// A parameter that must be finite is NaN or infinite.
    NotFinite {
        /// Parameter name.
        name: &'static str,
        /// The offending value.
        value: f32,
    },
    /// Slack fraction is negative, NaN, or infinite.
    InvalidSlack {
        /// The offending value.
        value: f32,
    },
    /// An explicit thread count of zero.
    ZeroThreads,
    /// The worker pool could not be built.
    ThreadPool {
        /// Description from the pool builder.
        reason: String,
    },
    /// The initial particles could not be placed into tiles.
    Placement(PicError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::NoParticles => write!(f, "npx must be at least 1"),
            Self::NotPositive { name, value } => {
                write!(f, "{name} must be finite and positive, got {value}")
            }
            Self::NotFinite { name, value } => write!(f, "{name} must be finite, got {value}"),
            Self::InvalidSlack { value } => {
                write!(f, "slack must be finite and non-negative, got {value}")
            }
            Self::ZeroThreads => write!(f, "thread count must be at least 1"),
            Self::ThreadPool { reason } => write!(f, "worker pool: {reason}"),
            Self::Placement(e) => write!(f, "initial placement: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Placement(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for ConfigError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<PicError> for ConfigError {
    fn from(e: PicError) -> Self {
        Self::Placement(e)
    }
}

// ── SimConfig ──────────────────────────────────────────────────────

/// Complete configuration for a Darwin electron run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Grid exponent: `nx = 2^indx`. Default: 9.
    pub indx: u32,
    /// Number of electrons. Default: 18432.
    pub npx: usize,
    /// Simulation end time, in units of `1/ωp`. Default: 10.
    pub tend: f32,
    /// Time step. Default: 0.1.
    pub dt: f32,
    /// Electron charge and charge-to-mass ratio. Default: -1.
    pub qme: f32,
    /// Thermal velocity along `x`. Default: 1.
    pub vtx: f32,
    /// Thermal velocity along `y`. Default: 1.
    pub vty: f32,
    /// Thermal velocity along `z`. Default: 1.
    pub vtz: f32,
    /// Drift velocity along `x`. Default: 0.
    pub vx0: f32,
    /// Drift velocity along `y`. Default: 0.
    pub vy0: f32,
    /// Drift velocity along `z`. Default: 0.
    pub vz0: f32,
    /// Smoothed particle size. Default: 0.912871.
    pub ax: f32,
    /// Reciprocal of the speed of light. Default: 0.1.
    pub ci: f32,
    /// External magnetic field along `x`. Default: 0.4.
    pub omx: f32,
    /// External magnetic field along `y`. Default: 0.
    pub omy: f32,
    /// External magnetic field along `z`. Default: 0.
    pub omz: f32,
    /// Number of inner corrections of the Darwin fields per step. Default: 1.
    pub ndc: usize,
    /// Tile width in cells. Default: 32.
    pub mx: usize,
    /// Extra per-tile capacity as a fraction of the census maximum. Default: 0.2.
    pub slack: f32,
    /// Seed of the initial velocity sampler. Default: 42.
    pub seed: u64,
    /// Worker threads. `None` = rayon's default (one per core).
    pub threads: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            indx: 9,
            npx: 18432,
            tend: 10.0,
            dt: 0.1,
            qme: -1.0,
            vtx: 1.0,
            vty: 1.0,
            vtz: 1.0,
            vx0: 0.0,
            vy0: 0.0,
            vz0: 0.0,
            ax: 0.912871,
            ci: 0.1,
            omx: 0.4,
            omy: 0.0,
            omz: 0.0,
            ndc: 1,
            mx: 32,
            slack: 0.2,
            seed: 42,
            threads: None,
        }
    }
}

impl SimConfig {
    /// Validate every structural and numeric invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Grid must be a power of two the tiles divide evenly.
        let _ = self.partition()?;
        // 2. At least one particle.
        if self.npx == 0 {
            return Err(ConfigError::NoParticles);
        }
        // 3. Time step, end time, and the scales of the field solve.
        for (name, value) in [
            ("dt", self.dt),
            ("tend", self.tend),
            ("ci", self.ci),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        // 4. Everything else must at least be a number.
        for (name, value) in [
            ("qme", self.qme),
            ("vtx", self.vtx),
            ("vty", self.vty),
            ("vtz", self.vtz),
            ("vx0", self.vx0),
            ("vy0", self.vy0),
            ("vz0", self.vz0),
            ("ax", self.ax),
            ("omx", self.omx),
            ("omy", self.omy),
            ("omz", self.omz),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        // 5. Slack.
        if !self.slack.is_finite() || self.slack < 0.0 {
            return Err(ConfigError::InvalidSlack { value: self.slack });
        }
        // 6. Explicit thread count.
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }

    /// The grid of `2^indx` cells.
    pub fn grid(&self) -> Result<Grid, ConfigError> {
        Ok(Grid::from_exponent(self.indx)?)
    }

    /// The grid and its split into tiles of `mx` cells.
    pub fn partition(&self) -> Result<(Grid, TilePartition), ConfigError> {
        let grid = self.grid()?;
        let partition = TilePartition::new(&grid, self.mx)?;
        Ok((grid, partition))
    }

    /// Number of grid cells.
    ///
    /// Saturates instead of overflowing for exponents `validate` rejects.
    pub fn nx(&self) -> usize {
        1usize.checked_shl(self.indx).unwrap_or(usize::MAX)
    }

    /// Number of time steps, `⌊tend/dt + 1e-4⌋`.
    pub fn nloop(&self) -> usize {
        (f64::from(self.tend / self.dt) + 1e-4).floor() as usize
    }

    /// Particle normalization `nx/np`: the grid charge of one particle.
    pub fn affp(&self) -> f32 {
        self.nx() as f32 / self.npx as f32
    }

    /// Thermal velocities `(vtx, vty, vtz)`.
    pub fn thermal(&self) -> [f32; 3] {
        [self.vtx, self.vty, self.vtz]
    }

    /// Drift velocities `(vx0, vy0, vz0)`.
    pub fn drift(&self) -> [f32; 3] {
        [self.vx0, self.vy0, self.vz0]
    }
}
