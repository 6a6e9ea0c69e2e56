//! Capacities of the per-tile buffers, fixed once after the census.

/// Per-tile capacities derived from the census maximum and the slack
/// fraction.
///
/// | field | meaning |
/// |---|---|
/// | `nppmx` | largest tile occupancy at census time |
/// | `nppmx0` | tile store capacity, `⌈(1 + slack)·nppmx⌉` |
/// | `ntmax` | departure records per tile, `⌈slack·nppmx⌉` |
/// | `npbmx` | transfer-buffer slots per tile, `⌈slack·nppmx⌉` |
///
/// # Examples
///
/// ```
/// use tilepic_tiles::StoreLayout;
///
/// let layout = StoreLayout::from_census(1152, 0.2);
/// assert_eq!(layout.nppmx0, 1383);
/// assert_eq!(layout.ntmax, 231);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoreLayout {
    /// Maximum tile occupancy seen by the census.
    pub nppmx: usize,
    /// Slack fraction the capacities were derived with.
    pub slack: f32,
    /// Tile store capacity.
    pub nppmx0: usize,
    /// Departure-record capacity per tile.
    pub ntmax: usize,
    /// Transfer-buffer capacity per tile.
    pub npbmx: usize,
}

impl StoreLayout {
    /// Derive capacities from the census maximum `nppmx`.
    ///
    /// `slack` must be finite and non-negative; the engine validates this
    /// at configuration time.
    pub fn from_census(nppmx: usize, slack: f32) -> Self {
        let slack_slots = scaled_ceil(nppmx, f64::from(slack));
        Self {
            nppmx,
            slack,
            nppmx0: scaled_ceil(nppmx, 1.0 + f64::from(slack)),
            ntmax: slack_slots,
            npbmx: slack_slots,
        }
    }

    /// A layout with explicit capacities, bypassing the census.
    pub fn with_capacities(nppmx0: usize, ntmax: usize, npbmx: usize) -> Self {
        Self {
            nppmx: nppmx0,
            slack: 0.0,
            nppmx0,
            ntmax,
            npbmx,
        }
    }
}

/// `⌈n·factor⌉`, treating products within rounding error of an integer as
/// that integer so `f32` slack values like `0.2` do not add a slot.
fn scaled_ceil(n: usize, factor: f64) -> usize {
    let v = n as f64 * factor;
    let r = v.round();
    if (v - r).abs() <= 1e-6 * v.max(1.0) {
        r as usize
    } else {
        v.ceil() as usize
    }
}
