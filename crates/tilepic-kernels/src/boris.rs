//! The Boris velocity update shared by the pusher and the derivative
//! deposits.

use tilepic_core::Particle;
use tilepic_grid::Field1d;

/// Scalar parameters of a push.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PushParams {
    /// Charge-to-mass ratio.
    pub qbm: f32,
    /// Time step for the velocity update.
    pub dt: f32,
    /// Time step for the position update.
    pub dtc: f32,
    /// Constant magnetic field along `x`.
    pub omx: f32,
}

impl PushParams {
    /// Parameters with `dtc == dt`.
    pub fn new(qbm: f32, dt: f32, omx: f32) -> Self {
        Self {
            qbm,
            dt,
            dtc: dt,
            omx,
        }
    }

    /// Half impulse `qbm·dt/2`.
    pub fn qtmh(&self) -> f32 {
        0.5 * self.qbm * self.dt
    }
}

/// Read-side fields interpolated at particle positions.
///
/// Guard cells of both fields must be current.
#[derive(Clone, Copy, Debug)]
pub struct PushFields<'a> {
    /// Total electric field `(ex, ey, ez)`.
    pub exyze: &'a Field1d<3>,
    /// Transverse magnetic field `(by, bz)`.
    pub byze: &'a Field1d<2>,
}

impl<'a> PushFields<'a> {
    /// Bundle the electric and magnetic fields.
    pub fn new(exyze: &'a Field1d<3>, byze: &'a Field1d<2>) -> Self {
        Self { exyze, byze }
    }

    /// Linearly interpolated `E` and `(by, bz)` at `x`.
    #[inline]
    pub fn sample(&self, x: f32) -> ([f32; 3], [f32; 2]) {
        let n = x as usize;
        let dxp = x - n as f32;
        (self.exyze.interpolate(n, dxp), self.byze.interpolate(n, dxp))
    }
}

/// Outcome of one Boris velocity update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kick {
    /// Velocity after the update.
    pub velocity: [f32; 3],
    /// `|v + qtmh·E|²`, the time-centred kinetic energy term.
    pub energy: f32,
}

/// Precomputed Boris rotation for fixed push parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorisKick {
    qtmh: f32,
    omx: f32,
}

impl BorisKick {
    /// Prepare the update for `params`.
    pub fn new(params: &PushParams) -> Self {
        Self {
            qtmh: params.qtmh(),
            omx: params.omx,
        }
    }

    /// Half electric impulse, magnetic rotation, half electric impulse.
    #[inline]
    pub fn apply(&self, p: &Particle, e: [f32; 3], b: [f32; 2]) -> Kick {
        let qtmh = self.qtmh;
        let dx = qtmh * e[0];
        let dy = qtmh * e[1];
        let dz = qtmh * e[2];
        let acx = p.vx + dx;
        let acy = p.vy + dy;
        let acz = p.vz + dz;
        let energy = acx * acx + acy * acy + acz * acz;

        let omxt = qtmh * self.omx;
        let omyt = qtmh * b[0];
        let omzt = qtmh * b[1];
        let omt = omxt * omxt + omyt * omyt + omzt * omzt;
        let anorm = 2.0 / (1.0 + omt);
        let omt = 0.5 * (1.0 - omt);
        let rot4 = omxt * omyt;
        let rot7 = omxt * omzt;
        let rot8 = omyt * omzt;
        let rot1 = omt + omxt * omxt;
        let rot5 = omt + omyt * omyt;
        let rot9 = omt + omzt * omzt;
        let rot2 = omzt + rot4;
        let rot4 = rot4 - omzt;
        let rot3 = -omyt + rot7;
        let rot7 = rot7 + omyt;
        let rot6 = omxt + rot8;
        let rot8 = rot8 - omxt;

        Kick {
            velocity: [
                (rot1 * acx + rot2 * acy + rot3 * acz) * anorm + dx,
                (rot4 * acx + rot5 * acy + rot6 * acz) * anorm + dy,
                (rot7 * acx + rot8 * acy + rot9 * acz) * anorm + dz,
            ],
            energy,
        }
    }

    /// Sample `fields` at the particle and apply the update.
    #[inline]
    pub fn at(&self, p: &Particle, fields: &PushFields<'_>) -> Kick {
        let (e, b) = fields.sample(p.x);
        self.apply(p, e, b)
    }
}
