//! Guard-cell folding and the small field-glue operations that run
//! between deposits and field solves.
//!
//! These are the sequential, grid-sized steps of a time step. They touch
//! `O(nx)` cells and never particles.

use crate::field::{Field1d, ScalarField};

/// Fold the trailing guard cells into the periodic active cells, then
/// zero the guards.
///
/// Used on accumulated quantities (charge, current, acceleration density,
/// momentum flux) after a deposit and before any field read.
pub fn add_guards<const N: usize>(field: &mut Field1d<N>) {
    let nx = field.nx();
    let (active, guards) = field.split_guard_mut();
    for (g, guard) in guards.iter_mut().enumerate() {
        let dst = &mut active[g % nx];
        for c in 0..N {
            dst[c] += guard[c];
        }
        *guard = [0.0; N];
    }
}

/// Copy the periodic active cells out into the trailing guard cells.
///
/// Used on read-side fields (electric, magnetic) before interpolation at
/// particle positions.
pub fn copy_guards<const N: usize>(field: &mut Field1d<N>) {
    let nx = field.nx();
    let (active, guards) = field.split_guard_mut();
    for (g, guard) in guards.iter_mut().enumerate() {
        *guard = active[g % nx];
    }
}

/// `dcu -= q2m0 * cus` over the active cells.
///
/// Removes the shift term the transverse solver adds back, so that the
/// iterated Darwin solve converges with the shifted operator.
pub fn subtract_scaled(dcu: &mut Field1d<2>, cus: &Field1d<2>, q2m0: f32) {
    for (d, s) in dcu.active_mut().iter_mut().zip(cus.active()) {
        d[0] -= q2m0 * s[0];
        d[1] -= q2m0 * s[1];
    }
}

/// Build the total electric field `exyze = (fxe, cus_y, cus_z)` over all
/// stored cells, guards included.
pub fn compose_electric(exyze: &mut Field1d<3>, fxe: &ScalarField, cus: &Field1d<2>) {
    for ((e, fx), s) in exyze.cells_mut().iter_mut().zip(fxe.cells()).zip(cus.cells()) {
        *e = [fx[0], s[0], s[1]];
    }
}

/// Add a uniform external value to every active cell.
pub fn add_uniform<const N: usize>(field: &mut Field1d<N>, value: [f32; N]) {
    for cell in field.active_mut() {
        for c in 0..N {
            cell[c] += value[c];
        }
    }
}

/// Maximum and minimum of `qbme * qe` over the active cells, the local
/// plasma frequency squared bounds used to pick the Darwin shift.
pub fn plasma_frequency_bounds(qe: &ScalarField, qbme: f32) -> (f32, f32) {
    qe.active().iter().fold((f32::MIN, f32::MAX), |(hi, lo), q| {
        let w = qbme * q[0];
        (hi.max(w), lo.min(w))
    })
}
