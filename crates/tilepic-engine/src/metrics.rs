//! Energy diagnostics and per-phase wall-clock timing.
//!
//! [`Energies`] is reported after every step. [`PhaseTimings`]
//! accumulates over the whole run and reproduces the usual PIC cost
//! report: time per phase, total particle time, and nanoseconds per
//! particle per step.

use std::fmt;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

/// Field and kinetic energies of one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Energies {
    /// Electrostatic (longitudinal) field energy.
    pub we: f64,
    /// Transverse electric field energy.
    pub wf: f64,
    /// Magnetic field energy.
    pub wm: f64,
    /// Time-centred kinetic energy.
    pub wke: f64,
}

impl Energies {
    /// Total field energy `we + wm`.
    ///
    /// The transverse electric energy is a Darwin correction and is
    /// reported separately.
    pub fn field_total(&self) -> f64 {
        self.we + self.wm
    }

    /// Field plus kinetic energy.
    pub fn total(&self) -> f64 {
        self.field_total() + self.wke
    }
}

/// A timed phase of the time step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Charge deposit.
    ChargeDeposit,
    /// Current deposit.
    CurrentDeposit,
    /// Acceleration-density and momentum-flux deposits.
    DerivativeDeposit,
    /// Guard-cell folding and copying.
    Guard,
    /// Spectral solves and field composition.
    FieldSolve,
    /// Boris push with departure detection.
    Push,
    /// Tile reorder.
    Sort,
}

impl Stage {
    /// All stages in report order.
    pub const ALL: [Stage; 7] = [
        Stage::ChargeDeposit,
        Stage::CurrentDeposit,
        Stage::DerivativeDeposit,
        Stage::Guard,
        Stage::FieldSolve,
        Stage::Push,
        Stage::Sort,
    ];

    /// Whether the stage iterates over particles.
    pub fn is_particle(self) -> bool {
        !matches!(self, Stage::Guard | Stage::FieldSolve)
    }

    /// Whether the stage is one of the deposits.
    pub fn is_deposit(self) -> bool {
        matches!(
            self,
            Stage::ChargeDeposit | Stage::CurrentDeposit | Stage::DerivativeDeposit
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChargeDeposit => write!(f, "deposit"),
            Self::CurrentDeposit => write!(f, "current deposit"),
            Self::DerivativeDeposit => write!(f, "current derivative deposit"),
            Self::Guard => write!(f, "guard"),
            Self::FieldSolve => write!(f, "solver"),
            Self::Push => write!(f, "push"),
            Self::Sort => write!(f, "sort"),
        }
    }
}

/// Cost per particle per step, in nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleCost {
    /// Push.
    pub push_ns: f64,
    /// All deposits.
    pub deposit_ns: f64,
    /// Reorder.
    pub sort_ns: f64,
    /// Push, deposits, and reorder together.
    pub total_ns: f64,
}

/// Wall-clock time accumulated per [`Stage`].
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseTimings {
    stages: IndexMap<Stage, Duration>,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            stages: Stage::ALL.iter().map(|&s| (s, Duration::ZERO)).collect(),
        }
    }
}

impl PhaseTimings {
    /// Add `elapsed` to `stage`.
    pub fn add(&mut self, stage: Stage, elapsed: Duration) {
        *self.stages.entry(stage).or_default() += elapsed;
    }

    /// Run `f` and charge its wall-clock time to `stage`.
    pub fn time<R>(&mut self, stage: Stage, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.add(stage, start.elapsed());
        out
    }

    /// Time accumulated in `stage`.
    pub fn get(&self, stage: Stage) -> Duration {
        self.stages.get(&stage).copied().unwrap_or_default()
    }

    /// Every stage with its time, in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, Duration)> + '_ {
        self.stages.iter().map(|(&s, &d)| (s, d))
    }

    /// All deposits together.
    pub fn deposit_total(&self) -> Duration {
        self.sum(Stage::is_deposit)
    }

    /// Guard handling plus field solves.
    pub fn solver_total(&self) -> Duration {
        self.sum(|s| !s.is_particle())
    }

    /// Deposits, push, and reorder together.
    pub fn total_particle(&self) -> Duration {
        self.sum(Stage::is_particle)
    }

    /// Everything.
    pub fn total(&self) -> Duration {
        self.sum(|_| true)
    }

    /// Particle-phase cost per particle per step over `steps` steps of
    /// `particles` particles. All zero when either count is zero.
    pub fn per_particle_ns(&self, steps: usize, particles: usize) -> ParticleCost {
        let work = steps as f64 * particles as f64;
        if work == 0.0 {
            return ParticleCost::default();
        }
        let ns = |d: Duration| d.as_secs_f64() * 1.0e9 / work;
        ParticleCost {
            push_ns: ns(self.get(Stage::Push)),
            deposit_ns: ns(self.deposit_total()),
            sort_ns: ns(self.get(Stage::Sort)),
            total_ns: ns(self.total_particle()),
        }
    }

    fn sum(&self, keep: impl Fn(Stage) -> bool) -> Duration {
        self.stages
            .iter()
            .filter(|&(&s, _)| keep(s))
            .map(|(_, &d)| d)
            .sum()
    }
}

/// What one [`step`](crate::Simulation::step) reports.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Index of the step just completed, from 0.
    pub step: usize,
    /// Energies of the step.
    pub energies: Energies,
    /// Particles that changed tile during the step.
    pub moved: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn energy_totals_exclude_transverse_electric() {
        let e = Energies {
            we: 1.0,
            wf: 10.0,
            wm: 2.0,
            wke: 4.0,
        };
        assert_eq!(e.field_total(), 3.0);
        assert_eq!(e.total(), 7.0);
    }

    #[test]
    fn stages_start_at_zero_in_report_order() {
        let t = PhaseTimings::default();
        let order: Vec<Stage> = t.iter().map(|(s, _)| s).collect();
        assert_eq!(order, Stage::ALL);
        assert_eq!(t.total(), Duration::ZERO);
    }

    #[test]
    fn totals_group_stages() {
        let mut t = PhaseTimings::default();
        t.add(Stage::ChargeDeposit, ms(1));
        t.add(Stage::CurrentDeposit, ms(2));
        t.add(Stage::DerivativeDeposit, ms(3));
        t.add(Stage::Guard, ms(4));
        t.add(Stage::FieldSolve, ms(5));
        t.add(Stage::Push, ms(6));
        t.add(Stage::Sort, ms(7));
        t.add(Stage::Push, ms(10));
        assert_eq!(t.get(Stage::Push), ms(16));
        assert_eq!(t.deposit_total(), ms(6));
        assert_eq!(t.solver_total(), ms(9));
        assert_eq!(t.total_particle(), ms(29));
        assert_eq!(t.total(), ms(38));
    }

    #[test]
    fn per_particle_cost() {
        let mut t = PhaseTimings::default();
        t.add(Stage::Push, ms(10));
        t.add(Stage::Sort, ms(5));
        let c = t.per_particle_ns(100, 1000);
        assert!((c.push_ns - 100.0).abs() < 1e-9);
        assert!((c.sort_ns - 50.0).abs() < 1e-9);
        assert_eq!(c.deposit_ns, 0.0);
        assert!((c.total_ns - 150.0).abs() < 1e-9);
        assert_eq!(t.per_particle_ns(0, 1000), ParticleCost::default());
    }

    #[test]
    fn time_charges_the_stage() {
        let mut t = PhaseTimings::default();
        let v = t.time(Stage::Guard, || 41 + 1);
        assert_eq!(v, 42);
        assert_eq!(t.get(Stage::Push), Duration::ZERO);
    }
}
