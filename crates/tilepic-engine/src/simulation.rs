//! The Darwin time-step driver.

use std::fmt;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, info, info_span};

use tilepic_core::PicError;
use tilepic_field::{DarwinSolver, FieldSolver};
use tilepic_grid::guard::{
    add_guards, add_uniform, compose_electric, copy_guards, plasma_frequency_bounds,
    subtract_scaled,
};
use tilepic_grid::{Grid, TilePartition};
use tilepic_kernels::{
    deposit, push, Acceleration, Charge, Current, CurrentAcceleration, DarwinCurrentMoments,
    DarwinMoments, PushFields, PushParams,
};
use tilepic_tiles::{census, check, distribute, reorder};

use crate::config::{ConfigError, SimConfig};
use crate::metrics::{Energies, PhaseTimings, Stage, StepReport};
use crate::sampler::Maxwellian;
use crate::state::SimulationState;

// ── StepError ──────────────────────────────────────────────────────

/// Error returned from [`Simulation::step()`].
///
/// Every engine error is fatal: once a step fails, the simulation keeps
/// returning the same error.
#[derive(Clone, Debug, PartialEq)]
pub struct StepError {
    /// Index of the failed step, from 0.
    pub step: usize,
    /// The underlying engine error.
    pub source: PicError,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}: {}", self.step, self.source)
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

// ── Driver ─────────────────────────────────────────────────────────

/// Everything a step touches, apart from the worker pool it runs on.
struct Driver {
    config: SimConfig,
    grid: Grid,
    solver: DarwinSolver,
    params: PushParams,
    q2m0: f32,
    state: SimulationState,
    timings: PhaseTimings,
}

impl Driver {
    /// One full Darwin step: deposits, field solves with `ndc`
    /// corrections, push, and reorder.
    fn advance(&mut self, step: usize) -> Result<(Energies, usize), PicError> {
        let _span = info_span!("step", step).entered();
        let Self {
            config,
            grid,
            solver,
            params,
            q2m0,
            state,
            timings,
        } = self;
        let SimulationState {
            store,
            departures,
            buffer,
            fields: f,
            scratch,
        } = state;
        let qme = config.qme;
        let q2m0 = *q2m0;
        let params = &*params;
        let external = [config.omy, config.omz];
        let mut energies = Energies::default();

        // 1. Current and charge.
        timings.time(Stage::CurrentDeposit, || {
            f.cue.zero();
            deposit(store, &Current, qme, &mut scratch.current, &mut f.cue);
        });
        timings.time(Stage::ChargeDeposit, || {
            f.qe.zero();
            deposit(store, &Charge, qme, &mut scratch.charge, &mut f.qe);
        });
        timings.time(Stage::Guard, || {
            add_guards(&mut f.qe);
            add_guards(&mut f.cue);
        });

        // 2. Longitudinal and magnetic fields.
        timings.time(Stage::FieldSolve, || {
            energies.we = solver.longitudinal(&f.qe, &mut f.fxe);
            energies.wm = solver.magnetic(&f.cue, &mut f.byze);
            add_uniform(&mut f.byze, external);
        });
        timings.time(Stage::Guard, || {
            copy_guards(&mut f.fxe);
            copy_guards(&mut f.byze);
        });

        // 3. Electric field with last step's transverse part.
        timings.time(Stage::FieldSolve, || {
            compose_electric(&mut f.exyze, &f.fxe, &f.cus)
        });

        // 4. Transverse electric field.
        timings.time(Stage::DerivativeDeposit, || {
            f.dcu.zero();
            f.amu.zero();
            let moments = Acceleration::new(PushFields::new(&f.exyze, &f.byze), params);
            let mut target = DarwinMoments {
                dcu: &mut f.dcu,
                amu: &mut f.amu,
            };
            deposit(store, &moments, qme, &mut scratch.moments, &mut target);
            subtract_scaled(&mut f.dcu, &f.cus, q2m0);
        });
        timings.time(Stage::Guard, || {
            add_guards(&mut f.dcu);
            add_guards(&mut f.amu);
        });
        timings.time(Stage::FieldSolve, || {
            energies.wf = solver.transverse(&f.dcu, &f.amu, &mut f.cus);
        });
        timings.time(Stage::Guard, || copy_guards(&mut f.cus));
        timings.time(Stage::FieldSolve, || {
            compose_electric(&mut f.exyze, &f.fxe, &f.cus)
        });

        // 5. Darwin corrections.
        for _ in 0..config.ndc {
            timings.time(Stage::DerivativeDeposit, || {
                f.cue.zero();
                f.dcu.zero();
                f.amu.zero();
                let moments = CurrentAcceleration(Acceleration::new(
                    PushFields::new(&f.exyze, &f.byze),
                    params,
                ));
                let mut target = DarwinCurrentMoments {
                    cue: &mut f.cue,
                    dcu: &mut f.dcu,
                    amu: &mut f.amu,
                };
                deposit(store, &moments, qme, &mut scratch.current_moments, &mut target);
                subtract_scaled(&mut f.dcu, &f.cus, q2m0);
            });
            timings.time(Stage::Guard, || {
                add_guards(&mut f.cue);
                add_guards(&mut f.dcu);
                add_guards(&mut f.amu);
            });
            timings.time(Stage::FieldSolve, || {
                energies.wm = solver.magnetic(&f.cue, &mut f.byze);
                add_uniform(&mut f.byze, external);
                energies.wf = solver.transverse(&f.dcu, &f.amu, &mut f.cus);
            });
            timings.time(Stage::Guard, || {
                copy_guards(&mut f.byze);
                copy_guards(&mut f.cus);
            });
            timings.time(Stage::FieldSolve, || {
                compose_electric(&mut f.exyze, &f.fxe, &f.cus)
            });
        }

        // 6. Push.
        let pushed = timings.time(Stage::Push, || {
            push(
                store,
                departures,
                grid,
                &PushFields::new(&f.exyze, &f.byze),
                params,
            )
        })?;
        energies.wke = pushed.wke;

        // 7. Reorder.
        let sorted = timings.time(Stage::Sort, || reorder(store, departures, buffer))?;
        Ok((energies, sorted.moved))
    }
}

/// Sample, bucket, and distribute the initial particles, then deposit
/// the initial charge to size the Darwin shift `wpm`.
fn load(
    config: &SimConfig,
    grid: &Grid,
    partition: &TilePartition,
) -> Result<(SimulationState, f32), ConfigError> {
    let particles = Maxwellian::from_config(config).sample(grid, config.npx);
    let layout = census(&particles, partition)
        .map_err(PicError::from)?
        .layout(config.slack);
    let store = distribute(&particles, partition, &layout).map_err(PicError::from)?;
    check(&store)?;

    let mut state = SimulationState::new(grid, store);
    let f = &mut state.fields;
    deposit(
        &state.store,
        &Charge,
        config.qme,
        &mut state.scratch.charge,
        &mut f.qe,
    );
    add_guards(&mut f.qe);
    let (wpmax, wpmin) = plasma_frequency_bounds(&f.qe, config.qme);
    let mut wpm = 0.5 * (wpmax + wpmin) * config.affp();
    if wpm <= 10.0 {
        wpm *= 0.75;
    }
    Ok((state, wpm))
}

// ── Simulation ─────────────────────────────────────────────────────

/// A Darwin electron run on its own worker pool.
///
/// Construction samples and distributes the particles; each
/// [`step()`](Self::step) then advances particles and fields by `dt`.
///
/// # Examples
///
/// ```no_run
/// use tilepic_engine::{SimConfig, Simulation};
///
/// let mut sim = Simulation::new(SimConfig::default()).unwrap();
/// let reports = sim.run().unwrap();
/// println!("final energy {}", reports.last().unwrap().energies.total());
/// ```
pub struct Simulation {
    pool: ThreadPool,
    driver: Driver,
    wpm: f32,
    step: usize,
    nloop: usize,
    energies: Energies,
    failed: Option<StepError>,
}

impl Simulation {
    /// Validate `config`, build the worker pool, and load the particles.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (grid, partition) = config.partition()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.unwrap_or(0))
            .thread_name(|i| format!("tilepic-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool {
                reason: e.to_string(),
            })?;

        let affp = config.affp();
        let mut solver = DarwinSolver::new(&grid, config.ax, affp, config.ci)?;
        let (state, wpm) = pool.install(|| load(&config, &grid, &partition))?;
        solver.set_shift(wpm);
        let q2m0 = wpm / affp;

        let layout = *state.store().layout();
        info!(
            nx = grid.nx(),
            np = config.npx,
            tiles = partition.count(),
            threads = pool.current_num_threads(),
            nppmx = layout.nppmx,
            nppmx0 = layout.nppmx0,
            ntmax = layout.ntmax,
            npbmx = layout.npbmx,
            wpm,
            "simulation ready"
        );

        let nloop = config.nloop();
        let params = PushParams::new(config.qme, config.dt, config.omx);
        Ok(Self {
            pool,
            driver: Driver {
                config,
                grid,
                solver,
                params,
                q2m0,
                state,
                timings: PhaseTimings::default(),
            },
            wpm,
            step: 0,
            nloop,
            energies: Energies::default(),
            failed: None,
        })
    }

    /// Advance one time step.
    pub fn step(&mut self) -> Result<StepReport, StepError> {
        if let Some(e) = &self.failed {
            return Err(e.clone());
        }
        let step = self.step;
        let driver = &mut self.driver;
        let (energies, moved) = self
            .pool
            .install(|| driver.advance(step))
            .map_err(|source| {
                error!(step, %source, "step failed");
                let e = StepError { step, source };
                self.failed = Some(e.clone());
                e
            })?;

        if step == 0 {
            info!(
                field = energies.field_total(),
                kinetic = energies.wke,
                total = energies.total(),
                we = energies.we,
                wf = energies.wf,
                wm = energies.wm,
                "initial energies"
            );
        }
        debug!(
            step,
            we = energies.we,
            wf = energies.wf,
            wm = energies.wm,
            wke = energies.wke,
            moved,
            "step complete"
        );
        self.step += 1;
        self.energies = energies;
        Ok(StepReport {
            step,
            energies,
            moved,
        })
    }

    /// Run the remaining steps up to [`nloop()`](Self::nloop), stopping at
    /// the first error. Returns the report of every step taken.
    pub fn run(&mut self) -> Result<Vec<StepReport>, StepError> {
        let mut reports = Vec::with_capacity(self.nloop.saturating_sub(self.step));
        while self.step < self.nloop {
            reports.push(self.step()?);
        }
        let e = self.energies;
        info!(
            steps = self.step,
            ndc = self.driver.config.ndc,
            field = e.field_total(),
            kinetic = e.wke,
            total = e.total(),
            we = e.we,
            wf = e.wf,
            wm = e.wm,
            "final energies"
        );
        Ok(reports)
    }

    /// The configuration the run was built from.
    pub fn config(&self) -> &SimConfig {
        &self.driver.config
    }

    /// The grid.
    pub fn grid(&self) -> &Grid {
        &self.driver.grid
    }

    /// Particles, fields, and sort buffers.
    pub fn state(&self) -> &SimulationState {
        &self.driver.state
    }

    /// Steps completed so far.
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    /// Total number of steps [`run()`](Self::run) advances to.
    pub fn nloop(&self) -> usize {
        self.nloop
    }

    /// Energies of the last completed step.
    pub fn energies(&self) -> Energies {
        self.energies
    }

    /// Time accumulated per phase so far.
    pub fn timings(&self) -> &PhaseTimings {
        &self.driver.timings
    }

    /// Plasma-frequency shift of the transverse solve.
    pub fn wpm(&self) -> f32 {
        self.wpm
    }

    /// `wpm/affp`, the scale of the field subtracted from the
    /// acceleration density.
    pub fn q2m0(&self) -> f32 {
        self.driver.q2m0
    }

    /// Number of worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("step", &self.step)
            .field("nloop", &self.nloop)
            .field("wpm", &self.wpm)
            .field("threads", &self.threads())
            .field("particles", &self.state().store().total())
            .finish_non_exhaustive()
    }
}
