//! Whole-run behaviour of the Darwin driver.

use proptest::prelude::*;
use tilepic_engine::{SimConfig, Simulation, Stage};
use tilepic_tiles::check;

fn small(threads: usize) -> SimConfig {
    SimConfig {
        indx: 7,
        npx: 2048,
        mx: 16,
        tend: 2.0,
        threads: Some(threads),
        ..SimConfig::default()
    }
}

#[test]
fn every_step_conserves_and_places_particles() {
    let mut sim = Simulation::new(small(2)).unwrap();
    assert_eq!(sim.nloop(), 20);
    let mut moved = 0;
    while sim.steps_taken() < sim.nloop() {
        let report = sim.step().unwrap();
        moved += report.moved;
        let store = sim.state().store();
        assert_eq!(store.total(), 2048, "step {}", report.step);
        check(store).unwrap();
    }
    assert!(moved > 0, "thermal particles should cross tiles");
}

#[test]
fn results_do_not_depend_on_thread_count() {
    let mut one = Simulation::new(small(1)).unwrap();
    let mut four = Simulation::new(small(4)).unwrap();
    let a = one.run().unwrap();
    let b = four.run().unwrap();
    assert_eq!(a, b);
    assert_eq!(one.state().store().to_vec(), four.state().store().to_vec());
    assert_eq!(one.state().fields().exyze, four.state().fields().exyze);
}

#[test]
fn run_stops_at_nloop() {
    let mut sim = Simulation::new(small(2)).unwrap();
    sim.step().unwrap();
    let rest = sim.run().unwrap();
    assert_eq!(rest.len(), 19);
    assert_eq!(rest.first().map(|r| r.step), Some(1));
    assert!(sim.run().unwrap().is_empty());
}

#[test]
fn total_energy_is_nearly_conserved() {
    let mut sim = Simulation::new(small(2)).unwrap();
    let reports = sim.run().unwrap();
    let first = reports.first().unwrap().energies.total();
    let last = reports.last().unwrap().energies.total();
    assert!(first > 0.0);
    assert!(
        ((last - first) / first).abs() < 0.05,
        "energy drifted from {first} to {last}"
    );
}

#[test]
fn neutral_particles_stream_freely() {
    let config = SimConfig {
        qme: 0.0,
        omx: 0.0,
        ..small(2)
    };
    let mut sim = Simulation::new(config).unwrap();
    let before = sim.state().store().to_vec();
    let reports = sim.run().unwrap();
    for r in &reports {
        assert_eq!(r.energies.we, 0.0);
        assert_eq!(r.energies.wm, 0.0);
    }
    let mut vb: Vec<[f32; 3]> = before.iter().map(|p| [p.vx, p.vy, p.vz]).collect();
    let mut va: Vec<[f32; 3]> = sim
        .state()
        .store()
        .iter()
        .map(|p| [p.vx, p.vy, p.vz])
        .collect();
    vb.sort_by(|x, y| x.partial_cmp(y).unwrap());
    va.sort_by(|x, y| x.partial_cmp(y).unwrap());
    assert_eq!(va, vb);
}

#[test]
fn timings_cover_every_stage() {
    let mut sim = Simulation::new(small(2)).unwrap();
    sim.run().unwrap();
    let t = sim.timings();
    assert!(t.get(Stage::Push) > std::time::Duration::ZERO);
    assert_eq!(t.total(), t.total_particle() + t.solver_total());
    let cost = t.per_particle_ns(sim.steps_taken(), 2048);
    assert!(cost.total_ns >= cost.push_ns);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_seed_keeps_count(seed in any::<u64>(), drift in -0.5f32..0.5) {
        let config = SimConfig {
            seed,
            vx0: drift,
            tend: 0.5,
            ..small(2)
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.run().unwrap();
        prop_assert_eq!(sim.state().store().total(), 2048);
        prop_assert!(check(sim.state().store()).is_ok());
    }
}
