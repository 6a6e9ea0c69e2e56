//! Darwin electron run with the reference parameters.
//!
//! Demonstrates:
//!   1. Building a SimConfig (defaults: 512 cells, 18432 electrons, 100 steps)
//!   2. Constructing a Simulation and running it to completion
//!   3. Reading initial/final energies and the per-phase timing report
//!
//! Run with:
//!   cargo run --release --example darwin1 [threads]

use std::time::Duration;

use tilepic_engine::{Energies, SimConfig, Simulation, Stage};

fn print_energies(label: &str, e: &Energies) {
    println!("{label} Total Field, Kinetic and Total Energies:");
    println!("{:e} {:e} {:e}", e.field_total(), e.wke, e.total());
    println!("{label} Electrostatic, Transverse Electric and Magnetic Field Energies:");
    println!("{:e} {:e} {:e}", e.we, e.wf, e.wm);
}

fn secs(d: Duration) -> f64 {
    d.as_secs_f64()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let threads = std::env::args().nth(1).map(|s| s.parse()).transpose()?;
    let config = SimConfig {
        threads,
        ..SimConfig::default()
    };

    println!("=== tilepic darwin1 ===\n");
    let mut sim = Simulation::new(config)?;
    let layout = *sim.state().store().layout();
    println!(
        "nx = {}, np = {}, tiles = {}, threads = {}",
        sim.grid().nx(),
        sim.config().npx,
        sim.state().store().tiles(),
        sim.threads()
    );
    println!(
        "nppmx = {}, nppmx0 = {}, ntmax = {}, npbmx = {}",
        layout.nppmx, layout.nppmx0, layout.ntmax, layout.npbmx
    );
    println!("wpm = {}\n", sim.wpm());

    let reports = sim.run()?;
    if let Some(first) = reports.first() {
        print_energies("Initial", &first.energies);
    }
    println!("\nntime, ndc = {},{}", sim.steps_taken(), sim.config().ndc);
    print_energies("Final", &sim.energies());

    let t = sim.timings();
    println!();
    for stage in Stage::ALL {
        println!("{stage} time = {:.6}", secs(t.get(stage)));
    }
    println!("total deposit time = {:.6}", secs(t.deposit_total()));
    println!("total solver time = {:.6}", secs(t.solver_total()));
    println!("total particle time = {:.6}", secs(t.total_particle()));
    println!("total time = {:.6}", secs(t.total()));

    let cost = t.per_particle_ns(sim.steps_taken(), sim.config().npx);
    println!();
    println!("Push Time (nsec) = {:.6}", cost.push_ns);
    println!("Deposit Time (nsec) = {:.6}", cost.deposit_ns);
    println!("Sort Time (nsec) = {:.6}", cost.sort_ns);
    println!("Total Particle Time (nsec) = {:.6}", cost.total_ns);
    Ok(())
}
