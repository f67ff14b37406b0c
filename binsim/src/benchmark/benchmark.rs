use std::hint::black_box;
use std::time::Instant;

use crate::error::Result;
use crate::simulation::engine::Engine;
use crate::simulation::forces::direct_accelerations;
use crate::simulation::params::{Parameters, DEFAULT_DENSITY};
use crate::simulation::scenario::{generate_particles, Scenario};
use crate::simulation::states::System;

/// Helper to build a scenario of `n` generated particles at the default density
fn make_scenario(n: usize, engine: &Engine) -> Result<Scenario> {
    let size = Parameters::domain_size(n, DEFAULT_DENSITY);
    let particles = generate_particles(n, size, 42);
    Scenario::new(engine.clone(), Parameters::default(), System::new(particles, size))
}

/// Seconds for one all-pairs force pass over the scenario's current state
fn time_direct_forces(scenario: &Scenario) -> f64 {
    let t0 = Instant::now();
    let accels = direct_accelerations(
        black_box(&scenario.system.particles),
        black_box(&scenario.parameters),
    );
    black_box(accels);
    t0.elapsed().as_secs_f64()
}

/// Compare the binned step against the all-pairs force pass for growing N
pub fn bench_step(engine: &Engine) -> Result<()> {
    // Different system sizes to test
    let ns = [500, 1000, 2000, 4000, 8000, 16000];
    let steps = 10; // binned steps per size

    for n in ns {
        let mut scenario = make_scenario(n, engine)?;

        // Warm up
        scenario.step()?;

        // Time binned steps
        let t0 = Instant::now();
        for _ in 0..steps {
            scenario.step()?;
        }
        let binned_per_step = t0.elapsed().as_secs_f64() / steps as f64;

        // Time one all-pairs force pass on the same state
        let direct_forces = time_direct_forces(&scenario);

        println!(
            "N = {n:6}, binned step = {binned_per_step:9.6} s, direct forces = {direct_forces:9.6} s, workers = {}",
            scenario.worker_count()
        );
    }
    Ok(())
}

/// Binned step time for a range of n, as CSV
/// Paste output directly into a spreadsheet to graph
pub fn bench_step_curve(engine: &Engine) -> Result<()> {
    println!("N,binned_ms");

    for n in (1000..=50000).step_by(1000) {
        // Small n: average over more steps to smooth noise
        let steps = if n <= 10000 { 20 } else { 5 };
        let mut scenario = make_scenario(n, engine)?;

        let t0 = Instant::now();
        for _ in 0..steps {
            scenario.step()?;
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        println!("{},{:.6}", n, ms);
    }
    Ok(())
}
