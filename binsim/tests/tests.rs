use binsim::simulation::integrator::reflect;
use binsim::simulation::step::compute_forces;
use binsim::{
    direct_accelerations, generate_particles, init_simulation, move_particle, simulate_one_step,
    Engine, Error, NVec2, Parameters, Particle, Scenario, System,
};

/// Build a 2-particle system with both particles at rest
pub fn two_particle_system(a: (f64, f64), b: (f64, f64), size: f64) -> System {
    System::new(vec![Particle::at(a.0, a.1), Particle::at(b.0, b.1)], size)
}

/// Default constants for tests (cutoff 0.01)
pub fn test_params() -> Parameters {
    Parameters::default()
}

/// Generated scenario at the default density, on `threads` workers
pub fn generated_scenario(n: usize, seed: u64, threads: usize) -> Scenario {
    let size = Parameters::domain_size(n, 0.0005);
    let particles = generate_particles(n, size, seed);
    Scenario::new(Engine { threads }, test_params(), System::new(particles, size)).unwrap()
}

fn separation(sys: &System) -> f64 {
    (sys.particles[1].x - sys.particles[0].x).norm()
}

/// Accelerations after a force pass over a freshly built grid
fn forces_on(sys: &System, params: &Parameters) -> Vec<NVec2> {
    let grid = init_simulation(&sys.particles, sys.size, params).unwrap();
    let mut particles = sys.particles.clone();
    compute_forces(&mut particles, &grid, params);
    particles.iter().map(|p| p.a).collect()
}

// ==================================================================================
// Two-particle scenarios
// ==================================================================================

#[test]
fn close_pair_on_wall_repels() {
    let p = test_params();
    let mut sys = two_particle_system((0.0, 0.0), (0.005, 0.0), 1.0);
    let before = separation(&sys);
    let mut grid = init_simulation(&sys.particles, sys.size, &p).unwrap();

    simulate_one_step(&mut sys, &mut grid, &p).unwrap();

    let a0 = sys.particles[0].a;
    let a1 = sys.particles[1].a;
    assert!(a0.norm() > 0.0 && a1.norm() > 0.0);
    // pointing away from each other along x
    assert!(a0.x < 0.0 && a1.x > 0.0, "a0 {:?}, a1 {:?}", a0, a1);
    assert!((a0 + a1).norm() < 1e-9 * a0.norm());

    // particle 0 sits on the x = 0 wall, so it is mirrored back and the gap
    // cannot shrink; particle 1 is pushed outwards
    assert!(sys.particles[1].x.x > 0.005);
    assert!(separation(&sys) >= before);
    grid.verify(&sys.particles).unwrap();
}

#[test]
fn close_pair_in_interior_separates() {
    let p = test_params();
    let mut sys = two_particle_system((0.5, 0.5), (0.505, 0.5), 1.0);
    let before = separation(&sys);
    let mut grid = init_simulation(&sys.particles, sys.size, &p).unwrap();

    simulate_one_step(&mut sys, &mut grid, &p).unwrap();

    assert!(sys.particles[0].a.x < 0.0);
    assert!(sys.particles[1].a.x > 0.0);
    assert!(separation(&sys) > before, "separation {} <= {}", separation(&sys), before);
    grid.verify(&sys.particles).unwrap();
}

#[test]
fn distant_pair_feels_nothing() {
    let p = test_params();
    let mut sys = two_particle_system((0.2, 0.2), (0.7, 0.7), 1.0);
    let mut grid = init_simulation(&sys.particles, sys.size, &p).unwrap();
    simulate_one_step(&mut sys, &mut grid, &p).unwrap();
    assert_eq!(sys.particles[0].a, NVec2::zeros());
    assert_eq!(sys.particles[1].a, NVec2::zeros());
    assert_eq!(sys.particles[0].x, NVec2::new(0.2, 0.2));
}

// ==================================================================================
// Neighbourhood completeness
// ==================================================================================

#[test]
fn pair_across_adjacent_cells_interacts() {
    let p = test_params();
    let d = 0.99 * p.cutoff;

    // side neighbours: columns 0 and 1
    let sys = two_particle_system((0.0099, 0.005), (0.0099 + d, 0.005), 1.0);
    let acc = forces_on(&sys, &p);
    assert!(acc[0].x < 0.0 && acc[1].x > 0.0);

    // diagonal neighbours: top-right corner of (0, 0) and bottom-left of (1, 1)
    let off = d / 2f64.sqrt();
    let a = (0.0098, 0.0098);
    let sys = two_particle_system(a, (a.0 + off, a.1 + off), 1.0);
    let grid = init_simulation(&sys.particles, sys.size, &p).unwrap();
    assert_ne!(grid.home(0), grid.home(1));
    let acc = forces_on(&sys, &p);
    assert!(acc[0].x < 0.0 && acc[0].y < 0.0);
    assert!(acc[1].x > 0.0 && acc[1].y > 0.0);
}

#[test]
fn pair_two_cells_apart_does_not_interact() {
    let p = test_params();
    let sys = two_particle_system((0.00995, 0.005), (0.00995 + 1.01 * p.cutoff, 0.005), 1.0);
    let grid = init_simulation(&sys.particles, sys.size, &p).unwrap();
    assert_eq!(grid.home(0).col, 0);
    assert_eq!(grid.home(1).col, 2);
    let acc = forces_on(&sys, &p);
    assert_eq!(acc[0], NVec2::zeros());
    assert_eq!(acc[1], NVec2::zeros());
}

#[test]
fn binned_forces_agree_with_all_pairs_after_motion() {
    let mut scenario = generated_scenario(400, 11, 2);
    scenario.run(25, 0).unwrap();

    let p = scenario.parameters.clone();
    let reference = direct_accelerations(&scenario.system.particles, &p);
    let mut particles = scenario.system.particles.clone();
    compute_forces(&mut particles, &scenario.grid, &p);

    for (got, want) in particles.iter().map(|q| q.a).zip(reference) {
        assert!(
            (got - want).norm() <= 1e-9 * want.norm().max(1.0),
            "binned {:?} vs direct {:?}",
            got,
            want
        );
    }
}

// ==================================================================================
// Grid invariants over many steps
// ==================================================================================

#[test]
fn membership_is_conserved_every_step() {
    let mut scenario = generated_scenario(1000, 5, 4);
    let n = scenario.system.len();
    for _ in 0..60 {
        scenario.step().unwrap();
        assert_eq!(scenario.grid.total_members(), n);
        scenario.grid.verify(&scenario.system.particles).unwrap();
    }
}

#[test]
fn converging_particles_survive_parallel_rebinning() {
    // a ring of particles flying at the centre: every step many source cells
    // feed the same destination cells; the heavy mass keeps the paths ballistic
    let p = Parameters {
        dt: 0.002,
        mass: 1.0e12,
        ..test_params()
    };
    let n = 800;
    let particles: Vec<Particle> = (0..n)
        .map(|k| {
            let angle = std::f64::consts::TAU * k as f64 / n as f64;
            let dir = NVec2::new(angle.cos(), angle.sin());
            Particle::new(NVec2::new(0.1, 0.1) + 0.08 * dir, -2.0 * dir)
        })
        .collect();
    let mut scenario = Scenario::new(Engine { threads: 8 }, p, System::new(particles, 0.2)).unwrap();
    for _ in 0..20 {
        scenario.step().unwrap();
        assert_eq!(scenario.grid.total_members(), n);
        scenario.grid.verify(&scenario.system.particles).unwrap();
    }
    // everyone has arrived near the centre
    assert!(scenario.grid.occupancy_summary().occupied <= 4);
}

// ==================================================================================
// Determinism
// ==================================================================================

#[test]
fn repeated_runs_are_bit_identical() {
    let mut first = generated_scenario(600, 21, 4);
    let mut second = generated_scenario(600, 21, 4);
    first.run(40, 0).unwrap();
    second.run(40, 0).unwrap();
    assert_eq!(first.system.particles, second.system.particles);
    assert_eq!(first.grid.occupancy(), second.grid.occupancy());
}

#[test]
fn worker_count_does_not_change_results() {
    let mut serial = generated_scenario(600, 8, 1);
    let mut parallel = generated_scenario(600, 8, 6);
    assert_eq!(serial.worker_count(), 1);
    serial.run(40, 0).unwrap();
    parallel.run(40, 0).unwrap();
    assert_eq!(serial.system.particles, parallel.system.particles);
    for i in 0..serial.system.len() {
        assert_eq!(serial.grid.home(i), parallel.grid.home(i));
    }
    for c in 0..serial.grid.cell_count() {
        assert_eq!(serial.grid.members(c), parallel.grid.members(c));
    }
}

// ==================================================================================
// Walls
// ==================================================================================

#[test]
fn overshoot_past_upper_wall_is_reflected() {
    let size = 1.0;
    let eps = 1e-4;
    let mut x = size + eps;
    let mut vx = 0.8;
    reflect(&mut x, &mut vx, size, 8).unwrap();
    assert!(x <= size);
    assert_eq!(vx, -0.8);
}

#[test]
fn fast_particle_reflects_several_times_in_one_move() {
    let p = test_params();
    // 0.3 + 5000 * 0.0005 = 2.8 -> -0.8 -> 0.8
    let mut particle = Particle::new(NVec2::new(0.3, 0.5), NVec2::new(5000.0, 0.0));
    move_particle(&mut particle, 1.0, &p).unwrap();
    assert!((particle.x.x - 0.8).abs() < 1e-9);
    assert_eq!(particle.v.x, 5000.0);
    assert!(particle.x.x >= 0.0 && particle.x.x <= 1.0);
}

#[test]
fn runaway_velocity_aborts_the_step() {
    let p = test_params();
    let mut sys = System::new(
        vec![Particle::new(NVec2::new(0.5, 0.5), NVec2::new(f64::INFINITY, 0.0))],
        1.0,
    );
    let mut grid = init_simulation(&sys.particles, sys.size, &p).unwrap();
    assert!(matches!(
        simulate_one_step(&mut sys, &mut grid, &p),
        Err(Error::ReflectionLimit { .. })
    ));
}

// ==================================================================================
// Preconditions
// ==================================================================================

#[test]
fn initialization_preconditions() {
    let p = test_params();
    let sys = two_particle_system((0.1, 0.1), (0.2, 0.2), 1.0);
    assert!(matches!(
        init_simulation(&sys.particles, 0.0, &p),
        Err(Error::InvalidParam(_))
    ));
    assert!(matches!(
        init_simulation(&sys.particles, -1.0, &p),
        Err(Error::InvalidParam(_))
    ));
    let bad = Parameters {
        cutoff: 0.0,
        ..test_params()
    };
    assert!(init_simulation(&sys.particles, 1.0, &bad).is_err());

    let outside = two_particle_system((0.1, 0.1), (0.2, 1.0001), 1.0);
    assert!(matches!(
        init_simulation(&outside.particles, 1.0, &p),
        Err(Error::OutOfDomain { index: Some(1), .. })
    ));
}

#[test]
fn particle_on_upper_corner_is_binned() {
    let p = test_params();
    let sys = two_particle_system((1.0, 1.0), (0.0, 0.0), 1.0);
    let grid = init_simulation(&sys.particles, sys.size, &p).unwrap();
    let last = grid.bin_num() - 1;
    assert_eq!(grid.home(0).row, last);
    assert_eq!(grid.home(0).col, last);
    assert_eq!(grid.locate(&NVec2::new(1.0, 1.0)).unwrap(), grid.home(0));
    assert!(matches!(
        grid.locate(&NVec2::new(1.0, 1.0 + 1e-12)),
        Err(Error::OutOfDomain { index: None, .. })
    ));
    grid.verify(&sys.particles).unwrap();
}
