//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime `Scenario`
//! containing:
//! - engine settings (`Engine`) and the worker pool they describe
//! - constants (`Parameters`)
//! - system state (`System` with particles at t = 0)
//! - the spatial grid built from the initial placement

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::ThreadPool;

use crate::configuration::config::{ParticleConfig, ScenarioConfig};
use crate::error::{Error, Result};
use crate::simulation::engine::Engine;
use crate::simulation::grid::Grid;
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec2, Particle, System};
use crate::simulation::step::{init_simulation, simulate_one_step};

/// Runtime bundle: everything one run needs, with the grid kept in step
/// with the particle arena
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub system: System,
    pub grid: Grid,
    pool: ThreadPool,
}

impl Scenario {
    /// Validate the pieces, build the grid and the worker pool
    pub fn new(engine: Engine, parameters: Parameters, system: System) -> Result<Self> {
        let grid = init_simulation(&system.particles, system.size, &parameters)?;
        let pool = engine.build_pool()?;
        debug!(
            "scenario: {} particles, {} workers",
            system.len(),
            pool.current_num_threads()
        );
        Ok(Self {
            engine,
            parameters,
            system,
            grid,
            pool,
        })
    }

    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        let size = cfg.domain_size()?;

        // Particles: explicit list or seeded lattice
        let particles = match (&cfg.particles, &cfg.generate) {
            (Some(list), None) => list
                .iter()
                .enumerate()
                .map(|(i, pc)| particle_from_config(i, pc))
                .collect::<Result<Vec<_>>>()?,
            (None, Some(generate)) => generate_particles(generate.count, size, generate.seed),
            _ => {
                return Err(Error::InvalidParam(
                    "scenario needs exactly one of `particles` or `generate`".into(),
                ))
            }
        };

        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            cutoff: p_cfg.cutoff,
            min_r: p_cfg.min_r.unwrap_or(p_cfg.cutoff / 100.0),
            mass: p_cfg.mass,
            dt: p_cfg.dt,
            max_reflections: p_cfg.max_reflections,
        };

        // Engine (runtime) from EngineConfig
        let engine = Engine {
            threads: cfg.engine.threads,
        };

        Self::new(engine, parameters, System::new(particles, size))
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Advance one step on this scenario's worker pool
    pub fn step(&mut self) -> Result<()> {
        let Scenario {
            system,
            parameters,
            grid,
            pool,
            ..
        } = self;
        pool.install(|| simulate_one_step(system, grid, parameters))
    }

    /// Run `steps` steps, logging occupancy every `report_every` steps
    pub fn run(&mut self, steps: u64, report_every: u64) -> Result<()> {
        let start = Instant::now();
        for _ in 0..steps {
            self.step()?;
            if report_every > 0 && self.system.steps % report_every == 0 {
                let occ = self.grid.occupancy_summary();
                info!(
                    "step {:>6}  t = {:.4}  occupied cells {}/{}  max per cell {}  members {}",
                    self.system.steps,
                    self.system.t,
                    occ.occupied,
                    self.grid.cell_count(),
                    occ.max,
                    occ.total
                );
            }
        }
        info!(
            "ran {} steps of {} particles in {:.3} s (mean speed {:.4}, max speed {:.4})",
            steps,
            self.system.len(),
            start.elapsed().as_secs_f64(),
            self.system.mean_speed(),
            self.system.max_speed()
        );
        Ok(())
    }
}

fn particle_from_config(index: usize, pc: &ParticleConfig) -> Result<Particle> {
    let x = match pc.x.as_slice() {
        [x, y] => NVec2::new(*x, *y),
        _ => {
            return Err(Error::InvalidParam(format!(
                "particle {index}: position needs 2 components, got {}",
                pc.x.len()
            )))
        }
    };
    let v = match pc.v.as_slice() {
        [] => NVec2::zeros(),
        [vx, vy] => NVec2::new(*vx, *vy),
        _ => {
            return Err(Error::InvalidParam(format!(
                "particle {index}: velocity needs 2 components, got {}",
                pc.v.len()
            )))
        }
    };
    if !(x.iter().all(|c| c.is_finite()) && v.iter().all(|c| c.is_finite())) {
        return Err(Error::InvalidParam(format!(
            "particle {index}: state must be finite"
        )));
    }
    Ok(Particle::new(x, v))
}

/// Place `count` particles on a shuffled `sx x sy` lattice strictly inside
/// the domain, with velocity components uniform in `[-1, 1)`.
/// Same seed, same placement.
pub fn generate_particles(count: usize, size: f64, seed: u64) -> Vec<Particle> {
    if count == 0 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);

    let sx = (count as f64).sqrt().ceil() as usize;
    let sy = count.div_ceil(sx);

    let mut slots: Vec<usize> = (0..sx * sy).collect();
    slots.shuffle(&mut rng);

    slots
        .into_iter()
        .take(count)
        .map(|k| {
            let x = size * (1 + k % sx) as f64 / (1 + sx) as f64;
            let y = size * (1 + k / sx) as f64 / (1 + sy) as f64;
            let v = NVec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            Particle::new(NVec2::new(x, y), v)
        })
        .collect()
}
