//! One time step of the binned simulation
//!
//! A step is three phases run strictly in order; every phase is a rayon
//! parallel iterator that completes before the next one starts:
//!
//! - **forces**: parallel over cells. The work item for a cell rebuilds the
//!   acceleration of its own members from the 3x3 block around it, home cell
//!   first (see [`Grid::interaction_cells`]), reading positions only. No
//!   particle is written by two work items.
//! - **integration**: parallel over particles, each owns its own state.
//! - **re-binning**: [`Grid::rebin`], single writer per cell.
//!
//! Parallel calls run on whatever rayon pool is current, so wrapping a step
//! in `ThreadPool::install` picks the worker count.

use log::debug;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::simulation::forces::apply_force;
use crate::simulation::grid::Grid;
use crate::simulation::integrator::move_particle;
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec2, Particle, System};

/// Build the grid from the initial placement. Call once before stepping.
pub fn init_simulation(particles: &[Particle], size: f64, params: &Parameters) -> Result<Grid> {
    params.validate()?;
    Grid::new(particles, size, params.cutoff)
}

/// Advance `sys` by one step of `params.dt` and update `grid` membership
pub fn simulate_one_step(sys: &mut System, grid: &mut Grid, params: &Parameters) -> Result<()> {
    if grid.size() != sys.size {
        return Err(Error::InvalidParam(format!(
            "grid built for size {}, system has size {}",
            grid.size(),
            sys.size
        )));
    }
    if grid.cell_size() < params.cutoff {
        return Err(Error::InvalidParam(format!(
            "grid cells ({}) are narrower than the cutoff ({})",
            grid.cell_size(),
            params.cutoff
        )));
    }
    if grid.len() != sys.len() {
        return Err(Error::Membership(format!(
            "grid tracks {} particles, system has {}",
            grid.len(),
            sys.len()
        )));
    }

    compute_forces(&mut sys.particles, grid, params);

    let size = sys.size;
    sys.particles
        .par_iter_mut()
        .try_for_each(|p| move_particle(p, size, params))?;

    let moved = grid.rebin(&sys.particles)?;

    sys.t += params.dt;
    sys.steps += 1;
    debug!("step {} (t = {:.6}): {} particles changed cell", sys.steps, sys.t, moved);
    Ok(())
}

/// Rebuild every particle's acceleration from its Moore neighbourhood
pub fn compute_forces(particles: &mut [Particle], grid: &Grid, params: &Parameters) {
    let snapshot: &[Particle] = particles;

    let accels: Vec<(usize, NVec2)> = (0..grid.cell_count())
        .into_par_iter()
        .flat_map_iter(|c| {
            grid.members(c)
                .iter()
                .map(move |&i| (i, cell_acceleration(snapshot, grid, c, i, params)))
        })
        .collect();

    for (i, a) in accels {
        particles[i].a = a;
    }
}

fn cell_acceleration(
    particles: &[Particle],
    grid: &Grid,
    home: usize,
    i: usize,
    params: &Parameters,
) -> NVec2 {
    let mut target = particles[i];
    target.a = NVec2::zeros();
    for c in grid.interaction_cells(home) {
        for &j in grid.members(c) {
            if j != i {
                apply_force(&mut target, &particles[j], params);
            }
        }
    }
    target.a
}
