//! Short-range pair force for the binned engine
//!
//! `apply_force` is the single interaction law used everywhere: purely
//! repulsive, zero at `r = cutoff`, with `r` clamped from below by `min_r`.
//! `direct_accelerations` evaluates it over all ordered pairs and serves as
//! the O(N^2) reference the binned pass must agree with

use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec2, Particle};

/// Accumulate the force `neighbor` exerts on `particle` into `particle.a`
/// Only `particle` is written; the reverse direction is a separate call
#[inline]
pub fn apply_force(particle: &mut Particle, neighbor: &Particle, params: &Parameters) {
    // displacement from particle to neighbor
    let d = neighbor.x - particle.x;
    let mut r2 = d.norm_squared();

    // hard cutoff
    if r2 > params.cutoff * params.cutoff {
        return;
    }

    // singularity guard for near-coincident particles
    r2 = r2.max(params.min_r * params.min_r);
    let r = r2.sqrt();

    let coef = (1.0 - params.cutoff / r) / r2 / params.mass;
    particle.a += coef * d;
}

/// All-pairs accelerations, `out[i]` is the total acceleration on particle `i`
pub fn direct_accelerations(particles: &[Particle], params: &Parameters) -> Vec<NVec2> {
    particles
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut own = *p;
            own.a = NVec2::zeros();
            for (j, q) in particles.iter().enumerate() {
                if i != j {
                    apply_force(&mut own, q, params);
                }
            }
            own.a
        })
        .collect()
}
