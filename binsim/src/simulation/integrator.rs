//! Fixed-step integrator with reflective walls
//!
//! Semi-implicit Euler: velocity is kicked with the acceleration from the
//! force pass, then position drifts with the new velocity. Acceleration is
//! not re-evaluated inside the step, so this is not a full velocity Verlet.

use super::params::Parameters;
use super::states::Particle;
use crate::error::{Error, Result};

/// Advance one particle by `params.dt` and reflect it back into `[0, size]`
pub fn move_particle(p: &mut Particle, size: f64, params: &Parameters) -> Result<()> {
    // Kick: v_n+1 = v_n + dt * a_n
    p.v += params.dt * p.a;

    // Drift: x_n+1 = x_n + dt * v_n+1
    p.x += params.dt * p.v;

    reflect(&mut p.x.x, &mut p.v.x, size, params.max_reflections)?;
    reflect(&mut p.x.y, &mut p.v.y, size, params.max_reflections)?;
    Ok(())
}

/// Mirror one coordinate about the violated wall until it is inside the domain.
/// A fast particle can overshoot by more than a domain width, hence the loop.
pub fn reflect(x: &mut f64, v: &mut f64, size: f64, limit: usize) -> Result<()> {
    if !x.is_finite() {
        return Err(Error::ReflectionLimit {
            limit,
            coordinate: *x,
        });
    }

    let mut bounces = 0;
    while *x < 0.0 || *x > size {
        if bounces == limit {
            return Err(Error::ReflectionLimit {
                limit,
                coordinate: *x,
            });
        }
        *x = if *x < 0.0 { -*x } else { 2.0 * size - *x };
        *v = -*v;
        bounces += 1;
    }
    Ok(())
}
