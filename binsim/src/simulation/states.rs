//! Core state types for the binned particle simulation.
//!
//! - `Particle` holds position, velocity and acceleration as `NVec2`
//! - `System` owns the fixed particle arena, the domain size and the clock
//!
//! A particle's identity is its index in `System::particles`; the arena is
//! never resized once the simulation is built.

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub a: NVec2, // acceleration, rebuilt every step
}

impl Particle {
    /// Particle at `x` moving with `v`, zero acceleration
    pub fn new(x: NVec2, v: NVec2) -> Self {
        Self {
            x,
            v,
            a: NVec2::zeros(),
        }
    }

    pub fn at(x: f64, y: f64) -> Self {
        Self::new(NVec2::new(x, y), NVec2::zeros())
    }

    pub fn speed(&self) -> f64 {
        self.v.norm()
    }
}

#[derive(Debug, Clone)]
pub struct System {
    pub particles: Vec<Particle>, // particle arena, index = identity
    pub size: f64, // side of the square domain [0, size] x [0, size]
    pub t: f64, // time
    pub steps: u64, // completed steps
}

impl System {
    pub fn new(particles: Vec<Particle>, size: f64) -> Self {
        Self {
            particles,
            size,
            t: 0.0,
            steps: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Largest particle speed, `0.0` for an empty system
    pub fn max_speed(&self) -> f64 {
        self.particles
            .iter()
            .map(Particle::speed)
            .fold(0.0, f64::max)
    }

    pub fn mean_speed(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        self.particles.iter().map(Particle::speed).sum::<f64>() / self.particles.len() as f64
    }
}
