//! Numerical and physical constants for the simulation
//!
//! `Parameters` holds the read-only constants of the core:
//! - interaction radius `cutoff` (also the cell side of the grid),
//! - singularity guard `min_r`, uniform `mass`, fixed step `dt`,
//! - the cap on wall reflections per axis per step

use crate::error::{Error, Result};

pub const DEFAULT_CUTOFF: f64 = 0.01;
pub const DEFAULT_MASS: f64 = 0.01;
pub const DEFAULT_DT: f64 = 0.0005;
pub const DEFAULT_DENSITY: f64 = 0.0005;
pub const DEFAULT_MAX_REFLECTIONS: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub cutoff: f64, // interaction radius
    pub min_r: f64, // lower clamp on pair distance
    pub mass: f64, // uniform particle mass
    pub dt: f64, // time step
    pub max_reflections: usize, // wall bounces allowed per axis per step
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            min_r: DEFAULT_CUTOFF / 100.0,
            mass: DEFAULT_MASS,
            dt: DEFAULT_DT,
            max_reflections: DEFAULT_MAX_REFLECTIONS,
        }
    }
}

impl Parameters {
    /// Reject non-finite or non-positive constants
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("cutoff", self.cutoff),
            ("min_r", self.min_r),
            ("mass", self.mass),
            ("dt", self.dt),
        ];
        for (name, value) in named {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParam(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        if self.max_reflections == 0 {
            return Err(Error::InvalidParam("max_reflections must be >= 1".into()));
        }
        Ok(())
    }

    /// Domain side giving `density` particles per unit area for `n` particles
    pub fn domain_size(n: usize, density: f64) -> f64 {
        (density * n as f64).sqrt()
    }
}
