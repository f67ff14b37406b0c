//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – worker pool size
//! - [`ParametersConfig`] – interaction and integration constants
//! - [`RunConfig`]        – number of steps and report cadence
//! - [`DomainConfig`]     – domain side, or the density it is derived from
//! - [`ParticleConfig`]   – explicit initial state for each particle
//! - [`GenerateConfig`]   – seeded lattice placement instead of an explicit list
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! Every section except the particles is optional and falls back to the
//! classic short-range benchmark constants.
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   threads: 4              # 0 or missing -> rayon default, 1 -> serial
//!
//! parameters:
//!   cutoff: 0.01            # interaction radius, also the cell side
//!   min_r: 0.0001           # distance clamp, default cutoff / 100
//!   mass: 0.01
//!   dt: 0.0005
//!   max_reflections: 64     # wall bounces allowed per axis per step
//!
//! run:
//!   steps: 1000
//!   report_every: 100
//!
//! domain:
//!   density: 0.0005         # size = sqrt(density * N) when size is missing
//!
//! generate:
//!   count: 1000
//!   seed: 42
//! ```
//!
//! or, with explicit particles:
//!
//! ```yaml
//! domain:
//!   size: 1.0
//! particles:
//!   - x: [0.0, 0.0]
//!     v: [0.0, 0.0]
//!   - x: [0.005, 0.0]
//!     v: [0.0, 0.0]
//! ```

use std::io::Read;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::simulation::params::{
    DEFAULT_CUTOFF, DEFAULT_DENSITY, DEFAULT_DT, DEFAULT_MASS, DEFAULT_MAX_REFLECTIONS,
};

/// Worker pool configuration
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub threads: usize, // number of rayon workers, 0 picks rayon's default
}

/// Interaction and integration constants
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub cutoff: f64,            // interaction radius and cell side
    pub min_r: Option<f64>,     // lower distance clamp, default cutoff / 100
    pub mass: f64,              // uniform particle mass
    pub dt: f64,                // fixed time step
    pub max_reflections: usize, // reflection loop cap
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            min_r: None,
            mass: DEFAULT_MASS,
            dt: DEFAULT_DT,
            max_reflections: DEFAULT_MAX_REFLECTIONS,
        }
    }
}

/// How long to run and how often to log grid occupancy
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RunConfig {
    pub steps: u64,
    pub report_every: u64, // 0 disables periodic reports
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 1000,
            report_every: 100,
        }
    }
}

/// Domain side, given directly or derived from a target density
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DomainConfig {
    pub size: Option<f64>,
    pub density: f64, // particles per unit area, used when `size` is missing
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            size: None,
            density: DEFAULT_DENSITY,
        }
    }
}

/// Initial state of a single particle
#[derive(Deserialize, Debug, Clone)]
pub struct ParticleConfig {
    pub x: Vec<f64>, // position [x, y]
    #[serde(default)]
    pub v: Vec<f64>, // velocity [vx, vy], missing means at rest
}

/// Seeded placement of `count` particles
#[derive(Deserialize, Debug, Clone)]
pub struct GenerateConfig {
    pub count: usize,
    #[serde(default)]
    pub seed: u64,
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub run: RunConfig,
    pub domain: DomainConfig,
    pub particles: Option<Vec<ParticleConfig>>,
    pub generate: Option<GenerateConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: ScenarioConfig = serde_yaml::from_str(text)?;
        cfg.check_particle_source()?;
        Ok(cfg)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;
        cfg.check_particle_source()?;
        Ok(cfg)
    }

    /// Number of particles the scenario will create
    pub fn particle_count(&self) -> usize {
        match (&self.particles, &self.generate) {
            (Some(list), _) => list.len(),
            (None, Some(generate)) => generate.count,
            (None, None) => 0,
        }
    }

    /// Domain side: explicit `size`, else `sqrt(density * N)`
    pub fn domain_size(&self) -> Result<f64> {
        let size = match self.domain.size {
            Some(size) => size,
            None => {
                let density = self.domain.density;
                if !density.is_finite() || density <= 0.0 {
                    return Err(Error::InvalidParam(format!(
                        "density must be finite and > 0, got {density}"
                    )));
                }
                (density * self.particle_count() as f64).sqrt()
            }
        };
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "domain size must be finite and > 0, got {size}"
            )));
        }
        Ok(size)
    }

    fn check_particle_source(&self) -> Result<()> {
        match (&self.particles, &self.generate) {
            (Some(_), Some(_)) => Err(Error::InvalidParam(
                "give either `particles` or `generate`, not both".into(),
            )),
            (None, None) => Err(Error::InvalidParam(
                "scenario needs `particles` or `generate`".into(),
            )),
            _ => Ok(()),
        }
    }
}
