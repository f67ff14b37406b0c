pub mod simulation;
pub mod configuration;
pub mod benchmark;
pub mod error;

pub use error::{Error, Result};

pub use simulation::states::{Particle, System, NVec2};
pub use simulation::params::Parameters;
pub use simulation::engine::Engine;
pub use simulation::forces::{apply_force, direct_accelerations};
pub use simulation::integrator::move_particle;
pub use simulation::grid::{Grid, CellIndex, Occupancy};
pub use simulation::step::{init_simulation, simulate_one_step};
pub use simulation::scenario::{Scenario, generate_particles};

pub use configuration::config::{EngineConfig, ParametersConfig, RunConfig, DomainConfig, ParticleConfig, GenerateConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_step, bench_step_curve};
