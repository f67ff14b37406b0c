//! High-level runtime engine settings
//!
//! Selects how many rayon workers run the step phases.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Engine {
    pub threads: usize, // worker count, 0 = rayon default, 1 = serial
}

impl Engine {
    pub fn serial() -> Self {
        Self { threads: 1 }
    }

    /// Fixed-size pool the step phases are installed on
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("binsim-worker-{i}"))
            .build()?;
        Ok(pool)
    }
}
