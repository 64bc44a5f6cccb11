//! Synthetic workload generation
//!
//! Draws task magnitudes uniformly from an inclusive range. Generation is
//! separate from the engine so one workload vector can be replayed under
//! every strategy.

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::config::WorkloadRange;
use crate::error::Result;

/// Uniform workload generator
pub struct WorkloadGenerator {
    distribution: Uniform<u64>,
}

impl WorkloadGenerator {
    /// Create a generator over a validated range
    pub fn new(range: WorkloadRange) -> Result<Self> {
        range.validate()?;
        Ok(WorkloadGenerator {
            distribution: Uniform::new_inclusive(range.min, range.max),
        })
    }

    /// Draw a single workload
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        self.distribution.sample(rng)
    }

    /// Draw `num_tasks` workloads, indexed by task id
    pub fn generate<R: Rng + ?Sized>(&self, num_tasks: usize, rng: &mut R) -> Vec<u64> {
        (0..num_tasks).map(|_| self.sample(rng)).collect()
    }
}
