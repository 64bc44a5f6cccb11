//! Simulation configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::policies::Strategy;

/// Default lower workload bound (inclusive)
pub const DEFAULT_MIN_WORKLOAD: u64 = 1;

/// Default upper workload bound (inclusive)
pub const DEFAULT_MAX_WORKLOAD: u64 = 10;

/// Inclusive range task workloads are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRange {
    pub min: u64,
    pub max: u64,
}

impl Default for WorkloadRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_WORKLOAD,
            max: DEFAULT_MAX_WORKLOAD,
        }
    }
}

impl WorkloadRange {
    /// Create a validated range
    pub fn new(min: u64, max: u64) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Workloads are positive and the range is non-empty
    pub fn validate(&self) -> Result<()> {
        if self.min == 0 || self.min > self.max {
            return Err(SimError::InvalidWorkloadRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Configuration for a single simulation run
///
/// Deserializes from the start-request body, e.g.
/// `{"num_workers": 4, "num_tasks": 20, "strategy": "least-loaded"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub num_workers: usize,
    pub num_tasks: usize,
    pub strategy: Strategy,

    #[serde(default)]
    pub workload_range: WorkloadRange,

    /// Fixed seed for workload generation and the random strategy
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn new(num_workers: usize, num_tasks: usize, strategy: Strategy) -> Self {
        Self {
            num_workers,
            num_tasks,
            strategy,
            workload_range: WorkloadRange::default(),
            seed: None,
        }
    }

    /// Set workload range
    pub fn with_workload_range(mut self, range: WorkloadRange) -> Self {
        self.workload_range = range;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(SimError::InvalidWorkerCount(self.num_workers));
        }
        self.workload_range.validate()
    }
}
