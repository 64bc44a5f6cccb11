//! Assignment strategies for task placement
//!
//! Implements the strategies under comparison:
//! - RoundRobin: task id modulo worker count
//! - LeastLoaded: lowest pooled load, lowest index wins ties
//! - Random: uniform draw per task
//! - Static: contiguous blocks of task ids per worker

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::types::{Task, Worker};

/// Assignment strategy, fixed for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Worker index = task id mod worker count
    #[default]
    RoundRobin,

    /// Worker with minimum current load
    LeastLoaded,

    /// Uniformly chosen worker, independent per task
    Random,

    /// Contiguous blocks of `ceil(tasks / workers)` ids; last worker absorbs the remainder
    Static,
}

impl Strategy {
    /// All strategies, in comparison-table order
    pub const ALL: [Strategy; 4] = [
        Strategy::RoundRobin,
        Strategy::LeastLoaded,
        Strategy::Random,
        Strategy::Static,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "round-robin",
            Strategy::LeastLoaded => "least-loaded",
            Strategy::Random => "random",
            Strategy::Static => "static",
        }
    }

    /// Whether identical inputs always produce identical assignments
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Strategy::Random)
    }

    /// Select the worker index for `task`.
    ///
    /// `workers` must be non-empty. `rng` is only drawn from by [`Strategy::Random`].
    pub fn select_worker<R: Rng + ?Sized>(
        &self,
        task: &Task,
        workers: &[Worker],
        num_tasks: usize,
        rng: &mut R,
    ) -> usize {
        debug_assert!(!workers.is_empty(), "worker pool must be non-empty");
        let num_workers = workers.len();

        match self {
            Strategy::RoundRobin => task.id % num_workers,
            Strategy::LeastLoaded => select_least_loaded(workers),
            Strategy::Random => rng.gen_range(0..num_workers),
            Strategy::Static => {
                let block_size = num_tasks.div_ceil(num_workers).max(1);
                (task.id / block_size).min(num_workers - 1)
            }
        }
    }
}

/// `min_by_key` keeps the first of equal minima, giving index-order tie-breaks
fn select_least_loaded(workers: &[Worker]) -> usize {
    workers
        .iter()
        .enumerate()
        .min_by_key(|(_, w)| w.current_load)
        .map(|(index, _)| index)
        .unwrap_or(0)
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Strategy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s.trim())
            .ok_or_else(|| SimError::unknown_strategy(s))
    }
}
