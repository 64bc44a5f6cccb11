//! End-of-run performance metrics

use serde::{Deserialize, Serialize};

use crate::types::{Task, Worker};

/// Summary statistics for a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Final step counter
    pub total_time: u64,
    /// Mean `end_time - start_time` over completed tasks (2 dp)
    pub avg_completion: f64,
    /// Max `end_time - start_time` over completed tasks
    pub max_completion: u64,
    /// Spread of `total_processed` across workers (2 dp)
    pub load_imbalance: f64,
    /// Population variance of `total_processed` (2 dp)
    pub load_variance: f64,
    /// Mean over max `total_processed`, as a percentage (1 dp)
    pub efficiency: f64,
}

impl Metrics {
    /// Compute metrics from final task and worker state.
    ///
    /// Returns `None` when no task has completed.
    pub fn calculate(tasks: &[Task], workers: &[Worker], total_time: u64) -> Option<Self> {
        let completion_times: Vec<u64> = tasks.iter().filter_map(Task::completion_time).collect();
        if completion_times.is_empty() {
            return None;
        }

        let avg_completion =
            completion_times.iter().sum::<u64>() as f64 / completion_times.len() as f64;
        let max_completion = completion_times.iter().copied().max().unwrap_or(0);

        let loads: Vec<u64> = workers.iter().map(|w| w.total_processed).collect();
        let max_load = loads.iter().copied().max().unwrap_or(0);
        let min_load = loads.iter().copied().min().unwrap_or(0);
        let avg_load = mean(&loads);
        let load_variance = loads
            .iter()
            .map(|&load| (load as f64 - avg_load).powi(2))
            .sum::<f64>()
            / loads.len().max(1) as f64;

        let efficiency = if max_load > 0 {
            avg_load / max_load as f64 * 100.0
        } else {
            0.0
        };

        Some(Metrics {
            total_time,
            avg_completion: round_to(avg_completion, 2),
            max_completion,
            load_imbalance: round_to((max_load - min_load) as f64, 2),
            load_variance: round_to(load_variance, 2),
            efficiency: round_to(efficiency, 1),
        })
    }
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

/// Round to `decimals` places.
///
/// Rounds the exact binary value of `value`, so 1.075 (stored just below the
/// tie) goes down. Exact ties go to even. Scaling by a power of ten first
/// would round the scaled product instead and can land on the wrong side.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}
