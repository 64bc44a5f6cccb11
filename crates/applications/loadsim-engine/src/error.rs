//! Error types for the load-balancing simulator

use thiserror::Error;

/// Simulator result type
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors that can occur while configuring or driving a simulation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Strategy name not recognised
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Worker pool must be non-empty
    #[error("Invalid worker count: {0} (need at least 1)")]
    InvalidWorkerCount(usize),

    /// Workload bounds are empty or include zero
    #[error("Invalid workload range: {min}..={max}")]
    InvalidWorkloadRange { min: u64, max: u64 },

    /// Fixed workloads must all be positive
    #[error("Task {task_id} has zero workload")]
    ZeroWorkload { task_id: usize },

    /// Metrics requested before every task completed
    #[error("Simulation not complete: {completed}/{total} tasks finished")]
    NotComplete { completed: usize, total: usize },

    /// Run did not finish within the allowed number of steps
    #[error("Simulation did not complete within {0} steps")]
    StepLimitExceeded(u64),

    /// Session id not present in the store
    #[error("Simulation {0} not found")]
    SessionNotFound(String),
}

impl SimError {
    /// Create an unknown-strategy error
    pub fn unknown_strategy(name: impl Into<String>) -> Self {
        Self::UnknownStrategy(name.into())
    }

    /// Create a session-not-found error
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound(id.into())
    }

    /// True for errors raised while validating configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::UnknownStrategy(_)
                | Self::InvalidWorkerCount(_)
                | Self::InvalidWorkloadRange { .. }
                | Self::ZeroWorkload { .. }
        )
    }
}
