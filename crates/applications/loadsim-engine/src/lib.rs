//! Load-Balancing Simulation Engine
//!
//! Discrete-time simulator for comparing task assignment strategies
//! (round-robin, least-loaded, random, static partition) over a pool of
//! workers.

pub mod config;
pub mod error;
pub mod metrics;
pub mod policies;
pub mod session;
pub mod simulator;
pub mod snapshot;
pub mod types;
pub mod workload;

pub use config::{SimulationConfig, WorkloadRange};
pub use error::{Result, SimError};
pub use metrics::Metrics;
pub use policies::Strategy;
pub use session::{SessionId, SessionStore};
pub use simulator::{Engine, RunReport};
pub use snapshot::{EngineSnapshot, StepOutcome};
