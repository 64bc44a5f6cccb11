//! Keyed store of live simulations
//!
//! Transport layers (HTTP handlers, a REPL, tests) create, step, and discard
//! engines through this store instead of a global registry. Each engine sits
//! behind its own mutex, so concurrent step requests for one session are
//! serialized while different sessions proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::metrics::Metrics;
use crate::simulator::Engine;
use crate::snapshot::{EngineSnapshot, StepOutcome};

/// Opaque session identifier
pub type SessionId = String;

type SharedEngine = Arc<Mutex<Engine>>;

/// Map from session id to engine
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SharedEngine>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simulation and return its id with the initial state
    pub fn start(&self, config: &SimulationConfig) -> Result<(SessionId, EngineSnapshot)> {
        let engine = Engine::new(config)?;
        let snapshot = engine.snapshot();
        let id = Uuid::new_v4().to_string();

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::new(Mutex::new(engine)));

        info!(
            session_id = %id,
            strategy = %config.strategy,
            "Started simulation session"
        );
        Ok((id, snapshot))
    }

    /// Advance a session by one step
    ///
    /// Metrics are attached once the run is complete.
    pub fn step(&self, id: &str) -> Result<StepOutcome> {
        let shared = self.get(id)?;
        let mut engine = lock(&shared);

        let complete = engine.advance();
        let metrics = if complete {
            Some(engine.metrics()?)
        } else {
            None
        };

        debug!(
            session_id = %id,
            step = engine.current_step(),
            complete,
            "Stepped session"
        );
        Ok(StepOutcome {
            state: engine.snapshot(),
            complete,
            metrics,
        })
    }

    /// Current state without advancing
    pub fn state(&self, id: &str) -> Result<EngineSnapshot> {
        let shared = self.get(id)?;
        let engine = lock(&shared);
        Ok(engine.snapshot())
    }

    /// Metrics for a complete session
    pub fn metrics(&self, id: &str) -> Result<Option<Metrics>> {
        let shared = self.get(id)?;
        let engine = lock(&shared);
        engine.metrics()
    }

    /// Discard a session. Returns whether it existed.
    pub fn reset(&self, id: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();

        if removed {
            info!(session_id = %id, "Reset simulation session");
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read_sessions().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read_sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_sessions().is_empty()
    }

    fn get(&self, id: &str) -> Result<SharedEngine> {
        self.read_sessions()
            .get(id)
            .cloned()
            .ok_or_else(|| SimError::session_not_found(id))
    }

    fn read_sessions(&self) -> RwLockReadGuard<'_, HashMap<SessionId, SharedEngine>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(engine: &SharedEngine) -> MutexGuard<'_, Engine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}
