//! Discrete-time load-balancing simulator
//!
//! Each call to [`Engine::advance`] is one step:
//! 1. Assign every unassigned task, in id order, via the run's [`Strategy`]
//! 2. Every worker with pooled load consumes [`WORK_RATE`] unit(s)
//! 3. Tasks whose elapsed steps reach their workload are marked complete
//! 4. The clock advances by one
//!
//! Completion is an elapsed-time check per task. It does not read the pooled
//! `current_load`, which only tracks aggregate pending work per worker.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::metrics::Metrics;
use crate::policies::Strategy;
use crate::snapshot::EngineSnapshot;
use crate::types::{Task, Worker};
use crate::workload::WorkloadGenerator;

/// Units of pooled load each busy worker consumes per step
pub const WORK_RATE: u64 = 1;

/// Result of a finished run, for comparing strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub strategy: Strategy,
    pub num_workers: usize,
    pub num_tasks: usize,
    pub completed_tasks: usize,
    pub metrics: Option<Metrics>,
}

/// Simulation engine, generic over its random source
pub struct Engine<R: Rng = StdRng> {
    workers: Vec<Worker>,
    tasks: Vec<Task>,
    strategy: Strategy,
    current_step: u64,
    completed_tasks: usize,
    rng: R,
}

impl Engine<StdRng> {
    /// Create an engine with generated workloads.
    ///
    /// Seeds from `config.seed` when set, otherwise from OS entropy.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Engine<R> {
    /// Create an engine drawing workloads and random assignments from `rng`
    pub fn with_rng(config: &SimulationConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let generator = WorkloadGenerator::new(config.workload_range)?;
        let workloads = generator.generate(config.num_tasks, &mut rng);
        Self::from_workloads(config.num_workers, workloads, config.strategy, rng)
    }

    /// Create an engine over fixed workloads, indexed by task id
    pub fn from_workloads(
        num_workers: usize,
        workloads: Vec<u64>,
        strategy: Strategy,
        rng: R,
    ) -> Result<Self> {
        if num_workers == 0 {
            return Err(SimError::InvalidWorkerCount(num_workers));
        }
        if let Some(task_id) = workloads.iter().position(|&w| w == 0) {
            return Err(SimError::ZeroWorkload { task_id });
        }

        let workers = (0..num_workers).map(Worker::new).collect();
        let tasks: Vec<Task> = workloads
            .into_iter()
            .enumerate()
            .map(|(id, workload)| Task::new(id, workload))
            .collect();

        info!(
            num_workers,
            num_tasks = tasks.len(),
            strategy = %strategy,
            total_work = tasks.iter().map(|t| t.workload).sum::<u64>(),
            "Created simulation"
        );

        Ok(Engine {
            workers,
            tasks,
            strategy,
            current_step: 0,
            completed_tasks: 0,
            rng,
        })
    }

    /// Advance one step. Returns whether every task has completed.
    ///
    /// Advancing a complete engine is a no-op that returns `true` again.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            debug!(
                step = self.current_step,
                "Advance on complete simulation ignored"
            );
            return true;
        }

        if self.tasks.iter().any(|t| !t.assigned) {
            self.assign_tasks();
        }

        let work_done: u64 = self
            .workers
            .iter_mut()
            .map(|worker| worker.consume(WORK_RATE))
            .sum();

        let newly_completed = self.detect_completions();

        self.current_step += 1;

        debug!(
            step = self.current_step,
            work_done,
            newly_completed,
            completed = self.completed_tasks,
            total = self.tasks.len(),
            "Step processed"
        );

        let complete = self.is_complete();
        if complete {
            info!(
                strategy = %self.strategy,
                total_time = self.current_step,
                "Simulation complete"
            );
        }
        complete
    }

    /// Assign every unassigned task, in ascending id order
    fn assign_tasks(&mut self) {
        let num_tasks = self.tasks.len();

        for task in self.tasks.iter_mut().filter(|t| !t.assigned) {
            let worker_index = self
                .strategy
                .select_worker(task, &self.workers, num_tasks, &mut self.rng);
            let worker = &mut self.workers[worker_index];

            task.assign(worker.id, self.current_step);
            worker.accept(task);

            trace!(
                task_id = task.id,
                worker_id = worker.id,
                workload = task.workload,
                step = self.current_step,
                "Assigned task"
            );
        }
    }

    /// Mark tasks whose elapsed steps reached their workload. Returns how many completed.
    fn detect_completions(&mut self) -> usize {
        let step = self.current_step;
        let mut newly_completed = 0;

        for worker in &self.workers {
            for &task_id in &worker.task_ids {
                let task = &mut self.tasks[task_id];
                if task.end_time.is_some() {
                    continue;
                }
                let elapsed = task.elapsed_at(step).unwrap_or(0);
                if elapsed >= task.workload {
                    task.end_time = Some(step + 1);
                    newly_completed += 1;
                    trace!(
                        task_id,
                        worker_id = worker.id,
                        end_time = step + 1,
                        "Task completed"
                    );
                }
            }
        }

        self.completed_tasks += newly_completed;
        newly_completed
    }

    /// Advance until complete, returning the final step count
    pub fn run_to_completion(&mut self, max_steps: u64) -> Result<u64> {
        let mut steps = 0;
        while !self.is_complete() {
            if steps >= max_steps {
                return Err(SimError::StepLimitExceeded(max_steps));
            }
            self.advance();
            steps += 1;
        }
        Ok(self.current_step)
    }

    /// Plain copy of all worker and task state
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            workers: self.workers.clone(),
            tasks: self.tasks.clone(),
            current_step: self.current_step,
            completed_tasks: self.completed_tasks,
        }
    }

    /// Performance metrics for a complete run.
    ///
    /// `Ok(None)` when no task completed; `Err(NotComplete)` before completion.
    pub fn metrics(&self) -> Result<Option<Metrics>> {
        if !self.is_complete() {
            return Err(SimError::NotComplete {
                completed: self.completed_tasks,
                total: self.tasks.len(),
            });
        }
        Ok(Metrics::calculate(&self.tasks, &self.workers, self.current_step))
    }

    /// Summarise a complete run
    pub fn report(&self) -> Result<RunReport> {
        Ok(RunReport {
            strategy: self.strategy,
            num_workers: self.workers.len(),
            num_tasks: self.tasks.len(),
            completed_tasks: self.completed_tasks,
            metrics: self.metrics()?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.completed_tasks >= self.tasks.len()
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    pub fn completed_tasks(&self) -> usize {
        self.completed_tasks
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkloadRange;

    fn engine(num_workers: usize, workloads: Vec<u64>, strategy: Strategy) -> Engine {
        Engine::from_workloads(num_workers, workloads, strategy, StdRng::seed_from_u64(0))
            .unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let config = SimulationConfig::new(3, 10, Strategy::RoundRobin)
            .with_seed(5);
        let engine = Engine::new(&config).unwrap();

        assert_eq!(engine.current_step(), 0);
        assert_eq!(engine.completed_tasks(), 0);
        assert_eq!(engine.workers().len(), 3);
        assert_eq!(engine.tasks().len(), 10);
        assert!(
            engine
                .tasks()
                .iter()
                .all(|t| (1..=10).contains(&t.workload))
        );
        assert!(!engine.is_complete());
    }

    #[test]
    fn test_creation_rejects_bad_config() {
        let config = SimulationConfig::new(0, 4, Strategy::Static);
        assert_eq!(
            Engine::new(&config).err(),
            Some(SimError::InvalidWorkerCount(0))
        );

        let config = SimulationConfig::new(2, 4, Strategy::Static)
            .with_workload_range(WorkloadRange { min: 5, max: 1 });
        assert!(matches!(
            Engine::new(&config),
            Err(SimError::InvalidWorkloadRange { .. })
        ));

        assert_eq!(
            Engine::from_workloads(2, vec![3, 0], Strategy::Static, StdRng::seed_from_u64(0))
                .err(),
            Some(SimError::ZeroWorkload { task_id: 1 })
        );
    }

    #[test]
    fn test_seeded_engines_share_workloads() {
        let config = SimulationConfig::new(2, 16, Strategy::Random).with_seed(11);
        let a = Engine::new(&config).unwrap();
        let b = Engine::new(&config).unwrap();
        assert_eq!(a.tasks(), b.tasks());
    }

    #[test]
    fn test_round_robin_first_step() {
        let mut engine = engine(2, vec![2, 2, 2, 2], Strategy::RoundRobin);
        engine.advance();

        let assigned: Vec<_> = engine.tasks().iter().map(|t| t.worker_id).collect();
        assert_eq!(assigned, vec![Some(0), Some(1), Some(0), Some(1)]);
        assert!(engine.tasks().iter().all(|t| t.start_time == Some(0)));
        assert_eq!(engine.workers()[0].task_ids, vec![0, 2]);
        assert_eq!(engine.workers()[1].task_ids, vec![1, 3]);
    }

    #[test]
    fn test_work_phase_consumes_one_unit() {
        let mut engine = engine(2, vec![3, 1], Strategy::RoundRobin);
        engine.advance();

        let workers = engine.workers();
        assert_eq!(workers[0].current_load, 2);
        assert_eq!(workers[0].total_processed, 1);
        assert!(workers[0].busy);
        assert_eq!(workers[1].current_load, 0);
        assert_eq!(workers[1].total_processed, 1);
        assert!(!workers[1].busy);
    }

    #[test]
    fn test_completion_timing() {
        let mut engine = engine(1, vec![3], Strategy::RoundRobin);

        assert!(!engine.advance());
        assert!(!engine.advance());
        assert_eq!(engine.tasks()[0].end_time, None);

        // Third advance: step 2 before increment, elapsed = 3
        assert!(engine.advance());
        assert_eq!(engine.tasks()[0].end_time, Some(3));
        assert_eq!(engine.current_step(), 3);
    }

    #[test]
    fn test_completion_decoupled_from_pooled_load() {
        // Both tasks share one pool of 5 units, yet each completes on elapsed time alone
        let mut engine = engine(1, vec![2, 3], Strategy::RoundRobin);
        engine.advance();
        engine.advance();
        assert_eq!(engine.tasks()[0].end_time, Some(2));
        assert_eq!(engine.workers()[0].current_load, 3);

        assert!(engine.advance());
        assert_eq!(engine.tasks()[1].end_time, Some(3));
        // Pool still holds undrained work after every task completed
        assert_eq!(engine.workers()[0].current_load, 2);
    }

    #[test]
    fn test_least_loaded_spreads_work() {
        let mut engine = engine(3, vec![5, 1, 1, 1], Strategy::LeastLoaded);
        engine.advance();

        let assigned: Vec<_> = engine.tasks().iter().map(|t| t.worker_id).collect();
        // 0 -> w0 (tie), 1 -> w1 (tie at 0), 2 -> w2, 3 -> w1 (load 1 beats w0's 5, first of w1/w2)
        assert_eq!(assigned, vec![Some(0), Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn test_advance_after_complete_is_noop() {
        let mut engine = engine(2, vec![1, 1], Strategy::Static);
        assert!(engine.advance());
        let before = engine.snapshot();

        assert!(engine.advance());
        assert!(engine.advance());
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.current_step(), 1);
    }

    #[test]
    fn test_zero_tasks_complete_immediately() {
        let mut engine = engine(3, vec![], Strategy::LeastLoaded);

        assert!(engine.is_complete());
        assert!(engine.advance());
        assert_eq!(engine.current_step(), 0);
        assert_eq!(engine.metrics().unwrap(), None);
    }

    #[test]
    fn test_metrics_before_completion_is_error() {
        let mut engine = engine(1, vec![4], Strategy::RoundRobin);
        engine.advance();

        assert_eq!(
            engine.metrics().unwrap_err(),
            SimError::NotComplete {
                completed: 0,
                total: 1
            }
        );
    }

    #[test]
    fn test_run_to_completion_and_metrics() {
        let mut engine = engine(2, vec![4, 2, 3], Strategy::RoundRobin);
        let total_time = engine.run_to_completion(100).unwrap();
        assert_eq!(total_time, 4);

        let metrics = engine.metrics().unwrap().unwrap();
        assert_eq!(metrics.total_time, 4);
        // Completion times 4, 2, 3
        assert_eq!(metrics.avg_completion, 3.0);
        assert_eq!(metrics.max_completion, 4);
        // w0 pooled 7 units over 4 steps, w1 pooled 2 units
        assert_eq!(engine.workers()[0].total_processed, 4);
        assert_eq!(engine.workers()[1].total_processed, 2);
        assert_eq!(metrics.load_imbalance, 2.0);
        assert_eq!(metrics.load_variance, 1.0);
        assert_eq!(metrics.efficiency, 75.0);

        let report = engine.report().unwrap();
        assert_eq!(report.strategy, Strategy::RoundRobin);
        assert_eq!(report.num_workers, 2);
        assert_eq!(report.completed_tasks, 3);
        assert_eq!(report.metrics, Some(metrics));
    }

    #[test]
    fn test_run_to_completion_step_limit() {
        let mut engine = engine(1, vec![10], Strategy::RoundRobin);
        assert_eq!(
            engine.run_to_completion(3).unwrap_err(),
            SimError::StepLimitExceeded(3)
        );
        assert_eq!(engine.current_step(), 3);
    }
}
