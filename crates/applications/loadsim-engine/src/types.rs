//! Core types for the simulation engine

use serde::{Deserialize, Serialize};

/// A unit of work with a fixed magnitude
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: usize,
    pub workload: u64,
    pub assigned: bool,
    pub worker_id: Option<usize>,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
}

impl Task {
    pub fn new(id: usize, workload: u64) -> Self {
        Task {
            id,
            workload,
            assigned: false,
            worker_id: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.assigned && self.end_time.is_none()
    }

    /// Record the assignment. Only the first call has any effect.
    pub(crate) fn assign(&mut self, worker_id: usize, step: u64) {
        if self.assigned {
            return;
        }
        self.assigned = true;
        self.worker_id = Some(worker_id);
        self.start_time = Some(step);
    }

    /// Steps elapsed since assignment, counting the step being processed
    pub fn elapsed_at(&self, step: u64) -> Option<u64> {
        self.start_time.map(|start| step - start + 1)
    }

    /// Steps between assignment and completion
    pub fn completion_time(&self) -> Option<u64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// An accumulator of assigned load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: usize,
    pub current_load: u64,
    pub total_processed: u64,
    /// Assigned task ids, in assignment order
    #[serde(rename = "tasks")]
    pub task_ids: Vec<usize>,
    pub busy: bool,
}

impl Worker {
    pub fn new(id: usize) -> Self {
        Worker {
            id,
            current_load: 0,
            total_processed: 0,
            task_ids: Vec::new(),
            busy: false,
        }
    }

    /// Add a task's workload to the pooled load
    pub(crate) fn accept(&mut self, task: &Task) {
        self.task_ids.push(task.id);
        self.current_load += task.workload;
    }

    /// Consume up to `rate` units from the pooled load, returning what was consumed
    pub(crate) fn consume(&mut self, rate: u64) -> u64 {
        if self.current_load == 0 {
            return 0;
        }
        let done = rate.min(self.current_load);
        self.current_load -= done;
        self.total_processed += done;
        self.busy = self.current_load > 0;
        done
    }
}
