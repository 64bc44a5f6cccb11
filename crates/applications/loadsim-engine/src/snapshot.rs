//! Read-only view of engine state, as handed to transport callers

use serde::{Deserialize, Deserializer, Serialize};

use crate::metrics::Metrics;
use crate::types::{Task, Worker};

/// Every worker and task field plus the global counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub workers: Vec<Worker>,
    pub tasks: Vec<Task>,
    pub current_step: u64,
    pub completed_tasks: usize,
}

impl EngineSnapshot {
    /// Number of workers still holding pooled load
    pub fn busy_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.busy).count()
    }

    /// Number of tasks assigned but not yet completed
    pub fn running_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_running()).count()
    }
}

/// Result of a single step request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub state: EngineSnapshot,
    pub complete: bool,
    /// Present only once the run is complete; `None` inside means nothing completed
    #[serde(
        default,
        deserialize_with = "present_metrics",
        skip_serializing_if = "Option::is_none"
    )]
    pub metrics: Option<Option<Metrics>>,
}

/// A `metrics` key that is present, even as `null`, belongs to a finished run
fn present_metrics<'de, D>(deserializer: D) -> Result<Option<Option<Metrics>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Metrics>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> EngineSnapshot {
        let mut task = Task::new(0, 2);
        task.assign(1, 0);
        let mut worker = Worker::new(1);
        worker.accept(&task);
        worker.busy = true;

        EngineSnapshot {
            workers: vec![Worker::new(0), worker],
            tasks: vec![task, Task::new(1, 4)],
            current_step: 1,
            completed_tasks: 0,
        }
    }

    #[test]
    fn test_snapshot_counts() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.busy_workers(), 1);
        assert_eq!(snapshot.running_tasks(), 1);
    }

    #[test]
    fn test_snapshot_wire_format() {
        let json = serde_json::to_value(sample_snapshot()).unwrap();

        assert_eq!(json["current_step"], 1);
        assert_eq!(json["completed_tasks"], 0);

        let worker = &json["workers"][1];
        assert_eq!(worker["id"], 1);
        assert_eq!(worker["current_load"], 2);
        assert_eq!(worker["total_processed"], 0);
        assert_eq!(worker["busy"], true);
        assert_eq!(worker["tasks"], serde_json::json!([0]));

        let unassigned = &json["tasks"][1];
        assert_eq!(unassigned["workload"], 4);
        assert_eq!(unassigned["assigned"], false);
        assert!(unassigned["worker_id"].is_null());
        assert!(unassigned["start_time"].is_null());
        assert!(unassigned["end_time"].is_null());
    }

    #[test]
    fn test_step_outcome_omits_metrics_until_complete() {
        let outcome = StepOutcome {
            state: sample_snapshot(),
            complete: false,
            metrics: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("metrics").is_none());

        let finished = StepOutcome {
            metrics: Some(None),
            complete: true,
            ..outcome
        };
        let json = serde_json::to_value(&finished).unwrap();
        assert!(json["metrics"].is_null());
        assert!(json.get("metrics").is_some());
    }

    #[test]
    fn test_step_outcome_keeps_null_metrics_on_read() {
        let finished = StepOutcome {
            state: sample_snapshot(),
            complete: true,
            metrics: Some(None),
        };
        let json = serde_json::to_string(&finished).unwrap();
        let parsed: StepOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.metrics, Some(None));
        assert_eq!(parsed, finished);

        let running = StepOutcome {
            complete: false,
            metrics: None,
            ..finished
        };
        let json = serde_json::to_string(&running).unwrap();
        let parsed: StepOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.metrics, None);
    }
}
