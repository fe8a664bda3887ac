//! Domain primitives for prequential evaluation results.
//!
//! A `Snapshot` is an ordered list of named values; a `LearningCurve` is the
//! append-only sequence of snapshots captured during one run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::config::TaskCfg;

/// Ordering column: examples processed so far.
pub const INSTANCES: &str = "learning evaluation instances";
/// Wall-clock seconds since the run started.
pub const EVALUATION_TIME: &str = "evaluation time (seconds)";
/// Cumulative RAM-hours of the learner.
pub const MODEL_COST: &str = "model cost (RAM-Hours)";
/// Examples counted in the interval, after the seed correction.
pub const TOTAL_EXAMPLES: &str = "total examples";
pub const TP: &str = "TP";
pub const FP: &str = "FP";
pub const FN: &str = "FN";
pub const TN: &str = "TN";

/// Column name of a delta-matrix cell, e.g. `"0x1"`.
pub fn cell_name(true_class: usize, predicted_class: usize) -> String {
    format!("{true_class}x{predicted_class}")
}

/// Named scalar value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: f64,
}

impl Measurement {
    /// Measurement named `name`.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Measurements captured at one sampling boundary, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    measurements: Vec<Measurement>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value; duplicates are kept.
    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.measurements.push(Measurement::new(name, value));
    }

    /// Append several measurements in order.
    pub fn extend(&mut self, measurements: impl IntoIterator<Item = Measurement>) {
        self.measurements.extend(measurements);
    }

    /// First value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.measurements
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value)
    }

    /// All measurements in insertion order.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.measurements.iter().map(|m| m.name.as_str())
    }
}

/// Ordered snapshots of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    ordering_measurement: String,
    entries: Vec<Snapshot>,
}

impl LearningCurve {
    /// Empty curve ordered by `ordering_measurement`.
    pub fn new(ordering_measurement: impl Into<String>) -> Self {
        Self {
            ordering_measurement: ordering_measurement.into(),
            entries: Vec::new(),
        }
    }

    /// Append a snapshot.
    pub fn insert_entry(&mut self, snapshot: Snapshot) {
        self.entries.push(snapshot);
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    /// Most recent snapshot.
    pub fn last(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    /// Column names of the first entry joined by commas; empty before any entry.
    pub fn header_to_string(&self) -> String {
        self.entries
            .first()
            .map(|s| s.names().collect::<Vec<_>>().join(","))
            .unwrap_or_default()
    }

    /// Values of entry `index` joined by commas.
    pub fn entry_to_string(&self, index: usize) -> Option<String> {
        self.entries.get(index).map(|s| {
            s.measurements()
                .iter()
                .map(|m| m.value.to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
    }

    /// Values of `name` across all entries, skipping entries without it.
    pub fn series(&self, name: &str) -> Vec<f64> {
        self.entries.iter().filter_map(|s| s.get(name)).collect()
    }
}

/// Limits fixed for the duration of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunLimits {
    pub max_instances: Option<u64>,
    pub max_time: Option<Duration>,
    /// `0` disables periodic snapshots; the final snapshot is still taken.
    pub sample_frequency: u64,
}

impl RunLimits {
    /// No instance or time limit.
    pub fn unlimited(sample_frequency: u64) -> Self {
        Self {
            max_instances: None,
            max_time: None,
            sample_frequency,
        }
    }

    /// Whether a snapshot is due after `processed` examples.
    pub fn is_sampling_boundary(&self, processed: u64) -> bool {
        self.sample_frequency > 0 && processed % self.sample_frequency == 0
    }

    /// Whether the instance limit forbids fetching another example.
    pub fn instances_exhausted(&self, processed: u64) -> bool {
        self.max_instances.map_or(false, |max| processed >= max)
    }
}

impl From<&TaskCfg> for RunLimits {
    fn from(cfg: &TaskCfg) -> Self {
        Self {
            max_instances: cfg.max_instances(),
            max_time: cfg.max_time(),
            sample_frequency: cfg.sample_frequency,
        }
    }
}

/// Lifecycle of an evaluation task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Idle,
    Running,
    Completed,
    Aborted,
    /// The last run ended with an error.
    Failed,
}

/// Completed run: the learning curve plus what produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: String,
    pub run_id: String,
    pub started_ms: u64,
    pub instances_processed: u64,
    pub curve: LearningCurve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keeps_insertion_order() {
        let mut snap = Snapshot::new();
        snap.push(INSTANCES, 10.0);
        snap.push(TP, 4.0);
        snap.push(cell_name(0, 1), 0.0);
        assert_eq!(snap.names().collect::<Vec<_>>(), vec![INSTANCES, TP, "0x1"]);
        assert_eq!(snap.get(TP), Some(4.0));
        assert_eq!(snap.get("missing"), None);
    }

    #[test]
    fn curve_renders_csv_lines() {
        let mut curve = LearningCurve::new(INSTANCES);
        assert_eq!(curve.header_to_string(), "");
        let mut snap = Snapshot::new();
        snap.push(INSTANCES, 100.0);
        snap.push(MODEL_COST, 0.5);
        curve.insert_entry(snap);
        assert_eq!(
            curve.header_to_string(),
            "learning evaluation instances,model cost (RAM-Hours)"
        );
        assert_eq!(curve.entry_to_string(0).as_deref(), Some("100,0.5"));
        assert_eq!(curve.entry_to_string(1), None);
        assert_eq!(curve.series(INSTANCES), vec![100.0]);
    }

    #[test]
    fn sampling_boundaries() {
        let limits = RunLimits::unlimited(5);
        assert!(!limits.is_sampling_boundary(4));
        assert!(limits.is_sampling_boundary(10));
        assert!(!RunLimits::unlimited(0).is_sampling_boundary(10));
        let capped = RunLimits {
            max_instances: Some(3),
            ..limits
        };
        assert!(!capped.instances_exhausted(2));
        assert!(capped.instances_exhausted(3));
    }
}
