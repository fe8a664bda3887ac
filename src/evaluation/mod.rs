//! Prequential evaluation: confusion accounting, snapshots and the run loop.

pub mod confusion;
pub mod domain;
pub mod evaluator;
pub mod repo_fs;
pub mod service;

pub use confusion::{
    derive_binary_metrics, BinaryMetrics, ConfusionMatrix, ConfusionTracker, DeltaMatrix,
};
pub use domain::{LearningCurve, Measurement, RunLimits, Snapshot, TaskResult, TaskState};
pub use evaluator::{BasicEvaluator, PerformanceEvaluator, WindowEvaluator};
pub use repo_fs::ResultSink;
pub use service::PrequentialTask;
