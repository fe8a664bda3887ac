//! Prequential (test-then-train) evaluation of an active learner.
//!
//! One run is single-threaded and synchronous. Control goes back to the
//! caller only through the monitor at polling boundaries and through
//! blocking stream reads. All per-run state lives in `RunContext` and is
//! dropped when `run` returns, so independent tasks never share anything.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::common::config::TaskCfg;
use crate::common::error::{EvalError, EvalResult};
use crate::common::{ids, time};
use crate::data::domain::ExampleStream;
use crate::learning::domain::{max_index, ActiveClassifier};
use crate::monitor::domain::{Progress, TaskMonitor};

use super::confusion::{derive_binary_metrics, ConfusionTracker};
use super::domain::{
    cell_name, LearningCurve, RunLimits, Snapshot, TaskResult, TaskState, EVALUATION_TIME, FN, FP,
    INSTANCES, MODEL_COST, TN, TOTAL_EXAMPLES, TP,
};
use super::evaluator::PerformanceEvaluator;
use super::repo_fs::ResultSink;

/// Task name reported in every `TaskResult`.
pub const TASK_NAME: &str = "al-prequential-evaluation";

/// Instances between abort checks unless configured otherwise.
pub const INSTANCES_BETWEEN_MONITOR_UPDATES: u64 = 10;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StopReason {
    StreamExhausted,
    InstanceLimit,
    TimeLimit,
}

impl StopReason {
    fn as_str(&self) -> &'static str {
        match self {
            StopReason::StreamExhausted => "stream_exhausted",
            StopReason::InstanceLimit => "instance_limit",
            StopReason::TimeLimit => "time_limit",
        }
    }
}

struct RunContext {
    tracker: ConfusionTracker,
    curve: LearningCurve,
    processed: u64,
    last_snapshot_at: u64,
    start: Instant,
    last_snapshot: Instant,
    ram_hours: f64,
    sink: Option<ResultSink>,
}

/// Evaluation task configured once and runnable repeatedly.
pub struct PrequentialTask {
    class_count: usize,
    target_class: usize,
    limits: RunLimits,
    monitor_interval: u64,
    dump_file: Option<PathBuf>,
    evaluator: Option<Box<dyn PerformanceEvaluator>>,
    state: TaskState,
}

impl PrequentialTask {
    /// Task over `class_count` classes reporting class `0`, polling every ten instances.
    pub fn new(class_count: usize, limits: RunLimits) -> Self {
        Self {
            class_count,
            target_class: 0,
            limits,
            monitor_interval: INSTANCES_BETWEEN_MONITOR_UPDATES,
            dump_file: None,
            evaluator: None,
            state: TaskState::Idle,
        }
    }

    /// Task built from the `[task]` configuration section.
    pub fn from_cfg(cfg: &TaskCfg) -> Self {
        let mut task = Self::new(cfg.class_count, RunLimits::from(cfg))
            .with_target_class(cfg.target_class)
            .with_monitor_interval(cfg.monitor_interval);
        task.dump_file = cfg.dump_file.clone();
        task
    }

    /// Class whose TP/FP/FN/TN each snapshot reports.
    pub fn with_target_class(mut self, target: usize) -> Self {
        self.target_class = target;
        self
    }

    /// Instances between abort checks and progress reports.
    pub fn with_monitor_interval(mut self, every: u64) -> Self {
        self.monitor_interval = every;
        self
    }

    /// Append every snapshot to `path`.
    pub fn with_dump_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_file = Some(path.into());
        self
    }

    /// Append `evaluator`'s measurements to every snapshot.
    pub fn with_evaluator(mut self, evaluator: Box<dyn PerformanceEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Lifecycle state after the most recent `run`.
    pub fn state(&self) -> TaskState {
        self.state
    }

    fn validate(&self, stream: &dyn ExampleStream) -> EvalResult<()> {
        let n = self.class_count;
        if n < 2 {
            return Err(EvalError::invalid(format!("class count must be >= 2, got {n}")));
        }
        if self.target_class >= n {
            return Err(EvalError::invalid(format!(
                "target class {} out of range for {n} classes",
                self.target_class
            )));
        }
        if self.monitor_interval == 0 {
            return Err(EvalError::invalid("monitor interval must be >= 1"));
        }
        let declared = stream.header().num_classes;
        if declared > n {
            return Err(EvalError::invalid(format!(
                "stream declares {declared} classes but the task evaluates {n}"
            )));
        }
        Ok(())
    }

    fn run_id(&self, stream: &dyn ExampleStream) -> String {
        let limits = format!("{:?}", self.limits);
        let n = self.class_count.to_string();
        let target = self.target_class.to_string();
        ids::run_id(&[TASK_NAME, &stream.header().relation, &n, &target, &limits])
    }

    /// Evaluate `learner` on `stream`.
    ///
    /// Returns `Ok(None)` when the monitor aborted the run. Errors from the
    /// result sink surface before any example is read. Any error leaves the
    /// task in `TaskState::Failed`.
    pub fn run(
        &mut self,
        stream: &mut dyn ExampleStream,
        learner: &mut dyn ActiveClassifier,
        monitor: &mut dyn TaskMonitor,
    ) -> EvalResult<Option<TaskResult>> {
        let outcome = self.execute(stream, learner, monitor);
        if let Err(err) = &outcome {
            self.state = TaskState::Failed;
            warn!(
                module = "evaluation",
                event = "run_failed",
                code = err.code() as u32,
                "prequential evaluation failed: {err}"
            );
        }
        outcome
    }

    fn execute(
        &mut self,
        stream: &mut dyn ExampleStream,
        learner: &mut dyn ActiveClassifier,
        monitor: &mut dyn TaskMonitor,
    ) -> EvalResult<Option<TaskResult>> {
        self.validate(stream)?;
        let sink = self.dump_file.as_ref().map(ResultSink::open).transpose()?;
        let run_id = self.run_id(stream);
        let started_ms = time::now_ms() as u64;

        learner.reset_learning();
        learner.set_model_context(stream.header());
        if let Some(evaluator) = self.evaluator.as_mut() {
            evaluator.reset();
        }

        let start = Instant::now();
        let mut ctx = RunContext {
            tracker: ConfusionTracker::new(self.class_count),
            curve: LearningCurve::new(INSTANCES),
            processed: 0,
            last_snapshot_at: 0,
            start,
            last_snapshot: start,
            ram_hours: 0.0,
            sink,
        };

        self.state = TaskState::Running;
        monitor.set_activity("Evaluating learner...");
        monitor.set_progress(Progress::Indeterminate);
        info!(
            module = "evaluation",
            event = "run_start",
            run_id = %run_id,
            classes = self.class_count,
            sample_frequency = self.limits.sample_frequency,
            "prequential evaluation started"
        );

        let reason = loop {
            if !stream.has_more_instances() {
                break StopReason::StreamExhausted;
            }
            if self.limits.instances_exhausted(ctx.processed) {
                break StopReason::InstanceLimit;
            }
            if time::limit_reached(ctx.start, self.limits.max_time) {
                break StopReason::TimeLimit;
            }

            let example = stream.next_instance()?;

            let votes = learner.votes_for_instance(&example);
            let predicted = max_index(&votes);
            if let Some(evaluator) = self.evaluator.as_mut() {
                evaluator.add_result(&example, &votes);
            }

            learner.train_on_instance(&example);
            let acquired = learner.last_label_acq_report();
            if let Some(evaluator) = self.evaluator.as_mut() {
                evaluator.do_label_acq_report(&example, acquired);
            }

            ctx.tracker.record(example.class(), predicted);
            ctx.processed += 1;

            if self.limits.is_sampling_boundary(ctx.processed) || !stream.has_more_instances() {
                self.capture_snapshot(&mut ctx, learner)?;
            }

            if ctx.processed % self.monitor_interval == 0 {
                if monitor.should_abort() {
                    self.state = TaskState::Aborted;
                    warn!(
                        module = "evaluation",
                        event = "run_aborted",
                        run_id = %run_id,
                        processed = ctx.processed,
                        "monitor requested abort"
                    );
                    return Ok(None);
                }
                let remaining = stream.estimated_remaining_instances();
                monitor.set_progress(progress(ctx.processed, remaining, self.limits.max_instances));
                if monitor.preview_requested() {
                    monitor.publish_preview(&ctx.curve);
                }
            }
        };

        if self.limits.sample_frequency == 0 && ctx.processed > ctx.last_snapshot_at {
            self.capture_snapshot(&mut ctx, learner)?;
        }

        self.state = TaskState::Completed;
        info!(
            module = "evaluation",
            event = "run_complete",
            run_id = %run_id,
            reason = reason.as_str(),
            processed = ctx.processed,
            snapshots = ctx.curve.num_entries(),
            "prequential evaluation finished"
        );

        Ok(Some(TaskResult {
            task: TASK_NAME.to_string(),
            run_id,
            started_ms,
            instances_processed: ctx.processed,
            curve: ctx.curve,
        }))
    }

    fn capture_snapshot(
        &mut self,
        ctx: &mut RunContext,
        learner: &dyn ActiveClassifier,
    ) -> EvalResult<()> {
        let now = Instant::now();
        let elapsed = time::seconds_between(ctx.start, now);
        let interval = time::seconds_between(ctx.last_snapshot, now);
        let gigabytes = learner.measure_byte_size() as f64 / BYTES_PER_GB;
        ctx.ram_hours += gigabytes * time::seconds_to_hours(interval);
        ctx.last_snapshot = now;

        let delta = ctx.tracker.take_interval();
        let binary = derive_binary_metrics(&delta, self.target_class);

        let mut snapshot = Snapshot::new();
        snapshot.push(INSTANCES, ctx.processed as f64);
        snapshot.push(EVALUATION_TIME, elapsed);
        snapshot.push(MODEL_COST, ctx.ram_hours);
        snapshot.push(TOTAL_EXAMPLES, delta.total() as f64);
        snapshot.push(TP, binary.tp as f64);
        snapshot.push(FP, binary.fp as f64);
        snapshot.push(FN, binary.fn_ as f64);
        snapshot.push(TN, binary.tn as f64);
        for (t, p, count) in delta.iter() {
            snapshot.push(cell_name(t, p), count as f64);
        }
        if let Some(evaluator) = self.evaluator.as_ref() {
            snapshot.extend(evaluator.measurements());
        }

        ctx.curve.insert_entry(snapshot);
        ctx.last_snapshot_at = ctx.processed;
        if let Some(sink) = ctx.sink.as_mut() {
            sink.append_latest(&ctx.curve)?;
        }

        debug!(
            module = "evaluation",
            event = "snapshot",
            processed = ctx.processed,
            interval_examples = delta.total(),
            tp = binary.tp,
            fp = binary.fp,
            fn_ = binary.fn_,
            tn = binary.tn,
        );
        Ok(())
    }
}

/// Completion fraction for the monitor.
///
/// With an instance limit the stream's estimate is replaced by the remaining
/// instance budget whenever the estimate is missing, zero, or larger.
pub fn progress(
    processed: u64,
    estimated_remaining: Option<u64>,
    max_instances: Option<u64>,
) -> Progress {
    let remaining = match max_instances {
        Some(max) => {
            let max_remaining = max.saturating_sub(processed);
            match estimated_remaining {
                Some(estimate) if estimate > 0 && estimate <= max_remaining => Some(estimate),
                _ => Some(max_remaining),
            }
        }
        None => estimated_remaining,
    };
    match remaining {
        Some(left) if processed + left > 0 => {
            Progress::Fraction(processed as f64 / (processed + left) as f64)
        }
        Some(_) => Progress::Fraction(0.0),
        None => Progress::Indeterminate,
    }
}
