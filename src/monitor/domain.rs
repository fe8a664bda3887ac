//! Monitor contract consumed by the evaluation loop.

use crate::evaluation::domain::LearningCurve;

/// Completion estimate reported at each polling boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Progress {
    /// Fraction in `[0, 1]`.
    Fraction(f64),
    /// The stream cannot estimate what is left.
    Indeterminate,
}

/// Observer of a running task. Polled by the loop at a fixed instance cadence.
pub trait TaskMonitor {
    fn set_activity(&mut self, _description: &str) {}

    fn should_abort(&self) -> bool;

    fn set_progress(&mut self, progress: Progress);

    fn preview_requested(&self) -> bool {
        true
    }

    fn publish_preview(&mut self, preview: &LearningCurve);
}
