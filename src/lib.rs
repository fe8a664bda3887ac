//! Prequential evaluation of budget-constrained active learners.
//!
//! `evaluation::PrequentialTask` drives an `ExampleStream` through an
//! `ActiveClassifier`, producing a `LearningCurve` of per-interval confusion
//! measurements. `registry` builds the reference components by name.

pub mod common;
pub mod data;
pub mod evaluation;
pub mod learning;
pub mod monitor;
pub mod registry;

pub use common::{ErrorCode, EvalError, EvalResult};
pub use evaluation::{LearningCurve, PrequentialTask, TaskResult};
