//! Core example and stream definitions.
//!
//! An `Example` is immutable once produced; the stream hands ownership to the
//! evaluation loop which only ever borrows it afterwards.

use serde::{Deserialize, Serialize};

use crate::common::error::EvalResult;

/// Schema of a stream: feature names and the declared number of classes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamHeader {
    pub relation: String,
    pub attribute_names: Vec<String>,
    pub num_classes: usize,
}

impl StreamHeader {
    /// Header with explicit attribute names.
    pub fn new(
        relation: impl Into<String>,
        attribute_names: Vec<String>,
        num_classes: usize,
    ) -> Self {
        Self {
            relation: relation.into(),
            attribute_names,
            num_classes,
        }
    }

    /// Header with generated `att1..attN` names.
    pub fn anonymous(num_attributes: usize, num_classes: usize) -> Self {
        let names = (1..=num_attributes).map(|i| format!("att{i}")).collect();
        Self::new("stream", names, num_classes)
    }

    /// Number of feature columns, excluding the label.
    pub fn num_attributes(&self) -> usize {
        self.attribute_names.len()
    }
}

/// Labeled example drawn from a stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
    features: Vec<f64>,
    class: usize,
}

impl Example {
    /// Labelled example; `class` must lie in `[0, n)`.
    pub fn new(features: Vec<f64>, class: usize) -> Self {
        Self { features, class }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// True class label in `[0, N)`.
    pub fn class(&self) -> usize {
        self.class
    }
}

/// Source of examples consumed one at a time by the evaluation loop.
///
/// `next_instance` may block on I/O. Faults surface as `EvalError::Stream`.
pub trait ExampleStream {
    fn header(&self) -> &StreamHeader;

    fn has_more_instances(&mut self) -> bool;

    fn next_instance(&mut self) -> EvalResult<Example>;

    /// `None` when the source cannot estimate what is left.
    fn estimated_remaining_instances(&self) -> Option<u64>;

    fn restart(&mut self) -> EvalResult<()>;
}
