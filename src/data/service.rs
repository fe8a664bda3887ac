//! In-memory stream used by tests and embedding callers.

use crate::common::error::{EvalError, EvalResult};

use super::domain::{Example, ExampleStream, StreamHeader};

/// Replays a fixed vector of examples in order.
pub struct VecStream {
    header: StreamHeader,
    examples: Vec<Example>,
    position: usize,
}

impl VecStream {
    /// Stream replaying `examples` under `header`.
    pub fn new(header: StreamHeader, examples: Vec<Example>) -> Self {
        Self {
            header,
            examples,
            position: 0,
        }
    }

    /// Single-feature stream whose only attribute is the example's index.
    pub fn from_labels(labels: &[usize], num_classes: usize) -> Self {
        let examples = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| Example::new(vec![i as f64], label))
            .collect();
        Self::new(StreamHeader::anonymous(1, num_classes), examples)
    }
}

impl ExampleStream for VecStream {
    fn header(&self) -> &StreamHeader {
        &self.header
    }

    fn has_more_instances(&mut self) -> bool {
        self.position < self.examples.len()
    }

    fn next_instance(&mut self) -> EvalResult<Example> {
        let example = self
            .examples
            .get(self.position)
            .cloned()
            .ok_or_else(|| EvalError::stream("vector stream exhausted"))?;
        self.position += 1;
        Ok(example)
    }

    fn estimated_remaining_instances(&self) -> Option<u64> {
        Some((self.examples.len() - self.position) as u64)
    }

    fn restart(&mut self) -> EvalResult<()> {
        self.position = 0;
        Ok(())
    }
}
