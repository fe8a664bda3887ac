//! Capability contracts for learners and budget managers.
//!
//! Concrete strategies are selected by name through `crate::registry`.

use crate::data::domain::{Example, StreamHeader};

/// Incremental classifier trained one example at a time.
pub trait Classifier {
    /// Inform the model about the stream schema before training starts.
    fn set_model_context(&mut self, header: &StreamHeader);

    /// Per-class votes; must not mutate the model.
    fn votes_for_instance(&self, example: &Example) -> Vec<f64>;

    fn train_on_instance(&mut self, example: &Example);

    fn reset_learning(&mut self);

    /// Approximate heap plus inline footprint in bytes.
    fn measure_byte_size(&self) -> usize;

    fn model_description(&self) -> String;
}

/// Classifier that may withhold labels from its own training step.
pub trait ActiveClassifier: Classifier {
    /// `1` when the previous `train_on_instance` used the label, `0` otherwise.
    fn last_label_acq_report(&self) -> u8;
}

/// Decides, per example, whether to spend budget on acquiring the label.
pub trait BudgetManager {
    fn reset_learning(&mut self);

    /// `votes` are the current model's votes for the example under consideration.
    fn decide(&mut self, votes: &[f64]) -> bool;

    fn last_label_acq_report(&self) -> u8;

    fn name(&self) -> &'static str;
}

/// Index of the highest vote; ties go to the lowest index, empty votes to 0.
pub fn max_index(votes: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in votes.iter().enumerate() {
        if *v > votes[best] {
            best = i;
        }
    }
    best
}

/// Largest vote after normalising the vector to sum to one.
///
/// Returns `0.0` when the votes carry no mass, which budget managers treat
/// as maximal uncertainty.
pub fn max_posterior(votes: &[f64]) -> f64 {
    let total: f64 = votes.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return 0.0;
    }
    votes.iter().cloned().fold(0.0, f64::max) / total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_index_prefers_lowest_on_ties() {
        assert_eq!(max_index(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(max_index(&[2.0, 2.0]), 0);
        assert_eq!(max_index(&[]), 0);
        assert_eq!(max_index(&[0.0, 0.0, 0.1]), 2);
    }

    #[test]
    fn max_posterior_normalises() {
        assert_eq!(max_posterior(&[1.0, 3.0]), 0.75);
        assert_eq!(max_posterior(&[0.0, 0.0]), 0.0);
        assert_eq!(max_posterior(&[]), 0.0);
    }
}
