//! Learners, budget managers and the budget-gated active learner.

pub mod active;
pub mod budget;
pub mod classifiers;
pub mod domain;

pub use active::{BudgetState, LimitedInstances};
pub use domain::{max_index, ActiveClassifier, BudgetManager, Classifier};
