//! Budget managers deciding which labels are acquired.

use super::domain::{max_posterior, BudgetManager};

/// Acquires every label.
#[derive(Clone, Debug, Default)]
pub struct AlwaysAcquire {
    last: bool,
}

impl BudgetManager for AlwaysAcquire {
    fn reset_learning(&mut self) {
        self.last = false;
    }

    fn decide(&mut self, _votes: &[f64]) -> bool {
        self.last = true;
        true
    }

    fn last_label_acq_report(&self) -> u8 {
        u8::from(self.last)
    }

    fn name(&self) -> &'static str {
        "always"
    }
}

/// Acquires the first `count` labels and nothing afterwards.
#[derive(Clone, Debug)]
pub struct FixedCount {
    count: u64,
    acquired: u64,
    last: bool,
}

impl FixedCount {
    /// Manager acquiring at most `count` labels per run.
    pub fn new(count: u64) -> Self {
        Self {
            count,
            acquired: 0,
            last: false,
        }
    }
}

impl BudgetManager for FixedCount {
    fn reset_learning(&mut self) {
        self.acquired = 0;
        self.last = false;
    }

    fn decide(&mut self, _votes: &[f64]) -> bool {
        self.last = self.acquired < self.count;
        if self.last {
            self.acquired += 1;
        }
        self.last
    }

    fn last_label_acq_report(&self) -> u8 {
        u8::from(self.last)
    }

    fn name(&self) -> &'static str {
        "fixed_count"
    }
}

/// Keeps the acquired fraction of seen labels at or below `budget`.
#[derive(Clone, Debug)]
pub struct FixedFraction {
    budget: f64,
    seen: u64,
    acquired: u64,
    last: bool,
}

impl FixedFraction {
    /// `budget` is the target acquired share in `[0, 1]`.
    pub fn new(budget: f64) -> Self {
        Self {
            budget,
            seen: 0,
            acquired: 0,
            last: false,
        }
    }
}

impl BudgetManager for FixedFraction {
    fn reset_learning(&mut self) {
        self.seen = 0;
        self.acquired = 0;
        self.last = false;
    }

    fn decide(&mut self, _votes: &[f64]) -> bool {
        self.seen += 1;
        self.last = (self.acquired as f64) < self.budget * self.seen as f64;
        if self.last {
            self.acquired += 1;
        }
        self.last
    }

    fn last_label_acq_report(&self) -> u8 {
        u8::from(self.last)
    }

    fn name(&self) -> &'static str {
        "fixed_fraction"
    }
}

/// Acquires when the model's top posterior falls below a fixed threshold.
#[derive(Clone, Debug)]
pub struct UncertaintyThreshold {
    threshold: f64,
    last: bool,
}

impl UncertaintyThreshold {
    /// Acquire when the top posterior falls below `threshold`.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last: false,
        }
    }
}

impl BudgetManager for UncertaintyThreshold {
    fn reset_learning(&mut self) {
        self.last = false;
    }

    fn decide(&mut self, votes: &[f64]) -> bool {
        self.last = max_posterior(votes) < self.threshold;
        self.last
    }

    fn last_label_acq_report(&self) -> u8 {
        u8::from(self.last)
    }

    fn name(&self) -> &'static str {
        "uncertainty"
    }
}

/// Uncertainty sampling with a self-adjusting threshold under a spending cap.
///
/// The threshold shrinks by `step` after each acquisition and grows by `step`
/// whenever budget was available but the example looked certain.
#[derive(Clone, Debug)]
pub struct VariableUncertainty {
    budget: f64,
    initial_threshold: f64,
    threshold: f64,
    step: f64,
    seen: u64,
    acquired: u64,
    last: bool,
}

impl VariableUncertainty {
    /// `threshold` is the starting posterior cut-off; `step` the relative adjustment.
    pub fn new(budget: f64, threshold: f64, step: f64) -> Self {
        Self {
            budget,
            initial_threshold: threshold,
            threshold,
            step,
            seen: 0,
            acquired: 0,
            last: false,
        }
    }
}

impl BudgetManager for VariableUncertainty {
    fn reset_learning(&mut self) {
        self.threshold = self.initial_threshold;
        self.seen = 0;
        self.acquired = 0;
        self.last = false;
    }

    fn decide(&mut self, votes: &[f64]) -> bool {
        self.seen += 1;
        self.last = false;
        let spent = self.acquired as f64 / self.seen as f64;
        if spent < self.budget {
            if max_posterior(votes) < self.threshold {
                self.threshold *= 1.0 - self.step;
                self.acquired += 1;
                self.last = true;
            } else {
                self.threshold *= 1.0 + self.step;
            }
        }
        self.last
    }

    fn last_label_acq_report(&self) -> u8 {
        u8::from(self.last)
    }

    fn name(&self) -> &'static str {
        "variable_uncertainty"
    }
}
