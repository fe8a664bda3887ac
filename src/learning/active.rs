//! Budget-gated wrapper limiting how many positive-class labels reach training.
//!
//! The wrapper owns its base classifier and budget manager. Each
//! `train_on_instance` call first applies the positive-class count limit,
//! then asks the budget manager, and only then trains the base model.

use tracing::{info, trace};

use crate::data::domain::{Example, StreamHeader};

use super::domain::{ActiveClassifier, BudgetManager, Classifier};

/// Per-run counters of the positive-class gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BudgetState {
    pub instances_released_for_training: u64,
    /// Latched once the limit is hit; cleared only by `reset_learning`.
    pub blocked: bool,
}

/// Active learner capping the positive-class examples it trains on.
pub struct LimitedInstances {
    base: Box<dyn Classifier>,
    budget_manager: Box<dyn BudgetManager>,
    limit: u64,
    positive_class: usize,
    state: BudgetState,
    /// Whether the last `train_on_instance` reached the budget manager.
    consulted: bool,
}

impl LimitedInstances {
    /// `limit == 0` disables the positive-class gate.
    pub fn new(
        base: Box<dyn Classifier>,
        budget_manager: Box<dyn BudgetManager>,
        limit: u64,
        positive_class: usize,
    ) -> Self {
        Self {
            base,
            budget_manager,
            limit,
            positive_class,
            state: BudgetState::default(),
            consulted: false,
        }
    }

    /// Gate counters of the current run.
    pub fn budget_state(&self) -> BudgetState {
        self.state
    }

    fn gate(&mut self, example: &Example) {
        if self.state.blocked || self.limit == 0 || example.class() != self.positive_class {
            return;
        }
        if self.state.instances_released_for_training < self.limit {
            self.state.instances_released_for_training += 1;
            trace!(
                module = "learning",
                event = "positive_released",
                released = self.state.instances_released_for_training,
            );
        } else {
            self.state.blocked = true;
            info!(
                module = "learning",
                event = "budget_exhausted",
                limit = self.limit,
                positive_class = self.positive_class,
                budget_manager = self.budget_manager.name(),
                "positive-class limit reached, training blocked for the rest of the run"
            );
        }
    }
}

impl Classifier for LimitedInstances {
    fn set_model_context(&mut self, header: &StreamHeader) {
        self.base.set_model_context(header);
    }

    fn votes_for_instance(&self, example: &Example) -> Vec<f64> {
        self.base.votes_for_instance(example)
    }

    fn train_on_instance(&mut self, example: &Example) {
        self.consulted = false;
        self.gate(example);
        if self.state.blocked {
            return;
        }
        let votes = self.base.votes_for_instance(example);
        self.consulted = true;
        if self.budget_manager.decide(&votes) {
            self.base.train_on_instance(example);
        }
    }

    fn reset_learning(&mut self) {
        self.base.reset_learning();
        self.budget_manager.reset_learning();
        self.state = BudgetState::default();
        self.consulted = false;
    }

    fn measure_byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.base.measure_byte_size()
    }

    fn model_description(&self) -> String {
        self.base.model_description()
    }
}

impl ActiveClassifier for LimitedInstances {
    /// The budget manager's report, or `0` when the gate kept it out of the call.
    fn last_label_acq_report(&self) -> u8 {
        if self.consulted {
            self.budget_manager.last_label_acq_report()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::learning::budget::{AlwaysAcquire, FixedCount, UncertaintyThreshold};

    /// Records every label it is trained on.
    struct Recorder {
        seen: Rc<RefCell<Vec<usize>>>,
    }

    impl Classifier for Recorder {
        fn set_model_context(&mut self, _: &StreamHeader) {}
        fn votes_for_instance(&self, _: &Example) -> Vec<f64> {
            vec![1.0, 0.0]
        }
        fn train_on_instance(&mut self, example: &Example) {
            self.seen.borrow_mut().push(example.class());
        }
        fn reset_learning(&mut self) {
            self.seen.borrow_mut().clear();
        }
        fn measure_byte_size(&self) -> usize {
            0
        }
        fn model_description(&self) -> String {
            String::new()
        }
    }

    fn wrapper(
        limit: u64,
        bm: Box<dyn BudgetManager>,
    ) -> (LimitedInstances, Rc<RefCell<Vec<usize>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let base = Recorder { seen: Rc::clone(&seen) };
        (LimitedInstances::new(Box::new(base), bm, limit, 1), seen)
    }

    fn ex(class: usize) -> Example {
        Example::new(vec![0.0], class)
    }

    #[test]
    fn releases_exactly_limit_positives() {
        let (mut learner, seen) = wrapper(3, Box::new(AlwaysAcquire::default()));
        let labels = [0, 1, 1, 0, 0, 1, 0, 1, 1, 0, 1];
        for &label in &labels {
            learner.train_on_instance(&ex(label));
        }
        let positives = seen.borrow().iter().filter(|&&c| c == 1).count();
        assert_eq!(positives, 3);
        let state = learner.budget_state();
        assert_eq!(state.instances_released_for_training, 3);
        assert!(state.blocked);
        // Negatives before the fourth positive still train; nothing after it does.
        assert_eq!(*seen.borrow(), vec![0, 1, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn blocked_state_latches_for_negatives_too() {
        let (mut learner, seen) = wrapper(1, Box::new(AlwaysAcquire::default()));
        for label in [1, 1, 0, 0] {
            learner.train_on_instance(&ex(label));
        }
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(learner.last_label_acq_report(), 0);
    }

    #[test]
    fn zero_limit_is_pass_through() {
        let (mut learner, seen) = wrapper(0, Box::new(AlwaysAcquire::default()));
        for i in 0..20 {
            learner.train_on_instance(&ex(i % 2));
            assert_eq!(learner.last_label_acq_report(), 1);
        }
        assert_eq!(seen.borrow().len(), 20);
        assert!(!learner.budget_state().blocked);
    }

    #[test]
    fn report_follows_budget_manager_decision() {
        let (mut learner, seen) = wrapper(0, Box::new(FixedCount::new(1)));
        learner.train_on_instance(&ex(0));
        assert_eq!(learner.last_label_acq_report(), 1);
        learner.train_on_instance(&ex(0));
        assert_eq!(learner.last_label_acq_report(), 0);
        // Prediction calls leave the report untouched.
        let _ = learner.votes_for_instance(&ex(0));
        assert_eq!(learner.last_label_acq_report(), 0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn report_comes_from_budget_manager() {
        let (mut declining, seen) = wrapper(0, Box::new(UncertaintyThreshold::new(0.0)));
        declining.train_on_instance(&ex(1));
        assert_eq!(declining.last_label_acq_report(), 0);
        assert!(seen.borrow().is_empty());

        let (mut eager, seen) = wrapper(0, Box::new(UncertaintyThreshold::new(1.1)));
        eager.train_on_instance(&ex(1));
        assert_eq!(eager.last_label_acq_report(), 1);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn gated_call_reports_zero_despite_earlier_acquisition() {
        let (mut learner, _) = wrapper(1, Box::new(AlwaysAcquire::default()));
        learner.train_on_instance(&ex(1));
        assert_eq!(learner.last_label_acq_report(), 1);
        learner.train_on_instance(&ex(1));
        assert!(learner.budget_state().blocked);
        assert_eq!(learner.last_label_acq_report(), 0);
    }

    #[test]
    fn reset_clears_budget_state() {
        let (mut learner, seen) = wrapper(1, Box::new(AlwaysAcquire::default()));
        learner.train_on_instance(&ex(1));
        learner.train_on_instance(&ex(1));
        assert!(learner.budget_state().blocked);

        learner.reset_learning();
        assert_eq!(learner.budget_state(), BudgetState::default());
        assert!(seen.borrow().is_empty());
        learner.train_on_instance(&ex(1));
        assert_eq!(*seen.borrow(), vec![1]);
    }
}
