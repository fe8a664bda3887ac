//! Optional performance evaluators whose measurements trail each snapshot.
//!
//! Both variants share `Tally`; the windowed one subtracts examples that
//! slide out of its window.

use std::collections::VecDeque;

use crate::data::domain::Example;
use crate::learning::domain::max_index;

use super::domain::Measurement;

pub const CLASSIFIED: &str = "classified instances";
pub const CORRECT_PERCENT: &str = "classifications correct (percent)";
/// Cohen's kappa against chance agreement, in percent.
pub const KAPPA_PERCENT: &str = "Kappa Statistic (percent)";
pub const ACQUIRED_LABELS: &str = "acquired labels";
pub const ACQUISITION_RATE: &str = "label acquisition rate (percent)";

/// Receives every prediction and acquisition decision of a run.
pub trait PerformanceEvaluator {
    fn reset(&mut self);

    fn add_result(&mut self, example: &Example, votes: &[f64]);

    /// Called after `add_result` for the same example.
    fn do_label_acq_report(&mut self, example: &Example, acquired: u8);

    fn measurements(&self) -> Vec<Measurement>;
}

#[derive(Clone, Debug, Default)]
struct Tally {
    seen: u64,
    correct: u64,
    acquired: u64,
    true_counts: Vec<u64>,
    predicted_counts: Vec<u64>,
}

impl Tally {
    fn bump(counts: &mut Vec<u64>, class: usize) {
        if class >= counts.len() {
            counts.resize(class + 1, 0);
        }
        counts[class] += 1;
    }

    fn add(&mut self, true_class: usize, predicted: usize) {
        self.seen += 1;
        if true_class == predicted {
            self.correct += 1;
        }
        Self::bump(&mut self.true_counts, true_class);
        Self::bump(&mut self.predicted_counts, predicted);
    }

    fn remove(&mut self, true_class: usize, predicted: usize, acquired: u8) {
        self.seen -= 1;
        if true_class == predicted {
            self.correct -= 1;
        }
        self.true_counts[true_class] -= 1;
        self.predicted_counts[predicted] -= 1;
        self.acquired -= u64::from(acquired);
    }

    fn measurements(&self) -> Vec<Measurement> {
        let seen = self.seen as f64;
        let percent = |num: f64| if seen > 0.0 { 100.0 * num / seen } else { 0.0 };

        let accuracy = if seen > 0.0 { self.correct as f64 / seen } else { 0.0 };
        let chance: f64 = if seen > 0.0 {
            self.true_counts
                .iter()
                .zip(&self.predicted_counts)
                .map(|(&t, &p)| (t as f64 / seen) * (p as f64 / seen))
                .sum()
        } else {
            0.0
        };
        let kappa = if chance < 1.0 {
            (accuracy - chance) / (1.0 - chance)
        } else {
            0.0
        };

        vec![
            Measurement::new(CLASSIFIED, seen),
            Measurement::new(CORRECT_PERCENT, percent(self.correct as f64)),
            Measurement::new(KAPPA_PERCENT, 100.0 * kappa),
            Measurement::new(ACQUIRED_LABELS, self.acquired as f64),
            Measurement::new(ACQUISITION_RATE, percent(self.acquired as f64)),
        ]
    }
}

/// Cumulative statistics since the start of the run.
#[derive(Clone, Debug, Default)]
pub struct BasicEvaluator {
    tally: Tally,
}

impl BasicEvaluator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PerformanceEvaluator for BasicEvaluator {
    fn reset(&mut self) {
        self.tally = Tally::default();
    }

    fn add_result(&mut self, example: &Example, votes: &[f64]) {
        self.tally.add(example.class(), max_index(votes));
    }

    fn do_label_acq_report(&mut self, _example: &Example, acquired: u8) {
        self.tally.acquired += u64::from(acquired);
    }

    fn measurements(&self) -> Vec<Measurement> {
        self.tally.measurements()
    }
}

/// Statistics over the most recent `width` examples.
#[derive(Clone, Debug)]
pub struct WindowEvaluator {
    width: usize,
    window: VecDeque<(usize, usize, u8)>,
    tally: Tally,
}

impl WindowEvaluator {
    /// A `width` of zero is treated as one.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            window: VecDeque::with_capacity(width.max(1)),
            tally: Tally::default(),
        }
    }
}

impl PerformanceEvaluator for WindowEvaluator {
    fn reset(&mut self) {
        self.window.clear();
        self.tally = Tally::default();
    }

    fn add_result(&mut self, example: &Example, votes: &[f64]) {
        if self.window.len() == self.width {
            if let Some((t, p, a)) = self.window.pop_front() {
                self.tally.remove(t, p, a);
            }
        }
        let predicted = max_index(votes);
        self.window.push_back((example.class(), predicted, 0));
        self.tally.add(example.class(), predicted);
    }

    fn do_label_acq_report(&mut self, _example: &Example, acquired: u8) {
        if let Some(entry) = self.window.back_mut() {
            entry.2 = acquired;
            self.tally.acquired += u64::from(acquired);
        }
    }

    fn measurements(&self) -> Vec<Measurement> {
        self.tally.measurements()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(ms: &[Measurement], name: &str) -> f64 {
        ms.iter().find(|m| m.name == name).map(|m| m.value).unwrap()
    }

    fn feed(ev: &mut dyn PerformanceEvaluator, label: usize, votes: &[f64], acquired: u8) {
        let ex = Example::new(vec![], label);
        ev.add_result(&ex, votes);
        ev.do_label_acq_report(&ex, acquired);
    }

    #[test]
    fn basic_accuracy_and_acquisition() {
        let mut ev = BasicEvaluator::new();
        feed(&mut ev, 0, &[1.0, 0.0], 1);
        feed(&mut ev, 1, &[1.0, 0.0], 0);
        feed(&mut ev, 1, &[0.0, 1.0], 1);
        feed(&mut ev, 0, &[1.0, 0.0], 0);
        let ms = ev.measurements();
        assert_eq!(value(&ms, CLASSIFIED), 4.0);
        assert_eq!(value(&ms, CORRECT_PERCENT), 75.0);
        assert_eq!(value(&ms, ACQUIRED_LABELS), 2.0);
        assert_eq!(value(&ms, ACQUISITION_RATE), 50.0);
        // p0 = 0.75, pc = 0.5*0.75 + 0.5*0.25 = 0.5
        assert!((value(&ms, KAPPA_PERCENT) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn window_forgets_old_examples() {
        let mut ev = WindowEvaluator::new(2);
        feed(&mut ev, 0, &[0.0, 1.0], 1);
        feed(&mut ev, 1, &[0.0, 1.0], 0);
        feed(&mut ev, 0, &[1.0, 0.0], 0);
        let ms = ev.measurements();
        assert_eq!(value(&ms, CLASSIFIED), 2.0);
        assert_eq!(value(&ms, CORRECT_PERCENT), 100.0);
        assert_eq!(value(&ms, ACQUIRED_LABELS), 0.0);
    }

    #[test]
    fn empty_evaluator_reports_zeroes() {
        let ev = BasicEvaluator::new();
        let ms = ev.measurements();
        assert_eq!(value(&ms, CORRECT_PERCENT), 0.0);
        assert_eq!(value(&ms, KAPPA_PERCENT), 0.0);
    }
}
