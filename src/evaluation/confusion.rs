//! Incremental multi-class confusion matrix and per-interval deltas.
//!
//! The cumulative matrix only counts real examples, so its cell sum always
//! equals the number of recorded pairs. The first interval of a run drops one
//! seed unit, which sits on the cell of the first recorded pair, so its
//! published counts line up with established learning curves.

/// Cumulative `(true, predicted)` counts for `n` classes, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfusionMatrix {
    n: usize,
    cells: Vec<u64>,
}

impl ConfusionMatrix {
    /// Zeroed `class_count` x `class_count` matrix.
    pub fn new(class_count: usize) -> Self {
        Self {
            n: class_count,
            cells: vec![0; class_count * class_count],
        }
    }

    /// Panics when either class lies outside `[0, n)`.
    pub fn record(&mut self, true_class: usize, predicted_class: usize) {
        assert!(
            true_class < self.n && predicted_class < self.n,
            "class pair ({true_class}, {predicted_class}) outside [0, {})",
            self.n
        );
        self.cells[true_class * self.n + predicted_class] += 1;
    }

    /// Count of `(true_class, predicted_class)`.
    pub fn get(&self, true_class: usize, predicted_class: usize) -> u64 {
        self.cells[true_class * self.n + predicted_class]
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().sum()
    }

    /// Row-major copy usable as the baseline of a later `delta`.
    pub fn totals(&self) -> Vec<u64> {
        self.cells.clone()
    }

    /// `current - previous` per cell; `previous` must come from `totals()`.
    pub fn delta(&self, previous: &[u64]) -> DeltaMatrix {
        assert_eq!(previous.len(), self.cells.len(), "baseline shape mismatch");
        let cells = self
            .cells
            .iter()
            .zip(previous)
            .map(|(current, prev)| current - prev)
            .collect();
        DeltaMatrix { n: self.n, cells }
    }
}

/// Counts accumulated between two sampling boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaMatrix {
    n: usize,
    cells: Vec<u64>,
}

impl DeltaMatrix {
    pub fn get(&self, true_class: usize, predicted_class: usize) -> u64 {
        self.cells[true_class * self.n + predicted_class]
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().sum()
    }

    /// Examples whose true class is `true_class`.
    pub fn row_sum(&self, true_class: usize) -> u64 {
        (0..self.n).map(|col| self.get(true_class, col)).sum()
    }

    /// Examples predicted as `predicted_class`.
    pub fn column_sum(&self, predicted_class: usize) -> u64 {
        (0..self.n).map(|row| self.get(row, predicted_class)).sum()
    }

    /// `(true, predicted, count)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &count)| (i / self.n, i % self.n, count))
    }

    fn remove_unit(&mut self, true_class: usize, predicted_class: usize) {
        let cell = &mut self.cells[true_class * self.n + predicted_class];
        *cell = cell.saturating_sub(1);
    }
}

/// One-vs-rest counts for a designated class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinaryMetrics {
    pub tp: u64,
    pub fp: u64,
    pub fn_: u64,
    pub tn: u64,
}

impl BinaryMetrics {
    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.fn_ + self.tn
    }
}

/// TP/FP/FN/TN of `target` within `delta`; the four sum to `delta.total()`.
pub fn derive_binary_metrics(delta: &DeltaMatrix, target: usize) -> BinaryMetrics {
    let tp = delta.get(target, target);
    let fp = delta.column_sum(target) - tp;
    let fn_ = delta.row_sum(target) - tp;
    let tn = delta.total() - tp - fp - fn_;
    BinaryMetrics { tp, fp, fn_, tn }
}

/// Run-scoped owner of the cumulative matrix and the last snapshot baseline.
#[derive(Clone, Debug)]
pub struct ConfusionTracker {
    matrix: ConfusionMatrix,
    baseline: Vec<u64>,
    seed: Option<(usize, usize)>,
    first_interval: bool,
}

impl ConfusionTracker {
    /// Tracker for a fresh run.
    pub fn new(class_count: usize) -> Self {
        Self {
            matrix: ConfusionMatrix::new(class_count),
            baseline: vec![0; class_count * class_count],
            seed: None,
            first_interval: true,
        }
    }

    /// Count one example; the first call fixes the seed cell.
    pub fn record(&mut self, true_class: usize, predicted_class: usize) {
        self.matrix.record(true_class, predicted_class);
        if self.seed.is_none() {
            self.seed = Some((true_class, predicted_class));
        }
    }

    /// Cumulative counts of real examples.
    pub fn matrix(&self) -> &ConfusionMatrix {
        &self.matrix
    }

    /// Close the current interval and start the next one.
    ///
    /// The first interval of a run loses its seed unit.
    pub fn take_interval(&mut self) -> DeltaMatrix {
        let mut delta = self.matrix.delta(&self.baseline);
        if self.first_interval {
            if let Some((t, p)) = self.seed {
                delta.remove_unit(t, p);
            }
            self.first_interval = false;
        }
        self.baseline = self.matrix.totals();
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_sum_equals_records() {
        let mut cm = ConfusionMatrix::new(3);
        let pairs = [(0, 0), (1, 2), (2, 2), (1, 1), (0, 2)];
        for (k, &(t, p)) in pairs.iter().enumerate() {
            cm.record(t, p);
            assert_eq!(cm.total(), k as u64 + 1);
        }
        assert_eq!(cm.get(1, 2), 1);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_range_class_panics() {
        let mut cm = ConfusionMatrix::new(2);
        cm.record(0, 2);
    }

    #[test]
    fn delta_is_pure() {
        let mut cm = ConfusionMatrix::new(2);
        cm.record(0, 0);
        let base = cm.totals();
        cm.record(1, 0);
        cm.record(1, 0);
        let delta = cm.delta(&base);
        assert_eq!(delta.get(1, 0), 2);
        assert_eq!(delta.get(0, 0), 0);
        assert_eq!(cm.total(), 3);
    }

    #[test]
    fn binary_metrics_multiclass() {
        let mut cm = ConfusionMatrix::new(3);
        // true 0: predicted 0,0,1 ; true 1: predicted 0,1 ; true 2: predicted 0,2,2
        for (t, p) in [(0, 0), (0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 2), (2, 2)] {
            cm.record(t, p);
        }
        let delta = cm.delta(&[0; 9]);
        let m = derive_binary_metrics(&delta, 0);
        assert_eq!(m, BinaryMetrics { tp: 2, fp: 2, fn_: 1, tn: 3 });
        assert_eq!(m.total(), 8);
        let m2 = derive_binary_metrics(&delta, 2);
        assert_eq!(m2, BinaryMetrics { tp: 2, fp: 0, fn_: 1, tn: 5 });
    }

    #[test]
    fn first_interval_drops_seed_unit_only_once() {
        let mut tracker = ConfusionTracker::new(2);
        for (t, p) in [(1, 0), (0, 0), (1, 1)] {
            tracker.record(t, p);
        }
        let first = tracker.take_interval();
        assert_eq!(first.get(1, 0), 0);
        assert_eq!(first.total(), 2);

        tracker.record(1, 0);
        tracker.record(1, 0);
        let second = tracker.take_interval();
        assert_eq!(second.get(1, 0), 2);
        assert_eq!(second.total(), 2);
        assert_eq!(tracker.matrix().total(), 5);
    }

    #[test]
    fn golden_always_zero_scenario() {
        let mut tracker = ConfusionTracker::new(2);
        for label in [0, 0, 1, 1, 0, 1, 0, 1, 1, 0] {
            tracker.record(label, 0);
        }
        let delta = tracker.take_interval();
        let m = derive_binary_metrics(&delta, 0);
        assert_eq!(m, BinaryMetrics { tp: 4, fp: 5, fn_: 0, tn: 0 });
        assert_eq!(delta.total(), 9);
        assert_eq!(
            delta.iter().collect::<Vec<_>>(),
            vec![(0, 0, 4), (0, 1, 0), (1, 0, 5), (1, 1, 0)]
        );
    }
}
