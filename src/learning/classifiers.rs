//! Reference base learners usable without external model code.

use std::mem::size_of;

use crate::data::domain::{Example, StreamHeader};

use super::domain::{max_index, Classifier};

/// Predicts the most frequent class seen so far.
#[derive(Clone, Debug, Default)]
pub struct MajorityClass {
    counts: Vec<f64>,
}

impl MajorityClass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for MajorityClass {
    fn set_model_context(&mut self, header: &StreamHeader) {
        if self.counts.len() < header.num_classes {
            self.counts.resize(header.num_classes, 0.0);
        }
    }

    fn votes_for_instance(&self, _example: &Example) -> Vec<f64> {
        self.counts.clone()
    }

    fn train_on_instance(&mut self, example: &Example) {
        let class = example.class();
        if class >= self.counts.len() {
            self.counts.resize(class + 1, 0.0);
        }
        self.counts[class] += 1.0;
    }

    fn reset_learning(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0.0);
    }

    fn measure_byte_size(&self) -> usize {
        size_of::<Self>() + self.counts.capacity() * size_of::<f64>()
    }

    fn model_description(&self) -> String {
        format!(
            "MajorityClass: predicts {} (counts {:?})",
            max_index(&self.counts),
            self.counts
        )
    }
}

/// Predicts the label of the most recent training example.
#[derive(Clone, Debug, Default)]
pub struct NoChange {
    num_classes: usize,
    last_class: Option<usize>,
}

impl NoChange {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for NoChange {
    fn set_model_context(&mut self, header: &StreamHeader) {
        self.num_classes = header.num_classes;
    }

    fn votes_for_instance(&self, _example: &Example) -> Vec<f64> {
        let mut votes = vec![0.0; self.num_classes];
        if let Some(class) = self.last_class {
            if class >= votes.len() {
                votes.resize(class + 1, 0.0);
            }
            votes[class] = 1.0;
        }
        votes
    }

    fn train_on_instance(&mut self, example: &Example) {
        self.last_class = Some(example.class());
    }

    fn reset_learning(&mut self) {
        self.last_class = None;
    }

    fn measure_byte_size(&self) -> usize {
        size_of::<Self>()
    }

    fn model_description(&self) -> String {
        match self.last_class {
            Some(class) => format!("NoChange: last class {class}"),
            None => "NoChange: untrained".to_string(),
        }
    }
}

/// Running mean and variance (Welford) of one attribute within one class.
#[derive(Clone, Copy, Debug, Default)]
struct GaussianEstimator {
    n: f64,
    mean: f64,
    m2: f64,
}

impl GaussianEstimator {
    const MIN_VARIANCE: f64 = 1e-9;

    fn add(&mut self, x: f64) {
        self.n += 1.0;
        let delta = x - self.mean;
        self.mean += delta / self.n;
        self.m2 += delta * (x - self.mean);
    }

    fn variance(&self) -> f64 {
        if self.n > 1.0 {
            (self.m2 / (self.n - 1.0)).max(Self::MIN_VARIANCE)
        } else {
            // One observation: fall back to a unit-width bump around it.
            1.0
        }
    }

    fn log_density(&self, x: f64) -> f64 {
        let var = self.variance();
        let diff = x - self.mean;
        -0.5 * ((2.0 * std::f64::consts::PI * var).ln() + diff * diff / var)
    }
}

/// Gaussian naive Bayes over numeric attributes.
#[derive(Clone, Debug, Default)]
pub struct NaiveBayes {
    class_counts: Vec<f64>,
    /// `estimators[class][attribute]`
    estimators: Vec<Vec<GaussianEstimator>>,
    num_attributes: usize,
}

impl NaiveBayes {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_class(&mut self, class: usize) {
        if class >= self.class_counts.len() {
            self.class_counts.resize(class + 1, 0.0);
            self.estimators
                .resize(class + 1, vec![GaussianEstimator::default(); self.num_attributes]);
        }
    }
}

impl Classifier for NaiveBayes {
    fn set_model_context(&mut self, header: &StreamHeader) {
        self.num_attributes = header.num_attributes();
        self.class_counts = vec![0.0; header.num_classes];
        self.estimators =
            vec![vec![GaussianEstimator::default(); self.num_attributes]; header.num_classes];
    }

    fn votes_for_instance(&self, example: &Example) -> Vec<f64> {
        let total: f64 = self.class_counts.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.class_counts.len()];
        }

        let log_scores: Vec<Option<f64>> = self
            .class_counts
            .iter()
            .zip(&self.estimators)
            .map(|(&count, attrs)| {
                if count <= 0.0 {
                    return None;
                }
                let likelihood: f64 = attrs
                    .iter()
                    .zip(example.features())
                    .map(|(est, &x)| est.log_density(x))
                    .sum();
                Some((count / total).ln() + likelihood)
            })
            .collect();

        let best = log_scores
            .iter()
            .flatten()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let mut votes: Vec<f64> = log_scores
            .iter()
            .map(|s| s.map_or(0.0, |s| (s - best).exp()))
            .collect();
        let mass: f64 = votes.iter().sum();
        if mass > 0.0 {
            votes.iter_mut().for_each(|v| *v /= mass);
        }
        votes
    }

    fn train_on_instance(&mut self, example: &Example) {
        if self.num_attributes == 0 {
            self.num_attributes = example.features().len();
            for attrs in &mut self.estimators {
                attrs.resize(self.num_attributes, GaussianEstimator::default());
            }
        }
        let class = example.class();
        self.ensure_class(class);
        self.class_counts[class] += 1.0;
        for (est, &x) in self.estimators[class].iter_mut().zip(example.features()) {
            est.add(x);
        }
    }

    fn reset_learning(&mut self) {
        self.class_counts.iter_mut().for_each(|c| *c = 0.0);
        for attrs in &mut self.estimators {
            attrs.iter_mut().for_each(|e| *e = GaussianEstimator::default());
        }
    }

    fn measure_byte_size(&self) -> usize {
        let estimators: usize = self
            .estimators
            .iter()
            .map(|attrs| {
                size_of::<Vec<GaussianEstimator>>()
                    + attrs.capacity() * size_of::<GaussianEstimator>()
            })
            .sum();
        size_of::<Self>() + self.class_counts.capacity() * size_of::<f64>() + estimators
    }

    fn model_description(&self) -> String {
        let mut out = format!(
            "NaiveBayes: {} classes, {} attributes\n",
            self.class_counts.len(),
            self.num_attributes
        );
        for (class, (count, attrs)) in self.class_counts.iter().zip(&self.estimators).enumerate() {
            out.push_str(&format!("  class {class} (n={count})"));
            for est in attrs {
                out.push_str(&format!(" [mean={:.4} var={:.4}]", est.mean, est.variance()));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(attrs: usize, classes: usize) -> StreamHeader {
        StreamHeader::anonymous(attrs, classes)
    }

    #[test]
    fn majority_tracks_counts_and_resets() {
        let mut clf = MajorityClass::new();
        clf.set_model_context(&header(1, 3));
        let query = Example::new(vec![0.0], 0);
        assert_eq!(max_index(&clf.votes_for_instance(&query)), 0);

        for class in [2, 2, 1] {
            clf.train_on_instance(&Example::new(vec![0.0], class));
        }
        assert_eq!(max_index(&clf.votes_for_instance(&query)), 2);

        clf.reset_learning();
        assert_eq!(clf.votes_for_instance(&query), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn no_change_repeats_last_label() {
        let mut clf = NoChange::new();
        clf.set_model_context(&header(1, 2));
        let query = Example::new(vec![0.0], 0);
        assert_eq!(clf.votes_for_instance(&query), vec![0.0, 0.0]);
        clf.train_on_instance(&Example::new(vec![0.0], 1));
        assert_eq!(max_index(&clf.votes_for_instance(&query)), 1);
    }

    #[test]
    fn naive_bayes_separates_clusters() {
        let mut clf = NaiveBayes::new();
        clf.set_model_context(&header(2, 2));
        for i in 0..50 {
            let jitter = (i % 5) as f64 * 0.1;
            clf.train_on_instance(&Example::new(vec![0.0 + jitter, 0.0 - jitter], 0));
            clf.train_on_instance(&Example::new(vec![5.0 + jitter, 5.0 - jitter], 1));
        }
        let near_zero = clf.votes_for_instance(&Example::new(vec![0.2, -0.1], 0));
        let near_five = clf.votes_for_instance(&Example::new(vec![4.9, 5.1], 1));
        assert_eq!(max_index(&near_zero), 0);
        assert_eq!(max_index(&near_five), 1);
        assert!((near_zero.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(clf.measure_byte_size() > 0);
    }

    #[test]
    fn naive_bayes_untrained_votes_are_zero() {
        let mut clf = NaiveBayes::new();
        clf.set_model_context(&header(1, 2));
        assert_eq!(clf.votes_for_instance(&Example::new(vec![1.0], 0)), vec![0.0, 0.0]);
    }
}
