//! Evaluation metrics for assessing grouping quality.
//!
//! A grouping is scored pairwise: every unordered pair of records is a
//! positive when both records share a group, and a predicted grouping is
//! compared to a labeled one pair by pair.

use ahash::AHashMap;
use serde::Serialize;
use std::hash::Hash;

/// Confusion matrix values for classification evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Pairs grouped together in both groupings
    pub true_positives: usize,
    /// Pairs grouped together only in the prediction
    pub false_positives: usize,
    /// Pairs grouped together only in the labels
    pub false_negatives: usize,
    /// Pairs kept apart in both groupings
    pub true_negatives: usize,
}

impl ConfusionMatrix {
    /// Calculate precision from confusion matrix values.
    pub fn precision(&self) -> f64 {
        let denominator = self.true_positives + self.false_positives;
        if denominator == 0 {
            if self.false_negatives == 0 {
                1.0 // nothing predicted, nothing to find
            } else {
                0.0
            }
        } else {
            self.true_positives as f64 / denominator as f64
        }
    }

    /// Calculate recall from confusion matrix values.
    pub fn recall(&self) -> f64 {
        let denominator = self.true_positives + self.false_negatives;
        if denominator == 0 {
            if self.false_positives == 0 {
                1.0
            } else {
                0.0
            }
        } else {
            self.true_positives as f64 / denominator as f64
        }
    }

    /// Calculate F-beta score from confusion matrix values.
    ///
    /// `beta = 1.0` gives F1; smaller values weigh precision higher.
    pub fn f_score(&self, beta: f64) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            let beta_sq = beta * beta;
            (1.0 + beta_sq) * p * r / (beta_sq * p + r)
        }
    }

    pub fn f1(&self) -> f64 {
        self.f_score(1.0)
    }

    /// Total pairs counted
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

fn pairs(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Compare a predicted grouping with a labeled one.
///
/// `predicted[i]` and `truth[i]` are the group labels of record `i`; extra
/// entries in the longer slice are ignored. Runs in linear time from the
/// contingency table of the two labelings instead of enumerating pairs.
pub fn pairwise_confusion<P, T>(predicted: &[P], truth: &[T]) -> ConfusionMatrix
where
    P: Eq + Hash,
    T: Eq + Hash,
{
    let n = predicted.len().min(truth.len());
    let mut predicted_sizes: AHashMap<&P, usize> = AHashMap::new();
    let mut truth_sizes: AHashMap<&T, usize> = AHashMap::new();
    let mut joint_sizes: AHashMap<(&P, &T), usize> = AHashMap::new();

    for (p, t) in predicted.iter().zip(truth).take(n) {
        *predicted_sizes.entry(p).or_default() += 1;
        *truth_sizes.entry(t).or_default() += 1;
        *joint_sizes.entry((p, t)).or_default() += 1;
    }

    let together_in_both: usize = joint_sizes.values().map(|&c| pairs(c)).sum();
    let together_predicted: usize = predicted_sizes.values().map(|&c| pairs(c)).sum();
    let together_truth: usize = truth_sizes.values().map(|&c| pairs(c)).sum();

    let true_positives = together_in_both;
    let false_positives = together_predicted - together_in_both;
    let false_negatives = together_truth - together_in_both;

    ConfusionMatrix {
        true_positives,
        false_positives,
        false_negatives,
        true_negatives: pairs(n) - true_positives - false_positives - false_negatives,
    }
}
