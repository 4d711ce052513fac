//! Binary classification metrics for the ICM/TE label set.
//!
//! `TE` is the positive class for the aggregate F1 score and for ROC AUC.

use crate::models::{ClassMetrics, ClassificationMetrics, Label};
use std::collections::BTreeMap;

/// Probability of the positive class given a predicted label and its confidence
pub fn te_probability(label: Label, confidence: f64) -> f64 {
    match label {
        Label::Te => confidence,
        Label::Icm => 1.0 - confidence,
    }
}

/// Score predictions against ground truth.
///
/// `te_scores[i]` is the model's probability that sample `i` is `TE`.
/// All three slices must have the same length.
pub fn evaluate(truth: &[Label], predicted: &[Label], te_scores: &[f64]) -> ClassificationMetrics {
    debug_assert_eq!(truth.len(), predicted.len());
    debug_assert_eq!(truth.len(), te_scores.len());

    let total = truth.len();
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    let accuracy = ratio(correct, total);

    let per_class: BTreeMap<Label, ClassMetrics> = Label::ALL
        .iter()
        .map(|&label| (label, class_metrics(label, truth, predicted)))
        .collect();

    let f1_score = per_class
        .get(&Label::Te)
        .map(|m| m.f1_score)
        .unwrap_or_default();

    ClassificationMetrics {
        accuracy,
        f1_score,
        auc_score: roc_auc(truth, te_scores),
        per_class,
    }
}

fn class_metrics(label: Label, truth: &[Label], predicted: &[Label]) -> ClassMetrics {
    let true_positive = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| **t == label && **p == label)
        .count();
    let predicted_count = predicted.iter().filter(|p| **p == label).count();
    let support = truth.iter().filter(|t| **t == label).count();

    let precision = ratio(true_positive, predicted_count);
    let recall = ratio(true_positive, support);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1_score,
        support,
    }
}

/// Mann-Whitney rank statistic with tie averaging; 0.5 when one class is absent
fn roc_auc(truth: &[Label], te_scores: &[f64]) -> f64 {
    let positives = truth.iter().filter(|t| **t == Label::Te).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..te_scores.len()).collect();
    order.sort_by(|&a, &b| te_scores[a].total_cmp(&te_scores[b]));

    let mut ranks = vec![0.0; te_scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && te_scores[order[end]] == te_scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; tied run [start, end) shares the mean rank
        let mean_rank = (start + end + 1) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = mean_rank;
        }
        start = end;
    }

    let positive_rank_sum: f64 = truth
        .iter()
        .zip(&ranks)
        .filter(|(t, _)| **t == Label::Te)
        .map(|(_, r)| r)
        .sum();

    let p = positives as f64;
    let auc = (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64);
    auc.clamp(0.0, 1.0)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
