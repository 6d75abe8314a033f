//! Discrimination and classification metrics for evaluated predictors.
//!
//! `score` assembles a `PerformanceRecord` for one predictor; when a
//! discretized prediction and a clinician baseline are supplied it also
//! quantifies the information lost by binning, the gap to the baseline, and
//! the net reclassification components.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::StackError;
use crate::nri::NriScorer;

/// Metric name to value, for a single evaluated predictor.
pub type PerformanceRecord = BTreeMap<String, f64>;

/// Area under the ROC curve via the rank-sum (Mann-Whitney) statistic, with
/// tied scores assigned their average rank.
pub fn roc_auc(y_true: &[i32], scores: &[f32]) -> Result<f64, StackError> {
    if y_true.len() != scores.len() {
        return Err(StackError::DataAlignment {
            expected: y_true.len(),
            found: scores.len(),
        });
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(StackError::MetricComputation(
            "ROC AUC is undefined for NaN scores".to_string(),
        ));
    }
    let n_pos = y_true.iter().filter(|&&t| t == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(StackError::MetricComputation(
            "ROC AUC is undefined with a single class present".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0f64; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &row in &order[i..=j] {
            ranks[row] = rank;
        }
        i = j + 1;
    }

    let rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t == 1)
        .map(|(_, &r)| r)
        .sum();
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Ordinal categories as a score vector for ranking metrics.
pub fn ordinal_scores(categories: &[u8]) -> Vec<f32> {
    categories.iter().map(|&c| f32::from(c)).collect()
}

/// Macro-averaged precision over the classes observed in either vector.
pub fn macro_precision(y_true: &[i32], y_pred: &[i32]) -> Result<f64, StackError> {
    per_class_average(y_true, y_pred, |tp, fp, _fn_| {
        if tp + fp == 0 {
            0.0
        } else {
            tp as f64 / (tp + fp) as f64
        }
    })
}

/// Macro-averaged recall over the classes observed in either vector.
pub fn macro_recall(y_true: &[i32], y_pred: &[i32]) -> Result<f64, StackError> {
    per_class_average(y_true, y_pred, |tp, _fp, fn_| {
        if tp + fn_ == 0 {
            0.0
        } else {
            tp as f64 / (tp + fn_) as f64
        }
    })
}

fn per_class_average(
    y_true: &[i32],
    y_pred: &[i32],
    metric: impl Fn(usize, usize, usize) -> f64,
) -> Result<f64, StackError> {
    if y_true.len() != y_pred.len() {
        return Err(StackError::DataAlignment {
            expected: y_true.len(),
            found: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(StackError::MetricComputation(
            "precision/recall are undefined on an empty vector".to_string(),
        ));
    }

    let mut labels: Vec<i32> = y_true.iter().chain(y_pred.iter()).copied().collect();
    labels.sort_unstable();
    labels.dedup();

    let mut total = 0.0;
    for &label in &labels {
        let mut tp = 0;
        let mut fp = 0;
        let mut fn_ = 0;
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == label, p == label) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }
        total += metric(tp, fp, fn_);
    }
    Ok(total / labels.len() as f64)
}

/// Score one predictor's output against the true outcome.
///
/// Always reports `roc_auc` (continuous probability), `prec`, and `rec`
/// (macro-averaged over the hard class prediction). When both a discretized
/// prediction and a baseline category vector are supplied, additionally
/// reports `auc_model_model` (continuous AUC minus binned AUC),
/// `auc_model_tc` (binned-model AUC minus baseline AUC), and the `nri`,
/// `nri_plus`, `nri_minus` reclassification components.
pub fn score(
    y_true: &[i32],
    y_prob: &[f32],
    y_pred: &[i32],
    y_pred_cut: Option<&[u8]>,
    baseline: Option<&[u8]>,
    nri: &dyn NriScorer,
) -> Result<PerformanceRecord, StackError> {
    let mut record = PerformanceRecord::new();
    record.insert("roc_auc".to_string(), roc_auc(y_true, y_prob)?);
    record.insert("prec".to_string(), macro_precision(y_true, y_pred)?);
    record.insert("rec".to_string(), macro_recall(y_true, y_pred)?);

    if let (Some(cut), Some(base)) = (y_pred_cut, baseline) {
        let auc_continuous = record["roc_auc"];
        let auc_binned = roc_auc(y_true, &ordinal_scores(cut))?;
        let auc_baseline = roc_auc(y_true, &ordinal_scores(base))?;
        record.insert("auc_model_model".to_string(), auc_continuous - auc_binned);
        record.insert("auc_model_tc".to_string(), auc_binned - auc_baseline);

        let outcome = nri.nri(y_true, base, cut)?;
        record.insert("nri".to_string(), outcome.nri);
        record.insert("nri_plus".to_string(), outcome.nri_plus);
        record.insert("nri_minus".to_string(), outcome.nri_minus);
    }

    Ok(record)
}

/// 80% empirical-bootstrap confidence interval around `point_estimate`.
///
/// Pivots the bootstrap distribution around the point estimate:
/// `delta = sorted(values) - pe`, `lower = pe - quantile(delta, 0.9)`,
/// `upper = pe - quantile(delta, 0.1)`. This is not the percentile interval;
/// the pivot subtraction is load-bearing.
pub fn confidence_interval(
    point_estimate: f64,
    bootstrap_values: &[f64],
) -> Result<(f64, f64), StackError> {
    if bootstrap_values.is_empty() {
        return Err(StackError::MetricComputation(
            "confidence interval requires at least one bootstrap value".to_string(),
        ));
    }
    if bootstrap_values.iter().any(|v| v.is_nan()) {
        return Err(StackError::MetricComputation(
            "confidence interval is undefined for NaN bootstrap values".to_string(),
        ));
    }

    let mut delta: Vec<f64> = bootstrap_values
        .iter()
        .map(|v| v - point_estimate)
        .collect();
    delta.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let lower = point_estimate - quantile(&delta, 0.9);
    let upper = point_estimate - quantile(&delta, 0.1);
    Ok((lower, upper))
}

/// Linear-interpolation quantile of a sorted slice.
fn quantile(sorted: &[f64], tau: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = tau * (sorted.len() - 1) as f64;
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    let fraction = position - low as f64;
    sorted[low] + fraction * (sorted[high] - sorted[low])
}

/// Pull one metric's values out of a batch of bootstrap records, skipping
/// records that lack the key.
pub fn metric_values(records: &[PerformanceRecord], key: &str) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| record.get(key).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auc_on_a_perfect_ranking() {
        let y = vec![0, 0, 1, 1];
        let scores = vec![0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc(&y, &scores).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn auc_on_a_reversed_ranking() {
        let y = vec![1, 1, 0, 0];
        let scores = vec![0.1, 0.2, 0.8, 0.9];
        assert!(roc_auc(&y, &scores).unwrap().abs() < 1e-12);
    }

    #[test]
    fn auc_handles_ties_by_average_rank() {
        // positives score {0.5, 0.9}, negatives {0.2, 0.5}: of the four
        // pairwise comparisons, three are wins and one is a half-credit tie,
        // so AUC = 3.5 / 4
        let y = vec![0, 1, 0, 1];
        let scores = vec![0.2, 0.5, 0.5, 0.9];
        assert!((roc_auc(&y, &scores).unwrap() - 0.875).abs() < 1e-12);
    }

    #[test]
    fn auc_with_one_class_is_undefined() {
        let y = vec![1, 1, 1];
        let scores = vec![0.1, 0.5, 0.9];
        assert!(matches!(
            roc_auc(&y, &scores),
            Err(StackError::MetricComputation(_))
        ));
    }

    #[test]
    fn macro_metrics_match_hand_counts() {
        let y_true = vec![1, 1, 0, 0, 1, 0];
        let y_pred = vec![1, 0, 0, 1, 1, 0];
        // class 0: tp=2 fp=1 fn=1; class 1: tp=2 fp=1 fn=1
        let prec = macro_precision(&y_true, &y_pred).unwrap();
        let rec = macro_recall(&y_true, &y_pred).unwrap();
        assert!((prec - 2.0 / 3.0).abs() < 1e-12);
        assert!((rec - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn confidence_interval_uses_the_pivot_formula() {
        let values = vec![0.75, 0.78, 0.80, 0.82, 0.85, 0.70, 0.90, 0.77, 0.83, 0.79];
        let (lower, upper) = confidence_interval(0.80, &values).unwrap();
        assert!(lower < 0.80 && 0.80 < upper);
        // deltas sorted: [-0.10, -0.05, -0.03, -0.02, -0.01, 0, 0.02, 0.03, 0.05, 0.10]
        // q(0.9) = 0.055, q(0.1) = -0.055
        assert!((lower - 0.745).abs() < 1e-9);
        assert!((upper - 0.855).abs() < 1e-9);
    }

    #[test]
    fn pivot_interval_differs_from_raw_percentiles_off_center() {
        // a skewed bootstrap distribution: the pivot interval reflects the
        // skew on the opposite side of the estimate
        let values = vec![0.50, 0.52, 0.54, 0.56, 0.58, 0.60, 0.62, 0.64, 0.80, 0.90];
        let pe = 0.60;
        let (lower, upper) = confidence_interval(pe, &values).unwrap();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let percentile_lower = quantile(&sorted, 0.1);
        let percentile_upper = quantile(&sorted, 0.9);
        assert!((lower - percentile_lower).abs() > 1e-9);
        assert!((upper - percentile_upper).abs() > 1e-9);
    }

    #[test]
    fn empty_bootstrap_is_rejected() {
        assert!(confidence_interval(0.5, &[]).is_err());
    }
}
