//! Row-aligned cohort data used by the stacking engine and the evaluator.
//!
//! A `Cohort` pairs an encoded feature matrix with a binary outcome vector
//! and, optionally, the clinician triage category recorded for each row.
//! Alignment across the three is validated at construction and preserved by
//! every row selection.

use std::collections::BTreeMap;

use ndarray::{Array2, Axis};

use crate::error::StackError;

/// A table of encoded feature rows with a binary outcome and an optional
/// external baseline category per row.
#[derive(Debug, Clone)]
pub struct Cohort {
    pub x: Array2<f32>,
    /// Outcome per row, 1 for an event and 0 otherwise.
    pub y: Vec<i32>,
    /// Clinician triage category per row (0..=3), when available.
    pub triage: Option<Vec<u8>>,
    pub feature_names: Vec<String>,
}

impl Cohort {
    pub fn new(
        x: Array2<f32>,
        y: Vec<i32>,
        triage: Option<Vec<u8>>,
        feature_names: Vec<String>,
    ) -> Result<Self, StackError> {
        let rows = x.nrows();
        if y.len() != rows {
            return Err(StackError::DataAlignment {
                expected: rows,
                found: y.len(),
            });
        }
        if let Some(tc) = &triage {
            if tc.len() != rows {
                return Err(StackError::DataAlignment {
                    expected: rows,
                    found: tc.len(),
                });
            }
        }
        if !feature_names.is_empty() && feature_names.len() != x.ncols() {
            return Err(StackError::DataAlignment {
                expected: x.ncols(),
                found: feature_names.len(),
            });
        }
        Ok(Cohort {
            x,
            y,
            triage,
            feature_names,
        })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of rows per outcome class.
    pub fn class_counts(&self) -> BTreeMap<i32, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.y {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Select rows by index, keeping features, outcome, and baseline in
    /// lockstep. Indices may repeat, which a bootstrap resample relies on.
    pub fn select(&self, indices: &[usize]) -> Cohort {
        Cohort {
            x: self.x.select(Axis(0), indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            triage: self
                .triage
                .as_ref()
                .map(|tc| indices.iter().map(|&i| tc[i]).collect()),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Emit a one-time summary of the cohort composition.
    pub fn log_summary(&self) {
        let counts = self.class_counts();
        let total = self.len();
        for (class, count) in &counts {
            log::info!(
                "cohort: {} rows of class {} ({:.1}%)",
                count,
                class,
                *count as f64 / total as f64 * 100.0
            );
        }
        log::info!("cohort: {} feature columns", self.x.ncols());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn toy() -> Cohort {
        let x = Array2::from_shape_vec((4, 2), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
            .unwrap();
        Cohort::new(
            x,
            vec![1, 0, 1, 0],
            Some(vec![3, 1, 2, 0]),
            vec!["hr".to_string(), "sbp".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn misaligned_labels_are_rejected() {
        let x = Array2::<f32>::zeros((3, 2));
        let err = Cohort::new(x, vec![0, 1], None, vec![]).unwrap_err();
        assert_eq!(
            err,
            StackError::DataAlignment {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn misaligned_baseline_is_rejected() {
        let x = Array2::<f32>::zeros((3, 2));
        assert!(Cohort::new(x, vec![0, 1, 0], Some(vec![1, 2]), vec![]).is_err());
    }

    #[test]
    fn select_keeps_rows_aligned() {
        let cohort = toy();
        let picked = cohort.select(&[2, 0, 2]);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked.y, vec![1, 1, 1]);
        assert_eq!(picked.triage, Some(vec![2, 3, 2]));
        assert_eq!(picked.x[(0, 0)], 4.0);
        assert_eq!(picked.x[(1, 0)], 0.0);
        assert_eq!(picked.x[(2, 1)], 5.0);
    }

    #[test]
    fn class_counts_tally_labels() {
        let counts = toy().class_counts();
        assert_eq!(counts[&0], 2);
        assert_eq!(counts[&1], 2);
    }
}
