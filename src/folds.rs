//! Deterministic stratified K-fold splitting.

use std::collections::BTreeMap;

use crate::error::StackError;

/// A single train/validation split over row indices.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Stratified K-fold splitter.
///
/// Rows of each class are dealt round-robin, in input order, to the K
/// validation partitions. Every fold preserves the class proportions of the
/// full set, the assignment depends only on the label ordering, and each row
/// appears in exactly one validation partition.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    folds: usize,
}

impl StratifiedKFold {
    pub fn new(folds: usize) -> Self {
        StratifiedKFold { folds }
    }

    pub fn n_folds(&self) -> usize {
        self.folds
    }

    /// Partition `0..y.len()` into `folds` train/validation pairs.
    pub fn split(&self, y: &[i32]) -> Result<Vec<Fold>, StackError> {
        if self.folds < 2 {
            return Err(StackError::InvalidHyperparameter(format!(
                "fold count must be at least 2, got {}",
                self.folds
            )));
        }

        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for &label in y {
            *counts.entry(label).or_insert(0) += 1;
        }
        for (&class, &count) in &counts {
            if count < self.folds {
                return Err(StackError::InsufficientSamples {
                    class,
                    count,
                    folds: self.folds,
                });
            }
        }

        let mut assignment = vec![0usize; y.len()];
        let mut dealt: BTreeMap<i32, usize> = BTreeMap::new();
        for (row, &label) in y.iter().enumerate() {
            let position = dealt.entry(label).or_insert(0);
            assignment[row] = *position % self.folds;
            *position += 1;
        }

        let folds = (0..self.folds)
            .map(|fold| {
                let mut train = Vec::with_capacity(y.len());
                let mut validation = Vec::with_capacity(y.len() / self.folds + 1);
                for (row, &assigned) in assignment.iter().enumerate() {
                    if assigned == fold {
                        validation.push(row);
                    } else {
                        train.push(row);
                    }
                }
                Fold { train, validation }
            })
            .collect();

        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pos: usize, neg: usize) -> Vec<i32> {
        let mut y = vec![1; pos];
        y.extend(std::iter::repeat(0).take(neg));
        y
    }

    #[test]
    fn validation_sets_cover_every_row_once() {
        let y = labels(9, 6);
        let folds = StratifiedKFold::new(3).split(&y).unwrap();
        assert_eq!(folds.len(), 3);

        let mut seen = vec![0usize; y.len()];
        for fold in &folds {
            for &row in &fold.validation {
                seen[row] += 1;
            }
            // train is the exact complement of validation
            assert_eq!(fold.train.len() + fold.validation.len(), y.len());
            for &row in &fold.train {
                assert!(!fold.validation.contains(&row));
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn folds_are_stratified() {
        let y = labels(9, 6);
        let folds = StratifiedKFold::new(3).split(&y).unwrap();
        for fold in &folds {
            let pos = fold.validation.iter().filter(|&&r| y[r] == 1).count();
            let neg = fold.validation.len() - pos;
            assert_eq!(pos, 3);
            assert_eq!(neg, 2);
        }
    }

    #[test]
    fn split_is_deterministic() {
        let y = labels(10, 5);
        let splitter = StratifiedKFold::new(5);
        let a = splitter.split(&y).unwrap();
        let b = splitter.split(&y).unwrap();
        for (fa, fb) in a.iter().zip(b.iter()) {
            assert_eq!(fa.validation, fb.validation);
            assert_eq!(fa.train, fb.train);
        }
    }

    #[test]
    fn minority_class_smaller_than_fold_count_fails() {
        let y = labels(10, 2);
        let err = StratifiedKFold::new(3).split(&y).unwrap_err();
        assert_eq!(
            err,
            StackError::InsufficientSamples {
                class: 0,
                count: 2,
                folds: 3
            }
        );
    }

    #[test]
    fn fewer_than_two_folds_fails() {
        let y = labels(4, 4);
        assert!(matches!(
            StratifiedKFold::new(1).split(&y),
            Err(StackError::InvalidHyperparameter(_))
        ));
    }
}
