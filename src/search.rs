//! Outer-loop grid search over joint hyperparameter / cut-point candidates.
//!
//! Every candidate is scored on every outer fold by fitting the stacking
//! engine on the fold's training partition and ranking its *discretized*
//! predictions on the validation partition, so cut-point quality and
//! classifier quality are selected together. Selection maximizes the mean
//! AUC across folds.

use ndarray::{Array2, Axis};

use crate::config::Candidate;
use crate::error::StackError;
use crate::folds::{Fold, StratifiedKFold};
use crate::metrics::{ordinal_scores, roc_auc};
use crate::stacker::StackedClassifier;

/// Result of one search run.
impl std::fmt::Debug for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOutcome")
            .field("best", &self.best)
            .field("best_index", &self.best_index)
            .field("scores", &self.scores)
            .finish_non_exhaustive()
    }
}

pub struct SearchOutcome {
    /// Engine configured with the winning candidate; fitted on the full
    /// training set when refitting was requested.
    pub engine: StackedClassifier,
    pub best: Candidate,
    pub best_index: usize,
    /// AUC per (candidate, outer fold).
    pub scores: Array2<f64>,
}

/// Joint hyperparameter and cut-point selection over outer folds.
#[derive(Debug, Clone, Copy)]
pub struct OuterSearch {
    outer: StratifiedKFold,
    refit: bool,
}

impl OuterSearch {
    pub fn new(outer_folds: usize) -> Self {
        OuterSearch {
            outer: StratifiedKFold::new(outer_folds),
            refit: true,
        }
    }

    /// Whether to fit the winning engine on the full training set as a final
    /// step. Defaults to true.
    pub fn refit(mut self, refit: bool) -> Self {
        self.refit = refit;
        self
    }

    /// Score every candidate on every outer fold and return the winner.
    ///
    /// Candidate evaluations are independent: each one runs on a freshly
    /// built engine, so no classifier instance is shared across candidates.
    /// An error in any combination/fold aborts the whole run, since a
    /// silently dropped cell would bias the mean-score selection.
    pub fn run(
        &self,
        prototype: &StackedClassifier,
        candidates: &[Candidate],
        x: &Array2<f32>,
        y: &[i32],
    ) -> Result<SearchOutcome, StackError> {
        if candidates.is_empty() {
            return Err(StackError::InvalidHyperparameter(
                "candidate grid is empty".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(StackError::DataAlignment {
                expected: x.nrows(),
                found: y.len(),
            });
        }

        // reject unknown classifier names and wrong-kind configurations
        // before any model is fit
        for candidate in candidates {
            prototype.fresh().configure(candidate)?;
        }

        let folds = self.outer.split(y)?;
        log_class_distribution(y, &folds);

        let mut scores = Array2::<f64>::zeros((candidates.len(), folds.len()));
        for (i, candidate) in candidates.iter().enumerate() {
            let mut engine = prototype.fresh();
            engine.configure(candidate)?;

            for (j, fold) in folds.iter().enumerate() {
                let x_train = x.select(Axis(0), &fold.train);
                let y_train: Vec<i32> = fold.train.iter().map(|&row| y[row]).collect();
                let x_val = x.select(Axis(0), &fold.validation);
                let y_val: Vec<i32> = fold.validation.iter().map(|&row| y[row]).collect();

                engine.fit(&x_train, &y_train)?;
                let (_probabilities, categories) = engine.predict(&x_val)?;
                scores[(i, j)] = roc_auc(&y_val, &ordinal_scores(&categories))?;
            }
            log::debug!(
                "candidate {}/{}: fold AUCs {:?}",
                i + 1,
                candidates.len(),
                scores.row(i).to_vec()
            );
        }

        let best_index = best_candidate(&scores);
        let best = candidates[best_index].clone();
        log::info!(
            "selected candidate {} with mean AUC {:.4}",
            best_index,
            scores.row(best_index).mean().unwrap_or(f64::NAN)
        );

        let mut engine = prototype.fresh();
        engine.configure(&best)?;
        if self.refit {
            engine.fit(x, y)?;
        }

        Ok(SearchOutcome {
            engine,
            best,
            best_index,
            scores,
        })
    }
}

/// Index of the score-table row with the highest mean across folds; ties go
/// to the lowest index.
pub fn best_candidate(scores: &Array2<f64>) -> usize {
    let mut best = 0;
    let mut best_mean = f64::NEG_INFINITY;
    for (index, row) in scores.rows().into_iter().enumerate() {
        let mean = row.mean().unwrap_or(f64::NEG_INFINITY);
        if mean > best_mean {
            best_mean = mean;
            best = index;
        }
    }
    best
}

/// One-time diagnostic of the outer-fold class composition, emitted at the
/// start of every search run.
fn log_class_distribution(y: &[i32], folds: &[Fold]) {
    let mut counts = std::collections::BTreeMap::new();
    for &label in y {
        *counts.entry(label).or_insert(0usize) += 1;
    }
    let total = y.len();
    for (class, count) in counts {
        log::info!(
            "outer loop: class {}: {} rows ({:.1}%), ~{} per validation fold",
            class,
            count,
            count as f64 / total as f64 * 100.0,
            count / folds.len()
        );
    }
}
