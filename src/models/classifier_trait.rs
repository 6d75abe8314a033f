use ndarray::Array2;

use crate::config::ModelConfig;
use crate::error::StackError;

/// Contract for the probabilistic binary classifiers driven by the stacking
/// engine. Probabilities are P(outcome == 1); labels are 0/1.
///
/// Implementations own their fitted state exclusively: a repeated `fit` call
/// replaces it, and `fresh` hands out an unfitted copy so cross-validation
/// folds and search candidates never share a fitted instance.
pub trait ProbabilisticClassifier: Send + Sync {
    /// Replace this classifier's hyperparameters. Fails with
    /// `InvalidHyperparameter` when the configuration belongs to a different
    /// classifier kind or carries a rejected value. Clears fitted state.
    fn configure(&mut self, config: &ModelConfig) -> Result<(), StackError>;

    /// Fit on all provided rows.
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<(), StackError>;

    /// Predicted probability of the positive class, one value per row.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, StackError>;

    /// Hard class prediction; by default thresholds the probability at 0.5.
    fn predict_class(&self, x: &Array2<f32>) -> Result<Vec<i32>, StackError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| i32::from(p >= 0.5))
            .collect())
    }

    /// An unfitted copy carrying the same configuration.
    fn fresh(&self) -> Box<dyn ProbabilisticClassifier>;

    fn name(&self) -> &str {
        "classifier"
    }
}
