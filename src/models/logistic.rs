use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};

use crate::config::ModelConfig;
use crate::error::StackError;
use crate::models::classifier_trait::ProbabilisticClassifier;

/// L2-regularized logistic regression, used both as a base classifier and as
/// the meta classifier on the stacked probability columns.
pub struct LogisticClassifier {
    model: Option<FittedLogisticRegression<f64, usize>>,
    config: ModelConfig,
}

impl LogisticClassifier {
    pub fn new(config: ModelConfig) -> Self {
        LogisticClassifier {
            model: None,
            config,
        }
    }
}

impl ProbabilisticClassifier for LogisticClassifier {
    fn configure(&mut self, config: &ModelConfig) -> Result<(), StackError> {
        match *config {
            ModelConfig::Logistic {
                alpha,
                max_iterations,
            } => {
                if !(alpha >= 0.0) {
                    return Err(StackError::InvalidHyperparameter(format!(
                        "logistic alpha must be non-negative, got {}",
                        alpha
                    )));
                }
                if max_iterations == 0 {
                    return Err(StackError::InvalidHyperparameter(
                        "logistic max_iterations must be at least 1".to_string(),
                    ));
                }
                self.config = *config;
                self.model = None;
                Ok(())
            }
            ref other => Err(StackError::InvalidHyperparameter(format!(
                "logistic classifier cannot take {} parameters",
                other.kind()
            ))),
        }
    }

    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<(), StackError> {
        if x.nrows() != y.len() {
            return Err(StackError::DataAlignment {
                expected: x.nrows(),
                found: y.len(),
            });
        }
        let ModelConfig::Logistic {
            alpha,
            max_iterations,
        } = self.config
        else {
            return Err(StackError::InvalidHyperparameter(
                "logistic classifier holds a non-logistic configuration".to_string(),
            ));
        };

        let records = x.mapv(f64::from);
        let targets: Array1<usize> = y.iter().map(|&label| usize::from(label == 1)).collect();
        let dataset = Dataset::new(records, targets);

        let fitted = LogisticRegression::default()
            .alpha(alpha)
            .max_iterations(max_iterations)
            .fit(&dataset)
            .map_err(|e| StackError::FitFailure(e.to_string()))?;

        self.model = Some(fitted);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, StackError> {
        let model = self.model.as_ref().ok_or(StackError::NotFitted)?;
        let probabilities = model.predict_probabilities(&x.mapv(f64::from));
        Ok(probabilities.iter().map(|&p| p as f32).collect())
    }

    fn fresh(&self) -> Box<dyn ProbabilisticClassifier> {
        Box::new(LogisticClassifier::new(self.config))
    }

    fn name(&self) -> &str {
        "logistic"
    }
}
