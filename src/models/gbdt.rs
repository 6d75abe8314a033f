use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;

use crate::config::ModelConfig;
use crate::error::StackError;
use crate::models::classifier_trait::ProbabilisticClassifier;

/// Gradient Boosting Decision Tree classifier.
pub struct GbdtClassifier {
    model: Option<GBDT>,
    config: ModelConfig,
}

impl GbdtClassifier {
    pub fn new(config: ModelConfig) -> Self {
        GbdtClassifier {
            model: None,
            config,
        }
    }
}

impl ProbabilisticClassifier for GbdtClassifier {
    fn configure(&mut self, config: &ModelConfig) -> Result<(), StackError> {
        match *config {
            ModelConfig::Gbdt {
                learning_rate,
                max_depth,
                num_boost_round,
                ..
            } => {
                if !(learning_rate > 0.0) {
                    return Err(StackError::InvalidHyperparameter(format!(
                        "gbdt learning_rate must be positive, got {}",
                        learning_rate
                    )));
                }
                if max_depth == 0 || num_boost_round == 0 {
                    return Err(StackError::InvalidHyperparameter(
                        "gbdt max_depth and num_boost_round must be at least 1".to_string(),
                    ));
                }
                self.config = *config;
                self.model = None;
                Ok(())
            }
            ref other => Err(StackError::InvalidHyperparameter(format!(
                "gbdt classifier cannot take {} parameters",
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
        let ModelConfig::Gbdt {
            learning_rate,
            max_depth,
            num_boost_round,
            training_optimization_level,
        } = self.config
        else {
            return Err(StackError::InvalidHyperparameter(
                "gbdt classifier holds a non-gbdt configuration".to_string(),
            ));
        };

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(learning_rate);
        config.set_max_depth(max_depth);
        config.set_iterations(num_boost_round as usize);
        config.set_training_optimization_level(training_optimization_level);
        config.set_debug(false);
        config.set_loss("LogLikelyhood");

        let mut gbdt = GBDT::new(&config);

        let mut train = DataVec::with_capacity(y.len());
        for (row, &label) in y.iter().enumerate() {
            // the log-likelihood loss trains on 1/-1 labels
            let target = if label == 1 { 1.0 } else { -1.0 };
            train.push(Data::new_training_data(
                x.row(row).to_vec(),
                1.0,
                target,
                None,
            ));
        }

        gbdt.fit(&mut train);
        self.model = Some(gbdt);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, StackError> {
        let model = self.model.as_ref().ok_or(StackError::NotFitted)?;
        let mut rows = DataVec::with_capacity(x.nrows());
        for row in 0..x.nrows() {
            rows.push(Data::new_test_data(x.row(row).to_vec(), None));
        }
        // predict applies the logistic transform for the log-likelihood loss
        Ok(model.predict(&rows))
    }

    fn fresh(&self) -> Box<dyn ProbabilisticClassifier> {
        Box::new(GbdtClassifier::new(self.config))
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}
