use crate::config::ModelConfig;
use crate::models::classifier_trait::ProbabilisticClassifier;
use crate::models::gbdt::GbdtClassifier;
use crate::models::logistic::LogisticClassifier;

/// Build a boxed classifier from a `ModelConfig`.
pub fn build_model(config: &ModelConfig) -> Box<dyn ProbabilisticClassifier> {
    match config {
        ModelConfig::Gbdt { .. } => Box::new(GbdtClassifier::new(*config)),
        ModelConfig::Logistic { .. } => Box::new(LogisticClassifier::new(*config)),
    }
}
