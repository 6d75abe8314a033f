//! Hyperparameter configuration for the base and meta classifiers, and the
//! joint hyperparameter / cut-point search grid.
//!
//! Candidates address classifiers by name through an explicit nested map
//! rather than flattened `"key__param"` strings, so an unknown name or a
//! wrong-kind configuration is caught before any model is fit.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::discretize::Breaks;

/// Hyper-parameters for a single classifier.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub enum ModelConfig {
    Gbdt {
        learning_rate: f32,
        max_depth: u32,
        num_boost_round: u32,
        training_optimization_level: u8,
    },
    Logistic {
        alpha: f64,
        max_iterations: u64,
    },
}

impl ModelConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelConfig::Gbdt { .. } => "gbdt",
            ModelConfig::Logistic { .. } => "logistic",
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::Gbdt {
            learning_rate: 0.1,
            max_depth: 6,
            num_boost_round: 50,
            training_optimization_level: 2,
        }
    }
}

impl FromStr for ModelConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelConfig::default()),
            "logistic" => Ok(ModelConfig::Logistic {
                alpha: 1.0,
                max_iterations: 100,
            }),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: gbdt, logistic",
                s
            )),
        }
    }
}

/// One point in the joint hyperparameter / cut-point grid: a configuration
/// per named base classifier, plus the cut-points used to discretize the
/// stacked probability. Base classifiers not named here keep their current
/// configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Candidate {
    pub models: BTreeMap<String, ModelConfig>,
    pub breaks: Breaks,
}

/// Per-classifier lists of configurations to try, crossed with candidate
/// cut-point vectors.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SearchGrid {
    pub models: BTreeMap<String, Vec<ModelConfig>>,
    pub breaks: Vec<Breaks>,
}

impl SearchGrid {
    /// Expand the full cartesian product of per-classifier configurations and
    /// cut-point vectors. The iteration order is deterministic: classifier
    /// names in lexicographic order, options in list order, breaks innermost.
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut combos: Vec<BTreeMap<String, ModelConfig>> = vec![BTreeMap::new()];
        for (name, options) in &self.models {
            let mut next = Vec::with_capacity(combos.len() * options.len());
            for combo in &combos {
                for option in options {
                    let mut expanded = combo.clone();
                    expanded.insert(name.clone(), *option);
                    next.push(expanded);
                }
            }
            combos = next;
        }

        let mut candidates = Vec::with_capacity(combos.len() * self.breaks.len());
        for models in combos {
            for &breaks in &self.breaks {
                candidates.push(Candidate {
                    models: models.clone(),
                    breaks,
                });
            }
        }
        candidates
    }
}
