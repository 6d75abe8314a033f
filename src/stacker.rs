//! Two-level stacked-generalization classifier.
//!
//! The engine holds a named collection of base classifiers and a meta
//! classifier. `fit` runs the inner cross-validation loop to produce
//! out-of-fold meta-features, refits every base classifier on the full
//! training set, and fits the meta classifier on the stacked columns.
//! `predict` returns the continuous stacked probability together with its
//! discretized triage category.

use ndarray::{Array2, Axis};

use crate::config::{Candidate, ModelConfig};
use crate::discretize::Breaks;
use crate::error::StackError;
use crate::folds::StratifiedKFold;
use crate::models::factory::build_model;
use crate::models::ProbabilisticClassifier;

struct Member {
    name: String,
    model: Box<dyn ProbabilisticClassifier>,
}

pub struct StackedClassifier {
    base: Vec<Member>,
    meta: Box<dyn ProbabilisticClassifier>,
    inner: StratifiedKFold,
    breaks: Breaks,
    fitted: bool,
}

impl StackedClassifier {
    /// Build an engine from per-classifier configurations. Cut-points start
    /// at the quartile default until a candidate installs its own.
    pub fn new(base: Vec<(String, ModelConfig)>, meta: ModelConfig, inner_folds: usize) -> Self {
        let base = base
            .into_iter()
            .map(|(name, config)| Member {
                name,
                model: build_model(&config),
            })
            .collect();
        StackedClassifier {
            base,
            meta: build_model(&meta),
            inner: StratifiedKFold::new(inner_folds),
            breaks: Breaks::default(),
            fitted: false,
        }
    }

    /// Build an engine from pre-built classifiers. This is the seam for
    /// plugging in externally provided models.
    pub fn with_classifiers(
        base: Vec<(String, Box<dyn ProbabilisticClassifier>)>,
        meta: Box<dyn ProbabilisticClassifier>,
        inner_folds: usize,
    ) -> Self {
        let base = base
            .into_iter()
            .map(|(name, model)| Member { name, model })
            .collect();
        StackedClassifier {
            base,
            meta,
            inner: StratifiedKFold::new(inner_folds),
            breaks: Breaks::default(),
            fitted: false,
        }
    }

    /// An unfitted copy with the same member configurations and cut-points.
    pub fn fresh(&self) -> StackedClassifier {
        StackedClassifier {
            base: self
                .base
                .iter()
                .map(|member| Member {
                    name: member.name.clone(),
                    model: member.model.fresh(),
                })
                .collect(),
            meta: self.meta.fresh(),
            inner: self.inner,
            breaks: self.breaks,
            fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn breaks(&self) -> Breaks {
        self.breaks
    }

    pub fn base_names(&self) -> Vec<&str> {
        self.base.iter().map(|m| m.name.as_str()).collect()
    }

    /// Apply one search candidate: reconfigure every base classifier the
    /// candidate names and install its cut-points. Base classifiers the
    /// candidate does not name keep their current configuration. Fitted
    /// state is cleared.
    pub fn configure(&mut self, candidate: &Candidate) -> Result<(), StackError> {
        for (name, config) in &candidate.models {
            let member = self
                .base
                .iter_mut()
                .find(|member| member.name == *name)
                .ok_or_else(|| {
                    StackError::InvalidHyperparameter(format!(
                        "no base classifier named '{}'",
                        name
                    ))
                })?;
            member.model.configure(config)?;
        }
        self.breaks = candidate.breaks;
        self.fitted = false;
        Ok(())
    }

    /// Inner cross-validation loop: out-of-fold predicted probabilities, one
    /// column per base classifier, row-aligned with `y`.
    ///
    /// Each fold fits a fresh instance on the fold's training rows only, so
    /// the value at row `i` always comes from a model that never saw row `i`.
    pub fn cv_meta_features(
        &self,
        x: &Array2<f32>,
        y: &[i32],
    ) -> Result<Array2<f32>, StackError> {
        check_rows(x, y.len())?;
        let folds = self.inner.split(y)?;
        let mut meta = Array2::<f32>::zeros((x.nrows(), self.base.len()));

        for (column, member) in self.base.iter().enumerate() {
            log::debug!(
                "inner loop: out-of-fold predictions for '{}'",
                member.name
            );
            for fold in &folds {
                let mut model = member.model.fresh();
                let x_train = x.select(Axis(0), &fold.train);
                let y_train: Vec<i32> = fold.train.iter().map(|&row| y[row]).collect();
                model.fit(&x_train, &y_train)?;

                let x_val = x.select(Axis(0), &fold.validation);
                let probabilities = model.predict_proba(&x_val)?;
                for (&row, &p) in fold.validation.iter().zip(probabilities.iter()) {
                    meta[(row, column)] = p;
                }
            }
        }

        Ok(meta)
    }

    /// Fit the stack: inner loop for meta-features, full-set refit of every
    /// base classifier, then the meta classifier on the stacked columns.
    ///
    /// Repeated calls fully replace fitted state.
    pub fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<&mut Self, StackError> {
        check_rows(x, y.len())?;
        let meta_features = self.cv_meta_features(x, y)?;

        for member in &mut self.base {
            member.model.fit(x, y)?;
        }
        self.meta.fit(&meta_features, y)?;
        self.fitted = true;
        Ok(self)
    }

    /// Column-stacked probabilities from the full-training-set base
    /// classifiers.
    pub fn predict_meta_features(&self, x: &Array2<f32>) -> Result<Array2<f32>, StackError> {
        if !self.fitted {
            return Err(StackError::NotFitted);
        }
        let mut meta = Array2::<f32>::zeros((x.nrows(), self.base.len()));
        for (column, member) in self.base.iter().enumerate() {
            let probabilities = member.model.predict_proba(x)?;
            for (row, &p) in probabilities.iter().enumerate() {
                meta[(row, column)] = p;
            }
        }
        Ok(meta)
    }

    /// Stacked probability of the positive class per row.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, StackError> {
        let meta_features = self.predict_meta_features(x)?;
        self.meta.predict_proba(&meta_features)
    }

    /// Continuous stacked probability and its discretized triage category,
    /// using the engine's current cut-points.
    pub fn predict(&self, x: &Array2<f32>) -> Result<(Vec<f32>, Vec<u8>), StackError> {
        let probabilities = self.predict_proba(x)?;
        let categories = self.breaks.cut_slice(&probabilities)?;
        Ok((probabilities, categories))
    }
}

fn check_rows(x: &Array2<f32>, labels: usize) -> Result<(), StackError> {
    if x.nrows() != labels {
        return Err(StackError::DataAlignment {
            expected: x.nrows(),
            found: labels,
        });
    }
    Ok(())
}
