use std::error::Error;
use std::fmt;

/// Errors surfaced by the stacking, search, and evaluation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum StackError {
    /// A class has fewer members than the requested number of folds.
    InsufficientSamples {
        class: i32,
        count: usize,
        folds: usize,
    },
    /// A hyperparameter set named an unknown classifier, had the wrong kind,
    /// or carried a value the classifier rejects.
    InvalidHyperparameter(String),
    /// Prediction was requested before `fit`.
    NotFitted,
    /// Row-aligned vectors disagree on length.
    DataAlignment { expected: usize, found: usize },
    /// A metric is undefined for the given inputs, e.g. AUC with a single
    /// class present in the outcome vector.
    MetricComputation(String),
    /// A probability fell on the lowest cut-point or outside the configured
    /// cut-point range and maps to no category.
    UndefinedCategory(f64),
    /// The underlying model library failed to fit.
    FitFailure(String),
    /// A bootstrap trial ran past its deadline and was abandoned.
    DeadlineExceeded,
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::InsufficientSamples {
                class,
                count,
                folds,
            } => write!(
                f,
                "class {} has {} samples, fewer than the {} requested folds",
                class, count, folds
            ),
            StackError::InvalidHyperparameter(msg) => {
                write!(f, "invalid hyperparameter: {}", msg)
            }
            StackError::NotFitted => write!(f, "prediction requested before fit"),
            StackError::DataAlignment { expected, found } => write!(
                f,
                "row alignment mismatch: expected {} rows, found {}",
                expected, found
            ),
            StackError::MetricComputation(msg) => {
                write!(f, "metric computation failed: {}", msg)
            }
            StackError::UndefinedCategory(p) => write!(
                f,
                "probability {} falls outside the cut-points and maps to no category",
                p
            ),
            StackError::FitFailure(msg) => write!(f, "classifier fit failed: {}", msg),
            StackError::DeadlineExceeded => {
                write!(f, "bootstrap trial exceeded its deadline")
            }
        }
    }
}

impl Error for StackError {}
